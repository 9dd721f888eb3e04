use crate::domain::value_objects::UserId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 居住者の表示情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidentProfile {
    pub display_name: String,
    /// 住戸の表示ラベル（例: "B-1203"）
    pub unit_label: String,
}

/// 居住者・住戸照会ポート
///
/// 予約コンテキストと本人確認・物件コンテキストの境界を維持する。
/// 予約コンテキストはUserIdのみを知り、氏名や住戸は知らない。
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// 居住者の表示名と住戸を取得する
    ///
    /// 紐付けが存在しない場合は`None`を返す。
    async fn resolve(&self, user_id: UserId) -> Result<Option<ResidentProfile>>;
}
