use crate::domain::{Facility, FacilityId, FacilitySpec};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 施設カタログポート
///
/// 予約可能な施設の登録・参照を抽象化する。
/// スロット割り当てからは読み取り専用で使われる。
#[async_trait]
pub trait FacilityRegistry: Send + Sync {
    /// 全施設をID順で返す
    async fn list(&self) -> Result<Vec<Facility>>;

    /// IDで施設を取得する
    async fn get(&self, facility_id: FacilityId) -> Result<Option<Facility>>;

    /// 施設を登録する
    ///
    /// IDはストア側で採番し、稼働状態はAvailableで始まる。
    async fn insert(&self, spec: FacilitySpec) -> Result<Facility>;

    /// 施設の現在状態を保存する
    ///
    /// 存在しない場合はfalseを返す。
    async fn save(&self, facility: &Facility) -> Result<bool>;

    /// 施設を削除する
    ///
    /// 存在しない場合はfalseを返す。
    async fn delete(&self, facility_id: FacilityId) -> Result<bool>;
}
