use crate::domain::events::BookingStatusChanged;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 通知サービスポート
///
/// 居住者への通知配信メカニズムを抽象化する。
/// 実装はメール、プッシュ通知、掲示板連携などが考えられる。
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 予約の承認・却下を通知する
    ///
    /// ステータス遷移が保存された後に呼ばれる。
    async fn booking_status_changed(&self, event: &BookingStatusChanged) -> Result<()>;
}
