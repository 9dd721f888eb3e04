use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApprovalStatus, BookingKey, UserId};

/// イベント：予約の承認ステータスが変わった
///
/// 通知サービスに渡される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatusChanged {
    pub booking_key: BookingKey,
    pub new_status: ApprovalStatus,
    pub requester_id: UserId,
    pub changed_at: DateTime<Utc>,
}
