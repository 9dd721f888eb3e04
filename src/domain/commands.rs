use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{BookingDetails, BookingKey, Decision, FacilityId, UserId};

/// コマンド：施設の利用を申請する
///
/// 利用時間は未検証の値のまま受け取り、アプリケーション層で検証する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateBooking {
    pub facility_id: FacilityId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_hours: i64,
    pub requester_id: UserId,
    pub details: BookingDetails,
}

/// コマンド：予約を承認または却下する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBookingStatus {
    pub booking_key: BookingKey,
    pub decision: Decision,
}

/// コマンド：予約停止日を登録する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddBlockedDate {
    pub facility_id: FacilityId,
    pub date: NaiveDate,
    pub reason: String,
}
