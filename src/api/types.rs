use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    ApprovalStatus, AvailabilityReport, BlockedDate, Booking, BookingDetails, BookingKey,
    BookingKind, Decision, Facility, FacilityId, FacilityKind, FacilitySpec, UnavailableReason,
    UserId,
    commands::{AddBlockedDate, CreateBooking},
};

use super::error::ApiError;

/// `HH:MM` または `HH:MM:SS` の時刻を解釈する
pub fn parse_time(value: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ApiError::InvalidRequest(format!("Invalid start_time: {}", value)))
}

// ============================================================================
// Facilities
// ============================================================================

/// 施設の登録・更新リクエスト（POST /facilities, PUT /facilities/:id）
#[derive(Debug, Deserialize)]
pub struct FacilityRequest {
    pub name: String,
    pub kind: FacilityKind,
    pub capacity: u32,
    /// 1時間あたりの料金（最小通貨単位）
    pub hourly_rate: i64,
}

impl FacilityRequest {
    pub fn into_spec(self) -> FacilitySpec {
        FacilitySpec {
            name: self.name,
            kind: self.kind,
            capacity: self.capacity,
            hourly_rate: self.hourly_rate,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FacilityResponse {
    pub facility_id: i64,
    pub name: String,
    pub kind: String,
    pub capacity: u32,
    pub hourly_rate: i64,
    pub availability: String,
}

impl From<Facility> for FacilityResponse {
    fn from(facility: Facility) -> Self {
        Self {
            facility_id: facility.facility_id.value(),
            name: facility.name,
            kind: facility.kind.as_str().to_string(),
            capacity: facility.capacity,
            hourly_rate: facility.hourly_rate,
            availability: facility.availability.as_str().to_string(),
        }
    }
}

/// 空き確認のクエリパラメータ（GET /facilities/:id/slots）
#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_hours: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub reason: Option<UnavailableReason>,
    pub conflicts: Vec<BookingKey>,
}

impl From<AvailabilityReport> for AvailabilityResponse {
    fn from(report: AvailabilityReport) -> Self {
        Self {
            available: report.available,
            reason: report.reason,
            conflicts: report.conflicts,
        }
    }
}

// ============================================================================
// Blocked dates
// ============================================================================

/// 予約停止日の登録リクエスト（POST /facilities/:id/blocked-dates）
#[derive(Debug, Deserialize)]
pub struct BlockedDateRequest {
    pub date: NaiveDate,
    pub reason: String,
}

impl BlockedDateRequest {
    pub fn to_command(self, facility_id: FacilityId) -> AddBlockedDate {
        AddBlockedDate {
            facility_id,
            date: self.date,
            reason: self.reason,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BlockedDateResponse {
    pub facility_id: i64,
    pub date: NaiveDate,
    pub reason: String,
}

impl From<BlockedDate> for BlockedDateResponse {
    fn from(blocked: BlockedDate) -> Self {
        Self {
            facility_id: blocked.facility_id.value(),
            date: blocked.date,
            reason: blocked.reason,
        }
    }
}

// ============================================================================
// Bookings
// ============================================================================

/// 利用申請リクエスト（POST /bookings）
///
/// 種別固有の項目はフラットに受け取り、種別に応じて必須を判定する。
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub kind: BookingKind,
    pub facility_id: i64,
    pub date: NaiveDate,
    pub start_time: String,
    pub duration_hours: i64,
    pub requester_id: Uuid,
    pub court_number: Option<u32>,
    pub venue_id: Option<i64>,
}

impl CreateBookingRequest {
    pub fn to_command(&self) -> Result<CreateBooking, ApiError> {
        let details = match self.kind {
            BookingKind::Sport => BookingDetails::Sport {
                court_number: self.court_number.ok_or_else(|| {
                    ApiError::InvalidRequest("court_number is required for sport bookings".into())
                })?,
            },
            BookingKind::Event => BookingDetails::Event {
                venue_id: self.venue_id.ok_or_else(|| {
                    ApiError::InvalidRequest("venue_id is required for event bookings".into())
                })?,
            },
        };

        Ok(CreateBooking {
            facility_id: FacilityId::new(self.facility_id),
            date: self.date,
            start_time: parse_time(&self.start_time)?,
            duration_hours: self.duration_hours,
            requester_id: UserId::from_uuid(self.requester_id),
            details,
        })
    }
}

/// ステータス更新リクエスト（PUT /bookings/:key/status）
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// "approved" または "rejected"
    pub status: String,
}

impl UpdateStatusRequest {
    pub fn decision(&self) -> Result<Decision, ApiError> {
        match self.status.parse::<ApprovalStatus>() {
            Ok(ApprovalStatus::Approved) => Ok(Decision::Approve),
            Ok(ApprovalStatus::Rejected) => Ok(Decision::Reject),
            _ => Err(ApiError::InvalidRequest(format!(
                "status must be \"approved\" or \"rejected\", got \"{}\"",
                self.status
            ))),
        }
    }
}

/// 予約一覧のクエリパラメータ（GET /bookings）
#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    /// ステータスでフィルタリング
    pub status: Option<String>,
}

/// 予約レスポンス（作成・ステータス更新の結果）
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub booking_key: BookingKey,
    pub kind: BookingKind,
    pub facility_id: i64,
    pub requester_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: String,
    pub duration_hours: u32,
    pub status: ApprovalStatus,
    pub court_number: Option<u32>,
    pub venue_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        let (court_number, venue_id) = match booking.details {
            BookingDetails::Sport { court_number } => (Some(court_number), None),
            BookingDetails::Event { venue_id } => (None, Some(venue_id)),
        };
        Self {
            booking_key: booking.key(),
            kind: booking.kind(),
            facility_id: booking.facility_id.value(),
            requester_id: booking.requester_id.value(),
            date: booking.slot.date,
            start_time: booking.slot.start_time,
            end_time: booking.slot.end_label(),
            duration_hours: booking.slot.duration.value(),
            status: booking.status,
            court_number,
            venue_id,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// 枠の衝突時に重なっている予約
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<BookingKey>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            conflicts: Vec::new(),
        }
    }

    pub fn with_conflicts(mut self, conflicts: Vec<BookingKey>) -> Self {
        self.conflicts = conflicts;
        self
    }
}
