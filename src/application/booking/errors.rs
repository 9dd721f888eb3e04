use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{
    ApprovalStatus, BookingKey, BookingKind, BookingRequestError, FacilityId, FacilityKind,
    FacilitySpecError, SlotError,
};

/// 入力が不正（割り当て判定の前に検出される）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Facility name must not be empty")]
    EmptyFacilityName,

    #[error("Facility capacity must be at least 1")]
    ZeroCapacity,

    #[error("Hourly rate must not be negative")]
    NegativeRate,

    #[error("Duration must be a positive number of hours")]
    NonPositiveDuration,

    #[error("Duration is too long")]
    DurationTooLong,

    #[error("Slot must end by 24:00 on the booking date")]
    SlotPastMidnight,

    #[error("Booking date is in the past")]
    PastDate,

    #[error("Facility {0} does not exist")]
    UnknownFacility(FacilityId),

    #[error("A {booking:?} booking cannot be made on a {facility:?} facility")]
    KindMismatch {
        facility: FacilityKind,
        booking: BookingKind,
    },

    #[error("Court number must be at least 1")]
    InvalidCourtNumber,

    #[error("Venue reference must be at least 1")]
    InvalidVenue,

    #[error("Blocked date reason must not be empty")]
    EmptyReason,
}

impl From<FacilitySpecError> for ValidationError {
    fn from(err: FacilitySpecError) -> Self {
        match err {
            FacilitySpecError::EmptyName => ValidationError::EmptyFacilityName,
            FacilitySpecError::ZeroCapacity => ValidationError::ZeroCapacity,
            FacilitySpecError::NegativeRate => ValidationError::NegativeRate,
        }
    }
}

impl From<SlotError> for ValidationError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::NonPositiveDuration => ValidationError::NonPositiveDuration,
            SlotError::DurationTooLong => ValidationError::DurationTooLong,
            SlotError::PastMidnight => ValidationError::SlotPastMidnight,
        }
    }
}

impl From<BookingRequestError> for ValidationError {
    fn from(err: BookingRequestError) -> Self {
        match err {
            BookingRequestError::KindMismatch { facility, booking } => {
                ValidationError::KindMismatch { facility, booking }
            }
            BookingRequestError::PastDate => ValidationError::PastDate,
            BookingRequestError::InvalidCourtNumber => ValidationError::InvalidCourtNumber,
            BookingRequestError::InvalidVenue => ValidationError::InvalidVenue,
        }
    }
}

/// 枠や状態の衝突（クライアントは別の日時を提案できる）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("Facility {0} is under maintenance")]
    Maintenance(FacilityId),

    #[error("Facility {facility_id} accepts no bookings on {date}")]
    BlockedDate {
        facility_id: FacilityId,
        date: NaiveDate,
    },

    #[error("Slot overlaps {} existing booking(s)", .conflicts.len())]
    SlotTaken { conflicts: Vec<BookingKey> },

    #[error("Facility {facility_id} is already blocked on {date}")]
    DuplicateBlockedDate {
        facility_id: FacilityId,
        date: NaiveDate,
    },

    #[error("Facility {0} still has bookings")]
    FacilityInUse(FacilityId),
}

/// 参照先が存在しない
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("Facility {0} not found")]
    Facility(FacilityId),

    #[error("Booking {0} not found")]
    Booking(BookingKey),

    #[error("Facility {facility_id} has no blocked date on {date}")]
    BlockedDate {
        facility_id: FacilityId,
        date: NaiveDate,
    },
}

/// 予約管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookingApplicationError {
    /// 入力が不正
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// 枠が確保できない、または状態が衝突している
    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    /// 参照先が存在しない
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// 終端状態の予約に対するステータス更新
    #[error("Booking {key} is already {}", .current.as_str())]
    InvalidTransition {
        key: BookingKey,
        current: ApprovalStatus,
    },

    /// FacilityRegistryのエラー
    #[error("Facility registry error")]
    FacilityRegistryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BlockedDateStoreのエラー
    #[error("Blocked date store error")]
    BlockedDateStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BookingLedgerのエラー
    #[error("Booking ledger error")]
    BookingLedgerError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookingApplicationError>;
