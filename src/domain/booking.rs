use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{
    ApprovalStatus, BookingId, BookingKey, BookingKind, BookingRequestError,
    BookingStatusChanged, Decision, Facility, FacilityId, TimeSlot, TransitionError, UserId,
};

/// 種別ごとの予約内容
///
/// スポーツ予約とホール予約は形の異なるペイロードを持つ。
/// 種別固有のフィールドが必要な箇所でだけパターンマッチする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookingDetails {
    Sport { court_number: u32 },
    Event { venue_id: i64 },
}

impl BookingDetails {
    pub fn kind(&self) -> BookingKind {
        match self {
            BookingDetails::Sport { .. } => BookingKind::Sport,
            BookingDetails::Event { .. } => BookingKind::Event,
        }
    }

    fn validate(&self) -> Result<(), BookingRequestError> {
        match *self {
            BookingDetails::Sport { court_number } if court_number == 0 => {
                Err(BookingRequestError::InvalidCourtNumber)
            }
            BookingDetails::Event { venue_id } if venue_id <= 0 => {
                Err(BookingRequestError::InvalidVenue)
            }
            _ => Ok(()),
        }
    }
}

/// 予約集約 - 1施設の1利用枠に対する申請
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    // 識別子（種別内で一意）
    pub booking_id: BookingId,

    // 他の集約への参照（IDのみ）
    pub facility_id: FacilityId,
    pub requester_id: UserId,

    pub slot: TimeSlot,
    pub status: ApprovalStatus,
    pub details: BookingDetails,

    // 監査情報
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn kind(&self) -> BookingKind {
        self.details.kind()
    }

    pub fn key(&self) -> BookingKey {
        BookingKey::new(self.kind(), self.booking_id)
    }
}

/// 採番前の予約
///
/// 台帳が予約IDを割り当てて保存するまでの中間表現。状態は常にPending。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub facility_id: FacilityId,
    pub requester_id: UserId,
    pub slot: TimeSlot,
    pub details: BookingDetails,
    pub requested_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn kind(&self) -> BookingKind {
        self.details.kind()
    }

    /// 台帳が割り当てたIDで予約を確定する
    pub fn into_booking(self, booking_id: BookingId) -> Booking {
        Booking {
            booking_id,
            facility_id: self.facility_id,
            requester_id: self.requester_id,
            slot: self.slot,
            status: ApprovalStatus::Pending,
            details: self.details,
            created_at: self.requested_at,
            updated_at: self.requested_at,
        }
    }
}

/// 純粋関数：予約を申請する
///
/// ビジネスルール：
/// - 予約種別は施設種別と一致すること
/// - 過去の日付は申請できない（当日は可）
/// - 種別固有の参照（コート番号・会場）が正しいこと
///
/// 空き確認は行わない。枠の判定はスロット割り当て側の責務。
pub fn request_booking(
    facility: &Facility,
    requester_id: UserId,
    slot: TimeSlot,
    details: BookingDetails,
    requested_at: DateTime<Utc>,
    today: NaiveDate,
) -> Result<NewBooking, BookingRequestError> {
    if details.kind().facility_kind() != facility.kind {
        return Err(BookingRequestError::KindMismatch {
            facility: facility.kind,
            booking: details.kind(),
        });
    }

    if slot.date < today {
        return Err(BookingRequestError::PastDate);
    }

    details.validate()?;

    Ok(NewBooking {
        facility_id: facility.facility_id,
        requester_id,
        slot,
        details,
        requested_at,
    })
}

/// 純粋関数：管理者の判断で承認ステータスを遷移させる
///
/// 遷移規則：
/// - Pending → Approved | Rejected
/// - Approved/Rejected は終端。同じ判断の再適用もエラーとする
///
/// 副作用なし。新しいBookingとイベントを返す。
pub fn decide(
    booking: &Booking,
    decision: Decision,
    decided_at: DateTime<Utc>,
) -> Result<(Booking, BookingStatusChanged), TransitionError> {
    if booking.status.is_terminal() {
        return Err(TransitionError::AlreadyDecided {
            current: booking.status,
        });
    }

    let new_status = decision.target_status();
    let updated = Booking {
        status: new_status,
        updated_at: decided_at,
        ..booking.clone()
    };

    let event = BookingStatusChanged {
        booking_key: booking.key(),
        new_status,
        requester_id: booking.requester_id,
        changed_at: decided_at,
    };

    Ok((updated, event))
}
