use super::{ApprovalStatus, BookingKind, DurationError, FacilityKind};

/// 施設属性のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilitySpecError {
    /// 名前が空
    EmptyName,
    /// 定員が0
    ZeroCapacity,
    /// 料金が負
    NegativeRate,
}

/// 利用枠のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// 利用時間が0以下
    NonPositiveDuration,
    /// 利用時間が大きすぎる
    DurationTooLong,
    /// 終了時刻が24:00を超える
    PastMidnight,
}

impl From<DurationError> for SlotError {
    fn from(err: DurationError) -> Self {
        match err {
            DurationError::NotPositive => SlotError::NonPositiveDuration,
            DurationError::TooLong => SlotError::DurationTooLong,
        }
    }
}

/// 承認ステータス遷移のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// 終端状態からは遷移できない（同じ判断の再適用も含む）
    AlreadyDecided { current: ApprovalStatus },
}

/// 予約申請のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingRequestError {
    /// 予約種別と施設種別が一致しない
    KindMismatch {
        facility: FacilityKind,
        booking: BookingKind,
    },
    /// 過去の日付
    PastDate,
    /// コート番号が不正（1以上）
    InvalidCourtNumber,
    /// 会場参照が不正（1以上）
    InvalidVenue,
}
