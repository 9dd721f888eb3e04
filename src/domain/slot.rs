use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::{BlockedDate, Booking, BookingKey, DurationHours, Facility, FacilityId, SlotError};

const SECONDS_PER_DAY: u32 = 86_400;

/// 1日の中の半開区間 `[start, end)`（0時からの秒数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// 端が接しているだけの区間は重ならない
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// 利用枠 - 施設を排他的に使う日付・開始時刻・時間
///
/// 不変条件：終了時刻は当日の24:00以前。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration: DurationHours,
}

impl TimeSlot {
    pub fn new(
        date: NaiveDate,
        start_time: NaiveTime,
        duration: DurationHours,
    ) -> Result<Self, SlotError> {
        let slot = Self {
            date,
            start_time,
            duration,
        };
        let start = u64::from(start_time.num_seconds_from_midnight());
        let end = start + u64::from(duration.value()) * 3_600;
        if end > u64::from(SECONDS_PER_DAY) {
            return Err(SlotError::PastMidnight);
        }
        Ok(slot)
    }

    pub fn span(&self) -> Span {
        let start = self.start_time.num_seconds_from_midnight();
        Span {
            start,
            end: start.saturating_add(self.duration.value().saturating_mul(3_600)),
        }
    }

    /// 表示用の終了時刻（`HH:MM`、日の終わりは`24:00`）
    pub fn end_label(&self) -> String {
        let end = self.span().end;
        format!("{:02}:{:02}", end / 3_600, (end % 3_600) / 60)
    }
}

/// 予約不可の理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// 施設がメンテナンス中
    Maintenance,
    /// 予約停止日
    BlockedDate,
    /// 既存の予約と重なる
    SlotTaken,
}

/// 空き確認の結果
///
/// 不可の場合でも重なっている予約のキーを返す（管理者の上書き判断用）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub available: bool,
    pub reason: Option<UnavailableReason>,
    pub conflicts: Vec<BookingKey>,
}

/// 枠を占有している既存予約のうち、要求枠と重なるもののキーを返す
///
/// 呼び出し側は同一施設・同一日の予約を渡す想定だが、ここでも絞り込む。
/// 台帳の確保処理からも同じ判定として呼ばれる。
pub fn find_conflicts(
    existing: &[Booking],
    facility_id: FacilityId,
    slot: &TimeSlot,
) -> Vec<BookingKey> {
    let requested = slot.span();
    let mut conflicts: Vec<BookingKey> = existing
        .iter()
        .filter(|b| b.facility_id == facility_id && b.slot.date == slot.date)
        .filter(|b| b.status.holds_slot())
        .filter(|b| b.slot.span().overlaps(&requested))
        .map(|b| b.key())
        .collect();
    conflicts.sort();
    conflicts
}

/// 空き確認（純粋な関数）
///
/// `blocked_date`は要求日の予約停止日（あれば）。
/// 判定順序：メンテナンス → 予約停止日 → 既存予約との重なり。
/// 理由は最初に該当したものを返すが、重なりは常に計算する。
pub fn check_slot(
    facility: &Facility,
    blocked_date: Option<&BlockedDate>,
    existing: &[Booking],
    slot: &TimeSlot,
) -> AvailabilityReport {
    let conflicts = find_conflicts(existing, facility.facility_id, slot);

    let reason = if facility.is_under_maintenance() {
        Some(UnavailableReason::Maintenance)
    } else if blocked_date
        .is_some_and(|d| d.facility_id == facility.facility_id && d.date == slot.date)
    {
        Some(UnavailableReason::BlockedDate)
    } else if !conflicts.is_empty() {
        Some(UnavailableReason::SlotTaken)
    } else {
        None
    };

    AvailabilityReport {
        available: reason.is_none(),
        reason,
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ApprovalStatus, Availability, BookingDetails, BookingId, BookingKind, FacilityId,
        FacilityKind, UserId,
    };

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn hours(h: i64) -> DurationHours {
        DurationHours::try_from(h).unwrap()
    }

    fn court() -> Facility {
        Facility {
            facility_id: FacilityId::new(1),
            name: "Court 1".to_string(),
            kind: FacilityKind::Sport,
            capacity: 4,
            hourly_rate: 0,
            availability: Availability::Available,
        }
    }

    fn slot(d: &str, start: &str, h: i64) -> TimeSlot {
        TimeSlot::new(date(d), time(start), hours(h)).unwrap()
    }

    fn booking(id: i64, slot: TimeSlot, status: ApprovalStatus) -> Booking {
        Booking {
            booking_id: BookingId::new(id),
            facility_id: FacilityId::new(1),
            slot,
            status,
            requester_id: UserId::new(),
            details: BookingDetails::Sport { court_number: 1 },
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_span_overlap_and_adjacency() {
        let a = Span { start: 100, end: 200 };
        let b = Span { start: 150, end: 250 };
        let c = Span { start: 200, end: 300 };
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn test_slot_may_end_at_midnight() {
        let slot = slot("2024-05-01", "22:00", 2);
        assert_eq!(slot.end_label(), "24:00");
    }

    #[test]
    fn test_slot_past_midnight_is_rejected() {
        let result = TimeSlot::new(date("2024-05-01"), time("23:00"), hours(2));
        assert_eq!(result, Err(SlotError::PastMidnight));
    }

    #[test]
    fn test_end_label() {
        assert_eq!(slot("2024-05-01", "10:30", 1).end_label(), "11:30");
    }

    #[test]
    fn test_overlap_is_conflict() {
        let existing = vec![booking(1, slot("2024-05-01", "10:00", 1), ApprovalStatus::Approved)];
        let report = check_slot(&court(), None, &existing, &slot("2024-05-01", "10:30", 1));
        assert!(!report.available);
        assert_eq!(report.reason, Some(UnavailableReason::SlotTaken));
        assert_eq!(report.conflicts, vec![BookingKey::sport(1)]);
    }

    #[test]
    fn test_adjacent_is_not_conflict() {
        let existing = vec![booking(1, slot("2024-05-01", "10:00", 1), ApprovalStatus::Approved)];
        let report = check_slot(&court(), None, &existing, &slot("2024-05-01", "11:00", 1));
        assert!(report.available);
        assert!(report.conflicts.is_empty());

        let report = check_slot(&court(), None, &existing, &slot("2024-05-01", "09:00", 1));
        assert!(report.available);
    }

    #[test]
    fn test_pending_holds_slot_rejected_does_not() {
        let existing = vec![
            booking(1, slot("2024-05-01", "10:00", 2), ApprovalStatus::Pending),
            booking(2, slot("2024-05-01", "14:00", 2), ApprovalStatus::Rejected),
        ];
        let report = check_slot(&court(), None, &existing, &slot("2024-05-01", "11:00", 1));
        assert_eq!(report.conflicts, vec![BookingKey::sport(1)]);

        let report = check_slot(&court(), None, &existing, &slot("2024-05-01", "14:00", 1));
        assert!(report.available);
    }

    #[test]
    fn test_other_date_does_not_conflict() {
        let existing = vec![booking(1, slot("2024-05-02", "10:00", 1), ApprovalStatus::Approved)];
        let report = check_slot(&court(), None, &existing, &slot("2024-05-01", "10:00", 1));
        assert!(report.available);
    }

    #[test]
    fn test_multiple_conflicts_are_all_reported() {
        let existing = vec![
            booking(3, slot("2024-05-01", "12:00", 1), ApprovalStatus::Pending),
            booking(1, slot("2024-05-01", "10:00", 1), ApprovalStatus::Approved),
        ];
        let report = check_slot(&court(), None, &existing, &slot("2024-05-01", "09:00", 5));
        assert_eq!(
            report.conflicts,
            vec![BookingKey::sport(1), BookingKey::sport(3)]
        );
    }

    #[test]
    fn test_blocked_date_fails_regardless_of_time() {
        let blocked = Some(BlockedDate {
            facility_id: FacilityId::new(1),
            date: date("2024-05-01"),
            reason: "Resurfacing".to_string(),
        });
        for start in ["00:00", "06:00", "12:00", "23:00"] {
            let report = check_slot(&court(), blocked.as_ref(), &[], &slot("2024-05-01", start, 1));
            assert_eq!(report.reason, Some(UnavailableReason::BlockedDate));
        }
        let report = check_slot(&court(), blocked.as_ref(), &[], &slot("2024-05-02", "12:00", 1));
        assert!(report.available);
    }

    #[test]
    fn test_blocked_date_of_other_facility_is_ignored() {
        let blocked = Some(BlockedDate {
            facility_id: FacilityId::new(2),
            date: date("2024-05-01"),
            reason: "Party".to_string(),
        });
        let report = check_slot(&court(), blocked.as_ref(), &[], &slot("2024-05-01", "12:00", 1));
        assert!(report.available);
    }

    #[test]
    fn test_maintenance_takes_precedence() {
        let facility = court().toggle_availability();
        let existing = vec![booking(1, slot("2024-05-01", "10:00", 1), ApprovalStatus::Approved)];
        let report = check_slot(&facility, None, &existing, &slot("2024-05-01", "10:00", 1));
        assert_eq!(report.reason, Some(UnavailableReason::Maintenance));
        assert_eq!(report.conflicts, vec![BookingKey::sport(1)]);
    }

    #[test]
    fn test_event_bookings_use_event_keys() {
        let mut event = booking(7, slot("2024-05-01", "10:00", 3), ApprovalStatus::Pending);
        event.details = BookingDetails::Event { venue_id: 2 };
        assert_eq!(event.key().kind, BookingKind::Event);

        let report = check_slot(&court(), None, &[event], &slot("2024-05-01", "12:00", 1));
        assert_eq!(report.conflicts, vec![BookingKey::event(7)]);
    }
}
