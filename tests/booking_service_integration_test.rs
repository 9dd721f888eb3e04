use amenity_booking::adapters::memory::FacilityRegistry as MemoryFacilityRegistry;
use amenity_booking::application::booking::{
    BookingApplicationError, BookingFilter, ConflictError, NotFoundError, UNKNOWN_NAME,
    UNKNOWN_UNIT, ValidationError, add_blocked_date, check_availability, create_booking,
    delete_facility, get_facility, list_all_bookings, list_blocked_dates, list_bookings_for_user,
    remove_blocked_date, toggle_facility_availability, update_booking_status, update_facility,
};
use amenity_booking::domain::commands::*;
use amenity_booking::domain::*;
use amenity_booking::ports::facility_registry::{self, FacilityRegistry};
use amenity_booking::ports::{BlockedDateStore, BookingLedger};
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

mod common;
use common::*;

// ============================================================================
// ヘルパー関数
// ============================================================================

fn court(facility: &Facility, day: &str, start: &str, hours: i64) -> CreateBooking {
    CreateBooking {
        facility_id: facility.facility_id,
        date: date(day),
        start_time: time(start),
        duration_hours: hours,
        requester_id: UserId::new(),
        details: BookingDetails::Sport { court_number: 1 },
    }
}

fn hall(facility: &Facility, day: &str, start: &str, hours: i64) -> CreateBooking {
    CreateBooking {
        facility_id: facility.facility_id,
        date: date(day),
        start_time: time(start),
        duration_hours: hours,
        requester_id: UserId::new(),
        details: BookingDetails::Event { venue_id: 7 },
    }
}

fn approve(key: BookingKey) -> UpdateBookingStatus {
    UpdateBookingStatus {
        booking_key: key,
        decision: Decision::Approve,
    }
}

fn reject(key: BookingKey) -> UpdateBookingStatus {
    UpdateBookingStatus {
        booking_key: key,
        decision: Decision::Reject,
    }
}

fn blocked(facility: &Facility, day: &str) -> AddBlockedDate {
    AddBlockedDate {
        facility_id: facility.facility_id,
        date: date(day),
        reason: "Floor resurfacing".to_string(),
    }
}

/// `get`で読んだ内容を返す前に待つFacilityRegistry
///
/// 読み取りから書き戻しまでの間に別の操作が割り込む状況を作る。
struct SlowFacilityRegistry {
    inner: MemoryFacilityRegistry,
    delay: std::time::Duration,
}

impl SlowFacilityRegistry {
    fn new(delay_ms: u64) -> Self {
        Self {
            inner: MemoryFacilityRegistry::new(),
            delay: std::time::Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl FacilityRegistry for SlowFacilityRegistry {
    async fn list(&self) -> facility_registry::Result<Vec<Facility>> {
        self.inner.list().await
    }

    async fn get(&self, facility_id: FacilityId) -> facility_registry::Result<Option<Facility>> {
        let snapshot = self.inner.get(facility_id).await?;
        tokio::time::sleep(self.delay).await;
        Ok(snapshot)
    }

    async fn insert(&self, spec: FacilitySpec) -> facility_registry::Result<Facility> {
        self.inner.insert(spec).await
    }

    async fn save(&self, facility: &Facility) -> facility_registry::Result<bool> {
        self.inner.save(facility).await
    }

    async fn delete(&self, facility_id: FacilityId) -> facility_registry::Result<bool> {
        self.inner.delete(facility_id).await
    }
}

fn slow_registry_context() -> TestContext {
    let mut ctx = in_memory_context();
    ctx.deps.facility_registry = Arc::new(SlowFacilityRegistry::new(100));
    ctx
}

async fn pause() {
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
}

// ============================================================================
// 割り当てと重なり
// ============================================================================

#[tokio::test]
async fn test_overlapping_request_conflicts_and_touching_request_succeeds() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    // A: 10:00-11:00 を申請して承認
    let a = create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1))
        .await
        .unwrap();
    assert_eq!(a.status, ApprovalStatus::Pending);
    update_booking_status(&ctx.deps, approve(a.key())).await.unwrap();

    // B: 10:30-11:30 は重なる
    let result = create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:30", 1)).await;
    match result {
        Err(BookingApplicationError::Conflict(ConflictError::SlotTaken { conflicts })) => {
            assert_eq!(conflicts, vec![a.key()]);
        }
        other => panic!("expected SlotTaken, got {:?}", other),
    }

    // C: 11:00-12:00 は端が接するだけ
    let c = create_booking(&ctx.deps, court(&facility, "2024-05-10", "11:00", 1))
        .await
        .unwrap();
    assert_eq!(c.status, ApprovalStatus::Pending);
    assert_eq!(c.slot.end_label(), "12:00");
}

#[tokio::test]
async fn test_pending_booking_also_holds_its_slot() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Squash Court").await;

    let first = create_booking(&ctx.deps, court(&facility, "2024-05-10", "09:00", 3))
        .await
        .unwrap();

    let result = create_booking(&ctx.deps, court(&facility, "2024-05-10", "11:00", 1)).await;
    assert!(matches!(
        result,
        Err(BookingApplicationError::Conflict(ConflictError::SlotTaken { ref conflicts }))
            if conflicts == &vec![first.key()]
    ));
}

#[tokio::test]
async fn test_rejected_booking_releases_its_slot() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Badminton Hall").await;

    let first = create_booking(&ctx.deps, court(&facility, "2024-05-10", "14:00", 2))
        .await
        .unwrap();
    update_booking_status(&ctx.deps, reject(first.key())).await.unwrap();

    let second = create_booking(&ctx.deps, court(&facility, "2024-05-10", "14:00", 2)).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_same_slot_on_another_facility_or_date_is_free() {
    let ctx = in_memory_context();
    let court_a = sport_facility(&ctx.deps, "Court A").await;
    let court_b = sport_facility(&ctx.deps, "Court B").await;

    create_booking(&ctx.deps, court(&court_a, "2024-05-10", "10:00", 1))
        .await
        .unwrap();

    assert!(create_booking(&ctx.deps, court(&court_b, "2024-05-10", "10:00", 1)).await.is_ok());
    assert!(create_booking(&ctx.deps, court(&court_a, "2024-05-11", "10:00", 1)).await.is_ok());
}

#[tokio::test]
async fn test_booking_keys_are_sequenced_per_kind() {
    let ctx = in_memory_context();
    let tennis = sport_facility(&ctx.deps, "Tennis Court").await;
    let party_room = event_facility(&ctx.deps, "Party Room").await;

    let sport = create_booking(&ctx.deps, court(&tennis, "2024-05-10", "10:00", 1))
        .await
        .unwrap();
    let event = create_booking(&ctx.deps, hall(&party_room, "2024-05-10", "10:00", 1))
        .await
        .unwrap();

    assert_eq!(sport.key().to_string(), "S-1");
    assert_eq!(event.key().to_string(), "E-1");
}

// ============================================================================
// 予約停止日とメンテナンス
// ============================================================================

#[tokio::test]
async fn test_blocked_date_rejects_any_time_on_that_day() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    add_blocked_date(&ctx.deps, blocked(&facility, "2024-05-12"))
        .await
        .unwrap();

    let result = create_booking(&ctx.deps, court(&facility, "2024-05-12", "07:00", 1)).await;
    assert!(matches!(
        result,
        Err(BookingApplicationError::Conflict(ConflictError::BlockedDate { .. }))
    ));

    // 前後の日付は影響を受けない
    assert!(create_booking(&ctx.deps, court(&facility, "2024-05-13", "07:00", 1)).await.is_ok());

    // 解除すれば申請できる
    remove_blocked_date(&ctx.deps, facility.facility_id, date("2024-05-12"))
        .await
        .unwrap();
    assert!(create_booking(&ctx.deps, court(&facility, "2024-05-12", "07:00", 1)).await.is_ok());
}

#[tokio::test]
async fn test_blocked_date_validation_and_duplicates() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let empty = AddBlockedDate {
        reason: "   ".to_string(),
        ..blocked(&facility, "2024-05-12")
    };
    assert!(matches!(
        add_blocked_date(&ctx.deps, empty).await,
        Err(BookingApplicationError::Validation(ValidationError::EmptyReason))
    ));

    add_blocked_date(&ctx.deps, blocked(&facility, "2024-05-20"))
        .await
        .unwrap();
    add_blocked_date(&ctx.deps, blocked(&facility, "2024-05-12"))
        .await
        .unwrap();
    assert!(matches!(
        add_blocked_date(&ctx.deps, blocked(&facility, "2024-05-12")).await,
        Err(BookingApplicationError::Conflict(ConflictError::DuplicateBlockedDate { .. }))
    ));

    let dates: Vec<_> = list_blocked_dates(&ctx.deps, facility.facility_id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.date)
        .collect();
    assert_eq!(dates, vec![date("2024-05-12"), date("2024-05-20")]);

    assert!(matches!(
        remove_blocked_date(&ctx.deps, facility.facility_id, date("2024-06-01")).await,
        Err(BookingApplicationError::NotFound(NotFoundError::BlockedDate { .. }))
    ));
}

#[tokio::test]
async fn test_maintenance_blocks_new_requests_until_toggled_back() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let toggled = toggle_facility_availability(&ctx.deps, facility.facility_id)
        .await
        .unwrap();
    assert_eq!(toggled.availability, Availability::Maintenance);

    let result = create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1)).await;
    assert!(matches!(
        result,
        Err(BookingApplicationError::Conflict(ConflictError::Maintenance(id))) if id == facility.facility_id
    ));

    let toggled = toggle_facility_availability(&ctx.deps, facility.facility_id)
        .await
        .unwrap();
    assert_eq!(toggled.availability, Availability::Available);

    assert!(create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1)).await.is_ok());
}

#[tokio::test]
async fn test_maintenance_leaves_existing_bookings_untouched() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let approved = create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1))
        .await
        .unwrap();
    update_booking_status(&ctx.deps, approve(approved.key())).await.unwrap();
    let pending = create_booking(&ctx.deps, court(&facility, "2024-05-10", "12:00", 1))
        .await
        .unwrap();

    toggle_facility_availability(&ctx.deps, facility.facility_id)
        .await
        .unwrap();

    let statuses: Vec<_> = list_all_bookings(&ctx.deps, BookingFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|v| (v.booking_key, v.status))
        .collect();
    assert!(statuses.contains(&(approved.key(), ApprovalStatus::Approved)));
    assert!(statuses.contains(&(pending.key(), ApprovalStatus::Pending)));

    // 管理者は引き続き判断できる
    let decided = update_booking_status(&ctx.deps, approve(pending.key())).await.unwrap();
    assert_eq!(decided.status, ApprovalStatus::Approved);
}

#[tokio::test]
async fn test_check_availability_reports_reason_and_conflicts() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let existing = create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 2))
        .await
        .unwrap();

    let report = check_availability(
        &ctx.deps,
        facility.facility_id,
        date("2024-05-10"),
        time("11:00"),
        1,
    )
    .await
    .unwrap();
    assert!(!report.available);
    assert_eq!(report.reason, Some(UnavailableReason::SlotTaken));
    assert_eq!(report.conflicts, vec![existing.key()]);

    // メンテナンスが優先されるが、重なりは引き続き返す
    toggle_facility_availability(&ctx.deps, facility.facility_id)
        .await
        .unwrap();
    let report = check_availability(
        &ctx.deps,
        facility.facility_id,
        date("2024-05-10"),
        time("11:00"),
        1,
    )
    .await
    .unwrap();
    assert_eq!(report.reason, Some(UnavailableReason::Maintenance));
    assert_eq!(report.conflicts, vec![existing.key()]);

    let free = check_availability(
        &ctx.deps,
        facility.facility_id,
        date("2024-05-10"),
        time("12:00"),
        1,
    )
    .await
    .unwrap();
    assert_eq!(free.conflicts, Vec::<BookingKey>::new());
}

// ============================================================================
// 入力検証
// ============================================================================

#[tokio::test]
async fn test_invalid_requests_are_validation_errors() {
    let ctx = in_memory_context();
    let tennis = sport_facility(&ctx.deps, "Tennis Court").await;
    let party_room = event_facility(&ctx.deps, "Party Room").await;

    let cases = vec![
        (court(&tennis, "2024-05-10", "10:00", 0), ValidationError::NonPositiveDuration),
        (court(&tennis, "2024-05-10", "10:00", -2), ValidationError::NonPositiveDuration),
        (court(&tennis, "2024-05-10", "22:00", 3), ValidationError::SlotPastMidnight),
        (court(&tennis, "2024-04-30", "10:00", 1), ValidationError::PastDate),
        (
            court(&party_room, "2024-05-10", "10:00", 1),
            ValidationError::KindMismatch {
                facility: FacilityKind::Event,
                booking: BookingKind::Sport,
            },
        ),
        (
            CreateBooking {
                facility_id: FacilityId::new(999),
                ..court(&tennis, "2024-05-10", "10:00", 1)
            },
            ValidationError::UnknownFacility(FacilityId::new(999)),
        ),
        (
            CreateBooking {
                details: BookingDetails::Sport { court_number: 0 },
                ..court(&tennis, "2024-05-10", "10:00", 1)
            },
            ValidationError::InvalidCourtNumber,
        ),
    ];

    for (cmd, expected) in cases {
        match create_booking(&ctx.deps, cmd).await {
            Err(BookingApplicationError::Validation(actual)) => assert_eq!(actual, expected),
            other => panic!("expected {:?}, got {:?}", expected, other),
        }
    }

    assert!(list_all_bookings(&ctx.deps, BookingFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_today_and_last_hour_of_day_are_accepted() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let booking = create_booking(&ctx.deps, court(&facility, "2024-05-01", "23:00", 1))
        .await
        .unwrap();
    assert_eq!(booking.slot.end_label(), "24:00");

    // 時計を進めると同じ日付は過去になる
    ctx.clock.set(test_now() + Duration::days(1));
    let result = create_booking(&ctx.deps, court(&facility, "2024-05-01", "08:00", 1)).await;
    assert!(matches!(
        result,
        Err(BookingApplicationError::Validation(ValidationError::PastDate))
    ));
}

// ============================================================================
// 承認ステートマシン
// ============================================================================

#[tokio::test]
async fn test_terminal_status_cannot_change() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;
    let booking = create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1))
        .await
        .unwrap();

    let approved = update_booking_status(&ctx.deps, approve(booking.key())).await.unwrap();
    assert_eq!(approved.status, ApprovalStatus::Approved);

    // 別の判断
    let result = update_booking_status(&ctx.deps, reject(booking.key())).await;
    assert!(matches!(
        result,
        Err(BookingApplicationError::InvalidTransition {
            current: ApprovalStatus::Approved,
            ..
        })
    ));

    // 同じ判断の再適用もエラー
    let result = update_booking_status(&ctx.deps, approve(booking.key())).await;
    assert!(matches!(
        result,
        Err(BookingApplicationError::InvalidTransition {
            current: ApprovalStatus::Approved,
            ..
        })
    ));

    assert_eq!(ctx.notification_service.sent().len(), 1);
}

#[tokio::test]
async fn test_unknown_booking_is_not_found() {
    let ctx = in_memory_context();
    let result = update_booking_status(&ctx.deps, approve(BookingKey::event(42))).await;
    assert!(matches!(
        result,
        Err(BookingApplicationError::NotFound(NotFoundError::Booking(key))) if key == BookingKey::event(42)
    ));
}

#[tokio::test]
async fn test_status_change_is_notified() {
    let ctx = in_memory_context();
    let facility = event_facility(&ctx.deps, "Party Room").await;
    let cmd = hall(&facility, "2024-05-10", "18:00", 3);
    let requester = cmd.requester_id;
    let booking = create_booking(&ctx.deps, cmd).await.unwrap();

    update_booking_status(&ctx.deps, reject(booking.key())).await.unwrap();

    let sent = ctx.notification_service.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].booking_key, booking.key());
    assert_eq!(sent[0].new_status, ApprovalStatus::Rejected);
    assert_eq!(sent[0].requester_id, requester);
    assert_eq!(sent[0].changed_at, test_now());
}

#[tokio::test]
async fn test_notification_failure_keeps_the_transition() {
    let ctx = in_memory_context();
    ctx.notification_service.set_failing(true);
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;
    let booking = create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1))
        .await
        .unwrap();

    let approved = update_booking_status(&ctx.deps, approve(booking.key())).await.unwrap();
    assert_eq!(approved.status, ApprovalStatus::Approved);

    let views = list_all_bookings(
        &ctx.deps,
        BookingFilter {
            status: Some(ApprovalStatus::Approved),
        },
    )
    .await
    .unwrap();
    assert_eq!(views.len(), 1);
}

// ============================================================================
// 並行性
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_for_one_slot_admit_exactly_one() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let deps = ctx.deps.clone();
            // 10:00-12:00 と 11:00-12:00 は互いに重なる
            let (start, hours) = if i % 2 == 0 { ("10:00", 2) } else { ("11:00", 1) };
            let cmd = court(&facility, "2024-05-10", start, hours);
            tokio::spawn(async move { create_booking(&deps, cmd).await })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(BookingApplicationError::Conflict(ConflictError::SlotTaken { .. })) => {
                conflicts += 1
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decisions_first_writer_wins() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;
    let booking = create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1))
        .await
        .unwrap();
    let key = booking.key();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let deps = ctx.deps.clone();
            let cmd = if i % 2 == 0 { approve(key) } else { reject(key) };
            tokio::spawn(async move { update_booking_status(&deps, cmd).await })
        })
        .collect();

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(updated) => winners.push(updated.status),
            Err(BookingApplicationError::InvalidTransition { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(winners.len(), 1);
    let sent = ctx.notification_service.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].new_status, winners[0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_blocked_date_and_request_race_never_both_win() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let booking_task = {
        let deps = ctx.deps.clone();
        let cmd = court(&facility, "2024-05-15", "10:00", 1);
        tokio::spawn(async move { create_booking(&deps, cmd).await })
    };
    let block_task = {
        let deps = ctx.deps.clone();
        let cmd = blocked(&facility, "2024-05-15");
        tokio::spawn(async move { add_blocked_date(&deps, cmd).await })
    };

    let booking = booking_task.await.unwrap();
    block_task.await.unwrap().unwrap();

    // 予約が先なら成功し、停止日が先ならBlockedDateになる
    match booking {
        Ok(_) => {}
        Err(BookingApplicationError::Conflict(ConflictError::BlockedDate { .. })) => {}
        Err(other) => panic!("unexpected error: {:?}", other),
    }
    let again = create_booking(&ctx.deps, court(&facility, "2024-05-15", "15:00", 1)).await;
    assert!(matches!(
        again,
        Err(BookingApplicationError::Conflict(ConflictError::BlockedDate { .. }))
    ));
}

// ============================================================================
// 統合ビュー
// ============================================================================

#[tokio::test]
async fn test_view_joins_profiles_and_renders_sentinels() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let known = court(&facility, "2024-05-10", "10:00", 1);
    ctx.identity_directory
        .add_resident(known.requester_id, "Aiko Tanaka", "B-1203");
    let known_booking = create_booking(&ctx.deps, known).await.unwrap();
    let unknown_booking = create_booking(&ctx.deps, court(&facility, "2024-05-10", "12:00", 1))
        .await
        .unwrap();

    let views = list_all_bookings(&ctx.deps, BookingFilter::default())
        .await
        .unwrap();
    let known_view = views
        .iter()
        .find(|v| v.booking_key == known_booking.key())
        .unwrap();
    assert_eq!(known_view.requester_name, "Aiko Tanaka");
    assert_eq!(known_view.unit_label, "B-1203");
    assert_eq!(known_view.facility_name, "Tennis Court");
    assert_eq!(known_view.end_time, "11:00");

    let unknown_view = views
        .iter()
        .find(|v| v.booking_key == unknown_booking.key())
        .unwrap();
    assert_eq!(unknown_view.requester_name, UNKNOWN_NAME);
    assert_eq!(unknown_view.unit_label, UNKNOWN_UNIT);

    // 照会自体が失敗しても一覧は返る
    ctx.identity_directory.set_failing(true);
    let views = list_all_bookings(&ctx.deps, BookingFilter::default())
        .await
        .unwrap();
    assert_eq!(views.len(), 2);
    assert!(views.iter().all(|v| v.requester_name == UNKNOWN_NAME));
}

#[tokio::test]
async fn test_view_ordering_filter_and_per_user_listing() {
    let ctx = in_memory_context();
    let tennis = sport_facility(&ctx.deps, "Tennis Court").await;
    let party_room = event_facility(&ctx.deps, "Party Room").await;
    let resident = UserId::new();

    let early = create_booking(
        &ctx.deps,
        CreateBooking {
            requester_id: resident,
            ..court(&tennis, "2024-05-10", "09:00", 1)
        },
    )
    .await
    .unwrap();
    let late = create_booking(&ctx.deps, court(&tennis, "2024-05-10", "15:00", 1))
        .await
        .unwrap();
    let next_day = create_booking(
        &ctx.deps,
        CreateBooking {
            requester_id: resident,
            ..hall(&party_room, "2024-05-11", "09:00", 2)
        },
    )
    .await
    .unwrap();
    update_booking_status(&ctx.deps, approve(late.key())).await.unwrap();

    let keys: Vec<_> = list_all_bookings(&ctx.deps, BookingFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.booking_key)
        .collect();
    assert_eq!(keys, vec![next_day.key(), late.key(), early.key()]);

    let pending: Vec<_> = list_all_bookings(
        &ctx.deps,
        BookingFilter {
            status: Some(ApprovalStatus::Pending),
        },
    )
    .await
    .unwrap()
    .into_iter()
    .map(|v| v.booking_key)
    .collect();
    assert_eq!(pending, vec![next_day.key(), early.key()]);

    let mine = list_bookings_for_user(&ctx.deps, resident).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|v| v.requester_id == resident));
    assert_eq!(mine[0].details, BookingDetails::Event { venue_id: 7 });
    assert_eq!(mine[0].kind, BookingKind::Event);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_update_overlapping_toggle_keeps_maintenance() {
    let ctx = slow_registry_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let update = {
        let deps = ctx.deps.clone();
        let facility_id = facility.facility_id;
        tokio::spawn(async move {
            update_facility(&deps, facility_id, spec("Center Court", FacilityKind::Sport)).await
        })
    };
    pause().await;

    let toggled = toggle_facility_availability(&ctx.deps, facility.facility_id)
        .await
        .unwrap();
    assert_eq!(toggled.availability, Availability::Maintenance);
    update.await.unwrap().unwrap();

    let stored = get_facility(&ctx.deps, facility.facility_id).await.unwrap();
    assert_eq!(stored.name, "Center Court");
    assert_eq!(stored.availability, Availability::Maintenance);

    assert!(matches!(
        create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1)).await,
        Err(BookingApplicationError::Conflict(ConflictError::Maintenance(_)))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_toggles_are_both_applied() {
    let ctx = slow_registry_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let first = {
        let deps = ctx.deps.clone();
        let facility_id = facility.facility_id;
        tokio::spawn(async move { toggle_facility_availability(&deps, facility_id).await })
    };
    pause().await;
    toggle_facility_availability(&ctx.deps, facility.facility_id)
        .await
        .unwrap();
    first.await.unwrap().unwrap();

    let stored = get_facility(&ctx.deps, facility.facility_id).await.unwrap();
    assert_eq!(stored.availability, Availability::Available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_during_request_never_orphans_a_booking() {
    let ctx = slow_registry_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let request = {
        let deps = ctx.deps.clone();
        let cmd = court(&facility, "2024-05-10", "10:00", 1);
        tokio::spawn(async move { create_booking(&deps, cmd).await })
    };
    pause().await;
    let deleted = delete_facility(&ctx.deps, facility.facility_id).await;
    let created = request.await.unwrap();

    let bookings = ctx
        .deps
        .booking_ledger
        .count_by_facility(facility.facility_id)
        .await
        .unwrap();
    let exists = get_facility(&ctx.deps, facility.facility_id).await.is_ok();

    match (created, deleted) {
        (Ok(_), Err(BookingApplicationError::Conflict(ConflictError::FacilityInUse(_)))) => {
            assert!(exists);
            assert_eq!(bookings, 1);
        }
        (
            Err(BookingApplicationError::Validation(ValidationError::UnknownFacility(_))),
            Ok(()),
        ) => {
            assert!(!exists);
            assert_eq!(bookings, 0);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_kind_change_during_request_keeps_kinds_aligned() {
    let ctx = slow_registry_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    let request = {
        let deps = ctx.deps.clone();
        let cmd = court(&facility, "2024-05-10", "10:00", 1);
        tokio::spawn(async move { create_booking(&deps, cmd).await })
    };
    pause().await;
    let changed = update_facility(
        &ctx.deps,
        facility.facility_id,
        spec("Tennis Court", FacilityKind::Event),
    )
    .await;
    let created = request.await.unwrap();

    let stored = get_facility(&ctx.deps, facility.facility_id).await.unwrap();
    for booking in list_all_bookings(&ctx.deps, BookingFilter::default()).await.unwrap() {
        assert_eq!(booking.kind.facility_kind(), stored.kind);
    }
    assert!(created.is_ok() != changed.is_ok());
}

#[tokio::test]
async fn test_rejected_requests_leave_no_lock_entries() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;

    for id in 1_000..2_000 {
        let cmd = CreateBooking {
            facility_id: FacilityId::new(id),
            date: date("1999-01-01"),
            start_time: time("10:00"),
            duration_hours: 1,
            requester_id: UserId::new(),
            details: BookingDetails::Sport { court_number: 1 },
        };
        assert!(create_booking(&ctx.deps, cmd).await.is_err());
    }
    assert!(
        create_booking(&ctx.deps, court(&facility, "1999-01-01", "10:00", 1))
            .await
            .is_err()
    );
    create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1))
        .await
        .unwrap();

    assert_eq!(ctx.deps.slot_locks.tracked(), 0);
}

// ============================================================================
// 施設カタログ
// ============================================================================

#[tokio::test]
async fn test_facility_with_bookings_cannot_be_deleted_or_change_kind() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;
    create_booking(&ctx.deps, court(&facility, "2024-05-10", "10:00", 1))
        .await
        .unwrap();

    assert!(matches!(
        delete_facility(&ctx.deps, facility.facility_id).await,
        Err(BookingApplicationError::Conflict(ConflictError::FacilityInUse(_)))
    ));

    assert!(matches!(
        update_facility(&ctx.deps, facility.facility_id, spec("Tennis Court", FacilityKind::Event)).await,
        Err(BookingApplicationError::Conflict(ConflictError::FacilityInUse(_)))
    ));

    // 種別以外の変更は可能
    let renamed = update_facility(
        &ctx.deps,
        facility.facility_id,
        spec("Center Court", FacilityKind::Sport),
    )
    .await
    .unwrap();
    assert_eq!(renamed.name, "Center Court");
}

#[tokio::test]
async fn test_deleting_facility_removes_its_blocked_dates() {
    let ctx = in_memory_context();
    let facility = sport_facility(&ctx.deps, "Tennis Court").await;
    add_blocked_date(&ctx.deps, blocked(&facility, "2024-05-12"))
        .await
        .unwrap();

    delete_facility(&ctx.deps, facility.facility_id).await.unwrap();

    assert!(matches!(
        list_blocked_dates(&ctx.deps, facility.facility_id).await,
        Err(BookingApplicationError::NotFound(NotFoundError::Facility(_)))
    ));
    let blocked_left = ctx
        .deps
        .blocked_date_store
        .list(facility.facility_id)
        .await
        .unwrap();
    assert!(blocked_left.is_empty());
}
