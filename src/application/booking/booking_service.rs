use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

use crate::domain::{
    self, ApprovalStatus, AvailabilityReport, Booking, BookingKey, DurationHours, Facility,
    FacilityId, TimeSlot, UnavailableReason, commands::*,
};
use crate::ports::*;

use super::errors::{BookingApplicationError, ConflictError, NotFoundError, Result, ValidationError};
use super::slot_locks::SlotLocks;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub facility_registry: Arc<dyn FacilityRegistry>,
    pub blocked_date_store: Arc<dyn BlockedDateStore>,
    pub booking_ledger: Arc<dyn BookingLedger>,
    pub identity_directory: Arc<dyn IdentityDirectory>,
    pub notification_service: Arc<dyn NotificationService>,
    pub clock: Arc<dyn Clock>,
    pub slot_locks: Arc<SlotLocks>,
}

/// 施設を取得するヘルパー関数（存在しなければ`None`）
pub(super) async fn find_facility(
    registry: &Arc<dyn FacilityRegistry>,
    facility_id: FacilityId,
) -> Result<Option<Facility>> {
    registry
        .get(facility_id)
        .await
        .map_err(BookingApplicationError::FacilityRegistryError)
}

/// 利用枠を組み立てるヘルパー関数
///
/// 利用時間と終了時刻の検証を行う。
fn build_slot(date: NaiveDate, start_time: NaiveTime, duration_hours: i64) -> Result<TimeSlot> {
    let duration = DurationHours::try_from(duration_hours)
        .map_err(|e| ValidationError::from(domain::SlotError::from(e)))?;
    let slot = TimeSlot::new(date, start_time, duration).map_err(ValidationError::from)?;
    Ok(slot)
}

/// 現時点の空き状況を判定するヘルパー関数
///
/// 施設・予約停止日・台帳を読み、ドメインの純粋関数で判定する。
async fn evaluate_slot(
    deps: &ServiceDependencies,
    facility: &Facility,
    slot: &TimeSlot,
) -> Result<AvailabilityReport> {
    let blocked = deps
        .blocked_date_store
        .find(facility.facility_id, slot.date)
        .await
        .map_err(BookingApplicationError::BlockedDateStoreError)?;

    let existing = deps
        .booking_ledger
        .find_active(facility.facility_id, slot.date)
        .await
        .map_err(BookingApplicationError::BookingLedgerError)?;

    Ok(domain::slot::check_slot(facility, blocked.as_ref(), &existing, slot))
}

fn unavailable(
    facility: &Facility,
    slot: &TimeSlot,
    reason: Option<UnavailableReason>,
    conflicts: Vec<BookingKey>,
) -> ConflictError {
    match reason {
        Some(UnavailableReason::Maintenance) => ConflictError::Maintenance(facility.facility_id),
        Some(UnavailableReason::BlockedDate) => ConflictError::BlockedDate {
            facility_id: facility.facility_id,
            date: slot.date,
        },
        Some(UnavailableReason::SlotTaken) | None => ConflictError::SlotTaken { conflicts },
    }
}

/// 空き確認（読み取りのみ）
///
/// 要求枠 `[start, start + duration)` が予約可能かを判定し、
/// 重なっている予約のキーも返す。
pub async fn check_availability(
    deps: &ServiceDependencies,
    facility_id: FacilityId,
    date: NaiveDate,
    start_time: NaiveTime,
    duration_hours: i64,
) -> Result<AvailabilityReport> {
    let slot = build_slot(date, start_time, duration_hours)?;

    let facility = find_facility(&deps.facility_registry, facility_id)
        .await?
        .ok_or(NotFoundError::Facility(facility_id))?;

    evaluate_slot(deps, &facility, &slot).await
}

/// 施設の利用を申請する
///
/// ビジネスルール：
/// - 利用時間は1時間以上、終了は当日24:00まで
/// - 施設が存在し、予約種別が施設種別と一致すること
/// - 過去の日付は申請できない
/// - 施設がメンテナンス中でないこと
/// - 予約停止日でないこと
/// - 同じ施設・日付のPending/Approved予約と重ならないこと（端の接触は可）
///
/// # 一貫性保証
///
/// 施設ロックを共有で保持するため、申請中に施設が削除されたり
/// 種別・稼働状態が変わったりすることはない。その上で (施設, 日付) の
/// ロックを保持したまま判定と確保を行い、確保自体も台帳側で不可分に
/// 実行される。同じ枠への並行申請は1件だけが成功し、残りは
/// `ConflictError`になる。
///
/// # 戻り値
/// 成功時はPendingで保存された予約
pub async fn create_booking(deps: &ServiceDependencies, cmd: CreateBooking) -> Result<Booking> {
    // 1. 入力の形の検証
    let slot = build_slot(cmd.date, cmd.start_time, cmd.duration_hours)?;

    // 2. 施設の存在確認と申請内容の検証（施設ロックは共有）
    let _facility_guard = deps.slot_locks.share_facility(cmd.facility_id).await;

    let facility = find_facility(&deps.facility_registry, cmd.facility_id)
        .await?
        .ok_or(ValidationError::UnknownFacility(cmd.facility_id))?;

    let new_booking = domain::booking::request_booking(
        &facility,
        cmd.requester_id,
        slot,
        cmd.details,
        deps.clock.now(),
        deps.clock.today(),
    )
    .map_err(ValidationError::from)?;

    // 3. 同じ (施設, 日付) への書き込みを直列化
    let _slot_guard = deps.slot_locks.acquire(facility.facility_id, slot.date).await;

    // 4. 空き判定（メンテナンス・予約停止日・重なり）
    let report = evaluate_slot(deps, &facility, &slot).await?;
    if !report.available {
        tracing::warn!(
            facility_id = %facility.facility_id,
            date = %slot.date,
            reason = ?report.reason,
            "Booking request rejected"
        );
        return Err(unavailable(&facility, &slot, report.reason, report.conflicts).into());
    }

    // 5. 台帳で不可分に確保
    match deps
        .booking_ledger
        .reserve(new_booking)
        .await
        .map_err(BookingApplicationError::BookingLedgerError)?
    {
        ReserveOutcome::Reserved(booking) => {
            tracing::info!(
                booking_key = %booking.key(),
                facility_id = %booking.facility_id,
                date = %booking.slot.date,
                "Booking created"
            );
            Ok(booking)
        }
        ReserveOutcome::Clashed(conflicts) => {
            tracing::warn!(
                facility_id = %facility.facility_id,
                date = %slot.date,
                "Booking lost the race for its slot"
            );
            Err(ConflictError::SlotTaken { conflicts }.into())
        }
        ReserveOutcome::Refused(reason) => {
            tracing::warn!(
                facility_id = %facility.facility_id,
                date = %slot.date,
                reason = ?reason,
                "Booking refused by the ledger"
            );
            Err(unavailable(&facility, &slot, Some(reason), Vec::new()).into())
        }
    }
}

/// 予約を承認または却下する
///
/// ビジネスルール：
/// - 予約が存在すること
/// - Pendingからのみ遷移できる。終端状態への再適用（同じ判断を含む）は
///   `InvalidTransition`になる
///
/// 同じ予約への並行更新は台帳の比較交換で直列化され、先に書いた側が勝つ。
/// 負けた側は`InvalidTransition`を受け取る。
///
/// 遷移の保存後に通知サービスへイベントを渡す。通知の失敗はログに残すだけで
/// 遷移は取り消さない。
pub async fn update_booking_status(
    deps: &ServiceDependencies,
    cmd: UpdateBookingStatus,
) -> Result<Booking> {
    // 1. 予約を取得
    let booking = deps
        .booking_ledger
        .get(cmd.booking_key)
        .await
        .map_err(BookingApplicationError::BookingLedgerError)?
        .ok_or(NotFoundError::Booking(cmd.booking_key))?;

    // 2. ドメイン層の純粋関数で遷移
    let (updated, event) = domain::booking::decide(&booking, cmd.decision, deps.clock.now())
        .map_err(|domain::TransitionError::AlreadyDecided { current }| {
            BookingApplicationError::InvalidTransition {
                key: cmd.booking_key,
                current,
            }
        })?;

    // 3. Pendingのままである場合に限り保存
    let swapped = deps
        .booking_ledger
        .transition(&updated, ApprovalStatus::Pending)
        .await
        .map_err(BookingApplicationError::BookingLedgerError)?;

    if !swapped {
        let current = deps
            .booking_ledger
            .get(cmd.booking_key)
            .await
            .map_err(BookingApplicationError::BookingLedgerError)?
            .map(|b| b.status)
            .ok_or(NotFoundError::Booking(cmd.booking_key))?;
        return Err(BookingApplicationError::InvalidTransition {
            key: cmd.booking_key,
            current,
        });
    }

    tracing::info!(
        booking_key = %cmd.booking_key,
        status = updated.status.as_str(),
        "Booking status changed"
    );

    // 4. 通知
    if let Err(e) = deps.notification_service.booking_status_changed(&event).await {
        tracing::warn!(
            booking_key = %cmd.booking_key,
            error = %e,
            "Failed to deliver status change notification"
        );
    }

    Ok(updated)
}
