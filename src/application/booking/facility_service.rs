use chrono::NaiveDate;

use crate::domain::{BlockedDate, Facility, FacilityId, FacilitySpec, commands::AddBlockedDate};

use super::booking_service::{ServiceDependencies, find_facility};
use super::errors::{BookingApplicationError, ConflictError, NotFoundError, Result, ValidationError};

/// 存在しない施設をNotFoundとして扱うヘルパー関数
async fn require_facility(deps: &ServiceDependencies, facility_id: FacilityId) -> Result<Facility> {
    find_facility(&deps.facility_registry, facility_id)
        .await?
        .ok_or_else(|| NotFoundError::Facility(facility_id).into())
}

async fn has_bookings(deps: &ServiceDependencies, facility_id: FacilityId) -> Result<bool> {
    let count = deps
        .booking_ledger
        .count_by_facility(facility_id)
        .await
        .map_err(BookingApplicationError::BookingLedgerError)?;
    Ok(count > 0)
}

async fn save_facility(deps: &ServiceDependencies, facility: &Facility) -> Result<()> {
    let saved = deps
        .facility_registry
        .save(facility)
        .await
        .map_err(BookingApplicationError::FacilityRegistryError)?;
    if !saved {
        return Err(NotFoundError::Facility(facility.facility_id).into());
    }
    Ok(())
}

/// 全施設を取得する
pub async fn list_facilities(deps: &ServiceDependencies) -> Result<Vec<Facility>> {
    deps.facility_registry
        .list()
        .await
        .map_err(BookingApplicationError::FacilityRegistryError)
}

/// IDで施設を取得する
pub async fn get_facility(deps: &ServiceDependencies, facility_id: FacilityId) -> Result<Facility> {
    require_facility(deps, facility_id).await
}

/// 施設を登録する
///
/// 新しい施設は予約受付中（Available）で始まる。
pub async fn create_facility(deps: &ServiceDependencies, spec: FacilitySpec) -> Result<Facility> {
    spec.validate().map_err(ValidationError::from)?;

    let facility = deps
        .facility_registry
        .insert(spec)
        .await
        .map_err(BookingApplicationError::FacilityRegistryError)?;

    tracing::info!(facility_id = %facility.facility_id, name = %facility.name, "Facility created");
    Ok(facility)
}

/// 施設の属性を更新する
///
/// ビジネスルール：
/// - 予約が残っている施設の種別は変更できない（予約種別との一致が崩れるため）
/// - 稼働状態はこの操作では変わらない
///
/// 読み取りから保存まで施設ロックを排他で保持する。
pub async fn update_facility(
    deps: &ServiceDependencies,
    facility_id: FacilityId,
    spec: FacilitySpec,
) -> Result<Facility> {
    spec.validate().map_err(ValidationError::from)?;

    let _guard = deps.slot_locks.exclusive_facility(facility_id).await;

    let current = require_facility(deps, facility_id).await?;
    if current.kind != spec.kind && has_bookings(deps, facility_id).await? {
        return Err(ConflictError::FacilityInUse(facility_id).into());
    }

    let updated = current.apply_spec(spec);
    save_facility(deps, &updated).await?;
    Ok(updated)
}

/// 施設を削除する
///
/// ビジネスルール：
/// - 予約（ステータスを問わない）が残っている施設は削除できない
/// - 施設の予約停止日も合わせて削除する
pub async fn delete_facility(deps: &ServiceDependencies, facility_id: FacilityId) -> Result<()> {
    let _guard = deps.slot_locks.exclusive_facility(facility_id).await;

    require_facility(deps, facility_id).await?;

    if has_bookings(deps, facility_id).await? {
        return Err(ConflictError::FacilityInUse(facility_id).into());
    }

    deps.blocked_date_store
        .remove_all(facility_id)
        .await
        .map_err(BookingApplicationError::BlockedDateStoreError)?;

    let deleted = deps
        .facility_registry
        .delete(facility_id)
        .await
        .map_err(BookingApplicationError::FacilityRegistryError)?;
    if !deleted {
        return Err(NotFoundError::Facility(facility_id).into());
    }

    tracing::info!(facility_id = %facility_id, "Facility deleted");
    Ok(())
}

/// 稼働状態を Available ⇔ Maintenance で切り替える
///
/// 新規申請の受付可否だけが変わる。既存の予約（Approved/Pendingとも）は
/// 取り消さず、承認・却下もそのまま行える。
pub async fn toggle_facility_availability(
    deps: &ServiceDependencies,
    facility_id: FacilityId,
) -> Result<Facility> {
    let _guard = deps.slot_locks.exclusive_facility(facility_id).await;

    let toggled = require_facility(deps, facility_id)
        .await?
        .toggle_availability();
    save_facility(deps, &toggled).await?;

    tracing::info!(
        facility_id = %facility_id,
        availability = toggled.availability.as_str(),
        "Facility availability toggled"
    );
    Ok(toggled)
}

/// 予約停止日を登録する
///
/// 既存の予約には影響しない。登録は同じ (施設, 日付) の予約確保と直列化される。
pub async fn add_blocked_date(deps: &ServiceDependencies, cmd: AddBlockedDate) -> Result<BlockedDate> {
    let reason = cmd.reason.trim();
    if reason.is_empty() {
        return Err(ValidationError::EmptyReason.into());
    }

    let _facility_guard = deps.slot_locks.share_facility(cmd.facility_id).await;
    require_facility(deps, cmd.facility_id).await?;

    let _slot_guard = deps.slot_locks.acquire(cmd.facility_id, cmd.date).await;

    let blocked_date = BlockedDate {
        facility_id: cmd.facility_id,
        date: cmd.date,
        reason: reason.to_string(),
    };

    let added = deps
        .blocked_date_store
        .add(blocked_date.clone())
        .await
        .map_err(BookingApplicationError::BlockedDateStoreError)?;
    if !added {
        return Err(ConflictError::DuplicateBlockedDate {
            facility_id: cmd.facility_id,
            date: cmd.date,
        }
        .into());
    }

    tracing::info!(facility_id = %cmd.facility_id, date = %cmd.date, "Blocked date added");
    Ok(blocked_date)
}

/// 施設の予約停止日を日付昇順で取得する
pub async fn list_blocked_dates(
    deps: &ServiceDependencies,
    facility_id: FacilityId,
) -> Result<Vec<BlockedDate>> {
    require_facility(deps, facility_id).await?;

    deps.blocked_date_store
        .list(facility_id)
        .await
        .map_err(BookingApplicationError::BlockedDateStoreError)
}

/// 予約停止日を削除する
pub async fn remove_blocked_date(
    deps: &ServiceDependencies,
    facility_id: FacilityId,
    date: NaiveDate,
) -> Result<()> {
    let _facility_guard = deps.slot_locks.share_facility(facility_id).await;
    require_facility(deps, facility_id).await?;

    let _slot_guard = deps.slot_locks.acquire(facility_id, date).await;

    let removed = deps
        .blocked_date_store
        .remove(facility_id, date)
        .await
        .map_err(BookingApplicationError::BlockedDateStoreError)?;
    if !removed {
        return Err(NotFoundError::BlockedDate { facility_id, date }.into());
    }
    Ok(())
}
