use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::domain::{
    ApprovalStatus, Booking, BookingDetails, BookingKey, BookingKind, FacilityId, UserId,
};
use crate::ports::ResidentProfile;

use super::booking_service::ServiceDependencies;
use super::errors::{BookingApplicationError, Result};

/// 紐付けが見つからない名前の表示
pub const UNKNOWN_NAME: &str = "Unknown";
/// 紐付けが見つからない住戸の表示
pub const UNKNOWN_UNIT: &str = "N/A";

/// 統合予約ビュー（管理画面用のRead Model）
///
/// スポーツ予約とホール予約を1つの形にまとめ、申請者の表示情報を結合する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingView {
    pub booking_key: BookingKey,
    pub kind: BookingKind,
    pub facility_id: FacilityId,
    pub facility_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// 表示専用（開始 + 利用時間）
    pub end_time: String,
    pub duration_hours: u32,
    pub status: ApprovalStatus,
    pub requester_id: UserId,
    pub requester_name: String,
    pub unit_label: String,
    pub details: BookingDetails,
    pub created_at: DateTime<Utc>,
}

/// 管理者一覧の絞り込み条件
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<ApprovalStatus>,
}

/// 全予約を統合ビューで取得する
///
/// 並び順：日付の降順、同日内は開始時刻の降順、最後に予約キー。
pub async fn list_all_bookings(
    deps: &ServiceDependencies,
    filter: BookingFilter,
) -> Result<Vec<BookingView>> {
    let bookings = deps
        .booking_ledger
        .list_all()
        .await
        .map_err(BookingApplicationError::BookingLedgerError)?;

    let bookings = bookings
        .into_iter()
        .filter(|b| filter.status.is_none_or(|status| b.status == status))
        .collect();

    compose(deps, bookings).await
}

/// 居住者本人の予約を統合ビューで取得する
pub async fn list_bookings_for_user(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<BookingView>> {
    let bookings = deps
        .booking_ledger
        .list_by_requester(user_id)
        .await
        .map_err(BookingApplicationError::BookingLedgerError)?;

    compose(deps, bookings).await
}

/// 申請者の表示情報をまとめて解決する
///
/// 照会に失敗した居住者は見つからなかったものとして扱い、一覧全体は失敗させない。
async fn resolve_profiles(
    deps: &ServiceDependencies,
    bookings: &[Booking],
) -> HashMap<UserId, ResidentProfile> {
    let requesters: HashSet<UserId> = bookings.iter().map(|b| b.requester_id).collect();

    let lookups = requesters.into_iter().map(|user_id| async move {
        match deps.identity_directory.resolve(user_id).await {
            Ok(profile) => profile.map(|p| (user_id, p)),
            Err(e) => {
                tracing::warn!(user_id = %user_id.value(), error = %e, "Identity lookup failed");
                None
            }
        }
    });

    join_all(lookups).await.into_iter().flatten().collect()
}

async fn compose(deps: &ServiceDependencies, mut bookings: Vec<Booking>) -> Result<Vec<BookingView>> {
    let facility_names: HashMap<FacilityId, String> = deps
        .facility_registry
        .list()
        .await
        .map_err(BookingApplicationError::FacilityRegistryError)?
        .into_iter()
        .map(|f| (f.facility_id, f.name))
        .collect();

    let profiles = resolve_profiles(deps, &bookings).await;

    bookings.sort_by(|a, b| {
        b.slot
            .date
            .cmp(&a.slot.date)
            .then(b.slot.start_time.cmp(&a.slot.start_time))
            .then(a.key().cmp(&b.key()))
    });

    let views = bookings
        .into_iter()
        .map(|booking| {
            let profile = profiles.get(&booking.requester_id);
            BookingView {
                booking_key: booking.key(),
                kind: booking.kind(),
                facility_id: booking.facility_id,
                facility_name: facility_names
                    .get(&booking.facility_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                date: booking.slot.date,
                start_time: booking.slot.start_time,
                end_time: booking.slot.end_label(),
                duration_hours: booking.slot.duration.value(),
                status: booking.status,
                requester_id: booking.requester_id,
                requester_name: profile
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                unit_label: profile
                    .map(|p| p.unit_label.clone())
                    .unwrap_or_else(|| UNKNOWN_UNIT.to_string()),
                details: booking.details,
                created_at: booking.created_at,
            }
        })
        .collect();

    Ok(views)
}
