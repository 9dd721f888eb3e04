use crate::application::booking::{
    self as service, BookingFilter, BookingView, ServiceDependencies,
};
use crate::domain::{
    ApprovalStatus, BookingKey, FacilityId, UserId, commands::UpdateBookingStatus,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        AvailabilityResponse, BlockedDateRequest, BlockedDateResponse, BookingResponse,
        CreateBookingRequest, FacilityRequest, FacilityResponse, ListBookingsQuery, SlotQuery,
        UpdateStatusRequest, parse_time,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Facility handlers
// ============================================================================

/// GET /facilities - 施設一覧
pub async fn list_facilities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FacilityResponse>>, ApiError> {
    let facilities = service::list_facilities(&state.service_deps).await?;
    Ok(Json(facilities.into_iter().map(FacilityResponse::from).collect()))
}

/// POST /facilities - 施設を登録
pub async fn create_facility(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FacilityRequest>,
) -> Result<(StatusCode, Json<FacilityResponse>), ApiError> {
    let facility = service::create_facility(&state.service_deps, req.into_spec()).await?;
    Ok((StatusCode::CREATED, Json(FacilityResponse::from(facility))))
}

/// GET /facilities/:id - 施設詳細
pub async fn get_facility(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
) -> Result<Json<FacilityResponse>, ApiError> {
    let facility = service::get_facility(&state.service_deps, FacilityId::new(facility_id)).await?;
    Ok(Json(FacilityResponse::from(facility)))
}

/// PUT /facilities/:id - 施設の属性を更新
///
/// 予約が残っている施設の種別変更は409になる。
pub async fn update_facility(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
    Json(req): Json<FacilityRequest>,
) -> Result<Json<FacilityResponse>, ApiError> {
    let facility = service::update_facility(
        &state.service_deps,
        FacilityId::new(facility_id),
        req.into_spec(),
    )
    .await?;
    Ok(Json(FacilityResponse::from(facility)))
}

/// DELETE /facilities/:id - 施設を削除
///
/// 予約が残っている施設は削除できない（409）。
pub async fn delete_facility(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    service::delete_facility(&state.service_deps, FacilityId::new(facility_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /facilities/:id/availability - 稼働状態を切り替え
pub async fn toggle_availability(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
) -> Result<Json<FacilityResponse>, ApiError> {
    let facility =
        service::toggle_facility_availability(&state.service_deps, FacilityId::new(facility_id))
            .await?;
    Ok(Json(FacilityResponse::from(facility)))
}

/// GET /facilities/:id/slots - 空き確認
///
/// クエリパラメータ: date, start_time (HH:MM), duration_hours
pub async fn check_slot(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let start_time = parse_time(&query.start_time)?;
    let report = service::check_availability(
        &state.service_deps,
        FacilityId::new(facility_id),
        query.date,
        start_time,
        query.duration_hours,
    )
    .await?;
    Ok(Json(AvailabilityResponse::from(report)))
}

// ============================================================================
// Blocked date handlers
// ============================================================================

/// GET /facilities/:id/blocked-dates - 予約停止日一覧
pub async fn list_blocked_dates(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
) -> Result<Json<Vec<BlockedDateResponse>>, ApiError> {
    let dates = service::list_blocked_dates(&state.service_deps, FacilityId::new(facility_id)).await?;
    Ok(Json(dates.into_iter().map(BlockedDateResponse::from).collect()))
}

/// POST /facilities/:id/blocked-dates - 予約停止日を登録
pub async fn add_blocked_date(
    State(state): State<Arc<AppState>>,
    Path(facility_id): Path<i64>,
    Json(req): Json<BlockedDateRequest>,
) -> Result<(StatusCode, Json<BlockedDateResponse>), ApiError> {
    let cmd = req.to_command(FacilityId::new(facility_id));
    let blocked = service::add_blocked_date(&state.service_deps, cmd).await?;
    Ok((StatusCode::CREATED, Json(BlockedDateResponse::from(blocked))))
}

/// DELETE /facilities/:id/blocked-dates/:date - 予約停止日を削除
pub async fn remove_blocked_date(
    State(state): State<Arc<AppState>>,
    Path((facility_id, date)): Path<(i64, NaiveDate)>,
) -> Result<StatusCode, ApiError> {
    service::remove_blocked_date(&state.service_deps, FacilityId::new(facility_id), date).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Booking handlers
// ============================================================================

/// POST /bookings - 利用を申請
///
/// 強制されるビジネスルール:
/// - 施設が存在し、予約種別が施設種別と一致すること
/// - 過去の日付でないこと
/// - 施設がメンテナンス中でなく、予約停止日でもないこと
/// - 既存のPending/Approved予約と時間が重ならないこと
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let cmd = req.to_command()?;
    let booking = service::create_booking(&state.service_deps, cmd).await?;
    Ok((StatusCode::CREATED, Json(BookingResponse::from(booking))))
}

/// GET /bookings - 管理者用の統合予約一覧
///
/// クエリパラメータ:
/// - status: ステータスでフィルタリング（pending, approved, rejected）（オプション）
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ApprovalStatus>)
        .transpose()
        .map_err(ApiError::InvalidRequest)?;

    let views = service::list_all_bookings(&state.service_deps, BookingFilter { status }).await?;
    Ok(Json(views))
}

/// GET /users/:id/bookings - 居住者本人の予約一覧
pub async fn list_user_bookings(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    let views =
        service::list_bookings_for_user(&state.service_deps, UserId::from_uuid(user_id)).await?;
    Ok(Json(views))
}

/// PUT /bookings/:key/status - 予約を承認または却下
///
/// キーは "S-12" / "E-7" の形式。
/// 終端状態の予約への更新は422になる。
pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_key = key
        .parse::<BookingKey>()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

    let cmd = UpdateBookingStatus {
        booking_key,
        decision: req.decision()?,
    };

    let booking = service::update_booking_status(&state.service_deps, cmd).await?;
    Ok(Json(BookingResponse::from(booking)))
}
