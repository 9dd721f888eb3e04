use crate::application::booking::{
    BookingApplicationError, ConflictError, NotFoundError, ValidationError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Application(BookingApplicationError),
    /// リクエストの形が不正（アプリケーション層に渡す前に検出）
    InvalidRequest(String),
}

impl From<BookingApplicationError> for ApiError {
    fn from(err: BookingApplicationError) -> Self {
        ApiError::Application(err)
    }
}

fn validation_code(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::UnknownFacility(_) => "UNKNOWN_FACILITY",
        ValidationError::KindMismatch { .. } => "KIND_MISMATCH",
        ValidationError::PastDate => "PAST_DATE",
        _ => "VALIDATION_ERROR",
    }
}

fn conflict_code(err: &ConflictError) -> &'static str {
    match err {
        ConflictError::Maintenance(_) => "FACILITY_UNDER_MAINTENANCE",
        ConflictError::BlockedDate { .. } => "DATE_BLOCKED",
        ConflictError::SlotTaken { .. } => "SLOT_TAKEN",
        ConflictError::DuplicateBlockedDate { .. } => "DUPLICATE_BLOCKED_DATE",
        ConflictError::FacilityInUse(_) => "FACILITY_IN_USE",
    }
}

fn not_found_code(err: &NotFoundError) -> &'static str {
    match err {
        NotFoundError::Facility(_) => "FACILITY_NOT_FOUND",
        NotFoundError::Booking(_) => "BOOKING_NOT_FOUND",
        NotFoundError::BlockedDate { .. } => "BLOCKED_DATE_NOT_FOUND",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            // 400 Bad Request - リクエストの形が不正
            ApiError::InvalidRequest(message) => {
                let body = Json(ErrorResponse::new("INVALID_REQUEST", message));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            ApiError::Application(err) => err,
        };

        let (status, error_type) = match &err {
            BookingApplicationError::Validation(e) => (StatusCode::BAD_REQUEST, validation_code(e)),

            // 409 Conflict - 枠が確保できない（別の日時なら成功しうる）
            BookingApplicationError::Conflict(e) => (StatusCode::CONFLICT, conflict_code(e)),

            // 404 Not Found - リクエストされたリソースが存在しない
            BookingApplicationError::NotFound(e) => (StatusCode::NOT_FOUND, not_found_code(e)),

            // 422 Unprocessable Entity - 状態遷移の規則違反
            BookingApplicationError::InvalidTransition { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_TRANSITION")
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            BookingApplicationError::FacilityRegistryError(e) => {
                tracing::error!("Facility registry error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "FACILITY_REGISTRY_ERROR")
            }
            BookingApplicationError::BlockedDateStoreError(e) => {
                tracing::error!("Blocked date store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "BLOCKED_DATE_STORE_ERROR")
            }
            BookingApplicationError::BookingLedgerError(e) => {
                tracing::error!("Booking ledger error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "BOOKING_LEDGER_ERROR")
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        let conflicts = match err {
            BookingApplicationError::Conflict(ConflictError::SlotTaken { conflicts }) => conflicts,
            _ => Vec::new(),
        };

        let body = Json(ErrorResponse::new(error_type, message).with_conflicts(conflicts));
        (status, body).into_response()
    }
}
