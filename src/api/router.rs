use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, add_blocked_date, check_slot, create_booking, create_facility, delete_facility,
    get_facility, list_blocked_dates, list_bookings, list_facilities, list_user_bookings,
    remove_blocked_date, toggle_availability, update_booking_status, update_facility,
};

/// Creates the API router with all amenity booking endpoints
///
/// Facility catalog:
/// - GET/POST /facilities
/// - GET/PUT/DELETE /facilities/:id
/// - POST /facilities/:id/availability - Toggle maintenance
/// - GET /facilities/:id/slots - Check a slot
/// - GET/POST /facilities/:id/blocked-dates
/// - DELETE /facilities/:id/blocked-dates/:date
///
/// Bookings:
/// - POST /bookings - Request a booking
/// - GET /bookings - Unified view for admins
/// - GET /users/:id/bookings - Unified view for one resident
/// - PUT /bookings/:key/status - Approve or reject
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Facilities
        .route("/facilities", get(list_facilities).post(create_facility))
        .route(
            "/facilities/:id",
            get(get_facility).put(update_facility).delete(delete_facility),
        )
        .route("/facilities/:id/availability", post(toggle_availability))
        .route("/facilities/:id/slots", get(check_slot))
        .route(
            "/facilities/:id/blocked-dates",
            get(list_blocked_dates).post(add_blocked_date),
        )
        .route(
            "/facilities/:id/blocked-dates/:date",
            delete(remove_blocked_date),
        )
        // Bookings
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/:key/status", put(update_booking_status))
        .route("/users/:id/bookings", get(list_user_bookings))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
