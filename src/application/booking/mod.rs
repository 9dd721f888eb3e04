mod booking_service;
mod booking_view;
mod errors;
mod facility_service;
mod slot_locks;

pub use booking_service::{
    ServiceDependencies, check_availability, create_booking, update_booking_status,
};
pub use booking_view::{
    BookingFilter, BookingView, UNKNOWN_NAME, UNKNOWN_UNIT, list_all_bookings,
    list_bookings_for_user,
};
pub use errors::{
    BookingApplicationError, ConflictError, NotFoundError, Result, ValidationError,
};
pub use facility_service::{
    add_blocked_date, create_facility, delete_facility, get_facility, list_blocked_dates,
    list_facilities, remove_blocked_date, toggle_facility_availability, update_facility,
};
pub use slot_locks::{FacilityGuard, SlotGuard, SlotLocks};
