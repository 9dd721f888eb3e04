pub mod booking;
pub mod commands;
pub mod errors;
pub mod events;
pub mod facility;
pub mod slot;
pub mod value_objects;

pub use booking::{Booking, BookingDetails, NewBooking};
pub use errors::*;
pub use events::*;
pub use facility::{BlockedDate, Facility, FacilitySpec};
pub use slot::{AvailabilityReport, Span, TimeSlot, UnavailableReason};
pub use value_objects::*;
