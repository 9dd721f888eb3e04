pub mod blocked_date_store;
pub mod booking_ledger;
pub mod clock;
pub mod facility_registry;
pub mod identity_directory;
pub mod notification_service;

pub use blocked_date_store::BlockedDateStore;
pub use booking_ledger::{BookingLedger, ReserveOutcome};
pub use clock::Clock;
pub use facility_registry::FacilityRegistry;
pub use identity_directory::{IdentityDirectory, ResidentProfile};
pub use notification_service::NotificationService;
