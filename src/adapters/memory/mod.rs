pub mod blocked_date_store;
pub mod booking_ledger;
pub mod facility_registry;

pub use blocked_date_store::BlockedDateStore;
pub use booking_ledger::BookingLedger;
pub use facility_registry::FacilityRegistry;
