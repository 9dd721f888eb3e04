pub mod clock;
pub mod identity_directory;
pub mod notification_service;

pub use clock::FixedClock;
pub use identity_directory::IdentityDirectory;
pub use notification_service::NotificationService;
