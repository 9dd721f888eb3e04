use crate::domain::events::BookingStatusChanged;
use crate::ports::notification_service::{NotificationService as NotificationServiceTrait, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mock implementation of NotificationService
///
/// Does not send actual notifications.
/// Records every event it receives so tests can assert on them.
#[derive(Debug, Default)]
pub struct NotificationService {
    sent: Mutex<Vec<BookingStatusChanged>>,
    failing: AtomicBool,
}

impl NotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order
    pub fn sent(&self) -> Vec<BookingStatusChanged> {
        self.sent.lock().unwrap().clone()
    }

    /// Make every delivery fail (events are not recorded)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationServiceTrait for NotificationService {
    async fn booking_status_changed(&self, event: &BookingStatusChanged) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("notification channel unavailable".into());
        }
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }
}
