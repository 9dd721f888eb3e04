use crate::domain::value_objects::UserId;
use crate::ports::identity_directory::{
    IdentityDirectory as IdentityDirectoryTrait, ResidentProfile, Result,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mock implementation of IdentityDirectory
///
/// Supports stateful testing by storing resident profiles.
/// Can be switched into a failing mode to simulate an unreachable directory.
#[derive(Debug, Default)]
pub struct IdentityDirectory {
    profiles: Mutex<HashMap<UserId, ResidentProfile>>,
    failing: AtomicBool,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resident for testing purposes
    pub fn add_resident(&self, user_id: UserId, display_name: &str, unit_label: &str) {
        self.profiles.lock().unwrap().insert(
            user_id,
            ResidentProfile {
                display_name: display_name.to_string(),
                unit_label: unit_label.to_string(),
            },
        );
    }

    /// Make every lookup fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl IdentityDirectoryTrait for IdentityDirectory {
    /// Look up the registered profile, if any
    async fn resolve(&self, user_id: UserId) -> Result<Option<ResidentProfile>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("identity directory unavailable".into());
        }
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }
}
