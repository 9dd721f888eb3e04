use crate::domain::{BlockedDate, FacilityId};
use crate::ports::blocked_date_store::{BlockedDateStore as BlockedDateStoreTrait, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

type Entries = BTreeMap<(FacilityId, NaiveDate), BlockedDate>;

/// In-memory implementation of BlockedDateStore
///
/// Keyed by (facility, date) so listing a facility yields dates in ascending order.
#[derive(Debug, Default)]
pub struct BlockedDateStore {
    entries: Mutex<Entries>,
}

impl BlockedDateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| "blocked date store lock poisoned".into())
    }
}

#[async_trait]
impl BlockedDateStoreTrait for BlockedDateStore {
    async fn add(&self, blocked_date: BlockedDate) -> Result<bool> {
        let mut entries = self.lock()?;
        let key = (blocked_date.facility_id, blocked_date.date);
        if entries.contains_key(&key) {
            return Ok(false);
        }
        entries.insert(key, blocked_date);
        Ok(true)
    }

    async fn list(&self, facility_id: FacilityId) -> Result<Vec<BlockedDate>> {
        Ok(self
            .lock()?
            .range((facility_id, NaiveDate::MIN)..=(facility_id, NaiveDate::MAX))
            .map(|(_, blocked)| blocked.clone())
            .collect())
    }

    async fn find(&self, facility_id: FacilityId, date: NaiveDate) -> Result<Option<BlockedDate>> {
        Ok(self.lock()?.get(&(facility_id, date)).cloned())
    }

    async fn remove(&self, facility_id: FacilityId, date: NaiveDate) -> Result<bool> {
        Ok(self.lock()?.remove(&(facility_id, date)).is_some())
    }

    async fn remove_all(&self, facility_id: FacilityId) -> Result<()> {
        self.lock()?.retain(|(id, _), _| *id != facility_id);
        Ok(())
    }
}
