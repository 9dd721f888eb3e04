use crate::domain::{Facility, FacilityId, FacilitySpec};
use crate::ports::facility_registry::{FacilityRegistry as FacilityRegistryTrait, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    facilities: BTreeMap<FacilityId, Facility>,
}

/// In-memory implementation of FacilityRegistry
///
/// Ids are assigned from a counter starting at 1 and never reused.
#[derive(Debug, Default)]
pub struct FacilityRegistry {
    state: Mutex<State>,
}

impl FacilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| "facility registry lock poisoned".into())
    }
}

#[async_trait]
impl FacilityRegistryTrait for FacilityRegistry {
    async fn list(&self) -> Result<Vec<Facility>> {
        Ok(self.lock()?.facilities.values().cloned().collect())
    }

    async fn get(&self, facility_id: FacilityId) -> Result<Option<Facility>> {
        Ok(self.lock()?.facilities.get(&facility_id).cloned())
    }

    async fn insert(&self, spec: FacilitySpec) -> Result<Facility> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let facility = Facility::from_spec(FacilityId::new(state.next_id), spec);
        state
            .facilities
            .insert(facility.facility_id, facility.clone());
        Ok(facility)
    }

    async fn save(&self, facility: &Facility) -> Result<bool> {
        let mut state = self.lock()?;
        match state.facilities.get_mut(&facility.facility_id) {
            Some(slot) => {
                *slot = facility.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, facility_id: FacilityId) -> Result<bool> {
        Ok(self.lock()?.facilities.remove(&facility_id).is_some())
    }
}
