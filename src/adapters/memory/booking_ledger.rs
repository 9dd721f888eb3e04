use crate::domain::{
    self, ApprovalStatus, Booking, BookingId, BookingKey, BookingKind, FacilityId, NewBooking,
    UserId,
};
use crate::ports::booking_ledger::{BookingLedger as BookingLedgerTrait, Result, ReserveOutcome};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// One table per booking kind, each with its own id sequence.
#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: BTreeMap<BookingId, Booking>,
}

#[derive(Debug, Default)]
struct State {
    sport: Table,
    event: Table,
}

impl State {
    fn table(&self, kind: BookingKind) -> &Table {
        match kind {
            BookingKind::Sport => &self.sport,
            BookingKind::Event => &self.event,
        }
    }

    fn table_mut(&mut self, kind: BookingKind) -> &mut Table {
        match kind {
            BookingKind::Sport => &mut self.sport,
            BookingKind::Event => &mut self.event,
        }
    }

    fn all(&self) -> impl Iterator<Item = &Booking> {
        self.sport.rows.values().chain(self.event.rows.values())
    }

    fn active_on(&self, facility_id: FacilityId, date: NaiveDate) -> Vec<Booking> {
        self.all()
            .filter(|b| b.facility_id == facility_id && b.slot.date == date)
            .filter(|b| b.status.holds_slot())
            .cloned()
            .collect()
    }
}

/// In-memory implementation of BookingLedger
///
/// The overlap check and the insert in `reserve` happen under a single lock,
/// so two overlapping bookings can never both be stored.
#[derive(Debug, Default)]
pub struct BookingLedger {
    state: Mutex<State>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| "booking ledger lock poisoned".into())
    }
}

#[async_trait]
impl BookingLedgerTrait for BookingLedger {
    async fn reserve(&self, booking: NewBooking) -> Result<ReserveOutcome> {
        let mut state = self.lock()?;

        let existing = state.active_on(booking.facility_id, booking.slot.date);
        let conflicts = domain::slot::find_conflicts(&existing, booking.facility_id, &booking.slot);
        if !conflicts.is_empty() {
            return Ok(ReserveOutcome::Clashed(conflicts));
        }

        let table = state.table_mut(booking.kind());
        table.next_id += 1;
        let stored = booking.into_booking(BookingId::new(table.next_id));
        table.rows.insert(stored.booking_id, stored.clone());
        Ok(ReserveOutcome::Reserved(stored))
    }

    async fn get(&self, key: BookingKey) -> Result<Option<Booking>> {
        Ok(self.lock()?.table(key.kind).rows.get(&key.id).cloned())
    }

    async fn find_active(&self, facility_id: FacilityId, date: NaiveDate) -> Result<Vec<Booking>> {
        Ok(self.lock()?.active_on(facility_id, date))
    }

    async fn transition(&self, updated: &Booking, expected: ApprovalStatus) -> Result<bool> {
        let mut state = self.lock()?;
        let Some(row) = state
            .table_mut(updated.kind())
            .rows
            .get_mut(&updated.booking_id)
        else {
            return Ok(false);
        };
        if row.status != expected {
            return Ok(false);
        }
        row.status = updated.status;
        row.updated_at = updated.updated_at;
        Ok(true)
    }

    async fn list_all(&self) -> Result<Vec<Booking>> {
        Ok(self.lock()?.all().cloned().collect())
    }

    async fn list_by_requester(&self, requester_id: UserId) -> Result<Vec<Booking>> {
        Ok(self
            .lock()?
            .all()
            .filter(|b| b.requester_id == requester_id)
            .cloned()
            .collect())
    }

    async fn count_by_facility(&self, facility_id: FacilityId) -> Result<usize> {
        Ok(self
            .lock()?
            .all()
            .filter(|b| b.facility_id == facility_id)
            .count())
    }
}
