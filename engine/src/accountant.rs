//! Capacity accountant: the mutual-exclusion boundary around seat counters.
//!
//! The sole component permitted to mutate an event's `reserved` count.
//! `reserve` is linearizable per event: the check `reserved < capacity` and
//! the increment happen under the event's counter lock, so two concurrent
//! reserves against one remaining seat never both succeed. Lock hold time
//! covers only the read-modify-write of the counter, never I/O.

use crate::catalog::CatalogStore;
use crate::error::{EngineError, Result};
use crate::metrics;
use crate::types::EventId;
use chrono::{DateTime, Utc};
use std::sync::Arc;

fn lock_poisoned<T>(_: T) -> EngineError {
    EngineError::Storage("seat counter lock poisoned".to_string())
}

/// A seat held by a successful reserve, not yet backed by a ledger entry.
///
/// The registration service either writes a ledger entry for the hold or
/// hands it back via [`CapacityAccountant::release_hold`].
#[derive(Debug)]
#[must_use = "a held seat must be committed to a ledger entry or released"]
pub struct SeatHold {
    event_id: EventId,
}

impl SeatHold {
    /// Event whose seat this hold represents.
    #[must_use]
    pub const fn event_id(&self) -> EventId {
        self.event_id
    }
}

/// Atomic check-and-reserve / release over the catalog's counter cells.
#[derive(Clone, Debug)]
pub struct CapacityAccountant {
    catalog: Arc<CatalogStore>,
}

impl CapacityAccountant {
    /// Creates an accountant over the given catalog.
    #[must_use]
    pub const fn new(catalog: Arc<CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Atomically tests `reserved < capacity` and increments on success.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if the event does not exist (or was deleted while
    ///   this call was in flight).
    /// - `EventClosed` if the event is deactivated or has already started.
    /// - `EventFull` if every seat is held; state is not mutated.
    /// - `Storage` on a poisoned lock.
    pub fn reserve(&self, event_id: EventId, now: DateTime<Utc>) -> Result<SeatHold> {
        let entry = self.catalog.entry(event_id)?;

        // Closed-ness is read outside the counter lock; an event closing
        // mid-call is indistinguishable from one closing just after.
        {
            let meta = entry.meta.read().map_err(lock_poisoned)?;
            if !meta.is_active || meta.starts_at <= now {
                return Err(EngineError::EventClosed);
            }
        }

        let mut seats = entry.seats.lock().map_err(lock_poisoned)?;
        if seats.deleted {
            return Err(EngineError::EventNotFound);
        }
        if seats.reserved >= seats.capacity {
            return Err(EngineError::EventFull);
        }
        seats.reserved += 1;
        Ok(SeatHold { event_id })
    }

    /// Atomically decrements the counter, floored at zero.
    ///
    /// # Errors
    ///
    /// - `CounterUnderflow` if the counter was already zero; the counter
    ///   stays clamped and the anomaly is logged and counted.
    /// - `EventNotFound` / `Storage` as for [`Self::reserve`].
    pub fn release(&self, event_id: EventId) -> Result<()> {
        let entry = self.catalog.entry(event_id)?;
        let mut seats = entry.seats.lock().map_err(lock_poisoned)?;
        if seats.deleted {
            return Err(EngineError::EventNotFound);
        }
        if seats.reserved == 0 {
            debug_assert!(false, "release on event {event_id} with zero reserved seats");
            tracing::error!(%event_id, "seat counter underflow; clamped at zero");
            metrics::record_counter_underflow();
            return Err(EngineError::CounterUnderflow);
        }
        seats.reserved -= 1;
        Ok(())
    }

    /// Releases a seat that never made it into the ledger.
    ///
    /// # Errors
    ///
    /// As for [`Self::release`].
    pub fn release_hold(&self, hold: SeatHold) -> Result<()> {
        self.release(hold.event_id)
    }

    /// Overwrites the counter from a recomputed live-registration count.
    /// Reconciliation only; returns the previous value.
    pub(crate) fn overwrite_reserved(&self, event_id: EventId, live_count: u32) -> Result<u32> {
        let entry = self.catalog.entry(event_id)?;
        let mut seats = entry.seats.lock().map_err(lock_poisoned)?;
        if seats.deleted {
            return Err(EngineError::EventNotFound);
        }
        let previous = seats.reserved;
        seats.reserved = live_count.min(seats.capacity);
        Ok(previous)
    }
}
