//! Catalog store: event records and their seat-counter cells.
//!
//! Arena-style storage keyed by event id. Each event owns one
//! exclusive-access counter cell so unrelated events never contend on a
//! shared lock. The store enforces access discipline only; the capacity
//! accountant is the sole mutator of `reserved`, and all business rules
//! live in the registration service.

use crate::error::{EngineError, Result};
use crate::types::{Capacity, Event, EventId, EventSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Seat counter for a single event. Guarded by the entry's mutex; the
/// invariant `reserved <= capacity` holds whenever the lock is released.
#[derive(Debug)]
pub(crate) struct SeatCounter {
    /// Seating capacity, editable only through [`CatalogStore::edit_capacity`].
    pub(crate) capacity: u32,
    /// Seats held by live registrations.
    pub(crate) reserved: u32,
    /// Tombstone set under the lock during deletion so an in-flight reserve
    /// that already fetched the entry cannot resurrect the event.
    pub(crate) deleted: bool,
}

/// One event's storage cell: metadata and the seat counter, each behind its
/// own lock so metadata reads never serialize against seat accounting.
#[derive(Debug)]
pub(crate) struct EventEntry {
    pub(crate) meta: RwLock<Event>,
    pub(crate) seats: Mutex<SeatCounter>,
}

/// In-memory catalog of events.
#[derive(Debug, Default)]
pub struct CatalogStore {
    events: RwLock<HashMap<EventId, Arc<EventEntry>>>,
}

fn lock_poisoned<T>(_: T) -> EngineError {
    EngineError::Storage("catalog lock poisoned".to_string())
}

impl CatalogStore {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new event with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEvent` if an event with this id already exists, or
    /// `Storage` on a poisoned lock.
    pub fn insert(&self, event: Event, capacity: Capacity) -> Result<()> {
        let mut events = self.events.write().map_err(lock_poisoned)?;
        if events.contains_key(&event.id) {
            return Err(EngineError::InvalidEvent {
                reason: format!("event {} already exists", event.id),
            });
        }
        events.insert(
            event.id,
            Arc::new(EventEntry {
                meta: RwLock::new(event),
                seats: Mutex::new(SeatCounter {
                    capacity: capacity.value(),
                    reserved: 0,
                    deleted: false,
                }),
            }),
        );
        Ok(())
    }

    /// Fetches the storage cell for an event.
    pub(crate) fn entry(&self, event_id: EventId) -> Result<Arc<EventEntry>> {
        let events = self.events.read().map_err(lock_poisoned)?;
        events
            .get(&event_id)
            .cloned()
            .ok_or(EngineError::EventNotFound)
    }

    /// Metadata-only read of one event.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a poisoned lock.
    pub fn event(&self, event_id: EventId) -> Result<Event> {
        let entry = self.entry(event_id)?;
        let event = entry.meta.read().map_err(lock_poisoned)?.clone();
        Ok(event)
    }

    /// Consistent read of one event with its counter.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a poisoned lock.
    pub fn snapshot(&self, event_id: EventId) -> Result<EventSnapshot> {
        let entry = self.entry(event_id)?;
        Self::snapshot_entry(&entry)
    }

    /// Snapshots of every event in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn snapshots(&self) -> Result<Vec<EventSnapshot>> {
        let entries: Vec<Arc<EventEntry>> = {
            let events = self.events.read().map_err(lock_poisoned)?;
            events.values().cloned().collect()
        };
        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in entries {
            match Self::snapshot_entry(&entry) {
                Ok(snapshot) => snapshots.push(snapshot),
                // Lost a race with deletion; the event is simply gone.
                Err(EngineError::EventNotFound) => {}
                Err(other) => return Err(other),
            }
        }
        Ok(snapshots)
    }

    fn snapshot_entry(entry: &EventEntry) -> Result<EventSnapshot> {
        let (capacity, reserved) = {
            let seats = entry.seats.lock().map_err(lock_poisoned)?;
            if seats.deleted {
                return Err(EngineError::EventNotFound);
            }
            (seats.capacity, seats.reserved)
        };
        let event = entry.meta.read().map_err(lock_poisoned)?.clone();
        Ok(EventSnapshot {
            event,
            capacity: Capacity::new(capacity),
            reserved_count: reserved,
        })
    }

    /// Applies a metadata mutation and returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a poisoned lock.
    pub fn update_meta(
        &self,
        event_id: EventId,
        mutate: impl FnOnce(&mut Event),
    ) -> Result<Event> {
        let entry = self.entry(event_id)?;
        let mut meta = entry.meta.write().map_err(lock_poisoned)?;
        mutate(&mut meta);
        Ok(meta.clone())
    }

    /// Changes an event's capacity, never below the current reserved count.
    ///
    /// # Errors
    ///
    /// Returns `CapacityBelowReserved` if live registrations exceed the
    /// requested capacity, `EventNotFound` for unknown ids, `Storage` on a
    /// poisoned lock.
    pub fn edit_capacity(&self, event_id: EventId, new_capacity: Capacity) -> Result<()> {
        let entry = self.entry(event_id)?;
        let mut seats = entry.seats.lock().map_err(lock_poisoned)?;
        if seats.deleted {
            return Err(EngineError::EventNotFound);
        }
        if new_capacity.value() < seats.reserved {
            return Err(EngineError::CapacityBelowReserved {
                requested: new_capacity.value(),
                reserved: seats.reserved,
            });
        }
        seats.capacity = new_capacity.value();
        Ok(())
    }

    /// Removes an event, tombstoning its counter cell first.
    ///
    /// # Errors
    ///
    /// Returns `HasActiveRegistrations` if any seat is still reserved (an
    /// in-flight claim can hold a seat the ledger does not show yet),
    /// `EventNotFound` for unknown ids, `Storage` on a poisoned lock.
    pub fn remove(&self, event_id: EventId) -> Result<Event> {
        let mut events = self.events.write().map_err(lock_poisoned)?;
        let entry = events.get(&event_id).ok_or(EngineError::EventNotFound)?;
        {
            let mut seats = entry.seats.lock().map_err(lock_poisoned)?;
            if seats.deleted {
                return Err(EngineError::EventNotFound);
            }
            if seats.reserved > 0 {
                return Err(EngineError::HasActiveRegistrations {
                    count: seats.reserved as usize,
                });
            }
            seats.deleted = true;
        }
        let entry = events.remove(&event_id).ok_or(EngineError::EventNotFound)?;
        let event = entry.meta.read().map_err(lock_poisoned)?.clone();
        Ok(event)
    }

    /// Number of events currently stored.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn len(&self) -> Result<usize> {
        Ok(self.events.read().map_err(lock_poisoned)?.len())
    }

    /// Whether the catalog holds no events.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.events.read().map_err(lock_poisoned)?.is_empty())
    }
}
