//! Registration ledger: keyed storage for seat claims.
//!
//! Holds one record per claim attempt plus two auxiliary structures that
//! implement the access discipline the service relies on:
//!
//! - a **live-pair index** mapping each (student, event) pair to its
//!   non-cancelled registration, kept in sync by every mutation so the
//!   at-most-one-live-registration invariant is checkable in O(1);
//! - a **pair-lock table** handing out one mutex per (student, event) pair
//!   on demand, so existence-check-then-create is serialized per pair
//!   rather than behind one global lock.
//!
//! No business logic lives here; state transitions are validated by the
//! registration service.

use crate::error::{EngineError, Result};
use crate::types::{EventId, Registration, RegistrationId, StudentId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Key of the per-pair exclusivity domain.
pub type PairKey = (StudentId, EventId);

fn lock_poisoned<T>(_: T) -> EngineError {
    EngineError::Storage("ledger lock poisoned".to_string())
}

/// In-memory registration ledger.
#[derive(Debug, Default)]
pub struct RegistrationLedger {
    registrations: RwLock<HashMap<RegistrationId, Registration>>,
    live_pairs: RwLock<HashMap<PairKey, RegistrationId>>,
    pair_locks: Mutex<HashMap<PairKey, Arc<Mutex<()>>>>,
}

impl RegistrationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Pair locks
    // ========================================================================

    /// Fetches (creating on demand) the mutex serializing claims for a pair.
    ///
    /// The caller locks the returned mutex for the duration of its
    /// existence-check-then-create sequence and afterwards calls
    /// [`Self::release_pair_lock`] so the table tracks the working set
    /// rather than every pair ever seen.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn pair_lock(&self, student_id: &StudentId, event_id: EventId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.pair_locks.lock().map_err(lock_poisoned)?;
        Ok(Arc::clone(
            locks
                .entry((student_id.clone(), event_id))
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        ))
    }

    /// Drops a pair's lock entry once no claim is using it.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn release_pair_lock(&self, student_id: &StudentId, event_id: EventId) -> Result<()> {
        let mut locks = self.pair_locks.lock().map_err(lock_poisoned)?;
        let key = (student_id.clone(), event_id);
        // Strong count 1 means only the table itself still holds the Arc.
        if locks.get(&key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&key);
        }
        Ok(())
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Inserts a new registration, enforcing pair exclusivity.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if a live registration already exists for
    /// the pair, `Storage` on a poisoned lock.
    pub fn insert(&self, registration: Registration) -> Result<()> {
        let mut registrations = self.registrations.write().map_err(lock_poisoned)?;
        let mut live_pairs = self.live_pairs.write().map_err(lock_poisoned)?;

        let key = (registration.student_id.clone(), registration.event_id);
        if registration.is_live() {
            if live_pairs.contains_key(&key) {
                return Err(EngineError::AlreadyRegistered);
            }
            live_pairs.insert(key, registration.id);
        }
        registrations.insert(registration.id, registration);
        Ok(())
    }

    /// Fetches a registration by id.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationNotFound` for unknown ids, `Storage` on a
    /// poisoned lock.
    pub fn get(&self, registration_id: RegistrationId) -> Result<Registration> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        registrations
            .get(&registration_id)
            .cloned()
            .ok_or(EngineError::RegistrationNotFound)
    }

    /// Applies a mutation to a registration and resyncs the live-pair index.
    ///
    /// The closure's error aborts the mutation (records are cheap clones, so
    /// a failed transition leaves the stored record untouched).
    ///
    /// # Errors
    ///
    /// Returns `RegistrationNotFound` for unknown ids, `Storage` on a
    /// poisoned lock, or whatever the closure returns.
    pub fn update<T>(
        &self,
        registration_id: RegistrationId,
        mutate: impl FnOnce(&mut Registration) -> Result<T>,
    ) -> Result<T> {
        let mut registrations = self.registrations.write().map_err(lock_poisoned)?;
        let stored = registrations
            .get_mut(&registration_id)
            .ok_or(EngineError::RegistrationNotFound)?;

        let mut candidate = stored.clone();
        let outcome = mutate(&mut candidate)?;

        let went_dead = stored.is_live() && !candidate.is_live();
        *stored = candidate;
        if went_dead {
            let key = (stored.student_id.clone(), stored.event_id);
            let mut live_pairs = self.live_pairs.write().map_err(lock_poisoned)?;
            if live_pairs.get(&key) == Some(&registration_id) {
                live_pairs.remove(&key);
            }
        }
        Ok(outcome)
    }

    /// Id of the live registration for a pair, if any.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn live_registration_for(
        &self,
        student_id: &StudentId,
        event_id: EventId,
    ) -> Result<Option<RegistrationId>> {
        let live_pairs = self.live_pairs.read().map_err(lock_poisoned)?;
        Ok(live_pairs.get(&(student_id.clone(), event_id)).copied())
    }

    // ========================================================================
    // Scans (read-only projections and the sweeper)
    // ========================================================================

    /// All registrations for an event, any state.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn registrations_for_event(&self, event_id: EventId) -> Result<Vec<Registration>> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations
            .values()
            .filter(|registration| registration.event_id == event_id)
            .cloned()
            .collect())
    }

    /// All registrations made by a student, any state.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn registrations_for_student(&self, student_id: &StudentId) -> Result<Vec<Registration>> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations
            .values()
            .filter(|registration| registration.student_id == *student_id)
            .cloned()
            .collect())
    }

    /// Ids of live registrations for an event (cascade delete input).
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn live_for_event(&self, event_id: EventId) -> Result<Vec<RegistrationId>> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations
            .values()
            .filter(|registration| registration.event_id == event_id && registration.is_live())
            .map(|registration| registration.id)
            .collect())
    }

    /// Number of live registrations for an event.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn live_count_for_event(&self, event_id: EventId) -> Result<u32> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        let count = registrations
            .values()
            .filter(|registration| registration.event_id == event_id && registration.is_live())
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    /// Ids of pending registrations whose payment deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn pending_expired(&self, now: DateTime<Utc>) -> Result<Vec<RegistrationId>> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations
            .values()
            .filter(|registration| registration.is_expired(now))
            .map(|registration| registration.id)
            .collect())
    }

    /// Every registration in the ledger (dashboard counts).
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a poisoned lock.
    pub fn all(&self) -> Result<Vec<Registration>> {
        let registrations = self.registrations.read().map_err(lock_poisoned)?;
        Ok(registrations.values().cloned().collect())
    }
}
