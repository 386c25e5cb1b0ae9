//! Registration service: orchestration of claims, payments, cancellations,
//! and admin catalog operations.
//!
//! The service validates inputs, consults the capacity accountant, writes
//! the ledger, and applies payment-status transitions. All invariant
//! preservation happens here or in the accountant; the stores are passive.
//!
//! # Lock ordering
//!
//! `claim` is the only operation that takes both exclusivity domains. It
//! acquires the (student, event) pair lock first and the event's counter
//! lock second. That order is a standing invariant for any future operation
//! that needs both.

use crate::accountant::CapacityAccountant;
use crate::catalog::CatalogStore;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::ledger::RegistrationLedger;
use crate::metrics;
use crate::query::EngineQueries;
use crate::types::{
    CancellationActor, Capacity, ClaimOptions, Event, EventId, EventSnapshot, EventUpdate, Money,
    NewEvent, Registration, RegistrationId, RegistrationState, StudentId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

fn lock_poisoned<T>(_: T) -> EngineError {
    EngineError::Storage("pair lock poisoned".to_string())
}

/// Gateway-style reference recorded when a payment is confirmed.
fn transaction_reference() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("TXN_{}", hex[..8].to_uppercase())
}

/// Outcome of recomputing one event's counter from the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Event that was checked.
    pub event_id: EventId,
    /// Counter value before the check.
    pub counter_before: u32,
    /// Live registrations counted in the ledger.
    pub ledger_live: u32,
    /// Whether the counter had drifted and was corrected.
    pub corrected: bool,
}

/// Orchestrator over the catalog, ledger, and capacity accountant.
pub struct RegistrationService {
    catalog: Arc<CatalogStore>,
    ledger: Arc<RegistrationLedger>,
    accountant: CapacityAccountant,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl RegistrationService {
    /// Creates a service over the given stores, using the system clock.
    #[must_use]
    pub fn new(
        catalog: Arc<CatalogStore>,
        ledger: Arc<RegistrationLedger>,
        config: EngineConfig,
    ) -> Self {
        Self::with_clock(catalog, ledger, config, Arc::new(SystemClock))
    }

    /// Creates a service with an injected clock (deterministic tests).
    #[must_use]
    pub fn with_clock(
        catalog: Arc<CatalogStore>,
        ledger: Arc<RegistrationLedger>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accountant = CapacityAccountant::new(Arc::clone(&catalog));
        Self {
            catalog,
            ledger,
            accountant,
            config,
            clock,
        }
    }

    /// The policy configuration this service was built with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs the expiry sweep against the service clock.
    ///
    /// # Errors
    ///
    /// As for [`Self::expire_pending`].
    pub fn sweep_now(&self) -> Result<usize> {
        self.expire_pending(self.clock.now())
    }

    /// Read-only query surface sharing this service's stores.
    #[must_use]
    pub fn queries(&self) -> EngineQueries {
        EngineQueries::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.ledger),
            Arc::clone(&self.clock),
        )
    }

    // ========================================================================
    // Admin catalog operations
    // ========================================================================

    /// Creates an event.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCapacity` for a zero capacity, `InvalidEvent` for a
    /// blank title, `Storage` on a store failure.
    pub fn create_event(&self, new_event: NewEvent) -> Result<EventSnapshot> {
        if new_event.capacity.value() == 0 {
            return Err(EngineError::InvalidCapacity);
        }
        if new_event.title.trim().is_empty() {
            return Err(EngineError::InvalidEvent {
                reason: "title must not be empty".to_string(),
            });
        }

        let now = self.clock.now();
        let event = Event {
            id: EventId::new(),
            title: new_event.title,
            description: new_event.description,
            location: new_event.location,
            category: new_event.category,
            organizer: new_event.organizer,
            tags: new_event.tags,
            starts_at: new_event.starts_at,
            duration_hours: new_event.duration_hours,
            price: new_event.price,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let event_id = event.id;
        self.catalog.insert(event, new_event.capacity)?;
        tracing::info!(%event_id, capacity = new_event.capacity.value(), "event created");
        self.catalog.snapshot(event_id)
    }

    /// Applies a metadata update. Capacity changes go through
    /// [`Self::edit_capacity`].
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a store failure.
    pub fn update_event(&self, event_id: EventId, update: EventUpdate) -> Result<EventSnapshot> {
        let now = self.clock.now();
        self.catalog.update_meta(event_id, |event| {
            if let Some(title) = update.title {
                event.title = title;
            }
            if let Some(description) = update.description {
                event.description = description;
            }
            if let Some(location) = update.location {
                event.location = location;
            }
            if let Some(category) = update.category {
                event.category = category;
            }
            if let Some(organizer) = update.organizer {
                event.organizer = organizer;
            }
            if let Some(tags) = update.tags {
                event.tags = tags;
            }
            if let Some(starts_at) = update.starts_at {
                event.starts_at = starts_at;
            }
            if let Some(duration_hours) = update.duration_hours {
                event.duration_hours = duration_hours;
            }
            if let Some(price) = update.price {
                event.price = price;
            }
            event.updated_at = now;
        })?;
        self.catalog.snapshot(event_id)
    }

    /// Activates or deactivates an event. Inactive events reject claims but
    /// keep their registrations.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a store failure.
    pub fn set_event_active(&self, event_id: EventId, active: bool) -> Result<EventSnapshot> {
        let now = self.clock.now();
        self.catalog.update_meta(event_id, |event| {
            event.is_active = active;
            event.updated_at = now;
        })?;
        tracing::info!(%event_id, active, "event visibility changed");
        self.catalog.snapshot(event_id)
    }

    /// Changes an event's capacity. Never affects `reserved_count`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCapacity` for zero, `CapacityBelowReserved` if live
    /// registrations exceed the new capacity, `EventNotFound` for unknown
    /// ids, `Storage` on a store failure.
    pub fn edit_capacity(&self, event_id: EventId, new_capacity: Capacity) -> Result<EventSnapshot> {
        if new_capacity.value() == 0 {
            return Err(EngineError::InvalidCapacity);
        }
        self.catalog.edit_capacity(event_id, new_capacity)?;
        let now = self.clock.now();
        self.catalog
            .update_meta(event_id, |event| event.updated_at = now)?;
        tracing::info!(%event_id, capacity = new_capacity.value(), "capacity edited");
        self.catalog.snapshot(event_id)
    }

    /// Deletes an event.
    ///
    /// Without `cascade`, fails while live registrations exist. With
    /// `cascade`, every live registration is cancelled (system actor, seat
    /// released) before the event record is removed.
    ///
    /// # Errors
    ///
    /// Returns `HasActiveRegistrations` when live registrations block the
    /// delete (including a claim that raced the cascade), `EventNotFound`
    /// for unknown ids, `Storage` on a store failure.
    pub fn delete_event(&self, event_id: EventId, cascade: bool) -> Result<Event> {
        let live = self.ledger.live_for_event(event_id)?;
        if !live.is_empty() {
            if !cascade {
                return Err(EngineError::HasActiveRegistrations { count: live.len() });
            }
            for registration_id in live {
                self.cancel(registration_id, CancellationActor::System)?;
            }
        }
        let event = self.catalog.remove(event_id)?;
        tracing::info!(%event_id, cascade, "event deleted");
        Ok(event)
    }

    // ========================================================================
    // Claims
    // ========================================================================

    /// Claims a seat for a student.
    ///
    /// Serialized per (student, event) pair and per event counter, in that
    /// lock order. Free events confirm immediately with `amount_paid = 0`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the student already holds a live
    /// registration for the event; `EventFull`, `EventClosed`, or
    /// `EventNotFound` from the seat reservation; `Storage` on a store
    /// failure.
    pub fn claim(
        &self,
        student_id: StudentId,
        event_id: EventId,
        options: ClaimOptions,
    ) -> Result<Registration> {
        let pair_mutex = self.ledger.pair_lock(&student_id, event_id)?;
        let result = {
            let _pair_guard = pair_mutex.lock().map_err(lock_poisoned)?;
            self.claim_locked(&student_id, event_id, options)
        };
        drop(pair_mutex);
        self.ledger.release_pair_lock(&student_id, event_id)?;

        match &result {
            Ok(registration) => {
                tracing::info!(
                    registration_id = %registration.id,
                    %event_id,
                    %student_id,
                    state = %registration.state,
                    "seat claimed"
                );
            }
            Err(error) if !error.is_internal() => {
                metrics::record_claim_rejected();
                tracing::debug!(%event_id, %student_id, %error, "claim rejected");
            }
            Err(_) => {}
        }
        result
    }

    fn claim_locked(
        &self,
        student_id: &StudentId,
        event_id: EventId,
        options: ClaimOptions,
    ) -> Result<Registration> {
        if self
            .ledger
            .live_registration_for(student_id, event_id)?
            .is_some()
        {
            return Err(EngineError::AlreadyRegistered);
        }

        let now = self.clock.now();
        let hold = self.accountant.reserve(event_id, now)?;
        let price = match self.catalog.event(event_id) {
            Ok(event) => event.price,
            Err(error) => {
                // Reserve succeeded, so the event vanished mid-claim; give
                // the seat back before reporting.
                let _ = self.accountant.release_hold(hold);
                return Err(error);
            }
        };

        let free = price.is_zero();
        let registration = Registration {
            id: RegistrationId::new(),
            event_id,
            student_id: student_id.clone(),
            state: if free {
                RegistrationState::Confirmed
            } else {
                RegistrationState::PendingPayment
            },
            amount_due: price,
            amount_paid: free.then_some(Money::ZERO),
            payment_method: options.payment_method,
            transaction_id: None,
            special_requirements: options.special_requirements,
            cancelled_by: None,
            expires_at: now + self.config.payment_expiry(),
            created_at: now,
            updated_at: now,
        };

        if let Err(error) = self.ledger.insert(registration.clone()) {
            let _ = self.accountant.release_hold(hold);
            return Err(error);
        }
        // The seat is now backed by a ledger entry; the hold is committed.
        drop(hold);

        if free {
            metrics::record_claim_confirmed();
        } else {
            metrics::record_claim_pending();
        }
        Ok(registration)
    }

    // ========================================================================
    // Payment
    // ========================================================================

    /// Records a captured payment against a pending registration.
    ///
    /// The amount is assumed to have been captured by an external payment
    /// step; this only records the result. Valid solely from
    /// `pending_payment`: a cancelled or already-confirmed registration is
    /// rejected and the caller must re-claim.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `amount != amount_due`, `InvalidState`
    /// outside `pending_payment`, `RegistrationNotFound` for unknown ids,
    /// `Storage` on a store failure.
    pub fn confirm_payment(
        &self,
        registration_id: RegistrationId,
        amount: Money,
    ) -> Result<Registration> {
        let now = self.clock.now();
        let registration = self.ledger.update(registration_id, |registration| {
            match registration.state {
                RegistrationState::PendingPayment => {
                    if amount != registration.amount_due {
                        return Err(EngineError::InvalidAmount {
                            expected: registration.amount_due,
                            actual: amount,
                        });
                    }
                    registration.state = RegistrationState::Confirmed;
                    registration.amount_paid = Some(amount);
                    registration.transaction_id = Some(transaction_reference());
                    registration.updated_at = now;
                    Ok(registration.clone())
                }
                from => Err(EngineError::InvalidState {
                    from,
                    operation: "confirm payment for",
                }),
            }
        })?;

        metrics::record_payment(amount.paise());
        tracing::info!(
            %registration_id,
            amount = %amount,
            "payment recorded"
        );
        Ok(registration)
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Cancels a registration and releases its seat.
    ///
    /// Idempotent: cancelling an already-cancelled registration returns the
    /// terminal record with no side effect. The ledger write happens before
    /// the seat release, so a crash between the two under-counts
    /// availability (recoverable by reconciliation) rather than over-counts.
    ///
    /// # Errors
    ///
    /// Returns `CancellationWindowClosed` for a student-initiated
    /// cancellation inside the cutoff window, `RegistrationNotFound` for
    /// unknown ids, `CounterUnderflow`/`Storage` on internal anomalies.
    pub fn cancel(
        &self,
        registration_id: RegistrationId,
        actor: CancellationActor,
    ) -> Result<Registration> {
        let now = self.clock.now();

        let current = self.ledger.get(registration_id)?;
        if current.state == RegistrationState::Cancelled {
            return Ok(current);
        }

        if actor == CancellationActor::Student {
            // Admin and system cancellations bypass the cutoff: cascade
            // delete and expiry must always be able to complete.
            if let Ok(event) = self.catalog.event(current.event_id) {
                if event.starts_at - now < self.config.cancellation_cutoff() {
                    return Err(EngineError::CancellationWindowClosed {
                        cutoff_hours: self.config.cancellation_cutoff_hours,
                    });
                }
            }
        }

        let (registration, newly_cancelled, was_pending) =
            self.ledger.update(registration_id, |registration| {
                if registration.state == RegistrationState::Cancelled {
                    return Ok((registration.clone(), false, false));
                }
                let was_pending = registration.state == RegistrationState::PendingPayment;
                registration.state = RegistrationState::Cancelled;
                registration.cancelled_by = Some(actor);
                registration.updated_at = now;
                Ok((registration.clone(), true, was_pending))
            })?;

        if newly_cancelled {
            match self.accountant.release(registration.event_id) {
                Ok(()) => {}
                Err(EngineError::EventNotFound) => {
                    // The event was deleted while this cancel was in flight;
                    // its counter cell is gone along with the seat.
                    tracing::warn!(
                        %registration_id,
                        event_id = %registration.event_id,
                        "cancelled registration for an already-deleted event"
                    );
                }
                Err(error) => return Err(error),
            }
            metrics::record_cancellation(actor, was_pending);
            tracing::info!(%registration_id, ?actor, "registration cancelled");
        }
        Ok(registration)
    }

    // ========================================================================
    // Expiry sweep
    // ========================================================================

    /// Cancels every pending registration whose payment deadline has passed
    /// and releases its seat. Returns the number reclaimed.
    ///
    /// Called by the background sweeper; never invoked from `claim` or
    /// `confirm_payment`.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a store failure; individual registrations that
    /// were confirmed between the scan and the sweep are skipped, not
    /// errors.
    pub fn expire_pending(&self, now: DateTime<Utc>) -> Result<usize> {
        let overdue = self.ledger.pending_expired(now)?;
        let mut reclaimed = 0;
        for registration_id in overdue {
            // Re-check under the record lock: the registration may have been
            // confirmed or cancelled since the scan.
            let released = self.ledger.update(registration_id, |registration| {
                if !registration.is_expired(now) {
                    return Ok(None);
                }
                registration.state = RegistrationState::Cancelled;
                registration.cancelled_by = Some(CancellationActor::System);
                registration.updated_at = now;
                Ok(Some(registration.event_id))
            })?;

            if let Some(event_id) = released {
                match self.accountant.release(event_id) {
                    Ok(()) | Err(EngineError::EventNotFound) => {}
                    Err(error) => return Err(error),
                }
                metrics::record_expiry();
                metrics::record_cancellation(CancellationActor::System, true);
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            tracing::info!(reclaimed, "expired pending registrations reclaimed");
        }
        Ok(reclaimed)
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Recomputes one event's counter from live ledger entries, correcting
    /// drift (e.g., a crash between a ledger write and a seat release).
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a store
    /// failure.
    pub fn reconcile(&self, event_id: EventId) -> Result<ReconciliationReport> {
        let ledger_live = self.ledger.live_count_for_event(event_id)?;
        let counter_before = self.accountant.overwrite_reserved(event_id, ledger_live)?;
        let corrected = counter_before != ledger_live;
        if corrected {
            tracing::warn!(
                %event_id,
                counter_before,
                ledger_live,
                "seat counter drift corrected"
            );
        }
        Ok(ReconciliationReport {
            event_id,
            counter_before,
            ledger_live,
            corrected,
        })
    }

    /// Runs [`Self::reconcile`] over every event in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a store failure.
    pub fn reconcile_all(&self) -> Result<Vec<ReconciliationReport>> {
        let mut reports = Vec::new();
        for snapshot in self.catalog.snapshots()? {
            match self.reconcile(snapshot.event.id) {
                Ok(report) => reports.push(report),
                // Deleted between the scan and the check.
                Err(EngineError::EventNotFound) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::Money;
    use chrono::Duration;

    struct Fixture {
        service: RegistrationService,
        clock: Arc<ManualClock>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = RegistrationService::with_clock(
            Arc::new(CatalogStore::new()),
            Arc::new(RegistrationLedger::new()),
            EngineConfig::default(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        Fixture { service, clock }
    }

    fn new_event(price: Money, capacity: u32, starts_in: Duration) -> NewEvent {
        NewEvent {
            title: "Tech Symposium".to_string(),
            description: "Annual flagship".to_string(),
            location: "Main auditorium".to_string(),
            category: "Technical".to_string(),
            organizer: "IEEE chapter".to_string(),
            tags: vec!["flagship".to_string()],
            starts_at: Utc::now() + starts_in,
            duration_hours: 6,
            capacity: Capacity::new(capacity),
            price,
        }
    }

    #[test]
    fn claim_creates_pending_registration() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::from_rupees(500), 10, Duration::days(7)))
            .unwrap();

        let registration = service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();

        assert_eq!(registration.state, RegistrationState::PendingPayment);
        assert_eq!(registration.amount_due, Money::from_rupees(500));
        assert_eq!(registration.amount_paid, None);
        assert_eq!(
            service.queries().get_event(event.event.id).unwrap().reserved_count,
            1
        );
    }

    #[test]
    fn free_event_confirms_immediately() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::ZERO, 10, Duration::days(7)))
            .unwrap();

        let registration = service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();

        assert_eq!(registration.state, RegistrationState::Confirmed);
        assert_eq!(registration.amount_paid, Some(Money::ZERO));
    }

    #[test]
    fn duplicate_claim_rejected_until_cancelled() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::ZERO, 10, Duration::days(7)))
            .unwrap();
        let student = StudentId::new("1RV22CS001");

        let first = service
            .claim(student.clone(), event.event.id, ClaimOptions::default())
            .unwrap();
        assert_eq!(
            service.claim(student.clone(), event.event.id, ClaimOptions::default()),
            Err(EngineError::AlreadyRegistered)
        );

        service.cancel(first.id, CancellationActor::Admin).unwrap();
        service
            .claim(student, event.event.id, ClaimOptions::default())
            .unwrap();
    }

    #[test]
    fn confirm_payment_validates_amount_and_state() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::from_rupees(500), 5, Duration::days(7)))
            .unwrap();
        let registration = service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();

        assert_eq!(
            service.confirm_payment(registration.id, Money::from_rupees(400)),
            Err(EngineError::InvalidAmount {
                expected: Money::from_rupees(500),
                actual: Money::from_rupees(400),
            })
        );

        let confirmed = service
            .confirm_payment(registration.id, Money::from_rupees(500))
            .unwrap();
        assert_eq!(confirmed.state, RegistrationState::Confirmed);
        assert_eq!(confirmed.amount_paid, Some(Money::from_rupees(500)));
        assert!(confirmed.transaction_id.is_some());

        // Confirmation is not retried; re-confirming is an invalid state.
        assert!(matches!(
            service.confirm_payment(registration.id, Money::from_rupees(500)),
            Err(EngineError::InvalidState { .. })
        ));
    }

    #[test]
    fn cancel_is_idempotent_and_releases_once() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::ZERO, 3, Duration::days(7)))
            .unwrap();
        let registration = service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();
        assert_eq!(service.queries().get_event(event.event.id).unwrap().reserved_count, 1);

        let first = service.cancel(registration.id, CancellationActor::Admin).unwrap();
        assert_eq!(first.state, RegistrationState::Cancelled);
        assert_eq!(service.queries().get_event(event.event.id).unwrap().reserved_count, 0);

        let second = service.cancel(registration.id, CancellationActor::Admin).unwrap();
        assert_eq!(second.state, RegistrationState::Cancelled);
        // Seat released exactly once, not twice.
        assert_eq!(service.queries().get_event(event.event.id).unwrap().reserved_count, 0);
    }

    #[test]
    fn student_cancellation_respects_cutoff_window() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::ZERO, 3, Duration::hours(12)))
            .unwrap();
        let registration = service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();

        assert_eq!(
            service.cancel(registration.id, CancellationActor::Student),
            Err(EngineError::CancellationWindowClosed { cutoff_hours: 24 })
        );
        // Staff can still cancel inside the window.
        let cancelled = service.cancel(registration.id, CancellationActor::Admin).unwrap();
        assert_eq!(cancelled.cancelled_by, Some(CancellationActor::Admin));
    }

    #[test]
    fn edit_capacity_guard_leaves_capacity_unchanged() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::ZERO, 5, Duration::days(7)))
            .unwrap();
        for student in ["1RV22CS001", "1RV22CS002", "1RV22CS003"] {
            service
                .claim(StudentId::new(student), event.event.id, ClaimOptions::default())
                .unwrap();
        }

        assert_eq!(
            service.edit_capacity(event.event.id, Capacity::new(2)),
            Err(EngineError::CapacityBelowReserved {
                requested: 2,
                reserved: 3,
            })
        );
        assert_eq!(
            service.queries().get_event(event.event.id).unwrap().capacity.value(),
            5
        );

        let resized = service.edit_capacity(event.event.id, Capacity::new(3)).unwrap();
        assert_eq!(resized.capacity.value(), 3);
        assert_eq!(resized.reserved_count, 3);
        assert!(resized.is_full());
    }

    #[test]
    fn delete_event_requires_cascade_for_live_roster() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::ZERO, 5, Duration::days(7)))
            .unwrap();
        let registration = service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();

        assert_eq!(
            service.delete_event(event.event.id, false),
            Err(EngineError::HasActiveRegistrations { count: 1 })
        );

        service.delete_event(event.event.id, true).unwrap();
        assert_eq!(
            service.queries().get_event(event.event.id),
            Err(EngineError::EventNotFound)
        );
        let cancelled = service.queries().get_registration(registration.id).unwrap();
        assert_eq!(cancelled.state, RegistrationState::Cancelled);
        assert_eq!(cancelled.cancelled_by, Some(CancellationActor::System));
    }

    #[test]
    fn expiry_sweep_reclaims_overdue_seats() {
        let Fixture { service, clock } = fixture();
        let event = service
            .create_event(new_event(Money::from_rupees(200), 2, Duration::days(7)))
            .unwrap();
        let registration = service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();

        // Before the deadline, the sweep is a no-op.
        assert_eq!(service.expire_pending(clock.now()).unwrap(), 0);

        clock.advance(Duration::minutes(16));
        assert_eq!(service.expire_pending(clock.now()).unwrap(), 1);
        assert_eq!(service.queries().get_event(event.event.id).unwrap().reserved_count, 0);
        assert_eq!(
            service.queries().get_registration(registration.id).unwrap().state,
            RegistrationState::Cancelled
        );

        // Sweeping again finds nothing.
        assert_eq!(service.expire_pending(clock.now()).unwrap(), 0);
    }

    #[test]
    fn confirmed_registrations_survive_the_sweep() {
        let Fixture { service, clock } = fixture();
        let event = service
            .create_event(new_event(Money::from_rupees(200), 2, Duration::days(7)))
            .unwrap();
        let registration = service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();
        service
            .confirm_payment(registration.id, Money::from_rupees(200))
            .unwrap();

        clock.advance(Duration::minutes(16));
        assert_eq!(service.expire_pending(clock.now()).unwrap(), 0);
        assert_eq!(service.queries().get_event(event.event.id).unwrap().reserved_count, 1);
    }

    #[test]
    fn reconcile_corrects_injected_drift() {
        let Fixture { service, .. } = fixture();
        let event = service
            .create_event(new_event(Money::ZERO, 10, Duration::days(7)))
            .unwrap();
        service
            .claim(
                StudentId::new("1RV22CS001"),
                event.event.id,
                ClaimOptions::default(),
            )
            .unwrap();

        // Simulate a crash that lost a release: bump the counter directly.
        service
            .accountant
            .overwrite_reserved(event.event.id, 3)
            .unwrap();

        let report = service.reconcile(event.event.id).unwrap();
        assert_eq!(report.counter_before, 3);
        assert_eq!(report.ledger_live, 1);
        assert!(report.corrected);
        assert_eq!(service.queries().get_event(event.event.id).unwrap().reserved_count, 1);

        let clean = service.reconcile(event.event.id).unwrap();
        assert!(!clean.corrected);
    }
}
