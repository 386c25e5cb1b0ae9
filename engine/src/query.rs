//! Read-only projections over the catalog and ledger.
//!
//! Consumed by the (excluded) presentation layer. Takes no locks beyond
//! what a consistent snapshot read of the counters requires, and never
//! mutates. Derived fields (`available_spots`, `is_full`, status) are
//! computed here so clients have no arithmetic to get wrong.

use crate::catalog::CatalogStore;
use crate::clock::Clock;
use crate::error::Result;
use crate::ledger::RegistrationLedger;
use crate::types::{
    Capacity, Event, EventId, EventSnapshot, EventStatus, Money, Registration, RegistrationId,
    RegistrationState, StudentId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// An event with its derived availability fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventWithAvailability {
    /// Event metadata.
    pub event: Event,
    /// Seating capacity.
    pub capacity: Capacity,
    /// Seats held by live registrations.
    pub reserved_count: u32,
    /// Seats still claimable.
    pub available_spots: u32,
    /// Whether every seat is held.
    pub is_full: bool,
    /// Derived lifecycle status.
    pub status: EventStatus,
}

impl EventWithAvailability {
    fn from_snapshot(snapshot: EventSnapshot, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            available_spots: snapshot.available_spots(),
            is_full: snapshot.is_full(),
            status: snapshot.status(now),
            capacity: snapshot.capacity,
            reserved_count: snapshot.reserved_count,
            event: snapshot.event,
        }
    }
}

/// A student's registration with a snapshot of its event attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentRegistrationView {
    /// The registration record.
    pub registration: Registration,
    /// The event, if it still exists (cascade-deleted events leave `None`).
    pub event: Option<Event>,
}

/// Admin detail view: one event and its full roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRoster {
    /// The event with availability fields.
    pub event: EventWithAvailability,
    /// Every registration for the event, any state.
    pub registrations: Vec<Registration>,
    /// How many registrations currently hold a seat.
    pub live_count: u32,
    /// Revenue recorded from confirmed registrations.
    pub confirmed_revenue: Money,
}

/// Simple counts for the admin dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Events currently in the catalog.
    pub total_events: usize,
    /// Registrations in the ledger, any state.
    pub total_registrations: usize,
    /// Registrations currently holding a seat.
    pub live_registrations: usize,
    /// Revenue recorded from confirmed registrations.
    pub confirmed_revenue: Money,
    /// Events whose start time is still ahead.
    pub upcoming_events: usize,
}

/// Read-only query surface over shared engine stores.
pub struct EngineQueries {
    catalog: Arc<CatalogStore>,
    ledger: Arc<RegistrationLedger>,
    clock: Arc<dyn Clock>,
}

impl EngineQueries {
    /// Creates a query surface over the given stores.
    #[must_use]
    pub const fn new(
        catalog: Arc<CatalogStore>,
        ledger: Arc<RegistrationLedger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            clock,
        }
    }

    /// One event with its counter, raw form.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a store failure.
    pub fn get_event(&self, event_id: EventId) -> Result<EventSnapshot> {
        self.catalog.snapshot(event_id)
    }

    /// One event with derived availability fields.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a store failure.
    pub fn get_event_with_availability(&self, event_id: EventId) -> Result<EventWithAvailability> {
        let snapshot = self.catalog.snapshot(event_id)?;
        Ok(EventWithAvailability::from_snapshot(snapshot, self.clock.now()))
    }

    /// Every active event with derived availability fields, ordered by start
    /// time then title for stable listings.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a store failure.
    pub fn list_events_with_availability(&self) -> Result<Vec<EventWithAvailability>> {
        let now = self.clock.now();
        let mut events: Vec<EventWithAvailability> = self
            .catalog
            .snapshots()?
            .into_iter()
            .filter(|snapshot| snapshot.event.is_active)
            .map(|snapshot| EventWithAvailability::from_snapshot(snapshot, now))
            .collect();
        events.sort_by(|a, b| {
            a.event
                .starts_at
                .cmp(&b.event.starts_at)
                .then_with(|| a.event.title.cmp(&b.event.title))
        });
        Ok(events)
    }

    /// One registration, raw form.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationNotFound` for unknown ids, `Storage` on a store
    /// failure.
    pub fn get_registration(&self, registration_id: RegistrationId) -> Result<Registration> {
        self.ledger.get(registration_id)
    }

    /// A student's registrations, newest first, with event snapshots.
    ///
    /// An unknown student id simply yields an empty list; student identity
    /// lives with the external provider.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a store failure.
    pub fn list_registrations_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<StudentRegistrationView>> {
        let mut registrations = self.ledger.registrations_for_student(student_id)?;
        registrations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(registrations
            .into_iter()
            .map(|registration| {
                let event = self.catalog.event(registration.event_id).ok();
                StudentRegistrationView {
                    registration,
                    event,
                }
            })
            .collect())
    }

    /// Admin roster for one event, oldest registration first.
    ///
    /// # Errors
    ///
    /// Returns `EventNotFound` for unknown ids, `Storage` on a store failure.
    pub fn list_registrations_for_event(&self, event_id: EventId) -> Result<EventRoster> {
        let snapshot = self.catalog.snapshot(event_id)?;
        let mut registrations = self.ledger.registrations_for_event(event_id)?;
        registrations.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let live_count = registrations
            .iter()
            .filter(|registration| registration.is_live())
            .count();
        let confirmed_revenue = confirmed_revenue(&registrations);

        Ok(EventRoster {
            event: EventWithAvailability::from_snapshot(snapshot, self.clock.now()),
            registrations,
            live_count: u32::try_from(live_count).unwrap_or(u32::MAX),
            confirmed_revenue,
        })
    }

    /// Simple counts for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a store failure.
    pub fn dashboard_summary(&self) -> Result<DashboardSummary> {
        let now = self.clock.now();
        let snapshots = self.catalog.snapshots()?;
        let registrations = self.ledger.all()?;

        Ok(DashboardSummary {
            total_events: snapshots.len(),
            total_registrations: registrations.len(),
            live_registrations: registrations
                .iter()
                .filter(|registration| registration.is_live())
                .count(),
            confirmed_revenue: confirmed_revenue(&registrations),
            upcoming_events: snapshots
                .iter()
                .filter(|snapshot| snapshot.event.starts_at > now)
                .count(),
        })
    }

    /// Distinct event categories, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on a store failure.
    pub fn list_categories(&self) -> Result<Vec<String>> {
        let categories: BTreeSet<String> = self
            .catalog
            .snapshots()?
            .into_iter()
            .map(|snapshot| snapshot.event.category)
            .collect();
        Ok(categories.into_iter().collect())
    }
}

fn confirmed_revenue(registrations: &[Registration]) -> Money {
    registrations
        .iter()
        .filter(|registration| registration.state == RegistrationState::Confirmed)
        .filter_map(|registration| registration.amount_paid)
        .fold(Money::ZERO, Money::saturating_add)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::EngineConfig;
    use crate::service::RegistrationService;
    use crate::types::{CancellationActor, ClaimOptions, NewEvent};
    use chrono::{Duration, Utc};

    fn setup() -> (RegistrationService, EngineQueries) {
        let catalog = Arc::new(CatalogStore::new());
        let ledger = Arc::new(RegistrationLedger::new());
        let service = RegistrationService::new(
            Arc::clone(&catalog),
            Arc::clone(&ledger),
            EngineConfig::default(),
        );
        let queries = EngineQueries::new(catalog, ledger, Arc::new(SystemClock));
        (service, queries)
    }

    fn new_event(title: &str, category: &str, price: Money, capacity: u32) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: String::new(),
            location: "Campus".to_string(),
            category: category.to_string(),
            organizer: "Student council".to_string(),
            tags: vec![],
            starts_at: Utc::now() + Duration::days(5),
            duration_hours: 2,
            capacity: Capacity::new(capacity),
            price,
        }
    }

    #[test]
    fn listing_skips_inactive_events_and_derives_fields() {
        let (service, queries) = setup();
        let visible = service
            .create_event(new_event("Art Fair", "Cultural", Money::ZERO, 2))
            .unwrap();
        let hidden = service
            .create_event(new_event("Closed Door", "Cultural", Money::ZERO, 2))
            .unwrap();
        service.set_event_active(hidden.event.id, false).unwrap();

        service
            .claim(StudentId::new("1RV22CS001"), visible.event.id, ClaimOptions::default())
            .unwrap();
        service
            .claim(StudentId::new("1RV22CS002"), visible.event.id, ClaimOptions::default())
            .unwrap();

        let listing = queries.list_events_with_availability().unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].event.id, visible.event.id);
        assert_eq!(listing[0].available_spots, 0);
        assert!(listing[0].is_full);
        assert_eq!(listing[0].status, EventStatus::Full);
    }

    #[test]
    fn roster_counts_live_and_revenue() {
        let (service, queries) = setup();
        let event = service
            .create_event(new_event("Concert", "Cultural", Money::from_rupees(300), 5))
            .unwrap();

        let paid = service
            .claim(StudentId::new("1RV22CS001"), event.event.id, ClaimOptions::default())
            .unwrap();
        service
            .confirm_payment(paid.id, Money::from_rupees(300))
            .unwrap();

        let dropped = service
            .claim(StudentId::new("1RV22CS002"), event.event.id, ClaimOptions::default())
            .unwrap();
        service.cancel(dropped.id, CancellationActor::Admin).unwrap();

        let _pending = service
            .claim(StudentId::new("1RV22CS003"), event.event.id, ClaimOptions::default())
            .unwrap();

        let roster = queries.list_registrations_for_event(event.event.id).unwrap();
        assert_eq!(roster.registrations.len(), 3);
        assert_eq!(roster.live_count, 2);
        assert_eq!(roster.confirmed_revenue, Money::from_rupees(300));
        assert_eq!(roster.event.reserved_count, 2);
    }

    #[test]
    fn student_history_attaches_event_snapshots() {
        let (service, queries) = setup();
        let event = service
            .create_event(new_event("Quiz Night", "Literary", Money::ZERO, 5))
            .unwrap();
        let student = StudentId::new("1RV22CS001");
        service
            .claim(student.clone(), event.event.id, ClaimOptions::default())
            .unwrap();

        let history = queries.list_registrations_for_student(&student).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(
            history[0].event.as_ref().map(|event| event.id),
            Some(event.event.id)
        );

        // Unknown students just have no history.
        assert!(queries
            .list_registrations_for_student(&StudentId::new("nobody"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn availability_view_serializes_for_the_transport_layer() {
        let (service, queries) = setup();
        let event = service
            .create_event(new_event("Art Fair", "Cultural", Money::from_rupees(50), 3))
            .unwrap();
        service
            .claim(StudentId::new("1RV22CS001"), event.event.id, ClaimOptions::default())
            .unwrap();

        let view = queries.get_event_with_availability(event.event.id).unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["available_spots"], 2);
        assert_eq!(json["is_full"], false);
        assert_eq!(json["status"], "Open");
        assert_eq!(json["event"]["title"], "Art Fair");
    }

    #[test]
    fn dashboard_reports_simple_counts() {
        let (service, queries) = setup();
        let workshop = service
            .create_event(new_event("Workshop", "Technical", Money::from_rupees(100), 5))
            .unwrap();
        service
            .create_event(new_event("Debate", "Literary", Money::ZERO, 5))
            .unwrap();

        let registration = service
            .claim(StudentId::new("1RV22CS001"), workshop.event.id, ClaimOptions::default())
            .unwrap();
        service
            .confirm_payment(registration.id, Money::from_rupees(100))
            .unwrap();

        let summary = queries.dashboard_summary().unwrap();
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.total_registrations, 1);
        assert_eq!(summary.live_registrations, 1);
        assert_eq!(summary.confirmed_revenue, Money::from_rupees(100));
        assert_eq!(summary.upcoming_events, 2);

        assert_eq!(
            queries.list_categories().unwrap(),
            vec!["Literary".to_string(), "Technical".to_string()]
        );
    }
}
