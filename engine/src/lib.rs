//! Campus Events Engine - registration and capacity accounting for a campus
//! event service.
//!
//! Institutions publish events with limited seating; students claim seats
//! and pay; staff manage the catalog and roster. This crate is the
//! authoritative engine behind those flows: it admits or rejects a claim,
//! keeps each event's reserved-seat count correct under concurrent
//! attempts, records payment state, and reverses a claim on cancellation
//! without the count ever going negative or exceeding capacity.
//!
//! Presentation, routing, credential storage, and transport framing are
//! external collaborators; the engine exposes an operation set returning
//! typed results, and trusts the student identifier handed to it by the
//! identity provider.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────┐
//!   claim / cancel   │ Registration Service │  confirm_payment / admin ops
//!  ──────────────────▶                      ◀──────────────────────────────
//!                    └──────┬───────┬───────┘
//!                           │       │
//!              reserve/release   write/update
//!                           │       │
//!                  ┌────────▼──┐ ┌──▼──────────────┐
//!                  │ Capacity  │ │  Registration   │
//!                  │ Accountant│ │     Ledger      │
//!                  └────────┬──┘ └──┬──────────────┘
//!                           │       │
//!                  ┌────────▼───────▼──────┐     ┌───────────────┐
//!                  │     Catalog Store     │◀────│ Query Surface │
//!                  │ (events + seat cells) │     │  (read-only)  │
//!                  └───────────────────────┘     └───────────────┘
//! ```
//!
//! # Concurrency model
//!
//! - One mutual-exclusion domain per event id: all mutations of an event's
//!   reserved count are serialized against each other while unrelated
//!   events proceed independently.
//! - One exclusivity domain per (student, event) pair: the
//!   existence-check-then-create of a claim is serialized per pair, so two
//!   simultaneous claims by the same student (a double-click) cannot both
//!   create a live registration.
//! - `claim` takes the pair lock first and the event lock second; that
//!   order is a standing invariant.
//! - Lock hold times cover in-memory bookkeeping only. Payment capture
//!   happens outside the engine; `confirm_payment` merely records it.
//!
//! The central correctness property: for every event, `reserved_count`
//! equals the number of its registrations in state `pending_payment` or
//! `confirmed`, after every operation, including under concurrency.
//!
//! # Usage
//!
//! ```
//! use campus_events_engine::{
//!     Capacity, CatalogStore, ClaimOptions, EngineConfig, Money, NewEvent,
//!     RegistrationLedger, RegistrationService, StudentId,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> campus_events_engine::Result<()> {
//! let catalog = Arc::new(CatalogStore::new());
//! let ledger = Arc::new(RegistrationLedger::new());
//! let service = RegistrationService::new(catalog, ledger, EngineConfig::default());
//!
//! let event = service.create_event(NewEvent {
//!     title: "Orientation day".to_string(),
//!     description: "Welcome session for freshers".to_string(),
//!     location: "Main auditorium".to_string(),
//!     category: "Orientation".to_string(),
//!     organizer: "Dean's office".to_string(),
//!     tags: vec![],
//!     starts_at: chrono::Utc::now() + chrono::Duration::days(14),
//!     duration_hours: 3,
//!     capacity: Capacity::new(200),
//!     price: Money::ZERO,
//! })?;
//!
//! let registration = service.claim(
//!     StudentId::new("1RV22CS001"),
//!     event.event.id,
//!     ClaimOptions::default(),
//! )?;
//! assert!(registration.is_live());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accountant;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod query;
pub mod service;
pub mod sweeper;
pub mod types;

pub use accountant::{CapacityAccountant, SeatHold};
pub use catalog::CatalogStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use ledger::RegistrationLedger;
pub use query::{
    DashboardSummary, EngineQueries, EventRoster, EventWithAvailability, StudentRegistrationView,
};
pub use service::{ReconciliationReport, RegistrationService};
pub use sweeper::ExpirySweeper;
pub use types::*;
