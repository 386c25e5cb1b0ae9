//! Domain types for the campus event-registration engine.
//!
//! Value objects, entities, and lifecycle state for events and registrations.
//! Capacity counters are *not* part of [`Event`]: they live in the catalog's
//! per-event counter cells and are only ever mutated by the capacity
//! accountant. [`EventSnapshot`] is the read-side combination of both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random `RegistrationId`.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RegistrationId` from a `Uuid`.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque student identifier issued by the external identity provider
/// (a university serial number in the reference deployment).
///
/// The engine never inspects the contents; it only uses the id as a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentId(String);

impl StudentId {
    /// Creates a `StudentId` from the identity provider's string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money Value Object (paise-based to avoid floating point errors)
// ============================================================================

/// Represents money in paise (hundredths of a rupee) to avoid floating-point
/// arithmetic errors. Non-negative by construction; zero means free.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// A zero amount (free).
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from paise.
    #[must_use]
    pub const fn from_paise(paise: u64) -> Self {
        Self(paise)
    }

    /// Creates a `Money` value from whole rupees.
    ///
    /// # Panics
    ///
    /// Panics if the conversion would overflow (rupees * 100 > `u64::MAX`).
    /// Use `checked_from_rupees` for non-panicking conversion.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_rupees(rupees: u64) -> Self {
        match rupees.checked_mul(100) {
            Some(paise) => Self(paise),
            None => panic!("Money::from_rupees overflow"),
        }
    }

    /// Creates a `Money` value from whole rupees with overflow checking.
    #[must_use]
    pub const fn checked_from_rupees(rupees: u64) -> Option<Self> {
        match rupees.checked_mul(100) {
            Some(paise) => Some(Self(paise)),
            None => None,
        }
    }

    /// Returns the amount in paise.
    #[must_use]
    pub const fn paise(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole rupees (rounded down).
    #[must_use]
    pub const fn rupees(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero (a free event).
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Adds two money amounts, saturating at `u64::MAX` paise.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}.{:02}", self.rupees(), self.0 % 100)
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Seating capacity of an event. Positive by the service's creation checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capacity(pub u32);

impl Capacity {
    /// Creates a new `Capacity`.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the capacity value.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Event entity
// ============================================================================

/// Event metadata as stored in the catalog.
///
/// The seat counter (capacity / reserved count) is kept in a separate
/// exclusive-access cell and does not appear here; see
/// [`EventSnapshot`] for the combined read-side view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Event title (e.g., "Tech Symposium 2026").
    pub title: String,
    /// Event description.
    pub description: String,
    /// Where the event takes place.
    pub location: String,
    /// Event category (e.g., "Workshop", "Cultural").
    pub category: String,
    /// Organizing body or person.
    pub organizer: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Scheduled start time.
    pub starts_at: DateTime<Utc>,
    /// Duration in hours.
    pub duration_hours: u32,
    /// Seat price; zero means free.
    pub price: Money,
    /// Admin-controlled visibility flag. Inactive events reject claims.
    pub is_active: bool,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// When the event was last modified.
    pub updated_at: DateTime<Utc>,
}

/// Derived event lifecycle status. Never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    /// Seats remain and the event has not started.
    Open,
    /// Every seat is held by a live registration.
    Full,
    /// The event has started, finished, or been deactivated.
    Closed,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Full => write!(f, "full"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Input payload for creating an event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event title.
    pub title: String,
    /// Event description.
    pub description: String,
    /// Where the event takes place.
    pub location: String,
    /// Event category.
    pub category: String,
    /// Organizing body or person.
    pub organizer: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Scheduled start time.
    pub starts_at: DateTime<Utc>,
    /// Duration in hours.
    pub duration_hours: u32,
    /// Seating capacity; must be positive.
    pub capacity: Capacity,
    /// Seat price; zero means free.
    pub price: Money,
}

/// Partial update for event metadata. `None` fields are left unchanged.
///
/// Capacity is not editable here; it goes through
/// `edit_capacity`, which enforces the reserved-count guard.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New category.
    pub category: Option<String>,
    /// New organizer.
    pub organizer: Option<String>,
    /// New tags.
    pub tags: Option<Vec<String>>,
    /// New start time.
    pub starts_at: Option<DateTime<Utc>>,
    /// New duration in hours.
    pub duration_hours: Option<u32>,
    /// New price.
    pub price: Option<Money>,
}

/// Consistent read of an event together with its seat counter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    /// Event metadata.
    pub event: Event,
    /// Seating capacity at snapshot time.
    pub capacity: Capacity,
    /// Seats held by live registrations at snapshot time.
    pub reserved_count: u32,
}

impl EventSnapshot {
    /// Seats still available (`capacity - reserved_count`).
    #[must_use]
    pub const fn available_spots(&self) -> u32 {
        self.capacity.value().saturating_sub(self.reserved_count)
    }

    /// Whether every seat is held.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.reserved_count >= self.capacity.value()
    }

    /// Derived lifecycle status at `now`.
    #[must_use]
    pub fn status(&self, now: DateTime<Utc>) -> EventStatus {
        if !self.event.is_active || self.event.starts_at <= now {
            EventStatus::Closed
        } else if self.is_full() {
            EventStatus::Full
        } else {
            EventStatus::Open
        }
    }
}

// ============================================================================
// Registration entity
// ============================================================================

/// Registration lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationState {
    /// Seat held, payment not yet recorded.
    PendingPayment,
    /// Payment recorded; seat held until cancellation.
    Confirmed,
    /// Terminal. The seat has been released.
    Cancelled,
}

impl RegistrationState {
    /// Whether this state holds a seat.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::PendingPayment | Self::Confirmed)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PendingPayment => write!(f, "pending_payment"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How a payment was (or will be) made.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Card payment.
    #[default]
    Card,
    /// UPI transfer.
    Upi,
    /// Cash at the venue desk.
    Cash,
}

/// Who initiated a cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancellationActor {
    /// The registered student.
    Student,
    /// Catalog staff.
    Admin,
    /// The engine itself (payment timeout, cascade delete).
    System,
}

/// Optional inputs accompanying a claim.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClaimOptions {
    /// Intended payment method.
    pub payment_method: PaymentMethod,
    /// Accessibility or dietary notes for the organizers.
    pub special_requirements: Option<String>,
}

/// A single seat claim by one student for one event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// Unique registration identifier.
    pub id: RegistrationId,
    /// Event the seat belongs to.
    pub event_id: EventId,
    /// Student holding the claim.
    pub student_id: StudentId,
    /// Lifecycle state.
    pub state: RegistrationState,
    /// Amount owed, fixed at claim time from the event price.
    pub amount_due: Money,
    /// Amount actually paid; set only on the transition into `Confirmed`.
    pub amount_paid: Option<Money>,
    /// Intended payment method.
    pub payment_method: PaymentMethod,
    /// Gateway reference, generated when payment is recorded.
    pub transaction_id: Option<String>,
    /// Accessibility or dietary notes for the organizers.
    pub special_requirements: Option<String>,
    /// Who cancelled, if cancelled.
    pub cancelled_by: Option<CancellationActor>,
    /// Deadline for payment while `PendingPayment`.
    pub expires_at: DateTime<Utc>,
    /// When the claim was made.
    pub created_at: DateTime<Utc>,
    /// When the registration last changed state.
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Whether this registration currently holds a seat.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.state.is_live()
    }

    /// Whether this registration is pending and past its payment deadline.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.state == RegistrationState::PendingPayment && now >= self.expires_at
    }
}
