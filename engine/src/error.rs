//! Error types for registration and capacity-accounting operations.

use crate::types::{Money, RegistrationState};
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error taxonomy for the registration engine.
///
/// Business-rule violations (`Conflict`, `InvalidState`, `InvalidInput`
/// categories) are returned to the caller and never retried inside the
/// engine; retrying a rejection without new information cannot succeed.
/// `Internal` anomalies are logged, self-healed where safe, and still
/// surfaced so callers do not treat a corrupted state as success.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    // ═══════════════════════════════════════════════════════════
    // Not Found
    // ═══════════════════════════════════════════════════════════

    /// No event exists with the given id.
    #[error("Event not found")]
    EventNotFound,

    /// No registration exists with the given id.
    #[error("Registration not found")]
    RegistrationNotFound,

    // ═══════════════════════════════════════════════════════════
    // Conflicts
    // ═══════════════════════════════════════════════════════════

    /// Every seat is held by a live registration.
    #[error("Event is full")]
    EventFull,

    /// The student already holds a live registration for this event.
    #[error("Already registered for this event")]
    AlreadyRegistered,

    /// The requested capacity is below the current reserved count.
    #[error("Capacity {requested} is below the {reserved} seats currently reserved")]
    CapacityBelowReserved {
        /// Capacity the admin asked for.
        requested: u32,
        /// Seats currently held by live registrations.
        reserved: u32,
    },

    /// The event still has live registrations and cascade was not requested.
    #[error("Event has {count} active registrations")]
    HasActiveRegistrations {
        /// Number of live registrations blocking the delete.
        count: usize,
    },

    // ═══════════════════════════════════════════════════════════
    // Invalid State
    // ═══════════════════════════════════════════════════════════

    /// The operation is not valid from the registration's current state.
    #[error("Cannot {operation} a registration in state {from}")]
    InvalidState {
        /// Current lifecycle state.
        from: RegistrationState,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// The event has started, finished, or been deactivated.
    #[error("Event is closed")]
    EventClosed,

    /// Student-initiated cancellation inside the cutoff window.
    #[error("Cannot cancel within {cutoff_hours} hours of the event")]
    CancellationWindowClosed {
        /// Configured cutoff in hours.
        cutoff_hours: i64,
    },

    // ═══════════════════════════════════════════════════════════
    // Invalid Input
    // ═══════════════════════════════════════════════════════════

    /// The paid amount does not match the amount due.
    #[error("Payment of {actual} does not match amount due {expected}")]
    InvalidAmount {
        /// Amount the registration owes.
        expected: Money,
        /// Amount the caller tried to record.
        actual: Money,
    },

    /// Capacity must be a positive integer.
    #[error("Capacity must be greater than zero")]
    InvalidCapacity,

    /// The event creation payload failed validation.
    #[error("Invalid event: {reason}")]
    InvalidEvent {
        /// What was wrong with the payload.
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Internal
    // ═══════════════════════════════════════════════════════════

    /// A release was attempted on an event with no reserved seats.
    /// The counter has been clamped at zero and the anomaly logged.
    #[error("Seat counter underflow")]
    CounterUnderflow,

    /// The underlying store failed (e.g., a poisoned lock).
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl EngineError {
    /// Returns `true` if the id in the request matched nothing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EventNotFound | Self::RegistrationNotFound)
    }

    /// Returns `true` if the request lost to current state (retry will not
    /// help without new information).
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::EventFull
                | Self::AlreadyRegistered
                | Self::CapacityBelowReserved { .. }
                | Self::HasActiveRegistrations { .. }
        )
    }

    /// Returns `true` if the operation is not valid from the current
    /// lifecycle state.
    #[must_use]
    pub const fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. } | Self::EventClosed | Self::CancellationWindowClosed { .. }
        )
    }

    /// Returns `true` if the caller supplied a bad value.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. } | Self::InvalidCapacity | Self::InvalidEvent { .. }
        )
    }

    /// Returns `true` for anomalies the engine logged and surfaced rather
    /// than hiding behind a success.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::CounterUnderflow | Self::Storage(_))
    }
}
