//! Business metrics for the registration engine.
//!
//! Recorded through the `metrics` facade; the hosting process decides which
//! recorder (if any) to install.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `registrations_total{outcome}` - Claims by outcome (confirmed, pending, rejected)
//! - `cancellations_total{actor}` - Cancellations by actor (student, admin, system)
//! - `payments_recorded_total` - Successful payment confirmations
//! - `payment_revenue_paise_total` - Revenue from confirmed payments in paise
//! - `registrations_expired_total` - Pending registrations reclaimed by the sweeper
//! - `seat_counter_underflows_total` - Release anomalies (clamped at zero)
//!
//! ## Gauges
//! - `pending_registrations` - Registrations currently awaiting payment

use crate::types::CancellationActor;
use metrics::{describe_counter, describe_gauge};

/// Initialize and register all business metric descriptions.
///
/// This should be called once at application startup, before any metrics
/// are recorded.
pub fn register_engine_metrics() {
    describe_counter!(
        "registrations_total",
        "Total seat claims by outcome (confirmed, pending, rejected)"
    );
    describe_counter!(
        "cancellations_total",
        "Total cancellations by actor (student, admin, system)"
    );
    describe_counter!(
        "payments_recorded_total",
        "Total successful payment confirmations"
    );
    describe_counter!(
        "payment_revenue_paise_total",
        "Total revenue from confirmed payments in paise"
    );
    describe_counter!(
        "registrations_expired_total",
        "Total pending registrations reclaimed by the expiry sweeper"
    );
    describe_counter!(
        "seat_counter_underflows_total",
        "Total seat-counter release anomalies clamped at zero"
    );
    describe_gauge!(
        "pending_registrations",
        "Current number of registrations awaiting payment"
    );

    tracing::info!("Engine metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a claim that produced a pending registration.
pub fn record_claim_pending() {
    metrics::counter!("registrations_total", "outcome" => "pending").increment(1);
    metrics::gauge!("pending_registrations").increment(1.0);
}

/// Record a claim that confirmed immediately (free event).
pub fn record_claim_confirmed() {
    metrics::counter!("registrations_total", "outcome" => "confirmed").increment(1);
}

/// Record a claim rejected by a business rule.
pub fn record_claim_rejected() {
    metrics::counter!("registrations_total", "outcome" => "rejected").increment(1);
}

/// Record a recorded payment and its revenue.
pub fn record_payment(amount_paise: u64) {
    metrics::counter!("payments_recorded_total").increment(1);
    metrics::counter!("payment_revenue_paise_total").increment(amount_paise);
    metrics::gauge!("pending_registrations").decrement(1.0);
}

/// Record a cancellation by actor, noting whether the registration was
/// still awaiting payment.
pub fn record_cancellation(actor: CancellationActor, was_pending: bool) {
    let label = match actor {
        CancellationActor::Student => "student",
        CancellationActor::Admin => "admin",
        CancellationActor::System => "system",
    };
    metrics::counter!("cancellations_total", "actor" => label).increment(1);
    if was_pending {
        metrics::gauge!("pending_registrations").decrement(1.0);
    }
}

/// Record a pending registration reclaimed by the sweeper.
pub fn record_expiry() {
    metrics::counter!("registrations_expired_total").increment(1);
}

/// Record a seat-counter underflow anomaly.
pub fn record_counter_underflow() {
    metrics::counter!("seat_counter_underflows_total").increment(1);
}
