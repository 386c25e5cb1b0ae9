//! Configuration for the registration engine.
//!
//! Loads policy knobs from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Policy configuration for the registration engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long a `pending_payment` registration holds its seat before the
    /// sweeper reclaims it, in seconds (default: 15 minutes).
    pub payment_expiry_secs: u64,
    /// How often the background sweeper runs, in seconds (default: 60).
    pub sweep_interval_secs: u64,
    /// Window before the event start inside which student-initiated
    /// cancellation is rejected, in hours (default: 24). Admin and system
    /// cancellations bypass the cutoff.
    pub cancellation_cutoff_hours: i64,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            payment_expiry_secs: env::var("REGISTRATION_PAYMENT_EXPIRY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(900), // 15 minutes
            sweep_interval_secs: env::var("REGISTRATION_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            cancellation_cutoff_hours: env::var("REGISTRATION_CANCELLATION_CUTOFF_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),
        }
    }

    /// Payment expiry as a `chrono` duration.
    #[must_use]
    pub fn payment_expiry(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.payment_expiry_secs).unwrap_or(i64::MAX))
    }

    /// Sweep interval as a `std` duration for the tokio timer.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Cancellation cutoff as a `chrono` duration.
    #[must_use]
    pub fn cancellation_cutoff(&self) -> chrono::Duration {
        chrono::Duration::hours(self.cancellation_cutoff_hours)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            payment_expiry_secs: 900,
            sweep_interval_secs: 60,
            cancellation_cutoff_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy() {
        let config = EngineConfig::default();
        assert_eq!(config.payment_expiry(), chrono::Duration::minutes(15));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.cancellation_cutoff(), chrono::Duration::hours(24));
    }
}
