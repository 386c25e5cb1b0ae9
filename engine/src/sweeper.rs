//! Background sweep reclaiming seats from expired pending registrations.
//!
//! A pending registration that is never confirmed holds its seat only until
//! the configured payment expiry; this task periodically auto-cancels the
//! overdue ones. Expiry is enforced only here, never synchronously inside
//! `claim`/`confirm_payment`.

use crate::service::RegistrationService;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Handle to the running sweep task.
pub struct ExpirySweeper {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Spawns the sweep loop on the current tokio runtime, ticking at the
    /// service's configured sweep interval.
    #[must_use]
    pub fn spawn(service: Arc<RegistrationService>) -> Self {
        let period = service.config().sweep_interval();
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so a freshly
            // started engine does not sweep before anything can be overdue.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match service.sweep_now() {
                            Ok(0) => {}
                            Ok(reclaimed) => {
                                info!(reclaimed, "expiry sweep reclaimed seats");
                            }
                            Err(sweep_error) => {
                                error!(%sweep_error, "expiry sweep failed");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("expiry sweeper stopping");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Signals the sweep loop to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(join_error) = self.handle.await {
            error!(%join_error, "expiry sweeper task panicked");
        }
    }
}
