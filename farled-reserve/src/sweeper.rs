use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use farled_core::store::ReservationStore;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::service::ReservationService;

/// Background reclaim of expired claim sessions. Deadlines live in the
/// data, so all this task does is call the sweep on a fixed cadence:
/// once immediately at startup, then on every interval tick.
pub struct ExpirySweeper<S> {
    service: Arc<ReservationService<S>>,
    interval: Duration,
}

impl<S> ExpirySweeper<S>
where
    S: ReservationStore + 'static,
{
    pub fn new(service: Arc<ReservationService<S>>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Spawns the sweep loop onto the runtime and returns its handle.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        info!(
            interval_seconds = self.interval.as_secs(),
            "expiry sweeper started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            // The first tick completes immediately: the startup sweep
            ticker.tick().await;

            match self.service.sweep_expired(Utc::now()).await {
                Ok(report) if report.scanned == 0 => {}
                Ok(report) => info!(
                    scanned = report.scanned,
                    reclaimed = report.reclaimed,
                    failed = report.failed,
                    "expiry sweep finished"
                ),
                Err(err) => error!(error = %err, "expiry sweep failed"),
            }
        }
    }
}
