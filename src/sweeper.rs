use std::sync::Arc;

use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::metrics::{EVICTED_TOTAL, REGISTRY_SIZE};
use crate::rate_limit::AdmissionController;

// Eviction sweep - runs every `period` until `shutdown` is cancelled
pub async fn eviction_sweeper<C>(
    controller: Arc<AdmissionController<C>>,
    period: Duration,
    shutdown: CancellationToken,
) where
    C: Clock + 'static,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately, nothing can be idle yet
    ticker.tick().await;

    info!(?period, "eviction sweeper started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let evicted = controller.sweep();
                let remaining = controller.len();

                EVICTED_TOTAL.inc_by(evicted as f64);
                REGISTRY_SIZE.set(remaining as f64);

                if evicted > 0 {
                    debug!(evicted, remaining, "evicted idle clients");
                }
            }
        }
    }

    info!("eviction sweeper stopped");
}
