// tests/admission/fixtures/manual_clock.rs

use pastebin_gateway::{AdmissionController, Clock, RateLimitConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// Clock that only moves when told to
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>, // Store as nanos
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn set(&self, at: Duration) {
        self.nanos.store(at.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.nanos.load(Ordering::Relaxed)
    }
}

// Controller on a manual clock starting at zero
pub fn controller(config: RateLimitConfig) -> (AdmissionController<ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let limiter = AdmissionController::with_clock(config, clock.clone()).unwrap();
    (limiter, clock)
}
