use std::time::Instant;

/// Source of monotonic time for the admission controller.
///
/// `now` returns nanoseconds since an arbitrary fixed origin. Only
/// differences between readings are meaningful.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

// Monotonic clock anchored at construction time
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        // u64 nanoseconds covers ~584 years of uptime
        self.anchor.elapsed().as_nanos() as u64
    }
}
