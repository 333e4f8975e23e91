use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "pastebin-gateway")]
#[command(about = "Pastebin service with per-client rate limiting")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PASTEBIN_PORT", default_value_t = 8080)]
    pub port: u16,

    // Max tokens per client bucket (instantaneous burst)
    #[arg(short, long, env = "PASTEBIN_BURST", default_value_t = 5)]
    pub burst: u32,

    // Sustained requests per second per client
    #[arg(short, long, env = "PASTEBIN_RATE", default_value_t = 5.0)]
    pub rate: f64,

    // Seconds a client may stay idle before its limiter is evicted
    #[arg(long, env = "PASTEBIN_IDLE_TIMEOUT", default_value_t = 300)]
    pub idle_timeout: u64,

    // Seconds between eviction sweeps, 0 disables the sweep
    #[arg(long, env = "PASTEBIN_SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,

    // Key clients by the first X-Forwarded-For hop when the peer is a local proxy
    #[arg(long, env = "PASTEBIN_TRUST_FORWARDED_FOR", default_value_t = false)]
    pub trust_forwarded_for: bool,

    // Pastes per page on the listing endpoint
    #[arg(long, env = "PASTEBIN_PAGE_SIZE", default_value_t = 5)]
    pub page_size: usize,

    // Tracing filter directive, e.g. "info" or "pastebin_gateway=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    // Log output format: compact or json
    #[arg(long, env = "PASTEBIN_LOG_FORMAT", default_value = "compact")]
    pub log_format: String,
}

impl Args {
    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.rate, self.burst)
            .idle_timeout(Duration::from_secs(self.idle_timeout))
            .sweep_interval(Duration::from_secs(self.sweep_interval))
            .trust_forwarded_for(self.trust_forwarded_for)
    }
}

pub const DEFAULT_RATE: f64 = 5.0;
pub const DEFAULT_BURST: u32 = 5;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Admission policy, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub(crate) rate_per_second: f64,
    pub(crate) burst: u32,
    pub(crate) idle_timeout: Duration,
    pub(crate) sweep_interval: Duration,
    pub(crate) trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate_per_second: DEFAULT_RATE,
            burst: DEFAULT_BURST,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            trust_forwarded_for: false,
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration with the given refill rate and burst, keeping
    /// the default eviction timings.
    pub fn new(rate_per_second: f64, burst: u32) -> Self {
        Self {
            rate_per_second,
            burst,
            ..Self::default()
        }
    }

    /// Builder-style: set refill rate in tokens per second
    pub fn rate(mut self, rate_per_second: f64) -> Self {
        self.rate_per_second = rate_per_second;
        self
    }

    /// Builder-style: set burst capacity
    pub fn burst(mut self, burst: u32) -> Self {
        self.burst = burst;
        self
    }

    /// Builder-style: set how long an entry may stay idle before eviction
    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Builder-style: set the eviction sweep period. `Duration::ZERO`
    /// disables the background sweep.
    pub fn sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    /// Builder-style: derive the client key from `X-Forwarded-For` for
    /// requests whose direct peer is a loopback proxy
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    pub fn rate_per_second(&self) -> f64 {
        self.rate_per_second
    }

    pub fn burst_capacity(&self) -> u32 {
        self.burst
    }

    pub fn idle_timeout_duration(&self) -> Duration {
        self.idle_timeout
    }

    pub fn sweep_interval_duration(&self) -> Option<Duration> {
        (!self.sweep_interval.is_zero()).then_some(self.sweep_interval)
    }

    pub fn trusts_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rate_per_second.is_finite() || self.rate_per_second <= 0.0 {
            return Err(ConfigError::InvalidRate);
        }
        if self.burst == 0 {
            return Err(ConfigError::InvalidBurst);
        }
        if self.idle_timeout.is_zero() {
            return Err(ConfigError::InvalidIdleTimeout);
        }
        Ok(())
    }
}
