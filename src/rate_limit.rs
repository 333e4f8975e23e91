//! Per-client token-bucket admission control.
//!
//! Every inbound request is keyed by the host portion of its peer address.
//! Each key owns a token bucket holding up to `burst` tokens that refills
//! continuously at `rate` tokens per second. A request is admitted when a
//! token can be withdrawn and denied otherwise.
//!
//! Bucket state lives in a [`DashMap`] registry. Lookup-or-create, refill,
//! withdrawal and the `last_seen` refresh all happen under the shard guard
//! handed out by the entry API, so decisions for a single key are
//! serialized and two concurrent first requests can never create two
//! entries. A background sweep (see [`crate::sweeper`]) evicts entries that
//! have been idle longer than the configured timeout.
//!
//! Token counts are kept as integer *credit* measured in nanoseconds of
//! accrual time: one token is worth one emission interval (`1s / rate`).
//! Refill then reduces to adding elapsed nanoseconds, capped at
//! `burst * interval`, with no floating point drift.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::clock::{Clock, MonotonicClock};
use crate::config::RateLimitConfig;
use crate::error::{AdmissionError, ConfigError};
use crate::metrics::REGISTRY_SIZE;
use crate::sweeper::eviction_sweeper;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Credit available at `now` given the credit recorded at `last_refill`.
///
/// Credit accrues one nanosecond per elapsed nanosecond and never exceeds
/// `capacity`. A `now` earlier than `last_refill` accrues nothing.
pub fn refill(credit: u64, last_refill: u64, now: u64, capacity: u64) -> u64 {
    credit
        .saturating_add(now.saturating_sub(last_refill))
        .min(capacity)
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    /// The client's bucket is empty. `retry_after` is the time until the
    /// next token accrues.
    Deny { retry_after: Duration },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow)
    }
}

#[derive(Debug, Clone)]
struct TokenBucket {
    credit: u64,
    last_refill: u64,
}

impl TokenBucket {
    fn full(capacity: u64, now: u64) -> Self {
        Self {
            credit: capacity,
            last_refill: now,
        }
    }

    // Err carries the nanoseconds until one token is available
    fn try_take(&mut self, now: u64, interval: u64, capacity: u64) -> Result<(), u64> {
        self.credit = refill(self.credit, self.last_refill, now, capacity);
        self.last_refill = self.last_refill.max(now);

        if self.credit >= interval {
            self.credit -= interval;
            Ok(())
        } else {
            Err(interval - self.credit)
        }
    }
}

// Registry entry for one client key
#[derive(Debug, Clone)]
struct ClientEntry {
    bucket: TokenBucket,
    last_seen: u64,
}

/// Registry of per-client token buckets and the admission decision over it.
///
/// `C` is the time source, defaulting to [`MonotonicClock`].
#[derive(Debug)]
pub struct AdmissionController<C = MonotonicClock>
where
    C: Clock,
{
    interval_nanos: u64,
    capacity_nanos: u64,
    idle_timeout_nanos: u64,
    config: RateLimitConfig,
    registry: DashMap<String, ClientEntry>,
    clock: C,
    sweeper_started: AtomicBool,
}

impl AdmissionController<MonotonicClock> {
    pub fn new(config: RateLimitConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C> AdmissionController<C>
where
    C: Clock,
{
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;

        let interval_nanos = ((NANOS_PER_SEC / config.rate_per_second).round() as u64).max(1);
        let capacity_nanos = interval_nanos.saturating_mul(config.burst as u64);
        let idle_timeout_nanos = config.idle_timeout.as_nanos().min(u64::MAX as u128) as u64;

        Ok(Self {
            interval_nanos,
            capacity_nanos,
            idle_timeout_nanos,
            config,
            registry: DashMap::new(),
            clock,
            sweeper_started: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Decide whether the client identified by `key` may proceed.
    ///
    /// Creates the client's entry with a full bucket on first sight,
    /// refreshes its last-seen time and withdraws one token if available.
    pub fn admit(&self, key: &str) -> Admission {
        let now = self.clock.now();

        // Known clients avoid allocating an owned key
        if let Some(mut entry) = self.registry.get_mut(key) {
            return self.take(key, entry.value_mut(), now);
        }

        let mut created = false;
        let decision = {
            let mut entry = self.registry.entry(key.to_owned()).or_insert_with(|| {
                created = true;
                debug!(client = key, "tracking new client");
                ClientEntry {
                    bucket: TokenBucket::full(self.capacity_nanos, now),
                    last_seen: now,
                }
            });
            self.take(key, entry.value_mut(), now)
        };

        // len() takes every shard lock, so only after the guard is gone
        if created {
            REGISTRY_SIZE.set(self.registry.len() as f64);
        }
        decision
    }

    fn take(&self, key: &str, entry: &mut ClientEntry, now: u64) -> Admission {
        entry.last_seen = entry.last_seen.max(now);

        match entry
            .bucket
            .try_take(now, self.interval_nanos, self.capacity_nanos)
        {
            Ok(()) => Admission::Allow,
            Err(wait_nanos) => {
                trace!(client = key, wait_nanos, "bucket empty");
                Admission::Deny {
                    retry_after: Duration::from_nanos(wait_nanos),
                }
            }
        }
    }

    /// Admit a request by its peer address, failing closed when the
    /// address is unavailable.
    pub fn admit_addr(&self, addr: Option<SocketAddr>) -> Result<Admission, AdmissionError> {
        let key = client_key(addr)?;
        Ok(self.admit(&key))
    }

    /// Admit a request that may have come through a reverse proxy.
    ///
    /// When forwarding is trusted and the direct peer is loopback, the key
    /// is the first `X-Forwarded-For` hop, and a hop that is not an address
    /// fails closed. Otherwise the header is ignored.
    pub fn admit_request(
        &self,
        peer: Option<SocketAddr>,
        forwarded_for: Option<&str>,
    ) -> Result<Admission, AdmissionError> {
        let via_local_proxy = peer.is_some_and(|addr| addr.ip().to_canonical().is_loopback());

        match forwarded_for {
            Some(value) if self.config.trusts_forwarded_for() && via_local_proxy => {
                let first_hop = value.split(',').next().unwrap_or_default();
                let key = client_key_from_str(first_hop)?;
                Ok(self.admit(&key))
            }
            Some(_) if self.config.trusts_forwarded_for() => {
                warn!(?peer, "ignoring X-Forwarded-For from non-loopback peer");
                self.admit_addr(peer)
            }
            _ => self.admit_addr(peer),
        }
    }

    /// Remove every entry idle for longer than the configured timeout.
    ///
    /// Returns the number of evicted entries.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let idle_timeout = self.idle_timeout_nanos;
        let mut evicted = 0;

        self.registry.retain(|_, entry| {
            let keep = now.saturating_sub(entry.last_seen) <= idle_timeout;
            if !keep {
                evicted += 1;
            }
            keep
        });

        evicted
    }

    /// Number of clients currently tracked.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.registry.contains_key(key)
    }

    /// Tokens currently available to `key`, refilled up to now, without
    /// consuming any. `None` if the key is not tracked.
    pub fn tokens(&self, key: &str) -> Option<f64> {
        let now = self.clock.now();
        self.registry.get(key).map(|entry| {
            let credit = refill(
                entry.bucket.credit,
                entry.bucket.last_refill,
                now,
                self.capacity_nanos,
            );
            credit as f64 / self.interval_nanos as f64
        })
    }
}

impl<C> AdmissionController<C>
where
    C: Clock + 'static,
{
    /// Start the background eviction sweep for this registry.
    ///
    /// At most one sweeper runs per controller: later calls return `None`.
    /// Also returns `None` when the sweep interval is configured as zero.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        let period = self.config.sweep_interval_duration()?;

        if self.sweeper_started.swap(true, Ordering::AcqRel) {
            warn!("eviction sweeper already running, not starting another");
            return None;
        }

        Some(tokio::spawn(eviction_sweeper(
            Arc::clone(self),
            period,
            shutdown,
        )))
    }
}

/// Derive the rate-limit key for a peer address: its IP with the port
/// stripped. IPv4-mapped IPv6 addresses collapse to their IPv4 form.
pub fn client_key(addr: Option<SocketAddr>) -> Result<String, AdmissionError> {
    addr.map(|addr| addr.ip().to_canonical().to_string())
        .ok_or(AdmissionError::MissingClientAddress)
}

/// Derive the rate-limit key from a textual address, either a bare IP or
/// `host:port`.
pub fn client_key_from_str(remote: &str) -> Result<String, AdmissionError> {
    let remote = remote.trim();
    remote
        .parse::<IpAddr>()
        .or_else(|_| remote.parse::<SocketAddr>().map(|addr| addr.ip()))
        .map(|ip| ip.to_canonical().to_string())
        .map_err(|_| AdmissionError::UnparseableClientAddress(remote.to_string()))
}
