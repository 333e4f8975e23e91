use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("pastebin_requests_total", "Total number of requests").unwrap();
    pub static ref ADMITTED_TOTAL: Counter =
        register_counter!("pastebin_admitted_total", "Requests admitted by the rate limiter").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("pastebin_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref CLIENT_KEY_FAILURES: Counter = register_counter!(
        "pastebin_client_key_failures_total",
        "Requests rejected because no client address could be derived"
    )
    .unwrap();
    pub static ref EVICTED_TOTAL: Counter =
        register_counter!("pastebin_evicted_clients_total", "Idle clients evicted by the sweeper").unwrap();
    pub static ref REGISTRY_SIZE: Gauge =
        register_gauge!("pastebin_tracked_clients", "Clients currently tracked by the rate limiter").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "pastebin_request_latency_seconds",
        "Latency of admitted requests in seconds"
    )
    .unwrap();
}
