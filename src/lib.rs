//! # pastebin-gateway
//!
//! A pastebin web service whose entire routing table sits behind a
//! per-client token-bucket admission controller.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pastebin_gateway::{AdmissionController, AppState, RateLimitConfig, build_router};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let admission = Arc::new(AdmissionController::new(RateLimitConfig::default())?);
//! let shutdown = CancellationToken::new();
//! let _sweeper = admission.spawn_sweeper(shutdown.clone());
//!
//! let app = build_router(AppState::new(admission, 5));
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

use axum::{Router, middleware::from_fn_with_state, routing::get};

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, MonotonicClock};
pub use config::{Args, RateLimitConfig};
pub use error::{AdmissionError, ApiError, ConfigError, StoreError};
pub use rate_limit::{Admission, AdmissionController, client_key, client_key_from_str, refill};
pub use state::AppState;
pub use store::{MemoryStore, PasteStore};

use handlers::{
    create_paste_handler, delete_paste_handler, edit_paste_handler, health_handler,
    list_pastes_handler, metrics_handler, view_paste_handler,
};

/// Build the routing table wrapped in the admission filter.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so
/// the filter can see each client's address; requests without one are
/// rejected.
pub fn build_router(state: AppState) -> Router {
    let admission = state.admission.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/pastes", get(list_pastes_handler).post(create_paste_handler))
        .route(
            "/pastes/{id}",
            get(view_paste_handler)
                .put(edit_paste_handler)
                .delete(delete_paste_handler),
        )
        .with_state(state)
        .layer(from_fn_with_state(admission, middleware::rate_limit))
}
