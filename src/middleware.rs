use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::ExtensionRejection;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::metrics::{
    ADMITTED_TOTAL, CLIENT_KEY_FAILURES, RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL,
};
use crate::rate_limit::{Admission, AdmissionController};

// Admission filter wrapping the whole router
pub async fn rate_limit(
    State(admission): State<Arc<AdmissionController>>,
    connect_info: Result<ConnectInfo<SocketAddr>, ExtensionRejection>,
    request: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    // absent when the server was not started with connect info
    let peer = connect_info.ok().map(|ConnectInfo(addr)| addr);

    // a header that is not visible ASCII cannot name a client
    let forwarded_for = request
        .headers()
        .get("x-forwarded-for")
        .map(|value| value.to_str().unwrap_or_default());

    let decision = match admission.admit_request(peer, forwarded_for) {
        Ok(decision) => decision,
        Err(err) => {
            CLIENT_KEY_FAILURES.inc();
            return err.into_response();
        }
    };

    match decision {
        Admission::Allow => {
            ADMITTED_TOTAL.inc();
            let start_time = Instant::now();
            let response = next.run(request).await;
            REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
            response
        }
        Admission::Deny { retry_after } => {
            RATE_LIMITED_TOTAL.inc();
            warn!(
                client = ?peer,
                path = %request.uri().path(),
                "rate limit exceeded"
            );
            too_many_requests(retry_after.as_secs_f64().ceil() as u64)
        }
    }
}

fn too_many_requests(retry_after_secs: u64) -> Response {
    let mut response = (StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response();
    response.headers_mut().insert(
        header::RETRY_AFTER,
        HeaderValue::from(retry_after_secs.max(1)),
    );
    response
}
