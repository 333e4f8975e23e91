// tests/http/helpers.rs

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, Response};
use pastebin_gateway::{AdmissionController, AppState, RateLimitConfig, build_router};
use tower::ServiceExt;

pub fn state(config: RateLimitConfig) -> AppState {
    let admission = Arc::new(AdmissionController::new(config).unwrap());
    AppState::new(admission, 5)
}

// Router that sees every request as coming from `peer`
pub fn app_from(state: AppState, peer: &str) -> Router {
    let peer: SocketAddr = peer.parse().unwrap();
    build_router(state).layer(MockConnectInfo(peer))
}

// Generous limits so paste tests never hit the limiter
pub fn unlimited_app() -> Router {
    app_from(state(RateLimitConfig::new(1_000.0, 1_000)), "127.0.0.1:9000")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn json(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
