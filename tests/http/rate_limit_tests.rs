// tests/http/rate_limit_tests.rs

#[cfg(test)]
mod tests {

    use crate::helpers::{app_from, body_text, get, send, state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use pastebin_gateway::{RateLimitConfig, build_router};
    use std::time::Duration;

    // slow refill keeps wall-clock jitter from minting tokens mid-test
    fn slow() -> RateLimitConfig {
        RateLimitConfig::new(0.1, 5)
    }

    #[tokio::test]
    async fn sixth_request_is_rate_limited() {
        let app = app_from(state(slow()), "203.0.113.5:40000");

        for _ in 0..5 {
            assert_eq!(send(&app, get("/health")).await.status(), StatusCode::OK);
        }

        let response = send(&app, get("/health")).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = response.headers()[header::RETRY_AFTER]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=10).contains(&retry_after));
        assert_eq!(body_text(response).await, "Too many requests");
    }

    #[tokio::test]
    async fn limit_applies_across_routes() {
        let app = app_from(state(slow()), "203.0.113.6:40000");

        for uri in ["/health", "/metrics", "/pastes", "/health", "/metrics"] {
            assert_ne!(
                send(&app, get(uri)).await.status(),
                StatusCode::TOO_MANY_REQUESTS
            );
        }
        assert_eq!(
            send(&app, get("/pastes")).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn clients_are_limited_separately() {
        let shared = state(slow());
        let first = app_from(shared.clone(), "198.51.100.1:1111");
        let second = app_from(shared.clone(), "198.51.100.2:2222");

        for _ in 0..5 {
            send(&first, get("/health")).await;
        }
        assert_eq!(
            send(&first, get("/health")).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(send(&second, get("/health")).await.status(), StatusCode::OK);
        assert_eq!(shared.admission.len(), 2);
    }

    #[tokio::test]
    async fn same_host_different_ports_share_a_bucket() {
        let shared = state(slow());
        for port in 0..5 {
            let app = app_from(shared.clone(), &format!("192.0.2.44:{}", 50_000 + port));
            assert_eq!(send(&app, get("/health")).await.status(), StatusCode::OK);
        }

        let app = app_from(shared.clone(), "192.0.2.44:60000");
        assert_eq!(
            send(&app, get("/health")).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn missing_peer_address_fails_closed() {
        let shared = state(slow());
        let app = build_router(shared.clone());

        for _ in 0..3 {
            let response = crate::helpers::send(&app, get("/health")).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_text(response).await,
                "Unable to determine client address"
            );
        }
        assert!(shared.admission.is_empty());
    }

    #[tokio::test]
    async fn tokens_return_after_refill() {
        let app = app_from(state(RateLimitConfig::new(20.0, 1)), "203.0.113.7:1");

        assert_eq!(send(&app, get("/health")).await.status(), StatusCode::OK);
        assert_eq!(
            send(&app, get("/health")).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(send(&app, get("/health")).await.status(), StatusCode::OK);
    }

    fn forwarded(uri: &str, forwarded_for: &str) -> Request<Body> {
        Request::get(uri)
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn trusted_proxy_hops_get_their_own_buckets() {
        let shared = state(slow().trust_forwarded_for(true));
        let proxy = app_from(shared.clone(), "127.0.0.1:8081");

        for _ in 0..5 {
            let response = send(&proxy, forwarded("/health", "198.51.100.20, 127.0.0.1")).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(
            send(&proxy, forwarded("/health", "198.51.100.20")).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            send(&proxy, forwarded("/health", "198.51.100.21")).await.status(),
            StatusCode::OK
        );
        assert!(shared.admission.contains("198.51.100.20"));
        assert!(!shared.admission.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn garbage_forwarded_hop_fails_closed() {
        let shared = state(slow().trust_forwarded_for(true));
        let proxy = app_from(shared.clone(), "127.0.0.1:8081");

        let response = send(&proxy, forwarded("/health", "unknown")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(shared.admission.is_empty());
    }

    #[tokio::test]
    async fn forwarded_header_from_remote_peer_is_ignored() {
        let shared = state(slow().trust_forwarded_for(true));
        let remote = app_from(shared.clone(), "203.0.113.50:7000");

        for hop in 0..6 {
            send(&remote, forwarded("/health", &format!("198.51.100.{hop}"))).await;
        }
        assert_eq!(shared.admission.len(), 1);
        assert!(shared.admission.contains("203.0.113.50"));
    }
}
