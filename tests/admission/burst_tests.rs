// tests/admission/burst_tests.rs

#[cfg(test)]
mod tests {

    use crate::fixtures::manual_clock::controller;
    use pastebin_gateway::{Admission, RateLimitConfig};

    #[test]
    fn fresh_key_gets_full_burst() {
        let (limiter, _clock) = controller(RateLimitConfig::default());

        for i in 0..5 {
            assert_eq!(limiter.admit("10.0.0.1"), Admission::Allow, "request {i}");
        }
        assert!(!limiter.admit("10.0.0.1").is_allowed());
    }

    #[test]
    fn every_request_after_exhaustion_is_denied() {
        let (limiter, _clock) = controller(RateLimitConfig::new(5.0, 5));

        for _ in 0..5 {
            limiter.admit("10.0.0.1");
        }
        for _ in 0..20 {
            assert!(matches!(
                limiter.admit("10.0.0.1"),
                Admission::Deny { .. }
            ));
        }
    }

    #[test]
    fn keys_are_independent() {
        let (limiter, _clock) = controller(RateLimitConfig::new(5.0, 5));

        for _ in 0..5 {
            assert!(limiter.admit("10.0.0.1").is_allowed());
        }
        assert!(!limiter.admit("10.0.0.1").is_allowed());

        // Exhausting one client leaves the other's bucket untouched
        for _ in 0..5 {
            assert!(limiter.admit("10.0.0.2").is_allowed());
        }
        assert!(!limiter.admit("10.0.0.2").is_allowed());
        assert_eq!(limiter.len(), 2);
    }

    #[test]
    fn burst_size_follows_config() {
        let (limiter, _clock) = controller(RateLimitConfig::new(1.0, 12));

        let allowed = (0..20)
            .filter(|_| limiter.admit("client").is_allowed())
            .count();
        assert_eq!(allowed, 12);
    }

    #[test]
    fn denied_requests_still_register_the_client() {
        let (limiter, _clock) = controller(RateLimitConfig::new(5.0, 1));

        assert!(limiter.admit("client").is_allowed());
        assert!(!limiter.admit("client").is_allowed());
        assert!(limiter.contains("client"));
        assert_eq!(limiter.len(), 1);
    }
}
