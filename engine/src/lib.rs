//! The top-level network + content-processing pipeline (§6, §7): one
//! [`Engine`] per browser tab, wrapping DNS prefetch, the connection pool,
//! the HTTP cache, the prefetch/priority planner, the security shield, and
//! the HTML tokenizer/tree-constructor/DOM behind a single callable surface.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod engine;
mod error;
mod request;
mod response;
mod stats;

pub use engine::{Engine, EngineConfig};
pub use error::{CacheErrorKind, CodecErrorKind, Error, ParseErrorKind, Result, TimeoutPhase};
pub use request::{Request, RequestId};
pub use response::Response;
pub use stats::Snapshot;

// Re-exported so callers can build a `Request`/`EngineConfig` without
// depending on every subsystem crate directly.
pub use aperture_dns::RecordType;
pub use aperture_planner::ResourceType;
pub use aperture_shield::{CookieRule, DomainPolicy, RequestKind, SecurityLevel};

#[cfg(test)]
mod tests {
    use super::*;
    use aperture_http::Method;

    fn test_engine() -> Engine {
        Engine::new(EngineConfig::default()).expect("engine construction should not fail with default config")
    }

    #[test]
    fn request_ids_are_distinct_and_increasing() {
        let a = Request::new(Method::Get, "https://example.com/");
        let b = Request::new(Method::Get, "https://example.com/");
        assert!(b.id > a.id);
    }

    #[test]
    fn blocked_response_has_no_status() {
        let response = Response::blocked();
        assert!(response.blocked);
        assert!(response.status.is_none());
    }

    #[tokio::test]
    async fn fetching_an_invalid_url_is_an_invalid_input_error() {
        let engine = test_engine();
        let request = Request::new(Method::Get, "not a url");
        let err = engine.fetch(request).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn cancelling_a_request_that_was_never_submitted_is_a_no_op() {
        let engine = test_engine();
        let request = Request::new(Method::Get, "https://example.com/");
        engine.cancel(request.id);
    }

    #[tokio::test]
    async fn fresh_stats_report_zero_activity() {
        let engine = test_engine();
        let snapshot = engine.stats().await;
        assert_eq!(snapshot.cache_hits, 0);
        assert_eq!(snapshot.cache_misses, 0);
        assert_eq!(snapshot.cache_hit_ratio, 0.0);
    }

    #[tokio::test]
    async fn prefetching_the_same_url_twice_is_rejected_as_a_duplicate() {
        let engine = test_engine();
        engine.prefetch("https://example.com/app.js", ResourceType::Js, false).await.unwrap();
        let err = engine.prefetch("https://example.com/app.js", ResourceType::Js, false).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
