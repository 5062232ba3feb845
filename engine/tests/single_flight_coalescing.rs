//! Boundary scenario: single-flight coalescing (§5) — 10 concurrent cache
//! misses on the same fingerprint must produce exactly one origin fetch, with
//! every caller receiving that fetch's response.

mod support;

use aperture_engine::{Engine, EngineConfig, Request};
use aperture_http::Method;
use support::{canned_response, TestServer};

#[tokio::test]
async fn ten_concurrent_misses_share_one_origin_fetch() {
    let server = TestServer::start(vec![canned_response(200, "OK", &[], b"shared body")]).await;
    let engine = Engine::new(EngineConfig::default()).expect("engine");
    let url = format!("http://{}/resource", server.authority());

    // `tokio::join!` polls every arm on this one task, cooperatively
    // interleaved at each `.await` point — enough to land 10 misses on the
    // same fingerprint while the first fetch is still in flight, without
    // needing `Arc<Engine>` just to hand futures to `tokio::spawn`.
    let fetch = |url: String| async { engine.fetch(Request::new(Method::Get, url)).await };
    let results = tokio::join!(
        fetch(url.clone()), fetch(url.clone()), fetch(url.clone()), fetch(url.clone()), fetch(url.clone()),
        fetch(url.clone()), fetch(url.clone()), fetch(url.clone()), fetch(url.clone()), fetch(url.clone()),
    );
    let responses = [
        results.0, results.1, results.2, results.3, results.4,
        results.5, results.6, results.7, results.8, results.9,
    ];

    assert_eq!(server.request_count(), 1, "exactly one transport request should have reached the origin");
    for response in responses {
        let response = response.expect("fetch should succeed");
        assert_eq!(response.body, b"shared body");
        assert!(!response.from_cache, "the leader's own fetch is not a cache hit");
    }
}
