//! Boundary scenario: stale-while-revalidate (§4.7.1, §8) — once an entry is
//! past its `max-age` but still inside its `stale-while-revalidate` budget, a
//! `get` returns the stale body immediately while a background conditional
//! GET refreshes it; the next `get` after that completes sees a fresh entry
//! again without the caller ever issuing a second foreground request.
//!
//! The spec's own timings (120s old, revalidate within 5s) don't fit a fast
//! test run, so this scales them down to low whole seconds — `Duration`'s
//! `Cache-Control` parsing only understands integer seconds — while keeping
//! the same causal shape: seed, go stale, serve-stale-and-kick-off-revalidation,
//! wait, observe freshness again.

mod support;

use aperture_engine::{Engine, EngineConfig, Request};
use aperture_http::Method;
use support::{canned_response, TestServer};

#[tokio::test]
async fn stale_entry_is_served_then_revalidated_in_the_background() {
    let server = TestServer::start(vec![
        canned_response(200, "OK", &[("Cache-Control", "max-age=1, stale-while-revalidate=30"), ("ETag", "\"v1\"")], b"v1 body"),
        canned_response(304, "Not Modified", &[("ETag", "\"v1\"")], b""),
    ])
    .await;
    let engine = Engine::new(EngineConfig::default()).expect("engine");
    let url = format!("http://{}/resource", server.authority());

    let first = engine.fetch(Request::new(Method::Get, url.clone())).await.expect("seed fetch");
    assert_eq!(first.body, b"v1 body");
    assert!(!first.from_cache);
    assert_eq!(server.request_count(), 1);

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    let stale = engine.fetch(Request::new(Method::Get, url.clone())).await.expect("stale fetch");
    assert_eq!(stale.body, b"v1 body", "a stale-but-within-budget entry is served as-is");
    assert!(stale.from_cache);

    // Give the detached revalidation task time to run its conditional GET
    // and fold the 304 back into the cache.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    assert_eq!(server.request_count(), 2, "the background revalidation should have reached the origin");

    let revalidated = engine.fetch(Request::new(Method::Get, url)).await.expect("post-revalidation fetch");
    assert!(revalidated.from_cache);
    assert_eq!(revalidated.body, b"v1 body", "304 keeps the existing body, only refreshes freshness");
    assert_eq!(server.request_count(), 2, "the foreground fetch after revalidation is a cache hit, not a new request");
}
