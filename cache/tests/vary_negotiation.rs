//! Boundary scenario: `Vary` negotiation (§4.7.2) — a response varying on
//! `Accept-Encoding` stores distinct entries per encoding; a request with a
//! third, unseen `Accept-Encoding` value misses even though the URL already
//! has cached variants.

use aperture_cache::{CacheConfig, HttpCache, Lookup};
use aperture_http::{HeaderStore, HeaderValue, KnownHeaderName, Method, Status};

fn response_headers(cache_control: &str, vary: &str) -> HeaderStore<'static> {
    let mut headers = HeaderStore::new();
    headers.append(KnownHeaderName::CacheControl, HeaderValue::new(cache_control.as_bytes()).unwrap());
    headers.append(KnownHeaderName::Vary, HeaderValue::new(vary.as_bytes()).unwrap());
    headers
}

fn request_headers(accept_encoding: &str) -> HeaderStore<'static> {
    let mut headers = HeaderStore::new();
    headers.append(KnownHeaderName::AcceptEncoding, HeaderValue::new(accept_encoding.as_bytes()).unwrap());
    headers
}

#[test]
fn three_accept_encodings_negotiate_two_hits_and_a_miss() {
    let cache = HttpCache::new(CacheConfig::default());
    let url = "https://example.com/styles.css";

    let gzip_req = request_headers("gzip");
    let br_req = request_headers("br");
    let deflate_req = request_headers("deflate");

    cache
        .put(Method::Get, url, &gzip_req, response_headers("max-age=60", "Accept-Encoding"), Status::Ok, b"gzip-bytes".to_vec())
        .unwrap();
    cache
        .put(Method::Get, url, &br_req, response_headers("max-age=60", "Accept-Encoding"), Status::Ok, b"br-bytes".to_vec())
        .unwrap();

    match cache.get(Method::Get, url, &gzip_req) {
        Lookup::Fresh(entry) => assert_eq!(entry.body, b"gzip-bytes"),
        _ => panic!("expected a fresh gzip variant"),
    }
    match cache.get(Method::Get, url, &br_req) {
        Lookup::Fresh(entry) => assert_eq!(entry.body, b"br-bytes"),
        _ => panic!("expected a fresh br variant"),
    }
    assert!(
        matches!(cache.get(Method::Get, url, &deflate_req), Lookup::Miss),
        "a third Accept-Encoding value not yet cached must miss even though the URL has variants"
    );

    // Caching the third variant doesn't disturb the other two.
    cache
        .put(Method::Get, url, &deflate_req, response_headers("max-age=60", "Accept-Encoding"), Status::Ok, b"deflate-bytes".to_vec())
        .unwrap();
    assert!(matches!(cache.get(Method::Get, url, &gzip_req), Lookup::Fresh(_)));
    assert!(matches!(cache.get(Method::Get, url, &br_req), Lookup::Fresh(_)));
    assert!(matches!(cache.get(Method::Get, url, &deflate_req), Lookup::Fresh(_)));
}

#[test]
fn fingerprint_is_stable_for_the_same_request_headers() {
    let cache = HttpCache::new(CacheConfig::default());
    let headers = request_headers("gzip");
    let a = cache.fingerprint(Method::Get, "https://example.com/x", &headers);
    let b = cache.fingerprint(Method::Get, "https://example.com/x", &headers);
    assert_eq!(a, b);
}
