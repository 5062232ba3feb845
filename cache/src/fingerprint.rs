//! Cache key construction (§4.7.2 Vary).

use aperture_http::{HeaderName, HeaderStore, Method};
use std::fmt::Write;

/// The primary key for a (method, url) pair, before any `Vary` expansion.
pub fn primary_key(method: Method, url: &str) -> String {
    format!("{method} {url}")
}

/// Build the full lookup key for a request: the primary key plus, for each
/// header name in `vary`, that header's current value on `request_headers`. Two
/// requests that agree on the primary key but differ in a `Vary`-listed header
/// produce distinct keys, per §4.7.2.
pub fn fingerprint(primary: &str, vary: &[HeaderName<'static>], request_headers: &HeaderStore<'_>) -> String {
    if vary.is_empty() {
        return primary.to_string();
    }
    let mut key = primary.to_string();
    for name in vary {
        let value = request_headers.get(name).and_then(|v| v.as_str()).unwrap_or("");
        write!(key, "\u{1}{}={}", name.as_str().to_ascii_lowercase(), value).expect("writing to a String cannot fail");
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use aperture_http::{HeaderValue, KnownHeaderName};

    #[test]
    fn no_vary_is_just_the_primary_key() {
        let primary = primary_key(Method::Get, "https://example.com/");
        assert_eq!(fingerprint(&primary, &[], &HeaderStore::new()), primary);
    }

    #[test]
    fn differing_vary_headers_produce_distinct_keys() {
        let primary = primary_key(Method::Get, "https://example.com/");
        let vary = vec![HeaderName::Known(KnownHeaderName::AcceptEncoding)];

        let mut gzip_req = HeaderStore::new();
        gzip_req.append(KnownHeaderName::AcceptEncoding, HeaderValue::new(b"gzip".as_slice()).unwrap());

        let mut br_req = HeaderStore::new();
        br_req.append(KnownHeaderName::AcceptEncoding, HeaderValue::new(b"br".as_slice()).unwrap());

        assert_ne!(
            fingerprint(&primary, &vary, &gzip_req),
            fingerprint(&primary, &vary, &br_req)
        );
    }
}
