//! Outgoing fingerprint rewriting (§4.8: "ask the fingerprint module to
//! rewrite UA / Accept / Accept-Language per level").

use crate::level::SecurityLevel;
use aperture_http::{HeaderStore, HeaderValue, KnownHeaderName};

const GENERIC_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const GENERIC_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const GENERIC_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Rewrite `headers` in place to reduce how identifying a request looks, per
/// `level`. `Standard` leaves the caller's values untouched; `High` normalizes
/// `Accept-Language` to a single common locale and replaces `User-Agent` with
/// a generic browser string; `Maximum` additionally strips `Accept` down to a
/// generic wildcard value so per-site content-negotiation quirks can't be
/// used to distinguish users.
pub fn rewrite(headers: &mut HeaderStore<'static>, level: SecurityLevel) {
    match level {
        SecurityLevel::Standard => {}
        SecurityLevel::High | SecurityLevel::Custom => {
            headers.set(KnownHeaderName::UserAgent, HeaderValue::new(GENERIC_UA.as_bytes()).unwrap());
            headers.set(KnownHeaderName::AcceptLanguage, HeaderValue::new(GENERIC_ACCEPT_LANGUAGE.as_bytes()).unwrap());
        }
        SecurityLevel::Maximum => {
            headers.set(KnownHeaderName::UserAgent, HeaderValue::new(GENERIC_UA.as_bytes()).unwrap());
            headers.set(KnownHeaderName::AcceptLanguage, HeaderValue::new(GENERIC_ACCEPT_LANGUAGE.as_bytes()).unwrap());
            headers.set(KnownHeaderName::Accept, HeaderValue::new(GENERIC_ACCEPT.as_bytes()).unwrap());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_identifying_ua() -> HeaderStore<'static> {
        let mut h = HeaderStore::new();
        h.set(KnownHeaderName::UserAgent, HeaderValue::new(b"MyRareBrowser/0.0.1 (unique-build-id-1234)".as_slice()).unwrap());
        h.set(KnownHeaderName::AcceptLanguage, HeaderValue::new(b"xz-Yy,rare;q=1.0".as_slice()).unwrap());
        h
    }

    #[test]
    fn standard_leaves_headers_untouched() {
        let mut h = headers_with_identifying_ua();
        let original = h.get(&KnownHeaderName::UserAgent.into()).unwrap().clone();
        rewrite(&mut h, SecurityLevel::Standard);
        assert_eq!(h.get(&KnownHeaderName::UserAgent.into()).unwrap().as_bytes(), original.as_bytes());
    }

    #[test]
    fn high_normalizes_ua_and_accept_language() {
        let mut h = headers_with_identifying_ua();
        rewrite(&mut h, SecurityLevel::High);
        assert_eq!(h.get(&KnownHeaderName::UserAgent.into()).unwrap().as_str(), Some(GENERIC_UA));
        assert_eq!(h.get(&KnownHeaderName::AcceptLanguage.into()).unwrap().as_str(), Some(GENERIC_ACCEPT_LANGUAGE));
    }

    #[test]
    fn maximum_additionally_normalizes_accept() {
        let mut h = headers_with_identifying_ua();
        h.set(KnownHeaderName::Accept, HeaderValue::new(b"application/x-rare-format".as_slice()).unwrap());
        rewrite(&mut h, SecurityLevel::Maximum);
        assert_eq!(h.get(&KnownHeaderName::Accept.into()).unwrap().as_str(), Some(GENERIC_ACCEPT));
    }
}
