//! Outgoing security header injection (§4.8: "inject headers
//! `Content-Security-Policy` (varies by level), `Referrer-Policy:
//! strict-origin-when-cross-origin`, `X-Content-Type-Options: nosniff`,
//! `X-Frame-Options: SAMEORIGIN`").

use crate::level::SecurityLevel;
use aperture_http::{HeaderStore, HeaderValue, KnownHeaderName};

/// The default CSP for [`SecurityLevel::Standard`]: permits same-origin plus
/// HTTPS subresources, blocks plugins.
const CSP_STANDARD: &str = "default-src 'self' https:; object-src 'none'";

/// [`SecurityLevel::High`]'s CSP: same-origin only, no inline scripts/styles.
const CSP_HIGH: &str = "default-src 'self'; script-src 'self'; style-src 'self'; object-src 'none'; frame-ancestors 'self'";

/// [`SecurityLevel::Maximum`]'s CSP: deny by default, opt in only to
/// same-origin images so the page can still render visually.
const CSP_MAXIMUM: &str = "default-src 'none'; img-src 'self'; style-src 'self'; frame-ancestors 'none'";

/// The CSP string this level applies, absent a `Custom` override.
pub fn content_security_policy(level: SecurityLevel) -> &'static str {
    match level {
        SecurityLevel::Standard => CSP_STANDARD,
        SecurityLevel::High => CSP_HIGH,
        SecurityLevel::Maximum | SecurityLevel::Custom => CSP_MAXIMUM,
    }
}

/// Inject the four security headers (§4.8) into `headers`, in place. `csp`
/// overrides the level's default CSP string, e.g. for [`SecurityLevel::Custom`]
/// domains with an explicit policy document CSP.
pub fn inject(headers: &mut HeaderStore<'static>, level: SecurityLevel, csp: Option<&str>) {
    let csp = csp.unwrap_or_else(|| content_security_policy(level));
    headers.set(KnownHeaderName::ContentSecurityPolicy, HeaderValue::new(csp.as_bytes()).unwrap());
    headers.set(KnownHeaderName::ReferrerPolicy, HeaderValue::new(b"strict-origin-when-cross-origin".as_slice()).unwrap());
    headers.set(KnownHeaderName::XContentTypeOptions, HeaderValue::new(b"nosniff".as_slice()).unwrap());
    headers.set(KnownHeaderName::XFrameOptions, HeaderValue::new(b"SAMEORIGIN".as_slice()).unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injects_all_four_headers() {
        let mut headers = HeaderStore::new();
        inject(&mut headers, SecurityLevel::Standard, None);
        assert!(headers.has(&KnownHeaderName::ContentSecurityPolicy.into()));
        assert!(headers.has(&KnownHeaderName::ReferrerPolicy.into()));
        assert!(headers.has(&KnownHeaderName::XContentTypeOptions.into()));
        assert!(headers.has(&KnownHeaderName::XFrameOptions.into()));
    }

    #[test]
    fn maximum_level_is_stricter_than_standard() {
        assert_ne!(content_security_policy(SecurityLevel::Standard), content_security_policy(SecurityLevel::Maximum));
    }

    #[test]
    fn custom_csp_overrides_the_level_default() {
        let mut headers = HeaderStore::new();
        inject(&mut headers, SecurityLevel::Custom, Some("default-src 'self' example.com"));
        let value = headers.get(&KnownHeaderName::ContentSecurityPolicy.into()).unwrap();
        assert_eq!(value.as_str(), Some("default-src 'self' example.com"));
    }
}
