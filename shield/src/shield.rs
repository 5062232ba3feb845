//! The top-level security shield (§4.8, §6): ties together header injection,
//! fingerprint rewriting, tracker blocking, cookie policy, certificate
//! validation, content scanning, and WebRTC sanitization behind the per-domain
//! policy table, with a single exceptions list that bypasses every rule
//! category at once.

use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

use aperture_http::HeaderStore;

use crate::cert::{self, CertInfo};
use crate::content_scanner::{ContentScanner, Severity, BLOCK_PAGE_BODY};
use crate::cookie_enforcement;
use crate::cookie_policy::{CookiePolicy, CookieRule};
use crate::error::{Error, Result};
use crate::fingerprint;
use crate::headers;
use crate::level::SecurityLevel;
use crate::policy::DomainPolicy;
use crate::tracker::{RequestKind, TrackerFilter};

/// Outcome of scanning a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The body was unremarkable (or scored below [`Severity::High`]) and
    /// passes through unchanged.
    Passed,
    /// The body matched a [`Severity::High`] pattern; the caller should
    /// substitute [`BLOCK_PAGE_BODY`] and respond with status 403.
    Blocked,
}

/// The security shield. One instance is shared across a browsing session; its
/// policy table and exceptions list persist for the session's lifetime.
pub struct SecurityShield {
    policies: HashMap<String, DomainPolicy>,
    default_level: SecurityLevel,
    trackers: TrackerFilter,
    cookies: CookiePolicy,
    scanner: ContentScanner,
    /// Domains exempted from every rule category (§4.8: "Exceptions bypass
    /// all rules").
    exceptions: HashSet<String>,
}

impl SecurityShield {
    /// Build a shield from its tracker filter and cookie policy table, with
    /// an empty per-domain policy table, no exceptions, and the default
    /// content scanner.
    pub fn new(trackers: TrackerFilter, cookies: CookiePolicy) -> Self {
        Self {
            policies: HashMap::new(),
            default_level: SecurityLevel::default(),
            trackers,
            cookies,
            scanner: ContentScanner::default(),
            exceptions: HashSet::new(),
        }
    }

    /// Register (or replace) `domain`'s explicit policy.
    pub fn set_domain_policy(&mut self, domain: impl Into<String>, policy: DomainPolicy) {
        self.policies.insert(domain.into(), policy);
    }

    /// Set the security level domains fall back to when they have no
    /// explicit [`DomainPolicy`] registered.
    pub fn set_security_level(&mut self, level: SecurityLevel) {
        self.default_level = level;
    }

    /// Exempt `domain` from tracker blocking, cookie policy, and CSP/content
    /// enforcement entirely.
    pub fn add_policy_exception(&mut self, domain: impl Into<String>) {
        self.exceptions.insert(domain.into());
    }

    fn is_exempt(&self, domain: &str) -> bool {
        self.exceptions.contains(domain)
    }

    fn level_for(&self, domain: &str) -> SecurityLevel {
        self.policies.get(domain).map(DomainPolicy::level).unwrap_or(self.default_level)
    }

    fn csp_override_for(&self, domain: &str) -> Option<&str> {
        self.policies.get(domain).and_then(DomainPolicy::csp_override)
    }

    /// Apply this domain's outgoing policy to a request: rewrite the
    /// fingerprinting headers and check the tracker filter. Returns
    /// `Err(Error::Blocked)` if the request should be dropped rather than
    /// sent.
    pub fn prepare_request(
        &self,
        domain: &str,
        url: &str,
        referrer: Option<&str>,
        kind: RequestKind,
        headers: &mut HeaderStore<'static>,
    ) -> Result<()> {
        if self.is_exempt(domain) {
            return Ok(());
        }
        if let Some(reason) = self.trackers.should_block(url, referrer, kind) {
            return Err(Error::Blocked(reason));
        }
        fingerprint::rewrite(headers, self.level_for(domain));
        Ok(())
    }

    /// Apply this domain's incoming policy to a response: validate the
    /// certificate (if `cert` is `Some`, i.e. the request was HTTPS), inject
    /// the always-on security headers, enforce the cookie policy on any
    /// `Set-Cookie` values, and run the content scanner.
    ///
    /// Returns the (possibly rewritten) `Set-Cookie` values and the scan
    /// outcome; the caller substitutes [`BLOCK_PAGE_BODY`] and a 403 status
    /// when the outcome is [`ScanOutcome::Blocked`].
    pub fn inspect_response(
        &self,
        domain: &str,
        cert: Option<&CertInfo>,
        set_cookie_values: &[String],
        body: &str,
        headers: &mut HeaderStore<'static>,
    ) -> Result<(Vec<String>, ScanOutcome)> {
        let level = self.level_for(domain);

        if let Some(cert) = cert {
            cert::validate(cert, level)?;
        }

        if self.is_exempt(domain) {
            headers::inject(headers, level, self.csp_override_for(domain));
            return Ok((set_cookie_values.to_vec(), ScanOutcome::Passed));
        }

        headers::inject(headers, level, self.csp_override_for(domain));
        let rule = self.evaluate_cookie(domain, true, SystemTime::now());
        let cookies = cookie_enforcement::enforce(rule, set_cookie_values);

        let outcome = match self.scanner.scan(body) {
            Severity::High => ScanOutcome::Blocked,
            _ => ScanOutcome::Passed,
        };

        Ok((cookies, outcome))
    }

    /// The cookie rule that governs `domain` for a request whose
    /// first/third-party status is `is_first_party`. A domain in the
    /// exceptions list always evaluates to [`CookieRule::Allow`].
    pub fn evaluate_cookie(&self, domain: &str, is_first_party: bool, now: SystemTime) -> CookieRule {
        if self.is_exempt(domain) {
            return CookieRule::Allow;
        }
        self.cookies.evaluate(domain, is_first_party, now)
    }

    /// The block page body a caller should substitute for a
    /// [`ScanOutcome::Blocked`] response.
    pub fn block_page_body(&self) -> &'static str {
        BLOCK_PAGE_BODY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie_policy::CookieRuleEntry;
    use aperture_http::KnownHeaderName;

    fn shield() -> SecurityShield {
        let trackers = TrackerFilter::new(&["*://*.doubleclick.net/*".to_string()], &[]);
        let mut cookies = CookiePolicy::new(CookieRule::AllowFirstParty, CookieRule::Block);
        cookies.set_exact_rule("shop.example.com", CookieRuleEntry::permanent(CookieRule::Allow));
        SecurityShield::new(trackers, cookies)
    }

    #[test]
    fn tracked_request_is_blocked() {
        let shield = shield();
        let mut headers = HeaderStore::new();
        let result = shield.prepare_request(
            "ad.doubleclick.net",
            "https://ad.doubleclick.net/pixel",
            None,
            RequestKind::Image,
            &mut headers,
        );
        assert!(matches!(result, Err(Error::Blocked(_))));
    }

    #[test]
    fn exception_bypasses_tracker_block() {
        let mut shield = shield();
        shield.add_policy_exception("ad.doubleclick.net");
        let mut headers = HeaderStore::new();
        let result = shield.prepare_request(
            "ad.doubleclick.net",
            "https://ad.doubleclick.net/pixel",
            None,
            RequestKind::Image,
            &mut headers,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn exception_bypasses_cookie_block() {
        let mut shield = shield();
        shield.add_policy_exception("tracker.example.com");
        assert_eq!(shield.evaluate_cookie("tracker.example.com", false, SystemTime::now()), CookieRule::Allow);
    }

    #[test]
    fn high_severity_body_is_blocked() {
        let shield = shield();
        let mut headers = HeaderStore::new();
        let body = "<script>eval(atob('ZG9jdW1lbnQ='))</script>";
        let (_, outcome) = shield.inspect_response("shop.example.com", None, &[], body, &mut headers).unwrap();
        assert_eq!(outcome, ScanOutcome::Blocked);
    }

    #[test]
    fn clean_response_injects_security_headers() {
        let shield = shield();
        let mut headers = HeaderStore::new();
        let (_, outcome) = shield
            .inspect_response("shop.example.com", None, &[], "<html></html>", &mut headers)
            .unwrap();
        assert_eq!(outcome, ScanOutcome::Passed);
        assert!(headers.has(&KnownHeaderName::ContentSecurityPolicy.into()));
    }

    #[test]
    fn custom_domain_policy_overrides_csp() {
        let mut shield = shield();
        shield.set_domain_policy("shop.example.com", DomainPolicy::custom("default-src 'self' cdn.example.com"));
        let mut headers = HeaderStore::new();
        shield.inspect_response("shop.example.com", None, &[], "<html></html>", &mut headers).unwrap();
        let value = headers.get(&KnownHeaderName::ContentSecurityPolicy.into()).unwrap();
        assert_eq!(value.as_str(), Some("default-src 'self' cdn.example.com"));
    }

    #[test]
    fn certificate_validation_rejects_expired_cert_before_header_injection() {
        let shield = shield();
        let mut headers = HeaderStore::new();
        let expired = CertInfo { key_bits: 4096, chain_depth: 1, is_self_signed: false, days_until_expiry: -1 };
        let result = shield.inspect_response("shop.example.com", Some(&expired), &[], "<html></html>", &mut headers);
        assert!(matches!(result, Err(Error::CertInvalid(_))));
    }
}
