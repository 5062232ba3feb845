//! Cookie policy evaluation (§4.8: "a priority-ordered rule match:
//! exact-domain rules first, then suffix-matched patterns, else default
//! first-party / third-party rule. Expired rules (per entry `expires_at`) are
//! ignored. Exceptions bypass all rules").

use std::collections::HashMap;
use std::time::SystemTime;

/// What a domain is permitted to do with cookies (§3 "Policy tables").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieRule {
    /// Cookies are set and sent normally.
    Allow,
    /// Cookies are only sent on first-party requests to this domain.
    AllowFirstParty,
    /// Cookies are kept for the current session only; cleared on restart.
    AllowSession,
    /// Cookies are stored, but keyed per top-level site (no cross-site
    /// tracking via a shared third-party jar).
    Partition,
    /// Cookies are neither set nor sent.
    Block,
}

/// A single policy table entry.
#[derive(Debug, Clone)]
pub struct CookieRuleEntry {
    rule: CookieRule,
    expires_at: Option<SystemTime>,
}

impl CookieRuleEntry {
    /// A rule that never expires.
    pub fn permanent(rule: CookieRule) -> Self {
        Self { rule, expires_at: None }
    }

    /// A rule that stops applying after `expires_at`.
    pub fn expiring(rule: CookieRule, expires_at: SystemTime) -> Self {
        Self { rule, expires_at: Some(expires_at) }
    }

    fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|t| now >= t)
    }
}

/// The cookie policy table for every known domain.
#[derive(Debug, Default)]
pub struct CookiePolicy {
    exact: HashMap<String, CookieRuleEntry>,
    /// Suffix patterns (e.g. `.example.com`) in the order they should be
    /// tried; first non-expired match wins.
    suffix: Vec<(String, CookieRuleEntry)>,
    default_first_party: CookieRule,
    default_third_party: CookieRule,
}

impl CookiePolicy {
    /// A policy table with the given defaults and no per-domain rules yet.
    pub fn new(default_first_party: CookieRule, default_third_party: CookieRule) -> Self {
        Self { exact: HashMap::new(), suffix: Vec::new(), default_first_party, default_third_party }
    }

    /// Register an exact-domain rule (matches only that domain, not its
    /// subdomains).
    pub fn set_exact_rule(&mut self, domain: impl Into<String>, entry: CookieRuleEntry) {
        self.exact.insert(domain.into(), entry);
    }

    /// Register a suffix pattern rule (e.g. `.example.com` matches
    /// `a.example.com` and `b.example.com`). Earlier-registered patterns are
    /// tried first.
    pub fn add_suffix_rule(&mut self, suffix: impl Into<String>, entry: CookieRuleEntry) {
        self.suffix.push((suffix.into(), entry));
    }

    /// Evaluate the rule that applies to `domain` for a request whose
    /// first/third-party status is `is_first_party`, at time `now`.
    pub fn evaluate(&self, domain: &str, is_first_party: bool, now: SystemTime) -> CookieRule {
        if let Some(entry) = self.exact.get(domain) {
            if !entry.is_expired(now) {
                return entry.rule;
            }
        }
        for (suffix, entry) in &self.suffix {
            if domain.ends_with(suffix.as_str()) && !entry.is_expired(now) {
                return entry.rule;
            }
        }
        if is_first_party {
            self.default_first_party
        } else {
            self.default_third_party
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn exact_rule_wins_over_suffix_rule() {
        let mut policy = CookiePolicy::new(CookieRule::Allow, CookieRule::Block);
        policy.add_suffix_rule(".example.com", CookieRuleEntry::permanent(CookieRule::Block));
        policy.set_exact_rule("shop.example.com", CookieRuleEntry::permanent(CookieRule::AllowFirstParty));

        assert_eq!(policy.evaluate("shop.example.com", true, SystemTime::now()), CookieRule::AllowFirstParty);
        assert_eq!(policy.evaluate("ads.example.com", false, SystemTime::now()), CookieRule::Block);
    }

    #[test]
    fn expired_rule_falls_through_to_the_default() {
        let mut policy = CookiePolicy::new(CookieRule::AllowFirstParty, CookieRule::Block);
        let past = SystemTime::now() - Duration::from_secs(3600);
        policy.set_exact_rule("temp.example.com", CookieRuleEntry::expiring(CookieRule::Allow, past));

        assert_eq!(policy.evaluate("temp.example.com", true, SystemTime::now()), CookieRule::AllowFirstParty);
    }

    #[test]
    fn unknown_domain_uses_first_or_third_party_default() {
        let policy = CookiePolicy::new(CookieRule::AllowFirstParty, CookieRule::Partition);
        assert_eq!(policy.evaluate("unknown.example.com", true, SystemTime::now()), CookieRule::AllowFirstParty);
        assert_eq!(policy.evaluate("unknown.example.com", false, SystemTime::now()), CookieRule::Partition);
    }
}
