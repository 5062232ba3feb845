//! Per-domain policy table entries (§3 "Policy tables").

use crate::level::SecurityLevel;

/// The policy that governs one domain: its security level, plus the overrides
/// a [`SecurityLevel::Custom`] domain supplies instead of a named tier's
/// defaults.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    level: SecurityLevel,
    csp_override: Option<String>,
}

impl DomainPolicy {
    /// A domain governed by one of the named tiers, with no CSP override.
    pub fn tiered(level: SecurityLevel) -> Self {
        Self { level, csp_override: None }
    }

    /// A domain at [`SecurityLevel::Custom`] with an explicit CSP document.
    pub fn custom(csp: impl Into<String>) -> Self {
        Self { level: SecurityLevel::Custom, csp_override: Some(csp.into()) }
    }

    /// This domain's security level.
    pub fn level(&self) -> SecurityLevel {
        self.level
    }

    /// This domain's CSP override, if any (only meaningful at
    /// [`SecurityLevel::Custom`]; `headers::inject` falls back to the level's
    /// default CSP when `None`).
    pub fn csp_override(&self) -> Option<&str> {
        self.csp_override.as_deref()
    }
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::tiered(SecurityLevel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_standard_with_no_override() {
        let policy = DomainPolicy::default();
        assert_eq!(policy.level(), SecurityLevel::Standard);
        assert_eq!(policy.csp_override(), None);
    }

    #[test]
    fn custom_policy_carries_its_csp() {
        let policy = DomainPolicy::custom("default-src 'self'");
        assert_eq!(policy.level(), SecurityLevel::Custom);
        assert_eq!(policy.csp_override(), Some("default-src 'self'"));
    }
}
