/// Per-domain security strictness (§3 "Policy tables": "Security shield:
/// per-domain level ∈ {Standard, High, Maximum, Custom}").
///
/// §4.8's certificate-validation prose separately names the tiers `{Standard,
/// Strict, Extreme}`; this crate treats that as the same three-tier ramp
/// named slightly differently in a different paragraph of the same spec,
/// rather than a fourth level set, and maps `High → Strict`, `Maximum →
/// Extreme` throughout (an Open Question resolution recorded in
/// `DESIGN.md`). `Custom` carries no associated strictness of its own; it
/// means "use this domain's explicit [`crate::policy::DomainPolicy`]
/// overrides instead of a named tier's defaults".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecurityLevel {
    /// Baseline protections: the four always-on headers, default CSP,
    /// ordinary certificate validation.
    #[default]
    Standard,
    /// Stricter CSP, a normalized (less unique) request fingerprint,
    /// certificate chain depth and key-strength floors enforced.
    High,
    /// Maximum privacy/security: strictest CSP, maximally generic
    /// fingerprint, strict certificate checks, WebRTC disabled entirely.
    Maximum,
    /// This domain's `DomainPolicy` overrides apply verbatim instead of a
    /// named tier.
    Custom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_standard() {
        assert_eq!(SecurityLevel::default(), SecurityLevel::Standard);
    }
}
