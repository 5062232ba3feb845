//! Certificate validation (§4.8: "if HTTPS, validate certificate (level ∈
//! {Standard, Strict, Extreme})").
//!
//! The TLS handshake itself (chain-of-trust verification against the root
//! store) happens inside `aperture-client`'s transport layer, which already
//! depends on `rustls`/`webpki-roots`/`rustls-native-certs` for that. This
//! module is the shield's *policy* layer on top: given the already-validated
//! leaf certificate's metadata, decide whether this domain's security level
//! additionally requires rejecting it (e.g. a weak key, or a chain deeper
//! than the level tolerates).

use crate::error::{Error, Result};
use crate::level::SecurityLevel;

/// The subset of a leaf certificate's metadata the policy layer needs.
/// Populated by the caller from whatever the TLS library's `ServerCertVerifier`
/// already parsed during the handshake.
#[derive(Debug, Clone)]
pub struct CertInfo {
    /// RSA/EC key size in bits.
    pub key_bits: u32,
    /// Number of certificates between the leaf and the trust anchor,
    /// inclusive of the leaf.
    pub chain_depth: u32,
    /// Whether the leaf certificate is self-signed (no chain to a public CA).
    pub is_self_signed: bool,
    /// Days remaining until expiry; negative if already expired.
    pub days_until_expiry: i64,
}

/// Validate `cert` against the strictness `level` implies (§4.8's `{Standard,
/// Strict, Extreme}` tiers, mapped from [`SecurityLevel`] per
/// `level.rs`'s doc comment). `Standard` only rejects an already-expired
/// certificate; `High` additionally floors key strength and chain depth;
/// `Maximum` additionally refuses self-signed certificates outright.
pub fn validate(cert: &CertInfo, level: SecurityLevel) -> Result<()> {
    if cert.days_until_expiry < 0 {
        return Err(Error::CertInvalid("certificate has expired".to_string()));
    }

    match level {
        SecurityLevel::Standard => Ok(()),
        SecurityLevel::High | SecurityLevel::Custom => {
            if cert.key_bits < 2048 {
                return Err(Error::CertInvalid(format!("key too weak: {} bits", cert.key_bits)));
            }
            if cert.chain_depth > 5 {
                return Err(Error::CertInvalid(format!("chain too deep: {} certificates", cert.chain_depth)));
            }
            Ok(())
        }
        SecurityLevel::Maximum => {
            if cert.is_self_signed {
                return Err(Error::CertInvalid("self-signed certificates are rejected at this level".to_string()));
            }
            if cert.key_bits < 3072 {
                return Err(Error::CertInvalid(format!("key too weak: {} bits", cert.key_bits)));
            }
            if cert.chain_depth > 3 {
                return Err(Error::CertInvalid(format!("chain too deep: {} certificates", cert.chain_depth)));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert(key_bits: u32, chain_depth: u32, is_self_signed: bool, days_until_expiry: i64) -> CertInfo {
        CertInfo { key_bits, chain_depth, is_self_signed, days_until_expiry }
    }

    #[test]
    fn expired_certificate_is_always_rejected() {
        let c = cert(4096, 2, false, -1);
        assert!(validate(&c, SecurityLevel::Standard).is_err());
    }

    #[test]
    fn standard_accepts_a_weak_but_unexpired_key() {
        let c = cert(1024, 2, false, 30);
        assert!(validate(&c, SecurityLevel::Standard).is_ok());
    }

    #[test]
    fn high_rejects_a_weak_key_standard_would_accept() {
        let c = cert(1024, 2, false, 30);
        assert!(validate(&c, SecurityLevel::High).is_err());
    }

    #[test]
    fn maximum_rejects_self_signed_even_with_a_strong_key() {
        let c = cert(4096, 1, true, 30);
        assert!(validate(&c, SecurityLevel::Maximum).is_err());
    }

    #[test]
    fn maximum_accepts_a_short_strong_chain() {
        let c = cert(4096, 1, false, 30);
        assert!(validate(&c, SecurityLevel::Maximum).is_ok());
    }
}
