/// Errors produced by the security shield (§4.8).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The request was dropped by the tracker filter, a cookie rule, or CSP.
    #[error("blocked: {0}")]
    Blocked(String),

    /// A response's certificate failed validation at the domain's security level.
    #[error("certificate invalid: {0}")]
    CertInvalid(String),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;
