use thiserror::Error;

/// Parsing and validation errors produced by the method/status/version/header types in
/// this crate. Higher-level components (the cache, the transports, the security shield)
/// wrap this in their own error enums rather than re-exporting it directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// a method token contained non-printable ASCII or was empty
    #[error("invalid method {0:?}")]
    InvalidMethod(String),

    /// `Status::from_code` was given a number outside the registered 100-511 set
    #[error("unknown status code {0}")]
    UnknownStatusCode(u16),

    /// a version token did not match any supported HTTP version
    #[error("unrecognized version {0:?}")]
    InvalidVersion(String),

    /// a header name contained characters outside the HTTP token grammar
    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    /// a header value contained a bare CR or LF
    #[error("invalid header value for {0}")]
    InvalidHeaderValue(String),

    /// `content_length()` was asked to parse a Content-Length that was not a
    /// non-negative integer
    #[error("malformed content-length header: {0:?}")]
    MalformedContentLength(String),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
