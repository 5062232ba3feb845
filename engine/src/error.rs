//! The engine's unifying error type (§7): every subsystem's own error enum
//! folds into one of these ten kinds at the engine boundary, so collaborators
//! (JS runtime, layout, UI shell) only ever need to match one error type.

/// The phase a request was in when it timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    /// DNS resolution.
    Resolve,
    /// TCP/QUIC connect.
    Connect,
    /// TLS handshake.
    Tls,
    /// Waiting on response headers.
    Headers,
    /// Waiting on response body bytes.
    Body,
    /// Idle time between body bytes.
    Idle,
    /// The request's total budget, regardless of phase.
    Total,
}

/// Which cache failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheErrorKind {
    /// No usable entry.
    Miss,
    /// The cache's internal lock was poisoned by a prior panic.
    Poisoned,
    /// A stored entry's integrity digest didn't match its bytes.
    IntegrityMismatch,
    /// The cache refused to admit an entry over `max_entry_size` or
    /// `max_cache_size`.
    Full,
}

/// Which codec failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// The compressed stream's container format was malformed.
    BadFormat,
    /// The compressed stream ended before a complete frame was read.
    Truncated,
    /// Decompression would have exceeded the caller's output cap.
    BombLimit,
}

/// Which parse failure occurred. Per §7, these are usually recovered; they
/// only surface as an `Err` with the `strict-mode` flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A tokenizer- or tree-constructor-level parse error was recorded.
    SyntaxError,
    /// The input's encoding could not be determined or decoded.
    EncodingError,
    /// Parsing fell back to quirks mode.
    QuirksTriggered,
}

/// The engine's top-level error type (§7).
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed URL, method, header name, or DOCTYPE.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// DNS failure, TCP/QUIC connect refused, TLS handshake failed, or an
    /// abrupt close mid-response.
    #[error("network error: {0}")]
    Network(String),
    /// H1 line too long, H2/H3 frame error, HPACK/QPACK decoding failure, or
    /// a stream reset.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// A request exceeded its total or per-phase time budget.
    #[error("timed out during {0:?}")]
    Timeout(TimeoutPhase),
    /// The request's cancellation token was triggered.
    #[error("request cancelled")]
    Cancelled,
    /// The tracker filter, a policy rule, or CSP blocked the request.
    #[error("blocked: {0}")]
    Blocked(String),
    /// A cache operation failed.
    #[error("cache error: {0:?}")]
    Cache(CacheErrorKind),
    /// A (de)compression operation failed.
    #[error("codec error: {0:?}")]
    Codec(CodecErrorKind),
    /// An HTML/cache-control parse operation failed under strict mode.
    #[error("parse error: {0:?}")]
    Parse(ParseErrorKind),
    /// An invariant was violated. Always surfaces and always logged.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;

impl From<aperture_http::Error> for Error {
    fn from(e: aperture_http::Error) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

impl From<aperture_client::Error> for Error {
    fn from(e: aperture_client::Error) -> Self {
        match e {
            aperture_client::Error::ConnectTimeout(_) => Error::Timeout(TimeoutPhase::Connect),
            aperture_client::Error::StreamReset(_) | aperture_client::Error::Protocol(_) => {
                Error::Protocol(e.to_string())
            }
            other => Error::Network(other.to_string()),
        }
    }
}

impl From<aperture_codec::Error> for Error {
    fn from(e: aperture_codec::Error) -> Self {
        match e {
            aperture_codec::Error::BadFormat(_) => Error::Codec(CodecErrorKind::BadFormat),
            aperture_codec::Error::Truncated(_) => Error::Codec(CodecErrorKind::Truncated),
            aperture_codec::Error::BombLimit(_) => Error::Codec(CodecErrorKind::BombLimit),
            other => Error::Internal(other.to_string()),
        }
    }
}

impl From<aperture_cache::Error> for Error {
    fn from(e: aperture_cache::Error) -> Self {
        Error::Cache(CacheErrorKind::Full).with_context(e.to_string())
    }
}

impl From<aperture_dns::Error> for Error {
    fn from(e: aperture_dns::Error) -> Self {
        Error::Network(e.to_string())
    }
}

impl From<aperture_shield::Error> for Error {
    fn from(e: aperture_shield::Error) -> Self {
        match e {
            aperture_shield::Error::Blocked(reason) => Error::Blocked(reason),
            aperture_shield::Error::CertInvalid(detail) => Error::Network(format!("bad certificate: {detail}")),
        }
    }
}

impl From<aperture_planner::Error> for Error {
    fn from(e: aperture_planner::Error) -> Self {
        Error::InvalidInput(e.to_string())
    }
}

impl Error {
    /// Attach extra human-readable context without changing the error's
    /// kind, logging it at `error!` per §7's "Internal ... always surfaces
    /// and logs" but applied uniformly here since every variant in this enum
    /// is meant to carry full context to the caller.
    fn with_context(self, context: String) -> Self {
        log::debug!("{self}: {context}");
        self
    }
}
