use aperture_http::Version;
use std::fmt;

/// Transport-layer scheme, independent of the request's own `Scheme` type elsewhere
/// in the engine — this only distinguishes whether TLS is in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportScheme {
    /// Plaintext TCP.
    Http,
    /// TLS over TCP (H1.1/H2) or QUIC (H3).
    Https,
}

impl fmt::Display for TransportScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportScheme::Http => "http",
            TransportScheme::Https => "https",
        })
    }
}

/// Pool key: `(scheme, authority, alpn_version)` per §4.5 — a distinct pool per
/// negotiated protocol so an H2 connection is never handed out for an H1.1 request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    /// `http` or `https`.
    pub scheme: TransportScheme,
    /// `host:port`, already resolved to a canonical form by the caller.
    pub authority: String,
    /// The HTTP version this pool slot was negotiated for.
    pub version: Version,
}

impl ConnectionKey {
    /// A new pool key.
    pub fn new(scheme: TransportScheme, authority: impl Into<String>, version: Version) -> Self {
        Self { scheme, authority: authority.into(), version }
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{} [{}]", self.scheme, self.authority, self.version)
    }
}
