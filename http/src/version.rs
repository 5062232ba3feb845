use crate::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The HTTP version negotiated for a connection.
///
/// Legacy HTTP/0.9 and SSLv3-only origins are not representable here; per the engine's
/// non-goals they are treated as connection failures rather than a supported version.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Version {
    /// HTTP/1.0, RFC 1945. Accepted on the wire for interop with legacy origins;
    /// the client never offers it.
    Http10,
    /// HTTP/1.1, RFC 7230-7235
    Http11,
    /// HTTP/2, RFC 9113
    Http2,
    /// HTTP/3 over QUIC, RFC 9114
    Http3,
}

impl Version {
    /// Does this version keep a single transport connection open across requests?
    pub const fn supports_persistent_connections(self) -> bool {
        matches!(self, Version::Http11 | Version::Http2 | Version::Http3)
    }

    /// Can more than one request be in flight on a single connection at once?
    pub const fn supports_multiplexing(self) -> bool {
        matches!(self, Version::Http2 | Version::Http3)
    }

    /// Can the server push unsolicited responses ahead of a request for them?
    pub const fn supports_server_push(self) -> bool {
        matches!(self, Version::Http2 | Version::Http3)
    }

    /// Can a response body be read incrementally as it arrives?
    pub const fn supports_streaming(self) -> bool {
        true
    }

    /// The ALPN protocol ID a TLS ClientHello would advertise for this version, if any.
    pub const fn alpn_id(self) -> Option<&'static [u8]> {
        match self {
            Version::Http10 | Version::Http11 => Some(b"http/1.1"),
            Version::Http2 => Some(b"h2"),
            // H3 is negotiated via Alt-Svc / a separate QUIC handshake, not TLS-over-TCP ALPN
            Version::Http3 => None,
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
            Version::Http2 => "HTTP/2",
            Version::Http3 => "HTTP/3",
        })
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP/1.0" => Ok(Version::Http10),
            "HTTP/1.1" => Ok(Version::Http11),
            "HTTP/2" | "HTTP/2.0" | "h2" => Ok(Version::Http2),
            "HTTP/3" | "HTTP/3.0" | "h3" => Ok(Version::Http3),
            other => Err(Error::InvalidVersion(other.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn to_string() {
        assert_eq!(Version::Http10.to_string(), "HTTP/1.0");
        assert_eq!(Version::Http11.to_string(), "HTTP/1.1");
        assert_eq!(Version::Http2.to_string(), "HTTP/2");
        assert_eq!(Version::Http3.to_string(), "HTTP/3");
    }

    #[test]
    fn ord() {
        assert!(Version::Http3 > Version::Http2);
        assert!(Version::Http2 > Version::Http11);
        assert!(Version::Http11 > Version::Http10);
    }

    #[test]
    fn capabilities() {
        assert!(!Version::Http10.supports_persistent_connections());
        assert!(!Version::Http11.supports_multiplexing());
        assert!(Version::Http2.supports_multiplexing());
        assert!(Version::Http3.supports_server_push());
    }

    #[test]
    fn parse_roundtrip() {
        for v in [Version::Http10, Version::Http11, Version::Http2, Version::Http3] {
            assert_eq!(v.to_string().parse::<Version>(), Ok(v));
        }
    }
}
