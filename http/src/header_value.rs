use crate::Error;
use std::fmt::{self, Debug, Display, Formatter};

/// The right-hand side of a single `name: value` header pair.
///
/// Stored as bytes because header values are not guaranteed to be valid UTF-8 on the
/// wire (RFC 9110 only requires them to be `field-vchar` / obs-text); most real values
/// are ASCII and [`HeaderValue::as_str`] is the common path.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct HeaderValue(Vec<u8>);

impl HeaderValue {
    /// Build a header value, rejecting anything containing a bare CR, LF, or NUL —
    /// the characters that would allow header/request smuggling if passed through
    /// verbatim into a serialized message.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let bytes = bytes.into();
        if bytes.iter().any(|&b| b == b'\r' || b == b'\n' || b == 0) {
            return Err(Error::InvalidHeaderValue(String::from_utf8_lossy(&bytes).into_owned()));
        }
        Ok(Self(bytes))
    }

    /// This value as a `&str`, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    /// The raw bytes of this value.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&str> for HeaderValue {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        HeaderValue::new(s.as_bytes())
    }
}

impl TryFrom<String> for HeaderValue {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        HeaderValue::new(s.into_bytes())
    }
}

impl Debug for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&String::from_utf8_lossy(&self.0), f)
    }
}

impl Display for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&String::from_utf8_lossy(&self.0), f)
    }
}

impl AsRef<[u8]> for HeaderValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_embedded_crlf() {
        assert!(HeaderValue::new(&b"hello\r\nSet-Cookie: evil=1"[..]).is_err());
        assert!(HeaderValue::new(&b"plain"[..]).is_ok());
    }

    #[test]
    fn as_str_roundtrip() {
        let v = HeaderValue::new(&b"text/html"[..]).unwrap();
        assert_eq!(v.as_str(), Some("text/html"));
    }
}
