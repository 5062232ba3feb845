use crate::Error;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

macro_rules! known_headers {
    ($(($capitalized:literal, $variant:ident)),+ $(,)?) => {
        /// Headers the engine frequently matches on, interned as a `u8` discriminant so
        /// lookups and the cache's Vary handling avoid string comparison on the hot path.
        /// Anything else is represented as [`HeaderName::Other`].
        #[non_exhaustive]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum KnownHeaderName {
            $(
                #[doc = concat!("The `", $capitalized, "` header.")]
                $variant,
            )+
        }

        impl KnownHeaderName {
            const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $capitalized,)+
                }
            }

            fn parse(s: &str) -> Option<Self> {
                $(if s.eq_ignore_ascii_case($capitalized) { return Some(Self::$variant); })+
                None
            }
        }
    };
}

known_headers! {
    ("Host", Host),
    ("User-Agent", UserAgent),
    ("Accept", Accept),
    ("Accept-Encoding", AcceptEncoding),
    ("Accept-Language", AcceptLanguage),
    ("Content-Type", ContentType),
    ("Content-Length", ContentLength),
    ("Content-Encoding", ContentEncoding),
    ("Content-Disposition", ContentDisposition),
    ("Transfer-Encoding", TransferEncoding),
    ("Connection", Connection),
    ("Keep-Alive", KeepAlive),
    ("Upgrade", Upgrade),
    ("Date", Date),
    ("Server", Server),
    ("Location", Location),
    ("Referer", Referer),
    ("Origin", Origin),
    ("Cookie", Cookie),
    ("Set-Cookie", SetCookie),
    ("Authorization", Authorization),
    ("WWW-Authenticate", WwwAuthenticate),
    ("Cache-Control", CacheControl),
    ("Pragma", Pragma),
    ("Expires", Expires),
    ("Last-Modified", LastModified),
    ("Etag", Etag),
    ("If-Modified-Since", IfModifiedSince),
    ("If-None-Match", IfNoneMatch),
    ("If-Match", IfMatch),
    ("If-Unmodified-Since", IfUnmodifiedSince),
    ("If-Range", IfRange),
    ("Range", Range),
    ("Accept-Ranges", AcceptRanges),
    ("Vary", Vary),
    ("Age", Age),
    ("Expect", Expect),
    ("Alt-Svc", AltSvc),
    ("Content-Security-Policy", ContentSecurityPolicy),
    ("Strict-Transport-Security", StrictTransportSecurity),
    ("X-Content-Type-Options", XContentTypeOptions),
    ("X-Frame-Options", XFrameOptions),
    ("Referrer-Policy", ReferrerPolicy),
    ("Permissions-Policy", PermissionsPolicy),
    ("Sec-Fetch-Site", SecFetchSite),
    ("Sec-Fetch-Mode", SecFetchMode),
    ("Sec-Fetch-Dest", SecFetchDest),
    ("Link", Link),
    ("Trailer", Trailer),
    ("Te", Te),
}

impl Display for KnownHeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name of an HTTP header: either a case-insensitively interned [`KnownHeaderName`]
/// or an arbitrary token for anything the engine doesn't special-case.
#[derive(Debug, Clone, Eq)]
pub enum HeaderName<'a> {
    /// An interned, frequently used header name.
    Known(KnownHeaderName),
    /// Any other header token, compared and hashed case-insensitively.
    Other(Cow<'a, str>),
}

impl<'a> HeaderName<'a> {
    /// Parse a header name, validating it against the HTTP token grammar
    /// ([rfc9110§5.6.2](https://www.rfc-editor.org/rfc/rfc9110#section-5.6.2)).
    pub fn parse(s: &'a str) -> Result<Self, Error> {
        if let Some(known) = KnownHeaderName::parse(s) {
            return Ok(HeaderName::Known(known));
        }
        if s.is_empty() || !s.chars().all(is_tchar) {
            return Err(Error::InvalidHeaderName(s.to_string()));
        }
        Ok(HeaderName::Other(Cow::Borrowed(s)))
    }

    /// Convert to a `'static` owned header name.
    #[must_use]
    pub fn into_owned(self) -> HeaderName<'static> {
        match self {
            HeaderName::Known(k) => HeaderName::Known(k),
            HeaderName::Other(s) => HeaderName::Other(Cow::Owned(s.into_owned())),
        }
    }

    /// The wire representation of this header name.
    pub fn as_str(&self) -> &str {
        match self {
            HeaderName::Known(k) => k.as_str(),
            HeaderName::Other(s) => s,
        }
    }
}

fn is_tchar(c: char) -> bool {
    matches!(
        c,
        'a'..='z'
            | 'A'..='Z'
            | '0'..='9'
            | '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
    )
}

impl From<KnownHeaderName> for HeaderName<'static> {
    fn from(known: KnownHeaderName) -> Self {
        HeaderName::Known(known)
    }
}

impl<'a> From<&'a str> for HeaderName<'a> {
    /// Infallible conversion for call sites that already know the string is a valid
    /// token (e.g. compile-time string literals); prefer [`HeaderName::parse`] for
    /// wire input.
    fn from(s: &'a str) -> Self {
        KnownHeaderName::parse(s).map_or_else(|| HeaderName::Other(Cow::Borrowed(s)), HeaderName::Known)
    }
}

impl FromStr for HeaderName<'static> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(HeaderName::parse(s)?.into_owned())
    }
}

impl PartialEq for HeaderName<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HeaderName::Known(a), HeaderName::Known(b)) => a == b,
            _ => self.as_str().eq_ignore_ascii_case(other.as_str()),
        }
    }
}

impl PartialEq<KnownHeaderName> for HeaderName<'_> {
    fn eq(&self, other: &KnownHeaderName) -> bool {
        matches!(self, HeaderName::Known(k) if k == other)
    }
}

impl Hash for HeaderName<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.as_str().as_bytes() {
            b.to_ascii_lowercase().hash(state);
        }
    }
}

impl Display for HeaderName<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_header_case_insensitive() {
        assert_eq!(HeaderName::parse("content-type").unwrap(), KnownHeaderName::ContentType);
        assert_eq!(HeaderName::parse("CONTENT-TYPE").unwrap(), KnownHeaderName::ContentType);
    }

    #[test]
    fn unknown_header_case_insensitive_eq() {
        let a = HeaderName::parse("X-Request-Id").unwrap();
        let b = HeaderName::parse("x-request-id").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_token() {
        assert!(HeaderName::parse("bad header").is_err());
        assert!(HeaderName::parse("").is_err());
    }
}
