use crate::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Per-method property flags, consulted by the predicate methods on [`Method`].
///
/// See [rfc7231§4.2](https://tools.ietf.org/html/rfc7231#section-4.2) for Safe/Idempotent/
/// Cacheable, and [rfc7231§4.3](https://tools.ietf.org/html/rfc7231#section-4.3) for
/// AllowsBody/RequiresResponseBody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flags {
    safe: bool,
    idempotent: bool,
    cacheable: bool,
    allows_body: bool,
    requires_response_body: bool,
    standard: bool,
    webdav: bool,
}

macro_rules! methods {
    ($(($variant:ident, $name:literal, $flags:expr)),+ $(,)?) => {
        /// An HTTP request method.
        ///
        /// Covers the core RFC 7231 verbs plus the WebDAV extensions (RFC 2518, 3253,
        /// 4918, 5842). `parse` rejects anything containing non-printable ASCII; an
        /// unrecognized but well-formed token is not representable here and is surfaced
        /// as [`Error::InvalidMethod`] rather than silently accepted, since the engine
        /// never needs to round-trip arbitrary extension methods.
        #[non_exhaustive]
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Method {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl Method {
            /// The uppercase wire representation of this method.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }

            const fn flags(self) -> Flags {
                match self {
                    $(Self::$variant => $flags,)+
                }
            }
        }

        fn from_token(s: &str) -> Option<Method> {
            match s {
                $($name => Some(Method::$variant),)+
                _ => None,
            }
        }
    };
}

const SAFE_IDEMPOTENT: Flags = Flags {
    safe: true,
    idempotent: true,
    cacheable: false,
    allows_body: false,
    requires_response_body: true,
    standard: true,
    webdav: false,
};

const NOT_SAFE_NOT_IDEMPOTENT: Flags = Flags {
    safe: false,
    idempotent: false,
    cacheable: false,
    allows_body: true,
    requires_response_body: true,
    standard: true,
    webdav: false,
};

methods! {
    (Get, "GET", Flags { cacheable: true, ..SAFE_IDEMPOTENT }),
    (Head, "HEAD", Flags { cacheable: true, requires_response_body: false, ..SAFE_IDEMPOTENT }),
    (Post, "POST", Flags { cacheable: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (Put, "PUT", Flags { idempotent: true, allows_body: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (Delete, "DELETE", Flags { idempotent: true, allows_body: false, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (Connect, "CONNECT", Flags { allows_body: false, requires_response_body: false, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (Options, "OPTIONS", Flags { safe: true, idempotent: true, allows_body: false, ..SAFE_IDEMPOTENT }),
    (Trace, "TRACE", Flags { safe: true, idempotent: true, allows_body: false, ..SAFE_IDEMPOTENT }),
    (Patch, "PATCH", Flags { allows_body: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (PropFind, "PROPFIND", Flags { safe: true, idempotent: true, allows_body: true, webdav: true, ..SAFE_IDEMPOTENT }),
    (PropPatch, "PROPPATCH", Flags { allows_body: true, webdav: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (MkCol, "MKCOL", Flags { idempotent: true, allows_body: true, webdav: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (Copy, "COPY", Flags { webdav: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (Move, "MOVE", Flags { webdav: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (Lock, "LOCK", Flags { allows_body: true, webdav: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
    (Unlock, "UNLOCK", Flags { idempotent: true, webdav: true, ..NOT_SAFE_NOT_IDEMPOTENT }),
}

impl Method {
    /// Request methods are considered "safe" if their defined semantics are
    /// essentially read-only.
    pub const fn is_safe(self) -> bool {
        self.flags().safe
    }

    /// A method is "idempotent" if the intended effect of N identical requests
    /// equals the effect of one.
    pub const fn is_idempotent(self) -> bool {
        self.flags().idempotent
    }

    /// Whether a response to this method may be stored by the cache at all
    /// (subject to the usual Cache-Control / Vary rules).
    pub const fn is_cacheable(self) -> bool {
        self.flags().cacheable
    }

    /// Whether a request with this method is permitted to carry a body.
    pub const fn allows_body(self) -> bool {
        self.flags().allows_body
    }

    /// Whether a conforming response to this method must carry a body
    /// (false for HEAD and CONNECT).
    pub const fn requires_response_body(self) -> bool {
        self.flags().requires_response_body
    }

    /// True for the RFC 7231 core verbs; false for WebDAV extensions.
    pub const fn is_standard(self) -> bool {
        self.flags().standard
    }

    /// True for WebDAV extension methods (RFC 4918 and friends).
    pub const fn is_webdav(self) -> bool {
        self.flags().webdav
    }

    /// Parse a method token. Fails on empty input or any non-printable ASCII byte,
    /// per the engine's requirement that a malformed method never silently becomes
    /// some other method.
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::InvalidMethod(s.to_string()));
        }
        from_token(s).ok_or_else(|| Error::InvalidMethod(s.to_string()))
    }

    /// Whether a server handler registered for `self` may serve a request that
    /// actually arrived with method `requested`. Only HEAD<->GET is pre-declared
    /// compatible; everything else requires an exact match.
    pub fn compatible_with(self, requested: Method) -> bool {
        self == requested || matches!((self, requested), (Method::Get, Method::Head) | (Method::Head, Method::Get))
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_methods() {
        assert_eq!(Method::parse("GET").unwrap(), Method::Get);
        assert_eq!(Method::parse("PROPFIND").unwrap(), Method::PropFind);
    }

    #[test]
    fn rejects_non_printable_ascii() {
        assert!(Method::parse("GE\u{0}T").is_err());
        assert!(Method::parse("").is_err());
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(Method::parse("FROBNICATE").is_err());
    }

    #[test]
    fn get_is_safe_idempotent_cacheable() {
        assert!(Method::Get.is_safe());
        assert!(Method::Get.is_idempotent());
        assert!(Method::Get.is_cacheable());
    }

    #[test]
    fn post_is_not_safe_or_idempotent() {
        assert!(!Method::Post.is_safe());
        assert!(!Method::Post.is_idempotent());
    }

    #[test]
    fn put_and_delete_are_idempotent_not_safe() {
        assert!(Method::Put.is_idempotent());
        assert!(!Method::Put.is_safe());
        assert!(Method::Delete.is_idempotent());
    }

    #[test]
    fn head_compatible_with_get_only() {
        assert!(Method::Head.compatible_with(Method::Get));
        assert!(Method::Get.compatible_with(Method::Head));
        assert!(!Method::Post.compatible_with(Method::Get));
        assert!(Method::Get.compatible_with(Method::Get));
    }

    #[test]
    fn webdav_flag() {
        assert!(Method::PropFind.is_webdav());
        assert!(!Method::Get.is_webdav());
    }
}
