//! `Cache-Control` directive parsing, ported from the teacher's
//! `caching-headers::cache_control` module: same directive set, same `FromStr`/
//! `Display` grammar, with the `trillium::Handler` conveniences dropped (this
//! crate never sits in a request-handling pipeline) in favor of the plain
//! accessor methods the freshness rules in §4.7.1 need.

use std::fmt::{self, Display, Write};
use std::str::FromStr;
use std::time::Duration;
use CacheControlDirective::*;

/// A single `Cache-Control` directive.
#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum CacheControlDirective {
    /// `immutable`
    Immutable,
    /// `max-age`
    MaxAge(Duration),
    /// `max-fresh` (request-side; unused on stored responses but parsed for completeness)
    MaxFresh(Duration),
    /// `max-stale`
    MaxStale(Option<Duration>),
    /// `must-revalidate`
    MustRevalidate,
    /// `no-cache`
    NoCache,
    /// `no-store`
    NoStore,
    /// `no-transform`
    NoTransform,
    /// `only-if-cached`
    OnlyIfCached,
    /// `private`
    Private,
    /// `proxy-revalidate`
    ProxyRevalidate,
    /// `public`
    Public,
    /// `s-maxage`
    SMaxage(Duration),
    /// `stale-if-error`
    StaleIfError(Duration),
    /// `stale-while-revalidate`
    StaleWhileRevalidate(Duration),
    /// Any unrecognized directive, preserved verbatim.
    UnknownDirective(String),
}

/// The parsed `Cache-Control` header: an ordered list of directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControlHeader(Vec<CacheControlDirective>);

impl<T> From<T> for CacheControlHeader
where
    T: IntoIterator<Item = CacheControlDirective>,
{
    fn from(directives: T) -> Self {
        directives.into_iter().collect()
    }
}

impl FromIterator<CacheControlDirective> for CacheControlHeader {
    fn from_iter<T: IntoIterator<Item = CacheControlDirective>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl CacheControlHeader {
    /// An empty directive set (as if the header were absent).
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    fn contains(&self, directive: &CacheControlDirective) -> bool {
        self.0.contains(directive)
    }

    /// `immutable`
    pub fn is_immutable(&self) -> bool {
        self.contains(&Immutable)
    }

    /// `max-age=N`
    pub fn max_age(&self) -> Option<Duration> {
        self.0.iter().find_map(|d| match d {
            MaxAge(d) => Some(*d),
            _ => None,
        })
    }

    /// `must-revalidate`
    pub fn must_revalidate(&self) -> bool {
        self.contains(&MustRevalidate)
    }

    /// `no-cache`
    pub fn is_no_cache(&self) -> bool {
        self.contains(&NoCache)
    }

    /// `no-store`
    pub fn is_no_store(&self) -> bool {
        self.contains(&NoStore)
    }

    /// `private`
    pub fn is_private(&self) -> bool {
        self.contains(&Private)
    }

    /// `stale-while-revalidate=N`
    pub fn stale_while_revalidate(&self) -> Option<Duration> {
        self.0.iter().find_map(|d| match d {
            StaleWhileRevalidate(d) => Some(*d),
            _ => None,
        })
    }
}

impl Display for CacheControlHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for directive in &self.0 {
            if first {
                first = false;
            } else {
                f.write_char(',')?;
            }
            match directive {
                Immutable => write!(f, "immutable"),
                MaxAge(d) => write!(f, "max-age={}", d.as_secs()),
                MaxFresh(d) => write!(f, "max-fresh={}", d.as_secs()),
                MaxStale(Some(d)) => write!(f, "max-stale={}", d.as_secs()),
                MaxStale(None) => write!(f, "max-stale"),
                MustRevalidate => write!(f, "must-revalidate"),
                NoCache => write!(f, "no-cache"),
                NoStore => write!(f, "no-store"),
                NoTransform => write!(f, "no-transform"),
                OnlyIfCached => write!(f, "only-if-cached"),
                Private => write!(f, "private"),
                ProxyRevalidate => write!(f, "proxy-revalidate"),
                Public => write!(f, "public"),
                SMaxage(d) => write!(f, "s-maxage={}", d.as_secs()),
                StaleIfError(d) => write!(f, "stale-if-error={}", d.as_secs()),
                StaleWhileRevalidate(d) => write!(f, "stale-while-revalidate={}", d.as_secs()),
                UnknownDirective(directive) => write!(f, "{directive}"),
            }?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheControlParseError;
impl std::error::Error for CacheControlParseError {}
impl Display for CacheControlParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cache control parse error")
    }
}

impl FromStr for CacheControlHeader {
    type Err = CacheControlParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::empty());
        }
        s.to_ascii_lowercase()
            .split(',')
            .map(|d| d.trim().to_string())
            .map(|directive| match directive.as_str() {
                "immutable" => Ok(Immutable),
                "must-revalidate" => Ok(MustRevalidate),
                "no-cache" => Ok(NoCache),
                "no-store" => Ok(NoStore),
                "no-transform" => Ok(NoTransform),
                "only-if-cached" => Ok(OnlyIfCached),
                "private" => Ok(Private),
                "proxy-revalidate" => Ok(ProxyRevalidate),
                "public" => Ok(Public),
                "max-stale" => Ok(MaxStale(None)),
                other => match other.split_once('=') {
                    Some((directive, number)) => {
                        let seconds = number.parse().map_err(|_| CacheControlParseError)?;
                        let seconds = Duration::from_secs(seconds);
                        match directive {
                            "max-age" => Ok(MaxAge(seconds)),
                            "max-fresh" => Ok(MaxFresh(seconds)),
                            "max-stale" => Ok(MaxStale(Some(seconds))),
                            "s-maxage" => Ok(SMaxage(seconds)),
                            "stale-if-error" => Ok(StaleIfError(seconds)),
                            "stale-while-revalidate" => Ok(StaleWhileRevalidate(seconds)),
                            _ => Ok(UnknownDirective(other.to_string())),
                        }
                    }
                    None => Ok(UnknownDirective(other.to_string())),
                },
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_no_store() {
        assert_eq!(CacheControlHeader(vec![NoStore]), "no-store".parse().unwrap());
    }

    #[test]
    fn parses_mixed_list_and_round_trips() {
        let long: CacheControlHeader =
            "private,no-cache,no-store,max-age=0,must-revalidate,pre-check=0,post-check=0".parse().unwrap();
        assert_eq!(
            CacheControlHeader::from([
                Private,
                NoCache,
                NoStore,
                MaxAge(Duration::ZERO),
                MustRevalidate,
                UnknownDirective("pre-check=0".to_string()),
                UnknownDirective("post-check=0".to_string()),
            ]),
            long
        );
        assert_eq!(
            long.to_string(),
            "private,no-cache,no-store,max-age=0,must-revalidate,pre-check=0,post-check=0"
        );
    }

    #[test]
    fn immutable_and_max_age_accessors() {
        let h: CacheControlHeader = "public, max-age=604800, immutable".parse().unwrap();
        assert!(h.is_immutable());
        assert_eq!(h.max_age(), Some(Duration::from_secs(604800)));
    }

    #[test]
    fn stale_while_revalidate_accessor() {
        let h: CacheControlHeader = "max-age=60, stale-while-revalidate=30".parse().unwrap();
        assert_eq!(h.stale_while_revalidate(), Some(Duration::from_secs(30)));
    }
}
