//! RFC 7234 freshness subset (§4.7.1).

use crate::entry::CacheEntry;
use std::time::{Duration, SystemTime};

/// No explicit freshness signal (`max-age`, `Expires`, `immutable`) was present.
/// The spec requires "the default TTL applies" without naming a number; five
/// minutes matches the conservative default most HTTP caches in the corpus fall
/// back to when an origin sends no caching directives at all (see `DESIGN.md`).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// The outcome of classifying an entry's age against its freshness lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// May be returned directly.
    Fresh,
    /// Past its freshness lifetime but within the `stale-while-revalidate`
    /// budget (or `Cache-Control: no-cache` forces revalidation on every use).
    Stale,
    /// Past both the freshness lifetime and any stale budget; must not be
    /// served without a full revalidation.
    Expired,
}

/// Classify `entry`'s freshness as of `now`.
pub fn classify(entry: &CacheEntry, now: SystemTime) -> Freshness {
    if entry.cache_control.is_no_cache() {
        return within_stale_budget(entry, now, Duration::ZERO);
    }

    if entry.cache_control.is_immutable() {
        return Freshness::Fresh;
    }

    let age = now.duration_since(entry.response_time).unwrap_or(Duration::ZERO);

    if let Some(max_age) = entry.cache_control.max_age() {
        if age <= max_age {
            return Freshness::Fresh;
        }
        return within_stale_budget(entry, now, max_age);
    }

    if let Some(expires) = entry.expires {
        if now <= expires {
            return Freshness::Fresh;
        }
        let max_age = expires.duration_since(entry.response_time).unwrap_or(Duration::ZERO);
        return within_stale_budget(entry, now, max_age);
    }

    if age <= DEFAULT_TTL {
        Freshness::Fresh
    } else {
        within_stale_budget(entry, now, DEFAULT_TTL)
    }
}

/// Whether `now` still falls within the `stale-while-revalidate` window that
/// begins `max_age` after `response_time`.
fn within_stale_budget(entry: &CacheEntry, now: SystemTime, max_age: Duration) -> Freshness {
    let Some(swr) = entry.cache_control.stale_while_revalidate() else {
        return Freshness::Expired;
    };
    let stale_deadline = entry.response_time + max_age + swr;
    if now <= stale_deadline {
        Freshness::Stale
    } else {
        Freshness::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_control::CacheControlHeader;
    use aperture_http::{HeaderStore, Method, Status};

    fn base_entry(cache_control: &str, response_time: SystemTime) -> CacheEntry {
        CacheEntry {
            status: Status::Ok,
            headers: HeaderStore::new(),
            body: Vec::new(),
            encoding: crate::entry::BodyEncoding::Identity,
            original_size: 0,
            compressed_size: 0,
            integrity_digest: [0; 32],
            method: Method::Get,
            cache_control: cache_control.parse::<CacheControlHeader>().unwrap(),
            vary: Vec::new(),
            expires: None,
            etag: None,
            last_modified: None,
            stored_at: response_time,
            response_time,
        }
    }

    #[test]
    fn fresh_within_max_age() {
        let now = SystemTime::now();
        let entry = base_entry("max-age=60", now - Duration::from_secs(30));
        assert_eq!(classify(&entry, now), Freshness::Fresh);
    }

    #[test]
    fn stale_within_swr_budget() {
        let now = SystemTime::now();
        let entry = base_entry("max-age=60, stale-while-revalidate=30", now - Duration::from_secs(70));
        assert_eq!(classify(&entry, now), Freshness::Stale);
    }

    #[test]
    fn expired_past_swr_budget() {
        let now = SystemTime::now();
        let entry = base_entry("max-age=60, stale-while-revalidate=30", now - Duration::from_secs(200));
        assert_eq!(classify(&entry, now), Freshness::Expired);
    }

    #[test]
    fn immutable_is_always_fresh() {
        let now = SystemTime::now();
        let entry = base_entry("immutable", now - Duration::from_secs(99_999));
        assert_eq!(classify(&entry, now), Freshness::Fresh);
    }

    #[test]
    fn no_cache_forces_stale_without_swr_budget_goes_expired() {
        let now = SystemTime::now();
        let entry = base_entry("no-cache", now);
        assert_eq!(classify(&entry, now), Freshness::Expired);
    }

    #[test]
    fn no_cache_with_swr_is_stale() {
        let now = SystemTime::now();
        let entry = base_entry("no-cache, stale-while-revalidate=30", now);
        assert_eq!(classify(&entry, now), Freshness::Stale);
    }

    #[test]
    fn default_ttl_applies_with_no_directives() {
        let now = SystemTime::now();
        let entry = base_entry("", now - (DEFAULT_TTL - Duration::from_secs(1)));
        assert_eq!(classify(&entry, now), Freshness::Fresh);
        let expired = base_entry("", now - (DEFAULT_TTL + Duration::from_secs(1)));
        assert_eq!(classify(&expired, now), Freshness::Expired);
    }
}
