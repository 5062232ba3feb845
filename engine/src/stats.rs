//! `stats()`'s return type (§6: "cache hit ratio, pool sizes, prefetch
//! counters, per-origin RTT").

use std::collections::HashMap;
use std::time::Duration;

/// A point-in-time snapshot of the engine's operating statistics.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Cache hits (`Fresh` or `Stale`) divided by total lookups, since the
    /// engine started. `0.0` if no lookups have happened yet.
    pub cache_hit_ratio: f64,
    /// Total cache lookups that returned `Fresh` or `Stale`.
    pub cache_hits: u64,
    /// Total cache lookups that returned `Miss`.
    pub cache_misses: u64,
    /// Requests currently in flight (acquired a connection, awaiting or
    /// streaming a response). A practical stand-in for per-pool idle/active
    /// counts, since `aperture-client`'s `Pool` only exposes idle connection
    /// counts per connection key, not an aggregate across origins.
    pub requests_in_flight: u64,
    /// Entries currently queued for background DNS prefetch.
    pub prefetch_queue_len: usize,
    /// Most recently observed round-trip time per origin authority, fed by
    /// completed fetches.
    pub origin_rtt: HashMap<String, Duration>,
}
