use crate::band::PriorityBand;
use crate::resource::ResourceType;

/// A scheduled fetch that re-enters the pipeline through the cache as a fresh
/// lookup (§4.6: "the planner emits `PrefetchTask`s that re-enter the
/// pipeline through C7 as fresh cache lookups with `Purpose: prefetch`
/// metadata; the pool treats them as low-priority but reusable").
#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchTask {
    /// The resource's URL.
    pub url: String,
    /// What kind of payload is expected.
    pub resource_type: ResourceType,
    /// The band this task was scheduled under.
    pub priority: PriorityBand,
    /// Carried through to the connection pool so it can be deprioritized
    /// relative to user-driven requests while still being treated as a
    /// reusable connection, not a throwaway probe.
    pub purpose: Purpose,
}

/// Tags a request's origin, so downstream components (notably the connection
/// pool) can treat planner-issued work differently from user-driven fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Issued by the planner ahead of need.
    Prefetch,
}

impl PrefetchTask {
    pub(crate) fn new(url: impl Into<String>, resource_type: ResourceType, priority: PriorityBand) -> Self {
        Self { url: url.into(), resource_type, priority, purpose: Purpose::Prefetch }
    }
}
