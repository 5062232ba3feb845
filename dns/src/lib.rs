//! Adaptive background DNS prefetcher: re-resolves domains before their TTL expires,
//! prioritized by usage-derived importance and domain category (§4.4).
//!
//! Resolution itself is delegated to `hickory-resolver`; this crate owns the
//! priority queue, the per-domain cache bookkeeping, and the scan/dispatch cycle
//! that decides *when* and *in what order* to re-resolve.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod oracle;
mod prefetcher;
mod priority;
mod queue;
mod record;
mod task;

pub use config::DnsConfig;
pub use error::Error;
pub use oracle::{AlwaysPrefetch, AnalyticsOracle};
pub use prefetcher::Prefetcher;
pub use priority::{Category, Priority};
pub use queue::PrefetchQueue;
pub use record::{DnsCacheRecord, RecordType};
pub use task::PrefetchTask;
