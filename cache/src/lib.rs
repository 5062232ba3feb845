//! Two-tier HTTP cache: an in-memory LRU map front-ended to an optional
//! on-disk journal (§4.7).
//!
//! `cache.rs` is the public API (`get`/`put`/`invalidate`/`clear`); `freshness.rs`
//! implements the RFC 7234 subset that decides Fresh/Stale/Expired; `lru.rs` is
//! the sentinel-node eviction list; `codec.rs` handles the optional
//! compress-then-encrypt body transform; `persistence.rs` is the on-disk journal
//! format; `cache_control.rs` is ported from the teacher's
//! `caching-headers::cache_control` module.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod cache_control;
mod codec;
mod entry;
mod error;
mod fingerprint;
mod freshness;
mod lru;
mod persistence;

pub use cache::{CacheConfig, HttpCache, Lookup};
pub use cache_control::{CacheControlDirective, CacheControlHeader};
pub use codec::EncryptionKey;
pub use entry::{BodyEncoding, CacheEntry};
pub use error::Error;
pub use freshness::{Freshness, DEFAULT_TTL};
