//! Per-origin idle-connection pool and FIFO acquisition queue (§4.5).
//!
//! Ported from the teacher's `DashMap`-sharded, `ArrayQueue`-backed pool: idle
//! connections still live in a lock-free `PoolSet<V>` per key. What's new here is
//! the acquisition side — the teacher's `Conn` only ever pulled a candidate or
//! opened a fresh one; this pool also enforces `max_total`/`max_per_host` and
//! parks excess acquirers on a FIFO.

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::key::ConnectionKey;
use crossbeam_queue::ArrayQueue;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// One pooled connection plus the instant it went idle.
struct PoolEntry<V> {
    item: V,
    idle_since: Instant,
}

impl<V> PoolEntry<V> {
    fn new(item: V) -> Self {
        Self { item, idle_since: Instant::now() }
    }

    fn is_expired(&self, idle_timeout: Duration) -> bool {
        self.idle_since.elapsed() > idle_timeout
    }
}

/// A lock-free bag of idle connections for one [`ConnectionKey`].
struct PoolSet<V> {
    queue: Arc<ArrayQueue<PoolEntry<V>>>,
}

impl<V> PoolSet<V> {
    fn new(capacity: usize) -> Self {
        Self { queue: Arc::new(ArrayQueue::new(capacity.max(1))) }
    }

    fn insert(&self, entry: PoolEntry<V>) {
        // force_push evicts the oldest entry rather than failing, matching the
        // teacher's pool.rs behavior when a set is already at capacity.
        let _ = self.queue.force_push(entry);
    }

    fn take_live(&self, idle_timeout: Duration) -> Option<V> {
        while let Some(entry) = self.queue.pop() {
            if !entry.is_expired(idle_timeout) {
                return Some(entry.item);
            }
        }
        None
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// What [`Pool::acquire`] hands back: either a reusable connection, or permission
/// to open a brand new one (capacity has already been reserved).
pub enum Slot<V> {
    /// An idle connection, either already parked or handed off directly by a
    /// releasing request.
    Reused(V),
    /// No idle connection was available, but the caller may open a new one. The
    /// caller must call [`Pool::release`] or [`Pool::drop_connection`] exactly
    /// once when done with it.
    Permit,
}

/// Connection pool keyed by `(scheme, authority, alpn_version)` (§4.5).
pub struct Pool<V> {
    config: PoolConfig,
    idle: Arc<DashMap<ConnectionKey, PoolSet<V>>>,
    counts: Arc<DashMap<ConnectionKey, usize>>,
    total: Arc<AtomicUsize>,
    waiters: Arc<DashMap<ConnectionKey, VecDeque<oneshot::Sender<Slot<V>>>>>,
}

impl<V> Clone for Pool<V> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            idle: Arc::clone(&self.idle),
            counts: Arc::clone(&self.counts),
            total: Arc::clone(&self.total),
            waiters: Arc::clone(&self.waiters),
        }
    }
}

impl<V> Pool<V> {
    /// A new, empty pool governed by `config`.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            idle: Arc::new(DashMap::new()),
            counts: Arc::new(DashMap::new()),
            total: Arc::new(AtomicUsize::new(0)),
            waiters: Arc::new(DashMap::new()),
        }
    }

    fn take_idle(&self, key: &ConnectionKey) -> Option<V> {
        let set = self.idle.get(key)?;
        set.take_live(self.config.idle_timeout)
    }

    fn try_reserve(&self, key: &ConnectionKey) -> bool {
        if self.total.load(Ordering::Acquire) >= self.config.max_total {
            return false;
        }
        let mut entry = self.counts.entry(key.clone()).or_insert(0);
        if *entry >= self.config.max_per_host {
            return false;
        }
        *entry += 1;
        self.total.fetch_add(1, Ordering::AcqRel);
        true
    }

    /// Acquire a connection for `key`: reuse an idle one, get permission to open
    /// a new one, or queue behind the FIFO of other pending acquirers (§4.5
    /// "Acquisition"). Dropping the returned future before it resolves is how a
    /// cancelled waiter leaves the FIFO — its dead sender is simply skipped the
    /// next time a slot is handed out.
    pub async fn acquire(&self, key: &ConnectionKey) -> Result<Slot<V>> {
        if let Some(v) = self.take_idle(key) {
            return Ok(Slot::Reused(v));
        }
        if self.try_reserve(key) {
            return Ok(Slot::Permit);
        }
        let (tx, rx) = oneshot::channel();
        self.waiters.entry(key.clone()).or_default().push_back(tx);
        rx.await.map_err(|_| Error::AcquireCancelled(key.to_string()))
    }

    fn next_live_waiter(&self, key: &ConnectionKey) -> Option<oneshot::Sender<Slot<V>>> {
        let mut queue = self.waiters.get_mut(key)?;
        while let Some(tx) = queue.pop_front() {
            if !tx.is_closed() {
                return Some(tx);
            }
        }
        None
    }

    /// Return a still-usable, keep-alive connection to the pool: handed directly
    /// to the next live FIFO waiter if one is queued, else parked idle.
    pub fn release(&self, key: &ConnectionKey, item: V) {
        let mut item = item;
        loop {
            match self.next_live_waiter(key) {
                Some(tx) => match tx.send(Slot::Reused(item)) {
                    Ok(()) => return,
                    Err(Slot::Reused(returned)) => {
                        item = returned;
                        continue;
                    }
                    Err(Slot::Permit) => unreachable!("we only ever send Reused here"),
                },
                None => {
                    let set =
                        self.idle.entry(key.clone()).or_insert_with(|| PoolSet::new(self.config.max_per_host));
                    set.insert(PoolEntry::new(item));
                    return;
                }
            }
        }
    }

    /// Report that a reserved connection was discarded rather than returned
    /// (closed, reset, or cancelled mid-response per §4.5's cancellation rule).
    /// Frees its slot, handing the freed permit to the next FIFO waiter if any.
    pub fn drop_connection(&self, key: &ConnectionKey) {
        if let Some(mut count) = self.counts.get_mut(key) {
            *count = count.saturating_sub(1);
        }
        self.total.fetch_sub(1, Ordering::AcqRel);
        if let Some(tx) = self.next_live_waiter(key) {
            let _ = tx.send(Slot::Permit);
        }
    }

    /// Drop idle connections that have sat unused past `idle_timeout`, and any
    /// now-empty per-key sets. Intended to run periodically off an event-loop
    /// timer.
    pub fn reap_idle(&self) {
        for mut set in self.idle.iter_mut() {
            if let Some(entry) = set.queue.pop() {
                if !entry.is_expired(self.config.idle_timeout) {
                    set.insert(entry);
                }
            }
        }
        self.idle.retain(|_, set| !set.is_empty());
    }

    /// Number of idle connections currently parked for `key`.
    pub fn idle_len(&self, key: &ConnectionKey) -> usize {
        self.idle.get(key).map(|s| s.queue.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::TransportScheme;
    use aperture_http::Version;

    fn key() -> ConnectionKey {
        ConnectionKey::new(TransportScheme::Http, "example.com:80", Version::Http11)
    }

    #[tokio::test]
    async fn first_acquire_is_a_permit() {
        let pool: Pool<u32> = Pool::new(PoolConfig::default());
        let slot = pool.acquire(&key()).await.unwrap();
        assert!(matches!(slot, Slot::Permit));
    }

    #[tokio::test]
    async fn release_then_acquire_reuses() {
        let pool: Pool<u32> = Pool::new(PoolConfig::default());
        let k = key();
        let _ = pool.acquire(&k).await.unwrap();
        pool.release(&k, 7);
        let slot = pool.acquire(&k).await.unwrap();
        assert!(matches!(slot, Slot::Reused(7)));
    }

    #[tokio::test]
    async fn per_host_cap_is_enforced() {
        let mut config = PoolConfig::default();
        config.max_per_host = 1;
        config.max_total = 10;
        let pool: Pool<u32> = Pool::new(config);
        let k = key();
        let first = pool.acquire(&k).await.unwrap();
        assert!(matches!(first, Slot::Permit));

        let pool2 = pool.clone();
        let k2 = k.clone();
        let waiter = tokio::spawn(async move { pool2.acquire(&k2).await });

        tokio::task::yield_now().await;
        pool.release(&k, 42);
        let slot = waiter.await.unwrap().unwrap();
        assert!(matches!(slot, Slot::Reused(42)));
    }

    #[tokio::test]
    async fn dropped_connection_frees_a_waiting_permit() {
        let mut config = PoolConfig::default();
        config.max_per_host = 1;
        let pool: Pool<u32> = Pool::new(config);
        let k = key();
        let _first = pool.acquire(&k).await.unwrap();

        let pool2 = pool.clone();
        let k2 = k.clone();
        let waiter = tokio::spawn(async move { pool2.acquire(&k2).await });
        tokio::task::yield_now().await;
        pool.drop_connection(&k);
        let slot = waiter.await.unwrap().unwrap();
        assert!(matches!(slot, Slot::Permit));
    }
}
