//! Sentinel-node doubly linked LRU list (§4.7.3): `get` promotes to head, `put`
//! inserts at head, overflow pops the tail. Implemented as an arena of `Node`s
//! addressed by index rather than raw pointers, so the whole crate stays
//! `#![forbid(unsafe_code)]`.

use crate::entry::CacheEntry;
use std::collections::HashMap;

struct Node {
    key: String,
    entry: CacheEntry,
    prev: usize,
    next: usize,
}

/// One slot freed by an eviction, surfaced so the cache can account for the
/// bytes it released.
pub struct Evicted {
    /// The fingerprint that was evicted.
    pub key: String,
    /// The entry that was evicted.
    pub entry: CacheEntry,
}

/// A fixed-capacity LRU map from fingerprint to [`CacheEntry`].
///
/// `head`/`tail` are sentinel slots at indices 0 and 1 that are never exposed as
/// real entries; `head.next` is the most-recently-used real node and
/// `tail.prev` is the least-recently-used one.
pub struct LruCache {
    nodes: Vec<Node>,
    free: Vec<usize>,
    index: HashMap<String, usize>,
    head: usize,
    tail: usize,
    capacity: usize,
}

const NONE: usize = usize::MAX;

impl LruCache {
    /// A new cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(2);
        nodes.push(Node { key: String::new(), entry: sentinel_entry(), prev: NONE, next: 1 });
        nodes.push(Node { key: String::new(), entry: sentinel_entry(), prev: 0, next: NONE });
        Self { nodes, free: Vec::new(), index: HashMap::new(), head: 0, tail: 1, capacity: capacity.max(1) }
    }

    /// Number of real entries currently stored.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;
    }

    fn link_at_head(&mut self, idx: usize) {
        let old_head_next = self.nodes[self.head].next;
        self.nodes[idx].prev = self.head;
        self.nodes[idx].next = old_head_next;
        self.nodes[self.head].next = idx;
        self.nodes[old_head_next].prev = idx;
    }

    /// Look up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        let idx = *self.index.get(key)?;
        self.unlink(idx);
        self.link_at_head(idx);
        Some(&self.nodes[idx].entry)
    }

    /// Look up `key` without affecting recency order (used for read-only
    /// inspection, e.g. serializing the journal).
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.index.get(key).map(|&idx| &self.nodes[idx].entry)
    }

    /// Insert or replace `key`, placing it at the head. Returns any entries
    /// evicted to stay within capacity.
    pub fn insert(&mut self, key: String, entry: CacheEntry) -> Vec<Evicted> {
        if let Some(&idx) = self.index.get(&key) {
            self.nodes[idx].entry = entry;
            self.unlink(idx);
            self.link_at_head(idx);
            return Vec::new();
        }

        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Node { key: key.clone(), entry, prev: NONE, next: NONE };
                idx
            }
            None => {
                self.nodes.push(Node { key: key.clone(), entry, prev: NONE, next: NONE });
                self.nodes.len() - 1
            }
        };
        self.index.insert(key, idx);
        self.link_at_head(idx);

        let mut evicted = Vec::new();
        while self.index.len() > self.capacity {
            let victim = self.nodes[self.tail].prev;
            if victim == self.head {
                break;
            }
            self.unlink(victim);
            let node = std::mem::replace(
                &mut self.nodes[victim],
                Node { key: String::new(), entry: sentinel_entry(), prev: NONE, next: NONE },
            );
            self.index.remove(&node.key);
            self.free.push(victim);
            evicted.push(Evicted { key: node.key, entry: node.entry });
        }
        evicted
    }

    /// Remove `key`, returning its entry if present.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        let node = std::mem::replace(
            &mut self.nodes[idx],
            Node { key: String::new(), entry: sentinel_entry(), prev: NONE, next: NONE },
        );
        self.free.push(idx);
        Some(node.entry)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.nodes.truncate(2);
        self.nodes[self.head].next = self.tail;
        self.nodes[self.tail].prev = self.head;
        self.free.clear();
        self.index.clear();
    }

    /// Iterate entries from most- to least-recently-used.
    pub fn iter_mru_to_lru(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        let mut current = self.nodes[self.head].next;
        std::iter::from_fn(move || {
            if current == self.tail {
                return None;
            }
            let node = &self.nodes[current];
            current = node.next;
            Some((node.key.as_str(), &node.entry))
        })
    }
}

fn sentinel_entry() -> CacheEntry {
    use crate::cache_control::CacheControlHeader;
    use crate::entry::BodyEncoding;
    use aperture_http::{HeaderStore, Method, Status};
    use std::time::SystemTime;

    CacheEntry {
        status: Status::Ok,
        headers: HeaderStore::new(),
        body: Vec::new(),
        encoding: BodyEncoding::Identity,
        original_size: 0,
        compressed_size: 0,
        integrity_digest: [0; 32],
        method: Method::Get,
        cache_control: CacheControlHeader::empty(),
        vary: Vec::new(),
        expires: None,
        etag: None,
        last_modified: None,
        stored_at: SystemTime::UNIX_EPOCH,
        response_time: SystemTime::UNIX_EPOCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache_control::CacheControlHeader;
    use crate::entry::BodyEncoding;
    use aperture_http::{HeaderStore, Method, Status};
    use std::time::SystemTime;

    fn entry() -> CacheEntry {
        CacheEntry {
            status: Status::Ok,
            headers: HeaderStore::new(),
            body: vec![1, 2, 3],
            encoding: BodyEncoding::Identity,
            original_size: 3,
            compressed_size: 3,
            integrity_digest: [0; 32],
            method: Method::Get,
            cache_control: CacheControlHeader::empty(),
            vary: Vec::new(),
            expires: None,
            etag: None,
            last_modified: None,
            stored_at: SystemTime::now(),
            response_time: SystemTime::now(),
        }
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let mut cache = LruCache::new(4);
        cache.insert("a".into(), entry());
        assert!(cache.get("a").is_some());
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn overflow_evicts_the_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.insert("a".into(), entry());
        cache.insert("b".into(), entry());
        cache.get("a"); // promote a, leaving b as LRU
        let evicted = cache.insert("c".into(), entry());
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].key, "b");
        assert_eq!(cache.len(), 2);
        assert!(cache.peek("a").is_some());
        assert!(cache.peek("c").is_some());
        assert!(cache.peek("b").is_none());
    }

    #[test]
    fn mru_order_reflects_recent_access() {
        let mut cache = LruCache::new(3);
        cache.insert("a".into(), entry());
        cache.insert("b".into(), entry());
        cache.insert("c".into(), entry());
        cache.get("a");
        let order: Vec<_> = cache.iter_mru_to_lru().map(|(k, _)| k.to_string()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[test]
    fn remove_and_reinsert_reuses_freed_slot() {
        let mut cache = LruCache::new(4);
        cache.insert("a".into(), entry());
        cache.remove("a");
        assert!(cache.peek("a").is_none());
        cache.insert("b".into(), entry());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let mut cache = LruCache::new(4);
        cache.insert("a".into(), entry());
        cache.insert("b".into(), entry());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.iter_mru_to_lru().count(), 0);
    }
}
