//! The cache API (§4.7): `get`/`put`/`invalidate`/`clear`, tying together
//! fingerprinting, freshness classification, the LRU store, and the optional
//! compression/encryption transform.

use crate::cache_control::CacheControlHeader;
use crate::codec::{self, EncryptionKey, COMPRESSION_THRESHOLD};
use crate::entry::{BodyEncoding, CacheEntry};
use crate::error::Result;
use crate::fingerprint::{self, primary_key};
use crate::freshness::{self, Freshness};
use crate::lru::LruCache;
use aperture_http::{HeaderName, HeaderStore, KnownHeaderName, Method, Status};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

/// Tuning knobs for an [`HttpCache`].
pub struct CacheConfig {
    /// Maximum number of entries held in memory at once.
    pub capacity: usize,
    /// Gzip-compress text-like bodies over [`COMPRESSION_THRESHOLD`] bytes.
    pub compress: bool,
    /// If set, stored bodies are encrypted with this key (§4.7.4).
    pub encryption_key: Option<EncryptionKey>,
    /// If set, `persist`/`load_journal` read and write this path (§4.7.3).
    pub journal_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 1000, compress: true, encryption_key: None, journal_path: None }
    }
}

/// The result of a [`HttpCache::get`] lookup.
pub enum Lookup {
    /// The entry is fresh and may be returned directly.
    Fresh(CacheEntry),
    /// The entry is stale but within its `stale-while-revalidate` budget: return
    /// it, but the caller should enqueue a revalidation request.
    Stale(CacheEntry),
    /// No usable entry (absent, or expired past any stale budget).
    Miss,
}

struct VariantInfo {
    vary: Vec<HeaderName<'static>>,
    fingerprints: HashSet<String>,
}

/// A two-tier HTTP cache: an in-memory LRU map front-ended to an optional
/// on-disk journal.
pub struct HttpCache {
    lru: Mutex<LruCache>,
    variants: Mutex<HashMap<String, VariantInfo>>,
    config: CacheConfig,
}

impl HttpCache {
    /// A new, empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self { lru: Mutex::new(LruCache::new(config.capacity)), variants: Mutex::new(HashMap::new()), config }
    }

    /// Look up a cached response for `method url`, taking into account any
    /// `Vary` list recorded for this resource (§4.7.2).
    pub fn get(&self, method: Method, url: &str, request_headers: &HeaderStore<'_>) -> Lookup {
        let primary = primary_key(method, url);
        let vary = {
            let variants = self.variants.lock().unwrap();
            variants.get(&primary).map(|v| v.vary.clone()).unwrap_or_default()
        };
        let fp = fingerprint::fingerprint(&primary, &vary, request_headers);

        let mut lru = self.lru.lock().unwrap();
        let Some(entry) = lru.get(&fp) else {
            return Lookup::Miss;
        };
        match freshness::classify(entry, SystemTime::now()) {
            Freshness::Fresh => Lookup::Fresh(entry.clone()),
            Freshness::Stale => Lookup::Stale(entry.clone()),
            Freshness::Expired => Lookup::Miss,
        }
    }

    /// The lookup key `get`/`put` use internally for `method url`, folding in
    /// any `Vary` list already recorded for this resource. Exposed so callers
    /// that need to coalesce concurrent misses on the same entry (§5's
    /// single-flight guarantee) can key their own in-flight map on exactly
    /// what the cache itself considers "the same entry".
    pub fn fingerprint(&self, method: Method, url: &str, request_headers: &HeaderStore<'_>) -> String {
        let primary = primary_key(method, url);
        let vary = {
            let variants = self.variants.lock().unwrap();
            variants.get(&primary).map(|v| v.vary.clone()).unwrap_or_default()
        };
        fingerprint::fingerprint(&primary, &vary, request_headers)
    }

    /// Store a response, honoring `no-store`, compressing/encrypting the body
    /// per `self.config`, and evicting LRU-tail entries if over capacity
    /// (§4.7, §4.7.4).
    pub fn put(
        &self,
        method: Method,
        url: &str,
        request_headers: &HeaderStore<'_>,
        response_headers: HeaderStore<'static>,
        status: Status,
        body: Vec<u8>,
    ) -> Result<()> {
        let cache_control: CacheControlHeader = response_headers
            .get(&HeaderName::Known(KnownHeaderName::CacheControl))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(CacheControlHeader::empty);

        if cache_control.is_no_store() {
            return Err(crate::error::Error::NoStore);
        }

        let vary = parse_vary(&response_headers);
        let expires = response_headers
            .get(&HeaderName::Known(KnownHeaderName::Expires))
            .and_then(|v| v.as_str())
            .and_then(|s| httpdate::parse_http_date(s).ok());
        let etag = response_headers
            .get(&HeaderName::Known(KnownHeaderName::Etag))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let last_modified = response_headers
            .get(&HeaderName::Known(KnownHeaderName::LastModified))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let content_type = response_headers
            .get(&HeaderName::Known(KnownHeaderName::ContentType))
            .and_then(|v| v.as_str())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_default();

        let original_size = body.len();
        let mut stored = body;
        let mut compressed = false;
        if self.config.compress && codec::is_text_like(&content_type) && stored.len() > COMPRESSION_THRESHOLD {
            stored = codec::gzip_compress(&stored)?;
            compressed = true;
        }
        let encrypted = self.config.encryption_key.is_some();
        if let Some(key) = &self.config.encryption_key {
            stored = codec::encrypt(key, &stored)?;
        }
        let encoding = match (compressed, encrypted) {
            (true, true) => BodyEncoding::CompressedEncrypted,
            (true, false) => BodyEncoding::Compressed,
            (false, true) => BodyEncoding::Encrypted,
            (false, false) => BodyEncoding::Identity,
        };
        let integrity_digest = codec::integrity_digest(&stored);
        let compressed_size = stored.len();

        let now = SystemTime::now();
        let entry = CacheEntry {
            status,
            headers: response_headers,
            body: stored,
            encoding,
            original_size,
            compressed_size,
            integrity_digest,
            method,
            cache_control,
            vary: vary.clone(),
            expires,
            etag,
            last_modified,
            stored_at: now,
            response_time: now,
        };

        let primary = primary_key(method, url);
        let fp = fingerprint::fingerprint(&primary, &vary, request_headers);

        {
            let mut variants = self.variants.lock().unwrap();
            let info = variants.entry(primary).or_insert_with(|| VariantInfo { vary: vary.clone(), fingerprints: HashSet::new() });
            info.vary = vary;
            info.fingerprints.insert(fp.clone());
        }

        let evicted = self.lru.lock().unwrap().insert(fp, entry);
        if !evicted.is_empty() {
            log::debug!("cache evicted {} entries over capacity", evicted.len());
        }
        Ok(())
    }

    /// Merge a `304 Not Modified` revalidation response into the matching
    /// entry, restoring it to Fresh (§4.7.1).
    pub fn revalidate_not_modified(
        &self,
        method: Method,
        url: &str,
        request_headers: &HeaderStore<'_>,
        revalidation_headers: &HeaderStore<'_>,
    ) {
        let primary = primary_key(method, url);
        let vary = {
            let variants = self.variants.lock().unwrap();
            variants.get(&primary).map(|v| v.vary.clone()).unwrap_or_default()
        };
        let fp = fingerprint::fingerprint(&primary, &vary, request_headers);
        let mut lru = self.lru.lock().unwrap();
        if let Some(entry) = lru.get(&fp) {
            let mut updated = entry.clone();
            updated.apply_not_modified(revalidation_headers, SystemTime::now());
            lru.insert(fp, updated);
        }
    }

    /// Remove every stored variant of `method url`.
    pub fn invalidate(&self, method: Method, url: &str) {
        let primary = primary_key(method, url);
        let mut variants = self.variants.lock().unwrap();
        if let Some(info) = variants.remove(&primary) {
            let mut lru = self.lru.lock().unwrap();
            for fp in info.fingerprints {
                lru.remove(&fp);
            }
        }
    }

    /// Drop every stored entry.
    pub fn clear(&self) {
        self.lru.lock().unwrap().clear();
        self.variants.lock().unwrap().clear();
    }

    /// Remove entries that are neither fresh nor within their stale budget
    /// (§4.7.3: "periodic cleanup ... removes entries that are neither fresh
    /// nor within the stale budget"). Returns the number removed.
    pub fn cleanup(&self, now: SystemTime) -> usize {
        let mut lru = self.lru.lock().unwrap();
        let expired: Vec<String> = lru
            .iter_mru_to_lru()
            .filter(|(_, entry)| freshness::classify(entry, now) == Freshness::Expired)
            .map(|(k, _)| k.to_string())
            .collect();
        for key in &expired {
            lru.remove(key);
        }
        drop(lru);
        if !expired.is_empty() {
            let mut variants = self.variants.lock().unwrap();
            for info in variants.values_mut() {
                for key in &expired {
                    info.fingerprints.remove(key);
                }
            }
        }
        expired.len()
    }

    /// Serialize the current contents to `config.journal_path`, in
    /// most-recently-used-first order (§4.7.3).
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.config.journal_path else { return Ok(()) };
        let lru = self.lru.lock().unwrap();
        let entries: Vec<_> = lru.iter_mru_to_lru().map(|(k, e)| (k.to_string(), e.clone())).collect();
        crate::persistence::save(path, entries.into_iter())
    }

    /// Load entries from `config.journal_path`, reinstating LRU order in the
    /// order they were saved (§4.7.3: "on load it reinstates LRU order in
    /// insertion order").
    pub fn load_journal(&self) -> Result<()> {
        let Some(path) = &self.config.journal_path else { return Ok(()) };
        if !path.exists() {
            return Ok(());
        }
        let entries = crate::persistence::load(path)?;
        let mut lru = self.lru.lock().unwrap();
        let mut variants = self.variants.lock().unwrap();
        for (fp, entry) in entries {
            // `fingerprint::fingerprint` appends a `\u{1}`-delimited suffix for `Vary`
            // headers onto the primary key; the prefix up to the first such byte is
            // exactly what `primary_key` would have produced.
            let primary = fp.split('\u{1}').next().unwrap_or(&fp).to_string();
            let info = variants.entry(primary).or_insert_with(|| VariantInfo { vary: entry.vary.clone(), fingerprints: HashSet::new() });
            info.fingerprints.insert(fp.clone());
            lru.insert(fp, entry);
        }
        Ok(())
    }
}

fn parse_vary(headers: &HeaderStore<'_>) -> Vec<HeaderName<'static>> {
    headers
        .get(&HeaderName::Known(KnownHeaderName::Vary))
        .and_then(|v| v.as_str())
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| HeaderName::parse(s).ok())
                .map(HeaderName::into_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aperture_http::HeaderValue;

    fn headers_with_cache_control(cc: &str) -> HeaderStore<'static> {
        let mut h = HeaderStore::new();
        h.append(KnownHeaderName::CacheControl, HeaderValue::new(cc.as_bytes()).unwrap());
        h
    }

    #[test]
    fn put_then_get_returns_fresh() {
        let cache = HttpCache::new(CacheConfig::default());
        let req = HeaderStore::new();
        cache
            .put(Method::Get, "https://example.com/", &req, headers_with_cache_control("max-age=60"), Status::Ok, b"hi".to_vec())
            .unwrap();
        assert!(matches!(cache.get(Method::Get, "https://example.com/", &req), Lookup::Fresh(_)));
    }

    #[test]
    fn no_store_is_rejected() {
        let cache = HttpCache::new(CacheConfig::default());
        let req = HeaderStore::new();
        let result = cache.put(Method::Get, "https://example.com/", &req, headers_with_cache_control("no-store"), Status::Ok, b"hi".to_vec());
        assert!(result.is_err());
    }

    #[test]
    fn invalidate_removes_the_entry() {
        let cache = HttpCache::new(CacheConfig::default());
        let req = HeaderStore::new();
        cache
            .put(Method::Get, "https://example.com/", &req, headers_with_cache_control("max-age=60"), Status::Ok, b"hi".to_vec())
            .unwrap();
        cache.invalidate(Method::Get, "https://example.com/");
        assert!(matches!(cache.get(Method::Get, "https://example.com/", &req), Lookup::Miss));
    }

    #[test]
    fn vary_produces_distinct_entries_for_distinct_accept_encoding() {
        let cache = HttpCache::new(CacheConfig::default());
        let mut response = headers_with_cache_control("max-age=60");
        response.append(KnownHeaderName::Vary, HeaderValue::new(b"Accept-Encoding".as_slice()).unwrap());

        let mut gzip_req = HeaderStore::new();
        gzip_req.append(KnownHeaderName::AcceptEncoding, HeaderValue::new(b"gzip".as_slice()).unwrap());
        cache.put(Method::Get, "https://example.com/", &gzip_req, response.clone(), Status::Ok, b"gzip-body".to_vec()).unwrap();

        let mut br_req = HeaderStore::new();
        br_req.append(KnownHeaderName::AcceptEncoding, HeaderValue::new(b"br".as_slice()).unwrap());
        assert!(matches!(cache.get(Method::Get, "https://example.com/", &br_req), Lookup::Miss));
        assert!(matches!(cache.get(Method::Get, "https://example.com/", &gzip_req), Lookup::Fresh(_)));
    }

    #[test]
    fn cleanup_removes_expired_entries_only() {
        let cache = HttpCache::new(CacheConfig::default());
        let req = HeaderStore::new();
        cache.put(Method::Get, "https://a.example/", &req, headers_with_cache_control("max-age=0"), Status::Ok, b"stale-soon".to_vec()).unwrap();
        cache.put(Method::Get, "https://b.example/", &req, headers_with_cache_control("max-age=3600"), Status::Ok, b"fresh".to_vec()).unwrap();

        let far_future = SystemTime::now() + std::time::Duration::from_secs(10_000);
        let removed = cache.cleanup(far_future);
        assert_eq!(removed, 2); // both past their max-age and default TTL at that point, no swr budget
    }

    #[test]
    fn compression_applies_only_to_large_text_bodies() {
        let cache = HttpCache::new(CacheConfig::default());
        let req = HeaderStore::new();
        let mut response = headers_with_cache_control("max-age=60");
        response.append(KnownHeaderName::ContentType, HeaderValue::new(b"text/html".as_slice()).unwrap());
        let big_body = vec![b'a'; COMPRESSION_THRESHOLD + 1];
        cache.put(Method::Get, "https://example.com/big", &req, response, Status::Ok, big_body.clone()).unwrap();
        if let Lookup::Fresh(entry) = cache.get(Method::Get, "https://example.com/big", &req) {
            assert_eq!(entry.encoding, BodyEncoding::Compressed);
            assert!(entry.body.len() < big_body.len());
        } else {
            panic!("expected a fresh hit");
        }
    }
}
