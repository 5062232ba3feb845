//! On-disk journal (§4.7.3: "the cache serializes the map to a single file; on
//! load it reinstates LRU order in insertion order").

use crate::cache_control::CacheControlHeader;
use crate::entry::{BodyEncoding, CacheEntry};
use crate::error::{Error, Result};
use aperture_http::{HeaderName, HeaderStore, HeaderValue, Method, Status};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    status: u16,
    headers: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
    encoding: u8,
    original_size: usize,
    compressed_size: usize,
    integrity_digest: [u8; 32],
    method: String,
    cache_control: String,
    vary: Vec<String>,
    expires: Option<u64>,
    etag: Option<String>,
    last_modified: Option<String>,
    stored_at: u64,
    response_time: u64,
}

#[derive(Serialize, Deserialize)]
struct Journal {
    /// Entries in most-recently-used-first order, the order [`crate::lru::LruCache::iter_mru_to_lru`]
    /// produces — reinserting them in this order on load reinstates LRU order.
    entries: Vec<(String, StoredEntry)>,
}

fn encode_encoding(e: BodyEncoding) -> u8 {
    match e {
        BodyEncoding::Identity => 0,
        BodyEncoding::Compressed => 1,
        BodyEncoding::CompressedEncrypted => 2,
        BodyEncoding::Encrypted => 3,
    }
}

fn decode_encoding(b: u8) -> BodyEncoding {
    match b {
        1 => BodyEncoding::Compressed,
        2 => BodyEncoding::CompressedEncrypted,
        3 => BodyEncoding::Encrypted,
        _ => BodyEncoding::Identity,
    }
}

fn system_time_to_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs()
}

fn secs_to_system_time(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn to_stored(entry: &CacheEntry) -> StoredEntry {
    StoredEntry {
        status: entry.status.code(),
        headers: entry
            .headers
            .iter()
            .map(|(n, v)| (n.as_str().to_string(), v.as_bytes().to_vec()))
            .collect(),
        body: entry.body.clone(),
        encoding: encode_encoding(entry.encoding),
        original_size: entry.original_size,
        compressed_size: entry.compressed_size,
        integrity_digest: entry.integrity_digest,
        method: entry.method.as_str().to_string(),
        cache_control: entry.cache_control.to_string(),
        vary: entry.vary.iter().map(|n| n.as_str().to_string()).collect(),
        expires: entry.expires.map(system_time_to_secs),
        etag: entry.etag.clone(),
        last_modified: entry.last_modified.clone(),
        stored_at: system_time_to_secs(entry.stored_at),
        response_time: system_time_to_secs(entry.response_time),
    }
}

fn from_stored(stored: StoredEntry) -> Result<CacheEntry> {
    let mut headers = HeaderStore::new();
    for (name, value) in stored.headers {
        let name = HeaderName::parse(&name)?.into_owned();
        let value = HeaderValue::new(value)?;
        headers.append(name, value);
    }

    let vary = stored
        .vary
        .into_iter()
        .map(|n| HeaderName::parse(&n).map(HeaderName::into_owned))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(CacheEntry {
        status: Status::from_code(stored.status)?,
        headers,
        body: stored.body,
        encoding: decode_encoding(stored.encoding),
        original_size: stored.original_size,
        compressed_size: stored.compressed_size,
        integrity_digest: stored.integrity_digest,
        method: Method::parse(&stored.method)?,
        cache_control: stored.cache_control.parse::<CacheControlHeader>().unwrap_or_else(|_| CacheControlHeader::empty()),
        vary,
        expires: stored.expires.map(secs_to_system_time),
        etag: stored.etag,
        last_modified: stored.last_modified,
        stored_at: secs_to_system_time(stored.stored_at),
        response_time: secs_to_system_time(stored.response_time),
    })
}

/// Serialize `entries` (most-recently-used first) to `path`.
pub fn save(path: &Path, entries: impl Iterator<Item = (String, CacheEntry)>) -> Result<()> {
    let journal = Journal { entries: entries.map(|(k, e)| (k, to_stored(&e))).collect() };
    let bytes = serde_json::to_vec(&journal).map_err(|e| Error::CorruptJournal(path.display().to_string(), e))?;
    std::fs::write(path, bytes).map_err(|e| Error::Journal(path.display().to_string(), e))
}

/// Load entries from `path`, in the most-recently-used-first order they were
/// saved in.
pub fn load(path: &Path) -> Result<Vec<(String, CacheEntry)>> {
    let bytes = std::fs::read(path).map_err(|e| Error::Journal(path.display().to_string(), e))?;
    let journal: Journal =
        serde_json::from_slice(&bytes).map_err(|e| Error::CorruptJournal(path.display().to_string(), e))?;
    journal.entries.into_iter().map(|(k, s)| Ok((k, from_stored(s)?))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::BodyEncoding;

    fn sample_entry() -> CacheEntry {
        let mut headers = HeaderStore::new();
        headers.append("X-Test", HeaderValue::new(b"1".as_slice()).unwrap());
        CacheEntry {
            status: Status::Ok,
            headers,
            body: b"hello".to_vec(),
            encoding: BodyEncoding::Identity,
            original_size: 5,
            compressed_size: 5,
            integrity_digest: [7; 32],
            method: Method::Get,
            cache_control: "max-age=60".parse().unwrap(),
            vary: vec![HeaderName::parse("Accept-Encoding").unwrap().into_owned()],
            expires: None,
            etag: Some("\"abc\"".to_string()),
            last_modified: None,
            stored_at: SystemTime::now(),
            response_time: SystemTime::now(),
        }
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        save(&path, vec![("key-a".to_string(), sample_entry())].into_iter()).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, "key-a");
        assert_eq!(loaded[0].1.body, b"hello");
        assert_eq!(loaded[0].1.etag.as_deref(), Some("\"abc\""));
    }

    #[test]
    fn corrupt_journal_is_reported_as_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        std::fs::write(&path, b"not json").unwrap();
        assert!(load(&path).is_err());
    }
}
