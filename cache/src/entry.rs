use crate::cache_control::CacheControlHeader;
use aperture_http::{HeaderName, HeaderStore, Method, Status};
use std::time::SystemTime;

/// How a stored body has been transformed from the bytes that arrived on the wire
/// (§4.7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// Stored exactly as received.
    Identity,
    /// Gzip-compressed only.
    Compressed,
    /// Gzip-compressed, then AES-GCM-encrypted.
    CompressedEncrypted,
    /// AES-GCM-encrypted only (body was below the compression threshold).
    Encrypted,
}

/// One cached response, keyed externally by its fingerprint (§4.7.2).
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The response status.
    pub status: Status,
    /// The response headers, exactly as they will be replayed to the caller.
    pub headers: HeaderStore<'static>,
    /// The stored body, transformed per `encoding`.
    pub body: Vec<u8>,
    /// How `body` has been transformed from the bytes the origin sent.
    pub encoding: BodyEncoding,
    /// Size of the body as received from the origin, before any transform.
    pub original_size: usize,
    /// Size of `body` as stored (after compression/encryption).
    pub compressed_size: usize,
    /// SHA-256 digest computed over the stored (post-transform) bytes (§4.7.4).
    pub integrity_digest: [u8; 32],
    /// The request method this entry answers (only GET/HEAD are ever stored).
    pub method: Method,
    /// The parsed `Cache-Control` header from the response, retained for
    /// revalidation decisions (`must-revalidate`, `immutable`, ...).
    pub cache_control: CacheControlHeader,
    /// The response's own `Vary` list, applied to future fingerprint construction
    /// (§4.7.2).
    pub vary: Vec<HeaderName<'static>>,
    /// `Expires`, if the response carried one, parsed to an absolute time.
    pub expires: Option<SystemTime>,
    /// `ETag`, carried forward for `If-None-Match` revalidation.
    pub etag: Option<String>,
    /// `Last-Modified`, carried forward for `If-Modified-Since` revalidation.
    pub last_modified: Option<String>,
    /// When this entry was written into the cache.
    pub stored_at: SystemTime,
    /// The response time the freshness lifetime is computed from — updated on
    /// every successful revalidation (a `304`).
    pub response_time: SystemTime,
}

impl CacheEntry {
    /// Merge a `304 Not Modified` revalidation response into this entry: update
    /// headers and `response_time`, leave the body untouched (§4.7.1).
    pub fn apply_not_modified(&mut self, revalidation_headers: &HeaderStore<'_>, now: SystemTime) {
        for (name, value) in revalidation_headers.iter() {
            self.headers.set(name.clone().into_owned(), value.clone());
        }
        self.response_time = now;
    }
}
