//! The engine's public response type.

use aperture_http::{HeaderStore, Status};

/// A completed (or partially completed) response.
#[derive(Debug, Clone)]
pub struct Response {
    /// The response status. Blocked requests (§7) use status `0`, which has
    /// no [`Status`] representation — callers should check
    /// [`Response::blocked`] rather than trying to read `status` in that case.
    pub status: Option<Status>,
    /// Response headers, after the security shield's header injection.
    pub headers: HeaderStore<'static>,
    /// The (decompressed) response body, or whatever prefix was received
    /// before a failure — see `error_after_headers`.
    pub body: Vec<u8>,
    /// Whether this response was served from the cache rather than the
    /// network.
    pub from_cache: bool,
    /// Whether the network failed after headers arrived, leaving `body` a
    /// partial prefix (§7's "Response with partial body and an
    /// `error_after_headers` marker").
    pub error_after_headers: bool,
    /// Whether the request was refused outright by the tracker filter, a
    /// policy rule, or CSP (§7's "status 0 and `Blocked` kind").
    pub blocked: bool,
}

impl Response {
    /// A response representing a request the security shield refused to
    /// send at all.
    pub fn blocked() -> Self {
        Self {
            status: None,
            headers: HeaderStore::new(),
            body: Vec::new(),
            from_cache: false,
            error_after_headers: false,
            blocked: true,
        }
    }
}
