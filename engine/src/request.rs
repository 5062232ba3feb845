//! The engine's public request type (§6: `fetch(Request) -> Future<Response>`).

use aperture_http::{HeaderStore, Method};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to an in-flight (or completed) request, returned by
/// [`crate::Engine::fetch`] and accepted by [`crate::Engine::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A request to fetch, as submitted by a collaborator (JS runtime, layout, UI
/// shell).
pub struct Request {
    /// Assigned on construction; pass this to [`crate::Engine::cancel`].
    pub id: RequestId,
    /// The request method.
    pub method: Method,
    /// The absolute URL being requested.
    pub url: String,
    /// Request headers; fingerprint-rewriting and tracker-filter headers are
    /// added by the security shield, not the caller.
    pub headers: HeaderStore<'static>,
    /// The request body, if any (only meaningful for methods that allow one).
    pub body: Option<Vec<u8>>,
    /// The referring page's URL, if any — consulted by the tracker filter and
    /// cookie policy's first/third-party determination.
    pub referrer: Option<String>,
    /// What kind of subresource this is (document navigation, script,
    /// image, ...), consulted by the tracker filter.
    pub kind: aperture_shield::RequestKind,
    /// Cancelled cooperatively per §5: transports stop reading, H2/H3 emit
    /// `RST_STREAM`/`STOP_SENDING`, revalidation drops to background.
    pub(crate) cancellation: CancellationToken,
}

impl Request {
    /// A new request with a freshly assigned [`RequestId`], no body, no
    /// referrer, and [`aperture_shield::RequestKind::Document`].
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::next(),
            method,
            url: url.into(),
            headers: HeaderStore::new(),
            body: None,
            referrer: None,
            kind: aperture_shield::RequestKind::Document,
            cancellation: CancellationToken::new(),
        }
    }

    /// Set this request's kind (affects tracker-filter evaluation).
    pub fn with_kind(mut self, kind: aperture_shield::RequestKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attach a referrer URL.
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// Attach a request body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// This request's cancellation token, so a caller holding only the
    /// `Request` (before submitting it to [`crate::Engine::fetch`]) can still
    /// cancel it later via [`crate::Engine::cancel`] with `id`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }
}
