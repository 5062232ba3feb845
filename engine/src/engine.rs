//! The engine (§6): the callable surface every collaborator (JS runtime,
//! layout, UI shell) talks to, wiring together DNS prefetch, the connection
//! pool, the HTTP cache, the prefetch/priority planner, the security shield,
//! and the HTML pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use aperture_cache::{CacheConfig, CacheEntry, HttpCache, Lookup};
use aperture_client::{ConnectionManager, PoolConfig, TransportScheme};
use aperture_dns::{AlwaysPrefetch, DnsConfig, Prefetcher, RecordType};
use aperture_http::{HeaderName, HeaderStore, HeaderValue, KnownHeaderName, Method, Status};
use aperture_planner::{PrefetchTask, Resource, ResourceGraph};
use aperture_shield::{CookiePolicy, DomainPolicy, SecurityLevel, SecurityShield, TrackerFilter};
use tokio::sync::broadcast;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result, TimeoutPhase};
use crate::request::{Request, RequestId};
use crate::response::Response;
use crate::stats::Snapshot;

/// Tuning knobs for building an [`Engine`].
pub struct EngineConfig {
    /// The HTTP cache's own configuration.
    pub cache: CacheConfig,
    /// The connection pool's own configuration.
    pub pool: PoolConfig,
    /// The DNS prefetcher's own configuration.
    pub dns: DnsConfig,
    /// First-party cookie rule.
    pub first_party_cookies: aperture_shield::CookieRule,
    /// Third-party cookie rule.
    pub third_party_cookies: aperture_shield::CookieRule,
    /// Tracker block-list patterns (glob syntax).
    pub tracker_block_patterns: Vec<String>,
    /// Tracker allow-list patterns (glob syntax), checked after block patterns.
    pub tracker_allow_patterns: Vec<String>,
    /// Per-request total timeout (§5's "per-request total" timeout).
    pub total_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            pool: PoolConfig::default(),
            dns: DnsConfig::default(),
            first_party_cookies: aperture_shield::CookieRule::Allow,
            third_party_cookies: aperture_shield::CookieRule::Block,
            tracker_block_patterns: Vec::new(),
            tracker_allow_patterns: Vec::new(),
            total_timeout: Duration::from_secs(30),
        }
    }
}

/// The top-level engine: one instance per browser tab (§5's "single-threaded
/// cooperative event loop per browser tab").
pub struct Engine {
    cache: Arc<HttpCache>,
    connections: Arc<ConnectionManager>,
    dns: AsyncMutex<Prefetcher>,
    planner: AsyncMutex<ResourceGraph>,
    shield: RwLock<SecurityShield>,
    total_timeout: Duration,

    cancellations: RwLock<HashMap<RequestId, CancellationToken>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    in_flight: AtomicU64,
    origin_rtt: RwLock<HashMap<String, Duration>>,
    /// Per-fingerprint single-flight gate (§5): concurrent misses on the same
    /// fingerprint await the first fetch's broadcast result instead of each
    /// hitting the network.
    in_flight_fetches: AsyncMutex<HashMap<String, broadcast::Sender<Result<Response>>>>,
}

impl Engine {
    /// Build a new engine from `config`. Fails only if the DNS prefetcher
    /// cannot construct a system resolver.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let trackers = TrackerFilter::new(&config.tracker_block_patterns, &config.tracker_allow_patterns);
        let cookies = CookiePolicy::new(config.first_party_cookies, config.third_party_cookies);
        let dns = Prefetcher::new(config.dns, Box::new(AlwaysPrefetch))
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            cache: Arc::new(HttpCache::new(config.cache)),
            connections: Arc::new(ConnectionManager::new(config.pool)),
            dns: AsyncMutex::new(dns),
            planner: AsyncMutex::new(ResourceGraph::new()),
            shield: RwLock::new(SecurityShield::new(trackers, cookies)),
            total_timeout: config.total_timeout,
            cancellations: RwLock::new(HashMap::new()),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            origin_rtt: RwLock::new(HashMap::new()),
            in_flight_fetches: AsyncMutex::new(HashMap::new()),
        })
    }

    /// Fetch `request`, serving from cache when fresh, revalidating in the
    /// background when stale, and otherwise going to the network.
    ///
    /// Blocked requests (tracker filter, policy rule, CSP) return
    /// `Ok(Response::blocked())` rather than an `Err`, per §7's "Blocked
    /// requests return immediately with status 0 and `Blocked` kind" — only
    /// network/protocol/timeout/internal failures are raised as `Err`.
    pub async fn fetch(&self, mut request: Request) -> Result<Response> {
        let url = url::Url::parse(&request.url).map_err(|e| Error::InvalidInput(e.to_string()))?;
        let domain = url.host_str().ok_or_else(|| Error::InvalidInput("missing host".to_string()))?.to_string();

        self.cancellations.write().unwrap().insert(request.id, request.cancellation.clone());
        let result = self.fetch_inner(&mut request, &url, &domain).await;
        self.cancellations.write().unwrap().remove(&request.id);
        result
    }

    async fn fetch_inner(&self, request: &mut Request, url: &url::Url, domain: &str) -> Result<Response> {
        if let Err(e) = self.shield.read().unwrap().prepare_request(
            domain,
            &request.url,
            request.referrer.as_deref(),
            request.kind,
            &mut request.headers,
        ) {
            return match e {
                aperture_shield::Error::Blocked(_) => Ok(Response::blocked()),
                other => Err(other.into()),
            };
        }

        match self.cache.get(request.method, &request.url, &request.headers) {
            Lookup::Fresh(entry) => Ok(self.response_from_cache_entry(domain, entry)?),
            Lookup::Stale(entry) => {
                self.spawn_revalidation(request, url, domain, &entry);
                Ok(self.response_from_cache_entry(domain, entry)?)
            }
            Lookup::Miss => self.fetch_coalesced(request, url, domain).await,
        }
    }

    /// Ensure at-most-one concurrent network fetch per cache fingerprint
    /// (§5, boundary scenario #1): the first caller to miss on a fingerprint
    /// becomes the leader and performs the real fetch; every other caller
    /// that misses on the same fingerprint while the leader is in flight
    /// subscribes to its result instead of dispatching its own request.
    async fn fetch_coalesced(&self, request: &mut Request, url: &url::Url, domain: &str) -> Result<Response> {
        let fingerprint = self.cache.fingerprint(request.method, &request.url, &request.headers);

        let existing_receiver = {
            let mut in_flight = self.in_flight_fetches.lock().await;
            if let Some(sender) = in_flight.get(&fingerprint) {
                Some(sender.subscribe())
            } else {
                let (sender, _) = broadcast::channel(1);
                in_flight.insert(fingerprint.clone(), sender);
                None
            }
        };

        if let Some(mut receiver) = existing_receiver {
            return match receiver.recv().await {
                Ok(result) => result,
                // The leader's channel closed (panicked) or we lagged behind its
                // single broadcast slot; fetch ourselves rather than hang.
                Err(broadcast::error::RecvError::Closed | broadcast::error::RecvError::Lagged(_)) => {
                    self.fetch_from_network(request, url, domain).await
                }
            };
        }

        let result = self.fetch_from_network(request, url, domain).await;
        if let Some(sender) = self.in_flight_fetches.lock().await.remove(&fingerprint) {
            let _ = sender.send(result.clone());
        }
        result
    }

    fn response_from_cache_entry(&self, domain: &str, entry: aperture_cache::CacheEntry) -> Result<Response> {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        let mut headers = entry.headers.clone();
        let body = String::from_utf8_lossy(&entry.body).into_owned();
        let (_, outcome) = self
            .shield
            .read()
            .unwrap()
            .inspect_response(domain, None, &[], &body, &mut headers)?;
        let (status, body) = match outcome {
            aperture_shield::ScanOutcome::Blocked => {
                (Status::Forbidden, self.shield.read().unwrap().block_page_body().as_bytes().to_vec())
            }
            aperture_shield::ScanOutcome::Passed => (entry.status, entry.body.clone()),
        };
        Ok(Response { status: Some(status), headers, body, from_cache: true, error_after_headers: false, blocked: false })
    }

    /// Dispatch a background conditional GET for a stale entry (§4.7.1,
    /// boundary scenario #2: "within 5s, a background revalidation fires,
    /// receiving 304"). Runs detached on cloned `Arc` handles to the cache and
    /// connection manager rather than requiring `Arc<Engine>` for the whole
    /// engine, since those are the only two subsystems a revalidation touches.
    fn spawn_revalidation(&self, request: &Request, url: &url::Url, domain: &str, stale: &CacheEntry) {
        let cache = Arc::clone(&self.cache);
        let connections = Arc::clone(&self.connections);
        let method = request.method;
        let request_url = request.url.clone();

        let mut conditional_headers = request.headers.clone();
        if let Some(etag) = &stale.etag {
            if let Ok(value) = HeaderValue::new(etag.as_bytes().to_vec()) {
                conditional_headers.append(HeaderName::Known(KnownHeaderName::IfNoneMatch), value);
            }
        }
        if let Some(last_modified) = &stale.last_modified {
            if let Ok(value) = HeaderValue::new(last_modified.as_bytes().to_vec()) {
                conditional_headers.append(HeaderName::Known(KnownHeaderName::IfModifiedSince), value);
            }
        }

        let scheme = if url.scheme() == "https" { TransportScheme::Https } else { TransportScheme::Http };
        let default_port = if scheme == TransportScheme::Https { 443 } else { 80 };
        let authority = format!("{}:{}", domain, url.port().unwrap_or(default_port));
        let target = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };

        tokio::spawn(async move {
            let outcome = connections.send(scheme, &authority, method, &target, &conditional_headers, None).await;
            match outcome {
                Ok(response) if response.status == Status::NotModified => {
                    cache.revalidate_not_modified(method, &request_url, &conditional_headers, &response.headers);
                }
                Ok(response) => {
                    log::debug!(
                        "revalidation of {request_url} returned {:?} instead of 304; stale entry left as-is",
                        response.status
                    );
                }
                Err(e) => log::debug!("background revalidation of {request_url} failed: {e}"),
            }
        });
    }

    async fn fetch_from_network(&self, request: &mut Request, url: &url::Url, domain: &str) -> Result<Response> {
        let scheme = if url.scheme() == "https" { TransportScheme::Https } else { TransportScheme::Http };
        let default_port = if scheme == TransportScheme::Https { 443 } else { 80 };
        let authority = format!("{}:{}", domain, url.port().unwrap_or(default_port));
        let target = if url.query().is_some() {
            format!("{}?{}", url.path(), url.query().unwrap())
        } else {
            url.path().to_string()
        };

        if self.dns.lock().await.lookup(domain, RecordType::A).is_none() {
            self.dns
                .lock()
                .await
                .resolve_now(domain, RecordType::A)
                .await
                .map_err(|e| Error::Network(e.to_string()))?;
        }

        self.in_flight.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let fetch_future = self.connections.send(
            scheme,
            &authority,
            request.method,
            &target,
            &request.headers,
            request.body.as_deref(),
        );

        let outcome = tokio::select! {
            result = tokio::time::timeout(self.total_timeout, fetch_future) => {
                match result {
                    Ok(inner) => inner.map_err(Error::from),
                    Err(_) => Err(Error::Timeout(TimeoutPhase::Total)),
                }
            }
            _ = request.cancellation.cancelled() => Err(Error::Cancelled),
        };

        self.in_flight.fetch_sub(1, Ordering::Relaxed);

        let negotiated = match outcome {
            Ok(negotiated) => negotiated,
            Err(e) => {
                self.cache_misses.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        let rtt = started.elapsed();
        self.origin_rtt.write().unwrap().insert(authority.clone(), rtt);
        self.connections.record_performance_sample(
            &authority,
            aperture_client::PerformanceSample { rtt, ..Default::default() },
        );
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let mut headers = negotiated.headers;
        let mut body = self.maybe_decompress(&headers, negotiated.body).await?;

        let set_cookie_values: Vec<String> = headers
            .get_all(&HeaderName::Known(KnownHeaderName::SetCookie))
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        let body_text = String::from_utf8_lossy(&body).into_owned();
        let (rewritten_cookies, outcome) =
            self.shield.read().unwrap().inspect_response(domain, None, &set_cookie_values, &body_text, &mut headers)?;

        let (status, body) = match outcome {
            aperture_shield::ScanOutcome::Blocked => {
                (Status::Forbidden, self.shield.read().unwrap().block_page_body().as_bytes().to_vec())
            }
            aperture_shield::ScanOutcome::Passed => (negotiated.status, body),
        };

        if !rewritten_cookies.is_empty() {
            headers.remove(&HeaderName::Known(KnownHeaderName::SetCookie));
            for cookie in &rewritten_cookies {
                if let Ok(value) = HeaderValue::new(cookie.as_bytes().to_vec()) {
                    headers.append(HeaderName::Known(KnownHeaderName::SetCookie), value);
                }
            }
        }

        if matches!(request.method, Method::Get | Method::Head) {
            if let Err(e) =
                self.cache.put(request.method, &request.url, &request.headers, headers.clone(), status, body.clone())
            {
                log::debug!("not caching {}: {e}", request.url);
            }
        }

        Ok(Response { status: Some(status), headers, body, from_cache: false, error_after_headers: false, blocked: false })
    }

    async fn maybe_decompress(&self, headers: &HeaderStore<'static>, body: Vec<u8>) -> Result<Vec<u8>> {
        let Some(encoding) = headers.get(&HeaderName::Known(KnownHeaderName::ContentEncoding)) else {
            return Ok(body);
        };
        let Some(label) = encoding.as_str() else { return Ok(body) };
        let algorithm = match label {
            "gzip" => aperture_codec::CompressionAlgorithm::Gzip,
            "br" => aperture_codec::CompressionAlgorithm::Brotli,
            "zstd" => aperture_codec::CompressionAlgorithm::Zstd,
            _ => return Ok(body),
        };
        const DECOMPRESSION_BOMB_CAP: usize = 64 * 1024 * 1024;
        aperture_codec::decompress(algorithm, &body, DECOMPRESSION_BOMB_CAP).await.map_err(Error::from)
    }

    /// Cancel an in-flight request (§5: cooperative — the network layer
    /// notices on its next suspension point).
    pub fn cancel(&self, request_id: RequestId) {
        if let Some(token) = self.cancellations.read().unwrap().get(&request_id) {
            token.cancel();
        }
    }

    /// Warm DNS resolution for `origin`'s host ahead of an anticipated fetch.
    /// Does not open a pooled connection: `aperture-client`'s
    /// `ConnectionManager` only exposes connection establishment as part of
    /// `send_h1`'s acquire-or-open path, not as a standalone call (see
    /// `DESIGN.md`).
    pub async fn preconnect(&self, origin: &str) -> Result<()> {
        let host = url::Url::parse(origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| origin.to_string());
        self.dns.lock().await.resolve_now(&host, RecordType::A).await.map_err(|e| Error::Network(e.to_string()))
    }

    /// Register `url` with the prefetch/priority planner. If
    /// `preconnect_only`, only DNS/connection warm-up is performed (via
    /// [`Engine::preconnect`]); otherwise the resource is added to the
    /// planner's dependency graph (with its band defaulted from
    /// `resource_type`) for a subsequent `plan()` call to order alongside the
    /// page's other resources.
    pub async fn prefetch(
        &self,
        url: &str,
        resource_type: aperture_planner::ResourceType,
        preconnect_only: bool,
    ) -> Result<()> {
        if preconnect_only {
            return self.preconnect(url).await;
        }
        let resource = Resource::new(url.to_string(), resource_type);
        let mut planner = self.planner.lock().await;
        planner.add_resource(resource).map_err(Error::from)
    }

    /// The planner's current prefetch task ordering (critical path marked,
    /// bands and weights recomputed).
    pub async fn plan(&self) -> Vec<PrefetchTask> {
        let mut planner = self.planner.lock().await;
        planner.mark_critical_path();
        planner.recompute();
        planner.plan()
    }

    /// Parse `bytes` into a DOM, per §6's `parse_html(bytes, encoding_hint)`.
    pub fn parse_html(&self, bytes: &[u8], encoding_hint: Option<&str>) -> (aperture_html::Document, Vec<aperture_html::ParseError>) {
        aperture_html::parse_html(bytes, encoding_hint)
    }

    /// Run a CSS-subset query against `doc`, per §6's `query(doc, selector)`.
    pub fn query(
        &self,
        doc: &aperture_html::Document,
        root: aperture_html::NodeId,
        selector: &str,
    ) -> Result<Vec<aperture_html::NodeId>> {
        aperture_html::query_selector_all(doc, root, selector).map_err(|e| Error::InvalidInput(e.to_string()))
    }

    /// Exempt `domain` from every security-shield rule category.
    pub fn add_policy_exception(&self, domain: impl Into<String>) {
        self.shield.write().unwrap().add_policy_exception(domain);
    }

    /// Set the security shield's fallback security level.
    pub fn set_security_level(&self, level: SecurityLevel) {
        self.shield.write().unwrap().set_security_level(level);
    }

    /// Register (or replace) an explicit per-domain security policy.
    pub fn set_domain_policy(&self, domain: impl Into<String>, policy: DomainPolicy) {
        self.shield.write().unwrap().set_domain_policy(domain, policy);
    }

    /// A point-in-time snapshot of cache/pool/prefetch/RTT statistics.
    pub async fn stats(&self) -> Snapshot {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        Snapshot {
            cache_hit_ratio: if total == 0 { 0.0 } else { hits as f64 / total as f64 },
            cache_hits: hits,
            cache_misses: misses,
            requests_in_flight: self.in_flight.load(Ordering::Relaxed),
            prefetch_queue_len: self.dns.lock().await.queue_len(),
            origin_rtt: self.origin_rtt.read().unwrap().clone(),
        }
    }
}

