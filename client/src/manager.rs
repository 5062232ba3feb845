//! Ties the pool, ALPN selection, and the three transports together (§4.5).
//!
//! Grounded on the teacher's `client/src/conn.rs::connect_and_send_head`
//! acquire-or-open pattern, generalized from "always H1.1" to the full
//! H3-then-H2-then-H1.1 ALPN preference chain, and from a single `Pool<K,V>`
//! slot type to an enum covering all three transports.

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::h1::{self, ResponseHead};
use crate::key::{ConnectionKey, TransportScheme};
use crate::performance::{PerformanceMonitor, PerformanceSample, QuicTuning};
use crate::pool::{Pool, Slot};
use crate::tls::{alpn_preference_list, MaybeTls, TlsConnectorWrapper};
use crate::transport::{Connector, TcpConnector, Transport};
use aperture_http::{HeaderStore, Method, Status, Version};
use dashmap::DashMap;
use std::sync::Arc;

#[cfg(feature = "h2")]
use crate::h2::H2Connection;
#[cfg(feature = "h3")]
use crate::h3::H3Connection;

/// An H1.1 connection checked out of the pool — the only transport kind this
/// manager currently owns end-to-end (H2/H3 requests go through [`crate::h2`]/
/// [`crate::h3`] directly once a connection is established; see
/// `DESIGN.md` for why those two stop short of full pool integration here).
pub type H1Transport = MaybeTls<tokio::net::TcpStream>;

/// Tracks, per origin, whether the peer is known to support H3 (from a prior
/// `Alt-Svc` hint) — §4.5's "ALPN selection" input.
#[derive(Default)]
pub struct AltSvcCache {
    known_h3: DashMap<String, bool>,
}

impl AltSvcCache {
    /// A fresh, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `authority` advertised H3 support via `Alt-Svc`.
    pub fn record_h3(&self, authority: impl Into<String>) {
        self.known_h3.insert(authority.into(), true);
    }

    /// Whether `authority` is known to support H3.
    pub fn supports_h3(&self, authority: &str) -> bool {
        self.known_h3.get(authority).map(|v| *v).unwrap_or(false)
    }
}

/// Owns the connection pool, per-origin Alt-Svc hints, and per-origin
/// performance monitors. One instance is shared across every request this
/// engine issues.
pub struct ConnectionManager {
    pool: Pool<H1Transport>,
    alt_svc: Arc<AltSvcCache>,
    performance: DashMap<String, PerformanceMonitor>,
    #[cfg(feature = "h2")]
    h2_pool: DashMap<String, Arc<tokio::sync::Mutex<H2Connection>>>,
    #[cfg(feature = "h3")]
    h3_pool: DashMap<String, Arc<tokio::sync::Mutex<H3Connection>>>,
    #[cfg(feature = "h3")]
    h3_endpoint: std::sync::OnceLock<quinn::Endpoint>,
}

/// The result of acquiring a connection and sending one H1.1 request on it.
pub struct H1Exchange {
    /// The parsed response head.
    pub head: ResponseHead,
    /// The complete response body, read per `Content-Length` or
    /// `Transfer-Encoding: chunked` framing (§4.5).
    pub body: Vec<u8>,
    /// Whether the connection may be returned to the pool afterward.
    pub keep_alive: bool,
    /// The key this connection was pooled (or will be pooled) under — callers
    /// must call [`ConnectionManager::release`] or
    /// [`ConnectionManager::discard`] with it exactly once.
    pub key: ConnectionKey,
}

/// A response received over whichever transport [`ConnectionManager::send`]
/// ultimately negotiated (§4.5's ALPN selection, unified across H1.1/H2/H3).
pub struct NegotiatedResponse {
    /// Response status.
    pub status: Status,
    /// Response headers.
    pub headers: HeaderStore<'static>,
    /// Fully collected response body.
    pub body: Vec<u8>,
    /// Which protocol actually served this request.
    pub version: Version,
}

impl ConnectionManager {
    /// A new manager with default pool tuning.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            pool: Pool::new(config),
            alt_svc: Arc::new(AltSvcCache::new()),
            performance: DashMap::new(),
            #[cfg(feature = "h2")]
            h2_pool: DashMap::new(),
            #[cfg(feature = "h3")]
            h3_pool: DashMap::new(),
            #[cfg(feature = "h3")]
            h3_endpoint: std::sync::OnceLock::new(),
        }
    }

    /// Shared Alt-Svc hint cache, so the security/cache layers can feed it
    /// observed `Alt-Svc` response headers.
    pub fn alt_svc(&self) -> Arc<AltSvcCache> {
        Arc::clone(&self.alt_svc)
    }

    /// Record a fresh network-condition measurement for `authority` (§4.5's
    /// performance monitor inputs).
    pub fn record_performance_sample(&self, authority: &str, sample: PerformanceSample) {
        self.performance.entry(authority.to_string()).or_insert_with(PerformanceMonitor::new).sample(sample);
    }

    /// The QUIC tuning `authority`'s latest sample resolves to, falling back to
    /// the `Balanced` profile's defaults if no sample has been recorded yet.
    pub fn quic_tuning(&self, authority: &str) -> QuicTuning {
        self.performance.get(authority).map(|m| m.tuning()).unwrap_or_else(|| PerformanceMonitor::new().tuning())
    }

    /// Decide which ALPN protocol to pursue for `authority` under `scheme`, per
    /// §4.5's "try H3 ... else H2 ... else H1.1; non-TLS origins use H1.1 only".
    fn alpn_plan(&self, scheme: TransportScheme, authority: &str) -> Vec<Version> {
        match scheme {
            TransportScheme::Http => vec![Version::Http11],
            TransportScheme::Https if self.alt_svc.supports_h3(authority) => {
                vec![Version::Http3, Version::Http2, Version::Http11]
            }
            TransportScheme::Https => vec![Version::Http2, Version::Http11],
        }
    }

    /// Issue one H1.1 request to `authority`, reusing a pooled connection when
    /// possible. H2/H3 negotiation happens above this call (the cache/planner
    /// layer picks the transport once ALPN is known); this method is the H1.1
    /// fallback path and the one every origin starts on before any ALPN result
    /// is cached.
    pub async fn send_h1(
        &self,
        scheme: TransportScheme,
        authority: &str,
        method: Method,
        target: &str,
        headers: &HeaderStore<'_>,
        body: Option<&[u8]>,
    ) -> Result<H1Exchange> {
        let key = ConnectionKey::new(scheme, authority, Version::Http11);
        let slot = self.pool.acquire(&key).await?;

        let mut transport = match slot {
            Slot::Reused(t) => t,
            Slot::Permit => match self.open(scheme, authority).await {
                Ok(t) => t,
                Err(e) => {
                    self.pool.drop_connection(&key);
                    return Err(e);
                }
            },
        };

        match h1::send_request(&mut transport, method, target, headers, body).await {
            Ok(()) => {}
            Err(e) => {
                self.pool.drop_connection(&key);
                return Err(e);
            }
        }

        let head = match h1::read_response_head(&mut transport).await {
            Ok(head) => head,
            Err(e) => {
                self.pool.drop_connection(&key);
                return Err(e);
            }
        };

        let body = match h1::read_response_body(&mut transport, &head).await {
            Ok(body) => body,
            Err(e) => {
                self.pool.drop_connection(&key);
                return Err(e);
            }
        };

        let keep_alive = h1::is_keep_alive(&head.headers);
        if keep_alive {
            self.pool.release(&key, transport);
        } else {
            self.pool.drop_connection(&key);
        }

        Ok(H1Exchange { head, body, keep_alive, key })
    }

    async fn open(&self, scheme: TransportScheme, authority: &str) -> Result<H1Transport> {
        match scheme {
            TransportScheme::Http => TcpConnector::default().connect(authority).await.map(MaybeTls::Plain),
            TransportScheme::Https => {
                // Offer only `http/1.1`: this path is the fallback every origin starts
                // on (or lands on after `send` exhausts H3/H2), so an ambiguous ALPN
                // offer here would risk negotiating h2 on a connection this manager
                // then drives as H1.1.
                let connector = TlsConnectorWrapper::new(vec![b"http/1.1".to_vec()]);
                connector.connect(authority).await
            }
        }
    }

    /// The ALPN plan, exposed for the engine layer's transport-selection
    /// decision before it dispatches to [`crate::h2`]/[`crate::h3`] directly.
    pub fn plan(&self, scheme: TransportScheme, authority: &str) -> Vec<Version> {
        self.alpn_plan(scheme, authority)
    }

    /// Issue a request over whichever protocol §4.5's ALPN plan prefers for
    /// `authority`, falling back down the chain (H3 -> H2 -> H1.1) on failure.
    pub async fn send(
        &self,
        scheme: TransportScheme,
        authority: &str,
        method: Method,
        target: &str,
        headers: &HeaderStore<'_>,
        body: Option<&[u8]>,
    ) -> Result<NegotiatedResponse> {
        let plan = self.plan(scheme, authority);
        let mut last_err = None;
        for version in plan {
            let attempt = match version {
                Version::Http3 => self.try_send_h3(authority, method, target, headers).await,
                Version::Http2 => self.try_send_h2(authority, method, target, headers, body).await,
                _ => self.try_send_h1(scheme, authority, method, target, headers, body).await,
            };
            match attempt {
                Ok(response) => return Ok(response),
                Err(e) => {
                    log::debug!("{version} attempt to {authority} failed, falling back: {e}");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::NoUsableProtocol(authority.to_string())))
    }

    async fn try_send_h1(
        &self,
        scheme: TransportScheme,
        authority: &str,
        method: Method,
        target: &str,
        headers: &HeaderStore<'_>,
        body: Option<&[u8]>,
    ) -> Result<NegotiatedResponse> {
        let exchange = self.send_h1(scheme, authority, method, target, headers, body).await?;
        Ok(NegotiatedResponse {
            status: exchange.head.status,
            headers: exchange.head.headers,
            body: exchange.body,
            version: Version::Http11,
        })
    }

    #[cfg(feature = "h2")]
    async fn h2_connection(&self, authority: &str) -> Result<Arc<tokio::sync::Mutex<H2Connection>>> {
        if let Some(existing) = self.h2_pool.get(authority) {
            return Ok(Arc::clone(&existing));
        }
        let connector = TlsConnectorWrapper::new(vec![b"h2".to_vec()]);
        let transport = connector.connect(authority).await?;
        if transport.alpn_protocol() != Some(b"h2".as_slice()) {
            return Err(Error::NoUsableProtocol(authority.to_string()));
        }
        let connection = crate::h2::handshake(transport).await?;
        let connection = Arc::new(tokio::sync::Mutex::new(connection));
        self.h2_pool.insert(authority.to_string(), Arc::clone(&connection));
        Ok(connection)
    }

    #[cfg(feature = "h2")]
    async fn try_send_h2(
        &self,
        authority: &str,
        method: Method,
        target: &str,
        headers: &HeaderStore<'_>,
        body: Option<&[u8]>,
    ) -> Result<NegotiatedResponse> {
        let connection = self.h2_connection(authority).await?;
        let uri = format!("https://{authority}{target}");
        let mut guard = connection.lock().await;
        let sent = guard.send(method, &uri, headers, body.map(bytes::Bytes::copy_from_slice)).await;
        drop(guard);
        match sent {
            Ok(response) => Ok(NegotiatedResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
                version: Version::Http2,
            }),
            Err(e) => {
                self.h2_pool.remove(authority);
                Err(e)
            }
        }
    }

    #[cfg(not(feature = "h2"))]
    async fn try_send_h2(
        &self,
        authority: &str,
        _method: Method,
        _target: &str,
        _headers: &HeaderStore<'_>,
        _body: Option<&[u8]>,
    ) -> Result<NegotiatedResponse> {
        Err(Error::NoUsableProtocol(authority.to_string()))
    }

    #[cfg(feature = "h3")]
    fn h3_endpoint(&self) -> Result<quinn::Endpoint> {
        if let Some(endpoint) = self.h3_endpoint.get() {
            return Ok(endpoint.clone());
        }
        let endpoint = quinn::Endpoint::client("[::]:0".parse().unwrap())
            .map_err(|e| Error::Connect("quic endpoint".into(), e))?;
        let _ = self.h3_endpoint.set(endpoint.clone());
        Ok(endpoint)
    }

    #[cfg(feature = "h3")]
    fn h3_client_config() -> Arc<rustls::ClientConfig> {
        let mut config = rustls::ClientConfig::builder()
            .with_root_certificates(crate::tls::default_root_store())
            .with_no_client_auth();
        config.alpn_protocols = vec![b"h3".to_vec()];
        Arc::new(config)
    }

    #[cfg(feature = "h3")]
    async fn h3_connection(&self, authority: &str) -> Result<Arc<tokio::sync::Mutex<H3Connection>>> {
        if let Some(existing) = self.h3_pool.get(authority) {
            return Ok(Arc::clone(&existing));
        }
        let host = authority.rsplit_once(':').map(|(h, _)| h).unwrap_or(authority).to_string();
        let addr = tokio::net::lookup_host(authority)
            .await
            .map_err(|e| Error::Connect(authority.to_string(), e))?
            .next()
            .ok_or_else(|| Error::Connect(authority.to_string(), std::io::Error::other("no addresses resolved")))?;

        let endpoint = self.h3_endpoint()?;
        let tuning = self.quic_tuning(authority);
        let quic = crate::h3::connect(&endpoint, addr, &host, Self::h3_client_config(), &tuning).await?;
        let connection = crate::h3::handshake(quic).await?;
        let connection = Arc::new(tokio::sync::Mutex::new(connection));
        self.h3_pool.insert(authority.to_string(), Arc::clone(&connection));
        Ok(connection)
    }

    #[cfg(feature = "h3")]
    async fn try_send_h3(
        &self,
        authority: &str,
        method: Method,
        target: &str,
        headers: &HeaderStore<'_>,
    ) -> Result<NegotiatedResponse> {
        let connection = self.h3_connection(authority).await?;
        let uri = format!("https://{authority}{target}");
        let mut guard = connection.lock().await;
        let sent = guard.send(method, &uri, headers).await;
        drop(guard);
        match sent {
            Ok(response) => Ok(NegotiatedResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
                version: Version::Http3,
            }),
            Err(e) => {
                self.h3_pool.remove(authority);
                Err(e)
            }
        }
    }

    #[cfg(not(feature = "h3"))]
    async fn try_send_h3(
        &self,
        authority: &str,
        _method: Method,
        _target: &str,
        _headers: &HeaderStore<'_>,
    ) -> Result<NegotiatedResponse> {
        Err(Error::NoUsableProtocol(authority.to_string()))
    }

    /// Periodic maintenance: reap idle connections past `idle_timeout`.
    pub fn reap_idle(&self) {
        self.pool.reap_idle();
    }
}
