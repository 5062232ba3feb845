//! TLS-wrapped transport with ALPN negotiation (§4.5's "ALPN selection").
//!
//! Grounded on the teacher's `client/src/rustls_transport.rs`: native system
//! certs with a webpki-roots fallback, an enum wrapping either the bare TCP
//! stream or the TLS stream so a single type satisfies [`Transport`] regardless
//! of whether the handshake happened. Ported from `async-tls`/`futures-lite` to
//! `tokio-rustls`/`tokio`, matching this workspace's runtime per the codec and
//! DNS crates.

use crate::error::{Error, Result};
use crate::transport::{Connector, TcpConnector, Transport};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_rustls::{client::TlsStream, TlsConnector};

/// Either a bare TCP stream (plaintext, pre-ALPN negotiation never happened) or a
/// completed TLS stream, unified so the pool and H1/H2 transports don't need to
/// know which one they hold.
pub enum MaybeTls<T> {
    /// No TLS handshake occurred; used for `http://` origins.
    Plain(T),
    /// A completed TLS handshake, with its negotiated ALPN protocol inspectable
    /// via [`MaybeTls::alpn_protocol`].
    Tls(Box<TlsStream<T>>),
}

impl<T> MaybeTls<T> {
    /// The ALPN protocol the peer selected during the handshake, if any.
    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        match self {
            MaybeTls::Plain(_) => None,
            MaybeTls::Tls(stream) => stream.get_ref().1.alpn_protocol(),
        }
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for MaybeTls<T> {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(t) => Pin::new(t).poll_read(cx, buf),
            MaybeTls::Tls(t) => Pin::new(t).poll_read(cx, buf),
        }
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for MaybeTls<T> {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            MaybeTls::Plain(t) => Pin::new(t).poll_write(cx, buf),
            MaybeTls::Tls(t) => Pin::new(t).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(t) => Pin::new(t).poll_flush(cx),
            MaybeTls::Tls(t) => Pin::new(t).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            MaybeTls::Plain(t) => Pin::new(t).poll_shutdown(cx),
            MaybeTls::Tls(t) => Pin::new(t).poll_shutdown(cx),
        }
    }
}

impl<T: Transport> Transport for MaybeTls<T> {
    fn peer_addr(&self) -> Result<SocketAddr> {
        match self {
            MaybeTls::Plain(t) => t.peer_addr(),
            MaybeTls::Tls(t) => t.get_ref().0.peer_addr(),
        }
    }
}

/// Builds the system trust store once, falling back to `webpki-roots` if native
/// cert loading fails outright — same fallback the teacher's `RustlsConfig`
/// default uses.
pub(crate) fn default_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            for cert in certs.certs {
                let _ = root_store.add(cert);
            }
            if !certs.errors.is_empty() {
                log::warn!("rustls native certs loaded with soft errors: {:?}", certs.errors);
            }
        }
        Err(e) => {
            log::warn!("rustls native certs hard error, falling back to webpki roots: {e}");
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
    }
    root_store
}

/// Connector that performs TCP connect, then a TLS handshake offering `alpn`
/// protocols in preference order (§4.5: try H2 ALPN id `h2` before falling back
/// to `http/1.1`).
#[derive(Debug, Clone)]
pub struct TlsConnectorWrapper<C> {
    inner: C,
    tls_config: Arc<ClientConfig>,
}

impl TlsConnectorWrapper<TcpConnector> {
    /// A TLS connector over plain TCP, offering `alpn_protocols` in order.
    pub fn new(alpn_protocols: Vec<Vec<u8>>) -> Self {
        let mut config = ClientConfig::builder()
            .with_root_certificates(default_root_store())
            .with_no_client_auth();
        config.alpn_protocols = alpn_protocols;
        Self { inner: TcpConnector::default(), tls_config: Arc::new(config) }
    }
}

#[async_trait::async_trait]
impl<C: Connector> Connector for TlsConnectorWrapper<C> {
    type Output = MaybeTls<C::Output>;

    async fn connect(&self, authority: &str) -> Result<Self::Output> {
        let tcp = self.inner.connect(authority).await?;
        let host = authority.rsplit_once(':').map(|(h, _)| h).unwrap_or(authority);
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| Error::Tls(format!("invalid DNS name: {host}")))?;
        let connector = TlsConnector::from(Arc::clone(&self.tls_config));
        let stream = connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| Error::Tls(e.to_string()))?;
        Ok(MaybeTls::Tls(Box::new(stream)))
    }
}

/// ALPN protocol ids in the order §4.5 prefers them, given whether the origin is
/// known (via Alt-Svc hints or config) to support H3.
pub fn alpn_preference_list(h3_known: bool) -> Vec<Vec<u8>> {
    let mut protocols = Vec::new();
    if h3_known {
        protocols.push(b"h3".to_vec());
    }
    protocols.push(b"h2".to_vec());
    protocols.push(b"http/1.1".to_vec());
    protocols
}
