//! The transport-level connect contract (§4.5).
//!
//! Grounded on the teacher's `client/src/transport.rs` `ClientTransport` trait —
//! `connect(url, config) -> Result<Self>` plus `peer_addr`. Simplified to drop the
//! teacher's `server-common::Connector` type erasure (`Any`-based downcasting):
//! this engine only ever has three concrete transports (H1.1 TCP, TLS-wrapped H1/H2,
//! QUIC for H3), so a plain trait object (`Box<dyn Transport>`) is enough — no
//! erased-config machinery needed.

use crate::error::{Error, Result};
use std::fmt::Debug;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};

/// A byte-stream transport capable of carrying H1.1 or, once TLS-wrapped, H2.
/// H3 runs over QUIC streams instead and does not implement this trait directly
/// (see `crate::h3`).
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    /// The remote address this transport is connected to, for pool logging and
    /// per-request timing records.
    fn peer_addr(&self) -> Result<SocketAddr>;
}

/// Opens transports for one origin. Implementations live in `tcp.rs` (plain TCP)
/// and `tls.rs` (rustls-wrapped TCP with ALPN negotiation).
#[async_trait::async_trait]
pub trait Connector: Debug + Send + Sync + 'static {
    /// Concrete transport this connector produces.
    type Output: Transport;

    /// Open a new connection to `authority` (`host:port`).
    async fn connect(&self, authority: &str) -> Result<Self::Output>;
}

/// Plain TCP connector — the only transport non-TLS (`http://`) origins use
/// (§4.5: "Non-TLS origins use H1.1 only").
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector {
    /// `TCP_NODELAY`, disabling Nagle's algorithm for lower per-request latency.
    pub nodelay: bool,
}

impl Transport for tokio::net::TcpStream {
    fn peer_addr(&self) -> Result<SocketAddr> {
        tokio::net::TcpStream::peer_addr(self).map_err(|e| Error::Connect("tcp".into(), e))
    }
}

#[async_trait::async_trait]
impl Connector for TcpConnector {
    type Output = tokio::net::TcpStream;

    async fn connect(&self, authority: &str) -> Result<Self::Output> {
        let stream = tokio::net::TcpStream::connect(authority)
            .await
            .map_err(|e| Error::Connect(authority.to_string(), e))?;
        if self.nodelay {
            stream.set_nodelay(true).map_err(|e| Error::Connect(authority.to_string(), e))?;
        }
        Ok(stream)
    }
}
