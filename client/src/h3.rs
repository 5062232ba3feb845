//! HTTP/3 transport (§4.5 "H3 transport"): runs over QUIC via `quinn`, with
//! QPACK and request framing delegated to the `h3`/`h3-quinn` crates — the same
//! "real ecosystem crate for the protocol engine" choice as `h2.rs`. This module
//! owns ALPN/origin selection, translation to/from `aperture_http` types, and
//! feeding the performance monitor's [`QuicTuning`] into `quinn`'s transport
//! config.

use crate::error::{Error, Result};
use crate::performance::QuicTuning;
use aperture_http::{HeaderName, HeaderStore, HeaderValue, Method, Status};
use quinn::{ClientConfig, Endpoint, TransportConfig};
use std::net::SocketAddr;
use std::sync::Arc;

/// Build a `quinn` transport config from a performance-monitor-derived
/// [`QuicTuning`] (§4.5's per-origin adjustment list).
fn quinn_transport_config(tuning: &QuicTuning) -> TransportConfig {
    let mut config = TransportConfig::default();
    config.max_concurrent_bidi_streams(
        quinn::VarInt::from_u64(tuning.max_concurrent_streams).unwrap_or(quinn::VarInt::from_u32(1)),
    );
    config.initial_rtt(tuning.initial_rtt);
    config.max_idle_timeout(quinn::IdleTimeout::try_from(tuning.idle_timeout).ok());
    config.receive_window(quinn::VarInt::from_u64(tuning.flow_control_window).unwrap_or(quinn::VarInt::MAX));
    config.send_window(tuning.flow_control_window);
    config
}

/// Open a QUIC endpoint and connect to `addr`, offering `h3` via ALPN, tuned per
/// `tuning`.
pub async fn connect(
    endpoint: &Endpoint,
    addr: SocketAddr,
    server_name: &str,
    rustls_config: Arc<rustls::ClientConfig>,
    tuning: &QuicTuning,
) -> Result<h3_quinn::Connection> {
    let mut client_config = ClientConfig::new(Arc::new(
        quinn::crypto::rustls::QuicClientConfig::try_from((*rustls_config).clone())
            .map_err(|e| Error::Tls(e.to_string()))?,
    ));
    client_config.transport_config(Arc::new(quinn_transport_config(tuning)));

    let connecting = endpoint
        .connect_with(client_config, addr, server_name)
        .map_err(|e| Error::Connect(addr.to_string(), std::io::Error::other(e.to_string())))?;
    let connection = connecting.await.map_err(|e| Error::Connect(addr.to_string(), std::io::Error::other(e.to_string())))?;
    Ok(h3_quinn::Connection::new(connection))
}

/// An H3 connection: the `h3` driver task is spawned immediately and the
/// request sender kept for issuing requests (§4.5: "per-request bidirectional
/// stream").
pub struct H3Connection {
    send_request: h3::client::SendRequest<h3_quinn::OpenStreams, bytes::Bytes>,
}

/// Complete the H3/QPACK handshake over an already-established QUIC connection.
pub async fn handshake(quic: h3_quinn::Connection) -> Result<H3Connection> {
    let (mut driver, send_request) =
        h3::client::new(quic).await.map_err(|e| Error::Protocol(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = std::future::poll_fn(|cx| driver.poll_close(cx)).await {
            log::warn!("h3 connection driver exited: {e}");
        }
    });
    Ok(H3Connection { send_request })
}

/// A response received over an H3 stream.
pub struct H3Response {
    /// Response status.
    pub status: Status,
    /// Response headers, translated back into this engine's `HeaderStore`.
    pub headers: HeaderStore<'static>,
    /// Fully collected body bytes.
    pub body: Vec<u8>,
}

impl H3Connection {
    /// Send a request and await the full response on a fresh bidirectional
    /// stream.
    pub async fn send(&mut self, method: Method, uri: &str, headers: &HeaderStore<'_>) -> Result<H3Response> {
        let mut builder = http::Request::builder().method(method.as_str()).uri(uri);
        for (name, value) in headers.iter() {
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        let request = builder.body(()).map_err(|e| Error::Protocol(e.to_string()))?;

        let mut stream = self
            .send_request
            .send_request(request)
            .await
            .map_err(|e| Error::Protocol(e.to_string()))?;
        stream.finish().await.map_err(|e| Error::Protocol(e.to_string()))?;

        let response = stream.recv_response().await.map_err(|e| Error::Protocol(e.to_string()))?;
        let status = Status::from_code(response.status().as_u16())
            .map_err(|_| Error::Protocol(format!("unexpected status {}", response.status())))?;

        let mut headers = HeaderStore::new();
        for (name, value) in response.headers() {
            let header_name = HeaderName::parse(name.as_str()).map_err(|e| Error::Protocol(e.to_string()))?.into_owned();
            let header_value = HeaderValue::new(value.as_bytes().to_vec()).map_err(|e| Error::Protocol(e.to_string()))?;
            headers.append(header_name, header_value);
        }

        let mut body = Vec::new();
        while let Some(chunk) = stream.recv_data().await.map_err(|e| Error::Protocol(e.to_string()))? {
            body.extend_from_slice(chunk.chunk());
        }

        Ok(H3Response { status, headers, body })
    }
}
