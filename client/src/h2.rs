//! HTTP/2 transport (§4.5 "H2 transport"): stream table, HPACK, and
//! per-connection/per-stream flow control are all owned by the `h2` crate rather
//! than hand-rolled — the same "use the ecosystem crate for the protocol engine"
//! choice this workspace already made for DNS (`hickory-resolver`) and
//! compression (`async-compression`). This module only adapts between
//! `aperture_http`'s wire types and the `http`-crate types `h2` speaks, and maps
//! its error surface onto `crate::Error` (`RST_STREAM` -> `StreamReset`, `GOAWAY`
//! draining -> the connection simply stops accepting new requests).

use crate::error::{Error, Result};
use crate::transport::Transport;
use aperture_http::{HeaderName, HeaderStore, HeaderValue, Method, Status};
use bytes::Bytes;
use h2::client::SendRequest;
use http::{Request, Response};

/// One H2 connection: a request sender plus the background task driving the
/// connection's I/O, frame multiplexing, and flow control.
pub struct H2Connection {
    send_request: SendRequest<Bytes>,
}

/// Establish an H2 connection over an already ALPN-negotiated transport.
/// Spawns the connection-driver task (per the `h2` crate's handshake contract:
/// the returned `Connection` future must be polled for any stream to progress).
pub async fn handshake<T: Transport>(io: T) -> Result<H2Connection> {
    let (send_request, connection) =
        h2::client::handshake(io).await.map_err(|e| Error::Protocol(e.to_string()))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::warn!("h2 connection driver exited: {e}");
        }
    });
    Ok(H2Connection { send_request })
}

fn to_http_request(method: Method, uri: &str, headers: &HeaderStore<'_>) -> Result<Request<()>> {
    let mut builder = Request::builder().method(method.as_str()).uri(uri);
    for (name, value) in headers.iter() {
        builder = builder.header(name.as_str(), value.as_bytes());
    }
    builder.body(()).map_err(|e| Error::Protocol(e.to_string()))
}

/// A response received over an H2 stream.
pub struct H2Response {
    /// Response status.
    pub status: Status,
    /// Response headers, translated back into this engine's `HeaderStore`.
    pub headers: HeaderStore<'static>,
    /// Body bytes, collected eagerly. Streaming consumers should read directly
    /// from the `h2` `RecvStream` instead; this is the simple one-shot path used
    /// by cache population and small API responses.
    pub body: Vec<u8>,
}

impl H2Connection {
    /// Send a request (with an optional complete body) and await the full
    /// response. Each call consumes a fresh, odd-numbered client stream ID, as
    /// `h2` allocates internally.
    pub async fn send(
        &mut self,
        method: Method,
        uri: &str,
        headers: &HeaderStore<'_>,
        body: Option<Bytes>,
    ) -> Result<H2Response> {
        let request = to_http_request(method, uri, headers)?;
        let ready = self.send_request.ready().await.map_err(|e| Error::Protocol(e.to_string()))?;
        let (response_fut, mut send_stream) =
            ready.send_request(request, body.is_none()).map_err(|e| Error::Protocol(e.to_string()))?;

        if let Some(body) = body {
            send_stream.send_data(body, true).map_err(|e| Error::Protocol(e.to_string()))?;
        }

        let response: Response<h2::RecvStream> =
            response_fut.await.map_err(map_h2_error)?;
        let status = Status::from_code(response.status().as_u16())
            .map_err(|_| Error::Protocol(format!("unexpected status {}", response.status())))?;

        let mut headers = HeaderStore::new();
        for (name, value) in response.headers() {
            let header_name = HeaderName::parse(name.as_str())
                .map_err(|e| Error::Protocol(e.to_string()))?
                .into_owned();
            let header_value = HeaderValue::new(value.as_bytes().to_vec()).map_err(|e| Error::Protocol(e.to_string()))?;
            headers.append(header_name, header_value);
        }

        let mut body_stream = response.into_body();
        let mut body = Vec::new();
        while let Some(chunk) = body_stream.data().await {
            let chunk = chunk.map_err(map_h2_error)?;
            body_stream.flow_control().release_capacity(chunk.len()).ok();
            body.extend_from_slice(&chunk);
        }

        Ok(H2Response { status, headers, body })
    }
}

fn map_h2_error(e: h2::Error) -> Error {
    if let Some(reason) = e.reason() {
        Error::StreamReset(u32::from(reason))
    } else {
        Error::Protocol(e.to_string())
    }
}
