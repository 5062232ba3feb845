//! HTTP/1.1 transport: request-line + header encoding, response head parsing,
//! keep-alive detection (§4.5 "H1.1 transport").
//!
//! Grounded on the teacher's `client/src/conn.rs` (`build_head`, `read_head`,
//! `parse_head`, `is_keep_alive`) — same two-phase design (accumulate bytes until
//! the `\r\n\r\n` boundary, then hand the head to `httparse`), generalized off
//! `trillium_http`'s `Headers`/`Method`/`StatusCode` onto this workspace's own
//! `aperture_http` types and ported from `futures-lite` to `tokio`'s `AsyncRead`/
//! `AsyncWrite`.

use crate::error::{Error, Result};
use crate::transport::Transport;
use aperture_http::{HeaderName, HeaderStore, HeaderValue, KnownHeaderName, Method, Status};
use memchr::memmem;
use std::io::Write;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const MAX_HEADERS: usize = 128;
const MAX_HEAD_LENGTH: usize = 8 * 1024;

/// Encode a request line + headers per RFC 9112 §3. `target` is the
/// request-target: origin-form (`path?query`) for ordinary methods, or
/// `host:port` for `CONNECT`.
pub fn encode_head(method: Method, target: &str, headers: &HeaderStore<'_>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    let _ = write!(buf, "{method} {target} HTTP/1.1\r\n");
    for (name, value) in headers.iter() {
        let _ = write!(buf, "{name}: ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(b"\r\n");
    buf
}

/// A parsed response head: status line plus headers, and any body bytes that
/// were read past the head boundary in the same syscall.
pub struct ResponseHead {
    /// Response status code.
    pub status: Status,
    /// Response headers, in wire order.
    pub headers: HeaderStore<'static>,
    /// Bytes already read past the `\r\n\r\n` boundary — the start of the body.
    pub leftover: Vec<u8>,
}

/// Send a request head (and optional body) over an already-connected transport.
pub async fn send_request<T: Transport>(
    transport: &mut T,
    method: Method,
    target: &str,
    headers: &HeaderStore<'_>,
    body: Option<&[u8]>,
) -> Result<()> {
    let head = encode_head(method, target, headers);
    transport.write_all(&head).await.map_err(|e| Error::Connect(target.to_string(), e))?;
    if let Some(body) = body {
        transport.write_all(body).await.map_err(|e| Error::Connect(target.to_string(), e))?;
    }
    transport.flush().await.map_err(|e| Error::Connect(target.to_string(), e))?;
    Ok(())
}

/// Read and parse a response head, buffering until the `\r\n\r\n` boundary or
/// failing once `MAX_HEAD_LENGTH` is exceeded (§7: "H1 line too long").
pub async fn read_response_head<T: Transport>(transport: &mut T) -> Result<ResponseHead> {
    let mut buf = Vec::new();
    let mut len = 0usize;

    let split_at = loop {
        buf.resize(len + 512, 0);
        let bytes = transport.read(&mut buf[len..]).await.map_err(|e| Error::Connect("h1".into(), e))?;
        if bytes == 0 {
            if len == 0 {
                return Err(Error::Closed);
            }
            return Err(Error::MalformedHead("connection closed mid-head".into()));
        }
        len += bytes;
        buf.truncate(len);

        let search_start = len.saturating_sub(bytes + 3);
        if let Some(pos) = memmem::find(&buf[search_start..], b"\r\n\r\n") {
            break search_start + pos + 4;
        }
        if len >= MAX_HEAD_LENGTH {
            return Err(Error::MalformedHead("response head too long".into()));
        }
    };

    let leftover = buf.split_off(split_at);
    let mut header_slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut response = httparse::Response::new(&mut header_slots);
    let parsed = response.parse(&buf).map_err(|e| Error::MalformedHead(e.to_string()))?;
    if parsed.is_partial() {
        return Err(Error::MalformedHead("truncated status line".into()));
    }

    let code = response.code.ok_or_else(|| Error::MalformedHead("missing status code".into()))?;
    let status = Status::from_code(code).map_err(|_| Error::MalformedHead(format!("unknown status {code}")))?;

    let mut headers = HeaderStore::new();
    for header in response.headers.iter() {
        let name = HeaderName::parse(header.name).map_err(|e| Error::MalformedHead(e.to_string()))?.into_owned();
        let value = HeaderValue::new(header.value.to_vec()).map_err(|e| Error::MalformedHead(e.to_string()))?;
        headers.append(name, value);
    }

    Ok(ResponseHead { status, headers, leftover })
}

/// Whether the response (and thus the connection) should be kept alive, per
/// §4.5: "Supports keep-alive unless `Connection: close` is sent or received."
pub fn is_keep_alive(headers: &HeaderStore<'_>) -> bool {
    match headers.get(&HeaderName::Known(KnownHeaderName::Connection)) {
        Some(value) => !value.as_str().unwrap_or_default().eq_ignore_ascii_case("close"),
        None => true,
    }
}

/// Read the rest of the response body following `head`, per RFC 9112 §6:
/// `Transfer-Encoding: chunked` takes priority over `Content-Length`, and
/// `head.leftover` already holds whatever body bytes arrived in the same
/// read as the head boundary.
pub async fn read_response_body<T: Transport>(transport: &mut T, head: &ResponseHead) -> Result<Vec<u8>> {
    if is_chunked(&head.headers) {
        return read_chunked_body(transport, &head.leftover).await;
    }
    if let Some(len) = content_length(&head.headers) {
        return read_fixed_length_body(transport, &head.leftover, len).await;
    }
    Ok(head.leftover.clone())
}

fn is_chunked(headers: &HeaderStore<'_>) -> bool {
    headers
        .get(&HeaderName::Known(KnownHeaderName::TransferEncoding))
        .and_then(|v| v.as_str())
        .map(|v| v.split(',').any(|token| token.trim().eq_ignore_ascii_case("chunked")))
        .unwrap_or(false)
}

fn content_length(headers: &HeaderStore<'_>) -> Option<usize> {
    headers
        .get(&HeaderName::Known(KnownHeaderName::ContentLength))
        .and_then(|v| v.as_str())
        .and_then(|v| v.trim().parse().ok())
}

async fn read_fixed_length_body<T: Transport>(transport: &mut T, leftover: &[u8], content_length: usize) -> Result<Vec<u8>> {
    let mut body = leftover.to_vec();
    if body.len() >= content_length {
        body.truncate(content_length);
        return Ok(body);
    }
    body.reserve(content_length - body.len());
    while body.len() < content_length {
        let mut chunk = [0u8; 8192];
        let read = transport.read(&mut chunk).await.map_err(|e| Error::Connect("h1 body".into(), e))?;
        if read == 0 {
            return Err(Error::MalformedHead("connection closed before Content-Length bytes were read".into()));
        }
        let remaining = content_length - body.len();
        body.extend_from_slice(&chunk[..read.min(remaining)]);
    }
    Ok(body)
}

/// Decode a `Transfer-Encoding: chunked` body (RFC 9112 §7.1): `size\r\n` +
/// `size` bytes + `\r\n`, repeated until a zero-size chunk, then a final
/// CRLF (or trailer headers terminated by one).
async fn read_chunked_body<T: Transport>(transport: &mut T, leftover: &[u8]) -> Result<Vec<u8>> {
    let mut buf = leftover.to_vec();
    let mut body = Vec::new();
    loop {
        let size_line_end = loop {
            if let Some(pos) = memmem::find(&buf, b"\r\n") {
                break pos;
            }
            fill_more(transport, &mut buf).await?;
        };
        let size_line = std::str::from_utf8(&buf[..size_line_end])
            .map_err(|_| Error::MalformedHead("invalid chunk size line".into()))?;
        let size_str = size_line.split(';').next().unwrap_or(size_line).trim();
        let chunk_size = usize::from_str_radix(size_str, 16)
            .map_err(|_| Error::MalformedHead(format!("invalid chunk size {size_str:?}")))?;
        buf.drain(..size_line_end + 2);

        if chunk_size == 0 {
            loop {
                if let Some(pos) = memmem::find(&buf, b"\r\n\r\n") {
                    buf.drain(..pos + 4);
                    break;
                }
                if buf.starts_with(b"\r\n") {
                    buf.drain(..2);
                    break;
                }
                fill_more(transport, &mut buf).await?;
            }
            break;
        }

        while buf.len() < chunk_size + 2 {
            fill_more(transport, &mut buf).await?;
        }
        body.extend_from_slice(&buf[..chunk_size]);
        buf.drain(..chunk_size + 2);
    }
    Ok(body)
}

async fn fill_more<T: Transport>(transport: &mut T, buf: &mut Vec<u8>) -> Result<()> {
    let mut chunk = [0u8; 4096];
    let read = transport.read(&mut chunk).await.map_err(|e| Error::Connect("h1 body".into(), e))?;
    if read == 0 {
        return Err(Error::MalformedHead("connection closed mid-chunk".into()));
    }
    buf.extend_from_slice(&chunk[..read]);
    Ok(())
}
