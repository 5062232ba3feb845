//! A minimal raw-TCP HTTP/1.1 server for engine integration tests, grounded
//! on the teacher's own `tokio/tests/tests.rs` pattern of binding a real
//! listener to port 0 rather than mocking the transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Mutex};

/// Serves canned responses off a queue, one per accepted connection; once the
/// queue is down to its last entry, that entry keeps being served (so a test
/// doesn't need to know exactly how many connections it will see).
pub struct TestServer {
    addr: std::net::SocketAddr,
    request_count: Arc<AtomicUsize>,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    pub async fn start(responses: Vec<Vec<u8>>) -> Self {
        assert!(!responses.is_empty(), "test server needs at least one canned response");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("local_addr");
        let request_count = Arc::new(AtomicUsize::new(0));
        let responses = Arc::new(Mutex::new(responses));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let count = Arc::clone(&request_count);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { break };
                        tokio::spawn(handle_connection(stream, Arc::clone(&count), Arc::clone(&responses)));
                    }
                }
            }
        });

        Self { addr, request_count, _shutdown: shutdown_tx }
    }

    pub fn authority(&self) -> String {
        self.addr.to_string()
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

async fn handle_connection(mut stream: TcpStream, count: Arc<AtomicUsize>, responses: Arc<Mutex<Vec<Vec<u8>>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..read]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    count.fetch_add(1, Ordering::SeqCst);

    let response = {
        let mut responses = responses.lock().await;
        if responses.len() > 1 {
            responses.remove(0)
        } else {
            responses[0].clone()
        }
    };
    let _ = stream.write_all(&response).await;
    let _ = stream.shutdown().await;
}

/// Build a minimal HTTP/1.1 response, `Content-Length`-framed, closing the
/// connection after it's sent.
pub fn canned_response(status: u16, reason: &str, extra_headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut head = format!("HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n", body.len());
    for (name, value) in extra_headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let mut out = head.into_bytes();
    out.extend_from_slice(body);
    out
}
