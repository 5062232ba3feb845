/// Errors raised by connection acquisition and the wire transports (§4.5, §7's
/// `Network`/`Protocol` families).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// TCP connect, TLS handshake, or socket I/O failure.
    #[error("connect to {0} failed: {1}")]
    Connect(String, std::io::Error),

    /// The acquisition FIFO's waiter was cancelled before a connection became
    /// available.
    #[error("connection acquisition for {0} was cancelled")]
    AcquireCancelled(String),

    /// `connect_timeout` elapsed before a transport finished connecting.
    #[error("connect to {0} timed out")]
    ConnectTimeout(String),

    /// An H1 head (request or response) exceeded `MAX_HEAD_LENGTH` or was otherwise
    /// malformed.
    #[error("malformed h1 head: {0}")]
    MalformedHead(String),

    /// Peer closed the connection before a full head was received.
    #[error("connection closed by peer")]
    Closed,

    /// An H2/H3 peer reset the stream carrying this request.
    #[error("stream reset (code {0})")]
    StreamReset(u32),

    /// H2/H3 framing or header-compression failure.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// TLS handshake or certificate validation failure.
    #[error("tls error: {0}")]
    Tls(String),

    /// No transport supports any protocol the origin and scheme allow.
    #[error("no usable ALPN protocol for {0}")]
    NoUsableProtocol(String),
}

/// Convenience alias for fallible results in this crate.
pub type Result<T> = std::result::Result<T, Error>;
