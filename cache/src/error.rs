use std::io;

/// Errors produced by the cache (§4.7).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The response carried `Cache-Control: no-store` and was rejected.
    #[error("response is marked no-store")]
    NoStore,

    /// The on-disk journal could not be read or written.
    #[error("journal I/O error at {0}: {1}")]
    Journal(String, #[source] io::Error),

    /// The journal file's contents did not deserialize as a valid snapshot.
    #[error("journal at {0} is corrupt: {1}")]
    CorruptJournal(String, #[source] serde_json::Error),

    /// Encryption or decryption failed (including integrity digest mismatch).
    #[error("{0}")]
    Crypto(String),

    /// Stored body failed to compress or decompress.
    #[error("gzip codec error: {0}")]
    Compression(#[source] io::Error),

    /// A header constructed from stored bytes was malformed.
    #[error(transparent)]
    Header(#[from] aperture_http::Error),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;
