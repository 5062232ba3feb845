use thiserror::Error;

/// Failures from compressing or decompressing a body.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// the input was not valid data for the requested algorithm
    #[error("malformed {0} stream")]
    BadFormat(&'static str),

    /// the decoder reached EOF expecting more input (a truncated response body)
    #[error("truncated {0} stream")]
    Truncated(&'static str),

    /// the underlying compression library reported an error
    #[error("{0} error: {1}")]
    LibraryError(&'static str, String),

    /// decompression was stopped after exceeding the caller-supplied output cap,
    /// refusing to keep inflating a possible decompression bomb
    #[error("decompressed output exceeded the {0}-byte cap")]
    BombLimit(usize),

    /// an I/O error from the underlying reader/writer
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
