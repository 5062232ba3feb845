//! Streaming gzip/brotli/zstd (de)compression for response and cache-entry bodies.
//!
//! Grounded on the teacher's `compression` crate, which negotiates and applies these
//! same three algorithms for outbound bodies via `async-compression`. This crate
//! drops the teacher's handler/`Accept-Encoding`-negotiation layer (that lives in
//! `aperture-shield` here) and keeps just the codec primitives, generalized to also
//! support decompression and a caller-supplied decompression-bomb cap.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod algorithm;
mod capped;
mod error;

pub use algorithm::{BrotliMode, CompressOptions, CompressionAlgorithm};
pub use error::Error;

use capped::CappedWriter;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

#[cfg(feature = "gzip")]
use async_compression::tokio::bufread::{GzipDecoder, GzipEncoder};

#[cfg(feature = "brotli")]
use async_compression::tokio::bufread::{BrotliDecoder, BrotliEncoder};

#[cfg(feature = "zstd")]
use async_compression::tokio::bufread::{ZstdDecoder, ZstdEncoder};

use async_compression::Level;

fn level(opts: &CompressOptions) -> Level {
    Level::Precise(opts.level.clamp(1, 9) as i32)
}

fn map_io_error(e: io::Error) -> Error {
    match e.into_inner() {
        Some(inner) => match inner.downcast::<Error>() {
            Ok(err) => *err,
            Err(other) => Error::Io(io::Error::new(io::ErrorKind::Other, other)),
        },
        None => match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated("codec"),
            io::ErrorKind::InvalidData => Error::BadFormat("codec"),
            _ => Error::Io(e),
        },
    }
}

/// Compress `input` in one shot and return the compressed bytes.
pub async fn compress(algo: CompressionAlgorithm, input: &[u8], opts: &CompressOptions) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    compress_stream(algo, input, &mut out, opts).await?;
    Ok(out)
}

/// Decompress `input` in one shot, refusing to produce more than `cap` bytes of
/// output.
pub async fn decompress(algo: CompressionAlgorithm, input: &[u8], cap: usize) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    decompress_stream(algo, input, &mut out, cap).await?;
    Ok(out)
}

/// Stream-compress from `reader` into `writer`, returning the number of bytes
/// written.
pub async fn compress_stream<R, W>(
    algo: CompressionAlgorithm,
    reader: R,
    mut writer: W,
    opts: &CompressOptions,
) -> Result<u64, Error>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let buffered = BufReader::new(reader);
    let lvl = level(opts);
    let n = match algo {
        #[cfg(feature = "gzip")]
        CompressionAlgorithm::Gzip => {
            tokio::io::copy(&mut GzipEncoder::with_quality(buffered, lvl), &mut writer)
                .await
                .map_err(map_io_error)?
        }
        #[cfg(feature = "brotli")]
        CompressionAlgorithm::Brotli => {
            tokio::io::copy(&mut BrotliEncoder::with_quality(buffered, lvl), &mut writer)
                .await
                .map_err(map_io_error)?
        }
        #[cfg(feature = "zstd")]
        CompressionAlgorithm::Zstd => {
            tokio::io::copy(&mut ZstdEncoder::with_quality(buffered, lvl), &mut writer)
                .await
                .map_err(map_io_error)?
        }
        #[allow(unreachable_patterns)]
        other => return Err(Error::LibraryError("codec", format!("{other} support not compiled in"))),
    };
    writer.flush().await.map_err(map_io_error)?;
    Ok(n)
}

/// Stream-decompress from `reader` into `writer`, stopping with
/// [`Error::BombLimit`] if more than `cap` bytes would be written.
pub async fn decompress_stream<R, W>(
    algo: CompressionAlgorithm,
    reader: R,
    writer: W,
    cap: usize,
) -> Result<u64, Error>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let buffered = BufReader::new(reader);
    let mut capped = CappedWriter::new(writer, cap);
    let n = match algo {
        #[cfg(feature = "gzip")]
        CompressionAlgorithm::Gzip => tokio::io::copy(&mut GzipDecoder::new(buffered), &mut capped)
            .await
            .map_err(map_io_error)?,
        #[cfg(feature = "brotli")]
        CompressionAlgorithm::Brotli => tokio::io::copy(&mut BrotliDecoder::new(buffered), &mut capped)
            .await
            .map_err(map_io_error)?,
        #[cfg(feature = "zstd")]
        CompressionAlgorithm::Zstd => tokio::io::copy(&mut ZstdDecoder::new(buffered), &mut capped)
            .await
            .map_err(map_io_error)?,
        #[allow(unreachable_patterns)]
        other => return Err(Error::LibraryError("codec", format!("{other} support not compiled in"))),
    };
    capped.flush().await.map_err(map_io_error)?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gzip_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let compressed = compress(CompressionAlgorithm::Gzip, &data, &CompressOptions::default())
            .await
            .unwrap();
        assert!(compressed.len() < data.len());
        let decompressed = decompress(CompressionAlgorithm::Gzip, &compressed, 1 << 20).await.unwrap();
        assert_eq!(decompressed, data);
    }

    #[tokio::test]
    async fn brotli_roundtrip() {
        let data = b"<html><body>hello world</body></html>".repeat(20);
        let compressed = compress(CompressionAlgorithm::Brotli, &data, &CompressOptions::default())
            .await
            .unwrap();
        let decompressed = decompress(CompressionAlgorithm::Brotli, &compressed, 1 << 20).await.unwrap();
        assert_eq!(decompressed, data);
    }

    #[tokio::test]
    async fn zstd_roundtrip() {
        let data = b"zstandard test payload".repeat(30);
        let compressed = compress(CompressionAlgorithm::Zstd, &data, &CompressOptions::default())
            .await
            .unwrap();
        let decompressed = decompress(CompressionAlgorithm::Zstd, &compressed, 1 << 20).await.unwrap();
        assert_eq!(decompressed, data);
    }

    #[tokio::test]
    async fn decompression_bomb_cap_is_enforced() {
        let data = vec![0u8; 1 << 20];
        let compressed = compress(CompressionAlgorithm::Gzip, &data, &CompressOptions::default())
            .await
            .unwrap();
        let result = decompress(CompressionAlgorithm::Gzip, &compressed, 1024).await;
        assert!(matches!(result, Err(Error::BombLimit(1024))));
    }

    #[tokio::test]
    async fn malformed_input_is_bad_format_or_truncated() {
        let garbage = vec![0xffu8; 16];
        let result = decompress(CompressionAlgorithm::Gzip, &garbage, 1 << 20).await;
        assert!(matches!(result, Err(Error::BadFormat(_)) | Err(Error::Truncated(_)) | Err(Error::Io(_))));
    }
}
