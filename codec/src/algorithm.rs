use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A supported streaming compression algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[non_exhaustive]
pub enum CompressionAlgorithm {
    /// gzip, RFC 1952
    Gzip,
    /// brotli, RFC 7932
    Brotli,
    /// zstd, RFC 8478
    Zstd,
}

impl CompressionAlgorithm {
    /// The token this algorithm is named with in `Accept-Encoding`/`Content-Encoding`.
    pub const fn as_str(self) -> &'static str {
        match self {
            CompressionAlgorithm::Gzip => "gzip",
            CompressionAlgorithm::Brotli => "br",
            CompressionAlgorithm::Zstd => "zstd",
        }
    }

    fn from_token(s: &str) -> Option<Self> {
        match s {
            "gzip" | "x-gzip" => Some(CompressionAlgorithm::Gzip),
            "br" => Some(CompressionAlgorithm::Brotli),
            "zstd" => Some(CompressionAlgorithm::Zstd),
            _ => None,
        }
    }
}

impl Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
            .or_else(|| Self::from_token(&s.to_ascii_lowercase()))
            .ok_or_else(|| format!("unrecognized content coding {s:?}"))
    }
}

/// Brotli's tuning mode, ignored by the other two algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrotliMode {
    /// default, general-purpose tuning
    Generic,
    /// tuned for UTF-8 text such as HTML/CSS/JS
    Text,
    /// tuned for WOFF2 font payloads
    Font,
}

/// Tuning knobs for [`crate::compress`] / [`crate::compress_stream`].
///
/// Mirrors [rfc7231]-adjacent real-world encoder knobs (level, window, worker count)
/// rather than attempting to unify every algorithm's parameter set behind one
/// lowest-common-denominator number.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// 1 (fastest) through 9 (smallest), algorithm-specific scaling applied internally
    pub level: u32,
    /// brotli-only text/font tuning; ignored for gzip and zstd
    pub brotli_mode: BrotliMode,
    /// log2 window size hint, where the algorithm supports one
    pub window_size: Option<u32>,
    /// a preset shared dictionary, where the algorithm supports one
    pub dictionary: Option<Vec<u8>>,
    /// hint for how many worker threads an implementation may use for this stream
    pub worker_count: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            level: 6,
            brotli_mode: BrotliMode::Generic,
            window_size: None,
            dictionary: None,
            worker_count: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_codings() {
        assert_eq!("gzip".parse(), Ok(CompressionAlgorithm::Gzip));
        assert_eq!("GZIP".parse(), Ok(CompressionAlgorithm::Gzip));
        assert_eq!("br".parse(), Ok(CompressionAlgorithm::Brotli));
        assert_eq!("zstd".parse(), Ok(CompressionAlgorithm::Zstd));
    }

    #[test]
    fn rejects_unknown_coding() {
        assert!("deflate".parse::<CompressionAlgorithm>().is_err());
    }
}
