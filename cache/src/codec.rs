//! Stored-body compression and encryption (§4.7.4).
//!
//! The streaming `aperture-codec` crate covers wire-transfer codecs negotiated
//! via `Content-Encoding`; this module is a one-shot buffer transform applied to
//! bodies already fully read into memory before they're written into the cache,
//! so it reaches for `flate2` (a plain `Read`/`Write` gzip codec) rather than
//! `async-compression`'s stream adapters. `aes-gcm` and `sha2` are not used
//! elsewhere in the teacher's crates but are the standard RustCrypto choices the
//! rest of the example pack reaches for whenever it needs authenticated
//! encryption or a SHA-256 digest (see `DESIGN.md`).

use crate::error::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::io::{Read, Write};

/// Bodies below this size are never compressed — the gzip header/footer
/// overhead would make the result larger (§4.7.4: "gzip for text-like MIME when
/// body > 1 kB").
pub const COMPRESSION_THRESHOLD: usize = 1024;

const NONCE_LEN: usize = 12;

/// Whether `mime` (a `Content-Type` value, parameters already stripped) is
/// text-like and therefore eligible for compression.
pub fn is_text_like(mime: &str) -> bool {
    let mime = mime.trim().to_ascii_lowercase();
    mime.starts_with("text/")
        || mime == "application/json"
        || mime == "application/javascript"
        || mime == "application/xml"
        || mime.ends_with("+json")
        || mime.ends_with("+xml")
        || mime == "image/svg+xml"
}

/// Gzip-compress `body`.
pub fn gzip_compress(body: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body).map_err(Error::Compression)?;
    encoder.finish().map_err(Error::Compression)
}

/// Reverse [`gzip_compress`].
pub fn gzip_decompress(body: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(body);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(Error::Compression)?;
    Ok(out)
}

/// A symmetric key for stored-body encryption.
#[derive(Clone)]
pub struct EncryptionKey([u8; 32]);

impl EncryptionKey {
    /// Wrap a raw 256-bit key.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

/// Encrypt `plaintext` with a fresh random nonce, returning `nonce || ciphertext`.
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher.encrypt(nonce, plaintext).map_err(|e| Error::Crypto(e.to_string()))?;
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Reverse [`encrypt`].
pub fn decrypt(key: &EncryptionKey, data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_LEN {
        return Err(Error::Crypto("ciphertext shorter than the nonce".to_string()));
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| Error::Crypto(e.to_string()))
}

/// SHA-256 digest over the stored (post-transform) bytes (§4.7.4: "computed over
/// the stored (post-encryption) bytes").
pub fn integrity_digest(stored_bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(stored_bytes);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_round_trips() {
        let body = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let compressed = gzip_compress(&body).unwrap();
        assert!(compressed.len() < body.len());
        assert_eq!(gzip_decompress(&compressed).unwrap(), body);
    }

    #[test]
    fn encryption_round_trips() {
        let key = EncryptionKey::generate();
        let plaintext = b"cached response body";
        let ciphertext = encrypt(&key, plaintext).unwrap();
        assert_ne!(ciphertext, plaintext);
        assert_eq!(decrypt(&key, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let key = EncryptionKey::generate();
        let mut ciphertext = encrypt(&key, b"payload").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;
        assert!(decrypt(&key, &ciphertext).is_err());
    }

    #[test]
    fn digest_is_deterministic_and_order_sensitive() {
        assert_eq!(integrity_digest(b"abc"), integrity_digest(b"abc"));
        assert_ne!(integrity_digest(b"abc"), integrity_digest(b"abd"));
    }

    #[test]
    fn text_like_mime_detection() {
        assert!(is_text_like("text/html"));
        assert!(is_text_like("application/json; charset=utf-8".split(';').next().unwrap()));
        assert!(is_text_like("image/svg+xml"));
        assert!(!is_text_like("image/png"));
    }
}
