//! Encoding sniffing (§4.9: "input bytes are pre-decoded to a code-point
//! stream using a sniffed encoding (BOM → `<meta charset>` → default UTF-8);
//! declared encoding changes during `<head>` parsing may trigger a one-shot
//! re-decode").

use encoding_rs::{Encoding, UTF_8};

/// Inspect `bytes` for a leading byte-order mark and return the encoding it
/// implies, if any.
fn sniff_bom(bytes: &[u8]) -> Option<&'static Encoding> {
    Encoding::for_bom(bytes).map(|(encoding, _len)| encoding)
}

/// Scan the first `scan_limit` bytes of `bytes` for a `<meta charset="...">`
/// or `<meta http-equiv="Content-Type" content="...; charset=...">`
/// declaration, per the HTML prescan algorithm's byte-oriented search (run
/// before any real parsing, so it operates on raw bytes rather than decoded
/// text).
fn sniff_meta_charset(bytes: &[u8], scan_limit: usize) -> Option<&'static Encoding> {
    let window = &bytes[..bytes.len().min(scan_limit)];
    let lower: Vec<u8> = window.iter().map(|b| b.to_ascii_lowercase()).collect();
    let mut search_from = 0;
    while let Some(rel) = find(&lower[search_from..], b"<meta") {
        let meta_start = search_from + rel;
        let tag_end = find(&lower[meta_start..], b">").map(|e| meta_start + e)?;
        let tag = &window[meta_start..tag_end];
        if let Some(label) = extract_charset_label(tag) {
            if let Some(encoding) = Encoding::for_label(&label) {
                return Some(encoding);
            }
        }
        search_from = tag_end;
    }
    None
}

fn extract_charset_label(tag: &[u8]) -> Option<Vec<u8>> {
    let lower: Vec<u8> = tag.iter().map(|b| b.to_ascii_lowercase()).collect();
    if let Some(pos) = find(&lower, b"charset=") {
        let after = pos + b"charset=".len();
        return Some(extract_attribute_value(tag, after));
    }
    None
}

fn extract_attribute_value(tag: &[u8], start: usize) -> Vec<u8> {
    let rest = &tag[start..];
    let (quote, body) = match rest.first() {
        Some(b'"') => (Some(b'"'), &rest[1..]),
        Some(b'\'') => (Some(b'\''), &rest[1..]),
        _ => (None, rest),
    };
    let end = match quote {
        Some(q) => body.iter().position(|&b| b == q).unwrap_or(body.len()),
        None => body.iter().position(|&b| b.is_ascii_whitespace() || b == b'>' || b == b';').unwrap_or(body.len()),
    };
    body[..end].to_vec()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// The prescan byte window, matching common browser implementations'
/// 1024-byte charset-sniffing limit.
const META_SCAN_LIMIT: usize = 1024;

/// Sniff `bytes`' encoding: BOM first, then a `<meta charset>`-style
/// declaration within the first 1024 bytes, then `hint` (a caller-supplied
/// `Content-Type` charset, if any), finally defaulting to UTF-8.
pub fn sniff(bytes: &[u8], hint: Option<&str>) -> &'static Encoding {
    if let Some(encoding) = sniff_bom(bytes) {
        return encoding;
    }
    if let Some(encoding) = sniff_meta_charset(bytes, META_SCAN_LIMIT) {
        return encoding;
    }
    if let Some(label) = hint {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return encoding;
        }
    }
    UTF_8
}

/// Decode `bytes` with `encoding`, returning the resulting text and whether
/// any byte sequence was replaced with U+FFFD (a malformed-input signal a
/// caller may want to log).
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> (String, bool) {
    let (text, _, had_errors) = encoding.decode(bytes);
    (text.into_owned(), had_errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bom_is_detected() {
        let bytes = [0xEF, 0xBB, 0xBF, b'<', b'h', b't', b'm', b'l', b'>'];
        assert_eq!(sniff(&bytes, None), encoding_rs::UTF_8);
    }

    #[test]
    fn meta_charset_attribute_is_detected() {
        let html = br#"<html><head><meta charset="windows-1252"></head></html>"#;
        assert_eq!(sniff(html, None), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn meta_http_equiv_charset_is_detected() {
        let html = br#"<meta http-equiv="Content-Type" content="text/html; charset=iso-8859-1">"#;
        assert_eq!(sniff(html, None), encoding_rs::WINDOWS_1252);
    }

    #[test]
    fn falls_back_to_hint_then_utf8() {
        let html = b"<html></html>";
        assert_eq!(sniff(html, Some("shift_jis")), encoding_rs::SHIFT_JIS);
        assert_eq!(sniff(html, None), encoding_rs::UTF_8);
    }
}
