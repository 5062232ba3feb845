//! Applies an already-decided [`CookieRule`] to a response's `Set-Cookie`
//! values. `cookie_policy.rs` decides *which* rule governs a domain; this
//! module is the enforcement step that actually rewrites cookie headers,
//! grounded on the teacher's own use of the `cookie` crate
//! (`cookies_handler.rs`'s `Cookie::parse_encoded`/`CookieJar`) to parse and
//! re-serialize `Set-Cookie` values rather than hand-rolling cookie-attribute
//! parsing.

use crate::cookie_policy::CookieRule;
use cookie::Cookie;

/// Filter/rewrite `set_cookie_values` (each a raw `Set-Cookie` header value)
/// according to `rule`. `Block` drops every cookie; `AllowSession` strips any
/// persistence attributes so the cookie can't outlive the session even if
/// the origin asked it to; `Allow`/`AllowFirstParty`/`Partition` pass
/// cookies through unchanged — the first/third-party distinction was already
/// applied by the caller choosing which rule governs this request, and
/// partitioning is a storage-layer concern this crate doesn't own.
pub fn enforce(rule: CookieRule, set_cookie_values: &[String]) -> Vec<String> {
    match rule {
        CookieRule::Block => Vec::new(),
        CookieRule::AllowSession => set_cookie_values.iter().filter_map(|raw| strip_persistence(raw)).collect(),
        CookieRule::Allow | CookieRule::AllowFirstParty | CookieRule::Partition => set_cookie_values.to_vec(),
    }
}

fn strip_persistence(raw: &str) -> Option<String> {
    let mut cookie = Cookie::parse(raw.to_string()).ok()?;
    cookie.set_max_age(None);
    cookie.set_expires(None);
    Some(cookie.encoded().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_drops_every_cookie() {
        let out = enforce(CookieRule::Block, &["session=abc; Max-Age=3600".to_string()]);
        assert!(out.is_empty());
    }

    #[test]
    fn allow_session_strips_max_age() {
        let out = enforce(CookieRule::AllowSession, &["session=abc; Max-Age=3600".to_string()]);
        assert_eq!(out.len(), 1);
        assert!(!out[0].to_lowercase().contains("max-age"));
    }

    #[test]
    fn allow_passes_cookies_through_unchanged() {
        let input = vec!["a=1; Max-Age=3600".to_string()];
        assert_eq!(enforce(CookieRule::Allow, &input), input);
    }
}
