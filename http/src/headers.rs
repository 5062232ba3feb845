use crate::{Error, HeaderName, HeaderValue, KnownHeaderName};

/// An ordered multimap of header name/value pairs.
///
/// Unlike the teacher's split known/unknown-name map, this preserves insertion order
/// across *all* entries: the HTML parser and the security shield both need to observe
/// headers in wire order (e.g. to find the first matching `Content-Type` when a
/// misbehaving origin sends it twice), so a single ordered `Vec` is the simplest
/// container that satisfies both the common case (one value per name) and the
/// multi-value case (`Set-Cookie`, `Vary`) without giving up order.
#[derive(Debug, Clone, Default)]
pub struct HeaderStore<'a> {
    entries: Vec<(HeaderName<'a>, HeaderValue)>,
}

impl<'a> HeaderStore<'a> {
    /// An empty header store.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Append a header, keeping any existing entries for the same name. This is the
    /// correct operation for repeatable headers like `Set-Cookie`.
    pub fn append(&mut self, name: impl Into<HeaderName<'a>>, value: HeaderValue) {
        self.entries.push((name.into(), value));
    }

    /// Remove every existing entry for `name` and replace it with a single value.
    pub fn set(&mut self, name: impl Into<HeaderName<'a>>, value: HeaderValue) {
        let name = name.into();
        self.entries.retain(|(n, _)| n != &name);
        self.entries.push((name, value));
    }

    /// Remove all entries for `name`, returning whether anything was removed.
    pub fn remove(&mut self, name: &HeaderName<'_>) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.entries.len() != before
    }

    /// The first value for `name`, in insertion order.
    pub fn get(&self, name: &HeaderName<'_>) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<'s>(&'s self, name: &'s HeaderName<'_>) -> impl Iterator<Item = &'s HeaderValue> {
        self.entries.iter().filter(move |(n, _)| n == name).map(|(_, v)| v)
    }

    /// Whether any entry exists for `name`.
    pub fn has(&self, name: &HeaderName<'_>) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Iterate every entry in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName<'a>, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    /// The number of entries (not unique names).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this store has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the `Content-Length` header, if present.
    ///
    /// Rejects anything that isn't a bare non-negative integer per
    /// [rfc9110§8.6](https://www.rfc-editor.org/rfc/rfc9110#section-8.6) — in
    /// particular this never accepts a list like `Content-Length: 4, 4`, which real
    /// request-smuggling attacks rely on servers disagreeing about.
    pub fn content_length(&self) -> Result<Option<u64>, Error> {
        match self.get(&HeaderName::Known(KnownHeaderName::ContentLength)) {
            None => Ok(None),
            Some(v) => {
                let s = v
                    .as_str()
                    .ok_or_else(|| Error::MalformedContentLength(String::from_utf8_lossy(v.as_bytes()).into_owned()))?;
                s.parse()
                    .map(Some)
                    .map_err(|_| Error::MalformedContentLength(s.to_string()))
            }
        }
    }

    /// Whether the stored `Content-Type` matches `mime`, ignoring any `;`-delimited
    /// parameters (such as `charset`).
    pub fn has_content_type(&self, mime: &str) -> bool {
        self.get(&HeaderName::Known(KnownHeaderName::ContentType))
            .and_then(HeaderValue::as_str)
            .map(|v| v.split(';').next().unwrap_or(v).trim().eq_ignore_ascii_case(mime))
            .unwrap_or(false)
    }

    /// Convert to a `'static`-lifetime store by cloning any borrowed header names.
    #[must_use]
    pub fn into_owned(self) -> HeaderStore<'static> {
        HeaderStore {
            entries: self.entries.into_iter().map(|(n, v)| (n.into_owned(), v)).collect(),
        }
    }
}

impl<'a> IntoIterator for HeaderStore<'a> {
    type Item = (HeaderName<'a>, HeaderValue);
    type IntoIter = std::vec::IntoIter<(HeaderName<'a>, HeaderValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hv(s: &str) -> HeaderValue {
        HeaderValue::new(s.as_bytes()).unwrap()
    }

    #[test]
    fn append_preserves_order_and_duplicates() {
        let mut h = HeaderStore::new();
        h.append("Set-Cookie", hv("a=1"));
        h.append("Set-Cookie", hv("b=2"));
        let values: Vec<_> = h.get_all(&HeaderName::from("Set-Cookie")).map(HeaderValue::as_bytes).collect();
        assert_eq!(values, vec![b"a=1".as_slice(), b"b=2".as_slice()]);
    }

    #[test]
    fn set_replaces_all_prior_entries() {
        let mut h = HeaderStore::new();
        h.append("X-Count", hv("1"));
        h.append("X-Count", hv("2"));
        h.set("X-Count", hv("3"));
        assert_eq!(h.get_all(&HeaderName::from("X-Count")).count(), 1);
        assert_eq!(h.get(&HeaderName::from("X-Count")).unwrap().as_str(), Some("3"));
    }

    #[test]
    fn overall_insertion_order_is_preserved_across_names() {
        let mut h = HeaderStore::new();
        h.append("Z-Header", hv("1"));
        h.append("A-Header", hv("2"));
        let names: Vec<_> = h.iter().map(|(n, _)| n.as_str().to_string()).collect();
        assert_eq!(names, vec!["Z-Header", "A-Header"]);
    }

    #[test]
    fn content_length_parses_and_rejects_garbage() {
        let mut h = HeaderStore::new();
        h.append(HeaderName::Known(KnownHeaderName::ContentLength), hv("42"));
        assert_eq!(h.content_length().unwrap(), Some(42));

        let mut bad = HeaderStore::new();
        bad.append(HeaderName::Known(KnownHeaderName::ContentLength), hv("4, 4"));
        assert!(bad.content_length().is_err());
    }

    #[test]
    fn content_type_ignores_parameters() {
        let mut h = HeaderStore::new();
        h.append(HeaderName::Known(KnownHeaderName::ContentType), hv("text/html; charset=utf-8"));
        assert!(h.has_content_type("text/html"));
        assert!(!h.has_content_type("text/plain"));
    }
}
