/// Errors produced by the HTML pipeline (§4.9–§4.11).
///
/// Per §4.10's "failure semantics", a malformed document never aborts
/// parsing — individual parse errors are recorded on [`crate::ParseError`]
/// instead. This enum is reserved for failures outside that contract: a
/// caller-supplied encoding hint the sniffer can't act on, or a selector
/// string the CSS-subset parser can't understand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// `query_selector`/`query_selector_all` received a selector outside the
    /// supported subset (type, id, class, descendant, child, attribute
    /// presence/equality).
    #[error("unsupported selector syntax: {0}")]
    UnsupportedSelector(String),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;
