/// Errors produced by the planner (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// `add_resource` was called twice for the same URL.
    #[error("resource {0} is already registered")]
    DuplicateUrl(String),
}

/// Convenience alias for this crate's `Result`.
pub type Result<T> = std::result::Result<T, Error>;
