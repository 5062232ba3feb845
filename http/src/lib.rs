//! Core HTTP vocabulary shared by every other crate in the engine: methods, status
//! codes, protocol versions, and an ordered header store. Nothing in this crate talks
//! to a socket; it exists so that the codec, cache, connection pool, and security
//! shield crates all agree on one representation of "what is a header".

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod header_name;
mod header_value;
mod headers;
mod method;
mod status;
mod version;

pub use error::{Error, Result};
pub use header_name::{HeaderName, KnownHeaderName};
pub use header_value::HeaderValue;
pub use headers::HeaderStore;
pub use method::Method;
pub use status::Status;
pub use version::Version;
