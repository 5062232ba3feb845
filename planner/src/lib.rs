//! Prefetch and priority planner (§4.6): tracks a page's resource dependency
//! graph, assigns each resource a priority band and scheduling weight, and
//! emits an ordered list of [`PrefetchTask`]s that respect both priority and
//! dependency order.
//!
//! `band.rs`/`resource.rs` model a single resource and its band-adjustment
//! rules; `weight.rs` is the scheduling-weight formula; `graph.rs` is the
//! dependency graph and critical-path discovery; `ordering.rs` is the
//! stable-sort-then-topological-pass algorithm `graph.rs`'s `plan` drives.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod band;
mod error;
mod graph;
mod ordering;
mod resource;
mod task;
mod weight;

pub use band::PriorityBand;
pub use error::Error;
pub use graph::ResourceGraph;
pub use resource::{Resource, ResourceType};
pub use task::{PrefetchTask, Purpose};
pub use weight::compute_weight;
