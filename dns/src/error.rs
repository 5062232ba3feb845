use thiserror::Error;

/// Failures from DNS resolution or prefetch scheduling.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// the resolver could not resolve a domain; carries the resolver's own message.
    /// Per §4.4 "Failure semantics" this is never propagated out of the prefetcher —
    /// it only updates attempt counters and is logged.
    #[error("resolution failed for {0:?}: {1}")]
    Resolve(String, String),

    /// the prefetch queue is already at `max_queue_length`
    #[error("prefetch queue is full (max {0})")]
    QueueFull(usize),
}
