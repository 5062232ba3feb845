use crate::priority::Priority;
use crate::record::RecordType;
use std::cmp::Ordering;
use std::time::{Duration, Instant};

/// A queued (re-)resolution request (§3 "Prefetch task").
#[derive(Debug, Clone)]
pub struct PrefetchTask {
    domain: String,
    record_type: RecordType,
    priority: Priority,
    scheduled: Instant,
    expires: Instant,
    attempts: u32,
    last_attempt: Option<Instant>,
}

impl PrefetchTask {
    /// A new task scheduled for immediate dispatch, expiring (as a queue entry, not
    /// a DNS TTL) at `expires`.
    pub fn new(domain: impl Into<String>, record_type: RecordType, priority: Priority, expires: Instant) -> Self {
        Self {
            domain: domain.into(),
            record_type,
            priority,
            scheduled: Instant::now(),
            expires,
            attempts: 0,
            last_attempt: None,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether this task attempted more recently than `backoff` ago and should be
    /// skipped this cycle.
    pub fn recently_attempted(&self, backoff: Duration) -> bool {
        self.last_attempt.is_some_and(|t| t.elapsed() < backoff)
    }

    /// Record a dispatch attempt.
    pub fn mark_attempted(&mut self) {
        self.attempts += 1;
        self.last_attempt = Some(Instant::now());
    }

    /// Drop this task's priority by one band, per the "demoted after three failed
    /// attempts" rule (§4.4).
    pub fn demote(&mut self) {
        self.priority = self.priority.demote();
    }
}

impl PartialEq for PrefetchTask {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain && self.record_type == other.record_type
    }
}
impl Eq for PrefetchTask {}

impl PartialOrd for PrefetchTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordering used by the priority queue's `BinaryHeap` (a max-heap, so "greater"
/// means "dispatched sooner"): higher priority first; ties broken by earlier TTL
/// expiration; remaining ties broken by fewer prior attempts (§4.4).
impl Ord for PrefetchTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.expires.cmp(&self.expires))
            .then_with(|| other.attempts.cmp(&self.attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_priority_sorts_greater() {
        let now = Instant::now();
        let low = PrefetchTask::new("a.com", RecordType::A, Priority::Low, now);
        let high = PrefetchTask::new("b.com", RecordType::A, Priority::High, now);
        assert!(high > low);
    }

    #[test]
    fn same_priority_earlier_expiry_sorts_greater() {
        let now = Instant::now();
        let soon = PrefetchTask::new("a.com", RecordType::A, Priority::Normal, now);
        let later = PrefetchTask::new("b.com", RecordType::A, Priority::Normal, now + Duration::from_secs(60));
        assert!(soon > later);
    }

    #[test]
    fn same_priority_same_expiry_fewer_attempts_sorts_greater() {
        let now = Instant::now();
        let mut many_attempts = PrefetchTask::new("a.com", RecordType::A, Priority::Normal, now);
        many_attempts.mark_attempted();
        many_attempts.mark_attempted();
        let fresh = PrefetchTask::new("b.com", RecordType::A, Priority::Normal, now);
        assert!(fresh > many_attempts);
    }
}
