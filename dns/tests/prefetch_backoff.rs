//! Boundary scenario: prefetch back-off (§4.4) — a domain whose resolver
//! fails four consecutive times is demoted from its initial priority band to
//! the lowest, and a task that just failed is not retried sooner than the
//! configured back-off.
//!
//! `Prefetcher` resolves through a real `hickory-resolver` with no injectable
//! failure mode, so this drives the demotion/back-off bookkeeping directly on
//! `PrefetchTask` — the exact state `Prefetcher::dispatch_available` mutates
//! on each failed resolution, just without needing a live (or fake) network.

use aperture_dns::{Priority, PrefetchTask, RecordType};
use std::time::{Duration, Instant};

const MAX_ATTEMPTS_BEFORE_DEMOTION: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(10);

/// Mirrors `Prefetcher::dispatch_available`'s failure arm: on every failed
/// resolution, demote once the task has reached `max_attempts`.
fn record_failure(task: &mut PrefetchTask, max_attempts: u32) {
    task.mark_attempted();
    if task.attempts() >= max_attempts {
        task.demote();
    }
}

#[test]
fn four_consecutive_failures_demote_to_the_lowest_band() {
    let mut task = PrefetchTask::new("flaky.example", RecordType::A, Priority::Normal, Instant::now() + Duration::from_secs(60));

    for _ in 0..4 {
        record_failure(&mut task, MAX_ATTEMPTS_BEFORE_DEMOTION);
    }

    // attempt 3 demotes Normal -> Low, attempt 4 demotes Low -> Background.
    assert_eq!(task.priority(), Priority::Background);
}

#[test]
fn a_just_failed_task_is_not_retried_before_the_backoff_elapses() {
    let mut task = PrefetchTask::new("flaky.example", RecordType::A, Priority::Normal, Instant::now() + Duration::from_secs(60));
    record_failure(&mut task, MAX_ATTEMPTS_BEFORE_DEMOTION);

    assert!(task.recently_attempted(RETRY_BACKOFF), "a task must not be retried immediately after failing");
    assert!(!task.recently_attempted(Duration::ZERO), "a zero backoff imposes no wait at all");
}
