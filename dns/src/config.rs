use std::time::Duration;

/// Tuning knobs for the prefetcher, grounded in the teacher's builder-style
/// `HttpConfig` (plain struct, `pub` setters returning `Self`, sane `Default`).
#[derive(Debug, Clone)]
pub struct DnsConfig {
    max_queue_length: usize,
    max_concurrent_tasks: usize,
    prefetch_interval: Duration,
    min_ttl_threshold: Duration,
    retry_backoff: Duration,
    max_attempts_before_demotion: u32,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            max_queue_length: 256,
            max_concurrent_tasks: 8,
            prefetch_interval: Duration::from_secs(30),
            min_ttl_threshold: Duration::from_secs(60),
            retry_backoff: Duration::from_secs(10),
            max_attempts_before_demotion: 3,
        }
    }
}

impl DnsConfig {
    /// Start from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of tasks the queue will hold before `enqueue` fails.
    pub fn with_max_queue_length(mut self, n: usize) -> Self {
        self.max_queue_length = n;
        self
    }

    /// Maximum number of lookups in flight simultaneously.
    pub fn with_max_concurrent_tasks(mut self, n: usize) -> Self {
        self.max_concurrent_tasks = n;
        self
    }

    /// How often the prefetch cycle scans the DNS cache for candidates.
    pub fn with_prefetch_interval(mut self, d: Duration) -> Self {
        self.prefetch_interval = d;
        self
    }

    /// Entries with less remaining TTL than this become prefetch candidates.
    pub fn with_min_ttl_threshold(mut self, d: Duration) -> Self {
        self.min_ttl_threshold = d;
        self
    }

    /// A task that last attempted more recently than this is skipped this cycle.
    pub fn with_retry_backoff(mut self, d: Duration) -> Self {
        self.retry_backoff = d;
        self
    }

    /// Number of consecutive failures before a task's priority band is demoted.
    pub fn with_max_attempts_before_demotion(mut self, n: u32) -> Self {
        self.max_attempts_before_demotion = n;
        self
    }

    pub(crate) fn max_queue_length(&self) -> usize {
        self.max_queue_length
    }

    pub(crate) fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
    }

    pub(crate) fn prefetch_interval(&self) -> Duration {
        self.prefetch_interval
    }

    pub(crate) fn min_ttl_threshold(&self) -> Duration {
        self.min_ttl_threshold
    }

    pub(crate) fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    pub(crate) fn max_attempts_before_demotion(&self) -> u32 {
        self.max_attempts_before_demotion
    }
}
