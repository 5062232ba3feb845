use crate::config::DnsConfig;
use crate::oracle::AnalyticsOracle;
use crate::priority::{Category, Priority};
use crate::queue::PrefetchQueue;
use crate::record::{DnsCacheRecord, RecordType};
use crate::task::PrefetchTask;
use hickory_resolver::TokioAsyncResolver;
use std::collections::HashMap;
use std::time::{Duration, Instant};

fn priority_from_importance(importance: f64, category: Category) -> Priority {
    let base = if importance >= 0.8 {
        Priority::Critical
    } else if importance >= 0.6 {
        Priority::High
    } else if importance >= 0.3 {
        Priority::Normal
    } else if importance >= 0.1 {
        Priority::Low
    } else {
        Priority::Background
    };
    if category.is_bumped() {
        base.bump()
    } else {
        base
    }
}

/// Result of dispatching one prefetch task, used internally to reconcile the cache
/// after a resolution round completes.
struct Resolved {
    domain: String,
    record_type: RecordType,
    outcome: Result<Vec<std::net::IpAddr>, String>,
}

/// Adaptive background DNS prefetcher (§4.4).
///
/// Owns the DNS cache and the pending-task queue; per §5's single-owner-per-task
/// rule, a `Prefetcher` is meant to live on one event-loop task and be driven by
/// repeated calls to [`Prefetcher::run_cycle`].
pub struct Prefetcher {
    resolver: TokioAsyncResolver,
    cache: HashMap<(String, RecordType), DnsCacheRecord>,
    queue: PrefetchQueue,
    categories: HashMap<String, Category>,
    config: DnsConfig,
    oracle: Box<dyn AnalyticsOracle>,
    in_flight: usize,
}

impl Prefetcher {
    /// Build a prefetcher using the system's configured resolvers.
    pub fn new(config: DnsConfig, oracle: Box<dyn AnalyticsOracle>) -> Result<Self, hickory_resolver::error::ResolveError> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
        let queue = PrefetchQueue::new(config.max_queue_length());
        Ok(Self {
            resolver,
            cache: HashMap::new(),
            queue,
            categories: HashMap::new(),
            config,
            oracle,
            in_flight: 0,
        })
    }

    /// Mark `domain` as security- or infrastructure-relevant so its lookups earn the
    /// priority bump (§4.4).
    pub fn set_category(&mut self, domain: impl Into<String>, category: Category) {
        self.categories.insert(domain.into(), category);
    }

    fn category_of(&self, domain: &str) -> Category {
        self.categories.get(domain).copied().unwrap_or(Category::Content)
    }

    /// Number of tasks currently queued for background prefetch, for
    /// reporting via the engine's `stats()` (§6's "prefetch counters").
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// A cached record, if one exists and has not expired.
    pub fn lookup(&self, domain: &str, record_type: RecordType) -> Option<&DnsCacheRecord> {
        self.cache
            .get(&(domain.to_string(), record_type))
            .filter(|r| !r.is_expired())
    }

    /// Note that `domain` was actually used by a request, feeding the importance
    /// score that drives future prefetch priority.
    pub fn record_use(&mut self, domain: &str, record_type: RecordType) {
        if let Some(record) = self.cache.get_mut(&(domain.to_string(), record_type)) {
            record.record_access();
        }
    }

    /// Resolve `domain` immediately (not via the background queue), inserting the
    /// result into the cache. Used for the first lookup of a domain the prefetcher
    /// has never seen.
    pub async fn resolve_now(&mut self, domain: &str, record_type: RecordType) -> Result<(), crate::Error> {
        let resolved = Self::do_resolve(&self.resolver, domain, record_type).await;
        match resolved.outcome {
            Ok(values) => {
                let ttl = Duration::from_secs(300);
                self.cache
                    .entry((domain.to_string(), record_type))
                    .and_modify(|r| r.refresh(values.clone(), ttl))
                    .or_insert_with(|| DnsCacheRecord::new(domain, record_type, values, ttl));
                Ok(())
            }
            Err(message) => Err(crate::Error::Resolve(domain.to_string(), message)),
        }
    }

    /// Resolves via `lookup_ip`, which transparently follows CNAME chains and
    /// returns whichever address families the system resolver offers — simpler and
    /// more realistic than hand-selecting A vs AAAA vs CNAME record parsing, since
    /// real origins commonly answer with both families behind a CNAME.
    async fn do_resolve(resolver: &TokioAsyncResolver, domain: &str, record_type: RecordType) -> Resolved {
        let outcome = resolver
            .lookup_ip(domain)
            .await
            .map(|r| r.iter().collect::<Vec<_>>())
            .map_err(|e| e.to_string());
        Resolved { domain: domain.to_string(), record_type, outcome }
    }

    /// Run one prefetch cycle: scan for candidates, enqueue them, and dispatch as
    /// many as `max_concurrent_tasks` allows (§4.4's "Cycle").
    pub async fn run_cycle(&mut self) {
        self.scan_for_candidates();
        self.dispatch_available().await;
    }

    fn scan_for_candidates(&mut self) {
        let threshold = self.config.min_ttl_threshold();
        let candidates: Vec<(String, RecordType, f64)> = self
            .cache
            .iter()
            .filter(|(_, record)| record.remaining_ttl() < threshold)
            .filter(|((domain, _), record)| self.oracle.should_prefetch(domain, record.remaining_ttl()))
            .map(|((domain, rt), record)| (domain.clone(), *rt, record.importance()))
            .collect();

        for (domain, record_type, importance) in candidates {
            let category = self.category_of(&domain);
            let priority = priority_from_importance(importance, category);
            let expires = Instant::now() + threshold;
            let task = PrefetchTask::new(domain, record_type, priority, expires);
            if self.queue.enqueue(task).is_err() {
                log::debug!("prefetch queue full, dropping lowest-priority candidates this cycle");
                break;
            }
        }
    }

    async fn dispatch_available(&mut self) {
        let available_slots = self.config.max_concurrent_tasks().saturating_sub(self.in_flight);
        if available_slots == 0 {
            return;
        }

        let backoff = self.config.retry_backoff();
        let mut dispatched = Vec::new();
        let mut deferred = Vec::new();
        for mut task in self.queue.dequeue_up_to(available_slots * 2) {
            if dispatched.len() >= available_slots {
                deferred.push(task);
                continue;
            }
            if task.recently_attempted(backoff) {
                deferred.push(task);
                continue;
            }
            task.mark_attempted();
            dispatched.push(task);
        }
        for task in deferred {
            let _ = self.queue.enqueue(task);
        }

        if dispatched.is_empty() {
            return;
        }

        self.in_flight += dispatched.len();
        let mut join_set = tokio::task::JoinSet::new();
        for task in &dispatched {
            let resolver = self.resolver.clone();
            let domain = task.domain().to_string();
            let record_type = task.record_type();
            join_set.spawn(async move { Self::do_resolve(&resolver, &domain, record_type).await });
        }

        let max_attempts = self.config.max_attempts_before_demotion();
        let mut by_key: HashMap<(String, RecordType), PrefetchTask> =
            dispatched.into_iter().map(|t| ((t.domain().to_string(), t.record_type()), t)).collect();

        while let Some(joined) = join_set.join_next().await {
            self.in_flight = self.in_flight.saturating_sub(1);
            let Ok(resolved) = joined else { continue };
            let key = (resolved.domain.clone(), resolved.record_type);
            match resolved.outcome {
                Ok(values) => {
                    let ttl = Duration::from_secs(300);
                    self.cache
                        .entry(key.clone())
                        .and_modify(|r| r.refresh(values.clone(), ttl))
                        .or_insert_with(|| DnsCacheRecord::new(&resolved.domain, resolved.record_type, values, ttl));
                    by_key.remove(&key);
                }
                Err(message) => {
                    log::warn!("prefetch resolution failed for {:?}: {message}", resolved.domain);
                    if let Some(mut task) = by_key.remove(&key) {
                        if task.attempts() >= max_attempts {
                            task.demote();
                        }
                        let _ = self.queue.enqueue(task);
                    }
                }
            }
        }
    }
}
