use std::net::IpAddr;
use std::time::{Duration, Instant};

/// The DNS record type a lookup resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// canonical name alias
    Cname,
}

/// A resolved DNS record with the bookkeeping the prefetcher needs to decide when to
/// re-resolve it (§3 "DNS cache record").
#[derive(Debug, Clone)]
pub struct DnsCacheRecord {
    domain: String,
    record_type: RecordType,
    values: Vec<IpAddr>,
    ttl: Duration,
    inserted_at: Instant,
    access_count: u64,
    last_access: Instant,
    importance: f64,
}

impl DnsCacheRecord {
    /// A freshly resolved record, with zero accumulated access history.
    pub fn new(domain: impl Into<String>, record_type: RecordType, values: Vec<IpAddr>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            domain: domain.into(),
            record_type,
            values,
            ttl,
            inserted_at: now,
            access_count: 0,
            last_access: now,
            importance: 0.0,
        }
    }

    /// The domain this record resolves.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The record type.
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// The resolved addresses.
    pub fn values(&self) -> &[IpAddr] {
        &self.values
    }

    /// How much TTL remains, zero if already expired.
    pub fn remaining_ttl(&self) -> Duration {
        let elapsed = self.inserted_at.elapsed();
        self.ttl.saturating_sub(elapsed)
    }

    /// Whether this record's TTL has fully elapsed.
    pub fn is_expired(&self) -> bool {
        self.remaining_ttl().is_zero()
    }

    /// Record an access, updating the recency/frequency stats the importance score
    /// is derived from.
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_access = Instant::now();
        // running average pulling toward "recently and frequently used": each access
        // nudges the score up, decayed toward the hit-frequency-normalized value.
        let frequency_component = (self.access_count as f64).ln_1p() / 10.0;
        self.importance = (self.importance * 0.7 + frequency_component * 0.3).min(1.0);
    }

    /// The running importance score in `[0.0, 1.0]`, combining hit frequency and
    /// recency, used by the prefetcher's priority assignment (§4.4).
    pub fn importance(&self) -> f64 {
        let recency_component = {
            let since_access = self.last_access.elapsed().as_secs_f64();
            (1.0 - (since_access / 300.0)).clamp(0.0, 1.0)
        };
        (self.importance * 0.6 + recency_component * 0.4).clamp(0.0, 1.0)
    }

    /// Replace this record's values and TTL after a successful re-resolution,
    /// preserving its access history.
    pub fn refresh(&mut self, values: Vec<IpAddr>, ttl: Duration) {
        self.values = values;
        self.ttl = ttl;
        self.inserted_at = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn remaining_ttl_decreases_but_never_negative() {
        let record = DnsCacheRecord::new(
            "example.com",
            RecordType::A,
            vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))],
            Duration::from_secs(0),
        );
        assert!(record.is_expired());
    }

    #[test]
    fn access_increases_importance() {
        let mut record = DnsCacheRecord::new(
            "example.com",
            RecordType::A,
            vec![IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))],
            Duration::from_secs(300),
        );
        let before = record.importance();
        record.record_access();
        record.record_access();
        record.record_access();
        assert!(record.importance() >= before);
    }
}
