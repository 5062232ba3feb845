use std::time::Duration;

/// Connection pool tuning (§4.5). Builder-style, matching the DNS crate's
/// `DnsConfig` shape (plain struct, `with_*` setters, `Default`).
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Hard cap across every origin combined.
    pub max_total: usize,
    /// Hard cap for a single `(scheme, authority, alpn_version)` key.
    pub max_per_host: usize,
    /// How long `acquire` waits for a new transport to finish connecting.
    pub connect_timeout: Duration,
    /// Idle connections older than this are reaped by [`crate::Pool::reap_idle`].
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total: 256,
            max_per_host: 6,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(90),
        }
    }
}

impl PoolConfig {
    /// Override `max_total`.
    pub fn with_max_total(mut self, max_total: usize) -> Self {
        self.max_total = max_total;
        self
    }

    /// Override `max_per_host`.
    pub fn with_max_per_host(mut self, max_per_host: usize) -> Self {
        self.max_per_host = max_per_host;
        self
    }

    /// Override `connect_timeout`.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Override `idle_timeout`.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}
