use std::time::{Duration, Instant};

/// Per-request timing record (§4.5: "captures DNS, connect, TLS, first-byte,
/// total in milliseconds").
#[derive(Debug, Clone, Copy, Default)]
pub struct Timing {
    dns: Option<Duration>,
    connect: Option<Duration>,
    tls: Option<Duration>,
    first_byte: Option<Duration>,
    total: Option<Duration>,
}

/// Accumulates [`Timing`] as a request progresses through the stack; `mark_*`
/// calls record the elapsed time since the previous phase started.
pub struct TimingRecorder {
    start: Instant,
    phase_start: Instant,
    timing: Timing,
}

impl TimingRecorder {
    /// Start timing a new request.
    pub fn start() -> Self {
        let now = Instant::now();
        Self { start: now, phase_start: now, timing: Timing::default() }
    }

    fn mark(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.phase_start);
        self.phase_start = now;
        elapsed
    }

    /// Record the DNS resolution phase as complete.
    pub fn mark_dns(&mut self) {
        self.timing.dns = Some(self.mark());
    }

    /// Record the TCP/QUIC connect phase as complete.
    pub fn mark_connect(&mut self) {
        self.timing.connect = Some(self.mark());
    }

    /// Record the TLS handshake phase as complete.
    pub fn mark_tls(&mut self) {
        self.timing.tls = Some(self.mark());
    }

    /// Record that the first response byte has arrived.
    pub fn mark_first_byte(&mut self) {
        self.timing.first_byte = Some(self.mark());
    }

    /// Finish timing, filling in the request's total elapsed duration.
    pub fn finish(mut self) -> Timing {
        self.timing.total = Some(self.start.elapsed());
        self.timing
    }
}

impl Timing {
    /// DNS resolution duration, if this request needed a fresh lookup.
    pub fn dns(&self) -> Option<Duration> {
        self.dns
    }

    /// TCP/QUIC connect duration, if this request opened a new connection.
    pub fn connect(&self) -> Option<Duration> {
        self.connect
    }

    /// TLS handshake duration, if this request opened a new TLS connection.
    pub fn tls(&self) -> Option<Duration> {
        self.tls
    }

    /// Time from request start to the first response byte.
    pub fn first_byte(&self) -> Option<Duration> {
        self.first_byte
    }

    /// Total request duration.
    pub fn total(&self) -> Option<Duration> {
        self.total
    }
}
