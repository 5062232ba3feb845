//! Connection pool and H1.1/H2/H3 transports (§4.5).
//!
//! `pool.rs` owns idle-connection storage and FIFO acquisition; `manager.rs`
//! wires that pool to ALPN selection and the H1.1 transport end-to-end. `h2.rs`
//! and `h3.rs` are usable directly by the engine layer once ALPN has picked a
//! protocol for an origin, since H2/H3 connections are naturally long-lived and
//! multiplexed rather than checked in and out per-request the way H1.1
//! connections are.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod h1;
#[cfg(feature = "h2")]
mod h2;
#[cfg(feature = "h3")]
mod h3;
mod key;
mod manager;
mod performance;
mod pool;
mod timing;
mod tls;
mod transport;

pub use config::PoolConfig;
pub use error::Error;
#[cfg(feature = "h2")]
pub use h2::{handshake as h2_handshake, H2Connection, H2Response};
#[cfg(feature = "h3")]
pub use h3::{H3Connection, H3Response};
pub use key::{ConnectionKey, TransportScheme};
pub use manager::{AltSvcCache, ConnectionManager, H1Exchange, H1Transport, NegotiatedResponse};
pub use performance::{BatteryState, OptimizationProfile, PerformanceMonitor, PerformanceSample, QuicTuning};
pub use pool::{Pool, Slot};
pub use timing::{Timing, TimingRecorder};
pub use tls::{alpn_preference_list, MaybeTls, TlsConnectorWrapper};
pub use transport::{Connector, TcpConnector, Transport};
