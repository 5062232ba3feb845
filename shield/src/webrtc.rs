//! WebRTC ICE candidate sanitization (§4.8: "ICE candidate strings are
//! classified (host / srflx / relay); per level, host candidates from
//! private IP ranges are stripped or replaced with mDNS placeholders; at
//! Maximum, WebRTC is disabled entirely").

use crate::level::SecurityLevel;
use sha2::{Digest, Sha256};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// An ICE candidate's type, per [RFC 8445§4.1.1](https://www.rfc-editor.org/rfc/rfc8445).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// A directly-bound local address.
    Host,
    /// A server-reflexive address learned via STUN.
    Srflx,
    /// A relayed address learned via TURN.
    Relay,
}

/// A parsed `a=candidate:...` SDP attribute line.
#[derive(Debug, Clone)]
pub struct IceCandidate {
    raw: String,
    kind: CandidateKind,
    address: IpAddr,
}

impl IceCandidate {
    /// Parse a `candidate:<foundation> <component> <transport> <priority>
    /// <address> <port> typ <type> ...` line.
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.trim().split_whitespace().collect();
        let address_idx = tokens.iter().position(|t| !t.starts_with("candidate:"))? + 4;
        let address: IpAddr = tokens.get(address_idx)?.parse().ok()?;
        let typ_idx = tokens.iter().position(|&t| t == "typ")?;
        let kind = match *tokens.get(typ_idx + 1)? {
            "host" => CandidateKind::Host,
            "srflx" => CandidateKind::Srflx,
            "relay" => CandidateKind::Relay,
            _ => return None,
        };
        Some(Self { raw: line.to_string(), kind, address })
    }

    /// This candidate's type.
    pub fn kind(&self) -> CandidateKind {
        self.kind
    }

    /// Whether `address` falls in a range only meaningful on a private
    /// network (RFC 1918 / unique-local / link-local / loopback).
    fn is_private(&self) -> bool {
        match self.address {
            IpAddr::V4(v4) => is_private_v4(v4),
            IpAddr::V6(v6) => is_private_v6(v6),
        }
    }
}

fn is_private_v4(addr: Ipv4Addr) -> bool {
    addr.is_private() || addr.is_loopback() || addr.is_link_local()
}

fn is_private_v6(addr: Ipv6Addr) -> bool {
    if addr.is_loopback() {
        return true;
    }
    let segments = addr.segments();
    segments[0] & 0xfe00 == 0xfc00 || segments[0] == 0xfe80
}

/// Sanitize a candidate line per `level`: `None` means drop it entirely.
///
/// At [`SecurityLevel::Maximum`], every candidate is dropped (WebRTC
/// disabled). At [`SecurityLevel::High`] and [`SecurityLevel::Custom`], host
/// candidates on a private address are replaced with a deterministic mDNS
/// `.local` placeholder (mirroring how real browsers hide a host's LAN
/// address behind an opaque hostname) while `srflx`/`relay` candidates (which
/// already expose only a public-facing address) pass through unchanged.
/// [`SecurityLevel::Standard`] passes every candidate through unchanged.
pub fn sanitize(line: &str, level: SecurityLevel) -> Option<String> {
    if level == SecurityLevel::Maximum {
        return None;
    }
    let Some(candidate) = IceCandidate::parse(line) else {
        return Some(line.to_string());
    };
    if level == SecurityLevel::Standard {
        return Some(candidate.raw);
    }
    if candidate.kind() == CandidateKind::Host && candidate.is_private() {
        return Some(replace_with_mdns(&candidate));
    }
    Some(candidate.raw)
}

fn replace_with_mdns(candidate: &IceCandidate) -> String {
    let mut hasher = Sha256::new();
    hasher.update(candidate.address.to_string().as_bytes());
    let digest = hasher.finalize();
    let hostname = format!("{:016x}.local", u64::from_be_bytes(digest[..8].try_into().unwrap()));
    candidate.raw.replacen(&candidate.address.to_string(), &hostname, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST_CANDIDATE: &str = "candidate:1 1 udp 2130706431 192.168.1.42 54321 typ host generation 0";
    const SRFLX_CANDIDATE: &str = "candidate:2 1 udp 1694498815 203.0.113.9 54322 typ srflx raddr 192.168.1.42 rport 54321";

    #[test]
    fn parses_kind_and_address() {
        let c = IceCandidate::parse(HOST_CANDIDATE).unwrap();
        assert_eq!(c.kind(), CandidateKind::Host);
        assert!(c.is_private());
    }

    #[test]
    fn maximum_drops_every_candidate() {
        assert_eq!(sanitize(HOST_CANDIDATE, SecurityLevel::Maximum), None);
        assert_eq!(sanitize(SRFLX_CANDIDATE, SecurityLevel::Maximum), None);
    }

    #[test]
    fn standard_passes_candidates_through() {
        assert_eq!(sanitize(HOST_CANDIDATE, SecurityLevel::Standard).as_deref(), Some(HOST_CANDIDATE));
    }

    #[test]
    fn high_replaces_private_host_address_with_mdns_placeholder() {
        let sanitized = sanitize(HOST_CANDIDATE, SecurityLevel::High).unwrap();
        assert!(!sanitized.contains("192.168.1.42"));
        assert!(sanitized.contains(".local"));
    }

    #[test]
    fn high_leaves_srflx_candidates_untouched() {
        assert_eq!(sanitize(SRFLX_CANDIDATE, SecurityLevel::High).as_deref(), Some(SRFLX_CANDIDATE));
    }
}
