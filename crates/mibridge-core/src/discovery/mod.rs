//! Bridge discovery.
//!
//! The bridge answers a broadcast token with a short ASCII announcement of
//! the form `ip,mac,model`. Only the address is needed to log in.

pub mod broadcast;
pub mod mock;

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::constants::ANNOUNCEMENT_FIELDS;

pub use broadcast::BroadcastDiscovery;
pub use mock::MockDiscovery;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Discovery timeout: no bridge answered within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Discovery socket error: {0}")]
    Socket(#[from] std::io::Error),
}

/// A parsed discovery announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBridge {
    pub ip: IpAddr,
    pub mac: String,
    pub model: String,
}

/// Something that can locate the bridge on the network.
pub trait Discover: Send + Sync {
    fn discover(&self, timeout: Duration) -> Result<DiscoveredBridge, DiscoveryError>;
}

impl<D: Discover + ?Sized> Discover for Box<D> {
    fn discover(&self, timeout: Duration) -> Result<DiscoveredBridge, DiscoveryError> {
        (**self).discover(timeout)
    }
}

/// Parse an announcement datagram.
///
/// Returns `None` unless the payload has exactly three comma-separated
/// fields and the first one is an IP address.
pub fn parse_announcement(payload: &[u8]) -> Option<DiscoveredBridge> {
    let text = std::str::from_utf8(payload).ok()?;
    let fields: Vec<&str> = text.trim().split(',').map(str::trim).collect();
    if fields.len() != ANNOUNCEMENT_FIELDS {
        return None;
    }
    let ip = fields[0].parse().ok()?;
    Some(DiscoveredBridge {
        ip,
        mac: fields[1].to_string(),
        model: fields[2].to_string(),
    })
}

/// A bridge at a known address; nothing is broadcast.
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    ip: IpAddr,
}

impl StaticDiscovery {
    pub fn new(ip: IpAddr) -> Self {
        Self { ip }
    }
}

impl Discover for StaticDiscovery {
    fn discover(&self, _timeout: Duration) -> Result<DiscoveredBridge, DiscoveryError> {
        Ok(DiscoveredBridge {
            ip: self.ip,
            mac: String::new(),
            model: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_parse_valid_announcement() {
        let bridge = parse_announcement(b"10.0.0.5,AABBCC,modelX").unwrap();
        assert_eq!(bridge.ip, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(bridge.mac, "AABBCC");
        assert_eq!(bridge.model, "modelX");
    }

    #[test]
    fn test_parse_tolerates_line_ending() {
        let bridge = parse_announcement(b"192.168.1.50,ACCF23A8C2E8,HF-LPB100\r\n").unwrap();
        assert_eq!(bridge.ip, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50)));
        assert_eq!(bridge.model, "HF-LPB100");
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert_eq!(parse_announcement(b"10.0.0.5,AABBCC"), None);
        assert_eq!(parse_announcement(b"10.0.0.5,AABBCC,modelX,extra"), None);
        assert_eq!(parse_announcement(b""), None);
    }

    #[test]
    fn test_parse_rejects_bad_address() {
        assert_eq!(parse_announcement(b"bridge,AABBCC,modelX"), None);
        assert_eq!(parse_announcement(&[0xFF, b',', b'a', b',', b'b']), None);
    }

    #[test]
    fn test_static_discovery() {
        let ip = IpAddr::V4(Ipv4Addr::new(10, 1, 1, 1));
        let found = StaticDiscovery::new(ip)
            .discover(Duration::from_secs(1))
            .unwrap();
        assert_eq!(found.ip, ip);
    }
}
