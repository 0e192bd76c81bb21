//! Client configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::protocol::constants::{CONTROL_PORT, DISCOVERY_PORT};

/// Configuration for a bridge client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Local endpoint of the command socket.
    pub local_addr: SocketAddr,
    /// Bridge port receiving login and command frames.
    pub control_port: u16,
    /// Where the discovery token is sent.
    pub discovery_target: SocketAddr,
    /// Local endpoint of the short-lived discovery socket.
    pub discovery_bind: SocketAddr,
    /// Discovery window in milliseconds.
    pub discovery_timeout_ms: u64,
    /// Read deadline for login replies and acknowledgments.
    pub ack_timeout_ms: u64,
    /// Attempts per command before giving up; 0 is treated as 1.
    pub max_attempts: u32,
    /// Pause between the steps of the alert sequence.
    pub alert_step_delay_ms: u64,
    /// Skip broadcast discovery and use this address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_ip: Option<IpAddr>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            local_addr: SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), CONTROL_PORT),
            control_port: CONTROL_PORT,
            discovery_target: SocketAddr::new(Ipv4Addr::BROADCAST.into(), DISCOVERY_PORT),
            discovery_bind: SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0),
            discovery_timeout_ms: 1000,
            ack_timeout_ms: 1000,
            max_attempts: 3,
            alert_step_delay_ms: 100,
            bridge_ip: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn alert_step_delay(&self) -> Duration {
        Duration::from_millis(self.alert_step_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.local_addr.port(), 5987);
        assert_eq!(config.discovery_target.to_string(), "255.255.255.255:48899");
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.ack_timeout(), Duration::from_secs(1));
        assert_eq!(config.discovery_timeout(), Duration::from_secs(1));
        assert_eq!(config.alert_step_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            bridge_ip = "192.168.1.50"
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.bridge_ip, Some("192.168.1.50".parse().unwrap()));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.control_port, 5987);
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("mibridge-config-{}.toml", std::process::id()));
        let config = ClientConfig {
            ack_timeout_ms: 250,
            bridge_ip: Some("10.0.0.5".parse().unwrap()),
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = ClientConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
