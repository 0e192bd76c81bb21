//! Client-level error type.

use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::protocol::Command;
use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// Discovery found no bridge; login could not start.
    #[error("Discovery failed: {0}")]
    DiscoveryFailed(#[from] DiscoveryError),

    /// A reply arrived (or did not) in a shape the handshake does not accept.
    #[error("Protocol error: {reason}")]
    Protocol { reason: String },

    /// Every attempt ended without a validated acknowledgment.
    #[error("Command {command} failed after {attempts} attempts")]
    CommandFailed { command: Command, attempts: u32 },

    /// Local socket setup failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl BridgeError {
    pub(crate) fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// True when discovery timed out.
    pub fn is_discovery_timeout(&self) -> bool {
        matches!(
            self,
            BridgeError::DiscoveryFailed(DiscoveryError::Timeout { .. })
        )
    }
}
