//! UDP transport abstraction.
//!
//! Defines the `BridgeTransport` trait for datagram exchange with the bridge,
//! allowing different implementations (std UDP socket, mock, etc.).

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to bind {addr}: {reason}")]
    BindFailed { addr: SocketAddr, reason: String },

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("No bridge address known")]
    NoBridge,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Abstract datagram transport used for login and command traffic.
///
/// This trait enables:
/// - Production implementation on a bound UDP socket
/// - Mock implementation for unit testing
pub trait BridgeTransport: Send + Sync {
    /// Send one datagram to `addr`.
    fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<usize, TransportError>;

    /// Wait up to `timeout` for one datagram and its sender.
    fn recv_from(&self, timeout: Duration) -> Result<(Vec<u8>, SocketAddr), TransportError>;

    /// Discard every datagram already waiting, without blocking.
    ///
    /// Returns how many were dropped.
    fn drain(&self) -> Result<usize, TransportError>;

    /// Local endpoint of the transport.
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;

    /// Wait up to `timeout` for a datagram sent by `peer`.
    ///
    /// Datagrams from any other sender are dropped and the wait resumes with
    /// whatever is left of the budget.
    fn recv_from_peer(
        &self,
        peer: SocketAddr,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let timed_out = || TransportError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        };
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out());
            }
            let (data, from) = match self.recv_from(remaining) {
                Ok(received) => received,
                Err(TransportError::Timeout { .. }) => return Err(timed_out()),
                Err(e) => return Err(e),
            };
            if from == peer {
                return Ok(data);
            }
            debug!(from = %from, expected = %peer, len = data.len(), "Ignoring datagram from unexpected sender");
        }
    }
}
