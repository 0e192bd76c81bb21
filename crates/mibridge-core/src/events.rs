//! Event system for UI decoupling.
//!
//! Lets a CLI or any other front-end follow discovery, login and command
//! delivery without coupling to the client internals.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;

use crate::protocol::{AckRejection, Command, SessionId};

/// Events emitted by a bridge client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Bridge answered discovery.
    BridgeDiscovered { ip: IpAddr, mac: String, model: String },
    /// Discovery or handshake failed.
    LoginFailed { reason: String },
    /// Handshake complete, session id issued.
    LoggedIn {
        bridge: SocketAddr,
        session_id: SessionId,
    },
    /// Datagram sent/received on the command socket.
    Packet {
        direction: PacketDirection,
        length: usize,
        data: Vec<u8>,
    },
    /// Command confirmed by the bridge.
    CommandAcknowledged {
        command: Command,
        sequence: u8,
        attempt: u32,
    },
    /// Reply arrived but did not confirm the command.
    AckRejected {
        sequence: u8,
        rejection: AckRejection,
    },
    /// No reply before the read deadline.
    AckMissing { sequence: u8, attempt: u32 },
    /// Session assumed stale; logging in again.
    SessionLost,
    /// Retry budget exhausted.
    CommandFailed { command: Command, attempts: u32 },
}

/// Datagram direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketDirection {
    Tx, // Client -> Bridge
    Rx, // Bridge -> Client
}

impl fmt::Display for PacketDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PacketDirection::Tx => write!(f, "TX"),
            PacketDirection::Rx => write!(f, "RX"),
        }
    }
}

/// Observer trait for receiving bridge events.
///
/// Implement this trait in your UI layer to receive updates.
pub trait BridgeObserver: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &BridgeEvent);
}

/// No-op observer that discards all events.
pub struct NullObserver;

impl BridgeObserver for NullObserver {
    fn on_event(&self, _event: &BridgeEvent) {}
}

/// Observer that keeps every event, mostly for tests.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<BridgeEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Count events matching `pred`.
    pub fn count(&self, pred: impl Fn(&BridgeEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl BridgeObserver for RecordingObserver {
    fn on_event(&self, event: &BridgeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Observer that logs events using tracing.
pub struct TracingObserver;

impl BridgeObserver for TracingObserver {
    fn on_event(&self, event: &BridgeEvent) {
        match event {
            BridgeEvent::BridgeDiscovered { ip, mac, model } => {
                tracing::info!(ip = %ip, mac = %mac, model = %model, "Bridge discovered");
            }
            BridgeEvent::LoginFailed { reason } => {
                tracing::warn!(reason = %reason, "Login failed");
            }
            BridgeEvent::LoggedIn { bridge, session_id } => {
                tracing::info!(bridge = %bridge, session = %session_id, "Logged in");
            }
            BridgeEvent::Packet {
                direction,
                length,
                data,
            } => {
                tracing::trace!(
                    dir = %direction,
                    len = length,
                    data = ?data,
                    "UDP Packet"
                );
            }
            BridgeEvent::CommandAcknowledged {
                command,
                sequence,
                attempt,
            } => {
                tracing::debug!(command = %command, seq = sequence, attempt = attempt, "Command acknowledged");
            }
            BridgeEvent::AckRejected { sequence, rejection } => {
                tracing::warn!(seq = sequence, "Acknowledgment rejected: {}", rejection);
            }
            BridgeEvent::AckMissing { sequence, attempt } => {
                tracing::warn!(seq = sequence, attempt = attempt, "No acknowledgment");
            }
            BridgeEvent::SessionLost => {
                tracing::info!("Session lost, logging in again");
            }
            BridgeEvent::CommandFailed { command, attempts } => {
                tracing::error!(command = %command, attempts = attempts, "Command failed");
            }
        }
    }
}
