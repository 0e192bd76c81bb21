//! mibridge-core: client for the WiFi bridge V6 lighting protocol.
//!
//! The bridge accepts fixed-size command frames over UDP, but only inside a
//! session it issues at login. This crate discovers the bridge, performs the
//! handshake, frames commands and delivers them with bounded retries,
//! logging in again whenever a command goes unacknowledged.
//!
//! # Architecture
//!
//! The crate is organized into layers:
//!
//! - **Protocol**: Constants, command catalog, frame codec, reply validation
//! - **Transport**: UDP datagram abstraction (std socket, mock)
//! - **Discovery**: Broadcast token, static address, mock
//! - **Session**: Session identity, sequence counter, login handshake
//! - **Client**: Reliable dispatcher and device operations
//! - **Events**: Observer pattern for UI decoupling
//!
//! # Example
//!
//! ```no_run
//! use mibridge_core::{BridgeClient, ClientConfig};
//!
//! let mut client = BridgeClient::connect(ClientConfig::default())?;
//! client.on()?;
//! client.brightness(60)?;
//! client.color(0x7F)?;
//! # Ok::<(), mibridge_core::BridgeError>(())
//! ```

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use client::BridgeClient;
pub use config::ClientConfig;
pub use discovery::{
    BroadcastDiscovery, DiscoveredBridge, Discover, DiscoveryError, MockDiscovery,
    StaticDiscovery, parse_announcement,
};
pub use error::BridgeError;
pub use events::{
    BridgeEvent, BridgeObserver, NullObserver, PacketDirection, RecordingObserver, TracingObserver,
};
pub use protocol::{AckRejection, Command, CommandFrame, CommandTemplate, FrameError, SessionId};
pub use session::Session;
pub use transport::{BridgeTransport, MockTransport, TransportError, UdpTransport};
