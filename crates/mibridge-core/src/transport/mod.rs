//! Transport layer module.

pub mod mock;
pub mod traits;
pub mod udp;

pub use mock::{MockTransport, ScriptedReply, ack_reply};
pub use traits::{BridgeTransport, TransportError};
pub use udp::UdpTransport;
