//! Session state and the login handshake.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::config::ClientConfig;
use crate::discovery::Discover;
use crate::error::{BridgeError, Result};
use crate::events::{BridgeEvent, BridgeObserver};
use crate::protocol::constants::{LOGIN_REPLY_LEN, LOGIN_REQUEST};
use crate::protocol::{Command, CommandFrame, SessionId, parse_login_reply};
use crate::transport::BridgeTransport;

/// Per-connection state shared by framing and dispatch.
///
/// The sequence counter is monotonic for the lifetime of the session
/// (wrapping at 256); logging in again never resets it.
#[derive(Debug, Default)]
pub struct Session {
    bridge: Option<SocketAddr>,
    session_id: SessionId,
    sequence: u8,
    established: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bridge_addr(&self) -> Option<SocketAddr> {
        self.bridge
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Sequence number the next frame will carry.
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    pub fn is_established(&self) -> bool {
        self.established
    }

    /// Frame `command` and advance the sequence counter.
    pub fn next_frame(&mut self, command: &Command) -> CommandFrame {
        let frame = CommandFrame::encode(self.session_id, self.sequence, &command.template());
        self.sequence = self.sequence.wrapping_add(1);
        frame
    }

    /// Mark the session stale after a failed exchange.
    pub fn invalidate(&mut self) {
        self.established = false;
    }

    /// Discover the bridge and perform the login handshake.
    ///
    /// The bridge address is updated as soon as discovery succeeds; the
    /// session id only when the bridge answers with a well-formed reply.
    #[instrument(skip_all)]
    pub fn login<T, D, O>(
        &mut self,
        transport: &T,
        discovery: &D,
        observer: &O,
        config: &ClientConfig,
    ) -> Result<SessionId>
    where
        T: BridgeTransport + ?Sized,
        D: Discover + ?Sized,
        O: BridgeObserver + ?Sized,
    {
        let found = discovery.discover(config.discovery_timeout())?;
        observer.on_event(&BridgeEvent::BridgeDiscovered {
            ip: found.ip,
            mac: found.mac.clone(),
            model: found.model.clone(),
        });

        let bridge = SocketAddr::new(found.ip, config.control_port);
        self.bridge = Some(bridge);

        let stale = transport.drain()?;
        if stale > 0 {
            debug!(stale, "Discarded stale datagrams before login");
        }
        transport
            .send_to(&LOGIN_REQUEST, bridge)
            .map_err(|e| BridgeError::protocol(format!("login request not sent: {}", e)))?;
        debug!(bridge = %bridge, "Login request sent");

        let session_id = await_login_reply(transport, bridge, config.ack_timeout())?;

        self.session_id = session_id;
        self.established = true;
        info!(bridge = %bridge, session = %session_id, "Session established");
        observer.on_event(&BridgeEvent::LoggedIn { bridge, session_id });
        Ok(session_id)
    }
}

/// Read until a login-sized reply from `bridge` arrives or `timeout` runs out.
///
/// Late acknowledgments from an earlier exchange are skipped; a reply of the
/// right size with the wrong marker is an error.
fn await_login_reply<T>(
    transport: &T,
    bridge: SocketAddr,
    timeout: Duration,
) -> Result<SessionId>
where
    T: BridgeTransport + ?Sized,
{
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(BridgeError::protocol(format!(
                "no login reply within {}ms",
                timeout.as_millis()
            )));
        }
        let reply = transport
            .recv_from_peer(bridge, remaining)
            .map_err(|e| BridgeError::protocol(format!("no login reply: {}", e)))?;
        if reply.len() != LOGIN_REPLY_LEN {
            debug!(len = reply.len(), "Skipping datagram while waiting for login reply");
            continue;
        }
        return parse_login_reply(&reply)
            .map_err(|e| BridgeError::protocol(format!("unexpected login reply: {}", e)));
    }
}
