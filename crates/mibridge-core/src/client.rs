//! Bridge client - reliable command dispatch over a stateful session.
//!
//! Every operation blocks until the bridge has acknowledged the command or
//! the retry budget is spent. A missing or unexpected reply is always read as
//! a stale session: the client logs in again and retries with a fresh frame.
//! Commands are not assumed idempotent; a retried frame may repeat an effect
//! whose acknowledgment was lost.
//!
//! One client owns one session. Sharing a client across threads needs an
//! external lock around it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::discovery::{BroadcastDiscovery, Discover, StaticDiscovery};
use crate::error::{BridgeError, Result};
use crate::events::{BridgeEvent, BridgeObserver, PacketDirection, TracingObserver};
use crate::protocol::constants::{ALERT_MODE, MAX_BRIGHTNESS};
use crate::protocol::{Command, CommandFrame, SessionId, check_ack};
use crate::session::Session;
use crate::transport::{BridgeTransport, TransportError, UdpTransport};

/// Client for a single WiFi bridge.
pub struct BridgeClient<T: BridgeTransport, D: Discover, O: BridgeObserver> {
    transport: T,
    discovery: D,
    observer: Arc<O>,
    session: Session,
    config: ClientConfig,
}

impl BridgeClient<UdpTransport, Box<dyn Discover>, TracingObserver> {
    /// Bind the command socket without contacting the bridge.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UdpTransport::bind(config.local_addr)?;
        let discovery: Box<dyn Discover> = match config.bridge_ip {
            Some(ip) => Box::new(StaticDiscovery::new(ip)),
            None => Box::new(BroadcastDiscovery::new(
                config.discovery_bind,
                config.discovery_target,
            )),
        };
        Ok(Self::with_parts(
            transport,
            discovery,
            Arc::new(TracingObserver),
            config,
        ))
    }

    /// Bind the command socket and log in to the bridge.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.login()?;
        Ok(client)
    }
}

impl<T: BridgeTransport, D: Discover, O: BridgeObserver> BridgeClient<T, D, O> {
    /// Create a client from explicit collaborators.
    pub fn with_parts(transport: T, discovery: D, observer: Arc<O>, config: ClientConfig) -> Self {
        if let Ok(local) = transport.local_addr() {
            debug!(local = %local, attempts = config.max_attempts, "Bridge client ready");
        }
        Self {
            transport,
            discovery,
            observer,
            session: Session::new(),
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    fn emit(&self, event: BridgeEvent) {
        self.observer.on_event(&event);
    }

    /// Discover the bridge and establish a session.
    #[instrument(skip(self))]
    pub fn login(&mut self) -> Result<SessionId> {
        let link = ObservableTransport {
            inner: &self.transport,
            observer: self.observer.as_ref(),
        };
        let result =
            self.session
                .login(&link, &self.discovery, self.observer.as_ref(), &self.config);
        if let Err(e) = &result {
            self.emit(BridgeEvent::LoginFailed {
                reason: e.to_string(),
            });
        }
        result
    }

    /// Deliver `command`, retrying and re-establishing the session on failure.
    ///
    /// At least one attempt is made whatever the configured budget.
    #[instrument(skip(self, command), fields(command = %command))]
    pub fn send_reliable(&mut self, command: Command) -> Result<()> {
        let attempts = self.config.max_attempts.max(1);

        for attempt in 1..=attempts {
            let frame = self.session.next_frame(&command);
            let sequence = frame.sequence();

            match self.exchange(&frame) {
                Ok(reply) => match check_ack(&reply, sequence) {
                    Ok(()) => {
                        self.emit(BridgeEvent::CommandAcknowledged {
                            command,
                            sequence,
                            attempt,
                        });
                        return Ok(());
                    }
                    Err(rejection) => {
                        self.emit(BridgeEvent::AckRejected {
                            sequence,
                            rejection,
                        });
                    }
                },
                Err(e) => {
                    debug!(error = %e, attempt, "Exchange failed");
                    self.emit(BridgeEvent::AckMissing { sequence, attempt });
                }
            }

            self.recover();
        }

        self.emit(BridgeEvent::CommandFailed { command, attempts });
        Err(BridgeError::CommandFailed { command, attempts })
    }

    /// Send one frame and wait for one reply from the bridge.
    ///
    /// Anything already queued on the socket predates this frame and is
    /// dropped before sending.
    fn exchange(&self, frame: &CommandFrame) -> std::result::Result<Vec<u8>, TransportError> {
        let bridge = self.session.bridge_addr().ok_or(TransportError::NoBridge)?;
        let link = ObservableTransport {
            inner: &self.transport,
            observer: self.observer.as_ref(),
        };
        let stale = link.drain()?;
        if stale > 0 {
            debug!(stale, sequence = frame.sequence(), "Discarded stale datagrams");
        }
        link.send_to(frame.as_bytes(), bridge)?;
        link.recv_from_peer(bridge, self.config.ack_timeout())
    }

    /// Treat the session as lost and log in again. Failures are only logged;
    /// the next attempt will surface them as another missing reply.
    fn recover(&mut self) {
        self.session.invalidate();
        self.emit(BridgeEvent::SessionLost);
        if let Err(e) = self.login() {
            warn!(error = %e, "Re-login failed");
        }
    }

    pub fn on(&mut self) -> Result<()> {
        self.send_reliable(Command::On)
    }

    pub fn off(&mut self) -> Result<()> {
        self.send_reliable(Command::Off)
    }

    pub fn white(&mut self) -> Result<()> {
        self.send_reliable(Command::White)
    }

    /// Set the hue (0-255).
    pub fn color(&mut self, hue: u8) -> Result<()> {
        self.send_reliable(Command::Color(hue))
    }

    /// Set brightness in percent; values above 100 are clamped.
    pub fn brightness(&mut self, level: u8) -> Result<()> {
        self.send_reliable(Command::Brightness(level))
    }

    /// Start a built-in animation.
    pub fn mode(&mut self, mode: u8) -> Result<()> {
        self.send_reliable(Command::Mode(mode))
    }

    pub fn mode_slow(&mut self) -> Result<()> {
        self.send_reliable(Command::ModeSlow)
    }

    pub fn mode_fast(&mut self) -> Result<()> {
        self.send_reliable(Command::ModeFast)
    }

    /// Flash sequence: on, full brightness, alert animation.
    ///
    /// Stops at the first step that fails.
    pub fn alert(&mut self) -> Result<()> {
        let delay = self.config.alert_step_delay();
        self.on()?;
        pause(delay);
        self.brightness(MAX_BRIGHTNESS)?;
        pause(delay);
        self.mode(ALERT_MODE)
    }

    /// Release the command socket.
    pub fn close(self) {
        info!("Closing bridge client");
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Transport wrapper that emits packet events.
struct ObservableTransport<'a, T: BridgeTransport, O: BridgeObserver> {
    inner: &'a T,
    observer: &'a O,
}

impl<'a, T: BridgeTransport, O: BridgeObserver> BridgeTransport for ObservableTransport<'a, T, O> {
    fn send_to(&self, data: &[u8], addr: SocketAddr) -> std::result::Result<usize, TransportError> {
        let res = self.inner.send_to(data, addr);
        if res.is_ok() {
            self.observer.on_event(&BridgeEvent::Packet {
                direction: PacketDirection::Tx,
                length: data.len(),
                data: data.to_vec(),
            });
        }
        res
    }

    fn recv_from(
        &self,
        timeout: Duration,
    ) -> std::result::Result<(Vec<u8>, SocketAddr), TransportError> {
        let res = self.inner.recv_from(timeout);
        if let Ok((data, _)) = &res {
            self.observer.on_event(&BridgeEvent::Packet {
                direction: PacketDirection::Rx,
                length: data.len(),
                data: data.clone(),
            });
        }
        res
    }

    fn drain(&self) -> std::result::Result<usize, TransportError> {
        self.inner.drain()
    }

    fn local_addr(&self) -> std::result::Result<SocketAddr, TransportError> {
        self.inner.local_addr()
    }
}
