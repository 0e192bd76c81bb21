//! Broadcast discovery over UDP.

use std::io::{self, ErrorKind};
use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use super::{DiscoveredBridge, Discover, DiscoveryError, parse_announcement};
use crate::protocol::constants::{DISCOVERY_TOKEN, MAX_DATAGRAM};

/// Pause after a socket error before reading again.
const ERROR_BACKOFF: Duration = Duration::from_millis(20);

/// Broadcasts the discovery token and waits for an announcement.
///
/// A fresh socket is opened for every call and dropped before returning.
#[derive(Debug, Clone)]
pub struct BroadcastDiscovery {
    bind: SocketAddr,
    target: SocketAddr,
}

impl BroadcastDiscovery {
    pub fn new(bind: SocketAddr, target: SocketAddr) -> Self {
        Self { bind, target }
    }

    /// Read announcements until one parses or `deadline` passes.
    ///
    /// `read` fills the buffer within the given budget, like a socket read
    /// with that timeout armed.
    fn listen<R>(
        mut read: R,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<DiscoveredBridge, DiscoveryError>
    where
        R: FnMut(&mut [u8], Duration) -> io::Result<(usize, SocketAddr)>,
    {
        let mut buf = [0u8; MAX_DATAGRAM];
        let mut errors = 0u32;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DiscoveryError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            match read(&mut buf, remaining) {
                Ok((n, from)) => match parse_announcement(&buf[..n]) {
                    Some(bridge) => {
                        info!(ip = %bridge.ip, mac = %bridge.mac, model = %bridge.model, "Bridge announced");
                        return Ok(bridge);
                    }
                    None => {
                        debug!(from = %from, len = n, "Ignoring malformed announcement");
                    }
                },
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) => {
                    // e.g. ICMP unreachable surfacing on the socket
                    errors += 1;
                    if errors == 1 {
                        warn!(error = %e, "Transient discovery read error");
                    } else {
                        debug!(error = %e, errors, "Discovery read error repeated");
                    }
                    thread::sleep(ERROR_BACKOFF.min(remaining));
                }
            }
        }
    }
}

impl Discover for BroadcastDiscovery {
    #[instrument(skip(self), fields(target = %self.target))]
    fn discover(&self, timeout: Duration) -> Result<DiscoveredBridge, DiscoveryError> {
        let deadline = Instant::now() + timeout;
        let socket = UdpSocket::bind(self.bind)?;
        socket.set_broadcast(true)?;
        socket.send_to(DISCOVERY_TOKEN, self.target)?;
        debug!("Discovery token sent");

        Self::listen(
            |buf, remaining| {
                socket.set_read_timeout(Some(remaining))?;
                socket.recv_from(buf)
            },
            deadline,
            timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    /// Fake bridge that answers the discovery token with each reply in turn.
    fn spawn_bridge(replies: Vec<&'static [u8]>) -> (SocketAddr, thread::JoinHandle<Vec<u8>>) {
        let socket = UdpSocket::bind(loopback()).unwrap();
        let addr = socket.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 64];
            let (n, from) = socket.recv_from(&mut buf).unwrap();
            for reply in replies {
                socket.send_to(reply, from).unwrap();
            }
            buf[..n].to_vec()
        });
        (addr, handle)
    }

    #[test]
    fn test_discovers_first_valid_announcement() {
        let (bridge, handle) = spawn_bridge(vec![
            &b"10.0.0.9,AABBCC"[..],
            &b"garbage"[..],
            &b"10.0.0.5,AABBCC,modelX"[..],
            &b"10.0.0.6,DDEEFF,modelY"[..],
        ]);

        let found = BroadcastDiscovery::new(loopback(), bridge)
            .discover(Duration::from_secs(2))
            .unwrap();

        assert_eq!(found.ip, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)));
        assert_eq!(handle.join().unwrap(), DISCOVERY_TOKEN);
    }

    #[test]
    fn test_times_out_on_malformed_replies_only() {
        let (bridge, handle) = spawn_bridge(vec![&b"a,b"[..], &b"a,b,c,d"[..]]);

        let start = Instant::now();
        let err = BroadcastDiscovery::new(loopback(), bridge)
            .discover(Duration::from_millis(200))
            .unwrap_err();

        assert!(matches!(err, DiscoveryError::Timeout { timeout_ms: 200 }));
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(start.elapsed() < Duration::from_secs(2));
        handle.join().unwrap();
    }

    #[test]
    fn test_repeated_read_errors_back_off() {
        let timeout = Duration::from_millis(200);
        let mut reads = 0;

        let err = BroadcastDiscovery::listen(
            |_, _| {
                reads += 1;
                Err(io::Error::from(ErrorKind::ConnectionReset))
            },
            Instant::now() + timeout,
            timeout,
        )
        .unwrap_err();

        assert!(matches!(err, DiscoveryError::Timeout { timeout_ms: 200 }));
        // About one read per backoff pause, not a busy loop.
        assert!(reads >= 2, "only {} reads", reads);
        assert!(reads <= 12, "{} reads", reads);
    }
}
