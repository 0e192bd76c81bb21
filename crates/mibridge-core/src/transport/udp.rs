//! std UDP socket transport.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, info, instrument};

use super::traits::{BridgeTransport, TransportError};
use crate::protocol::constants::MAX_DATAGRAM;

/// Long-lived command socket owned by a client.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Bind the command socket. Failure here is a startup error.
    #[instrument(level = "info")]
    pub fn bind(addr: SocketAddr) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).map_err(|e| TransportError::BindFailed {
            addr,
            reason: e.to_string(),
        })?;

        info!(local = %addr, "Command socket bound");
        Ok(Self { socket })
    }
}

impl BridgeTransport for UdpTransport {
    #[instrument(skip(self, data), fields(len = data.len()))]
    fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<usize, TransportError> {
        let n = self
            .socket
            .send_to(data, addr)
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        debug!(bytes_written = n, to = %addr, "Send complete");
        Ok(n)
    }

    #[instrument(skip(self))]
    fn recv_from(&self, timeout: Duration) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        let timeout_ms = timeout.as_millis() as u64;
        // A zero read timeout is rejected by the OS.
        if timeout.is_zero() {
            return Err(TransportError::Timeout { timeout_ms });
        }
        self.socket.set_read_timeout(Some(timeout))?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        match self.socket.recv_from(&mut buf) {
            Ok((n, from)) => {
                buf.truncate(n);
                debug!(bytes_read = n, from = %from, "Receive complete");
                Ok((buf, from))
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(TransportError::Timeout { timeout_ms })
            }
            Err(e) => Err(TransportError::ReceiveFailed(e.to_string())),
        }
    }

    fn drain(&self) -> Result<usize, TransportError> {
        self.socket.set_nonblocking(true)?;
        let mut buf = [0u8; MAX_DATAGRAM];
        let mut dropped = 0;
        let result = loop {
            match self.socket.recv_from(&mut buf) {
                Ok((n, from)) => {
                    dropped += 1;
                    debug!(bytes = n, from = %from, "Discarding stale datagram");
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break Ok(dropped),
                // Queued ICMP errors are consumed one per read.
                Err(e) if matches!(e.kind(), ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused) => {}
                Err(e) => break Err(TransportError::ReceiveFailed(e.to_string())),
            }
        };
        self.socket.set_nonblocking(false)?;
        result
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[test]
    fn test_send_and_receive_loopback() {
        let transport = UdpTransport::bind(loopback()).unwrap();
        let peer = UdpSocket::bind(loopback()).unwrap();

        transport
            .send_to(b"ping", peer.local_addr().unwrap())
            .unwrap();
        let mut buf = [0u8; 16];
        let (n, from) = peer.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");

        peer.send_to(b"pong", from).unwrap();
        let (reply, sender) = transport.recv_from(Duration::from_secs(1)).unwrap();
        assert_eq!(reply, b"pong");
        assert_eq!(sender, peer.local_addr().unwrap());
    }

    #[test]
    fn test_recv_times_out() {
        let transport = UdpTransport::bind(loopback()).unwrap();
        let err = transport.recv_from(Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, TransportError::Timeout { timeout_ms: 50 }));
    }

    #[test]
    fn test_drain_discards_waiting_datagrams() {
        let transport = UdpTransport::bind(loopback()).unwrap();
        let local = transport.local_addr().unwrap();
        assert_ne!(local.port(), 0);
        let peer = UdpSocket::bind(loopback()).unwrap();

        assert_eq!(transport.drain().unwrap(), 0);
        peer.send_to(b"old-1", local).unwrap();
        peer.send_to(b"old-2", local).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(transport.drain().unwrap(), 2);

        // Blocking reads work again afterwards.
        peer.send_to(b"new", local).unwrap();
        let (reply, _) = transport.recv_from(Duration::from_secs(1)).unwrap();
        assert_eq!(reply, b"new");
    }

    #[test]
    fn test_recv_from_peer_skips_other_senders() {
        let transport = UdpTransport::bind(loopback()).unwrap();
        let local = transport.local_addr().unwrap();
        let bridge = UdpSocket::bind(loopback()).unwrap();
        let stranger = UdpSocket::bind(loopback()).unwrap();

        stranger.send_to(b"forged", local).unwrap();
        bridge.send_to(b"genuine", local).unwrap();

        let reply = transport
            .recv_from_peer(bridge.local_addr().unwrap(), Duration::from_secs(1))
            .unwrap();
        assert_eq!(reply, b"genuine");

        stranger.send_to(b"forged", local).unwrap();
        let err = transport
            .recv_from_peer(bridge.local_addr().unwrap(), Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout { timeout_ms: 100 }));
    }

    #[test]
    fn test_bind_conflict_is_reported() {
        let first = UdpSocket::bind(loopback()).unwrap();
        let taken = first.local_addr().unwrap();
        let err = UdpTransport::bind(taken).err().unwrap();
        assert!(matches!(err, TransportError::BindFailed { addr, .. } if addr == taken));
    }
}
