//! Mock UDP transport for testing.
//!
//! Replies are scripted per send: each `send_to` releases the next queued
//! batch into the inbox, as if the bridge answered it. Datagrams placed with
//! `deliver` are already waiting before the next send, so `drain` drops them.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::traits::{BridgeTransport, TransportError};
use crate::protocol::constants::{ACK_MIN_LEN, ACK_SEQUENCE_OFFSET, ACK_STATUS_OFFSET};

type Responder = Box<dyn Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync>;

/// One scripted datagram. `None` as sender means the address the
/// triggering send went to.
pub type ScriptedReply = (Option<SocketAddr>, Vec<u8>);

/// Mock transport for unit testing session and dispatcher logic.
pub struct MockTransport {
    /// Datagrams waiting to be read, with their sender.
    inbox: Arc<Mutex<VecDeque<(SocketAddr, Vec<u8>)>>>,
    /// Replies released one batch per send.
    script: Arc<Mutex<VecDeque<Vec<ScriptedReply>>>>,
    /// Captured sends with their destination.
    write_log: Arc<Mutex<Vec<(SocketAddr, Vec<u8>)>>>,
    /// Simulated bridge used once the script runs out.
    responder: Option<Responder>,
    local: SocketAddr,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inbox: Arc::new(Mutex::new(VecDeque::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            write_log: Arc::new(Mutex::new(Vec::new())),
            responder: None,
            local: SocketAddr::from(([0, 0, 0, 0], 5987)),
        }
    }

    /// Answer every send with `responder(sent)`, if it returns a reply.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Script the replies to one send. Batches are used up in order, one
    /// per `send_to`.
    pub fn queue_batch(&self, replies: Vec<ScriptedReply>) {
        self.script.lock().unwrap().push_back(replies);
    }

    /// Script a single reply.
    pub fn queue_reply(&self, reply: &[u8]) {
        self.queue_batch(vec![(None, reply.to_vec())]);
    }

    /// Script an acknowledgment echoing `sequence` with `status`.
    pub fn queue_ack(&self, sequence: u8, status: u8) {
        self.queue_reply(&ack_reply(sequence, status));
    }

    /// Script a send that gets no answer.
    pub fn queue_silence(&self) {
        self.queue_batch(Vec::new());
    }

    /// Put a datagram in the inbox right away, as if it arrived late.
    pub fn deliver(&self, from: SocketAddr, data: &[u8]) {
        self.inbox.lock().unwrap().push_back((from, data.to_vec()));
    }

    /// Get all captured payloads.
    pub fn get_writes(&self) -> Vec<Vec<u8>> {
        self.write_log
            .lock()
            .unwrap()
            .iter()
            .map(|(_, data)| data.clone())
            .collect()
    }

    /// Get all destinations written to.
    pub fn get_destinations(&self) -> Vec<SocketAddr> {
        self.write_log
            .lock()
            .unwrap()
            .iter()
            .map(|(addr, _)| *addr)
            .collect()
    }

    /// Clear captured writes.
    pub fn clear_writes(&self) {
        self.write_log.lock().unwrap().clear();
    }

    /// Number of datagrams waiting in the inbox.
    pub fn pending_replies(&self) -> usize {
        self.inbox.lock().unwrap().len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Build an acknowledgment datagram as the bridge sends it.
pub fn ack_reply(sequence: u8, status: u8) -> Vec<u8> {
    let mut reply = vec![0u8; ACK_MIN_LEN];
    reply[0] = 0x88;
    reply[4] = 0x03;
    reply[ACK_SEQUENCE_OFFSET] = sequence;
    reply[ACK_STATUS_OFFSET] = status;
    reply
}

impl BridgeTransport for MockTransport {
    fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<usize, TransportError> {
        self.write_log.lock().unwrap().push((addr, data.to_vec()));

        let scripted = self.script.lock().unwrap().pop_front();
        let replies: Vec<(SocketAddr, Vec<u8>)> = match scripted {
            Some(batch) => batch
                .into_iter()
                .map(|(from, reply)| (from.unwrap_or(addr), reply))
                .collect(),
            None => self
                .responder
                .as_ref()
                .and_then(|r| r(data))
                .map(|reply| vec![(addr, reply)])
                .unwrap_or_default(),
        };
        self.inbox.lock().unwrap().extend(replies);
        Ok(data.len())
    }

    fn recv_from(&self, timeout: Duration) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        self.inbox
            .lock()
            .unwrap()
            .pop_front()
            .map(|(from, data)| (data, from))
            .ok_or(TransportError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    fn drain(&self) -> Result<usize, TransportError> {
        let mut inbox = self.inbox.lock().unwrap();
        let dropped = inbox.len();
        inbox.clear();
        Ok(dropped)
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bridge() -> SocketAddr {
        "192.168.1.50:5987".parse().unwrap()
    }

    #[test]
    fn test_mock_script_answers_one_send_each() {
        let mock = MockTransport::new();
        mock.queue_reply(b"first");
        mock.queue_silence();
        mock.queue_ack(4, 0);

        mock.send_to(b"a", bridge()).unwrap();
        assert_eq!(
            mock.recv_from(Duration::from_secs(1)).unwrap(),
            (b"first".to_vec(), bridge())
        );

        mock.send_to(b"b", bridge()).unwrap();
        let err = mock.recv_from(Duration::from_millis(250)).unwrap_err();
        assert!(matches!(err, TransportError::Timeout { timeout_ms: 250 }));

        mock.send_to(b"c", bridge()).unwrap();
        let (reply, _) = mock.recv_from(Duration::from_secs(1)).unwrap();
        assert_eq!(reply, ack_reply(4, 0));
    }

    #[test]
    fn test_mock_batch_keeps_senders() {
        let other: SocketAddr = "192.168.1.77:5987".parse().unwrap();
        let mock = MockTransport::new();
        mock.queue_batch(vec![(Some(other), b"x".to_vec()), (None, b"y".to_vec())]);

        mock.send_to(b"go", bridge()).unwrap();
        assert_eq!(mock.pending_replies(), 2);
        assert_eq!(mock.recv_from(Duration::ZERO).unwrap().1, other);
        assert_eq!(mock.recv_from(Duration::ZERO).unwrap().1, bridge());
    }

    #[test]
    fn test_mock_drain() {
        let mock = MockTransport::new();
        mock.deliver(bridge(), b"late");
        mock.deliver(bridge(), b"later");

        assert_eq!(mock.drain().unwrap(), 2);
        assert_eq!(mock.pending_replies(), 0);
        assert_eq!(mock.drain().unwrap(), 0);
    }

    #[test]
    fn test_mock_write_capture() {
        let mock = MockTransport::new();
        mock.send_to(b"Hello", bridge()).unwrap();
        mock.send_to(b"World", bridge()).unwrap();

        assert_eq!(mock.get_writes(), vec![b"Hello".to_vec(), b"World".to_vec()]);
        assert_eq!(mock.get_destinations(), vec![bridge(), bridge()]);

        mock.clear_writes();
        assert!(mock.get_writes().is_empty());
    }

    #[test]
    fn test_mock_responder() {
        let mock = MockTransport::with_responder(|sent| {
            (sent == b"knock").then(|| b"who".to_vec())
        });
        mock.send_to(b"knock", bridge()).unwrap();
        mock.send_to(b"ignored", bridge()).unwrap();

        assert_eq!(mock.pending_replies(), 1);
        assert_eq!(mock.recv_from(Duration::from_secs(1)).unwrap().0, b"who");
    }
}
