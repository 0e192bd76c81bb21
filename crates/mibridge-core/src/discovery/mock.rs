//! Scripted discovery for testing.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{DiscoveredBridge, Discover, DiscoveryError};

/// Discovery double that replays scripted outcomes and counts calls.
///
/// Once the script is exhausted, every call answers with the fallback
/// address, or times out when none is set.
pub struct MockDiscovery {
    script: Mutex<VecDeque<Option<IpAddr>>>,
    fallback: Option<IpAddr>,
    calls: AtomicUsize,
}

impl MockDiscovery {
    /// Always find the bridge at `ip`.
    pub fn found(ip: IpAddr) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(ip),
            calls: AtomicUsize::new(0),
        }
    }

    /// Never find anything.
    pub fn silent() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a one-off outcome ahead of the fallback.
    pub fn push_outcome(&self, outcome: Option<IpAddr>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Discover for MockDiscovery {
    fn discover(&self, timeout: Duration) -> Result<DiscoveredBridge, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        outcome
            .map(|ip| DiscoveredBridge {
                ip,
                mac: "ACCF23000000".to_string(),
                model: "HF-LPB100".to_string(),
            })
            .ok_or(DiscoveryError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_script_then_fallback() {
        let ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 50));
        let mock = MockDiscovery::found(ip);
        mock.push_outcome(None);

        assert!(mock.discover(Duration::from_secs(1)).is_err());
        assert_eq!(mock.discover(Duration::from_secs(1)).unwrap().ip, ip);
        assert_eq!(mock.calls(), 2);
    }

    #[test]
    fn test_silent_times_out() {
        let err = MockDiscovery::silent()
            .discover(Duration::from_millis(1000))
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Timeout { timeout_ms: 1000 }));
    }
}
