//! One-shot write acknowledgement between a journey write and the response
//! waiting on it.
//!
//! Each flush creates its own channel, so there is no process-wide registry
//! to correlate keys through. The sender is consumed on notify, which makes
//! a second notification impossible.

use std::time::Duration;
use tokio::sync::oneshot;
use tracing::warn;

/// Create a connected signal/listener pair for a single write.
pub fn channel() -> (WriteSignal, WriteListener) {
    let (tx, rx) = oneshot::channel();
    (WriteSignal { tx }, WriteListener { rx })
}

/// Sending half, handed to [`JourneyStore::set_and_signal`](crate::JourneyStore::set_and_signal).
#[derive(Debug)]
pub struct WriteSignal {
    tx: oneshot::Sender<String>,
}

impl WriteSignal {
    /// Announce that the write for `key` has completed.
    pub fn notify(self, key: &str) {
        // The listener may already have given up waiting.
        let _ = self.tx.send(key.to_string());
    }
}

/// How a wait on a [`WriteListener`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// The write for the expected key completed.
    Signalled,
    /// No notification arrived within the bound.
    TimedOut,
    /// The signal was dropped, or fired for a different key.
    Abandoned,
}

/// Receiving half, awaited by the response before it is sent.
#[derive(Debug)]
pub struct WriteListener {
    rx: oneshot::Receiver<String>,
}

impl WriteListener {
    /// Wait for the write of `key`, for at most `timeout`.
    pub async fn wait_for(self, key: &str, timeout: Duration) -> SignalOutcome {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(signalled)) if signalled == key => SignalOutcome::Signalled,
            Ok(Ok(signalled)) => {
                warn!(expected = key, signalled = %signalled, "Write signal fired for unexpected key");
                SignalOutcome::Abandoned
            }
            Ok(Err(_)) => SignalOutcome::Abandoned,
            Err(_) => SignalOutcome::TimedOut,
        }
    }
}
