//! Refresh scheduling for the secret store

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::time::Duration;

/// How often [`ManualTicker`] looks for a stop request while idle
const MANUAL_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Decides when the refresh loop runs
///
/// The loop calls [`Ticker::wait`] before every refresh and
/// [`Ticker::refreshed`] after it.
pub trait Ticker: Send + 'static {
    /// Block until the next refresh is due
    ///
    /// Returns `false` once `stop` fires or its sender is dropped, which ends
    /// the loop.
    fn wait(&mut self, stop: &Receiver<()>) -> bool;

    /// Called once the refresh that followed a successful `wait` completes
    fn refreshed(&mut self) {}
}

/// Ticks at a fixed interval
#[derive(Debug, Clone, Copy)]
pub struct IntervalTicker {
    interval: Duration,
}

impl IntervalTicker {
    #[must_use]
    #[inline]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for IntervalTicker {
    fn wait(&mut self, stop: &Receiver<()>) -> bool {
        matches!(stop.recv_timeout(self.interval), Err(RecvTimeoutError::Timeout))
    }
}

/// Ticks only when its [`TickHandle`] asks it to
///
/// # Example
/// ```
/// use prow_config::secret::{ManualTicker, SecretStore};
/// use prow_config::system::MockSystem;
/// use std::sync::Arc;
///
/// let system = MockSystem::new().with_file("/secrets/token", b"one").unwrap();
/// let (ticker, handle) = ManualTicker::new();
/// let store = SecretStore::start(Arc::new(system.clone()), ["/secrets/token"], Box::new(ticker)).unwrap();
///
/// system.write_file("/secrets/token", b"two").unwrap();
/// assert!(handle.tick());
/// assert_eq!(store.get_secret("/secrets/token"), Some(b"two".to_vec()));
/// ```
#[derive(Debug)]
pub struct ManualTicker {
    ticks: Receiver<SyncSender<()>>,
    pending: Option<SyncSender<()>>,
}

/// Requests ticks from a [`ManualTicker`]
#[derive(Debug, Clone)]
pub struct TickHandle {
    ticks: mpsc::Sender<SyncSender<()>>,
}

impl ManualTicker {
    #[must_use]
    pub fn new() -> (Self, TickHandle) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                ticks: rx,
                pending: None,
            },
            TickHandle { ticks: tx },
        )
    }
}

impl Ticker for ManualTicker {
    fn wait(&mut self, stop: &Receiver<()>) -> bool {
        loop {
            match stop.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => return false,
                Err(TryRecvError::Empty) => {}
            }
            match self.ticks.recv_timeout(MANUAL_POLL_INTERVAL) {
                Ok(ack) => {
                    self.pending = Some(ack);
                    return true;
                }
                Err(RecvTimeoutError::Timeout) => {}
                // No handle left, so nothing can tick again
                Err(RecvTimeoutError::Disconnected) => {
                    let _ = stop.recv();
                    return false;
                }
            }
        }
    }

    fn refreshed(&mut self) {
        if let Some(ack) = self.pending.take() {
            // The handle may have given up waiting
            let _ = ack.send(());
        }
    }
}

impl TickHandle {
    /// Trigger one refresh and wait for it to complete
    ///
    /// Returns `false` if the refresh loop has already stopped.
    #[must_use = "a false result means no refresh happened"]
    pub fn tick(&self) -> bool {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        if self.ticks.send(ack_tx).is_err() {
            return false;
        }
        ack_rx.recv().is_ok()
    }
}
