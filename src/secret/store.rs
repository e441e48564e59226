//! The secret store and its refresh thread

use crate::error::ConfigError;
use crate::secret::ticker::{IntervalTicker, Ticker};
use crate::system::{RealSystem, System};
use anyhow::{Context as _, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// Refresh interval used by [`SecretStore::start_polling`]
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

type SecretMap = Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>;

/// Cache of secret file contents kept fresh by a background thread
///
/// The thread stops when [`SecretStore::stop`] is called or the store is
/// dropped. Values already read stay available after that.
pub struct SecretStore {
    secrets: SecretMap,
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SecretStore {
    /// Read every path once, then start refreshing them on `ticker`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Secret`] for the first path that cannot be
    /// read, in which case no thread is started.
    pub fn start<I, P>(system: Arc<dyn System>, paths: I, ticker: Box<dyn Ticker>) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();

        let mut initial = HashMap::with_capacity(paths.len());
        for path in &paths {
            let bytes = system
                .read(path)
                .map_err(|e| ConfigError::secret(path.clone(), e))?;
            initial.insert(path.clone(), bytes);
        }
        let secrets: SecretMap = Arc::new(RwLock::new(initial));

        let (stop_tx, stop_rx) = mpsc::channel();
        let worker_secrets = Arc::clone(&secrets);
        let worker = thread::Builder::new()
            .name("secret-refresh".to_owned())
            .spawn(move || {
                let mut ticker = ticker;
                while ticker.wait(&stop_rx) {
                    refresh(system.as_ref(), &paths, &worker_secrets);
                    ticker.refreshed();
                }
                debug!("Secret refresh loop stopped");
            })
            .context("Failed to spawn secret refresh thread")?;

        Ok(Self {
            secrets,
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        })
    }

    /// Start a store over the real filesystem, refreshing every second
    ///
    /// # Errors
    ///
    /// See [`SecretStore::start`].
    pub fn start_polling<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self::start(
            Arc::new(RealSystem::new()),
            paths,
            Box::new(IntervalTicker::new(DEFAULT_REFRESH_INTERVAL)),
        )
    }

    /// The last successfully read contents of `path`
    ///
    /// Returns `None` for paths the store was not started with.
    #[must_use]
    pub fn get_secret<P: AsRef<Path>>(&self, path: P) -> Option<Vec<u8>> {
        self.secrets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path.as_ref())
            .cloned()
    }

    /// Stop the refresh thread and wait for it to exit
    ///
    /// Calling this more than once is harmless.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The loop may already have exited on its own
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Secret refresh thread panicked");
            }
        }
    }
}

impl Drop for SecretStore {
    fn drop(&mut self) {
        self.stop();
    }
}

fn refresh(system: &dyn System, paths: &[PathBuf], secrets: &RwLock<HashMap<PathBuf, Vec<u8>>>) {
    for path in paths {
        match system.read(path) {
            Ok(bytes) => {
                let mut map = secrets.write().unwrap_or_else(PoisonError::into_inner);
                if map.get(path) != Some(&bytes) {
                    debug!(path = %path.display(), "Secret changed");
                }
                map.insert(path.clone(), bytes);
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to refresh secret, keeping previous value");
            }
        }
    }
}
