//! Atomic publication of configuration snapshots
//!
//! Readers take an `Arc<Config>` and keep using it for as long as they like;
//! a reload never mutates a snapshot that has been handed out.

use crate::config::{Config, load};
use crate::system::System;
use anyhow::Result;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{info, warn};

/// Holds the current configuration and swaps in new ones on reload
#[derive(Debug)]
pub struct ConfigAgent {
    current: RwLock<Arc<Config>>,
    reload_lock: Mutex<()>,
}

impl ConfigAgent {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
            reload_lock: Mutex::new(()),
        }
    }

    /// The snapshot most recently published
    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*current)
    }

    /// Load a fresh configuration and publish it
    ///
    /// Reloads are serialized. On failure the previous snapshot stays in place.
    ///
    /// # Errors
    ///
    /// Returns the load error unchanged.
    pub fn reload(&self, system: &dyn System, main_path: &str, job_path: &str) -> Result<()> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);

        match load(system, main_path, job_path) {
            Ok(config) => {
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
                info!(main_path, job_path, "Published new configuration");
                Ok(())
            }
            Err(err) => {
                warn!(main_path, job_path, error = %format!("{err:#}"), "Reload failed, keeping previous configuration");
                Err(err)
            }
        }
    }
}
