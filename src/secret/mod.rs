//! Hot-reloading store of file-backed secrets
//!
//! Secrets are read once when the store starts and then re-read on every
//! tick of a background thread. Readers always see the last value that was
//! read successfully.

pub mod store;
pub mod ticker;

pub use store::{DEFAULT_REFRESH_INTERVAL, SecretStore};
pub use ticker::{IntervalTicker, ManualTicker, TickHandle, Ticker};
