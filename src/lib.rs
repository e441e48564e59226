//! `prow-config` - Job configuration engine for a CI orchestrator
//!
//! Loads a main configuration and any job-configuration fragments, folds
//! them into one snapshot, fills defaults, validates every job, applies
//! presets and rejects conflicting duplicates. Also provides a store of
//! file-backed secrets that refreshes itself in the background.

pub mod cli;
pub mod config;
pub mod error;
pub mod secret;
pub mod system;

use anyhow::{Context as _, Result};
use cli::Args;
use config::Config;
use system::System;

/// Main entry point for the checkconfig binary
///
/// # Errors
///
/// Returns the first loading, validation or serialization error.
pub fn run(args: &Args, system: &dyn System) -> Result<()> {
    let config = Config::load(system, &args.config_path, &args.job_config_path)?;

    if args.print_config {
        let rendered = serde_yaml::to_string(&config).context("Failed to render configuration")?;
        // Output to stdout (not using logging)
        print!("{rendered}");
    }

    Ok(())
}
