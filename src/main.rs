//! # checkconfig
//!
//! Loads a CI job configuration the same way the orchestrator does and
//! reports the first problem it finds.
//!
//! ## Usage
//!
//! ```sh
//! checkconfig --config-path config.yaml --job-config-path jobs/
//! ```
//!
//! The exit code identifies the kind of failure: 1 parse, 2 schema,
//! 3 spyglass, 4 invalid job, 5 duplicate job.

use clap::Parser as _;
use prow_config::cli::Args;
use prow_config::error::ConfigError;
use prow_config::system::RealSystem;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = Args::parse();

    // Keep stdout clean when the configuration itself is the output
    let log_level = if args.verbose {
        "debug"
    } else if args.print_config {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_target(false).with_env_filter(filter).init();

    let system = RealSystem::new();
    match prow_config::run(&args, &system) {
        Ok(()) => {
            info!("Configuration is valid");
            std::process::exit(0);
        }
        Err(err) => {
            error!("{err:#}");
            std::process::exit(
                err.downcast_ref::<ConfigError>()
                    .map_or(1, ConfigError::exit_code),
            );
        }
    }
}
