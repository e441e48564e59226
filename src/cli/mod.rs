//! Command-line interface module
//!
//! Handles argument parsing for the `checkconfig` binary

pub mod args;

pub use args::*;
