//! System abstraction for filesystem operations
//!
//! Configuration loading and the secret store read everything through this
//! trait, so tests can swap the real filesystem for an in-memory one.

use std::io;
use std::path::{Path, PathBuf};

pub mod mock;
pub mod real;

pub use mock::MockSystem;
pub use real::RealSystem;

/// Unified trait for the filesystem operations the crate needs
///
/// # Implementations
/// - `RealSystem`: Production implementation using `std::fs`
/// - `MockSystem`: Test implementation using in-memory storage
pub trait System: Send + Sync {
    /// Read entire file contents as a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Read entire file contents as bytes
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path points to a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path points to a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// List the direct children of a directory
    ///
    /// Only entries one level below `path` are returned. The order is
    /// unspecified; callers that need determinism must sort.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}
