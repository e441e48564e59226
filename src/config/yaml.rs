//! YAML configuration loading and parsing

use crate::config::schema;
use crate::error::ConfigError;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Load, shape-check and decode one YAML document
///
/// An empty or comment-only document decodes to `T::default()`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the file is missing, unreadable or not
/// valid YAML for `T`, and [`ConfigError::Schema`] if it has the wrong shape.
pub fn load_document<T: DeserializeOwned + Default>(system: &dyn System, path: &Path) -> Result<T> {
    let display = path.display().to_string();

    if !system.exists(path) {
        return Err(ConfigError::parse(display, "configuration file not found").into());
    }

    let content = system
        .read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {display}"))?;

    parse_document(&content, &display)
}

/// Shape-check and decode YAML content; `origin` names it in errors
///
/// # Errors
///
/// See [`load_document`].
pub fn parse_document<T: DeserializeOwned + Default>(content: &str, origin: &str) -> Result<T> {
    if content.trim().is_empty() {
        return Ok(T::default());
    }

    let value: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::parse(origin, describe(&e)))?;
    if value.is_null() {
        return Ok(T::default());
    }

    schema::validate_document(&value, origin)?;

    serde_yaml::from_str(content).map_err(|e| ConfigError::parse(origin, describe(&e)).into())
}

fn describe(error: &serde_yaml::Error) -> String {
    match error.location() {
        Some(location) => format!(
            "line {}, column {}: {error}",
            location.line(),
            location.column()
        ),
        None => error.to_string(),
    }
}

/// Resolve the job-configuration input into the files to load, in order
///
/// A file yields itself. A directory yields its regular files, not
/// descending into subdirectories, sorted by path.
///
/// # Errors
///
/// Returns an error if the path does not exist or cannot be listed.
pub fn job_config_files(system: &dyn System, path: &Path) -> Result<Vec<PathBuf>> {
    if system.is_file(path) {
        return Ok(vec![path.to_path_buf()]);
    }

    if !system.is_dir(path) {
        return Err(ConfigError::parse(
            path.display().to_string(),
            "job configuration path is neither a file nor a directory",
        )
        .into());
    }

    let mut files: Vec<PathBuf> = system
        .read_dir(path)
        .with_context(|| format!("Failed to list job configuration directory: {}", path.display()))?
        .into_iter()
        .filter(|entry| system.is_file(entry))
        .collect();
    files.sort();
    Ok(files)
}
