//! Custom error types with exit codes

use std::path::PathBuf;
use thiserror::Error;

use crate::config::JobType;

/// Main error type for configuration loading and secret handling
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// Parse Error - a YAML document could not be read or decoded
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    /// Schema Error - a document does not have the expected shape
    #[error("Schema error in {path}:\n{message}")]
    Schema { path: String, message: String },

    /// Spyglass Error - invalid log viewer configuration
    #[error("Spyglass error: {message}")]
    Spyglass { message: String },

    /// Invalid Job - a single job definition failed defaulting or validation
    #[error("Invalid {job_type} job {name}{}: {message}", repo_suffix(.repo.as_deref()))]
    InvalidJob {
        job_type: JobType,
        repo: Option<String>,
        name: String,
        message: String,
    },

    /// Duplicate - two same-named jobs would run on a common branch
    #[error("Duplicated {job_type} job {name} found in {repo}")]
    Duplicate {
        job_type: JobType,
        repo: String,
        name: String,
    },

    /// Secret Error - a watched secret file could not be read
    #[error("Secret error: failed to read {}: {source}", .path.display())]
    Secret {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn repo_suffix(repo: Option<&str>) -> String {
    repo.map(|r| format!(" in {r}")).unwrap_or_default()
}

impl ConfigError {
    /// Get the appropriate exit code for this error type
    #[must_use]
    #[inline]
    pub const fn exit_code(&self) -> i32 {
        match *self {
            Self::Parse { .. } => 1,
            Self::Schema { .. } => 2,
            Self::Spyglass { .. } => 3,
            Self::InvalidJob { .. } => 4,
            Self::Duplicate { .. } => 5,
            Self::Secret { .. } => 6,
        }
    }

    /// Create a parse error
    #[inline]
    pub fn parse<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a schema error
    #[inline]
    pub fn schema<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a spyglass error
    #[inline]
    pub fn spyglass<S: Into<String>>(message: S) -> Self {
        Self::Spyglass {
            message: message.into(),
        }
    }

    /// Create an invalid job error
    #[inline]
    pub fn invalid_job<N: Into<String>, S: Into<String>>(
        job_type: JobType,
        repo: Option<&str>,
        name: N,
        message: S,
    ) -> Self {
        Self::InvalidJob {
            job_type,
            repo: repo.map(str::to_owned),
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate job error
    #[inline]
    pub fn duplicate<R: Into<String>, N: Into<String>>(job_type: JobType, repo: R, name: N) -> Self {
        Self::Duplicate {
            job_type,
            repo: repo.into(),
            name: name.into(),
        }
    }

    /// Create a secret read error
    #[inline]
    pub fn secret<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Secret {
            path: path.into(),
            source,
        }
    }
}
