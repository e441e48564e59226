//! Log viewer configuration for the deck front end

use crate::error::ConfigError;
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Size limit used when the configuration leaves it unset
pub const DEFAULT_SIZE_LIMIT: i64 = 100_000_000;

/// Renamed viewers and the names they were renamed to
const DEPRECATED_VIEWERS: [(&str, &str); 3] = [
    ("metadata-viewer", "metadata"),
    ("build-log-viewer", "buildlog"),
    ("junit-viewer", "junit"),
];

/// Settings for the deck front end
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default")]
    pub spyglass: Spyglass,
}

/// Artifact viewer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spyglass {
    /// Largest artifact, in bytes, that viewers will load
    #[serde(default, deserialize_with = "deserialize_size_limit")]
    pub size_limit: i64,

    /// Artifact path expression to the viewers that render matching files
    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default")]
    pub viewers: BTreeMap<String, Vec<String>>,

    /// Compiled form of every key of `viewers`
    #[serde(skip)]
    pub regex_cache: HashMap<String, Regex>,
}

impl Spyglass {
    /// Default the size limit, rename legacy viewers and compile expressions
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Spyglass`] for a negative size limit or a viewer
    /// key that is not a valid regular expression.
    pub fn finalize(&mut self) -> Result<()> {
        if self.size_limit == 0 {
            self.size_limit = DEFAULT_SIZE_LIMIT;
        } else if self.size_limit < 0 {
            return Err(ConfigError::spyglass(format!(
                "invalid value for deck.spyglass.size_limit, must be >= 0, got {}",
                self.size_limit
            ))
            .into());
        }

        for names in self.viewers.values_mut() {
            for name in names.iter_mut() {
                if let Some((_, current)) = DEPRECATED_VIEWERS.iter().find(|(old, _)| *old == name.as_str()) {
                    debug!(viewer = %name, renamed = current, "Renaming deprecated spyglass viewer");
                    *name = (*current).to_owned();
                }
            }
        }

        self.regex_cache.clear();
        for pattern in self.viewers.keys() {
            let re = Regex::new(pattern).map_err(|e| {
                ConfigError::spyglass(format!("cannot compile viewer expression '{pattern}': {e}"))
            })?;
            self.regex_cache.insert(pattern.clone(), re);
        }
        Ok(())
    }

    /// Viewers whose expression matches an artifact path, in key order
    #[must_use]
    pub fn viewers_for(&self, artifact: &str) -> Vec<&str> {
        self.viewers
            .iter()
            .filter(|(pattern, _)| {
                self.regex_cache
                    .get(pattern.as_str())
                    .is_some_and(|re| re.is_match(artifact))
            })
            .flat_map(|(_, names)| names.iter().map(String::as_str))
            .collect()
    }
}

/// YAML numbers such as `500e+6` decode as floats
#[derive(Deserialize)]
#[serde(untagged)]
enum SizeLimit {
    Int(i64),
    Float(f64),
}

fn deserialize_size_limit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match SizeLimit::deserialize(deserializer)? {
        SizeLimit::Int(value) => Ok(value),
        SizeLimit::Float(value) => {
            if !value.is_finite() || value.fract() != 0.0 || value.abs() > 9.0e18 {
                return Err(serde::de::Error::custom(format!(
                    "size_limit must be a whole number of bytes, got {value}"
                )));
            }
            #[allow(
                clippy::cast_possible_truncation,
                clippy::as_conversions,
                reason = "checked finite, whole and within i64 range above"
            )]
            let limit = value as i64;
            Ok(limit)
        }
    }
}
