//! Label-selected environment bundles merged into matching jobs

use crate::config::jobs::{EnvVar, JobBase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environment variables injected into every job whose labels match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Labels a job must carry, with equal values, for the preset to apply
    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default")]
    pub env: Vec<EnvVar>,
}

impl Preset {
    /// Whether every selector label is present on `labels` with the same value
    #[must_use]
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.labels
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

/// Append the env of every matching preset to the job's primary container
///
/// Presets are applied in the order given and accumulate; repeated variable
/// names are kept. Jobs without a pod spec are left untouched.
pub fn apply_presets(job: &mut JobBase, presets: &[Preset]) {
    let matching: Vec<&Preset> = presets.iter().filter(|p| p.matches(&job.labels)).collect();
    if matching.is_empty() {
        return;
    }

    let Some(container) = job.primary_container_mut() else {
        return;
    };
    for preset in matching {
        container.env.extend(preset.env.iter().cloned());
    }
}
