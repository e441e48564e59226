//! Configuration management module
//!
//! Reads the main configuration and any job-configuration fragments, folds
//! them together, then defaults, validates and preset-applies every job and
//! rejects same-named jobs whose branch filters overlap.

pub mod agent;
pub mod brancher;
pub mod decoration;
pub mod defaults;
pub mod duration;
pub mod jobs;
pub mod merge;
pub mod nullable;
pub mod presets;
pub mod schema;
pub mod spyglass;
pub mod validation;
pub mod yaml;

pub use brancher::Brancher;
pub use decoration::{DecorationConfig, GcsConfiguration, UtilityImages};
pub use duration::JobDuration;
pub use jobs::{
    Agent, Container, EnvVar, JobBase, JobType, Namespace, Periodic, PodSpec, Postsubmit, Presubmit,
    UtilityConfig,
};
pub use presets::Preset;
pub use spyglass::{Deck, Spyglass};

use crate::error::ConfigError;
use crate::system::System;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Namespace jobs run in when the main configuration does not set one
pub const DEFAULT_POD_NAMESPACE: &str = "default";

fn default_pod_namespace() -> String {
    DEFAULT_POD_NAMESPACE.to_owned()
}

/// Settings for the component that turns jobs into pods
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plank {
    /// Decoration defaults every decorated job is merged over
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_decoration_config: Option<DecorationConfig>,
}

/// Process-wide settings from the main configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProwConfig {
    /// Namespace every pod-based job runs in
    #[serde(default = "default_pod_namespace")]
    pub pod_namespace: String,

    /// Deprecated; parsed for compatibility and never used for defaulting
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plumber_job_namespace: String,

    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default")]
    pub deck: Deck,

    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default")]
    pub plank: Plank,
}

impl Default for ProwConfig {
    fn default() -> Self {
        Self {
            pod_namespace: default_pod_namespace(),
            plumber_job_namespace: String::new(),
            deck: Deck::default(),
            plank: Plank::default(),
        }
    }
}

/// Jobs and presets, as found in the main configuration or in a fragment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<Preset>,

    /// Presubmits keyed by `org/repo`
    #[serde(default, deserialize_with = "crate::config::nullable::jobs_by_repo", skip_serializing_if = "BTreeMap::is_empty")]
    pub presubmits: BTreeMap<String, Vec<Presubmit>>,

    /// Postsubmits keyed by `org/repo`
    #[serde(default, deserialize_with = "crate::config::nullable::jobs_by_repo", skip_serializing_if = "BTreeMap::is_empty")]
    pub postsubmits: BTreeMap<String, Vec<Postsubmit>>,

    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub periodics: Vec<Periodic>,
}

/// A fully loaded, validated configuration snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub prow_config: ProwConfig,

    #[serde(flatten)]
    pub job_config: JobConfig,
}

impl Config {
    /// Load the main configuration and optional job configuration
    ///
    /// See [`load`].
    pub fn load(system: &dyn System, main_path: &str, job_path: &str) -> Result<Self> {
        load(system, main_path, job_path)
    }

    /// Presubmits for the given repositories, or for all when `repos` is empty
    #[must_use]
    pub fn all_presubmits(&self, repos: &[&str]) -> Vec<&Presubmit> {
        select_repos(&self.job_config.presubmits, repos)
    }

    /// Postsubmits for the given repositories, or for all when `repos` is empty
    #[must_use]
    pub fn all_postsubmits(&self, repos: &[&str]) -> Vec<&Postsubmit> {
        select_repos(&self.job_config.postsubmits, repos)
    }

    #[must_use]
    pub fn all_periodics(&self) -> &[Periodic] {
        &self.job_config.periodics
    }

    #[must_use]
    pub fn presubmits_for(&self, repo: &str) -> &[Presubmit] {
        self.job_config.presubmits.get(repo).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn postsubmits_for(&self, repo: &str) -> &[Postsubmit] {
        self.job_config.postsubmits.get(repo).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn presets(&self) -> &[Preset] {
        &self.job_config.presets
    }

    /// Default, validate and preset-apply every job, then reject duplicates
    fn finalize(&mut self) -> Result<()> {
        if self.prow_config.pod_namespace.is_empty() {
            self.prow_config.pod_namespace = default_pod_namespace();
        }
        self.prow_config.deck.spyglass.finalize()?;

        let prow = &self.prow_config;
        let presets = &self.job_config.presets;

        for (repo, jobs) in &mut self.job_config.presubmits {
            for job in jobs.iter_mut() {
                defaults::default_presubmit(job, prow);
                job.compile()
                    .and_then(|()| validation::validate_presubmit(job, &prow.pod_namespace))
                    .map_err(|e| {
                        ConfigError::invalid_job(JobType::Presubmit, Some(repo.as_str()), &job.base.name, format!("{e:#}"))
                    })?;
                presets::apply_presets(&mut job.base, presets);
            }
        }

        for (repo, jobs) in &mut self.job_config.postsubmits {
            for job in jobs.iter_mut() {
                defaults::default_postsubmit(job, prow);
                job.compile()
                    .and_then(|()| validation::validate_postsubmit(job, &prow.pod_namespace))
                    .map_err(|e| {
                        ConfigError::invalid_job(JobType::Postsubmit, Some(repo.as_str()), &job.base.name, format!("{e:#}"))
                    })?;
                presets::apply_presets(&mut job.base, presets);
            }
        }

        for job in &mut self.job_config.periodics {
            defaults::default_periodic(job, prow);
            validation::validate_periodic(job, &prow.pod_namespace).map_err(|e| {
                ConfigError::invalid_job(JobType::Periodic, None, &job.base.name, format!("{e:#}"))
            })?;
            presets::apply_presets(&mut job.base, presets);
        }

        merge::check_duplicates(&self.job_config)
    }
}

fn select_repos<'a, T>(jobs: &'a BTreeMap<String, Vec<T>>, repos: &[&str]) -> Vec<&'a T> {
    jobs.iter()
        .filter(|(repo, _)| repos.is_empty() || repos.contains(&repo.as_str()))
        .flat_map(|(_, list)| list.iter())
        .collect()
}

/// Load the main configuration and optional job configuration
///
/// `job_path` may be empty, a single file, or a directory whose files are
/// each read as a fragment in sorted order. Either the whole set loads into
/// one [`Config`] or an error is returned.
///
/// # Errors
///
/// Returns an error if any file cannot be read or parsed, if any job fails
/// validation, or if two same-named jobs can run against a common branch.
pub fn load(system: &dyn System, main_path: &str, job_path: &str) -> Result<Config> {
    let mut config: Config = yaml::load_document(system, Path::new(main_path))?;

    if !job_path.is_empty() {
        for path in yaml::job_config_files(system, Path::new(job_path))? {
            debug!(path = %path.display(), "Loading job configuration fragment");
            let fragment: JobConfig = yaml::load_document(system, &path)?;
            merge::merge_job_config(&mut config.job_config, fragment);
        }
    }

    config.finalize()?;

    info!(
        presubmits = config.all_presubmits(&[]).len(),
        postsubmits = config.all_postsubmits(&[]).len(),
        periodics = config.all_periodics().len(),
        presets = config.presets().len(),
        "Loaded configuration"
    );
    Ok(config)
}
