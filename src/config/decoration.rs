//! Decoration settings: the sidecar images and upload target used to wrap a job

use crate::config::duration::JobDuration;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Path layout for uploaded artifacts
pub const PATH_STRATEGY_LEGACY: &str = "legacy";
pub const PATH_STRATEGY_SINGLE: &str = "single";
pub const PATH_STRATEGY_EXPLICIT: &str = "explicit";

/// Images of the four utilities injected into a decorated job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityImages {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub clonerefs: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub initupload: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entrypoint: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sidecar: String,
}

impl UtilityImages {
    /// Fill every empty image from `def`
    #[must_use]
    pub fn apply_default(&self, def: &Self) -> Self {
        Self {
            clonerefs: or_default(&self.clonerefs, &def.clonerefs),
            initupload: or_default(&self.initupload, &def.initupload),
            entrypoint: or_default(&self.entrypoint, &def.entrypoint),
            sidecar: or_default(&self.sidecar, &def.sidecar),
        }
    }
}

/// Where job artifacts and logs are uploaded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcsConfiguration {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bucket: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path_strategy: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_org: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_repo: String,
}

impl GcsConfiguration {
    #[must_use]
    pub fn apply_default(&self, def: &Self) -> Self {
        Self {
            bucket: or_default(&self.bucket, &def.bucket),
            path_strategy: or_default(&self.path_strategy, &def.path_strategy),
            default_org: or_default(&self.default_org, &def.default_org),
            default_repo: or_default(&self.default_repo, &def.default_repo),
        }
    }

    /// Check the bucket is set and the path strategy is usable
    ///
    /// # Errors
    ///
    /// Returns an error for a missing bucket, an unknown strategy, or an
    /// explicit strategy without a default org and repo.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(anyhow!("GCS bucket must be set"));
        }
        match self.path_strategy.as_str() {
            PATH_STRATEGY_LEGACY | PATH_STRATEGY_SINGLE => Ok(()),
            PATH_STRATEGY_EXPLICIT => {
                if self.default_org.is_empty() || self.default_repo.is_empty() {
                    return Err(anyhow!(
                        "default org and repo must be set for the '{PATH_STRATEGY_EXPLICIT}' path strategy"
                    ));
                }
                Ok(())
            }
            other => Err(anyhow!(
                "invalid path strategy '{other}', must be one of '{PATH_STRATEGY_LEGACY}', '{PATH_STRATEGY_SINGLE}' or '{PATH_STRATEGY_EXPLICIT}'"
            )),
        }
    }
}

/// Decoration settings for a job or the process-wide default
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationConfig {
    /// Maximum run time before the job is aborted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<JobDuration>,

    /// Time allowed after the timeout signal before a hard kill
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<JobDuration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utility_images: Option<UtilityImages>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcs_configuration: Option<GcsConfiguration>,

    /// Secret holding the upload credentials
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gcs_credentials_secret: String,
}

impl DecorationConfig {
    /// Merge this config over `def`, field by field
    ///
    /// Fields set here win; unset or zero-valued fields inherit from `def`.
    #[must_use]
    pub fn apply_default(&self, def: &Self) -> Self {
        let timeout = self.timeout.filter(|t| !t.is_zero()).or(def.timeout);
        let grace_period = self.grace_period.filter(|g| !g.is_zero()).or(def.grace_period);

        let utility_images = match (self.utility_images.as_ref(), def.utility_images.as_ref()) {
            (Some(own), Some(fallback)) => Some(own.apply_default(fallback)),
            (own, fallback) => own.or(fallback).cloned(),
        };
        let gcs_configuration = match (self.gcs_configuration.as_ref(), def.gcs_configuration.as_ref()) {
            (Some(own), Some(fallback)) => Some(own.apply_default(fallback)),
            (own, fallback) => own.or(fallback).cloned(),
        };

        Self {
            timeout,
            grace_period,
            utility_images,
            gcs_configuration,
            gcs_credentials_secret: or_default(&self.gcs_credentials_secret, &def.gcs_credentials_secret),
        }
    }

    /// Check the config is complete enough to decorate a job
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or invalid field.
    pub fn validate(&self) -> Result<()> {
        let images = self
            .utility_images
            .as_ref()
            .ok_or_else(|| anyhow!("utility image config is not specified"))?;
        for (name, image) in [
            ("clonerefs", &images.clonerefs),
            ("initupload", &images.initupload),
            ("entrypoint", &images.entrypoint),
            ("sidecar", &images.sidecar),
        ] {
            if image.is_empty() {
                return Err(anyhow!("{name} image is not specified"));
            }
        }

        self.gcs_configuration
            .as_ref()
            .ok_or_else(|| anyhow!("GCS upload configuration is not specified"))?
            .validate()
            .map_err(|e| anyhow!("GCS upload configuration is invalid: {e}"))?;

        if self.gcs_credentials_secret.is_empty() {
            return Err(anyhow!("GCS upload credential secret is not specified"));
        }
        Ok(())
    }
}

fn or_default(own: &str, def: &str) -> String {
    if own.is_empty() { def } else { own }.to_owned()
}
