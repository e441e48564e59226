//! Job definitions: the shared job base and the three job kinds

use crate::config::brancher::Brancher;
use crate::config::decoration::DecorationConfig;
use crate::config::duration::JobDuration;
use anyhow::{Context as _, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Agent identifier of the pod-based execution backend
pub const TEKTON_AGENT: &str = "tekton";

/// Agent identifier of the legacy build-system backend
pub const KNATIVE_BUILD_AGENT: &str = "knative-build";

/// Cluster alias used when a job does not name one
pub const DEFAULT_CLUSTER_ALIAS: &str = "default";

/// The kind of job a definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    Presubmit,
    Postsubmit,
    Periodic,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::Presubmit => "presubmit",
            Self::Postsubmit => "postsubmit",
            Self::Periodic => "periodic",
        };
        f.write_str(name)
    }
}

/// Execution backends a job may target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Agent {
    /// Pod-based agent, interprets `spec`
    Tekton,
    /// Legacy build-system agent, interprets `build_spec`
    KnativeBuild,
}

impl Agent {
    /// Parse a configured agent name; `None` for anything unrecognized
    #[must_use]
    #[inline]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            TEKTON_AGENT => Some(Self::Tekton),
            KNATIVE_BUILD_AGENT => Some(Self::KnativeBuild),
            _ => None,
        }
    }
}

/// Namespace of a job, distinguishing "never set" from "set to empty"
///
/// In YAML an absent or `null` namespace is [`Namespace::Unset`] and `""`
/// is [`Namespace::Empty`]. Both are replaced during defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Unset,
    Empty,
    Named(String),
}

impl Namespace {
    /// Build a namespace from a string, mapping `""` to [`Namespace::Empty`]
    #[must_use]
    #[inline]
    pub fn named<S: Into<String>>(name: S) -> Self {
        let name = name.into();
        if name.is_empty() {
            Self::Empty
        } else {
            Self::Named(name)
        }
    }

    /// The namespace name, if one is set
    #[must_use]
    #[inline]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Unset | Self::Empty => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_none(),
            Self::Empty => serializer.serialize_str(""),
            Self::Named(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.map_or(Self::Unset, Self::named))
    }
}

/// A single environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    #[must_use]
    #[inline]
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The subset of a container definition the engine reasons about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// Pod specification handed to the pod-based agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default")]
    pub containers: Vec<Container>,
}

/// Settings for wrapping a job with log and artifact capture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UtilityConfig {
    /// Whether the job is decorated
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub decorate: bool,

    /// Alternate import path the repository is checked out at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_alias: Option<String>,

    /// Job-level decoration settings, merged over the plank default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoration_config: Option<DecorationConfig>,
}

/// Identity and execution shape shared by every job kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobBase {
    /// Job name, unique within its repository and job type
    pub name: String,

    /// Execution backend; empty until defaulted
    #[serde(default)]
    pub agent: String,

    #[serde(default, skip_serializing_if = "Namespace::is_unset")]
    pub namespace: Namespace,

    /// Alias into the execution backend's cluster registry
    #[serde(default)]
    pub cluster: String,

    /// Maximum number of concurrent runs, 0 for unlimited
    #[serde(default)]
    pub max_concurrency: i64,

    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<PodSpec>,

    /// Spec for the legacy build agent, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_spec: Option<serde_yaml::Value>,

    #[serde(flatten)]
    pub utility_config: UtilityConfig,
}

impl JobBase {
    /// The container presets and decoration act on
    #[must_use]
    #[inline]
    pub fn primary_container(&self) -> Option<&Container> {
        self.spec.as_ref().and_then(|spec| spec.containers.first())
    }

    /// Mutable access to the primary container
    #[inline]
    pub fn primary_container_mut(&mut self) -> Option<&mut Container> {
        self.spec.as_mut().and_then(|spec| spec.containers.first_mut())
    }
}

/// A job run against proposed changes before they merge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Presubmit {
    #[serde(flatten)]
    pub base: JobBase,

    /// Status context reported to the version-control provider
    #[serde(default)]
    pub context: String,

    #[serde(flatten)]
    pub brancher: Brancher,

    /// Run on every change regardless of touched files
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub always_run: bool,

    /// Run only when a changed file matches this expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_if_changed: Option<String>,

    /// Failure does not block merging
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    /// Do not report status back to the provider
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_report: bool,

    /// Comment expression that triggers the job
    #[serde(default)]
    pub trigger: String,

    /// Comment that re-runs the job; must match `trigger`
    #[serde(default)]
    pub rerun_command: String,

    #[serde(skip)]
    pub(crate) trigger_re: Option<Regex>,

    #[serde(skip)]
    pub(crate) run_if_changed_re: Option<Regex>,
}

impl Presubmit {
    /// Compile the branch, trigger and `run_if_changed` expressions
    ///
    /// # Errors
    ///
    /// Returns an error naming the first expression that fails to compile.
    pub fn compile(&mut self) -> Result<()> {
        self.brancher.compile()?;
        if !self.trigger.is_empty() {
            self.trigger_re = Some(
                Regex::new(&self.trigger)
                    .with_context(|| format!("invalid trigger expression '{}'", self.trigger))?,
            );
        }
        self.run_if_changed_re = compile_run_if_changed(self.run_if_changed.as_deref())?;
        Ok(())
    }

    /// Whether a comment body triggers this job
    #[must_use]
    pub fn triggers_on(&self, comment: &str) -> bool {
        self.trigger_re.as_ref().is_some_and(|re| re.is_match(comment))
    }

    /// Whether a set of changed files requires this job to run
    ///
    /// Jobs without `run_if_changed` always answer `always_run`.
    #[must_use]
    pub fn runs_against_changes<S: AsRef<str>>(&self, changed: &[S]) -> bool {
        match self.run_if_changed_re.as_ref() {
            Some(re) => changed.iter().any(|file| re.is_match(file.as_ref())),
            None => self.always_run,
        }
    }
}

/// A job run after changes merge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Postsubmit {
    #[serde(flatten)]
    pub base: JobBase,

    #[serde(flatten)]
    pub brancher: Brancher,

    /// Run only when a changed file matches this expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_if_changed: Option<String>,

    #[serde(skip)]
    pub(crate) run_if_changed_re: Option<Regex>,
}

impl Postsubmit {
    /// Compile the branch and `run_if_changed` expressions
    ///
    /// # Errors
    ///
    /// Returns an error naming the first expression that fails to compile.
    pub fn compile(&mut self) -> Result<()> {
        self.brancher.compile()?;
        self.run_if_changed_re = compile_run_if_changed(self.run_if_changed.as_deref())?;
        Ok(())
    }

    /// Whether a set of changed files requires this job to run
    #[must_use]
    pub fn runs_against_changes<S: AsRef<str>>(&self, changed: &[S]) -> bool {
        self.run_if_changed_re
            .as_ref()
            .is_none_or(|re| changed.iter().any(|file| re.is_match(file.as_ref())))
    }
}

/// A job run on a fixed schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Periodic {
    #[serde(flatten)]
    pub base: JobBase,

    /// Time between runs
    #[serde(default)]
    pub interval: JobDuration,
}

fn compile_run_if_changed(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| Regex::new(p).with_context(|| format!("invalid run_if_changed expression '{p}'")))
        .transpose()
}
