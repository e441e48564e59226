//! Validation of defaulted job definitions

use crate::config::decoration::DecorationConfig;
use crate::config::jobs::{Agent, Container, JobBase, JobType, Periodic, Postsubmit, Presubmit};
use anyhow::{Result, anyhow};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Labels set by the orchestrator on every job it creates
pub const RESERVED_LABELS: [&str; 9] = [
    "created-by-prow",
    "prow.k8s.io/job",
    "prow.k8s.io/type",
    "prow.k8s.io/id",
    "prow.k8s.io/build-id",
    "prow.k8s.io/refs.org",
    "prow.k8s.io/refs.repo",
    "prow.k8s.io/refs.pull",
    "prow.k8s.io/context",
];

const LABEL_NAME_MAX_LEN: usize = 63;
const LABEL_PREFIX_MAX_LEN: usize = 253;
const LABEL_NAME_PATTERN: &str = r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$";
const LABEL_VALUE_PATTERN: &str = r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$";
const DNS_SUBDOMAIN_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";

type Grammar = LazyLock<Result<Regex, regex::Error>>;

static LABEL_NAME_RE: Grammar = LazyLock::new(|| Regex::new(LABEL_NAME_PATTERN));
static LABEL_VALUE_RE: Grammar = LazyLock::new(|| Regex::new(LABEL_VALUE_PATTERN));
static DNS_SUBDOMAIN_RE: Grammar = LazyLock::new(|| Regex::new(DNS_SUBDOMAIN_PATTERN));

fn grammar(re: &'static Grammar) -> Result<&'static Regex> {
    let compiled: &'static Result<Regex, regex::Error> = re;
    compiled.as_ref().map_err(|e| anyhow!("label grammar does not compile: {e}"))
}

/// Check the agent is known and has what it needs to run
///
/// # Errors
///
/// Returns an error if:
/// - The agent is not recognized
/// - The namespace was not defaulted
/// - A pod-based job has no spec or a namespace other than `pod_namespace`
/// - A legacy build job has no build spec
#[inline]
pub fn validate_agent(job: &JobBase, pod_namespace: &str) -> Result<()> {
    let agent = Agent::from_name(&job.agent).ok_or_else(|| {
        anyhow!(
            "agent must be one of '{}' or '{}' (found '{}')",
            crate::config::jobs::TEKTON_AGENT,
            crate::config::jobs::KNATIVE_BUILD_AGENT,
            job.agent
        )
    })?;

    let namespace = job
        .namespace
        .as_name()
        .ok_or_else(|| anyhow!("failed to default namespace"))?;

    match agent {
        Agent::Tekton => {
            if job.spec.is_none() {
                return Err(anyhow!("agent '{}' requires a spec", job.agent));
            }
            if namespace != pod_namespace {
                return Err(anyhow!(
                    "namespace customization requires agent '{}' (found namespace '{namespace}', expected '{pod_namespace}')",
                    crate::config::jobs::KNATIVE_BUILD_AGENT
                ));
            }
        }
        Agent::KnativeBuild => {
            if job.build_spec.is_none() {
                return Err(anyhow!("agent '{}' requires a build_spec", job.agent));
            }
        }
    }
    Ok(())
}

/// Check a decorated container can be instrumented
///
/// A missing config requires nothing. A present config must be complete and
/// the container must declare a command or arguments for the entrypoint
/// wrapper to run.
///
/// # Errors
///
/// Returns an error if the config is incomplete or the container has neither
/// command nor args.
#[inline]
pub fn validate_decoration(container: &Container, config: Option<&DecorationConfig>) -> Result<()> {
    let Some(config) = config else {
        return Ok(());
    };

    config
        .validate()
        .map_err(|e| anyhow!("invalid decoration config: {e}"))?;

    if container.command.is_empty() && container.args.is_empty() {
        return Err(anyhow!("decorated job containers must specify command and/or args"));
    }
    Ok(())
}

/// Check every label key and value against the label grammar
///
/// Only the first violation is reported.
///
/// # Errors
///
/// Returns an error for a reserved key, a malformed key, or a malformed value.
#[inline]
pub fn validate_labels(labels: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in labels {
        if RESERVED_LABELS.contains(&key.as_str()) {
            return Err(anyhow!("label {key} is reserved for decoration"));
        }
        validate_label_key(key)?;
        validate_label_value(key, value)?;
    }
    Ok(())
}

fn validate_label_key(key: &str) -> Result<()> {
    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        if prefix.is_empty()
            || prefix.len() > LABEL_PREFIX_MAX_LEN
            || !grammar(&DNS_SUBDOMAIN_RE)?.is_match(prefix)
        {
            return Err(anyhow!(
                "invalid label key {key}: prefix must be a DNS subdomain of at most {LABEL_PREFIX_MAX_LEN} characters"
            ));
        }
    }

    if name.len() > LABEL_NAME_MAX_LEN || !grammar(&LABEL_NAME_RE)?.is_match(name) {
        return Err(anyhow!(
            "invalid label key {key}: name must be at most {LABEL_NAME_MAX_LEN} alphanumeric, '-', '_' or '.' characters, starting and ending with an alphanumeric"
        ));
    }
    Ok(())
}

fn validate_label_value(key: &str, value: &str) -> Result<()> {
    if value.len() > LABEL_NAME_MAX_LEN || !grammar(&LABEL_VALUE_RE)?.is_match(value) {
        return Err(anyhow!(
            "invalid label {key}={value}: value must be empty or at most {LABEL_NAME_MAX_LEN} alphanumeric, '-', '_' or '.' characters, starting and ending with an alphanumeric"
        ));
    }
    Ok(())
}

/// Checks shared by every job type
///
/// # Errors
///
/// Returns an error for negative concurrency, an invalid agent or labels,
/// a pod spec without exactly one container, or a decoration problem.
#[inline]
pub fn validate_job_base(job: &JobBase, job_type: JobType, pod_namespace: &str) -> Result<()> {
    if job.name.is_empty() {
        return Err(anyhow!("{job_type} job must have a name"));
    }
    if job.max_concurrency < 0 {
        return Err(anyhow!(
            "max_concurrency of {} is invalid, must be >= 0",
            job.max_concurrency
        ));
    }

    validate_agent(job, pod_namespace)?;
    validate_labels(&job.labels)?;

    if Agent::from_name(&job.agent) != Some(Agent::Tekton) {
        return Ok(());
    }

    let containers = job.spec.as_ref().map_or(0, |spec| spec.containers.len());
    if containers != 1 {
        return Err(anyhow!("pod spec must specify exactly 1 container, found {containers}"));
    }

    let utility = &job.utility_config;
    if utility.decorate && utility.decoration_config.is_none() {
        return Err(anyhow!(
            "decoration requested but no decoration config is set on the job or in plank.default_decoration_config"
        ));
    }
    if let Some(container) = job.primary_container() {
        validate_decoration(container, utility.decoration_config.as_ref())?;
    }
    Ok(())
}

/// Validate a defaulted presubmit
///
/// # Errors
///
/// Returns an error if the base is invalid, the context is empty,
/// `always_run` and `run_if_changed` are both set, or the trigger does not
/// match the rerun command.
#[inline]
pub fn validate_presubmit(job: &Presubmit, pod_namespace: &str) -> Result<()> {
    validate_job_base(&job.base, JobType::Presubmit, pod_namespace)?;

    if job.context.is_empty() {
        return Err(anyhow!("presubmit must have a context"));
    }
    if job.always_run && job.run_if_changed.is_some() {
        return Err(anyhow!("always_run and run_if_changed are mutually exclusive"));
    }
    validate_trigger(job)
}

fn validate_trigger(job: &Presubmit) -> Result<()> {
    let compiled;
    let trigger = match job.trigger_re.as_ref() {
        Some(re) => re,
        None => {
            compiled = Regex::new(&job.trigger).map_err(|e| anyhow!("invalid trigger '{}': {e}", job.trigger))?;
            &compiled
        }
    };
    if !trigger.is_match(&job.rerun_command) {
        return Err(anyhow!(
            "trigger '{}' does not match rerun command '{}'",
            job.trigger,
            job.rerun_command
        ));
    }
    Ok(())
}

/// Validate a defaulted postsubmit
///
/// # Errors
///
/// Returns an error if the base is invalid.
#[inline]
pub fn validate_postsubmit(job: &Postsubmit, pod_namespace: &str) -> Result<()> {
    validate_job_base(&job.base, JobType::Postsubmit, pod_namespace)
}

/// Validate a defaulted periodic
///
/// # Errors
///
/// Returns an error if the base is invalid or the interval is zero.
#[inline]
pub fn validate_periodic(job: &Periodic, pod_namespace: &str) -> Result<()> {
    validate_job_base(&job.base, JobType::Periodic, pod_namespace)?;

    if job.interval.is_zero() {
        return Err(anyhow!("periodic must have a positive interval"));
    }
    Ok(())
}
