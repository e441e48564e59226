//! Defaulting of absent job fields from process-wide settings
//!
//! Every function here is idempotent: defaulting an already-defaulted job
//! leaves it unchanged.

use crate::config::ProwConfig;
use crate::config::jobs::{DEFAULT_CLUSTER_ALIAS, JobBase, Namespace, Periodic, Postsubmit, Presubmit, TEKTON_AGENT};

/// Fill agent, namespace, cluster and decoration of a job
///
/// An unset or empty namespace becomes `pod_namespace`. The deprecated
/// `plumber_job_namespace` is never consulted, even when it is set.
pub fn default_job_base(job: &mut JobBase, config: &ProwConfig) {
    if job.agent.is_empty() {
        TEKTON_AGENT.clone_into(&mut job.agent);
    }
    if job.namespace.as_name().is_none() {
        job.namespace = Namespace::named(config.pod_namespace.as_str());
    }
    if job.cluster.is_empty() {
        DEFAULT_CLUSTER_ALIAS.clone_into(&mut job.cluster);
    }
    default_decoration(job, config);
}

/// Merge a decorated job's own decoration config over the plank default
fn default_decoration(job: &mut JobBase, config: &ProwConfig) {
    let utility = &mut job.utility_config;
    if !utility.decorate {
        return;
    }

    let fallback = config.plank.default_decoration_config.as_ref();
    let merged = match (utility.decoration_config.as_ref(), fallback) {
        (Some(own), Some(def)) => Some(own.apply_default(def)),
        (own, def) => own.or(def).cloned(),
    };
    utility.decoration_config = merged;
}

/// Default a presubmit, including its context, trigger and rerun command
pub fn default_presubmit(job: &mut Presubmit, config: &ProwConfig) {
    default_job_base(&mut job.base, config);

    if job.context.is_empty() {
        job.context.clone_from(&job.base.name);
    }
    if job.trigger.is_empty() {
        job.trigger = default_trigger_for(&job.base.name);
    }
    if job.rerun_command.is_empty() {
        job.rerun_command = default_rerun_command_for(&job.base.name);
    }
}

pub fn default_postsubmit(job: &mut Postsubmit, config: &ProwConfig) {
    default_job_base(&mut job.base, config);
}

pub fn default_periodic(job: &mut Periodic, config: &ProwConfig) {
    default_job_base(&mut job.base, config);
}

/// Comment expression that triggers a presubmit named `name`
#[must_use]
pub fn default_trigger_for(name: &str) -> String {
    format!(r"(?m)^/test (?:.*? )?{}(?: .*?)?$", regex::escape(name))
}

/// Comment that re-runs a presubmit named `name`
#[must_use]
pub fn default_rerun_command_for(name: &str) -> String {
    format!("/test {name}")
}
