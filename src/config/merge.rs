//! Folding job-configuration fragments together and detecting duplicates

use crate::config::JobConfig;
use crate::config::brancher::Brancher;
use crate::config::jobs::JobType;
use crate::error::ConfigError;
use anyhow::Result;
use std::collections::HashSet;

/// Append every preset and job of `fragment` onto `target`
///
/// Job lists are concatenated per repository and presets are concatenated
/// in order; nothing is de-duplicated here.
pub fn merge_job_config(target: &mut JobConfig, fragment: JobConfig) {
    target.presets.extend(fragment.presets);

    for (repo, jobs) in fragment.presubmits {
        target.presubmits.entry(repo).or_default().extend(jobs);
    }
    for (repo, jobs) in fragment.postsubmits {
        target.postsubmits.entry(repo).or_default().extend(jobs);
    }
    target.periodics.extend(fragment.periodics);
}

/// Reject same-named jobs that could run against a common branch
///
/// Presubmits and postsubmits are compared pairwise within each repository
/// using [`Brancher::intersects`]. Periodic names must be unique.
///
/// # Errors
///
/// Returns [`ConfigError::Duplicate`] naming the first conflicting job.
pub fn check_duplicates(config: &JobConfig) -> Result<()> {
    for (repo, jobs) in &config.presubmits {
        let named: Vec<(&str, &Brancher)> = jobs
            .iter()
            .map(|job| (job.base.name.as_str(), &job.brancher))
            .collect();
        check_pairs(JobType::Presubmit, repo, &named)?;
    }

    for (repo, jobs) in &config.postsubmits {
        let named: Vec<(&str, &Brancher)> = jobs
            .iter()
            .map(|job| (job.base.name.as_str(), &job.brancher))
            .collect();
        check_pairs(JobType::Postsubmit, repo, &named)?;
    }

    let mut seen = HashSet::new();
    for job in &config.periodics {
        if !seen.insert(job.base.name.as_str()) {
            return Err(ConfigError::duplicate(JobType::Periodic, "periodics", &job.base.name).into());
        }
    }
    Ok(())
}

fn check_pairs(job_type: JobType, repo: &str, jobs: &[(&str, &Brancher)]) -> Result<()> {
    for (index, (name, brancher)) in jobs.iter().enumerate() {
        let conflict = jobs
            .iter()
            .skip(index + 1)
            .any(|(other_name, other)| other_name == name && brancher.intersects(other));
        if conflict {
            return Err(ConfigError::duplicate(job_type, repo, *name).into());
        }
    }
    Ok(())
}
