//! Branch filters for presubmit and postsubmit jobs

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Branch filter attached to branch-triggered jobs
///
/// A well-formed filter sets at most one of `branches` and `skip_branches`;
/// leaving both empty means the job runs against every branch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Brancher {
    /// Branches the job runs against
    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,

    /// Branches the job never runs against
    #[serde(default, deserialize_with = "crate::config::nullable::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub skip_branches: Vec<String>,

    #[serde(skip)]
    re: Option<Regex>,

    #[serde(skip)]
    skip_re: Option<Regex>,
}

impl Brancher {
    /// Filter that only admits the given branches
    #[must_use]
    pub fn only<S: AsRef<str>>(branches: &[S]) -> Self {
        Self {
            branches: branches.iter().map(|b| b.as_ref().to_owned()).collect(),
            ..Self::default()
        }
    }

    /// Filter that admits everything except the given branches
    #[must_use]
    pub fn skipping<S: AsRef<str>>(branches: &[S]) -> Self {
        Self {
            skip_branches: branches.iter().map(|b| b.as_ref().to_owned()).collect(),
            ..Self::default()
        }
    }

    /// Whether the filter admits every branch
    #[must_use]
    #[inline]
    pub fn runs_against_all_branches(&self) -> bool {
        self.branches.is_empty() && self.skip_branches.is_empty()
    }

    /// Whether some branch name is admitted by both filters
    ///
    /// Entries are compared literally. Two exclusion-only filters always
    /// intersect since neither can rule out the whole branch namespace.
    /// A filter that skips every branch it lists intersects nothing, not
    /// even an unrestricted one. The relation is symmetric.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        match (self.branches.is_empty(), other.branches.is_empty()) {
            (true, true) => true,
            (false, true) => self.has_branch_outside(&self.skip_branches, &other.skip_branches, None),
            (true, false) => other.has_branch_outside(&other.skip_branches, &self.skip_branches, None),
            (false, false) => {
                let theirs: BTreeSet<&str> = other.branches.iter().map(String::as_str).collect();
                self.has_branch_outside(&self.skip_branches, &other.skip_branches, Some(&theirs))
            }
        }
    }

    /// Whether one of our listed branches survives both skip lists and,
    /// when given, is also listed by the other filter
    fn has_branch_outside(
        &self,
        own_skips: &[String],
        other_skips: &[String],
        also_listed: Option<&BTreeSet<&str>>,
    ) -> bool {
        self.branches.iter().any(|branch| {
            !own_skips.contains(branch)
                && !other_skips.contains(branch)
                && also_listed.is_none_or(|listed| listed.contains(branch.as_str()))
        })
    }

    /// Compile the branch lists into anchored regular expressions
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a valid regular expression.
    pub fn compile(&mut self) -> Result<()> {
        self.re = compile_alternation(&self.branches)?;
        self.skip_re = compile_alternation(&self.skip_branches)?;
        Ok(())
    }

    /// Whether a job with this filter runs against `branch`
    ///
    /// Entries are treated as anchored regular expressions once
    /// [`Brancher::compile`] has run, and as literals before that.
    #[must_use]
    pub fn should_run(&self, branch: &str) -> bool {
        if self.runs_against_all_branches() {
            return true;
        }

        let skipped = match self.skip_re.as_ref() {
            Some(re) => re.is_match(branch),
            None => self.skip_branches.iter().any(|b| b == branch),
        };
        if skipped {
            return false;
        }

        if self.branches.is_empty() {
            return true;
        }
        match self.re.as_ref() {
            Some(re) => re.is_match(branch),
            None => self.branches.iter().any(|b| b == branch),
        }
    }
}

fn compile_alternation(patterns: &[String]) -> Result<Option<Regex>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let joined = patterns.join("|");
    Regex::new(&format!("^(?:{joined})$"))
        .map(Some)
        .map_err(|e| anyhow!("invalid branch expression '{joined}': {e}"))
}
