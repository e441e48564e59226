//! Decoding of YAML sections that are present but left empty
//!
//! `presubmits:` with nothing under it decodes as `null`; these helpers read
//! that as the empty value, the same as a missing key.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Decode `null` as `T::default()`
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Decode a repository-to-jobs map where the map or any job list may be `null`
pub fn jobs_by_repo<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let repos: Option<BTreeMap<String, Option<Vec<T>>>> = Option::deserialize(deserializer)?;
    Ok(repos
        .unwrap_or_default()
        .into_iter()
        .map(|(repo, jobs)| (repo, jobs.unwrap_or_default()))
        .collect())
}
