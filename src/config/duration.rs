//! Duration values as they appear in job configuration
//!
//! Accepts either an integer number of nanoseconds (`7200000000000`) or a
//! string of `<number><unit>` groups (`10m`, `1h30m`, `1.5s`).

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A duration parsed from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct JobDuration(pub Duration);

impl JobDuration {
    /// Wrap a standard duration
    #[must_use]
    #[inline]
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// The wrapped standard duration
    #[must_use]
    #[inline]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Whether this duration is zero
    #[must_use]
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0.is_zero()
    }
}

impl From<Duration> for JobDuration {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

/// Parse a duration string such as `1h30m` or `250ms`
///
/// # Errors
///
/// Returns an error if the string is empty, has an unknown unit, or has
/// trailing characters that are not part of a `<number><unit>` group.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed = input.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    if trimmed.is_empty() {
        return Err(anyhow!("Invalid duration: empty string"));
    }

    let group = Regex::new(r"(\d+)(?:\.(\d+))?(ns|us|µs|ms|s|m|h)")?;
    let mut consumed = 0;
    let mut total_nanos: u128 = 0;

    for caps in group.captures_iter(trimmed) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() != consumed {
            return Err(anyhow!("Invalid duration: '{input}'"));
        }
        consumed = whole.end();

        let unit_nanos: u128 = match &caps[3] {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            other => return Err(anyhow!("Invalid duration unit '{other}' in '{input}'")),
        };
        let whole_part: u128 = caps[1]
            .parse()
            .map_err(|e| anyhow!("Invalid duration '{input}': {e}"))?;
        total_nanos = total_nanos.saturating_add(whole_part.saturating_mul(unit_nanos));

        if let Some(fraction) = caps.get(2) {
            let digits = fraction.as_str();
            let numerator: u128 = digits
                .parse()
                .map_err(|e| anyhow!("Invalid duration '{input}': {e}"))?;
            let exponent = u32::try_from(digits.len()).unwrap_or(u32::MAX);
            let denominator = 10_u128.checked_pow(exponent).unwrap_or(u128::MAX);
            total_nanos = total_nanos.saturating_add(numerator.saturating_mul(unit_nanos) / denominator);
        }
    }

    if consumed != trimmed.len() {
        return Err(anyhow!("Invalid duration: '{input}'"));
    }

    let nanos = u64::try_from(total_nanos)
        .map_err(|_| anyhow!("Invalid duration '{input}': value too large"))?;
    Ok(Duration::from_nanos(nanos))
}

impl FromStr for JobDuration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_duration(s).map(Self)
    }
}

impl fmt::Display for JobDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_nanos();
        if total == 0 {
            return write!(f, "0s");
        }
        if total % 1_000_000_000 != 0 {
            return write!(f, "{total}ns");
        }

        let mut secs = self.0.as_secs();
        let hours = secs / 3600;
        secs %= 3600;
        let minutes = secs / 60;
        secs %= 60;

        if hours > 0 {
            write!(f, "{hours}h")?;
        }
        if minutes > 0 {
            write!(f, "{minutes}m")?;
        }
        if secs > 0 {
            write!(f, "{secs}s")?;
        }
        Ok(())
    }
}

impl Serialize for JobDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct JobDurationVisitor;

impl Visitor<'_> for JobDurationVisitor {
    type Value = JobDuration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration string like \"1h30m\" or an integer number of nanoseconds")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
        Ok(JobDuration(Duration::from_nanos(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
        u64::try_from(v)
            .map(|n| JobDuration(Duration::from_nanos(n)))
            .map_err(|_| E::custom(format!("duration cannot be negative: {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
        v.parse().map_err(|e: anyhow::Error| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for JobDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(JobDurationVisitor)
    }
}
