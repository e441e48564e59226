//! Unit tests for configuration durations

use prow_config::config::JobDuration;
use prow_config::config::duration::parse_duration;
use std::time::Duration;

#[test]
fn test_parse_duration() {
    assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
    assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
    assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
    assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    assert_eq!(parse_duration("3us").unwrap(), Duration::from_micros(3));
    assert_eq!(parse_duration("3µs").unwrap(), Duration::from_micros(3));
    assert_eq!(parse_duration("7ns").unwrap(), Duration::from_nanos(7));
    assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
}

#[test]
fn test_parse_duration_rejects_garbage() {
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("10d").is_err());
    assert!(parse_duration("m10").is_err());
    assert!(parse_duration("10m trailing").is_err());
}

#[test]
fn test_display_is_canonical() {
    assert_eq!(JobDuration::new(Duration::from_secs(5400)).to_string(), "1h30m");
    assert_eq!(JobDuration::new(Duration::from_secs(15)).to_string(), "15s");
    assert_eq!(JobDuration::default().to_string(), "0s");
    assert_eq!(JobDuration::new(Duration::from_nanos(1)).to_string(), "1ns");
}

#[test]
fn test_deserialize_string_and_nanoseconds() {
    let from_string: JobDuration = serde_yaml::from_str("\"2h\"").unwrap();
    let from_nanos: JobDuration = serde_yaml::from_str("7200000000000").unwrap();
    assert_eq!(from_string, from_nanos);

    assert!(serde_yaml::from_str::<JobDuration>("-1").is_err());
    assert!(serde_yaml::from_str::<JobDuration>("\"soon\"").is_err());
}

#[test]
fn test_serialize_round_trips_through_display() {
    let duration = JobDuration::new(Duration::from_secs(90));
    let rendered = serde_yaml::to_string(&duration).unwrap();
    assert_eq!(rendered.trim(), "1m30s");
    let parsed: JobDuration = serde_yaml::from_str(&rendered).unwrap();
    assert_eq!(parsed, duration);
}
