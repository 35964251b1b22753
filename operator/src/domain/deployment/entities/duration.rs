//! Serde adapter for optional durations written as human readable strings
//! (`"2160h"`, `"90m"`).

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

const SECONDS_PER_HOUR: u64 = 60 * 60;

/// Whole hours when they divide evenly, whole seconds otherwise.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs > 0 && secs % SECONDS_PER_HOUR == 0 {
        format!("{}h", secs / SECONDS_PER_HOUR)
    } else {
        format!("{}s", secs)
    }
}

pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match duration {
        Some(d) => serializer.serialize_str(&format_duration(*d)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) => humantime::parse_duration(&s)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid duration: {}", e))),
        None => Ok(None),
    }
}
