//! Activity payload adapters
//!
//! This module provides adapters that parse raw activity list JSON from a
//! fitness platform and map each record onto the vendor-agnostic
//! [`RawActivity`]. Field-name aliases are resolved here, once, so nothing
//! downstream has to probe alternative keys.

mod canonical;
mod garmin;
mod strava;

pub use canonical::CanonicalAdapter;
pub use garmin::GarminAdapter;
pub use strava::StravaAdapter;

use crate::error::ComputeError;
use crate::normalizer::coerce_f64;
use crate::types::RawActivity;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Trait for activity payload adapters
pub trait ActivityPayloadAdapter {
    /// Parse raw JSON into raw activities. Only malformed JSON is an error;
    /// malformed fields are dropped.
    fn parse(&self, raw_json: &str) -> Result<Vec<RawActivity>, ComputeError>;
}

/// Known activity sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySource {
    Garmin,
    Strava,
    Canonical,
}

impl ActivitySource {
    pub const ALL: [ActivitySource; 3] = [
        ActivitySource::Garmin,
        ActivitySource::Strava,
        ActivitySource::Canonical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivitySource::Garmin => "garmin",
            ActivitySource::Strava => "strava",
            ActivitySource::Canonical => "canonical",
        }
    }

    /// Adapter for this source
    pub fn adapter(&self) -> Box<dyn ActivityPayloadAdapter> {
        match self {
            ActivitySource::Garmin => Box::new(GarminAdapter),
            ActivitySource::Strava => Box::new(StravaAdapter),
            ActivitySource::Canonical => Box::new(CanonicalAdapter),
        }
    }
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivitySource {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "garmin" => Ok(ActivitySource::Garmin),
            "strava" => Ok(ActivitySource::Strava),
            "canonical" | "trainload" => Ok(ActivitySource::Canonical),
            other => Err(ComputeError::UnsupportedSource(other.to_string())),
        }
    }
}

/// Activity records from either a bare array or an object holding `key`
pub(crate) fn activity_records(
    raw_json: &str,
    key: &str,
) -> Result<Vec<Map<String, Value>>, ComputeError> {
    let payload: Value = serde_json::from_str(raw_json)?;
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove(key) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(ComputeError::ParseError(format!(
                    "`{key}` must be an array"
                )))
            }
        },
        _ => {
            return Err(ComputeError::ParseError(
                "expected an array of activities".to_string(),
            ))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}

/// First present, non-null value among `keys`
pub(crate) fn first_value<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| !value.is_null())
}

/// First key that holds a usable number
pub(crate) fn first_number(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(coerce_f64)
}

/// First key that holds a non-empty string
pub(crate) fn first_string(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| value.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Epoch instant held as a number in any of `keys`. Start-time fields
/// sometimes carry epoch values instead of date strings; magnitudes past
/// 1e11 are read as milliseconds.
pub(crate) fn first_epoch_secs(record: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    let value = first_number(record, keys)?;
    let secs = if value.abs() >= EPOCH_MILLIS_THRESHOLD {
        value / 1000.0
    } else {
        value
    };
    Some(secs.trunc() as i64)
}

const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

/// Identifier given as a number or a numeric string
pub(crate) fn first_id(record: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    first_value(record, keys).and_then(|value| match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Stress fields carried through from a previous annotation or an external
/// correction
pub(crate) fn carry_stress_fields(record: &Map<String, Value>, raw: &mut RawActivity) {
    raw.tss = first_number(record, &["tss", "trainingStressScore"]);
    raw.rtss = first_number(record, &["rtss"]);
    raw.stss = first_number(record, &["stss"]);
    raw.hrtss = first_number(record, &["hrtss"]);
    raw.tss_method = first_string(record, &["tss_method", "tssMethod"]);
}
