//! Activity normalization
//!
//! This module turns adapter output into normalized [`Activity`] records.
//! - Numeric fields coerced: missing, non-numeric, non-finite or negative read as 0
//! - Modality classified once, at ingest
//! - Pre-existing stress fields carried through untouched
//! - Quality flags computed for diagnostics

use crate::classifier::classify;
use crate::types::{Activity, QualityFlag, RawActivity, TssMethod};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Normalizer for converting raw activities to normalized activities
pub struct Normalizer;

impl Normalizer {
    /// Normalize a raw activity
    pub fn normalize(raw: &RawActivity) -> Activity {
        let type_key = raw.type_key.clone().unwrap_or_default();
        let modality = classify(&type_key);

        Activity {
            activity_id: raw.activity_id,
            name: raw.name.clone(),
            type_key,
            modality,
            start_time_local: non_blank(raw.start_time_local.as_deref()),
            start_time_gmt: non_blank(raw.start_time_gmt.as_deref()),
            start_timestamp: raw.start_timestamp,
            duration: non_negative(raw.duration),
            distance: non_negative(raw.distance),
            average_power: non_negative(raw.average_power),
            normalized_power: non_negative(raw.normalized_power),
            average_speed: non_negative(raw.average_speed),
            average_hr: non_negative(raw.average_hr),
            tss: raw.tss,
            rtss: raw.rtss,
            stss: raw.stss,
            hrtss: raw.hrtss,
            tss_method: raw
                .tss_method
                .as_deref()
                .and_then(|m| m.parse::<TssMethod>().ok()),
        }
    }

    /// Normalize a batch, preserving order
    pub fn normalize_all(raw: &[RawActivity]) -> Vec<Activity> {
        raw.iter().map(Self::normalize).collect()
    }

    /// Report missing inputs. Flags are informational and never alter results.
    pub fn quality_flags(activity: &Activity) -> Vec<QualityFlag> {
        let mut flags = Vec::new();

        if activity.duration <= 0.0 {
            flags.push(QualityFlag::MissingDuration);
        }
        if activity.start_time_local.is_none()
            && activity.start_time_gmt.is_none()
            && activity.start_timestamp.is_none()
        {
            flags.push(QualityFlag::MissingStartTime);
        }
        if activity.average_hr <= 0.0 {
            flags.push(QualityFlag::MissingHeartRate);
        }
        if activity.power() <= 0.0 {
            flags.push(QualityFlag::MissingPower);
        }
        if activity.average_speed <= 0.0 {
            flags.push(QualityFlag::MissingSpeed);
        }
        if activity.has_stress_fields() {
            flags.push(QualityFlag::PresetStress);
        }

        flags
    }
}

/// Coerce a JSON value to a finite number; numeric strings are accepted
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_f64))
}

pub(crate) fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(coerce_f64)
        .map(|v| v.trunc() as i64))
}

pub(crate) fn lenient_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    })
}
