//! Garmin Connect adapter
//!
//! Parses Garmin Connect activity summaries (the activity list endpoint) and
//! maps them to raw activities.

use crate::error::ComputeError;
use crate::types::RawActivity;
use serde_json::{Map, Value};

use super::{
    activity_records, carry_stress_fields, first_epoch_secs, first_id, first_number,
    first_string, first_value, ActivityPayloadAdapter,
};

const HEART_RATE_KEYS: &[&str] = &[
    "averageHR",
    "avgHR",
    "avgHr",
    "averageHeartRate",
    "average_hr",
    "avg_hr",
];
const POWER_KEYS: &[&str] = &["avgPower", "averagePower", "avg_power", "average_power"];
const NORM_POWER_KEYS: &[&str] = &[
    "normPower",
    "normalizedPower",
    "norm_power",
    "normalized_power",
];
const START_TIME_LOCAL_KEYS: &[&str] = &["startTimeLocal", "start_time_local"];
const START_TIME_GMT_KEYS: &[&str] = &["startTimeGMT", "startTimeGmt", "start_time_gmt"];
const SPEED_KEYS: &[&str] = &["averageSpeed", "avgSpeed", "average_speed"];

/// Garmin payload adapter
pub struct GarminAdapter;

impl ActivityPayloadAdapter for GarminAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<RawActivity>, ComputeError> {
        let records = activity_records(raw_json, "activities")?;
        Ok(records.iter().map(convert_record).collect())
    }
}

fn convert_record(record: &Map<String, Value>) -> RawActivity {
    let mut raw = RawActivity {
        activity_id: first_id(record, &["activityId", "activity_id", "id"]),
        name: first_string(record, &["activityName", "name"]),
        type_key: type_key(record),
        start_time_local: first_string(record, START_TIME_LOCAL_KEYS),
        start_time_gmt: first_string(record, START_TIME_GMT_KEYS),
        // beginTimestamp is epoch milliseconds
        start_timestamp: first_number(record, &["beginTimestamp"])
            .map(|ms| (ms / 1000.0).trunc() as i64)
            .or_else(|| first_number(record, &["start_timestamp"]).map(|s| s.trunc() as i64))
            .or_else(|| first_epoch_secs(record, START_TIME_GMT_KEYS))
            .or_else(|| first_epoch_secs(record, START_TIME_LOCAL_KEYS)),
        duration: first_number(record, &["duration", "movingDuration", "elapsedDuration"]),
        distance: first_number(record, &["distance"]),
        average_power: first_number(record, POWER_KEYS),
        normalized_power: first_number(record, NORM_POWER_KEYS),
        average_speed: first_number(record, SPEED_KEYS),
        average_hr: first_number(record, HEART_RATE_KEYS),
        ..Default::default()
    };
    carry_stress_fields(record, &mut raw);
    raw
}

/// Type tag from `activityType.typeKey`, a bare `activityType` string, or
/// `activityTypeDTO.typeKey`
fn type_key(record: &Map<String, Value>) -> Option<String> {
    let value = first_value(record, &["activityType", "activityTypeDTO", "type_key"])?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(nested) => first_string(nested, &["typeKey", "type_key"]),
        _ => None,
    }
}
