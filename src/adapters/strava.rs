//! Strava adapter
//!
//! Parses the Strava athlete activity list (`GET /athlete/activities`) and
//! maps it to raw activities.

use crate::error::ComputeError;
use crate::types::RawActivity;
use serde_json::{Map, Value};

use super::{
    activity_records, carry_stress_fields, first_epoch_secs, first_id, first_number,
    first_string, ActivityPayloadAdapter,
};

/// Strava payload adapter
pub struct StravaAdapter;

impl ActivityPayloadAdapter for StravaAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<RawActivity>, ComputeError> {
        let records = activity_records(raw_json, "activities")?;
        Ok(records.iter().map(convert_record).collect())
    }
}

fn convert_record(record: &Map<String, Value>) -> RawActivity {
    let mut raw = RawActivity {
        activity_id: first_id(record, &["id"]),
        name: first_string(record, &["name"]),
        // sport_type is the finer-grained tag ("TrailRun" vs "Run")
        type_key: first_string(record, &["sport_type", "type"]),
        start_time_local: first_string(record, &["start_date_local"]),
        start_time_gmt: first_string(record, &["start_date"]),
        start_timestamp: first_epoch_secs(record, &["start_date", "start_date_local"]),
        duration: first_number(record, &["moving_time", "elapsed_time"]),
        distance: first_number(record, &["distance"]),
        average_power: first_number(record, &["average_watts"]),
        normalized_power: first_number(record, &["weighted_average_watts"]),
        average_speed: first_number(record, &["average_speed"]),
        average_hr: first_number(record, &["average_heartrate"]),
        ..Default::default()
    };
    carry_stress_fields(record, &mut raw);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::types::Modality;

    #[test]
    fn test_parse_strava_payload() {
        let json = r#"[
            {
                "id": 10293847561,
                "name": "Lunch Trail Run",
                "type": "Run",
                "sport_type": "TrailRun",
                "start_date": "2024-01-16T11:02:00Z",
                "start_date_local": "2024-01-16T12:02:00Z",
                "moving_time": 3920,
                "elapsed_time": 4100,
                "distance": 11230.4,
                "average_speed": 2.865,
                "has_heartrate": true,
                "average_heartrate": 152.3
            },
            {
                "id": 10293847562,
                "type": "VirtualRide",
                "start_date_local": "2024-01-17T06:00:00Z",
                "moving_time": 3600,
                "average_watts": 201.4,
                "weighted_average_watts": 223
            }
        ]"#;

        let activities = StravaAdapter.parse(json).unwrap();
        assert_eq!(activities.len(), 2);

        let run = &activities[0];
        assert_eq!(run.type_key.as_deref(), Some("TrailRun"));
        assert_eq!(classify(run.type_key.as_deref().unwrap()), Modality::Running);
        assert_eq!(run.duration, Some(3920.0));
        assert_eq!(run.average_hr, Some(152.3));
        assert_eq!(run.start_time_local.as_deref(), Some("2024-01-16T12:02:00Z"));

        let ride = &activities[1];
        assert_eq!(classify(ride.type_key.as_deref().unwrap()), Modality::Cycling);
        assert_eq!(ride.normalized_power, Some(223.0));
        assert_eq!(ride.average_hr, None);
    }

    #[test]
    fn test_numeric_start_date_is_epoch() {
        let json = r#"[{"id": 1, "type": "Swim", "moving_time": 1800, "start_date": 1705390200}]"#;

        let activities = StravaAdapter.parse(json).unwrap();
        assert_eq!(activities[0].start_time_gmt, None);
        assert_eq!(activities[0].start_timestamp, Some(1705390200));
    }
}
