//! Daily load aggregation
//!
//! Buckets activities by calendar date and sums their TRIMP impulse.
//! Dates without activities are absent from the mapping; zero-fill happens in
//! the fitness recurrence.

use crate::trimp::TrimpCalculator;
use crate::types::{Activity, AthleteProfile};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;

/// Date-ordered daily impulse
pub type DailyLoads = BTreeMap<NaiveDate, f64>;

/// Result of aggregating a batch of activities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyAggregation {
    pub loads: DailyLoads,
    /// Indices of activities whose start time could not be parsed
    pub skipped: Vec<usize>,
}

/// Daily load aggregator
pub struct DailyLoadAggregator;

impl DailyLoadAggregator {
    /// Sum TRIMP per start date. Activities without a parseable start time are
    /// excluded and reported in `skipped`.
    pub fn aggregate(activities: &[Activity], profile: &AthleteProfile) -> DailyAggregation {
        let mut aggregation = DailyAggregation::default();

        for (idx, activity) in activities.iter().enumerate() {
            let Some(date) = activity_date(activity) else {
                aggregation.skipped.push(idx);
                continue;
            };
            let impulse = TrimpCalculator::calculate(activity, profile);
            *aggregation.loads.entry(date).or_insert(0.0) += impulse;
        }

        aggregation
    }
}

/// Calendar date an activity started on
pub fn activity_date(activity: &Activity) -> Option<NaiveDate> {
    activity_start(activity).map(|start| start.date())
}

/// Start of an activity as a naive timestamp.
///
/// Tried in order: local time string, GMT time string, epoch seconds.
pub fn activity_start(activity: &Activity) -> Option<NaiveDateTime> {
    activity
        .start_time_local
        .as_deref()
        .and_then(parse_timestamp)
        .or_else(|| activity.start_time_gmt.as_deref().and_then(parse_timestamp))
        .or_else(|| activity.start_timestamp.and_then(epoch_to_naive))
}

/// Parse `YYYY-MM-DD HH:MM:SS` with optional `T` separator, fractional
/// seconds, trailing `Z` or UTC offset. A bare date reads as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    let cleaned = trimmed.trim_end_matches(['Z', 'z']).replacen('T', " ", 1);
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn epoch_to_naive(secs: i64) -> Option<NaiveDateTime> {
    Utc.timestamp_opt(secs, 0).single().map(|dt| dt.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Modality;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_run(start: &str, duration: f64, hr: f64) -> Activity {
        Activity {
            type_key: "running".to_string(),
            modality: Modality::Running,
            start_time_local: Some(start.to_string()),
            duration,
            average_hr: hr,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = date(2024, 1, 15).and_hms_opt(7, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15 07:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T07:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T07:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15 07:30:00.0"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T07:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-15"),
            date(2024, 1, 15).and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45 00:00:00"), None);
    }

    #[test]
    fn test_start_source_order() {
        let mut activity = make_run("2024-01-15 23:30:00", 1800.0, 140.0);
        activity.start_time_gmt = Some("2024-01-16 04:30:00".to_string());
        assert_eq!(activity_date(&activity), Some(date(2024, 1, 15)));

        activity.start_time_local = None;
        assert_eq!(activity_date(&activity), Some(date(2024, 1, 16)));

        activity.start_time_gmt = Some("garbage".to_string());
        activity.start_timestamp = Some(1_705_303_800); // 2024-01-15T07:30:00Z
        assert_eq!(activity_date(&activity), Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_aggregate_sums_per_day() {
        let profile = AthleteProfile::default();
        let activities = vec![
            make_run("2024-01-15 07:00:00", 1800.0, 150.0),
            make_run("2024-01-15 18:00:00", 1800.0, 150.0),
            make_run("2024-01-17 07:00:00", 3600.0, 150.0),
        ];

        let agg = DailyLoadAggregator::aggregate(&activities, &profile);
        assert_eq!(agg.loads.len(), 2);
        assert!(agg.skipped.is_empty());
        assert!(!agg.loads.contains_key(&date(2024, 1, 16)));

        let single_hour = TrimpCalculator::calculate(&activities[2], &profile);
        let day_one = agg.loads[&date(2024, 1, 15)];
        assert!((day_one - single_hour).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_start_is_skipped() {
        let profile = AthleteProfile::default();
        let mut broken = make_run("not a date", 3600.0, 150.0);
        broken.start_time_gmt = None;
        let activities = vec![broken, make_run("2024-01-15 07:00:00", 3600.0, 150.0)];

        let agg = DailyLoadAggregator::aggregate(&activities, &profile);
        assert_eq!(agg.skipped, vec![0]);
        assert_eq!(agg.loads.len(), 1);
    }

    #[test]
    fn test_zero_impulse_day_is_present() {
        let profile = AthleteProfile::default();
        let activities = vec![make_run("2024-01-15 07:00:00", 3600.0, 0.0)];

        let agg = DailyLoadAggregator::aggregate(&activities, &profile);
        assert_eq!(agg.loads.get(&date(2024, 1, 15)), Some(&0.0));
    }
}
