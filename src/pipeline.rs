//! Pipeline orchestration
//!
//! This module provides the public API for trainload.
//! It orchestrates the full pipeline from raw activity JSON to the fitness
//! series, and owns the caller-side concerns the calculation modules leave
//! out: logging skipped records and persisting results.

use crate::adapters::{ActivityPayloadAdapter, GarminAdapter, StravaAdapter};
use crate::aggregator::{parse_timestamp, DailyAggregation, DailyLoadAggregator};
use crate::error::ComputeError;
use crate::estimator::StressEstimator;
use crate::fitness::{latest, FitnessRecurrence};
use crate::goals::{CurrentFitness, GoalAggregator, GoalConfig, GoalProgress};
use crate::normalizer::Normalizer;
use crate::store::{merge_activities, ActivityRepository};
use crate::types::{Activity, AthleteProfile, FitnessMetric};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Convert a raw Garmin activity list to a JSON fitness series.
///
/// # Arguments
/// * `raw_json` - Garmin Connect activity list JSON
/// * `profile` - Athlete thresholds
/// * `end` - Last day of the series (inclusive)
///
/// # Returns
/// JSON array of daily fitness metrics, from the first activity date to `end`
///
/// # Example
/// ```ignore
/// let series = garmin_to_fitness_json(
///     garmin_json,
///     &AthleteProfile::default(),
///     NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
/// )?;
/// ```
pub fn garmin_to_fitness_json(
    raw_json: &str,
    profile: &AthleteProfile,
    end: NaiveDate,
) -> Result<String, ComputeError> {
    process_payload(&GarminAdapter, raw_json, profile, end)
}

/// Convert a raw Strava activity list to a JSON fitness series.
///
/// See [`garmin_to_fitness_json`].
pub fn strava_to_fitness_json(
    raw_json: &str,
    profile: &AthleteProfile,
    end: NaiveDate,
) -> Result<String, ComputeError> {
    process_payload(&StravaAdapter, raw_json, profile, end)
}

/// Pipeline stages:
/// 1. ActivityPayloadAdapter - Parse vendor JSON into raw activities
/// 2. Normalizer - Coerce fields and classify modality
/// 3. StressEstimator - Annotate stress fields
/// 4. DailyLoadAggregator - Sum TRIMP per day
/// 5. FitnessRecurrence - Walk CTL/ATL/TSB through `end`
fn process_payload(
    adapter: &dyn ActivityPayloadAdapter,
    raw_json: &str,
    profile: &AthleteProfile,
    end: NaiveDate,
) -> Result<String, ComputeError> {
    let processor = LoadProcessor::new(profile.clone());
    let mut activities = processor.ingest(adapter, raw_json)?;
    processor.annotate(&mut activities);
    let metrics = processor.fitness_series_through(&activities, end);
    Ok(serde_json::to_string(&metrics)?)
}

/// Parse a calendar date argument (`YYYY-MM-DD`)
pub fn parse_date(raw: &str) -> Result<NaiveDate, ComputeError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| ComputeError::DateParseError(format!("'{}': {}", raw, e)))
}

/// Parse a reference time argument, accepting the same layouts as activity
/// start times
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, ComputeError> {
    parse_timestamp(raw).ok_or_else(|| {
        ComputeError::DateParseError(format!("'{}': expected YYYY-MM-DDTHH:MM:SS", raw))
    })
}

/// Outcome of a sync pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub sync_id: Uuid,
    pub computed_at_utc: DateTime<Utc>,
    pub activity_count: usize,
    pub skipped_activities: usize,
    pub days: usize,
    pub current: Option<CurrentFitness>,
}

/// Processor bound to one athlete profile
#[derive(Debug, Clone, Default)]
pub struct LoadProcessor {
    profile: AthleteProfile,
}

impl LoadProcessor {
    pub fn new(profile: AthleteProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &AthleteProfile {
        &self.profile
    }

    /// Parse and normalize a vendor payload
    pub fn ingest(
        &self,
        adapter: &dyn ActivityPayloadAdapter,
        raw_json: &str,
    ) -> Result<Vec<Activity>, ComputeError> {
        let raw = adapter.parse(raw_json)?;
        let activities = Normalizer::normalize_all(&raw);

        for activity in &activities {
            let flags = Normalizer::quality_flags(activity);
            if !flags.is_empty() {
                debug!(
                    activity_id = ?activity.activity_id,
                    modality = %activity.modality,
                    ?flags,
                    "activity ingested with gaps"
                );
            }
        }

        debug!(count = activities.len(), "activities ingested");
        Ok(activities)
    }

    /// Write stress fields onto every activity
    pub fn annotate(&self, activities: &mut [Activity]) {
        StressEstimator::annotate_all(activities, &self.profile);
    }

    /// Daily TRIMP totals; activities without a usable start time are logged
    /// and left out
    pub fn daily_loads(&self, activities: &[Activity]) -> DailyAggregation {
        let aggregation = DailyLoadAggregator::aggregate(activities, &self.profile);
        for &idx in &aggregation.skipped {
            let activity = &activities[idx];
            warn!(
                activity_id = ?activity.activity_id,
                start_time_local = ?activity.start_time_local,
                start_time_gmt = ?activity.start_time_gmt,
                "skipping activity with unparseable start time"
            );
        }
        aggregation
    }

    /// Fitness series over `[start, end]`
    pub fn fitness_series(
        &self,
        activities: &[Activity],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<FitnessMetric> {
        let aggregation = self.daily_loads(activities);
        FitnessRecurrence::series(&aggregation.loads, start, end)
    }

    /// Fitness series from the first activity date through `end`
    pub fn fitness_series_through(&self, activities: &[Activity], end: NaiveDate) -> Vec<FitnessMetric> {
        let aggregation = self.daily_loads(activities);
        FitnessRecurrence::series_through(&aggregation.loads, end)
    }

    /// Weekly/monthly goal progress as of `now`
    pub fn progress(
        &self,
        activities: &[Activity],
        metrics: &[FitnessMetric],
        goals: &GoalConfig,
        now: NaiveDateTime,
    ) -> GoalProgress {
        GoalAggregator::progress(activities, metrics, goals, &self.profile, now)
    }

    /// Merge `incoming` into the repository, annotate, and regenerate the full
    /// fitness series through `today`. The stored series is replaced, never
    /// appended to.
    ///
    /// The two writes are not atomic. The series is written first, so a failed
    /// activity write leaves the previous activities in place and the next sync
    /// regenerates the series from them.
    pub fn sync<R: ActivityRepository>(
        &self,
        repo: &mut R,
        incoming: Vec<Activity>,
        today: NaiveDate,
    ) -> Result<SyncSummary, ComputeError> {
        let sync_id = Uuid::new_v4();
        let existing = repo.load_activities()?;
        let incoming_count = incoming.len();

        let mut activities = merge_activities(existing, incoming);
        self.annotate(&mut activities);

        let aggregation = self.daily_loads(&activities);
        let metrics = FitnessRecurrence::series_through(&aggregation.loads, today);

        repo.save_metrics(&metrics)?;
        repo.save_activities(&activities)?;

        let summary = SyncSummary {
            sync_id,
            computed_at_utc: Utc::now(),
            activity_count: activities.len(),
            skipped_activities: aggregation.skipped.len(),
            days: metrics.len(),
            current: latest(&metrics).map(CurrentFitness::from),
        };

        info!(
            %sync_id,
            incoming = incoming_count,
            activities = summary.activity_count,
            skipped = summary.skipped_activities,
            days = summary.days,
            "sync complete"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRepository;
    use crate::types::TssMethod;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_garmin_json() -> &'static str {
        r#"[
            {
                "activityId": 1,
                "startTimeLocal": "2024-01-15 07:30:00",
                "activityType": {"typeKey": "indoor_cycling"},
                "duration": 3600,
                "avgPower": 275,
                "averageHR": 150
            },
            {
                "activityId": 2,
                "startTimeLocal": "2024-01-17 06:45:00",
                "activityType": {"typeKey": "running"},
                "duration": 2700,
                "distance": 9000,
                "averageSpeed": 3.33,
                "avgHr": 152
            },
            {
                "activityId": 3,
                "startTimeLocal": "sometime",
                "activityType": {"typeKey": "strength_training"},
                "duration": 1800,
                "averageHR": 120
            }
        ]"#
    }

    #[test]
    fn test_garmin_to_fitness_json() {
        let json = garmin_to_fitness_json(
            sample_garmin_json(),
            &AthleteProfile::default(),
            date(2024, 1, 21),
        )
        .unwrap();

        let series: Vec<FitnessMetric> = serde_json::from_str(&json).unwrap();
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, date(2024, 1, 15));
        // Day one is the power-based ride: 121 TRIMP
        assert!((series[0].daily_load - 121.0).abs() < 1e-9);
        assert_eq!(series[1].daily_load, 0.0);
        assert!(series[2].daily_load > 0.0);
        for metric in &series {
            assert_eq!(metric.tsb, metric.ctl - metric.atl);
        }
    }

    #[test]
    fn test_strava_to_fitness_json_empty() {
        let json =
            strava_to_fitness_json("[]", &AthleteProfile::default(), date(2024, 1, 21)).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_invalid_json() {
        let result = garmin_to_fitness_json(
            "not valid json",
            &AthleteProfile::default(),
            date(2024, 1, 21),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_date_arguments() {
        assert_eq!(parse_date("2024-01-21").unwrap(), date(2024, 1, 21));
        assert!(matches!(
            parse_date("21/01/2024"),
            Err(ComputeError::DateParseError(_))
        ));
        assert_eq!(
            parse_datetime("2024-01-21T18:30:00").unwrap(),
            date(2024, 1, 21).and_hms_opt(18, 30, 0).unwrap()
        );
        assert!(matches!(
            parse_datetime("yesterday"),
            Err(ComputeError::DateParseError(_))
        ));
    }

    #[test]
    fn test_sync_regenerates_series() {
        let processor = LoadProcessor::default();
        let mut repo = MemoryRepository::new();

        let first = processor
            .ingest(&GarminAdapter, sample_garmin_json())
            .unwrap();
        let summary = processor.sync(&mut repo, first, date(2024, 1, 20)).unwrap();

        assert_eq!(summary.activity_count, 3);
        assert_eq!(summary.skipped_activities, 1);
        assert_eq!(summary.days, 6);
        assert_eq!(summary.current.unwrap().date, date(2024, 1, 20));

        let stored = repo.load_activities().unwrap();
        assert_eq!(stored[0].tss_method, Some(TssMethod::Power));
        assert_eq!(stored[2].tss_method, Some(TssMethod::HeartRate));

        // A second sync with nothing new rewrites an identical series
        let before = repo.load_metrics().unwrap();
        processor.sync(&mut repo, Vec::new(), date(2024, 1, 20)).unwrap();
        assert_eq!(repo.load_metrics().unwrap(), before);
    }

    /// Repository whose activity writes always fail
    struct ReadOnlyActivities(MemoryRepository);

    impl ActivityRepository for ReadOnlyActivities {
        fn load_activities(&self) -> Result<Vec<Activity>, ComputeError> {
            self.0.load_activities()
        }

        fn save_activities(&mut self, _: &[Activity]) -> Result<(), ComputeError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }

        fn load_metrics(&self) -> Result<Vec<FitnessMetric>, ComputeError> {
            self.0.load_metrics()
        }

        fn save_metrics(&mut self, metrics: &[FitnessMetric]) -> Result<(), ComputeError> {
            self.0.save_metrics(metrics)
        }
    }

    #[test]
    fn test_sync_writes_series_before_activities() {
        let processor = LoadProcessor::default();
        let incoming = processor
            .ingest(&GarminAdapter, sample_garmin_json())
            .unwrap();
        let mut repo = ReadOnlyActivities(MemoryRepository::new());

        let result = processor.sync(&mut repo, incoming, date(2024, 1, 20));
        assert!(matches!(result, Err(ComputeError::Io(_))));
        assert!(repo.load_activities().unwrap().is_empty());
        assert_eq!(repo.load_metrics().unwrap().len(), 6);
    }

    #[test]
    fn test_sync_preserves_external_correction() {
        let processor = LoadProcessor::default();
        let mut activities = processor
            .ingest(&GarminAdapter, sample_garmin_json())
            .unwrap();
        activities[1].tss = Some(88.0);
        activities[1].tss_method = Some(TssMethod::HeartRate);

        let mut repo = MemoryRepository::with_activities(activities);
        let refetched = processor
            .ingest(&GarminAdapter, sample_garmin_json())
            .unwrap();
        processor.sync(&mut repo, refetched, date(2024, 1, 20)).unwrap();

        let stored = repo.load_activities().unwrap();
        assert_eq!(stored[1].tss, Some(88.0));
        assert_eq!(stored[1].tss_method, Some(TssMethod::HeartRate));
    }

    #[test]
    fn test_progress_through_processor() {
        let processor = LoadProcessor::default();
        let mut activities = processor
            .ingest(&GarminAdapter, sample_garmin_json())
            .unwrap();
        processor.annotate(&mut activities);
        let metrics = processor.fitness_series(&activities, date(2024, 1, 15), date(2024, 1, 17));

        let now = date(2024, 1, 17).and_hms_opt(20, 0, 0).unwrap();
        let progress = processor.progress(&activities, &metrics, &GoalConfig::default(), now);

        assert_eq!(progress.week.totals.activities, 2);
        assert_eq!(progress.current.unwrap().date, date(2024, 1, 17));
    }
}
