//! Goal and progress aggregation
//!
//! Rolls activities up into the current week (Monday 00:00 through now) and
//! current month (day 1 through now), and compares the sums against the
//! configured targets.

use crate::aggregator::activity_start;
use crate::estimator::StressEstimator;
use crate::fitness::latest;
use crate::types::{Activity, AthleteProfile, FitnessMetric, Modality};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Numeric targets for one window. Zero means "no target".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalTargets {
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub tss: f64,
    #[serde(default)]
    pub hours: f64,
    #[serde(default)]
    pub activities: f64,
}

/// Goal configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalConfig {
    #[serde(default)]
    pub weekly: GoalTargets,
    #[serde(default)]
    pub monthly: GoalTargets,
    /// Restrict counted activities to one modality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,
}

/// Sums for one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowTotals {
    pub distance_km: f64,
    pub tss: f64,
    pub hours: f64,
    pub activities: u32,
}

/// Progress percentages; 0 whenever the target is 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressPct {
    pub distance_km: f64,
    pub tss: f64,
    pub hours: f64,
    pub activities: f64,
}

/// Progress within one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowProgress {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub totals: WindowTotals,
    pub targets: GoalTargets,
    pub progress_pct: ProgressPct,
}

/// Latest fitness/fatigue snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentFitness {
    pub date: NaiveDate,
    pub fitness: f64,
    pub fatigue: f64,
    pub form: f64,
}

impl From<&FitnessMetric> for CurrentFitness {
    fn from(metric: &FitnessMetric) -> Self {
        Self {
            date: metric.date,
            fitness: metric.ctl,
            fatigue: metric.atl,
            form: metric.tsb,
        }
    }
}

/// Weekly and monthly progress report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub week: WindowProgress,
    pub month: WindowProgress,
    pub current: Option<CurrentFitness>,
}

/// Goal/progress aggregator
pub struct GoalAggregator;

impl GoalAggregator {
    /// Compute weekly and monthly progress as of `now`
    pub fn progress(
        activities: &[Activity],
        metrics: &[FitnessMetric],
        goals: &GoalConfig,
        profile: &AthleteProfile,
        now: NaiveDateTime,
    ) -> GoalProgress {
        let week = window_progress(
            activities,
            goals,
            profile,
            week_start(now),
            now,
            goals.weekly,
        );
        let month = window_progress(
            activities,
            goals,
            profile,
            month_start(now),
            now,
            goals.monthly,
        );

        GoalProgress {
            week,
            month,
            current: latest(metrics).map(CurrentFitness::from),
        }
    }
}

/// Monday 00:00 of the week containing `now`
pub fn week_start(now: NaiveDateTime) -> NaiveDateTime {
    let days_from_monday = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date() - chrono::Duration::days(days_from_monday);
    monday.and_time(chrono::NaiveTime::MIN)
}

/// Day 1, 00:00 of the month containing `now`
pub fn month_start(now: NaiveDateTime) -> NaiveDateTime {
    now.date()
        .with_day(1)
        .unwrap_or_else(|| now.date())
        .and_time(chrono::NaiveTime::MIN)
}

/// Percentage of `target` reached; 0 when there is no positive target
pub fn percent_of(actual: f64, target: f64) -> f64 {
    if target > 0.0 {
        actual / target * 100.0
    } else {
        0.0
    }
}

fn window_progress(
    activities: &[Activity],
    goals: &GoalConfig,
    profile: &AthleteProfile,
    start: NaiveDateTime,
    end: NaiveDateTime,
    targets: GoalTargets,
) -> WindowProgress {
    let mut totals = WindowTotals::default();

    for activity in activities {
        if let Some(modality) = goals.modality {
            if activity.modality != modality {
                continue;
            }
        }
        let Some(started) = activity_start(activity) else {
            continue;
        };
        if started < start || started > end {
            continue;
        }

        totals.distance_km += activity.distance / 1000.0;
        totals.tss += StressEstimator::canonical_tss(activity, profile);
        totals.hours += activity.hours();
        totals.activities += 1;
    }

    let progress_pct = ProgressPct {
        distance_km: percent_of(totals.distance_km, targets.distance_km),
        tss: percent_of(totals.tss, targets.tss),
        hours: percent_of(totals.hours, targets.hours),
        activities: percent_of(f64::from(totals.activities), targets.activities),
    };

    WindowProgress {
        start,
        end,
        totals,
        targets,
        progress_pct,
    }
}
