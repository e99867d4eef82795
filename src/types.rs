//! Core types for the trainload engine
//!
//! This module defines the records that flow through each stage: raw ingested
//! activities, normalized activities carrying derived stress fields, the
//! athlete profile, and the per-day fitness state.

use crate::normalizer::{lenient_opt_f64, lenient_opt_i64, lenient_opt_u64};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of activity modalities. Every activity maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Running,
    Cycling,
    Swimming,
    Strength,
    #[default]
    Other,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Running => "running",
            Modality::Cycling => "cycling",
            Modality::Swimming => "swimming",
            Modality::Strength => "strength",
            Modality::Other => "other",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Modality::Running),
            "cycling" => Ok(Modality::Cycling),
            "swimming" => Ok(Modality::Swimming),
            "strength" => Ok(Modality::Strength),
            "other" => Ok(Modality::Other),
            other => Err(format!("unknown modality: {other}")),
        }
    }
}

/// Estimation method that produced an activity's canonical stress score.
///
/// Ordered by selection priority: power first, `None` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TssMethod {
    Power,
    PaceRun,
    PaceSwim,
    HeartRate,
    None,
}

impl TssMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TssMethod::Power => "power",
            TssMethod::PaceRun => "pace_run",
            TssMethod::PaceSwim => "pace_swim",
            TssMethod::HeartRate => "heart_rate",
            TssMethod::None => "none",
        }
    }
}

impl fmt::Display for TssMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TssMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "power" => Ok(TssMethod::Power),
            "pace_run" => Ok(TssMethod::PaceRun),
            "pace_swim" => Ok(TssMethod::PaceSwim),
            "heart_rate" => Ok(TssMethod::HeartRate),
            "none" => Ok(TssMethod::None),
            other => Err(format!("unknown tss method: {other}")),
        }
    }
}

/// Activity as produced by an adapter, before normalization.
///
/// Every field is optional and may hold garbage upstream; numeric fields are
/// read leniently (numbers or numeric strings, anything else is absent).
/// The field names double as the persisted format of [`Activity`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawActivity {
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub activity_id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_key: Option<String>,
    #[serde(default)]
    pub start_time_local: Option<String>,
    #[serde(default)]
    pub start_time_gmt: Option<String>,
    /// Epoch seconds
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub start_timestamp: Option<i64>,
    /// Seconds
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub duration: Option<f64>,
    /// Meters
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub distance: Option<f64>,
    /// Watts
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub average_power: Option<f64>,
    /// Watts
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub normalized_power: Option<f64>,
    /// Meters per second
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub average_speed: Option<f64>,
    /// Beats per minute
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub average_hr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub tss: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub rtss: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub stss: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub hrtss: Option<f64>,
    #[serde(default)]
    pub tss_method: Option<String>,
}

/// Normalized activity record.
///
/// Performance fields are always present; missing or invalid input reads as 0.
/// Only the stress fields (`tss`, `rtss`, `stss`, `hrtss`, `tss_method`) are
/// written after ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Raw type tag as supplied by the source
    #[serde(default)]
    pub type_key: String,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_local: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_gmt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<i64>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub average_power: f64,
    #[serde(default)]
    pub normalized_power: f64,
    #[serde(default)]
    pub average_speed: f64,
    #[serde(default)]
    pub average_hr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrtss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tss_method: Option<TssMethod>,
}

impl Activity {
    /// Duration in hours
    pub fn hours(&self) -> f64 {
        self.duration / 3600.0
    }

    /// Duration in minutes
    pub fn minutes(&self) -> f64 {
        self.duration / 60.0
    }

    /// Normalized power when available, otherwise average power
    pub fn power(&self) -> f64 {
        if self.normalized_power > 0.0 {
            self.normalized_power
        } else {
            self.average_power
        }
    }

    /// Whether any stress field was supplied or previously derived
    pub fn has_stress_fields(&self) -> bool {
        self.tss.is_some()
            || self.rtss.is_some()
            || self.stss.is_some()
            || self.hrtss.is_some()
            || self.tss_method.is_some()
    }
}

/// Athlete thresholds used by every estimation path.
///
/// Deserialization fills absent or invalid keys with defaults; see
/// [`crate::config`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "crate::config::ProfileConfig")]
pub struct AthleteProfile {
    /// Functional threshold power (watts)
    pub ftp: f64,
    /// Resting heart rate (bpm)
    pub hr_rest: f64,
    /// Maximum heart rate (bpm)
    pub hr_max: f64,
    /// Lactate threshold heart rate (bpm)
    pub hr_threshold: f64,
    /// Running threshold pace, "mm:ss" per km
    pub pace_threshold: String,
    /// Swim threshold pace, "mm:ss" per 100 m
    pub swim_pace_threshold: String,
}

/// Stress estimates for a single activity.
///
/// The four method estimates are independent; `selected`/`method` hold the
/// first strictly positive one in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressEstimates {
    pub power_tss: f64,
    pub rtss: f64,
    pub stss: f64,
    pub hrtss: f64,
    pub selected: f64,
    pub method: TssMethod,
}

impl Default for StressEstimates {
    fn default() -> Self {
        Self {
            power_tss: 0.0,
            rtss: 0.0,
            stss: 0.0,
            hrtss: 0.0,
            selected: 0.0,
            method: TssMethod::None,
        }
    }
}

/// Fitness state for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessMetric {
    pub date: NaiveDate,
    pub daily_load: f64,
    /// Chronic training load (42-day EWMA)
    pub ctl: f64,
    /// Acute training load (7-day EWMA)
    pub atl: f64,
    /// Training stress balance, always `ctl - atl`
    pub tsb: f64,
}

/// Form classification derived from TSB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    /// TSB > 25: fitness is being lost
    Transition,
    /// 5 < TSB <= 25: rested, race-ready
    Fresh,
    /// -10 <= TSB <= 5
    Neutral,
    /// -30 <= TSB < -10: productive training block
    Productive,
    /// TSB < -30
    Overreaching,
}

/// Data-quality flag raised during normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    MissingDuration,
    MissingStartTime,
    MissingHeartRate,
    MissingPower,
    MissingSpeed,
    PresetStress,
}
