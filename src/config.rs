//! Engine configuration
//!
//! Configuration is a flat JSON object with the athlete thresholds at the top
//! level and an optional `goals` section:
//!
//! ```json
//! {
//!   "ftp": 265,
//!   "hr_rest": 48,
//!   "hr_max": 188,
//!   "hr_threshold": 165,
//!   "pace_threshold": "4:15",
//!   "swim_pace_threshold": "1:55",
//!   "goals": { "weekly": { "distance_km": 60, "tss": 450 } }
//! }
//! ```
//!
//! Absent keys take their defaults. Numeric keys accept numbers or numeric
//! strings; anything else falls back to the default instead of failing.

use crate::error::ComputeError;
use crate::goals::GoalConfig;
use crate::normalizer::lenient_opt_f64;
use crate::pace::{parse_pace_or, DEFAULT_RUN_PACE_FALLBACK_SECS, DEFAULT_SWIM_PACE_FALLBACK_SECS};
use crate::types::AthleteProfile;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const DEFAULT_FTP: f64 = 250.0;
pub const DEFAULT_HR_REST: f64 = 50.0;
pub const DEFAULT_HR_MAX: f64 = 191.0;
pub const DEFAULT_HR_THRESHOLD: f64 = 162.0;
pub const DEFAULT_PACE_THRESHOLD: &str = "4:22";
pub const DEFAULT_SWIM_PACE_THRESHOLD: &str = "2:01";

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            ftp: DEFAULT_FTP,
            hr_rest: DEFAULT_HR_REST,
            hr_max: DEFAULT_HR_MAX,
            hr_threshold: DEFAULT_HR_THRESHOLD,
            pace_threshold: DEFAULT_PACE_THRESHOLD.to_string(),
            swim_pace_threshold: DEFAULT_SWIM_PACE_THRESHOLD.to_string(),
        }
    }
}

impl AthleteProfile {
    /// Running threshold pace in seconds per km
    pub fn pace_threshold_secs(&self) -> f64 {
        parse_pace_or(&self.pace_threshold, DEFAULT_RUN_PACE_FALLBACK_SECS)
    }

    /// Swim threshold pace in seconds per 100 m
    pub fn swim_pace_threshold_secs(&self) -> f64 {
        parse_pace_or(&self.swim_pace_threshold, DEFAULT_SWIM_PACE_FALLBACK_SECS)
    }
}

/// Wire shape of the athlete profile; every key optional
#[derive(Debug, Default, Deserialize)]
pub struct ProfileConfig {
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    ftp: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    hr_rest: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    hr_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    hr_threshold: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pace_threshold: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    swim_pace_threshold: Option<String>,
}

impl From<ProfileConfig> for AthleteProfile {
    fn from(cfg: ProfileConfig) -> Self {
        Self {
            ftp: cfg.ftp.unwrap_or(DEFAULT_FTP),
            hr_rest: cfg.hr_rest.unwrap_or(DEFAULT_HR_REST),
            hr_max: cfg.hr_max.unwrap_or(DEFAULT_HR_MAX),
            hr_threshold: cfg.hr_threshold.unwrap_or(DEFAULT_HR_THRESHOLD),
            pace_threshold: cfg
                .pace_threshold
                .unwrap_or_else(|| DEFAULT_PACE_THRESHOLD.to_string()),
            swim_pace_threshold: cfg
                .swim_pace_threshold
                .unwrap_or_else(|| DEFAULT_SWIM_PACE_THRESHOLD.to_string()),
        }
    }
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(flatten)]
    pub profile: AthleteProfile,
    #[serde(default)]
    pub goals: GoalConfig,
}

impl EngineConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        serde_json::from_str(json).map_err(|e| ComputeError::ConfigError(e.to_string()))
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ComputeError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();

        assert_eq!(config.profile, AthleteProfile::default());
        assert_eq!(config.profile.ftp, 250.0);
        assert_eq!(config.profile.hr_rest, 50.0);
        assert_eq!(config.profile.hr_max, 191.0);
        assert_eq!(config.profile.hr_threshold, 162.0);
        assert_eq!(config.profile.pace_threshold_secs(), 262.0);
        assert_eq!(config.profile.swim_pace_threshold_secs(), 121.0);
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_json(
            r#"{"ftp": "280", "hr_threshold": 170, "goals": {"weekly": {"tss": 400}}}"#,
        )
        .unwrap();

        assert_eq!(config.profile.ftp, 280.0);
        assert_eq!(config.profile.hr_threshold, 170.0);
        assert_eq!(config.profile.hr_rest, 50.0);
        assert_eq!(config.goals.weekly.tss, 400.0);
        assert_eq!(config.goals.monthly.tss, 0.0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = EngineConfig::from_json(
            r#"{"ftp": "lots", "pace_threshold": "quick", "swim_pace_threshold": 121}"#,
        )
        .unwrap();

        assert_eq!(config.profile.ftp, 250.0);
        // Malformed pace strings are kept verbatim and resolved at use
        assert_eq!(config.profile.pace_threshold_secs(), 300.0);
        assert_eq!(config.profile.swim_pace_threshold, "2:01");
    }

    #[test]
    fn test_config_round_trip_is_stable() {
        let config = EngineConfig::from_json(r#"{"ftp": 300}"#).unwrap();
        let json = config.to_json().unwrap();
        let reloaded = EngineConfig::from_json(&json).unwrap();
        assert_eq!(config, reloaded);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let result = EngineConfig::from_json("{ftp: 1");
        assert!(matches!(result, Err(ComputeError::ConfigError(_))));
    }
}
