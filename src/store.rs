//! Activity and fitness persistence
//!
//! Persistence is a flat JSON array per record kind. Activities are merged by
//! id and rewritten; the fitness series is always overwritten wholesale since
//! it is regenerated on every sync.

use crate::adapters::{ActivityPayloadAdapter, CanonicalAdapter};
use crate::error::ComputeError;
use crate::normalizer::Normalizer;
use crate::types::{Activity, FitnessMetric};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ACTIVITIES_FILE: &str = "activities.json";
pub const METRICS_FILE: &str = "fitness_metrics.json";

/// Storage for annotated activities and the fitness series
pub trait ActivityRepository {
    fn load_activities(&self) -> Result<Vec<Activity>, ComputeError>;
    fn save_activities(&mut self, activities: &[Activity]) -> Result<(), ComputeError>;
    fn load_metrics(&self) -> Result<Vec<FitnessMetric>, ComputeError>;
    fn save_metrics(&mut self, metrics: &[FitnessMetric]) -> Result<(), ComputeError>;
}

/// In-memory repository
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    activities: Vec<Activity>,
    metrics: Vec<FitnessMetric>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activities(activities: Vec<Activity>) -> Self {
        Self {
            activities,
            metrics: Vec::new(),
        }
    }
}

impl ActivityRepository for MemoryRepository {
    fn load_activities(&self) -> Result<Vec<Activity>, ComputeError> {
        Ok(self.activities.clone())
    }

    fn save_activities(&mut self, activities: &[Activity]) -> Result<(), ComputeError> {
        self.activities = activities.to_vec();
        Ok(())
    }

    fn load_metrics(&self) -> Result<Vec<FitnessMetric>, ComputeError> {
        Ok(self.metrics.clone())
    }

    fn save_metrics(&mut self, metrics: &[FitnessMetric]) -> Result<(), ComputeError> {
        self.metrics = metrics.to_vec();
        Ok(())
    }
}

/// Directory-backed repository holding `activities.json` and
/// `fitness_metrics.json`
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_optional(&self, file: &str) -> Result<Option<String>, ComputeError> {
        let path = self.dir.join(file);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "store file missing, treating as empty");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, file: &str, json: String) -> Result<(), ComputeError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file);
        fs::write(&path, json)?;
        debug!(path = %path.display(), "store file written");
        Ok(())
    }
}

impl ActivityRepository for JsonFileRepository {
    fn load_activities(&self) -> Result<Vec<Activity>, ComputeError> {
        match self.read_optional(ACTIVITIES_FILE)? {
            Some(content) => {
                let raw = CanonicalAdapter.parse(&content)?;
                Ok(Normalizer::normalize_all(&raw))
            }
            None => Ok(Vec::new()),
        }
    }

    fn save_activities(&mut self, activities: &[Activity]) -> Result<(), ComputeError> {
        self.write(ACTIVITIES_FILE, serde_json::to_string_pretty(activities)?)
    }

    fn load_metrics(&self) -> Result<Vec<FitnessMetric>, ComputeError> {
        match self.read_optional(METRICS_FILE)? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_metrics(&mut self, metrics: &[FitnessMetric]) -> Result<(), ComputeError> {
        self.write(METRICS_FILE, serde_json::to_string_pretty(metrics)?)
    }
}

/// Merge freshly fetched activities into the stored list.
///
/// Records with a known `activity_id` replace the stored record in place;
/// everything else is appended. A replacement without any stress fields
/// inherits the stored ones so earlier corrections survive a re-fetch.
pub fn merge_activities(existing: Vec<Activity>, incoming: Vec<Activity>) -> Vec<Activity> {
    let mut merged = existing;
    let mut index: HashMap<u64, usize> = merged
        .iter()
        .enumerate()
        .filter_map(|(idx, a)| a.activity_id.map(|id| (id, idx)))
        .collect();

    for mut activity in incoming {
        let slot = activity.activity_id.and_then(|id| index.get(&id).copied());
        match slot {
            Some(idx) => {
                if !activity.has_stress_fields() {
                    let stored = &merged[idx];
                    activity.tss = stored.tss;
                    activity.rtss = stored.rtss;
                    activity.stss = stored.stss;
                    activity.hrtss = stored.hrtss;
                    activity.tss_method = stored.tss_method;
                }
                merged[idx] = activity;
            }
            None => {
                if let Some(id) = activity.activity_id {
                    index.insert(id, merged.len());
                }
                merged.push(activity);
            }
        }
    }

    merged
}
