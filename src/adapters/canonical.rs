//! Canonical adapter
//!
//! Reads the crate's own persisted activity array back in. Field names match
//! [`RawActivity`]; numeric fields are read leniently.

use crate::error::ComputeError;
use crate::types::RawActivity;

use super::ActivityPayloadAdapter;

/// Adapter for previously persisted activities
pub struct CanonicalAdapter;

impl ActivityPayloadAdapter for CanonicalAdapter {
    fn parse(&self, raw_json: &str) -> Result<Vec<RawActivity>, ComputeError> {
        let activities: Vec<RawActivity> = serde_json::from_str(raw_json)?;
        Ok(activities)
    }
}
