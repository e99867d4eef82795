//! trainload - Deterministic training-load engine for endurance athletes
//!
//! trainload turns raw activity records into standardized training-load
//! metrics through a deterministic pipeline: payload adaptation →
//! normalization and classification → stress estimation → daily TRIMP
//! aggregation → CTL/ATL/TSB recurrence.
//!
//! ## Modules
//!
//! - **Calculation core**: [`pace`], [`classifier`], [`estimator`], [`trimp`],
//!   [`aggregator`], [`fitness`], [`goals`]. Pure, synchronous and infallible.
//! - **Boundaries**: [`adapters`], [`normalizer`], [`config`], [`store`],
//!   [`pipeline`]. Parsing, persistence and logging live here.

pub mod adapters;
pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod error;
pub mod estimator;
pub mod fitness;
pub mod goals;
pub mod normalizer;
pub mod pace;
pub mod pipeline;
pub mod store;
pub mod trimp;
pub mod types;

pub use classifier::classify;
pub use config::EngineConfig;
pub use error::ComputeError;
pub use estimator::{StressEstimator, SwimCorrectionProfile};
pub use fitness::FitnessRecurrence;
pub use pipeline::{garmin_to_fitness_json, strava_to_fitness_json, LoadProcessor, SyncSummary};
pub use trimp::TrimpCalculator;
pub use types::{Activity, AthleteProfile, FitnessMetric, Modality, TssMethod};

/// Engine version
pub const TRAINLOAD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const ENGINE_NAME: &str = "trainload";
