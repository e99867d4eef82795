//! Training impulse (TRIMP)
//!
//! One scalar impulse per activity, used only as input to daily load
//! aggregation. It keeps its own per-modality scaling, which deliberately
//! differs from [`crate::estimator`]:
//! - the heart-rate primitive uses heart-rate reserve against `hr_max` (not
//!   the threshold) and minutes, divided by 2.5
//! - swimming heart-rate load is discounted by 9.0 instead of 3.5

use crate::estimator::{banister_weight, hr_reserve_ratio, SwimCorrectionProfile};
use crate::types::{Activity, AthleteProfile, Modality};

/// Divisor mapping raw Banister units onto a TSS-comparable scale
pub const TRIMP_SCALE_DIVISOR: f64 = 2.5;

/// Flat hourly impulse for swims with neither heart rate nor distance
pub const SWIM_FLAT_HOURLY_LOAD: f64 = 22.0;

/// TRIMP calculator
pub struct TrimpCalculator;

impl TrimpCalculator {
    /// Impulse for one activity; 0 when duration is not positive
    pub fn calculate(activity: &Activity, profile: &AthleteProfile) -> f64 {
        if activity.duration <= 0.0 {
            return 0.0;
        }

        match activity.modality {
            Modality::Cycling => {
                let power = activity.power();
                if profile.ftp > 0.0 && power > 0.0 {
                    let ratio = power / profile.ftp;
                    activity.hours() * ratio * ratio * 100.0
                } else {
                    heart_rate_trimp(activity, profile)
                }
            }
            Modality::Running => {
                if activity.average_hr > 0.0 {
                    heart_rate_trimp(activity, profile)
                } else {
                    run_pace_trimp(activity, profile)
                }
            }
            Modality::Swimming => {
                if activity.average_hr > 0.0 {
                    heart_rate_trimp(activity, profile)
                        / SwimCorrectionProfile::Trimp.heart_rate_divisor()
                } else if activity.distance > 0.0 {
                    swim_pace_trimp(activity, profile)
                } else {
                    activity.hours() * SWIM_FLAT_HOURLY_LOAD
                }
            }
            Modality::Strength | Modality::Other => heart_rate_trimp(activity, profile),
        }
    }
}

/// Banister TRIMP over heart-rate reserve, scaled by 1/2.5
fn heart_rate_trimp(activity: &Activity, profile: &AthleteProfile) -> f64 {
    let reserve = hr_reserve_ratio(activity.average_hr, profile.hr_rest, profile.hr_max);
    if reserve <= 0.0 {
        return 0.0;
    }
    activity.minutes() * banister_weight(reserve) / TRIMP_SCALE_DIVISOR
}

fn run_pace_trimp(activity: &Activity, profile: &AthleteProfile) -> f64 {
    let actual = if activity.distance > 0.0 {
        activity.duration / (activity.distance / 1000.0)
    } else if activity.average_speed > 0.0 {
        1000.0 / activity.average_speed
    } else {
        return 0.0;
    };

    let ratio = profile.pace_threshold_secs() / actual;
    activity.hours() * ratio * ratio * 100.0
}

fn swim_pace_trimp(activity: &Activity, profile: &AthleteProfile) -> f64 {
    let actual = activity.duration / (activity.distance / 100.0);
    let ratio = profile.swim_pace_threshold_secs() / actual;
    activity.hours() * ratio * ratio * 100.0 / SwimCorrectionProfile::Trimp.pace_divisor()
}
