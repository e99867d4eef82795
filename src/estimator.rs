//! Stress score estimation
//!
//! Computes four independent per-activity stress estimates and selects the
//! canonical one by priority:
//!
//! | method       | applies to | formula                                            |
//! |--------------|------------|----------------------------------------------------|
//! | `power`      | cycling    | `hours × (power / ftp)² × 100`                      |
//! | `pace_run`   | running    | `hours × (speed / threshold_speed)² × 100 × 1.15`   |
//! | `pace_swim`  | swimming   | `hours × (speed / threshold_speed)² × 100 / 3.5`    |
//! | `heart_rate` | any        | `hours × r × 0.64 × e^(1.92 r) × 100` (swim / 3.5)  |
//!
//! where `r = clamp((avg_hr - rest) / (threshold - rest), 0, 2)`.

use crate::types::{Activity, AthleteProfile, Modality, StressEstimates, TssMethod};

/// Empirical uplift applied to pace-based running stress
pub const RUN_PACE_UPLIFT: f64 = 1.15;

/// Banister weighting coefficients
pub const BANISTER_A: f64 = 0.64;
pub const BANISTER_B: f64 = 1.92;

/// Upper bound for heart-rate reserve ratios
pub const HR_RATIO_CAP: f64 = 2.0;

/// Swimming correction constants.
///
/// The estimator and the TRIMP calculator discount swimming heart-rate load
/// by different divisors (3.5 vs 9.0). Both are kept as named variants; the
/// discrepancy is pinned by tests rather than reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwimCorrectionProfile {
    Estimator,
    Trimp,
}

impl SwimCorrectionProfile {
    /// Divisor applied to heart-rate derived swim load
    pub fn heart_rate_divisor(&self) -> f64 {
        match self {
            SwimCorrectionProfile::Estimator => 3.5,
            SwimCorrectionProfile::Trimp => 9.0,
        }
    }

    /// Divisor applied to pace derived swim load
    pub fn pace_divisor(&self) -> f64 {
        3.5
    }
}

/// Stress score estimator
pub struct StressEstimator;

impl StressEstimator {
    /// Compute all four estimates and the canonical selection
    pub fn estimate(activity: &Activity, profile: &AthleteProfile) -> StressEstimates {
        if activity.duration <= 0.0 {
            return StressEstimates::default();
        }

        let power_tss = power_tss(activity, profile);
        let rtss = running_pace_tss(activity, profile);
        let stss = swim_pace_tss(activity, profile);
        let hrtss = heart_rate_tss(activity, profile);

        let (selected, method) = select_canonical(power_tss, rtss, stss, hrtss);

        StressEstimates {
            power_tss,
            rtss,
            stss,
            hrtss,
            selected,
            method,
        }
    }

    /// Write derived stress fields onto an activity.
    ///
    /// A strictly positive pre-existing value in any stress field is
    /// authoritative and left as is, and so is a preset `tss_method` other
    /// than `none`. `tss` is only written when it is not positive yet: from
    /// the preset method's estimate if there is one, otherwise from the
    /// canonical selection over the preserved `rtss`/`stss`/`hrtss` values.
    pub fn annotate(activity: &mut Activity, profile: &AthleteProfile) -> StressEstimates {
        let estimates = Self::estimate(activity, profile);

        let rtss = keep_or_fill(&mut activity.rtss, estimates.rtss);
        let stss = keep_or_fill(&mut activity.stss, estimates.stss);
        let hrtss = keep_or_fill(&mut activity.hrtss, estimates.hrtss);

        if !is_positive(activity.tss) {
            match activity.tss_method {
                // A preset method stays; tss is filled from that method's estimate
                Some(method) if method != TssMethod::None => {
                    let value = match method {
                        TssMethod::Power => estimates.power_tss,
                        TssMethod::PaceRun => rtss,
                        TssMethod::PaceSwim => stss,
                        TssMethod::HeartRate => hrtss,
                        TssMethod::None => 0.0,
                    };
                    activity.tss = Some(value);
                }
                _ => {
                    let (selected, method) =
                        select_canonical(estimates.power_tss, rtss, stss, hrtss);
                    activity.tss = Some(selected);
                    activity.tss_method = Some(method);
                }
            }
        }

        estimates
    }

    /// Annotate a batch in place
    pub fn annotate_all(activities: &mut [Activity], profile: &AthleteProfile) {
        for activity in activities.iter_mut() {
            Self::annotate(activity, profile);
        }
    }

    /// Canonical stress for an activity: its annotated `tss` when positive,
    /// otherwise the estimator's selection.
    pub fn canonical_tss(activity: &Activity, profile: &AthleteProfile) -> f64 {
        match activity.tss {
            Some(tss) if tss > 0.0 => tss,
            _ => Self::estimate(activity, profile).selected,
        }
    }
}

fn is_positive(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v > 0.0)
}

/// Keep a positive stored value, otherwise store the computed one when positive.
/// Returns the effective value.
fn keep_or_fill(slot: &mut Option<f64>, computed: f64) -> f64 {
    match *slot {
        Some(existing) if existing > 0.0 => existing,
        _ => {
            if computed > 0.0 {
                *slot = Some(computed);
            }
            computed.max(0.0)
        }
    }
}

fn select_canonical(power: f64, rtss: f64, stss: f64, hrtss: f64) -> (f64, TssMethod) {
    [
        (power, TssMethod::Power),
        (rtss, TssMethod::PaceRun),
        (stss, TssMethod::PaceSwim),
        (hrtss, TssMethod::HeartRate),
    ]
    .into_iter()
    .find(|(value, _)| *value > 0.0)
    .unwrap_or((0.0, TssMethod::None))
}

/// Intensity-factor-squared load in TSS units
fn if_squared_load(hours: f64, intensity_factor: f64) -> f64 {
    hours * intensity_factor * intensity_factor * 100.0
}

fn power_tss(activity: &Activity, profile: &AthleteProfile) -> f64 {
    let power = activity.power();
    if activity.modality != Modality::Cycling || profile.ftp <= 0.0 || power <= 0.0 {
        return 0.0;
    }
    if_squared_load(activity.hours(), power / profile.ftp)
}

fn running_pace_tss(activity: &Activity, profile: &AthleteProfile) -> f64 {
    if activity.modality != Modality::Running || activity.average_speed <= 0.0 {
        return 0.0;
    }
    let threshold_speed = 1000.0 / profile.pace_threshold_secs();
    if_squared_load(activity.hours(), activity.average_speed / threshold_speed) * RUN_PACE_UPLIFT
}

fn swim_pace_tss(activity: &Activity, profile: &AthleteProfile) -> f64 {
    if activity.modality != Modality::Swimming || activity.average_speed <= 0.0 {
        return 0.0;
    }
    let threshold_speed = 100.0 / profile.swim_pace_threshold_secs();
    if_squared_load(activity.hours(), activity.average_speed / threshold_speed)
        / SwimCorrectionProfile::Estimator.pace_divisor()
}

fn heart_rate_tss(activity: &Activity, profile: &AthleteProfile) -> f64 {
    let ratio = hr_reserve_ratio(activity.average_hr, profile.hr_rest, profile.hr_threshold);
    if ratio <= 0.0 {
        return 0.0;
    }

    let raw = activity.hours() * banister_weight(ratio) * 100.0;
    if activity.modality == Modality::Swimming {
        raw / SwimCorrectionProfile::Estimator.heart_rate_divisor()
    } else {
        raw
    }
}

/// `(avg - rest) / (ceiling - rest)` clamped to `[0, 2]`.
///
/// Returns 0 when there is no heart rate or the ceiling does not exceed rest.
pub(crate) fn hr_reserve_ratio(avg_hr: f64, rest: f64, ceiling: f64) -> f64 {
    let span = ceiling - rest;
    if avg_hr <= 0.0 || span.is_nan() || span <= 0.0 {
        return 0.0;
    }
    ((avg_hr - rest) / span).clamp(0.0, HR_RATIO_CAP)
}

/// `r × 0.64 × e^(1.92 r)`
pub(crate) fn banister_weight(ratio: f64) -> f64 {
    ratio * BANISTER_A * (BANISTER_B * ratio).exp()
}
