//! Fitness state recurrence (CTL/ATL/TSB)
//!
//! Walks daily load forward one calendar day at a time through two
//! first-order exponential moving averages:
//!
//! ```text
//! ctl += (load - ctl) / 42
//! atl += (load - atl) / 7
//! tsb  = ctl - atl
//! ```
//!
//! Every day's state depends on the previous day's, so the range is always
//! walked in ascending order from a cold start (`ctl = atl = 0`), including
//! days without load.

use crate::aggregator::DailyLoads;
use crate::types::{FitnessMetric, FormStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Chronic load time constant (days)
pub const CTL_TIME_CONSTANT: f64 = 42.0;

/// Acute load time constant (days)
pub const ATL_TIME_CONSTANT: f64 = 7.0;

/// Recurrence state carried from one day to the next
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessState {
    pub ctl: f64,
    pub atl: f64,
}

impl FitnessState {
    /// Advance one day with the given load
    pub fn step(&mut self, load: f64) {
        self.ctl += (load - self.ctl) / CTL_TIME_CONSTANT;
        self.atl += (load - self.atl) / ATL_TIME_CONSTANT;
    }

    pub fn tsb(&self) -> f64 {
        self.ctl - self.atl
    }
}

/// Fitness recurrence over a date range
pub struct FitnessRecurrence;

impl FitnessRecurrence {
    /// One metric per day in `[start, end]`, ascending. Empty when `start > end`.
    pub fn series(daily_loads: &DailyLoads, start: NaiveDate, end: NaiveDate) -> Vec<FitnessMetric> {
        if start > end {
            return Vec::new();
        }

        let mut state = FitnessState::default();
        let mut metrics = Vec::with_capacity(((end - start).num_days() + 1) as usize);

        for date in start.iter_days().take_while(|d| *d <= end) {
            let daily_load = daily_loads.get(&date).copied().unwrap_or(0.0);
            state.step(daily_load);
            metrics.push(FitnessMetric {
                date,
                daily_load,
                ctl: state.ctl,
                atl: state.atl,
                tsb: state.tsb(),
            });
        }

        metrics
    }

    /// Series from the earliest loaded date through `end`
    pub fn series_through(daily_loads: &DailyLoads, end: NaiveDate) -> Vec<FitnessMetric> {
        match daily_loads.keys().next() {
            Some(&start) => Self::series(daily_loads, start, end),
            None => Vec::new(),
        }
    }
}

impl FitnessMetric {
    /// Form band for this day's TSB
    pub fn form(&self) -> FormStatus {
        match self.tsb {
            t if t > 25.0 => FormStatus::Transition,
            t if t > 5.0 => FormStatus::Fresh,
            t if t >= -10.0 => FormStatus::Neutral,
            t if t >= -30.0 => FormStatus::Productive,
            _ => FormStatus::Overreaching,
        }
    }

    /// Acute:chronic workload ratio; 0 without chronic load
    pub fn acwr(&self) -> f64 {
        if self.ctl > 0.0 {
            self.atl / self.ctl
        } else {
            0.0
        }
    }
}

/// Most recent metric of a series
pub fn latest(metrics: &[FitnessMetric]) -> Option<&FitnessMetric> {
    metrics.iter().max_by_key(|m| m.date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loads_from(start: NaiveDate, values: &[f64]) -> DailyLoads {
        start
            .iter_days()
            .zip(values.iter().copied())
            .collect()
    }

    #[test]
    fn test_cold_start_golden() {
        let start = date(2024, 1, 1);
        let loads = loads_from(start, &[50.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let series = FitnessRecurrence::series(&loads, start, date(2024, 1, 7));

        assert_eq!(series.len(), 7);

        let day1 = &series[0];
        assert!((day1.ctl - 50.0 / 42.0).abs() < 1e-12);
        assert!((day1.atl - 50.0 / 7.0).abs() < 1e-12);
        assert!((day1.ctl - 1.19).abs() < 0.01);
        assert!((day1.atl - 7.14).abs() < 0.01);
        assert!((day1.tsb + 5.95).abs() < 0.01);

        let day7 = &series[6];
        assert!((day7.ctl - 1.030_215_576_248_355_6).abs() < 1e-9);
        assert!((day7.atl - 2.832_638_975_742_614_5).abs() < 1e-9);
        assert!((day7.tsb + 1.802_423_399_494_259).abs() < 1e-9);
    }

    #[test]
    fn test_tsb_is_exact_difference() {
        let start = date(2024, 3, 1);
        let loads = loads_from(start, &[80.0, 0.0, 120.0, 45.5, 0.0, 200.0, 10.0, 0.0, 65.0]);
        for metric in FitnessRecurrence::series(&loads, start, date(2024, 3, 20)) {
            assert_eq!(metric.tsb, metric.ctl - metric.atl);
        }
    }

    #[test]
    fn test_gap_days_are_filled() {
        let mut loads = DailyLoads::new();
        loads.insert(date(2024, 1, 1), 100.0);
        loads.insert(date(2024, 1, 5), 100.0);

        let series = FitnessRecurrence::series(&loads, date(2024, 1, 1), date(2024, 1, 5));
        let dates: Vec<NaiveDate> = series.iter().map(|m| m.date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 2),
                date(2024, 1, 3),
                date(2024, 1, 4),
                date(2024, 1, 5)
            ]
        );
        assert_eq!(series[2].daily_load, 0.0);
        assert!(series[2].atl < series[1].atl);
    }

    #[test]
    fn test_order_dependence() {
        let start = date(2024, 1, 1);
        let late = loads_from(start, &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 100.0]);
        let early = loads_from(start, &[100.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let end = date(2024, 1, 7);

        let a = FitnessRecurrence::series(&late, start, end);
        let b = FitnessRecurrence::series(&early, start, end);
        assert_ne!(a[6].ctl, b[6].ctl);
        assert_ne!(a[6].atl, b[6].atl);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        let loads = loads_from(date(2024, 1, 1), &[50.0]);
        assert!(FitnessRecurrence::series(&loads, date(2024, 1, 5), date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn test_series_through_and_determinism() {
        let start = date(2024, 2, 27);
        let loads = loads_from(start, &[60.0, 70.0, 0.0, 90.0]);
        let a = FitnessRecurrence::series_through(&loads, date(2024, 3, 10));
        let b = FitnessRecurrence::series_through(&loads, date(2024, 3, 10));

        // 2024 is a leap year: Feb 27 .. Mar 10 inclusive
        assert_eq!(a.len(), 13);
        assert_eq!(a.first().unwrap().date, start);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.ctl.to_bits(), y.ctl.to_bits());
            assert_eq!(x.atl.to_bits(), y.atl.to_bits());
        }

        assert!(FitnessRecurrence::series_through(&DailyLoads::new(), start).is_empty());
    }

    #[test]
    fn test_form_bands_and_acwr() {
        let metric = |ctl: f64, atl: f64| FitnessMetric {
            date: date(2024, 1, 1),
            daily_load: 0.0,
            ctl,
            atl,
            tsb: ctl - atl,
        };

        assert_eq!(metric(60.0, 30.0).form(), FormStatus::Transition);
        assert_eq!(metric(60.0, 50.0).form(), FormStatus::Fresh);
        assert_eq!(metric(60.0, 60.0).form(), FormStatus::Neutral);
        assert_eq!(metric(60.0, 80.0).form(), FormStatus::Productive);
        assert_eq!(metric(60.0, 100.0).form(), FormStatus::Overreaching);

        assert!((metric(50.0, 75.0).acwr() - 1.5).abs() < 1e-12);
        assert_eq!(metric(0.0, 10.0).acwr(), 0.0);
    }

    #[test]
    fn test_latest() {
        let m = |d: u32| FitnessMetric {
            date: date(2024, 1, d),
            daily_load: 0.0,
            ctl: f64::from(d),
            atl: 0.0,
            tsb: f64::from(d),
        };
        let metrics = vec![m(3), m(9), m(5)];
        assert_eq!(latest(&metrics).unwrap().ctl, 9.0);
        assert!(latest(&[]).is_none());
    }
}
