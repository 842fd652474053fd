//! Cumulative-death milestones.
//!
//! Pure queries over a dead series, used to calibrate a run against
//! real-world reference points (for the US: 10 deaths, then 200,000 deaths
//! 202 days later).

use serde::{Deserialize, Serialize};

/// Thresholds for milestone detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MilestoneConfig {
    /// First cumulative-death threshold.
    pub first_death_threshold: f64,
    /// Second cumulative-death threshold.
    pub second_death_threshold: f64,
    /// Days after the first milestone at which cumulative dead is sampled.
    pub calibration_offset_days: u32,
}

impl Default for MilestoneConfig {
    fn default() -> Self {
        Self {
            first_death_threshold: 10.0,
            second_death_threshold: 200_000.0,
            calibration_offset_days: 202,
        }
    }
}

/// Milestones found in one scenario's dead series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneReport {
    /// Thresholds used.
    pub config: MilestoneConfig,
    /// First day cumulative dead reached the first threshold.
    pub first_day: Option<u32>,
    /// First day cumulative dead reached the second threshold.
    pub second_day: Option<u32>,
    /// Cumulative dead `calibration_offset_days` after `first_day`.
    pub dead_at_calibration: Option<f64>,
}

impl MilestoneReport {
    /// Scan a dead series.
    #[must_use]
    pub fn from_dead_series(dead: &[f64], config: &MilestoneConfig) -> Self {
        let first_day = first_day_at_or_above(dead, config.first_death_threshold);
        let second_day = first_day_at_or_above(dead, config.second_death_threshold);
        let dead_at_calibration = first_day.and_then(|day| {
            let target = day.checked_add(config.calibration_offset_days)?;
            dead.get(target as usize).copied()
        });

        Self {
            config: config.clone(),
            first_day,
            second_day,
            dead_at_calibration,
        }
    }

    /// Days from the first milestone to the second.
    #[must_use]
    pub fn days_between(&self) -> Option<u32> {
        match (self.first_day, self.second_day) {
            (Some(first), Some(second)) => second.checked_sub(first),
            _ => None,
        }
    }
}

/// First index whose value is at least `threshold`.
#[must_use]
pub fn first_day_at_or_above(series: &[f64], threshold: f64) -> Option<u32> {
    series
        .iter()
        .position(|&value| value >= threshold)
        .map(|day| day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_day_at_or_above() {
        let dead = [0.0, 0.5, 3.0, 10.0, 12.0];
        assert_eq!(first_day_at_or_above(&dead, 10.0), Some(3));
        assert_eq!(first_day_at_or_above(&dead, 0.0), Some(0));
        assert_eq!(first_day_at_or_above(&dead, 13.0), None);
        assert_eq!(first_day_at_or_above(&[], 1.0), None);
    }

    #[test]
    fn test_report_offsets() {
        let dead: Vec<f64> = (0..50).map(|d| f64::from(d) * f64::from(d)).collect();
        let config = MilestoneConfig {
            first_death_threshold: 10.0,
            second_death_threshold: 400.0,
            calibration_offset_days: 5,
        };
        let report = MilestoneReport::from_dead_series(&dead, &config);

        assert_eq!(report.first_day, Some(4));
        assert_eq!(report.second_day, Some(20));
        assert_eq!(report.days_between(), Some(16));
        assert_eq!(report.dead_at_calibration, Some(81.0));
    }

    #[test]
    fn test_calibration_past_end_of_series() {
        let dead = [0.0, 20.0, 30.0];
        let report = MilestoneReport::from_dead_series(&dead, &MilestoneConfig::default());
        assert_eq!(report.first_day, Some(1));
        assert_eq!(report.second_day, None);
        assert_eq!(report.days_between(), None);
        assert_eq!(report.dead_at_calibration, None);
    }

    #[test]
    fn test_no_deaths() {
        let dead = vec![0.0; 100];
        let report = MilestoneReport::from_dead_series(&dead, &MilestoneConfig::default());
        assert_eq!(report.first_day, None);
        assert_eq!(report.dead_at_calibration, None);
    }
}
