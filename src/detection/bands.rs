//! Adaptive thresholding of the row profile and row band selection.

use super::{stats, Interval};
use crate::config::RowConfig;
use serde::{Deserialize, Serialize};

/// Adaptive threshold for the smoothed row intensity profile.
///
/// `threshold = mean - std_weight * std + spread_weight * (p_upper - p_lower)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RowThreshold {
    /// Weight of the profile standard deviation, subtracted from the mean.
    pub std_weight: f64,
    /// Weight of the percentile spread, added back.
    pub spread_weight: f64,
    /// Upper percentile of the spread, in `[0, 100]`.
    pub upper_percentile: f64,
    /// Lower percentile of the spread, in `[0, 100]`.
    pub lower_percentile: f64,
}

impl RowThreshold {
    /// Creates a threshold from the row section of the configuration.
    pub fn from_config(config: &RowConfig) -> Self {
        Self {
            std_weight: config.std_weight,
            spread_weight: config.spread_weight,
            upper_percentile: config.upper_percentile,
            lower_percentile: config.lower_percentile,
        }
    }

    /// Computes the threshold for `profile`.
    pub fn level(&self, profile: &[f64]) -> f64 {
        let spread = stats::percentile(profile, self.upper_percentile)
            - stats::percentile(profile, self.lower_percentile);
        stats::mean(profile) - self.std_weight * stats::std_dev(profile) + self.spread_weight * spread
    }

    /// Marks samples strictly above the threshold.
    pub fn mask(&self, profile: &[f64]) -> Vec<bool> {
        let level = self.level(profile);
        profile.iter().map(|&v| v > level).collect()
    }
}

impl Default for RowThreshold {
    fn default() -> Self {
        Self::from_config(&RowConfig::default())
    }
}

/// Keeps at most `keep` bands: the widest ones, returned in position order.
///
/// Ties on span go to the earlier band.
pub fn select_row_bands(mut bands: Vec<Interval>, keep: usize) -> Vec<Interval> {
    if bands.len() > keep {
        bands.sort_by(|a, b| b.span().cmp(&a.span()).then(a.start.cmp(&b.start)));
        bands.truncate(keep);
        bands.sort_by_key(|band| band.start);
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_level_profile_splits() {
        let profile: Vec<f64> = (0..100).map(|i| if (20..80).contains(&i) { 30.0 } else { 10.0 }).collect();
        let mask = RowThreshold::default().mask(&profile);

        assert!(!mask[10]);
        assert!(mask[50]);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 60);
    }

    #[test]
    fn test_threshold_formula() {
        let profile: Vec<f64> = (0..=10).map(f64::from).collect();
        let threshold = RowThreshold::default();

        let expected = 5.0 - 0.2 * stats::std_dev(&profile) + 0.1 * (9.0 - 1.0);
        assert!((threshold.level(&profile) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_keeps_widest_in_position_order() {
        let bands = vec![
            Interval::new(0, 120),
            Interval::new(150, 400),
            Interval::new(420, 530),
            Interval::new(600, 790),
        ];

        assert_eq!(
            select_row_bands(bands, 2),
            vec![Interval::new(150, 400), Interval::new(600, 790)]
        );
    }

    #[test]
    fn test_span_tie_prefers_earlier() {
        let bands = vec![
            Interval::new(0, 150),
            Interval::new(200, 350),
            Interval::new(400, 550),
        ];

        assert_eq!(
            select_row_bands(bands, 2),
            vec![Interval::new(0, 150), Interval::new(200, 350)]
        );
    }

    #[test]
    fn test_few_bands_untouched() {
        let bands = vec![Interval::new(300, 500), Interval::new(0, 200)];
        assert_eq!(select_row_bands(bands.clone(), 2), bands);
    }
}
