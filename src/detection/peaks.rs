//! Peak detection with half-height widths.

use super::{stats, Interval};
use crate::config::ColumnConfig;

/// Finds prominent peaks in a 1-D profile and the width around each.
///
/// The threshold sits `height_fraction` of the way from the profile median
/// to its maximum. Peaks closer than `min_distance` to the previously kept
/// peak are dropped, so the leftmost peak of a cluster wins.
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    height_fraction: f64,
    min_distance: usize,
}

impl PeakDetector {
    /// Creates a detector with an explicit height fraction and peak spacing.
    pub fn new(height_fraction: f64, min_distance: usize) -> Self {
        Self {
            height_fraction,
            min_distance,
        }
    }

    /// Creates a detector from the column section of the configuration.
    pub fn from_config(config: &ColumnConfig) -> Self {
        Self::new(config.height_fraction, config.min_distance)
    }

    /// Indices of strict local maxima at or above the threshold, after
    /// minimum-distance suppression.
    pub fn peaks(&self, signal: &[f64]) -> Vec<usize> {
        if signal.len() < 3 {
            return Vec::new();
        }

        let baseline = stats::median(signal);
        let threshold = baseline + self.height_fraction * (stats::max(signal) - baseline);

        let mut peaks: Vec<usize> = Vec::new();
        for i in 1..signal.len() - 1 {
            let v = signal[i];
            if v > signal[i - 1] && v > signal[i + 1] && v >= threshold {
                match peaks.last() {
                    Some(&last) if i - last < self.min_distance => {}
                    _ => peaks.push(i),
                }
            }
        }
        peaks
    }

    /// Returns one half-height interval per surviving peak, in peak order.
    ///
    /// Each interval grows outward from its peak while the signal stays above
    /// `baseline + (peak - baseline) / 2`, never past the midpoint to a
    /// neighbouring peak or the signal edge.
    pub fn detect(&self, signal: &[f64]) -> Vec<Interval> {
        let peaks = self.peaks(signal);
        if peaks.is_empty() {
            return Vec::new();
        }

        let baseline = stats::median(signal);
        let last = signal.len() - 1;

        peaks
            .iter()
            .enumerate()
            .map(|(i, &peak)| {
                let half_height = baseline + (signal[peak] - baseline) / 2.0;
                let left_limit = if i > 0 { (peaks[i - 1] + peak) / 2 } else { 0 };
                let right_limit = peaks.get(i + 1).map_or(last, |&next| (peak + next) / 2);

                let mut left = peak;
                while left > left_limit && signal[left - 1] > half_height {
                    left -= 1;
                }
                let mut right = peak;
                while right < right_limit && signal[right + 1] > half_height {
                    right += 1;
                }

                tracing::trace!(peak, left, right, "Peak width resolved");
                Interval::new(left, right)
            })
            .collect()
    }
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::from_config(&ColumnConfig::default())
    }
}
