//! Run-length interval detection over boolean masks.

use crate::config::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Closed index interval `[start, end]` over a profile axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    /// First index of the interval.
    pub start: usize,
    /// Last index of the interval.
    pub end: usize,
}

impl Interval {
    /// Creates the closed interval `[start, end]`.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "interval start {start} after end {end}");
        Self { start, end }
    }

    /// Distance from the first to the last index.
    ///
    /// Minimum-width checks compare against this value.
    #[inline]
    pub fn span(&self) -> usize {
        self.end - self.start
    }

    /// Half-open range used when cropping frames and writing traces.
    ///
    /// The last index is left out, so a crop covers `span()` samples.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Returns true if `index` lies in the closed interval.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }
}

/// Selects the minimum span an interval must exceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalMode {
    /// Speckle column intervals (flag 0).
    Column,
    /// Row band intervals (flag 1).
    Row,
}

impl IntervalMode {
    /// Maps the numeric mode flag onto a mode.
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Self::Column),
            1 => Some(Self::Row),
            _ => None,
        }
    }
}

/// Finds maximal runs of `true` wider than a mode-specific minimum.
#[derive(Debug, Clone, Copy)]
pub struct IntervalDetector {
    column_min_width: usize,
    row_min_width: usize,
}

impl IntervalDetector {
    /// Creates a detector with explicit minimum spans per mode.
    pub fn new(column_min_width: usize, row_min_width: usize) -> Self {
        Self {
            column_min_width,
            row_min_width,
        }
    }

    /// Creates a detector from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.column.min_width, config.row.min_width)
    }

    /// Minimum span for `mode`; kept intervals strictly exceed it.
    pub fn min_width(&self, mode: IntervalMode) -> usize {
        match mode {
            IntervalMode::Column => self.column_min_width,
            IntervalMode::Row => self.row_min_width,
        }
    }

    /// Returns the ordered, non-overlapping runs of `mask` whose span
    /// strictly exceeds the minimum for `mode`.
    pub fn detect(&self, mask: &[bool], mode: IntervalMode) -> Vec<Interval> {
        let min = self.min_width(mode);
        let mut intervals = Vec::new();
        let mut start = None;

        for (i, &value) in mask.iter().enumerate() {
            match (value, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => {
                    if (i - 1) - s > min {
                        intervals.push(Interval::new(s, i - 1));
                    }
                    start = None;
                }
                _ => {}
            }
        }

        // A run still open at the end of the mask closes on its last index.
        if let Some(s) = start {
            let last = mask.len() - 1;
            if last - s > min {
                intervals.push(Interval::new(s, last));
            }
        }

        intervals
    }
}

impl Default for IntervalDetector {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mask_with_run(len: usize, start: usize, run: usize) -> Vec<bool> {
        (0..len).map(|i| i >= start && i < start + run).collect()
    }

    #[test]
    fn test_all_false_is_empty() {
        let detector = IntervalDetector::default();
        assert!(detector.detect(&[false; 500], IntervalMode::Row).is_empty());
        assert!(detector.detect(&[], IntervalMode::Column).is_empty());
    }

    #[test]
    fn test_span_equal_to_minimum_excluded() {
        let detector = IntervalDetector::default();

        // 101 samples span exactly 100.
        let mask = mask_with_run(300, 50, 101);
        assert!(detector.detect(&mask, IntervalMode::Row).is_empty());

        let mask = mask_with_run(300, 50, 102);
        assert_eq!(
            detector.detect(&mask, IntervalMode::Row),
            vec![Interval::new(50, 151)]
        );
    }

    #[test]
    fn test_mode_selects_minimum() {
        let detector = IntervalDetector::default();
        let mask = mask_with_run(300, 10, 80);

        assert_eq!(detector.detect(&mask, IntervalMode::Column).len(), 1);
        assert!(detector.detect(&mask, IntervalMode::Row).is_empty());
    }

    #[test]
    fn test_run_open_at_end() {
        let detector = IntervalDetector::new(3, 3);
        let mask = [false, false, true, true, true, true, true];

        assert_eq!(
            detector.detect(&mask, IntervalMode::Column),
            vec![Interval::new(2, 6)]
        );
    }

    #[test]
    fn test_open_run_at_end_needs_two_more_than_minimum() {
        let detector = IntervalDetector::default();

        let mask = mask_with_run(200, 99, 101);
        assert!(detector.detect(&mask, IntervalMode::Row).is_empty());

        let mask = mask_with_run(200, 98, 102);
        assert_eq!(
            detector.detect(&mask, IntervalMode::Row),
            vec![Interval::new(98, 199)]
        );
    }

    #[test]
    fn test_from_flag() {
        assert_eq!(IntervalMode::from_flag(0), Some(IntervalMode::Column));
        assert_eq!(IntervalMode::from_flag(1), Some(IntervalMode::Row));
        assert_eq!(IntervalMode::from_flag(2), None);
    }

    #[test]
    fn test_range_drops_last_index() {
        let interval = Interval::new(10, 20);
        assert_eq!(interval.range(), 10..20);
        assert_eq!(interval.span(), 10);
        assert!(interval.contains(20));
    }

    proptest! {
        #[test]
        fn prop_intervals_wide_ordered_disjoint(
            mask in proptest::collection::vec(any::<bool>(), 0..400),
            flag in 0u8..2,
            column_min in 0usize..8,
            row_min in 0usize..8,
        ) {
            let detector = IntervalDetector::new(column_min, row_min);
            let mode = IntervalMode::from_flag(flag).unwrap();
            let min = detector.min_width(mode);
            let intervals = detector.detect(&mask, mode);

            for interval in &intervals {
                prop_assert!(interval.span() > min);
                prop_assert!((interval.start..=interval.end).all(|i| mask[i]));
            }
            for pair in intervals.windows(2) {
                prop_assert!(pair[0].end < pair[1].start);
            }
        }

        #[test]
        fn prop_runs_are_maximal(mask in proptest::collection::vec(any::<bool>(), 1..200)) {
            let detector = IntervalDetector::new(0, 0);
            for interval in detector.detect(&mask, IntervalMode::Column) {
                prop_assert!(interval.start == 0 || !mask[interval.start - 1]);
                prop_assert!(interval.end == mask.len() - 1 || !mask[interval.end + 1]);
            }
        }
    }
}
