//! Iterative AR interpolation over an active segment.

use super::{fit_ar, lagged_design};
use crate::config::GapFillConfig;
use crate::detection::Interval;
use std::ops::Range;
use thiserror::Error;

/// Errors that abort gap filling for a trace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GapFillError {
    /// The segment has no more known samples than the model order.
    #[error("not enough known samples to fit the AR model: {known} known, order {order}")]
    InsufficientData {
        /// Known samples in the segment.
        known: usize,
        /// Requested AR order.
        order: usize,
    },
    /// The segment does not fit inside the trace.
    #[error("segment {start}..{end} outside trace of length {len}")]
    InvalidSegment {
        /// First row of the segment.
        start: usize,
        /// End row of the segment.
        end: usize,
        /// Trace length.
        len: usize,
    },
}

/// Reconstructs zero-valued samples with an iteratively refit AR model.
#[derive(Debug, Clone, Copy)]
pub struct ArInterpolator {
    order: Option<usize>,
    max_iterations: usize,
}

impl ArInterpolator {
    /// Creates an interpolator. With `order` unset the model order is
    /// `3 * missing + 2` for the segment being filled.
    pub fn new(order: Option<usize>, max_iterations: usize) -> Self {
        Self {
            order,
            max_iterations,
        }
    }

    /// Creates an interpolator from the gap-fill configuration.
    pub fn from_config(config: &GapFillConfig) -> Self {
        Self::new(config.order, config.max_iterations)
    }

    /// Fills the segment spanning `first.start` up to (excluding) `second.end`.
    pub fn fill(
        &self,
        trace: &[f64],
        first: Interval,
        second: Interval,
    ) -> Result<Vec<f64>, GapFillError> {
        self.fill_segment(trace, first.start..second.end)
    }

    /// Fills the missing samples of `trace[segment]`.
    ///
    /// Returns a trace of the same length holding the reconstructed segment
    /// and zeros everywhere else.
    pub fn fill_segment(
        &self,
        trace: &[f64],
        segment: Range<usize>,
    ) -> Result<Vec<f64>, GapFillError> {
        if segment.start > segment.end || segment.end > trace.len() {
            return Err(GapFillError::InvalidSegment {
                start: segment.start,
                end: segment.end,
                len: trace.len(),
            });
        }

        let mut filled = trace[segment.clone()].to_vec();
        let missing: Vec<usize> = filled
            .iter()
            .enumerate()
            .filter_map(|(i, &v)| (v == 0.0).then_some(i))
            .collect();
        let order = self.order.unwrap_or(3 * missing.len() + 2);

        for iteration in 0..self.max_iterations {
            let known: Vec<f64> = filled.iter().copied().filter(|&v| v != 0.0).collect();
            if known.len() <= order {
                return Err(GapFillError::InsufficientData {
                    known: known.len(),
                    order,
                });
            }

            let (design, target) = lagged_design(&known, order);
            let model = fit_ar(&design, &target);

            // Each prediction is written back before the next one reads it.
            for &idx in &missing {
                let history = &filled[idx.saturating_sub(order)..idx];
                filled[idx] = model.predict(history);
            }

            tracing::trace!(
                iteration,
                order,
                known = known.len(),
                missing = missing.len(),
                regularized = model.regularized,
                "AR gap fill pass"
            );
        }

        let mut output = vec![0.0; trace.len()];
        output[segment].copy_from_slice(&filled);
        Ok(output)
    }
}

impl Default for ArInterpolator {
    fn default() -> Self {
        Self::new(None, 3)
    }
}
