//! Batch orchestration of the extraction stages.
//!
//! Each frame is analysed independently: speckle columns are located on the
//! smoothed column profile, the two lit row bands on the thresholded row
//! profile, and every speckle crop inside each band is median filtered,
//! shift-estimated and lowpassed. The rows between the bands are
//! reconstructed with the AR gap filler and the frame trace is padded to the
//! frame period. Frame traces are then concatenated per speckle slot in
//! input order.

mod accumulator;
mod frame;
mod result;

pub use accumulator::SpeckleAccumulator;
pub use frame::FrameAnalyzer;
pub use result::{
    FrameAnalysis, FrameError, FrameOutcome, FrameReport, FrameStatus, PipelineResult, SkipReason,
};

use crate::capture::Frame;
use crate::config::{ConfigError, PipelineConfig};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Extracts per-speckle vibration traces from frame sequences.
#[derive(Debug, Clone, Default)]
pub struct VibrationExtractor {
    config: PipelineConfig,
}

impl VibrationExtractor {
    /// Creates an extractor after validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the full pipeline over `frames`.
    ///
    /// Frames that are skipped or fail are reported and contribute zero
    /// blocks; the batch itself never aborts.
    pub fn run(&self, frames: &[Frame]) -> PipelineResult {
        let start = Instant::now();

        let Some(first) = frames.first() else {
            tracing::warn!("Empty frame sequence, nothing to extract");
            return PipelineResult {
                traces: Vec::new(),
                speckle_count: 0,
                elapsed: start.elapsed(),
                frames: Vec::new(),
                samples_per_frame: 0,
                sample_period_s: self.config.sample_period_s,
            };
        };

        let analyzer = FrameAnalyzer::new(&self.config, first.shape());
        let analyses: Vec<FrameAnalysis> = if self.config.parallel {
            frames
                .par_iter()
                .enumerate()
                .map(|(index, frame)| analyzer.analyze(index, frame))
                .collect()
        } else {
            frames
                .iter()
                .enumerate()
                .map(|(index, frame)| analyzer.analyze(index, frame))
                .collect()
        };

        let mut accumulator =
            SpeckleAccumulator::new(analyzer.samples_per_frame(), self.config.max_speckles)
                .with_frame_hint(frames.len());
        let mut reports = Vec::with_capacity(analyses.len());

        for analysis in &analyses {
            match &analysis.outcome {
                FrameOutcome::Extracted(traces) => accumulator.push_frame(traces),
                FrameOutcome::Skipped(reason) => {
                    tracing::warn!(frame = analysis.index, %reason, "Frame skipped");
                    accumulator.push_empty();
                }
                FrameOutcome::Failed(error) => {
                    tracing::warn!(frame = analysis.index, %error, "Frame extraction failed");
                    accumulator.push_empty();
                }
            }
            reports.push(FrameReport::from(analysis));
        }

        let elapsed = start.elapsed();
        let speckle_count = accumulator.speckle_count();
        tracing::info!(
            frames = frames.len(),
            speckles = speckle_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "Extraction finished"
        );

        PipelineResult {
            traces: accumulator.into_traces(),
            speckle_count,
            elapsed,
            frames: reports,
            samples_per_frame: analyzer.samples_per_frame(),
            sample_period_s: self.config.sample_period_s,
        }
    }
}

/// Convenience wrapper returning only the traces, speckle count and timing.
pub fn extract_vibrations(
    frames: &[Frame],
    config: PipelineConfig,
) -> Result<(Vec<Vec<f64>>, usize, Duration), ConfigError> {
    let result = VibrationExtractor::new(config)?.run(frames);
    Ok((result.traces, result.speckle_count, result.elapsed))
}
