//! Per-frame outcomes and the batch result.

use crate::detection::Interval;
use crate::gapfill::GapFillError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Why a frame produced no traces without anything going wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The column profile has no peak above threshold.
    NoSpeckles,
    /// Fewer than two row bands passed the width check.
    TooFewRowBands {
        /// Bands that did pass.
        found: usize,
    },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSpeckles => write!(f, "no speckles detected"),
            Self::TooFewRowBands { found } => {
                write!(f, "found {found} row band(s), two are required")
            }
        }
    }
}

/// Failures that abort extraction for one frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// The frame shape differs from the first frame of the sequence.
    #[error("frame shape {actual:?} differs from sequence shape {expected:?}")]
    ShapeMismatch {
        /// Shape of the first frame.
        expected: (usize, usize),
        /// Shape of this frame.
        actual: (usize, usize),
    },
    /// Gap filling failed for one speckle.
    #[error("speckle {speckle}: {source}")]
    GapFill {
        /// Slot index of the speckle.
        speckle: usize,
        /// Underlying gap-fill failure.
        #[source]
        source: GapFillError,
    },
}

/// What a frame contributed.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// One padded trace per detected speckle, in detection order.
    Extracted(Vec<Vec<f64>>),
    /// Nothing to extract; every slot gets a zero block.
    Skipped(SkipReason),
    /// Extraction failed; every slot gets a zero block.
    Failed(FrameError),
}

/// Detection results and outcome for one frame.
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    /// Position of the frame in the input sequence.
    pub index: usize,
    /// Detected speckle column intervals.
    pub speckle_columns: Vec<Interval>,
    /// Retained row bands, in position order.
    pub row_bands: Vec<Interval>,
    /// What the frame contributed.
    pub outcome: FrameOutcome,
}

/// Serializable per-frame status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    /// Traces were extracted.
    Extracted,
    /// The frame was skipped.
    Skipped,
    /// Extraction failed.
    Failed,
}

/// Per-frame summary kept in the batch result.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    /// Position of the frame in the input sequence.
    pub index: usize,
    /// Outcome category.
    pub status: FrameStatus,
    /// Skip reason or error text.
    pub detail: Option<String>,
    /// Detected speckle column intervals.
    pub speckle_columns: Vec<Interval>,
    /// Retained row bands, in position order.
    pub row_bands: Vec<Interval>,
}

impl From<&FrameAnalysis> for FrameReport {
    fn from(analysis: &FrameAnalysis) -> Self {
        let (status, detail) = match &analysis.outcome {
            FrameOutcome::Extracted(_) => (FrameStatus::Extracted, None),
            FrameOutcome::Skipped(reason) => (FrameStatus::Skipped, Some(reason.to_string())),
            FrameOutcome::Failed(error) => (FrameStatus::Failed, Some(error.to_string())),
        };
        Self {
            index: analysis.index,
            status,
            detail,
            speckle_columns: analysis.speckle_columns.clone(),
            row_bands: analysis.row_bands.clone(),
        }
    }
}

/// Output of a batch extraction.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// One frame-aligned displacement trace per speckle slot, in pixels.
    pub traces: Vec<Vec<f64>>,
    /// Number of speckle slots with a trace.
    pub speckle_count: usize,
    /// Wall time spent on the batch.
    pub elapsed: Duration,
    /// One report per input frame, in input order.
    pub frames: Vec<FrameReport>,
    /// Samples each frame contributes to every trace.
    pub samples_per_frame: usize,
    /// Time between consecutive trace samples in seconds.
    pub sample_period_s: f64,
}

impl PipelineResult {
    /// Returns true if no speckle was extracted from any frame.
    pub fn is_empty(&self) -> bool {
        self.speckle_count == 0
    }

    /// Counts frames with the given status.
    pub fn count(&self, status: FrameStatus) -> usize {
        self.frames.iter().filter(|f| f.status == status).count()
    }

    /// Wall time spent per input frame.
    pub fn time_per_frame(&self) -> Duration {
        match self.frames.len() {
            0 => Duration::ZERO,
            n => self.elapsed / n as u32,
        }
    }
}
