//! Single-frame speckle detection and trace extraction.

use super::result::{FrameAnalysis, FrameError, FrameOutcome, SkipReason};
use crate::capture::Frame;
use crate::config::PipelineConfig;
use crate::detection::{
    select_row_bands, Interval, IntervalDetector, IntervalMode, PeakDetector, RowThreshold,
};
use crate::filters::{gaussian_filter1d, median_filter, Lowpass};
use crate::gapfill::ArInterpolator;
use crate::shift::row_shifts;
use ndarray::{s, ArrayView2, Axis};

/// Row bands a frame must provide for gap filling.
const REQUIRED_ROW_BANDS: usize = 2;

/// Runs every per-frame stage for frames of one fixed shape.
///
/// Holds no mutable state, so one analyzer can serve all worker threads.
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    shape: (usize, usize),
    column_sigma: f64,
    row_sigma: f64,
    median_window: usize,
    max_speckles: usize,
    samples_per_frame: usize,
    peaks: PeakDetector,
    intervals: IntervalDetector,
    threshold: RowThreshold,
    lowpass: Lowpass,
    gap_fill: ArInterpolator,
}

impl FrameAnalyzer {
    /// Creates an analyzer for frames of `shape` (rows, columns).
    pub fn new(config: &PipelineConfig, shape: (usize, usize)) -> Self {
        Self {
            shape,
            column_sigma: config.column.sigma,
            row_sigma: config.row.sigma,
            median_window: config.median_window,
            max_speckles: config.max_speckles,
            samples_per_frame: config.samples_per_frame(shape.0),
            peaks: PeakDetector::from_config(&config.column),
            intervals: IntervalDetector::from_config(config),
            threshold: RowThreshold::from_config(&config.row),
            lowpass: Lowpass::new(
                config.lowpass.cutoff_hz,
                config.sampling_rate_hz(),
                config.lowpass.order,
            ),
            gap_fill: ArInterpolator::from_config(&config.gap_fill),
        }
    }

    /// Frame shape this analyzer accepts.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Length of every trace a frame produces, padding included.
    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    /// Column intervals of the speckles in `image`, capped at the
    /// configured maximum.
    pub fn detect_speckles(&self, image: ArrayView2<'_, u8>) -> Vec<Interval> {
        let profile = gaussian_filter1d(&mean_profile(image, Axis(0)), self.column_sigma);
        let mut speckles = self.peaks.detect(&profile);
        if speckles.len() > self.max_speckles {
            tracing::warn!(
                detected = speckles.len(),
                max = self.max_speckles,
                "More speckles than slots, extra speckles dropped"
            );
            speckles.truncate(self.max_speckles);
        }
        speckles
    }

    /// Lit row bands of `image`: the widest two, in position order.
    pub fn detect_row_bands(&self, image: ArrayView2<'_, u8>) -> Vec<Interval> {
        let profile = gaussian_filter1d(&mean_profile(image, Axis(1)), self.row_sigma);
        let mask = self.threshold.mask(&profile);
        let bands = self.intervals.detect(&mask, IntervalMode::Row);
        select_row_bands(bands, REQUIRED_ROW_BANDS)
    }

    /// Lowpassed row-to-row shifts of one speckle inside one row band.
    ///
    /// Returns one value per row of `band.range()`.
    pub fn band_trace(&self, image: ArrayView2<'_, u8>, band: Interval, speckle: Interval) -> Vec<f64> {
        let crop = image.slice(s![band.range(), speckle.range()]);
        let filtered = median_filter(crop, self.median_window);
        self.lowpass.apply(&row_shifts(filtered.view()))
    }

    /// Full padded trace for one speckle.
    fn speckle_trace(
        &self,
        image: ArrayView2<'_, u8>,
        speckle: Interval,
        bands: &[Interval],
    ) -> Result<Vec<f64>, crate::gapfill::GapFillError> {
        let mut trace = vec![0.0; self.shape.0];
        for &band in bands {
            let shifts = self.band_trace(image, band, speckle);
            trace[band.range()].copy_from_slice(&shifts);
        }

        let mut filled = self.gap_fill.fill(&trace, bands[0], bands[1])?;
        filled.resize(self.samples_per_frame, 0.0);
        Ok(filled)
    }

    /// Detects, extracts and gap-fills every speckle of `frame`.
    pub fn analyze(&self, index: usize, frame: &Frame) -> FrameAnalysis {
        let mut analysis = FrameAnalysis {
            index,
            speckle_columns: Vec::new(),
            row_bands: Vec::new(),
            outcome: FrameOutcome::Skipped(SkipReason::NoSpeckles),
        };

        if frame.shape() != self.shape {
            analysis.outcome = FrameOutcome::Failed(FrameError::ShapeMismatch {
                expected: self.shape,
                actual: frame.shape(),
            });
            return analysis;
        }
        if frame.is_empty() {
            return analysis;
        }

        let image = frame.view();
        analysis.speckle_columns = self.detect_speckles(image);
        analysis.row_bands = self.detect_row_bands(image);

        if analysis.speckle_columns.is_empty() {
            return analysis;
        }
        if analysis.row_bands.len() < REQUIRED_ROW_BANDS {
            analysis.outcome = FrameOutcome::Skipped(SkipReason::TooFewRowBands {
                found: analysis.row_bands.len(),
            });
            return analysis;
        }

        let mut traces = Vec::with_capacity(analysis.speckle_columns.len());
        for (speckle, &columns) in analysis.speckle_columns.iter().enumerate() {
            match self.speckle_trace(image, columns, &analysis.row_bands) {
                Ok(trace) => traces.push(trace),
                Err(source) => {
                    analysis.outcome = FrameOutcome::Failed(FrameError::GapFill { speckle, source });
                    return analysis;
                }
            }
        }

        tracing::debug!(
            index,
            speckles = traces.len(),
            bands = ?analysis.row_bands,
            "Frame extracted"
        );
        analysis.outcome = FrameOutcome::Extracted(traces);
        analysis
    }
}

/// Mean intensity along `axis`: `Axis(0)` averages each column over all
/// rows, `Axis(1)` averages each row over all columns.
fn mean_profile(image: ArrayView2<'_, u8>, axis: Axis) -> Vec<f64> {
    let count = image.len_of(axis).max(1) as f64;
    image
        .map(|&v| f64::from(v))
        .sum_axis(axis)
        .iter()
        .map(|&sum| sum / count)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{SyntheticConfig, SyntheticSpeckle};
    use crate::gapfill::GapFillError;
    use ndarray::Array2;

    fn synthetic() -> SyntheticSpeckle {
        SyntheticSpeckle::new(SyntheticConfig::default())
    }

    /// Grain clumps pull the detected peak off the envelope centre.
    fn near(interval: &Interval, center: usize) -> bool {
        (interval.start + interval.end).abs_diff(2 * center) < 120
    }

    #[test]
    fn test_mean_profile_axes() {
        let image = Array2::from_shape_vec((2, 3), vec![0u8, 3, 6, 2, 5, 8]).unwrap();

        assert_eq!(mean_profile(image.view(), Axis(0)), vec![1.0, 4.0, 7.0]);
        assert_eq!(mean_profile(image.view(), Axis(1)), vec![3.0, 5.0]);
    }

    #[test]
    fn test_detects_synthetic_geometry() {
        let source = synthetic();
        let frame = source.render(0);
        let analyzer = FrameAnalyzer::new(&PipelineConfig::default(), frame.shape());

        let speckles = analyzer.detect_speckles(frame.view());
        assert_eq!(speckles.len(), 2);
        assert!(near(&speckles[0], 160) && near(&speckles[1], 480));

        let bands = analyzer.detect_row_bands(frame.view());
        assert_eq!(bands.len(), 2);
        assert!(bands[0].start >= 30 && bands[0].end < 210);
        assert!(bands[1].start >= 250 && bands[1].end < 450);
    }

    #[test]
    fn test_speckle_cap() {
        let frame = synthetic().render(0);
        let config = PipelineConfig {
            max_speckles: 1,
            ..Default::default()
        };
        let analyzer = FrameAnalyzer::new(&config, frame.shape());

        let speckles = analyzer.detect_speckles(frame.view());
        assert_eq!(speckles.len(), 1);
        assert!(near(&speckles[0], 160));
    }

    #[test]
    fn test_blank_frame_has_no_speckles() {
        let frame = Frame::new(Array2::from_elem((240, 320), 12u8), 0);
        let analyzer = FrameAnalyzer::new(&PipelineConfig::default(), frame.shape());

        let analysis = analyzer.analyze(0, &frame);
        assert_eq!(analysis.outcome, FrameOutcome::Skipped(SkipReason::NoSpeckles));
    }

    #[test]
    fn test_single_band_skipped() {
        let config = SyntheticConfig {
            row_bands: vec![(40, 440)],
            ..Default::default()
        };
        let frame = SyntheticSpeckle::new(config).render(0);
        let analyzer = FrameAnalyzer::new(&PipelineConfig::default(), frame.shape());

        let analysis = analyzer.analyze(0, &frame);
        assert_eq!(analysis.speckle_columns.len(), 2);
        assert_eq!(
            analysis.outcome,
            FrameOutcome::Skipped(SkipReason::TooFewRowBands { found: 1 })
        );
    }

    #[test]
    fn test_shape_mismatch_fails() {
        let analyzer = FrameAnalyzer::new(&PipelineConfig::default(), (480, 640));
        let frame = Frame::new(Array2::zeros((10, 10)), 3);

        let analysis = analyzer.analyze(3, &frame);
        assert_eq!(
            analysis.outcome,
            FrameOutcome::Failed(FrameError::ShapeMismatch {
                expected: (480, 640),
                actual: (10, 10),
            })
        );
    }

    #[test]
    fn test_oversized_order_fails_gap_fill() {
        let frame = synthetic().render(0);
        let mut config = PipelineConfig::default();
        config.gap_fill.order = Some(10_000);
        let analyzer = FrameAnalyzer::new(&config, frame.shape());

        match analyzer.analyze(0, &frame).outcome {
            FrameOutcome::Failed(FrameError::GapFill { speckle, source }) => {
                assert_eq!(speckle, 0);
                assert!(matches!(source, GapFillError::InsufficientData { order: 10_000, .. }));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_traces_padded_and_zero_outside_segment() {
        let frame = synthetic().render(0);
        let analyzer = FrameAnalyzer::new(&PipelineConfig::default(), frame.shape());
        let analysis = analyzer.analyze(0, &frame);

        let FrameOutcome::Extracted(traces) = analysis.outcome else {
            panic!("frame not extracted");
        };
        let (first, second) = (analysis.row_bands[0], analysis.row_bands[1]);

        assert_eq!(traces.len(), 2);
        for trace in &traces {
            assert_eq!(trace.len(), 2922);
            assert!(trace[..first.start].iter().all(|&v| v == 0.0));
            assert!(trace[second.end..].iter().all(|&v| v == 0.0));
        }
    }
}
