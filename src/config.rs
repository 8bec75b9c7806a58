//! Pipeline configuration.
//!
//! Every numeric constant the extraction relies on lives here so tests and
//! deployments can override it. Defaults reproduce the reference capture
//! setup: 11.4 µs per sensor row, 30 frames per second.

use crate::capture::SyntheticConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Time between successive sensor rows in seconds.
    pub sample_period_s: f64,
    /// Target duration of one frame in seconds; traces are zero-padded to it.
    pub frame_period_s: f64,
    /// Speckle column detection.
    pub column: ColumnConfig,
    /// Row band detection.
    pub row: RowConfig,
    /// Side length of the square median window applied to each crop.
    pub median_window: usize,
    /// Trace lowpass.
    pub lowpass: LowpassConfig,
    /// Gap filling between row bands.
    pub gap_fill: GapFillConfig,
    /// Maximum number of speckle slots accumulated.
    pub max_speckles: usize,
    /// Evaluate frames on the rayon thread pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_period_s: 11.4e-6,
            frame_period_s: 1.0 / 30.0,
            column: ColumnConfig::default(),
            row: RowConfig::default(),
            median_window: 7,
            lowpass: LowpassConfig::default(),
            gap_fill: GapFillConfig::default(),
            max_speckles: 10,
            parallel: true,
        }
    }
}

/// Speckle column detection on the column intensity profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Gaussian sigma applied to the column profile.
    pub sigma: f64,
    /// Peak threshold as a fraction of the range above the median.
    pub height_fraction: f64,
    /// Minimum distance between accepted peaks, in columns.
    pub min_distance: usize,
    /// Minimum interval span for column-mode interval detection.
    pub min_width: usize,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            sigma: 20.0,
            height_fraction: 0.1,
            min_distance: 100,
            min_width: 60,
        }
    }
}

/// Row band detection on the row intensity profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RowConfig {
    /// Gaussian sigma applied to the row profile.
    pub sigma: f64,
    /// Minimum interval span for row-mode interval detection.
    pub min_width: usize,
    /// Weight of the standard deviation subtracted from the mean.
    pub std_weight: f64,
    /// Weight of the percentile spread added to the threshold.
    pub spread_weight: f64,
    /// Upper percentile of the spread term.
    pub upper_percentile: f64,
    /// Lower percentile of the spread term.
    pub lower_percentile: f64,
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            min_width: 100,
            std_weight: 0.2,
            spread_weight: 0.1,
            upper_percentile: 90.0,
            lower_percentile: 10.0,
        }
    }
}

/// Frequency-domain lowpass applied to each band trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LowpassConfig {
    /// Cutoff frequency in Hz.
    pub cutoff_hz: f64,
    /// Butterworth-style order of the magnitude response.
    pub order: u32,
}

impl Default for LowpassConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: 2000.0,
            order: 3,
        }
    }
}

/// Autoregressive gap filling across the two row bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapFillConfig {
    /// Fixed AR order; `None` derives it from the number of missing samples.
    pub order: Option<usize>,
    /// Refit/predict iterations.
    pub max_iterations: usize,
}

impl Default for GapFillConfig {
    fn default() -> Self {
        Self {
            order: None,
            max_iterations: 1,
        }
    }
}

impl PipelineConfig {
    /// Sampling rate of a trace in Hz.
    pub fn sampling_rate_hz(&self) -> f64 {
        1.0 / self.sample_period_s
    }

    /// Number of zero samples appended after `rows` trace samples so a
    /// frame spans `frame_period_s`.
    pub fn padding_for(&self, rows: usize) -> usize {
        let budget = (self.frame_period_s - rows as f64 * self.sample_period_s) / self.sample_period_s;
        // Truncate toward zero, then drop one sample, as the capture timing does.
        let pad = budget.trunc() as i64 - 1;
        pad.max(0) as usize
    }

    /// Total samples each frame contributes to a speckle trace.
    pub fn samples_per_frame(&self, rows: usize) -> usize {
        rows + self.padding_for(rows)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_period_s > 0.0) || !(self.frame_period_s > 0.0) {
            return Err(ConfigError::InvalidPeriod);
        }
        if !(self.column.sigma > 0.0) || !(self.row.sigma > 0.0) {
            return Err(ConfigError::InvalidSigma);
        }
        if !(0.0..=1.0).contains(&self.column.height_fraction) {
            return Err(ConfigError::InvalidHeightFraction(self.column.height_fraction));
        }
        if !(0.0..=100.0).contains(&self.row.lower_percentile)
            || !(0.0..=100.0).contains(&self.row.upper_percentile)
        {
            return Err(ConfigError::InvalidPercentile);
        }
        if self.median_window == 0 || self.median_window % 2 == 0 {
            return Err(ConfigError::InvalidMedianWindow(self.median_window));
        }
        if !(self.lowpass.cutoff_hz > 0.0) || self.lowpass.order == 0 {
            return Err(ConfigError::InvalidLowpass);
        }
        if self.gap_fill.max_iterations == 0 || self.gap_fill.order == Some(0) {
            return Err(ConfigError::InvalidGapFill);
        }
        if self.max_speckles == 0 {
            return Err(ConfigError::InvalidMaxSpeckles);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// A sample or frame period is not positive.
    #[error("sample and frame periods must be positive")]
    InvalidPeriod,
    /// A smoothing sigma is not positive.
    #[error("smoothing sigmas must be positive")]
    InvalidSigma,
    /// The peak height fraction lies outside `[0, 1]`.
    #[error("peak height fraction {0} outside [0, 1]")]
    InvalidHeightFraction(f64),
    /// A row threshold percentile lies outside `[0, 100]`.
    #[error("row threshold percentiles must lie in [0, 100]")]
    InvalidPercentile,
    /// The median window is even or zero.
    #[error("median window {0} must be odd and non-zero")]
    InvalidMedianWindow(usize),
    /// The lowpass cutoff or order is not positive.
    #[error("lowpass needs a positive cutoff and order")]
    InvalidLowpass,
    /// Gap filling has zero iterations or a zero order.
    #[error("gap filling needs at least one iteration and a non-zero order")]
    InvalidGapFill,
    /// `max_speckles` is zero.
    #[error("at least one speckle slot is required")]
    InvalidMaxSpeckles,
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Extraction parameters.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Synthetic source parameters for `--synthetic`.
    #[serde(default)]
    pub synthetic: SyntheticConfig,
    /// Report and spectrum settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Lower edge of the band searched for the dominant frequency, in Hz.
    pub spectrum_min_hz: f64,
    /// Upper edge of the band searched for the dominant frequency, in Hz.
    pub spectrum_max_hz: f64,
    /// Zero-padding factor applied before the spectrum transform.
    pub spectrum_pad_factor: usize,
    /// Include full traces in the JSON report.
    pub include_traces: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            spectrum_min_hz: 40.0,
            spectrum_max_hz: 2000.0,
            spectrum_pad_factor: 8,
            include_traces: true,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.pipeline.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_even_median_window_invalid() {
        let config = PipelineConfig {
            median_window: 6,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMedianWindow(6))
        ));
    }

    #[test]
    fn test_padding_matches_frame_budget() {
        let config = PipelineConfig::default();

        // (1/30 - 480 * 11.4e-6) / 11.4e-6 = 2443.98..., truncated then minus one.
        assert_eq!(config.padding_for(480), 2442);
        assert_eq!(config.samples_per_frame(480), 2922);
    }

    #[test]
    fn test_padding_saturates_for_tall_frames() {
        let config = PipelineConfig::default();
        assert_eq!(config.padding_for(5000), 0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [pipeline]
            sample_period_s = 2e-5

            [pipeline.lowpass]
            cutoff_hz = 1500.0
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.sample_period_s, 2e-5);
        assert_eq!(config.pipeline.lowpass.cutoff_hz, 1500.0);
        assert_eq!(config.pipeline.lowpass.order, 3);
        assert_eq!(config.pipeline.column.min_distance, 100);
        assert_eq!(config.output.spectrum_pad_factor, 8);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let result = FileConfig::from_toml("[pipeline]\nmedian_window = 4\n");
        assert!(matches!(result, Err(ConfigError::InvalidMedianWindow(4))));

        let result = FileConfig::from_toml("[pipeline\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
