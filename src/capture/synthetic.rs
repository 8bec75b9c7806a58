//! Synthetic speckle frames with a known vibration.
//!
//! Generates frames that look like the captures the pipeline expects:
//! vertical speckle bands of fine random grains, lit only inside two
//! horizontal row bands, with every row shifted along the columns relative
//! to the row above by a sinusoidal sub-pixel amount. The injected
//! row-to-row shift is exposed so results can be checked against ground
//! truth.
//!
//! Grains come from a seeded complex field: independent Gaussian phasors on
//! the integer columns, blurred by a Gaussian point spread of `grain_size`
//! pixels. The rendered intensity is the squared magnitude of that field,
//! which gives fully developed speckle statistics.

use super::{Frame, FrameSource, SourceError};
use ndarray::Array2;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for the synthetic generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Number of frames to produce.
    pub frames: usize,
    /// Column centres of the speckle bands.
    pub speckle_centers: Vec<f64>,
    /// Gaussian envelope width of each speckle band, in columns.
    pub speckle_sigma: f64,
    /// Point spread width of a single speckle grain, in columns.
    pub grain_size: f64,
    /// Mean grain intensity as a fraction of the envelope.
    pub grain_mean: f64,
    /// Seed for the grain field.
    pub seed: u64,
    /// Lit row ranges as `[start, end)` pairs.
    pub row_bands: Vec<(usize, usize)>,
    /// Background intensity.
    pub background: f64,
    /// Envelope peak intensity.
    pub peak: f64,
    /// Row-to-row shift amplitude in pixels.
    pub shift_amplitude: f64,
    /// Vibration frequency in Hz.
    pub shift_frequency_hz: f64,
    /// Time between successive rows in seconds.
    pub sample_period_s: f64,
    /// Time between successive frames in seconds.
    pub frame_period_s: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            frames: 3,
            speckle_centers: vec![160.0, 480.0],
            speckle_sigma: 45.0,
            grain_size: 2.5,
            grain_mean: 0.6,
            seed: 1,
            row_bands: vec![(30, 210), (250, 450)],
            background: 10.0,
            peak: 200.0,
            shift_amplitude: 0.3,
            shift_frequency_hz: 1000.0,
            sample_period_s: 11.4e-6,
            frame_period_s: 1.0 / 30.0,
        }
    }
}

impl SyntheticConfig {
    /// Validates the generator parameters.
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.width == 0 || self.height == 0 {
            return Err(SourceError::ConfigFailed("frame dimensions must be non-zero".into()));
        }
        if self.speckle_sigma <= 0.0 {
            return Err(SourceError::ConfigFailed("speckle sigma must be positive".into()));
        }
        if self.grain_size <= 0.0 || self.grain_mean <= 0.0 {
            return Err(SourceError::ConfigFailed(
                "grain size and mean must be positive".into(),
            ));
        }
        if self.sample_period_s <= 0.0 || self.frame_period_s <= 0.0 {
            return Err(SourceError::ConfigFailed("periods must be positive".into()));
        }
        if let Some(&(start, end)) = self
            .row_bands
            .iter()
            .find(|&&(start, end)| start >= end || end > self.height)
        {
            return Err(SourceError::ConfigFailed(format!(
                "row band {start}..{end} does not fit a frame of height {}",
                self.height
            )));
        }
        Ok(())
    }
}

/// Envelope level below which a pixel keeps the background value.
const ENVELOPE_FLOOR: f64 = 1e-4;

/// Deterministic generator of vibrating speckle frames.
#[derive(Debug)]
pub struct SyntheticSpeckle {
    config: SyntheticConfig,
    grains: GrainField,
    sequence: Option<u64>,
}

impl Default for SyntheticSpeckle {
    fn default() -> Self {
        Self::new(SyntheticConfig::default())
    }
}

impl SyntheticSpeckle {
    /// Creates a generator and draws its grain field from `config.seed`.
    pub fn new(config: SyntheticConfig) -> Self {
        // The accumulated row shift never exceeds amplitude * height.
        let drift = (config.shift_amplitude.abs() * config.height as f64).ceil() as usize;
        let grains = GrainField::generate(&config, drift);
        Self {
            config,
            grains,
            sequence: None,
        }
    }

    /// Returns the generator configuration.
    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Injected shift of `row` relative to `row - 1` in frame `frame`, in pixels.
    ///
    /// Positive values move the pattern toward higher column indices.
    pub fn row_shift(&self, frame: u64, row: usize) -> f64 {
        let c = &self.config;
        let t = frame as f64 * c.frame_period_s + row as f64 * c.sample_period_s;
        c.shift_amplitude * (2.0 * PI * c.shift_frequency_hz * t).sin()
    }

    /// Renders frame `index` without advancing the source.
    pub fn render(&self, index: u64) -> Frame {
        let c = &self.config;
        let mut pixels = Array2::<u8>::from_elem((c.height, c.width), clamp_u8(c.background));
        let mut position = 0.0;

        for row in 0..c.height {
            if row > 0 {
                position += self.row_shift(index, row);
            }
            if !c.row_bands.iter().any(|&(start, end)| (start..end).contains(&row)) {
                continue;
            }
            for col in 0..c.width {
                let x = col as f64 - position;
                let envelope: f64 = c
                    .speckle_centers
                    .iter()
                    .map(|&center| {
                        let d = (x - center) / c.speckle_sigma;
                        (-0.5 * d * d).exp()
                    })
                    .sum();
                if envelope < ENVELOPE_FLOOR {
                    continue;
                }
                let value = c.background
                    + (c.peak - c.background) * envelope * c.grain_mean * self.grains.intensity(x);
                pixels[[row, col]] = clamp_u8(value);
            }
        }

        Frame::new(pixels, index)
    }
}

/// Complex phasors on integer columns, blurred into speckle grains.
#[derive(Debug)]
struct GrainField {
    /// Column of the first phasor.
    origin: i64,
    phasors: Vec<(f64, f64)>,
    /// Point spread standard deviation.
    sigma: f64,
    /// Half-width of the point spread support, in columns.
    reach: i64,
    /// Expected squared magnitude, so `intensity` averages to one.
    norm: f64,
}

impl GrainField {
    fn generate(config: &SyntheticConfig, drift: usize) -> Self {
        let sigma = config.grain_size.max(f64::EPSILON);
        let reach = (4.0 * sigma).ceil() as i64 + 1;
        let margin = drift as i64 + reach + 1;
        let origin = -margin;
        let len = config.width + 2 * margin as usize;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let phasors = (0..len)
            .map(|_| (standard_normal(&mut rng), standard_normal(&mut rng)))
            .collect();

        let power: f64 = (-reach..=reach)
            .map(|d| (-(d * d) as f64 / (sigma * sigma)).exp())
            .sum();

        Self {
            origin,
            phasors,
            sigma,
            reach,
            norm: 2.0 * power,
        }
    }

    /// Speckle intensity at continuous column `x`, with unit mean.
    fn intensity(&self, x: f64) -> f64 {
        let base = x.floor() as i64;
        let (mut re, mut im) = (0.0, 0.0);
        for k in base - self.reach..=base + self.reach {
            let Some(&(a, b)) = usize::try_from(k - self.origin)
                .ok()
                .and_then(|i| self.phasors.get(i))
            else {
                continue;
            };
            let d = (x - k as f64) / self.sigma;
            let w = (-0.5 * d * d).exp();
            re += a * w;
            im += b * w;
        }
        (re * re + im * im) / self.norm
    }
}

/// Box-Muller draw from N(0, 1).
fn standard_normal(rng: &mut impl RngCore) -> f64 {
    let u1 = unit_open(rng);
    let u2 = unit_open(rng);
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Uniform sample in `(0, 1]`.
fn unit_open(rng: &mut impl RngCore) -> f64 {
    ((rng.next_u64() >> 11) as f64 + 1.0) / (1u64 << 53) as f64
}

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

impl FrameSource for SyntheticSpeckle {
    fn open(&mut self) -> Result<(), SourceError> {
        self.config.validate()?;
        self.sequence = Some(0);
        tracing::info!(
            frames = self.config.frames,
            width = self.config.width,
            height = self.config.height,
            "Synthetic speckle source opened"
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let sequence = self.sequence.ok_or(SourceError::NotInitialized)?;
        if sequence as usize >= self.config.frames {
            return Ok(None);
        }
        self.sequence = Some(sequence + 1);
        Ok(Some(self.render(sequence)))
    }

    fn is_open(&self) -> bool {
        self.sequence.is_some()
    }

    fn close(&mut self) {
        self.sequence = None;
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.config.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::collect_frames;

    #[test]
    fn test_source_lifecycle() {
        let mut source = SyntheticSpeckle::new(SyntheticConfig {
            frames: 2,
            ..Default::default()
        });
        assert!(!source.is_open());

        let frames = collect_frames(&mut source).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].sequence(), 1);
        assert_eq!(frames[0].shape(), (480, 640));
        assert!(!source.is_open());
    }

    #[test]
    fn test_next_without_open() {
        let mut source = SyntheticSpeckle::default();
        assert!(matches!(
            source.next_frame(),
            Err(SourceError::NotInitialized)
        ));
    }

    #[test]
    fn test_dark_outside_row_bands() {
        let source = SyntheticSpeckle::new(SyntheticConfig::default());
        let frame = source.render(0);

        assert!(frame.view().row(0).iter().all(|&v| v == 10));
        assert!(frame.view().row(230).iter().all(|&v| v == 10));

        let lit: f64 = frame.view().row(100).iter().skip(130).take(60).map(|&v| f64::from(v)).sum();
        assert!(lit / 60.0 > 40.0);
    }

    #[test]
    fn test_grains_are_fine_and_seeded() {
        let source = SyntheticSpeckle::default();
        let frame = source.render(0);
        let row = frame.view().row(120).to_owned();
        let profile: Vec<f64> = row.iter().skip(100).take(120).map(|&v| f64::from(v)).collect();

        // Fully developed speckle swings through many local extrema.
        let turns = profile
            .windows(3)
            .filter(|w| (w[1] - w[0]) * (w[2] - w[1]) < 0.0)
            .count();
        assert!(turns >= 12, "only {turns} extrema");

        assert_eq!(frame, SyntheticSpeckle::default().render(0));

        let reseeded = SyntheticSpeckle::new(SyntheticConfig {
            seed: 7,
            ..Default::default()
        })
        .render(0);
        assert_ne!(frame, reseeded);
    }

    #[test]
    fn test_grain_intensity_has_unit_mean() {
        let config = SyntheticConfig::default();
        let field = GrainField::generate(&config, 0);
        let samples = 4000;
        let mean: f64 = (0..samples)
            .map(|i| field.intensity(i as f64 * 0.15))
            .sum::<f64>()
            / samples as f64;
        assert!((mean - 1.0).abs() < 0.35, "mean {mean}");
    }

    #[test]
    fn test_invalid_band_rejected() {
        let config = SyntheticConfig {
            row_bands: vec![(400, 500)],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SourceError::ConfigFailed(_))
        ));
    }
}
