//! Dominant-frequency search on displacement traces.

use crate::config::OutputConfig;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;

/// Strongest spectral component inside the search band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralPeak {
    /// Frequency of the peak in Hz.
    pub frequency_hz: f64,
    /// Single-sided amplitude in trace units.
    pub amplitude: f64,
}

/// Band-limited spectral peak search with zero padding.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumAnalyzer {
    min_hz: f64,
    max_hz: f64,
    pad_factor: usize,
}

impl SpectrumAnalyzer {
    /// Creates an analyzer searching `[min_hz, max_hz]` with `pad_factor` zero padding.
    pub fn new(min_hz: f64, max_hz: f64, pad_factor: usize) -> Self {
        Self {
            min_hz,
            max_hz,
            pad_factor: pad_factor.max(1),
        }
    }

    /// Creates an analyzer from the output section of the configuration.
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(
            config.spectrum_min_hz,
            config.spectrum_max_hz,
            config.spectrum_pad_factor,
        )
    }

    /// Single-sided amplitude spectrum of the mean-removed, zero-padded trace.
    ///
    /// Returns `(frequency_hz, amplitude)` pairs from DC up to Nyquist.
    pub fn amplitude_spectrum(&self, trace: &[f64], sample_period_s: f64) -> Vec<(f64, f64)> {
        let n = trace.len();
        if n == 0 || !(sample_period_s > 0.0) {
            return Vec::new();
        }

        let mean = trace.iter().sum::<f64>() / n as f64;
        let padded_len = n * self.pad_factor;
        let mut buffer: Vec<Complex<f64>> = trace
            .iter()
            .map(|&v| Complex::new(v - mean, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(padded_len)
            .collect();

        let mut planner = FftPlanner::<f64>::new();
        planner.plan_fft_forward(padded_len).process(&mut buffer);

        let bin_hz = 1.0 / (sample_period_s * padded_len as f64);
        // Amplitudes are scaled by the unpadded length.
        let scale = 2.0 / n as f64;
        buffer[..padded_len / 2 + 1]
            .iter()
            .enumerate()
            .map(|(k, c)| (k as f64 * bin_hz, c.norm() * scale))
            .collect()
    }

    /// Finds the largest spectral component between the band edges.
    ///
    /// Returns `None` for empty or silent traces and when no bin falls
    /// inside the band.
    pub fn dominant(&self, trace: &[f64], sample_period_s: f64) -> Option<SpectralPeak> {
        self.amplitude_spectrum(trace, sample_period_s)
            .into_iter()
            .filter(|&(f, _)| f >= self.min_hz && f <= self.max_hz)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .filter(|&(_, amplitude)| amplitude > 0.0)
            .map(|(frequency_hz, amplitude)| SpectralPeak {
                frequency_hz,
                amplitude,
            })
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::from_config(&OutputConfig::default())
    }
}

/// Dominant frequency of `trace` with the default band and padding.
pub fn dominant_frequency(trace: &[f64], sample_period_s: f64) -> Option<SpectralPeak> {
    SpectrumAnalyzer::default().dominant(trace, sample_period_s)
}
