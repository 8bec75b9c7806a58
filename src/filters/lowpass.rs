//! Frequency-domain lowpass for displacement traces.

use rustfft::{num_complex::Complex, FftPlanner};

/// Butterworth-magnitude lowpass applied in the frequency domain.
///
/// The trace spectrum is multiplied by
/// `H(f) = 1 / (1 + (f / f_c)^(2 * order))` and transformed back. The
/// response is real and symmetric, so the filter is zero-phase and the
/// output is real up to rounding.
#[derive(Debug, Clone, Copy)]
pub struct Lowpass {
    cutoff_hz: f64,
    sampling_rate_hz: f64,
    order: u32,
}

impl Lowpass {
    /// Creates a lowpass with `cutoff_hz` for samples taken at `sampling_rate_hz`.
    pub fn new(cutoff_hz: f64, sampling_rate_hz: f64, order: u32) -> Self {
        Self {
            cutoff_hz,
            sampling_rate_hz,
            order,
        }
    }

    /// Effective cutoff in Hz after normalizing against the Nyquist rate.
    fn effective_cutoff(&self) -> f64 {
        let nyquist = self.sampling_rate_hz / 2.0;
        let normalized = self.cutoff_hz / nyquist;
        normalized * nyquist
    }

    /// Magnitude response at `freq_hz`.
    pub fn response(&self, freq_hz: f64) -> f64 {
        let ratio = freq_hz / self.effective_cutoff();
        1.0 / (1.0 + ratio.powi(2 * self.order as i32))
    }

    /// Filters `signal`, returning a trace of the same length.
    pub fn apply(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);

        let mut spectrum: Vec<Complex<f64>> =
            signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
        forward.process(&mut spectrum);

        let bin_hz = self.sampling_rate_hz / n as f64;
        for (k, bin) in spectrum.iter_mut().enumerate() {
            // Negative-frequency bins mirror their positive counterparts.
            let folded = k.min(n - k);
            *bin *= self.response(folded as f64 * bin_hz);
        }

        inverse.process(&mut spectrum);
        let scale = 1.0 / n as f64;
        spectrum.iter().map(|c| c.re * scale).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const FS: f64 = 1.0 / 11.4e-6;
    const N: usize = 4096;

    fn tone(bin: usize) -> Vec<f64> {
        (0..N)
            .map(|i| (2.0 * PI * bin as f64 * i as f64 / N as f64).sin())
            .collect()
    }

    fn amplitude(signal: &[f64]) -> f64 {
        let rms = (signal.iter().map(|v| v * v).sum::<f64>() / signal.len() as f64).sqrt();
        rms * 2.0_f64.sqrt()
    }

    #[test]
    fn test_passband_and_stopband() {
        // Bin-aligned tones so leakage does not blur the check.
        let low_bin = 10;
        let bin_hz = FS / N as f64;
        let cutoff = 10.0 * low_bin as f64 * bin_hz;
        let filter = Lowpass::new(cutoff, FS, 3);

        let low = filter.apply(&tone(low_bin));
        assert!(amplitude(&low) >= 0.95, "passband amplitude {}", amplitude(&low));

        let high = filter.apply(&tone(100 * low_bin));
        assert!(amplitude(&high) < 0.1, "stopband amplitude {}", amplitude(&high));
    }

    #[test]
    fn test_response_half_power_at_cutoff() {
        let filter = Lowpass::new(2000.0, FS, 3);
        assert!((filter.response(2000.0) - 0.5).abs() < 1e-12);
        assert_eq!(filter.response(0.0), 1.0);
    }

    #[test]
    fn test_preserves_length_and_dc() {
        let filter = Lowpass::new(2000.0, FS, 3);
        for len in [1, 2, 7, 64, 161] {
            let out = filter.apply(&vec![0.25; len]);
            assert_eq!(out.len(), len);
            assert!(out.iter().all(|&v| (v - 0.25).abs() < 1e-12));
        }
    }

    #[test]
    fn test_empty_signal() {
        let filter = Lowpass::new(2000.0, FS, 3);
        assert!(filter.apply(&[]).is_empty());
    }
}
