//! Gaussian kernels and 1-D smoothing.

/// Builds a normalized, symmetric Gaussian kernel.
///
/// Without an explicit `size` the support is `ceil(6 * sigma)`, bumped to the
/// next odd number. The kernel always has `2 * (size / 2) + 1` taps centred on
/// zero and sums to one. A non-positive `sigma` yields the identity kernel.
pub fn gaussian_kernel(sigma: f64, size: Option<usize>) -> Vec<f64> {
    if !(sigma > 0.0) {
        return vec![1.0];
    }

    let size = size.unwrap_or_else(|| {
        let size = (sigma * 6.0).ceil() as usize;
        if size % 2 == 0 {
            size + 1
        } else {
            size
        }
    });
    let half = (size / 2) as isize;

    let two_sigma2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-half..=half)
        .map(|x| (-((x * x) as f64) / two_sigma2).exp())
        .collect();

    let sum: f64 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Smooths `signal` with a Gaussian of width `sigma`.
///
/// The signal is edge-replicated by half the kernel on both sides, convolved,
/// and trimmed back so the output has the input length.
pub fn gaussian_filter1d(signal: &[f64], sigma: f64) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }

    let kernel = gaussian_kernel(sigma, None);
    let pad = kernel.len() / 2;
    let first = signal[0];
    let last = signal[signal.len() - 1];

    let padded: Vec<f64> = std::iter::repeat(first)
        .take(pad)
        .chain(signal.iter().copied())
        .chain(std::iter::repeat(last).take(pad))
        .collect();

    // Kernel is symmetric, so correlation and convolution coincide.
    padded
        .windows(kernel.len())
        .map(|w| w.iter().zip(&kernel).map(|(a, b)| a * b).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernels_normalized_and_symmetric() {
        for sigma in [1.0, 2.0, 5.0] {
            let k = gaussian_kernel(sigma, None);
            let sum: f64 = k.iter().sum();

            assert!((sum - 1.0).abs() < 1e-9, "sigma {sigma}: sum {sum}");
            assert_eq!(k.len() % 2, 1);
            for i in 0..k.len() / 2 {
                assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn test_default_support() {
        assert_eq!(gaussian_kernel(1.0, None).len(), 7);
        assert_eq!(gaussian_kernel(2.0, None).len(), 13);
        assert_eq!(gaussian_kernel(20.0, None).len(), 121);
        assert_eq!(gaussian_kernel(2.0, Some(5)).len(), 5);
    }

    #[test]
    fn test_peak_at_center() {
        let k = gaussian_kernel(3.0, None);
        let center = k.len() / 2;
        assert!(k.iter().all(|&v| v <= k[center]));
    }

    #[test]
    fn test_filter_preserves_length_and_constants() {
        let signal = vec![4.0; 50];
        let out = gaussian_filter1d(&signal, 10.0);

        assert_eq!(out.len(), 50);
        assert!(out.iter().all(|&v| (v - 4.0).abs() < 1e-12));
    }

    #[test]
    fn test_filter_smooths_step() {
        let signal: Vec<f64> = (0..40).map(|i| if i < 20 { 0.0 } else { 1.0 }).collect();
        let out = gaussian_filter1d(&signal, 2.0);

        assert!(out.windows(2).all(|w| w[1] >= w[0] - 1e-12));
        assert!(out[19] > 0.0 && out[19] < 0.5);
        assert!(out[20] > 0.5 && out[20] < 1.0);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_empty_signal() {
        assert!(gaussian_filter1d(&[], 3.0).is_empty());
    }
}
