//! Regression matrices for autoregressive fitting.

use nalgebra::{DMatrix, DVector};

/// Builds the lagged regression system for an AR model of `order`.
///
/// Row `i` of the design matrix holds `samples[i + order - 1]` down to
/// `samples[i]` (most recent first); the target is `samples[i + order]`.
/// Returns an empty system when there are not more samples than `order`.
pub fn lagged_design(samples: &[f64], order: usize) -> (DMatrix<f64>, DVector<f64>) {
    let rows = samples.len().saturating_sub(order);
    let design = DMatrix::from_fn(rows, order, |i, k| samples[i + order - 1 - k]);
    let target = DVector::from_fn(rows, |i, _| samples[i + order]);
    (design, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_reversed_windows() {
        let samples = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (x, y) = lagged_design(&samples, 2);

        assert_eq!(x.shape(), (3, 2));
        assert_eq!(x.row(0).iter().copied().collect::<Vec<_>>(), vec![2.0, 1.0]);
        assert_eq!(x.row(2).iter().copied().collect::<Vec<_>>(), vec![4.0, 3.0]);
        assert_eq!(y.as_slice(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_too_few_samples_gives_empty_system() {
        let (x, y) = lagged_design(&[1.0, 2.0], 3);
        assert_eq!(x.nrows(), 0);
        assert_eq!(y.len(), 0);
    }
}
