//! AR coefficient estimation.

use nalgebra::{DMatrix, DVector};

/// L2 penalty used when the least-squares solve breaks down.
const RIDGE_LAMBDA: f64 = 0.01;

/// Fitted autoregressive model.
#[derive(Debug, Clone, PartialEq)]
pub struct ArModel {
    /// `coefficients[k]` weights the sample `k + 1` steps back.
    pub coefficients: Vec<f64>,
    /// True if the regularized fallback produced the coefficients.
    pub regularized: bool,
}

impl ArModel {
    /// Model order.
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// Predicts the sample following `history` (oldest first).
    ///
    /// Only the last `order` samples are used; missing older samples count
    /// as zero.
    pub fn predict(&self, history: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(history.iter().rev())
            .map(|(c, v)| c * v)
            .sum()
    }
}

/// Fits AR coefficients to the lagged system `design * c = target`.
///
/// Uses the minimum-norm least-squares solution from an SVD, cutting
/// singular values below `eps * max(rows, cols) * s_max`. If the
/// decomposition fails or yields non-finite values, falls back to
/// [`ridge_solve`].
pub fn fit_ar(design: &DMatrix<f64>, target: &DVector<f64>) -> ArModel {
    if let Some(coefficients) = least_squares(design, target) {
        return ArModel {
            coefficients,
            regularized: false,
        };
    }

    tracing::debug!(
        rows = design.nrows(),
        order = design.ncols(),
        "Least squares failed, using ridge fallback"
    );
    ArModel {
        coefficients: ridge_solve(design, target, RIDGE_LAMBDA),
        regularized: true,
    }
}

fn least_squares(design: &DMatrix<f64>, target: &DVector<f64>) -> Option<Vec<f64>> {
    if design.nrows() == 0 || design.ncols() == 0 {
        return None;
    }

    let svd = design.clone().try_svd(true, true, f64::EPSILON, 0)?;
    let s_max = svd.singular_values.max();
    let cutoff = f64::EPSILON * design.nrows().max(design.ncols()) as f64 * s_max;

    let solution = svd.solve(target, cutoff).ok()?;
    let coefficients: Vec<f64> = solution.iter().copied().collect();
    coefficients
        .iter()
        .all(|c| c.is_finite())
        .then_some(coefficients)
}

/// Solves `(XᵀX + λI) c = Xᵀy`.
///
/// Returns zeros if even the regularized system cannot be factored, which
/// only happens for non-finite input.
pub fn ridge_solve(design: &DMatrix<f64>, target: &DVector<f64>, lambda: f64) -> Vec<f64> {
    let order = design.ncols();
    let gram = design.transpose() * design + DMatrix::<f64>::identity(order, order) * lambda;
    let rhs = design.transpose() * target;

    match gram.cholesky() {
        Some(cholesky) => cholesky.solve(&rhs).iter().copied().collect(),
        None => vec![0.0; order],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gapfill::lagged_design;

    #[test]
    fn test_recovers_ar2_coefficients() {
        // x[n] = 1.6 x[n-1] - 0.8 x[n-2], kicked once.
        let mut x = vec![1.0, 0.5];
        for n in 2..80 {
            let next = 1.6 * x[n - 1] - 0.8 * x[n - 2];
            x.push(next);
        }
        let (design, target) = lagged_design(&x, 2);
        let model = fit_ar(&design, &target);

        assert!(!model.regularized);
        assert!((model.coefficients[0] - 1.6).abs() < 1e-8);
        assert!((model.coefficients[1] + 0.8).abs() < 1e-8);
    }

    #[test]
    fn test_rank_deficient_system_is_finite() {
        let design = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let target = DVector::from_vec(vec![2.0, 4.0, 6.0]);
        let model = fit_ar(&design, &target);

        assert!(model.coefficients.iter().all(|c| c.is_finite()));
        let sum: f64 = model.coefficients.iter().sum();
        assert!((sum - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ridge_shrinks_toward_zero() {
        let design = DMatrix::from_row_slice(3, 1, &[1.0, 1.0, 1.0]);
        let target = DVector::from_vec(vec![1.0, 1.0, 1.0]);

        let c = ridge_solve(&design, &target, 0.01);
        assert!((c[0] - 3.0 / 3.01).abs() < 1e-12);
    }

    #[test]
    fn test_empty_system_falls_back() {
        let design = DMatrix::<f64>::zeros(0, 3);
        let target = DVector::<f64>::zeros(0);
        let model = fit_ar(&design, &target);

        assert!(model.regularized);
        assert_eq!(model.coefficients, vec![0.0; 3]);
    }

    #[test]
    fn test_predict_pads_short_history() {
        let model = ArModel {
            coefficients: vec![0.5, 0.25, 2.0],
            regularized: false,
        };
        assert_eq!(model.predict(&[4.0, 8.0]), 0.5 * 8.0 + 0.25 * 4.0);
        assert_eq!(model.predict(&[100.0, 1.0, 4.0, 8.0]), 0.5 * 8.0 + 0.25 * 4.0 + 2.0);
    }
}
