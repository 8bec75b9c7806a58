//! Cross-correlation with parabolic peak refinement.

use ndarray::{ArrayView1, ArrayView2};

/// Added to the row standard deviation before dividing.
const STD_EPSILON: f64 = 1e-6;

/// Normalizes a row to zero mean and (almost) unit variance.
pub fn normalize_row<T>(row: ArrayView1<'_, T>) -> Vec<f64>
where
    T: Copy + Into<f64>,
{
    let values: Vec<f64> = row.iter().map(|&v| v.into()).collect();
    if values.is_empty() {
        return values;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    let scale = 1.0 / (std + STD_EPSILON);

    values.into_iter().map(|v| (v - mean) * scale).collect()
}

/// Full cross-correlation of two equal-length sequences.
///
/// Entry `m` holds `sum_n a[n + lag] * v[n]` with `lag = m - (len - 1)`, so
/// the output has `2 * len - 1` entries and zero lag sits in the middle.
pub fn cross_correlate(a: &[f64], v: &[f64]) -> Vec<f64> {
    debug_assert_eq!(a.len(), v.len());
    let n = a.len().min(v.len());
    if n == 0 {
        return Vec::new();
    }

    (0..2 * n - 1)
        .map(|m| {
            let lag = m as isize - (n as isize - 1);
            let lo = (-lag).max(0) as usize;
            let hi = (n as isize - lag).min(n as isize) as usize;
            (lo..hi)
                .map(|i| a[(i as isize + lag) as usize] * v[i])
                .sum()
        })
        .collect()
}

/// Vertex offset of the parabola through three samples around a peak.
///
/// Returns `None` when the samples are collinear and no vertex exists.
pub fn parabolic_offset(left: f64, center: f64, right: f64) -> Option<f64> {
    let denominator = left - 2.0 * center + right;
    if denominator == 0.0 {
        return None;
    }
    Some(0.5 * (left - right) / denominator)
}

/// Estimates the shift between each pair of consecutive rows.
///
/// Entry 0 is always zero; entry `r` is the sub-pixel lag maximising the
/// correlation of row `r - 1` against row `r`. The values are instantaneous
/// row-to-row shifts, not a running sum. A pattern moving toward higher
/// column indices yields negative values.
pub fn row_shifts<T>(strip: ArrayView2<'_, T>) -> Vec<f64>
where
    T: Copy + Into<f64>,
{
    let rows = strip.nrows();
    if rows == 0 {
        return Vec::new();
    }

    let normalized: Vec<Vec<f64>> = strip.rows().into_iter().map(normalize_row).collect();
    let mut shifts = Vec::with_capacity(rows);
    shifts.push(0.0);

    for pair in normalized.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        let correlation = cross_correlate(current, next);
        if correlation.is_empty() {
            shifts.push(0.0);
            continue;
        }

        let peak = argmax(&correlation);
        let mut shift = peak as f64 - (current.len() as f64 - 1.0);

        // Refinement needs a neighbour on both sides of the peak.
        if peak >= 1 && peak + 1 < correlation.len() {
            if let Some(offset) = parabolic_offset(
                correlation[peak - 1],
                correlation[peak],
                correlation[peak + 1],
            ) {
                shift += offset;
            }
        }
        shifts.push(shift);
    }

    shifts
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_value), (i, &v)| {
            if v > best_value {
                (i, v)
            } else {
                (best, best_value)
            }
        })
        .0
}
