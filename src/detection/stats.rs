//! Summary statistics over intensity profiles.
//!
//! Conventions follow the usual array-library defaults: population standard
//! deviation, median averaging the two middle values, and percentiles with
//! linear interpolation between order statistics.

/// Arithmetic mean; zero for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population standard deviation; zero for an empty slice.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|&v| (v - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Median; zero for an empty slice.
pub fn median(data: &[f64]) -> f64 {
    percentile(data, 50.0)
}

/// `q`-th percentile (0..=100) with linear interpolation; zero for an empty slice.
pub fn percentile(data: &[f64], q: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Largest value; negative infinity for an empty slice.
pub fn max(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_percentile_interpolates() {
        let data: Vec<f64> = (0..=10).map(f64::from).collect();
        assert!((percentile(&data, 90.0) - 9.0).abs() < 1e-12);
        assert!((percentile(&data, 15.0) - 1.5).abs() < 1e-12);
        assert_eq!(percentile(&data, 0.0), 0.0);
        assert_eq!(percentile(&data, 100.0), 10.0);
    }

    #[test]
    fn test_population_std() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&data), 5.0);
        assert_eq!(std_dev(&data), 2.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(median(&[]), 0.0);
    }
}
