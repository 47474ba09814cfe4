/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes the sample standard deviation (divides by n - 1) given a
/// pre-computed mean. Returns 0.0 when fewer than two values are present.
pub fn sample_stddev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

/// Median of ascending-sorted values; averages the two middle values for an
/// even count.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}

/// Linear-interpolation percentile over ascending-sorted values.
///
/// `rank = p / 100 * (n - 1)`, interpolated between the order statistics at
/// `floor(rank)` and `ceil(rank)`. `p` must already be within `[0, 100]`.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let lower = (rank.floor() as usize).min(n - 1);
    let upper = (rank.ceil() as usize).min(n - 1);
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sorts values ascending using a total order.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[80.0, 90.0]), Some(85.0));
    }

    #[test]
    fn test_sample_stddev() {
        assert_eq!(sample_stddev(&[42.0], 42.0), 0.0);
        assert_eq!(sample_stddev(&[], 0.0), 0.0);
        // variance = ((2-5)^2 + (4-5)^2 + (4-5)^2 + (4-5)^2 + (5-5)^2 + (5-5)^2 + (7-5)^2 + (9-5)^2) / 7 = 32 / 7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = sample_stddev(&values, 5.0);
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_median_sorted() {
        assert_eq!(median_sorted(&[]), None);
        assert_eq!(median_sorted(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(median_sorted(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_percentile_sorted_interpolates() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
        assert_eq!(percentile_sorted(&values, 0.0), Some(10.0));
        assert_eq!(percentile_sorted(&values, 100.0), Some(100.0));
        assert_eq!(percentile_sorted(&values, 50.0), Some(55.0));
        // rank = 0.25 * 9 = 2.25
        assert!((percentile_sorted(&values, 25.0).unwrap() - 32.5).abs() < 1e-9);
        assert_eq!(percentile_sorted(&[], 50.0), None);
        assert_eq!(percentile_sorted(&[7.0], 90.0), Some(7.0));
    }
}
