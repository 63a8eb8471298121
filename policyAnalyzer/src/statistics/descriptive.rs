// Descriptive statistics shared by the inferential tests

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sum of squared deviations from the mean.
pub fn sum_of_squares(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Unbiased (n - 1) variance. NaN for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    sum_of_squares(values) / (values.len() - 1) as f64
}

pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Largest sum of squares that rounding alone can leave behind for `n` values of magnitude
/// at most `max_abs` whose true deviations are all zero.
pub fn rounding_floor(n: usize, max_abs: f64) -> f64 {
    let n = n as f64;
    let ulp = n * f64::EPSILON * max_abs;
    4.0 * n * ulp * ulp
}

pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}
