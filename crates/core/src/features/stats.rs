/// Arithmetic mean; NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `n - 1` in the denominator; NaN below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    (sum_sq_dev(values) / (values.len() - 1) as f64).sqrt()
}

/// Standard deviation with `n` in the denominator; NaN for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    (sum_sq_dev(values) / values.len() as f64).sqrt()
}

/// Mean of the last `n` values, or `None` when fewer than `n` exist.
pub fn trailing_mean(values: &[f64], n: usize) -> Option<f64> {
    trailing(values, n).map(mean)
}

/// Sample std of the last `n` values, or `None` when fewer than `n` exist.
pub fn trailing_sample_std(values: &[f64], n: usize) -> Option<f64> {
    trailing(values, n).map(sample_std)
}

fn trailing(values: &[f64], n: usize) -> Option<&[f64]> {
    if n == 0 || values.len() < n {
        return None;
    }
    Some(&values[values.len() - n..])
}

fn sum_sq_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}
