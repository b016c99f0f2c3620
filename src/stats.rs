//! Descriptive statistics shared by the classifier and analyzers
//!
//! All functions take plain slices and return `None` where a statistic is
//! undefined, so callers decide what a degenerate input means for them.

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
///
/// A single value has no spread, so it yields `Some(0.0)`.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation coefficient.
///
/// Returns 0 when either series has zero variance. Returns `None` when the
/// series differ in length or have fewer than two points.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;

    let mut covariance = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    if sum_sq_x == 0.0 || sum_sq_y == 0.0 {
        return Some(0.0);
    }

    Some((covariance / (sum_sq_x.sqrt() * sum_sq_y.sqrt())).clamp(-1.0, 1.0))
}

/// Quantile by linear interpolation between order statistics (`q` in 0-1)
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert!((mean(&[1.0, 2.0, 3.0, 6.0]).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_dev() {
        // Sample variance of 2,4,4,4,5,5,7,9 is 32/7
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((sample_std_dev(&values).unwrap() - expected).abs() < 1e-12);

        assert_eq!(sample_std_dev(&[5.0]), Some(0.0));
        assert_eq!(sample_std_dev(&[3.0, 3.0, 3.0]), Some(0.0));
        assert_eq!(sample_std_dev(&[]), None);
    }

    #[test]
    fn test_pearson_perfect_linear() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-9);

        let ys: Vec<f64> = xs.iter().map(|x| 10.0 - 3.0 * x).collect();
        assert!((pearson(&xs, &ys).unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert_eq!(pearson(&[7.0, 7.0, 7.0], &[1.0, 2.0, 3.0]), Some(0.0));
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert!((quantile(&values, 0.25).unwrap() - 2.0).abs() < 1e-12);
        assert!((quantile(&values, 0.0).unwrap() - 1.0).abs() < 1e-12);
        assert!((quantile(&values, 1.0).unwrap() - 5.0).abs() < 1e-12);
        // 0.25 * 3 = 0.75 between 1 and 2
        assert!((quantile(&[1.0, 2.0, 3.0, 4.0], 0.25).unwrap() - 1.75).abs() < 1e-12);
    }
}
