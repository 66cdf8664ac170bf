use serde::Serialize;

use crate::{
    Kbn, ModelKind,
    helper::{median_from_sorted_slice, sorted_copy},
};

/// Summary of one model's error vector
///
/// Absolute-error figures are unscaled (no normal-consistency factor). The
/// two ratios are diagnostics only, they are reported and never tested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorMetrics {
    /// Model the errors belong to
    pub model: ModelKind,
    /// Mean absolute error
    pub mean_abs: f64,
    /// Median absolute error
    pub median_abs: f64,
    /// Variance of the errors
    pub variance: f64,
    /// Standard deviation of the errors
    pub sd: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// `mean_abs / sd`
    pub mean_abs_to_sd: f64,
    /// `median_abs / sd`
    pub median_abs_to_sd: f64,
}

impl ErrorMetrics {
    /// Summarizes an error vector
    ///
    /// # Arguments
    ///
    /// * `model` - Model the errors belong to
    /// * `errors` - Actual minus predicted returns
    /// * `ddof` - `true` for the sample variance (`n - 1` denominator),
    ///   `false` for the population variance. Use the same value for every
    ///   model being compared.
    ///
    /// # Returns
    ///
    /// * `Self` - The metrics. Figures that are undefined for the input (an
    ///   empty vector, a single error with `ddof`, a zero standard deviation
    ///   in a ratio) come out as `NaN` or infinite.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ta_seasonality::{ErrorMetrics, ModelKind};
    /// # use assert_approx_eq::assert_approx_eq;
    /// let metrics = ErrorMetrics::from_errors(ModelKind::Idle, &[1.0, -3.0, 2.0, -4.0], true);
    /// assert_approx_eq!(metrics.mean_abs, 2.5);
    /// assert_approx_eq!(metrics.median_abs, 2.5);
    /// assert_approx_eq!(metrics.variance, 26.0 / 3.0);
    /// ```
    pub fn from_errors(model: ModelKind, errors: &[f64], ddof: bool) -> Self {
        let n = errors.len() as f64;

        let mut sum = Kbn::<f64>::default();
        let mut sum_abs = Kbn::<f64>::default();
        let mut sum_sq = Kbn::<f64>::default();
        for e in errors {
            sum += *e;
            sum_abs += e.abs();
            sum_sq += e * e;
        }
        let mean = sum.total() / n;
        let mean_abs = sum_abs.total() / n;
        let rmse = (sum_sq.total() / n).sqrt();

        let mut dev_sq = Kbn::<f64>::default();
        for e in errors {
            let d = e - mean;
            dev_sq += d * d;
        }
        let denom = if ddof { n - 1.0 } else { n };
        let variance = if denom > 0.0 {
            dev_sq.total() / denom
        } else {
            f64::NAN
        };
        let sd = variance.sqrt();

        let abs: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
        let median_abs = median_from_sorted_slice(&sorted_copy(&abs)).unwrap_or(f64::NAN);

        Self {
            model,
            mean_abs,
            median_abs,
            variance,
            sd,
            rmse,
            mean_abs_to_sd: mean_abs / sd,
            median_abs_to_sd: median_abs / sd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_sample_and_population_variance() {
        let errors = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

        let population = ErrorMetrics::from_errors(ModelKind::Drift, &errors, false);
        assert_approx_eq!(population.variance, 4.0);
        assert_approx_eq!(population.sd, 2.0);

        let sample = ErrorMetrics::from_errors(ModelKind::Drift, &errors, true);
        assert_approx_eq!(sample.variance, 32.0 / 7.0);
        assert_approx_eq!(sample.sd, (32.0f64 / 7.0).sqrt());
    }

    #[test]
    fn test_absolute_error_figures() {
        let errors = [-2.0, 1.0, 3.0, -6.0, 0.5];
        let metrics = ErrorMetrics::from_errors(ModelKind::Sway, &errors, true);
        assert_eq!(metrics.model, ModelKind::Sway);
        assert_approx_eq!(metrics.mean_abs, 12.5 / 5.0);
        assert_approx_eq!(metrics.median_abs, 2.0);
        assert_approx_eq!(metrics.rmse, (50.25f64 / 5.0).sqrt());
        assert_approx_eq!(metrics.mean_abs_to_sd, metrics.mean_abs / metrics.sd);
        assert_approx_eq!(metrics.median_abs_to_sd, 2.0 / metrics.sd);
    }

    #[test]
    fn test_variance_ignores_offset() {
        let errors = [1.0, 2.0, 3.0, 4.0];
        let shifted: Vec<f64> = errors.iter().map(|e| e + 1_000_000.0).collect();
        let a = ErrorMetrics::from_errors(ModelKind::Idle, &errors, true);
        let b = ErrorMetrics::from_errors(ModelKind::Idle, &shifted, true);
        assert_approx_eq!(a.variance, b.variance, 1e-6);
    }

    #[test]
    fn test_degenerate_inputs() {
        let single = ErrorMetrics::from_errors(ModelKind::Idle, &[3.0], true);
        assert!(single.variance.is_nan());
        assert_approx_eq!(single.mean_abs, 3.0);

        let single = ErrorMetrics::from_errors(ModelKind::Idle, &[3.0], false);
        assert_eq!(single.variance, 0.0);

        let empty = ErrorMetrics::from_errors(ModelKind::Idle, &[], false);
        assert!(empty.mean_abs.is_nan());
        assert!(empty.median_abs.is_nan());
    }
}
