use core::fmt;

use serde::Serialize;
use tracing::debug;

use crate::{MonthMatrix, ReturnSeries, month_matrix::MONTHS};

/// The three competing descriptions of monthly price change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelKind {
    /// Zero return every month
    Idle,
    /// The geometric-mean monthly growth rate every month
    Drift,
    /// The historical median return of each calendar month
    Sway,
}

impl ModelKind {
    /// All models in reporting order
    pub const ALL: [ModelKind; 3] = [ModelKind::Idle, ModelKind::Drift, ModelKind::Sway];

    /// Returns the model name
    pub const fn name(&self) -> &'static str {
        match self {
            ModelKind::Idle => "idle",
            ModelKind::Drift => "drift",
            ModelKind::Sway => "sway",
        }
    }

    const fn index(&self) -> usize {
        match self {
            ModelKind::Idle => 0,
            ModelKind::Drift => 1,
            ModelKind::Sway => 2,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fitted predictor of monthly percent returns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Model {
    /// Predicts 0
    Idle,
    /// Predicts `rate` for every month
    Drift {
        /// Constant monthly percent return
        rate: f64,
    },
    /// Predicts the median of the return's month column
    Sway {
        /// Median return per matrix column
        medians: [f64; MONTHS],
    },
}

impl Model {
    /// Returns which model this is
    pub const fn kind(&self) -> ModelKind {
        match self {
            Model::Idle => ModelKind::Idle,
            Model::Drift { .. } => ModelKind::Drift,
            Model::Sway { .. } => ModelKind::Sway,
        }
    }

    /// Returns the prediction for the return at a global index
    ///
    /// The index is the position in the return series, the month column is
    /// `index % 12`.
    pub fn predict(&self, index: usize) -> f64 {
        match self {
            Model::Idle => 0.0,
            Model::Drift { rate } => *rate,
            Model::Sway { medians } => medians[index % MONTHS],
        }
    }

    /// Returns the predictions for the first `n` returns
    pub fn predictions(&self, n: usize) -> Vec<f64> {
        (0..n).map(|i| self.predict(i)).collect()
    }

    /// Returns `actual - predicted` for every return
    pub fn errors(&self, returns: &[f64]) -> Vec<f64> {
        returns
            .iter()
            .enumerate()
            .map(|(i, ret)| ret - self.predict(i))
            .collect()
    }
}

/// Returns the constant monthly percent return that compounds to the total
/// appreciation over `n` months
///
/// # Arguments
///
/// * `first_close` - Close the first return starts from
/// * `last_close` - Close the last return ends on
/// * `n` - Number of monthly returns
///
/// # Returns
///
/// * `f64` - `100 * ((last_close / first_close)^(1/n) - 1)`
///
/// # Examples
///
/// ```
/// # use ta_seasonality::drift_rate;
/// # use assert_approx_eq::assert_approx_eq;
/// assert_approx_eq!(drift_rate(100.0, 121.0, 1), 21.0);
/// assert_approx_eq!(drift_rate(100.0, 121.0, 2), 10.0);
/// ```
pub fn drift_rate(first_close: f64, last_close: f64, n: usize) -> f64 {
    let wax = last_close / first_close;
    let gm_wax = wax.powf(1.0 / n as f64);
    100.0 * (gm_wax - 1.0)
}

/// The three fitted models with their error vectors
///
/// Built once from a return series and its month matrix, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSet {
    models: [Model; 3],
    errors: [Vec<f64>; 3],
}

impl ModelSet {
    /// Fits Idle, Drift and Sway and derives their error vectors
    ///
    /// # Arguments
    ///
    /// * `returns` - The return series
    /// * `matrix` - The same returns reshaped by month
    ///
    /// # Returns
    ///
    /// * `Self` - The fitted models
    pub fn build(returns: &ReturnSeries, matrix: &MonthMatrix) -> Self {
        let values = returns.values();

        let rate = drift_rate(returns.first_close(), returns.last_close(), returns.len());
        let medians = matrix.medians();
        debug!(drift_rate = rate, ?medians, "fitted models");

        let models = [Model::Idle, Model::Drift { rate }, Model::Sway { medians }];
        let errors = models.each_ref().map(|model| model.errors(&values));

        Self { models, errors }
    }

    /// Returns a fitted model
    pub fn model(&self, kind: ModelKind) -> &Model {
        &self.models[kind.index()]
    }

    /// Returns a model's error vector
    pub fn errors(&self, kind: ModelKind) -> &[f64] {
        &self.errors[kind.index()]
    }

    /// Returns the Drift model's monthly rate
    pub fn drift_rate(&self) -> f64 {
        match self.model(ModelKind::Drift) {
            Model::Drift { rate } => *rate,
            _ => f64::NAN,
        }
    }

    /// Returns the Sway model's column medians
    pub fn sway_medians(&self) -> [f64; MONTHS] {
        match self.model(ModelKind::Sway) {
            Model::Sway { medians } => *medians,
            _ => [f64::NAN; MONTHS],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::returns::tests::monthly;
    use assert_approx_eq::assert_approx_eq;

    fn fitted(closes: &[f64]) -> (ReturnSeries, ModelSet) {
        let returns = ReturnSeries::from_prices(&monthly(closes)).unwrap();
        let matrix = MonthMatrix::reshape(&returns).unwrap();
        let models = ModelSet::build(&returns, &matrix);
        (returns, models)
    }

    fn zigzag(years: usize) -> Vec<f64> {
        let mut closes = vec![100.0];
        for i in 0..years * 12 {
            let last = closes[closes.len() - 1];
            let step = if i % 3 == 0 { 1.04 } else { 0.99 };
            closes.push(last * step);
        }
        closes
    }

    #[test]
    fn test_drift_rate_two_points() {
        assert_approx_eq!(drift_rate(100.0, 121.0, 1), 21.0, 1e-12);
    }

    #[test]
    fn test_drift_rate_compounds_to_total_growth() {
        let rate = drift_rate(80.0, 133.0, 36);
        let compounded = 80.0 * (1.0 + rate / 100.0).powi(36);
        assert_approx_eq!(compounded, 133.0, 1e-9);
        assert_approx_eq!(drift_rate(50.0, 50.0, 24), 0.0);
        assert!(drift_rate(50.0, 40.0, 24) < 0.0);
    }

    #[test]
    fn test_idle_errors_equal_returns() {
        let (returns, models) = fitted(&zigzag(2));
        assert_eq!(models.errors(ModelKind::Idle), returns.values().as_slice());
        assert_eq!(models.model(ModelKind::Idle).predict(7), 0.0);
    }

    #[test]
    fn test_drift_errors_are_shifted_returns() {
        let (returns, models) = fitted(&zigzag(3));
        let rate = drift_rate(returns.first_close(), returns.last_close(), returns.len());
        assert_eq!(models.drift_rate(), rate);
        for (e, r) in models.errors(ModelKind::Drift).iter().zip(returns.values()) {
            assert_approx_eq!(*e, r - rate, 1e-12);
        }
    }

    #[test]
    fn test_sway_uses_column_medians() {
        let (returns, models) = fitted(&zigzag(3));
        let values = returns.values();
        let medians = models.sway_medians();

        // the zigzag repeats every three months, so each column is constant
        for (col, median) in medians.iter().enumerate() {
            assert_approx_eq!(*median, values[col], 1e-12);
        }
        for e in models.errors(ModelKind::Sway) {
            assert_approx_eq!(*e, 0.0, 1e-12);
        }
    }

    #[test]
    fn test_sway_predicts_by_column() {
        let mut medians = [0.0; MONTHS];
        medians[3] = 1.5;
        let model = Model::Sway { medians };
        assert_eq!(model.predict(3), 1.5);
        assert_eq!(model.predict(15), 1.5);
        assert_eq!(model.predict(4), 0.0);
        assert_eq!(model.predictions(16)[15], 1.5);
    }

    #[test]
    fn test_kinds() {
        let (_, models) = fitted(&zigzag(1));
        for kind in ModelKind::ALL {
            assert_eq!(models.model(kind).kind(), kind);
            assert_eq!(models.errors(kind).len(), 12);
        }
        assert_eq!(ModelKind::Sway.to_string(), "sway");
    }
}
