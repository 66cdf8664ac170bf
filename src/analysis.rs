use serde::Serialize;
use tracing::info;

use crate::{
    AnalysisConfig, BoxSummary, Comparison, ComparisonKind, ComparisonSuite, ErrorMetrics,
    ModelKind, ModelSet, MonthMatrix, PriceObservation, Result, ReturnSeries, month_matrix::MONTHS,
};

/// The results table of a full run
///
/// Holds every intermediate product of the pipeline so that reporting and
/// plotting layers can read whatever they need without recomputing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    returns: ReturnSeries,
    matrix: MonthMatrix,
    models: ModelSet,
    metrics: Vec<ErrorMetrics>,
    box_summaries: Vec<BoxSummary>,
    comparisons: Vec<Comparison>,
}

impl Report {
    /// Returns the monthly returns
    pub fn returns(&self) -> &ReturnSeries {
        &self.returns
    }

    /// Returns the returns by year and month
    pub fn matrix(&self) -> &MonthMatrix {
        &self.matrix
    }

    /// Returns the fitted models and their error vectors
    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// Returns the Drift model's monthly rate
    pub fn drift_rate(&self) -> f64 {
        self.models.drift_rate()
    }

    /// Returns the Sway model's column medians
    pub fn sway_medians(&self) -> [f64; MONTHS] {
        self.models.sway_medians()
    }

    /// Returns the error summary of every model, in [`ModelKind::ALL`] order
    pub fn metrics(&self) -> &[ErrorMetrics] {
        &self.metrics
    }

    /// Returns one model's error summary
    pub fn metrics_for(&self, model: ModelKind) -> Option<&ErrorMetrics> {
        self.metrics.iter().find(|m| m.model == model)
    }

    /// Returns the box-plot summary of every calendar month
    pub fn box_summaries(&self) -> &[BoxSummary] {
        &self.box_summaries
    }

    /// Returns every binomial test
    pub fn comparisons(&self) -> &[Comparison] {
        &self.comparisons
    }

    /// Returns the test answering a given question
    pub fn comparison(&self, kind: ComparisonKind) -> Option<&Comparison> {
        self.comparisons.iter().find(|c| c.kind == kind)
    }
}

/// Entry point running the whole pipeline
///
/// prices -> returns -> month matrix -> models and error vectors -> metrics
/// and binomial tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Analysis;

impl Analysis {
    /// Runs the analysis over a monthly close series
    ///
    /// # Arguments
    ///
    /// * `prices` - Monthly closes in chronological order, `12 * years + 1` of them
    /// * `config` - Analysis settings
    ///
    /// # Returns
    ///
    /// * `Result<Report>` - The results table. `Config`, `InsufficientData`,
    ///   `Data` and `Shape` errors abort the run; a `Domain` error only
    ///   affects its own comparison.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ta_seasonality::{Analysis, AnalysisConfig, ModelKind, PriceObservation};
    /// # use chrono::NaiveDate;
    /// let prices: Vec<PriceObservation> = (0..25)
    ///     .map(|i| {
    ///         let date = NaiveDate::from_ymd_opt(2010 + i / 12, (i % 12) as u32 + 1, 1).unwrap();
    ///         let close = 100.0 + (i % 5) as f64 * 3.0 + i as f64;
    ///         PriceObservation::new(date, close)
    ///     })
    ///     .collect();
    ///
    /// let report = Analysis::run(&prices, &AnalysisConfig::default()).unwrap();
    /// assert_eq!(report.returns().len(), 24);
    /// assert_eq!(report.matrix().rows(), 2);
    /// assert!(report.metrics_for(ModelKind::Sway).is_some());
    /// assert_eq!(report.comparisons().len(), 8);
    /// ```
    pub fn run(prices: &[PriceObservation], config: &AnalysisConfig) -> Result<Report> {
        config.validate()?;

        let returns = ReturnSeries::from_prices(prices)?;
        let matrix = MonthMatrix::reshape(&returns)?;
        info!(
            len = prices.len(),
            n = returns.len(),
            years = matrix.rows(),
            "analysing monthly returns"
        );

        let models = ModelSet::build(&returns, &matrix);
        let metrics = ModelKind::ALL
            .iter()
            .map(|kind| ErrorMetrics::from_errors(*kind, models.errors(*kind), config.ddof()))
            .collect();
        let box_summaries = matrix.box_summaries();
        let comparisons = ComparisonSuite::new(&models, &matrix, config).run();

        Ok(Report {
            returns,
            matrix,
            models,
            metrics,
            box_summaries,
            comparisons,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        Alternative, Error, TestResult,
        returns::tests::{monthly, monthly_from},
    };
    use assert_approx_eq::assert_approx_eq;
    use chrono::Month;

    const CLOSES: [f64; 37] = [
        100.0, 99.65, 102.74, 102.52, 101.89, 98.44, 98.28, 103.98, 106.8, 112.64, 114.8, 117.76,
        119.68, 111.66, 116.85, 120.45, 124.12, 115.67, 107.52, 104.08, 102.72, 104.95, 105.57,
        108.89, 106.61, 108.94, 111.74, 109.31, 118.63, 122.55, 130.13, 127.54, 124.32, 123.39,
        123.79, 128.3, 130.76,
    ];

    const SWAY_MEDIANS: [f64; 12] = [
        -0.3499999999999943,
        3.1008529854490607,
        -0.21413276231263273,
        3.0469074304690755,
        -3.386004514672689,
        -0.1625355546525768,
        -1.9903173749327514,
        -1.3066871637202147,
        2.1709501557632436,
        0.5907575035731208,
        3.1448328123520013,
        1.6304347826086971,
    ];

    fn report() -> Report {
        Analysis::run(&monthly(&CLOSES), &AnalysisConfig::default()).unwrap()
    }

    fn outcome(report: &Report, kind: ComparisonKind) -> TestResult {
        report.comparison(kind).unwrap().outcome.clone().unwrap()
    }

    fn assert_test(
        result: &TestResult,
        successes: usize,
        trials: usize,
        p_value: f64,
        interval: (f64, f64),
    ) {
        assert_eq!(result.successes, successes);
        assert_eq!(result.trials, trials);
        assert_approx_eq!(result.p_value, p_value, 1e-9);
        assert_approx_eq!(result.confidence_interval.0, interval.0, 1e-6);
        assert_approx_eq!(result.confidence_interval.1, interval.1, 1e-6);
    }

    #[test]
    fn test_fixture_models() {
        let report = report();
        assert_eq!(report.returns().len(), 36);
        assert_eq!(report.matrix().rows(), 3);
        assert_approx_eq!(report.drift_rate(), 0.7477635474262501, 1e-12);
        for (median, expected) in report.sway_medians().iter().zip(SWAY_MEDIANS) {
            assert_approx_eq!(*median, expected, 1e-12);
        }
        for (summary, expected) in report.box_summaries().iter().zip(SWAY_MEDIANS) {
            assert_approx_eq!(summary.median, expected, 1e-12);
        }
        assert_eq!(report.box_summaries()[9].month, Month::October);
    }

    #[test]
    fn test_fixture_metrics() {
        let report = report();
        let expected = [
            (
                ModelKind::Idle,
                2.996277816013362,
                2.574309676585713,
                13.15129518258159,
            ),
            (
                ModelKind::Drift,
                2.9039057921311766,
                2.343099402294433,
                13.15129518258159,
            ),
            (
                ModelKind::Sway,
                2.106277746440894,
                1.2135491785852874,
                10.406842752883348,
            ),
        ];
        for (kind, mean_abs, median_abs, variance) in expected {
            let metrics = report.metrics_for(kind).unwrap();
            assert_approx_eq!(metrics.mean_abs, mean_abs, 1e-9);
            assert_approx_eq!(metrics.median_abs, median_abs, 1e-9);
            assert_approx_eq!(metrics.variance, variance, 1e-9);
            assert_approx_eq!(metrics.mean_abs_to_sd, mean_abs / variance.sqrt(), 1e-9);
        }
    }

    #[test]
    fn test_fixture_sign_bias() {
        let report = report();
        let expected = [
            (
                ModelKind::Idle,
                21,
                0.40503224614076316,
                (0.4075652408917765, 0.7448589516735322),
            ),
            (
                ModelKind::Drift,
                19,
                0.8679394004284404,
                (0.35486379853731, 0.695949411283735),
            ),
            (
                ModelKind::Sway,
                12,
                0.06524533522315323,
                (0.18556180982592124, 0.5097025466518912),
            ),
        ];
        for (model, k, p, ci) in expected {
            let result = outcome(&report, ComparisonKind::SignBias { model });
            assert_eq!(result.alternative, Alternative::TwoSided);
            assert_test(&result, k, 36, p, ci);
        }
    }

    #[test]
    fn test_fixture_superiority() {
        let report = report();
        let expected = [
            (
                ModelKind::Drift,
                ModelKind::Idle,
                20,
                0.308859658514848,
                0.4060947772237098,
            ),
            (
                ModelKind::Sway,
                ModelKind::Idle,
                27,
                0.001966586511116475,
                0.6042932189708055,
            ),
            (
                ModelKind::Sway,
                ModelKind::Drift,
                26,
                0.005665492091793567,
                0.5745396704142609,
            ),
        ];
        for (better, worse, k, p, lower) in expected {
            let result = outcome(&report, ComparisonKind::Superiority { better, worse });
            assert_eq!(result.alternative, Alternative::Greater);
            assert_test(&result, k, 36, p, (lower, 1.0));
        }
    }

    #[test]
    fn test_fixture_seasonal() {
        let report = report();
        assert_eq!(
            report.matrix().up_counts(),
            [1, 3, 1, 2, 1, 1, 1, 1, 2, 3, 3, 2]
        );

        let independent = outcome(
            &report,
            ComparisonKind::SeasonalIndependent {
                subject: Month::October,
                reference: Month::August,
            },
        );
        assert_approx_eq!(independent.hypothesized_p, 1.0 / 3.0);
        assert_test(&independent, 3, 3, 1.0 / 27.0, (0.29240177382128674, 1.0));

        let paired = outcome(
            &report,
            ComparisonKind::SeasonalPaired {
                subject: Month::October,
                reference: Month::August,
            },
        );
        assert_test(&paired, 2, 3, 0.5, (0.13535036217158386, 1.0));
    }

    #[test]
    fn test_march_start_maps_calendar_months() {
        let prices = monthly_from(Month::March, &CLOSES);
        let march = Analysis::run(&prices, &AnalysisConfig::default()).unwrap();
        let matrix = march.matrix();
        assert_eq!(matrix.start(), Month::March);
        assert_eq!(matrix.column_for(Month::October), 7);
        assert_eq!(matrix.column_for(Month::August), 5);
        assert_eq!(march.box_summaries()[7].month, Month::October);

        let independent = outcome(
            &march,
            ComparisonKind::SeasonalIndependent {
                subject: Month::October,
                reference: Month::August,
            },
        );
        assert_approx_eq!(independent.hypothesized_p, 1.0 / 3.0);
        let interval = (0.008403758659612643, 0.9057006759497539);
        assert_test(&independent, 1, 3, 1.0, interval);

        let paired = outcome(
            &march,
            ComparisonKind::SeasonalPaired {
                subject: Month::October,
                reference: Month::August,
            },
        );
        assert_test(&paired, 2, 3, 0.5, (0.13535036217158386, 1.0));

        // the model comparisons do not depend on the calendar
        let january = report();
        for model in ModelKind::ALL {
            let kind = ComparisonKind::SignBias { model };
            assert_eq!(outcome(&march, kind), outcome(&january, kind));
        }
    }

    #[test]
    fn test_runs_are_reproducible() {
        assert_eq!(report(), report());
    }

    #[test]
    fn test_failed_comparison_leaves_others() {
        // November rose in every year, so it cannot be the reference month
        let mut config = AnalysisConfig::default();
        config.set_seasonal(Month::October, Month::November);
        let report = Analysis::run(&monthly(&CLOSES), &config).unwrap();

        let failed = report
            .comparisons()
            .iter()
            .filter(|c| c.outcome.is_err())
            .collect::<Vec<_>>();
        assert_eq!(failed.len(), 1);
        assert!(matches!(
            failed[0].kind,
            ComparisonKind::SeasonalIndependent { .. }
        ));
        assert!(matches!(failed[0].outcome, Err(Error::Domain { .. })));
        assert_eq!(report.comparisons().len(), 8);
    }

    #[test]
    fn test_population_variance_config() {
        let mut config = AnalysisConfig::default();
        config.set_ddof(false);
        let report = Analysis::run(&monthly(&CLOSES), &config).unwrap();
        let metrics = report.metrics_for(ModelKind::Idle).unwrap();
        assert_approx_eq!(metrics.variance, 13.15129518258159 * 35.0 / 36.0, 1e-9);
    }

    #[test]
    fn test_fatal_errors() {
        let config = AnalysisConfig::default();
        assert_eq!(
            Analysis::run(&monthly(&CLOSES[..14]), &config),
            Err(Error::Shape { len: 13 })
        );

        let mut closes = CLOSES;
        closes[20] = -1.0;
        assert!(matches!(
            Analysis::run(&monthly(&closes), &config),
            Err(Error::Data { index: 20, .. })
        ));

        let mut config = AnalysisConfig::default();
        config.set_confidence_level(0.0);
        assert!(matches!(
            Analysis::run(&monthly(&CLOSES), &config),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["comparisons"].as_array().map(Vec::len), Some(8));
        assert_eq!(json["metrics"][2]["model"], "Sway");
    }
}
