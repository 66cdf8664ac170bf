use core::fmt;

use chrono::Month;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    Alternative, AnalysisConfig, BinomialTest, Error, ModelKind, ModelSet, MonthMatrix, Result,
    SeasonalPair, TestResult,
};

/// Pairs checked by the superiority tests, better candidate first
pub const SUPERIORITY_PAIRS: [(ModelKind, ModelKind); 3] = [
    (ModelKind::Drift, ModelKind::Idle),
    (ModelKind::Sway, ModelKind::Idle),
    (ModelKind::Sway, ModelKind::Drift),
];

/// Which question a binomial test answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonKind {
    /// Are a model's errors positive half the time? For Idle the errors are
    /// the raw returns, so this is the directional bias of the market.
    SignBias {
        /// Model whose errors are counted
        model: ModelKind,
    },
    /// Is `better`'s absolute error smaller than `worse`'s more than half the time?
    Superiority {
        /// Candidate with the smaller errors
        better: ModelKind,
        /// Model it is measured against
        worse: ModelKind,
    },
    /// Does the subject month rise as often as the reference month does?
    SeasonalIndependent {
        /// Month under test
        subject: Month,
        /// Month supplying the null up-rate
        reference: Month,
    },
    /// Does the subject month beat the reference month in the same year more
    /// than half the time?
    SeasonalPaired {
        /// Month under test
        subject: Month,
        /// Month it is compared against
        reference: Month,
    },
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonKind::SignBias { model } => write!(f, "{model} sign bias"),
            ComparisonKind::Superiority { better, worse } => write!(f, "{better} beats {worse}"),
            ComparisonKind::SeasonalIndependent { subject, reference } => {
                write!(f, "{} vs {} up-rate", subject.name(), reference.name())
            }
            ComparisonKind::SeasonalPaired { subject, reference } => {
                write!(f, "{} beats {} by year", subject.name(), reference.name())
            }
        }
    }
}

/// One row of the comparison table
///
/// A failed test keeps its error here; the other tests are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// The question asked
    pub kind: ComparisonKind,
    /// The test result, or why the test could not run
    pub outcome: Result<TestResult>,
}

/// Counts the items matching a predicate
pub fn count_where<T>(items: impl IntoIterator<Item = T>, predicate: impl Fn(&T) -> bool) -> usize {
    items.into_iter().filter(|item| predicate(item)).count()
}

/// Two-sided test that errors are positive half the time
///
/// # Arguments
///
/// * `errors` - A model's error vector
/// * `confidence_level` - Coverage of the interval
///
/// # Returns
///
/// * `Result<TestResult>` - The test result
pub fn sign_bias(errors: &[f64], confidence_level: f64) -> Result<TestResult> {
    let k = count_where(errors, |e| **e > 0.0);
    BinomialTest::new(k, errors.len(), 0.5)
        .set_confidence_level(confidence_level)
        .run()
}

/// One-sided test that model A's absolute error is smaller than model B's
/// more than half the time
///
/// Ties count against A. The two vectors must pair up one to one.
///
/// # Arguments
///
/// * `errors_a` - Error vector of the candidate
/// * `errors_b` - Error vector of the model it is measured against
/// * `alternative` - `Greater` for "A wins", `Less` for "A loses"
/// * `confidence_level` - Coverage of the interval
///
/// # Returns
///
/// * `Result<TestResult>` - The test result, or `Domain` if the vectors
///   differ in length
///
/// # Examples
///
/// ```
/// # use ta_seasonality::{superiority, Alternative};
/// # use assert_approx_eq::assert_approx_eq;
/// let a = [0.1, -0.2, 0.3, 0.1, -0.1];
/// let b = [1.0, 1.0, -1.0, 1.0, -1.0];
/// let result = superiority(&a, &b, Alternative::Greater, 0.95).unwrap();
/// assert_eq!(result.successes, 5);
/// assert_approx_eq!(result.p_value, 0.03125);
/// ```
pub fn superiority(
    errors_a: &[f64],
    errors_b: &[f64],
    alternative: Alternative,
    confidence_level: f64,
) -> Result<TestResult> {
    let k = count_where(errors_a.iter().zip(errors_b), |(a, b)| a.abs() < b.abs());
    if errors_a.len() != errors_b.len() {
        return Err(Error::Domain {
            successes: k,
            trials: errors_a.len(),
            p0: 0.5,
            reason: format!(
                "error vectors differ in length ({} vs {})",
                errors_a.len(),
                errors_b.len()
            ),
        });
    }
    BinomialTest::new(k, errors_a.len(), 0.5)
        .set_alternative(alternative)
        .set_confidence_level(confidence_level)
        .run()
}

/// Two-sided test of the subject month's up-rate against the reference month's
///
/// The reference month's share of positive years is the null proportion for
/// the subject month's count of positive years. A reference month that rose
/// in every year, or in none, leaves no valid null proportion and yields a
/// `Domain` error.
///
/// # Arguments
///
/// * `matrix` - Returns by year and month
/// * `pair` - Subject and reference months
/// * `confidence_level` - Coverage of the interval
///
/// # Returns
///
/// * `Result<TestResult>` - The test result
pub fn seasonal_independent(
    matrix: &MonthMatrix,
    pair: SeasonalPair,
    confidence_level: f64,
) -> Result<TestResult> {
    let years = matrix.rows();
    let up = matrix.up_counts();
    let k_subject = up[matrix.column_for(pair.subject)];
    let k_reference = up[matrix.column_for(pair.reference)];
    let p0 = k_reference as f64 / years as f64;

    BinomialTest::new(k_subject, years, p0)
        .set_confidence_level(confidence_level)
        .run()
}

/// One-sided test that the subject month beats the reference month in the
/// same year more than half the time
///
/// # Arguments
///
/// * `matrix` - Returns by year and month
/// * `pair` - Subject and reference months
/// * `confidence_level` - Coverage of the interval
///
/// # Returns
///
/// * `Result<TestResult>` - The test result
pub fn seasonal_paired(
    matrix: &MonthMatrix,
    pair: SeasonalPair,
    confidence_level: f64,
) -> Result<TestResult> {
    let subject = matrix.column_for(pair.subject);
    let reference = matrix.column_for(pair.reference);
    let wins = count_where(0..matrix.rows(), |row| {
        let cells = (matrix.get(*row, subject), matrix.get(*row, reference));
        matches!(cells, (Some(s), Some(r)) if s > r)
    });

    BinomialTest::new(wins, matrix.rows(), 0.5)
        .set_alternative(Alternative::Greater)
        .set_confidence_level(confidence_level)
        .run()
}

/// The full battery of binomial tests over fitted models and a month matrix
///
/// Every test reads only the shared error vectors and matrix, so the order
/// they run in does not matter and one failing test leaves the rest intact.
#[derive(Debug, Clone, Copy)]
pub struct ComparisonSuite<'a> {
    models: &'a ModelSet,
    matrix: &'a MonthMatrix,
    config: &'a AnalysisConfig,
}

impl<'a> ComparisonSuite<'a> {
    /// Creates the suite
    pub const fn new(
        models: &'a ModelSet,
        matrix: &'a MonthMatrix,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            models,
            matrix,
            config,
        }
    }

    /// Runs every test
    ///
    /// # Returns
    ///
    /// * `Vec<Comparison>` - Three sign-bias tests (Idle, Drift, Sway), three
    ///   superiority tests, the independent and the paired seasonal test
    pub fn run(&self) -> Vec<Comparison> {
        let level = self.config.confidence_level();
        let pair = self.config.seasonal();

        let mut comparisons = Vec::with_capacity(8);

        for model in ModelKind::ALL {
            comparisons.push(self.record(
                ComparisonKind::SignBias { model },
                sign_bias(self.models.errors(model), level),
            ));
        }

        for (better, worse) in SUPERIORITY_PAIRS {
            comparisons.push(self.record(
                ComparisonKind::Superiority { better, worse },
                superiority(
                    self.models.errors(better),
                    self.models.errors(worse),
                    Alternative::Greater,
                    level,
                ),
            ));
        }

        comparisons.push(self.record(
            ComparisonKind::SeasonalIndependent {
                subject: pair.subject,
                reference: pair.reference,
            },
            seasonal_independent(self.matrix, pair, level),
        ));
        comparisons.push(self.record(
            ComparisonKind::SeasonalPaired {
                subject: pair.subject,
                reference: pair.reference,
            },
            seasonal_paired(self.matrix, pair, level),
        ));

        comparisons
    }

    fn record(&self, kind: ComparisonKind, outcome: Result<TestResult>) -> Comparison {
        match &outcome {
            Ok(result) => debug!(
                comparison = %kind,
                successes = result.successes,
                trials = result.trials,
                p_value = result.p_value,
                "binomial test"
            ),
            Err(err) => warn!(comparison = %kind, error = %err, "binomial test skipped"),
        }
        Comparison { kind, outcome }
    }
}
