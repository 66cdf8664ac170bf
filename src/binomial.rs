use core::fmt;

use serde::{Deserialize, Serialize};
use statrs::{
    distribution::{Binomial, Discrete, DiscreteCDF},
    function::beta::inv_beta_reg,
};

use crate::{Error, Kbn, Result};

/// Relative tolerance when matching outcome probabilities in the two-sided test
const RELATIVE_TOLERANCE: f64 = 1.0 + 1e-7;

/// Direction of the alternative hypothesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    /// The true proportion differs from `p0`
    TwoSided,
    /// The true proportion exceeds `p0`
    Greater,
    /// The true proportion is below `p0`
    Less,
}

impl Alternative {
    /// Returns the alternative pointing the other way, two-sided stays two-sided
    pub const fn flip(&self) -> Self {
        match self {
            Alternative::TwoSided => Alternative::TwoSided,
            Alternative::Greater => Alternative::Less,
            Alternative::Less => Alternative::Greater,
        }
    }
}

impl fmt::Display for Alternative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Alternative::TwoSided => "two-sided",
            Alternative::Greater => "greater",
            Alternative::Less => "less",
        })
    }
}

/// Outcome of an exact binomial test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    /// Observed successes
    pub successes: usize,
    /// Number of trials
    pub trials: usize,
    /// Proportion under the null hypothesis
    pub hypothesized_p: f64,
    /// Direction of the alternative
    pub alternative: Alternative,
    /// Observed proportion `successes / trials`
    pub estimate: f64,
    /// Exact p-value
    pub p_value: f64,
    /// Clopper-Pearson interval for the true proportion
    pub confidence_interval: (f64, f64),
    /// Coverage of the interval
    pub confidence_level: f64,
}

impl TestResult {
    /// Returns `true` if the p-value is below `alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Exact test of a proportion against a hypothesized value
///
/// The null distribution is `Binomial(trials, p0)`. The confidence interval is
/// the Clopper-Pearson interval, one-sided for one-sided alternatives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinomialTest {
    successes: usize,
    trials: usize,
    p0: f64,
    alternative: Alternative,
    confidence_level: f64,
}

impl BinomialTest {
    /// Creates a two-sided test at the 95% confidence level
    ///
    /// # Arguments
    ///
    /// * `successes` - Observed successes
    /// * `trials` - Number of trials
    /// * `p0` - Hypothesized success probability
    ///
    /// # Returns
    ///
    /// * `Self` - The test, parameters are checked by [`BinomialTest::run`]
    pub const fn new(successes: usize, trials: usize, p0: f64) -> Self {
        Self {
            successes,
            trials,
            p0,
            alternative: Alternative::TwoSided,
            confidence_level: 0.95,
        }
    }

    /// Sets the alternative hypothesis
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The test
    pub const fn set_alternative(&mut self, alternative: Alternative) -> &mut Self {
        self.alternative = alternative;
        self
    }

    /// Sets the confidence level of the interval
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The test
    pub const fn set_confidence_level(&mut self, confidence_level: f64) -> &mut Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Runs the test
    ///
    /// - `greater`: `P(X >= k)`
    /// - `less`: `P(X <= k)`
    /// - `two-sided`: the sum of `P(X = x)` over every outcome no more likely
    ///   than the observed one, capped at 1
    ///
    /// # Returns
    ///
    /// * `Result<TestResult>` - The result, or `Domain` if `trials` is zero,
    ///   `successes` exceeds `trials`, or `p0` or the confidence level lie
    ///   outside `(0, 1)`
    ///
    /// # Examples
    ///
    /// ```
    /// # use ta_seasonality::{Alternative, BinomialTest};
    /// # use assert_approx_eq::assert_approx_eq;
    /// let result = BinomialTest::new(6, 10, 0.5).run().unwrap();
    /// assert_approx_eq!(result.p_value, 0.75390625);
    ///
    /// let result = BinomialTest::new(5, 5, 0.5)
    ///     .set_alternative(Alternative::Greater)
    ///     .run()
    ///     .unwrap();
    /// assert_approx_eq!(result.p_value, 0.03125);
    /// assert_eq!(result.confidence_interval.1, 1.0);
    /// ```
    pub fn run(&self) -> Result<TestResult> {
        self.validate()?;

        let k = self.successes as u64;
        let m = self.trials as u64;
        let null = Binomial::new(self.p0, m).map_err(|e| self.domain(e.to_string()))?;

        let p_value = match self.alternative {
            Alternative::Greater if k == 0 => 1.0,
            Alternative::Greater => null.sf(k - 1),
            Alternative::Less if k == m => 1.0,
            Alternative::Less => null.cdf(k),
            Alternative::TwoSided => {
                let observed = null.pmf(k) * RELATIVE_TOLERANCE;
                let mut total = Kbn::<f64>::default();
                for x in 0..=m {
                    let p = null.pmf(x);
                    if p <= observed {
                        total += p;
                    }
                }
                total.total()
            }
        }
        .min(1.0);

        let confidence_interval = self.clopper_pearson();

        Ok(TestResult {
            successes: self.successes,
            trials: self.trials,
            hypothesized_p: self.p0,
            alternative: self.alternative,
            estimate: self.successes as f64 / self.trials as f64,
            p_value,
            confidence_interval,
            confidence_level: self.confidence_level,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(self.domain("trials must be positive"));
        }
        if self.successes > self.trials {
            return Err(self.domain("successes exceed trials"));
        }
        if !(self.p0 > 0.0 && self.p0 < 1.0) {
            return Err(self.domain("p0 must lie in (0, 1)"));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(self.domain("confidence level must lie in (0, 1)"));
        }
        Ok(())
    }

    fn clopper_pearson(&self) -> (f64, f64) {
        let alpha = 1.0 - self.confidence_level;
        let k = self.successes as f64;
        let m = self.trials as f64;

        let lower = |tail: f64| {
            if self.successes == 0 {
                0.0
            } else {
                inv_beta_reg(k, m - k + 1.0, tail)
            }
        };
        let upper = |tail: f64| {
            if self.successes == self.trials {
                1.0
            } else {
                inv_beta_reg(k + 1.0, m - k, 1.0 - tail)
            }
        };

        match self.alternative {
            Alternative::TwoSided => (lower(alpha / 2.0), upper(alpha / 2.0)),
            Alternative::Greater => (lower(alpha), 1.0),
            Alternative::Less => (0.0, upper(alpha)),
        }
    }

    fn domain(&self, reason: impl Into<String>) -> Error {
        Error::Domain {
            successes: self.successes,
            trials: self.trials,
            p0: self.p0,
            reason: reason.into(),
        }
    }
}
