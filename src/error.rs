use serde::Serialize;
use thiserror::Error;

/// Errors raised while turning a price series into model comparisons
///
/// `Data` and `Shape` abort the whole pipeline. `Domain` is scoped to a single
/// binomial test and is stored in the results table next to the tests that
/// did succeed.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum Error {
    /// A close price cannot produce a percent return
    #[error("invalid close price at index {index}: {value} ({reason})")]
    Data {
        /// Position of the offending observation in the input series
        index: usize,
        /// The offending close price
        value: f64,
        /// What is wrong with the value
        reason: &'static str,
    },
    /// Fewer than two prices, so no return can be formed
    #[error("at least two prices are required, got {len}")]
    InsufficientData {
        /// Number of prices supplied
        len: usize,
    },
    /// The return count does not span a whole number of years
    #[error("cannot reshape {len} returns into a year x 12 matrix")]
    Shape {
        /// Number of returns supplied to the reshaper
        len: usize,
    },
    /// Invalid parameters for an exact binomial test
    #[error("invalid binomial test: k = {successes}, m = {trials}, p0 = {p0} ({reason})")]
    Domain {
        /// Number of successes
        successes: usize,
        /// Number of trials
        trials: usize,
        /// Hypothesized success probability
        p0: f64,
        /// What is wrong with the parameters
        reason: String,
    },
    /// Invalid analysis configuration
    #[error("invalid configuration: {reason}")]
    Config {
        /// What is wrong with the configuration
        reason: String,
    },
}

/// Crate result alias
pub type Result<T> = core::result::Result<T, Error>;
