#![doc = include_str!("../README.md")]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::just_underscores_and_digits, clippy::len_without_is_empty)]

pub(crate) type Kbn<T> = compensated_summation::KahanBabuskaNeumaier<T>;

mod utils;
pub(crate) use utils::helper;

mod error;
pub use error::{Error, Result};

mod returns;
pub use returns::{PriceObservation, ReturnRecord, ReturnSeries, percent_change};

mod month_matrix;
pub use month_matrix::{BoxSummary, MONTHS, MonthMatrix};

mod models;
pub use models::{Model, ModelKind, ModelSet, drift_rate};

mod metrics;
pub use metrics::ErrorMetrics;

mod binomial;
pub use binomial::{Alternative, BinomialTest, TestResult};

mod config;
pub use config::{AnalysisConfig, SeasonalPair};

mod comparison;
pub use comparison::{
    Comparison, ComparisonKind, ComparisonSuite, SUPERIORITY_PAIRS, count_where,
    seasonal_independent, seasonal_paired, sign_bias, superiority,
};

mod analysis;
pub use analysis::{Analysis, Report};
