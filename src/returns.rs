use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Relative slack allowed between a stored return and one recomputed from its closes
const RETURN_TOLERANCE: f64 = 1e-9;

/// A single monthly close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Date the close belongs to
    pub date: NaiveDate,
    /// Closing price, `NaN` marks a missing close
    pub close: f64,
}

impl PriceObservation {
    /// Creates a new observation
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Percent change between two adjacent closes
///
/// # Arguments
///
/// * `prior` - Close at the start of the period
/// * `next` - Close at the end of the period
///
/// # Returns
///
/// * `f64` - `100 * (next - prior) / prior`
///
/// # Examples
///
/// ```
/// # use ta_seasonality::percent_change;
/// # use assert_approx_eq::assert_approx_eq;
/// assert_approx_eq!(percent_change(100.0, 121.0), 21.0);
/// assert_approx_eq!(percent_change(50.0, 45.0), -10.0);
/// ```
#[inline]
pub fn percent_change(prior: f64, next: f64) -> f64 {
    100.0 * (next - prior) / prior
}

/// The return over one month, dated at the start of the period
///
/// Deserializing checks both closes and that `return_pct` matches them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReturnRecord")]
pub struct ReturnRecord {
    /// Date of the close the period starts from
    pub date: NaiveDate,
    /// Close at the start of the period
    pub prior_close: f64,
    /// Close at the end of the period
    pub next_close: f64,
    /// Percent return over the period
    pub return_pct: f64,
}

impl ReturnRecord {
    /// Creates a record, deriving the percent return from the two closes
    pub fn new(date: NaiveDate, prior_close: f64, next_close: f64) -> Self {
        Self {
            date,
            prior_close,
            next_close,
            return_pct: percent_change(prior_close, next_close),
        }
    }

    /// Recomputes the percent return from the stored closes
    pub fn recompute(&self) -> f64 {
        percent_change(self.prior_close, self.next_close)
    }

    /// Checks the closes and the stored return
    ///
    /// `index` is the position of `prior_close` in the price series, so the
    /// next close is reported at `index + 1`.
    fn validate(&self, index: usize) -> Result<()> {
        validate_close(index, self.prior_close)?;
        validate_close(index + 1, self.next_close)?;

        let expected = self.recompute();
        if (self.return_pct - expected).abs() > RETURN_TOLERANCE * expected.abs().max(1.0) {
            return Err(Error::Data {
                index,
                value: self.return_pct,
                reason: "return does not match closes",
            });
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawReturnRecord {
    date: NaiveDate,
    prior_close: f64,
    next_close: f64,
    return_pct: f64,
}

impl RawReturnRecord {
    const fn unchecked(self) -> ReturnRecord {
        ReturnRecord {
            date: self.date,
            prior_close: self.prior_close,
            next_close: self.next_close,
            return_pct: self.return_pct,
        }
    }
}

impl TryFrom<RawReturnRecord> for ReturnRecord {
    type Error = Error;

    fn try_from(raw: RawReturnRecord) -> Result<Self> {
        let record = raw.unchecked();
        record.validate(0)?;
        Ok(record)
    }
}

/// Ordered percent returns derived from a monthly close series
///
/// One record per adjacent pair of closes, so `len - 1` records for `len`
/// prices. The series is immutable once built and never empty. Deserializing
/// runs the same checks as [`ReturnSeries::from_prices`] and also requires
/// each record to start from the close the previous one ended on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawReturnSeries")]
pub struct ReturnSeries {
    records: Vec<ReturnRecord>,
}

#[derive(Deserialize)]
struct RawReturnSeries {
    records: Vec<RawReturnRecord>,
}

impl TryFrom<RawReturnSeries> for ReturnSeries {
    type Error = Error;

    fn try_from(series: RawReturnSeries) -> Result<Self> {
        if series.records.is_empty() {
            return Err(Error::InsufficientData { len: 0 });
        }

        let mut records: Vec<ReturnRecord> = Vec::with_capacity(series.records.len());
        for (index, raw) in series.records.into_iter().enumerate() {
            let record = raw.unchecked();
            record.validate(index)?;
            if records
                .last()
                .is_some_and(|previous| previous.next_close != record.prior_close)
            {
                return Err(Error::Data {
                    index,
                    value: record.prior_close,
                    reason: "close does not continue the previous record",
                });
            }
            records.push(record);
        }
        Ok(Self { records })
    }
}

impl ReturnSeries {
    /// Builds the return series from an ordered price series
    ///
    /// Every close is validated before any return is formed, and the first
    /// offending observation is reported with its index and value.
    ///
    /// # Arguments
    ///
    /// * `prices` - Monthly closes in chronological order
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The returns, `InsufficientData` for fewer than two
    ///   prices, or `Data` for a missing, non-finite or non-positive close
    ///
    /// # Examples
    ///
    /// ```
    /// # use ta_seasonality::{PriceObservation, ReturnSeries};
    /// # use chrono::NaiveDate;
    /// # use assert_approx_eq::assert_approx_eq;
    /// let prices = [100.0, 110.0, 99.0]
    ///     .iter()
    ///     .enumerate()
    ///     .map(|(i, close)| {
    ///         let date = NaiveDate::from_ymd_opt(2020, i as u32 + 1, 1).unwrap();
    ///         PriceObservation::new(date, *close)
    ///     })
    ///     .collect::<Vec<_>>();
    ///
    /// let returns = ReturnSeries::from_prices(&prices).unwrap();
    /// assert_eq!(returns.len(), 2);
    /// assert_approx_eq!(returns.values()[0], 10.0);
    /// assert_approx_eq!(returns.values()[1], -10.0);
    /// ```
    pub fn from_prices(prices: &[PriceObservation]) -> Result<Self> {
        if prices.len() < 2 {
            return Err(Error::InsufficientData { len: prices.len() });
        }

        for (index, obs) in prices.iter().enumerate() {
            validate_close(index, obs.close)?;
        }

        let records = prices
            .windows(2)
            .map(|pair| ReturnRecord::new(pair[0].date, pair[0].close, pair[1].close))
            .collect();

        Ok(Self { records })
    }

    /// Returns the number of returns
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns the records in chronological order
    pub fn records(&self) -> &[ReturnRecord] {
        &self.records
    }

    /// Returns the percent returns in chronological order
    pub fn values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.return_pct).collect()
    }

    /// Returns the close the first return starts from
    pub fn first_close(&self) -> f64 {
        self.records[0].prior_close
    }

    /// Returns the close the last return ends on
    pub fn last_close(&self) -> f64 {
        self.records[self.records.len() - 1].next_close
    }

    /// Returns the date of the first return
    pub fn start_date(&self) -> NaiveDate {
        self.records[0].date
    }
}

fn validate_close(index: usize, value: f64) -> Result<()> {
    let reason = if value.is_nan() {
        "close is missing"
    } else if !value.is_finite() {
        "close is not finite"
    } else if value <= 0.0 {
        "close must be positive"
    } else {
        return Ok(());
    };
    Err(Error::Data {
        index,
        value,
        reason,
    })
}
