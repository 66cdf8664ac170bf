use chrono::{Datelike, Month};
use serde::Serialize;

use crate::{
    Error, Result, ReturnSeries,
    helper::{five_number_summary, median_from_sorted_slice, sorted_copy},
};

/// Number of columns, one per calendar month
pub const MONTHS: usize = 12;

/// Returns arranged as one row per year and one column per month
///
/// The i-th return lands at row `i / 12`, column `i % 12`. Column 0 holds the
/// calendar month of the first return, so columns line up with January to
/// December only when the series starts in January. Use
/// [`MonthMatrix::column_for`] to find the column of a calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthMatrix {
    /// Number of years
    rows: usize,
    /// Calendar month of column 0
    start: Month,
    /// Row-major returns
    data: Vec<f64>,
}

/// Box-plot summary of one calendar month's returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxSummary {
    /// Calendar month of the column
    pub month: Month,
    /// Smallest return
    pub min: f64,
    /// Lower hinge
    pub lower_hinge: f64,
    /// Median return
    pub median: f64,
    /// Upper hinge
    pub upper_hinge: f64,
    /// Largest return
    pub max: f64,
}

impl MonthMatrix {
    /// Reshapes a return series into a year x 12 matrix
    ///
    /// # Arguments
    ///
    /// * `returns` - The return series, its length must be a multiple of 12
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The matrix, or `Shape` if the series does not span a
    ///   whole number of years
    pub fn reshape(returns: &ReturnSeries) -> Result<Self> {
        let offset = returns.start_date().month0();
        let start = (0..offset).fold(Month::January, |month, _| month.succ());
        Self::from_values(&returns.values(), start)
    }

    /// Reshapes raw returns into a year x 12 matrix
    ///
    /// # Arguments
    ///
    /// * `values` - Returns in chronological order
    /// * `start` - Calendar month of the first return
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - The matrix, or `Shape` for an empty input or a
    ///   length that is not a multiple of 12. The remainder is never dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// # use ta_seasonality::{Error, MonthMatrix};
    /// # use chrono::Month;
    /// let values: Vec<f64> = (0..24).map(f64::from).collect();
    /// let matrix = MonthMatrix::from_values(&values, Month::January).unwrap();
    /// assert_eq!(matrix.rows(), 2);
    /// assert_eq!(matrix.get(1, 3), Some(15.0));
    ///
    /// let err = MonthMatrix::from_values(&values[..13], Month::January);
    /// assert_eq!(err, Err(Error::Shape { len: 13 }));
    /// ```
    pub fn from_values(values: &[f64], start: Month) -> Result<Self> {
        let len = values.len();
        if len == 0 || len % MONTHS != 0 {
            return Err(Error::Shape { len });
        }
        Ok(Self {
            rows: len / MONTHS,
            start,
            data: values.to_vec(),
        })
    }

    /// Returns the number of years
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the calendar month of column 0
    pub const fn start(&self) -> Month {
        self.start
    }

    /// Returns the return at a year and column
    ///
    /// # Returns
    ///
    /// * `Option<f64>` - The return, or `None` if `row` or `col` is out of range
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.row(row)?.get(col).copied()
    }

    /// Returns one year of returns
    ///
    /// # Returns
    ///
    /// * `Option<&[f64]>` - The twelve returns, or `None` if `row` is out of range
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        self.data.chunks_exact(MONTHS).nth(row)
    }

    /// Returns one column across all years
    ///
    /// # Returns
    ///
    /// * `Option<Vec<f64>>` - The column, or `None` if `col` is out of range
    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        if col >= MONTHS {
            return None;
        }
        let column = self.data.iter().skip(col).step_by(MONTHS);
        Some(column.copied().collect())
    }

    /// Returns the returns in row-major order, identical to the input series
    pub fn flatten(&self) -> &[f64] {
        &self.data
    }

    /// Returns the column a calendar month occupies
    pub fn column_for(&self, month: Month) -> usize {
        let offset = month.number_from_month() + MONTHS as u32 - self.start.number_from_month();
        offset as usize % MONTHS
    }

    /// Returns the calendar month of a column
    pub fn column_month(&self, col: usize) -> Month {
        (0..col % MONTHS).fold(self.start, |month, _| month.succ())
    }

    /// Returns, per column, the number of years with a positive return
    pub fn up_counts(&self) -> [usize; MONTHS] {
        let mut counts = [0; MONTHS];
        for (i, value) in self.data.iter().enumerate() {
            if *value > 0.0 {
                counts[i % MONTHS] += 1;
            }
        }
        counts
    }

    /// Returns the median of every column
    pub fn medians(&self) -> [f64; MONTHS] {
        let mut medians = [0.0; MONTHS];
        for (col, median) in medians.iter_mut().enumerate() {
            *median = self
                .column(col)
                .and_then(|column| median_from_sorted_slice(&sorted_copy(&column)))
                .unwrap_or(f64::NAN);
        }
        medians
    }

    /// Returns the box-plot summary of every column
    pub fn box_summaries(&self) -> Vec<BoxSummary> {
        (0..MONTHS)
            .filter_map(|col| {
                let sorted = sorted_copy(&self.column(col)?);
                five_number_summary(&sorted).map(|[min, lower_hinge, median, upper_hinge, max]| {
                    BoxSummary {
                        month: self.column_month(col),
                        min,
                        lower_hinge,
                        median,
                        upper_hinge,
                        max,
                    }
                })
            })
            .collect()
    }
}
