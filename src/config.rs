use chrono::Month;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Two calendar months compared by the seasonal tests
///
/// The independent test uses the reference month's up-rate as the null
/// proportion for the subject month. The paired test counts the years in which
/// the subject month beat the reference month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalPair {
    /// Month under test
    pub subject: Month,
    /// Month it is compared against
    pub reference: Month,
}

impl Default for SeasonalPair {
    fn default() -> Self {
        Self {
            subject: Month::October,
            reference: Month::August,
        }
    }
}

/// Settings for a full analysis run
///
/// Deserializes with defaults for every missing field.
///
/// # Examples
///
/// ```
/// # use ta_seasonality::AnalysisConfig;
/// # use chrono::Month;
/// let mut config = AnalysisConfig::default();
/// config.set_ddof(false).set_confidence_level(0.9);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.seasonal().subject, Month::October);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Coverage of every Clopper-Pearson interval
    confidence_level: f64,
    /// Sample (`true`) or population (`false`) variance for every model
    ddof: bool,
    /// Months compared by the seasonal tests
    seasonal: SeasonalPair,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            ddof: true,
            seasonal: SeasonalPair::default(),
        }
    }
}

impl AnalysisConfig {
    /// Returns the confidence level
    pub const fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Sets the confidence level
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The config
    pub const fn set_confidence_level(&mut self, confidence_level: f64) -> &mut Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Returns the Delta Degrees of Freedom
    pub const fn ddof(&self) -> bool {
        self.ddof
    }

    /// Sets the Delta Degrees of Freedom
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The config
    pub const fn set_ddof(&mut self, ddof: bool) -> &mut Self {
        self.ddof = ddof;
        self
    }

    /// Returns the months compared by the seasonal tests
    pub const fn seasonal(&self) -> SeasonalPair {
        self.seasonal
    }

    /// Sets the months compared by the seasonal tests
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The config
    pub const fn set_seasonal(&mut self, subject: Month, reference: Month) -> &mut Self {
        self.seasonal = SeasonalPair { subject, reference };
        self
    }

    /// Checks the settings
    ///
    /// # Returns
    ///
    /// * `Result<()>` - `Config` if the confidence level is outside `(0, 1)`
    ///   or both seasonal months are the same
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(Error::Config {
                reason: format!(
                    "confidence level must lie in (0, 1), got {}",
                    self.confidence_level
                ),
            });
        }
        if self.seasonal.subject == self.seasonal.reference {
            return Err(Error::Config {
                reason: format!(
                    "seasonal months must differ, both are {}",
                    self.seasonal.subject.name()
                ),
            });
        }
        Ok(())
    }
}
