//! Feature engineering for the carbon-intensity regressor.
//!
//! Calendar fields come from the requested timestamp. Lag and rolling
//! fields always come from the *latest* rows of the history, whatever
//! timestamp was requested.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::ServiceError;
use crate::history::HistoricalSeries;

pub const N_FEATURES: usize = 11;

/// Authoritative input order expected by the regressor.
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "hour",
    "day_of_week",
    "month",
    "ci_lag_1",
    "ci_lag_2",
    "ci_lag_3",
    "ci_lag_6",
    "ci_lag_12",
    "ci_lag_24",
    "ci_roll_6",
    "ci_roll_24",
];

pub const LAGS: [usize; 6] = [1, 2, 3, 6, 12, 24];
pub const ROLLING_WINDOWS: [usize; 2] = [6, 24];

/// Shortest history that can fill every lag and rolling window.
pub const MIN_HISTORY: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn new(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }

    pub fn build(at: NaiveDateTime, history: &HistoricalSeries) -> Result<Self, ServiceError> {
        let insufficient = || ServiceError::InsufficientHistory {
            required: MIN_HISTORY,
            available: history.len(),
        };
        if history.len() < MIN_HISTORY {
            return Err(insufficient());
        }

        let mut values = [0.0; N_FEATURES];
        values[0] = at.hour() as f64;
        values[1] = at.weekday().num_days_from_monday() as f64;
        values[2] = at.month() as f64;

        for (slot, k) in values[3..9].iter_mut().zip(LAGS) {
            *slot = history.lag(k).ok_or_else(insufficient)?;
        }
        for (slot, n) in values[9..].iter_mut().zip(ROLLING_WINDOWS) {
            *slot = history.rolling_mean(n).ok_or_else(insufficient)?;
        }

        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// `name=value` pairs, for debug logging.
    pub fn describe(&self) -> String {
        FEATURE_NAMES
            .iter()
            .zip(self.0.iter())
            .map(|(name, v)| format!("{}={:.3}", name, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
