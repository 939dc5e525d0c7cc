//! Utility functions for the forecast_service crate

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};

/// Calendar days following `last_date`, one per forecast step
pub fn future_dates(last_date: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    (1..=horizon as u64)
        .map(|offset| {
            last_date.checked_add_days(Days::new(offset)).ok_or_else(|| {
                ForecastError::ValidationError(format!(
                    "Forecast date {} days after {} is out of range",
                    offset, last_date
                ))
            })
        })
        .collect()
}
