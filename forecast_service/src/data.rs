//! Price history handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Daily price observations for a single crop, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Crop identifier the prices belong to
    crop: String,
    /// One price per observation
    prices: Vec<f64>,
    /// Date of each observation, when known
    dates: Option<Vec<NaiveDate>>,
}

impl PriceSeries {
    /// Create a new series from daily prices
    pub fn new(crop: impl Into<String>, prices: Vec<f64>) -> Result<Self> {
        if prices.is_empty() {
            return Err(ForecastError::DataError(
                "Price series must contain at least one observation".to_string(),
            ));
        }

        if let Some(pos) = prices.iter().position(|p| !p.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Price at position {} is not a finite number",
                pos
            )));
        }

        Ok(Self {
            crop: crop.into(),
            prices,
            dates: None,
        })
    }

    /// Date the observations on consecutive days starting at `date`
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        let dates: Option<Vec<NaiveDate>> = (0..self.prices.len() as u64)
            .map(|offset| date.checked_add_days(Days::new(offset)))
            .collect();
        self.dates = dates;
        self
    }

    /// Attach the date of every observation; dates must be strictly increasing
    pub fn with_dates(mut self, dates: Vec<NaiveDate>) -> Result<Self> {
        if dates.len() != self.prices.len() {
            return Err(ForecastError::ValidationError(format!(
                "Dates length ({}) doesn't match prices length ({})",
                dates.len(),
                self.prices.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(ForecastError::DataError(format!(
                "Observation dates out of order: {} is not before {}",
                pair[0], pair[1]
            )));
        }

        self.dates = Some(dates);
        Ok(self)
    }

    /// Crop identifier
    pub fn crop(&self) -> &str {
        &self.crop
    }

    /// Prices, oldest first
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Observation dates, when known
    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the series is empty (never true for a constructed series)
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Date of the first observation
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.first().copied())
    }

    /// Date of the most recent observation
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.as_ref().and_then(|d| d.last().copied())
    }

    /// Most recent price
    pub fn last_price(&self) -> f64 {
        self.prices[self.prices.len() - 1]
    }

    /// The last `days` observations (or the whole series if shorter)
    pub fn tail(&self, days: usize) -> Self {
        if days >= self.prices.len() || days == 0 {
            return self.clone();
        }

        let skip = self.prices.len() - days;
        Self {
            crop: self.crop.clone(),
            prices: self.prices[skip..].to_vec(),
            dates: self.dates.as_ref().map(|d| d[skip..].to_vec()),
        }
    }
}

/// A single row of a price history CSV file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceRecord {
    /// Observation date (`YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Crop identifier
    pub crop: String,
    /// Observed price
    pub price: f64,
}

/// Loader for price history files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load price records from a CSV file with a `date,crop,price` header
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<PriceRecord>> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load price records from any reader producing CSV text
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<PriceRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in csv_reader.deserialize() {
            let record: PriceRecord = row?;
            if !record.price.is_finite() {
                return Err(ForecastError::DataError(format!(
                    "Non-finite price for {} on {}",
                    record.crop, record.date
                )));
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(ForecastError::DataError(
                "Price file contains no records".to_string(),
            ));
        }

        Ok(records)
    }

    /// Group records by crop (case-insensitive) into date-ordered series.
    ///
    /// When a crop has several rows for the same date, the row appearing
    /// last in the file wins.
    pub fn group_by_crop(records: Vec<PriceRecord>) -> HashMap<String, Vec<(NaiveDate, f64)>> {
        let mut by_date: HashMap<String, BTreeMap<NaiveDate, f64>> = HashMap::new();
        for record in records {
            by_date
                .entry(normalize_crop(&record.crop))
                .or_default()
                .insert(record.date, record.price);
        }

        by_date
            .into_iter()
            .map(|(crop, observations)| (crop, observations.into_iter().collect()))
            .collect()
    }
}

/// Canonical lookup key for a crop identifier
pub fn normalize_crop(crop: &str) -> String {
    crop.trim().to_lowercase()
}
