//! Price history providers
//!
//! A [`PriceProvider`] supplies the recent price history the forecast is
//! fitted on. The random provider is a development placeholder; the CSV
//! provider reads a real feed exported to disk.

use crate::data::{normalize_crop, DataLoader, PriceSeries};
use crate::error::{ForecastError, Result};
use chrono::{Days, NaiveDate, Utc};
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;

/// Source of historical daily prices for a crop
pub trait PriceProvider: Debug + Send + Sync {
    /// Return up to `days` of the most recent daily prices for `crop`
    fn history(&self, crop: &str, days: usize) -> Result<PriceSeries>;

    /// Name of the provider
    fn name(&self) -> &str;
}

/// Uniformly random prices, standing in for a real market feed
#[derive(Debug, Clone)]
pub struct RandomPriceProvider {
    low: f64,
    high: f64,
    seed: Option<u64>,
}

impl Default for RandomPriceProvider {
    fn default() -> Self {
        Self {
            low: 10.0,
            high: 100.0,
            seed: None,
        }
    }
}

impl RandomPriceProvider {
    /// Prices drawn from `[10, 100)` with a fresh seed per request
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices drawn from `[low, high)`
    pub fn with_range(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(ForecastError::InvalidParameter(format!(
                "Price range [{}, {}) is empty or not finite",
                low, high
            )));
        }
        Ok(Self {
            low,
            high,
            seed: None,
        })
    }

    /// Make every draw reproducible. The crop identifier is mixed into the
    /// seed so different crops still get different series.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng_for(&self, crop: &str) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ fnv1a(normalize_crop(crop).as_bytes())),
            None => StdRng::from_entropy(),
        }
    }
}

impl PriceProvider for RandomPriceProvider {
    fn history(&self, crop: &str, days: usize) -> Result<PriceSeries> {
        if days == 0 {
            return Err(ForecastError::InvalidParameter(
                "Requested history must cover at least one day".to_string(),
            ));
        }

        let dist = Uniform::new(self.low, self.high);
        let prices: Vec<f64> = self.rng_for(crop).sample_iter(dist).take(days).collect();

        let start = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(days as u64));
        let series = PriceSeries::new(crop, prices)?;

        Ok(match start {
            Some(date) => series.with_start_date(date),
            None => series,
        })
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Serves the same caller-supplied prices for every crop
#[derive(Debug, Clone)]
pub struct FixedPriceProvider {
    prices: Vec<f64>,
    start_date: Option<NaiveDate>,
}

impl FixedPriceProvider {
    /// Serve `prices` (oldest first) for any crop
    pub fn new(prices: Vec<f64>) -> Result<Self> {
        // validate once up front
        PriceSeries::new("", prices.clone())?;
        Ok(Self {
            prices,
            start_date: None,
        })
    }

    /// Date of the first served price
    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }
}

impl PriceProvider for FixedPriceProvider {
    fn history(&self, crop: &str, days: usize) -> Result<PriceSeries> {
        let mut series = PriceSeries::new(crop, self.prices.clone())?;
        if let Some(date) = self.start_date {
            series = series.with_start_date(date);
        }
        Ok(series.tail(days))
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Price history loaded from a `date,crop,price` CSV file
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    series: HashMap<String, Vec<(NaiveDate, f64)>>,
}

impl CsvPriceProvider {
    /// Load every crop's history from `path`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let records = DataLoader::from_csv(path)?;
        Ok(Self {
            series: DataLoader::group_by_crop(records),
        })
    }

    /// Load every crop's history from CSV text
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let records = DataLoader::from_reader(reader)?;
        Ok(Self {
            series: DataLoader::group_by_crop(records),
        })
    }

    /// Crops with at least one observation, sorted
    pub fn crops(&self) -> Vec<&str> {
        let mut crops: Vec<&str> = self.series.keys().map(String::as_str).collect();
        crops.sort_unstable();
        crops
    }
}

impl PriceProvider for CsvPriceProvider {
    fn history(&self, crop: &str, days: usize) -> Result<PriceSeries> {
        let observations = self
            .series
            .get(&normalize_crop(crop))
            .ok_or_else(|| ForecastError::UnknownCrop(crop.to_string()))?;

        let skip = observations.len().saturating_sub(days);
        let window = &observations[skip..];
        let (dates, prices): (Vec<NaiveDate>, Vec<f64>) = window.iter().cloned().unzip();

        PriceSeries::new(crop, prices)?.with_dates(dates)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// 64-bit FNV-1a, stable across runs and toolchains
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
