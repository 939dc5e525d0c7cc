//! ARIMA models for price forecasting
//!
//! Parameters are estimated by conditional sum of squares (CSS): a
//! Hannan-Rissanen regression supplies the starting point and a Nelder-Mead
//! search refines it. Candidates that are non-stationary or non-invertible
//! are rejected during the search.
//!
//! With `d == 0` the working series is demeaned and the mean acts as the
//! constant term. With `d >= 1` no constant is fitted.

use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use price_math::autoregression::{
    integrated_ar, is_invertible, is_stationary, levinson_durbin, psi_weights,
};
use price_math::differencing::{difference, integrate};
use price_math::linalg::least_squares;
use price_math::optimize::NelderMead;
use price_math::stats::{all_finite, autocovariance, mean, variance};
use statrs::distribution::{ContinuousCDF, Normal};

const MAX_AR_ORDER: usize = 10;
const MAX_DIFFERENCING: usize = 2;
const MAX_MA_ORDER: usize = 10;

/// Observations required beyond `p + d + q`
const MIN_EXTRA_OBSERVATIONS: usize = 10;

/// Relative variance below which the working series counts as constant
const DEGENERATE_VARIANCE: f64 = 1e-12;

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct Arima {
    /// Name of the model
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// MA order (q)
    q: usize,
    /// Minimiser used to refine the coefficients
    optimizer: NelderMead,
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArima {
    /// Name of the model
    name: String,
    /// AR order (p)
    p: usize,
    /// Differencing order (d)
    d: usize,
    /// Fitted AR coefficients
    ar_coefficients: Vec<f64>,
    /// Fitted MA coefficients
    ma_coefficients: Vec<f64>,
    /// Constant removed before fitting (zero when differencing)
    mean: f64,
    /// Innovation variance
    sigma2: f64,
    /// Original prices
    history: Vec<f64>,
    /// Differenced, demeaned series the ARMA part was fitted on
    working: Vec<f64>,
    /// In-sample innovations of the working series
    residuals: Vec<f64>,
    /// Whether the optimiser met its tolerance
    converged: bool,
}

impl Arima {
    /// Create a new ARIMA(p, d, q) model
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        if p > MAX_AR_ORDER {
            return Err(ForecastError::InvalidParameter(format!(
                "AR order must be <= {}, got {}",
                MAX_AR_ORDER, p
            )));
        }
        if d > MAX_DIFFERENCING {
            return Err(ForecastError::InvalidParameter(format!(
                "Differencing order must be <= {}, got {}",
                MAX_DIFFERENCING, d
            )));
        }
        if q > MAX_MA_ORDER {
            return Err(ForecastError::InvalidParameter(format!(
                "MA order must be <= {}, got {}",
                MAX_MA_ORDER, q
            )));
        }

        Ok(Self {
            name: format!("ARIMA({},{},{})", p, d, q),
            p,
            d,
            q,
            optimizer: NelderMead::new(),
        })
    }

    /// Replace the minimiser used during training
    pub fn with_optimizer(mut self, optimizer: NelderMead) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Model order as `(p, d, q)`
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    /// Smallest series length the model accepts
    pub fn min_observations(&self) -> usize {
        self.p + self.d + self.q + MIN_EXTRA_OBSERVATIONS
    }

    /// Hannan-Rissanen estimates: a long AR fit supplies innovation
    /// estimates, then the ARMA coefficients come from least squares on
    /// lagged values and lagged innovations.
    fn initial_estimates(&self, working: &[f64]) -> Result<Vec<f64>> {
        let (p, q) = (self.p, self.q);
        let n = working.len();

        if q == 0 {
            let acov = autocovariance(working, p)?;
            let (coeffs, _) = levinson_durbin(&acov, p)?;
            return Ok(coeffs);
        }

        let long_order = (p + q + 2).min(n / 3).max(p.max(q));
        let acov = autocovariance(working, long_order)?;
        let (long_ar, _) = levinson_durbin(&acov, long_order)?;

        let mut innovations = vec![0.0; n];
        for t in long_order..n {
            let prediction: f64 = (1..=long_order)
                .map(|i| long_ar[i - 1] * working[t - i])
                .sum();
            innovations[t] = working[t] - prediction;
        }

        let start = long_order + q;
        let mut rows = Vec::with_capacity(n.saturating_sub(start));
        let mut targets = Vec::with_capacity(n.saturating_sub(start));
        for t in start..n {
            let row: Vec<f64> = (1..=p)
                .map(|i| working[t - i])
                .chain((1..=q).map(|j| innovations[t - j]))
                .collect();
            rows.push(row);
            targets.push(working[t]);
        }

        Ok(least_squares(&rows, &targets)?)
    }
}

/// Pull coefficients toward zero until the AR part is stationary and the
/// MA part invertible
fn stabilize(params: &mut [f64], p: usize) {
    for _ in 0..50 {
        let (ar, ma) = params.split_at(p);
        if all_finite(params) && is_stationary(ar) && is_invertible(ma) {
            return;
        }
        for value in params.iter_mut() {
            *value *= 0.9;
        }
    }
    params.iter_mut().for_each(|v| *v = 0.0);
}

/// One-step innovations of an ARMA model over `working`.
///
/// The first `p` innovations are taken as zero.
fn innovations(working: &[f64], ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut residuals = vec![0.0; working.len()];
    for t in p..working.len() {
        let mut prediction = 0.0;
        for (i, coeff) in ar.iter().enumerate() {
            prediction += coeff * working[t - i - 1];
        }
        for (j, coeff) in ma.iter().enumerate() {
            if t > j {
                prediction += coeff * residuals[t - j - 1];
            }
        }
        residuals[t] = working[t] - prediction;
    }
    residuals
}

/// Conditional sum of squares per effective observation
fn css_variance(working: &[f64], params: &[f64], p: usize) -> f64 {
    let (ar, ma) = params.split_at(p);
    if !is_stationary(ar) || !is_invertible(ma) {
        return f64::INFINITY;
    }

    let residuals = innovations(working, ar, ma);
    let effective = (working.len() - p) as f64;
    residuals[p..].iter().map(|e| e * e).sum::<f64>() / effective
}

impl ForecastModel for Arima {
    type Trained = TrainedArima;

    fn train(&self, data: &PriceSeries) -> Result<TrainedArima> {
        let prices = data.prices();
        let required = self.min_observations();
        if prices.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: prices.len(),
            });
        }

        let differenced = difference(prices, self.d)?;
        let spread = variance(&differenced)?;
        let scale = mean(&differenced.iter().map(|v| v.abs()).collect::<Vec<_>>())?;
        if spread <= DEGENERATE_VARIANCE * scale.max(1.0).powi(2) {
            return Err(ForecastError::DegenerateSeries(format!(
                "{} series for '{}' has no variation after {} differencing step(s)",
                self.name,
                data.crop(),
                self.d
            )));
        }

        let constant = if self.d == 0 { mean(&differenced)? } else { 0.0 };
        let working: Vec<f64> = differenced.iter().map(|v| v - constant).collect();

        let mut start = self.initial_estimates(&working).unwrap_or_else(|err| {
            tracing::debug!(model = %self.name, error = %err, "initial estimates unavailable, starting from zero");
            vec![0.0; self.p + self.q]
        });
        stabilize(&mut start, self.p);

        let p = self.p;
        let minimum = self
            .optimizer
            .minimize(|params| css_variance(&working, params, p), &start)?;

        if !minimum.value.is_finite() {
            return Err(ForecastError::ConvergenceFailure(format!(
                "{} found no stationary, invertible coefficients for '{}'",
                self.name,
                data.crop()
            )));
        }
        if !minimum.converged {
            tracing::warn!(
                model = %self.name,
                crop = data.crop(),
                iterations = minimum.iterations,
                "CSS optimisation hit the iteration cap; using best estimate"
            );
        }

        let (ar, ma) = minimum.point.split_at(self.p);
        let residuals = innovations(&working, ar, ma);

        tracing::debug!(
            model = %self.name,
            crop = data.crop(),
            sigma2 = minimum.value,
            iterations = minimum.iterations,
            "fitted ARIMA"
        );

        Ok(TrainedArima {
            name: self.name.clone(),
            p: self.p,
            d: self.d,
            ar_coefficients: ar.to_vec(),
            ma_coefficients: ma.to_vec(),
            mean: constant,
            sigma2: minimum.value,
            history: prices.to_vec(),
            working,
            residuals,
            converged: minimum.converged,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArima {
    /// Fitted AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    /// Fitted MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    /// Fitted order as `(p, d, q)`
    pub fn order(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.ma_coefficients.len())
    }

    /// Innovation variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Whether the optimiser met its tolerance before the iteration cap
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Point forecasts on the original price scale
    fn point_forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be at least one period".to_string(),
            ));
        }

        let n = self.working.len();
        let mut extended = self.working.clone();
        let mut shocks = self.residuals.clone();

        for _ in 0..horizon {
            let len = extended.len();
            let mut forecast = 0.0;
            for (i, coeff) in self.ar_coefficients.iter().enumerate() {
                forecast += coeff * extended[len - i - 1];
            }
            for (j, coeff) in self.ma_coefficients.iter().enumerate() {
                forecast += coeff * shocks[len - j - 1];
            }
            extended.push(forecast);
            // future innovations have zero expectation
            shocks.push(0.0);
        }

        let differenced: Vec<f64> = extended[n..].iter().map(|v| v + self.mean).collect();
        let values = integrate(&differenced, &self.history, self.d)?;

        if !all_finite(&values) {
            return Err(ForecastError::NonFiniteForecast);
        }
        Ok(values)
    }
}

impl TrainedForecastModel for TrainedArima {
    fn forecast(&self, horizon: usize) -> Result<ForecastResult> {
        let values = self.point_forecast(horizon)?;
        ForecastResult::new(values, horizon)
    }

    fn forecast_with_confidence(&self, horizon: usize, confidence: f64) -> Result<ForecastResult> {
        if !(confidence > 0.0 && confidence < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Confidence level must be between 0 and 1, got {}",
                confidence
            )));
        }

        let values = self.point_forecast(horizon)?;

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ValidationError(e.to_string()))?;
        let z = normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);

        let ar = integrated_ar(&self.ar_coefficients, self.d);
        let psi = psi_weights(&ar, &self.ma_coefficients, horizon);

        let mut cumulative = 0.0;
        let intervals: Vec<(f64, f64)> = values
            .iter()
            .zip(psi.iter())
            .map(|(value, weight)| {
                cumulative += weight * weight;
                let margin = z * (self.sigma2 * cumulative).sqrt();
                (value - margin, value + margin)
            })
            .collect();

        if intervals
            .iter()
            .any(|(lower, upper)| !lower.is_finite() || !upper.is_finite())
        {
            return Err(ForecastError::NonFiniteForecast);
        }

        ForecastResult::new_with_intervals(values, horizon, intervals)
    }

    fn fitted_values(&self) -> Vec<f64> {
        // x_t - e_t, aligned with history[d..]
        self.history[self.d..]
            .iter()
            .zip(self.residuals.iter())
            .map(|(actual, residual)| actual - residual)
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
