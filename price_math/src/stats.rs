//! Descriptive statistics over price slices

use crate::{MathError, Result};

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty slice".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`)
pub fn variance(values: &[f64]) -> Result<f64> {
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok(sum_sq / values.len() as f64)
}

/// Sample autocovariances for lags `0..=max_lag`.
///
/// Uses the biased estimator (divides by `n` for every lag), which keeps the
/// resulting Toeplitz matrix positive semi-definite.
pub fn autocovariance(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    if values.len() <= max_lag {
        return Err(MathError::InsufficientData(format!(
            "Need more than {} observations for lag {}, got {}",
            max_lag,
            max_lag,
            values.len()
        )));
    }

    let n = values.len();
    let m = mean(values)?;
    let centered: Vec<f64> = values.iter().map(|v| v - m).collect();

    let acov = (0..=max_lag)
        .map(|lag| {
            let sum: f64 = (lag..n).map(|i| centered[i] * centered[i - lag]).sum();
            sum / n as f64
        })
        .collect();

    Ok(acov)
}

/// True when every value is finite
pub fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values).unwrap(), 5.0);
        assert_relative_eq!(variance(&values).unwrap(), 4.0);
    }

    #[test]
    fn test_mean_of_empty_slice() {
        assert!(mean(&[]).is_err());
    }

    #[test]
    fn test_autocovariance_lag_zero_is_variance() {
        let values = [1.0, 3.0, 2.0, 5.0, 4.0];
        let acov = autocovariance(&values, 2).unwrap();
        assert_eq!(acov.len(), 3);
        assert_relative_eq!(acov[0], variance(&values).unwrap());
    }

    #[test]
    fn test_autocovariance_alternating_series() {
        let values = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        let acov = autocovariance(&values, 1).unwrap();
        // lag-1 products are all -1 over 5 pairs, divided by n = 6
        assert!(acov[1] < 0.0);
        assert_relative_eq!(acov[1], -5.0 / 6.0);
    }

    #[test]
    fn test_autocovariance_needs_enough_data() {
        assert!(autocovariance(&[1.0, 2.0], 2).is_err());
    }

    #[test]
    fn test_all_finite() {
        assert!(all_finite(&[1.0, 2.0]));
        assert!(!all_finite(&[1.0, f64::NAN]));
        assert!(!all_finite(&[f64::INFINITY]));
    }
}
