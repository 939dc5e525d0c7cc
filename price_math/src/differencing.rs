//! Differencing and integration of time series

use crate::{MathError, Result};

/// Apply first differences `order` times.
///
/// Each pass shortens the series by one observation.
pub fn difference(data: &[f64], order: usize) -> Result<Vec<f64>> {
    if data.len() <= order {
        return Err(MathError::InsufficientData(format!(
            "Differencing of order {} needs more than {} observations, got {}",
            order,
            order,
            data.len()
        )));
    }

    let mut result = data.to_vec();
    for _ in 0..order {
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }

    Ok(result)
}

/// Every differencing level of `data`, from the original series (level 0)
/// up to and including `order`.
pub fn difference_levels(data: &[f64], order: usize) -> Result<Vec<Vec<f64>>> {
    let mut levels = Vec::with_capacity(order + 1);
    levels.push(data.to_vec());
    for level in 1..=order {
        levels.push(difference(&levels[level - 1], 1)?);
    }
    Ok(levels)
}

/// Undo `order` differencing passes on values that continue `history`.
///
/// `forecasts` lives on the `order`-times differenced scale and follows
/// directly after the last observation of `history`.
pub fn integrate(forecasts: &[f64], history: &[f64], order: usize) -> Result<Vec<f64>> {
    if order == 0 {
        return Ok(forecasts.to_vec());
    }

    let levels = difference_levels(history, order)?;
    let mut result = forecasts.to_vec();

    for level in (0..order).rev() {
        let mut last = *levels[level]
            .last()
            .ok_or_else(|| MathError::InsufficientData("Empty differencing level".to_string()))?;
        for value in result.iter_mut() {
            last += *value;
            *value = last;
        }
    }

    Ok(result)
}
