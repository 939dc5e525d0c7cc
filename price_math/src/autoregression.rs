//! Autoregressive polynomial helpers
//!
//! Coefficient vectors follow the convention
//! `x_t = a_1 x_{t-1} + ... + a_p x_{t-p} + e_t`, i.e. the lag polynomial is
//! `1 - a_1 B - ... - a_p B^p`.

use crate::{MathError, Result};

/// Solve the Yule-Walker equations with the Levinson-Durbin recursion.
///
/// `acov` holds autocovariances for lags `0..=order`. Returns the AR
/// coefficients and the innovation variance of the fitted AR(`order`).
pub fn levinson_durbin(acov: &[f64], order: usize) -> Result<(Vec<f64>, f64)> {
    if acov.len() <= order {
        return Err(MathError::InsufficientData(format!(
            "Levinson-Durbin of order {} needs {} autocovariances, got {}",
            order,
            order + 1,
            acov.len()
        )));
    }
    if acov[0] <= 0.0 || !acov[0].is_finite() {
        return Err(MathError::CalculationError(
            "Lag-0 autocovariance must be positive".to_string(),
        ));
    }

    let mut coeffs: Vec<f64> = Vec::with_capacity(order);
    let mut error = acov[0];

    for k in 1..=order {
        let mut acc = acov[k];
        for j in 1..k {
            acc -= coeffs[j - 1] * acov[k - j];
        }
        let reflection = acc / error;

        let previous = coeffs.clone();
        for j in 1..k {
            coeffs[j - 1] = previous[j - 1] - reflection * previous[k - j - 1];
        }
        coeffs.push(reflection);

        error *= 1.0 - reflection * reflection;
        if error <= 0.0 {
            return Err(MathError::CalculationError(format!(
                "Innovation variance vanished at order {}",
                k
            )));
        }
    }

    Ok((coeffs, error))
}

/// Whether all roots of `1 - a_1 z - ... - a_p z^p` lie outside the unit circle.
///
/// Runs the Levinson recursion backwards: the polynomial is stable iff every
/// reflection coefficient has magnitude below one.
pub fn is_stationary(coeffs: &[f64]) -> bool {
    if coeffs.iter().any(|c| !c.is_finite()) {
        return false;
    }

    let mut current = coeffs.to_vec();
    // trailing zeros do not change the roots
    while current.last() == Some(&0.0) {
        current.pop();
    }

    for k in (1..=current.len()).rev() {
        let reflection = current[k - 1];
        if reflection.abs() >= 1.0 {
            return false;
        }
        let denom = 1.0 - reflection * reflection;
        let step_down: Vec<f64> = (0..k - 1)
            .map(|j| (current[j] + reflection * current[k - 2 - j]) / denom)
            .collect();
        current = step_down;
    }

    true
}

/// Whether an MA polynomial `1 + b_1 B + ... + b_q B^q` is invertible
pub fn is_invertible(ma_coeffs: &[f64]) -> bool {
    let negated: Vec<f64> = ma_coeffs.iter().map(|c| -c).collect();
    is_stationary(&negated)
}

/// Fold `order` unit roots into AR coefficients.
///
/// Returns the coefficients of `(1 - a_1 B - ... - a_p B^p)(1 - B)^order`
/// in the same sign convention as the input.
pub fn integrated_ar(coeffs: &[f64], order: usize) -> Vec<f64> {
    let mut poly: Vec<f64> = std::iter::once(1.0)
        .chain(coeffs.iter().map(|c| -c))
        .collect();

    for _ in 0..order {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, &c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }

    poly.iter().skip(1).map(|c| -c).collect()
}

/// The first `count` weights of the MA(infinity) representation of an ARMA
/// process with the given AR and MA coefficients.
pub fn psi_weights(ar: &[f64], ma: &[f64], count: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(count);
    for j in 0..count {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = ma.get(j - 1).copied().unwrap_or(0.0);
        for i in 1..=ar.len().min(j) {
            value += ar[i - 1] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}
