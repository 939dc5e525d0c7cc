//! Derivative-free minimisation
//!
//! Contains a Nelder-Mead simplex minimiser. Objectives may return
//! `f64::INFINITY` to mark infeasible points; `NaN` is treated the same way.

use crate::{MathError, Result};
use std::cmp::Ordering;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Outcome of a minimisation run
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the tolerance was met before the iteration cap
    pub converged: bool,
}

/// Nelder-Mead simplex minimiser
#[derive(Debug, Clone)]
pub struct NelderMead {
    max_iterations: usize,
    value_tolerance: f64,
    point_tolerance: f64,
    initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            value_tolerance: 1e-10,
            point_tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

impl NelderMead {
    /// Create a minimiser with default tolerances
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self> {
        if max_iterations == 0 {
            return Err(MathError::InvalidInput(
                "Iteration cap must be greater than zero".to_string(),
            ));
        }
        self.max_iterations = max_iterations;
        Ok(self)
    }

    /// Set the size of the initial simplex around the starting point
    pub fn with_initial_step(mut self, step: f64) -> Result<Self> {
        if step <= 0.0 || !step.is_finite() {
            return Err(MathError::InvalidInput(
                "Initial step must be a positive finite number".to_string(),
            ));
        }
        self.initial_step = step;
        Ok(self)
    }

    /// Set the convergence tolerances on objective spread and simplex size
    pub fn with_tolerances(mut self, value_tolerance: f64, point_tolerance: f64) -> Result<Self> {
        if value_tolerance <= 0.0 || point_tolerance <= 0.0 {
            return Err(MathError::InvalidInput(
                "Tolerances must be greater than zero".to_string(),
            ));
        }
        self.value_tolerance = value_tolerance;
        self.point_tolerance = point_tolerance;
        Ok(self)
    }

    /// Minimise `objective` starting from `start`
    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = objective(x);
            if v.is_nan() {
                f64::INFINITY
            } else {
                v
            }
        };

        let n = start.len();
        if n == 0 {
            return Ok(Minimum {
                point: Vec::new(),
                value: eval(start),
                iterations: 0,
                converged: true,
            });
        }

        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(start.to_vec());
        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += if vertex[i].abs() > 1e-8 {
                self.initial_step * vertex[i].abs().max(0.5)
            } else {
                self.initial_step
            };
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            order_simplex(&mut simplex, &mut values);

            if self.has_converged(&simplex, &values) {
                converged = true;
                break;
            }
            iterations += 1;

            let centroid = centroid(&simplex[..n]);
            let worst = &simplex[n];

            let reflected = along(&centroid, worst, -REFLECTION);
            let reflected_value = eval(&reflected);

            if reflected_value < values[0] {
                let expanded = along(&centroid, worst, -EXPANSION);
                let expanded_value = eval(&expanded);
                if expanded_value < reflected_value {
                    simplex[n] = expanded;
                    values[n] = expanded_value;
                } else {
                    simplex[n] = reflected;
                    values[n] = reflected_value;
                }
                continue;
            }

            if reflected_value < values[n - 1] {
                simplex[n] = reflected;
                values[n] = reflected_value;
                continue;
            }

            let (contracted, contracted_value) = if reflected_value < values[n] {
                let outside = along(&centroid, worst, -CONTRACTION);
                let v = eval(&outside);
                (outside, v)
            } else {
                let inside = along(&centroid, worst, CONTRACTION);
                let v = eval(&inside);
                (inside, v)
            };

            if contracted_value < values[n].min(reflected_value) {
                simplex[n] = contracted;
                values[n] = contracted_value;
                continue;
            }

            // shrink toward the best vertex
            let best = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = along(&best, &simplex[i], SHRINK);
                values[i] = eval(&simplex[i]);
            }
        }

        order_simplex(&mut simplex, &mut values);
        Ok(Minimum {
            point: simplex.swap_remove(0),
            value: values[0],
            iterations,
            converged,
        })
    }

    fn has_converged(&self, simplex: &[Vec<f64>], values: &[f64]) -> bool {
        let best = values[0];
        let worst = values[values.len() - 1];
        if !best.is_finite() || !worst.is_finite() {
            return false;
        }
        if (worst - best).abs() > self.value_tolerance * (1.0 + best.abs()) {
            return false;
        }

        let diameter = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(simplex[0].iter()).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);
        diameter <= self.point_tolerance
    }
}

fn order_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut indexed: Vec<(f64, Vec<f64>)> = values
        .drain(..)
        .zip(simplex.drain(..))
        .collect();
    indexed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    for (value, vertex) in indexed {
        values.push(value);
        simplex.push(vertex);
    }
}

fn centroid(vertices: &[Vec<f64>]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let dim = vertices[0].len();
    (0..dim)
        .map(|i| vertices.iter().map(|v| v[i]).sum::<f64>() / n)
        .collect()
}

/// `from + t * (to - from)`
fn along(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter()
        .zip(to.iter())
        .map(|(a, b)| a + t * (b - a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_minimize_quadratic_bowl() {
        let minimum = NelderMead::new()
            .minimize(|x| (x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2), &[0.0, 0.0])
            .unwrap();

        assert!(minimum.converged);
        assert_relative_eq!(minimum.point[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(minimum.point[1], -2.0, epsilon = 1e-5);
        assert!(minimum.value < 1e-9);
    }

    #[test]
    fn test_minimize_rosenbrock() {
        let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let minimum = NelderMead::new()
            .with_max_iterations(20_000)
            .unwrap()
            .minimize(rosenbrock, &[-1.2, 1.0])
            .unwrap();

        assert_relative_eq!(minimum.point[0], 1.0, epsilon = 1e-3);
        assert_relative_eq!(minimum.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_infeasible_region_is_avoided() {
        // minimum of the unconstrained bowl sits at 2.0, but x > 1 is infeasible
        let objective = |x: &[f64]| {
            if x[0] > 1.0 {
                f64::INFINITY
            } else {
                (x[0] - 2.0).powi(2)
            }
        };
        let minimum = NelderMead::new().minimize(objective, &[0.0]).unwrap();

        assert!(minimum.value.is_finite());
        assert!(minimum.point[0] <= 1.0);
        assert_relative_eq!(minimum.point[0], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_nan_is_treated_as_infeasible() {
        let objective = |x: &[f64]| if x[0] < 0.0 { f64::NAN } else { (x[0] - 0.5).powi(2) };
        let minimum = NelderMead::new().minimize(objective, &[1.0]).unwrap();
        assert_relative_eq!(minimum.point[0], 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_iteration_cap_reports_not_converged() {
        let minimum = NelderMead::new()
            .with_max_iterations(3)
            .unwrap()
            .minimize(|x| x[0].powi(2) + x[1].powi(2), &[5.0, 5.0])
            .unwrap();

        assert!(!minimum.converged);
        assert_eq!(minimum.iterations, 3);
    }

    #[test]
    fn test_zero_dimensional_problem() {
        let minimum = NelderMead::new().minimize(|_| 4.0, &[]).unwrap();
        assert!(minimum.converged);
        assert_eq!(minimum.value, 4.0);
    }

    #[test]
    fn test_builder_validation() {
        assert!(NelderMead::new().with_max_iterations(0).is_err());
        assert!(NelderMead::new().with_initial_step(-1.0).is_err());
        assert!(NelderMead::new().with_tolerances(0.0, 1e-8).is_err());
    }
}
