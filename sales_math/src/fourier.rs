//! Fourier features for periodic components

use crate::{MathError, Result};
use std::f64::consts::PI;

/// Build Fourier basis rows for the given times.
///
/// Each row is `[sin(2π·1·t/P), cos(2π·1·t/P), …, sin(2π·N·t/P), cos(2π·N·t/P)]`
/// where `t` is measured in days, `P` is `period` days and `N` is `order`.
pub fn fourier_series(t_days: &[f64], period: f64, order: usize) -> Result<Vec<Vec<f64>>> {
    if !(period > 0.0) {
        return Err(MathError::InvalidInput(format!(
            "Period must be positive, got {}",
            period
        )));
    }
    if order == 0 {
        return Err(MathError::InvalidInput(
            "Fourier order must be at least 1".to_string(),
        ));
    }

    Ok(t_days
        .iter()
        .map(|&t| {
            let mut row = Vec::with_capacity(2 * order);
            for k in 1..=order {
                let angle = 2.0 * PI * k as f64 * t / period;
                row.push(angle.sin());
                row.push(angle.cos());
            }
            row
        })
        .collect())
}

/// Evaluate a fitted Fourier component: `Σ β_j · x_j` for each row
pub fn evaluate(features: &[Vec<f64>], coefficients: &[f64]) -> Vec<f64> {
    features
        .iter()
        .map(|row| row.iter().zip(coefficients).map(|(x, b)| x * b).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fourier_shape_and_values() {
        let rows = fourier_series(&[0.0, 1.75], 7.0, 3).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 6);

        // t = 0: all sines 0, all cosines 1
        for k in 0..3 {
            assert_relative_eq!(rows[0][2 * k], 0.0, epsilon = 1e-12);
            assert_relative_eq!(rows[0][2 * k + 1], 1.0, epsilon = 1e-12);
        }
        // quarter period: sin(π/2) = 1
        assert_relative_eq!(rows[1][0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fourier_is_periodic() {
        let rows = fourier_series(&[3.0, 10.0], 7.0, 2).unwrap();
        for (a, b) in rows[0].iter().zip(&rows[1]) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fourier_rejects_bad_parameters() {
        assert!(fourier_series(&[0.0], 0.0, 3).is_err());
        assert!(fourier_series(&[0.0], f64::NAN, 3).is_err());
        assert!(fourier_series(&[0.0], 7.0, 0).is_err());
    }

    #[test]
    fn test_evaluate() {
        let rows = vec![vec![1.0, 2.0], vec![0.5, -1.0]];
        let values = evaluate(&rows, &[2.0, 1.0]);
        assert_eq!(values, vec![4.0, 0.0]);
    }
}
