//! Regression solvers
//!
//! Contains:
//! - Ordinary least squares line fit (`LinearRegression`)
//! - Ridge-regularised multiple regression (`ridge_least_squares`)

use crate::{MathError, Result};

/// Linear Regression fitted over a full set of `(x, y)` observations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    slope: f64,
    intercept: f64,
    r_squared: f64,
}

impl LinearRegression {
    /// Fit a straight line through the given points
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "x length ({}) doesn't match y length ({})",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(MathError::InsufficientData(
                "Not enough data for linear regression. Need at least 2 points.".to_string(),
            ));
        }

        let n = x.len() as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let y_mean = y.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (&xi, &yi) in x.iter().zip(y) {
            numerator += (xi - x_mean) * (yi - y_mean);
            denominator += (xi - x_mean) * (xi - x_mean);
        }

        if denominator.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate slope: x values are too similar".to_string(),
            ));
        }

        let slope = numerator / denominator;
        let intercept = y_mean - slope * x_mean;

        let ss_tot: f64 = y.iter().map(|yi| (yi - y_mean).powi(2)).sum();
        let ss_res: f64 = x
            .iter()
            .zip(y)
            .map(|(xi, yi)| (yi - (slope * xi + intercept)).powi(2))
            .sum();
        let r_squared = if ss_tot.abs() < 1e-12 {
            1.0
        } else {
            1.0 - ss_res / ss_tot
        };

        Ok(Self {
            slope,
            intercept,
            r_squared,
        })
    }

    /// Slope of the fitted line
    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Intercept of the fitted line
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficient of determination
    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Evaluate the line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Solve `(XᵀX + diag(penalties)) β = Xᵀy`.
///
/// `design` is row-major: one row per observation, all rows the same width.
/// `penalties` holds the ridge term for each column; use `0.0` for an
/// unpenalised column.
pub fn ridge_least_squares(design: &[Vec<f64>], y: &[f64], penalties: &[f64]) -> Result<Vec<f64>> {
    if design.len() != y.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but y has {} values",
            design.len(),
            y.len()
        )));
    }
    let p = design.first().map(Vec::len).unwrap_or(0);
    if p == 0 {
        return Err(MathError::InsufficientData(
            "Design matrix has no rows or no columns".to_string(),
        ));
    }
    if penalties.len() != p {
        return Err(MathError::InvalidInput(format!(
            "Expected {} penalties, got {}",
            p,
            penalties.len()
        )));
    }
    if let Some(bad) = design.iter().position(|row| row.len() != p) {
        return Err(MathError::InvalidInput(format!(
            "Row {} has width {}, expected {}",
            bad,
            design[bad].len(),
            p
        )));
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for (row, &yi) in design.iter().zip(y) {
        for a in 0..p {
            let xa = row[a];
            if xa == 0.0 {
                continue;
            }
            xty[a] += xa * yi;
            for b in a..p {
                xtx[a][b] += xa * row[b];
            }
        }
    }
    for a in 0..p {
        for b in 0..a {
            xtx[a][b] = xtx[b][a];
        }
        xtx[a][a] += penalties[a];
    }

    solve_linear_system(xtx, xty)
}

/// Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() < 1e-12 {
            return Err(MathError::CalculationError(format!(
                "Singular system: column {} has no usable pivot",
                col
            )));
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        let pivot = a[col][col];
        for row in (col + 1)..n {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Solution contains non-finite values".to_string(),
        ));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_regression_perfect_line() {
        let x = [0.0, 1.0, 2.0];
        let y = [10.0, 20.0, 30.0];
        let lr = LinearRegression::fit(&x, &y).unwrap();

        assert_relative_eq!(lr.slope(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(lr.intercept(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(lr.predict(3.0), 40.0, epsilon = 1e-9);
        assert!(lr.r_squared() > 0.999);
    }

    #[test]
    fn test_linear_regression_rejects_constant_x() {
        let result = LinearRegression::fit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(MathError::CalculationError(_))));
    }

    #[test]
    fn test_ridge_recovers_exact_coefficients() {
        // y = 2 + 3*x1 - x2
        let design: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let x1 = i as f64;
                let x2 = ((i * 7) % 5) as f64;
                vec![1.0, x1, x2]
            })
            .collect();
        let y: Vec<f64> = design.iter().map(|r| 2.0 + 3.0 * r[1] - r[2]).collect();

        let beta = ridge_least_squares(&design, &y, &[0.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(beta[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(beta[1], 3.0, epsilon = 1e-8);
        assert_relative_eq!(beta[2], -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_ridge_penalty_shrinks_coefficient() {
        let design: Vec<Vec<f64>> = (0..10).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| 5.0 * i as f64).collect();

        let free = ridge_least_squares(&design, &y, &[0.0, 0.0]).unwrap();
        let shrunk = ridge_least_squares(&design, &y, &[0.0, 1000.0]).unwrap();
        assert!(shrunk[1].abs() < free[1].abs());
    }

    #[test]
    fn test_ridge_singular_without_penalty() {
        let design = vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]];
        let result = ridge_least_squares(&design, &[1.0, 2.0, 3.0], &[0.0, 0.0]);
        assert!(matches!(result, Err(MathError::CalculationError(_))));
    }

    #[test]
    fn test_ridge_shape_errors() {
        let design = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(ridge_least_squares(&design, &[1.0, 2.0], &[0.0, 0.0]).is_err());
        assert!(ridge_least_squares(&[vec![1.0]], &[1.0, 2.0], &[0.0]).is_err());
        assert!(ridge_least_squares(&[], &[], &[]).is_err());
    }
}
