//! Ordinary least squares for time-index regressions.
//!
//! Every regression in this project has the form:
//!
//! ```text
//! minimize Σ (y_i - (a + b x_i))^2
//! ```
//!
//! with `x_i` a 0-based time index.
//!
//! Implementation choices:
//! - The design matrix is `[1, x_i - x̄]`, so the intercept column and the
//!   slope column are orthogonal and the solve stays well conditioned for long
//!   histories.
//! - β is solved with SVD (`solve_least_squares`); nalgebra's `QR::solve` is
//!   meant for square systems and the design here is always tall.
//! - Diagnostics (R², residual standard error, `Sxx`) are computed from the
//!   fitted β and the residual vector.
//! - A constant `y` is reported with an exact zero slope, which the trend
//!   detector relies on for its "flat" classification.

use nalgebra::{DMatrix, DVector};

/// Fitted line plus the diagnostics needed for prediction intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Residual standard error.
    pub std_error: f64,
    pub n: usize,
    pub mean_x: f64,
    /// `Σ (x_i - x̄)^2`.
    pub sxx: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }
    None
}

/// Fit `y = a + b x`.
///
/// Returns `None` if fewer than two points are supplied, the slices differ in
/// length, `x` has no spread, or any input is non-finite.
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len();
    if n < 2 || y.len() != n {
        return None;
    }
    if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
        return None;
    }

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let centred = DVector::from_iterator(n, x.iter().map(|&xi| xi - mean_x));
    let sxx = centred.dot(&centred);
    if sxx <= 0.0 {
        return None;
    }

    let yv = DVector::from_column_slice(y);
    let mean_y = yv.mean();
    let deviations = yv.add_scalar(-mean_y);
    let syy = deviations.dot(&deviations);

    let (intercept_c, slope) = if syy > 0.0 {
        let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { centred[i] });
        let beta = solve_least_squares(&design, &yv)?;
        (beta[0], beta[1])
    } else {
        (mean_y, 0.0)
    };
    let intercept = intercept_c - slope * mean_x;

    let residuals = yv - centred.map(|c| intercept_c + slope * c);
    let sse = residuals.dot(&residuals);

    let r_squared = if syy > 0.0 { (1.0 - sse / syy).clamp(0.0, 1.0) } else { 0.0 };
    let std_error = if n > 2 { (sse / (nf - 2.0)).sqrt() } else { 0.0 };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        std_error,
        n,
        mean_x,
        sxx,
    })
}

/// Fit against the unit index `0, 1, …, y.len() - 1`.
pub fn fit_trend(y: &[f64]) -> Option<LinearFit> {
    let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    fit_line(&x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_tall_system() {
        // y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_recovers_exact_line() {
        let fit = fit_line(&[0.0, 1.0, 2.0], &[2.0, 5.0, 8.0]).unwrap();
        assert!((fit.intercept - 2.0).abs() < 1e-10);
        assert!((fit.slope - 3.0).abs() < 1e-10);
        assert!((fit.r_squared - 1.0).abs() < 1e-10);
        assert!(fit.std_error.abs() < 1e-10);
    }

    #[test]
    fn constant_series_has_zero_slope_and_r_squared() {
        let fit = fit_trend(&[4.2; 12]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
        assert!((fit.intercept - 4.2).abs() < 1e-12);
    }

    #[test]
    fn residual_standard_error_matches_hand_computation() {
        // y = [1, 3, 2, 4]: slope 0.8, intercept 1.3, residuals [-0.3, 0.9, -0.9, 0.3].
        let fit = fit_trend(&[1.0, 3.0, 2.0, 4.0]).unwrap();
        assert!((fit.slope - 0.8).abs() < 1e-10);
        assert!((fit.intercept - 1.3).abs() < 1e-10);
        let expected = (1.8_f64 / 2.0).sqrt();
        assert!((fit.std_error - expected).abs() < 1e-10);
        assert!((fit.sxx - 5.0).abs() < 1e-12);
        // R² = 1 - SSE/SST = 1 - 1.8/5
        assert!((fit.r_squared - 0.64).abs() < 1e-10);
    }

    #[test]
    fn degenerate_inputs_are_rejected() {
        assert!(fit_trend(&[1.0]).is_none());
        assert!(fit_line(&[1.0, 1.0], &[2.0, 3.0]).is_none());
        assert!(fit_trend(&[1.0, f64::NAN]).is_none());
    }
}
