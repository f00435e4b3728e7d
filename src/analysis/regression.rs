//! Ordinary least-squares straight-line fits.

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Result of a straight-line regression `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r_value: f64,
    /// Standard error of the slope.
    pub stderr: f64,
    /// Standard error of the intercept.
    pub intercept_stderr: f64,
}

impl LinearRegression {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }
}

/// Fit a straight line through `(x, y)`.
///
/// Needs at least two points and at least two distinct abscissae. With
/// exactly two points the line is exact and both standard errors are zero.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<LinearRegression, FitError> {
    FitError::check_shape(x.len(), y.len())?;
    let n = x.len();
    if n < 2 {
        return Err(FitError::InsufficientData {
            points: n,
            required: 2,
        });
    }

    let n_f = n as f64;
    let x_mean = x.iter().sum::<f64>() / n_f;
    let y_mean = y.iter().sum::<f64>() / n_f;

    // Population (co)variances.
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    sxx /= n_f;
    syy /= n_f;
    sxy /= n_f;

    if sxx == 0.0 {
        return Err(FitError::DegenerateAbscissa { points: n });
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let r_value = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };

    let (stderr, intercept_stderr) = if n == 2 {
        (0.0, 0.0)
    } else {
        let df = (n - 2) as f64;
        let se = ((1.0 - r_value * r_value) * syy / sxx / df).max(0.0).sqrt();
        (se, se * (sxx + x_mean * x_mean).sqrt())
    };

    Ok(LinearRegression {
        slope,
        intercept,
        r_value,
        stderr,
        intercept_stderr,
    })
}

/// Propagation loss across devices of different length.
///
/// `lengths` are device lengths and `losses` the measured insertion loss of
/// each device in dB; the slope is the loss per unit length and the
/// intercept the length-independent (coupling) loss.
pub fn fit_propagation_length(lengths: &[f64], losses: &[f64]) -> Result<LinearRegression, FitError> {
    let fit = linear_regression(lengths, losses)?;
    log::debug!(
        "propagation fit over {} devices: {:.4} dB/unit, {:.4} dB offset (r = {:.4})",
        lengths.len(),
        fit.slope,
        fit.intercept,
        fit.r_value
    );
    Ok(fit)
}

/// `n` evenly spaced values from `start` to `stop`, both included.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            v[n - 1] = stop;
            v
        }
    }
}
