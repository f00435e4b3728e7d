//! Insertion-loss extraction from the peaks of a transmission trace.
//!
//! The trace is converted to dB, its local maxima are picked with a
//! minimum index separation, and a straight line is fitted through the
//! peaks. The mean of that line over the peak span is the device's
//! average insertion loss.

use log::{debug, warn};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::regression::{linear_regression, linspace};
use crate::data::model::to_db;
use crate::error::FitError;

/// Number of points the fitted loss line is sampled at.
pub const LOSS_CURVE_POINTS: usize = 1000;

/// Straight-line fit through the detected peaks, in dB per frequency unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub slope: f64,
    pub intercept: f64,
    /// Mean of the line sampled over `[min, max]` of the peak frequencies.
    pub mean_loss: f64,
    /// Indices of the peaks the line was fitted through.
    pub peak_indices: Vec<usize>,
    /// Lowest and highest peak frequency.
    pub span: (f64, f64),
}

impl FitResult {
    pub fn evaluate(&self, f: f64) -> f64 {
        self.slope * f + self.intercept
    }

    /// The fitted line sampled at `n` points across the peak span.
    pub fn curve(&self, n: usize) -> (Vec<f64>, Vec<f64>) {
        let x = linspace(self.span.0, self.span.1, n);
        let y = x.iter().map(|&f| self.evaluate(f)).collect();
        (x, y)
    }
}

/// Indices of local maxima, left to right, at least `min_distance` apart.
///
/// A sample is a candidate when it is strictly greater than both
/// neighbours, so the first and last samples and flat tops never qualify.
/// Candidates are accepted greedily from the left: one closer than
/// `min_distance` to the last accepted peak is dropped. A distance of 0
/// behaves like 1.
pub fn find_peaks(values: &[f64], min_distance: usize) -> Vec<usize> {
    let min_distance = min_distance.max(1);
    let mut peaks: Vec<usize> = Vec::new();

    for i in 1..values.len().saturating_sub(1) {
        let v = values[i];
        if !(v > values[i - 1] && v > values[i + 1]) {
            continue;
        }
        match peaks.last() {
            Some(&last) if i - last < min_distance => {}
            _ => peaks.push(i),
        }
    }
    peaks
}

/// Fit the insertion-loss line through the peaks of `amplitude`.
///
/// `amplitude` is the complex transmission; it is converted with
/// `20 * log10(|a|)` before peak picking.
pub fn extract_loss(
    frequency: &[f64],
    amplitude: &[Complex64],
    min_distance: usize,
) -> Result<FitResult, FitError> {
    FitError::check_shape(frequency.len(), amplitude.len())?;
    extract_loss_db(frequency, &to_db(amplitude), min_distance)
}

/// Same as [`extract_loss`] for a trace already in dB.
pub fn extract_loss_db(frequency: &[f64], db: &[f64], min_distance: usize) -> Result<FitResult, FitError> {
    fit_peak_line(frequency, db, min_distance, LOSS_CURVE_POINTS)
}

/// Peak picking and line fit on a dB trace, averaging the line over
/// `curve_points` samples (at least two).
pub fn fit_peak_line(
    frequency: &[f64],
    db: &[f64],
    min_distance: usize,
    curve_points: usize,
) -> Result<FitResult, FitError> {
    FitError::check_shape(frequency.len(), db.len())?;
    if db.iter().any(|v| !v.is_finite()) {
        warn!("transmission trace contains non-finite dB samples (zero amplitude?)");
    }

    let peak_indices = find_peaks(db, min_distance);
    if peak_indices.len() < 2 {
        return Err(FitError::InsufficientPeaks {
            found: peak_indices.len(),
            required: 2,
        });
    }

    let x: Vec<f64> = peak_indices.iter().map(|&i| frequency[i]).collect();
    let y: Vec<f64> = peak_indices.iter().map(|&i| db[i]).collect();
    let line = linear_regression(&x, &y)?;

    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut fit = FitResult {
        slope: line.slope,
        intercept: line.intercept,
        mean_loss: 0.0,
        peak_indices,
        span: (lo, hi),
    };
    let (_, curve) = fit.curve(curve_points.max(2));
    fit.mean_loss = curve.iter().sum::<f64>() / curve.len() as f64;

    debug!(
        "loss fit through {} peaks: slope {:.6} dB/unit, mean {:.4} dB",
        fit.peak_indices.len(),
        fit.slope,
        fit.mean_loss
    );
    Ok(fit)
}
