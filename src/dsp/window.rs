//! Spectral weighting windows over a frequency axis.
//!
//! Unlike sample-index windows (Hann, Hamming), these are defined in
//! frequency units: a passband centered on `center` with half-width
//! `width`. Degenerate widths are not rejected; `width == 0` simply
//! propagates IEEE-754 infinities and NaNs through the formula.

use serde::{Deserialize, Serialize};

/// Passband half-width used by the default filter, in frequency-axis units.
pub const DEFAULT_FILTER_WIDTH: f64 = 2.0;

/// Super-Gaussian order used by the default filter.
pub const DEFAULT_FILTER_ORDER: i32 = 10;

/// `exp(-((f - center) / width)^order)` for a single frequency.
#[inline]
pub fn super_gaussian(f: f64, center: f64, width: f64, order: i32) -> f64 {
    (-((f - center) / width).powi(order)).exp()
}

/// `|f - center| < width`.
#[inline]
pub fn rect(f: f64, center: f64, width: f64) -> bool {
    (f - center).abs() < width
}

/// Super-Gaussian weights for every point of `frequencies`.
pub fn super_gaussian_weights(frequencies: &[f64], center: f64, width: f64, order: i32) -> Vec<f64> {
    frequencies
        .iter()
        .map(|&f| super_gaussian(f, center, width, order))
        .collect()
}

/// Rectangular pass mask for every point of `frequencies`.
pub fn rect_mask(frequencies: &[f64], center: f64, width: f64) -> Vec<bool> {
    frequencies.iter().map(|&f| rect(f, center, width)).collect()
}

/// Window shape applied by the filter pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowShape {
    /// Smooth roll-off; higher `order` gives a flatter top and steeper edges.
    SuperGaussian { width: f64, order: i32 },
    /// Hard pass/stop mask, weights are exactly 1.0 or 0.0.
    Rect { width: f64 },
}

impl Default for WindowShape {
    fn default() -> Self {
        WindowShape::SuperGaussian {
            width: DEFAULT_FILTER_WIDTH,
            order: DEFAULT_FILTER_ORDER,
        }
    }
}

impl WindowShape {
    /// Weight of a single frequency.
    pub fn coefficient(&self, f: f64, center: f64) -> f64 {
        match *self {
            WindowShape::SuperGaussian { width, order } => super_gaussian(f, center, width, order),
            WindowShape::Rect { width } => {
                if rect(f, center, width) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Weights for a whole frequency axis.
    pub fn generate(&self, frequencies: &[f64], center: f64) -> Vec<f64> {
        frequencies
            .iter()
            .map(|&f| self.coefficient(f, center))
            .collect()
    }
}
