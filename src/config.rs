//! Pipeline configuration.
//!
//! Every field has a default that reproduces the standard processing, so
//! an empty JSON object (`{}`) is a valid configuration file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::peaks::LOSS_CURVE_POINTS;
use crate::dsp::window::WindowShape;

/// Spectral window applied by [`crate::pipeline::FilterPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    pub window: WindowShape,
    /// Window center; `None` uses the mean of the channel's frequency axis.
    pub center: Option<f64>,
}

/// Peak picking for insertion-loss extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossConfig {
    /// Minimum index separation between accepted peaks.
    pub min_peak_distance: usize,
    /// Points the fitted line is sampled at when averaging.
    pub curve_points: usize,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            min_peak_distance: 1,
            curve_points: LOSS_CURVE_POINTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    pub filter: FilterConfig,
    pub loss: LossConfig,
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing pipeline configuration")
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing pipeline configuration")
    }
}
