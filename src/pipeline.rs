//! Spectral filtering and per-file processing.

use std::path::Path;

use log::debug;

use crate::analysis::peaks::{fit_peak_line, FitResult};
use crate::config::{FilterConfig, LossConfig, PipelineConfig};
use crate::data::loader::OvnaReader;
use crate::data::model::{to_db, Channel, FilteredChannel};
use crate::dsp::fourier::CenteredTransform;
use crate::error::{DecodeError, FitError};

/// Windows a channel's spectrum and re-derives its time-domain field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterPipeline {
    config: FilterConfig,
}

impl FilterPipeline {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Produce the filtered spectrum and field of `channel`.
    ///
    /// The window is centered on the configured frequency, or on the mean
    /// of the channel's frequency axis. No other normalization is applied.
    pub fn apply(&self, channel: &Channel) -> FilteredChannel {
        self.apply_with(channel, &mut CenteredTransform::new())
    }

    /// [`FilterPipeline::apply`] with a caller-owned transform planner.
    pub fn apply_with(&self, channel: &Channel, transform: &mut CenteredTransform) -> FilteredChannel {
        let center = self.config.center.unwrap_or_else(|| channel.mean_frequency());
        let weights = self.config.window.generate(&channel.frequency_axis, center);

        let filtered_spectrum: Vec<_> = channel
            .spectrum
            .iter()
            .zip(&weights)
            .map(|(&z, &w)| z * w)
            .collect();
        let filtered_field = transform.inverse(&filtered_spectrum);

        debug!(
            "filtered {} samples with {:?} centered at {center}",
            channel.len(),
            self.config.window
        );

        FilteredChannel {
            channel: channel.clone(),
            weights,
            filtered_spectrum,
            filtered_field,
        }
    }
}

/// Filter `channel` with the default super-Gaussian window.
pub fn apply_filter(channel: &Channel) -> FilteredChannel {
    FilterPipeline::default().apply(channel)
}

/// Decode the capture at `path` and filter its first channel.
///
/// Later channels are not decoded.
pub fn process_file(path: &Path, config: &PipelineConfig) -> Result<FilteredChannel, DecodeError> {
    let file = std::fs::File::open(path).map_err(|source| DecodeError::Io {
        field: "file",
        source,
    })?;
    let mut reader = OvnaReader::new(std::io::BufReader::new(file))?;
    let channel = reader.next().ok_or(DecodeError::NoChannels)??;
    debug!("processing first channel of {}", path.display());
    Ok(FilterPipeline::new(config.filter).apply(&channel))
}

/// Insertion-loss line through the peaks of the channel's unfiltered
/// transmission.
pub fn channel_loss(channel: &Channel, config: &LossConfig) -> Result<FitResult, FitError> {
    fit_peak_line(
        &channel.frequency_axis,
        &to_db(&channel.spectrum),
        config.min_peak_distance,
        config.curve_points,
    )
}
