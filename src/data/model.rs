use rustfft::num_complex::Complex64;

use crate::dsp::fourier::CenteredTransform;
use crate::error::{DecodeError, InvalidChannelReason};

/// Scale applied to the stored start time when a channel is decoded.
pub const START_TIME_SCALE: f64 = 1000.0;

/// Number of reserved 16-bit words between the format tag and the channel count.
pub const RESERVED_WORDS: usize = 49;

// ---------------------------------------------------------------------------
// FileHeader – everything before the first channel
// ---------------------------------------------------------------------------

/// Leading fields of an OVNA capture.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    /// Instrument format identifier, kept verbatim (not decoded as text).
    pub format_tag: Vec<u8>,
    /// Reserved words; read and kept but never interpreted.
    pub reserved: [u16; RESERVED_WORDS],
    /// Number of channel records that follow.
    pub channel_count: u32,
}

impl FileHeader {
    /// Lossy text rendering of the format tag for log messages.
    pub fn format_tag_lossy(&self) -> String {
        String::from_utf8_lossy(&self.format_tag).into_owned()
    }
}

// ---------------------------------------------------------------------------
// RawChannel – one channel record exactly as stored on disk
// ---------------------------------------------------------------------------

/// The stored fields of one channel, before any derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChannel {
    pub spectrum: Vec<Complex64>,
    pub center_frequency: f64,
    pub frequency_step: f64,
    /// Start time in the file's native unit (not yet scaled).
    pub raw_start_time: f64,
}

// ---------------------------------------------------------------------------
// Channel – a decoded trace with derived axes
// ---------------------------------------------------------------------------

/// One measured trace with its frequency and time axes.
///
/// All four sequences share length `sample_count`. A channel is built once
/// per decode and never mutated afterwards; filtering produces a new
/// [`FilteredChannel`].
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub sample_count: u32,
    pub center_frequency: f64,
    pub frequency_step: f64,
    /// Time origin, already scaled by [`START_TIME_SCALE`].
    pub start_time: f64,
    pub spectrum: Vec<Complex64>,
    /// `k * frequency_step + center_frequency`.
    pub frequency_axis: Vec<f64>,
    /// `k / sample_count / frequency_step + start_time`.
    pub time_axis: Vec<f64>,
    /// Centered inverse transform of `spectrum`.
    pub time_domain_field: Vec<Complex64>,
}

impl Channel {
    /// Validate a stored record and derive its axes and time-domain field.
    ///
    /// `index` is the channel's position in the file and only feeds the
    /// error context.
    pub fn from_raw(
        index: usize,
        raw: RawChannel,
        transform: &mut CenteredTransform,
    ) -> Result<Self, DecodeError> {
        let n = raw.spectrum.len();
        if n == 0 {
            return Err(DecodeError::InvalidChannel {
                channel: index,
                reason: InvalidChannelReason::ZeroSampleCount,
            });
        }
        if raw.frequency_step == 0.0 {
            return Err(DecodeError::InvalidChannel {
                channel: index,
                reason: InvalidChannelReason::ZeroFrequencyStep,
            });
        }
        let sample_count = u32::try_from(n).map_err(|_| DecodeError::InvalidChannel {
            channel: index,
            reason: InvalidChannelReason::SampleCountOverflow,
        })?;

        let cf = raw.center_frequency;
        let df = raw.frequency_step;
        let start_time = raw.raw_start_time * START_TIME_SCALE;
        let n_f = n as f64;

        let frequency_axis = (0..n).map(|k| k as f64 * df + cf).collect();
        let time_axis = (0..n).map(|k| k as f64 / n_f / df + start_time).collect();
        let time_domain_field = transform.inverse(&raw.spectrum);

        Ok(Channel {
            sample_count,
            center_frequency: cf,
            frequency_step: df,
            start_time,
            spectrum: raw.spectrum,
            frequency_axis,
            time_axis,
            time_domain_field,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.spectrum.len()
    }

    /// Always false for a decoded channel; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.spectrum.is_empty()
    }

    /// Mean of the frequency axis (the default filter center).
    pub fn mean_frequency(&self) -> f64 {
        self.frequency_axis.iter().sum::<f64>() / self.frequency_axis.len() as f64
    }

    /// `20 * log10(|spectrum|)` per sample.
    pub fn spectrum_db(&self) -> Vec<f64> {
        to_db(&self.spectrum)
    }

    /// `20 * log10(|field|)` per time sample.
    pub fn field_db(&self) -> Vec<f64> {
        to_db(&self.time_domain_field)
    }

    /// Rebuild the stored record, undoing the start-time scaling.
    pub fn to_raw(&self) -> RawChannel {
        RawChannel {
            spectrum: self.spectrum.clone(),
            center_frequency: self.center_frequency,
            frequency_step: self.frequency_step,
            raw_start_time: self.start_time / START_TIME_SCALE,
        }
    }
}

/// Amplitude in decibels, `20 * log10(|z|)`.
pub fn to_db(values: &[Complex64]) -> Vec<f64> {
    values.iter().map(|z| 20.0 * z.norm().log10()).collect()
}

// ---------------------------------------------------------------------------
// FilteredChannel – a channel plus its windowed spectrum and field
// ---------------------------------------------------------------------------

/// A channel after spectral windowing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredChannel {
    pub channel: Channel,
    /// Window weight applied to each spectral sample.
    pub weights: Vec<f64>,
    /// `spectrum * weights`, elementwise.
    pub filtered_spectrum: Vec<Complex64>,
    /// Centered inverse transform of `filtered_spectrum`.
    pub filtered_field: Vec<Complex64>,
}

impl FilteredChannel {
    pub fn frequency_axis(&self) -> &[f64] {
        &self.channel.frequency_axis
    }

    pub fn time_axis(&self) -> &[f64] {
        &self.channel.time_axis
    }

    pub fn filtered_spectrum_db(&self) -> Vec<f64> {
        to_db(&self.filtered_spectrum)
    }

    pub fn filtered_field_db(&self) -> Vec<f64> {
        to_db(&self.filtered_field)
    }
}
