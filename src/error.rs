//! Error types for decoding and fitting.
//!
//! Both enums carry enough context to diagnose the failing input without
//! re-running the pipeline: field names and channel indices for the
//! decoder, lengths, peak counts and solver state for the fitters.

use std::fmt;
use std::io;

use thiserror::Error;

/// Failure while reading an OVNA capture.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The stream ended before a declared field was fully read.
    #[error("unexpected end of stream while reading {field}{}", channel_suffix(.channel))]
    UnexpectedEof {
        field: &'static str,
        channel: Option<usize>,
    },

    /// A channel whose axes cannot be derived.
    #[error("channel {channel} is invalid: {reason}")]
    InvalidChannel {
        channel: usize,
        reason: InvalidChannelReason,
    },

    /// Per-file processing needs a first channel but the file declares none.
    #[error("file declares no channels")]
    NoChannels,

    /// Any I/O failure other than a short read.
    #[error("I/O error while reading {field}: {source}")]
    Io {
        field: &'static str,
        #[source]
        source: io::Error,
    },
}

fn channel_suffix(channel: &Option<usize>) -> String {
    match channel {
        Some(c) => format!(" (channel {c})"),
        None => String::new(),
    }
}

/// Why a channel was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidChannelReason {
    ZeroSampleCount,
    ZeroFrequencyStep,
    /// More samples than a `u32` count field can describe.
    SampleCountOverflow,
}

impl fmt::Display for InvalidChannelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidChannelReason::ZeroSampleCount => write!(f, "sample count is zero"),
            InvalidChannelReason::ZeroFrequencyStep => write!(f, "frequency step is zero"),
            InvalidChannelReason::SampleCountOverflow => {
                write!(f, "sample count does not fit in 32 bits")
            }
        }
    }
}

/// Which side of the notch a half-power search ran on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingSide {
    Left,
    Right,
}

impl fmt::Display for CrossingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossingSide::Left => write!(f, "left"),
            CrossingSide::Right => write!(f, "right"),
        }
    }
}

/// State of the Levenberg-Marquardt solver when it gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverDiagnostic {
    pub iterations: usize,
    /// Half the sum of squared residuals at the last accepted point.
    pub cost: f64,
    /// Damping factor at the last attempted step.
    pub lambda: f64,
    pub reason: &'static str,
}

impl fmt::Display for SolverDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {} iterations (cost {:.6e}, lambda {:.3e})",
            self.reason, self.iterations, self.cost, self.lambda
        )
    }
}

/// Failure while extracting a metric from a spectrum.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("frequency axis has {frequencies} samples but values have {values}")]
    ShapeMismatch { frequencies: usize, values: usize },

    #[error("found {found} peaks, need at least {required} for a linear fit")]
    InsufficientPeaks { found: usize, required: usize },

    #[error("{points} points are not enough, need at least {required}")]
    InsufficientData { points: usize, required: usize },

    #[error("all {points} abscissae are identical, slope is undefined")]
    DegenerateAbscissa { points: usize },

    #[error("solver did not converge: {0}")]
    DidNotConverge(SolverDiagnostic),

    #[error("normal matrix at the solution is singular, covariance is undefined")]
    SingularCovariance,

    /// A zero, negative or NaN power has no finite level in dB.
    #[error("sample {index} has power {value}, its level in dB is not finite")]
    NonFiniteLevel { index: usize, value: f64 },

    #[error(
        "no {side} sample reaches {threshold_db:.3} dB (notch at index {notch_index}, searched {search_start}..{search_end})"
    )]
    NoHalfPowerCrossing {
        side: CrossingSide,
        notch_index: usize,
        threshold_db: f64,
        search_start: usize,
        search_end: usize,
    },
}

impl FitError {
    /// Check that an abscissa and its values line up.
    pub(crate) fn check_shape(frequencies: usize, values: usize) -> Result<(), FitError> {
        if frequencies != values {
            return Err(FitError::ShapeMismatch {
                frequencies,
                values,
            });
        }
        Ok(())
    }
}
