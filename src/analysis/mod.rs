//! Metrics derived from decoded spectra.
//!
//! - `peaks`: insertion loss from a line through transmission peaks
//! - `regression`: straight-line least squares, propagation-length fit
//! - `resonance`: Fano lineshape fit and quality factor

pub mod peaks;
pub mod regression;
pub mod resonance;
