//! Decoder and numeric pipeline for optical vector network analyzer (OVNA)
//! captures.
//!
//! ```text
//!  file bytes ─► data::loader ─► Channel ─► pipeline::FilterPipeline ─► FilteredChannel
//!                                   │                                        │
//!                                   └────────────► analysis ◄────────────────┘
//!                                          (insertion loss, Fano fit, Q)
//! ```
//!
//! Every stage is a pure function of its inputs apart from reading the
//! capture, so separate files can be processed on separate threads without
//! coordination.

pub mod analysis;
pub mod config;
pub mod data;
pub mod dsp;
pub mod error;
pub mod export;
pub mod pipeline;

pub use rustfft::num_complex::Complex64;

pub use analysis::peaks::{extract_loss, FitResult};
pub use analysis::regression::{fit_propagation_length, LinearRegression};
pub use analysis::resonance::{fit_fano, quality_factor, FanoFitResult, FanoParameters};
pub use config::PipelineConfig;
pub use data::filter::filter_range;
pub use data::loader::{decode, decode_bytes, load_file, OvnaReader};
pub use data::model::{Channel, FileHeader, FilteredChannel, RawChannel};
pub use error::{DecodeError, FitError};
pub use pipeline::{apply_filter, process_file, FilterPipeline};
