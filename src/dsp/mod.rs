//! Signal processing primitives: centered transforms and frequency windows.

pub mod fourier;
pub mod window;
