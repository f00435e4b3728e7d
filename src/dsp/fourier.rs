//! Centered Fourier transforms between a channel's spectrum and its
//! time-domain field.
//!
//! The inverse runs shift → IFFT → shift, where both shifts are the
//! zero-frequency shift (`rotate_right(n / 2)`). For odd lengths that is
//! not its own inverse, so the forward counterpart undoes each step with
//! the opposite rotation instead of repeating the same sequence.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// Move the zero-frequency bin to the center of the sequence.
pub fn fftshift(data: &mut [Complex64]) {
    let half = data.len() / 2;
    data.rotate_right(half);
}

/// Inverse of [`fftshift`].
pub fn ifftshift(data: &mut [Complex64]) {
    let half = data.len() / 2;
    data.rotate_left(half);
}

/// Reusable planner for centered transforms.
///
/// Decoding a file with several channels of equal length reuses the plan
/// instead of rebuilding it per channel.
pub struct CenteredTransform {
    planner: FftPlanner<f64>,
}

impl Default for CenteredTransform {
    fn default() -> Self {
        Self::new()
    }
}

impl CenteredTransform {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Spectrum → time-domain field, normalized by `1/N`.
    pub fn inverse(&mut self, spectrum: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = spectrum.to_vec();
        if buffer.is_empty() {
            return buffer;
        }
        let fft = self.planner.plan_fft_inverse(buffer.len());

        fftshift(&mut buffer);
        fft.process(&mut buffer);
        let scale = 1.0 / buffer.len() as f64;
        for v in &mut buffer {
            *v *= scale;
        }
        fftshift(&mut buffer);
        buffer
    }

    /// Time-domain field → spectrum; undoes [`CenteredTransform::inverse`].
    pub fn forward(&mut self, field: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = field.to_vec();
        if buffer.is_empty() {
            return buffer;
        }
        let fft = self.planner.plan_fft_forward(buffer.len());

        ifftshift(&mut buffer);
        fft.process(&mut buffer);
        ifftshift(&mut buffer);
        buffer
    }
}

/// One-shot centered inverse transform.
pub fn centered_inverse(spectrum: &[Complex64]) -> Vec<Complex64> {
    CenteredTransform::new().inverse(spectrum)
}

/// One-shot forward counterpart of [`centered_inverse`].
pub fn centered_forward(field: &[Complex64]) -> Vec<Complex64> {
    CenteredTransform::new().forward(field)
}
