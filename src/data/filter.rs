use crate::error::FitError;

use super::model::Channel;

// ---------------------------------------------------------------------------
// Frequency-range selection
// ---------------------------------------------------------------------------

/// Return indices of samples whose frequency lies in `[min_f, max_f]`.
///
/// Bounds are inclusive and order is preserved. An empty intersection (or
/// `min_f > max_f`) yields an empty vector.
pub fn range_indices(frequencies: &[f64], min_f: f64, max_f: f64) -> Vec<usize> {
    frequencies
        .iter()
        .enumerate()
        .filter(|(_, &f)| f >= min_f && f <= max_f)
        .map(|(i, _)| i)
        .collect()
}

/// Keep the frequency/value pairs with `min_f <= f <= max_f`.
///
/// Works for any per-sample value: linear powers, dB values or complex
/// amplitudes.
pub fn filter_range<T: Clone>(
    frequencies: &[f64],
    values: &[T],
    min_f: f64,
    max_f: f64,
) -> Result<(Vec<f64>, Vec<T>), FitError> {
    FitError::check_shape(frequencies.len(), values.len())?;

    Ok(frequencies
        .iter()
        .zip(values)
        .filter(|(&f, _)| f >= min_f && f <= max_f)
        .map(|(&f, v)| (f, v.clone()))
        .unzip())
}

impl Channel {
    /// Frequency axis and spectrum restricted to `[min_f, max_f]`.
    pub fn spectrum_in_range(
        &self,
        min_f: f64,
        max_f: f64,
    ) -> (Vec<f64>, Vec<rustfft::num_complex::Complex64>) {
        let idx = range_indices(&self.frequency_axis, min_f, max_f);
        (
            idx.iter().map(|&i| self.frequency_axis[i]).collect(),
            idx.iter().map(|&i| self.spectrum[i]).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn inclusive_bounds() {
        let f = [1.0, 2.0, 3.0, 4.0, 5.0];
        let a = [10.0, 20.0, 30.0, 40.0, 50.0];
        let (fs, as_) = filter_range(&f, &a, 2.0, 4.0).unwrap();
        assert_eq!(fs, vec![2.0, 3.0, 4.0]);
        assert_eq!(as_, vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn empty_intersection() {
        let f = [1.0, 2.0, 3.0];
        let a = [1.0, 2.0, 3.0];
        let (fs, as_) = filter_range(&f, &a, 10.0, 20.0).unwrap();
        assert!(fs.is_empty());
        assert!(as_.is_empty());

        let (fs, _) = filter_range(&f, &a, 3.0, 1.0).unwrap();
        assert!(fs.is_empty());
    }

    #[test]
    fn decreasing_axis() {
        let f = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert_eq!(range_indices(&f, 1.5, 4.0), vec![1, 2, 3]);
    }

    #[test]
    fn channel_spectrum_in_range() {
        use crate::data::model::RawChannel;
        use crate::dsp::fourier::CenteredTransform;
        use rustfft::num_complex::Complex64;

        let raw = RawChannel {
            spectrum: (0..10).map(|i| Complex64::new(i as f64, 1.0)).collect(),
            center_frequency: 190.0,
            frequency_step: 0.5,
            raw_start_time: 0.0,
        };
        let ch = Channel::from_raw(0, raw, &mut CenteredTransform::new()).unwrap();
        let (f, s) = ch.spectrum_in_range(191.0, 192.0);
        assert_eq!(f, vec![191.0, 191.5, 192.0]);
        let re: Vec<f64> = s.iter().map(|z| z.re).collect();
        assert_eq!(re, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn mismatched_lengths() {
        let err = filter_range(&[1.0, 2.0], &[1.0], 0.0, 3.0).unwrap_err();
        assert_eq!(
            err,
            FitError::ShapeMismatch {
                frequencies: 2,
                values: 1
            }
        );
    }

    proptest! {
        #[test]
        fn selection_is_in_bounds_and_ordered(
            freqs in prop::collection::vec(-1.0e3f64..1.0e3, 0..200),
            lo in -1.0e3f64..1.0e3,
            span in 0.0f64..500.0,
        ) {
            let hi = lo + span;
            let tagged: Vec<usize> = (0..freqs.len()).collect();
            let (fs, idx) = filter_range(&freqs, &tagged, lo, hi).unwrap();

            prop_assert_eq!(fs.len(), idx.len());
            for (&f, &i) in fs.iter().zip(&idx) {
                prop_assert!(lo <= f && f <= hi);
                prop_assert_eq!(freqs[i], f);
            }
            // Original order preserved.
            prop_assert!(idx.windows(2).all(|w| w[0] < w[1]));
            // Nothing qualifying was dropped.
            let expected = freqs.iter().filter(|&&f| lo <= f && f <= hi).count();
            prop_assert_eq!(idx.len(), expected);
        }
    }
}
