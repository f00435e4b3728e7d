//! Filtering, loss extraction and resonance metrics on synthetic traces

mod common;

use std::f64::consts::PI;

use common::{assert_float_eq, encode, RecordBuilder};
use ovna_toolkit::analysis::resonance::QUALITY_THRESHOLD_DB;
use ovna_toolkit::dsp::fourier::{centered_forward, centered_inverse};
use ovna_toolkit::pipeline::channel_loss;
use ovna_toolkit::{
    apply_filter, decode_bytes, extract_loss, fit_fano, fit_propagation_length, quality_factor, Complex64,
    FanoParameters, FitError,
};
use ovna_toolkit::config::LossConfig;
use proptest::prelude::*;

/// Airy transmission comb whose peak envelope is `slope * f + intercept` dB.
fn comb(frequencies: &[f64], slope: f64, intercept: f64, fsr: f64) -> Vec<Complex64> {
    frequencies
        .iter()
        .map(|&f| {
            let envelope = 10f64.powf((slope * f + intercept) / 20.0);
            let airy = 1.0 / (1.0 + 30.0 * (PI * f / fsr).sin().powi(2));
            Complex64::from_polar(envelope * airy.sqrt(), 0.7 * f)
        })
        .collect()
}

#[test]
fn loss_line_through_comb_peaks() {
    let (slope, intercept) = (-2.5, 480.0);
    // Peaks where f is a multiple of the FSR; grid puts a sample on each.
    let fsr = 0.1;
    let f: Vec<f64> = (0..2001).map(|i| 190.0 + i as f64 * 0.001).collect();
    let a = comb(&f, slope, intercept, fsr);

    let fit = extract_loss(&f, &a, 50).unwrap();
    assert_eq!(fit.peak_indices.len(), 19);
    assert_float_eq(fit.slope, slope, 1e-3);
    assert_float_eq(fit.intercept, intercept, 0.5);

    let mid = 0.5 * (fit.span.0 + fit.span.1);
    assert_float_eq(fit.mean_loss, slope * mid + intercept, 1e-3);
}

#[test]
fn loss_without_peaks_is_an_error() {
    let f: Vec<f64> = (0..100).map(|i| i as f64).collect();
    let falling: Vec<Complex64> = (0..100).map(|i| Complex64::new(1.0 / (1.0 + i as f64), 0.0)).collect();
    assert_eq!(
        extract_loss(&f, &falling, 1).unwrap_err(),
        FitError::InsufficientPeaks {
            found: 0,
            required: 2
        }
    );
}

#[test]
fn decode_filter_and_measure() {
    let rec = RecordBuilder::new(2001)
        .center(190.0)
        .step(0.001)
        .amplitude(|_, f| comb(&[f], -1.0, 150.0, 0.1)[0])
        .build();
    let channels = decode_bytes(&encode(b"OVNA", &[rec])).unwrap();
    let ch = &channels[0];

    let loss = channel_loss(
        ch,
        &LossConfig {
            min_peak_distance: 50,
            ..LossConfig::default()
        },
    )
    .unwrap();
    assert_float_eq(loss.slope, -1.0, 1e-3);

    // The 2-unit super-Gaussian around the 191 center keeps the middle of
    // a 2-unit-wide trace and attenuates its edges.
    let filtered = apply_filter(ch);
    let mid = ch.len() / 2;
    assert!(filtered.weights[mid] > 0.999);
    assert!(filtered.weights[0] < filtered.weights[mid]);
    assert_eq!(filtered.filtered_field, centered_inverse(&filtered.filtered_spectrum));
}

#[test]
fn quality_factor_matches_lorentzian_width() {
    let (f0, half_width, depth) = (193.2, 0.004, 0.95);
    let f: Vec<f64> = (0..40_001).map(|i| 193.1 + i as f64 * 5e-6).collect();
    let p: Vec<f64> = f
        .iter()
        .map(|&x| {
            let u = (x - f0) / half_width;
            1.0 - depth / (1.0 + u * u)
        })
        .collect();

    let a_th = (1.0 - depth) * 10f64.powf(QUALITY_THRESHOLD_DB / 20.0);
    let offset = half_width * (depth / (1.0 - a_th) - 1.0).sqrt();
    let expected = f0 / (2.0 * offset);

    let q = quality_factor(&f, &p).unwrap();
    assert!((q - expected).abs() / expected < 1e-2, "Q = {q}, expected {expected}");
}

#[test]
fn quality_factor_without_right_crossing() {
    // Decreasing then flat: the floor never rises again.
    let f: Vec<f64> = (0..50).map(|i| 193.0 + i as f64 * 0.01).collect();
    let p: Vec<f64> = (0..50).map(|i| (1.0 - 0.04 * i as f64).max(0.05)).collect();
    assert!(matches!(
        quality_factor(&f, &p),
        Err(FitError::NoHalfPowerCrossing { .. })
    ));
}

#[test]
fn fano_fit_recovers_asymmetric_notch() {
    let truth = FanoParameters {
        f0: 193.3,
        q: 0.8,
        gamma: 0.012,
        a: 0.5,
        b: 0.03,
    };
    let f: Vec<f64> = (0..601).map(|i| 193.2 + i as f64 * 0.0004).collect();
    let y: Vec<f64> = f.iter().map(|&x| truth.evaluate(x)).collect();

    let fit = fit_fano(&f, &y).unwrap();
    assert_float_eq(fit.params.f0, truth.f0, 1e-6);
    assert_float_eq(fit.params.q.abs(), truth.q, 1e-4);
    assert_float_eq(fit.params.gamma.abs(), truth.gamma, 1e-6);
    assert_float_eq(fit.params.a, truth.a, 1e-5);
    assert_float_eq(fit.params.b, truth.b, 1e-6);
}

#[test]
fn propagation_length_fit() {
    let lengths = [0.5, 1.0, 1.5, 2.0, 2.5];
    let losses = [-4.41, -4.79, -5.22, -5.58, -6.01];
    let fit = fit_propagation_length(&lengths, &losses).unwrap();
    assert_float_eq(fit.slope, -0.798, 1e-9);
    assert!(fit.r_value < -0.99);
}

#[test]
fn pipelines_run_concurrently() {
    let captures: Vec<Vec<u8>> = (0..4)
        .map(|k| encode(b"t", &[RecordBuilder::new(256).center(190.0 + k as f64).build()]))
        .collect();

    let results: Vec<f64> = std::thread::scope(|s| {
        let handles: Vec<_> = captures
            .iter()
            .map(|bytes| {
                s.spawn(move || {
                    let ch = decode_bytes(bytes).unwrap().remove(0);
                    apply_filter(&ch).channel.mean_frequency()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (k, mean) in results.iter().enumerate() {
        assert_float_eq(*mean, 190.0 + k as f64 + 255.0 * 0.01 / 2.0, 1e-9);
    }
}

proptest! {
    #[test]
    fn centered_transforms_roundtrip(
        values in prop::collection::vec((-1.0e3f64..1.0e3, -1.0e3f64..1.0e3), 1..256),
    ) {
        let spectrum: Vec<Complex64> = values.iter().map(|&(re, im)| Complex64::new(re, im)).collect();
        let back = centered_forward(&centered_inverse(&spectrum));
        prop_assert_eq!(back.len(), spectrum.len());
        for (a, b) in spectrum.iter().zip(&back) {
            prop_assert!((a - b).norm() < 1e-9 * (1.0 + a.norm()));
        }
    }
}
