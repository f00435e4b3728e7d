//! Shared helpers for integration tests

#![allow(dead_code)] // Not every test file uses every helper

use ovna_toolkit::data::writer::write_channels;
use ovna_toolkit::{Complex64, RawChannel};

/// Builder for synthetic channel records.
pub struct RecordBuilder {
    samples: usize,
    center_frequency: f64,
    frequency_step: f64,
    raw_start_time: f64,
    amplitude: Box<dyn Fn(usize, f64) -> Complex64>,
}

impl RecordBuilder {
    pub fn new(samples: usize) -> Self {
        Self {
            samples,
            center_frequency: 193.0,
            frequency_step: 0.01,
            raw_start_time: 0.0,
            amplitude: Box::new(|i, _| Complex64::new(1.0 + 0.001 * i as f64, -0.5)),
        }
    }

    pub fn center(mut self, cf: f64) -> Self {
        self.center_frequency = cf;
        self
    }

    pub fn step(mut self, df: f64) -> Self {
        self.frequency_step = df;
        self
    }

    pub fn start_time(mut self, t0: f64) -> Self {
        self.raw_start_time = t0;
        self
    }

    /// Sample value as a function of index and frequency.
    pub fn amplitude(mut self, f: impl Fn(usize, f64) -> Complex64 + 'static) -> Self {
        self.amplitude = Box::new(f);
        self
    }

    pub fn build(self) -> RawChannel {
        let spectrum = (0..self.samples)
            .map(|i| {
                let f = i as f64 * self.frequency_step + self.center_frequency;
                (self.amplitude)(i, f)
            })
            .collect();
        RawChannel {
            spectrum,
            center_frequency: self.center_frequency,
            frequency_step: self.frequency_step,
            raw_start_time: self.raw_start_time,
        }
    }
}

/// Encode records into an in-memory capture.
pub fn encode(tag: &[u8], records: &[RawChannel]) -> Vec<u8> {
    let mut out = Vec::new();
    write_channels(&mut out, tag, records).expect("writing to a Vec cannot fail");
    out
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
