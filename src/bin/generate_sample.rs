//! Write a synthetic two-channel OVNA capture.
//!
//! Channel 0 is a Fabry-Perot transmission comb whose peaks fall off
//! linearly in dB (an insertion-loss tilt); channel 1 is a single Fano
//! notch. Usage: `generate_sample [output.ovna]`.

use std::f64::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use log::info;
use ovna_toolkit::analysis::resonance::FanoParameters;
use ovna_toolkit::data::writer::write_channels;
use ovna_toolkit::{Complex64, RawChannel};

const SAMPLES: usize = 8192;
const CENTER: f64 = 191.0;
const STEP: f64 = 0.0005;

/// Seeded SplitMix64 stream with a cached second normal deviate.
struct NoiseSource {
    counter: u64,
    spare: Option<f64>,
}

impl NoiseSource {
    fn seeded(seed: u64) -> Self {
        NoiseSource {
            counter: seed,
            spare: None,
        }
    }

    fn next_bits(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.counter;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[-1, 1)`.
    fn symmetric_unit(&mut self) -> f64 {
        (self.next_bits() >> 11) as f64 * (2.0 / (1u64 << 53) as f64) - 1.0
    }

    /// Normal deviate with zero mean and the given spread (Marsaglia polar method).
    fn normal(&mut self, sigma: f64) -> f64 {
        if let Some(z) = self.spare.take() {
            return sigma * z;
        }
        loop {
            let u = self.symmetric_unit();
            let v = self.symmetric_unit();
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let k = (-2.0 * s.ln() / s).sqrt();
                self.spare = Some(v * k);
                return sigma * u * k;
            }
        }
    }
}

fn frequencies() -> Vec<f64> {
    (0..SAMPLES).map(|i| i as f64 * STEP + CENTER).collect()
}

/// Linear phase of a fixed group delay, so the impulse sits off-center.
fn delayed(amplitude: f64, f: f64, delay: f64) -> Complex64 {
    Complex64::from_polar(amplitude, -2.0 * PI * f * delay)
}

fn comb_channel(noise: &mut NoiseSource) -> RawChannel {
    let fsr = 0.08;
    let finesse_coeff = 40.0;
    let tilt_db_per_thz = -1.5;

    let spectrum = frequencies()
        .iter()
        .map(|&f| {
            let envelope_db = -3.0 + tilt_db_per_thz * (f - CENTER);
            let envelope = 10f64.powf(envelope_db / 20.0);
            let airy = 1.0 / (1.0 + finesse_coeff * (PI * (f - CENTER) / fsr).sin().powi(2));
            let amplitude = envelope * airy.sqrt() * (1.0 + noise.normal(0.002));
            delayed(amplitude, f, 12.5)
        })
        .collect();

    RawChannel {
        spectrum,
        center_frequency: CENTER,
        frequency_step: STEP,
        raw_start_time: -0.002,
    }
}

fn fano_channel(noise: &mut NoiseSource) -> RawChannel {
    let notch = FanoParameters {
        f0: CENTER + 2.0,
        q: 0.3,
        gamma: 0.01,
        a: 0.8,
        b: 0.02,
    };
    let spectrum = frequencies()
        .iter()
        .map(|&f| {
            let power = (notch.evaluate(f) + noise.normal(0.001)).max(1e-6);
            delayed(power.sqrt(), f, 3.0)
        })
        .collect();

    RawChannel {
        spectrum,
        center_frequency: CENTER,
        frequency_step: STEP,
        raw_start_time: 0.0,
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_data.ovna".to_string());

    let mut noise = NoiseSource::seeded(42);
    let channels = [comb_channel(&mut noise), fano_channel(&mut noise)];

    let file = File::create(&output_path).with_context(|| format!("creating {output_path}"))?;
    let mut writer = BufWriter::new(file);
    write_channels(&mut writer, b"OVNA synthetic", &channels).context("writing capture")?;
    writer.flush().context("flushing capture")?;

    info!(
        "wrote {} channels ({SAMPLES} samples each) to {output_path}",
        channels.len()
    );
    println!("Wrote {} channels ({SAMPLES} samples each) to {output_path}", channels.len());
    Ok(())
}
