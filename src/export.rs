//! Plain-data export for plotting and reporting tools.
//!
//! Traces are written as CSV with one row per sample; fit results are
//! written as JSON.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::data::model::{Channel, FilteredChannel};

#[derive(Serialize)]
struct ChannelRow {
    frequency: f64,
    spectrum_re: f64,
    spectrum_im: f64,
    spectrum_db: f64,
    time: f64,
    field_re: f64,
    field_im: f64,
    field_db: f64,
}

#[derive(Serialize)]
struct FilteredRow {
    frequency: f64,
    weight: f64,
    spectrum_re: f64,
    spectrum_im: f64,
    filtered_re: f64,
    filtered_im: f64,
    filtered_db: f64,
    time: f64,
    filtered_field_re: f64,
    filtered_field_im: f64,
    filtered_field_db: f64,
}

fn db(z: rustfft::num_complex::Complex64) -> f64 {
    20.0 * z.norm().log10()
}

/// Write one row per sample of `channel`.
pub fn write_channel_csv<W: Write>(writer: W, channel: &Channel) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for i in 0..channel.len() {
        let s = channel.spectrum[i];
        let e = channel.time_domain_field[i];
        wtr.serialize(ChannelRow {
            frequency: channel.frequency_axis[i],
            spectrum_re: s.re,
            spectrum_im: s.im,
            spectrum_db: db(s),
            time: channel.time_axis[i],
            field_re: e.re,
            field_im: e.im,
            field_db: db(e),
        })
        .with_context(|| format!("writing CSV row {i}"))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

/// Write one row per sample of a filtered channel.
pub fn write_filtered_csv<W: Write>(writer: W, filtered: &FilteredChannel) -> Result<()> {
    let ch = &filtered.channel;
    let mut wtr = csv::Writer::from_writer(writer);
    for i in 0..ch.len() {
        let s = ch.spectrum[i];
        let fs = filtered.filtered_spectrum[i];
        let fe = filtered.filtered_field[i];
        wtr.serialize(FilteredRow {
            frequency: ch.frequency_axis[i],
            weight: filtered.weights[i],
            spectrum_re: s.re,
            spectrum_im: s.im,
            filtered_re: fs.re,
            filtered_im: fs.im,
            filtered_db: db(fs),
            time: ch.time_axis[i],
            filtered_field_re: fe.re,
            filtered_field_im: fe.im,
            filtered_field_db: db(fe),
        })
        .with_context(|| format!("writing CSV row {i}"))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

pub fn write_channel_csv_file(path: &Path, channel: &Channel) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_channel_csv(file, channel)
}

pub fn write_filtered_csv_file(path: &Path, filtered: &FilteredChannel) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_filtered_csv(file, filtered)
}

/// Write any serializable result (fit parameters, configurations) as
/// pretty-printed JSON.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(file, value).with_context(|| format!("writing {}", path.display()))
}
