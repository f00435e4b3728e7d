use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use log::{debug, warn};
use rustfft::num_complex::Complex64;

use super::model::{Channel, FileHeader, RawChannel, RESERVED_WORDS};
use crate::dsp::fourier::CenteredTransform;
use crate::error::DecodeError;

/// Samples read per chunk while filling a spectrum.
const CHUNK_SAMPLES: usize = 4096;

/// Cap on up-front allocation so a corrupt sample count cannot exhaust
/// memory before the stream runs dry.
const MAX_PREALLOC_SAMPLES: usize = 1 << 20;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Decode every channel of the capture at `path`.
///
/// Stops at the first error. Use [`OvnaReader`] directly to keep going past
/// an invalid channel.
pub fn load_file(path: &Path) -> Result<Vec<Channel>, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Io {
        field: "file",
        source,
    })?;
    debug!("decoding {}", path.display());
    decode(BufReader::new(file))
}

/// Decode every channel from a byte source.
pub fn decode<R: Read>(reader: R) -> Result<Vec<Channel>, DecodeError> {
    OvnaReader::new(reader)?.collect()
}

/// Decode every channel from an in-memory buffer.
pub fn decode_bytes(bytes: &[u8]) -> Result<Vec<Channel>, DecodeError> {
    decode(bytes)
}

// ---------------------------------------------------------------------------
// Streaming reader
// ---------------------------------------------------------------------------

/// Channel-at-a-time decoder.
///
/// Binary layout, big-endian throughout:
///
/// ```text
///  u32        format tag length L
///  L bytes    format tag (opaque)
///  49 × u16   reserved
///  u32        channel count C
///  C × {
///    u32      sample count N
///    2N × f64 interleaved re/im
///    f64      center frequency
///    f64      frequency step
///    f64      start time (scaled ×1000 on decode)
///  }
/// ```
///
/// The header is read by [`OvnaReader::new`]. Iteration yields one result
/// per declared channel. An invalid channel is reported on its own and the
/// next one is still decoded, because its record was fully consumed. A
/// short read or I/O failure ends the iteration.
pub struct OvnaReader<R> {
    inner: R,
    header: FileHeader,
    next_channel: usize,
    transform: CenteredTransform,
    failed: bool,
}

impl<R: Read> OvnaReader<R> {
    /// Read the file header and position the reader at the first channel.
    pub fn new(mut inner: R) -> Result<Self, DecodeError> {
        let tag_len = read_u32(&mut inner, "format_tag_length", None)?;
        let mut format_tag = Vec::with_capacity((tag_len as usize).min(MAX_PREALLOC_SAMPLES));
        (&mut inner)
            .take(u64::from(tag_len))
            .read_to_end(&mut format_tag)
            .map_err(|e| map_io(e, "format_tag", None))?;
        if format_tag.len() != tag_len as usize {
            return Err(DecodeError::UnexpectedEof {
                field: "format_tag",
                channel: None,
            });
        }

        let mut reserved = [0u16; RESERVED_WORDS];
        for word in &mut reserved {
            *word = read_u16(&mut inner, "reserved", None)?;
        }

        let channel_count = read_u32(&mut inner, "channel_count", None)?;

        let header = FileHeader {
            format_tag,
            reserved,
            channel_count,
        };
        debug!(
            "OVNA header: tag {:?}, {} channel(s)",
            header.format_tag_lossy(),
            channel_count
        );

        Ok(Self {
            inner,
            header,
            next_channel: 0,
            transform: CenteredTransform::new(),
            failed: false,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Read the next stored record without deriving anything from it.
    ///
    /// Returns `None` once every declared channel has been read or a
    /// previous read failed.
    pub fn next_raw(&mut self) -> Option<Result<RawChannel, DecodeError>> {
        if self.failed || self.next_channel >= self.header.channel_count as usize {
            return None;
        }
        let index = self.next_channel;
        self.next_channel += 1;

        let result = read_record(&mut self.inner, index);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Iterator for OvnaReader<R> {
    type Item = Result<Channel, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next_channel;
        let raw = match self.next_raw()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e)),
        };
        let result = Channel::from_raw(index, raw, &mut self.transform);
        match &result {
            Ok(ch) => debug!(
                "channel {index}: {} samples, center {} step {}",
                ch.sample_count, ch.center_frequency, ch.frequency_step
            ),
            Err(e) => warn!("{e}"),
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let left = (self.header.channel_count as usize).saturating_sub(self.next_channel);
        (0, Some(left))
    }
}

// -- record helpers --

fn read_record<R: Read>(r: &mut R, index: usize) -> Result<RawChannel, DecodeError> {
    let ch = Some(index);
    let n = read_u32(r, "sample_count", ch)? as usize;

    let mut spectrum = Vec::with_capacity(n.min(MAX_PREALLOC_SAMPLES));
    let mut buf = vec![0u8; n.min(CHUNK_SAMPLES) * 16];
    let mut remaining = n;
    while remaining > 0 {
        let take = remaining.min(CHUNK_SAMPLES);
        let bytes = &mut buf[..take * 16];
        r.read_exact(bytes).map_err(|e| map_io(e, "spectrum", ch))?;
        spectrum.extend(
            bytes
                .chunks_exact(16)
                .map(|pair| Complex64::new(be_f64(&pair[..8]), be_f64(&pair[8..]))),
        );
        remaining -= take;
    }

    let center_frequency = read_f64(r, "center_frequency", ch)?;
    let frequency_step = read_f64(r, "frequency_step", ch)?;
    let raw_start_time = read_f64(r, "start_time", ch)?;

    Ok(RawChannel {
        spectrum,
        center_frequency,
        frequency_step,
        raw_start_time,
    })
}

fn map_io(e: io::Error, field: &'static str, channel: Option<usize>) -> DecodeError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        DecodeError::UnexpectedEof { field, channel }
    } else {
        DecodeError::Io { field, source: e }
    }
}

fn read_array<R: Read, const N: usize>(
    r: &mut R,
    field: &'static str,
    channel: Option<usize>,
) -> Result<[u8; N], DecodeError> {
    let mut b = [0u8; N];
    r.read_exact(&mut b).map_err(|e| map_io(e, field, channel))?;
    Ok(b)
}

fn read_u16<R: Read>(r: &mut R, field: &'static str, ch: Option<usize>) -> Result<u16, DecodeError> {
    read_array(r, field, ch).map(u16::from_be_bytes)
}

fn read_u32<R: Read>(r: &mut R, field: &'static str, ch: Option<usize>) -> Result<u32, DecodeError> {
    read_array(r, field, ch).map(u32::from_be_bytes)
}

fn read_f64<R: Read>(r: &mut R, field: &'static str, ch: Option<usize>) -> Result<f64, DecodeError> {
    read_array(r, field, ch).map(f64::from_be_bytes)
}

fn be_f64(bytes: &[u8]) -> f64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&bytes[..8]);
    f64::from_be_bytes(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::writer::write_channels;
    use crate::error::InvalidChannelReason;

    fn record(n: usize, cf: f64, df: f64) -> RawChannel {
        RawChannel {
            spectrum: (0..n)
                .map(|i| Complex64::new(1.0 + i as f64, 0.5 * i as f64))
                .collect(),
            center_frequency: cf,
            frequency_step: df,
            raw_start_time: -0.0125,
        }
    }

    fn encode(tag: &[u8], records: &[RawChannel]) -> Vec<u8> {
        let mut out = Vec::new();
        write_channels(&mut out, tag, records).unwrap();
        out
    }

    #[test]
    fn decodes_header_and_channels() {
        let bytes = encode(b"OVNA-5000\x00\xff", &[record(6, 193.0, 0.01), record(3, 190.0, -0.02)]);
        let mut reader = OvnaReader::new(bytes.as_slice()).unwrap();
        assert_eq!(reader.header().format_tag, b"OVNA-5000\x00\xff".to_vec());
        assert_eq!(reader.header().channel_count, 2);

        let a = reader.next().unwrap().unwrap();
        let b = reader.next().unwrap().unwrap();
        assert!(reader.next().is_none());

        assert_eq!(a.sample_count, 6);
        assert_eq!(a.spectrum, record(6, 193.0, 0.01).spectrum);
        assert_eq!(a.start_time, -0.0125 * 1000.0);
        assert_eq!(b.frequency_step, -0.02);
        assert_eq!(b.center_frequency, 190.0);
    }

    #[test]
    fn truncation_reports_field() {
        let bytes = encode(b"tag", &[record(4, 193.0, 0.01)]);

        // Cut inside the spectrum.
        let err = decode_bytes(&bytes[..bytes.len() - 40]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEof {
                field: "spectrum",
                channel: Some(0)
            }
        ));

        // Cut inside the trailing start time.
        let err = decode_bytes(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEof {
                field: "start_time",
                channel: Some(0)
            }
        ));

        // Cut inside the format tag.
        let err = decode_bytes(&bytes[..5]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnexpectedEof {
                field: "format_tag",
                channel: None
            }
        ));

        assert!(matches!(
            decode_bytes(&[]).unwrap_err(),
            DecodeError::UnexpectedEof {
                field: "format_tag_length",
                channel: None
            }
        ));
    }

    #[test]
    fn invalid_channel_does_not_stop_siblings() {
        let bytes = encode(
            b"tag",
            &[record(4, 193.0, 0.0), record(0, 193.0, 0.1), record(2, 193.0, 0.1)],
        );
        let results: Vec<_> = OvnaReader::new(bytes.as_slice()).unwrap().collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results[0],
            Err(DecodeError::InvalidChannel {
                channel: 0,
                reason: InvalidChannelReason::ZeroFrequencyStep
            })
        ));
        assert!(matches!(
            results[1],
            Err(DecodeError::InvalidChannel {
                channel: 1,
                reason: InvalidChannelReason::ZeroSampleCount
            })
        ));
        assert_eq!(results[2].as_ref().unwrap().sample_count, 2);

        // The collecting entry point stops at the first one.
        assert!(decode_bytes(&bytes).is_err());
    }

    #[test]
    fn eof_ends_iteration() {
        let bytes = encode(b"", &[record(2, 193.0, 0.1), record(2, 193.0, 0.1)]);
        let cut = &bytes[..bytes.len() - 10];
        let results: Vec<_> = OvnaReader::new(cut).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DecodeError::UnexpectedEof { .. })));
    }

    #[test]
    fn into_inner_leaves_trailing_bytes() {
        let mut bytes = encode(b"t", &[record(2, 193.0, 0.1)]);
        bytes.extend_from_slice(b"tail");
        let mut reader = OvnaReader::new(bytes.as_slice()).unwrap();
        assert!(reader.next().unwrap().is_ok());
        assert!(reader.next().is_none());
        assert_eq!(reader.into_inner(), b"tail");
    }

    #[test]
    fn zero_channels_is_empty() {
        let bytes = encode(b"empty", &[]);
        assert!(decode_bytes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_file(Path::new("/definitely/not/here.ovna")).unwrap_err();
        assert!(matches!(err, DecodeError::Io { field: "file", .. }));
    }
}
