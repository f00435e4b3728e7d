use std::io::{self, Write};

use super::model::{RawChannel, RESERVED_WORDS};

/// Write channel records in the OVNA capture layout.
///
/// The reserved words are written as zeros. Start times are written as
/// given; the ×1000 scale is applied only when reading.
pub fn write_channels<W: Write>(w: &mut W, format_tag: &[u8], channels: &[RawChannel]) -> io::Result<()> {
    let tag_len = u32::try_from(format_tag.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "format tag longer than u32::MAX"))?;
    let channel_count = u32::try_from(channels.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "more than u32::MAX channels"))?;

    w.write_all(&tag_len.to_be_bytes())?;
    w.write_all(format_tag)?;
    w.write_all(&[0u8; RESERVED_WORDS * 2])?;
    w.write_all(&channel_count.to_be_bytes())?;

    for ch in channels {
        let n = u32::try_from(ch.spectrum.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "more than u32::MAX samples"))?;
        w.write_all(&n.to_be_bytes())?;
        for z in &ch.spectrum {
            w.write_all(&z.re.to_be_bytes())?;
            w.write_all(&z.im.to_be_bytes())?;
        }
        w.write_all(&ch.center_frequency.to_be_bytes())?;
        w.write_all(&ch.frequency_step.to_be_bytes())?;
        w.write_all(&ch.raw_start_time.to_be_bytes())?;
    }
    Ok(())
}
