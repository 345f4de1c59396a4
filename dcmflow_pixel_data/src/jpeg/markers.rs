//! JPEG marker constants and a scanner over the marker segments of a JPEG
//! stream.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::codec::PixelDataCodecError;

pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOF0: u8 = 0xC0;
pub const DHT: u8 = 0xC4;
pub const DQT: u8 = 0xDB;
pub const SOS: u8 = 0xDA;
pub const DRI: u8 = 0xDD;
pub const RST0: u8 = 0xD0;
pub const RST7: u8 = 0xD7;
pub const APP0: u8 = 0xE0;
pub const APP15: u8 = 0xEF;
pub const DNL: u8 = 0xDC;
pub const COM: u8 = 0xFE;

/// A single marker segment in a JPEG stream: the marker code, the segment's
/// payload (excluding the marker and length bytes), and the offset of the
/// marker in the stream.
///
pub struct MarkerSegment<'a> {
  pub marker: u8,
  pub payload: &'a [u8],
  pub offset: usize,
}

/// Returns whether a marker is a standalone marker that carries no length
/// field or payload.
///
pub fn is_standalone_marker(marker: u8) -> bool {
  marker == SOI || marker == EOI || (RST0..=RST7).contains(&marker)
}

/// Scans the marker segments of a JPEG stream, stopping after the SOS
/// marker as entropy-coded data follows it. Returns the segments and the
/// offset at which the entropy-coded data begins, which is zero if no SOS
/// marker was found.
///
pub fn scan_markers(
  data: &[u8],
) -> Result<(Vec<MarkerSegment<'_>>, usize), PixelDataCodecError> {
  let mut segments = Vec::new();
  let mut i = 0;

  loop {
    if i + 2 > data.len() {
      return Err(
        PixelDataCodecError::new("JPEG data ended inside a marker")
          .with_offset(i as u64),
      );
    }

    if data[i] != 0xFF {
      return Err(
        PixelDataCodecError::new("Expected a JPEG marker")
          .with_offset(i as u64),
      );
    }

    let marker = data[i + 1];

    if is_standalone_marker(marker) {
      segments.push(MarkerSegment {
        marker,
        payload: &[],
        offset: i,
      });

      if marker == EOI {
        return Ok((segments, 0));
      }

      i += 2;
      continue;
    }

    if i + 4 > data.len() {
      return Err(
        PixelDataCodecError::new("JPEG marker segment length is truncated")
          .with_offset(i as u64),
      );
    }

    let length = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));

    if length < 2 || i + 2 + length > data.len() {
      return Err(
        PixelDataCodecError::new("JPEG marker segment length is invalid")
          .with_offset(i as u64),
      );
    }

    segments.push(MarkerSegment {
      marker,
      payload: &data[i + 4..i + 2 + length],
      offset: i,
    });

    i += 2 + length;

    // Entropy-coded data follows the SOS header
    if marker == SOS {
      return Ok((segments, i));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scan_markers_test() {
    let data = [
      0xFF, 0xD8, // SOI
      0xFF, 0xDB, 0x00, 0x04, 0xAA, 0xBB, // DQT, 2-byte payload
      0xFF, 0xDA, 0x00, 0x02, // SOS, empty payload
      0x12, 0x34, // entropy-coded data
    ];

    let (segments, scan_start) = scan_markers(&data).unwrap();

    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].marker, SOI);
    assert_eq!(segments[1].marker, DQT);
    assert_eq!(segments[1].payload, &[0xAA, 0xBB]);
    assert_eq!(segments[2].marker, SOS);
    assert_eq!(scan_start, 12);
  }

  #[test]
  fn scan_markers_rejects_invalid_data_test() {
    assert!(scan_markers(&[0x00, 0x01]).is_err());
    assert!(scan_markers(&[0xFF, 0xDB, 0x00]).is_err());
    assert!(scan_markers(&[0xFF, 0xDB, 0xFF, 0xFF, 0x00]).is_err());
  }
}
