//! Reading of individual bits from JPEG entropy-coded data.

use crate::codec::PixelDataCodecError;

/// Reads bits most-significant-first out of entropy-coded JPEG data,
/// handling the byte-stuffing scheme: a 0xFF data byte is always followed
/// by a 0x00 stuffing byte on the wire, and any other byte following 0xFF
/// is a marker that terminates the entropy-coded data.
///
/// Bits are buffered in a 32-bit accumulator that is refilled a byte at a
/// time as bits are consumed.
///
pub struct BitReader<'a> {
  data: &'a [u8],
  position: usize,
  accumulator: u32,
  bit_count: u32,

  /// Set when a restart or terminating marker is encountered. No further
  /// bits are read past it until it is taken with
  /// [`BitReader::take_marker`].
  marker: Option<u8>,
}

impl<'a> BitReader<'a> {
  /// Creates a bit reader over entropy-coded data.
  ///
  pub fn new(data: &'a [u8]) -> Self {
    Self {
      data,
      position: 0,
      accumulator: 0,
      bit_count: 0,
      marker: None,
    }
  }

  /// Returns the current byte offset in the entropy-coded data.
  ///
  pub fn position(&self) -> usize {
    self.position
  }

  /// Reads a single bit.
  ///
  pub fn read_bit(&mut self) -> Result<u32, PixelDataCodecError> {
    if self.bit_count == 0 {
      self.refill()?;
    }

    self.bit_count -= 1;

    Ok((self.accumulator >> self.bit_count) & 1)
  }

  /// Reads up to 16 bits, most significant first.
  ///
  pub fn read_bits(
    &mut self,
    count: u32,
  ) -> Result<u32, PixelDataCodecError> {
    let mut result = 0;

    for _ in 0..count {
      result = (result << 1) | self.read_bit()?;
    }

    Ok(result)
  }

  /// Returns the marker that terminated the entropy-coded data, consuming
  /// it and discarding any partial byte of bits before it, as occurs at
  /// restart markers.
  ///
  pub fn take_marker(&mut self) -> Option<u8> {
    let marker = self.marker.take();

    if marker.is_some() {
      self.accumulator = 0;
      self.bit_count = 0;
    }

    marker
  }

  /// Discards the remaining bits of the current partially consumed byte, as
  /// happens at the end of an entropy-coded segment.
  ///
  pub fn align_to_byte(&mut self) {
    self.accumulator = 0;
    self.bit_count = 0;
  }

  fn refill(&mut self) -> Result<(), PixelDataCodecError> {
    if self.marker.is_some() {
      return Err(
        PixelDataCodecError::new(
          "Entropy-coded data ended at a marker while bits were still \
            required",
        )
        .with_offset(self.position as u64),
      );
    }

    if self.position >= self.data.len() {
      return Err(
        PixelDataCodecError::new("Entropy-coded data is truncated")
          .with_offset(self.position as u64),
      );
    }

    let byte = self.data[self.position];
    self.position += 1;

    if byte != 0xFF {
      self.accumulator = byte as u32;
      self.bit_count = 8;
      return Ok(());
    }

    // A 0xFF byte is either followed by a 0x00 stuffing byte, in which case
    // it is entropy-coded data, or by a marker code
    match self.data.get(self.position) {
      Some(0x00) => {
        self.position += 1;
        self.accumulator = 0xFF;
        self.bit_count = 8;
        Ok(())
      }

      Some(marker) => {
        self.marker = Some(*marker);
        self.position += 1;

        Err(
          PixelDataCodecError::new(
            "Entropy-coded data ended at a marker while bits were still \
              required",
          )
          .with_offset(self.position as u64),
        )
      }

      None => Err(
        PixelDataCodecError::new("Entropy-coded data is truncated")
          .with_offset(self.position as u64),
      ),
    }
  }

  /// Discards any remaining bits of the current byte and scans forward to
  /// the next marker, consuming it. Used to locate the restart marker
  /// between entropy-coded segments.
  ///
  pub fn read_restart_marker(&mut self) -> Option<u8> {
    self.accumulator = 0;
    self.bit_count = 0;

    if let Some(marker) = self.marker.take() {
      return Some(marker);
    }

    while self.position + 1 < self.data.len() {
      if self.data[self.position] == 0xFF
        && self.data[self.position + 1] != 0x00
      {
        let marker = self.data[self.position + 1];
        self.position += 2;
        return Some(marker);
      }

      self.position += 1;
    }

    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn read_bits_test() {
    let mut reader = BitReader::new(&[0b1011_0001, 0b0100_0000]);

    assert_eq!(reader.read_bit().unwrap(), 1);
    assert_eq!(reader.read_bits(3).unwrap(), 0b011);
    assert_eq!(reader.read_bits(6).unwrap(), 0b0001_01);
  }

  #[test]
  fn byte_stuffing_test() {
    // 0xFF followed by 0x00 decodes as a 0xFF data byte
    let mut reader = BitReader::new(&[0xFF, 0x00, 0x80]);

    assert_eq!(reader.read_bits(8).unwrap(), 0xFF);
    assert_eq!(reader.read_bit().unwrap(), 1);
  }

  #[test]
  fn marker_terminates_data_test() {
    let mut reader = BitReader::new(&[0xAB, 0xFF, 0xD9]);

    assert_eq!(reader.read_bits(8).unwrap(), 0xAB);
    assert!(reader.read_bit().is_err());
    assert_eq!(reader.take_marker(), Some(0xD9));
  }
}
