#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use byteorder::ByteOrder;

/// An append-only byte buffer that output is serialized into. Writers obtain
/// a mutable span with [`Self::reserve`], fill it, and commit the bytes
/// written with [`Self::advance`]. The length fields of defined-length
/// sequences and items can be filled in retrospectively with
/// [`Self::patch_u32_le`] once their content size is known.
///
#[derive(Debug)]
pub struct ByteSink {
  buffer: Vec<u8>,
  committed: usize,
}

impl ByteSink {
  /// Creates a new empty byte sink.
  ///
  pub fn new() -> Self {
    Self {
      buffer: vec![],
      committed: 0,
    }
  }

  /// Returns the number of committed bytes in the sink.
  ///
  pub fn len(&self) -> usize {
    self.committed
  }

  /// Returns whether the sink holds no committed bytes.
  ///
  pub fn is_empty(&self) -> bool {
    self.committed == 0
  }

  /// Returns a mutable span of at least `min` bytes following the committed
  /// bytes. Bytes written into the span aren't part of the sink's content
  /// until they are committed with [`Self::advance`].
  ///
  pub fn reserve(&mut self, min: usize) -> &mut [u8] {
    if self.buffer.len() < self.committed + min {
      self.buffer.resize(self.committed + min, 0);
    }

    &mut self.buffer[self.committed..]
  }

  /// Commits `count` bytes previously written into the span returned by
  /// [`Self::reserve`].
  ///
  pub fn advance(&mut self, count: usize) {
    self.committed += count;

    assert!(
      self.committed <= self.buffer.len(),
      "Advanced past the reserved span"
    );
  }

  /// Appends bytes to the sink.
  ///
  pub fn write(&mut self, bytes: &[u8]) {
    let span = self.reserve(bytes.len());
    span[..bytes.len()].copy_from_slice(bytes);
    self.advance(bytes.len());
  }

  /// Appends a little-endian 16-bit unsigned integer to the sink.
  ///
  pub fn write_u16_le(&mut self, value: u16) {
    let span = self.reserve(2);
    byteorder::LittleEndian::write_u16(span, value);
    self.advance(2);
  }

  /// Appends a little-endian 32-bit unsigned integer to the sink.
  ///
  pub fn write_u32_le(&mut self, value: u32) {
    let span = self.reserve(4);
    byteorder::LittleEndian::write_u32(span, value);
    self.advance(4);
  }

  /// Overwrites four committed bytes at the given offset with a
  /// little-endian 32-bit unsigned integer.
  ///
  pub fn patch_u32_le(&mut self, offset: usize, value: u32) {
    byteorder::LittleEndian::write_u32(
      &mut self.buffer[offset..offset + 4],
      value,
    );
  }

  /// Takes all committed bytes out of the sink, leaving it empty.
  ///
  pub fn take(&mut self) -> Vec<u8> {
    self.buffer.truncate(self.committed);
    self.committed = 0;

    core::mem::take(&mut self.buffer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reserve_and_advance_test() {
    let mut sink = ByteSink::new();

    let span = sink.reserve(4);
    span[0] = 1;
    span[1] = 2;
    sink.advance(2);

    sink.write(&[3, 4]);

    assert_eq!(sink.len(), 4);
    assert_eq!(sink.take(), vec![1, 2, 3, 4]);
    assert!(sink.is_empty());
  }

  #[test]
  fn patch_test() {
    let mut sink = ByteSink::new();

    sink.write_u32_le(0);
    sink.write(&[1, 2, 3, 4]);
    sink.patch_u32_le(0, 4);

    assert_eq!(sink.take(), vec![4, 0, 0, 0, 1, 2, 3, 4]);
  }
}
