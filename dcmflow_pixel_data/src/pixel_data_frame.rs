//! Defines a single frame of pixel data in its raw form.
//!
//! The data will be native, RLE encoded, or using an encapsulated transfer
//! syntax, but the details of how it is encoded are not a concern of
//! [`PixelDataFrame`].

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use dcmflow_core::RcByteSlice;

/// A single frame of pixel data in its raw form. It is made up of one or
/// more reference-counted byte slices, which avoids copying of data.
///
/// If required, use [`PixelDataFrame::to_bytes()`] to get the frame's data
/// in a single contiguous buffer.
///
#[derive(Clone, Debug)]
pub struct PixelDataFrame {
  frame_index: usize,
  chunks: Vec<RcByteSlice>,
  length: usize,
  bit_offset: usize,
}

impl PixelDataFrame {
  /// Creates a new empty frame of pixel data.
  ///
  pub fn new(frame_index: usize) -> Self {
    PixelDataFrame {
      frame_index,
      chunks: vec![],
      length: 0,
      bit_offset: 0,
    }
  }

  /// Returns the index of this frame, i.e. 0 for the first frame in its
  /// DICOM data set, 1 for the second frame, etc.
  ///
  pub fn index(&self) -> usize {
    self.frame_index
  }

  /// Adds the next chunk of pixel data to this frame.
  ///
  pub(crate) fn push_chunk(&mut self, data: RcByteSlice) {
    self.length += data.len();
    self.chunks.push(data);
  }

  /// The size in bytes of this frame of pixel data.
  ///
  pub fn len(&self) -> usize {
    self.length
  }

  /// The size in bits of this frame of pixel data. This takes into account
  /// the frame's bit offset, i.e. the number of low bits in the first byte
  /// that aren't part of the frame.
  ///
  pub fn length_in_bits(&self) -> usize {
    (self.length * 8).saturating_sub(self.bit_offset)
  }

  /// Returns the bit offset for this frame.
  ///
  /// The bit offset is only relevant to native multi-frame pixel data that
  /// has a *'(0028,0100) Bits Allocated'* value of 1, where it specifies how
  /// many bits into this frame's first byte its data begins. In all other
  /// cases it is zero and is unused.
  ///
  pub fn bit_offset(&self) -> usize {
    self.bit_offset
  }

  /// Sets this frame's pixel data bit offset. See [`Self::bit_offset()`]
  /// for details.
  ///
  pub fn set_bit_offset(&mut self, bit_offset: usize) {
    self.bit_offset = bit_offset.clamp(0, 7);
  }

  /// Returns whether this frame of pixel data is empty.
  ///
  pub fn is_empty(&self) -> bool {
    self.length == 0
  }

  /// Returns the chunks of binary data that make up this frame of pixel
  /// data.
  ///
  pub fn chunks(&self) -> &[RcByteSlice] {
    &self.chunks
  }

  /// Removes `count` bytes from the end of this frame of pixel data.
  ///
  pub(crate) fn drop_end_bytes(&mut self, count: usize) {
    let target_length = self.length.saturating_sub(count);

    // While this frame exceeds the target length, pop off the last chunk
    while self.len() > target_length {
      match self.chunks.pop() {
        Some(chunk) => {
          self.length -= chunk.len();

          // If this frame is now too short then restore the chunk, but
          // sliced down so the frame exactly meets the target length
          if self.length < target_length {
            let chunk_length = target_length - self.length;

            self.chunks.push(chunk.take(chunk_length));
            self.length = target_length;

            break;
          }
        }

        None => break,
      }
    }
  }

  /// Converts this frame of pixel data to a single contiguous buffer. This
  /// may require copying the pixel data, so accessing the individual chunks
  /// is preferred when possible.
  ///
  pub fn to_bytes(&self) -> RcByteSlice {
    // If there's a single chunk with all the data then return it and avoid
    // a copy. This isn't possible when there's a non-zero bit offset.
    if self.bit_offset == 0 {
      if let [chunk] = self.chunks.as_slice() {
        return chunk.clone();
      }
    }

    // Copy the chunks into a new buffer
    let mut buffer = Vec::with_capacity(self.len());
    for chunk in self.chunks.iter() {
      buffer.extend_from_slice(chunk);
    }

    // Correct for any bit offset by right shifting the whole buffer. This
    // is only used by 1bpp pixel data frames that have a frame size that's
    // not a multiple of eight bits.
    if self.bit_offset != 0 {
      for i in 0..buffer.len() {
        let next_byte = buffer.get(i + 1).unwrap_or(&0);
        buffer[i] = (buffer[i] >> self.bit_offset)
          | (next_byte << (8 - self.bit_offset));
      }
    }

    buffer.into()
  }
}

impl PartialEq for PixelDataFrame {
  fn eq(&self, other: &Self) -> bool {
    self.to_bytes() == other.to_bytes()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_chunk_test() {
    let mut frame = PixelDataFrame::new(0);

    frame.push_chunk(RcByteSlice::from_vec(vec![0, 1, 2, 3]).take(3));

    assert_eq!(frame.len(), 3);
    assert_eq!(&*frame.to_bytes(), &[0, 1, 2]);
  }

  #[test]
  fn multiple_chunks_test() {
    let mut frame = PixelDataFrame::new(0);

    frame.push_chunk(RcByteSlice::from_vec(vec![0, 1, 2, 3]).take(2));
    frame.push_chunk(RcByteSlice::from_vec(vec![4, 5, 6, 7]).slice(1, 3));

    assert_eq!(frame.len(), 4);
    assert_eq!(&*frame.to_bytes(), &[0, 1, 5, 6]);
  }

  #[test]
  fn drop_end_bytes_test() {
    let mut frame = PixelDataFrame::new(0);
    frame.push_chunk(vec![0, 1, 2, 3, 4].into());

    frame.drop_end_bytes(2);
    assert_eq!(&*frame.to_bytes(), &[0, 1, 2]);

    let mut frame = PixelDataFrame::new(0);
    frame.push_chunk(vec![0, 1].into());
    frame.push_chunk(vec![2, 3].into());
    frame.push_chunk(vec![4, 5].into());

    frame.drop_end_bytes(3);
    assert_eq!(&*frame.to_bytes(), &[0, 1, 2]);
  }

  #[test]
  fn bit_offset_test() {
    let mut frame = PixelDataFrame::new(0);
    frame.push_chunk(vec![0b1010_0000, 0b0000_0101].into());
    frame.set_bit_offset(4);

    assert_eq!(frame.length_in_bits(), 12);
    assert_eq!(&*frame.to_bytes(), &[0b0101_1010, 0b0000_0000]);
  }
}
