//! Construction of encapsulated pixel data items from encoded frames.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use byteorder::ByteOrder;

use dcmflow_core::RcByteSlice;

use crate::codec::EncodedFrames;

/// Builds the basic offset table for a list of fragments where the number of
/// fragments equals the number of frames. Each entry is the byte offset of
/// its frame's fragment measured from the end of the basic offset table
/// item, i.e. it includes the 8-byte item header of every preceding
/// fragment.
///
pub fn basic_offset_table_for_fragments(
  fragments: &[RcByteSlice],
  number_of_frames: usize,
) -> Vec<u32> {
  let mut offsets = Vec::with_capacity(number_of_frames);
  let mut offset = 0u32;

  for fragment in fragments.iter().take(number_of_frames) {
    offsets.push(offset);
    offset += 8 + fragment.len() as u32;
  }

  offsets
}

/// Converts encoded frames into the items of an encapsulated pixel data
/// value: the basic offset table item followed by the fragment items.
///
/// The basic offset table item is populated for multi-frame data and empty
/// for single-frame data.
///
pub fn encoded_frames_to_items(
  encoded_frames: EncodedFrames,
) -> Vec<RcByteSlice> {
  let mut items = Vec::with_capacity(1 + encoded_frames.fragments.len());

  if encoded_frames.basic_offset_table.len() > 1 {
    let mut offset_table =
      vec![0u8; encoded_frames.basic_offset_table.len() * 4];
    byteorder::LittleEndian::write_u32_into(
      &encoded_frames.basic_offset_table,
      &mut offset_table,
    );

    items.push(offset_table.into());
  } else {
    items.push(RcByteSlice::empty());
  }

  items.extend(encoded_frames.fragments);

  items
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn basic_offset_table_test() {
    let fragments: Vec<RcByteSlice> =
      vec![vec![0u8; 100].into(), vec![0u8; 50].into()];

    assert_eq!(basic_offset_table_for_fragments(&fragments, 2), vec![0, 108]);
  }

  #[test]
  fn encoded_frames_to_items_test() {
    let encoded_frames = EncodedFrames {
      fragments: vec![vec![1u8, 2].into(), vec![3u8, 4].into()],
      basic_offset_table: vec![0, 10],
    };

    let items = encoded_frames_to_items(encoded_frames);

    assert_eq!(items.len(), 3);
    assert_eq!(&*items[0], &[0, 0, 0, 0, 10, 0, 0, 0]);
    assert_eq!(&*items[1], &[1, 2]);

    // Single-frame data gets an empty offset table item
    let encoded_frames = EncodedFrames {
      fragments: vec![vec![1u8, 2].into()],
      basic_offset_table: vec![0],
    };

    let items = encoded_frames_to_items(encoded_frames);

    assert_eq!(items.len(), 2);
    assert!(items[0].is_empty());
  }
}
