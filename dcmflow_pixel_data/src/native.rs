//! Codec for the 'Encapsulated Uncompressed Explicit VR Little Endian'
//! transfer syntax, where each frame is stored as-is in a single fragment.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::codec::{
  EncodeOptions, EncodedFrames, PixelDataCodec, PixelDataCodecError,
};
use crate::encapsulation;
use crate::pixel_data_definition::PixelDataDefinition;

/// A codec that passes native pixel data through unaltered, one frame per
/// fragment.
///
pub struct NativeCodec;

impl PixelDataCodec for NativeCodec {
  fn name(&self) -> &'static str {
    "Encapsulated Uncompressed"
  }

  fn is_lossless(&self) -> bool {
    true
  }

  fn supports_parallel_encoding(&self) -> bool {
    true
  }

  fn decode_frame(
    &self,
    data: &[u8],
    definition: &PixelDataDefinition,
    frame_index: usize,
    destination: &mut Vec<u8>,
  ) -> Result<(), PixelDataCodecError> {
    self
      .validate(data, definition)
      .map_err(|e| e.with_frame_index(frame_index))?;

    destination.extend_from_slice(&data[..definition.frame_size_in_bytes()]);

    Ok(())
  }

  fn encode_frames(
    &self,
    raw: &[u8],
    definition: &PixelDataDefinition,
    _options: &EncodeOptions,
  ) -> Result<EncodedFrames, PixelDataCodecError> {
    let frame_size = definition.frame_size_in_bytes();

    if raw.len() != frame_size * definition.number_of_frames {
      return Err(PixelDataCodecError::new(
        "Raw pixel data size does not match the frame count",
      ));
    }

    let mut fragments = vec![];

    for frame in raw.chunks(frame_size) {
      let mut fragment = frame.to_vec();

      // Fragments must have even length
      if fragment.len() % 2 == 1 {
        fragment.push(0);
      }

      fragments.push(fragment.into());
    }

    Ok(EncodedFrames {
      basic_offset_table: encapsulation::basic_offset_table_for_fragments(
        &fragments,
        definition.number_of_frames,
      ),
      fragments,
    })
  }

  fn validate(
    &self,
    data: &[u8],
    definition: &PixelDataDefinition,
  ) -> Result<(), PixelDataCodecError> {
    // A trailing padding byte is permitted
    let frame_size = definition.frame_size_in_bytes();
    if data.len() != frame_size && data.len() != frame_size + 1 {
      return Err(PixelDataCodecError::new(
        "Frame data size does not match the pixel data definition",
      ));
    }

    Ok(())
  }
}
