//! The JPEG Baseline (Process 1) codec: an 8-bit lossy image codec
//! implemented natively, covering marker parsing, Huffman entropy coding,
//! the 8x8 frequency transform, and color space conversion.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

pub mod bit_reader;
pub mod bit_writer;
pub mod color;
pub mod dct;
pub mod decoder;
pub mod encoder;
pub mod markers;
pub mod tables;

pub use color::ChromaSubsampling;

use dcmflow_core::RcByteSlice;

use crate::codec::{
  EncodeOptions, EncodedFrames, PixelDataCodec, PixelDataCodecError,
};
use crate::encapsulation;
use crate::pixel_data_definition::PixelDataDefinition;

/// The JPEG Baseline (Process 1) pixel data codec.
///
pub struct JpegBaselineCodec;

impl PixelDataCodec for JpegBaselineCodec {
  fn name(&self) -> &'static str {
    "JPEG Baseline"
  }

  fn is_lossless(&self) -> bool {
    false
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
    decoder::decode(data, definition, destination)
      .map_err(|e| e.with_frame_index(frame_index))
  }

  fn encode_frames(
    &self,
    raw: &[u8],
    definition: &PixelDataDefinition,
    options: &EncodeOptions,
  ) -> Result<EncodedFrames, PixelDataCodecError> {
    let frame_size = definition.frame_size_in_bytes();

    if raw.len() != frame_size * definition.number_of_frames {
      return Err(PixelDataCodecError::new(
        "Raw pixel data size does not match the frame count",
      ));
    }

    let frames: Vec<&[u8]> = raw.chunks(frame_size).collect();

    let encoded = encode_all_frames(&frames, definition, options)?;

    let fragments: Vec<RcByteSlice> =
      encoded.into_iter().map(RcByteSlice::from_vec).collect();

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
    let header = decoder::parse_header(data)?;

    if header.width != usize::from(definition.columns)
      || header.height != usize::from(definition.rows)
    {
      return Err(PixelDataCodecError::new(
        "JPEG dimensions do not match the pixel data definition",
      ));
    }

    if header.components.len() != usize::from(definition.samples_per_pixel) {
      return Err(PixelDataCodecError::new(
        "JPEG component count does not match the pixel data definition",
      ));
    }

    Ok(())
  }

  /// A fragment that ends with the EOI marker completes a frame. A single
  /// padding byte after the marker is permitted.
  ///
  fn is_end_of_frame(&self, fragment: &[u8]) -> bool {
    match fragment {
      [.., 0xFF, m] if *m == markers::EOI => true,
      [.., 0xFF, m, 0x00] if *m == markers::EOI => true,
      _ => false,
    }
  }
}

/// Encodes all frames, in parallel when there is more than one frame.
/// Results are returned in frame-index order.
///
#[cfg(feature = "std")]
fn encode_all_frames(
  frames: &[&[u8]],
  definition: &PixelDataDefinition,
  options: &EncodeOptions,
) -> Result<Vec<Vec<u8>>, PixelDataCodecError> {
  if frames.len() <= 1 {
    return frames
      .iter()
      .map(|frame| encoder::encode_frame(frame, definition, options))
      .collect();
  }

  let mut results: Vec<Result<Vec<u8>, PixelDataCodecError>> = vec![];

  std::thread::scope(|scope| {
    let handles: Vec<_> = frames
      .iter()
      .map(|frame| {
        scope.spawn(move || encoder::encode_frame(frame, definition, options))
      })
      .collect();

    results = handles
      .into_iter()
      .map(|handle| {
        handle.join().unwrap_or_else(|_| {
          Err(PixelDataCodecError::new("Frame encoding panicked"))
        })
      })
      .collect();
  });

  results
    .into_iter()
    .enumerate()
    .map(|(frame_index, result)| {
      result.map_err(|e| e.with_frame_index(frame_index))
    })
    .collect()
}

#[cfg(not(feature = "std"))]
fn encode_all_frames(
  frames: &[&[u8]],
  definition: &PixelDataDefinition,
  options: &EncodeOptions,
) -> Result<Vec<Vec<u8>>, PixelDataCodecError> {
  frames
    .iter()
    .map(|frame| encoder::encode_frame(frame, definition, options))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pixel_data_definition::{
    BitsAllocated, PhotometricInterpretation, PixelRepresentation,
    PlanarConfiguration,
  };

  fn grayscale_definition(size: u16) -> PixelDataDefinition {
    PixelDataDefinition {
      samples_per_pixel: 1,
      photometric_interpretation: PhotometricInterpretation::Monochrome2,
      planar_configuration: PlanarConfiguration::Interleaved,
      rows: size,
      columns: size,
      bits_allocated: BitsAllocated::Eight,
      pixel_representation: PixelRepresentation::Unsigned,
      number_of_frames: 1,
    }
  }

  fn rgb_definition(size: u16) -> PixelDataDefinition {
    PixelDataDefinition {
      samples_per_pixel: 3,
      photometric_interpretation: PhotometricInterpretation::Rgb,
      planar_configuration: PlanarConfiguration::Interleaved,
      rows: size,
      columns: size,
      bits_allocated: BitsAllocated::Eight,
      pixel_representation: PixelRepresentation::Unsigned,
      number_of_frames: 1,
    }
  }

  fn psnr(original: &[u8], decoded: &[u8]) -> f64 {
    let mean_squared_error: f64 = original
      .iter()
      .zip(decoded.iter())
      .map(|(a, b)| {
        let diff = f64::from(*a) - f64::from(*b);
        diff * diff
      })
      .sum::<f64>()
      / original.len() as f64;

    10.0 * (255.0f64 * 255.0 / mean_squared_error).log10()
  }

  #[test]
  fn grayscale_gradient_round_trip_test() {
    let definition = grayscale_definition(32);

    let raw: Vec<u8> = (0..32 * 32)
      .map(|i| (((i % 32) + (i / 32)) % 256) as u8)
      .collect();

    let codec = JpegBaselineCodec;

    let encoded = codec
      .encode_frames(
        &raw,
        &definition,
        &EncodeOptions {
          quality: 90,
          ..Default::default()
        },
      )
      .unwrap();

    assert_eq!(encoded.fragments.len(), 1);

    let fragment = &encoded.fragments[0];
    assert_eq!(&fragment[0..2], &[0xFF, 0xD8]);
    assert!(codec.is_end_of_frame(fragment));

    let mut decoded = vec![];
    codec
      .decode_frame(fragment, &definition, 0, &mut decoded)
      .unwrap();

    assert_eq!(decoded.len(), raw.len());
    assert!(psnr(&raw, &decoded) > 30.0);
  }

  #[test]
  fn rgb_round_trip_test() {
    let definition = rgb_definition(16);

    let raw: Vec<u8> = (0..16 * 16)
      .flat_map(|i| {
        let x = (i % 16) as u8;
        let y = (i / 16) as u8;
        [x * 16, y * 16, 128]
      })
      .collect();

    let codec = JpegBaselineCodec;

    for subsampling in [
      ChromaSubsampling::None,
      ChromaSubsampling::Horizontal,
      ChromaSubsampling::Both,
    ] {
      let encoded = codec
        .encode_frames(
          &raw,
          &definition,
          &EncodeOptions {
            quality: 95,
            chroma_subsampling: subsampling,
          },
        )
        .unwrap();

      let mut decoded = vec![];
      codec
        .decode_frame(&encoded.fragments[0], &definition, 0, &mut decoded)
        .unwrap();

      assert_eq!(decoded.len(), raw.len());
      assert!(psnr(&raw, &decoded) > 20.0);
    }
  }

  #[test]
  fn multi_frame_offset_table_test() {
    let mut definition = grayscale_definition(16);
    definition.number_of_frames = 3;

    let raw = vec![128u8; 16 * 16 * 3];

    let codec = JpegBaselineCodec;
    let encoded = codec
      .encode_frames(&raw, &definition, &EncodeOptions::default())
      .unwrap();

    assert_eq!(encoded.fragments.len(), 3);
    assert_eq!(encoded.basic_offset_table.len(), 3);
    assert_eq!(encoded.basic_offset_table[0], 0);

    // Each offset is the previous offset plus the previous fragment's
    // length and item header
    assert_eq!(
      encoded.basic_offset_table[1],
      8 + encoded.fragments[0].len() as u32
    );
    assert_eq!(
      encoded.basic_offset_table[2],
      encoded.basic_offset_table[1] + 8 + encoded.fragments[1].len() as u32
    );
  }

  #[test]
  fn validate_test() {
    let definition = grayscale_definition(16);
    let raw = vec![0u8; 16 * 16];

    let codec = JpegBaselineCodec;
    let encoded = codec
      .encode_frames(&raw, &definition, &EncodeOptions::default())
      .unwrap();

    assert!(codec.validate(&encoded.fragments[0], &definition).is_ok());

    // Mismatched dimensions fail validation
    let wrong_definition = grayscale_definition(32);
    assert!(
      codec
        .validate(&encoded.fragments[0], &wrong_definition)
        .is_err()
    );

    // Truncated and non-JPEG data fail validation
    assert!(codec.validate(&[0xFF, 0xD8], &definition).is_err());
    assert!(codec.validate(&[0x00, 0x01, 0x02], &definition).is_err());
  }
}
