//! Codec for the 'RLE Lossless' transfer syntax.
//!
//! RLE pixel data stores each frame as up to fifteen PackBits-compressed
//! byte segments, one per byte plane of the pixel data, preceded by a
//! 64-byte header that gives the number of segments and the offset of each.
//!
//! Ref: PS3.5 Annex G.

#[cfg(not(feature = "std"))]
use alloc::{format, vec, vec::Vec};

use byteorder::ByteOrder;

use crate::codec::{
  EncodeOptions, EncodedFrames, PixelDataCodec, PixelDataCodecError,
};
use crate::encapsulation;
use crate::pixel_data_definition::{BitsAllocated, PixelDataDefinition};

/// The RLE Lossless pixel data codec.
///
pub struct RleLosslessCodec;

impl PixelDataCodec for RleLosslessCodec {
  fn name(&self) -> &'static str {
    "RLE Lossless"
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
    decode_frame(data, definition, destination)
      .map_err(|e| e.with_frame_index(frame_index))
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

    let mut fragments: Vec<dcmflow_core::RcByteSlice> = vec![];

    for frame in raw.chunks(frame_size) {
      fragments.push(encode_frame(frame, definition)?.into());
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
    let segments = read_segments(data)?;

    if segments.len() != segment_count(definition)? {
      return Err(PixelDataCodecError::new(&format!(
        "RLE data has {} segments but {} were expected",
        segments.len(),
        segment_count(definition)?
      )));
    }

    Ok(())
  }
}

/// Returns the number of RLE segments required by a pixel data definition:
/// one per byte plane of each sample.
///
fn segment_count(
  definition: &PixelDataDefinition,
) -> Result<usize, PixelDataCodecError> {
  let bytes_per_sample = match definition.bits_allocated {
    BitsAllocated::Eight => 1,
    BitsAllocated::Sixteen => 2,

    _ => {
      return Err(PixelDataCodecError::new(&format!(
        "Bits allocated '{}' is not supported for RLE pixel data",
        usize::from(definition.bits_allocated)
      )));
    }
  };

  Ok(usize::from(definition.samples_per_pixel) * bytes_per_sample)
}

/// Splits RLE frame data into its segments using the offsets in the RLE
/// header.
///
fn read_segments(
  data: &[u8],
) -> Result<Vec<&[u8]>, PixelDataCodecError> {
  if data.len() < 64 {
    return Err(PixelDataCodecError::new("RLE header is truncated"));
  }

  let segment_count = byteorder::LittleEndian::read_u32(&data[0..4]);
  if segment_count == 0 || segment_count > 15 {
    return Err(
      PixelDataCodecError::new("RLE header segment count is invalid")
        .with_offset(0),
    );
  }

  let mut offsets = Vec::with_capacity(segment_count as usize + 1);
  for i in 0..segment_count as usize {
    let offset =
      byteorder::LittleEndian::read_u32(&data[4 + i * 4..8 + i * 4]) as usize;

    if offset < 64 || offset > data.len() {
      return Err(
        PixelDataCodecError::new("RLE segment offset is invalid")
          .with_offset(4 + i as u64 * 4),
      );
    }

    offsets.push(offset);
  }
  offsets.push(data.len());

  let mut segments = Vec::with_capacity(segment_count as usize);
  for window in offsets.windows(2) {
    if window[1] < window[0] {
      return Err(PixelDataCodecError::new(
        "RLE segment offsets are not ascending",
      ));
    }

    segments.push(&data[window[0]..window[1]]);
  }

  Ok(segments)
}

/// Decodes one frame of RLE pixel data, interleaving the decoded segments
/// into little-endian pixel values in the destination buffer.
///
fn decode_frame(
  data: &[u8],
  definition: &PixelDataDefinition,
  destination: &mut Vec<u8>,
) -> Result<(), PixelDataCodecError> {
  let segment_count = segment_count(definition)?;
  let segments = read_segments(data)?;

  if segments.len() != segment_count {
    return Err(PixelDataCodecError::new(&format!(
      "RLE data has {} segments but {} were expected",
      segments.len(),
      segment_count
    )));
  }

  let pixel_count = definition.pixel_count();

  let mut decoded_segments = Vec::with_capacity(segment_count);
  for segment in segments {
    let decoded = unpack_bits(segment, pixel_count)?;
    decoded_segments.push(decoded);
  }

  // Interleave the byte planes. Segments are stored most significant byte
  // first, and pixel values are emitted little endian.
  let bytes_per_sample = decoded_segments.len()
    / usize::from(definition.samples_per_pixel);

  destination.reserve(pixel_count * decoded_segments.len());

  for pixel in 0..pixel_count {
    for sample in 0..usize::from(definition.samples_per_pixel) {
      for byte in (0..bytes_per_sample).rev() {
        destination
          .push(decoded_segments[sample * bytes_per_sample + byte][pixel]);
      }
    }
  }

  Ok(())
}

/// Encodes one frame of raw little-endian pixel data into an RLE fragment.
///
fn encode_frame(
  frame: &[u8],
  definition: &PixelDataDefinition,
) -> Result<Vec<u8>, PixelDataCodecError> {
  let segment_count = segment_count(definition)?;
  let pixel_count = definition.pixel_count();

  if frame.len() != pixel_count * segment_count {
    return Err(PixelDataCodecError::new(
      "Frame data size does not match the pixel data definition",
    ));
  }

  let samples_per_pixel = usize::from(definition.samples_per_pixel);
  let bytes_per_sample = segment_count / samples_per_pixel;

  // De-interleave the frame into byte planes, most significant byte first
  let mut planes = vec![Vec::with_capacity(pixel_count); segment_count];

  for pixel in 0..pixel_count {
    for sample in 0..samples_per_pixel {
      for byte in 0..bytes_per_sample {
        let value = frame
          [pixel * segment_count + sample * bytes_per_sample + byte];

        planes[sample * bytes_per_sample + (bytes_per_sample - 1 - byte)]
          .push(value);
      }
    }
  }

  // PackBits-encode each plane and assemble the RLE header
  let mut header = vec![0u8; 64];
  byteorder::LittleEndian::write_u32(
    &mut header[0..4],
    segment_count as u32,
  );

  let mut output = header;

  for (index, plane) in planes.iter().enumerate() {
    let offset = output.len() as u32;
    byteorder::LittleEndian::write_u32(
      &mut output[4 + index * 4..8 + index * 4],
      offset,
    );

    pack_bits(plane, &mut output);

    // Segments must have even length
    if output.len() % 2 == 1 {
      output.push(0);
    }
  }

  if output.len() % 2 == 1 {
    output.push(0);
  }

  Ok(output)
}

/// Decompresses PackBits data into exactly `expected_length` bytes.
///
fn unpack_bits(
  data: &[u8],
  expected_length: usize,
) -> Result<Vec<u8>, PixelDataCodecError> {
  let mut output = Vec::with_capacity(expected_length);
  let mut i = 0;

  while output.len() < expected_length && i < data.len() {
    let control = data[i] as i8;
    i += 1;

    match control {
      0..=127 => {
        let literal_length = control as usize + 1;

        if i + literal_length > data.len() {
          return Err(
            PixelDataCodecError::new("RLE literal run is truncated")
              .with_offset(i as u64),
          );
        }

        output.extend_from_slice(&data[i..i + literal_length]);
        i += literal_length;
      }

      -127..=-1 => {
        if i >= data.len() {
          return Err(
            PixelDataCodecError::new("RLE replicate run is truncated")
              .with_offset(i as u64),
          );
        }

        let run_length = 1 - control as isize;
        output.extend(core::iter::repeat_n(data[i], run_length as usize));
        i += 1;
      }

      // A control byte of -128 is a no-op
      -128 => (),
    }
  }

  if output.len() < expected_length {
    return Err(PixelDataCodecError::new(&format!(
      "RLE segment decoded to {} bytes but {} were expected",
      output.len(),
      expected_length
    )));
  }

  output.truncate(expected_length);

  Ok(output)
}

/// Compresses bytes using PackBits, appending to the output buffer.
///
fn pack_bits(data: &[u8], output: &mut Vec<u8>) {
  let mut i = 0;

  while i < data.len() {
    // Find the length of the run of identical bytes starting here
    let mut run_length = 1;
    while i + run_length < data.len()
      && data[i + run_length] == data[i]
      && run_length < 128
    {
      run_length += 1;
    }

    if run_length >= 2 {
      output.push((1 - run_length as isize) as u8);
      output.push(data[i]);
      i += run_length;
      continue;
    }

    // Collect a literal run up to the next replicate run of three or more
    // identical bytes
    let literal_start = i;
    let mut literal_length = 0;

    while i < data.len() && literal_length < 128 {
      let mut next_run = 1;
      while i + next_run < data.len()
        && data[i + next_run] == data[i]
        && next_run < 3
      {
        next_run += 1;
      }

      if next_run >= 3 {
        break;
      }

      i += 1;
      literal_length += 1;
    }

    output.push((literal_length - 1) as u8);
    output.extend_from_slice(&data[literal_start..literal_start + literal_length]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pixel_data_definition::{
    PhotometricInterpretation, PixelRepresentation, PlanarConfiguration,
  };

  fn grayscale_definition(bits_allocated: BitsAllocated) -> PixelDataDefinition {
    PixelDataDefinition {
      samples_per_pixel: 1,
      photometric_interpretation: PhotometricInterpretation::Monochrome2,
      planar_configuration: PlanarConfiguration::Interleaved,
      rows: 4,
      columns: 4,
      bits_allocated,
      pixel_representation: PixelRepresentation::Unsigned,
      number_of_frames: 1,
    }
  }

  #[test]
  fn pack_bits_round_trip_test() {
    for data in [
      vec![0u8; 64],
      vec![1, 2, 3, 4, 5],
      vec![1, 1, 1, 2, 3, 3, 3, 3, 4],
      (0..=255).collect::<Vec<u8>>(),
    ] {
      let mut packed = vec![];
      pack_bits(&data, &mut packed);

      assert_eq!(unpack_bits(&packed, data.len()).unwrap(), data);
    }
  }

  #[test]
  fn encode_decode_8bit_test() {
    let definition = grayscale_definition(BitsAllocated::Eight);

    let raw: Vec<u8> = (0..16).map(|i| (i * 3) as u8).collect();

    let codec = RleLosslessCodec;
    let encoded = codec
      .encode_frames(&raw, &definition, &EncodeOptions::default())
      .unwrap();

    assert_eq!(encoded.fragments.len(), 1);

    let mut decoded = vec![];
    codec
      .decode_frame(&encoded.fragments[0], &definition, 0, &mut decoded)
      .unwrap();

    assert_eq!(decoded, raw);
  }

  #[test]
  fn encode_decode_16bit_test() {
    let definition = grayscale_definition(BitsAllocated::Sixteen);

    let mut raw = vec![];
    for i in 0u16..16 {
      raw.extend_from_slice(&(i * 1000).to_le_bytes());
    }

    let codec = RleLosslessCodec;
    let encoded = codec
      .encode_frames(&raw, &definition, &EncodeOptions::default())
      .unwrap();

    let mut decoded = vec![];
    codec
      .decode_frame(&encoded.fragments[0], &definition, 0, &mut decoded)
      .unwrap();

    assert_eq!(decoded, raw);
  }

  #[test]
  fn validate_rejects_bad_header_test() {
    let definition = grayscale_definition(BitsAllocated::Eight);
    let codec = RleLosslessCodec;

    assert!(codec.validate(&[0u8; 10], &definition).is_err());

    let mut data = vec![0u8; 64];
    data[0] = 16;
    assert!(codec.validate(&data, &definition).is_err());
  }
}
