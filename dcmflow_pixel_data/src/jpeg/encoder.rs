//! The JPEG Baseline (Process 1) encoder.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use crate::codec::{EncodeOptions, PixelDataCodecError};
use crate::jpeg::bit_writer::BitWriter;
use crate::jpeg::color::{self, ChromaSubsampling, ComponentPlane};
use crate::jpeg::{dct, markers, tables};
use crate::pixel_data_definition::{
  BitsAllocated, PhotometricInterpretation, PixelDataDefinition,
};

/// One image component being encoded: its samples, sampling factors, and
/// the quantization and Huffman tables it uses.
///
struct EncodeComponent {
  plane: ComponentPlane,
  horizontal_sampling: usize,
  vertical_sampling: usize,
  quantization_table_id: u8,
  huffman_table_id: u8,
}

/// Encodes a single frame of 8-bit pixel data as baseline JPEG.
///
pub fn encode_frame(
  frame: &[u8],
  definition: &PixelDataDefinition,
  options: &EncodeOptions,
) -> Result<Vec<u8>, PixelDataCodecError> {
  if definition.bits_allocated != BitsAllocated::Eight {
    return Err(PixelDataCodecError::new(
      "JPEG Baseline encoding requires 8 bits allocated",
    ));
  }

  let width = usize::from(definition.columns);
  let height = usize::from(definition.rows);

  if frame.len() != width * height * usize::from(definition.samples_per_pixel)
  {
    return Err(PixelDataCodecError::new(
      "Frame data size does not match the pixel data definition",
    ));
  }

  let luminance_table = tables::scale_quantization_table(
    &tables::LUMINANCE_QUANTIZATION_TABLE,
    options.quality,
  );
  let chrominance_table = tables::scale_quantization_table(
    &tables::CHROMINANCE_QUANTIZATION_TABLE,
    options.quality,
  );

  // Assemble the components to encode
  let components = match definition.photometric_interpretation {
    PhotometricInterpretation::Monochrome1
    | PhotometricInterpretation::Monochrome2 => {
      vec![EncodeComponent {
        plane: ComponentPlane {
          width,
          height,
          samples: frame.to_vec(),
        },
        horizontal_sampling: 1,
        vertical_sampling: 1,
        quantization_table_id: 0,
        huffman_table_id: 0,
      }]
    }

    PhotometricInterpretation::Rgb
    | PhotometricInterpretation::YbrFull => {
      let (y, cb, cr) = if definition.photometric_interpretation
        == PhotometricInterpretation::Rgb
      {
        color::rgb_to_planes(
          frame,
          width,
          height,
          options.chroma_subsampling,
        )
      } else {
        ybr_planes(frame, width, height, options.chroma_subsampling)
      };

      let (h, v) = options.chroma_subsampling.sampling_factors();

      vec![
        EncodeComponent {
          plane: y,
          horizontal_sampling: h,
          vertical_sampling: v,
          quantization_table_id: 0,
          huffman_table_id: 0,
        },
        EncodeComponent {
          plane: cb,
          horizontal_sampling: 1,
          vertical_sampling: 1,
          quantization_table_id: 1,
          huffman_table_id: 1,
        },
        EncodeComponent {
          plane: cr,
          horizontal_sampling: 1,
          vertical_sampling: 1,
          quantization_table_id: 1,
          huffman_table_id: 1,
        },
      ]
    }

    _ => {
      return Err(PixelDataCodecError::new(
        "Photometric interpretation is not supported by the JPEG Baseline \
          encoder",
      ));
    }
  };

  let mut output = vec![];

  write_headers(
    &mut output,
    &components,
    width,
    height,
    &luminance_table,
    &chrominance_table,
  );

  output.extend_from_slice(&encode_scan(
    &components,
    &luminance_table,
    &chrominance_table,
  ));

  output.extend_from_slice(&[0xFF, markers::EOI]);

  // Encapsulated fragments must have even length
  if output.len() % 2 == 1 {
    output.push(0x00);
  }

  Ok(output)
}

/// Splits interleaved YCbCr samples into planes, downsampling chroma.
///
fn ybr_planes(
  frame: &[u8],
  width: usize,
  height: usize,
  subsampling: ChromaSubsampling,
) -> (ComponentPlane, ComponentPlane, ComponentPlane) {
  let mut y = ComponentPlane::new(width, height);
  let mut cb = ComponentPlane::new(width, height);
  let mut cr = ComponentPlane::new(width, height);

  for i in 0..width * height {
    y.samples[i] = frame[i * 3];
    cb.samples[i] = frame[i * 3 + 1];
    cr.samples[i] = frame[i * 3 + 2];
  }

  (
    y,
    downsample_plane(cb, subsampling),
    downsample_plane(cr, subsampling),
  )
}

fn downsample_plane(
  plane: ComponentPlane,
  subsampling: ChromaSubsampling,
) -> ComponentPlane {
  let (h, v) = subsampling.sampling_factors();

  if h == 1 && v == 1 {
    return plane;
  }

  let width = plane.width.div_ceil(h);
  let height = plane.height.div_ceil(v);

  let mut result = ComponentPlane::new(width, height);

  for y in 0..height {
    for x in 0..width {
      let mut sum = 0u32;
      for dy in 0..v {
        for dx in 0..h {
          sum += u32::from(plane.sample(x * h + dx, y * v + dy));
        }
      }

      result.samples[y * width + x] = (sum / (h * v) as u32) as u8;
    }
  }

  result
}

/// Writes all marker segments up to and including the SOS header.
///
fn write_headers(
  output: &mut Vec<u8>,
  components: &[EncodeComponent],
  width: usize,
  height: usize,
  luminance_table: &[u16; 64],
  chrominance_table: &[u16; 64],
) {
  output.extend_from_slice(&[0xFF, markers::SOI]);

  // APP0 JFIF header
  output.extend_from_slice(&[0xFF, markers::APP0]);
  output.extend_from_slice(&16u16.to_be_bytes());
  output.extend_from_slice(b"JFIF\0");
  output.extend_from_slice(&[0x01, 0x01, 0x00]);
  output.extend_from_slice(&1u16.to_be_bytes());
  output.extend_from_slice(&1u16.to_be_bytes());
  output.extend_from_slice(&[0x00, 0x00]);

  // DQT segments. Table entries are stored in zigzag order.
  write_quantization_table(output, 0, luminance_table);
  if components.len() > 1 {
    write_quantization_table(output, 1, chrominance_table);
  }

  // SOF0 frame header
  let sof_length = 8 + components.len() * 3;
  output.extend_from_slice(&[0xFF, markers::SOF0]);
  output.extend_from_slice(&(sof_length as u16).to_be_bytes());
  output.push(8);
  output.extend_from_slice(&(height as u16).to_be_bytes());
  output.extend_from_slice(&(width as u16).to_be_bytes());
  output.push(components.len() as u8);

  for (index, component) in components.iter().enumerate() {
    output.push(index as u8 + 1);
    output.push(
      ((component.horizontal_sampling as u8) << 4)
        | component.vertical_sampling as u8,
    );
    output.push(component.quantization_table_id);
  }

  // DHT segments
  write_huffman_table(output, 0, 0, &tables::DC_LUMINANCE_SPEC);
  write_huffman_table(output, 1, 0, &tables::AC_LUMINANCE_SPEC);
  if components.len() > 1 {
    write_huffman_table(output, 0, 1, &tables::DC_CHROMINANCE_SPEC);
    write_huffman_table(output, 1, 1, &tables::AC_CHROMINANCE_SPEC);
  }

  // SOS scan header
  let sos_length = 6 + components.len() * 2;
  output.extend_from_slice(&[0xFF, markers::SOS]);
  output.extend_from_slice(&(sos_length as u16).to_be_bytes());
  output.push(components.len() as u8);

  for (index, component) in components.iter().enumerate() {
    output.push(index as u8 + 1);
    output.push((component.huffman_table_id << 4) | component.huffman_table_id);
  }

  output.extend_from_slice(&[0, 63, 0]);
}

fn write_quantization_table(
  output: &mut Vec<u8>,
  table_id: u8,
  table: &[u16; 64],
) {
  output.extend_from_slice(&[0xFF, markers::DQT]);
  output.extend_from_slice(&67u16.to_be_bytes());
  output.push(table_id);

  for i in 0..64 {
    output.push(table[tables::ZIGZAG_ORDER[i]] as u8);
  }
}

fn write_huffman_table(
  output: &mut Vec<u8>,
  class: u8,
  table_id: u8,
  spec: &tables::HuffmanSpec,
) {
  let length = 19 + spec.values.len();

  output.extend_from_slice(&[0xFF, markers::DHT]);
  output.extend_from_slice(&(length as u16).to_be_bytes());
  output.push((class << 4) | table_id);
  output.extend_from_slice(&spec.counts);
  output.extend_from_slice(spec.values);
}

/// Entropy-encodes the scan: all MCUs in order, with each component's
/// blocks interleaved per its sampling factors.
///
fn encode_scan(
  components: &[EncodeComponent],
  luminance_table: &[u16; 64],
  chrominance_table: &[u16; 64],
) -> Vec<u8> {
  let dc_luminance = tables::HuffmanEncodeTable::new(&tables::DC_LUMINANCE_SPEC);
  let ac_luminance = tables::HuffmanEncodeTable::new(&tables::AC_LUMINANCE_SPEC);
  let dc_chrominance =
    tables::HuffmanEncodeTable::new(&tables::DC_CHROMINANCE_SPEC);
  let ac_chrominance =
    tables::HuffmanEncodeTable::new(&tables::AC_CHROMINANCE_SPEC);

  let max_horizontal_sampling = components
    .iter()
    .map(|c| c.horizontal_sampling)
    .max()
    .unwrap();
  let max_vertical_sampling = components
    .iter()
    .map(|c| c.vertical_sampling)
    .max()
    .unwrap();

  let image_width = components[0].plane.width;
  let image_height = components[0].plane.height;

  let mcus_across = image_width.div_ceil(8 * max_horizontal_sampling);
  let mcus_down = image_height.div_ceil(8 * max_vertical_sampling);

  let mut writer = BitWriter::new();
  let mut dc_predictors = vec![0i32; components.len()];

  for mcu_y in 0..mcus_down {
    for mcu_x in 0..mcus_across {
      for (component_index, component) in components.iter().enumerate() {
        let quantization_table = if component.quantization_table_id == 0 {
          luminance_table
        } else {
          chrominance_table
        };

        let (dc_table, ac_table) = if component.huffman_table_id == 0 {
          (&dc_luminance, &ac_luminance)
        } else {
          (&dc_chrominance, &ac_chrominance)
        };

        for block_y in 0..component.vertical_sampling {
          for block_x in 0..component.horizontal_sampling {
            let origin_x =
              (mcu_x * component.horizontal_sampling + block_x) * 8;
            let origin_y = (mcu_y * component.vertical_sampling + block_y) * 8;

            let coefficients = encode_block(
              &component.plane,
              origin_x,
              origin_y,
              quantization_table,
            );

            write_block(
              &mut writer,
              &coefficients,
              &mut dc_predictors[component_index],
              dc_table,
              ac_table,
            );
          }
        }
      }
    }
  }

  writer.finish()
}

/// Transforms and quantizes one 8x8 block, returning its coefficients in
/// zigzag order.
///
fn encode_block(
  plane: &ComponentPlane,
  origin_x: usize,
  origin_y: usize,
  quantization_table: &[u16; 64],
) -> [i32; 64] {
  // Extract the block, clamping samples beyond the plane's edges, and
  // level shift to be centered on zero
  let mut block = [0.0f32; 64];
  for y in 0..8 {
    for x in 0..8 {
      block[y * 8 + x] =
        f32::from(plane.sample(origin_x + x, origin_y + y)) - 128.0;
    }
  }

  let transformed = dct::forward(&block);

  // Quantize into zigzag order
  let mut coefficients = [0i32; 64];
  for i in 0..64 {
    let index = tables::ZIGZAG_ORDER[i];
    coefficients[i] = (transformed[index]
      / f32::from(quantization_table[index]))
    .round() as i32;
  }

  coefficients
}

/// Entropy-encodes one quantized block: the DC difference followed by the
/// run-length coded AC coefficients.
///
fn write_block(
  writer: &mut BitWriter,
  coefficients: &[i32; 64],
  dc_predictor: &mut i32,
  dc_table: &tables::HuffmanEncodeTable,
  ac_table: &tables::HuffmanEncodeTable,
) {
  // DC coefficient is coded as the difference from the previous block's
  let dc_difference = coefficients[0] - *dc_predictor;
  *dc_predictor = coefficients[0];

  let (category, bits) = magnitude_category(dc_difference);
  write_symbol(writer, dc_table, category);
  if category > 0 {
    writer.write_bits(bits, u32::from(category));
  }

  // AC coefficients are coded as (run of zeros, category) pairs
  let mut zero_run = 0;

  for coefficient in &coefficients[1..] {
    if *coefficient == 0 {
      zero_run += 1;
      continue;
    }

    // Runs longer than 15 zeros need ZRL symbols
    while zero_run > 15 {
      write_symbol(writer, ac_table, 0xF0);
      zero_run -= 16;
    }

    let (category, bits) = magnitude_category(*coefficient);
    write_symbol(writer, ac_table, (zero_run << 4) | category);
    writer.write_bits(bits, u32::from(category));

    zero_run = 0;
  }

  // End of block
  if zero_run > 0 {
    write_symbol(writer, ac_table, 0x00);
  }
}

fn write_symbol(
  writer: &mut BitWriter,
  table: &tables::HuffmanEncodeTable,
  symbol: u8,
) {
  let code = table.codes[usize::from(symbol)];
  let length = table.lengths[usize::from(symbol)];

  debug_assert!(length > 0, "Symbol has no Huffman code");

  writer.write_bits(u32::from(code), u32::from(length));
}

/// Returns the magnitude category of a value and the extra bits that encode
/// it within that category. Negative values are encoded as their value
/// minus one, keeping only the category's low bits.
///
fn magnitude_category(value: i32) -> (u8, u32) {
  if value == 0 {
    return (0, 0);
  }

  let magnitude = value.unsigned_abs();
  let category = 32 - magnitude.leading_zeros();

  let bits = if value < 0 {
    (value - 1) as u32 & ((1 << category) - 1)
  } else {
    value as u32
  };

  (category as u8, bits)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn magnitude_category_test() {
    assert_eq!(magnitude_category(0), (0, 0));
    assert_eq!(magnitude_category(1), (1, 1));
    assert_eq!(magnitude_category(-1), (1, 0));
    assert_eq!(magnitude_category(3), (2, 3));
    assert_eq!(magnitude_category(-3), (2, 0));
    assert_eq!(magnitude_category(-2), (2, 1));
    assert_eq!(magnitude_category(1023), (10, 1023));
    assert_eq!(magnitude_category(-1023), (10, 0));
  }
}
