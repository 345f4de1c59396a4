//! The JPEG Baseline (Process 1) decoder.

#[cfg(not(feature = "std"))]
use alloc::{format, vec, vec::Vec};

use crate::codec::PixelDataCodecError;
use crate::jpeg::bit_reader::BitReader;
use crate::jpeg::color::{self, ComponentPlane};
use crate::jpeg::{dct, markers, tables};
use crate::pixel_data_definition::{
  PhotometricInterpretation, PixelDataDefinition,
};

/// The parsed headers of a baseline JPEG stream.
///
pub struct FrameHeader {
  pub width: usize,
  pub height: usize,
  pub components: Vec<ComponentHeader>,
  pub restart_interval: usize,
}

pub struct ComponentHeader {
  pub id: u8,
  pub horizontal_sampling: usize,
  pub vertical_sampling: usize,
  pub quantization_table_id: usize,
  pub dc_table_id: usize,
  pub ac_table_id: usize,
}

/// All state parsed from a JPEG stream's marker segments: the frame header,
/// quantization tables, Huffman tables, and the entropy-coded scan data.
///
struct ParsedStream<'a> {
  header: FrameHeader,
  quantization_tables: [Option<[u16; 64]>; 4],
  dc_tables: [Option<tables::HuffmanDecodeTable>; 4],
  ac_tables: [Option<tables::HuffmanDecodeTable>; 4],
  scan_data: &'a [u8],
}

/// Parses and validates a baseline JPEG stream's headers without decoding
/// its entropy-coded data.
///
pub fn parse_header(data: &[u8]) -> Result<FrameHeader, PixelDataCodecError> {
  Ok(parse_stream(data)?.header)
}

/// Decodes a baseline JPEG stream into interleaved samples whose layout
/// matches the pixel data definition's photometric interpretation:
/// grayscale for monochrome, RGB for RGB, and YCbCr for the YBR variants.
///
pub fn decode(
  data: &[u8],
  definition: &PixelDataDefinition,
  destination: &mut Vec<u8>,
) -> Result<(), PixelDataCodecError> {
  let stream = parse_stream(data)?;

  let width = stream.header.width;
  let height = stream.header.height;

  if width != usize::from(definition.columns)
    || height != usize::from(definition.rows)
  {
    return Err(PixelDataCodecError::new(&format!(
      "JPEG dimensions {}x{} do not match the expected {}x{}",
      width, height, definition.columns, definition.rows
    )));
  }

  if stream.header.components.len()
    != usize::from(definition.samples_per_pixel)
  {
    return Err(PixelDataCodecError::new(&format!(
      "JPEG has {} components but {} were expected",
      stream.header.components.len(),
      definition.samples_per_pixel
    )));
  }

  let planes = decode_scan(&stream)?;

  // Upsample subsampled components to the full image size
  let max_horizontal_sampling = stream
    .header
    .components
    .iter()
    .map(|c| c.horizontal_sampling)
    .max()
    .unwrap();
  let max_vertical_sampling = stream
    .header
    .components
    .iter()
    .map(|c| c.vertical_sampling)
    .max()
    .unwrap();

  let planes: Vec<ComponentPlane> = planes
    .into_iter()
    .zip(stream.header.components.iter())
    .map(|(plane, component)| {
      color::upsample(
        &plane,
        width,
        height,
        max_horizontal_sampling / component.horizontal_sampling,
        max_vertical_sampling / component.vertical_sampling,
      )
    })
    .collect();

  // Emit samples in the layout the pixel data definition expects
  match planes.as_slice() {
    [gray] => {
      destination.extend_from_slice(&gray.samples);
      Ok(())
    }

    [y, cb, cr] => {
      destination.reserve(width * height * 3);

      let convert_to_rgb = definition.photometric_interpretation
        == PhotometricInterpretation::Rgb;

      for i in 0..width * height {
        if convert_to_rgb {
          let (r, g, b) =
            color::ycbcr_to_rgb(y.samples[i], cb.samples[i], cr.samples[i]);
          destination.extend_from_slice(&[r, g, b]);
        } else {
          destination.extend_from_slice(&[
            y.samples[i],
            cb.samples[i],
            cr.samples[i],
          ]);
        }
      }

      Ok(())
    }

    _ => Err(PixelDataCodecError::new(
      "JPEG component count is not supported",
    )),
  }
}

/// Parses all marker segments of a JPEG stream into decoder state.
///
fn parse_stream(data: &[u8]) -> Result<ParsedStream<'_>, PixelDataCodecError> {
  let (segments, scan_start) = markers::scan_markers(data)?;

  match segments.first() {
    Some(segment) if segment.marker == markers::SOI => (),
    _ => return Err(PixelDataCodecError::new("JPEG data does not begin with SOI")),
  }

  if scan_start == 0 {
    return Err(PixelDataCodecError::new("JPEG data has no SOS marker"));
  }

  let mut frame: Option<(usize, usize, Vec<(u8, usize, usize, usize)>)> = None;
  let mut restart_interval = 0;
  let mut quantization_tables: [Option<[u16; 64]>; 4] = [None; 4];
  let mut dc_tables: [Option<tables::HuffmanDecodeTable>; 4] =
    [None, None, None, None];
  let mut ac_tables: [Option<tables::HuffmanDecodeTable>; 4] =
    [None, None, None, None];
  let mut scan_components: Vec<(u8, usize, usize)> = vec![];

  for segment in &segments {
    match segment.marker {
      markers::SOF0 => {
        frame = Some(parse_sof0(segment.payload, segment.offset)?);
      }

      // Any other frame type is not baseline
      0xC1..=0xCF if segment.marker != markers::DHT => {
        return Err(
          PixelDataCodecError::new("JPEG frame is not baseline")
            .with_offset(segment.offset as u64),
        );
      }

      markers::DQT => {
        parse_dqt(segment.payload, segment.offset, &mut quantization_tables)?;
      }

      markers::DHT => {
        parse_dht(
          segment.payload,
          segment.offset,
          &mut dc_tables,
          &mut ac_tables,
        )?;
      }

      markers::DRI => {
        if segment.payload.len() != 2 {
          return Err(
            PixelDataCodecError::new("DRI segment has invalid length")
              .with_offset(segment.offset as u64),
          );
        }

        restart_interval =
          usize::from(u16::from_be_bytes([segment.payload[0], segment.payload[1]]));
      }

      markers::SOS => {
        scan_components = parse_sos(segment.payload, segment.offset)?;
      }

      // APPn, COM, and DNL segments carry no decoding state
      _ => (),
    }
  }

  let (width, height, frame_components) = frame
    .ok_or_else(|| PixelDataCodecError::new("JPEG data has no SOF0 marker"))?;

  if frame_components.len() != scan_components.len() {
    return Err(PixelDataCodecError::new(
      "SOS component count does not match SOF0",
    ));
  }

  // Combine the frame and scan component information
  let mut components = Vec::with_capacity(frame_components.len());

  for (id, horizontal_sampling, vertical_sampling, quantization_table_id) in
    frame_components
  {
    let (_, dc_table_id, ac_table_id) = *scan_components
      .iter()
      .find(|(scan_id, _, _)| *scan_id == id)
      .ok_or_else(|| {
        PixelDataCodecError::new("SOS references an unknown component")
      })?;

    components.push(ComponentHeader {
      id,
      horizontal_sampling,
      vertical_sampling,
      quantization_table_id,
      dc_table_id,
      ac_table_id,
    });
  }

  Ok(ParsedStream {
    header: FrameHeader {
      width,
      height,
      components,
      restart_interval,
    },
    quantization_tables,
    dc_tables,
    ac_tables,
    scan_data: &data[scan_start..],
  })
}

type Sof0Components = Vec<(u8, usize, usize, usize)>;

fn parse_sof0(
  payload: &[u8],
  offset: usize,
) -> Result<(usize, usize, Sof0Components), PixelDataCodecError> {
  if payload.len() < 6 {
    return Err(
      PixelDataCodecError::new("SOF0 segment is truncated")
        .with_offset(offset as u64),
    );
  }

  let precision = payload[0];
  if precision != 8 {
    return Err(
      PixelDataCodecError::new(&format!(
        "JPEG precision {} is not supported, only 8-bit is valid for \
          baseline",
        precision
      ))
      .with_offset(offset as u64),
    );
  }

  let height = usize::from(u16::from_be_bytes([payload[1], payload[2]]));
  let width = usize::from(u16::from_be_bytes([payload[3], payload[4]]));

  if width == 0 || height == 0 {
    return Err(
      PixelDataCodecError::new("JPEG dimensions are invalid")
        .with_offset(offset as u64),
    );
  }

  let component_count = usize::from(payload[5]);
  if payload.len() != 6 + component_count * 3 {
    return Err(
      PixelDataCodecError::new("SOF0 segment has invalid length")
        .with_offset(offset as u64),
    );
  }

  let mut components = Vec::with_capacity(component_count);

  for i in 0..component_count {
    let id = payload[6 + i * 3];
    let sampling = payload[7 + i * 3];
    let quantization_table_id = usize::from(payload[8 + i * 3]);

    let horizontal_sampling = usize::from(sampling >> 4);
    let vertical_sampling = usize::from(sampling & 0x0F);

    if !(1..=2).contains(&horizontal_sampling)
      || !(1..=2).contains(&vertical_sampling)
      || quantization_table_id > 3
    {
      return Err(
        PixelDataCodecError::new("SOF0 component parameters are invalid")
          .with_offset(offset as u64),
      );
    }

    components.push((
      id,
      horizontal_sampling,
      vertical_sampling,
      quantization_table_id,
    ));
  }

  Ok((width, height, components))
}

fn parse_dqt(
  payload: &[u8],
  offset: usize,
  quantization_tables: &mut [Option<[u16; 64]>; 4],
) -> Result<(), PixelDataCodecError> {
  let mut i = 0;

  while i < payload.len() {
    let precision = payload[i] >> 4;
    let table_id = usize::from(payload[i] & 0x0F);
    i += 1;

    if table_id > 3 {
      return Err(
        PixelDataCodecError::new("DQT table id is invalid")
          .with_offset(offset as u64),
      );
    }

    let entry_size = if precision == 0 { 1 } else { 2 };
    if i + 64 * entry_size > payload.len() {
      return Err(
        PixelDataCodecError::new("DQT segment is truncated")
          .with_offset(offset as u64),
      );
    }

    // Table entries are stored in zigzag order
    let mut table = [0u16; 64];
    for entry in 0..64 {
      let value = if precision == 0 {
        u16::from(payload[i + entry])
      } else {
        u16::from_be_bytes([payload[i + entry * 2], payload[i + entry * 2 + 1]])
      };

      table[tables::ZIGZAG_ORDER[entry]] = value;
    }

    quantization_tables[table_id] = Some(table);
    i += 64 * entry_size;
  }

  Ok(())
}

fn parse_dht(
  payload: &[u8],
  offset: usize,
  dc_tables: &mut [Option<tables::HuffmanDecodeTable>; 4],
  ac_tables: &mut [Option<tables::HuffmanDecodeTable>; 4],
) -> Result<(), PixelDataCodecError> {
  let mut i = 0;

  while i < payload.len() {
    if i + 17 > payload.len() {
      return Err(
        PixelDataCodecError::new("DHT segment is truncated")
          .with_offset(offset as u64),
      );
    }

    let class = payload[i] >> 4;
    let table_id = usize::from(payload[i] & 0x0F);
    i += 1;

    if class > 1 || table_id > 3 {
      return Err(
        PixelDataCodecError::new("DHT table class or id is invalid")
          .with_offset(offset as u64),
      );
    }

    let mut counts = [0u8; 16];
    counts.copy_from_slice(&payload[i..i + 16]);
    i += 16;

    let value_count: usize = counts.iter().map(|c| usize::from(*c)).sum();
    if i + value_count > payload.len() {
      return Err(
        PixelDataCodecError::new("DHT segment is truncated")
          .with_offset(offset as u64),
      );
    }

    let table =
      tables::HuffmanDecodeTable::new(&counts, &payload[i..i + value_count]);

    if class == 0 {
      dc_tables[table_id] = Some(table);
    } else {
      ac_tables[table_id] = Some(table);
    }

    i += value_count;
  }

  Ok(())
}

fn parse_sos(
  payload: &[u8],
  offset: usize,
) -> Result<Vec<(u8, usize, usize)>, PixelDataCodecError> {
  if payload.is_empty() {
    return Err(
      PixelDataCodecError::new("SOS segment is truncated")
        .with_offset(offset as u64),
    );
  }

  let component_count = usize::from(payload[0]);

  if payload.len() != 1 + component_count * 2 + 3 {
    return Err(
      PixelDataCodecError::new("SOS segment has invalid length")
        .with_offset(offset as u64),
    );
  }

  let mut components = Vec::with_capacity(component_count);

  for i in 0..component_count {
    let id = payload[1 + i * 2];
    let table_ids = payload[2 + i * 2];

    components.push((
      id,
      usize::from(table_ids >> 4),
      usize::from(table_ids & 0x0F),
    ));
  }

  Ok(components)
}

/// Decodes the entropy-coded scan into one plane per component. Subsampled
/// components decode at their subsampled size.
///
fn decode_scan(
  stream: &ParsedStream<'_>,
) -> Result<Vec<ComponentPlane>, PixelDataCodecError> {
  let header = &stream.header;

  let max_horizontal_sampling = header
    .components
    .iter()
    .map(|c| c.horizontal_sampling)
    .max()
    .unwrap();
  let max_vertical_sampling = header
    .components
    .iter()
    .map(|c| c.vertical_sampling)
    .max()
    .unwrap();

  let mcus_across = header.width.div_ceil(8 * max_horizontal_sampling);
  let mcus_down = header.height.div_ceil(8 * max_vertical_sampling);

  // Each component decodes into a plane sized to whole MCUs; it is cropped
  // to the image size at the end
  let mut planes: Vec<ComponentPlane> = header
    .components
    .iter()
    .map(|component| {
      ComponentPlane::new(
        mcus_across * component.horizontal_sampling * 8,
        mcus_down * component.vertical_sampling * 8,
      )
    })
    .collect();

  let mut reader = BitReader::new(stream.scan_data);
  let mut dc_predictors = vec![0i32; header.components.len()];
  let mut mcus_until_restart = header.restart_interval;

  for mcu_y in 0..mcus_down {
    for mcu_x in 0..mcus_across {
      // Handle the restart interval: expect a restart marker and reset the
      // DC predictors
      if header.restart_interval > 0
        && mcus_until_restart == 0
        && (mcu_x != 0 || mcu_y != 0)
      {
        match reader.read_restart_marker() {
          Some(marker)
            if (markers::RST0..=markers::RST7).contains(&marker) =>
          {
            dc_predictors = vec![0i32; header.components.len()];
            mcus_until_restart = header.restart_interval;
          }

          _ => {
            return Err(
              PixelDataCodecError::new("Expected a restart marker")
                .with_offset(reader.position() as u64),
            );
          }
        }
      }

      for (component_index, component) in header.components.iter().enumerate()
      {
        let quantization_table = stream.quantization_tables
          [component.quantization_table_id]
          .as_ref()
          .ok_or_else(|| {
            PixelDataCodecError::new("Quantization table is not defined")
          })?;

        let dc_table = stream.dc_tables[component.dc_table_id]
          .as_ref()
          .ok_or_else(|| {
            PixelDataCodecError::new("DC Huffman table is not defined")
          })?;

        let ac_table = stream.ac_tables[component.ac_table_id]
          .as_ref()
          .ok_or_else(|| {
            PixelDataCodecError::new("AC Huffman table is not defined")
          })?;

        for block_y in 0..component.vertical_sampling {
          for block_x in 0..component.horizontal_sampling {
            let samples = decode_block(
              &mut reader,
              dc_table,
              ac_table,
              quantization_table,
              &mut dc_predictors[component_index],
            )?;

            // Write the block's samples into the component plane
            let plane = &mut planes[component_index];
            let origin_x =
              (mcu_x * component.horizontal_sampling + block_x) * 8;
            let origin_y =
              (mcu_y * component.vertical_sampling + block_y) * 8;

            for y in 0..8 {
              for x in 0..8 {
                plane.samples
                  [(origin_y + y) * plane.width + origin_x + x] =
                  samples[y * 8 + x];
              }
            }
          }
        }
      }

      mcus_until_restart = mcus_until_restart.saturating_sub(1);
    }
  }

  // Crop the planes to their component's actual size
  let planes = planes
    .into_iter()
    .zip(header.components.iter())
    .map(|(plane, component)| {
      let width = (header.width * component.horizontal_sampling)
        .div_ceil(max_horizontal_sampling);
      let height = (header.height * component.vertical_sampling)
        .div_ceil(max_vertical_sampling);

      let mut cropped = ComponentPlane::new(width, height);
      for y in 0..height {
        for x in 0..width {
          cropped.samples[y * width + x] = plane.samples[y * plane.width + x];
        }
      }

      cropped
    })
    .collect();

  Ok(planes)
}

/// Decodes one 8x8 block: the DC difference, the run-length coded AC
/// coefficients, dequantization, and the inverse transform.
///
fn decode_block(
  reader: &mut BitReader<'_>,
  dc_table: &tables::HuffmanDecodeTable,
  ac_table: &tables::HuffmanDecodeTable,
  quantization_table: &[u16; 64],
  dc_predictor: &mut i32,
) -> Result<[u8; 64], PixelDataCodecError> {
  let mut coefficients = [0i32; 64];

  // DC coefficient
  let category = decode_symbol(reader, dc_table)?;
  let difference = if category > 0 {
    extend(reader.read_bits(u32::from(category))?, u32::from(category))
  } else {
    0
  };

  *dc_predictor += difference;
  coefficients[0] = *dc_predictor;

  // AC coefficients
  let mut k = 1;
  while k < 64 {
    let run_size = decode_symbol(reader, ac_table)?;

    let run = usize::from(run_size >> 4);
    let size = u32::from(run_size & 0x0F);

    if size == 0 {
      // End of block, unless this is a ZRL symbol that skips 16 zeros
      if run == 15 {
        k += 16;
        continue;
      }

      break;
    }

    k += run;
    if k >= 64 {
      return Err(
        PixelDataCodecError::new("AC coefficient index is out of range")
          .with_offset(reader.position() as u64),
      );
    }

    coefficients[k] = extend(reader.read_bits(size)?, size);
    k += 1;
  }

  // Dequantize, mapping out of zigzag order
  let mut block = [0.0f32; 64];
  for i in 0..64 {
    let index = tables::ZIGZAG_ORDER[i];
    block[index] =
      coefficients[i] as f32 * f32::from(quantization_table[index]);
  }

  // Inverse transform, undo the level shift, and clamp
  let spatial = dct::inverse(&block);

  let mut samples = [0u8; 64];
  for i in 0..64 {
    samples[i] = (spatial[i] + 128.0).round().clamp(0.0, 255.0) as u8;
  }

  Ok(samples)
}

/// Decodes one Huffman-coded symbol bit by bit using the canonical code
/// ranges of each code length.
///
fn decode_symbol(
  reader: &mut BitReader<'_>,
  table: &tables::HuffmanDecodeTable,
) -> Result<u8, PixelDataCodecError> {
  let mut code = 0i32;

  for length in 1..=16 {
    code = (code << 1) | reader.read_bit()? as i32;

    if table.max_code[length] >= code && code >= table.min_code[length] {
      let index =
        table.value_index[length] + (code - table.min_code[length]) as usize;

      return table.values.get(index).copied().ok_or_else(|| {
        PixelDataCodecError::new("Huffman code maps to no symbol")
          .with_offset(reader.position() as u64)
      });
    }
  }

  Err(
    PixelDataCodecError::new("Invalid Huffman code")
      .with_offset(reader.position() as u64),
  )
}

/// Sign-extends a magnitude-category value: values below `2^(size-1)`
/// represent negative numbers.
///
fn extend(value: u32, size: u32) -> i32 {
  if size == 0 {
    return 0;
  }

  if value < (1 << (size - 1)) {
    value as i32 - (1 << size) + 1
  } else {
    value as i32
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extend_test() {
    assert_eq!(extend(1, 1), 1);
    assert_eq!(extend(0, 1), -1);
    assert_eq!(extend(3, 2), 3);
    assert_eq!(extend(0, 2), -3);
    assert_eq!(extend(1, 2), -2);
    assert_eq!(extend(1023, 10), 1023);
    assert_eq!(extend(0, 10), -1023);
  }
}
