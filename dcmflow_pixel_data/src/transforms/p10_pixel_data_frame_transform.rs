//! Extracts frames of pixel data from a stream of DICOM P10 tokens.

#[cfg(feature = "std")]
use std::collections::VecDeque;

#[cfg(not(feature = "std"))]
use alloc::{
  collections::VecDeque,
  format,
  string::{String, ToString},
  vec,
  vec::Vec,
};

use byteorder::ByteOrder;

use dcmflow_core::{
  DataElementTag, DataError, DataSet, DcmflowError, DataElementValue,
  RcByteSlice, dictionary,
};
use dcmflow_p10::{P10Error, P10Token};

use crate::PixelDataFrame;

/// This transform takes a stream of DICOM P10 tokens and emits the frames of
/// pixel data it contains. Each frame is returned with no copying of pixel
/// data, allowing for memory-efficient stream processing.
///
/// All native and encapsulated pixel data is supported.
///
pub struct P10PixelDataFrameTransform {
  is_encapsulated: bool,

  // The data elements needed to split pixel data into frames, materialized
  // from the token stream as they arrive in the root data set
  details: DataSet,
  pending_details_tag: Option<DataElementTag>,

  // When reading native pixel data, the size of a single frame in bits
  native_pixel_data_frame_size: u64,

  // Chunks of pixel data that have not yet been emitted as part of a frame.
  // The second value is a bit offset into the chunk where the un-emitted
  // frame data begins, which is only used for native pixel data.
  pixel_data: VecDeque<(RcByteSlice, u64)>,

  pixel_data_write_offset: u64,
  pixel_data_read_offset: u64,

  // The offset table used with encapsulated pixel data, read from the basic
  // offset table stored in the first pixel data item
  offset_table: Option<VecDeque<u64>>,

  next_frame_index: usize,
}

/// An error that occurred in the process of extracting frames of pixel data
/// from a stream of DICOM P10 tokens.
///
#[derive(Clone, Debug, PartialEq)]
pub enum P10PixelDataFrameTransformError {
  /// An error that occurred when adding a P10 token. This can happen when
  /// the stream of DICOM P10 tokens is invalid.
  P10Error(P10Error),

  /// An error that occurred when reading the data from the data elements in
  /// the stream of DICOM P10 tokens.
  DataError(DataError),
}

impl core::fmt::Display for P10PixelDataFrameTransformError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      Self::DataError(e) => e.fmt(f),
      Self::P10Error(e) => e.fmt(f),
    }
  }
}

impl DcmflowError for P10PixelDataFrameTransformError {
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    match self {
      Self::P10Error(e) => e.to_lines(task_description),
      Self::DataError(e) => e.to_lines(task_description),
    }
  }
}

/// The tags of the data elements materialized by the transform in order to
/// split pixel data into frames.
///
const DETAILS_TAGS: [DataElementTag; 4] = [
  dictionary::NUMBER_OF_FRAMES.tag,
  dictionary::ROWS.tag,
  dictionary::COLUMNS.tag,
  dictionary::BITS_ALLOCATED.tag,
];

impl P10PixelDataFrameTransform {
  /// Creates a new P10 pixel data frame transform to extract frames of
  /// pixel data from a stream of DICOM P10 tokens.
  ///
  pub fn new() -> Self {
    Self {
      is_encapsulated: false,
      details: DataSet::new(),
      pending_details_tag: None,
      native_pixel_data_frame_size: 0,
      pixel_data: VecDeque::new(),
      pixel_data_write_offset: 0,
      pixel_data_read_offset: 0,
      offset_table: None,
      next_frame_index: 0,
    }
  }

  /// Adds the next DICOM P10 token, returning any frames of pixel data that
  /// are now available.
  ///
  pub fn add_token(
    &mut self,
    token: &P10Token,
  ) -> Result<Vec<PixelDataFrame>, P10PixelDataFrameTransformError> {
    self
      .gather_details(token)
      .map_err(P10PixelDataFrameTransformError::DataError)?;

    match token {
      P10Token::DataElementHeader { tag, path, .. }
        if *tag == dictionary::PIXEL_DATA.tag && path.is_root() =>
      {
        self.is_encapsulated = false;
        self.prepare_native_pixel_data(token)?;
        Ok(vec![])
      }

      P10Token::SequenceStart { tag, path, .. }
        if *tag == dictionary::PIXEL_DATA.tag && path.is_root() =>
      {
        self.is_encapsulated = true;
        Ok(vec![])
      }

      P10Token::SequenceDelimiter { tag }
        if *tag == dictionary::PIXEL_DATA.tag && self.is_encapsulated =>
      {
        self.is_encapsulated = false;

        // If there is any remaining pixel data then emit it as a final
        // frame
        let mut frames = vec![];

        if !self.pixel_data.is_empty() {
          let mut frame = PixelDataFrame::new(self.next_frame_index);
          self.next_frame_index += 1;

          for (chunk, _) in self.pixel_data.drain(..) {
            frame.push_chunk(chunk);
          }

          frames.push(frame);
        }

        Ok(frames)
      }

      // The size of an encapsulated item header is 8 bytes, which needs to
      // be included in the current offset so that offset table entries can
      // be matched
      P10Token::PixelDataItem { .. } if self.is_encapsulated => {
        self.pixel_data_write_offset += 64;
        Ok(vec![])
      }

      P10Token::DataElementValueBytes {
        tag,
        data,
        bytes_remaining,
        ..
      } if self.is_receiving_pixel_data(*tag) => {
        self.pixel_data.push_back((data.clone(), 0));
        self.pixel_data_write_offset += data.len() as u64 * 8;

        if self.is_encapsulated {
          if *bytes_remaining == 0 {
            self
              .get_pending_encapsulated_frames()
              .map_err(P10PixelDataFrameTransformError::DataError)
          } else {
            Ok(vec![])
          }
        } else if self.native_pixel_data_frame_size > 0 {
          self
            .get_pending_native_frames()
            .map_err(P10PixelDataFrameTransformError::DataError)
        } else {
          Ok(vec![])
        }
      }

      _ => Ok(vec![]),
    }
  }

  /// Materializes the data elements listed in [`DETAILS_TAGS`] from the
  /// token stream as they pass through.
  ///
  fn gather_details(&mut self, token: &P10Token) -> Result<(), DataError> {
    match token {
      P10Token::DataElementHeader { tag, path, .. }
        if path.is_root() && DETAILS_TAGS.contains(tag) =>
      {
        self.pending_details_tag = Some(*tag);
      }

      P10Token::DataElementValueBytes {
        tag, vr, data, ..
      } => {
        if self.pending_details_tag == Some(*tag) {
          self.pending_details_tag = None;
          self.details.insert(
            *tag,
            DataElementValue::new_binary_unchecked(*vr, data.clone()),
          );
        }
      }

      _ => (),
    }

    Ok(())
  }

  /// Returns the value for the *'(0028,0008) Number of Frames'* data
  /// element.
  ///
  pub fn get_number_of_frames(&self) -> usize {
    self
      .details
      .get_int_with_default::<usize>(dictionary::NUMBER_OF_FRAMES.tag, 1)
      .unwrap_or(1)
  }

  fn is_receiving_pixel_data(&self, tag: DataElementTag) -> bool {
    tag == dictionary::PIXEL_DATA.tag
      || (self.is_encapsulated && tag == dictionary::ITEM.tag)
  }

  /// Validates the native pixel data's length and computes the frame size
  /// in bits.
  ///
  fn prepare_native_pixel_data(
    &mut self,
    token: &P10Token,
  ) -> Result<(), P10PixelDataFrameTransformError> {
    let P10Token::DataElementHeader { length, .. } = token else {
      unreachable!();
    };

    let number_of_frames = self.get_number_of_frames();
    if number_of_frames == 0 {
      return Ok(());
    }

    let get_u16 = |tag: DataElementTag| -> Result<u64, DataError> {
      Ok(u64::from(self.details.get_int::<u16>(tag)?))
    };

    let bits_allocated = get_u16(dictionary::BITS_ALLOCATED.tag)
      .map_err(P10PixelDataFrameTransformError::DataError)?;

    self.native_pixel_data_frame_size = if bits_allocated == 1 {
      let rows = get_u16(dictionary::ROWS.tag)
        .map_err(P10PixelDataFrameTransformError::DataError)?;
      let columns = get_u16(dictionary::COLUMNS.tag)
        .map_err(P10PixelDataFrameTransformError::DataError)?;

      let pixel_count = rows * columns;
      let expected_length =
        (pixel_count * number_of_frames as u64).div_ceil(8);

      if u64::from(*length) != expected_length {
        return Err(P10PixelDataFrameTransformError::DataError(
          DataError::new_value_invalid(format!(
            "Bitmap pixel data has length {} bytes but {} bytes were \
              expected",
            *length, expected_length
          )),
        ));
      }

      pixel_count
    } else {
      if *length as usize % number_of_frames != 0 {
        return Err(P10PixelDataFrameTransformError::DataError(
          DataError::new_value_invalid(format!(
            "Multi-frame pixel data of length {} bytes does not divide \
              evenly into {} frames",
            *length, number_of_frames
          )),
        ));
      }

      (u64::from(*length) * 8) / (number_of_frames as u64)
    };

    Ok(())
  }

  /// Consumes native pixel data for as many frames as possible and returns
  /// them.
  ///
  fn get_pending_native_frames(
    &mut self,
  ) -> Result<Vec<PixelDataFrame>, DataError> {
    let mut frames = vec![];

    let frame_size = self.native_pixel_data_frame_size;

    while self.pixel_data_read_offset + frame_size
      <= self.pixel_data_write_offset
    {
      let mut frame = PixelDataFrame::new(self.next_frame_index);
      frame.set_bit_offset(self.pixel_data_read_offset as usize % 8);

      let mut frame_bits = 0;

      while frame_bits < frame_size {
        let (chunk, chunk_offset) = self.pixel_data.pop_front().unwrap();

        let chunk_bits = chunk.len() as u64 * 8 - chunk_offset;

        // If the whole of this chunk is needed for the next frame then add
        // it to the frame
        if chunk_bits <= frame_size - frame_bits {
          frame.push_chunk(chunk.drop((chunk_offset / 8) as usize));
          frame_bits += chunk_bits;
          self.pixel_data_read_offset += chunk_bits;
        }
        // Otherwise, take just the part of this chunk of pixel data needed
        // for the frame
        else {
          let length_in_bits = frame_size - frame_bits;
          frame.push_chunk(chunk.slice(
            (chunk_offset / 8) as usize,
            ((chunk_offset + length_in_bits).div_ceil(8)) as usize,
          ));

          // Put the unused part of the chunk back on so it can be used by
          // the next frame
          self
            .pixel_data
            .push_front((chunk, chunk_offset + length_in_bits));
          frame_bits += length_in_bits;
          self.pixel_data_read_offset += length_in_bits;
        }
      }

      // For native frame data, don't emit more frames than is specified by
      // the '(0028,0008) Number of Frames' data element. This matters for
      // 1bpp pixel data when the unused bits at the end of the data are
      // enough to contain one or more frames.
      if self.next_frame_index < self.get_number_of_frames() {
        frames.push(frame);
      }

      self.next_frame_index += 1;
    }

    Ok(frames)
  }

  /// Consumes encapsulated pixel data for as many frames as possible and
  /// returns them.
  ///
  fn get_pending_encapsulated_frames(
    &mut self,
  ) -> Result<Vec<PixelDataFrame>, DataError> {
    match self.offset_table.as_mut() {
      // If the basic offset table hasn't been read yet, read it now that
      // the first pixel data item is complete
      None => {
        self.offset_table = Some(self.read_basic_offset_table()?);
        self.pixel_data.clear();
        self.pixel_data_write_offset = 0;
        self.pixel_data_read_offset = 0;

        Ok(vec![])
      }

      Some(offset_table) => {
        let mut frames = vec![];

        if offset_table.is_empty() {
          // If the offset table is empty and there is more than one frame
          // then each pixel data item is treated as a single frame
          if self.get_number_of_frames() > 1 {
            let mut frame = PixelDataFrame::new(self.next_frame_index);
            self.next_frame_index += 1;

            for (chunk, _) in self.pixel_data.drain(..) {
              frame.push_chunk(chunk);
            }

            frames.push(frame);

            self.pixel_data_read_offset = self.pixel_data_write_offset;
          }
        } else {
          // Use the offset table to determine what frames to emit
          while let Some(next_frame_offset) = offset_table.get(1).copied() {
            if self.pixel_data_write_offset < next_frame_offset * 8 {
              break;
            }

            let mut frame = PixelDataFrame::new(self.next_frame_index);
            self.next_frame_index += 1;

            while self.pixel_data_read_offset < next_frame_offset * 8 {
              match self.pixel_data.pop_front() {
                Some((chunk, _)) => {
                  self.pixel_data_read_offset +=
                    (8 + chunk.len() as u64) * 8;
                  frame.push_chunk(chunk);
                }
                None => break,
              }
            }

            offset_table.pop_front();

            // Check that the frame ended exactly on the expected offset
            if self.pixel_data_read_offset != next_frame_offset * 8 {
              return Err(DataError::new_value_invalid(
                "Pixel data basic offset table is malformed".to_string(),
              ));
            }

            frames.push(frame);
          }
        }

        Ok(frames)
      }
    }
  }

  /// Reads the basic offset table out of the first pixel data item's
  /// chunks.
  ///
  fn read_basic_offset_table(
    &self,
  ) -> Result<VecDeque<u64>, DataError> {
    let mut offset_table_data = vec![];
    for (chunk, _) in self.pixel_data.iter() {
      offset_table_data.extend_from_slice(chunk);
    }

    if offset_table_data.is_empty() {
      return Ok(VecDeque::new());
    }

    // Validate the data's length is a multiple of 4
    if offset_table_data.len() % 4 != 0 {
      return Err(DataError::new_value_invalid(
        "Basic offset table length is not a multiple of 4".to_string(),
      ));
    }

    // Read data into u32 values
    let mut offsets = vec![0u32; offset_table_data.len() / 4];
    byteorder::LittleEndian::read_u32_into(&offset_table_data, &mut offsets);

    // Check that the first offset is zero. Ref: PS3.5 A.4.
    if offsets.first() != Some(&0) {
      return Err(DataError::new_value_invalid(
        "Basic offset table first value must be zero".to_string(),
      ));
    }

    // Check that the offsets are sorted
    if !offsets.is_sorted() {
      return Err(DataError::new_value_invalid(
        "Basic offset table values are not sorted".to_string(),
      ));
    }

    Ok(offsets.iter().map(|offset| u64::from(*offset)).collect())
  }
}

impl Default for P10PixelDataFrameTransform {
  fn default() -> Self {
    Self::new()
  }
}
