//! Reads frames of pixel data out of an in-memory data set.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec, vec::Vec};

use byteorder::ByteOrder;

use dcmflow_core::{
  DataError, DataSet, DcmflowError, RcByteSlice, dictionary, transfer_syntax,
  transfer_syntax::TransferSyntax,
};

use crate::codec::PixelDataCodecError;
use crate::pixel_data_definition::PixelDataDefinition;
use crate::pixel_data_frame::PixelDataFrame;
use crate::pixel_data_source::PixelDataSource;

/// An error that occurred when reading frames of pixel data from a data
/// set.
///
#[derive(Clone, Debug, PartialEq)]
pub enum PixelDataReadError {
  /// The data elements describing the pixel data were missing or invalid.
  DataError(DataError),

  /// The pixel data itself is malformed.
  PixelDataInvalid { details: String },

  /// The requested frame index is beyond the number of frames.
  FrameIndexOutOfRange { frame_index: usize },

  /// The pixel data couldn't be decoded by its codec.
  CodecError(PixelDataCodecError),

  /// There is no codec registered for the transfer syntax.
  CodecNotAvailable { transfer_syntax_uid: String },
}

impl core::fmt::Display for PixelDataReadError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      Self::DataError(e) => e.fmt(f),
      Self::PixelDataInvalid { details } => {
        write!(f, "Pixel data invalid: {}", details)
      }
      Self::FrameIndexOutOfRange { frame_index } => {
        write!(f, "Frame index {} is out of range", frame_index)
      }
      Self::CodecError(e) => e.fmt(f),
      Self::CodecNotAvailable {
        transfer_syntax_uid,
      } => {
        write!(f, "No codec is available for '{}'", transfer_syntax_uid)
      }
    }
  }
}

impl DcmflowError for PixelDataReadError {
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    match self {
      Self::DataError(e) => e.to_lines(task_description),
      Self::CodecError(e) => e.to_lines(task_description),
      e => vec![
        format!("Pixel data read error {}", task_description),
        "".into(),
        format!("  Error: {}", e),
      ],
    }
  }
}

/// Provides access to the frames of pixel data in a data set, reconstructing
/// frames from encapsulated fragments using the basic offset table when one
/// is present.
///
pub struct PixelDataReader {
  definition: PixelDataDefinition,
  transfer_syntax: &'static TransferSyntax,
  pixel_data: PixelData,
}

enum PixelData {
  /// Native pixel data: one contiguous run of frames.
  Native { source: PixelDataSource },

  /// Encapsulated pixel data: a basic offset table item plus fragments.
  Encapsulated {
    offset_table: Vec<u32>,
    fragments: Vec<RcByteSlice>,
  },
}

impl PixelDataReader {
  /// Creates a new pixel data reader for the *'(7FE0,0010) Pixel Data'*
  /// data element of the given data set. The transfer syntax is taken from
  /// the *'(0002,0010) Transfer Syntax UID'* data element when present,
  /// and otherwise defaults to 'Implicit VR Little Endian'.
  ///
  pub fn from_data_set(data_set: &DataSet) -> Result<Self, PixelDataReadError> {
    let definition = PixelDataDefinition::from_data_set(data_set)
      .map_err(PixelDataReadError::DataError)?;

    let transfer_syntax = match data_set
      .get_string(dictionary::TRANSFER_SYNTAX_UID.tag)
    {
      Ok(uid) => TransferSyntax::from_uid(uid).unwrap_or_else(|_| {
        TransferSyntax::new_unrecognized()
      }),
      Err(_) => &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
    };

    let value = data_set
      .get_value(dictionary::PIXEL_DATA.tag)
      .map_err(PixelDataReadError::DataError)?;

    let pixel_data = if let Ok(items) = value.encapsulated_pixel_data() {
      let (offset_table, fragments) = match items.as_slice() {
        [] => (vec![], vec![]),
        [offset_table_item, fragments @ ..] => (
          read_basic_offset_table(offset_table_item)?,
          fragments.to_vec(),
        ),
      };

      PixelData::Encapsulated {
        offset_table,
        fragments,
      }
    } else {
      let source = PixelDataSource::from_value(value).map_err(|_| {
        PixelDataReadError::PixelDataInvalid {
          details: "Pixel data value holds no data".into(),
        }
      })?;

      PixelData::Native { source }
    };

    Ok(Self {
      definition,
      transfer_syntax,
      pixel_data,
    })
  }

  /// Returns the pixel data definition describing the shape of the frames.
  ///
  pub fn definition(&self) -> &PixelDataDefinition {
    &self.definition
  }

  /// Returns the number of frames of pixel data.
  ///
  pub fn number_of_frames(&self) -> usize {
    self.definition.number_of_frames
  }

  /// Returns whether the pixel data is encapsulated.
  ///
  pub fn is_encapsulated(&self) -> bool {
    matches!(self.pixel_data, PixelData::Encapsulated { .. })
  }

  /// Returns one frame of pixel data in its stored form, without decoding.
  /// For native pixel data this is the frame's span of the pixel data
  /// value. For encapsulated pixel data the frame's fragments are gathered
  /// using the basic offset table when it is populated, a one-to-one
  /// mapping when the fragment count equals the frame count, and otherwise
  /// the codec's frame boundaries.
  ///
  pub fn frame(
    &self,
    frame_index: usize,
  ) -> Result<PixelDataFrame, PixelDataReadError> {
    if frame_index >= self.number_of_frames() {
      return Err(PixelDataReadError::FrameIndexOutOfRange { frame_index });
    }

    match &self.pixel_data {
      PixelData::Native { source } => self.native_frame(source, frame_index),

      PixelData::Encapsulated {
        offset_table,
        fragments,
      } => self.encapsulated_frame(offset_table, fragments, frame_index),
    }
  }

  /// Returns one frame of pixel data decoded into raw little-endian pixel
  /// values using the codec registered for the transfer syntax. Native
  /// pixel data is returned as-is.
  ///
  #[cfg(feature = "std")]
  pub fn decode_frame(
    &self,
    frame_index: usize,
  ) -> Result<Vec<u8>, PixelDataReadError> {
    let frame = self.frame(frame_index)?;

    if !self.transfer_syntax.is_encapsulated {
      return Ok(frame.to_bytes().into_vec());
    }

    let codec = crate::codec::codec_for_transfer_syntax(
      self.transfer_syntax.uid,
    )
    .ok_or_else(|| PixelDataReadError::CodecNotAvailable {
      transfer_syntax_uid: self.transfer_syntax.uid.into(),
    })?;

    let mut destination = Vec::with_capacity(
      self.definition.frame_size_in_bytes(),
    );

    codec
      .decode_frame(
        &frame.to_bytes(),
        &self.definition,
        frame_index,
        &mut destination,
      )
      .map_err(PixelDataReadError::CodecError)?;

    Ok(destination)
  }

  fn native_frame(
    &self,
    source: &PixelDataSource,
    frame_index: usize,
  ) -> Result<PixelDataFrame, PixelDataReadError> {
    let frame_size_in_bits = self.definition.frame_size_in_bits();

    let start_bit = frame_index * frame_size_in_bits;
    let end_bit = start_bit + frame_size_in_bits;

    let start_byte = start_bit / 8;
    let end_byte = end_bit.div_ceil(8);

    if (end_byte as u64) > source.length() {
      return Err(PixelDataReadError::PixelDataInvalid {
        details: format!(
          "Pixel data has {} bytes, which is too short for frame {}",
          source.length(),
          frame_index
        ),
      });
    }

    let bytes = source
      .read_span(start_byte as u64, end_byte - start_byte)
      .map_err(|details| PixelDataReadError::PixelDataInvalid { details })?;

    let mut frame = PixelDataFrame::new(frame_index);
    frame.push_chunk(bytes);
    frame.set_bit_offset(start_bit % 8);

    Ok(frame)
  }

  fn encapsulated_frame(
    &self,
    offset_table: &[u32],
    fragments: &[RcByteSlice],
    frame_index: usize,
  ) -> Result<PixelDataFrame, PixelDataReadError> {
    let mut frame = PixelDataFrame::new(frame_index);

    // When the offset table is populated it indexes the first fragment of
    // each frame directly
    if !offset_table.is_empty() {
      if offset_table.len() != self.number_of_frames() {
        return Err(PixelDataReadError::PixelDataInvalid {
          details: "Basic offset table entry count does not match the number \
            of frames"
            .into(),
        });
      }

      // Compute each fragment's offset as stored in the table: the offset
      // from the end of the basic offset table item, including the 8-byte
      // item header of each preceding fragment
      let mut fragment_offsets = Vec::with_capacity(fragments.len());
      let mut offset = 0u32;
      for fragment in fragments {
        fragment_offsets.push(offset);
        offset += 8 + fragment.len() as u32;
      }

      let start = fragment_offsets
        .iter()
        .position(|offset| *offset == offset_table[frame_index])
        .ok_or_else(|| PixelDataReadError::PixelDataInvalid {
          details: "Basic offset table entry does not land on a fragment \
            boundary"
            .into(),
        })?;

      let end_offset = offset_table.get(frame_index + 1).copied();

      for (fragment, fragment_offset) in fragments[start..]
        .iter()
        .zip(fragment_offsets[start..].iter())
      {
        if let Some(end_offset) = end_offset {
          if *fragment_offset >= end_offset {
            break;
          }
        }

        frame.push_chunk(fragment.clone());
      }

      return Ok(frame);
    }

    // With no offset table, a one-to-one mapping applies when the fragment
    // count matches the frame count
    if fragments.len() == self.number_of_frames() {
      frame.push_chunk(fragments[frame_index].clone());
      return Ok(frame);
    }

    // Otherwise fragments are concatenated into frames at the codec's frame
    // boundaries
    #[cfg(feature = "std")]
    {
      let codec = crate::codec::codec_for_transfer_syntax(
        self.transfer_syntax.uid,
      )
      .ok_or_else(|| PixelDataReadError::CodecNotAvailable {
        transfer_syntax_uid: self.transfer_syntax.uid.into(),
      })?;

      let mut current_frame_index = 0;

      for fragment in fragments {
        if current_frame_index == frame_index {
          frame.push_chunk(fragment.clone());
        }

        if codec.is_end_of_frame(fragment) {
          if current_frame_index == frame_index {
            return Ok(frame);
          }

          current_frame_index += 1;
        }
      }

      if !frame.is_empty() {
        return Ok(frame);
      }
    }

    Err(PixelDataReadError::PixelDataInvalid {
      details: format!(
        "Frame {} could not be reconstructed from {} fragments",
        frame_index,
        fragments.len()
      ),
    })
  }
}

/// Parses the content of the basic offset table item. The offsets must be
/// 32-bit values starting at zero in non-decreasing order.
///
fn read_basic_offset_table(
  item: &RcByteSlice,
) -> Result<Vec<u32>, PixelDataReadError> {
  if item.is_empty() {
    return Ok(vec![]);
  }

  if item.len() % 4 != 0 {
    return Err(PixelDataReadError::PixelDataInvalid {
      details: "Basic offset table length is not a multiple of 4".into(),
    });
  }

  let mut offsets = vec![0u32; item.len() / 4];
  byteorder::LittleEndian::read_u32_into(item, &mut offsets);

  if offsets.first() != Some(&0) {
    return Err(PixelDataReadError::PixelDataInvalid {
      details: "Basic offset table first value must be zero".into(),
    });
  }

  if !offsets.is_sorted() {
    return Err(PixelDataReadError::PixelDataInvalid {
      details: "Basic offset table values are not sorted".into(),
    });
  }

  Ok(offsets)
}

#[cfg(test)]
mod tests {
  use super::*;
  use dcmflow_core::DataElementValue;
  use dcmflow_core::ValueRepresentation;

  fn base_data_set() -> DataSet {
    let mut data_set = DataSet::new();

    data_set
      .insert_int_value(&dictionary::SAMPLES_PER_PIXEL, &[1])
      .unwrap();
    data_set
      .insert_string_value(
        &dictionary::PHOTOMETRIC_INTERPRETATION,
        &["MONOCHROME2"],
      )
      .unwrap();
    data_set.insert_int_value(&dictionary::ROWS, &[2]).unwrap();
    data_set
      .insert_int_value(&dictionary::COLUMNS, &[2])
      .unwrap();
    data_set
      .insert_int_value(&dictionary::BITS_ALLOCATED, &[8])
      .unwrap();
    data_set
      .insert_int_value(&dictionary::PIXEL_REPRESENTATION, &[0])
      .unwrap();

    data_set
  }

  #[test]
  fn native_frames_test() {
    let mut data_set = base_data_set();

    data_set
      .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[2])
      .unwrap();
    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_other_byte_string(vec![
        0, 1, 2, 3, 10, 11, 12, 13,
      ])
      .unwrap(),
    );

    let reader = PixelDataReader::from_data_set(&data_set).unwrap();

    assert_eq!(reader.number_of_frames(), 2);
    assert!(!reader.is_encapsulated());

    assert_eq!(&*reader.frame(0).unwrap().to_bytes(), &[0, 1, 2, 3]);
    assert_eq!(&*reader.frame(1).unwrap().to_bytes(), &[10, 11, 12, 13]);
    assert!(reader.frame(2).is_err());
  }

  #[test]
  fn encapsulated_fragment_per_frame_test() {
    let mut data_set = base_data_set();

    data_set
      .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[2])
      .unwrap();
    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_encapsulated_pixel_data_unchecked(
        ValueRepresentation::OtherByteString,
        vec![
          RcByteSlice::empty(),
          vec![1u8, 2].into(),
          vec![3u8, 4].into(),
        ],
      ),
    );

    let reader = PixelDataReader::from_data_set(&data_set).unwrap();

    assert!(reader.is_encapsulated());
    assert_eq!(&*reader.frame(0).unwrap().to_bytes(), &[1, 2]);
    assert_eq!(&*reader.frame(1).unwrap().to_bytes(), &[3, 4]);
  }

  #[test]
  fn encapsulated_offset_table_test() {
    let mut data_set = base_data_set();

    data_set
      .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[2])
      .unwrap();

    // Frame 0 is fragments of 2 and 4 bytes, frame 1 is one 2-byte
    // fragment. Offsets include the 8-byte item headers.
    let offset_table: Vec<u8> = [0u32, 22]
      .iter()
      .flat_map(|offset| offset.to_le_bytes())
      .collect();

    data_set.insert(
      dictionary::PIXEL_DATA.tag,
      DataElementValue::new_encapsulated_pixel_data_unchecked(
        ValueRepresentation::OtherByteString,
        vec![
          offset_table.into(),
          vec![1u8, 2].into(),
          vec![3u8, 4, 5, 6].into(),
          vec![7u8, 8].into(),
        ],
      ),
    );

    let reader = PixelDataReader::from_data_set(&data_set).unwrap();

    assert_eq!(&*reader.frame(0).unwrap().to_bytes(), &[1, 2, 3, 4, 5, 6]);
    assert_eq!(&*reader.frame(1).unwrap().to_bytes(), &[7, 8]);
  }
}
