//! Works with DICOM pixel data: accessing and reconstructing frames of
//! native and encapsulated pixel data, the pixel data codec interface and
//! registry, and the built-in JPEG Baseline and RLE Lossless codecs.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod codec;
pub mod encapsulation;
pub mod jpeg;
pub mod native;
pub mod pixel_data_definition;
pub mod pixel_data_frame;
pub mod pixel_data_reader;
pub mod pixel_data_source;
pub mod rle;
pub mod transforms;

pub use codec::{
  EncodeOptions, EncodedFrames, PixelDataCodec, PixelDataCodecError,
};
pub use jpeg::{ChromaSubsampling, JpegBaselineCodec};
pub use native::NativeCodec;
pub use pixel_data_definition::{
  BitsAllocated, PhotometricInterpretation, PixelDataDefinition,
  PixelRepresentation, PlanarConfiguration,
};
pub use pixel_data_frame::PixelDataFrame;
pub use pixel_data_reader::{PixelDataReadError, PixelDataReader};
pub use pixel_data_source::PixelDataSource;
pub use rle::RleLosslessCodec;
pub use transforms::p10_pixel_data_frame_transform::{
  P10PixelDataFrameTransform, P10PixelDataFrameTransformError,
};

#[cfg(feature = "std")]
pub use codec::{codec_for_transfer_syntax, register_codec};

use dcmflow_core::{DataElementValue, DataError, DataSet, dictionary};

/// Replaces the pixel data of a data set with frames encoded by the codec
/// for the given encapsulated transfer syntax, updating the *'(0002,0010)
/// Transfer Syntax UID'* data element to match.
///
#[cfg(feature = "std")]
pub fn encode_pixel_data(
  data_set: &mut DataSet,
  transfer_syntax: &'static dcmflow_core::TransferSyntax,
  options: &EncodeOptions,
) -> Result<(), PixelDataReadError> {
  let definition = PixelDataDefinition::from_data_set(data_set)
    .map_err(PixelDataReadError::DataError)?;

  let codec = codec_for_transfer_syntax(transfer_syntax.uid).ok_or_else(
    || PixelDataReadError::CodecNotAvailable {
      transfer_syntax_uid: transfer_syntax.uid.into(),
    },
  )?;

  let raw = data_set
    .get_value(dictionary::PIXEL_DATA.tag)
    .map_err(PixelDataReadError::DataError)?
    .bytes()
    .map_err(PixelDataReadError::DataError)?
    .clone();

  let encoded = codec
    .encode_frames(&raw, &definition, options)
    .map_err(PixelDataReadError::CodecError)?;

  let items = encapsulation::encoded_frames_to_items(encoded);

  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_encapsulated_pixel_data(
      dcmflow_core::ValueRepresentation::OtherByteString,
      items,
    )
    .map_err(PixelDataReadError::DataError)?,
  );

  data_set
    .insert_string_value(
      &dictionary::TRANSFER_SYNTAX_UID,
      &[transfer_syntax.uid],
    )
    .map_err(PixelDataReadError::DataError)?;

  Ok(())
}

/// Returns the number of frames of pixel data in a data set.
///
pub fn number_of_frames(data_set: &DataSet) -> Result<usize, DataError> {
  data_set.get_int_with_default::<usize>(dictionary::NUMBER_OF_FRAMES.tag, 1)
}
