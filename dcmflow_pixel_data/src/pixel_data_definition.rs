//! Specifies values of data elements relevant to parsing pixel data.

#[cfg(not(feature = "std"))]
use alloc::{format, string::ToString};

use dcmflow_core::{DataError, DataSet, dictionary};

/// Holds values of all of the data elements relevant to decoding and
/// decompressing pixel data.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PixelDataDefinition {
  pub samples_per_pixel: u16,
  pub photometric_interpretation: PhotometricInterpretation,
  pub planar_configuration: PlanarConfiguration,
  pub rows: u16,
  pub columns: u16,
  pub bits_allocated: BitsAllocated,
  pub pixel_representation: PixelRepresentation,
  pub number_of_frames: usize,
}

impl PixelDataDefinition {
  /// Creates a new [`PixelDataDefinition`] from the relevant data elements
  /// in the given data set.
  ///
  pub fn from_data_set(data_set: &DataSet) -> Result<Self, DataError> {
    let samples_per_pixel =
      data_set.get_int::<u16>(dictionary::SAMPLES_PER_PIXEL.tag)?;

    if samples_per_pixel != 1 && samples_per_pixel != 3 {
      return Err(DataError::new_value_invalid(format!(
        "Samples per pixel '{}' is invalid",
        samples_per_pixel
      )));
    }

    let photometric_interpretation =
      PhotometricInterpretation::from_data_set(data_set)?;
    let planar_configuration = PlanarConfiguration::from_data_set(data_set)?;
    let bits_allocated = BitsAllocated::from_data_set(data_set)?;
    let pixel_representation = PixelRepresentation::from_data_set(data_set)?;

    let rows = data_set.get_int::<u16>(dictionary::ROWS.tag)?;
    let columns = data_set.get_int::<u16>(dictionary::COLUMNS.tag)?;

    let number_of_frames = data_set
      .get_int_with_default::<i64>(dictionary::NUMBER_OF_FRAMES.tag, 1)?;

    if number_of_frames < 0 {
      return Err(DataError::new_value_invalid(format!(
        "Number of frames '{}' is invalid",
        number_of_frames
      )));
    }

    Ok(Self {
      samples_per_pixel,
      photometric_interpretation,
      planar_configuration,
      rows,
      columns,
      bits_allocated,
      pixel_representation,
      number_of_frames: number_of_frames as usize,
    })
  }

  /// Returns the number of bits consumed by a single pixel.
  ///
  pub fn pixel_size_in_bits(&self) -> usize {
    match self.photometric_interpretation {
      // In 4:2:2 chroma subsampling the two chroma samples are shared
      // between two pixels
      PhotometricInterpretation::YbrFull422 => {
        2 * usize::from(self.bits_allocated)
      }

      _ => {
        usize::from(self.samples_per_pixel)
          * usize::from(self.bits_allocated)
      }
    }
  }

  /// Returns the number of pixels in a single frame.
  ///
  pub fn pixel_count(&self) -> usize {
    self.rows as usize * self.columns as usize
  }

  /// Returns the number of bytes consumed by a single frame of image data.
  ///
  /// If the size of a single frame of image data is not a whole number of
  /// bytes, which is possible when [`Self::bits_allocated`] is
  /// [`BitsAllocated::One`], then the result is rounded up to a whole
  /// number of bytes.
  ///
  pub fn frame_size_in_bytes(&self) -> usize {
    (self.pixel_count() * self.pixel_size_in_bits()).div_ceil(8)
  }

  /// Returns the number of bits consumed by a single frame of image data.
  ///
  pub fn frame_size_in_bits(&self) -> usize {
    self.pixel_count() * self.pixel_size_in_bits()
  }

  /// Returns whether this pixel data definition defines grayscale pixel
  /// data.
  ///
  pub fn is_grayscale(&self) -> bool {
    matches!(
      self.photometric_interpretation,
      PhotometricInterpretation::Monochrome1
        | PhotometricInterpretation::Monochrome2
    )
  }
}

/// The color model of pixel data.
///
/// Ref: PS3.3 C.7.6.3.1.2.
///
#[derive(Clone, Debug, PartialEq)]
pub enum PhotometricInterpretation {
  /// Grayscale with the minimum sample value displayed as white.
  Monochrome1,

  /// Grayscale with the minimum sample value displayed as black.
  Monochrome2,

  /// Single-sample pixel values that index into color palette lookup
  /// tables.
  PaletteColor,

  /// Red, green, and blue color samples.
  Rgb,

  /// One luminance and two chrominance samples, with full chrominance
  /// resolution.
  YbrFull,

  /// One luminance and two chrominance samples, with the chrominance
  /// sampled at half horizontal resolution.
  YbrFull422,
}

impl PhotometricInterpretation {
  /// Reads the *'(0028,0004) Photometric Interpretation'* data element from
  /// the given data set.
  ///
  pub fn from_data_set(data_set: &DataSet) -> Result<Self, DataError> {
    let value =
      data_set.get_string(dictionary::PHOTOMETRIC_INTERPRETATION.tag)?;

    match value {
      "MONOCHROME1" => Ok(Self::Monochrome1),
      "MONOCHROME2" => Ok(Self::Monochrome2),
      "PALETTE COLOR" => Ok(Self::PaletteColor),
      "RGB" => Ok(Self::Rgb),
      "YBR_FULL" => Ok(Self::YbrFull),
      "YBR_FULL_422" => Ok(Self::YbrFull422),

      _ => Err(DataError::new_value_invalid(format!(
        "Photometric interpretation '{}' is not supported",
        value
      ))),
    }
  }

  /// Returns the defined term for this photometric interpretation, e.g.
  /// `"MONOCHROME2"`.
  ///
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Monochrome1 => "MONOCHROME1",
      Self::Monochrome2 => "MONOCHROME2",
      Self::PaletteColor => "PALETTE COLOR",
      Self::Rgb => "RGB",
      Self::YbrFull => "YBR_FULL",
      Self::YbrFull422 => "YBR_FULL_422",
    }
  }
}

impl core::fmt::Display for PhotometricInterpretation {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Whether multi-sample pixel data stores its samples interleaved pixel by
/// pixel, or in separate planes per sample.
///
/// Ref: PS3.3 C.7.6.3.1.3.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlanarConfiguration {
  Interleaved,
  Separate,
}

impl PlanarConfiguration {
  /// Reads the *'(0028,0006) Planar Configuration'* data element from the
  /// given data set. Defaults to interleaved when the data element isn't
  /// present.
  ///
  pub fn from_data_set(data_set: &DataSet) -> Result<Self, DataError> {
    match data_set
      .get_int_with_default::<u16>(dictionary::PLANAR_CONFIGURATION.tag, 0)?
    {
      0 => Ok(Self::Interleaved),
      1 => Ok(Self::Separate),
      value => Err(DataError::new_value_invalid(format!(
        "Planar configuration '{}' is invalid",
        value
      ))),
    }
  }
}

/// The number of bits allocated to a single pixel sample.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BitsAllocated {
  One,
  Eight,
  Sixteen,
  ThirtyTwo,
}

impl BitsAllocated {
  /// Reads the *'(0028,0100) Bits Allocated'* data element from the given
  /// data set.
  ///
  pub fn from_data_set(data_set: &DataSet) -> Result<Self, DataError> {
    match data_set.get_int::<u16>(dictionary::BITS_ALLOCATED.tag)? {
      1 => Ok(Self::One),
      8 => Ok(Self::Eight),
      16 => Ok(Self::Sixteen),
      32 => Ok(Self::ThirtyTwo),
      value => Err(DataError::new_value_invalid(format!(
        "Bits allocated '{}' is invalid",
        value
      ))),
    }
  }
}

impl From<BitsAllocated> for usize {
  fn from(bits_allocated: BitsAllocated) -> usize {
    match bits_allocated {
      BitsAllocated::One => 1,
      BitsAllocated::Eight => 8,
      BitsAllocated::Sixteen => 16,
      BitsAllocated::ThirtyTwo => 32,
    }
  }
}

/// Whether pixel samples are unsigned or signed (two's complement) integers.
///
/// Ref: PS3.3 C.7.6.3.1.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelRepresentation {
  Unsigned,
  Signed,
}

impl PixelRepresentation {
  /// Reads the *'(0028,0103) Pixel Representation'* data element from the
  /// given data set.
  ///
  pub fn from_data_set(data_set: &DataSet) -> Result<Self, DataError> {
    match data_set
      .get_int_with_default::<u16>(dictionary::PIXEL_REPRESENTATION.tag, 0)?
    {
      0 => Ok(Self::Unsigned),
      1 => Ok(Self::Signed),
      value => Err(DataError::new_value_invalid(format!(
        "Pixel representation '{}' is invalid",
        value
      ))),
    }
  }

  /// Returns whether this is the signed pixel representation.
  ///
  pub fn is_signed(&self) -> bool {
    *self == Self::Signed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn test_data_set() -> DataSet {
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
    data_set.insert_int_value(&dictionary::ROWS, &[32]).unwrap();
    data_set
      .insert_int_value(&dictionary::COLUMNS, &[64])
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
  fn from_data_set_test() {
    let definition =
      PixelDataDefinition::from_data_set(&test_data_set()).unwrap();

    assert_eq!(definition.rows, 32);
    assert_eq!(definition.columns, 64);
    assert_eq!(definition.bits_allocated, BitsAllocated::Eight);
    assert_eq!(definition.number_of_frames, 1);
    assert_eq!(definition.frame_size_in_bytes(), 2048);
    assert!(definition.is_grayscale());
  }

  #[test]
  fn frame_size_rounds_up_for_bitmaps_test() {
    let mut data_set = test_data_set();
    data_set
      .insert_int_value(&dictionary::BITS_ALLOCATED, &[1])
      .unwrap();
    data_set.insert_int_value(&dictionary::ROWS, &[3]).unwrap();
    data_set
      .insert_int_value(&dictionary::COLUMNS, &[3])
      .unwrap();

    let definition = PixelDataDefinition::from_data_set(&data_set).unwrap();

    assert_eq!(definition.frame_size_in_bits(), 9);
    assert_eq!(definition.frame_size_in_bytes(), 2);
  }
}
