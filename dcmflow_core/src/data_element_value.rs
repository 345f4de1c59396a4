//! A data element value that can hold any of the DICOM value representations.
//! Data element values are usually stored in a [`DataSet`] which maps data
//! element tags to data element values.

#[cfg(not(feature = "std"))]
use alloc::{
  format,
  string::{String, ToString},
  vec,
  vec::Vec,
};

use byteorder::ByteOrder;
use unicode_segmentation::UnicodeSegmentation;

use crate::{
  DataElementTag, DataError, DataSet, DataSourceHandle, RcByteSlice,
  ValueRepresentation, dictionary, utils,
};

pub mod attribute_tag;
pub mod date;
pub mod time;

pub use date::StructuredDate;
pub use time::StructuredTime;

/// A DICOM data element value that holds one of the following types of data:
///
/// 1. Binary value. A data element value that holds raw bytes for a specific
///    VR. This is the most common case. When the VR is a string type then the
///    bytes should be UTF-8 encoded. The data is always little endian.
///
/// 2. Lookup table descriptor value. A data element value that holds a lookup
///    table descriptor. The VR should be either
///    [`ValueRepresentation::SignedShort`] or
///    [`ValueRepresentation::UnsignedShort`], and there should be exactly six
///    bytes. The bytes contain three 16-bit integer values, the first and last
///    of which are unsigned, and the second of which is interpreted using the
///    specified VR. The data is always little endian.
///
/// 3. Encapsulated pixel data value. A data element value that holds the raw
///    items for an encapsulated pixel data sequence: an optional basic offset
///    table item followed by one or more fragments.
///
/// 4. Sequence value. A data element value that holds a sequence, which is a
///    list of nested data sets used to create hierarchies of data elements in
///    a DICOM data set.
///
/// 5. Lazy value. A data element value whose bytes have not been loaded into
///    memory. It holds a handle to a seekable data source along with the
///    absolute offset and length of its bytes, and reads them on request via
///    [`DataElementValue::load`].
///
/// Binary data is stored in reference counted byte slices so that values read
/// out of an input buffer share it rather than copy it. Raw bytes are parsed
/// and converted to a more usable type on request, which allows
/// non-conformant data to be passed through unaltered.
///
/// Ref: PS3.5 6.2.
///
#[derive(Clone, Debug, PartialEq)]
pub struct DataElementValue(RawDataElementValue);

#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::enum_variant_names)]
enum RawDataElementValue {
  BinaryValue {
    vr: ValueRepresentation,
    bytes: RcByteSlice,
  },
  LookupTableDescriptorValue {
    vr: ValueRepresentation,
    bytes: RcByteSlice,
  },
  EncapsulatedPixelDataValue {
    vr: ValueRepresentation,
    items: Vec<RcByteSlice>,
  },
  SequenceValue {
    items: Vec<DataSet>,
  },
  LazyValue {
    vr: ValueRepresentation,
    handle: LazyValueHandle,
  },
}

/// The handle held by a lazy data element value: the data source to read
/// from, and the absolute offset and length of the value's bytes within it.
///
#[derive(Clone)]
pub struct LazyValueHandle {
  pub source: DataSourceHandle,
  pub offset: u64,
  pub length: u64,
}

impl core::fmt::Debug for LazyValueHandle {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("LazyValueHandle")
      .field("offset", &self.offset)
      .field("length", &self.length)
      .finish()
  }
}

impl PartialEq for LazyValueHandle {
  /// Two lazy value handles are equal when they point at the same range of
  /// the same data source.
  ///
  fn eq(&self, other: &Self) -> bool {
    #[cfg(feature = "std")]
    let same_source = std::rc::Rc::ptr_eq(&self.source, &other.source);

    #[cfg(not(feature = "std"))]
    let same_source = alloc::rc::Rc::ptr_eq(&self.source, &other.source);

    same_source && self.offset == other.offset && self.length == other.length
  }
}

impl DataElementValue {
  /// Constructs a new data element binary value with the specified value
  /// representation. The only VR that's not allowed is
  /// [`ValueRepresentation::Sequence`]. The length of `bytes` must not exceed
  /// the maximum allowed for the VR, and, where applicable, must also be an
  /// exact multiple of the size of the contained data type.
  ///
  /// When the VR is a string type, `bytes` must be UTF-8 encoded in order for
  /// the value to be readable.
  ///
  pub fn new_binary(
    vr: ValueRepresentation,
    bytes: RcByteSlice,
  ) -> Result<Self, DataError> {
    if vr == ValueRepresentation::Sequence {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for binary data",
        vr
      )));
    }

    if vr.is_encoded_string() {
      if core::str::from_utf8(&bytes).is_err() {
        return Err(DataError::new_value_invalid(format!(
          "Bytes for '{}' are not valid UTF-8",
          vr
        )));
      }
    } else if vr.is_string() {
      let invalid_byte = (*bytes).iter().find(|b| {
        **b != 0x00
          && **b != 0x09
          && **b != 0x0A
          && **b != 0x0C
          && **b != 0x0D
          && **b != 0x1B
          && (**b < 0x20 || **b > 0x7E)
      });

      if let Some(invalid_byte) = invalid_byte {
        return Err(DataError::new_value_invalid(format!(
          "Bytes for '{}' has disallowed byte: 0x{:02X}",
          vr, *invalid_byte
        )));
      }
    }

    let value = Self::new_binary_unchecked(vr, bytes);

    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new data element binary value similar to
  /// [`Self::new_binary`], but does not validate `vr` or `bytes`.
  ///
  pub fn new_binary_unchecked(
    vr: ValueRepresentation,
    bytes: RcByteSlice,
  ) -> Self {
    Self(RawDataElementValue::BinaryValue { vr, bytes })
  }

  /// Constructs a new data element lookup table descriptor value. The `vr`
  /// must be either [`ValueRepresentation::SignedShort`] or
  /// [`ValueRepresentation::UnsignedShort`], and the length of `bytes` must
  /// be exactly six.
  ///
  pub fn new_lookup_table_descriptor(
    vr: ValueRepresentation,
    bytes: RcByteSlice,
  ) -> Result<Self, DataError> {
    if vr != ValueRepresentation::SignedShort
      && vr != ValueRepresentation::UnsignedShort
    {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for lookup table descriptor \
          data",
        vr
      )));
    }

    let value = Self::new_lookup_table_descriptor_unchecked(vr, bytes);

    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new data element lookup table descriptor value similar to
  /// [`Self::new_lookup_table_descriptor`], but does not validate `vr` or
  /// `bytes`.
  ///
  pub fn new_lookup_table_descriptor_unchecked(
    vr: ValueRepresentation,
    bytes: RcByteSlice,
  ) -> Self {
    Self(RawDataElementValue::LookupTableDescriptorValue { vr, bytes })
  }

  /// Constructs a new data element encapsulated pixel data value. The `vr`
  /// must be either [`ValueRepresentation::OtherByteString`] or
  /// [`ValueRepresentation::OtherWordString`].
  ///
  /// `items` specifies the data of the encapsulated pixel data items, where
  /// the first item is an optional basic offset table, and is followed by
  /// fragments of pixel data. Each item must be of even length.
  /// Ref: PS3.5 A.4.
  ///
  pub fn new_encapsulated_pixel_data(
    vr: ValueRepresentation,
    items: Vec<RcByteSlice>,
  ) -> Result<Self, DataError> {
    if vr != ValueRepresentation::OtherByteString
      && vr != ValueRepresentation::OtherWordString
    {
      return Err(DataError::new_value_invalid(format!(
        "Value representation '{}' is not valid for encapsulated pixel data",
        vr
      )));
    }

    let value = Self::new_encapsulated_pixel_data_unchecked(vr, items);

    value.validate_length()?;

    Ok(value)
  }

  /// Constructs a new data element encapsulated pixel data value similar to
  /// [`Self::new_encapsulated_pixel_data`], but does not validate `vr` or
  /// `items`.
  ///
  pub fn new_encapsulated_pixel_data_unchecked(
    vr: ValueRepresentation,
    items: Vec<RcByteSlice>,
  ) -> Self {
    Self(RawDataElementValue::EncapsulatedPixelDataValue { vr, items })
  }

  /// Creates a new `Sequence` data element value.
  ///
  pub fn new_sequence(items: Vec<DataSet>) -> Self {
    Self(RawDataElementValue::SequenceValue { items })
  }

  /// Constructs a new lazy data element value whose bytes are read on demand
  /// from the given data source.
  ///
  pub fn new_lazy(
    vr: ValueRepresentation,
    source: DataSourceHandle,
    offset: u64,
    length: u64,
  ) -> Self {
    Self(RawDataElementValue::LazyValue {
      vr,
      handle: LazyValueHandle {
        source,
        offset,
        length,
      },
    })
  }

  /// Creates a new `ApplicationEntity` data element value.
  ///
  pub fn new_application_entity(value: &str) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::ApplicationEntity,
      &[value.trim_matches(' ')],
    )
  }

  /// Creates a new `AttributeTag` data element value.
  ///
  pub fn new_attribute_tag(
    value: &[DataElementTag],
  ) -> Result<Self, DataError> {
    let bytes = attribute_tag::to_bytes(value);

    Self::new_binary(ValueRepresentation::AttributeTag, bytes.into())
  }

  /// Creates a new `CodeString` data element value.
  ///
  pub fn new_code_string(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::CodeString,
      &value
        .iter()
        .map(|s| s.trim_matches(' '))
        .collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `Date` data element value.
  ///
  pub fn new_date(value: &StructuredDate) -> Result<Self, DataError> {
    let bytes = value.to_bytes()?;

    Ok(Self::new_binary_unchecked(
      ValueRepresentation::Date,
      bytes.into(),
    ))
  }

  /// Creates a new `DecimalString` data element value.
  ///
  pub fn new_decimal_string(value: &[f64]) -> Result<Self, DataError> {
    let strings = value
      .iter()
      .map(|f| {
        let mut s = format!("{f:.10}");

        // Trim the fractional part down to the digits that carry information
        while s.ends_with('0') {
          s.pop();
        }
        if s.ends_with('.') {
          s.pop();
        }

        s
      })
      .collect::<Vec<String>>();

    new_string_list(
      ValueRepresentation::DecimalString,
      &strings.iter().map(|s| s.as_str()).collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `FloatingPointDouble` data element value.
  ///
  pub fn new_floating_point_double(value: &[f64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_f64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::FloatingPointDouble, bytes.into())
  }

  /// Creates a new `FloatingPointSingle` data element value.
  ///
  pub fn new_floating_point_single(value: &[f32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_f32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::FloatingPointSingle, bytes.into())
  }

  /// Creates a new `IntegerString` data element value.
  ///
  pub fn new_integer_string(value: &[i32]) -> Result<Self, DataError> {
    let strings = value.iter().map(|i| i.to_string()).collect::<Vec<String>>();

    new_string_list(
      ValueRepresentation::IntegerString,
      &strings.iter().map(|s| s.as_str()).collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `LongString` data element value.
  ///
  pub fn new_long_string(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::LongString,
      &value
        .iter()
        .map(|s| s.trim_matches(' '))
        .collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `LongText` data element value.
  ///
  pub fn new_long_text(value: &str) -> Result<Self, DataError> {
    let vr = ValueRepresentation::LongText;

    let mut bytes = value.trim_end_matches(' ').to_string().into_bytes();
    vr.pad_bytes_to_even_length(&mut bytes);

    Self::new_binary(vr, bytes.into())
  }

  /// Creates a new `OtherByteString` data element value.
  ///
  pub fn new_other_byte_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherByteString, value.into())
  }

  /// Creates a new `OtherWordString` data element value.
  ///
  pub fn new_other_word_string(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::OtherWordString, value.into())
  }

  /// Creates a new `PersonName` data element value.
  ///
  pub fn new_person_name(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::PersonName,
      &value
        .iter()
        .map(|s| s.trim_end_matches(' '))
        .collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `ShortString` data element value.
  ///
  pub fn new_short_string(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(
      ValueRepresentation::ShortString,
      &value
        .iter()
        .map(|s| s.trim_matches(' '))
        .collect::<Vec<&str>>(),
    )
  }

  /// Creates a new `ShortText` data element value.
  ///
  pub fn new_short_text(value: &str) -> Result<Self, DataError> {
    let vr = ValueRepresentation::ShortText;

    let mut bytes = value.trim_end_matches(' ').to_string().into_bytes();
    vr.pad_bytes_to_even_length(&mut bytes);

    Self::new_binary(vr, bytes.into())
  }

  /// Creates a new `SignedLong` data element value.
  ///
  pub fn new_signed_long(value: &[i32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_i32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedLong, bytes.into())
  }

  /// Creates a new `SignedShort` data element value.
  ///
  pub fn new_signed_short(value: &[i16]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 2];
    byteorder::LittleEndian::write_i16_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedShort, bytes.into())
  }

  /// Creates a new `SignedVeryLong` data element value.
  ///
  pub fn new_signed_very_long(value: &[i64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_i64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::SignedVeryLong, bytes.into())
  }

  /// Creates a new `Time` data element value.
  ///
  pub fn new_time(value: &StructuredTime) -> Result<Self, DataError> {
    let vr = ValueRepresentation::Time;

    let mut bytes = value.to_bytes()?;
    vr.pad_bytes_to_even_length(&mut bytes);

    Ok(Self::new_binary_unchecked(vr, bytes.into()))
  }

  /// Creates a new `UniqueIdentifier` data element value.
  ///
  pub fn new_unique_identifier(value: &[&str]) -> Result<Self, DataError> {
    new_string_list(ValueRepresentation::UniqueIdentifier, value)
  }

  /// Creates a new `Unknown` data element value.
  ///
  pub fn new_unknown(value: Vec<u8>) -> Result<Self, DataError> {
    Self::new_binary(ValueRepresentation::Unknown, value.into())
  }

  /// Creates a new `UnlimitedText` data element value.
  ///
  pub fn new_unlimited_text(value: &str) -> Result<Self, DataError> {
    let vr = ValueRepresentation::UnlimitedText;

    let mut bytes = value.trim_end_matches(' ').to_string().into_bytes();
    vr.pad_bytes_to_even_length(&mut bytes);

    Self::new_binary(vr, bytes.into())
  }

  /// Creates a new `UnsignedLong` data element value.
  ///
  pub fn new_unsigned_long(value: &[u32]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 4];
    byteorder::LittleEndian::write_u32_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedLong, bytes.into())
  }

  /// Creates a new `UnsignedShort` data element value.
  ///
  pub fn new_unsigned_short(value: &[u16]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 2];
    byteorder::LittleEndian::write_u16_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedShort, bytes.into())
  }

  /// Creates a new `UnsignedVeryLong` data element value.
  ///
  pub fn new_unsigned_very_long(value: &[u64]) -> Result<Self, DataError> {
    let mut bytes = vec![0u8; value.len() * 8];
    byteorder::LittleEndian::write_u64_into(value, &mut bytes);

    Self::new_binary(ValueRepresentation::UnsignedVeryLong, bytes.into())
  }

  /// Returns the value representation of a data element value.
  ///
  pub fn value_representation(&self) -> ValueRepresentation {
    match &self.0 {
      RawDataElementValue::BinaryValue { vr, .. }
      | RawDataElementValue::LookupTableDescriptorValue { vr, .. }
      | RawDataElementValue::EncapsulatedPixelDataValue { vr, .. }
      | RawDataElementValue::LazyValue { vr, .. } => *vr,
      RawDataElementValue::SequenceValue { .. } => {
        ValueRepresentation::Sequence
      }
    }
  }

  /// Returns the raw bytes of a data element value. Returns an error for
  /// sequences, encapsulated pixel data, and lazy values that have not been
  /// loaded.
  ///
  pub fn bytes(&self) -> Result<&RcByteSlice, DataError> {
    match &self.0 {
      RawDataElementValue::BinaryValue { bytes, .. }
      | RawDataElementValue::LookupTableDescriptorValue { bytes, .. } => {
        Ok(bytes)
      }
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the raw bytes of a data element value, but only if its VR is
  /// one of the specified allowed VRs.
  ///
  pub fn vr_bytes(
    &self,
    allowed_vrs: &[ValueRepresentation],
  ) -> Result<&RcByteSlice, DataError> {
    if !allowed_vrs.contains(&self.value_representation()) {
      return Err(DataError::new_value_not_present());
    }

    self.bytes()
  }

  /// Returns the items of an encapsulated pixel data value: the optional
  /// basic offset table item followed by the fragments.
  ///
  pub fn encapsulated_pixel_data(
    &self,
  ) -> Result<&Vec<RcByteSlice>, DataError> {
    match &self.0 {
      RawDataElementValue::EncapsulatedPixelDataValue { items, .. } => {
        Ok(items)
      }
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the item data sets of a sequence value.
  ///
  pub fn sequence_items(&self) -> Result<&[DataSet], DataError> {
    match &self.0 {
      RawDataElementValue::SequenceValue { items } => Ok(items),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the item data sets of a sequence value for mutation.
  ///
  pub fn sequence_items_mut(
    &mut self,
  ) -> Result<&mut Vec<DataSet>, DataError> {
    match &mut self.0 {
      RawDataElementValue::SequenceValue { items } => Ok(items),
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the handle of a lazy data element value, if this value is lazy.
  ///
  pub fn lazy_handle(&self) -> Option<&LazyValueHandle> {
    match &self.0 {
      RawDataElementValue::LazyValue { handle, .. } => Some(handle),
      _ => None,
    }
  }

  /// Returns whether this is a lazy value whose bytes have not been loaded
  /// into memory.
  ///
  pub fn is_lazy(&self) -> bool {
    matches!(&self.0, RawDataElementValue::LazyValue { .. })
  }

  /// For a lazy value, reads its bytes from the backing data source and
  /// returns the resulting fully materialized binary value. All other value
  /// types are returned as a cheap clone of themselves.
  ///
  pub fn load(&self) -> Result<Self, DataError> {
    match &self.0 {
      RawDataElementValue::LazyValue { vr, handle } => {
        let bytes = handle
          .source
          .read_span(handle.offset, handle.length as usize)
          .map_err(DataError::new_value_invalid)?;

        Ok(Self::new_binary_unchecked(*vr, bytes.into()))
      }

      _ => Ok(self.clone()),
    }
  }

  /// Returns a deep copy of this value backed by freshly allocated buffers,
  /// so that it shares no storage with the buffers it was read from.
  /// Sequences and encapsulated pixel data copy recursively. Lazy values are
  /// returned unaltered as they hold no borrowed bytes.
  ///
  pub fn to_owned(&self) -> Self {
    match &self.0 {
      RawDataElementValue::BinaryValue { vr, bytes } => {
        Self(RawDataElementValue::BinaryValue {
          vr: *vr,
          bytes: bytes.to_detached(),
        })
      }

      RawDataElementValue::LookupTableDescriptorValue { vr, bytes } => {
        Self(RawDataElementValue::LookupTableDescriptorValue {
          vr: *vr,
          bytes: bytes.to_detached(),
        })
      }

      RawDataElementValue::EncapsulatedPixelDataValue { vr, items } => {
        Self(RawDataElementValue::EncapsulatedPixelDataValue {
          vr: *vr,
          items: items.iter().map(RcByteSlice::to_detached).collect(),
        })
      }

      RawDataElementValue::SequenceValue { items } => {
        Self(RawDataElementValue::SequenceValue {
          items: items.iter().map(DataSet::to_owned).collect(),
        })
      }

      RawDataElementValue::LazyValue { .. } => self.clone(),
    }
  }

  /// Returns the total size in bytes of the data held by this value,
  /// including all nested values for sequences.
  ///
  pub fn total_byte_size(&self) -> u64 {
    match &self.0 {
      RawDataElementValue::BinaryValue { bytes, .. }
      | RawDataElementValue::LookupTableDescriptorValue { bytes, .. } => {
        bytes.len() as u64
      }

      RawDataElementValue::EncapsulatedPixelDataValue { items, .. } => {
        items.iter().map(|item| item.len() as u64).sum()
      }

      RawDataElementValue::SequenceValue { items } => {
        items.iter().map(DataSet::total_byte_size).sum()
      }

      RawDataElementValue::LazyValue { handle, .. } => handle.length,
    }
  }

  /// Returns the single string stored in this value. Returns an error if
  /// this value doesn't hold a string, holds more than one string, or its
  /// bytes are not valid UTF-8.
  ///
  pub fn get_string(&self) -> Result<&str, DataError> {
    match self.get_strings()?.as_slice() {
      [s] => Ok(s),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the strings stored in this value, splitting on the multi-value
  /// delimiter where the VR allows multiplicity.
  ///
  pub fn get_strings(&self) -> Result<Vec<&str>, DataError> {
    let RawDataElementValue::BinaryValue { vr, bytes } = &self.0 else {
      return Err(DataError::new_value_not_present());
    };

    if !vr.is_string() {
      return Err(DataError::new_value_not_present());
    }

    let value = core::str::from_utf8(bytes).map_err(|_| {
      DataError::new_value_invalid("String bytes are invalid UTF-8".to_string())
    })?;

    let strings = if vr.allows_multiplicity() {
      value.split('\\').collect()
    } else {
      vec![value]
    };

    let strings = strings
      .iter()
      .map(|s| match vr {
        ValueRepresentation::UniqueIdentifier => s.trim_end_matches('\0'),
        ValueRepresentation::PersonName => s.trim_end_matches(' '),
        _ => s.trim_matches(' '),
      })
      .collect();

    Ok(strings)
  }

  /// Returns the single integer stored in this value. Returns an error if
  /// this value doesn't hold an integer type, or holds more than one
  /// integer.
  ///
  pub fn get_int<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
  ) -> Result<T, DataError> {
    match self.get_ints()?.as_slice() {
      [i] => Ok(*i),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the integers stored in this value. Supported VRs are
  /// `IntegerString`, `SignedShort`, `SignedLong`, `UnsignedShort`, and
  /// `UnsignedLong`, as well as lookup table descriptors.
  ///
  pub fn get_ints<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
  ) -> Result<Vec<T>, DataError> {
    let ints: Vec<i64> = match &self.0 {
      RawDataElementValue::BinaryValue { vr, bytes } => match vr {
        ValueRepresentation::IntegerString => {
          let value = core::str::from_utf8(bytes).map_err(|_| {
            DataError::new_value_invalid(
              "IntegerString bytes are invalid UTF-8".to_string(),
            )
          })?;

          value
            .split('\\')
            .map(|s| {
              s.trim_matches(' ').parse::<i64>().map_err(|_| {
                DataError::new_value_invalid(format!(
                  "IntegerString value is invalid: {:?}",
                  s
                ))
              })
            })
            .collect::<Result<Vec<i64>, DataError>>()?
        }

        ValueRepresentation::SignedShort => read_int_values(bytes, 2, |b| {
          i64::from(byteorder::LittleEndian::read_i16(b))
        })?,

        ValueRepresentation::UnsignedShort => read_int_values(bytes, 2, |b| {
          i64::from(byteorder::LittleEndian::read_u16(b))
        })?,

        ValueRepresentation::SignedLong => read_int_values(bytes, 4, |b| {
          i64::from(byteorder::LittleEndian::read_i32(b))
        })?,

        ValueRepresentation::UnsignedLong => read_int_values(bytes, 4, |b| {
          i64::from(byteorder::LittleEndian::read_u32(b))
        })?,

        _ => return Err(DataError::new_value_not_present()),
      },

      RawDataElementValue::LookupTableDescriptorValue { vr, bytes } => {
        let (entry_count, first_input_value, bits_per_entry) =
          read_lookup_table_descriptor(*vr, bytes)?;

        vec![
          i64::from(entry_count),
          first_input_value,
          i64::from(bits_per_entry),
        ]
      }

      _ => return Err(DataError::new_value_not_present()),
    };

    ints
      .into_iter()
      .map(|i| {
        TryFrom::try_from(i).map_err(|_| {
          DataError::new_value_invalid(format!(
            "Integer value {} is out of range for the target type",
            i
          ))
        })
      })
      .collect()
  }

  /// Returns the three values of a lookup table descriptor. The first and
  /// third values are always unsigned; the second value is interpreted using
  /// this value's VR, so it can be negative.
  ///
  /// Ref: PS3.3 C.11.1.1.
  ///
  pub fn get_lookup_table_descriptor(
    &self,
  ) -> Result<(u16, i64, u16), DataError> {
    match &self.0 {
      RawDataElementValue::LookupTableDescriptorValue { vr, bytes } => {
        read_lookup_table_descriptor(*vr, bytes)
      }
      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the single big integer stored in this value. Supported VRs are
  /// `SignedVeryLong` and `UnsignedVeryLong`.
  ///
  pub fn get_big_int<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
  ) -> Result<T, DataError> {
    match self.get_big_ints()?.as_slice() {
      [i] => Ok(*i),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the big integers stored in this value. Supported VRs are
  /// `SignedVeryLong` and `UnsignedVeryLong`.
  ///
  pub fn get_big_ints<T: num_traits::PrimInt + TryFrom<i128>>(
    &self,
  ) -> Result<Vec<T>, DataError> {
    let RawDataElementValue::BinaryValue { vr, bytes } = &self.0 else {
      return Err(DataError::new_value_not_present());
    };

    let ints: Vec<i128> = match vr {
      ValueRepresentation::SignedVeryLong => {
        if bytes.len() % 8 != 0 {
          return Err(invalid_int_data_error());
        }

        bytes
          .chunks_exact(8)
          .map(|b| i128::from(byteorder::LittleEndian::read_i64(b)))
          .collect()
      }

      ValueRepresentation::UnsignedVeryLong => {
        if bytes.len() % 8 != 0 {
          return Err(invalid_int_data_error());
        }

        bytes
          .chunks_exact(8)
          .map(|b| i128::from(byteorder::LittleEndian::read_u64(b)))
          .collect()
      }

      _ => return Err(DataError::new_value_not_present()),
    };

    ints
      .into_iter()
      .map(|i| {
        TryFrom::try_from(i).map_err(|_| {
          DataError::new_value_invalid(format!(
            "Integer value {} is out of range for the target type",
            i
          ))
        })
      })
      .collect()
  }

  /// Returns the single float stored in this value. Returns an error if this
  /// value doesn't hold a float type, or holds more than one float.
  ///
  pub fn get_float(&self) -> Result<f64, DataError> {
    match self.get_floats()?.as_slice() {
      [f] => Ok(*f),
      _ => Err(DataError::new_multiplicity_mismatch()),
    }
  }

  /// Returns the floats stored in this value. Supported VRs are
  /// `DecimalString`, `FloatingPointSingle`, and `FloatingPointDouble`.
  ///
  pub fn get_floats(&self) -> Result<Vec<f64>, DataError> {
    let RawDataElementValue::BinaryValue { vr, bytes } = &self.0 else {
      return Err(DataError::new_value_not_present());
    };

    match vr {
      ValueRepresentation::DecimalString => {
        let value = core::str::from_utf8(bytes).map_err(|_| {
          DataError::new_value_invalid(
            "DecimalString bytes are invalid UTF-8".to_string(),
          )
        })?;

        value
          .split('\\')
          .map(|s| {
            s.trim_matches(' ').parse::<f64>().map_err(|_| {
              DataError::new_value_invalid(format!(
                "DecimalString value is invalid: {:?}",
                s
              ))
            })
          })
          .collect()
      }

      ValueRepresentation::FloatingPointSingle => {
        if bytes.len() % 4 != 0 {
          return Err(invalid_int_data_error());
        }

        Ok(
          bytes
            .chunks_exact(4)
            .map(|b| f64::from(byteorder::LittleEndian::read_f32(b)))
            .collect(),
        )
      }

      ValueRepresentation::FloatingPointDouble => {
        if bytes.len() % 8 != 0 {
          return Err(invalid_int_data_error());
        }

        Ok(
          bytes
            .chunks_exact(8)
            .map(byteorder::LittleEndian::read_f64)
            .collect(),
        )
      }

      _ => Err(DataError::new_value_not_present()),
    }
  }

  /// Returns the date stored in this value. The VR must be `Date`.
  ///
  pub fn get_date(&self) -> Result<StructuredDate, DataError> {
    let bytes = self.vr_bytes(&[ValueRepresentation::Date])?;

    StructuredDate::from_bytes(bytes)
  }

  /// Returns the time stored in this value. The VR must be `Time`.
  ///
  pub fn get_time(&self) -> Result<StructuredTime, DataError> {
    let bytes = self.vr_bytes(&[ValueRepresentation::Time])?;

    StructuredTime::from_bytes(bytes)
  }

  /// Validates the length of the data held by this value against the
  /// requirements of its value representation.
  ///
  pub fn validate_length(&self) -> Result<(), DataError> {
    let vr = self.value_representation();

    match &self.0 {
      RawDataElementValue::BinaryValue { bytes, .. } => {
        let requirements = vr.length_requirements();

        if bytes.len() > requirements.bytes_max {
          return Err(DataError::new_value_length_invalid(
            vr,
            bytes.len() as u64,
            format!("Exceeds the maximum of {} bytes", requirements.bytes_max),
          ));
        }

        if let Some(multiple_of) = requirements.bytes_multiple_of {
          if bytes.len() % multiple_of != 0 {
            return Err(DataError::new_value_length_invalid(
              vr,
              bytes.len() as u64,
              format!("Is not a multiple of {} bytes", multiple_of),
            ));
          }
        }

        Ok(())
      }

      RawDataElementValue::LookupTableDescriptorValue { bytes, .. } => {
        if bytes.len() == 6 {
          Ok(())
        } else {
          Err(DataError::new_value_length_invalid(
            vr,
            bytes.len() as u64,
            "Lookup table descriptor length must be exactly 6 bytes"
              .to_string(),
          ))
        }
      }

      RawDataElementValue::EncapsulatedPixelDataValue { items, .. } => {
        for item in items {
          if item.len() % 2 == 1 {
            return Err(DataError::new_value_length_invalid(
              vr,
              item.len() as u64,
              "Encapsulated pixel data item has odd length".to_string(),
            ));
          }
        }

        Ok(())
      }

      RawDataElementValue::SequenceValue { .. }
      | RawDataElementValue::LazyValue { .. } => Ok(()),
    }
  }

  /// Formats a data element value as a human-readable single line of text.
  /// Values longer than the output width are truncated with a trailing
  /// ellipsis.
  ///
  pub fn to_string(&self, output_width: usize) -> String {
    // Maximum number of items needed in a comma-separated list of values
    // before reaching the output width
    let output_list_max_size = output_width.div_ceil(3);

    let result: Result<(String, Option<String>), ()> = match &self.0 {
      RawDataElementValue::BinaryValue { vr, bytes } if vr.is_string() => {
        match core::str::from_utf8(bytes) {
          Ok(_) => {
            let formatted_value = match self.get_strings() {
              Ok(strings) => strings
                .iter()
                .take(output_list_max_size)
                .map(|s| format!("{:?}", s))
                .collect::<Vec<String>>()
                .join(", "),
              Err(_) => return "<error converting to string>".to_string(),
            };

            // Add a descriptive suffix for known UIDs
            let suffix = if *vr == ValueRepresentation::UniqueIdentifier {
              self
                .get_string()
                .ok()
                .and_then(|uid| dictionary::uid_name(uid).ok())
                .map(|name| format!(" ({})", name))
            } else {
              None
            };

            Ok((formatted_value, suffix))
          }

          Err(_) => Ok(("!! Invalid UTF-8 data".to_string(), None)),
        }
      }

      RawDataElementValue::LookupTableDescriptorValue { .. } => {
        match self.get_lookup_table_descriptor() {
          Ok((entry_count, first_input_value, bits_per_entry)) => Ok((
            format!(
              "{}, {}, {}",
              entry_count, first_input_value, bits_per_entry
            ),
            None,
          )),
          Err(_) => Err(()),
        }
      }

      RawDataElementValue::BinaryValue { vr, bytes } => match vr {
        ValueRepresentation::AttributeTag => {
          match attribute_tag::from_bytes(bytes) {
            Ok(tags) => Ok((
              tags
                .iter()
                .take(output_list_max_size)
                .map(|tag| tag.to_string())
                .collect::<Vec<String>>()
                .join(", "),
              None,
            )),
            Err(_) => Err(()),
          }
        }

        ValueRepresentation::FloatingPointDouble
        | ValueRepresentation::FloatingPointSingle => match self.get_floats() {
          Ok(floats) => Ok((
            floats
              .iter()
              .take(output_list_max_size)
              .map(|f| format!("{:?}", f))
              .collect::<Vec<String>>()
              .join(", "),
            None,
          )),
          Err(_) => Err(()),
        },

        ValueRepresentation::SignedLong
        | ValueRepresentation::SignedShort
        | ValueRepresentation::UnsignedLong
        | ValueRepresentation::UnsignedShort => match self.get_ints::<i64>() {
          Ok(ints) => Ok((
            ints
              .iter()
              .take(output_list_max_size)
              .map(|i| i.to_string())
              .collect::<Vec<String>>()
              .join(", "),
            None,
          )),
          Err(_) => Err(()),
        },

        ValueRepresentation::SignedVeryLong
        | ValueRepresentation::UnsignedVeryLong => {
          match self.get_big_ints::<i128>() {
            Ok(ints) => Ok((
              ints
                .iter()
                .take(output_list_max_size)
                .map(|i| i.to_string())
                .collect::<Vec<String>>()
                .join(", "),
              None,
            )),
            Err(_) => Err(()),
          }
        }

        _ => Ok((utils::inspect_u8_slice(bytes, output_list_max_size), None)),
      },

      RawDataElementValue::EncapsulatedPixelDataValue { items, .. } => {
        let total_size: usize = items.iter().map(|item| item.len()).sum();

        Ok((
          format!("Items: {}, bytes: {}", items.len(), total_size),
          None,
        ))
      }

      RawDataElementValue::SequenceValue { items } => {
        Ok((format!("Items: {}", items.len()), None))
      }

      RawDataElementValue::LazyValue { handle, .. } => Ok((
        format!(
          "Lazy, offset: 0x{:X}, length: {} bytes",
          handle.offset, handle.length
        ),
        None,
      )),
    };

    match result {
      Ok((s, suffix)) => {
        let suffix = suffix.unwrap_or_default();

        // Calculate width available for the value once the suffix is taken
        // into account. Always allow at least 10 characters.
        let output_width =
          core::cmp::max(output_width.saturating_sub(suffix.len()), 10);

        // If there are more codepoints than columns then convert to graphemes
        // and assume one column per grapheme for display
        if s.len() > output_width {
          let graphemes = UnicodeSegmentation::graphemes(s.as_str(), true)
            .collect::<Vec<&str>>();

          if graphemes.len() > output_width {
            format!("{} ..{}", graphemes[0..output_width - 2].join(""), suffix)
          } else {
            format!("{}{}", s, suffix)
          }
        } else {
          format!("{}{}", s, suffix)
        }
      }
      Err(()) => "<error converting to string>".to_string(),
    }
  }
}

/// Creates a value for a string VR that allows multiplicity, joining the
/// strings with the `0x5C` backslash delimiter and applying even-length
/// padding.
///
fn new_string_list(
  vr: ValueRepresentation,
  strings: &[&str],
) -> Result<DataElementValue, DataError> {
  let mut bytes = strings.join("\\").into_bytes();
  vr.pad_bytes_to_even_length(&mut bytes);

  DataElementValue::new_binary(vr, bytes.into())
}

fn read_int_values(
  bytes: &[u8],
  word_size: usize,
  read: impl Fn(&[u8]) -> i64,
) -> Result<Vec<i64>, DataError> {
  if bytes.len() % word_size != 0 {
    return Err(invalid_int_data_error());
  }

  Ok(bytes.chunks_exact(word_size).map(|b| read(b)).collect())
}

fn invalid_int_data_error() -> DataError {
  DataError::new_value_invalid(
    "Numeric data length is not a multiple of its value size".to_string(),
  )
}

/// Reads the three values of a lookup table descriptor. The first and third
/// values are always unsigned; the second is read using the given VR.
///
fn read_lookup_table_descriptor(
  vr: ValueRepresentation,
  bytes: &[u8],
) -> Result<(u16, i64, u16), DataError> {
  if bytes.len() != 6 {
    return Err(DataError::new_value_length_invalid(
      vr,
      bytes.len() as u64,
      "Lookup table descriptor length must be exactly 6 bytes".to_string(),
    ));
  }

  let entry_count = byteorder::LittleEndian::read_u16(&bytes[0..2]);

  let first_input_value = if vr == ValueRepresentation::SignedShort {
    i64::from(byteorder::LittleEndian::read_i16(&bytes[2..4]))
  } else {
    i64::from(byteorder::LittleEndian::read_u16(&bytes[2..4]))
  };

  let bits_per_entry = byteorder::LittleEndian::read_u16(&bytes[4..6]);

  Ok((entry_count, first_input_value, bits_per_entry))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn get_string_test() {
    let value = DataElementValue::new_binary_unchecked(
      ValueRepresentation::CodeString,
      b"CT ".to_vec().into(),
    );
    assert_eq!(value.get_string(), Ok("CT"));

    let value = DataElementValue::new_binary_unchecked(
      ValueRepresentation::UniqueIdentifier,
      b"1.2.840.10008.1.2.1\0".to_vec().into(),
    );
    assert_eq!(value.get_string(), Ok("1.2.840.10008.1.2.1"));

    let value = DataElementValue::new_binary_unchecked(
      ValueRepresentation::CodeString,
      b"DERIVED\\SECONDARY".to_vec().into(),
    );
    assert_eq!(
      value.get_string(),
      Err(DataError::new_multiplicity_mismatch())
    );
    assert_eq!(value.get_strings(), Ok(vec!["DERIVED", "SECONDARY"]));
  }

  #[test]
  fn get_int_test() {
    let value = DataElementValue::new_unsigned_short(&[8]).unwrap();
    assert_eq!(value.get_int::<u16>(), Ok(8));

    let value = DataElementValue::new_signed_short(&[-200]).unwrap();
    assert_eq!(value.get_int::<i32>(), Ok(-200));

    let value = DataElementValue::new_integer_string(&[42]).unwrap();
    assert_eq!(value.get_int::<u8>(), Ok(42));

    let value = DataElementValue::new_unsigned_short(&[1, 2]).unwrap();
    assert_eq!(
      value.get_int::<u16>(),
      Err(DataError::new_multiplicity_mismatch())
    );
  }

  #[test]
  fn get_floats_test() {
    let value = DataElementValue::new_decimal_string(&[1.5, -2.0]).unwrap();
    assert_eq!(value.get_floats(), Ok(vec![1.5, -2.0]));

    let value = DataElementValue::new_floating_point_single(&[0.5]).unwrap();
    assert_eq!(value.get_float(), Ok(0.5));
  }

  #[test]
  fn get_lookup_table_descriptor_test() {
    let value = DataElementValue::new_lookup_table_descriptor(
      ValueRepresentation::SignedShort,
      vec![0x00, 0x40, 0x18, 0xFC, 0x10, 0x00].into(),
    )
    .unwrap();

    // The first value is read as unsigned even though the VR is SS, and the
    // second is read as signed
    assert_eq!(value.get_lookup_table_descriptor(), Ok((16384, -1000, 16)));

    let value = DataElementValue::new_lookup_table_descriptor(
      ValueRepresentation::UnsignedShort,
      vec![0x00, 0x40, 0x18, 0xFC, 0x10, 0x00].into(),
    )
    .unwrap();

    assert_eq!(value.get_lookup_table_descriptor(), Ok((16384, 64536, 16)));
  }

  #[test]
  fn get_date_test() {
    let value = DataElementValue::new_date(&StructuredDate {
      year: 2024,
      month: 1,
      day: 30,
    })
    .unwrap();

    assert_eq!(
      value.get_date(),
      Ok(StructuredDate {
        year: 2024,
        month: 1,
        day: 30
      })
    );
  }

  #[test]
  fn new_binary_validates_test() {
    assert!(
      DataElementValue::new_binary(
        ValueRepresentation::Sequence,
        RcByteSlice::empty()
      )
      .is_err()
    );

    assert!(
      DataElementValue::new_binary(
        ValueRepresentation::UnsignedShort,
        vec![0u8; 3].into()
      )
      .is_err()
    );

    assert!(
      DataElementValue::new_binary(
        ValueRepresentation::LongString,
        vec![0xC0].into()
      )
      .is_err()
    );
  }

  #[test]
  fn to_owned_is_independent_test() {
    let buffer = RcByteSlice::from_vec(vec![b'C', b'T', b' ', b' ']);

    let value = DataElementValue::new_binary_unchecked(
      ValueRepresentation::CodeString,
      buffer.slice(0, 2),
    );

    let owned = value.to_owned();
    drop(value);
    drop(buffer);

    assert_eq!(owned.get_string(), Ok("CT"));
    assert!(!owned.bytes().unwrap().is_shared());
  }

  #[test]
  fn total_byte_size_test() {
    let value = DataElementValue::new_unsigned_short(&[1, 2, 3]).unwrap();
    assert_eq!(value.total_byte_size(), 6);

    let value = DataElementValue::new_encapsulated_pixel_data_unchecked(
      ValueRepresentation::OtherByteString,
      vec![RcByteSlice::empty(), vec![0u8; 128].into()],
    );
    assert_eq!(value.total_byte_size(), 128);
  }

  #[test]
  fn to_string_test() {
    let value = DataElementValue::new_unique_identifier(&["1.2.840.10008.1.2"])
      .unwrap();

    assert_eq!(
      value.to_string(80),
      "\"1.2.840.10008.1.2\" (Implicit VR Little Endian)"
    );

    let value = DataElementValue::new_unsigned_short(&[10, 20]).unwrap();
    assert_eq!(value.to_string(80), "10, 20");
  }
}
