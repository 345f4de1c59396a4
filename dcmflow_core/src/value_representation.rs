//! DICOM value representations (VRs).
//!
//! A value representation is a two-character uppercase ASCII code that
//! classifies the physical encoding of a data element's value.
//!
//! Ref: PS3.5 6.2.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use byteorder::ByteOrder;

/// The value representations defined by the DICOM standard.
///
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueRepresentation {
  AgeString,
  ApplicationEntity,
  AttributeTag,
  CodeString,
  Date,
  DateTime,
  DecimalString,
  FloatingPointDouble,
  FloatingPointSingle,
  IntegerString,
  LongString,
  LongText,
  OtherByteString,
  OtherDoubleString,
  OtherFloatString,
  OtherLongString,
  OtherVeryLongString,
  OtherWordString,
  PersonName,
  Sequence,
  ShortString,
  ShortText,
  SignedLong,
  SignedShort,
  SignedVeryLong,
  Time,
  UniqueIdentifier,
  UniversalResourceIdentifier,
  Unknown,
  UnlimitedCharacters,
  UnlimitedText,
  UnsignedLong,
  UnsignedShort,
  UnsignedVeryLong,
}

/// Restrictions on the length of a value for a value representation: the
/// maximum allowed length in bytes, an optional required multiple for the
/// length, and an optional maximum string length in characters.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LengthRequirements {
  pub bytes_max: usize,
  pub bytes_multiple_of: Option<usize>,
  pub string_characters_max: Option<usize>,
}

impl ValueRepresentation {
  /// All value representations defined by the DICOM standard.
  ///
  pub const ALL: [ValueRepresentation; 34] = [
    Self::AgeString,
    Self::ApplicationEntity,
    Self::AttributeTag,
    Self::CodeString,
    Self::Date,
    Self::DateTime,
    Self::DecimalString,
    Self::FloatingPointDouble,
    Self::FloatingPointSingle,
    Self::IntegerString,
    Self::LongString,
    Self::LongText,
    Self::OtherByteString,
    Self::OtherDoubleString,
    Self::OtherFloatString,
    Self::OtherLongString,
    Self::OtherVeryLongString,
    Self::OtherWordString,
    Self::PersonName,
    Self::Sequence,
    Self::ShortString,
    Self::ShortText,
    Self::SignedLong,
    Self::SignedShort,
    Self::SignedVeryLong,
    Self::Time,
    Self::UniqueIdentifier,
    Self::UniversalResourceIdentifier,
    Self::Unknown,
    Self::UnlimitedCharacters,
    Self::UnlimitedText,
    Self::UnsignedLong,
    Self::UnsignedShort,
    Self::UnsignedVeryLong,
  ];

  /// Converts a two-character uppercase ASCII code, e.g. `b"DA"`, to a value
  /// representation.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_bytes(bytes: &[u8]) -> Result<ValueRepresentation, ()> {
    match bytes {
      b"AE" => Ok(Self::ApplicationEntity),
      b"AS" => Ok(Self::AgeString),
      b"AT" => Ok(Self::AttributeTag),
      b"CS" => Ok(Self::CodeString),
      b"DA" => Ok(Self::Date),
      b"DS" => Ok(Self::DecimalString),
      b"DT" => Ok(Self::DateTime),
      b"FD" => Ok(Self::FloatingPointDouble),
      b"FL" => Ok(Self::FloatingPointSingle),
      b"IS" => Ok(Self::IntegerString),
      b"LO" => Ok(Self::LongString),
      b"LT" => Ok(Self::LongText),
      b"OB" => Ok(Self::OtherByteString),
      b"OD" => Ok(Self::OtherDoubleString),
      b"OF" => Ok(Self::OtherFloatString),
      b"OL" => Ok(Self::OtherLongString),
      b"OV" => Ok(Self::OtherVeryLongString),
      b"OW" => Ok(Self::OtherWordString),
      b"PN" => Ok(Self::PersonName),
      b"SH" => Ok(Self::ShortString),
      b"SL" => Ok(Self::SignedLong),
      b"SQ" => Ok(Self::Sequence),
      b"SS" => Ok(Self::SignedShort),
      b"ST" => Ok(Self::ShortText),
      b"SV" => Ok(Self::SignedVeryLong),
      b"TM" => Ok(Self::Time),
      b"UC" => Ok(Self::UnlimitedCharacters),
      b"UI" => Ok(Self::UniqueIdentifier),
      b"UL" => Ok(Self::UnsignedLong),
      b"UN" => Ok(Self::Unknown),
      b"UR" => Ok(Self::UniversalResourceIdentifier),
      b"US" => Ok(Self::UnsignedShort),
      b"UT" => Ok(Self::UnlimitedText),
      _ => Err(()),
    }
  }

  /// Returns the two-character uppercase ASCII code for a value
  /// representation, e.g. `b"DA"`.
  ///
  pub fn to_bytes(&self) -> [u8; 2] {
    match self {
      Self::AgeString => *b"AS",
      Self::ApplicationEntity => *b"AE",
      Self::AttributeTag => *b"AT",
      Self::CodeString => *b"CS",
      Self::Date => *b"DA",
      Self::DateTime => *b"DT",
      Self::DecimalString => *b"DS",
      Self::FloatingPointDouble => *b"FD",
      Self::FloatingPointSingle => *b"FL",
      Self::IntegerString => *b"IS",
      Self::LongString => *b"LO",
      Self::LongText => *b"LT",
      Self::OtherByteString => *b"OB",
      Self::OtherDoubleString => *b"OD",
      Self::OtherFloatString => *b"OF",
      Self::OtherLongString => *b"OL",
      Self::OtherVeryLongString => *b"OV",
      Self::OtherWordString => *b"OW",
      Self::PersonName => *b"PN",
      Self::Sequence => *b"SQ",
      Self::ShortString => *b"SH",
      Self::ShortText => *b"ST",
      Self::SignedLong => *b"SL",
      Self::SignedShort => *b"SS",
      Self::SignedVeryLong => *b"SV",
      Self::Time => *b"TM",
      Self::UniqueIdentifier => *b"UI",
      Self::UniversalResourceIdentifier => *b"UR",
      Self::Unknown => *b"UN",
      Self::UnlimitedCharacters => *b"UC",
      Self::UnlimitedText => *b"UT",
      Self::UnsignedLong => *b"UL",
      Self::UnsignedShort => *b"US",
      Self::UnsignedVeryLong => *b"UV",
    }
  }

  /// Returns the human-readable name of a value representation, e.g.
  /// `"Unique Identifier"`.
  ///
  pub fn name(&self) -> &'static str {
    match self {
      Self::AgeString => "Age String",
      Self::ApplicationEntity => "Application Entity",
      Self::AttributeTag => "Attribute Tag",
      Self::CodeString => "Code String",
      Self::Date => "Date",
      Self::DateTime => "Date Time",
      Self::DecimalString => "Decimal String",
      Self::FloatingPointDouble => "Floating Point Double",
      Self::FloatingPointSingle => "Floating Point Single",
      Self::IntegerString => "Integer String",
      Self::LongString => "Long String",
      Self::LongText => "Long Text",
      Self::OtherByteString => "Other Byte String",
      Self::OtherDoubleString => "Other Double String",
      Self::OtherFloatString => "Other Float String",
      Self::OtherLongString => "Other Long String",
      Self::OtherVeryLongString => "Other Very Long String",
      Self::OtherWordString => "Other Word String",
      Self::PersonName => "Person Name",
      Self::Sequence => "Sequence of Items",
      Self::ShortString => "Short String",
      Self::ShortText => "Short Text",
      Self::SignedLong => "Signed Long",
      Self::SignedShort => "Signed Short",
      Self::SignedVeryLong => "Signed Very Long",
      Self::Time => "Time",
      Self::UniqueIdentifier => "Unique Identifier",
      Self::UniversalResourceIdentifier => "Universal Resource Identifier",
      Self::Unknown => "Unknown",
      Self::UnlimitedCharacters => "Unlimited Characters",
      Self::UnlimitedText => "Unlimited Text",
      Self::UnsignedLong => "Unsigned Long",
      Self::UnsignedShort => "Unsigned Short",
      Self::UnsignedVeryLong => "Unsigned Very Long",
    }
  }

  /// Returns whether a value representation stores string data.
  ///
  pub fn is_string(&self) -> bool {
    matches!(
      self,
      Self::AgeString
        | Self::ApplicationEntity
        | Self::CodeString
        | Self::Date
        | Self::DateTime
        | Self::DecimalString
        | Self::IntegerString
        | Self::LongString
        | Self::LongText
        | Self::PersonName
        | Self::ShortString
        | Self::ShortText
        | Self::Time
        | Self::UniqueIdentifier
        | Self::UniversalResourceIdentifier
        | Self::UnlimitedCharacters
        | Self::UnlimitedText
    )
  }

  /// Returns whether a value representation stores string data that is
  /// affected by the *'(0008,0005) Specific Character Set'* data element of
  /// the enclosing data set. String data for VRs not listed here is always
  /// encoded in the default character repertoire.
  ///
  pub fn is_encoded_string(&self) -> bool {
    matches!(
      self,
      Self::LongString
        | Self::LongText
        | Self::PersonName
        | Self::ShortString
        | Self::ShortText
        | Self::UnlimitedCharacters
        | Self::UnlimitedText
    )
  }

  /// Returns whether values of a value representation can hold multiple
  /// values separated by the `0x5C` backslash delimiter.
  ///
  pub fn allows_multiplicity(&self) -> bool {
    matches!(
      self,
      Self::AgeString
        | Self::ApplicationEntity
        | Self::CodeString
        | Self::Date
        | Self::DateTime
        | Self::DecimalString
        | Self::IntegerString
        | Self::LongString
        | Self::PersonName
        | Self::ShortString
        | Self::Time
        | Self::UniqueIdentifier
        | Self::UnlimitedCharacters
    )
  }

  /// Returns the multi-value delimiter character for a value representation,
  /// if it has one.
  ///
  pub fn multi_value_delimiter(&self) -> Option<char> {
    if self.allows_multiplicity() {
      Some('\\')
    } else {
      None
    }
  }

  /// Returns the byte used to pad values of a value representation to an even
  /// length. String VRs pad with a space, except for `UniqueIdentifier` which
  /// pads with a zero byte, as do all binary VRs.
  ///
  /// Ref: PS3.5 6.2.
  ///
  pub fn padding_byte(&self) -> u8 {
    if *self == Self::UniqueIdentifier || !self.is_string() {
      0x00
    } else {
      0x20
    }
  }

  /// Returns whether data elements with this value representation are
  /// permitted to declare an undefined length on the wire.
  ///
  pub fn allows_undefined_length(&self) -> bool {
    matches!(
      self,
      Self::Sequence
        | Self::Unknown
        | Self::OtherByteString
        | Self::OtherWordString
    )
  }

  /// Appends the relevant padding byte if the given bytes are of odd length.
  ///
  pub fn pad_bytes_to_even_length(&self, bytes: &mut Vec<u8>) {
    if bytes.len() % 2 == 1 {
      bytes.push(self.padding_byte());
    }
  }

  /// Returns the length requirements of a value representation.
  ///
  /// Ref: PS3.5 6.2, PS3.5 Table 6.2-1.
  ///
  pub fn length_requirements(&self) -> LengthRequirements {
    match self {
      Self::AgeString => LengthRequirements {
        bytes_max: 4,
        bytes_multiple_of: Some(4),
        string_characters_max: None,
      },
      Self::ApplicationEntity => LengthRequirements {
        bytes_max: 16,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::AttributeTag => LengthRequirements {
        bytes_max: 0xFFFC,
        bytes_multiple_of: Some(4),
        string_characters_max: None,
      },
      Self::CodeString => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(16),
      },
      Self::Date => LengthRequirements {
        bytes_max: 8,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::DateTime => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(26),
      },
      Self::DecimalString => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(16),
      },
      Self::FloatingPointDouble => LengthRequirements {
        bytes_max: 0xFFF8,
        bytes_multiple_of: Some(8),
        string_characters_max: None,
      },
      Self::FloatingPointSingle => LengthRequirements {
        bytes_max: 0xFFFC,
        bytes_multiple_of: Some(4),
        string_characters_max: None,
      },
      Self::IntegerString => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(12),
      },
      Self::LongString => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(64),
      },
      Self::LongText => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(10240),
      },
      Self::OtherByteString => LengthRequirements {
        bytes_max: 0xFFFF_FFFE,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::OtherDoubleString => LengthRequirements {
        bytes_max: 0xFFFF_FFF8,
        bytes_multiple_of: Some(8),
        string_characters_max: None,
      },
      Self::OtherFloatString => LengthRequirements {
        bytes_max: 0xFFFF_FFFC,
        bytes_multiple_of: Some(4),
        string_characters_max: None,
      },
      Self::OtherLongString => LengthRequirements {
        bytes_max: 0xFFFF_FFFC,
        bytes_multiple_of: Some(4),
        string_characters_max: None,
      },
      Self::OtherVeryLongString => LengthRequirements {
        bytes_max: 0xFFFF_FFF8,
        bytes_multiple_of: Some(8),
        string_characters_max: None,
      },
      Self::OtherWordString => LengthRequirements {
        bytes_max: 0xFFFF_FFFE,
        bytes_multiple_of: Some(2),
        string_characters_max: None,
      },
      Self::PersonName => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(324),
      },
      Self::Sequence => LengthRequirements {
        bytes_max: 0,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::ShortString => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(16),
      },
      Self::ShortText => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: None,
        string_characters_max: Some(1024),
      },
      Self::SignedLong => LengthRequirements {
        bytes_max: 0xFFFC,
        bytes_multiple_of: Some(4),
        string_characters_max: None,
      },
      Self::SignedShort => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: Some(2),
        string_characters_max: None,
      },
      Self::SignedVeryLong => LengthRequirements {
        bytes_max: 0xFFF8,
        bytes_multiple_of: Some(8),
        string_characters_max: None,
      },
      Self::Time => LengthRequirements {
        bytes_max: 14,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::UniqueIdentifier => LengthRequirements {
        bytes_max: 64,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::UniversalResourceIdentifier => LengthRequirements {
        bytes_max: 0xFFFF_FFFE,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::Unknown => LengthRequirements {
        bytes_max: 0xFFFF_FFFE,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::UnlimitedCharacters => LengthRequirements {
        bytes_max: 0xFFFF_FFFE,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::UnlimitedText => LengthRequirements {
        bytes_max: 0xFFFF_FFFE,
        bytes_multiple_of: None,
        string_characters_max: None,
      },
      Self::UnsignedLong => LengthRequirements {
        bytes_max: 0xFFFC,
        bytes_multiple_of: Some(4),
        string_characters_max: None,
      },
      Self::UnsignedShort => LengthRequirements {
        bytes_max: 0xFFFE,
        bytes_multiple_of: Some(2),
        string_characters_max: None,
      },
      Self::UnsignedVeryLong => LengthRequirements {
        bytes_max: 0xFFF8,
        bytes_multiple_of: Some(8),
        string_characters_max: None,
      },
    }
  }

  /// Swaps the endianness of raw value bytes for a value representation.
  /// VRs that don't store fixed-width numeric data are unaffected.
  ///
  pub fn swap_endianness(&self, bytes: &mut [u8]) {
    match self {
      Self::AttributeTag
      | Self::OtherWordString
      | Self::SignedShort
      | Self::UnsignedShort => swap_endianness_in_place(bytes, 2),

      Self::FloatingPointSingle
      | Self::OtherFloatString
      | Self::OtherLongString
      | Self::SignedLong
      | Self::UnsignedLong => swap_endianness_in_place(bytes, 4),

      Self::FloatingPointDouble
      | Self::OtherDoubleString
      | Self::OtherVeryLongString
      | Self::SignedVeryLong
      | Self::UnsignedVeryLong => swap_endianness_in_place(bytes, 8),

      _ => (),
    }
  }
}

/// Reverses the order of bytes in each `word_size`-sized group. Trailing
/// bytes that don't fill a whole word are left untouched.
///
fn swap_endianness_in_place(bytes: &mut [u8], word_size: usize) {
  for chunk in bytes.chunks_exact_mut(word_size) {
    chunk.reverse();
  }
}

impl core::fmt::Display for ValueRepresentation {
  /// Outputs the two-character uppercase ASCII code of a value
  /// representation.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let bytes = self.to_bytes();
    f.write_str(core::str::from_utf8(&bytes).unwrap())
  }
}

/// Reads fixed-width little-endian 16-bit unsigned integers out of raw value
/// bytes. Used when interpreting clarifying data elements.
///
pub fn read_u16_values(bytes: &[u8]) -> Vec<u16> {
  let mut values = vec![0u16; bytes.len() / 2];
  byteorder::LittleEndian::read_u16_into(&bytes[..values.len() * 2], &mut values);
  values
}

#[cfg(test)]
mod tests {
  use super::*;

  #[cfg(not(feature = "std"))]
  use alloc::{string::ToString, vec};

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      ValueRepresentation::from_bytes(b"AE"),
      Ok(ValueRepresentation::ApplicationEntity)
    );

    assert_eq!(ValueRepresentation::from_bytes(b"XY"), Err(()));
  }

  #[test]
  fn to_bytes_round_trip_test() {
    for vr in ValueRepresentation::ALL {
      assert_eq!(ValueRepresentation::from_bytes(&vr.to_bytes()), Ok(vr));
    }
  }

  #[test]
  fn to_string_test() {
    assert_eq!(ValueRepresentation::PersonName.to_string(), "PN");
  }

  #[test]
  fn padding_byte_test() {
    assert_eq!(ValueRepresentation::CodeString.padding_byte(), 0x20);
    assert_eq!(ValueRepresentation::UniqueIdentifier.padding_byte(), 0x00);
    assert_eq!(ValueRepresentation::OtherByteString.padding_byte(), 0x00);
  }

  #[test]
  fn pad_bytes_to_even_length_test() {
    let mut bytes = b"1.2".to_vec();
    ValueRepresentation::UniqueIdentifier.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, b"1.2\0".to_vec());

    let mut bytes = b"AB".to_vec();
    ValueRepresentation::CodeString.pad_bytes_to_even_length(&mut bytes);
    assert_eq!(bytes, b"AB".to_vec());
  }

  #[test]
  fn swap_endianness_test() {
    let mut bytes = vec![0x11, 0x22, 0x33, 0x44];
    ValueRepresentation::UnsignedShort.swap_endianness(&mut bytes);
    assert_eq!(bytes, vec![0x22, 0x11, 0x44, 0x33]);

    let mut bytes = vec![0x11, 0x22, 0x33, 0x44];
    ValueRepresentation::UnsignedLong.swap_endianness(&mut bytes);
    assert_eq!(bytes, vec![0x44, 0x33, 0x22, 0x11]);

    let mut bytes = vec![0x11, 0x22];
    ValueRepresentation::CodeString.swap_endianness(&mut bytes);
    assert_eq!(bytes, vec![0x11, 0x22]);
  }
}
