//! The transfer syntaxes defined by the DICOM standard that are recognized by
//! this library.

use crate::ValueRepresentation;

/// Describes a single DICOM transfer syntax: its UID, its serialization
/// characteristics, and whether its pixel data is encapsulated and/or
/// natively deflated.
///
#[derive(Clone, Debug, PartialEq)]
pub struct TransferSyntax {
  /// The unique identifier for the transfer syntax, e.g.
  /// `"1.2.840.10008.1.2.1"`.
  pub uid: &'static str,

  /// The display name of the transfer syntax, e.g.
  /// `"Explicit VR Little Endian"`.
  pub name: &'static str,

  /// How value representations are serialized by the transfer syntax.
  pub vr_serialization: VrSerialization,

  /// The endianness of multi-byte values in the transfer syntax.
  pub endianness: Endianness,

  /// Whether pixel data is stored encapsulated, i.e. in a sequence of one or
  /// more binary fragments, usually holding compressed data.
  pub is_encapsulated: bool,

  /// Whether all data following the File Meta Information is compressed
  /// using the Deflate algorithm.
  pub is_deflated: bool,

  /// Whether the transfer syntax can only be read and not written.
  pub is_read_only: bool,
}

/// Whether a transfer syntax stores data elements with explicit VRs, or
/// with implicit VRs that must be determined from the dictionary and
/// surrounding context.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VrSerialization {
  VrExplicit,
  VrImplicit,
}

/// The endianness of a transfer syntax.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Endianness {
  LittleEndian,
  BigEndian,
}

impl Endianness {
  /// Returns whether this is big endian.
  ///
  pub fn is_big(&self) -> bool {
    *self == Endianness::BigEndian
  }
}

/// The 'Implicit VR Little Endian' transfer syntax. This is the default
/// transfer syntax for data that doesn't specify one.
///
pub static IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2",
  name: "Implicit VR Little Endian",
  vr_serialization: VrSerialization::VrImplicit,
  endianness: Endianness::LittleEndian,
  is_encapsulated: false,
  is_deflated: false,
  is_read_only: false,
};

/// The 'Explicit VR Little Endian' transfer syntax.
///
pub static EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.1",
  name: "Explicit VR Little Endian",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_encapsulated: false,
  is_deflated: false,
  is_read_only: false,
};

/// The 'Deflated Explicit VR Little Endian' transfer syntax.
///
pub static DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax =
  TransferSyntax {
    uid: "1.2.840.10008.1.2.1.99",
    name: "Deflated Explicit VR Little Endian",
    vr_serialization: VrSerialization::VrExplicit,
    endianness: Endianness::LittleEndian,
    is_encapsulated: false,
    is_deflated: true,
    is_read_only: false,
  };

/// The retired 'Explicit VR Big Endian' transfer syntax. Data using it can
/// be read but not written.
///
pub static EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.2",
  name: "Explicit VR Big Endian",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::BigEndian,
  is_encapsulated: false,
  is_deflated: false,
  is_read_only: true,
};

/// The 'JPEG Baseline (Process 1)' transfer syntax: 8-bit lossy JPEG.
///
pub static JPEG_BASELINE_8BIT: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.4.50",
  name: "JPEG Baseline (Process 1)",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_encapsulated: true,
  is_deflated: false,
  is_read_only: false,
};

/// The 'RLE Lossless' transfer syntax.
///
pub static RLE_LOSSLESS: TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.5",
  name: "RLE Lossless",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_encapsulated: true,
  is_deflated: false,
  is_read_only: false,
};

/// The 'Encapsulated Uncompressed Explicit VR Little Endian' transfer
/// syntax: native pixel data stored in encapsulated form, one frame per
/// fragment.
///
pub static ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN:
  TransferSyntax = TransferSyntax {
  uid: "1.2.840.10008.1.2.1.98",
  name: "Encapsulated Uncompressed Explicit VR Little Endian",
  vr_serialization: VrSerialization::VrExplicit,
  endianness: Endianness::LittleEndian,
  is_encapsulated: true,
  is_deflated: false,
  is_read_only: false,
};

/// All transfer syntaxes recognized by this library.
///
pub static ALL: [&TransferSyntax; 7] = [
  &IMPLICIT_VR_LITTLE_ENDIAN,
  &EXPLICIT_VR_LITTLE_ENDIAN,
  &DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
  &EXPLICIT_VR_BIG_ENDIAN,
  &ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN,
  &JPEG_BASELINE_8BIT,
  &RLE_LOSSLESS,
];

impl TransferSyntax {
  /// Returns the transfer syntax with the given UID, or an error if the UID
  /// isn't recognized.
  ///
  /// Unrecognized transfer syntaxes can still be parsed by assuming
  /// explicit VR little endian serialization without encapsulation, see
  /// [`TransferSyntax::new_unrecognized`].
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_uid(uid: &str) -> Result<&'static TransferSyntax, ()> {
    match ALL.iter().find(|ts| ts.uid == uid) {
      Some(ts) => Ok(*ts),
      None => Err(()),
    }
  }

  /// Returns the default assumptions used to parse data in an unrecognized
  /// transfer syntax: explicit VR, little endian, unencapsulated. Callers
  /// should emit a warning when falling back to this.
  ///
  pub fn new_unrecognized() -> &'static TransferSyntax {
    &EXPLICIT_VR_LITTLE_ENDIAN
  }

  /// Returns whether the VR of pixel data in this transfer syntax is
  /// restricted to [`ValueRepresentation::OtherByteString`]. This is the
  /// case for all encapsulated transfer syntaxes.
  ///
  pub fn pixel_data_vr(&self, bits_allocated: u16) -> ValueRepresentation {
    if self.is_encapsulated || bits_allocated <= 8 {
      ValueRepresentation::OtherByteString
    } else {
      ValueRepresentation::OtherWordString
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_uid_test() {
    assert_eq!(
      TransferSyntax::from_uid("1.2.840.10008.1.2"),
      Ok(&IMPLICIT_VR_LITTLE_ENDIAN)
    );

    assert_eq!(TransferSyntax::from_uid("1.2.3.4"), Err(()));
  }

  #[test]
  fn pixel_data_vr_test() {
    assert_eq!(
      EXPLICIT_VR_LITTLE_ENDIAN.pixel_data_vr(8),
      ValueRepresentation::OtherByteString
    );

    assert_eq!(
      EXPLICIT_VR_LITTLE_ENDIAN.pixel_data_vr(16),
      ValueRepresentation::OtherWordString
    );

    assert_eq!(
      JPEG_BASELINE_8BIT.pixel_data_vr(16),
      ValueRepresentation::OtherByteString
    );
  }
}
