//! Heuristic detection of the transfer syntax of DICOM data that has no File
//! Preamble, 'DICM' prefix, or File Meta Information.

use byteorder::ByteOrder;

use dcmflow_core::{
  DataElementTag, ValueRepresentation, dictionary, transfer_syntax,
  transfer_syntax::TransferSyntax,
};

/// Inspects the given bytes, which are assumed to be the start of a data
/// element, and returns the transfer syntax they plausibly begin with.
///
/// The first four bytes are checked for a plausible data element tag. If the
/// two bytes that follow are a recognized VR code the data is taken to be
/// explicit VR little endian. Otherwise, if the following four bytes are a
/// sane little-endian length, the data is taken to be implicit VR little
/// endian.
///
pub fn detect_transfer_syntax(bytes: &[u8]) -> Option<&'static TransferSyntax> {
  if bytes.len() < 8 {
    return None;
  }

  let group = byteorder::LittleEndian::read_u16(&bytes[0..2]);
  let element = byteorder::LittleEndian::read_u16(&bytes[2..4]);
  let tag = DataElementTag::new(group, element);

  if !is_plausible_first_tag(tag) {
    return None;
  }

  // A recognized VR code directly after the tag indicates explicit VR
  if ValueRepresentation::from_bytes(&bytes[4..6]).is_ok() {
    return Some(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN);
  }

  // Otherwise check for a sane implicit VR 32-bit length. Lengths in the
  // hundreds of megabytes are implausible for a first data element.
  let length = byteorder::LittleEndian::read_u32(&bytes[4..8]);
  if length != 0xFFFF_FFFF && length < 0x1000_0000 {
    return Some(&transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN);
  }

  None
}

/// Returns whether a tag is plausible as the first data element of DICOM
/// data: a File Meta Information tag, a known dictionary tag, or failing
/// that an even-numbered group in the range used by standard data elements.
///
fn is_plausible_first_tag(tag: DataElementTag) -> bool {
  if tag.group == 0x0002 {
    return true;
  }

  if dictionary::find(tag, None).is_ok() {
    return true;
  }

  tag.group % 2 == 0 && tag.group >= 0x0008 && tag.group <= 0x7FE0
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detect_explicit_vr_test() {
    // (0008,0060) CS, length 2
    let bytes = [0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00];

    assert_eq!(
      detect_transfer_syntax(&bytes),
      Some(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN)
    );
  }

  #[test]
  fn detect_implicit_vr_test() {
    // (0008,0060), length 2
    let bytes = [0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00];

    assert_eq!(
      detect_transfer_syntax(&bytes),
      Some(&transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN)
    );
  }

  #[test]
  fn detect_rejects_implausible_data_test() {
    assert_eq!(detect_transfer_syntax(&[0xFF; 8]), None);
    assert_eq!(detect_transfer_syntax(b"DICM"), None);
  }
}
