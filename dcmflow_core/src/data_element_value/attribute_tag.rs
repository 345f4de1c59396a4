//! Conversion between raw `AttributeTag` value bytes and data element tags.

#[cfg(not(feature = "std"))]
use alloc::{string::ToString, vec, vec::Vec};

use byteorder::ByteOrder;

use crate::{DataElementTag, DataError};

/// Parses `AttributeTag` value bytes into a list of data element tags. The
/// bytes must contain pairs of little-endian 16-bit group and element values.
///
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<DataElementTag>, DataError> {
  if bytes.len() % 4 != 0 {
    return Err(DataError::new_value_invalid(
      "AttributeTag data length is not a multiple of 4".to_string(),
    ));
  }

  let mut values = vec![0u16; bytes.len() / 2];
  byteorder::LittleEndian::read_u16_into(bytes, &mut values);

  Ok(
    values
      .chunks_exact(2)
      .map(|chunk| DataElementTag::new(chunk[0], chunk[1]))
      .collect(),
  )
}

/// Serializes a list of data element tags into `AttributeTag` value bytes.
///
pub fn to_bytes(tags: &[DataElementTag]) -> Vec<u8> {
  let mut bytes = Vec::with_capacity(tags.len() * 4);

  for tag in tags {
    bytes.extend_from_slice(&tag.group.to_le_bytes());
    bytes.extend_from_slice(&tag.element.to_le_bytes());
  }

  bytes
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      from_bytes(&[0x10, 0x00, 0x20, 0x00, 0xE0, 0x7F, 0x10, 0x00]),
      Ok(vec![
        DataElementTag::new(0x0010, 0x0020),
        DataElementTag::new(0x7FE0, 0x0010)
      ])
    );

    assert!(from_bytes(&[0x10, 0x00]).is_err());
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      to_bytes(&[DataElementTag::new(0x0010, 0x0020)]),
      vec![0x10, 0x00, 0x20, 0x00]
    );
  }
}
