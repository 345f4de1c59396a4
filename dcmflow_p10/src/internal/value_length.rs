#[cfg(not(feature = "std"))]
use alloc::{format, string::String};

/// The length of a data element value as stored in DICOM P10 data: either a
/// defined number of bytes, or the special value `0xFFFFFFFF` that indicates
/// an undefined length terminated by a delimitation item.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueLength {
  Defined { length: u32 },
  Undefined,
}

impl ValueLength {
  /// A defined value length of zero.
  ///
  pub const ZERO: ValueLength = ValueLength::Defined { length: 0 };

  /// Creates a value length from a raw 32-bit length field.
  ///
  pub fn new(length: u32) -> Self {
    match length {
      0xFFFF_FFFF => Self::Undefined,
      length => Self::Defined { length },
    }
  }

  /// Returns the raw 32-bit length field value for this value length.
  ///
  pub fn to_int(&self) -> u32 {
    match self {
      Self::Defined { length } => *length,
      Self::Undefined => 0xFFFF_FFFF,
    }
  }
}

impl core::fmt::Display for ValueLength {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let s: String = match self {
      Self::Defined { length } => format!("{} bytes", length),
      Self::Undefined => "undefined".into(),
    };

    f.write_str(&s)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[cfg(not(feature = "std"))]
  use alloc::string::ToString;

  #[test]
  fn new_test() {
    assert_eq!(ValueLength::new(0), ValueLength::ZERO);
    assert_eq!(
      ValueLength::new(128),
      ValueLength::Defined { length: 128 }
    );
    assert_eq!(ValueLength::new(0xFFFF_FFFF), ValueLength::Undefined);
  }

  #[test]
  fn to_int_test() {
    assert_eq!(ValueLength::new(128).to_int(), 128);
    assert_eq!(ValueLength::Undefined.to_int(), 0xFFFF_FFFF);
  }

  #[test]
  fn to_string_test() {
    assert_eq!(ValueLength::new(128).to_string(), "128 bytes");
    assert_eq!(ValueLength::Undefined.to_string(), "undefined");
  }
}
