//! Structured access to the value of data elements with the `Date` VR.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec::Vec};

use crate::DataError;

/// A date value parsed from a data element with the `Date` VR, which stores
/// dates in the format `YYYYMMDD`.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructuredDate {
  pub year: u16,
  pub month: u8,
  pub day: u8,
}

impl StructuredDate {
  /// Parses a `Date` value from its raw bytes. Trailing space padding is
  /// permitted.
  ///
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, DataError> {
    let value = core::str::from_utf8(bytes)
      .map_err(|_| invalid_date_error(bytes))?
      .trim_end_matches(' ');

    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid_date_error(bytes));
    }

    let year = value[0..4].parse::<u16>().unwrap();
    let month = value[4..6].parse::<u8>().unwrap();
    let day = value[6..8].parse::<u8>().unwrap();

    if month == 0 || month > 12 || day == 0 || day > 31 {
      return Err(invalid_date_error(bytes));
    }

    Ok(Self { year, month, day })
  }

  /// Serializes this date into `Date` value bytes.
  ///
  pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
    if self.month == 0 || self.month > 12 || self.day == 0 || self.day > 31 {
      return Err(DataError::new_value_invalid(format!(
        "Date is invalid: year {}, month {}, day {}",
        self.year, self.month, self.day
      )));
    }

    Ok(
      format!("{:04}{:02}{:02}", self.year, self.month, self.day).into_bytes(),
    )
  }

  /// Formats this date in ISO 8601 form, e.g. `"2024-01-30"`.
  ///
  pub fn to_iso8601(&self) -> String {
    format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
  }
}

fn invalid_date_error(bytes: &[u8]) -> DataError {
  DataError::new_value_invalid(format!(
    "Date is invalid: {}",
    crate::utils::inspect_u8_slice(bytes, 16)
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      StructuredDate::from_bytes(b"20240130"),
      Ok(StructuredDate {
        year: 2024,
        month: 1,
        day: 30
      })
    );

    assert_eq!(
      StructuredDate::from_bytes(b"20240130 "),
      Ok(StructuredDate {
        year: 2024,
        month: 1,
        day: 30
      })
    );

    assert!(StructuredDate::from_bytes(b"2024013").is_err());
    assert!(StructuredDate::from_bytes(b"20241330").is_err());
    assert!(StructuredDate::from_bytes(b"20240100").is_err());
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      StructuredDate {
        year: 2024,
        month: 1,
        day: 30
      }
      .to_bytes(),
      Ok(b"20240130".to_vec())
    );

    assert!(
      StructuredDate {
        year: 2024,
        month: 13,
        day: 1
      }
      .to_bytes()
      .is_err()
    );
  }

  #[test]
  fn to_iso8601_test() {
    assert_eq!(
      StructuredDate {
        year: 2024,
        month: 1,
        day: 30
      }
      .to_iso8601(),
      "2024-01-30"
    );
  }
}
