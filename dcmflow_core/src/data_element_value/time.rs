//! Structured access to the value of data elements with the `Time` VR.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec::Vec};

use crate::DataError;

/// A time value parsed from a data element with the `Time` VR, which stores
/// times in the format `HHMMSS.FFFFFF`, where all components except the hour
/// are optional.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StructuredTime {
  pub hour: u8,
  pub minute: Option<u8>,
  pub second: Option<f64>,
}

impl StructuredTime {
  /// Parses a `Time` value from its raw bytes. Trailing space padding is
  /// permitted.
  ///
  pub fn from_bytes(bytes: &[u8]) -> Result<Self, DataError> {
    let value = core::str::from_utf8(bytes)
      .map_err(|_| invalid_time_error(bytes))?
      .trim_end_matches(' ');

    let digits_length = match value.find('.') {
      Some(index) => index,
      None => value.len(),
    };

    if !matches!(digits_length, 2 | 4 | 6) {
      return Err(invalid_time_error(bytes));
    }

    if !value[0..digits_length].bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid_time_error(bytes));
    }

    let hour = value[0..2].parse::<u8>().unwrap();
    if hour > 23 {
      return Err(invalid_time_error(bytes));
    }

    let minute = if digits_length >= 4 {
      let minute = value[2..4].parse::<u8>().unwrap();
      if minute > 59 {
        return Err(invalid_time_error(bytes));
      }

      Some(minute)
    } else {
      None
    };

    let second = if digits_length == 6 {
      let second = value[4..]
        .parse::<f64>()
        .map_err(|_| invalid_time_error(bytes))?;
      if second >= 60.0 {
        return Err(invalid_time_error(bytes));
      }

      Some(second)
    } else if value.len() > digits_length {
      // A fractional part without whole seconds is invalid
      return Err(invalid_time_error(bytes));
    } else {
      None
    };

    Ok(Self {
      hour,
      minute,
      second,
    })
  }

  /// Serializes this time into `Time` value bytes.
  ///
  pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
    if self.hour > 23
      || self.minute.is_some_and(|m| m > 59)
      || self.second.is_some_and(|s| !(0.0..60.0).contains(&s))
      || (self.minute.is_none() && self.second.is_some())
    {
      return Err(DataError::new_value_invalid(format!(
        "Time is invalid: {:?}",
        self
      )));
    }

    let mut result = format!("{:02}", self.hour);

    if let Some(minute) = self.minute {
      result.push_str(&format!("{:02}", minute));
    }

    if let Some(second) = self.second {
      result.push_str(&format!("{:09.6}", second));

      // Trailing zeros in the fractional part carry no information
      while result.ends_with('0') {
        result.pop();
      }
      if result.ends_with('.') {
        result.pop();
      }
    }

    Ok(result.into_bytes())
  }

  /// Formats this time in ISO 8601 form, e.g. `"22:45:14.25"`.
  ///
  pub fn to_iso8601(&self) -> String {
    let mut result = format!("{:02}", self.hour);

    if let Some(minute) = self.minute {
      result.push_str(&format!(":{:02}", minute));
    }

    if let Some(second) = self.second {
      if second.fract() == 0.0 {
        result.push_str(&format!(":{:02}", second as u8));
      } else {
        result.push_str(&format!(":{:09.6}", second));

        while result.ends_with('0') {
          result.pop();
        }
      }
    }

    result
  }
}

fn invalid_time_error(bytes: &[u8]) -> DataError {
  DataError::new_value_invalid(format!(
    "Time is invalid: {}",
    crate::utils::inspect_u8_slice(bytes, 16)
  ))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_bytes_test() {
    assert_eq!(
      StructuredTime::from_bytes(b"22"),
      Ok(StructuredTime {
        hour: 22,
        minute: None,
        second: None
      })
    );

    assert_eq!(
      StructuredTime::from_bytes(b"2245"),
      Ok(StructuredTime {
        hour: 22,
        minute: Some(45),
        second: None
      })
    );

    assert_eq!(
      StructuredTime::from_bytes(b"224514.25 "),
      Ok(StructuredTime {
        hour: 22,
        minute: Some(45),
        second: Some(14.25)
      })
    );

    assert!(StructuredTime::from_bytes(b"2").is_err());
    assert!(StructuredTime::from_bytes(b"245").is_err());
    assert!(StructuredTime::from_bytes(b"2260").is_err());
    assert!(StructuredTime::from_bytes(b"22.5").is_err());
  }

  #[test]
  fn to_bytes_test() {
    assert_eq!(
      StructuredTime {
        hour: 22,
        minute: Some(45),
        second: Some(14.25)
      }
      .to_bytes(),
      Ok(b"224514.25".to_vec())
    );

    assert_eq!(
      StructuredTime {
        hour: 22,
        minute: Some(45),
        second: None
      }
      .to_bytes(),
      Ok(b"2245".to_vec())
    );

    assert!(
      StructuredTime {
        hour: 22,
        minute: None,
        second: Some(14.0)
      }
      .to_bytes()
      .is_err()
    );
  }

  #[test]
  fn to_iso8601_test() {
    assert_eq!(
      StructuredTime {
        hour: 22,
        minute: Some(45),
        second: Some(14.0)
      }
      .to_iso8601(),
      "22:45:14"
    );

    assert_eq!(
      StructuredTime {
        hour: 22,
        minute: Some(45),
        second: Some(14.25)
      }
      .to_iso8601(),
      "22:45:14.25"
    );
  }
}
