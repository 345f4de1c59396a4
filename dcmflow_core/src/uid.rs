//! A DICOM unique identifier (UID).

#[cfg(not(feature = "std"))]
use alloc::string::String;

/// A DICOM unique identifier: a string of up to 64 characters drawn from the
/// digits and the period character, structured as period-separated numeric
/// components with no leading zeros.
///
/// UIDs are stored inline with no heap allocation.
///
/// Ref: PS3.5 9.
///
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Uid {
  bytes: [u8; 64],
  length: u8,
}

/// An error when validating or constructing a UID.
///
#[derive(Clone, Debug, PartialEq)]
pub enum UidError {
  /// The UID is empty or longer than 64 characters.
  InvalidLength { length: usize },

  /// The UID contains a character other than the digits and the period, has
  /// an empty component, or has a multi-digit component with a leading zero.
  InvalidStructure,
}

impl Uid {
  /// Creates a UID from a string, validating it against the UID grammar.
  /// Trailing NULL padding is removed prior to validation.
  ///
  pub fn new(value: &str) -> Result<Self, UidError> {
    let value = value.trim_end_matches('\0');

    if value.is_empty() || value.len() > 64 {
      return Err(UidError::InvalidLength {
        length: value.len(),
      });
    }

    for component in value.split('.') {
      let component = component.as_bytes();

      let is_valid = match component {
        [] => false,
        [digit] => digit.is_ascii_digit(),
        [first, rest @ ..] => {
          (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit)
        }
      };

      if !is_valid {
        return Err(UidError::InvalidStructure);
      }
    }

    let mut bytes = [0u8; 64];
    bytes[0..value.len()].copy_from_slice(value.as_bytes());

    Ok(Self {
      bytes,
      length: value.len() as u8,
    })
  }

  /// Returns the UID as a string slice.
  ///
  pub fn as_str(&self) -> &str {
    core::str::from_utf8(&self.bytes[0..usize::from(self.length)]).unwrap()
  }

  /// Returns the length of the UID in characters.
  ///
  #[allow(clippy::len_without_is_empty)]
  pub fn len(&self) -> usize {
    usize::from(self.length)
  }

  /// Generates a new random UID under the given root. The root must itself be
  /// a valid UID and short enough to leave room for a random suffix.
  ///
  /// The suffix is drawn from a uniform random 112-bit integer, so collisions
  /// are not a practical concern.
  ///
  #[cfg(feature = "std")]
  pub fn new_random(root: &str) -> Result<Self, UidError> {
    use rand::Rng;

    Self::new(root)?;

    if root.len() > 28 {
      return Err(UidError::InvalidLength { length: root.len() });
    }

    let suffix: u128 = rand::thread_rng().r#gen::<u128>() >> 16;

    let uid = std::format!("{}.{}", root, suffix);

    Self::new(&uid)
  }
}

impl core::fmt::Debug for Uid {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "Uid({:?})", self.as_str())
  }
}

impl core::fmt::Display for Uid {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl core::str::FromStr for Uid {
  type Err = UidError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::new(s)
  }
}

impl From<Uid> for String {
  fn from(uid: Uid) -> String {
    uid.as_str().into()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_test() {
    assert!(Uid::new("1.2.840.10008.1.2.1").is_ok());
    assert!(Uid::new("0").is_ok());
    assert!(Uid::new("1.2.840.10008.1.2.1\0").is_ok());

    assert_eq!(Uid::new(""), Err(UidError::InvalidLength { length: 0 }));
    assert_eq!(
      Uid::new(&"1.".repeat(40)),
      Err(UidError::InvalidLength { length: 80 })
    );

    assert_eq!(Uid::new("1..2"), Err(UidError::InvalidStructure));
    assert_eq!(Uid::new("1.02"), Err(UidError::InvalidStructure));
    assert_eq!(Uid::new("1.2a"), Err(UidError::InvalidStructure));
    assert_eq!(Uid::new("1.2."), Err(UidError::InvalidStructure));
  }

  #[test]
  fn as_str_test() {
    assert_eq!(Uid::new("1.2.840").unwrap().as_str(), "1.2.840");
    assert_eq!(Uid::new("1.2.840").unwrap().len(), 7);
  }

  #[cfg(feature = "std")]
  #[test]
  fn new_random_test() {
    let uid = Uid::new_random("1.2.840.99999").unwrap();

    assert!(uid.as_str().starts_with("1.2.840.99999."));
    assert!(uid.len() <= 64);

    assert_ne!(
      Uid::new_random("1.2.840.99999").unwrap(),
      Uid::new_random("1.2.840.99999").unwrap()
    );
  }
}
