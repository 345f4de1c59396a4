//! Provides the [`DataError`] type that describes the errors that can occur
//! when working with data sets and elements.

use crate::{DataSetPath, DcmflowError, ValueRepresentation, dictionary};

#[cfg(not(feature = "std"))]
use alloc::{
  format,
  string::{String, ToString},
  vec,
  vec::Vec,
};

/// An error that occurred when retrieving or creating data elements in data
/// sets.
///
#[derive(Clone, Debug, PartialEq)]
pub enum DataError {
  /// When retrieving a value, the requested tag was not present in the data
  /// set.
  TagNotPresent { path: DataSetPath },

  /// When retrieving a value, the requested type is not present. E.g. tried
  /// to retrieve an integer value when the data element value contains a
  /// string.
  ValueNotPresent { path: Option<DataSetPath> },

  /// When retrieving a value, it did not have the required multiplicity.
  /// E.g. tried to retrieve a single string value when the data element
  /// contained multiple string values.
  MultiplicityMismatch { path: Option<DataSetPath> },

  /// When retrieving a value, there was an error decoding its bytes. When
  /// creating a value, the supplied input was not valid for the type of data
  /// element being created.
  ValueInvalid {
    details: String,
    path: Option<DataSetPath>,
  },

  /// When creating a value, the supplied data did not meet a required length
  /// constraint, e.g. the minimum or maximum length for the value
  /// representation wasn't respected.
  ValueLengthInvalid {
    vr: ValueRepresentation,
    length: u64,
    details: String,
    path: Option<DataSetPath>,
  },
}

impl DataError {
  /// Constructs a new 'Tag not present' data error.
  ///
  pub fn new_tag_not_present() -> Self {
    Self::TagNotPresent {
      path: DataSetPath::new(),
    }
  }

  /// Constructs a new 'Value not present' data error.
  ///
  pub fn new_value_not_present() -> Self {
    Self::ValueNotPresent { path: None }
  }

  /// Constructs a new 'Multiplicity mismatch' data error.
  ///
  pub fn new_multiplicity_mismatch() -> Self {
    Self::MultiplicityMismatch { path: None }
  }

  /// Constructs a new 'Value invalid' data error.
  ///
  pub fn new_value_invalid(details: String) -> Self {
    Self::ValueInvalid {
      details,
      path: None,
    }
  }

  /// Constructs a new 'Value length invalid' data error.
  ///
  pub fn new_value_length_invalid(
    vr: ValueRepresentation,
    length: u64,
    details: String,
  ) -> Self {
    Self::ValueLengthInvalid {
      vr,
      length,
      details,
      path: None,
    }
  }

  /// Returns the data set path for a data error.
  ///
  pub fn path(&self) -> Option<&DataSetPath> {
    match &self {
      Self::TagNotPresent { path } => Some(path),
      Self::ValueNotPresent { path }
      | Self::MultiplicityMismatch { path }
      | Self::ValueInvalid { path, .. }
      | Self::ValueLengthInvalid { path, .. } => path.as_ref(),
    }
  }

  /// Adds a data set path to a data error. This indicates the exact location
  /// that a data error occurred in a data set, and should be included
  /// wherever possible to make troubleshooting easier.
  ///
  pub fn with_path(self, path: &DataSetPath) -> Self {
    match self {
      Self::TagNotPresent { .. } => Self::TagNotPresent { path: path.clone() },
      Self::ValueNotPresent { .. } => Self::ValueNotPresent {
        path: Some(path.clone()),
      },
      Self::MultiplicityMismatch { .. } => Self::MultiplicityMismatch {
        path: Some(path.clone()),
      },
      Self::ValueInvalid { details, .. } => Self::ValueInvalid {
        details,
        path: Some(path.clone()),
      },
      Self::ValueLengthInvalid {
        vr,
        length,
        details,
        ..
      } => Self::ValueLengthInvalid {
        vr,
        length,
        details,
        path: Some(path.clone()),
      },
    }
  }

  /// Returns the name of a data error as a human-readable string.
  ///
  pub fn name(&self) -> &'static str {
    match &self {
      Self::TagNotPresent { .. } => "Tag not present",
      Self::ValueNotPresent { .. } => "Value not present",
      Self::MultiplicityMismatch { .. } => "Multiplicity mismatch",
      Self::ValueInvalid { .. } => "Invalid value",
      Self::ValueLengthInvalid { .. } => "Invalid value length",
    }
  }

  /// Returns the `details` field of the error, if one exists.
  ///
  pub fn details(&self) -> &str {
    match self {
      Self::ValueInvalid { details, .. } => details,
      Self::ValueLengthInvalid { details, .. } => details,
      _ => "",
    }
  }
}

impl core::fmt::Display for DataError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    let path = match self.path() {
      Some(path) => path.to_detailed_string(),
      None => "<unknown>".to_string(),
    };

    match self.details() {
      "" => write!(f, "DICOM data error: {} at {}", self.name(), path),
      details => write!(
        f,
        "DICOM data error: {} at {}, details: {}",
        self.name(),
        path,
        details
      ),
    }
  }
}

impl DcmflowError for DataError {
  /// Returns lines of text that describe a DICOM data error in a
  /// human-readable format.
  ///
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![
      format!("DICOM data error {}", task_description),
      "".to_string(),
      format!("  Error: {}", self.name()),
    ];

    if let Some(path) = self.path() {
      if let Ok(tag) = path.final_data_element() {
        lines.push(format!("  Tag: {tag}"));
        lines.push(format!("  Name: {}", dictionary::tag_name(tag, None)));
      }

      lines.push(format!("  Path: {}", path.to_detailed_string()));
    }

    match &self {
      Self::ValueInvalid { details, .. } => {
        lines.push(format!("  Details: {details}"));
      }
      Self::ValueLengthInvalid {
        vr,
        length,
        details,
        ..
      } => {
        lines.push(format!("  VR: {vr}"));
        lines.push(format!("  Length: {length} bytes"));
        lines.push(format!("  Details: {details}"));
      }
      _ => (),
    };

    lines
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_lines_test() {
    assert_eq!(
      DataError::new_tag_not_present()
        .with_path(&DataSetPath::from_string("00080016").unwrap())
        .to_lines("testing")
        .join("\n"),
      "DICOM data error testing\n\n  Error: Tag not present\n  \
       Tag: (0008,0016)\n  Name: SOP Class UID\n  \
       Path: (0008,0016) SOP Class UID"
    );

    assert_eq!(
      DataError::new_value_length_invalid(
        ValueRepresentation::AgeString,
        5,
        "Test 123".to_string(),
      )
      .to_lines("testing")
      .join("\n"),
      "DICOM data error testing\n\n  Error: Invalid value length\n  VR: AS\n  \
       Length: 5 bytes\n  Details: Test 123"
    );
  }
}
