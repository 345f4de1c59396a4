#[cfg(not(feature = "std"))]
use alloc::string::{String, ToString};

pub use crate::uids;

/// How sequences and sequence items are framed when writing DICOM P10 data.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SequenceFraming {
  /// Sequences and items are written with undefined lengths and terminated
  /// by delimitation items. This allows fully streaming writes.
  UndefinedLength,

  /// Sequences and items are written with defined lengths. The content of
  /// each sequence is buffered until its delimiter so its length can be
  /// filled in.
  DefinedLength,
}

/// Configuration used when writing DICOM P10 data.
///
#[derive(Clone, Debug, PartialEq)]
pub struct P10WriteConfig {
  pub(crate) implementation_class_uid: String,
  pub(crate) implementation_version_name: String,
  pub(crate) sequence_framing: SequenceFraming,
  pub(crate) zlib_compression_level: u32,
}

impl Default for P10WriteConfig {
  fn default() -> Self {
    Self {
      implementation_class_uid: uids::IMPLEMENTATION_CLASS_UID.to_string(),
      implementation_version_name: uids::IMPLEMENTATION_VERSION_NAME
        .to_string(),
      sequence_framing: SequenceFraming::UndefinedLength,
      zlib_compression_level: 6,
    }
  }
}

impl P10WriteConfig {
  /// The implementation class UID that will be included in the File Meta
  /// Information header of serialized DICOM P10 data.
  ///
  /// Defaults to the value of [`uids::IMPLEMENTATION_CLASS_UID`].
  ///
  pub fn implementation_class_uid(mut self, value: String) -> Self {
    self.implementation_class_uid = value;
    self
  }

  /// The implementation version name that will be included in the File Meta
  /// Information header of serialized DICOM P10 data.
  ///
  /// Defaults to the value of [`uids::IMPLEMENTATION_VERSION_NAME`].
  ///
  pub fn implementation_version_name(mut self, value: String) -> Self {
    self.implementation_version_name = value;
    self
  }

  /// How sequences and sequence items are framed. See [`SequenceFraming`]
  /// for details.
  ///
  /// Default: [`SequenceFraming::UndefinedLength`].
  ///
  pub fn sequence_framing(mut self, value: SequenceFraming) -> Self {
    self.sequence_framing = value;
    self
  }

  /// The zlib compression level to use when the transfer syntax being used
  /// is deflated.
  ///
  /// The level ranges from 0, meaning no compression, through to 9, which
  /// gives the best compression at the cost of speed.
  ///
  /// Default: 6.
  ///
  pub fn zlib_compression_level(mut self, value: u32) -> Self {
    self.zlib_compression_level = value.clamp(0, 9);
    self
  }
}
