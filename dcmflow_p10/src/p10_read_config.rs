#[cfg(feature = "std")]
use std::rc::Rc;

#[cfg(not(feature = "std"))]
use alloc::rc::Rc;

use dcmflow_core::{DataElementTag, ValueRepresentation};

use crate::p10_error::P10Issue;

/// How strictly non-conformant DICOM P10 data is treated when reading.
///
/// Each class of non-conformance resolves differently per mode: in strict
/// mode it fails the read, in lenient mode it is repaired where possible and
/// reported through the issue callback, and in permissive mode the original
/// data is preserved as closely as possible.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeStrictness {
  Strict,
  Lenient,
  Permissive,
}

/// How the 128-byte File Preamble and 'DICM' prefix are handled when
/// reading.
///
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PreamblePolicy {
  /// The preamble and 'DICM' prefix must be present. Data without them
  /// fails to read.
  Require,

  /// The preamble and 'DICM' prefix are read when present. When absent, and
  /// the start of the data looks like a bare data element, reading proceeds
  /// without them.
  Optional,

  /// 132 bytes are skipped without checking for the 'DICM' prefix, unless
  /// the start of the data looks like a bare data element, in which case
  /// nothing is skipped.
  Ignore,
}

/// How data element values whose length exceeds the configured threshold are
/// handled when reading.
///
#[derive(Clone)]
pub enum LargeValueHandling {
  /// Large values are read into memory the same as any other value.
  LoadInMemory,

  /// Large values are replaced with lazily loaded values that read their
  /// bytes on demand from the read context's data source. Requires a
  /// seekable data source to have been registered on the read context,
  /// otherwise reading fails with [`crate::P10Error::LazyLoadUnsupported`].
  LazyLoad,

  /// Large values are skipped entirely and no tokens are emitted for them.
  Skip,

  /// Each large value is passed to the callback, which decides how it is
  /// handled.
  Callback(LargeValueCallback),
}

impl core::fmt::Debug for LargeValueHandling {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let name = match self {
      Self::LoadInMemory => "LoadInMemory",
      Self::LazyLoad => "LazyLoad",
      Self::Skip => "Skip",
      Self::Callback(_) => "Callback",
    };

    f.write_str(name)
  }
}

/// Details of a large data element value passed to a
/// [`LargeValueHandling::Callback`] callback.
///
#[derive(Clone, Debug, PartialEq)]
pub struct LargeValueInfo {
  pub tag: DataElementTag,
  pub vr: ValueRepresentation,
  pub length: u32,

  /// The absolute offset of the start of the value's bytes in the P10 data.
  pub offset: u64,
}

/// The decision returned by a [`LargeValueHandling::Callback`] callback.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LargeValueDecision {
  LoadInMemory,
  LazyLoad,
  Skip,
}

/// A callback that decides how a specific large data element value is
/// handled.
///
pub type LargeValueCallback = Rc<dyn Fn(&LargeValueInfo) -> LargeValueDecision>;

/// A callback that receives the non-fatal issues encountered while reading.
///
pub type IssueCallback = Rc<dyn Fn(&P10Issue)>;

/// Configuration used when reading DICOM P10 data.
///
#[derive(Clone)]
pub struct P10ReadConfig {
  pub(crate) strictness: DecodeStrictness,
  pub(crate) preamble_policy: PreamblePolicy,
  pub(crate) max_token_size: u32,
  pub(crate) max_string_size: u32,
  pub(crate) max_sequence_depth: usize,
  pub(crate) require_ordered_data_elements: bool,
  pub(crate) large_value_threshold: u32,
  pub(crate) large_value_handling: LargeValueHandling,
  pub(crate) issue_callback: Option<IssueCallback>,
}

impl core::fmt::Debug for P10ReadConfig {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("P10ReadConfig")
      .field("strictness", &self.strictness)
      .field("preamble_policy", &self.preamble_policy)
      .field("max_token_size", &self.max_token_size)
      .field("max_string_size", &self.max_string_size)
      .field("max_sequence_depth", &self.max_sequence_depth)
      .field(
        "require_ordered_data_elements",
        &self.require_ordered_data_elements,
      )
      .field("large_value_threshold", &self.large_value_threshold)
      .field("large_value_handling", &self.large_value_handling)
      .field("issue_callback", &self.issue_callback.is_some())
      .finish()
  }
}

impl Default for P10ReadConfig {
  fn default() -> Self {
    Self {
      strictness: DecodeStrictness::Lenient,
      preamble_policy: PreamblePolicy::Optional,
      max_token_size: 0xFFFF_FFFE,
      max_string_size: 0xFFFF_FFFE,
      max_sequence_depth: 50,
      require_ordered_data_elements: true,
      large_value_threshold: 1024 * 1024,
      large_value_handling: LargeValueHandling::LoadInMemory,
      issue_callback: None,
    }
  }
}

impl P10ReadConfig {
  /// The strictness mode used to resolve non-conformant data. See
  /// [`DecodeStrictness`] for details.
  ///
  /// Default: [`DecodeStrictness::Lenient`].
  ///
  pub fn strictness(mut self, value: DecodeStrictness) -> Self {
    self.strictness = value;
    self
  }

  /// How the File Preamble and 'DICM' prefix are handled. See
  /// [`PreamblePolicy`] for details.
  ///
  /// Default: [`PreamblePolicy::Optional`].
  ///
  pub fn preamble_policy(mut self, value: PreamblePolicy) -> Self {
    self.preamble_policy = value;
    self
  }

  /// The maximum size in bytes of a DICOM P10 token emitted by a read
  /// context. This can be used to control memory usage during a streaming
  /// read, and must be a multiple of 8. Data element values larger than
  /// this are split across multiple
  /// [`crate::P10Token::DataElementValueBytes`] tokens.
  ///
  /// By default there is no limit on the maximum token size.
  ///
  pub fn max_token_size(mut self, value: u32) -> Self {
    self.max_token_size = { value / 8 } * 8;
    self
  }

  /// The maximum size in bytes of non-UTF-8 strings that can be read by a
  /// read context. Such string data is converted to UTF-8 by the read
  /// context, which requires that the whole string value be read into
  /// memory.
  ///
  /// By default there is no limit on the maximum string size.
  ///
  pub fn max_string_size(mut self, value: u32) -> Self {
    self.max_string_size = core::cmp::max(value, self.max_token_size);
    self
  }

  /// The maximum sequence depth that can be read by a read context. Data
  /// that nests deeper than this fails with
  /// [`crate::P10Error::MaximumExceeded`].
  ///
  /// Default: 50.
  ///
  pub fn max_sequence_depth(mut self, value: usize) -> Self {
    self.max_sequence_depth = value;
    self
  }

  /// Whether to error if data elements are not in ascending order in the
  /// DICOM P10 data. Such data is malformed but is still able to be read,
  /// however doing so can potentially lead to incorrect results, e.g. when
  /// the *'(0008,0005) Specific Character Set'* data element appears after
  /// data elements that use an encoded string VR.
  ///
  /// By default this requirement is enforced.
  ///
  pub fn require_ordered_data_elements(mut self, value: bool) -> Self {
    self.require_ordered_data_elements = value;
    self
  }

  /// The value length in bytes at which a data element value is considered
  /// large and is subject to the configured large value handling.
  ///
  /// Default: 1 MiB.
  ///
  pub fn large_value_threshold(mut self, value: u32) -> Self {
    self.large_value_threshold = value;
    self
  }

  /// How data element values whose length meets the large value threshold
  /// are handled. See [`LargeValueHandling`] for details.
  ///
  /// Default: [`LargeValueHandling::LoadInMemory`].
  ///
  pub fn large_value_handling(mut self, value: LargeValueHandling) -> Self {
    self.large_value_handling = value;
    self
  }

  /// A callback that receives the non-fatal issues encountered while
  /// reading. The strictness mode decides which classes of non-conformance
  /// are reported here rather than failing the read.
  ///
  pub fn issue_callback(mut self, value: IssueCallback) -> Self {
    self.issue_callback = Some(value);
    self
  }
}
