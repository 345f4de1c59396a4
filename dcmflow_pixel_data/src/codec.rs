//! The interface implemented by pixel data codecs, and the process-wide
//! registry that maps transfer syntaxes to their codec.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec, vec::Vec};

use dcmflow_core::{DcmflowError, RcByteSlice};

use crate::PixelDataDefinition;

/// An error that occurred while encoding or decoding pixel data. It carries
/// the index of the frame being processed and the byte offset in that
/// frame's encoded data where the error was detected, when known.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PixelDataCodecError {
  pub frame_index: Option<usize>,
  pub offset: Option<u64>,
  pub reason: String,
}

impl PixelDataCodecError {
  /// Creates a new codec error with the given reason.
  ///
  pub fn new(reason: &str) -> Self {
    Self {
      frame_index: None,
      offset: None,
      reason: reason.into(),
    }
  }

  /// Returns a copy of this error with the frame index set.
  ///
  pub fn with_frame_index(mut self, frame_index: usize) -> Self {
    self.frame_index = Some(frame_index);
    self
  }

  /// Returns a copy of this error with the byte offset set.
  ///
  pub fn with_offset(mut self, offset: u64) -> Self {
    self.offset = Some(offset);
    self
  }
}

impl core::fmt::Display for PixelDataCodecError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    write!(f, "Pixel data codec error: {}", self.reason)
  }
}

impl DcmflowError for PixelDataCodecError {
  fn to_lines(&self, task_description: &str) -> Vec<String> {
    let mut lines = vec![
      format!("Pixel data codec error {}", task_description),
      "".into(),
      format!("  Reason: {}", self.reason),
    ];

    if let Some(frame_index) = self.frame_index {
      lines.push(format!("  Frame: {}", frame_index));
    }

    if let Some(offset) = self.offset {
      lines.push(format!("  Offset: 0x{offset:X}"));
    }

    lines
  }
}

/// The result of encoding frames of pixel data: one or more fragments per
/// frame, and the basic offset table entries that index the first fragment
/// of each frame.
///
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedFrames {
  /// The encoded fragments, in frame order.
  pub fragments: Vec<RcByteSlice>,

  /// A basic offset table entry for each frame: the byte offset of the
  /// frame's first fragment, measured from the end of the basic offset
  /// table item, including each fragment's 8-byte item header.
  pub basic_offset_table: Vec<u32>,
}

/// Options controlling pixel data encoding.
///
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeOptions {
  /// Encoding quality in the range 1-100. Only meaningful for lossy codecs.
  pub quality: u8,

  /// The chroma subsampling applied when encoding color data with a codec
  /// that subsamples, such as JPEG Baseline.
  pub chroma_subsampling: crate::jpeg::ChromaSubsampling,
}

impl Default for EncodeOptions {
  fn default() -> Self {
    Self {
      quality: 85,
      chroma_subsampling: crate::jpeg::ChromaSubsampling::Both,
    }
  }
}

/// The interface implemented by pixel data codecs. A codec converts between
/// raw frames of pixel data and the encoded fragments stored in an
/// encapsulated transfer syntax.
///
pub trait PixelDataCodec {
  /// The name of the codec, e.g. `"JPEG Baseline"`.
  ///
  fn name(&self) -> &'static str;

  /// Returns whether this codec is lossless, i.e. whether decoding encoded
  /// data always returns exactly the raw data it was encoded from.
  ///
  fn is_lossless(&self) -> bool;

  /// Returns whether frames can be encoded in parallel by this codec.
  /// Fragments are emitted in frame-index order regardless.
  ///
  fn supports_parallel_encoding(&self) -> bool {
    false
  }

  /// Decodes one frame of pixel data into the destination buffer. `data` is
  /// the frame's complete encoded data, i.e. its fragments concatenated.
  ///
  fn decode_frame(
    &self,
    data: &[u8],
    definition: &PixelDataDefinition,
    frame_index: usize,
    destination: &mut Vec<u8>,
  ) -> Result<(), PixelDataCodecError>;

  /// Encodes raw frames of pixel data. `raw` holds the frames contiguously
  /// in frame order.
  ///
  fn encode_frames(
    &self,
    raw: &[u8],
    definition: &PixelDataDefinition,
    options: &EncodeOptions,
  ) -> Result<EncodedFrames, PixelDataCodecError>;

  /// Validates one frame of encoded pixel data without decoding it fully.
  ///
  fn validate(
    &self,
    data: &[u8],
    definition: &PixelDataDefinition,
  ) -> Result<(), PixelDataCodecError>;

  /// Returns whether the given fragment is the final fragment of a frame.
  /// Used to reconstruct frames when there are multiple fragments per frame
  /// and no offset table. Codecs without detectable frame boundaries return
  /// true, making each fragment its own frame.
  ///
  fn is_end_of_frame(&self, _fragment: &[u8]) -> bool {
    true
  }
}

/// The process-wide codec registry. Codecs are registered against transfer
/// syntax UIDs at startup and looked up read-only thereafter; registration
/// of custom codecs is serialized by the registry's lock.
///
#[cfg(feature = "std")]
mod registry {
  use std::collections::BTreeMap;
  use std::sync::{Arc, RwLock};

  use super::PixelDataCodec;
  use dcmflow_core::transfer_syntax;

  type Registry = BTreeMap<&'static str, Arc<dyn PixelDataCodec + Send + Sync>>;

  static REGISTRY: RwLock<Registry> = RwLock::new(BTreeMap::new());

  /// Registers a codec for the given transfer syntax UID, replacing any
  /// existing registration.
  ///
  pub fn register_codec(
    transfer_syntax_uid: &'static str,
    codec: Arc<dyn PixelDataCodec + Send + Sync>,
  ) {
    REGISTRY
      .write()
      .unwrap()
      .insert(transfer_syntax_uid, codec);
  }

  /// Returns the codec registered for the given transfer syntax UID. The
  /// built-in codecs are registered on first use.
  ///
  pub fn codec_for_transfer_syntax(
    transfer_syntax_uid: &str,
  ) -> Option<Arc<dyn PixelDataCodec + Send + Sync>> {
    register_builtin_codecs();

    REGISTRY.read().unwrap().get(transfer_syntax_uid).cloned()
  }

  fn register_builtin_codecs() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
      register_codec(
        transfer_syntax::JPEG_BASELINE_8BIT.uid,
        Arc::new(crate::jpeg::JpegBaselineCodec),
      );

      register_codec(
        transfer_syntax::RLE_LOSSLESS.uid,
        Arc::new(crate::rle::RleLosslessCodec),
      );

      register_codec(
        transfer_syntax::ENCAPSULATED_UNCOMPRESSED_EXPLICIT_VR_LITTLE_ENDIAN
          .uid,
        Arc::new(crate::native::NativeCodec),
      );
    });
  }
}

#[cfg(feature = "std")]
pub use registry::{codec_for_transfer_syntax, register_codec};
