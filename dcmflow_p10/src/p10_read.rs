//! Converts incoming chunks of binary DICOM P10 data into DICOM P10 tokens.
//!
//! This conversion is done in a streaming fashion, where chunks of incoming
//! raw binary data are added to a read context, and DICOM P10 tokens are then
//! progressively made available as their data comes in. See the [`P10Token`]
//! type for details on the different tokens that are emitted.
//!
//! A read context is resumable at every point: when the data supplied so far
//! is insufficient to read the next token it returns
//! [`P10Error::DataRequired`] without losing any work, and the caller writes
//! further bytes and retries. If DICOM P10 data already exists fully in
//! memory it can be added to a new read context as one complete and final
//! chunk and have its tokens read out in a single pass.
//!
//! How non-conformant data is handled is controlled by the strictness mode
//! and other settings in [`P10ReadConfig`].

#[cfg(not(feature = "std"))]
use alloc::{
  boxed::Box, format, string::ToString, vec, vec::Vec,
};

use byteorder::ByteOrder;

use dcmflow_core::{
  DataElementTag, DataElementValue, DataSet, DataSetPath, DataSourceHandle,
  LazyValueHandle, RcByteSlice, ValueRepresentation, dictionary,
  transfer_syntax, transfer_syntax::TransferSyntax,
};

use crate::detect;
use crate::internal::byte_stream::{ByteStream, ByteStreamError};
use crate::internal::data_element_header::{
  DataElementHeader, ValueLengthSize,
};
use crate::internal::p10_location::{self, P10Location};
use crate::p10_error::{IssueKind, IssueSeverity, P10Issue};
use crate::p10_read_config::{
  DecodeStrictness, LargeValueDecision, LargeValueHandling, LargeValueInfo,
  PreamblePolicy,
};
use crate::{
  P10Error, P10ReadConfig, P10Token, internal::value_length::ValueLength,
};

/// The byte pattern of a sequence delimitation item with zero length, used
/// when scanning for the end of non-conformant pixel data.
///
const SEQUENCE_DELIMITER_PATTERN: [u8; 8] =
  [0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00];

/// A read context holds the current state of an in-progress DICOM P10 read.
/// Raw DICOM P10 data is added to a read context with [`Self::write_bytes`],
/// and DICOM P10 tokens are then read out with [`Self::read_tokens`].
///
pub struct P10ReadContext {
  config: P10ReadConfig,
  stream: ByteStream,
  next_action: NextAction,
  transfer_syntax: &'static TransferSyntax,
  path: DataSetPath,
  location: P10Location,
  lazy_data_source: Option<DataSourceHandle>,
}

impl core::fmt::Debug for P10ReadContext {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("P10ReadContext")
      .field("config", &self.config)
      .field("next_action", &self.next_action)
      .field("transfer_syntax", &self.transfer_syntax.uid)
      .field("path", &self.path)
      .field("bytes_read", &self.stream.bytes_read())
      .finish()
  }
}

impl core::fmt::Debug for NextAction {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let name = match self {
      NextAction::ReadFilePreambleAndDICMPrefix => {
        "ReadFilePreambleAndDICMPrefix"
      }
      NextAction::ReadFileMetaInformation { .. } => "ReadFileMetaInformation",
      NextAction::ReadDataElementHeader => "ReadDataElementHeader",
      NextAction::ReadDataElementValueBytes { .. } => {
        "ReadDataElementValueBytes"
      }
      NextAction::ReadUnencapsulatedPixelData { .. } => {
        "ReadUnencapsulatedPixelData"
      }
      NextAction::ReadPixelDataItem { .. } => "ReadPixelDataItem",
    };

    f.write_str(name)
  }
}

/// The next action specifies what will be attempted to be read next from a
/// read context by `read_tokens`.
///
#[allow(clippy::enum_variant_names)]
enum NextAction {
  ReadFilePreambleAndDICMPrefix,
  ReadFileMetaInformation {
    starts_at: u64,
    ends_at: Option<u64>,
    data_set: DataSet,
  },
  ReadDataElementHeader,
  ReadDataElementValueBytes {
    tag: DataElementTag,
    vr: ValueRepresentation,
    raw_vr: Option<[u8; 2]>,
    length: u32,
    bytes_remaining: u32,
    emit_tokens: bool,
    pad_to_even: bool,
  },
  ReadUnencapsulatedPixelData {
    tag: DataElementTag,
    vr: ValueRepresentation,
    search_offset: usize,
  },
  ReadPixelDataItem {
    vr: ValueRepresentation,
  },
}

impl P10ReadContext {
  /// Creates a new read context for reading DICOM P10 data.
  ///
  pub fn new(config: Option<P10ReadConfig>) -> P10ReadContext {
    P10ReadContext {
      config: config.unwrap_or_default(),
      stream: ByteStream::new(),
      next_action: NextAction::ReadFilePreambleAndDICMPrefix,
      transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
      path: DataSetPath::new(),
      location: P10Location::new(),
      lazy_data_source: None,
    }
  }

  /// Sets the transfer syntax to use when reading DICOM P10 data that
  /// doesn't specify a transfer syntax in its File Meta Information, or
  /// doesn't have any File Meta Information.
  ///
  /// The default is 'Implicit VR Little Endian'.
  ///
  /// The fallback transfer syntax should be set prior to reading any DICOM
  /// P10 tokens from the read context.
  ///
  pub fn set_fallback_transfer_syntax(
    &mut self,
    transfer_syntax: &'static TransferSyntax,
  ) {
    self.transfer_syntax = transfer_syntax;
  }

  /// Registers the seekable data source that the bytes supplied to this
  /// read context originate from. This is required in order for large data
  /// element values to be lazily loaded, see
  /// [`crate::p10_read_config::LargeValueHandling::LazyLoad`].
  ///
  pub fn set_lazy_data_source(&mut self, source: DataSourceHandle) {
    self.lazy_data_source = Some(source);
  }

  /// Returns the transfer syntax for a P10 read context. This defaults to
  /// 'Implicit VR Little Endian' and is updated when a transfer syntax is
  /// read from the File Meta Information.
  ///
  pub fn transfer_syntax(&self) -> &TransferSyntax {
    self.transfer_syntax
  }

  /// Writes raw DICOM P10 bytes to a read context that will be parsed into
  /// DICOM P10 tokens by subsequent calls to [`Self::read_tokens()`]. If
  /// `done` is true this indicates the end of the incoming DICOM P10 data
  /// to be parsed, after which any further calls to this function will
  /// error.
  ///
  pub fn write_bytes(
    &mut self,
    bytes: RcByteSlice,
    done: bool,
  ) -> Result<(), P10Error> {
    match self.stream.write(bytes, done) {
      Ok(_) => Ok(()),

      Err(e) => Err(
        self.map_byte_stream_error(e, "Writing data to DICOM P10 read context"),
      ),
    }
  }

  /// Reads the next DICOM P10 tokens from a read context. On success, zero
  /// or more tokens are returned and the function can be called again to
  /// read further tokens.
  ///
  /// On error, a value of [`P10Error::DataRequired`] means the read context
  /// does not have enough data to return the next token, i.e. further calls
  /// to [`Self::write_bytes`] are required before the next token is able to
  /// be read.
  ///
  pub fn read_tokens(&mut self) -> Result<Vec<P10Token>, P10Error> {
    match self.next_action {
      NextAction::ReadFilePreambleAndDICMPrefix => {
        self.read_file_preamble_and_dicm_prefix_token()
      }

      NextAction::ReadFileMetaInformation { .. } => {
        self.read_file_meta_information_token()
      }

      NextAction::ReadDataElementHeader => {
        // If there is a delimiter token for a defined-length sequence or
        // item that needs to be emitted then return that as the next token
        let delimiter_token = self.next_delimiter_token();
        if !delimiter_token.is_empty() {
          return Ok(delimiter_token);
        }

        // Detect the end of the DICOM data
        if self.stream.is_fully_consumed() {
          self.end_of_data_tokens()
        } else {
          // There is more data so start reading the next data element.
          //
          // String values are converted to UTF-8 as they are read, and any
          // '(0008,0005) Specific Character Set' data element present in
          // the input has its value rewritten to declare UTF-8 so that the
          // emitted tokens are self-consistent.
          let (tokens, _tag) = self.read_data_element_header_token()?;

          Ok(tokens)
        }
      }

      NextAction::ReadDataElementValueBytes {
        tag,
        vr,
        raw_vr,
        length,
        bytes_remaining,
        emit_tokens,
        pad_to_even,
      } => self.read_data_element_value_bytes_token(
        tag,
        vr,
        raw_vr,
        length,
        bytes_remaining,
        emit_tokens,
        pad_to_even,
      ),

      NextAction::ReadUnencapsulatedPixelData {
        tag,
        vr,
        search_offset,
      } => self.read_unencapsulated_pixel_data_token(tag, vr, search_offset),

      NextAction::ReadPixelDataItem { vr } => {
        self.read_pixel_data_item_token(vr)
      }
    }
  }

  /// Returns the tokens emitted once the end of the input data has been
  /// reached: delimiters for any active sequences and items, then the end
  /// token.
  ///
  /// In lenient and permissive modes, P10 data can be truncated on a data
  /// element boundary and the unclosed sequences and items are ended as if
  /// their delimiters were present. In strict mode this is an error.
  ///
  fn end_of_data_tokens(&mut self) -> Result<Vec<P10Token>, P10Error> {
    if self.location.has_open_sequences_or_items() {
      if self.config.strictness == DecodeStrictness::Strict {
        return Err(P10Error::DataInvalid {
          when: "Reading data element header".to_string(),
          details: "Undefined-length sequences or items are unterminated at \
            the end of the data"
            .to_string(),
          kind: IssueKind::UndefinedLengthWithoutDelimiter,
          path: self.path.clone(),
          offset: self.stream.bytes_read(),
        });
      }

      self.report_issue(
        IssueKind::UndefinedLengthWithoutDelimiter,
        IssueSeverity::Warning,
        None,
        "Data ended with unterminated sequences or items".to_string(),
      );
    }

    Ok(self.location.pending_delimiter_tokens())
  }

  /// Checks whether there is a delimiter token that needs to be emitted, and
  /// if so then returns it.
  ///
  fn next_delimiter_token(&mut self) -> Vec<P10Token> {
    let bytes_read = self.stream.bytes_read();

    match self.location.next_delimiter_token(bytes_read) {
      Ok(token) => {
        // Update current path
        if matches!(token, P10Token::SequenceDelimiter { .. })
          || token == P10Token::SequenceItemDelimiter
        {
          self.path.pop().unwrap();
        }

        vec![token]
      }

      Err(()) => vec![],
    }
  }

  /// Reads the 128-byte File Preamble and the 4-byte `DICM` prefix
  /// following it. How absence of the `DICM` prefix is handled depends on
  /// the preamble policy and the strictness mode: it can fail the read,
  /// proceed with the fallback transfer syntax, or heuristically detect the
  /// transfer syntax from the first bytes of data.
  ///
  fn read_file_preamble_and_dicm_prefix_token(
    &mut self,
  ) -> Result<Vec<P10Token>, P10Error> {
    let preamble = match self.stream.peek(132) {
      Ok(data) => {
        if &data[128..132] == b"DICM" {
          self.stream.read(132).map_err(|error| {
            self.map_byte_stream_error(error, "Reading file header")
          })?;

          let mut preamble = [0u8; 128];
          preamble.copy_from_slice(&data[0..128]);

          Ok(Box::new(preamble))
        } else {
          self.handle_missing_dicm_prefix()?;

          Ok(Box::new([0u8; 128]))
        }
      }

      // If the end of the data is encountered when trying to read the first
      // 132 bytes then there is no File Preamble
      Err(ByteStreamError::DataEnd) => {
        self.handle_missing_dicm_prefix()?;

        Ok(Box::new([0; 128]))
      }

      Err(e) => Err(self.map_byte_stream_error(e, "Reading file header")),
    }?;

    // The next action after reading or skipping the File Preamble is to
    // read the File Meta Information
    self.next_action = NextAction::ReadFileMetaInformation {
      starts_at: self.stream.bytes_read(),
      ends_at: None,
      data_set: DataSet::new(),
    };

    Ok(vec![P10Token::FilePreambleAndDICMPrefix { preamble }])
  }

  /// Applies the preamble policy and strictness mode when the 'DICM' prefix
  /// is not present at offset 128. On success, reading proceeds from offset
  /// zero with no preamble.
  ///
  fn handle_missing_dicm_prefix(&mut self) -> Result<(), P10Error> {
    match self.config.preamble_policy {
      PreamblePolicy::Require => return Err(P10Error::DicmPrefixNotPresent),

      // Skip the first 132 bytes anyway when what follows them looks like a
      // data element and the start of the data doesn't
      PreamblePolicy::Ignore => match self.stream.peek(140) {
        Ok(data) => {
          if detect::detect_transfer_syntax(&data[0..8]).is_none()
            && detect::detect_transfer_syntax(&data[132..140]).is_some()
          {
            self.stream.read(132).map_err(|error| {
              self.map_byte_stream_error(error, "Reading file header")
            })?;
          }
        }

        // Data too small to hold a preamble followed by a data element is
        // decoded from the start
        Err(ByteStreamError::DataEnd) => (),

        Err(e) => {
          return Err(self.map_byte_stream_error(e, "Reading file header"));
        }
      },

      PreamblePolicy::Optional => (),
    }

    match self.config.strictness {
      DecodeStrictness::Strict => Err(P10Error::DicmPrefixNotPresent),

      // In lenient mode parsing proceeds using the fallback transfer syntax
      DecodeStrictness::Lenient => {
        self.report_issue(
          IssueKind::MalformedPreamble,
          IssueSeverity::Warning,
          None,
          "'DICM' prefix is not present, assuming headerless data".to_string(),
        );

        Ok(())
      }

      // In permissive mode the transfer syntax is detected from the first
      // bytes of data
      DecodeStrictness::Permissive => {
        self.report_issue(
          IssueKind::MalformedPreamble,
          IssueSeverity::Warning,
          None,
          "'DICM' prefix is not present, detecting transfer syntax"
            .to_string(),
        );

        if let Ok(data) = self.stream.peek(8) {
          if let Some(detected) = detect::detect_transfer_syntax(&data) {
            self.transfer_syntax = detected;
          }
        }

        Ok(())
      }
    }
  }

  /// Reads the File Meta Information into a data set and returns the
  /// relevant P10 token once complete. If there is a *'(0002,0000) File
  /// Meta Information Group Length'* data element present then it is used
  /// to specify where the File Meta Information ends. If it is not present
  /// then data elements are read until one with a group other than 0x0002
  /// is encountered.
  ///
  fn read_file_meta_information_token(
    &mut self,
  ) -> Result<Vec<P10Token>, P10Error> {
    let NextAction::ReadFileMetaInformation {
      starts_at,
      ends_at,
      data_set: fmi_data_set,
    } = &mut self.next_action
    else {
      unreachable!();
    };

    loop {
      // Check if the end of the File Meta Information has been reached
      if let Some(ends_at) = ends_at {
        if self.stream.bytes_read() >= *ends_at {
          break;
        }
      }

      // Peek the next 8 bytes that contain the group, element, VR, and two
      // bytes that contain the value length if the VR has a 16-bit length
      // field
      let data = match self.stream.peek(8) {
        Ok(data) => data,

        // The data ending here is valid when the extent of the File Meta
        // Information isn't specified by a group length
        Err(ByteStreamError::DataEnd) if ends_at.is_none() => break,

        Err(e) => {
          return Err(map_byte_stream_error(
            e,
            "Reading File Meta Information",
            &self.stream,
            &self.path,
          ));
        }
      };

      let group = byteorder::LittleEndian::read_u16(&data[0..2]);
      let element = byteorder::LittleEndian::read_u16(&data[2..4]);
      let tag = DataElementTag::new(group, element);

      // If the FMI length isn't known and the group isn't 0x0002 then
      // assume that this is the end of the File Meta Information
      if tag.group != 0x0002 && ends_at.is_none() {
        break;
      }

      // If a data element is encountered in the File Meta Information that
      // doesn't have a group of 0x0002 then the File Meta Information is
      // invalid
      if tag.group != 0x0002 && ends_at.is_some() {
        return Err(P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: "Data element in File Meta Information does not have the \
              group 0x0002"
            .to_string(),
          kind: IssueKind::General,
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      // Get the VR for the data element
      let vr = ValueRepresentation::from_bytes(&data[4..6]).map_err(|_| {
        P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: "Data element has invalid VR".to_string(),
          kind: IssueKind::InvalidTypeCode,
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        }
      })?;

      // Check the VR isn't a sequence as these aren't allowed in the File
      // Meta Information
      if vr == ValueRepresentation::Sequence {
        return Err(P10Error::DataInvalid {
          when: "Reading File Meta Information".to_string(),
          details: "Data element in File Meta Information is a sequence"
            .to_string(),
          kind: IssueKind::General,
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      // Read the value length based on whether the VR has a 16-bit or
      // 32-bit length stored
      let (value_offset, value_length) =
        match DataElementHeader::value_length_size(vr) {
          // 16-bit lengths are read out of the 8 bytes already read
          ValueLengthSize::U16 => Ok((
            8,
            usize::from(byteorder::LittleEndian::read_u16(&data[6..8])),
          )),

          // 32-bit lengths require another 4 bytes to be read
          ValueLengthSize::U32 => match self.stream.peek(12) {
            Ok(data) => {
              Ok((12, byteorder::LittleEndian::read_u32(&data[8..12]) as usize))
            }
            Err(e) => Err(map_byte_stream_error(
              e,
              "Reading File Meta Information",
              &self.stream,
              &self.path,
            )),
          },
        }?;

      let data_element_size = value_offset + value_length;

      // Check that the File Meta Information remains under the max token
      // size
      if fmi_data_set.total_byte_size() + data_element_size as u64
        > u64::from(self.config.max_token_size)
      {
        return Err(P10Error::MaximumExceeded {
          details: format!(
            "File Meta Information exceeds the max token size of {} bytes",
            self.config.max_token_size
          ),
          path: DataSetPath::new_with_data_element(tag),
          offset: self.stream.bytes_read(),
        });
      }

      // Read the value bytes for the data element
      let data = self.stream.read(data_element_size).map_err(|e| {
        map_byte_stream_error(
          e,
          "Reading File Meta Information data element value",
          &self.stream,
          &self.path,
        )
      })?;

      // Construct new data element value
      let value =
        DataElementValue::new_binary_unchecked(vr, data.drop(value_offset));

      // If this data element specifies the File Meta Information group's
      // length then use it to calculate its end offset
      if tag == dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag {
        if ends_at.is_none() && fmi_data_set.is_empty() {
          match value.get_int::<u32>() {
            Ok(i) => *ends_at = Some(*starts_at + 12 + u64::from(i)),
            Err(_) => {
              return Err(P10Error::DataInvalid {
                when: "Reading File Meta Information".to_string(),
                details: format!(
                  "Group length is invalid: {:?}",
                  value.to_string(80)
                ),
                kind: IssueKind::InvalidLength,
                path: DataSetPath::new_with_data_element(tag),
                offset: self.stream.bytes_read(),
              });
            }
          }
        }

        continue;
      }

      // If this data element specifies the transfer syntax to use then set
      // it in the read context
      if tag == dictionary::TRANSFER_SYNTAX_UID.tag {
        self.transfer_syntax = match value.get_string() {
          Ok(uid) => match TransferSyntax::from_uid(uid) {
            Ok(ts) => Ok(ts),

            // Unrecognized transfer syntaxes parse with default
            // assumptions: explicit VR little endian, not encapsulated
            Err(()) => {
              report_issue(
                &self.config,
                self.stream.bytes_read(),
                IssueKind::UnknownTransferSyntax,
                IssueSeverity::Warning,
                Some(tag),
                format!(
                  "Unrecognized transfer syntax {:?}, assuming explicit VR \
                    little endian",
                  uid
                ),
              );

              Ok(TransferSyntax::new_unrecognized())
            }
          },

          Err(e) => Err(P10Error::DataInvalid {
            when: "Reading File Meta Information".to_string(),
            details: e.to_string(),
            kind: IssueKind::General,
            path: DataSetPath::new_with_data_element(
              dictionary::TRANSFER_SYNTAX_UID.tag,
            ),
            offset: self.stream.bytes_read(),
          }),
        }?;
      }

      fmi_data_set.insert(tag, value);
    }

    // In strict mode a transfer syntax declaration is required
    if self.config.strictness == DecodeStrictness::Strict
      && !fmi_data_set.contains(dictionary::TRANSFER_SYNTAX_UID.tag)
    {
      return Err(P10Error::DataInvalid {
        when: "Reading File Meta Information".to_string(),
        details: "File Meta Information does not declare the transfer syntax"
          .to_string(),
        kind: IssueKind::MissingMetadata,
        path: DataSetPath::new(),
        offset: self.stream.bytes_read(),
      });
    }

    if fmi_data_set.is_empty() {
      report_issue(
        &self.config,
        self.stream.bytes_read(),
        IssueKind::MissingMetadata,
        IssueSeverity::Info,
        None,
        "No File Meta Information is present".to_string(),
      );
    }

    // If the transfer syntax is deflated then all data following the File
    // Meta Information needs to be passed through zlib inflate before
    // reading
    if self.transfer_syntax.is_deflated {
      match self.stream.start_zlib_inflate() {
        Ok(_) => (),
        Err(_) => {
          return Err(P10Error::DataInvalid {
            when: "Starting zlib decompression for deflated transfer syntax"
              .to_string(),
            details: "Zlib data is invalid".to_string(),
            kind: IssueKind::General,
            path: DataSetPath::new(),
            offset: self.stream.bytes_read(),
          });
        }
      }
    }

    // Set the final transfer syntax in the File Meta Information token
    if self.transfer_syntax != &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN {
      fmi_data_set
        .insert_string_value(
          &dictionary::TRANSFER_SYNTAX_UID,
          &[self.transfer_syntax.uid],
        )
        .unwrap();
    }

    let token = P10Token::FileMetaInformation {
      data_set: core::mem::take(fmi_data_set),
    };

    self.next_action = NextAction::ReadDataElementHeader;

    Ok(vec![token])
  }

  fn read_data_element_header_token(
    &mut self,
  ) -> Result<(Vec<P10Token>, DataElementTag), P10Error> {
    // Read a data element header if bytes for one are available
    let header = self.read_data_element_header()?;

    // If the VR is UN (Unknown) then attempt to infer it
    let vr = match header.vr {
      Some(ValueRepresentation::Unknown) => {
        Some(self.location.infer_vr_for_tag(header.tag).map_err(
          |missing_tag| P10Error::DataInvalid {
            when: format!(
              "Inferring VR for data element '{}'",
              dictionary::tag_with_name(header.tag, None)
            ),
            details: format!(
              "The value for the '{}' data element is missing or invalid",
              dictionary::tag_with_name(missing_tag, None)
            ),
            kind: IssueKind::General,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          },
        )?)
      }
      vr => vr,
    };

    // Private data elements without a private creator reservation are
    // reported as orphans, but never fail the read
    if let Some(issue) = self
      .location
      .check_private_creator_exists(header.tag, self.stream.bytes_read())
    {
      if let Some(issue_callback) = &self.config.issue_callback {
        issue_callback(&issue);
      }
    }

    match (header.tag, vr, header.length) {
      // If this is the start of a new sequence then add it to the location
      (tag, Some(ValueRepresentation::Sequence), _)
      | (tag, Some(ValueRepresentation::Unknown), ValueLength::Undefined) => {
        self.check_data_element_ordering(&header)?;

        let ends_at = match header.length {
          ValueLength::Defined { length } => {
            Some(self.stream.bytes_read() + u64::from(length))
          }
          ValueLength::Undefined => None,
        };

        // When the original VR was unknown and the length is undefined, as
        // per DICOM Correction Proposal CP-246 the 'Implicit VR Little
        // Endian' transfer syntax must be used to read the sequence's data.
        let is_implicit_vr = header.vr == Some(ValueRepresentation::Unknown);

        self
          .location
          .add_sequence(tag, is_implicit_vr, ends_at)
          .map_err(|details| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details,
            kind: IssueKind::General,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          })?;

        // Check that the maximum sequence depth hasn't been reached
        if self.location.sequence_depth() > self.config.max_sequence_depth {
          return Err(P10Error::MaximumExceeded {
            details: "Maximum allowed sequence depth reached".to_string(),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        // Add sequence to the path
        self.path.add_data_element(tag).unwrap();

        Ok((
          vec![P10Token::SequenceStart {
            tag,
            vr: ValueRepresentation::Sequence,
            path: self.path.clone(),
          }],
          header.tag,
        ))
      }

      // If this is the start of a new sequence item then add it to the
      // location
      (tag, None, _) if tag == dictionary::ITEM.tag => {
        let ends_at = match header.length {
          ValueLength::Defined { length } => {
            Some(self.stream.bytes_read() + u64::from(length))
          }
          ValueLength::Undefined => None,
        };

        let index = self.location.add_item(ends_at, header.length).map_err(
          |details| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details,
            kind: IssueKind::General,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          },
        )?;

        // Add item to the path
        self.path.add_sequence_item(index).unwrap();

        Ok((vec![P10Token::SequenceItemStart { index }], header.tag))
      }

      // If this is a pixel data element with undefined length then how it's
      // read depends on whether the transfer syntax is encapsulated
      (tag, Some(vr), ValueLength::Undefined)
        if tag == dictionary::PIXEL_DATA.tag
          && (vr == ValueRepresentation::OtherByteString
            || vr == ValueRepresentation::OtherWordString) =>
      {
        self.check_data_element_ordering(&header)?;

        if self.transfer_syntax.is_encapsulated {
          self
            .location
            .add_sequence(tag, false, None)
            .map_err(|details| P10Error::DataInvalid {
              when: "Reading data element header".to_string(),
              details,
              kind: IssueKind::General,
              path: self.path.clone(),
              offset: self.stream.bytes_read(),
            })?;

          self.path.add_data_element(tag).unwrap();

          self.next_action = NextAction::ReadPixelDataItem { vr };

          Ok((
            vec![P10Token::SequenceStart {
              tag,
              vr,
              path: self.path.clone(),
            }],
            header.tag,
          ))
        } else {
          // Pixel data in an unencapsulated transfer syntax must have a
          // defined length. In lenient and permissive modes the data is
          // recovered by scanning for a sequence delimitation item, with
          // the end of the data acting as a delimiter if none is found.
          if self.config.strictness == DecodeStrictness::Strict {
            return Err(P10Error::DataInvalid {
              when: "Reading data element header".to_string(),
              details: "Pixel data in an unencapsulated transfer syntax has \
                an undefined length"
                .to_string(),
              kind: IssueKind::InvalidLength,
              path: self.path.clone(),
              offset: self.stream.bytes_read(),
            });
          }

          self.report_issue(
            IssueKind::InvalidLength,
            IssueSeverity::Warning,
            Some(tag),
            "Pixel data in an unencapsulated transfer syntax has an \
              undefined length, scanning for a delimiter"
              .to_string(),
          );

          self.next_action = NextAction::ReadUnencapsulatedPixelData {
            tag,
            vr,
            search_offset: 0,
          };

          Ok((vec![], header.tag))
        }
      }

      // If this is a sequence delimitation item then remove the current
      // sequence from the current location
      (tag, None, ValueLength::ZERO)
        if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag =>
      {
        let tokens = if let Ok(tag) = self.location.end_sequence() {
          self.path.pop().unwrap();

          vec![P10Token::SequenceDelimiter { tag }]
        } else {
          // A sequence delimiter outside of a sequence is swallowed with a
          // warning rather than failing the stream, as such rogue
          // delimiters have been observed in real-world data
          self.report_issue(
            IssueKind::UnexpectedDelimiter,
            IssueSeverity::Warning,
            Some(tag),
            "Sequence delimiter encountered outside of a sequence"
              .to_string(),
          );

          vec![]
        };

        Ok((tokens, header.tag))
      }

      // If this is an item delimitation item then remove the latest item
      // from the location
      (tag, None, ValueLength::ZERO)
        if tag == dictionary::ITEM_DELIMITATION_ITEM.tag =>
      {
        self
          .location
          .end_item()
          .map_err(|details| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details,
            kind: IssueKind::UnexpectedDelimiter,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          })?;

        self.path.pop().unwrap();

        Ok((vec![P10Token::SequenceItemDelimiter], header.tag))
      }

      // For all other cases this is a standard data element that needs to
      // have its value bytes read
      (tag, Some(vr), ValueLength::Defined { length }) => {
        self.check_data_element_ordering(&header)?;

        // Odd value lengths are non-conformant. In lenient mode the value
        // is padded to even length after reading; in permissive mode it is
        // preserved exactly.
        let pad_to_even = if length % 2 == 1 {
          match self.config.strictness {
            DecodeStrictness::Strict => {
              return Err(P10Error::DataInvalid {
                when: "Reading data element header".to_string(),
                details: format!(
                  "Data element '{}' has odd length {}",
                  header, length
                ),
                kind: IssueKind::OddLength,
                path: self.path.clone(),
                offset: self.stream.bytes_read(),
              });
            }

            DecodeStrictness::Lenient => {
              self.report_issue(
                IssueKind::OddLength,
                IssueSeverity::Warning,
                Some(tag),
                format!("Data element has odd length {}, padding", length),
              );

              true
            }

            DecodeStrictness::Permissive => {
              self.report_issue(
                IssueKind::OddLength,
                IssueSeverity::Warning,
                Some(tag),
                format!("Data element has odd length {}", length),
              );

              false
            }
          }
        } else {
          false
        };

        let materialized_value_required =
          self.is_materialized_value_required(tag, vr);

        // If this data element needs to be fully materialized then check it
        // doesn't exceed the max string size
        if materialized_value_required && length > self.config.max_string_size {
          return Err(P10Error::MaximumExceeded {
            details: format!(
              "Value for '{}' with VR {} and length {} bytes exceeds the \
              maximum allowed string size of {} bytes",
              dictionary::tag_with_name(tag, None),
              vr,
              length,
              self.config.max_string_size
            ),
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }

        // Add data element to the path
        self
          .path
          .add_data_element(tag)
          .map_err(|_| P10Error::DataInvalid {
            when: "Reading data element header".to_string(),
            details: format!(
              "Data element '{}' is not valid for the current path",
              header
            ),
            kind: IssueKind::General,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          })?;

        // Apply the configured handling for large values. This can direct
        // the value to be lazily loaded or skipped instead of read into
        // memory.
        if !materialized_value_required
          && length >= self.config.large_value_threshold
        {
          if let Some(tokens) = self.start_large_value(tag, vr, length)? {
            return Ok((tokens, tag));
          }
        }

        // Swallow the '(FFFC,FFFC) Data Set Trailing Padding' data element.
        // No tokens for it are emitted. Ref: PS3.10 7.2.
        //
        // Also swallow group length tags that have an element of 0x0000.
        // Ref: PS3.5 7.2.
        let emit_tokens = tag != dictionary::DATA_SET_TRAILING_PADDING.tag
          && tag.element != 0x0000;

        // If the whole value is being materialized then the
        // DataElementHeader token is only emitted once all the data is
        // available. This is necessary because in the case of string values
        // that are being converted to UTF-8 the length of the final string
        // value following UTF-8 conversion is not yet known.
        let tokens = if emit_tokens && !materialized_value_required {
          vec![P10Token::DataElementHeader {
            tag,
            vr,
            raw_vr: header.raw_vr,
            length: if pad_to_even { length + 1 } else { length },
            path: self.path.clone(),
          }]
        } else {
          vec![]
        };

        self.next_action = NextAction::ReadDataElementValueBytes {
          tag,
          vr,
          raw_vr: header.raw_vr,
          length,
          bytes_remaining: length,
          emit_tokens,
          pad_to_even,
        };

        Ok((tokens, tag))
      }

      (_, _, _) => Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!("Invalid data element '{}'", header),
        kind: IssueKind::InvalidLength,
        path: self.path.clone(),
        offset: self.stream.bytes_read(),
      }),
    }
  }

  /// Applies the configured large value handling to a data element whose
  /// length meets the large value threshold. Returns the tokens to emit
  /// when the value will not be read into memory, or `None` when it should
  /// be read normally.
  ///
  fn start_large_value(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: u32,
  ) -> Result<Option<Vec<P10Token>>, P10Error> {
    let offset = self.stream.bytes_read();

    let decision = match &self.config.large_value_handling {
      LargeValueHandling::LoadInMemory => LargeValueDecision::LoadInMemory,
      LargeValueHandling::LazyLoad => LargeValueDecision::LazyLoad,
      LargeValueHandling::Skip => LargeValueDecision::Skip,
      LargeValueHandling::Callback(callback) => callback(&LargeValueInfo {
        tag,
        vr,
        length,
        offset,
      }),
    };

    match decision {
      LargeValueDecision::LoadInMemory => Ok(None),

      LargeValueDecision::LazyLoad => {
        // Lazy loading needs a seekable data source whose offsets match the
        // stream's byte counter, which isn't the case when the stream is
        // being inflated from a deflated transfer syntax
        if self.transfer_syntax.is_deflated {
          return Err(P10Error::LazyLoadUnsupported {
            when: "Reading large data element value".to_string(),
            offset,
          });
        }

        let source = self.lazy_data_source.clone().ok_or(
          P10Error::LazyLoadUnsupported {
            when: "Reading large data element value".to_string(),
            offset,
          },
        )?;

        let token = P10Token::DataElementLazy {
          tag,
          vr,
          handle: LazyValueHandle {
            source,
            offset,
            length: u64::from(length),
          },
          path: self.path.clone(),
        };

        // The value bytes are consumed from the stream without emitting
        // tokens for them
        self.next_action = NextAction::ReadDataElementValueBytes {
          tag,
          vr,
          raw_vr: None,
          length,
          bytes_remaining: length,
          emit_tokens: false,
          pad_to_even: false,
        };

        Ok(Some(vec![token]))
      }

      LargeValueDecision::Skip => {
        self.next_action = NextAction::ReadDataElementValueBytes {
          tag,
          vr,
          raw_vr: None,
          length,
          bytes_remaining: length,
          emit_tokens: false,
          pad_to_even: false,
        };

        Ok(Some(vec![]))
      }
    }
  }

  /// Reads a data element header. Depending on the transfer syntax and the
  /// specific VR (for explicit VR transfer syntaxes), this reads either 8
  /// or 12 bytes in total.
  ///
  fn read_data_element_header(
    &mut self,
  ) -> Result<DataElementHeader, P10Error> {
    let transfer_syntax = self.active_transfer_syntax();

    // Peek the 4 bytes containing the tag
    let tag = match self.stream.peek(4) {
      Ok(data) => {
        let (group, element) = match transfer_syntax.endianness {
          transfer_syntax::Endianness::LittleEndian => (
            byteorder::LittleEndian::read_u16(&data[0..2]),
            byteorder::LittleEndian::read_u16(&data[2..4]),
          ),

          transfer_syntax::Endianness::BigEndian => (
            byteorder::BigEndian::read_u16(&data[0..2]),
            byteorder::BigEndian::read_u16(&data[2..4]),
          ),
        };

        Ok(DataElementTag::new(group, element))
      }

      Err(e) => {
        Err(self.map_byte_stream_error(e, "Reading data element header"))
      }
    }?;

    // The item and delimitation tags always use implicit VRs
    let vr_serialization = if tag == dictionary::ITEM.tag
      || tag == dictionary::ITEM_DELIMITATION_ITEM.tag
      || tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag
    {
      transfer_syntax::VrSerialization::VrImplicit
    } else {
      transfer_syntax.vr_serialization
    };

    // File Meta Information data elements aren't allowed in the root of the
    // main data set. They are allowed in sequence items only because this
    // has been observed in the wild, however it is not valid according to
    // the spec.
    if tag.group == 0x0002
      && self.path.is_root()
      && !matches!(self.next_action, NextAction::ReadFileMetaInformation { .. })
    {
      return Err(P10Error::DataInvalid {
        when: "Reading data element header".to_string(),
        details: format!(
          "File Meta Information data element '{}' found in the main data set",
          tag
        ),
        kind: IssueKind::General,
        path: DataSetPath::new_with_data_element(tag),
        offset: self.stream.bytes_read(),
      });
    }

    match vr_serialization {
      transfer_syntax::VrSerialization::VrExplicit => {
        self.read_explicit_vr_and_length(tag)
      }
      transfer_syntax::VrSerialization::VrImplicit => {
        self.read_implicit_vr_and_length(tag)
      }
    }
  }

  /// Checks that the specified data element tag is greater than the
  /// previous one at the current P10 location.
  ///
  fn check_data_element_ordering(
    &mut self,
    header: &DataElementHeader,
  ) -> Result<(), P10Error> {
    if self.location.check_data_element_ordering(header.tag).is_ok() {
      return Ok(());
    }

    if !self.config.require_ordered_data_elements {
      self.report_issue(
        IssueKind::ElementOutOfOrder,
        IssueSeverity::Warning,
        Some(header.tag),
        format!("Data element '{}' is not in ascending order", header),
      );

      return Ok(());
    }

    Err(P10Error::DataInvalid {
      when: "Reading data element header".to_string(),
      details: format!("Data element '{}' is not in ascending order", header),
      kind: IssueKind::ElementOutOfOrder,
      path: self.path.clone(),
      offset: self.stream.bytes_read(),
    })
  }

  /// Returns the transfer syntax that should be used to decode the current
  /// data. This will always be the transfer syntax specified in the File
  /// Meta Information, except in the case of 'Implicit VR Little Endian'
  /// being forced by an explicit VR of `UN` (Unknown) that has an undefined
  /// length.
  ///
  /// Ref: DICOM Correction Proposal CP-246.
  ///
  fn active_transfer_syntax(&self) -> &'static TransferSyntax {
    if self.location.is_implicit_vr_forced() {
      &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN
    } else {
      self.transfer_syntax
    }
  }

  /// Reads the (implicit) VR and value length following a data element tag
  /// when the transfer syntax is 'Implicit VR Little Endian'.
  ///
  fn read_implicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
  ) -> Result<DataElementHeader, P10Error> {
    match self.stream.read(8) {
      Ok(data) => {
        let value_length = match self.active_transfer_syntax().endianness {
          transfer_syntax::Endianness::LittleEndian => {
            byteorder::LittleEndian::read_u32(&data[4..8])
          }
          transfer_syntax::Endianness::BigEndian => {
            byteorder::BigEndian::read_u32(&data[4..8])
          }
        };

        // Return the VR as `None` for those tags that don't support one.
        // All other tags are returned as UN (Unknown) and will have their
        // VR inferred in due course.
        let vr = if tag == dictionary::ITEM.tag
          || tag == dictionary::ITEM_DELIMITATION_ITEM.tag
          || tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag
        {
          None
        } else {
          Some(ValueRepresentation::Unknown)
        };

        let header = DataElementHeader {
          tag,
          vr,
          raw_vr: None,
          length: ValueLength::new(value_length),
        };

        Ok(header)
      }

      Err(e) => {
        Err(self.map_byte_stream_error(e, "Reading data element header"))
      }
    }
  }

  /// Reads the explicit VR and value length following a data element tag
  /// when the transfer syntax is not 'Implicit VR Little Endian'.
  ///
  fn read_explicit_vr_and_length(
    &mut self,
    tag: DataElementTag,
  ) -> Result<DataElementHeader, P10Error> {
    // Peek and validate the explicit VR
    let (vr, raw_vr) = match self.stream.peek(6) {
      Ok(data) => {
        let vr_bytes = &data[4..6];

        match ValueRepresentation::from_bytes(vr_bytes) {
          Ok(vr) => Ok((vr, None)),

          // If the VR is two spaces or two NULL characters then treat it as
          // UN, and there will be an attempt to infer it in due course.
          // This is not part of the DICOM P10 spec, but such data has been
          // observed in the wild.
          _ => match vr_bytes {
            [0x00, 0x00] | [0x20, 0x20] => {
              Ok((ValueRepresentation::Unknown, None))
            }

            _ => match self.config.strictness {
              DecodeStrictness::Strict => Err(P10Error::DataInvalid {
                when: "Reading data element VR".to_string(),
                details: format!(
                  "Unrecognized VR {:?} for tag '{}'",
                  vr_bytes,
                  dictionary::tag_with_name(tag, None)
                ),
                kind: IssueKind::InvalidTypeCode,
                path: self.path.clone(),
                offset: self.stream.bytes_read(),
              }),

              // In lenient mode the VR becomes UN. In permissive mode the
              // original bytes are preserved alongside, marking the
              // element as ill-typed.
              DecodeStrictness::Lenient | DecodeStrictness::Permissive => {
                self.report_issue(
                  IssueKind::InvalidTypeCode,
                  IssueSeverity::Warning,
                  Some(tag),
                  format!("Unrecognized VR {:?}", vr_bytes),
                );

                let raw_vr =
                  if self.config.strictness == DecodeStrictness::Permissive {
                    Some([vr_bytes[0], vr_bytes[1]])
                  } else {
                    None
                  };

                Ok((ValueRepresentation::Unknown, raw_vr))
              }
            },
          },
        }
      }

      Err(e) => Err(
        self
          .map_byte_stream_error(e, "Reading explicit VR data element header"),
      ),
    }?;

    // An unrecognized VR has an unknowable length field size, so a 16-bit
    // length is assumed as that is the more common case
    let header_size = if raw_vr.is_some() {
      8
    } else {
      match DataElementHeader::value_length_size(vr) {
        ValueLengthSize::U32 => 12,
        ValueLengthSize::U16 => 8,
      }
    };

    // Read the full header, including the tag, VR, and value length
    match self.stream.read(header_size) {
      Ok(data) => {
        // Parse value length
        let length = match header_size {
          12 => match self.active_transfer_syntax().endianness {
            transfer_syntax::Endianness::LittleEndian => {
              byteorder::LittleEndian::read_u32(&data[8..12])
            }
            transfer_syntax::Endianness::BigEndian => {
              byteorder::BigEndian::read_u32(&data[8..12])
            }
          },
          _ => match self.active_transfer_syntax().endianness {
            transfer_syntax::Endianness::LittleEndian => {
              byteorder::LittleEndian::read_u16(&data[6..8]).into()
            }
            transfer_syntax::Endianness::BigEndian => {
              byteorder::BigEndian::read_u16(&data[6..8]).into()
            }
          },
        };

        let header = DataElementHeader {
          tag,
          vr: Some(vr),
          raw_vr,
          length: ValueLength::new(length),
        };

        Ok(header)
      }

      Err(e) => Err(
        self
          .map_byte_stream_error(e, "Reading explicit VR data element header"),
      ),
    }
  }

  fn read_data_element_value_bytes_token(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    raw_vr: Option<[u8; 2]>,
    value_length: u32,
    bytes_remaining: u32,
    emit_tokens: bool,
    pad_to_even: bool,
  ) -> Result<Vec<P10Token>, P10Error> {
    let materialized_value_required =
      self.is_materialized_value_required(tag, vr);

    // If this data element value is being fully materialized then it needs
    // to be read as a whole, so use its full length as the number of bytes
    // to read. Otherwise, read up to the max token size.
    let bytes_to_read = if materialized_value_required {
      value_length
    } else {
      core::cmp::min(bytes_remaining, self.config.max_token_size)
    };

    let data = match self.stream.read(bytes_to_read as usize) {
      Ok(data) => data,

      // A declared length that runs past the end of the data is fatal in
      // strict mode. Otherwise the bytes that are present become the value
      // and it is marked truncated via the issue callback.
      Err(ByteStreamError::DataEnd)
        if self.config.strictness != DecodeStrictness::Strict =>
      {
        self.report_issue(
          IssueKind::TruncatedValue,
          IssueSeverity::Warning,
          Some(tag),
          format!(
            "Value for '{}' is truncated: {} of {} bytes are missing",
            dictionary::tag_with_name(tag, None),
            bytes_remaining,
            value_length,
          ),
        );

        let data = self
          .stream
          .read_up_to(bytes_to_read as usize)
          .map_err(|e| {
            self.map_byte_stream_error(e, "Reading data element value bytes")
          })?;

        return self.complete_truncated_value(tag, vr, raw_vr, data, emit_tokens);
      }

      Err(e) => {
        let when = format!(
          "Reading {} data element value bytes, VR: {}",
          bytes_to_read, vr
        );

        return Err(self.map_byte_stream_error(e, &when));
      }
    };

    // Data element values are always returned in little endian, so if this
    // is a big endian transfer syntax then convert to little endian
    let mut data = data;
    if self.active_transfer_syntax().endianness.is_big() {
      let mut raw_data = data.into_vec();
      self.location.swap_endianness(tag, vr, &mut raw_data);
      data = raw_data.into();
    }

    let bytes_remaining = bytes_remaining - bytes_to_read;

    // Odd-length values are padded to even length in lenient mode once the
    // final bytes have been read
    if bytes_remaining == 0 && pad_to_even {
      let mut raw_data = data.into_vec();
      raw_data.push(vr.padding_byte());
      data = raw_data.into();
    }

    let data = if materialized_value_required {
      self.process_materialized_data_element(tag, vr, data)?
    } else {
      data
    };

    let mut tokens = Vec::with_capacity(2);

    if emit_tokens {
      // If this is a materialized value then the data element header for it
      // is emitted now. It was not emitted when it was read due to the
      // possibility of the value and value length being altered above.
      if materialized_value_required {
        let max_length = DataElementHeader::value_length_size(vr).max_length();

        if data.len() <= max_length {
          tokens.push(P10Token::DataElementHeader {
            tag,
            vr,
            raw_vr,
            length: data.len() as u32,
            path: self.path.clone(),
          });
        } else {
          return Err(P10Error::DataInvalid {
            when: "Reading data element value bytes".to_string(),
            details: format!(
              "Length of {} bytes exceeds the maximum of {} bytes after \
                conversion to UTF-8",
              data.len(),
              max_length
            ),
            kind: IssueKind::InvalidLength,
            path: self.path.clone(),
            offset: self.stream.bytes_read(),
          });
        }
      }

      tokens.push(P10Token::DataElementValueBytes {
        tag,
        vr,
        data,
        bytes_remaining,
      });
    }

    let next_action = if bytes_remaining == 0 {
      // This data element is complete, so the next action is either to read
      // the next pixel data item if currently reading pixel data items, or
      // to read the header for the next data element
      if tag == dictionary::ITEM.tag {
        NextAction::ReadPixelDataItem { vr }
      } else {
        NextAction::ReadDataElementHeader
      }
    } else {
      // Continue reading value bytes for this data element
      NextAction::ReadDataElementValueBytes {
        tag,
        vr,
        raw_vr,
        length: value_length,
        bytes_remaining,
        emit_tokens,
        pad_to_even,
      }
    };

    if bytes_remaining == 0 {
      self.path.pop().unwrap();
    }

    self.next_action = next_action;

    Ok(tokens)
  }

  /// Finishes a data element whose value ran past the end of the input
  /// data. The recovered bytes become the whole value.
  ///
  fn complete_truncated_value(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    raw_vr: Option<[u8; 2]>,
    data: RcByteSlice,
    emit_tokens: bool,
  ) -> Result<Vec<P10Token>, P10Error> {
    let mut tokens = Vec::with_capacity(2);

    if emit_tokens {
      tokens.push(P10Token::DataElementHeader {
        tag,
        vr,
        raw_vr,
        length: data.len() as u32,
        path: self.path.clone(),
      });

      tokens.push(P10Token::DataElementValueBytes {
        tag,
        vr,
        data,
        bytes_remaining: 0,
      });
    }

    let _ = self.path.pop();

    self.next_action = NextAction::ReadDataElementHeader;

    Ok(tokens)
  }

  /// Reads the value of a pixel data element that declared an undefined
  /// length in an unencapsulated transfer syntax. The value is taken to
  /// extend to the next sequence delimitation item, or to the end of the
  /// data when there isn't one.
  ///
  fn read_unencapsulated_pixel_data_token(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    search_offset: usize,
  ) -> Result<Vec<P10Token>, P10Error> {
    let found = self
      .stream
      .find(&SEQUENCE_DELIMITER_PATTERN, search_offset)
      .map_err(|e| {
        self.map_byte_stream_error(e, "Scanning for sequence delimiter")
      })?;

    let (value_length, trailing_bytes) = match found {
      Some(position) => (position, SEQUENCE_DELIMITER_PATTERN.len()),

      None => {
        if !self.stream.is_writing_finished() {
          // Remember how far the scan has progressed so the data already
          // searched isn't searched again. The scan resumes a few bytes
          // back in case the pattern straddles the boundary.
          let bytes_available = self.stream.bytes_available() as usize;
          let search_offset = bytes_available
            .saturating_sub(SEQUENCE_DELIMITER_PATTERN.len() - 1);

          self.next_action = NextAction::ReadUnencapsulatedPixelData {
            tag,
            vr,
            search_offset,
          };

          return Err(P10Error::DataRequired {
            when: "Scanning for sequence delimiter".to_string(),
          });
        }

        // The end of the data acts as the delimiter
        (self.stream.bytes_available() as usize, 0)
      }
    };

    let data = self.stream.read(value_length).map_err(|e| {
      self.map_byte_stream_error(e, "Reading pixel data value bytes")
    })?;

    if trailing_bytes > 0 {
      self.stream.read(trailing_bytes).map_err(|e| {
        self.map_byte_stream_error(e, "Reading sequence delimiter")
      })?;
    }

    self.next_action = NextAction::ReadDataElementHeader;

    Ok(vec![
      P10Token::DataElementHeader {
        tag,
        vr,
        raw_vr: None,
        length: data.len() as u32,
        path: self.path.clone(),
      },
      P10Token::DataElementValueBytes {
        tag,
        vr,
        data,
        bytes_remaining: 0,
      },
    ])
  }

  fn is_materialized_value_required(
    &self,
    tag: DataElementTag,
    vr: ValueRepresentation,
  ) -> bool {
    // If this is a clarifying data element then its data needs to be
    // materialized
    if p10_location::is_clarifying_data_element(tag) {
      return true;
    }

    // If the value is an encoded string, and it isn't UTF-8 compatible data
    // that can be passed straight through, then materialize it so that it
    // can be converted to UTF-8.
    if vr.is_encoded_string() {
      return !self.location.is_specific_character_set_utf8_compatible();
    }

    // Convert strings that are defined to use ISO-646/US-ASCII. In theory
    // this shouldn't be necessary as they should already be valid UTF-8,
    // but DICOM P10 data has been observed that contains invalid ISO-646
    // data, hence these string values are sanitized by replacing invalid
    // characters with a question mark.
    if vr.is_string() {
      return true;
    }

    false
  }

  fn process_materialized_data_element(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    mut value_bytes: RcByteSlice,
  ) -> Result<RcByteSlice, P10Error> {
    // Decode string values using the relevant character set. Private
    // Creator values must only contain characters from the default
    // character repertoire and so are sanitized against that character set.
    // Ref: PS3.5 7.8.1.
    if vr.is_string() {
      if vr.is_encoded_string() && !tag.is_private_creator() {
        value_bytes =
          self.location.decode_string_bytes(vr, &value_bytes).into();
      } else {
        let mut data = value_bytes.into_vec();
        dcmflow_character_set::sanitize_default_charset_bytes(&mut data);
        value_bytes = data.into();
      }
    }

    // Update the P10 location with the materialized value, this will only
    // do something when this is a clarifying data element
    match self
      .location
      .add_clarifying_data_element(tag, vr, &mut value_bytes)
    {
      Ok(()) => Ok(value_bytes),

      // An unknown specific character set falls back to UTF-8 outside of
      // strict mode
      Err(e @ P10Error::SpecificCharacterSetInvalid { .. }) => {
        if self.config.strictness == DecodeStrictness::Strict {
          return Err(e);
        }

        self.report_issue(
          IssueKind::UnknownCharacterSet,
          IssueSeverity::Warning,
          Some(tag),
          format!("{}, falling back to UTF-8", e.name()),
        );

        self.location.force_specific_character_set_utf8();

        Ok(b"ISO_IR 192".to_vec().into())
      }

      Err(e) => Err(e),
    }
  }

  fn read_pixel_data_item_token(
    &mut self,
    vr: ValueRepresentation,
  ) -> Result<Vec<P10Token>, P10Error> {
    match self.read_data_element_header() {
      Ok(header) => match header {
        // Pixel data items must have no VR and a defined length
        DataElementHeader {
          tag,
          vr: None,
          length: ValueLength::Defined { length },
          ..
        } if tag == dictionary::ITEM.tag => {
          self.next_action = NextAction::ReadDataElementValueBytes {
            tag: dictionary::ITEM.tag,
            vr,
            raw_vr: None,
            length,
            bytes_remaining: length,
            emit_tokens: true,
            pad_to_even: false,
          };

          // Add item to the path
          let index = self.location.add_pixel_data_item().unwrap_or(0);
          self.path.add_sequence_item(index).unwrap();

          let token = P10Token::PixelDataItem { index, length };

          Ok(vec![token])
        }

        DataElementHeader {
          tag,
          vr: None,
          length: ValueLength::ZERO,
          ..
        } if tag == dictionary::SEQUENCE_DELIMITATION_ITEM.tag => {
          let token = P10Token::SequenceDelimiter {
            tag: dictionary::PIXEL_DATA.tag,
          };

          self.location.end_sequence().map_err(|details| {
            P10Error::DataInvalid {
              when: "Reading encapsulated pixel data item".to_string(),
              details,
              kind: IssueKind::UnexpectedDelimiter,
              path: self.path.clone(),
              offset: self.stream.bytes_read(),
            }
          })?;

          self.path.pop().unwrap();

          self.next_action = NextAction::ReadDataElementHeader;

          Ok(vec![token])
        }

        _ => Err(P10Error::DataInvalid {
          when: "Reading encapsulated pixel data item".to_string(),
          details: format!("Invalid data element '{}'", header),
          kind: IssueKind::General,
          path: self.path.clone(),
          offset: self.stream.bytes_read(),
        }),
      },

      Err(e) => Err(e),
    }
  }

  /// Reports a non-fatal issue through the issue callback, if one is set in
  /// the read config.
  ///
  fn report_issue(
    &self,
    kind: IssueKind,
    severity: IssueSeverity,
    tag: Option<DataElementTag>,
    message: String,
  ) {
    report_issue(
      &self.config,
      self.stream.bytes_read(),
      kind,
      severity,
      tag,
      message,
    );
  }

  /// Takes an error from the byte stream and maps it through to a P10
  /// error.
  ///
  fn map_byte_stream_error(
    &self,
    error: ByteStreamError,
    when: &str,
  ) -> P10Error {
    map_byte_stream_error(error, when, &self.stream, &self.path)
  }
}

/// Reports a non-fatal issue through the issue callback, if one is set in
/// the read config.
///
fn report_issue(
  config: &P10ReadConfig,
  offset: u64,
  kind: IssueKind,
  severity: IssueSeverity,
  tag: Option<DataElementTag>,
  message: String,
) {
  if let Some(issue_callback) = &config.issue_callback {
    issue_callback(&P10Issue {
      kind,
      severity,
      tag,
      offset,
      message,
    });
  }
}

/// Takes an error from the byte stream and maps it through to a P10 error.
///
fn map_byte_stream_error(
  error: ByteStreamError,
  when: &str,
  stream: &ByteStream,
  path: &DataSetPath,
) -> P10Error {
  let offset = stream.bytes_read();

  match error {
    ByteStreamError::DataRequired => P10Error::DataRequired {
      when: when.to_string(),
    },

    ByteStreamError::DataEnd => P10Error::DataEndedUnexpectedly {
      when: when.to_string(),
      path: path.clone(),
      offset,
    },

    ByteStreamError::ZlibDataError => P10Error::DataInvalid {
      when: when.to_string(),
      details: "Zlib data is invalid".to_string(),
      kind: IssueKind::DecodeError,
      path: path.clone(),
      offset,
    },

    ByteStreamError::WriteAfterCompletion => P10Error::WriteAfterCompletion,
  }
}

impl Default for P10ReadContext {
  fn default() -> Self {
    Self::new(None)
  }
}
