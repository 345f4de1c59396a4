//! Converts DICOM P10 tokens into binary DICOM P10 data.
//!
//! Tokens are written to a write context with
//! [`P10WriteContext::write_token`], and the binary DICOM P10 data that
//! results is read out with [`P10WriteContext::read_bytes`]. The token
//! stream most commonly comes either from a read context, or from a data set
//! via [`crate::p10_token::data_elements_to_tokens`].

#[cfg(not(feature = "std"))]
use alloc::{
  boxed::Box,
  format,
  string::ToString,
  vec,
  vec::Vec,
};

use dcmflow_core::{
  DataElementTag, DataElementValue, DataSet, DataSetPath, RcByteSlice,
  ValueRepresentation, dictionary, transfer_syntax,
  transfer_syntax::TransferSyntax,
};

use crate::internal::byte_sink::ByteSink;
use crate::internal::data_element_header::{
  DataElementHeader, ValueLengthSize,
};
use crate::p10_error::IssueKind;
use crate::p10_write_config::SequenceFraming;
use crate::{P10Error, P10Token, P10WriteConfig};

/// A write context holds the current state of an in-progress DICOM P10
/// write. DICOM P10 tokens are written to a write context with
/// [`Self::write_token`], and the resulting binary DICOM P10 data is read
/// out with [`Self::read_bytes`].
///
#[derive(Debug)]
pub struct P10WriteContext {
  config: P10WriteConfig,
  transfer_syntax: &'static TransferSyntax,
  sink: ByteSink,
  chunks: Vec<RcByteSlice>,
  open_scopes: Vec<LengthScope>,
  pending_value_padding: Option<u8>,
  zlib_stream: Option<flate2::Compress>,
  is_ended: bool,
}

/// An open sequence or item scope. Defined-length scopes have their length
/// field patched once their content has been written; delimited scopes are
/// terminated with a delimitation item.
///
#[derive(Debug)]
enum LengthScope {
  Defined { length_field_offset: usize },
  Delimited,
}

impl P10WriteContext {
  /// Creates a new write context for writing DICOM P10 data.
  ///
  pub fn new(config: Option<P10WriteConfig>) -> P10WriteContext {
    P10WriteContext {
      config: config.unwrap_or_default(),
      transfer_syntax: &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN,
      sink: ByteSink::new(),
      chunks: vec![],
      open_scopes: vec![],
      pending_value_padding: None,
      zlib_stream: None,
      is_ended: false,
    }
  }

  /// Returns the transfer syntax the write context is serializing with.
  /// This is set by the File Meta Information token.
  ///
  pub fn transfer_syntax(&self) -> &TransferSyntax {
    self.transfer_syntax
  }

  /// Reads out the binary DICOM P10 data serialized so far. Data inside
  /// open defined-length sequences is withheld until their lengths are
  /// known.
  ///
  pub fn read_bytes(&mut self) -> Result<Vec<RcByteSlice>, P10Error> {
    self.flush_sink()?;

    Ok(core::mem::take(&mut self.chunks))
  }

  /// Writes a DICOM P10 token to the write context, serializing it into
  /// binary DICOM P10 data.
  ///
  pub fn write_token(&mut self, token: &P10Token) -> Result<(), P10Error> {
    if self.is_ended {
      return Err(P10Error::TokenStreamInvalid {
        when: "Writing DICOM P10 data".to_string(),
        details: "Token received after the end token".to_string(),
        token: token.clone(),
      });
    }

    match token {
      P10Token::FilePreambleAndDICMPrefix { preamble } => {
        self.sink.write(preamble.as_ref());
        self.sink.write(b"DICM");
        Ok(())
      }

      P10Token::FileMetaInformation { data_set } => {
        self.write_file_meta_information(data_set)
      }

      P10Token::DataElementHeader {
        tag, vr, length, ..
      } => self.write_data_element_header(*tag, *vr, *length),

      P10Token::DataElementValueBytes {
        data,
        bytes_remaining,
        ..
      } => {
        self.sink.write(data);

        if *bytes_remaining == 0 {
          if let Some(padding_byte) = self.pending_value_padding.take() {
            self.sink.write(&[padding_byte]);
          }
        }

        Ok(())
      }

      // Lazy data elements are materialized from their data source as they
      // are written
      P10Token::DataElementLazy {
        tag, vr, handle, ..
      } => {
        let data = handle
          .source
          .read_span(handle.offset, handle.length as usize)
          .map_err(|details| P10Error::OtherError {
            error_type: "Lazy value load failed".to_string(),
            details,
          })?;

        self.write_data_element_header(*tag, *vr, handle.length as u32)?;
        self.sink.write(&data);

        if let Some(padding_byte) = self.pending_value_padding.take() {
          self.sink.write(&[padding_byte]);
        }

        Ok(())
      }

      P10Token::SequenceStart { tag, vr, .. } => {
        self.write_sequence_start(*tag, *vr)
      }

      P10Token::SequenceDelimiter { tag } => self.write_sequence_delimiter(*tag),

      P10Token::SequenceItemStart { .. } => self.write_item_start(),

      P10Token::SequenceItemDelimiter => self.write_item_delimiter(),

      P10Token::PixelDataItem { length, .. } => {
        self.write_tag(dictionary::ITEM.tag);
        self.sink.write_u32_le(*length);
        Ok(())
      }

      P10Token::End => {
        self.is_ended = true;
        self.flush_sink()?;

        // Finish the deflate stream when the transfer syntax is deflated
        if self.zlib_stream.is_some() {
          let final_chunk = self.deflate_bytes(&[], true)?;
          if !final_chunk.is_empty() {
            self.chunks.push(final_chunk.into());
          }
        }

        Ok(())
      }
    }
  }

  /// Builds and serializes the File Meta Information. The transfer syntax
  /// declared in the given data set becomes the write context's transfer
  /// syntax for the main data set, and the implementation class UID and
  /// version name from the write config are added.
  ///
  fn write_file_meta_information(
    &mut self,
    data_set: &DataSet,
  ) -> Result<(), P10Error> {
    let mut fmi = data_set.clone();

    // Resolve the transfer syntax for the main data set
    let uid = fmi
      .get_string(dictionary::TRANSFER_SYNTAX_UID.tag)
      .unwrap_or(transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN.uid)
      .to_string();

    self.transfer_syntax = TransferSyntax::from_uid(&uid).map_err(|_| {
      P10Error::TransferSyntaxNotSupported {
        transfer_syntax_uid: uid.clone(),
      }
    })?;

    // Read-only transfer syntaxes can't be written
    if self.transfer_syntax.is_read_only {
      return Err(P10Error::TransferSyntaxNotSupported {
        transfer_syntax_uid: uid.clone(),
      });
    }

    fmi
      .insert_string_value(&dictionary::TRANSFER_SYNTAX_UID, &[&uid])
      .unwrap();

    // The File Meta Information version is always two bytes: 0x00 0x01
    fmi.insert(
      dictionary::FILE_META_INFORMATION_VERSION.tag,
      DataElementValue::new_other_byte_string(vec![0x00, 0x01]).unwrap(),
    );

    fmi
      .insert_string_value(
        &dictionary::IMPLEMENTATION_CLASS_UID,
        &[&self.config.implementation_class_uid],
      )
      .map_err(|e| P10Error::OtherError {
        error_type: "Invalid implementation class UID".to_string(),
        details: e.to_string(),
      })?;

    fmi
      .insert_string_value(
        &dictionary::IMPLEMENTATION_VERSION_NAME,
        &[&self.config.implementation_version_name],
      )
      .map_err(|e| P10Error::OtherError {
        error_type: "Invalid implementation version name".to_string(),
        details: e.to_string(),
      })?;

    // The group length is computed below, so any incoming value is stale
    fmi.remove(dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag);

    // Serialize all File Meta Information data elements into a buffer so
    // the group length can be computed
    let mut group_sink = ByteSink::new();

    for (tag, value) in fmi.iter() {
      let bytes = value.bytes().map_err(|_| P10Error::TokenStreamInvalid {
        when: "Writing File Meta Information".to_string(),
        details: format!(
          "Data element '{}' in File Meta Information has no raw bytes",
          tag
        ),
        token: P10Token::FileMetaInformation {
          data_set: fmi.clone(),
        },
      })?;

      let vr = value.value_representation();

      write_explicit_le_header(&mut group_sink, *tag, vr, bytes.len() as u32)?;
      group_sink.write(bytes);
    }

    let group_content = group_sink.take();

    // Write the group length element followed by the group's content
    write_explicit_le_header(
      &mut self.sink,
      dictionary::FILE_META_INFORMATION_GROUP_LENGTH.tag,
      ValueRepresentation::UnsignedLong,
      4,
    )?;
    self.sink.write_u32_le(group_content.len() as u32);
    self.sink.write(&group_content);

    // All data following the File Meta Information is deflated when the
    // transfer syntax requires it
    if self.transfer_syntax.is_deflated {
      self.flush_sink()?;

      self.zlib_stream = Some(flate2::Compress::new(
        flate2::Compression::new(self.config.zlib_compression_level),
        false,
      ));
    }

    Ok(())
  }

  fn write_data_element_header(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
    length: u32,
  ) -> Result<(), P10Error> {
    // Odd-length values are padded to even length using the VR's padding
    // byte, applied once the final value bytes token has been written
    let length = if length % 2 == 1 {
      self.pending_value_padding = Some(vr.padding_byte());
      length + 1
    } else {
      length
    };

    match self.transfer_syntax.vr_serialization {
      transfer_syntax::VrSerialization::VrExplicit => {
        write_explicit_le_header(&mut self.sink, tag, vr, length)
      }

      transfer_syntax::VrSerialization::VrImplicit => {
        self.write_tag(tag);
        self.sink.write_u32_le(length);
        Ok(())
      }
    }
  }

  fn write_sequence_start(
    &mut self,
    tag: DataElementTag,
    vr: ValueRepresentation,
  ) -> Result<(), P10Error> {
    // Encapsulated pixel data is always written with an undefined length
    // regardless of the sequence framing policy. Ref: PS3.5 A.4.
    let is_encapsulated_pixel_data = vr != ValueRepresentation::Sequence;

    match self.transfer_syntax.vr_serialization {
      transfer_syntax::VrSerialization::VrExplicit => {
        self.write_tag(tag);
        self.sink.write(&vr.to_bytes());
        self.sink.write(&[0, 0]);
      }

      transfer_syntax::VrSerialization::VrImplicit => {
        self.write_tag(tag);
      }
    }

    if !is_encapsulated_pixel_data
      && self.config.sequence_framing == SequenceFraming::DefinedLength
    {
      self.open_defined_scope();
    } else {
      self.open_scopes.push(LengthScope::Delimited);
      self.sink.write_u32_le(0xFFFF_FFFF);
    }

    Ok(())
  }

  fn write_sequence_delimiter(
    &mut self,
    _tag: DataElementTag,
  ) -> Result<(), P10Error> {
    if self.close_scope() {
      self.write_tag(dictionary::SEQUENCE_DELIMITATION_ITEM.tag);
      self.sink.write_u32_le(0);
    }

    Ok(())
  }

  fn write_item_start(&mut self) -> Result<(), P10Error> {
    self.write_tag(dictionary::ITEM.tag);

    if self.config.sequence_framing == SequenceFraming::DefinedLength {
      self.open_defined_scope();
    } else {
      self.open_scopes.push(LengthScope::Delimited);
      self.sink.write_u32_le(0xFFFF_FFFF);
    }

    Ok(())
  }

  fn write_item_delimiter(&mut self) -> Result<(), P10Error> {
    if self.close_scope() {
      self.write_tag(dictionary::ITEM_DELIMITATION_ITEM.tag);
      self.sink.write_u32_le(0);
    }

    Ok(())
  }

  fn open_defined_scope(&mut self) {
    self.open_scopes.push(LengthScope::Defined {
      length_field_offset: self.sink.len(),
    });
    self.sink.write_u32_le(0);
  }

  /// Closes the innermost open scope, filling in its length field when it
  /// has a defined length. Returns whether a delimitation item needs to be
  /// written.
  ///
  fn close_scope(&mut self) -> bool {
    match self.open_scopes.pop() {
      Some(LengthScope::Defined {
        length_field_offset,
      }) => {
        let length = self.sink.len() - length_field_offset - 4;
        self.sink.patch_u32_le(length_field_offset, length as u32);

        false
      }

      Some(LengthScope::Delimited) | None => true,
    }
  }

  fn write_tag(&mut self, tag: DataElementTag) {
    self.sink.write_u16_le(tag.group);
    self.sink.write_u16_le(tag.element);
  }

  /// Moves the serialized bytes in the sink into the output chunks, passing
  /// them through the deflate stream when one is active. Data inside open
  /// defined-length scopes is retained in the sink because its length
  /// fields are still subject to patching.
  ///
  fn flush_sink(&mut self) -> Result<(), P10Error> {
    // Content is withheld while a defined-length scope is open because its
    // length field is still subject to patching
    let has_defined_scope = self
      .open_scopes
      .iter()
      .any(|scope| matches!(scope, LengthScope::Defined { .. }));

    if has_defined_scope || self.sink.is_empty() {
      return Ok(());
    }

    let bytes = self.sink.take();

    if self.zlib_stream.is_some() {
      let compressed = self.deflate_bytes(&bytes, false)?;
      if !compressed.is_empty() {
        self.chunks.push(compressed.into());
      }
    } else {
      self.chunks.push(bytes.into());
    }

    Ok(())
  }

  /// Passes bytes through the active deflate stream, returning the
  /// compressed output produced so far. When `finish` is true the deflate
  /// stream is finalized.
  ///
  fn deflate_bytes(
    &mut self,
    bytes: &[u8],
    finish: bool,
  ) -> Result<Vec<u8>, P10Error> {
    let zlib_stream = self.zlib_stream.as_mut().unwrap();

    let mut output = Vec::with_capacity(bytes.len() / 2 + 64);
    let mut input = bytes;
    let mut buffer = vec![0u8; 64 * 1024];

    let flush = if finish {
      flate2::FlushCompress::Finish
    } else {
      flate2::FlushCompress::None
    };

    loop {
      let before_in = zlib_stream.total_in();
      let before_out = zlib_stream.total_out();

      let status = zlib_stream
        .compress(input, &mut buffer, flush)
        .map_err(|e| P10Error::DataInvalid {
          when: "Deflating DICOM P10 data".to_string(),
          details: e.to_string(),
          kind: IssueKind::DecodeError,
          path: DataSetPath::new(),
          offset: 0,
        })?;

      let bytes_consumed = (zlib_stream.total_in() - before_in) as usize;
      let bytes_produced = (zlib_stream.total_out() - before_out) as usize;

      output.extend_from_slice(&buffer[..bytes_produced]);
      input = &input[bytes_consumed..];

      if finish {
        if status == flate2::Status::StreamEnd {
          break;
        }
      } else if input.is_empty() && bytes_produced == 0 {
        break;
      }
    }

    Ok(output)
  }
}

/// Converts a data set into a stream of DICOM P10 tokens: the File Preamble
/// and 'DICM' prefix, the File Meta Information built from the data set's
/// group 0x0002 elements, the main data set's elements, and the end token.
/// Each token is returned via the callback.
///
pub fn data_set_to_tokens(
  data_set: &DataSet,
  path: &DataSetPath,
  token_callback: &mut impl FnMut(&P10Token) -> Result<(), P10Error>,
) -> Result<(), P10Error> {
  token_callback(&P10Token::FilePreambleAndDICMPrefix {
    preamble: Box::new([0u8; 128]),
  })?;

  // Split the File Meta Information elements out of the data set
  let mut fmi_data_set = DataSet::new();
  let mut main_data_set = DataSet::new();

  for (tag, value) in data_set.iter() {
    if tag.is_file_meta_information() {
      fmi_data_set.insert(*tag, value.clone());
    } else {
      main_data_set.insert(*tag, value.clone());
    }
  }

  token_callback(&P10Token::FileMetaInformation {
    data_set: fmi_data_set,
  })?;

  crate::p10_token::data_elements_to_tokens(
    &main_data_set,
    path,
    token_callback,
  )?;

  token_callback(&P10Token::End)
}

/// Converts a data set directly to DICOM P10 bytes, returned in chunks via
/// the callback.
///
pub fn data_set_to_bytes(
  data_set: &DataSet,
  path: &DataSetPath,
  bytes_callback: &mut impl FnMut(RcByteSlice) -> Result<(), P10Error>,
  config: Option<P10WriteConfig>,
) -> Result<(), P10Error> {
  let mut context = P10WriteContext::new(config);

  data_set_to_tokens(data_set, path, &mut |token| {
    context.write_token(token)?;

    for chunk in context.read_bytes()? {
      bytes_callback(chunk)?;
    }

    Ok(())
  })?;

  for chunk in context.read_bytes()? {
    bytes_callback(chunk)?;
  }

  Ok(())
}

/// Serializes an explicit VR little endian data element header.
///
fn write_explicit_le_header(
  sink: &mut ByteSink,
  tag: DataElementTag,
  vr: ValueRepresentation,
  length: u32,
) -> Result<(), P10Error> {
  sink.write_u16_le(tag.group);
  sink.write_u16_le(tag.element);
  sink.write(&vr.to_bytes());

  match DataElementHeader::value_length_size(vr) {
    ValueLengthSize::U16 => {
      if length > 0xFFFF {
        return Err(P10Error::DataInvalid {
          when: "Writing data element header".to_string(),
          details: format!(
            "Length {} exceeds the 16-bit length field of VR {}",
            length, vr
          ),
          kind: IssueKind::InvalidLength,
          path: DataSetPath::new_with_data_element(tag),
          offset: 0,
        });
      }

      sink.write_u16_le(length as u16);
    }

    ValueLengthSize::U32 => {
      sink.write(&[0, 0]);
      sink.write_u32_le(length);
    }
  }

  Ok(())
}
