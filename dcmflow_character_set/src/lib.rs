//! Decodes DICOM string data into UTF-8 based on the value of the
//! *'(0008,0005) Specific Character Set'* data element.
//!
//! A specific character set is either a single character set that applies to
//! the whole data set, or a primary character set plus one or more extension
//! character sets that are switched between using ISO 2022 escape sequences
//! embedded in string values.
//!
//! UTF-8, GB18030, and GBK are incompatible with ISO 2022 code extensions
//! and are only valid as the sole value of the Specific Character Set.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(not(feature = "std"))]
use alloc::{
  format,
  string::{String, ToString},
  vec,
  vec::Vec,
};

pub mod character_set;

mod internal;

pub use character_set::CharacterSet;

use character_set::{ALL_CHARACTER_SETS, ISO_IR_6, ISO_IR_192, StandaloneDecoder};
use internal::{iso_2022, multi_byte, utf8};

/// The resolved value of a *'(0008,0005) Specific Character Set'* data
/// element: a primary character set, optionally followed by extension
/// character sets selected by ISO 2022 escape sequences.
///
#[derive(Clone, Debug, PartialEq)]
pub struct SpecificCharacterSet {
  charsets: Vec<&'static CharacterSet>,
}

/// The type of string being decoded. This controls which bytes act as
/// delimiters that reset ISO 2022 designations back to the primary
/// character set.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StringType {
  /// A string that holds a single value, e.g. `LongText`. Only control
  /// characters reset the designations.
  SingleValue,

  /// A string that can hold multiple values separated by backslashes, e.g.
  /// `LongString`. Backslashes also reset the designations.
  MultiValue,

  /// A `PersonName` string. Backslashes and the `^` and `=` component and
  /// component-group separators also reset the designations.
  PersonName,
}

/// An error when resolving the value of a Specific Character Set data
/// element.
///
#[derive(Clone, Debug, PartialEq)]
pub enum CharacterSetError {
  /// A value is not a recognized defined term.
  UnknownTerm { term: String },

  /// The combination of values is not allowed, e.g. UTF-8 alongside ISO
  /// 2022 extension terms.
  InvalidCombination { details: String },
}

impl core::fmt::Display for CharacterSetError {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    match self {
      Self::UnknownTerm { term } => {
        write!(f, "Unknown character set term: {:?}", term)
      }
      Self::InvalidCombination { details } => {
        write!(f, "Invalid character set combination: {}", details)
      }
    }
  }
}

impl SpecificCharacterSet {
  /// The default character repertoire that applies when no Specific
  /// Character Set data element is present.
  ///
  pub fn default_repertoire() -> Self {
    Self {
      charsets: vec![&ISO_IR_6],
    }
  }

  /// Resolves the value of a Specific Character Set data element, which may
  /// hold multiple values separated by backslashes. Defined terms are
  /// normalized before matching, so common non-conformant spellings such as
  /// `"ISO IR 100"` and `"ISO-IR 100"` are accepted.
  ///
  pub fn from_string(value: &str) -> Result<Self, CharacterSetError> {
    let terms: Vec<String> =
      value.split('\\').map(normalize_term).collect();

    match terms.as_slice() {
      [] => Ok(Self::default_repertoire()),

      [term] => {
        if term.is_empty() {
          return Ok(Self::default_repertoire());
        }

        let charset = find_by_primary_term(term)
          .or_else(|| find_by_extension_term(term))
          .ok_or_else(|| CharacterSetError::UnknownTerm {
            term: term.clone(),
          })?;

        Ok(Self {
          charsets: vec![charset],
        })
      }

      terms => {
        let mut charsets = Vec::with_capacity(terms.len());

        for (index, term) in terms.iter().enumerate() {
          // An empty first value means the default repertoire is the
          // primary character set
          let charset = if term.is_empty() && index == 0 {
            &ISO_IR_6
          } else {
            find_by_extension_term(term)
              .or_else(|| find_by_primary_term(term))
              .ok_or_else(|| CharacterSetError::UnknownTerm {
                term: term.clone(),
              })?
          };

          if charset.standalone.is_some() {
            return Err(CharacterSetError::InvalidCombination {
              details: format!(
                "'{}' is incompatible with ISO 2022 code extensions",
                term
              ),
            });
          }

          charsets.push(charset);
        }

        Ok(Self { charsets })
      }
    }
  }

  /// Returns whether string data in this specific character set is byte
  /// compatible with UTF-8, i.e. can be passed through without conversion.
  ///
  pub fn is_utf8_compatible(&self) -> bool {
    matches!(self.charsets.as_slice(), [charset]
      if core::ptr::eq(*charset, &ISO_IR_6)
        || core::ptr::eq(*charset, &ISO_IR_192))
  }

  /// Returns the character sets that make up this specific character set.
  /// The first is the primary character set.
  ///
  pub fn charsets(&self) -> &[&'static CharacterSet] {
    &self.charsets
  }

  /// Decodes string bytes into UTF-8. Decoding never fails: malformed bytes
  /// are decoded to replacement characters, so no input bytes are silently
  /// dropped.
  ///
  pub fn decode_bytes(&self, bytes: &[u8], string_type: StringType) -> String {
    match self.charsets.as_slice() {
      [charset] if charset.standalone.is_some() => {
        match charset.standalone.unwrap() {
          StandaloneDecoder::Utf8 => decode_utf8(bytes),

          // The multi-byte decoders consume 0x5C as a trailing byte of
          // two-byte characters, so a backslash inside such a character is
          // never mistaken for a value delimiter
          StandaloneDecoder::Gb18030 => {
            multi_byte::decode_whole_value("gb18030", bytes)
          }
          StandaloneDecoder::Gbk => {
            multi_byte::decode_whole_value("gbk", bytes)
          }
        }
      }

      charsets => iso_2022::decode(bytes, charsets, string_type),
    }
  }
}

/// Decodes UTF-8 bytes, replacing malformed sequences with replacement
/// characters.
///
fn decode_utf8(bytes: &[u8]) -> String {
  let mut result = String::with_capacity(bytes.len());

  let mut remaining = bytes;
  while let Ok((c, rest)) = utf8::decode_next_codepoint(remaining) {
    result.push(c);
    remaining = rest;
  }

  result
}

/// Normalizes a defined term prior to matching: whitespace is trimmed, and
/// the `ISO IR` and `ISO-IR` misspellings become `ISO_IR`.
///
fn normalize_term(term: &str) -> String {
  let term = term.trim().to_uppercase();

  if let Some(rest) = term.strip_prefix("ISO IR ") {
    return format!("ISO_IR {}", rest);
  }

  if let Some(rest) = term.strip_prefix("ISO-IR ") {
    return format!("ISO_IR {}", rest);
  }

  term
}

fn find_by_primary_term(term: &str) -> Option<&'static CharacterSet> {
  ALL_CHARACTER_SETS
    .iter()
    .find(|charset| charset.primary_term == Some(term))
    .copied()
}

fn find_by_extension_term(term: &str) -> Option<&'static CharacterSet> {
  ALL_CHARACTER_SETS
    .iter()
    .find(|charset| charset.extension_term == Some(term))
    .copied()
}

/// Replaces bytes that aren't valid in the default character repertoire with
/// question marks, in place. Used to sanitize string values that are defined
/// to never be affected by the Specific Character Set.
///
pub fn sanitize_default_charset_bytes(bytes: &mut [u8]) {
  for byte in bytes.iter_mut() {
    let is_valid = matches!(*byte, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D)
      || (0x20..=0x7E).contains(byte);

    if !is_valid {
      *byte = b'?';
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_string_test() {
    assert_eq!(
      SpecificCharacterSet::from_string(""),
      Ok(SpecificCharacterSet::default_repertoire())
    );

    assert_eq!(
      SpecificCharacterSet::from_string("ISO_IR 100")
        .unwrap()
        .charsets(),
      &[&character_set::ISO_IR_100]
    );

    // Common misspellings normalize to the canonical term
    assert_eq!(
      SpecificCharacterSet::from_string(" ISO IR 100"),
      SpecificCharacterSet::from_string("ISO-IR 100"),
    );

    assert_eq!(
      SpecificCharacterSet::from_string("\\ISO 2022 IR 87")
        .unwrap()
        .charsets(),
      &[&character_set::ISO_IR_6, &character_set::ISO_2022_IR_87]
    );

    assert_eq!(
      SpecificCharacterSet::from_string("ISO_IR 999"),
      Err(CharacterSetError::UnknownTerm {
        term: "ISO_IR 999".to_string()
      })
    );
  }

  #[test]
  fn standalone_sets_reject_extensions_test() {
    assert!(matches!(
      SpecificCharacterSet::from_string("ISO_IR 192\\ISO 2022 IR 87"),
      Err(CharacterSetError::InvalidCombination { .. })
    ));

    assert!(matches!(
      SpecificCharacterSet::from_string("GB18030\\ISO 2022 IR 58"),
      Err(CharacterSetError::InvalidCombination { .. })
    ));
  }

  #[test]
  fn is_utf8_compatible_test() {
    assert!(SpecificCharacterSet::default_repertoire().is_utf8_compatible());

    assert!(
      SpecificCharacterSet::from_string("ISO_IR 192")
        .unwrap()
        .is_utf8_compatible()
    );

    assert!(
      !SpecificCharacterSet::from_string("ISO_IR 100")
        .unwrap()
        .is_utf8_compatible()
    );
  }

  #[test]
  fn decode_utf8_test() {
    let charset = SpecificCharacterSet::from_string("ISO_IR 192").unwrap();

    assert_eq!(
      charset.decode_bytes("héllo".as_bytes(), StringType::SingleValue),
      "héllo"
    );

    assert_eq!(
      charset.decode_bytes(&[0x41, 0xFF, 0x42], StringType::SingleValue),
      "A\u{FFFD}B"
    );
  }

  #[cfg(feature = "std")]
  #[test]
  fn gb18030_backslash_trail_byte_test() {
    let charset = SpecificCharacterSet::from_string("GB18030").unwrap();

    // 0x875C is a two-byte GB18030 character whose trailing byte is 0x5C.
    // It must not be decoded as a backslash.
    let decoded =
      charset.decode_bytes(&[0x87, 0x5C, 0x31], StringType::MultiValue);

    assert!(!decoded.contains('\\'));
    assert!(decoded.ends_with('1'));
  }

  #[test]
  fn sanitize_default_charset_bytes_test() {
    let mut bytes = b"AB\xFFC\x1BD".to_vec();
    sanitize_default_charset_bytes(&mut bytes);

    assert_eq!(bytes, b"AB?C?D".to_vec());
  }
}
