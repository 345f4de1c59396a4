//! Decoding of byte streams that use ISO 2022 code elements and escape
//! sequences, as used by DICOM specific character sets other than UTF-8,
//! GB18030, and GBK.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::StringType;
use crate::character_set::{
  CharacterSet, CodeElement, CodeRegion, ISO_646_CODE_ELEMENT,
};
use crate::internal::utils;

/// The active G0 and G1 code element designations during a decode.
///
struct CodeState<'a> {
  g0: &'a CodeElement,
  g1: Option<&'a CodeElement>,
}

impl<'a> CodeState<'a> {
  /// Returns the initial code state for the given primary character set,
  /// which applies at the start of each decode and is restored at control
  /// character and delimiter boundaries.
  ///
  fn initial(primary: &'a CharacterSet) -> Self {
    let mut state = CodeState {
      g0: &ISO_646_CODE_ELEMENT,
      g1: None,
    };

    for code_element in primary.code_elements {
      state.apply(code_element);
    }

    state
  }

  fn apply(&mut self, code_element: &'a CodeElement) {
    match code_element.region {
      CodeRegion::G0 => self.g0 = code_element,
      CodeRegion::G1 => self.g1 = Some(code_element),
    }
  }
}

/// Decodes bytes using ISO 2022 code elements. The primary character set is
/// active at the start; escape sequences switch between the code elements of
/// the given character sets, and the primary designations are restored after
/// control characters and, depending on the string type, after value and
/// person-name component delimiters.
///
pub fn decode(
  bytes: &[u8],
  charsets: &[&'static CharacterSet],
  string_type: StringType,
) -> String {
  let mut result = String::with_capacity(bytes.len());

  let candidate_elements: Vec<&CodeElement> = charsets
    .iter()
    .flat_map(|charset| charset.code_elements.iter())
    .chain(core::iter::once(&ISO_646_CODE_ELEMENT))
    .collect();

  let primary = charsets[0];
  let mut state = CodeState::initial(primary);

  let mut i = 0;
  while i < bytes.len() {
    let byte = bytes[i];

    // Escape sequences designate a new code element into G0 or G1
    if byte == 0x1B {
      match candidate_elements
        .iter()
        .find(|el| bytes[i..].starts_with(el.escape_sequence))
      {
        Some(code_element) => {
          state.apply(code_element);
          i += code_element.escape_sequence.len();
        }

        None => {
          result.push(utils::REPLACEMENT_CHARACTER);
          i += 1;
        }
      }

      continue;
    }

    // Control characters reset the designations to the primary character
    // set. Ref: PS3.5 6.1.2.5.3.
    if matches!(byte, 0x09 | 0x0A | 0x0C | 0x0D) {
      state = CodeState::initial(primary);
      result.push(byte as char);
      i += 1;
      continue;
    }

    // Value and person-name component delimiters also reset the
    // designations. Delimiters only exist when the active G0 code element
    // is single-byte, as in a multi-byte code element these bytes can be
    // part of a character.
    if state.g0.char_size == 1 {
      let is_delimiter = match string_type {
        StringType::SingleValue => false,
        StringType::MultiValue => byte == 0x5C,
        StringType::PersonName => matches!(byte, 0x5C | 0x5E | 0x3D),
      };

      if is_delimiter {
        state = CodeState::initial(primary);
        result.push(byte as char);
        i += 1;
        continue;
      }
    }

    if byte < 0x80 {
      // Multi-byte G0 code elements only occupy rows 0x21-0x7E, so other
      // bytes pass through as ISO 646
      if state.g0.char_size == 2 && (0x21..=0x7E).contains(&byte) {
        if i + 1 < bytes.len() {
          result.push(state.g0.decoder.decode(byte, bytes[i + 1]));
          i += 2;
        } else {
          result.push(utils::REPLACEMENT_CHARACTER);
          i += 1;
        }
      } else if state.g0.char_size == 2 {
        result.push(utils::codepoint_to_char(u32::from(byte)));
        i += 1;
      } else {
        result.push(state.g0.decoder.decode(byte, 0));
        i += 1;
      }

      continue;
    }

    // Bytes with the high bit set decode through the active G1 code element
    match state.g1 {
      Some(g1) if g1.char_size == 2 => {
        if i + 1 < bytes.len() {
          result.push(g1.decoder.decode(bytes[i], bytes[i + 1]));
          i += 2;
        } else {
          result.push(utils::REPLACEMENT_CHARACTER);
          i += 1;
        }
      }

      Some(g1) => {
        result.push(g1.decoder.decode(byte, 0));
        i += 1;
      }

      None => {
        result.push(utils::REPLACEMENT_CHARACTER);
        i += 1;
      }
    }
  }

  result
}

#[cfg(all(test, feature = "std"))]
mod tests {
  use super::*;
  use crate::character_set;

  #[test]
  fn decode_latin_1_test() {
    assert_eq!(
      decode(
        b"Beno\xEEt",
        &[&character_set::ISO_IR_100],
        StringType::SingleValue
      ),
      "Benoît"
    );
  }

  #[test]
  fn escape_sequence_switches_g1_test() {
    // Starts in the default repertoire, switches G1 to Cyrillic via its
    // escape sequence
    let bytes = b"abc \x1B\x2D\x4C\xD4\xD2\xD5";

    assert_eq!(
      decode(
        bytes,
        &[&character_set::ISO_IR_6, &character_set::ISO_IR_144],
        StringType::SingleValue
      ),
      "abc две"
    );
  }

  #[test]
  fn delimiter_resets_state_test() {
    // The escape into Cyrillic G1 applies until the backslash delimiter,
    // after which high-bit bytes have no designation
    let bytes = b"\x1B\x2D\x4C\xD0\\\xD0";

    assert_eq!(
      decode(
        bytes,
        &[&character_set::ISO_IR_6, &character_set::ISO_IR_144],
        StringType::MultiValue
      ),
      "а\\\u{FFFD}"
    );

    // For a single-valued string the backslash is not a delimiter and the
    // designation persists
    assert_eq!(
      decode(
        bytes,
        &[&character_set::ISO_IR_6, &character_set::ISO_IR_144],
        StringType::SingleValue
      ),
      "а\\а"
    );
  }

  #[test]
  fn kanji_g0_test() {
    // "yama" kanji via the JIS X 0208 G0 designation, then back to ISO 646
    let bytes = b"\x1B\x24\x42\x3B\x33\x1B\x28\x42 A";

    assert_eq!(
      decode(
        bytes,
        &[&character_set::ISO_IR_6, &character_set::ISO_2022_IR_87],
        StringType::SingleValue
      ),
      "山 A"
    );
  }
}
