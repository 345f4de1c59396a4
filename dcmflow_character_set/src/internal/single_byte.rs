//! Decoders for the single-byte character sets that have formulaic mappings
//! to Unicode and so don't require a lookup table.

use crate::internal::utils;

/// Decodes a byte in the G1 area of ISO 8859-1 (Latin alphabet No. 1). The
/// G1 codes map directly onto the corresponding Unicode codepoints.
///
pub fn decode_latin_1(byte: u8) -> char {
  utils::codepoint_to_char(u32::from(byte))
}

/// Decodes a byte in the G1 area of ISO 8859-5 (Latin/Cyrillic).
///
pub fn decode_cyrillic(byte: u8) -> char {
  let codepoint = match byte {
    0xA0 => 0x00A0,
    0xAD => 0x00AD,
    0xA1..=0xAC | 0xAE..=0xEF => 0x0401 + u32::from(byte) - 0xA1,
    0xF0 => 0x2116,
    0xF1..=0xFC => 0x0451 + u32::from(byte) - 0xF1,
    0xFD => 0x00A7,
    0xFE => 0x045E,
    0xFF => 0x045F,
    _ => return utils::REPLACEMENT_CHARACTER,
  };

  utils::codepoint_to_char(codepoint)
}

/// Decodes a byte in the G1 area of TIS 620-2533 (Thai).
///
pub fn decode_thai(byte: u8) -> char {
  let codepoint = match byte {
    0xA0 => 0x00A0,
    0xA1..=0xDA => 0x0E01 + u32::from(byte) - 0xA1,
    0xDF..=0xFB => 0x0E3F + u32::from(byte) - 0xDF,
    _ => return utils::REPLACEMENT_CHARACTER,
  };

  utils::codepoint_to_char(codepoint)
}

/// Decodes a byte in the G0 area of JIS X 0201 (romaji). This is ISO 646
/// with the backslash replaced by the yen sign and the tilde replaced by the
/// overline.
///
pub fn decode_jis_x_0201_romaji(byte: u8) -> char {
  match byte {
    0x5C => '\u{00A5}',
    0x7E => '\u{203E}',
    _ => utils::codepoint_to_char(u32::from(byte)),
  }
}

/// Decodes a byte in the G1 area of JIS X 0201 (half-width katakana).
///
pub fn decode_jis_x_0201_katakana(byte: u8) -> char {
  match byte {
    0xA1..=0xDF => utils::codepoint_to_char(0xFF61 + u32::from(byte) - 0xA1),
    _ => utils::REPLACEMENT_CHARACTER,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_latin_1_test() {
    assert_eq!(decode_latin_1(0xE9), 'é');
    assert_eq!(decode_latin_1(0xA3), '£');
  }

  #[test]
  fn decode_cyrillic_test() {
    assert_eq!(decode_cyrillic(0xCF), 'Я');
    assert_eq!(decode_cyrillic(0xD0), 'а');
    assert_eq!(decode_cyrillic(0xF0), '№');
    assert_eq!(decode_cyrillic(0xFF), 'џ');
  }

  #[test]
  fn decode_thai_test() {
    assert_eq!(decode_thai(0xA1), 'ก');
    assert_eq!(decode_thai(0xE0), 'เ');
    assert_eq!(decode_thai(0xDC), '\u{FFFD}');
  }

  #[test]
  fn decode_jis_x_0201_test() {
    assert_eq!(decode_jis_x_0201_romaji(0x5C), '¥');
    assert_eq!(decode_jis_x_0201_romaji(0x41), 'A');

    assert_eq!(decode_jis_x_0201_katakana(0xB6), 'カ');
    assert_eq!(decode_jis_x_0201_katakana(0x41), '\u{FFFD}');
  }
}
