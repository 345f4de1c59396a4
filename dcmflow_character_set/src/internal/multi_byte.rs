//! Decoders for multi-byte character sets and for the single-byte sets that
//! require lookup tables. These delegate to the `encoding` crate, so they're
//! only available with the `std` feature; without it their characters decode
//! to replacement characters.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::internal::utils;

/// Decodes a complete value using the character set with the given WHATWG
/// label, e.g. `"gb18030"`. Malformed sequences decode to replacement
/// characters.
///
#[cfg(feature = "std")]
pub fn decode_whole_value(label: &str, bytes: &[u8]) -> String {
  match encoding::label::encoding_from_whatwg_label(label) {
    Some(codec) => {
      match codec.decode(bytes, encoding::DecoderTrap::Replace) {
        Ok(value) => value,
        Err(_) => utils::REPLACEMENT_CHARACTER.to_string(),
      }
    }
    None => utils::REPLACEMENT_CHARACTER.to_string(),
  }
}

#[cfg(not(feature = "std"))]
pub fn decode_whole_value(_label: &str, bytes: &[u8]) -> String {
  bytes.iter().map(|_| utils::REPLACEMENT_CHARACTER).collect()
}

/// Decodes a single byte in the G1 area of a single-byte character set with
/// the given WHATWG label, e.g. `"iso-8859-7"`.
///
pub fn decode_single_byte(label: &str, byte: u8) -> char {
  decode_whole_value(label, &[byte])
    .chars()
    .next()
    .unwrap_or(utils::REPLACEMENT_CHARACTER)
}

/// Decodes a two-byte JIS X 0208 code, as designated by the `ISO 2022 IR 87`
/// escape sequence. The code is decoded by synthesizing an ISO-2022-JP
/// stream containing just this character.
///
pub fn decode_jis_x_0208(byte_0: u8, byte_1: u8) -> char {
  let bytes = [0x1B, 0x24, 0x42, byte_0 & 0x7F, byte_1 & 0x7F];

  decode_whole_value("iso-2022-jp", &bytes)
    .chars()
    .next()
    .unwrap_or(utils::REPLACEMENT_CHARACTER)
}

/// Decodes a two-byte JIS X 0212 code, as designated by the
/// `ISO 2022 IR 159` escape sequence. The code is decoded by synthesizing a
/// EUC-JP byte sequence using the single-shift into code set 3.
///
pub fn decode_jis_x_0212(byte_0: u8, byte_1: u8) -> char {
  let bytes = [0x8F, byte_0 | 0x80, byte_1 | 0x80];

  decode_whole_value("euc-jp", &bytes)
    .chars()
    .next()
    .unwrap_or(utils::REPLACEMENT_CHARACTER)
}

/// Decodes a two-byte KS X 1001 code in the G1 area, as designated by the
/// `ISO 2022 IR 149` escape sequence.
///
pub fn decode_ks_x_1001(byte_0: u8, byte_1: u8) -> char {
  let bytes = [byte_0 | 0x80, byte_1 | 0x80];

  decode_whole_value("euc-kr", &bytes)
    .chars()
    .next()
    .unwrap_or(utils::REPLACEMENT_CHARACTER)
}

/// Decodes a two-byte GB 2312 code in the G1 area, as designated by the
/// `ISO 2022 IR 58` escape sequence. GBK is a superset of the EUC form of
/// GB 2312.
///
pub fn decode_gb_2312(byte_0: u8, byte_1: u8) -> char {
  let bytes = [byte_0 | 0x80, byte_1 | 0x80];

  decode_whole_value("gbk", &bytes)
    .chars()
    .next()
    .unwrap_or(utils::REPLACEMENT_CHARACTER)
}

#[cfg(all(test, feature = "std"))]
mod tests {
  use super::*;

  #[test]
  fn decode_whole_value_test() {
    assert_eq!(
      decode_whole_value("gb18030", &[0xC4, 0xE3, 0xBA, 0xC3]),
      "你好"
    );
  }

  #[test]
  fn decode_single_byte_test() {
    assert_eq!(decode_single_byte("iso-8859-7", 0xE1), 'α');
  }

  #[test]
  fn decode_jis_x_0208_test() {
    assert_eq!(decode_jis_x_0208(0x3B, 0x33), '山');
  }

  #[test]
  fn decode_ks_x_1001_test() {
    assert_eq!(decode_ks_x_1001(0x30, 0x21), '가');
  }
}
