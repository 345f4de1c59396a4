//! The zigzag scan order, quantization tables, and Huffman tables used by
//! the JPEG Baseline codec.
//!
//! The quantization and Huffman tables are the example tables from Annex K
//! of the JPEG specification (ITU-T T.81), which are the de facto standard
//! tables used by almost all baseline encoders.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// The zigzag scan order: maps a position in the zigzag sequence to its
/// index in the 8x8 block in row-major order.
///
pub const ZIGZAG_ORDER: [usize; 64] = [
  0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40,
  48, 41, 34, 27, 20, 13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36,
  29, 22, 15, 23, 30, 37, 44, 51, 58, 59, 52, 45, 38, 31, 39, 46, 53, 60, 61,
  54, 47, 55, 62, 63,
];

/// The example luminance quantization table, in row-major order.
///
pub const LUMINANCE_QUANTIZATION_TABLE: [u16; 64] = [
  16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16,
  24, 40, 57, 69, 56, 14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68,
  109, 103, 77, 24, 35, 55, 64, 81, 104, 113, 92, 49, 64, 78, 87, 103, 121,
  120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// The example chrominance quantization table, in row-major order.
///
pub const CHROMINANCE_QUANTIZATION_TABLE: [u16; 64] = [
  17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56,
  99, 99, 99, 99, 99, 47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
  99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
  99, 99, 99, 99, 99, 99, 99,
];

/// Scales a base quantization table for the given quality in the range
/// 1-100, where higher values mean higher quality.
///
pub fn scale_quantization_table(
  base_table: &[u16; 64],
  quality: u8,
) -> [u16; 64] {
  let quality = u32::from(quality.clamp(1, 100));

  let scale = if quality < 50 {
    5000 / quality
  } else {
    200 - 2 * quality
  };

  let mut table = [0u16; 64];
  for (entry, base) in table.iter_mut().zip(base_table.iter()) {
    *entry =
      ((u32::from(*base) * scale + 50) / 100).clamp(1, 255) as u16;
  }

  table
}

/// The specification of a Huffman table: the number of codes of each length
/// from 1 to 16 bits, and the symbol values in code order.
///
pub struct HuffmanSpec {
  pub counts: [u8; 16],
  pub values: &'static [u8],
}

pub static DC_LUMINANCE_SPEC: HuffmanSpec = HuffmanSpec {
  counts: [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
  values: &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
};

pub static DC_CHROMINANCE_SPEC: HuffmanSpec = HuffmanSpec {
  counts: [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0],
  values: &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
};

pub static AC_LUMINANCE_SPEC: HuffmanSpec = HuffmanSpec {
  counts: [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 0x7D],
  values: &[
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06,
    0x13, 0x51, 0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08,
    0x23, 0x42, 0xB1, 0xC1, 0x15, 0x52, 0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72,
    0x82, 0x09, 0x0A, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2A, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x43, 0x44, 0x45,
    0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59,
    0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75,
    0x76, 0x77, 0x78, 0x79, 0x7A, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8A, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3,
    0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6,
    0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9,
    0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE1, 0xE2,
    0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xF1, 0xF2, 0xF3, 0xF4,
    0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
  ],
};

pub static AC_CHROMINANCE_SPEC: HuffmanSpec = HuffmanSpec {
  counts: [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 0x77],
  values: &[
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41,
    0x51, 0x07, 0x61, 0x71, 0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91,
    0xA1, 0xB1, 0xC1, 0x09, 0x23, 0x33, 0x52, 0xF0, 0x15, 0x62, 0x72, 0xD1,
    0x0A, 0x16, 0x24, 0x34, 0xE1, 0x25, 0xF1, 0x17, 0x18, 0x19, 0x1A, 0x26,
    0x27, 0x28, 0x29, 0x2A, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x43, 0x44,
    0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58,
    0x59, 0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74,
    0x75, 0x76, 0x77, 0x78, 0x79, 0x7A, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8A, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A,
    0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4,
    0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7,
    0xC8, 0xC9, 0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA,
    0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xF2, 0xF3, 0xF4,
    0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
  ],
};

/// A Huffman table in a form usable for encoding: the code and code length
/// for each of the 256 possible symbols. Symbols that have no code have a
/// length of zero.
///
pub struct HuffmanEncodeTable {
  pub codes: [u16; 256],
  pub lengths: [u8; 256],
}

impl HuffmanEncodeTable {
  /// Builds the canonical Huffman codes for a Huffman table specification.
  ///
  pub fn new(spec: &HuffmanSpec) -> Self {
    let mut codes = [0u16; 256];
    let mut lengths = [0u8; 256];

    let mut code = 0u16;
    let mut value_index = 0;

    for length in 1..=16 {
      for _ in 0..spec.counts[length - 1] {
        let symbol = spec.values[value_index];
        codes[usize::from(symbol)] = code;
        lengths[usize::from(symbol)] = length as u8;

        code += 1;
        value_index += 1;
      }

      code <<= 1;
    }

    Self { codes, lengths }
  }
}

/// A Huffman table in a form usable for decoding, following the canonical
/// code layout: the smallest and largest code of each length, and the index
/// of the first symbol value of each length.
///
pub struct HuffmanDecodeTable {
  pub min_code: [i32; 17],
  pub max_code: [i32; 17],
  pub value_index: [usize; 17],
  pub values: Vec<u8>,
}

impl HuffmanDecodeTable {
  /// Builds a Huffman decoding table from the code length counts and symbol
  /// values of a DHT segment.
  ///
  pub fn new(counts: &[u8; 16], values: &[u8]) -> Self {
    let mut min_code = [0i32; 17];
    let mut max_code = [-1i32; 17];
    let mut value_index = [0usize; 17];

    let mut code = 0i32;
    let mut index = 0;

    for length in 1..=16 {
      let count = usize::from(counts[length - 1]);

      if count > 0 {
        value_index[length] = index;
        min_code[length] = code;
        max_code[length] = code + count as i32 - 1;

        code += count as i32;
        index += count;
      }

      code <<= 1;
    }

    Self {
      min_code,
      max_code,
      value_index,
      values: values.to_vec(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scale_quantization_table_test() {
    let table = scale_quantization_table(&LUMINANCE_QUANTIZATION_TABLE, 50);
    assert_eq!(table[0], 16);

    let table = scale_quantization_table(&LUMINANCE_QUANTIZATION_TABLE, 100);
    assert!(table.iter().all(|value| *value == 1));

    let table = scale_quantization_table(&LUMINANCE_QUANTIZATION_TABLE, 1);
    assert!(table.iter().all(|value| *value == 255));

    // Higher quality always means finer quantization
    let q30 = scale_quantization_table(&LUMINANCE_QUANTIZATION_TABLE, 30);
    let q90 = scale_quantization_table(&LUMINANCE_QUANTIZATION_TABLE, 90);
    assert!(q30.iter().zip(q90.iter()).all(|(a, b)| a >= b));
  }

  #[test]
  fn huffman_encode_table_test() {
    let table = HuffmanEncodeTable::new(&DC_LUMINANCE_SPEC);

    // The first code is two bits of zeros, assigned to symbol 0
    assert_eq!(table.lengths[0], 2);
    assert_eq!(table.codes[0], 0b00);

    // Symbols 1-5 have three-bit codes
    assert_eq!(table.lengths[1], 3);
    assert_eq!(table.codes[1], 0b010);
    assert_eq!(table.lengths[5], 3);
    assert_eq!(table.codes[5], 0b110);
  }

  #[test]
  fn huffman_decode_table_test() {
    let table = HuffmanDecodeTable::new(
      &DC_LUMINANCE_SPEC.counts,
      DC_LUMINANCE_SPEC.values,
    );

    assert_eq!(table.min_code[2], 0b00);
    assert_eq!(table.max_code[2], 0b00);
    assert_eq!(table.min_code[3], 0b010);
    assert_eq!(table.max_code[3], 0b110);
  }

  #[test]
  fn zigzag_order_is_a_permutation_test() {
    let mut seen = [false; 64];
    for index in ZIGZAG_ORDER {
      seen[index] = true;
    }

    assert!(seen.iter().all(|seen| *seen));
  }
}
