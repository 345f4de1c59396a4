//! The character sets defined for use by the DICOM *'(0008,0005) Specific
//! Character Set'* data element.

use crate::internal::{multi_byte, single_byte, utils};

/// A single character set, either usable on its own, as part of ISO 2022
/// code extensions, or both.
///
#[derive(Debug, PartialEq)]
pub struct CharacterSet {
  /// The defined term that selects this character set when it is the sole
  /// value of the Specific Character Set, e.g. `"ISO_IR 100"`. Extension-only
  /// character sets have no primary term.
  pub primary_term: Option<&'static str>,

  /// The defined term that selects this character set as part of ISO 2022
  /// code extensions, e.g. `"ISO 2022 IR 100"`. Character sets that are
  /// incompatible with code extensions have no extension term.
  pub extension_term: Option<&'static str>,

  /// The code elements this character set designates into the G0 and G1
  /// code regions. Empty for standalone multi-byte character sets.
  pub code_elements: &'static [CodeElement],

  /// Set for the character sets that can only be used standalone: UTF-8,
  /// GB18030, and GBK. These decode whole values at once and must not be
  /// combined with code extensions.
  pub standalone: Option<StandaloneDecoder>,
}

/// The code region that a code element is designated into by its escape
/// sequence.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CodeRegion {
  G0,
  G1,
}

/// A code element: an escape sequence and the decoder for bytes while it is
/// the active designation of its code region.
///
#[derive(Debug, PartialEq)]
pub struct CodeElement {
  /// The full escape sequence, starting with 0x1B, that designates this code
  /// element.
  pub escape_sequence: &'static [u8],

  /// The code region the escape sequence designates into.
  pub region: CodeRegion,

  /// The number of bytes per character, either 1 or 2.
  pub char_size: usize,

  /// The decoder for bytes in this code element.
  pub decoder: CodeElementDecoder,
}

/// Decoders for the code elements of the supported character sets.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CodeElementDecoder {
  /// ISO 646, i.e. US-ASCII.
  Ascii,

  /// JIS X 0201 romaji in G0.
  JisX0201Romaji,

  /// JIS X 0201 half-width katakana in G1.
  JisX0201Katakana,

  /// ISO 8859-1 G1 codes, which map directly to Unicode codepoints.
  Latin1,

  /// ISO 8859-5 G1 codes (Cyrillic).
  Cyrillic,

  /// TIS 620-2533 G1 codes (Thai).
  Thai,

  /// A single-byte G1 table decoded via the named codec.
  SingleByteCodec { label: &'static str },

  /// Two-byte JIS X 0208 codes in G0.
  JisX0208,

  /// Two-byte JIS X 0212 codes in G0.
  JisX0212,

  /// Two-byte KS X 1001 codes in G1.
  KsX1001,

  /// Two-byte GB 2312 codes in G1.
  Gb2312,
}

/// The decoders for the character sets that are only usable standalone.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StandaloneDecoder {
  Utf8,
  Gb18030,
  Gbk,
}

impl CodeElementDecoder {
  /// Decodes one character. Single-byte decoders ignore `byte_1`.
  ///
  pub fn decode(&self, byte_0: u8, byte_1: u8) -> char {
    match self {
      Self::Ascii => utils::codepoint_to_char(u32::from(byte_0)),
      Self::JisX0201Romaji => single_byte::decode_jis_x_0201_romaji(byte_0),
      Self::JisX0201Katakana => {
        single_byte::decode_jis_x_0201_katakana(byte_0)
      }
      Self::Latin1 => single_byte::decode_latin_1(byte_0),
      Self::Cyrillic => single_byte::decode_cyrillic(byte_0),
      Self::Thai => single_byte::decode_thai(byte_0),
      Self::SingleByteCodec { label } => {
        multi_byte::decode_single_byte(label, byte_0)
      }
      Self::JisX0208 => multi_byte::decode_jis_x_0208(byte_0, byte_1),
      Self::JisX0212 => multi_byte::decode_jis_x_0212(byte_0, byte_1),
      Self::KsX1001 => multi_byte::decode_ks_x_1001(byte_0, byte_1),
      Self::Gb2312 => multi_byte::decode_gb_2312(byte_0, byte_1),
    }
  }
}

/// The G0 code element for ISO 646, which is the initial G0 designation for
/// all ISO 2022 compatible character sets.
///
pub static ISO_646_CODE_ELEMENT: CodeElement = CodeElement {
  escape_sequence: &[0x1B, 0x28, 0x42],
  region: CodeRegion::G0,
  char_size: 1,
  decoder: CodeElementDecoder::Ascii,
};

const fn single_byte_set(
  primary_term: &'static str,
  extension_term: &'static str,
  code_elements: &'static [CodeElement],
) -> CharacterSet {
  CharacterSet {
    primary_term: Some(primary_term),
    extension_term: Some(extension_term),
    code_elements,
    standalone: None,
  }
}

const fn g1_element(
  escape_sequence: &'static [u8],
  decoder: CodeElementDecoder,
) -> CodeElement {
  CodeElement {
    escape_sequence,
    region: CodeRegion::G1,
    char_size: 1,
    decoder,
  }
}

/// The default character repertoire, ISO-IR 6.
///
pub static ISO_IR_6: CharacterSet = CharacterSet {
  primary_term: Some("ISO_IR 6"),
  extension_term: Some("ISO 2022 IR 6"),
  code_elements: &[CodeElement {
    escape_sequence: &[0x1B, 0x28, 0x42],
    region: CodeRegion::G0,
    char_size: 1,
    decoder: CodeElementDecoder::Ascii,
  }],
  standalone: None,
};

pub static ISO_IR_13: CharacterSet = CharacterSet {
  primary_term: Some("ISO_IR 13"),
  extension_term: Some("ISO 2022 IR 13"),
  code_elements: &[
    CodeElement {
      escape_sequence: &[0x1B, 0x28, 0x4A],
      region: CodeRegion::G0,
      char_size: 1,
      decoder: CodeElementDecoder::JisX0201Romaji,
    },
    CodeElement {
      escape_sequence: &[0x1B, 0x29, 0x49],
      region: CodeRegion::G1,
      char_size: 1,
      decoder: CodeElementDecoder::JisX0201Katakana,
    },
  ],
  standalone: None,
};

pub static ISO_IR_100: CharacterSet = single_byte_set(
  "ISO_IR 100",
  "ISO 2022 IR 100",
  &[g1_element(&[0x1B, 0x2D, 0x41], CodeElementDecoder::Latin1)],
);

pub static ISO_IR_101: CharacterSet = single_byte_set(
  "ISO_IR 101",
  "ISO 2022 IR 101",
  &[g1_element(
    &[0x1B, 0x2D, 0x42],
    CodeElementDecoder::SingleByteCodec {
      label: "iso-8859-2",
    },
  )],
);

pub static ISO_IR_109: CharacterSet = single_byte_set(
  "ISO_IR 109",
  "ISO 2022 IR 109",
  &[g1_element(
    &[0x1B, 0x2D, 0x43],
    CodeElementDecoder::SingleByteCodec {
      label: "iso-8859-3",
    },
  )],
);

pub static ISO_IR_110: CharacterSet = single_byte_set(
  "ISO_IR 110",
  "ISO 2022 IR 110",
  &[g1_element(
    &[0x1B, 0x2D, 0x44],
    CodeElementDecoder::SingleByteCodec {
      label: "iso-8859-4",
    },
  )],
);

pub static ISO_IR_144: CharacterSet = single_byte_set(
  "ISO_IR 144",
  "ISO 2022 IR 144",
  &[g1_element(&[0x1B, 0x2D, 0x4C], CodeElementDecoder::Cyrillic)],
);

pub static ISO_IR_127: CharacterSet = single_byte_set(
  "ISO_IR 127",
  "ISO 2022 IR 127",
  &[g1_element(
    &[0x1B, 0x2D, 0x47],
    CodeElementDecoder::SingleByteCodec {
      label: "iso-8859-6",
    },
  )],
);

pub static ISO_IR_126: CharacterSet = single_byte_set(
  "ISO_IR 126",
  "ISO 2022 IR 126",
  &[g1_element(
    &[0x1B, 0x2D, 0x46],
    CodeElementDecoder::SingleByteCodec {
      label: "iso-8859-7",
    },
  )],
);

pub static ISO_IR_138: CharacterSet = single_byte_set(
  "ISO_IR 138",
  "ISO 2022 IR 138",
  &[g1_element(
    &[0x1B, 0x2D, 0x48],
    CodeElementDecoder::SingleByteCodec {
      label: "iso-8859-8",
    },
  )],
);

pub static ISO_IR_148: CharacterSet = single_byte_set(
  "ISO_IR 148",
  "ISO 2022 IR 148",
  &[g1_element(
    &[0x1B, 0x2D, 0x4D],
    CodeElementDecoder::SingleByteCodec {
      label: "iso-8859-9",
    },
  )],
);

pub static ISO_IR_166: CharacterSet = single_byte_set(
  "ISO_IR 166",
  "ISO 2022 IR 166",
  &[g1_element(&[0x1B, 0x2D, 0x54], CodeElementDecoder::Thai)],
);

/// JIS X 0208 (kanji), usable only via ISO 2022 code extensions.
///
pub static ISO_2022_IR_87: CharacterSet = CharacterSet {
  primary_term: None,
  extension_term: Some("ISO 2022 IR 87"),
  code_elements: &[CodeElement {
    escape_sequence: &[0x1B, 0x24, 0x42],
    region: CodeRegion::G0,
    char_size: 2,
    decoder: CodeElementDecoder::JisX0208,
  }],
  standalone: None,
};

/// JIS X 0212 (supplementary kanji), usable only via ISO 2022 code
/// extensions.
///
pub static ISO_2022_IR_159: CharacterSet = CharacterSet {
  primary_term: None,
  extension_term: Some("ISO 2022 IR 159"),
  code_elements: &[CodeElement {
    escape_sequence: &[0x1B, 0x24, 0x28, 0x44],
    region: CodeRegion::G0,
    char_size: 2,
    decoder: CodeElementDecoder::JisX0212,
  }],
  standalone: None,
};

/// KS X 1001 (Korean), usable only via ISO 2022 code extensions.
///
pub static ISO_2022_IR_149: CharacterSet = CharacterSet {
  primary_term: None,
  extension_term: Some("ISO 2022 IR 149"),
  code_elements: &[CodeElement {
    escape_sequence: &[0x1B, 0x24, 0x29, 0x43],
    region: CodeRegion::G1,
    char_size: 2,
    decoder: CodeElementDecoder::KsX1001,
  }],
  standalone: None,
};

/// GB 2312 (simplified Chinese), usable only via ISO 2022 code extensions.
///
pub static ISO_2022_IR_58: CharacterSet = CharacterSet {
  primary_term: None,
  extension_term: Some("ISO 2022 IR 58"),
  code_elements: &[CodeElement {
    escape_sequence: &[0x1B, 0x24, 0x29, 0x41],
    region: CodeRegion::G1,
    char_size: 2,
    decoder: CodeElementDecoder::Gb2312,
  }],
  standalone: None,
};

/// Unicode in UTF-8. Must not be combined with code extensions.
///
pub static ISO_IR_192: CharacterSet = CharacterSet {
  primary_term: Some("ISO_IR 192"),
  extension_term: None,
  code_elements: &[],
  standalone: Some(StandaloneDecoder::Utf8),
};

/// GB 18030. Must not be combined with code extensions.
///
pub static GB_18030: CharacterSet = CharacterSet {
  primary_term: Some("GB18030"),
  extension_term: None,
  code_elements: &[],
  standalone: Some(StandaloneDecoder::Gb18030),
};

/// GBK. Must not be combined with code extensions.
///
pub static GBK: CharacterSet = CharacterSet {
  primary_term: Some("GBK"),
  extension_term: None,
  code_elements: &[],
  standalone: Some(StandaloneDecoder::Gbk),
};

/// All supported character sets.
///
pub static ALL_CHARACTER_SETS: [&CharacterSet; 19] = [
  &ISO_IR_6,
  &ISO_IR_13,
  &ISO_IR_100,
  &ISO_IR_101,
  &ISO_IR_109,
  &ISO_IR_110,
  &ISO_IR_144,
  &ISO_IR_127,
  &ISO_IR_126,
  &ISO_IR_138,
  &ISO_IR_148,
  &ISO_IR_166,
  &ISO_2022_IR_87,
  &ISO_2022_IR_159,
  &ISO_2022_IR_149,
  &ISO_2022_IR_58,
  &ISO_IR_192,
  &GB_18030,
  &GBK,
];
