/// The Unicode replacement character, emitted when bytes can't be decoded.
///
pub const REPLACEMENT_CHARACTER: char = '\u{FFFD}';

/// Converts a codepoint to a `char`, returning the replacement character for
/// codepoints that aren't valid Unicode scalar values.
///
pub fn codepoint_to_char(codepoint: u32) -> char {
  char::from_u32(codepoint).unwrap_or(REPLACEMENT_CHARACTER)
}
