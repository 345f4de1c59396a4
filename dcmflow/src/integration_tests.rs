//! End-to-end tests that exercise reading, writing, and pixel data handling
//! through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use dcmflow_core::{
  DataElementTag, DataElementValue, DataSet, RcByteSlice,
  ValueRepresentation, dictionary, transfer_syntax,
};
use dcmflow_p10::{
  DataSetP10Extensions, DecodeStrictness, IssueKind, LargeValueHandling,
  P10Error, P10Issue, P10ReadConfig, P10ReadContext, P10WriteConfig,
  SequenceFraming,
};
use dcmflow_pixel_data::{
  ChromaSubsampling, EncodeOptions, PixelDataReader, encode_pixel_data,
};

use dcmflow_p10::DataSetBuilder;

/// Serializes an explicit VR little endian data element with a 16-bit
/// length field.
///
fn explicit_element(
  group: u16,
  element: u16,
  vr: &[u8; 2],
  value: &[u8],
) -> Vec<u8> {
  let mut bytes = vec![];
  bytes.extend_from_slice(&group.to_le_bytes());
  bytes.extend_from_slice(&element.to_le_bytes());
  bytes.extend_from_slice(vr);
  bytes.extend_from_slice(&(value.len() as u16).to_le_bytes());
  bytes.extend_from_slice(value);
  bytes
}

/// Serializes an implicit VR little endian data element.
///
fn implicit_element(
  group: u16,
  element: u16,
  length: u32,
  value: &[u8],
) -> Vec<u8> {
  let mut bytes = vec![];
  bytes.extend_from_slice(&group.to_le_bytes());
  bytes.extend_from_slice(&element.to_le_bytes());
  bytes.extend_from_slice(&length.to_le_bytes());
  bytes.extend_from_slice(value);
  bytes
}

/// Builds a complete DICOM P10 file: the preamble, 'DICM' prefix, File Meta
/// Information declaring the given transfer syntax, and the main data set.
///
fn p10_file(transfer_syntax_uid: &str, main_data_set: &[u8]) -> Vec<u8> {
  let mut uid_bytes = transfer_syntax_uid.as_bytes().to_vec();
  if uid_bytes.len() % 2 == 1 {
    uid_bytes.push(0);
  }

  let uid_element = explicit_element(0x0002, 0x0010, b"UI", &uid_bytes);

  let mut bytes = vec![0u8; 128];
  bytes.extend_from_slice(b"DICM");
  bytes.extend_from_slice(&explicit_element(
    0x0002,
    0x0000,
    b"UL",
    &(uid_element.len() as u32).to_le_bytes(),
  ));
  bytes.extend_from_slice(&uid_element);
  bytes.extend_from_slice(main_data_set);

  bytes
}

fn read(bytes: Vec<u8>) -> DataSet {
  dcmflow_p10::read_bytes(bytes.into(), None)
    .map_err(|e| e.0)
    .unwrap()
}

fn write(data_set: &DataSet, config: Option<P10WriteConfig>) -> Vec<u8> {
  let mut bytes = vec![];

  data_set
    .to_p10_bytes(
      &mut |chunk: RcByteSlice| {
        bytes.extend_from_slice(&chunk);
        Ok(())
      },
      config,
    )
    .unwrap();

  bytes
}

/// Returns the main data set elements, excluding File Meta Information, as
/// comparable (tag, VR, bytes) triples.
///
fn main_elements(
  data_set: &DataSet,
) -> Vec<(DataElementTag, ValueRepresentation, Vec<u8>)> {
  data_set
    .iter()
    .filter(|(tag, _)| !tag.is_file_meta_information())
    .map(|(tag, value)| {
      (
        *tag,
        value.value_representation(),
        value.bytes().map(|b| b.to_vec()).unwrap_or_default(),
      )
    })
    .collect()
}

#[test]
fn minimal_implicit_data_set_without_header_test() {
  let mut bytes = vec![];
  bytes.extend_from_slice(&implicit_element(0x0008, 0x0060, 2, b"CT"));

  let data_set = read(bytes);

  assert_eq!(data_set.len(), 1);

  let value = data_set.get_value(dictionary::MODALITY.tag).unwrap();
  assert_eq!(value.value_representation(), ValueRepresentation::CodeString);
  assert_eq!(value.get_string(), Ok("CT"));
}

#[test]
fn explicit_le_single_string_test() {
  let bytes = p10_file(
    "1.2.840.10008.1.2.1",
    &explicit_element(0x0010, 0x0010, b"PN", b"Doe^John"),
  );

  let data_set = read(bytes);

  assert_eq!(main_elements(&data_set).len(), 1);

  let value = data_set.get_value(dictionary::PATIENT_NAME.tag).unwrap();
  assert_eq!(value.value_representation(), ValueRepresentation::PersonName);
  assert_eq!(value.get_string(), Ok("Doe^John"));
}

#[test]
fn undefined_length_sequence_test() {
  let mut sequence = vec![];

  // Sequence with undefined length
  sequence.extend_from_slice(&[0x40, 0x00, 0x30, 0xA7]);
  sequence.extend_from_slice(b"SQ\0\0");
  sequence.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());

  for name in [&b"One "[..], &b"Two "[..]] {
    // Item with undefined length
    sequence.extend_from_slice(&implicit_element(0xFFFE, 0xE000, 0xFFFF_FFFF, &[]));
    sequence.extend_from_slice(&explicit_element(0x0008, 0x103E, b"LO", name));

    // Item delimitation item
    sequence.extend_from_slice(&implicit_element(0xFFFE, 0xE00D, 0, &[]));
  }

  // Sequence delimitation item
  sequence.extend_from_slice(&implicit_element(0xFFFE, 0xE0DD, 0, &[]));

  let data_set = read(p10_file("1.2.840.10008.1.2.1", &sequence));

  let items = data_set
    .get_sequence_items(dictionary::CONTENT_SEQUENCE.tag)
    .unwrap();

  assert_eq!(items.len(), 2);
  assert_eq!(
    items[0].get_string(dictionary::SERIES_DESCRIPTION.tag),
    Ok("One")
  );
  assert_eq!(
    items[1].get_string(dictionary::SERIES_DESCRIPTION.tag),
    Ok("Two")
  );
}

#[test]
fn fragmented_pixel_data_test() {
  let fragment = vec![0x42u8; 1024];

  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x0028, 0x0002, b"US", &[1, 0]));
  main.extend_from_slice(&explicit_element(
    0x0028,
    0x0004,
    b"CS",
    b"MONOCHROME2 ",
  ));
  main.extend_from_slice(&explicit_element(0x0028, 0x0010, b"US", &[32, 0]));
  main.extend_from_slice(&explicit_element(0x0028, 0x0011, b"US", &[32, 0]));
  main.extend_from_slice(&explicit_element(0x0028, 0x0100, b"US", &[8, 0]));
  main.extend_from_slice(&explicit_element(0x0028, 0x0103, b"US", &[0, 0]));

  // Pixel data with undefined length: empty offset table item, one
  // fragment, then the sequence delimitation item
  main.extend_from_slice(&[0xE0, 0x7F, 0x10, 0x00]);
  main.extend_from_slice(b"OB\0\0");
  main.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
  main.extend_from_slice(&implicit_element(0xFFFE, 0xE000, 0, &[]));
  main.extend_from_slice(&implicit_element(0xFFFE, 0xE000, 1024, &fragment));
  main.extend_from_slice(&implicit_element(0xFFFE, 0xE0DD, 0, &[]));

  let data_set = read(p10_file("1.2.840.10008.1.2.5", &main));

  let items = data_set
    .get_value(dictionary::PIXEL_DATA.tag)
    .unwrap()
    .encapsulated_pixel_data()
    .unwrap();

  assert_eq!(items.len(), 2);
  assert!(items[0].is_empty());
  assert_eq!(items[1].len(), 1024);

  let reader = PixelDataReader::from_data_set(&data_set).unwrap();
  assert!(reader.is_encapsulated());

  let frame = reader.frame(0).unwrap();
  assert!(!frame.is_empty());
  assert_eq!(frame.len(), 1024);
  assert_eq!(&*frame.to_bytes(), fragment.as_slice());
}

#[test]
fn strip_private_tags_test() {
  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x0010, 0x0020, b"LO", b"P001"));
  main.extend_from_slice(&explicit_element(0x0019, 0x0010, b"LO", b"ACME"));
  main.extend_from_slice(&explicit_element(
    0x0019,
    0x1005,
    b"LO",
    b"Payload ",
  ));

  let mut data_set = read(p10_file("1.2.840.10008.1.2.1", &main));

  assert_eq!(
    data_set.private_creator_for_tag(DataElementTag::new(0x0019, 0x1005)),
    Some("ACME")
  );

  data_set.strip_private_tags();

  let elements = main_elements(&data_set);
  assert_eq!(elements.len(), 1);
  assert_eq!(elements[0].0, dictionary::PATIENT_ID.tag);
  assert_eq!(
    data_set.get_string(dictionary::PATIENT_ID.tag),
    Ok("P001")
  );

  assert_eq!(
    data_set.private_creator_for_tag(DataElementTag::new(0x0019, 0x1005)),
    None
  );
  assert!(data_set.find_orphan_private_elements().is_empty());
}

#[test]
fn context_dependent_vr_test() {
  for (pixel_representation, expected_vr) in [
    (0u8, ValueRepresentation::UnsignedShort),
    (1u8, ValueRepresentation::SignedShort),
  ] {
    let mut bytes = vec![];
    bytes.extend_from_slice(&implicit_element(0x0028, 0x0100, 2, &[8, 0]));
    bytes.extend_from_slice(&implicit_element(
      0x0028,
      0x0103,
      2,
      &[pixel_representation, 0],
    ));
    bytes.extend_from_slice(&implicit_element(0x0028, 0x0106, 2, &[0xF0, 0xFF]));

    let data_set = read(bytes);

    let value = data_set
      .get_value(dictionary::SMALLEST_IMAGE_PIXEL_VALUE.tag)
      .unwrap();

    assert_eq!(value.value_representation(), expected_vr);
    assert_eq!(&**value.bytes().unwrap(), &[0xF0, 0xFF]);
  }
}

#[test]
fn lut_descriptor_first_value_is_always_unsigned_test() {
  let mut bytes = vec![];
  bytes.extend_from_slice(&implicit_element(0x0028, 0x0103, 2, &[1, 0]));
  bytes.extend_from_slice(&implicit_element(
    0x0028,
    0x1101,
    6,
    // 40960 entries, first input value -1024, 16 bits per entry
    &[0x00, 0xA0, 0x00, 0xFC, 0x10, 0x00],
  ));

  let data_set = read(bytes);

  let value = data_set
    .get_value(dictionary::RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag)
    .unwrap();

  assert_eq!(
    value.value_representation(),
    ValueRepresentation::SignedShort
  );
  assert_eq!(value.get_lookup_table_descriptor(), Ok((40960, -1024, 16)));
}

#[test]
fn round_trip_preserves_elements_test() {
  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x0008, 0x0060, b"CS", b"MR"));
  main.extend_from_slice(&explicit_element(0x0010, 0x0010, b"PN", b"Doe^John"));
  main.extend_from_slice(&explicit_element(0x0010, 0x1010, b"AS", b"045Y"));
  main.extend_from_slice(&explicit_element(
    0x0028,
    0x0010,
    b"US",
    &[0x00, 0x02],
  ));

  let original = read(p10_file("1.2.840.10008.1.2.1", &main));

  let written = write(&original, None);
  let re_read = read(written);

  assert_eq!(main_elements(&original), main_elements(&re_read));
}

#[test]
fn round_trip_with_sequences_test() {
  let mut item = DataSet::new();
  item
    .insert_string_value(&dictionary::MODALITY, &["US"])
    .unwrap();

  let mut nested_item = DataSet::new();
  nested_item
    .insert_string_value(&dictionary::SERIES_DESCRIPTION, &["Nested"])
    .unwrap();
  item.insert(
    dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
    DataElementValue::new_sequence(vec![nested_item]),
  );

  let mut original = DataSet::new();
  original
    .insert_string_value(
      &dictionary::TRANSFER_SYNTAX_UID,
      &[transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN.uid],
    )
    .unwrap();
  original
    .insert_string_value(&dictionary::PATIENT_ID, &["P002"])
    .unwrap();
  original.insert(
    dictionary::CONTENT_SEQUENCE.tag,
    DataElementValue::new_sequence(vec![item]),
  );

  for framing in [
    SequenceFraming::UndefinedLength,
    SequenceFraming::DefinedLength,
  ] {
    let config = P10WriteConfig::default().sequence_framing(framing);

    let re_read = read(write(&original, Some(config)));

    let items = re_read
      .get_sequence_items(dictionary::CONTENT_SEQUENCE.tag)
      .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get_string(dictionary::MODALITY.tag), Ok("US"));

    let nested = items[0]
      .get_sequence_items(dictionary::REFERENCED_IMAGE_SEQUENCE.tag)
      .unwrap();
    assert_eq!(
      nested[0].get_string(dictionary::SERIES_DESCRIPTION.tag),
      Ok("Nested")
    );
  }
}

#[test]
fn resumable_at_every_split_point_test() {
  let mut sequence = vec![];
  sequence.extend_from_slice(&[0x40, 0x00, 0x30, 0xA7]);
  sequence.extend_from_slice(b"SQ\0\0");
  sequence.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
  sequence.extend_from_slice(&implicit_element(0xFFFE, 0xE000, 0xFFFF_FFFF, &[]));
  sequence.extend_from_slice(&explicit_element(0x0008, 0x0060, b"CS", b"MR"));
  sequence.extend_from_slice(&implicit_element(0xFFFE, 0xE00D, 0, &[]));
  sequence.extend_from_slice(&implicit_element(0xFFFE, 0xE0DD, 0, &[]));

  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x0008, 0x0060, b"CS", b"CT"));
  main.extend_from_slice(&sequence);
  main.extend_from_slice(&explicit_element(0x0010, 0x0020, b"LO", b"P003"));

  let bytes = p10_file("1.2.840.10008.1.2.1", &main);

  let expected = read(bytes.clone());

  for split_at in 1..bytes.len() {
    let mut context = P10ReadContext::new(None);
    let mut builder = DataSetBuilder::new();

    context
      .write_bytes(bytes[..split_at].to_vec().into(), false)
      .unwrap();

    let mut wrote_second_chunk = false;

    let data_set = loop {
      match context.read_tokens() {
        Ok(tokens) => {
          for token in tokens {
            builder.add_token(&token).unwrap();
          }

          if let Ok(data_set) = builder.final_data_set() {
            break data_set;
          }
        }

        Err(P10Error::DataRequired { .. }) => {
          assert!(
            !wrote_second_chunk,
            "Reader required data past the end at split {}",
            split_at
          );

          context
            .write_bytes(bytes[split_at..].to_vec().into(), true)
            .unwrap();
          wrote_second_chunk = true;
        }

        Err(e) => panic!("Read failed at split {}: {}", split_at, e),
      }
    };

    assert_eq!(
      main_elements(&expected),
      main_elements(&data_set),
      "Split at {} produced a different data set",
      split_at
    );
  }
}

#[test]
fn tags_enumerate_in_ascending_order_test() {
  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x0008, 0x0060, b"CS", b"CT"));
  main.extend_from_slice(&explicit_element(0x0010, 0x0020, b"LO", b"P001"));
  main.extend_from_slice(&explicit_element(0x0028, 0x0010, b"US", &[1, 0]));

  let data_set = read(p10_file("1.2.840.10008.1.2.1", &main));

  let tags = data_set.tags();
  for window in tags.windows(2) {
    assert!(window[0] < window[1]);
  }
}

#[test]
fn nesting_depth_limit_test() {
  let mut bytes = vec![];

  for _ in 0..8 {
    bytes.extend_from_slice(&implicit_element(0x0040, 0xA730, 0xFFFF_FFFF, &[]));
    bytes.extend_from_slice(&implicit_element(0xFFFE, 0xE000, 0xFFFF_FFFF, &[]));
  }

  let config = P10ReadConfig::default().max_sequence_depth(4);

  let result = dcmflow_p10::read_bytes(bytes.into(), Some(config));

  assert!(matches!(
    result,
    Err((P10Error::MaximumExceeded { .. }, _))
  ));
}

#[test]
fn character_encoding_is_inherited_by_items_test() {
  let mut bytes = vec![];

  // The Latin-1 character set applies to the root data set and is
  // inherited by the sequence item, which doesn't declare its own
  bytes.extend_from_slice(&implicit_element(0x0008, 0x0005, 10, b"ISO_IR 100"));
  bytes.extend_from_slice(&implicit_element(0x0040, 0xA730, 0xFFFF_FFFF, &[]));
  bytes.extend_from_slice(&implicit_element(0xFFFE, 0xE000, 0xFFFF_FFFF, &[]));
  bytes.extend_from_slice(&implicit_element(0x0010, 0x0010, 2, &[0xE9, 0x20]));
  bytes.extend_from_slice(&implicit_element(0xFFFE, 0xE00D, 0, &[]));
  bytes.extend_from_slice(&implicit_element(0xFFFE, 0xE0DD, 0, &[]));

  let data_set = read(bytes);

  // The character set element is rewritten to declare UTF-8 as all string
  // values were converted
  assert_eq!(
    data_set.get_string(dictionary::SPECIFIC_CHARACTER_SET.tag),
    Ok("ISO_IR 192")
  );

  let items = data_set
    .get_sequence_items(dictionary::CONTENT_SEQUENCE.tag)
    .unwrap();

  assert_eq!(items[0].get_string(dictionary::PATIENT_NAME.tag), Ok("é"));
}

#[test]
fn owned_data_set_outlives_input_buffer_test() {
  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x7FE0, 0x0008, b"OF", &[0; 16]));

  let data_set = read(p10_file("1.2.840.10008.1.2.1", &main));

  let owned = data_set.to_owned();
  drop(data_set);

  assert_eq!(
    owned
      .get_value(dictionary::FLOAT_PIXEL_DATA.tag)
      .unwrap()
      .bytes()
      .unwrap()
      .len(),
    16
  );
}

#[test]
fn strict_mode_requires_dicm_prefix_test() {
  let bytes = implicit_element(0x0008, 0x0060, 2, b"CT");

  let config =
    P10ReadConfig::default().strictness(DecodeStrictness::Strict);

  let result = dcmflow_p10::read_bytes(bytes.into(), Some(config));

  assert!(matches!(
    result,
    Err((P10Error::DicmPrefixNotPresent, _))
  ));
}

#[test]
fn truncated_value_recovers_in_lenient_mode_test() {
  // Declares an 8-byte value but only two bytes follow
  let mut bytes = vec![];
  bytes.extend_from_slice(&implicit_element(0x0008, 0x0060, 8, b"CT"));

  let issues: Rc<RefCell<Vec<P10Issue>>> = Rc::default();

  let issues_clone = issues.clone();
  let config = P10ReadConfig::default().issue_callback(Rc::new(
    move |issue: &P10Issue| {
      issues_clone.borrow_mut().push(issue.clone());
    },
  ));

  let data_set = dcmflow_p10::read_bytes(bytes.into(), Some(config))
    .map_err(|e| e.0)
    .unwrap();

  assert_eq!(data_set.get_string(dictionary::MODALITY.tag), Ok("CT"));

  assert!(
    issues
      .borrow()
      .iter()
      .any(|issue| issue.kind == IssueKind::TruncatedValue)
  );
}

#[test]
fn orphan_private_data_is_reported_test() {
  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x0019, 0x1005, b"LO", b"Orphan"));

  let issues: Rc<RefCell<Vec<P10Issue>>> = Rc::default();

  let issues_clone = issues.clone();
  let config = P10ReadConfig::default().issue_callback(Rc::new(
    move |issue: &P10Issue| {
      issues_clone.borrow_mut().push(issue.clone());
    },
  ));

  let data_set = dcmflow_p10::read_bytes(
    p10_file("1.2.840.10008.1.2.1", &main).into(),
    Some(config),
  )
  .map_err(|e| e.0)
  .unwrap();

  // The orphan is reported but still read
  assert!(data_set.contains(DataElementTag::new(0x0019, 0x1005)));
  assert!(
    issues
      .borrow()
      .iter()
      .any(|issue| issue.kind == IssueKind::OrphanPrivateData)
  );
}

#[test]
fn skip_large_values_test() {
  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x0008, 0x0060, b"CS", b"CT"));

  // A 512-byte OB value that exceeds the configured threshold
  let mut pixel_element = vec![0xE0, 0x7F, 0x10, 0x00];
  pixel_element.extend_from_slice(b"OB\0\0");
  pixel_element.extend_from_slice(&512u32.to_le_bytes());
  pixel_element.extend_from_slice(&[7u8; 512]);
  main.extend_from_slice(&pixel_element);

  let config = P10ReadConfig::default()
    .large_value_threshold(256)
    .large_value_handling(LargeValueHandling::Skip);

  let data_set = dcmflow_p10::read_bytes(
    p10_file("1.2.840.10008.1.2.1", &main).into(),
    Some(config),
  )
  .map_err(|e| e.0)
  .unwrap();

  assert_eq!(data_set.get_string(dictionary::MODALITY.tag), Ok("CT"));
  assert!(!data_set.contains(dictionary::PIXEL_DATA.tag));
}

#[cfg(feature = "std")]
#[test]
fn lazy_load_large_values_from_file_test() {
  let mut main = vec![];
  main.extend_from_slice(&explicit_element(0x0008, 0x0060, b"CS", b"CT"));

  let pixel_bytes: Vec<u8> = (0..512).map(|i| (i % 251) as u8).collect();

  let mut pixel_element = vec![0xE0, 0x7F, 0x10, 0x00];
  pixel_element.extend_from_slice(b"OB\0\0");
  pixel_element.extend_from_slice(&512u32.to_le_bytes());
  pixel_element.extend_from_slice(&pixel_bytes);
  main.extend_from_slice(&pixel_element);

  let file = tempfile::NamedTempFile::new().unwrap();
  std::fs::write(file.path(), p10_file("1.2.840.10008.1.2.1", &main))
    .unwrap();

  let config = P10ReadConfig::default()
    .large_value_threshold(256)
    .large_value_handling(LargeValueHandling::LazyLoad);

  let data_set = dcmflow_p10::read_file(file.path(), Some(config)).unwrap();

  let value = data_set.get_value(dictionary::PIXEL_DATA.tag).unwrap();
  assert!(value.is_lazy());

  let loaded = value.load().unwrap();
  assert_eq!(&**loaded.bytes().unwrap(), pixel_bytes.as_slice());
}

#[test]
fn deflated_transfer_syntax_round_trip_test() {
  let mut original = DataSet::new();
  original
    .insert_string_value(
      &dictionary::TRANSFER_SYNTAX_UID,
      &[transfer_syntax::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN.uid],
    )
    .unwrap();
  original
    .insert_string_value(&dictionary::MODALITY, &["CR"])
    .unwrap();
  original
    .insert_string_value(&dictionary::PATIENT_ID, &["P004"])
    .unwrap();

  let bytes = write(&original, None);
  let re_read = read(bytes);

  assert_eq!(re_read.get_string(dictionary::MODALITY.tag), Ok("CR"));
  assert_eq!(re_read.get_string(dictionary::PATIENT_ID.tag), Ok("P004"));
}

#[test]
fn jpeg_baseline_gradient_round_trip_test() {
  let size = 32u16;

  let raw: Vec<u8> = (0..u32::from(size) * u32::from(size))
    .map(|i| {
      let x = i % u32::from(size);
      let y = i / u32::from(size);
      ((x + y) % 256) as u8
    })
    .collect();

  let mut data_set = DataSet::new();
  data_set
    .insert_int_value(&dictionary::SAMPLES_PER_PIXEL, &[1])
    .unwrap();
  data_set
    .insert_string_value(
      &dictionary::PHOTOMETRIC_INTERPRETATION,
      &["MONOCHROME2"],
    )
    .unwrap();
  data_set
    .insert_int_value(&dictionary::ROWS, &[i64::from(size)])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::COLUMNS, &[i64::from(size)])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::BITS_ALLOCATED, &[8])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::BITS_STORED, &[8])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::HIGH_BIT, &[7])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::PIXEL_REPRESENTATION, &[0])
    .unwrap();
  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_other_byte_string(raw.clone()).unwrap(),
  );

  encode_pixel_data(
    &mut data_set,
    &transfer_syntax::JPEG_BASELINE_8BIT,
    &EncodeOptions {
      quality: 90,
      chroma_subsampling: ChromaSubsampling::None,
    },
  )
  .unwrap();

  // The encoded fragment is a complete JPEG stream
  let items = data_set
    .get_value(dictionary::PIXEL_DATA.tag)
    .unwrap()
    .encapsulated_pixel_data()
    .unwrap();
  let fragment = &items[1];
  assert_eq!(&fragment[0..2], &[0xFF, 0xD8]);
  assert_eq!(&fragment[fragment.len() - 2..], &[0xFF, 0xD9]);

  // Entropy-coded output never contains 0xFF without a following 0x00,
  // other than at marker boundaries
  let scan_start = fragment
    .windows(2)
    .position(|w| w == [0xFF, 0xDA])
    .unwrap();
  for i in scan_start + 10..fragment.len() - 2 {
    if fragment[i] == 0xFF {
      assert_eq!(fragment[i + 1], 0x00);
    }
  }

  // Round trip through DICOM P10 bytes and decode
  let re_read = read(write(&data_set, None));

  let reader = PixelDataReader::from_data_set(&re_read).unwrap();
  let decoded = reader.decode_frame(0).unwrap();

  assert_eq!(decoded.len(), raw.len());

  let mean_squared_error: f64 = raw
    .iter()
    .zip(decoded.iter())
    .map(|(a, b)| {
      let diff = f64::from(*a) - f64::from(*b);
      diff * diff
    })
    .sum::<f64>()
    / raw.len() as f64;

  let psnr = 10.0 * (255.0f64 * 255.0 / mean_squared_error).log10();
  assert!(psnr > 30.0, "PSNR {} is too low", psnr);
}

#[test]
fn multi_frame_offset_table_is_monotonic_test() {
  let size = 16u16;
  let number_of_frames = 3usize;

  let raw = vec![100u8; usize::from(size) * usize::from(size) * number_of_frames];

  let mut data_set = DataSet::new();
  data_set
    .insert_int_value(&dictionary::SAMPLES_PER_PIXEL, &[1])
    .unwrap();
  data_set
    .insert_string_value(
      &dictionary::PHOTOMETRIC_INTERPRETATION,
      &["MONOCHROME2"],
    )
    .unwrap();
  data_set
    .insert_int_value(&dictionary::NUMBER_OF_FRAMES, &[3])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::ROWS, &[i64::from(size)])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::COLUMNS, &[i64::from(size)])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::BITS_ALLOCATED, &[8])
    .unwrap();
  data_set
    .insert_int_value(&dictionary::PIXEL_REPRESENTATION, &[0])
    .unwrap();
  data_set.insert(
    dictionary::PIXEL_DATA.tag,
    DataElementValue::new_other_byte_string(raw).unwrap(),
  );

  encode_pixel_data(
    &mut data_set,
    &transfer_syntax::RLE_LOSSLESS,
    &EncodeOptions::default(),
  )
  .unwrap();

  let re_read = read(write(&data_set, None));

  let items = re_read
    .get_value(dictionary::PIXEL_DATA.tag)
    .unwrap()
    .encapsulated_pixel_data()
    .unwrap();

  // Offset table entries are non-decreasing, and the final entry plus the
  // final fragment's item accounts for the total fragment span
  let offset_table: Vec<u32> = items[0]
    .chunks_exact(4)
    .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    .collect();

  assert_eq!(offset_table.len(), 3);
  assert!(offset_table.windows(2).all(|w| w[0] <= w[1]));

  let total_span: u32 =
    items[1..].iter().map(|item| 8 + item.len() as u32).sum();
  assert_eq!(
    offset_table[2] + 8 + items[3].len() as u32,
    total_span
  );

  // Each frame decodes back to its original contents
  let reader = PixelDataReader::from_data_set(&re_read).unwrap();
  for frame_index in 0..3 {
    let decoded = reader.decode_frame(frame_index).unwrap();
    assert_eq!(decoded, vec![100u8; usize::from(size) * usize::from(size)]);
  }
}

#[test]
fn rle_lossless_codec_is_lossless_test() {
  use dcmflow_pixel_data::PixelDataCodec;
  use rand::{Rng, SeedableRng};

  let mut rng = rand::rngs::SmallRng::seed_from_u64(42);

  let definition = dcmflow_pixel_data::PixelDataDefinition {
    samples_per_pixel: 1,
    photometric_interpretation:
      dcmflow_pixel_data::PhotometricInterpretation::Monochrome2,
    planar_configuration:
      dcmflow_pixel_data::PlanarConfiguration::Interleaved,
    rows: 16,
    columns: 16,
    bits_allocated: dcmflow_pixel_data::BitsAllocated::Sixteen,
    pixel_representation:
      dcmflow_pixel_data::PixelRepresentation::Unsigned,
    number_of_frames: 1,
  };

  let raw: Vec<u8> = (0..16 * 16 * 2).map(|_| rng.r#gen::<u8>()).collect();

  let codec = dcmflow_pixel_data::RleLosslessCodec;
  assert!(codec.is_lossless());

  let encoded = codec
    .encode_frames(&raw, &definition, &EncodeOptions::default())
    .unwrap();

  let mut decoded = vec![];
  codec
    .decode_frame(&encoded.fragments[0], &definition, 0, &mut decoded)
    .unwrap();

  assert_eq!(decoded, raw);
}
