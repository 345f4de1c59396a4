//! A DICOM data set: an ordered mapping from data element tags to data
//! element values.

#[cfg(feature = "std")]
use std::collections::BTreeMap;

#[cfg(not(feature = "std"))]
use alloc::{
  collections::BTreeMap,
  format,
  string::{String, ToString},
  vec,
  vec::Vec,
};

use crate::{
  DataElementTag, DataElementValue, DataError, ValueRepresentation,
  data_element_value::{StructuredDate, StructuredTime},
  dictionary,
};

/// A DICOM data set that is a mapping of data element tags to data element
/// values. Iteration yields data elements in ascending tag order.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSet(BTreeMap<DataElementTag, DataElementValue>);

impl DataSet {
  /// Creates a new empty data set.
  ///
  pub fn new() -> Self {
    Self(BTreeMap::new())
  }

  /// Returns the number of data elements in the data set.
  ///
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Returns whether the data set is empty.
  ///
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Removes all data elements from the data set.
  ///
  pub fn clear(&mut self) {
    self.0.clear();
  }

  /// Returns whether the data set contains the given tag.
  ///
  pub fn contains(&self, tag: DataElementTag) -> bool {
    self.0.contains_key(&tag)
  }

  /// Returns the tags of all data elements in the data set, in ascending
  /// order.
  ///
  pub fn tags(&self) -> Vec<DataElementTag> {
    self.0.keys().copied().collect()
  }

  /// Returns an iterator over the data elements in the data set, in
  /// ascending tag order.
  ///
  pub fn iter(
    &self,
  ) -> impl Iterator<Item = (&DataElementTag, &DataElementValue)> {
    self.0.iter()
  }

  /// Inserts a data element into the data set, replacing any existing data
  /// element with the same tag.
  ///
  pub fn insert(&mut self, tag: DataElementTag, value: DataElementValue) {
    self.0.insert(tag, value);
  }

  /// Builds a string data element value for the given dictionary item and
  /// inserts it into the data set.
  ///
  pub fn insert_string_value(
    &mut self,
    item: &dictionary::Item,
    value: &[&str],
  ) -> Result<(), DataError> {
    let vr = item.vrs.first().copied().unwrap_or(ValueRepresentation::Unknown);

    let value = match vr {
      ValueRepresentation::ApplicationEntity => {
        DataElementValue::new_application_entity(value.first().unwrap_or(&""))
      }
      ValueRepresentation::CodeString => {
        DataElementValue::new_code_string(value)
      }
      ValueRepresentation::LongString => {
        DataElementValue::new_long_string(value)
      }
      ValueRepresentation::LongText => {
        DataElementValue::new_long_text(value.first().unwrap_or(&""))
      }
      ValueRepresentation::PersonName => {
        DataElementValue::new_person_name(value)
      }
      ValueRepresentation::ShortString => {
        DataElementValue::new_short_string(value)
      }
      ValueRepresentation::ShortText => {
        DataElementValue::new_short_text(value.first().unwrap_or(&""))
      }
      ValueRepresentation::UniqueIdentifier => {
        DataElementValue::new_unique_identifier(value)
      }
      ValueRepresentation::UnlimitedText => {
        DataElementValue::new_unlimited_text(value.first().unwrap_or(&""))
      }
      _ => Err(DataError::new_value_invalid(format!(
        "VR '{}' of '{}' is not a string VR",
        vr, item.keyword
      ))),
    }?;

    self.insert(item.tag, value);

    Ok(())
  }

  /// Builds an integer data element value for the given dictionary item and
  /// inserts it into the data set.
  ///
  pub fn insert_int_value(
    &mut self,
    item: &dictionary::Item,
    value: &[i64],
  ) -> Result<(), DataError> {
    let vr = item.vrs.first().copied().unwrap_or(ValueRepresentation::Unknown);

    let out_of_range_error = || {
      DataError::new_value_invalid(format!(
        "Value out of range for VR '{}' of '{}'",
        vr, item.keyword
      ))
    };

    let value = match vr {
      ValueRepresentation::IntegerString => {
        let ints = value
          .iter()
          .map(|i| i32::try_from(*i).map_err(|_| out_of_range_error()))
          .collect::<Result<Vec<i32>, DataError>>()?;

        DataElementValue::new_integer_string(&ints)
      }
      ValueRepresentation::SignedLong => {
        let ints = value
          .iter()
          .map(|i| i32::try_from(*i).map_err(|_| out_of_range_error()))
          .collect::<Result<Vec<i32>, DataError>>()?;

        DataElementValue::new_signed_long(&ints)
      }
      ValueRepresentation::SignedShort => {
        let ints = value
          .iter()
          .map(|i| i16::try_from(*i).map_err(|_| out_of_range_error()))
          .collect::<Result<Vec<i16>, DataError>>()?;

        DataElementValue::new_signed_short(&ints)
      }
      ValueRepresentation::UnsignedLong => {
        let ints = value
          .iter()
          .map(|i| u32::try_from(*i).map_err(|_| out_of_range_error()))
          .collect::<Result<Vec<u32>, DataError>>()?;

        DataElementValue::new_unsigned_long(&ints)
      }
      ValueRepresentation::UnsignedShort => {
        let ints = value
          .iter()
          .map(|i| u16::try_from(*i).map_err(|_| out_of_range_error()))
          .collect::<Result<Vec<u16>, DataError>>()?;

        DataElementValue::new_unsigned_short(&ints)
      }
      _ => Err(DataError::new_value_invalid(format!(
        "VR '{}' of '{}' is not an integer VR",
        vr, item.keyword
      ))),
    }?;

    self.insert(item.tag, value);

    Ok(())
  }

  /// Removes the data element with the given tag, returning its value if it
  /// was present.
  ///
  pub fn remove(&mut self, tag: DataElementTag) -> Option<DataElementValue> {
    self.0.remove(&tag)
  }

  /// Moves all data elements from the other data set into this one,
  /// replacing any data elements with the same tag.
  ///
  pub fn merge(&mut self, other: DataSet) {
    self.0.extend(other.0);
  }

  /// Retains only the data elements for which the predicate returns true.
  ///
  pub fn retain(
    &mut self,
    mut predicate: impl FnMut(DataElementTag, &DataElementValue) -> bool,
  ) {
    self.0.retain(|tag, value| predicate(*tag, value));
  }

  /// Returns the value of the data element with the given tag.
  ///
  pub fn get_value(
    &self,
    tag: DataElementTag,
  ) -> Result<&DataElementValue, DataError> {
    match self.0.get(&tag) {
      Some(value) => Ok(value),
      None => Err(DataError::new_tag_not_present().with_path(
        &crate::DataSetPath::new_with_data_element(tag),
      )),
    }
  }

  /// Returns the value of the data element with the given tag for mutation.
  ///
  pub fn get_value_mut(
    &mut self,
    tag: DataElementTag,
  ) -> Result<&mut DataElementValue, DataError> {
    match self.0.get_mut(&tag) {
      Some(value) => Ok(value),
      None => Err(DataError::new_tag_not_present().with_path(
        &crate::DataSetPath::new_with_data_element(tag),
      )),
    }
  }

  /// Returns the single string value of the data element with the given tag.
  ///
  pub fn get_string(&self, tag: DataElementTag) -> Result<&str, DataError> {
    self.get_value(tag)?.get_string()
  }

  /// Returns the string values of the data element with the given tag.
  ///
  pub fn get_strings(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<&str>, DataError> {
    self.get_value(tag)?.get_strings()
  }

  /// Returns the single integer value of the data element with the given
  /// tag.
  ///
  pub fn get_int<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
  ) -> Result<T, DataError> {
    self.get_value(tag)?.get_int()
  }

  /// Returns the single integer value of the data element with the given
  /// tag, or the default if the tag is not present.
  ///
  pub fn get_int_with_default<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
    default: T,
  ) -> Result<T, DataError> {
    match self.0.get(&tag) {
      Some(value) => value.get_int(),
      None => Ok(default),
    }
  }

  /// Returns the integer values of the data element with the given tag.
  ///
  pub fn get_ints<T: num_traits::PrimInt + TryFrom<i64>>(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<T>, DataError> {
    self.get_value(tag)?.get_ints()
  }

  /// Returns the single float value of the data element with the given tag.
  ///
  pub fn get_float(&self, tag: DataElementTag) -> Result<f64, DataError> {
    self.get_value(tag)?.get_float()
  }

  /// Returns the float values of the data element with the given tag.
  ///
  pub fn get_floats(
    &self,
    tag: DataElementTag,
  ) -> Result<Vec<f64>, DataError> {
    self.get_value(tag)?.get_floats()
  }

  /// Returns the date value of the data element with the given tag.
  ///
  pub fn get_date(
    &self,
    tag: DataElementTag,
  ) -> Result<StructuredDate, DataError> {
    self.get_value(tag)?.get_date()
  }

  /// Returns the time value of the data element with the given tag.
  ///
  pub fn get_time(
    &self,
    tag: DataElementTag,
  ) -> Result<StructuredTime, DataError> {
    self.get_value(tag)?.get_time()
  }

  /// Returns the sequence items of the data element with the given tag.
  ///
  pub fn get_sequence_items(
    &self,
    tag: DataElementTag,
  ) -> Result<&[DataSet], DataError> {
    self.get_value(tag)?.sequence_items()
  }

  /// Returns the total size in bytes of the data held by this data set's
  /// values, including all nested data sets.
  ///
  pub fn total_byte_size(&self) -> u64 {
    self.0.values().map(DataElementValue::total_byte_size).sum()
  }

  /// Returns a deep copy of this data set where every value is backed by
  /// freshly allocated buffers, so that it shares no storage with the
  /// buffers it was read from.
  ///
  pub fn to_owned(&self) -> Self {
    Self(
      self
        .0
        .iter()
        .map(|(tag, value)| (*tag, value.to_owned()))
        .collect(),
    )
  }

  /// Returns the private creator string that reserves the block of the given
  /// private data tag, if the relevant private creator data element exists
  /// in this data set.
  ///
  pub fn private_creator_for_tag(&self, tag: DataElementTag) -> Option<&str> {
    let creator_tag = tag.private_creator_tag().ok()?;

    self.get_string(creator_tag).ok()
  }

  /// Reserves a block of private data elements in the given odd-numbered
  /// group for a private creator, and returns the tag of the private creator
  /// data element.
  ///
  /// If the creator already has a reservation in the group then its existing
  /// tag is returned. Otherwise the creator is assigned the first free slot
  /// in the range 0x10-0xFF and a `LongString` data element declaring it is
  /// inserted.
  ///
  pub fn allocate_private_slot(
    &mut self,
    group: u16,
    private_creator: &str,
  ) -> Result<DataElementTag, DataError> {
    if group & 1 == 0 {
      return Err(DataError::new_value_invalid(format!(
        "Group 0x{:04X} is not a private group",
        group
      )));
    }

    let mut first_free_slot = None;

    for slot in 0x10..=0xFFu16 {
      let tag = DataElementTag::new(group, slot);

      match self.0.get(&tag) {
        Some(value) => {
          if value.get_string() == Ok(private_creator.trim_end_matches(' ')) {
            return Ok(tag);
          }
        }

        None => {
          if first_free_slot.is_none() {
            first_free_slot = Some(tag);
          }
        }
      }
    }

    let tag = first_free_slot.ok_or_else(|| {
      DataError::new_value_invalid(format!(
        "Private group 0x{:04X} has no free creator slots",
        group
      ))
    })?;

    self.insert(tag, DataElementValue::new_long_string(&[private_creator])?);

    Ok(tag)
  }

  /// Renumbers the private creator slots in the given group so that they are
  /// contiguous starting at 0x10, moving all of their private data elements
  /// accordingly. Returns the tags that were changed as `(old, new)` pairs.
  ///
  pub fn compact_private_group(
    &mut self,
    group: u16,
  ) -> Vec<(DataElementTag, DataElementTag)> {
    let creator_tags: Vec<DataElementTag> = self
      .0
      .keys()
      .filter(|tag| tag.group == group && tag.is_private_creator())
      .copied()
      .collect();

    let mut remapping = vec![];
    let mut next_slot = 0x10u16;

    for old_creator_tag in creator_tags {
      let new_creator_tag = DataElementTag::new(group, next_slot);
      next_slot += 1;

      if new_creator_tag == old_creator_tag {
        continue;
      }

      // Move the creator data element itself
      let creator_value = self.0.remove(&old_creator_tag).unwrap();
      self.insert(new_creator_tag, creator_value);
      remapping.push((old_creator_tag, new_creator_tag));

      // Move all data elements in the creator's block
      let block_tags: Vec<DataElementTag> = self
        .0
        .keys()
        .filter(|tag| {
          tag.group == group
            && tag.private_creator_tag() == Ok(old_creator_tag)
        })
        .copied()
        .collect();

      for old_tag in block_tags {
        let new_tag = DataElementTag::new(
          group,
          (new_creator_tag.element << 8) | (old_tag.element & 0x00FF),
        );

        let value = self.0.remove(&old_tag).unwrap();
        self.insert(new_tag, value);
        remapping.push((old_tag, new_tag));
      }
    }

    remapping
  }

  /// Returns the tags of all private data elements, including those inside
  /// sequence items, whose block has no private creator data element
  /// reserving it.
  ///
  pub fn find_orphan_private_elements(&self) -> Vec<DataElementTag> {
    let mut orphans = vec![];

    for (tag, value) in self.0.iter() {
      if tag.is_private_data() && self.private_creator_for_tag(*tag).is_none()
      {
        orphans.push(*tag);
      }

      if let Ok(items) = value.sequence_items() {
        for item in items {
          orphans.extend(item.find_orphan_private_elements());
        }
      }
    }

    orphans
  }

  /// Removes all private data elements from the data set, including private
  /// creator declarations and private elements inside sequence items.
  ///
  pub fn strip_private_tags(&mut self) {
    self.strip_private_tags_when(&|_| true);
  }

  /// Removes the private data elements from the data set whose private
  /// creator matches the given predicate, recursively including inside
  /// sequence items. For private data elements the predicate receives the
  /// creator string that reserves the element's block; for private creator
  /// declarations it receives their own creator string. It receives `None`
  /// for orphan private data elements and other private tags.
  ///
  /// When a private creator matches, its declaration and all data elements
  /// in its block are removed together.
  ///
  pub fn strip_private_tags_when(
    &mut self,
    should_strip: &dyn Fn(Option<&str>) -> bool,
  ) {
    // Resolve the creator for every private tag up front so that removing a
    // creator declaration doesn't orphan the data elements in its block
    // before they have been visited
    let private_tags: Vec<(DataElementTag, Option<String>)> = self
      .0
      .keys()
      .filter(|tag| tag.is_private())
      .map(|tag| {
        let creator = if tag.is_private_data() {
          self.private_creator_for_tag(*tag)
        } else if tag.is_private_creator() {
          self.get_string(*tag).ok()
        } else {
          None
        };

        (*tag, creator.map(str::to_string))
      })
      .collect();

    for (tag, creator) in private_tags {
      if should_strip(creator.as_deref()) {
        self.0.remove(&tag);
      }
    }

    // Recurse into all sequence items
    for value in self.0.values_mut() {
      if let Ok(items) = value.sequence_items_mut() {
        for item in items {
          item.strip_private_tags_when(should_strip);
        }
      }
    }
  }
}

impl FromIterator<(DataElementTag, DataElementValue)> for DataSet {
  fn from_iter<T: IntoIterator<Item = (DataElementTag, DataElementValue)>>(
    iter: T,
  ) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl core::fmt::Display for DataSet {
  /// Prints one line per data element in the data set.
  ///
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    for (tag, value) in self.iter() {
      writeln!(
        f,
        "{} {} {}",
        tag,
        value.value_representation(),
        value.to_string(60)
      )?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn test_data_set() -> DataSet {
    let mut data_set = DataSet::new();

    data_set
      .insert_string_value(&dictionary::MODALITY, &["CT"])
      .unwrap();
    data_set
      .insert_string_value(&dictionary::PATIENT_ID, &["P001"])
      .unwrap();

    data_set
  }

  #[test]
  fn tags_are_ordered_test() {
    let mut data_set = DataSet::new();

    data_set.insert(
      DataElementTag::new(0x7FE0, 0x0010),
      DataElementValue::new_other_byte_string(vec![0, 0]).unwrap(),
    );
    data_set
      .insert_string_value(&dictionary::MODALITY, &["MR"])
      .unwrap();
    data_set
      .insert_string_value(&dictionary::PATIENT_ID, &["P001"])
      .unwrap();

    assert_eq!(
      data_set.tags(),
      vec![
        DataElementTag::new(0x0008, 0x0060),
        DataElementTag::new(0x0010, 0x0020),
        DataElementTag::new(0x7FE0, 0x0010),
      ]
    );
  }

  #[test]
  fn get_helpers_test() {
    let data_set = test_data_set();

    assert_eq!(data_set.get_string(dictionary::MODALITY.tag), Ok("CT"));
    assert!(data_set.get_string(dictionary::PATIENT_NAME.tag).is_err());

    assert_eq!(
      data_set.get_int_with_default::<usize>(
        dictionary::NUMBER_OF_FRAMES.tag,
        1
      ),
      Ok(1)
    );
  }

  #[test]
  fn allocate_private_slot_test() {
    let mut data_set = DataSet::new();

    let tag = data_set.allocate_private_slot(0x0019, "VENDOR A").unwrap();
    assert_eq!(tag, DataElementTag::new(0x0019, 0x0010));

    let tag = data_set.allocate_private_slot(0x0019, "VENDOR B").unwrap();
    assert_eq!(tag, DataElementTag::new(0x0019, 0x0011));

    // Re-requesting a creator returns its existing slot
    let tag = data_set.allocate_private_slot(0x0019, "VENDOR A").unwrap();
    assert_eq!(tag, DataElementTag::new(0x0019, 0x0010));

    assert!(data_set.allocate_private_slot(0x0018, "VENDOR A").is_err());
  }

  #[test]
  fn private_creator_for_tag_test() {
    let mut data_set = DataSet::new();
    data_set.allocate_private_slot(0x0019, "VENDOR A").unwrap();

    assert_eq!(
      data_set.private_creator_for_tag(DataElementTag::new(0x0019, 0x1005)),
      Some("VENDOR A")
    );

    assert_eq!(
      data_set.private_creator_for_tag(DataElementTag::new(0x0019, 0x1105)),
      None
    );
  }

  #[test]
  fn compact_private_group_test() {
    let mut data_set = DataSet::new();

    data_set.insert(
      DataElementTag::new(0x0019, 0x0011),
      DataElementValue::new_long_string(&["VENDOR A"]).unwrap(),
    );
    data_set.insert(
      DataElementTag::new(0x0019, 0x1105),
      DataElementValue::new_long_string(&["Value"]).unwrap(),
    );

    let remapping = data_set.compact_private_group(0x0019);

    assert_eq!(
      remapping,
      vec![
        (
          DataElementTag::new(0x0019, 0x0011),
          DataElementTag::new(0x0019, 0x0010)
        ),
        (
          DataElementTag::new(0x0019, 0x1105),
          DataElementTag::new(0x0019, 0x1005)
        ),
      ]
    );

    assert_eq!(
      data_set.get_string(DataElementTag::new(0x0019, 0x0010)),
      Ok("VENDOR A")
    );
    assert_eq!(
      data_set.get_string(DataElementTag::new(0x0019, 0x1005)),
      Ok("Value")
    );
  }

  #[test]
  fn find_orphan_private_elements_test() {
    let mut data_set = DataSet::new();

    data_set.allocate_private_slot(0x0019, "VENDOR A").unwrap();
    data_set.insert(
      DataElementTag::new(0x0019, 0x1005),
      DataElementValue::new_long_string(&["Reserved"]).unwrap(),
    );
    data_set.insert(
      DataElementTag::new(0x0019, 0x1105),
      DataElementValue::new_long_string(&["Orphan"]).unwrap(),
    );

    assert_eq!(
      data_set.find_orphan_private_elements(),
      vec![DataElementTag::new(0x0019, 0x1105)]
    );
  }

  #[test]
  fn strip_private_tags_test() {
    let mut data_set = test_data_set();

    data_set.allocate_private_slot(0x0019, "VENDOR A").unwrap();
    data_set.insert(
      DataElementTag::new(0x0019, 0x1005),
      DataElementValue::new_long_string(&["Payload"]).unwrap(),
    );

    // Nest a private element inside a sequence item
    let mut item = DataSet::new();
    item.allocate_private_slot(0x0021, "VENDOR B").unwrap();
    item.insert(
      DataElementTag::new(0x0021, 0x1001),
      DataElementValue::new_long_string(&["Nested"]).unwrap(),
    );
    item
      .insert_string_value(&dictionary::MODALITY, &["US"])
      .unwrap();
    data_set.insert(
      dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
      DataElementValue::new_sequence(vec![item]),
    );

    data_set.strip_private_tags();

    assert_eq!(
      data_set.tags(),
      vec![
        dictionary::MODALITY.tag,
        dictionary::REFERENCED_IMAGE_SEQUENCE.tag,
        dictionary::PATIENT_ID.tag,
      ]
    );

    let items = data_set
      .get_sequence_items(dictionary::REFERENCED_IMAGE_SEQUENCE.tag)
      .unwrap();
    assert_eq!(items[0].tags(), vec![dictionary::MODALITY.tag]);
  }

  #[test]
  fn strip_private_tags_when_test() {
    let mut data_set = DataSet::new();

    data_set.allocate_private_slot(0x0019, "VENDOR A").unwrap();
    data_set.insert(
      DataElementTag::new(0x0019, 0x1005),
      DataElementValue::new_long_string(&["A"]).unwrap(),
    );
    data_set.allocate_private_slot(0x0019, "VENDOR B").unwrap();
    data_set.insert(
      DataElementTag::new(0x0019, 0x1105),
      DataElementValue::new_long_string(&["B"]).unwrap(),
    );

    data_set.strip_private_tags_when(&|creator| creator == Some("VENDOR A"));

    assert_eq!(
      data_set.tags(),
      vec![
        DataElementTag::new(0x0019, 0x0011),
        DataElementTag::new(0x0019, 0x1105),
      ]
    );
  }

  #[test]
  fn to_owned_test() {
    let buffer = crate::RcByteSlice::from_vec(b"CT".to_vec());

    let mut data_set = DataSet::new();
    data_set.insert(
      dictionary::MODALITY.tag,
      DataElementValue::new_binary_unchecked(
        ValueRepresentation::CodeString,
        buffer.clone(),
      ),
    );

    let owned = data_set.to_owned();
    drop(data_set);
    drop(buffer);

    assert_eq!(owned.get_string(dictionary::MODALITY.tag), Ok("CT"));
  }

  #[test]
  fn tag_ordering_is_group_major_test() {
    let mut data_set = DataSet::new();

    data_set.insert(
      DataElementTag::new(0x0010, 0x0001),
      DataElementValue::new_long_string(&["b"]).unwrap(),
    );
    data_set.insert(
      DataElementTag::new(0x0008, 0xFFFF),
      DataElementValue::new_long_string(&["a"]).unwrap(),
    );

    let tags = data_set.tags();
    assert!(tags[0] < tags[1]);
    assert_eq!(tags[0].group, 0x0008);
  }
}
