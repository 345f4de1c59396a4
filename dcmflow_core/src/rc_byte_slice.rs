//! A reference counted byte slice used to share binary data without copying.

#[cfg(feature = "std")]
use std::rc::Rc;

#[cfg(not(feature = "std"))]
use alloc::{rc::Rc, vec, vec::Vec};

/// A reference counted byte slice holds an `Rc<Vec<u8>>` to a shareable
/// buffer, along with a range that specifies the part of that buffer that this
/// slice refers to.
///
/// This type is used widely to avoid copying buffers wherever possible, and in
/// most cases can be used like a `&[u8]` would be. Values read out of a raw
/// input buffer reference that buffer directly; [`RcByteSlice::to_detached`]
/// makes the explicit owning copy that releases the original buffer.
///
#[derive(Clone)]
pub struct RcByteSlice {
  data: Rc<Vec<u8>>,
  range: core::ops::Range<usize>,
}

impl RcByteSlice {
  /// Creates a new reference counted byte slice from a `Vec<u8>`.
  ///
  pub fn from_vec(data: Vec<u8>) -> Self {
    let range = 0..data.len();

    Self {
      data: Rc::new(data),
      range,
    }
  }

  /// Creates an empty reference counted byte slice.
  ///
  pub fn empty() -> Self {
    Self {
      data: Rc::new(vec![]),
      range: 0..0,
    }
  }

  /// Slices this reference counted byte slice, returning a new reference
  /// counted byte slice that points to the same underlying data.
  ///
  /// This function does not copy any data.
  ///
  pub fn slice(&self, start: usize, end: usize) -> Self {
    assert!(start <= end, "Byte slice range out of bounds");
    assert!(end <= self.range.len(), "Byte slice range out of bounds");

    Self {
      data: self.data.clone(),
      range: (self.range.start + start)..(self.range.start + end),
    }
  }

  /// Returns a new reference counted byte slice with the specified number of
  /// bytes dropped from the front.
  ///
  pub fn drop(&self, n: usize) -> Self {
    self.slice(n, self.len())
  }

  /// Returns a new reference counted byte slice to the specified number of
  /// leading bytes.
  ///
  pub fn take(&self, n: usize) -> Self {
    self.slice(0, n)
  }

  /// Returns a copy of this byte slice that is backed by a freshly allocated
  /// buffer holding only the sliced bytes. The returned slice shares nothing
  /// with the original, so the original's backing buffer can be freed.
  ///
  pub fn to_detached(&self) -> Self {
    Self::from_vec(self.as_slice().to_vec())
  }

  /// Returns whether this byte slice shares its backing buffer with other
  /// byte slices, or covers only part of its backing buffer.
  ///
  pub fn is_shared(&self) -> bool {
    Rc::strong_count(&self.data) > 1 || self.range != (0..self.data.len())
  }

  /// Consumes this reference counted byte slice and turns it into a `Vec<u8>`.
  /// Avoids a copy when possible.
  ///
  /// This function copies data if there are multiple references to the
  /// underlying buffer, or its slice bounds do not cover the whole buffer.
  ///
  pub fn into_vec(self) -> Vec<u8> {
    if self.range == (0..self.data.len()) {
      match Rc::try_unwrap(self.data) {
        Ok(data) => data,
        Err(data_rc) => data_rc[self.range.clone()].to_vec(),
      }
    } else {
      self.as_slice().to_vec()
    }
  }

  fn as_slice(&self) -> &[u8] {
    &self.data[self.range.clone()]
  }
}

impl core::fmt::Debug for RcByteSlice {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{:?}", self.as_slice())
  }
}

impl PartialEq for RcByteSlice {
  fn eq(&self, other: &Self) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl core::ops::Deref for RcByteSlice {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    self.as_slice()
  }
}

impl From<Vec<u8>> for RcByteSlice {
  fn from(vec: Vec<u8>) -> Self {
    RcByteSlice::from_vec(vec)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slice_test() {
    let bytes = RcByteSlice::from_vec(vec![0, 1, 2, 3, 4, 5]);

    assert_eq!(&*bytes.slice(1, 4), &[1, 2, 3]);
    assert_eq!(&*bytes.drop(4), &[4, 5]);
    assert_eq!(&*bytes.take(2), &[0, 1]);
    assert_eq!(&*bytes.drop(2).take(2), &[2, 3]);
  }

  #[test]
  fn to_detached_test() {
    let bytes = RcByteSlice::from_vec(vec![0, 1, 2, 3]);
    let slice = bytes.slice(1, 3);

    assert!(slice.is_shared());

    let detached = slice.to_detached();
    drop(bytes);
    drop(slice);

    assert!(!detached.is_shared());
    assert_eq!(&*detached, &[1, 2]);
  }

  #[test]
  fn into_vec_test() {
    let bytes = RcByteSlice::from_vec(vec![0, 1, 2, 3]);
    assert_eq!(bytes.slice(1, 3).into_vec(), vec![1, 2]);

    let bytes = RcByteSlice::from_vec(vec![0, 1]);
    assert_eq!(bytes.into_vec(), vec![0, 1]);
  }
}
