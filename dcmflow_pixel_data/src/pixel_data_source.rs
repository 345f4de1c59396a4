//! The sources that raw pixel data bytes can be read from.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use dcmflow_core::{DataElementValue, DataSourceHandle, RcByteSlice};

/// A source of raw pixel data bytes: either bytes already in memory, or a
/// lazily loaded range of a seekable data source that is read on demand.
///
/// The two variants are dispatched statically. Dynamic dispatch only occurs
/// at the codec boundary.
///
#[derive(Clone, Debug, PartialEq)]
pub enum PixelDataSource {
  /// Pixel data bytes that are already in memory.
  Immediate { bytes: RcByteSlice },

  /// Pixel data bytes that are read on demand from a seekable data source.
  Lazy {
    handle: LazyPixelDataHandle,
  },
}

/// The handle to lazily loaded pixel data: a data source plus the absolute
/// offset and length of the pixel data's bytes within it.
///
#[derive(Clone)]
pub struct LazyPixelDataHandle {
  pub source: DataSourceHandle,
  pub offset: u64,
  pub length: u64,
}

impl core::fmt::Debug for LazyPixelDataHandle {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("LazyPixelDataHandle")
      .field("offset", &self.offset)
      .field("length", &self.length)
      .finish()
  }
}

impl PartialEq for LazyPixelDataHandle {
  fn eq(&self, other: &Self) -> bool {
    #[cfg(feature = "std")]
    let same_source = std::rc::Rc::ptr_eq(&self.source, &other.source);

    #[cfg(not(feature = "std"))]
    let same_source = alloc::rc::Rc::ptr_eq(&self.source, &other.source);

    same_source && self.offset == other.offset && self.length == other.length
  }
}

impl PixelDataSource {
  /// Creates a pixel data source for the given data element value, which
  /// must be either an in-memory binary value or a lazy value.
  ///
  #[allow(clippy::result_unit_err)]
  pub fn from_value(value: &DataElementValue) -> Result<Self, ()> {
    if let Ok(bytes) = value.bytes() {
      return Ok(Self::Immediate {
        bytes: bytes.clone(),
      });
    }

    if let Some(handle) = value.lazy_handle() {
      return Ok(Self::Lazy {
        handle: LazyPixelDataHandle {
          source: handle.source.clone(),
          offset: handle.offset,
          length: handle.length,
        },
      });
    }

    Err(())
  }

  /// Returns the total number of bytes of pixel data.
  ///
  pub fn length(&self) -> u64 {
    match self {
      Self::Immediate { bytes } => bytes.len() as u64,
      Self::Lazy { handle } => handle.length,
    }
  }

  /// Reads a span of the pixel data. For immediate sources this is
  /// zero-copy.
  ///
  pub fn read_span(
    &self,
    offset: u64,
    length: usize,
  ) -> Result<RcByteSlice, String> {
    match self {
      Self::Immediate { bytes } => {
        if offset + length as u64 > bytes.len() as u64 {
          return Err("Pixel data read is out of bounds".into());
        }

        Ok(bytes.slice(offset as usize, offset as usize + length))
      }

      Self::Lazy { handle } => {
        if offset + length as u64 > handle.length {
          return Err("Pixel data read is out of bounds".into());
        }

        let bytes = handle
          .source
          .read_span(handle.offset + offset, length)?;

        Ok(bytes.into())
      }
    }
  }

  /// Copies the whole of the pixel data into the given buffer.
  ///
  pub fn copy_to(&self, destination: &mut Vec<u8>) -> Result<(), String> {
    let bytes = self.read_span(0, self.length() as usize)?;

    destination.extend_from_slice(&bytes);

    Ok(())
  }

  /// Loads the whole of the pixel data, returning an in-memory buffer. For
  /// immediate sources this is zero-copy.
  ///
  pub fn load(&self) -> Result<RcByteSlice, String> {
    self.read_span(0, self.length() as usize)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn immediate_source_test() {
    let source = PixelDataSource::Immediate {
      bytes: vec![0u8, 1, 2, 3, 4, 5].into(),
    };

    assert_eq!(source.length(), 6);
    assert_eq!(&*source.read_span(2, 3).unwrap(), &[2, 3, 4]);
    assert!(source.read_span(4, 4).is_err());

    let mut buffer = vec![];
    source.copy_to(&mut buffer).unwrap();
    assert_eq!(buffer, vec![0, 1, 2, 3, 4, 5]);
  }

  #[cfg(feature = "std")]
  #[test]
  fn lazy_source_test() {
    use dcmflow_core::SeekableDataSource;
    use std::rc::Rc;

    let data_source = SeekableDataSource::new(std::io::Cursor::new(vec![
      9u8, 9, 0, 1, 2, 3, 9, 9,
    ]))
    .unwrap();

    let source = PixelDataSource::Lazy {
      handle: LazyPixelDataHandle {
        source: Rc::new(data_source),
        offset: 2,
        length: 4,
      },
    };

    assert_eq!(source.length(), 4);
    assert_eq!(&*source.read_span(1, 2).unwrap(), &[1, 2]);
    assert_eq!(&*source.load().unwrap(), &[0, 1, 2, 3]);
  }
}
