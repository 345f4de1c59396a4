//! A seekable source of bytes used to back lazily loaded data element values.

#[cfg(feature = "std")]
use std::{cell::RefCell, rc::Rc};

#[cfg(not(feature = "std"))]
use alloc::{rc::Rc, string::String, vec::Vec};

#[cfg(feature = "std")]
use std::io::{Read, Seek, SeekFrom};

/// A source of bytes that supports random access reads. Lazily loaded data
/// element values hold a handle to a data source along with the absolute
/// offset and length of their bytes, and read them on demand.
///
pub trait DataSource {
  /// Returns the total number of bytes available in the data source, if
  /// known.
  ///
  fn len(&self) -> Option<u64>;

  /// Reads `length` bytes starting at the given absolute offset.
  ///
  fn read_span(&self, offset: u64, length: usize) -> Result<Vec<u8>, String>;
}

/// A handle to a [`DataSource`] shared between the lazily loaded values that
/// read from it.
///
pub type DataSourceHandle = Rc<dyn DataSource>;

/// A data source that reads spans out of a seekable stream, most commonly a
/// file. The stream is repositioned on every read, so reads are independent
/// of one another.
///
#[cfg(feature = "std")]
pub struct SeekableDataSource<T: Read + Seek> {
  stream: RefCell<T>,
  length: u64,
}

#[cfg(feature = "std")]
impl<T: Read + Seek> SeekableDataSource<T> {
  /// Creates a new data source that reads from the given seekable stream.
  ///
  pub fn new(mut stream: T) -> Result<Self, String> {
    let length = stream
      .seek(SeekFrom::End(0))
      .map_err(|e| e.to_string())?;

    Ok(Self {
      stream: RefCell::new(stream),
      length,
    })
  }
}

#[cfg(feature = "std")]
impl<T: Read + Seek> DataSource for SeekableDataSource<T> {
  fn len(&self) -> Option<u64> {
    Some(self.length)
  }

  fn read_span(&self, offset: u64, length: usize) -> Result<Vec<u8>, String> {
    let mut stream = self.stream.borrow_mut();

    stream
      .seek(SeekFrom::Start(offset))
      .map_err(|e| e.to_string())?;

    let mut buffer = vec![0u8; length];
    stream
      .read_exact(&mut buffer)
      .map_err(|e| e.to_string())?;

    Ok(buffer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[cfg(feature = "std")]
  #[test]
  fn seekable_data_source_test() {
    let source =
      SeekableDataSource::new(std::io::Cursor::new(vec![0u8, 1, 2, 3, 4, 5]))
        .unwrap();

    assert_eq!(source.len(), Some(6));
    assert_eq!(source.read_span(2, 3), Ok(vec![2, 3, 4]));
    assert_eq!(source.read_span(0, 1), Ok(vec![0]));
    assert!(source.read_span(4, 4).is_err());
  }
}
