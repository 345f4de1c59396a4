//! Provides the core DICOM concepts used throughout DCMflow: data element
//! tags, value representations, data element values, data sets, the data
//! element and UID dictionaries, and the transfer syntax registry.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod data_element_tag;
pub mod data_element_value;
pub mod data_error;
pub mod data_set;
pub mod data_set_path;
pub mod data_source;
pub mod dictionary;
pub mod error;
pub mod rc_byte_slice;
pub mod transfer_syntax;
pub mod uid;
pub mod utils;
pub mod value_multiplicity;
pub mod value_representation;

pub use data_element_tag::DataElementTag;
pub use data_element_value::{
  DataElementValue, LazyValueHandle, StructuredDate, StructuredTime,
};
pub use data_error::DataError;
pub use data_set::DataSet;
pub use data_set_path::DataSetPath;
pub use data_source::{DataSource, DataSourceHandle};
pub use error::DcmflowError;
pub use rc_byte_slice::RcByteSlice;
pub use transfer_syntax::TransferSyntax;
pub use uid::{Uid, UidError};
pub use value_multiplicity::ValueMultiplicity;
pub use value_representation::ValueRepresentation;

#[cfg(feature = "std")]
pub use data_source::SeekableDataSource;
