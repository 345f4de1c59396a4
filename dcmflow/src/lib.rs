//! DCMflow is a collection of libraries for working with DICOM, the
//! standard binary interchange format for medical imaging data.
//!
//! This crate re-exports the individual DCMflow libraries:
//!
//! - [`dcmflow_core`]: data element tags, values, data sets, the data
//!   element dictionary, and the transfer syntax registry.
//! - [`dcmflow_character_set`]: decoding of DICOM string data to UTF-8.
//! - [`dcmflow_p10`]: streaming reading and writing of the DICOM P10
//!   binary format.
//! - [`dcmflow_pixel_data`]: access to frames of pixel data and the
//!   built-in image codecs.

#![cfg_attr(not(feature = "std"), no_std)]

pub use dcmflow_character_set;
pub use dcmflow_core;
pub use dcmflow_p10;
pub use dcmflow_pixel_data;

pub use dcmflow_core::{
  DataElementTag, DataElementValue, DataError, DataSet, DataSetPath,
  DcmflowError, RcByteSlice, TransferSyntax, ValueRepresentation, dictionary,
  transfer_syntax,
};
pub use dcmflow_p10::{
  DataSetBuilder, DataSetP10Extensions, P10Error, P10ReadConfig,
  P10ReadContext, P10Token, P10WriteConfig, P10WriteContext,
};
pub use dcmflow_pixel_data::{
  PixelDataDefinition, PixelDataFrame, PixelDataReader,
};

#[cfg(test)]
mod integration_tests;
