//! UIDs specific to DCMflow.

/// The DCMflow implementation class UID, included by default in the File
/// Meta Information of serialized DICOM P10 data.
///
pub const IMPLEMENTATION_CLASS_UID: &str = "1.2.826.0.1.3680043.10.1462.1";

/// The DCMflow implementation version name, included by default in the File
/// Meta Information of serialized DICOM P10 data.
///
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMFLOW";
