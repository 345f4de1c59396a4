//! Provides a dictionary of the data elements and UIDs defined by the DICOM
//! standard, along with private data element dictionaries for a number of
//! vendors, and an API for registering further private dictionaries.
//!
//! The dictionary is read-only once process startup is complete: the only
//! write path is [`register_private_items`], which must complete before
//! concurrent lookups begin.

#[cfg(not(feature = "std"))]
use alloc::{format, string::String};

use crate::{DataElementTag, ValueMultiplicity, ValueRepresentation};
use crate::ValueRepresentation as VR;

/// An entry in the data element dictionary: the tag, its display name and
/// keyword, the value representations it permits, its value multiplicity,
/// and whether it is retired.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
  pub tag: DataElementTag,
  pub name: &'static str,
  pub keyword: &'static str,
  pub vrs: &'static [ValueRepresentation],
  pub multiplicity: ValueMultiplicity,
  pub is_retired: bool,
}

/// An entry in the masked dictionary for repeating groups of data elements,
/// e.g. the *'(60xx,3000) Overlay Data'* elements. A tag matches a masked
/// item when `tag & mask == card`.
///
#[derive(Clone, Debug, PartialEq)]
pub struct MaskedItem {
  pub mask: u32,
  pub card: u32,
  pub item: Item,
}

/// An entry in a private data element dictionary. Private data elements are
/// identified by their creator string, group, and the low byte of their
/// element value.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PrivateItem {
  pub creator: &'static str,
  pub group: u16,
  pub element_offset: u8,
  pub item: Item,
}

const fn one() -> ValueMultiplicity {
  ValueMultiplicity {
    min: 1,
    max: Some(1),
  }
}

const fn multiple(min: u32, max: u32) -> ValueMultiplicity {
  ValueMultiplicity {
    min,
    max: Some(max),
  }
}

const fn unbounded(min: u32) -> ValueMultiplicity {
  ValueMultiplicity { min, max: None }
}

const fn item(
  group: u16,
  element: u16,
  name: &'static str,
  keyword: &'static str,
  vrs: &'static [ValueRepresentation],
  multiplicity: ValueMultiplicity,
) -> Item {
  Item {
    tag: DataElementTag::new(group, element),
    name,
    keyword,
    vrs,
    multiplicity,
    is_retired: false,
  }
}

const fn retired_item(
  group: u16,
  element: u16,
  name: &'static str,
  keyword: &'static str,
  vrs: &'static [ValueRepresentation],
  multiplicity: ValueMultiplicity,
) -> Item {
  Item {
    tag: DataElementTag::new(group, element),
    name,
    keyword,
    vrs,
    multiplicity,
    is_retired: true,
  }
}

pub const FILE_META_INFORMATION_GROUP_LENGTH: Item = item(
  0x0002, 0x0000, "File Meta Information Group Length",
  "FileMetaInformationGroupLength", &[VR::UnsignedLong], one(),
);
pub const FILE_META_INFORMATION_VERSION: Item = item(
  0x0002, 0x0001, "File Meta Information Version",
  "FileMetaInformationVersion", &[VR::OtherByteString], one(),
);
pub const MEDIA_STORAGE_SOP_CLASS_UID: Item = item(
  0x0002, 0x0002, "Media Storage SOP Class UID", "MediaStorageSOPClassUID",
  &[VR::UniqueIdentifier], one(),
);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Item = item(
  0x0002, 0x0003, "Media Storage SOP Instance UID",
  "MediaStorageSOPInstanceUID", &[VR::UniqueIdentifier], one(),
);
pub const TRANSFER_SYNTAX_UID: Item = item(
  0x0002, 0x0010, "Transfer Syntax UID", "TransferSyntaxUID",
  &[VR::UniqueIdentifier], one(),
);
pub const IMPLEMENTATION_CLASS_UID: Item = item(
  0x0002, 0x0012, "Implementation Class UID", "ImplementationClassUID",
  &[VR::UniqueIdentifier], one(),
);
pub const IMPLEMENTATION_VERSION_NAME: Item = item(
  0x0002, 0x0013, "Implementation Version Name", "ImplementationVersionName",
  &[VR::ShortString], one(),
);
pub const SOURCE_APPLICATION_ENTITY_TITLE: Item = item(
  0x0002, 0x0016, "Source Application Entity Title",
  "SourceApplicationEntityTitle", &[VR::ApplicationEntity], one(),
);

pub const SPECIFIC_CHARACTER_SET: Item = item(
  0x0008, 0x0005, "Specific Character Set", "SpecificCharacterSet",
  &[VR::CodeString], unbounded(1),
);
pub const IMAGE_TYPE: Item = item(
  0x0008, 0x0008, "Image Type", "ImageType", &[VR::CodeString], unbounded(2),
);
pub const SOP_CLASS_UID: Item = item(
  0x0008, 0x0016, "SOP Class UID", "SOPClassUID", &[VR::UniqueIdentifier],
  one(),
);
pub const SOP_INSTANCE_UID: Item = item(
  0x0008, 0x0018, "SOP Instance UID", "SOPInstanceUID",
  &[VR::UniqueIdentifier], one(),
);
pub const STUDY_DATE: Item = item(
  0x0008, 0x0020, "Study Date", "StudyDate", &[VR::Date], one(),
);
pub const SERIES_DATE: Item = item(
  0x0008, 0x0021, "Series Date", "SeriesDate", &[VR::Date], one(),
);
pub const ACQUISITION_DATE: Item = item(
  0x0008, 0x0022, "Acquisition Date", "AcquisitionDate", &[VR::Date], one(),
);
pub const CONTENT_DATE: Item = item(
  0x0008, 0x0023, "Content Date", "ContentDate", &[VR::Date], one(),
);
pub const STUDY_TIME: Item = item(
  0x0008, 0x0030, "Study Time", "StudyTime", &[VR::Time], one(),
);
pub const SERIES_TIME: Item = item(
  0x0008, 0x0031, "Series Time", "SeriesTime", &[VR::Time], one(),
);
pub const CONTENT_TIME: Item = item(
  0x0008, 0x0033, "Content Time", "ContentTime", &[VR::Time], one(),
);
pub const ACCESSION_NUMBER: Item = item(
  0x0008, 0x0050, "Accession Number", "AccessionNumber", &[VR::ShortString],
  one(),
);
pub const MODALITY: Item = item(
  0x0008, 0x0060, "Modality", "Modality", &[VR::CodeString], one(),
);
pub const CONVERSION_TYPE: Item = item(
  0x0008, 0x0064, "Conversion Type", "ConversionType", &[VR::CodeString],
  one(),
);
pub const MANUFACTURER: Item = item(
  0x0008, 0x0070, "Manufacturer", "Manufacturer", &[VR::LongString], one(),
);
pub const INSTITUTION_NAME: Item = item(
  0x0008, 0x0080, "Institution Name", "InstitutionName", &[VR::LongString],
  one(),
);
pub const REFERRING_PHYSICIAN_NAME: Item = item(
  0x0008, 0x0090, "Referring Physician's Name", "ReferringPhysicianName",
  &[VR::PersonName], one(),
);
pub const STATION_NAME: Item = item(
  0x0008, 0x1010, "Station Name", "StationName", &[VR::ShortString], one(),
);
pub const STUDY_DESCRIPTION: Item = item(
  0x0008, 0x1030, "Study Description", "StudyDescription", &[VR::LongString],
  one(),
);
pub const SERIES_DESCRIPTION: Item = item(
  0x0008, 0x103E, "Series Description", "SeriesDescription",
  &[VR::LongString], one(),
);
pub const PERFORMING_PHYSICIAN_NAME: Item = item(
  0x0008, 0x1050, "Performing Physician's Name", "PerformingPhysicianName",
  &[VR::PersonName], unbounded(1),
);
pub const MANUFACTURER_MODEL_NAME: Item = item(
  0x0008, 0x1090, "Manufacturer's Model Name", "ManufacturerModelName",
  &[VR::LongString], one(),
);
pub const REFERENCED_IMAGE_SEQUENCE: Item = item(
  0x0008, 0x1140, "Referenced Image Sequence", "ReferencedImageSequence",
  &[VR::Sequence], one(),
);
pub const DERIVATION_DESCRIPTION: Item = item(
  0x0008, 0x2111, "Derivation Description", "DerivationDescription",
  &[VR::ShortText], one(),
);

pub const PATIENT_NAME: Item = item(
  0x0010, 0x0010, "Patient's Name", "PatientName", &[VR::PersonName], one(),
);
pub const PATIENT_ID: Item = item(
  0x0010, 0x0020, "Patient ID", "PatientID", &[VR::LongString], one(),
);
pub const PATIENT_BIRTH_DATE: Item = item(
  0x0010, 0x0030, "Patient's Birth Date", "PatientBirthDate", &[VR::Date],
  one(),
);
pub const PATIENT_SEX: Item = item(
  0x0010, 0x0040, "Patient's Sex", "PatientSex", &[VR::CodeString], one(),
);
pub const PATIENT_AGE: Item = item(
  0x0010, 0x1010, "Patient's Age", "PatientAge", &[VR::AgeString], one(),
);
pub const PATIENT_SIZE: Item = item(
  0x0010, 0x1020, "Patient's Size", "PatientSize", &[VR::DecimalString],
  one(),
);
pub const PATIENT_WEIGHT: Item = item(
  0x0010, 0x1030, "Patient's Weight", "PatientWeight", &[VR::DecimalString],
  one(),
);
pub const PATIENT_COMMENTS: Item = item(
  0x0010, 0x4000, "Patient Comments", "PatientComments", &[VR::LongText],
  one(),
);

pub const BODY_PART_EXAMINED: Item = item(
  0x0018, 0x0015, "Body Part Examined", "BodyPartExamined", &[VR::CodeString],
  one(),
);
pub const SLICE_THICKNESS: Item = item(
  0x0018, 0x0050, "Slice Thickness", "SliceThickness", &[VR::DecimalString],
  one(),
);
pub const KVP: Item = item(
  0x0018, 0x0060, "KVP", "KVP", &[VR::DecimalString], one(),
);
pub const SPACING_BETWEEN_SLICES: Item = item(
  0x0018, 0x0088, "Spacing Between Slices", "SpacingBetweenSlices",
  &[VR::DecimalString], one(),
);
pub const SOFTWARE_VERSIONS: Item = item(
  0x0018, 0x1020, "Software Versions", "SoftwareVersions", &[VR::LongString],
  unbounded(1),
);
pub const PROTOCOL_NAME: Item = item(
  0x0018, 0x1030, "Protocol Name", "ProtocolName", &[VR::LongString], one(),
);
pub const PATIENT_POSITION: Item = item(
  0x0018, 0x5100, "Patient Position", "PatientPosition", &[VR::CodeString],
  one(),
);

pub const STUDY_INSTANCE_UID: Item = item(
  0x0020, 0x000D, "Study Instance UID", "StudyInstanceUID",
  &[VR::UniqueIdentifier], one(),
);
pub const SERIES_INSTANCE_UID: Item = item(
  0x0020, 0x000E, "Series Instance UID", "SeriesInstanceUID",
  &[VR::UniqueIdentifier], one(),
);
pub const STUDY_ID: Item = item(
  0x0020, 0x0010, "Study ID", "StudyID", &[VR::ShortString], one(),
);
pub const SERIES_NUMBER: Item = item(
  0x0020, 0x0011, "Series Number", "SeriesNumber", &[VR::IntegerString],
  one(),
);
pub const ACQUISITION_NUMBER: Item = item(
  0x0020, 0x0012, "Acquisition Number", "AcquisitionNumber",
  &[VR::IntegerString], one(),
);
pub const INSTANCE_NUMBER: Item = item(
  0x0020, 0x0013, "Instance Number", "InstanceNumber", &[VR::IntegerString],
  one(),
);
pub const IMAGE_POSITION_PATIENT: Item = item(
  0x0020, 0x0032, "Image Position (Patient)", "ImagePositionPatient",
  &[VR::DecimalString], multiple(3, 3),
);
pub const IMAGE_ORIENTATION_PATIENT: Item = item(
  0x0020, 0x0037, "Image Orientation (Patient)", "ImageOrientationPatient",
  &[VR::DecimalString], multiple(6, 6),
);
pub const FRAME_OF_REFERENCE_UID: Item = item(
  0x0020, 0x0052, "Frame of Reference UID", "FrameOfReferenceUID",
  &[VR::UniqueIdentifier], one(),
);
pub const SLICE_LOCATION: Item = item(
  0x0020, 0x1041, "Slice Location", "SliceLocation", &[VR::DecimalString],
  one(),
);
pub const IMAGE_COMMENTS: Item = item(
  0x0020, 0x4000, "Image Comments", "ImageComments", &[VR::LongText], one(),
);

pub const SAMPLES_PER_PIXEL: Item = item(
  0x0028, 0x0002, "Samples per Pixel", "SamplesPerPixel", &[VR::UnsignedShort],
  one(),
);
pub const PHOTOMETRIC_INTERPRETATION: Item = item(
  0x0028, 0x0004, "Photometric Interpretation", "PhotometricInterpretation",
  &[VR::CodeString], one(),
);
pub const PLANAR_CONFIGURATION: Item = item(
  0x0028, 0x0006, "Planar Configuration", "PlanarConfiguration",
  &[VR::UnsignedShort], one(),
);
pub const NUMBER_OF_FRAMES: Item = item(
  0x0028, 0x0008, "Number of Frames", "NumberOfFrames", &[VR::IntegerString],
  one(),
);
pub const ROWS: Item = item(
  0x0028, 0x0010, "Rows", "Rows", &[VR::UnsignedShort], one(),
);
pub const COLUMNS: Item = item(
  0x0028, 0x0011, "Columns", "Columns", &[VR::UnsignedShort], one(),
);
pub const PIXEL_SPACING: Item = item(
  0x0028, 0x0030, "Pixel Spacing", "PixelSpacing", &[VR::DecimalString],
  multiple(2, 2),
);
pub const PIXEL_ASPECT_RATIO: Item = item(
  0x0028, 0x0034, "Pixel Aspect Ratio", "PixelAspectRatio",
  &[VR::IntegerString], multiple(2, 2),
);
pub const BITS_ALLOCATED: Item = item(
  0x0028, 0x0100, "Bits Allocated", "BitsAllocated", &[VR::UnsignedShort],
  one(),
);
pub const BITS_STORED: Item = item(
  0x0028, 0x0101, "Bits Stored", "BitsStored", &[VR::UnsignedShort], one(),
);
pub const HIGH_BIT: Item = item(
  0x0028, 0x0102, "High Bit", "HighBit", &[VR::UnsignedShort], one(),
);
pub const PIXEL_REPRESENTATION: Item = item(
  0x0028, 0x0103, "Pixel Representation", "PixelRepresentation",
  &[VR::UnsignedShort], one(),
);
pub const SMALLEST_VALID_PIXEL_VALUE: Item = retired_item(
  0x0028, 0x0104, "Smallest Valid Pixel Value", "SmallestValidPixelValue",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const LARGEST_VALID_PIXEL_VALUE: Item = retired_item(
  0x0028, 0x0105, "Largest Valid Pixel Value", "LargestValidPixelValue",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const SMALLEST_IMAGE_PIXEL_VALUE: Item = item(
  0x0028, 0x0106, "Smallest Image Pixel Value", "SmallestImagePixelValue",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const LARGEST_IMAGE_PIXEL_VALUE: Item = item(
  0x0028, 0x0107, "Largest Image Pixel Value", "LargestImagePixelValue",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const SMALLEST_PIXEL_VALUE_IN_SERIES: Item = item(
  0x0028, 0x0108, "Smallest Pixel Value in Series",
  "SmallestPixelValueInSeries", &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const LARGEST_PIXEL_VALUE_IN_SERIES: Item = item(
  0x0028, 0x0109, "Largest Pixel Value in Series", "LargestPixelValueInSeries",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const SMALLEST_IMAGE_PIXEL_VALUE_IN_PLANE: Item = retired_item(
  0x0028, 0x0110, "Smallest Image Pixel Value in Plane",
  "SmallestImagePixelValueInPlane", &[VR::UnsignedShort, VR::SignedShort],
  one(),
);
pub const LARGEST_IMAGE_PIXEL_VALUE_IN_PLANE: Item = retired_item(
  0x0028, 0x0111, "Largest Image Pixel Value in Plane",
  "LargestImagePixelValueInPlane", &[VR::UnsignedShort, VR::SignedShort],
  one(),
);
pub const PIXEL_PADDING_VALUE: Item = item(
  0x0028, 0x0120, "Pixel Padding Value", "PixelPaddingValue",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const PIXEL_PADDING_RANGE_LIMIT: Item = item(
  0x0028, 0x0121, "Pixel Padding Range Limit", "PixelPaddingRangeLimit",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const WINDOW_CENTER: Item = item(
  0x0028, 0x1050, "Window Center", "WindowCenter", &[VR::DecimalString],
  unbounded(1),
);
pub const WINDOW_WIDTH: Item = item(
  0x0028, 0x1051, "Window Width", "WindowWidth", &[VR::DecimalString],
  unbounded(1),
);
pub const RESCALE_INTERCEPT: Item = item(
  0x0028, 0x1052, "Rescale Intercept", "RescaleIntercept",
  &[VR::DecimalString], one(),
);
pub const RESCALE_SLOPE: Item = item(
  0x0028, 0x1053, "Rescale Slope", "RescaleSlope", &[VR::DecimalString],
  one(),
);
pub const RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Item = item(
  0x0028, 0x1101, "Red Palette Color Lookup Table Descriptor",
  "RedPaletteColorLookupTableDescriptor",
  &[VR::UnsignedShort, VR::SignedShort], multiple(3, 3),
);
pub const GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Item = item(
  0x0028, 0x1102, "Green Palette Color Lookup Table Descriptor",
  "GreenPaletteColorLookupTableDescriptor",
  &[VR::UnsignedShort, VR::SignedShort], multiple(3, 3),
);
pub const BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR: Item = item(
  0x0028, 0x1103, "Blue Palette Color Lookup Table Descriptor",
  "BluePaletteColorLookupTableDescriptor",
  &[VR::UnsignedShort, VR::SignedShort], multiple(3, 3),
);
pub const RED_PALETTE_COLOR_LOOKUP_TABLE_DATA: Item = item(
  0x0028, 0x1201, "Red Palette Color Lookup Table Data",
  "RedPaletteColorLookupTableData", &[VR::OtherWordString], one(),
);
pub const GREEN_PALETTE_COLOR_LOOKUP_TABLE_DATA: Item = item(
  0x0028, 0x1202, "Green Palette Color Lookup Table Data",
  "GreenPaletteColorLookupTableData", &[VR::OtherWordString], one(),
);
pub const BLUE_PALETTE_COLOR_LOOKUP_TABLE_DATA: Item = item(
  0x0028, 0x1203, "Blue Palette Color Lookup Table Data",
  "BluePaletteColorLookupTableData", &[VR::OtherWordString], one(),
);
pub const LOSSY_IMAGE_COMPRESSION: Item = item(
  0x0028, 0x2110, "Lossy Image Compression", "LossyImageCompression",
  &[VR::CodeString], one(),
);
pub const LOSSY_IMAGE_COMPRESSION_RATIO: Item = item(
  0x0028, 0x2112, "Lossy Image Compression Ratio",
  "LossyImageCompressionRatio", &[VR::DecimalString], unbounded(1),
);
pub const LUT_DESCRIPTOR: Item = item(
  0x0028, 0x3002, "LUT Descriptor", "LUTDescriptor",
  &[VR::UnsignedShort, VR::SignedShort], multiple(3, 3),
);
pub const LUT_EXPLANATION: Item = item(
  0x0028, 0x3003, "LUT Explanation", "LUTExplanation", &[VR::LongString],
  one(),
);
pub const LUT_DATA: Item = item(
  0x0028, 0x3006, "LUT Data", "LUTData",
  &[VR::UnsignedShort, VR::OtherWordString], unbounded(1),
);
pub const VOI_LUT_SEQUENCE: Item = item(
  0x0028, 0x3010, "VOI LUT Sequence", "VOILUTSequence", &[VR::Sequence],
  one(),
);

pub const WAVEFORM_BITS_STORED: Item = item(
  0x003A, 0x021A, "Waveform Bits Stored", "WaveformBitsStored",
  &[VR::UnsignedShort], one(),
);

pub const CONTENT_SEQUENCE: Item = item(
  0x0040, 0xA730, "Content Sequence", "ContentSequence", &[VR::Sequence],
  one(),
);
pub const REAL_WORLD_VALUE_LAST_VALUE_MAPPED: Item = item(
  0x0040, 0x9211, "Real World Value Last Value Mapped",
  "RealWorldValueLastValueMapped", &[VR::UnsignedShort, VR::SignedShort],
  one(),
);
pub const REAL_WORLD_VALUE_FIRST_VALUE_MAPPED: Item = item(
  0x0040, 0x9216, "Real World Value First Value Mapped",
  "RealWorldValueFirstValueMapped", &[VR::UnsignedShort, VR::SignedShort],
  one(),
);

pub const HISTOGRAM_SEQUENCE: Item = item(
  0x0060, 0x3000, "Histogram Sequence", "HistogramSequence", &[VR::Sequence],
  one(),
);
pub const HISTOGRAM_NUMBER_OF_BINS: Item = item(
  0x0060, 0x3002, "Histogram Number of Bins", "HistogramNumberOfBins",
  &[VR::UnsignedShort], one(),
);
pub const HISTOGRAM_FIRST_BIN_VALUE: Item = item(
  0x0060, 0x3004, "Histogram First Bin Value", "HistogramFirstBinValue",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const HISTOGRAM_LAST_BIN_VALUE: Item = item(
  0x0060, 0x3006, "Histogram Last Bin Value", "HistogramLastBinValue",
  &[VR::UnsignedShort, VR::SignedShort], one(),
);
pub const HISTOGRAM_DATA: Item = item(
  0x0060, 0x3020, "Histogram Data", "HistogramData", &[VR::UnsignedLong],
  unbounded(1),
);

pub const SHARED_FUNCTIONAL_GROUPS_SEQUENCE: Item = item(
  0x5200, 0x9229, "Shared Functional Groups Sequence",
  "SharedFunctionalGroupsSequence", &[VR::Sequence], one(),
);
pub const PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE: Item = item(
  0x5200, 0x9230, "Per-Frame Functional Groups Sequence",
  "PerFrameFunctionalGroupsSequence", &[VR::Sequence], one(),
);

pub const WAVEFORM_SEQUENCE: Item = item(
  0x5400, 0x0100, "Waveform Sequence", "WaveformSequence", &[VR::Sequence],
  one(),
);
pub const CHANNEL_MINIMUM_VALUE: Item = item(
  0x5400, 0x0110, "Channel Minimum Value", "ChannelMinimumValue",
  &[VR::OtherByteString, VR::OtherWordString], one(),
);
pub const CHANNEL_MAXIMUM_VALUE: Item = item(
  0x5400, 0x0112, "Channel Maximum Value", "ChannelMaximumValue",
  &[VR::OtherByteString, VR::OtherWordString], one(),
);
pub const WAVEFORM_BITS_ALLOCATED: Item = item(
  0x5400, 0x1004, "Waveform Bits Allocated", "WaveformBitsAllocated",
  &[VR::UnsignedShort], one(),
);
pub const WAVEFORM_PADDING_VALUE: Item = item(
  0x5400, 0x100A, "Waveform Padding Value", "WaveformPaddingValue",
  &[VR::OtherByteString, VR::OtherWordString], one(),
);
pub const WAVEFORM_DATA: Item = item(
  0x5400, 0x1010, "Waveform Data", "WaveformData",
  &[VR::OtherByteString, VR::OtherWordString], one(),
);

pub const EXTENDED_OFFSET_TABLE: Item = item(
  0x7FE0, 0x0001, "Extended Offset Table", "ExtendedOffsetTable",
  &[VR::OtherVeryLongString], one(),
);
pub const EXTENDED_OFFSET_TABLE_LENGTHS: Item = item(
  0x7FE0, 0x0002, "Extended Offset Table Lengths",
  "ExtendedOffsetTableLengths", &[VR::OtherVeryLongString], one(),
);
pub const FLOAT_PIXEL_DATA: Item = item(
  0x7FE0, 0x0008, "Float Pixel Data", "FloatPixelData", &[VR::OtherFloatString],
  one(),
);
pub const DOUBLE_FLOAT_PIXEL_DATA: Item = item(
  0x7FE0, 0x0009, "Double Float Pixel Data", "DoubleFloatPixelData",
  &[VR::OtherDoubleString], one(),
);
pub const PIXEL_DATA: Item = item(
  0x7FE0, 0x0010, "Pixel Data", "PixelData",
  &[VR::OtherByteString, VR::OtherWordString], one(),
);

pub const DATA_SET_TRAILING_PADDING: Item = item(
  0xFFFC, 0xFFFC, "Data Set Trailing Padding", "DataSetTrailingPadding",
  &[VR::OtherByteString], one(),
);
pub const ITEM: Item = item(0xFFFE, 0xE000, "Item", "Item", &[], one());
pub const ITEM_DELIMITATION_ITEM: Item = item(
  0xFFFE, 0xE00D, "Item Delimitation Item", "ItemDelimitationItem", &[], one(),
);
pub const SEQUENCE_DELIMITATION_ITEM: Item = item(
  0xFFFE, 0xE0DD, "Sequence Delimitation Item", "SequenceDelimitationItem",
  &[], one(),
);

/// All data element dictionary entries, ordered by tag so lookups can use a
/// binary search.
///
static TABLE: &[Item] = &[
  FILE_META_INFORMATION_GROUP_LENGTH,
  FILE_META_INFORMATION_VERSION,
  MEDIA_STORAGE_SOP_CLASS_UID,
  MEDIA_STORAGE_SOP_INSTANCE_UID,
  TRANSFER_SYNTAX_UID,
  IMPLEMENTATION_CLASS_UID,
  IMPLEMENTATION_VERSION_NAME,
  SOURCE_APPLICATION_ENTITY_TITLE,
  SPECIFIC_CHARACTER_SET,
  IMAGE_TYPE,
  SOP_CLASS_UID,
  SOP_INSTANCE_UID,
  STUDY_DATE,
  SERIES_DATE,
  ACQUISITION_DATE,
  CONTENT_DATE,
  STUDY_TIME,
  SERIES_TIME,
  CONTENT_TIME,
  ACCESSION_NUMBER,
  MODALITY,
  CONVERSION_TYPE,
  MANUFACTURER,
  INSTITUTION_NAME,
  REFERRING_PHYSICIAN_NAME,
  STATION_NAME,
  STUDY_DESCRIPTION,
  SERIES_DESCRIPTION,
  PERFORMING_PHYSICIAN_NAME,
  MANUFACTURER_MODEL_NAME,
  REFERENCED_IMAGE_SEQUENCE,
  DERIVATION_DESCRIPTION,
  PATIENT_NAME,
  PATIENT_ID,
  PATIENT_BIRTH_DATE,
  PATIENT_SEX,
  PATIENT_AGE,
  PATIENT_SIZE,
  PATIENT_WEIGHT,
  PATIENT_COMMENTS,
  BODY_PART_EXAMINED,
  SLICE_THICKNESS,
  KVP,
  SPACING_BETWEEN_SLICES,
  SOFTWARE_VERSIONS,
  PROTOCOL_NAME,
  PATIENT_POSITION,
  STUDY_INSTANCE_UID,
  SERIES_INSTANCE_UID,
  STUDY_ID,
  SERIES_NUMBER,
  ACQUISITION_NUMBER,
  INSTANCE_NUMBER,
  IMAGE_POSITION_PATIENT,
  IMAGE_ORIENTATION_PATIENT,
  FRAME_OF_REFERENCE_UID,
  SLICE_LOCATION,
  IMAGE_COMMENTS,
  SAMPLES_PER_PIXEL,
  PHOTOMETRIC_INTERPRETATION,
  PLANAR_CONFIGURATION,
  NUMBER_OF_FRAMES,
  ROWS,
  COLUMNS,
  PIXEL_SPACING,
  PIXEL_ASPECT_RATIO,
  BITS_ALLOCATED,
  BITS_STORED,
  HIGH_BIT,
  PIXEL_REPRESENTATION,
  SMALLEST_VALID_PIXEL_VALUE,
  LARGEST_VALID_PIXEL_VALUE,
  SMALLEST_IMAGE_PIXEL_VALUE,
  LARGEST_IMAGE_PIXEL_VALUE,
  SMALLEST_PIXEL_VALUE_IN_SERIES,
  LARGEST_PIXEL_VALUE_IN_SERIES,
  SMALLEST_IMAGE_PIXEL_VALUE_IN_PLANE,
  LARGEST_IMAGE_PIXEL_VALUE_IN_PLANE,
  PIXEL_PADDING_VALUE,
  PIXEL_PADDING_RANGE_LIMIT,
  WINDOW_CENTER,
  WINDOW_WIDTH,
  RESCALE_INTERCEPT,
  RESCALE_SLOPE,
  RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR,
  RED_PALETTE_COLOR_LOOKUP_TABLE_DATA,
  GREEN_PALETTE_COLOR_LOOKUP_TABLE_DATA,
  BLUE_PALETTE_COLOR_LOOKUP_TABLE_DATA,
  LOSSY_IMAGE_COMPRESSION,
  LOSSY_IMAGE_COMPRESSION_RATIO,
  LUT_DESCRIPTOR,
  LUT_EXPLANATION,
  LUT_DATA,
  VOI_LUT_SEQUENCE,
  WAVEFORM_BITS_STORED,
  REAL_WORLD_VALUE_LAST_VALUE_MAPPED,
  REAL_WORLD_VALUE_FIRST_VALUE_MAPPED,
  CONTENT_SEQUENCE,
  HISTOGRAM_SEQUENCE,
  HISTOGRAM_NUMBER_OF_BINS,
  HISTOGRAM_FIRST_BIN_VALUE,
  HISTOGRAM_LAST_BIN_VALUE,
  HISTOGRAM_DATA,
  SHARED_FUNCTIONAL_GROUPS_SEQUENCE,
  PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE,
  WAVEFORM_SEQUENCE,
  CHANNEL_MINIMUM_VALUE,
  CHANNEL_MAXIMUM_VALUE,
  WAVEFORM_BITS_ALLOCATED,
  WAVEFORM_PADDING_VALUE,
  WAVEFORM_DATA,
  EXTENDED_OFFSET_TABLE,
  EXTENDED_OFFSET_TABLE_LENGTHS,
  FLOAT_PIXEL_DATA,
  DOUBLE_FLOAT_PIXEL_DATA,
  PIXEL_DATA,
  DATA_SET_TRAILING_PADDING,
  ITEM,
  ITEM_DELIMITATION_ITEM,
  SEQUENCE_DELIMITATION_ITEM,
];

/// Dictionary entries for repeating groups of data elements. These are
/// matched after the main table, by checking `tag & mask == card`.
///
static MASKED_TABLE: &[MaskedItem] = &[
  MaskedItem {
    mask: 0xFF00_FFFF,
    card: 0x6000_0010,
    item: item(
      0x6000, 0x0010, "Overlay Rows", "OverlayRows", &[VR::UnsignedShort],
      one(),
    ),
  },
  MaskedItem {
    mask: 0xFF00_FFFF,
    card: 0x6000_0011,
    item: item(
      0x6000, 0x0011, "Overlay Columns", "OverlayColumns",
      &[VR::UnsignedShort], one(),
    ),
  },
  MaskedItem {
    mask: 0xFF00_FFFF,
    card: 0x6000_0040,
    item: item(
      0x6000, 0x0040, "Overlay Type", "OverlayType", &[VR::CodeString], one(),
    ),
  },
  MaskedItem {
    mask: 0xFF00_FFFF,
    card: 0x6000_0050,
    item: item(
      0x6000, 0x0050, "Overlay Origin", "OverlayOrigin", &[VR::SignedShort],
      multiple(2, 2),
    ),
  },
  MaskedItem {
    mask: 0xFF00_FFFF,
    card: 0x6000_0100,
    item: item(
      0x6000, 0x0100, "Overlay Bits Allocated", "OverlayBitsAllocated",
      &[VR::UnsignedShort], one(),
    ),
  },
  MaskedItem {
    mask: 0xFF00_FFFF,
    card: 0x6000_0102,
    item: item(
      0x6000, 0x0102, "Overlay Bit Position", "OverlayBitPosition",
      &[VR::UnsignedShort], one(),
    ),
  },
  MaskedItem {
    mask: 0xFF00_FFFF,
    card: 0x6000_3000,
    item: item(
      0x6000, 0x3000, "Overlay Data", "OverlayData",
      &[VR::OtherByteString, VR::OtherWordString], one(),
    ),
  },
  MaskedItem {
    mask: 0xFF00_FFFF,
    card: 0x5000_3000,
    item: retired_item(
      0x5000, 0x3000, "Curve Data", "CurveData",
      &[VR::OtherByteString, VR::OtherWordString], one(),
    ),
  },
];

/// Bundled private data element dictionary entries for well-known vendor
/// private creators.
///
static PRIVATE_TABLE: &[PrivateItem] = &[
  PrivateItem {
    creator: "SIEMENS CSA HEADER",
    group: 0x0029,
    element_offset: 0x08,
    item: item(
      0x0029, 0x0008, "CSA Image Header Type", "CSAImageHeaderType",
      &[VR::CodeString], one(),
    ),
  },
  PrivateItem {
    creator: "SIEMENS CSA HEADER",
    group: 0x0029,
    element_offset: 0x10,
    item: item(
      0x0029, 0x0010, "CSA Image Header Info", "CSAImageHeaderInfo",
      &[VR::OtherByteString], one(),
    ),
  },
  PrivateItem {
    creator: "SIEMENS CSA HEADER",
    group: 0x0029,
    element_offset: 0x18,
    item: item(
      0x0029, 0x0018, "CSA Series Header Type", "CSASeriesHeaderType",
      &[VR::CodeString], one(),
    ),
  },
  PrivateItem {
    creator: "SIEMENS CSA HEADER",
    group: 0x0029,
    element_offset: 0x20,
    item: item(
      0x0029, 0x0020, "CSA Series Header Info", "CSASeriesHeaderInfo",
      &[VR::OtherByteString], one(),
    ),
  },
  PrivateItem {
    creator: "GEMS_IDEN_01",
    group: 0x0009,
    element_offset: 0x01,
    item: item(
      0x0009, 0x0001, "Full Fidelity", "FullFidelity", &[VR::LongString],
      one(),
    ),
  },
  PrivateItem {
    creator: "GEMS_IDEN_01",
    group: 0x0009,
    element_offset: 0x02,
    item: item(
      0x0009, 0x0002, "Suite Id", "SuiteId", &[VR::ShortString], one(),
    ),
  },
  PrivateItem {
    creator: "GEMS_IDEN_01",
    group: 0x0009,
    element_offset: 0x04,
    item: item(
      0x0009, 0x0004, "Product Id", "ProductId", &[VR::ShortString], one(),
    ),
  },
];

/// Private dictionary entries registered at runtime via
/// [`register_private_items`]. Entries are leaked so they can be handed out
/// as `&'static` alongside the bundled table; registration is expected to
/// happen once, at startup.
///
#[cfg(feature = "std")]
static REGISTERED_PRIVATE_ITEMS: std::sync::RwLock<
  Vec<&'static PrivateItem>,
> = std::sync::RwLock::new(Vec::new());

/// Registers additional private data element dictionary entries for a custom
/// private creator. Subsequent calls to [`find`] with a matching private
/// creator will consult these entries.
///
/// Registration must be externally serialized against concurrent lookups,
/// i.e. call this during startup before reading begins.
///
#[cfg(feature = "std")]
pub fn register_private_items(items: Vec<PrivateItem>) {
  let mut registered = REGISTERED_PRIVATE_ITEMS.write().unwrap();

  for private_item in items {
    registered.push(Box::leak(Box::new(private_item)));
  }
}

/// Finds the dictionary entry for a data element tag. For private data tags
/// the creator string from the enclosing data set's relevant private creator
/// data element should be supplied.
///
#[allow(clippy::result_unit_err)]
pub fn find(
  tag: DataElementTag,
  private_creator: Option<&str>,
) -> Result<&'static Item, ()> {
  if let Some(private_creator) = private_creator {
    return find_private(tag, private_creator);
  }

  if let Ok(index) = TABLE.binary_search_by(|item| item.tag.cmp(&tag)) {
    return Ok(&TABLE[index]);
  }

  masked_pattern_entry(tag)
}

/// Finds the masked dictionary entry matching a data element tag, e.g.
/// `(60xx,3000)` for any of the Overlay Data tags. The masked table is small
/// and is scanned linearly.
///
#[allow(clippy::result_unit_err)]
pub fn masked_pattern_entry(
  tag: DataElementTag,
) -> Result<&'static Item, ()> {
  let tag = tag.to_int();

  for masked_item in MASKED_TABLE {
    if tag & masked_item.mask == masked_item.card {
      return Ok(&masked_item.item);
    }
  }

  Err(())
}

/// Finds the private dictionary entry for a private data tag given the
/// creator string that reserves its block. The creator comparison is
/// case-insensitive and ignores surrounding whitespace.
///
#[allow(clippy::result_unit_err)]
pub fn find_private(
  tag: DataElementTag,
  private_creator: &str,
) -> Result<&'static Item, ()> {
  if !tag.is_private_data() {
    return Err(());
  }

  let creator = private_creator.trim();
  let element_offset = (tag.element & 0x00FF) as u8;

  let matches = |entry: &PrivateItem| {
    entry.creator.eq_ignore_ascii_case(creator)
      && entry.group == tag.group
      && entry.element_offset == element_offset
  };

  for entry in PRIVATE_TABLE {
    if matches(entry) {
      return Ok(&entry.item);
    }
  }

  #[cfg(feature = "std")]
  for entry in REGISTERED_PRIVATE_ITEMS.read().unwrap().iter() {
    if matches(entry) {
      return Ok(&entry.item);
    }
  }

  Err(())
}

/// Finds the dictionary entry with the given keyword, e.g. `"PatientName"`.
/// The comparison is case-insensitive.
///
#[allow(clippy::result_unit_err)]
pub fn find_by_keyword(keyword: &str) -> Result<&'static Item, ()> {
  #[cfg(feature = "std")]
  {
    use std::collections::HashMap;
    use std::sync::OnceLock;

    static BY_KEYWORD: OnceLock<HashMap<String, &'static Item>> =
      OnceLock::new();

    let by_keyword = BY_KEYWORD.get_or_init(|| {
      TABLE
        .iter()
        .map(|item| (item.keyword.to_ascii_lowercase(), item))
        .collect()
    });

    by_keyword
      .get(&keyword.to_ascii_lowercase())
      .copied()
      .ok_or(())
  }

  #[cfg(not(feature = "std"))]
  TABLE
    .iter()
    .find(|item| item.keyword.eq_ignore_ascii_case(keyword))
    .ok_or(())
}

/// Returns the display name for a data element tag, or `"?"` if the tag has
/// no entry in the dictionary.
///
pub fn tag_name(
  tag: DataElementTag,
  private_creator: Option<&str>,
) -> &'static str {
  match find(tag, private_creator) {
    Ok(item) => item.name,
    Err(()) => "?",
  }
}

/// Returns a string containing both the tag and its display name, e.g.
/// `"(0010,0010) Patient's Name"`.
///
pub fn tag_with_name(
  tag: DataElementTag,
  private_creator: Option<&str>,
) -> String {
  format!("{} {}", tag, tag_name(tag, private_creator))
}

/// Returns whether a data element tag is one of the palette color or LUT
/// descriptor tags, which hold three 16-bit values the first and last of
/// which are always unsigned regardless of the declared VR.
///
pub fn is_lut_descriptor_tag(tag: DataElementTag) -> bool {
  tag == RED_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
    || tag == GREEN_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
    || tag == BLUE_PALETTE_COLOR_LOOKUP_TABLE_DESCRIPTOR.tag
    || tag == LUT_DESCRIPTOR.tag
}

/// The category of a UID registered by the DICOM standard.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UidCategory {
  TransferSyntax,
  SopClass,
  WellKnown,
}

/// An entry in the UID registry.
///
#[derive(Clone, Debug, PartialEq)]
pub struct UidItem {
  pub uid: &'static str,
  pub name: &'static str,
  pub category: UidCategory,
}

static UID_TABLE: &[UidItem] = &[
  UidItem {
    uid: "1.2.840.10008.1.1",
    name: "Verification SOP Class",
    category: UidCategory::SopClass,
  },
  UidItem {
    uid: "1.2.840.10008.1.2",
    name: "Implicit VR Little Endian",
    category: UidCategory::TransferSyntax,
  },
  UidItem {
    uid: "1.2.840.10008.1.2.1",
    name: "Explicit VR Little Endian",
    category: UidCategory::TransferSyntax,
  },
  UidItem {
    uid: "1.2.840.10008.1.2.1.99",
    name: "Deflated Explicit VR Little Endian",
    category: UidCategory::TransferSyntax,
  },
  UidItem {
    uid: "1.2.840.10008.1.2.2",
    name: "Explicit VR Big Endian (Retired)",
    category: UidCategory::TransferSyntax,
  },
  UidItem {
    uid: "1.2.840.10008.1.2.4.50",
    name: "JPEG Baseline (Process 1)",
    category: UidCategory::TransferSyntax,
  },
  UidItem {
    uid: "1.2.840.10008.1.2.5",
    name: "RLE Lossless",
    category: UidCategory::TransferSyntax,
  },
  UidItem {
    uid: "1.2.840.10008.5.1.4.1.1.1",
    name: "Computed Radiography Image Storage",
    category: UidCategory::SopClass,
  },
  UidItem {
    uid: "1.2.840.10008.5.1.4.1.1.2",
    name: "CT Image Storage",
    category: UidCategory::SopClass,
  },
  UidItem {
    uid: "1.2.840.10008.5.1.4.1.1.4",
    name: "MR Image Storage",
    category: UidCategory::SopClass,
  },
  UidItem {
    uid: "1.2.840.10008.5.1.4.1.1.6.1",
    name: "Ultrasound Image Storage",
    category: UidCategory::SopClass,
  },
  UidItem {
    uid: "1.2.840.10008.5.1.4.1.1.7",
    name: "Secondary Capture Image Storage",
    category: UidCategory::SopClass,
  },
  UidItem {
    uid: "1.2.840.10008.5.1.4.1.1.128",
    name: "Positron Emission Tomography Image Storage",
    category: UidCategory::SopClass,
  },
];

/// Returns the name of a registered UID, e.g. `"CT Image Storage"` for
/// `"1.2.840.10008.5.1.4.1.1.2"`.
///
#[allow(clippy::result_unit_err)]
pub fn uid_name(uid: &str) -> Result<&'static str, ()> {
  match UID_TABLE.iter().find(|item| item.uid == uid) {
    Some(item) => Ok(item.name),
    None => Err(()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn table_is_sorted_test() {
    for window in TABLE.windows(2) {
      assert!(
        window[0].tag < window[1].tag,
        "Dictionary table is not sorted at {}",
        window[1].tag
      );
    }
  }

  #[test]
  fn find_test() {
    assert_eq!(
      find(DataElementTag::new(0x0010, 0x0010), None),
      Ok(&PATIENT_NAME)
    );

    assert_eq!(find(DataElementTag::new(0x0011, 0x0010), None), Err(()));
  }

  #[test]
  fn masked_pattern_entry_test() {
    let item = find(DataElementTag::new(0x6004, 0x3000), None).unwrap();
    assert_eq!(item.name, "Overlay Data");

    assert_eq!(
      masked_pattern_entry(DataElementTag::new(0x6004, 0x3001)),
      Err(())
    );
  }

  #[test]
  fn find_private_test() {
    let tag = DataElementTag::new(0x0029, 0x1008);

    assert_eq!(
      find_private(tag, "SIEMENS CSA HEADER").unwrap().name,
      "CSA Image Header Type"
    );

    assert_eq!(
      find_private(tag, "siemens csa header ").unwrap().name,
      "CSA Image Header Type"
    );

    assert_eq!(find_private(tag, "UNKNOWN VENDOR"), Err(()));

    assert_eq!(
      find_private(DataElementTag::new(0x0029, 0x0008), "SIEMENS CSA HEADER"),
      Err(())
    );
  }

  #[cfg(feature = "std")]
  #[test]
  fn register_private_items_test() {
    register_private_items(vec![PrivateItem {
      creator: "TEST VENDOR",
      group: 0x0041,
      element_offset: 0x01,
      item: Item {
        tag: DataElementTag::new(0x0041, 0x0001),
        name: "Test Value",
        keyword: "TestValue",
        vrs: &[ValueRepresentation::LongString],
        multiplicity: ValueMultiplicity {
          min: 1,
          max: Some(1),
        },
        is_retired: false,
      },
    }]);

    assert_eq!(
      find_private(DataElementTag::new(0x0041, 0x1001), "TEST VENDOR")
        .unwrap()
        .name,
      "Test Value"
    );
  }

  #[test]
  fn find_by_keyword_test() {
    assert_eq!(find_by_keyword("PatientName"), Ok(&PATIENT_NAME));
    assert_eq!(find_by_keyword("patientname"), Ok(&PATIENT_NAME));
    assert_eq!(find_by_keyword("NotAKeyword"), Err(()));
  }

  #[test]
  fn tag_with_name_test() {
    assert_eq!(
      tag_with_name(DataElementTag::new(0x0010, 0x0010), None),
      "(0010,0010) Patient's Name"
    );

    assert_eq!(
      tag_with_name(DataElementTag::new(0x0011, 0x0010), None),
      "(0011,0010) ?"
    );
  }

  #[test]
  fn uid_name_test() {
    assert_eq!(
      uid_name("1.2.840.10008.1.2.1"),
      Ok("Explicit VR Little Endian")
    );

    assert_eq!(uid_name("1.2.3.4"), Err(()));
  }
}
