use super::metadata::{DicomMetadata, ImageCharacteristics, WindowInfo};
use super::photometric::PhotometricInterpretation;
use crate::error::{ErrorKind, ImageError};
use crate::image::NativeWindow;
use crate::types::{
    BitDepth, Dimensions, EquipmentInfo, PatientInfo, PixelAspectRatio, RescaleParams, SOPClass, SeriesInfo,
    StudyInfo, TransferSyntax,
};
use dicom::core::Tag;
use dicom::core::dictionary::UidDictionary;
use dicom::dictionary_std::sop_class;
use dicom::dictionary_std::tags;
use dicom::encoding::TransferSyntaxIndex;
use dicom::object::{FileDicomObject, InMemDicomObject};
use dicom::transfer_syntax::TransferSyntaxRegistry;
use std::str::FromStr;

/// Partial metadata for error message context
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub modality: Option<String>,
    pub sop_class: Option<SOPClass>,
}

impl ErrorContext {
    pub fn format_error(&self, tag_name: &str) -> String {
        let mut parts = Vec::new();

        if let Some(modality) = &self.modality {
            parts.push(format!("Modality: {modality}"));
        }

        if let Some(sc) = &self.sop_class {
            parts.push(format!("SOP Class: {sc}"));
        }

        if parts.is_empty() {
            format!("Missing or invalid {tag_name} tag")
        } else {
            format!(
                "Missing or invalid {tag_name} tag - this may be a non-image DICOM file ({})",
                parts.join(", ")
            )
        }
    }

    fn missing(&self, tag_name: &str) -> ImageError {
        ImageError::new(ErrorKind::InvalidMetadata, self.format_error(tag_name))
    }
}

impl From<&InMemDicomObject> for ErrorContext {
    fn from(obj: &InMemDicomObject) -> Self {
        ErrorContext {
            modality: read_string(obj, tags::MODALITY),
            sop_class: extract_sop_class(obj),
        }
    }
}

/// Pixel-relevant header fields of an image object
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHeader {
    pub dimensions: Dimensions,
    pub bit_depth: BitDepth,
    pub samples_per_pixel: u16,
    pub is_signed: bool,
    pub photometric: PhotometricInterpretation,
    pub planar_configuration: Option<u16>,
    pub number_of_frames: u32,
    pub rescale: RescaleParams,
    pub window: Option<NativeWindow>,
}

impl ImageHeader {
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.dimensions.pixel_count() * usize::from(self.samples_per_pixel) * self.bit_depth.bytes_per_sample()
    }
}

pub fn extract_image_header(obj: &InMemDicomObject, error_context: &ErrorContext) -> Result<ImageHeader, ImageError> {
    let dimensions = extract_dimensions(obj, error_context)?;
    let bit_depth = extract_bit_depth(obj, error_context)?;

    let photometric = read_string(obj, tags::PHOTOMETRIC_INTERPRETATION)
        .and_then(|s| PhotometricInterpretation::from_str(&s).ok())
        .unwrap_or(PhotometricInterpretation::Monochrome2);

    let is_signed = obj
        .get(tags::PIXEL_REPRESENTATION)
        .and_then(|e| e.to_int::<u16>().ok())
        .is_some_and(|rep| rep == 1);

    Ok(ImageHeader {
        dimensions,
        bit_depth,
        samples_per_pixel: extract_samples_per_pixel(obj),
        is_signed,
        photometric,
        planar_configuration: extract_planar_configuration(obj),
        number_of_frames: extract_number_of_frames(obj),
        rescale: extract_rescale_params(obj),
        window: extract_window(obj),
    })
}

pub fn extract_dimensions(obj: &InMemDicomObject, error_context: &ErrorContext) -> Result<Dimensions, ImageError> {
    let rows = obj
        .get(tags::ROWS)
        .and_then(|e| e.to_int::<u32>().ok())
        .ok_or_else(|| error_context.missing("Rows"))?;

    let cols = obj
        .get(tags::COLUMNS)
        .and_then(|e| e.to_int::<u32>().ok())
        .ok_or_else(|| error_context.missing("Columns"))?;

    let dimensions = Dimensions::new(cols, rows);
    if !dimensions.is_valid() {
        return Err(ImageError::new(ErrorKind::InvalidImageDimensions, "Invalid image dimensions")
            .with_details(dimensions.to_string()));
    }

    Ok(dimensions)
}

pub fn extract_rescale_params(obj: &InMemDicomObject) -> RescaleParams {
    // Optional; mostly present for CT/PET to produce Hounsfield or SUV units
    let slope = read_first_float(obj, tags::RESCALE_SLOPE)
        .filter(|slope| *slope != 0.0)
        .unwrap_or(1.0);
    let intercept = read_first_float(obj, tags::RESCALE_INTERCEPT).unwrap_or(0.0);

    RescaleParams::new(slope, intercept)
}

/// First WindowCenter/WindowWidth pair, in rescaled units
pub fn extract_window(obj: &InMemDicomObject) -> Option<NativeWindow> {
    let center = read_first_float(obj, tags::WINDOW_CENTER)?;
    let width = read_first_float(obj, tags::WINDOW_WIDTH)?;
    Some(NativeWindow::new(center, width))
}

pub fn extract_pixel_aspect_ratio(obj: &InMemDicomObject) -> Option<PixelAspectRatio> {
    read_string(obj, tags::PIXEL_ASPECT_RATIO).and_then(|s| {
        let (vertical, horizontal) = s.split_once('\\')?;
        let vertical = vertical.trim().parse::<f64>().ok()?;
        let horizontal = horizontal.trim().parse::<f64>().ok()?;
        (horizontal != 0.0).then(|| PixelAspectRatio::new(vertical, horizontal))
    })
}

#[inline]
pub fn extract_number_of_frames(obj: &InMemDicomObject) -> u32 {
    obj.get(tags::NUMBER_OF_FRAMES)
        .and_then(|e| e.to_int::<u32>().ok())
        .unwrap_or(1)
}

#[inline]
pub fn extract_samples_per_pixel(obj: &InMemDicomObject) -> u16 {
    obj.get(tags::SAMPLES_PER_PIXEL)
        .and_then(|e| e.to_int::<u16>().ok())
        .unwrap_or(1)
}

pub fn extract_bit_depth(obj: &InMemDicomObject, error_context: &ErrorContext) -> Result<BitDepth, ImageError> {
    let allocated = obj
        .get(tags::BITS_ALLOCATED)
        .and_then(|e| e.to_int::<u16>().ok())
        .ok_or_else(|| error_context.missing("Bits Allocated"))?;

    // Bits Stored defaults to Bits Allocated when absent
    let stored = obj
        .get(tags::BITS_STORED)
        .and_then(|e| e.to_int::<u16>().ok())
        .unwrap_or(allocated);

    Ok(BitDepth::new(allocated, stored.min(allocated)))
}

#[inline]
pub fn extract_planar_configuration(obj: &InMemDicomObject) -> Option<u16> {
    obj.get(tags::PLANAR_CONFIGURATION)
        .and_then(|e| e.to_int::<u16>().ok())
}

pub fn extract_transfer_syntax(obj: &FileDicomObject<InMemDicomObject>) -> TransferSyntax {
    let uid = obj.meta().transfer_syntax().trim_end_matches('\0').to_string();
    let name = TransferSyntaxRegistry
        .get(&uid)
        .map_or_else(|| "Unknown".to_string(), |ts| ts.name().to_string());

    TransferSyntax::new(uid, name)
}

pub fn extract_sop_class(obj: &InMemDicomObject) -> Option<SOPClass> {
    read_string(obj, tags::SOP_CLASS_UID).and_then(|uid| {
        sop_class::StandardSopClassDictionary
            .by_uid(&uid)
            .map(|entry| SOPClass::new(uid.clone(), entry.name.to_string()))
    })
}

pub fn extract_patient_info(obj: &InMemDicomObject) -> PatientInfo {
    PatientInfo {
        name: read_string(obj, tags::PATIENT_NAME),
        id: read_string(obj, tags::PATIENT_ID),
        birth_date: read_string(obj, tags::PATIENT_BIRTH_DATE),
        sex: read_string(obj, tags::PATIENT_SEX),
        age: read_string(obj, tags::PATIENT_AGE),
    }
}

pub fn extract_study_info(obj: &InMemDicomObject) -> StudyInfo {
    StudyInfo {
        accession_number: read_string(obj, tags::ACCESSION_NUMBER),
        date: read_string(obj, tags::STUDY_DATE),
        time: read_string(obj, tags::STUDY_TIME),
        description: read_string(obj, tags::STUDY_DESCRIPTION),
        instance_uid: read_string(obj, tags::STUDY_INSTANCE_UID),
    }
}

pub fn extract_series_info(obj: &InMemDicomObject) -> SeriesInfo {
    SeriesInfo {
        date: read_string(obj, tags::SERIES_DATE),
        time: read_string(obj, tags::SERIES_TIME),
        description: read_string(obj, tags::SERIES_DESCRIPTION),
        instance_uid: read_string(obj, tags::SERIES_INSTANCE_UID),
        number: read_string(obj, tags::SERIES_NUMBER),
        modality: read_string(obj, tags::MODALITY),
        slice_thickness: read_first_float(obj, tags::SLICE_THICKNESS),
    }
}

pub fn extract_equipment_info(obj: &InMemDicomObject) -> EquipmentInfo {
    EquipmentInfo {
        manufacturer: read_string(obj, tags::MANUFACTURER),
        model_name: read_string(obj, tags::MANUFACTURER_MODEL_NAME),
        station_name: read_string(obj, tags::STATION_NAME),
        institution_name: read_string(obj, tags::INSTITUTION_NAME),
    }
}

pub fn extract_image_characteristics(obj: &InMemDicomObject) -> ImageCharacteristics {
    let read_u16 = |tag| obj.get(tag).and_then(|e| e.to_int::<u16>().ok());
    let read_u32 = |tag| obj.get(tag).and_then(|e| e.to_int::<u32>().ok());

    ImageCharacteristics {
        rows: read_u32(tags::ROWS),
        columns: read_u32(tags::COLUMNS),
        bits_allocated: read_u16(tags::BITS_ALLOCATED),
        bits_stored: read_u16(tags::BITS_STORED),
        high_bit: read_u16(tags::HIGH_BIT),
        samples_per_pixel: read_u16(tags::SAMPLES_PER_PIXEL),
        photometric_interpretation: read_string(obj, tags::PHOTOMETRIC_INTERPRETATION),
        pixel_spacing: read_string(obj, tags::PIXEL_SPACING),
        pixel_aspect_ratio: extract_pixel_aspect_ratio(obj),
        number_of_frames: extract_number_of_frames(obj),
        instance_number: read_string(obj, tags::INSTANCE_NUMBER),
        image_type: read_string(obj, tags::IMAGE_TYPE),
    }
}

pub fn extract_window_info(obj: &InMemDicomObject) -> WindowInfo {
    WindowInfo {
        center: read_first_float(obj, tags::WINDOW_CENTER),
        width: read_first_float(obj, tags::WINDOW_WIDTH),
        explanation: read_string(obj, tags::WINDOW_CENTER_WIDTH_EXPLANATION),
    }
}

/// Display metadata; never fails, absent tags stay `None`
pub fn extract_metadata(obj: &FileDicomObject<InMemDicomObject>) -> DicomMetadata {
    DicomMetadata {
        patient: extract_patient_info(obj),
        study: extract_study_info(obj),
        series: extract_series_info(obj),
        equipment: extract_equipment_info(obj),
        image: extract_image_characteristics(obj),
        window: extract_window_info(obj),
        sop_class: extract_sop_class(obj),
        sop_instance_uid: read_string(obj, tags::SOP_INSTANCE_UID),
        transfer_syntax: extract_transfer_syntax(obj),
    }
}

/// Trimmed string value; empty values count as absent
fn read_string(obj: &InMemDicomObject, tag: Tag) -> Option<String> {
    obj.get(tag)
        .and_then(|e| e.value().to_str().ok())
        .map(|s| s.trim().trim_end_matches('\0').to_string())
        .filter(|s| !s.is_empty())
}

/// First value of a possibly multi-valued numeric tag
fn read_first_float(obj: &InMemDicomObject, tag: Tag) -> Option<f64> {
    read_string(obj, tag)
        .and_then(|s| s.split('\\').next().and_then(|v| v.trim().parse::<f64>().ok()))
        .or_else(|| obj.get(tag).and_then(|e| e.to_float64().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom::core::{DataElement, PrimitiveValue, VR};

    fn image_object() -> InMemDicomObject {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(2_u16)));
        obj.put(DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(3_u16)));
        obj.put(DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)));
        obj.put(DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(12_u16)));
        obj.put(DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(1_u16)));
        obj.put(DataElement::new(tags::PHOTOMETRIC_INTERPRETATION, VR::CS, PrimitiveValue::from("MONOCHROME1")));
        obj.put(DataElement::new(tags::WINDOW_CENTER, VR::DS, PrimitiveValue::from("40\\80")));
        obj.put(DataElement::new(tags::WINDOW_WIDTH, VR::DS, PrimitiveValue::from("400\\800")));
        obj.put(DataElement::new(tags::RESCALE_SLOPE, VR::DS, PrimitiveValue::from("1")));
        obj.put(DataElement::new(tags::RESCALE_INTERCEPT, VR::DS, PrimitiveValue::from("-1024")));
        obj.put(DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("CT")));
        obj
    }

    #[test]
    fn test_image_header() {
        let obj = image_object();
        let header = extract_image_header(&obj, &ErrorContext::from(&obj)).unwrap();

        assert_eq!(header.dimensions, Dimensions::new(3, 2));
        assert_eq!(header.bit_depth, BitDepth::new(16, 12));
        assert!(header.is_signed);
        assert_eq!(header.photometric, PhotometricInterpretation::Monochrome1);
        assert_eq!(header.rescale, RescaleParams::new(1.0, -1024.0));
        assert_eq!(header.window, Some(NativeWindow::new(40.0, 400.0)));
        assert_eq!(header.samples_per_pixel, 1);
        assert_eq!(header.number_of_frames, 1);
        assert_eq!(header.frame_size(), 12);
    }

    #[test]
    fn test_missing_rows_mentions_context() {
        let mut obj = image_object();
        obj.remove_element(tags::ROWS);
        let err = extract_image_header(&obj, &ErrorContext::from(&obj)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMetadata);
        assert!(err.message.contains("Rows"));
        assert!(err.message.contains("Modality: CT"));
    }

    #[test]
    fn test_zero_rows_is_invalid_dimensions() {
        let mut obj = image_object();
        obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(0_u16)));
        let err = extract_dimensions(&obj, &ErrorContext::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidImageDimensions);
    }

    #[test]
    fn test_defaults_when_optional_tags_absent() {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(1_u16)));
        obj.put(DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(1_u16)));
        obj.put(DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(8_u16)));

        let header = extract_image_header(&obj, &ErrorContext::default()).unwrap();
        assert_eq!(header.bit_depth, BitDepth::new(8, 8));
        assert!(!header.is_signed);
        assert_eq!(header.photometric, PhotometricInterpretation::Monochrome2);
        assert!(header.rescale.is_identity());
        assert_eq!(header.window, None);
    }

    #[test]
    fn test_patient_and_window_info() {
        let mut obj = image_object();
        obj.put(DataElement::new(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^Jane ")));
        obj.put(DataElement::new(
            tags::WINDOW_CENTER_WIDTH_EXPLANATION,
            VR::LO,
            PrimitiveValue::from("SOFT TISSUE"),
        ));

        assert_eq!(extract_patient_info(&obj).name.as_deref(), Some("Doe^Jane"));
        let window = extract_window_info(&obj);
        assert_eq!(window.center, Some(40.0));
        assert_eq!(window.width, Some(400.0));
        assert_eq!(window.explanation.as_deref(), Some("SOFT TISSUE"));
        assert_eq!(extract_series_info(&obj).modality.as_deref(), Some("CT"));
    }

    #[test]
    fn test_pixel_aspect_ratio() {
        let mut obj = image_object();
        obj.put(DataElement::new(tags::PIXEL_ASPECT_RATIO, VR::IS, PrimitiveValue::from("2\\1")));
        assert_eq!(extract_pixel_aspect_ratio(&obj), Some(PixelAspectRatio::new(2.0, 1.0)));
    }
}
