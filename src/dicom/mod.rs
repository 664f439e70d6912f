//! DICOM decoding backend
//!
//! Opens files with the `dicom` crate, extracts display metadata and turns
//! the first frame into a [`DicomSource`] for the normalizer.

mod color;
mod error;
mod metadata;
mod parser;
mod photometric;
mod pixel_data;
mod source;
mod validation;

// Re-export public API
pub use error::ProcessError;
pub use metadata::{DicomMetadata, ImageCharacteristics, WindowInfo};
pub use photometric::{ColorModel, PhotometricInterpretation};
pub use pixel_data::RawPixels;
pub use source::DicomSource;

use crate::error::{ErrorKind, ImageError};
use crate::image::{CanonicalImage, normalize};
use dicom::object::{FileDicomObject, InMemDicomObject, open_file};
use std::path::Path;

pub type DicomFile = FileDicomObject<InMemDicomObject>;

/// A normalized image together with the metadata it was read with
#[derive(Debug, Clone)]
pub struct LoadedStudy {
    pub image: CanonicalImage,
    pub metadata: DicomMetadata,
}

/// Open and parse a DICOM file
///
/// # Errors
///
/// `FileNotFound` when nothing exists at `file_path`, `InvalidFormat` when the
/// file cannot be parsed as DICOM
pub fn open_dicom_file(file_path: &Path) -> Result<DicomFile, ImageError> {
    if !file_path.exists() {
        return Err(ImageError::new(ErrorKind::FileNotFound, "File not found")
            .with_details(file_path.display().to_string()));
    }

    open_file(file_path).map_err(|err| {
        ImageError::new(ErrorKind::InvalidFormat, "Failed to open DICOM file")
            .with_details(format!("{}: {err}", file_path.display()))
    })
}

/// Display metadata of an opened file
#[must_use]
pub fn extract_metadata(obj: &DicomFile) -> DicomMetadata {
    parser::extract_metadata(obj)
}

/// Decode the first frame of an opened file and normalize it
///
/// # Errors
///
/// Any [`ErrorKind`] from header validation, pixel extraction or normalization
pub fn decode_image(obj: &DicomFile) -> Result<CanonicalImage, ImageError> {
    let transfer_syntax = parser::extract_transfer_syntax(obj);
    let header = parser::extract_image_header(obj, &parser::ErrorContext::from(&**obj))?;
    validation::validate_header(&header)?;

    log::debug!(
        "decoding {} {} image, {}, {} frame(s), transfer syntax {}",
        header.dimensions,
        header.photometric,
        header.bit_depth,
        header.number_of_frames,
        transfer_syntax
    );

    let pixels = pixel_data::extract_pixel_data(obj, header.bit_depth.allocated, &transfer_syntax)?;
    let source = DicomSource::from_header(&header, &pixels, transfer_syntax.is_compressed())?;
    normalize(&source)
}

/// Open, decode and normalize a DICOM file
///
/// # Errors
///
/// See [`open_dicom_file`] and [`decode_image`]
pub fn load_study(file_path: &Path) -> Result<LoadedStudy, ImageError> {
    let obj = open_dicom_file(file_path)?;
    let metadata = extract_metadata(&obj);
    let image = decode_image(&obj)?;

    Ok(LoadedStudy { image, metadata })
}
