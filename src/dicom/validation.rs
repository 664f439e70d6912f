use super::parser::ImageHeader;
use crate::dicom::PhotometricInterpretation;
use crate::error::{ErrorKind, ImageError};

#[inline]
pub fn validate_photometric_samples(
    photometric_interpretation: &PhotometricInterpretation,
    samples_per_pixel: u16,
) -> Result<(), ImageError> {
    let is_valid = match (photometric_interpretation, samples_per_pixel) {
        (pi, 1) if pi.is_grayscale() || matches!(pi, PhotometricInterpretation::Palette) => true,
        (pi, 3) if pi.is_rgb() || pi.is_ycbcr() => true,
        (PhotometricInterpretation::Unknown(_), _) => true,
        _ => false,
    };

    if !is_valid {
        return Err(ImageError::new(
            ErrorKind::InvalidMetadata,
            format!(
                "Inconsistent photometric interpretation {photometric_interpretation} with samples per pixel {samples_per_pixel}"
            ),
        ));
    }

    Ok(())
}

#[inline]
pub fn validate_planar_configuration(
    planar_configuration: Option<u16>,
    photometric_interpretation: &PhotometricInterpretation,
) -> Result<(), ImageError> {
    match planar_configuration {
        None => Ok(()),
        Some(_) if !photometric_interpretation.is_rgb() && !photometric_interpretation.is_ycbcr() => {
            Err(ImageError::new(
                ErrorKind::InvalidMetadata,
                "Planar configuration should only be present for RGB or YCbCr images",
            ))
        }
        Some(0 | 1) => Ok(()),
        Some(other) => Err(ImageError::new(
            ErrorKind::InvalidMetadata,
            format!("Unsupported planar configuration: {other} (expected 0 or 1)"),
        )),
    }
}

#[inline]
pub fn validate_bits_allocated(bits_allocated: u16) -> Result<(), ImageError> {
    if !matches!(bits_allocated, 8 | 16 | 32) {
        return Err(ImageError::new(
            ErrorKind::InvalidMetadata,
            format!("Unsupported bits allocated: {bits_allocated} (expected 8, 16, or 32)"),
        ));
    }

    Ok(())
}

pub fn validate_header(header: &ImageHeader) -> Result<(), ImageError> {
    validate_photometric_samples(&header.photometric, header.samples_per_pixel)?;
    validate_planar_configuration(header.planar_configuration, &header.photometric)?;
    validate_bits_allocated(header.bit_depth.allocated)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photometric_samples() {
        assert!(validate_photometric_samples(&PhotometricInterpretation::Monochrome2, 1).is_ok());
        assert!(validate_photometric_samples(&PhotometricInterpretation::Rgb, 3).is_ok());
        assert!(validate_photometric_samples(&PhotometricInterpretation::YbrFull422, 3).is_ok());

        let err = validate_photometric_samples(&PhotometricInterpretation::Rgb, 1).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMetadata);
        assert!(validate_photometric_samples(&PhotometricInterpretation::Monochrome1, 3).is_err());
    }

    #[test]
    fn test_planar_configuration() {
        assert!(validate_planar_configuration(None, &PhotometricInterpretation::Monochrome2).is_ok());
        assert!(validate_planar_configuration(Some(1), &PhotometricInterpretation::Rgb).is_ok());
        assert!(validate_planar_configuration(Some(0), &PhotometricInterpretation::Monochrome2).is_err());
        assert!(validate_planar_configuration(Some(2), &PhotometricInterpretation::Rgb).is_err());
    }

    #[test]
    fn test_bits_allocated() {
        for bits in [8, 16, 32] {
            assert!(validate_bits_allocated(bits).is_ok());
        }
        let err = validate_bits_allocated(12).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidMetadata);
    }
}
