//! DICOM pixel data extraction
//!
//! Produces the little-endian bytes of the first frame. Native transfer
//! syntaxes are read as stored; encapsulated ones go through
//! `dicom-pixeldata`, whose decoders may also change the photometric
//! interpretation (JPEG YBR output arrives as RGB) and planar layout.

use super::photometric::PhotometricInterpretation;
use crate::error::{ErrorKind, ImageError};
use crate::types::TransferSyntax;
use anyhow::{Context, Result};
use dicom::dictionary_std::tags;
use dicom::object::{FileDicomObject, InMemDicomObject};
use dicom::pixeldata::{PixelDecoder, PlanarConfiguration};
use std::str::FromStr;

/// Pixel bytes of a whole object plus what the decoder says about them
#[derive(Debug, Clone, PartialEq)]
pub struct RawPixels {
    pub bytes: Vec<u8>,
    /// Set when a decoder rewrote the photometric interpretation
    pub photometric: Option<PhotometricInterpretation>,
    /// Set when a decoder rewrote the planar configuration
    pub planar_configuration: Option<u16>,
}

impl RawPixels {
    fn native(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            photometric: None,
            planar_configuration: None,
        }
    }
}

/// Extract pixel data from a DICOM object, handling compression and endianness
pub fn extract_pixel_data(
    obj: &FileDicomObject<InMemDicomObject>,
    bits_allocated: u16,
    transfer_syntax: &TransferSyntax,
) -> Result<RawPixels, ImageError> {
    if obj.get(tags::PIXEL_DATA).is_none() {
        return Err(ImageError::new(ErrorKind::MissingPixelData, "No pixel data element in file"));
    }

    let result = if transfer_syntax.is_compressed() {
        extract_decoded_pixel_data(obj)
    } else if bits_allocated == 16 && transfer_syntax.is_big_endian() {
        extract_big_endian_16bit(obj).map(RawPixels::native)
    } else {
        extract_raw_pixel_data(obj).map(RawPixels::native)
    };

    result.map_err(|err| {
        if transfer_syntax.is_compressed() {
            log::debug!("decoding {} failed: {err:#}", transfer_syntax.uid);
            ImageError::from_anyhow(
                ErrorKind::UnsupportedTransferSyntax,
                format!("Cannot decode transfer syntax {transfer_syntax}"),
                &err,
            )
        } else {
            ImageError::from_anyhow(ErrorKind::MissingPixelData, "Failed to read pixel data", &err)
        }
    })
}

/// Extract big-endian 16-bit pixel data and convert to little-endian
fn extract_big_endian_16bit(obj: &FileDicomObject<InMemDicomObject>) -> Result<Vec<u8>> {
    let raw_bytes = obj
        .get(tags::PIXEL_DATA)
        .context("Missing pixel data")?
        .to_bytes()
        .context("Failed to get raw pixel data bytes")?;

    if !raw_bytes.len().is_multiple_of(2) {
        anyhow::bail!("Invalid 16-bit pixel data length");
    }

    Ok(swap_16bit(&raw_bytes))
}

fn extract_raw_pixel_data(obj: &FileDicomObject<InMemDicomObject>) -> Result<Vec<u8>> {
    Ok(obj
        .get(tags::PIXEL_DATA)
        .context("Missing pixel data")?
        .to_bytes()
        .context("Failed to get raw pixel data bytes")?
        .to_vec())
}

/// Decode encapsulated pixel data; raw sample bytes avoid the decoder's LUTs
fn extract_decoded_pixel_data(obj: &FileDicomObject<InMemDicomObject>) -> Result<RawPixels> {
    let decoded = obj.decode_pixel_data().context("Failed to decode pixel data")?;

    let photometric = PhotometricInterpretation::from_str(decoded.photometric_interpretation().as_str()).ok();
    let planar_configuration = match decoded.planar_configuration() {
        PlanarConfiguration::Standard => 0,
        PlanarConfiguration::PixelFirst => 1,
    };

    Ok(RawPixels {
        bytes: decoded.data().to_vec(),
        photometric,
        planar_configuration: Some(planar_configuration),
    })
}

#[inline]
fn swap_16bit(bytes: &[u8]) -> Vec<u8> {
    bytes
        .chunks_exact(2)
        .flat_map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]).to_le_bytes())
        .collect()
}
