//! Color frame conversion to interleaved RGB888

use super::photometric::PhotometricInterpretation;
use crate::error::{ErrorKind, ImageError};
use crate::types::{BitDepth, Dimensions};

/// Layout of a color frame as stored in the file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorLayout<'a> {
    pub photometric: &'a PhotometricInterpretation,
    pub bit_depth: BitDepth,
    pub planar: bool,
    /// Two samples per pixel with shared chroma (native YBR_FULL_422)
    pub subsampled: bool,
}

/// Bytes occupied by one frame in this layout
#[must_use]
pub fn frame_size(layout: &ColorLayout<'_>, dimensions: Dimensions) -> usize {
    let samples = if layout.subsampled { 2 } else { 3 };
    dimensions.pixel_count() * samples * layout.bit_depth.bytes_per_sample()
}

/// Convert one RGB or YCbCr frame to interleaved RGB888
pub fn to_rgb888(frame: &[u8], layout: &ColorLayout<'_>, dimensions: Dimensions) -> Result<Vec<u8>, ImageError> {
    let expected = frame_size(layout, dimensions);
    if frame.len() < expected {
        return Err(ImageError::new(ErrorKind::MissingPixelData, "Color pixel data is truncated")
            .with_details(format!("expected {expected} bytes, got {}", frame.len())));
    }
    let frame = &frame[..expected];
    let pixel_count = dimensions.pixel_count();

    let samples = match layout.bit_depth.allocated {
        8 => frame.to_vec(),
        16 => reduce_16bit(frame, layout.bit_depth.stored),
        other => {
            return Err(ImageError::new(
                ErrorKind::InvalidMetadata,
                format!("Unsupported bits allocated for color images: {other} (expected 8 or 16)"),
            ));
        }
    };

    if layout.subsampled {
        if !dimensions.width.is_multiple_of(2) {
            return Err(ImageError::new(
                ErrorKind::InvalidImageDimensions,
                "YBR_FULL_422 requires an even number of columns",
            )
            .with_details(dimensions.to_string()));
        }
        let ycbcr = if layout.planar {
            upsample_422_planar(&samples, dimensions)
        } else {
            upsample_422_interleaved(&samples, dimensions)
        };
        return Ok(ycbcr_to_rgb(&ycbcr));
    }

    let interleaved = if layout.planar {
        interleave_planar(&samples, pixel_count)
    } else {
        samples
    };

    if layout.photometric.is_ycbcr() {
        Ok(ycbcr_to_rgb(&interleaved))
    } else {
        Ok(interleaved)
    }
}

/// Keep the top 8 of `bits_stored` bits of each little-endian sample
fn reduce_16bit(frame: &[u8], bits_stored: u16) -> Vec<u8> {
    let shift = bits_stored.clamp(8, 16) - 8;
    frame
        .chunks_exact(2)
        .map(|chunk| {
            let value = u16::from_le_bytes([chunk[0], chunk[1]]) >> shift;
            value.min(255) as u8
        })
        .collect()
}

/// RRR..GGG..BBB.. to RGBRGB..
fn interleave_planar(data: &[u8], pixel_count: usize) -> Vec<u8> {
    let (red, rest) = data.split_at(pixel_count);
    let (green, blue) = rest.split_at(pixel_count);

    red.iter()
        .zip(green)
        .zip(blue)
        .flat_map(|((&r, &g), &b)| [r, g, b])
        .collect()
}

/// `Y0 Y1 Cb Cr` groups to one full YCbCr triple per pixel
fn upsample_422_interleaved(data: &[u8], dimensions: Dimensions) -> Vec<u8> {
    let cols = dimensions.width as usize;
    let rows = dimensions.height as usize;
    let mut output = vec![0u8; rows * cols * 3];

    for y in 0..rows {
        let row_offset = y * cols * 2;

        for x in 0..cols {
            let out_idx = (y * cols + x) * 3;
            let group_offset = row_offset + (x / 2) * 4;

            output[out_idx] = data[group_offset + x % 2];
            output[out_idx + 1] = data[group_offset + 2];
            output[out_idx + 2] = data[group_offset + 3];
        }
    }

    output
}

/// Full Y plane followed by half-width Cb and Cr planes
fn upsample_422_planar(data: &[u8], dimensions: Dimensions) -> Vec<u8> {
    let cols = dimensions.width as usize;
    let rows = dimensions.height as usize;
    let pixel_count = rows * cols;
    let chroma_size = pixel_count / 2;

    let y_plane = &data[..pixel_count];
    let cb_plane = &data[pixel_count..pixel_count + chroma_size];
    let cr_plane = &data[pixel_count + chroma_size..pixel_count + chroma_size * 2];

    let mut output = vec![0u8; pixel_count * 3];
    for y in 0..rows {
        for x in 0..cols {
            let out_idx = (y * cols + x) * 3;
            let chroma_idx = y * (cols / 2) + x / 2;
            output[out_idx] = y_plane[y * cols + x];
            output[out_idx + 1] = cb_plane[chroma_idx];
            output[out_idx + 2] = cr_plane[chroma_idx];
        }
    }

    output
}

/// Full-range BT.601 YCbCr to RGB
fn ycbcr_to_rgb(ycbcr: &[u8]) -> Vec<u8> {
    ycbcr
        .chunks_exact(3)
        .flat_map(|pixel| {
            let y = f32::from(pixel[0]);
            let cb = f32::from(pixel[1]) - 128.0;
            let cr = f32::from(pixel[2]) - 128.0;

            let r = cr.mul_add(1.402, y);
            let g = cr.mul_add(-0.714_136, cb.mul_add(-0.344_136, y));
            let b = cb.mul_add(1.772, y);

            [
                r.round().clamp(0.0, 255.0) as u8,
                g.round().clamp(0.0, 255.0) as u8,
                b.round().clamp(0.0, 255.0) as u8,
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(photometric: &PhotometricInterpretation, planar: bool, subsampled: bool) -> ColorLayout<'_> {
        ColorLayout {
            photometric,
            bit_depth: BitDepth::new(8, 8),
            planar,
            subsampled,
        }
    }

    #[test]
    fn test_interleaved_rgb_passthrough() {
        let data: Vec<u8> = (0..12).collect();
        let out = to_rgb888(&data, &layout(&PhotometricInterpretation::Rgb, false, false), Dimensions::new(2, 2));
        assert_eq!(out.unwrap(), data);
    }

    #[test]
    fn test_planar_rgb_interleaved() {
        let data = [1, 2, 10, 20, 100, 200];
        let out = to_rgb888(&data, &layout(&PhotometricInterpretation::Rgb, true, false), Dimensions::new(2, 1));
        assert_eq!(out.unwrap(), vec![1, 10, 100, 2, 20, 200]);
    }

    #[test]
    fn test_trailing_frames_ignored() {
        let data: Vec<u8> = (0..24).collect();
        let out = to_rgb888(&data, &layout(&PhotometricInterpretation::Rgb, false, false), Dimensions::new(2, 2));
        assert_eq!(out.unwrap().len(), 12);
    }

    #[test]
    fn test_truncated_frame_is_error() {
        let err = to_rgb888(&[0; 5], &layout(&PhotometricInterpretation::Rgb, false, false), Dimensions::new(2, 1))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingPixelData);
    }

    #[test]
    fn test_ycbcr_neutral_chroma_is_gray() {
        let data = [0, 128, 128, 77, 128, 128, 255, 128, 128];
        let out = to_rgb888(&data, &layout(&PhotometricInterpretation::YbrFull, false, false), Dimensions::new(3, 1));
        assert_eq!(out.unwrap(), vec![0, 0, 0, 77, 77, 77, 255, 255, 255]);
    }

    #[test]
    fn test_ycbcr_primary_red() {
        // BT.601 full-range encoding of pure red
        let out = ycbcr_to_rgb(&[76, 85, 255]);
        assert!(out[0] >= 253, "{out:?}");
        assert!(out[1] <= 2, "{out:?}");
        assert!(out[2] <= 2, "{out:?}");
    }

    #[test]
    fn test_422_interleaved_upsampling() {
        // one row, two pixels sharing chroma
        let data = [50, 60, 128, 128];
        let photometric = PhotometricInterpretation::YbrFull422;
        let out = to_rgb888(&data, &layout(&photometric, false, true), Dimensions::new(2, 1));
        assert_eq!(out.unwrap(), vec![50, 50, 50, 60, 60, 60]);
    }

    #[test]
    fn test_422_planar_upsampling() {
        let data = [50, 60, 70, 80, 128, 128, 128, 128];
        let photometric = PhotometricInterpretation::YbrFull422;
        let out = to_rgb888(&data, &layout(&photometric, true, true), Dimensions::new(2, 2));
        assert_eq!(
            out.unwrap(),
            vec![50, 50, 50, 60, 60, 60, 70, 70, 70, 80, 80, 80]
        );
    }

    #[test]
    fn test_422_odd_width_rejected() {
        let photometric = PhotometricInterpretation::YbrFull422;
        let err = to_rgb888(&[0; 6], &layout(&photometric, false, true), Dimensions::new(3, 1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidImageDimensions);
    }

    #[test]
    fn test_16bit_rgb_reduced_to_8bit() {
        let mut layout = layout(&PhotometricInterpretation::Rgb, false, false);
        layout.bit_depth = BitDepth::new(16, 12);
        let data: Vec<u8> = [4095u16, 16, 0]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        assert_eq!(to_rgb888(&data, &layout, Dimensions::new(1, 1)).unwrap(), vec![255, 1, 0]);
    }
}
