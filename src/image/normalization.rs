//! Conversion of decoder output into a [`CanonicalImage`]
//!
//! 16 and 32-bit grayscale samples are scaled linearly so the decoder's
//! reported minimum lands on 0 and its maximum on 65535. Narrower
//! representations instead take the decoder's 8-bit output and widen it by
//! 257. MONOCHROME1 is inverted here, once; the result is always "low = dark".

use super::auto_window;
use super::canonical::{CanonicalImage, PixelData, WindowLevel};
use super::source::{DecodedImageSource, NativeSamples, NativeWindow, ValueRange};
use crate::dicom::{ColorModel, PhotometricInterpretation};
use crate::error::{ErrorKind, ImageError};

pub const CANONICAL_MAX: u16 = u16::MAX;

/// Where the initial window of a grayscale image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSource {
    /// Window stored with the image, converted to canonical space
    Supplied,
    /// Histogram estimate
    Auto,
}

/// Normalize one decoded frame.
///
/// # Errors
///
/// - `InvalidImageDimensions` for a zero width or height, or a sample count
///   that does not match the dimensions
/// - `MissingPixelData` when the source has no usable sample buffer
/// - `UnsupportedPhotometricInterpretation` for palette or unknown color spaces
pub fn normalize<S: DecodedImageSource + ?Sized>(source: &S) -> Result<CanonicalImage, ImageError> {
    let dimensions = source.dimensions();
    if !dimensions.is_valid() {
        return Err(ImageError::new(ErrorKind::InvalidImageDimensions, "Invalid image dimensions")
            .with_details(dimensions.to_string()));
    }

    match source.photometric().color_model() {
        ColorModel::Grayscale => normalize_grayscale(source),
        ColorModel::Rgb => normalize_rgb(source),
        ColorModel::Unsupported => Err(ImageError::new(
            ErrorKind::UnsupportedPhotometricInterpretation,
            "Unsupported photometric interpretation",
        )
        .with_details(source.photometric().to_string())),
    }
}

fn normalize_grayscale<S: DecodedImageSource + ?Sized>(source: &S) -> Result<CanonicalImage, ImageError> {
    let dimensions = source.dimensions();
    let invert = source.photometric().should_invert();
    let range = source.value_range();

    if let Some(processed) = source.preprocessed_8bit() {
        log::debug!("using decoder tone-mapped 8-bit output, window controls inert");
        return CanonicalImage::new(
            PixelData::Preprocessed(processed.to_vec()),
            dimensions,
            PhotometricInterpretation::Monochrome2,
            source.bit_depth(),
            source.samples_per_pixel(),
            source.is_signed(),
            WindowLevel::FULL_RANGE,
        );
    }

    let samples = source
        .samples()
        .filter(|samples| !samples.is_empty())
        .ok_or_else(|| ImageError::new(ErrorKind::MissingPixelData, "No pixel data found"))?;

    let pixel_count = dimensions.pixel_count();
    if samples.len() < pixel_count {
        return Err(ImageError::new(ErrorKind::InvalidImageDimensions, "Pixel count does not match image dimensions")
            .with_details(format!("expected {pixel_count} samples, got {}", samples.len())));
    }

    log::debug!(
        "value range {}..={} (scale {:.4}), {}-bit representation",
        range.min,
        range.max,
        range.scale(),
        samples.bits()
    );

    let mut pixels = match scale_to_canonical(samples, range) {
        Some(pixels) => pixels,
        None => {
            log::debug!("{}-bit representation, widening decoder 8-bit output", samples.bits());
            let windowed = source
                .windowed_8bit()
                .filter(|bytes| !bytes.is_empty())
                .ok_or_else(|| ImageError::new(ErrorKind::MissingPixelData, "No 8-bit output available from decoder"))?;
            widen_8bit(&windowed)
        }
    };
    pixels.truncate(pixel_count);

    if pixels.len() < pixel_count {
        return Err(ImageError::new(ErrorKind::MissingPixelData, "Decoder output shorter than image")
            .with_details(format!("expected {pixel_count} samples, got {}", pixels.len())));
    }

    if invert {
        log::debug!("inverting MONOCHROME1 samples");
        invert_canonical(&mut pixels);
    }

    let (window, window_source) = select_window(source.window(), range, invert, &pixels);
    log::debug!(
        "initial window center={} width={} ({window_source:?})",
        window.center,
        window.width
    );

    CanonicalImage::new(
        PixelData::Grayscale(pixels),
        dimensions,
        PhotometricInterpretation::Monochrome2,
        source.bit_depth(),
        source.samples_per_pixel(),
        source.is_signed(),
        window,
    )
}

fn normalize_rgb<S: DecodedImageSource + ?Sized>(source: &S) -> Result<CanonicalImage, ImageError> {
    let dimensions = source.dimensions();
    let expected = dimensions.pixel_count() * 3;

    let rgb = source
        .rgb_8bit()
        .filter(|rgb| rgb.len() >= expected)
        .ok_or_else(|| ImageError::new(ErrorKind::MissingPixelData, "Failed to get RGB pixel data"))?;

    CanonicalImage::new(
        PixelData::Rgb(rgb[..expected].to_vec()),
        dimensions,
        PhotometricInterpretation::Rgb,
        source.bit_depth(),
        3,
        false,
        WindowLevel::RGB_DEFAULT,
    )
}

/// Linear `[min, max] -> [0, 65535]` scaling of 16 and 32-bit samples.
///
/// Returns `None` for 8-bit representations, which take the decoder's
/// 8-bit output instead.
#[must_use]
pub fn scale_to_canonical(samples: &NativeSamples, range: ValueRange) -> Option<Vec<u16>> {
    match samples {
        NativeSamples::Unsigned16(v) => Some(scale_slice(v, range)),
        NativeSamples::Signed16(v) => Some(scale_slice(v, range)),
        NativeSamples::Unsigned32(v) => Some(scale_slice(v, range)),
        NativeSamples::Signed32(v) => Some(scale_slice(v, range)),
        NativeSamples::Unsigned8(_) | NativeSamples::Signed8(_) => None,
    }
}

fn scale_slice<T: Copy + Into<f64>>(samples: &[T], range: ValueRange) -> Vec<u16> {
    let span = range.span();
    samples
        .iter()
        .map(|&sample| {
            // multiply before dividing so `max` lands exactly on 65535
            let normalized = (sample.into() - range.min) * f64::from(CANONICAL_MAX) / span;
            normalized.clamp(0.0, f64::from(CANONICAL_MAX)) as u16
        })
        .collect()
}

/// Exact 8 to 16-bit expansion (`0xAB -> 0xABAB`)
#[must_use]
pub fn widen_8bit(bytes: &[u8]) -> Vec<u16> {
    bytes.iter().map(|&b| u16::from(b) * 257).collect()
}

pub fn invert_canonical(pixels: &mut [u16]) {
    for pixel in pixels {
        *pixel = CANONICAL_MAX - *pixel;
    }
}

/// Convert a native window into canonical space with the same scale as the
/// pixels. Uses the decoder range even when the pixels took the 8-bit path.
#[must_use]
pub fn to_canonical_window(native: NativeWindow, range: ValueRange, invert: bool) -> WindowLevel {
    let scale = range.scale();
    let center = (native.center - range.min) * scale;
    let center = if invert { f64::from(CANONICAL_MAX) - center } else { center };

    WindowLevel {
        center: saturate_i32(center),
        width: saturate_i32(native.width * scale),
    }
}

/// Truncating cast that pins out-of-range values to the `i32` bounds
fn saturate_i32(value: f64) -> i32 {
    value.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

/// Supplied window if it converts to a positive width, histogram estimate otherwise
#[must_use]
pub fn select_window(
    native: Option<NativeWindow>,
    range: ValueRange,
    invert: bool,
    pixels: &[u16],
) -> (WindowLevel, WindowSource) {
    let supplied = native
        .filter(|window| window.width > 0.0)
        .map(|window| to_canonical_window(window, range, invert))
        .filter(|window| window.width > 0);

    match supplied {
        Some(window) => (WindowLevel::new(window.center, window.width), WindowSource::Supplied),
        None => {
            let window = auto_window::estimate(pixels).unwrap_or(WindowLevel::FULL_RANGE);
            (WindowLevel::new(window.center, window.width), WindowSource::Auto)
        }
    }
}
