//! Canonical image model: 16-bit "low = dark" grayscale or 8-bit RGB

use super::auto_window;
use super::display_buffer::PixelFormat;
use crate::dicom::PhotometricInterpretation;
use crate::error::{ErrorKind, ImageError};
use crate::types::{BitDepth, Dimensions};

/// Window center/width in canonical (0..=65535) space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLevel {
    pub center: i32,
    pub width: i32,
}

impl WindowLevel {
    /// Whole canonical range
    pub const FULL_RANGE: Self = Self {
        center: 32767,
        width: 65535,
    };

    /// Fixed window used for RGB images, which are never windowed
    pub const RGB_DEFAULT: Self = Self {
        center: 128,
        width: 256,
    };

    /// Width is clamped to at least 1
    #[must_use]
    pub fn new(center: i32, width: i32) -> Self {
        Self {
            center,
            width: width.max(1),
        }
    }
}

/// Pixel storage, tagged by how it is displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelData {
    /// Canonical samples, windowed on display
    Grayscale(Vec<u16>),
    /// Interleaved R,G,B, displayed verbatim
    Rgb(Vec<u8>),
    /// 8-bit grayscale already tone mapped by the decoder; window controls are inert
    Preprocessed(Vec<u8>),
}

impl PixelData {
    /// Number of pixels (not bytes) held
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        match self {
            Self::Grayscale(pixels) => pixels.len(),
            Self::Rgb(pixels) => pixels.len() / 3,
            Self::Preprocessed(pixels) => pixels.len(),
        }
    }
}

/// A normalized image plus its current and original window
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalImage {
    pixels: PixelData,
    dimensions: Dimensions,
    photometric: PhotometricInterpretation,
    bit_depth: BitDepth,
    samples_per_pixel: u16,
    is_signed: bool,
    window: WindowLevel,
    original_window: WindowLevel,
}

impl CanonicalImage {
    /// Build an image; `window` also becomes the reset target.
    ///
    /// # Errors
    ///
    /// `InvalidImageDimensions` if width or height is zero or the pixel
    /// buffer does not hold exactly `width * height` pixels.
    pub fn new(
        pixels: PixelData,
        dimensions: Dimensions,
        photometric: PhotometricInterpretation,
        bit_depth: BitDepth,
        samples_per_pixel: u16,
        is_signed: bool,
        window: WindowLevel,
    ) -> Result<Self, ImageError> {
        if !dimensions.is_valid() {
            return Err(ImageError::new(ErrorKind::InvalidImageDimensions, "Invalid image dimensions")
                .with_details(dimensions.to_string()));
        }

        let expected = dimensions.pixel_count();
        let rgb_remainder = matches!(&pixels, PixelData::Rgb(p) if p.len() % 3 != 0);
        if pixels.pixel_count() != expected || rgb_remainder {
            return Err(ImageError::new(ErrorKind::InvalidImageDimensions, "Pixel buffer does not match image dimensions")
                .with_details(format!("expected {expected} pixels for {dimensions}, got {}", pixels.pixel_count())));
        }

        let window = WindowLevel::new(window.center, window.width);
        Ok(Self {
            pixels,
            dimensions,
            photometric,
            bit_depth,
            samples_per_pixel,
            is_signed,
            window,
            original_window: window,
        })
    }

    #[must_use]
    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    /// Canonical samples for windowed images
    #[must_use]
    pub fn grayscale_pixels(&self) -> Option<&[u16]> {
        match &self.pixels {
            PixelData::Grayscale(pixels) => Some(pixels),
            _ => None,
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    #[must_use]
    pub fn photometric(&self) -> &PhotometricInterpretation {
        &self.photometric
    }

    #[must_use]
    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    #[must_use]
    pub fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    #[must_use]
    pub fn is_rgb(&self) -> bool {
        matches!(self.pixels, PixelData::Rgb(_))
    }

    #[must_use]
    pub fn pixel_format(&self) -> PixelFormat {
        if self.is_rgb() {
            PixelFormat::Rgb888
        } else {
            PixelFormat::Grayscale8
        }
    }

    #[must_use]
    pub fn window(&self) -> WindowLevel {
        self.window
    }

    #[must_use]
    pub fn original_window(&self) -> WindowLevel {
        self.original_window
    }

    pub fn set_window(&mut self, center: i32, width: i32) {
        self.window = WindowLevel::new(center, width);
    }

    pub fn reset_window(&mut self) {
        self.window = self.original_window;
    }

    /// Replace the current window with a histogram estimate.
    ///
    /// Leaves the window untouched when there are no canonical samples.
    pub fn auto_window(&mut self) -> Option<WindowLevel> {
        let estimate = auto_window::estimate(self.grayscale_pixels()?)?;
        self.window = WindowLevel::new(estimate.center, estimate.width);
        Some(self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn grayscale(pixels: Vec<u16>, width: u32, height: u32) -> Result<CanonicalImage, ImageError> {
        CanonicalImage::new(
            PixelData::Grayscale(pixels),
            Dimensions::new(width, height),
            PhotometricInterpretation::Monochrome2,
            BitDepth::new(16, 16),
            1,
            false,
            WindowLevel::new(1000, 500),
        )
    }

    #[test]
    fn test_window_width_never_below_one() {
        assert_eq!(WindowLevel::new(10, 0).width, 1);
        assert_eq!(WindowLevel::new(10, -40).width, 1);

        let mut image = grayscale(vec![0; 4], 2, 2).unwrap();
        image.set_window(5, -3);
        assert_eq!(image.window(), WindowLevel { center: 5, width: 1 });
    }

    #[test]
    fn test_reset_restores_original_window() {
        let mut image = grayscale(vec![0, 100, 200, 300], 2, 2).unwrap();
        image.set_window(42, 7);
        assert_eq!(image.window(), WindowLevel::new(42, 7));
        image.reset_window();
        assert_eq!(image.window(), WindowLevel::new(1000, 500));
        assert_eq!(image.original_window(), WindowLevel::new(1000, 500));
    }

    #[test]
    fn test_auto_window_keeps_original_snapshot() {
        let mut image = grayscale(vec![100, 102, 104, 106], 2, 2).unwrap();
        let applied = image.auto_window().expect("grayscale image has samples");
        assert_eq!(applied, WindowLevel::new(103, 256));
        assert_eq!(image.original_window(), WindowLevel::new(1000, 500));
    }

    #[test]
    fn test_auto_window_on_rgb_is_noop() {
        let mut image = CanonicalImage::new(
            PixelData::Rgb(vec![0; 12]),
            Dimensions::new(2, 2),
            PhotometricInterpretation::Rgb,
            BitDepth::new(8, 8),
            3,
            false,
            WindowLevel::RGB_DEFAULT,
        )
        .unwrap();
        assert_eq!(image.auto_window(), None);
        assert_eq!(image.window(), WindowLevel::RGB_DEFAULT);
        assert_eq!(image.pixel_format(), PixelFormat::Rgb888);
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let err = grayscale(Vec::new(), 0, 4).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidImageDimensions);
    }

    #[test]
    fn test_rejects_mismatched_pixel_count() {
        assert_matches!(
            grayscale(vec![0; 5], 2, 2),
            Err(ImageError { kind: ErrorKind::InvalidImageDimensions, .. })
        );

        let rgb = CanonicalImage::new(
            PixelData::Rgb(vec![0; 13]),
            Dimensions::new(2, 2),
            PhotometricInterpretation::Rgb,
            BitDepth::new(8, 8),
            3,
            false,
            WindowLevel::RGB_DEFAULT,
        );
        assert_matches!(rgb, Err(ImageError { kind: ErrorKind::InvalidImageDimensions, .. }));
    }
}
