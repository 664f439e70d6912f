//! 8-bit display buffers for a rendering surface

use super::canonical::{CanonicalImage, PixelData};
use super::window::WindowLevelTransform;
use crate::types::Dimensions;

/// Layout of a [`DisplayBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Grayscale8,
    Rgb888,
}

impl PixelFormat {
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Grayscale8 => 1,
            Self::Rgb888 => 3,
        }
    }
}

/// Flat 8-bit pixels ready for presentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBuffer {
    data: Vec<u8>,
    dimensions: Dimensions,
    format: PixelFormat,
}

impl DisplayBuffer {
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }
}

/// Render `image` with the given window.
///
/// RGB and decoder-preprocessed images are returned as stored; only canonical
/// grayscale goes through the window transform.
#[must_use]
pub fn build(image: &CanonicalImage, center: i32, width: i32) -> DisplayBuffer {
    let dimensions = image.dimensions();

    let (data, format) = match image.pixels() {
        PixelData::Rgb(rgb) => (rgb.clone(), PixelFormat::Rgb888),
        PixelData::Preprocessed(gray) => (gray.clone(), PixelFormat::Grayscale8),
        PixelData::Grayscale(pixels) => {
            let transform = WindowLevelTransform::new(center, width, false);
            (pixels.iter().map(|&p| transform.map(p)).collect(), PixelFormat::Grayscale8)
        }
    };

    DisplayBuffer {
        data,
        dimensions,
        format,
    }
}

/// Render `image` as RGB888, broadcasting gray values into all three channels
#[must_use]
pub fn build_rgb(image: &CanonicalImage, center: i32, width: i32) -> DisplayBuffer {
    let buffer = build(image, center, width);
    if buffer.format == PixelFormat::Rgb888 {
        return buffer;
    }

    let data = buffer.data.iter().flat_map(|&gray| [gray, gray, gray]).collect();

    DisplayBuffer {
        data,
        dimensions: buffer.dimensions,
        format: PixelFormat::Rgb888,
    }
}
