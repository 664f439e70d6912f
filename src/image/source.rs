//! Boundary between a decoding backend and the normalization core
//!
//! A backend hands over one decoded frame through [`DecodedImageSource`]:
//! geometry, bit depth, photometric interpretation, the samples in the
//! backend's internal representation and the min/max of those samples.

use crate::dicom::PhotometricInterpretation;
use crate::types::{BitDepth, Dimensions};

/// Decoder-native sample buffer, one sample per pixel
#[derive(Debug, Clone, PartialEq)]
pub enum NativeSamples {
    Unsigned8(Vec<u8>),
    Signed8(Vec<i8>),
    Unsigned16(Vec<u16>),
    Signed16(Vec<i16>),
    Unsigned32(Vec<u32>),
    Signed32(Vec<i32>),
}

impl NativeSamples {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Unsigned8(v) => v.len(),
            Self::Signed8(v) => v.len(),
            Self::Unsigned16(v) => v.len(),
            Self::Signed16(v) => v.len(),
            Self::Unsigned32(v) => v.len(),
            Self::Signed32(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of the representation in bits
    #[must_use]
    pub fn bits(&self) -> u8 {
        match self {
            Self::Unsigned8(_) | Self::Signed8(_) => 8,
            Self::Unsigned16(_) | Self::Signed16(_) => 16,
            Self::Unsigned32(_) | Self::Signed32(_) => 32,
        }
    }

    /// Samples widened to `f64`, in buffer order
    pub fn iter_f64(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Self::Unsigned8(v) => Box::new(v.iter().map(|&s| f64::from(s))),
            Self::Signed8(v) => Box::new(v.iter().map(|&s| f64::from(s))),
            Self::Unsigned16(v) => Box::new(v.iter().map(|&s| f64::from(s))),
            Self::Signed16(v) => Box::new(v.iter().map(|&s| f64::from(s))),
            Self::Unsigned32(v) => Box::new(v.iter().map(|&s| f64::from(s))),
            Self::Signed32(v) => Box::new(v.iter().map(|&s| f64::from(s))),
        }
    }

    /// Actual min/max of the samples, `None` when empty
    #[must_use]
    pub fn value_range(&self) -> Option<ValueRange> {
        self.iter_f64().fold(None, |acc, value| match acc {
            None => Some(ValueRange::new(value, value)),
            Some(range) => Some(ValueRange::new(range.min.min(value), range.max.max(value))),
        })
    }
}

/// Decoder-reported sample range, in the decoder's value space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `max - min`, never below 1
    #[inline]
    #[must_use]
    pub fn span(&self) -> f64 {
        let span = self.max - self.min;
        if span < 1.0 { 1.0 } else { span }
    }

    /// Factor mapping the span onto the canonical 16-bit range
    #[inline]
    #[must_use]
    pub fn scale(&self) -> f64 {
        65535.0 / self.span()
    }
}

/// Window/level as stored in the file, in the decoder's value space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeWindow {
    pub center: f64,
    pub width: f64,
}

impl NativeWindow {
    #[must_use]
    pub fn new(center: f64, width: f64) -> Self {
        Self { center, width }
    }
}

/// One decoded frame as produced by a decoding backend
pub trait DecodedImageSource {
    fn dimensions(&self) -> Dimensions;

    fn bit_depth(&self) -> BitDepth;

    fn samples_per_pixel(&self) -> u16;

    fn is_signed(&self) -> bool;

    fn photometric(&self) -> &PhotometricInterpretation;

    /// Grayscale samples in the internal representation, `None` if absent
    fn samples(&self) -> Option<&NativeSamples>;

    /// Min/max of [`Self::samples`] after any rescale the backend applied
    fn value_range(&self) -> ValueRange;

    fn window(&self) -> Option<NativeWindow>;

    /// Interleaved 8-bit RGB for color sources
    fn rgb_8bit(&self) -> Option<&[u8]>;

    /// 8-bit output for representations the normalizer does not scale itself.
    ///
    /// The default applies a min/max window over the samples.
    fn windowed_8bit(&self) -> Option<Vec<u8>> {
        self.samples().map(min_max_window_8bit)
    }

    /// Display-ready 8-bit grayscale from a backend doing its own tone mapping
    fn preprocessed_8bit(&self) -> Option<&[u8]> {
        None
    }
}

/// Map the full sample range onto 0..=255
#[must_use]
pub fn min_max_window_8bit(samples: &NativeSamples) -> Vec<u8> {
    let Some(range) = samples.value_range() else {
        return Vec::new();
    };
    let span = range.span();

    samples
        .iter_f64()
        .map(|value| (((value - range.min) / span) * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect()
}
