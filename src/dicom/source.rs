//! [`DecodedImageSource`] backed by a parsed DICOM object
//!
//! Stored values are masked to Bits Stored, sign-extended when Pixel
//! Representation says so and passed through the modality rescale. The
//! narrowest integer representation that holds every rescaled value of the
//! stored range is used internally, so 8-bit data goes through the decoder's
//! windowed 8-bit path and wider data through linear scaling.

use super::color::{self, ColorLayout};
use super::parser::{self, ErrorContext, ImageHeader};
use super::photometric::{ColorModel, PhotometricInterpretation};
use super::pixel_data::RawPixels;
use super::validation;
use crate::error::ImageError;
use crate::image::{DecodedImageSource, NativeSamples, NativeWindow, ValueRange};
use crate::types::{BitDepth, Dimensions, RescaleParams};
use dicom::object::InMemDicomObject;

/// First frame of a DICOM image, decoded and rescaled
#[derive(Debug, Clone)]
pub struct DicomSource {
    dimensions: Dimensions,
    bit_depth: BitDepth,
    samples_per_pixel: u16,
    is_signed: bool,
    photometric: PhotometricInterpretation,
    samples: Option<NativeSamples>,
    range: ValueRange,
    window: Option<NativeWindow>,
    rgb: Option<Vec<u8>>,
}

impl DicomSource {
    /// Build a source from an object's header and its extracted pixel bytes.
    ///
    /// `compressed` tells whether the bytes came out of an encapsulated
    /// transfer syntax, where decoders emit full chroma resolution.
    pub fn from_object(obj: &InMemDicomObject, pixels: &RawPixels, compressed: bool) -> Result<Self, ImageError> {
        let header = parser::extract_image_header(obj, &ErrorContext::from(obj))?;
        validation::validate_header(&header)?;
        Self::from_header(&header, pixels, compressed)
    }

    pub fn from_header(header: &ImageHeader, pixels: &RawPixels, compressed: bool) -> Result<Self, ImageError> {
        let photometric = pixels.photometric.clone().unwrap_or_else(|| header.photometric.clone());
        let planar_configuration = pixels.planar_configuration.or(header.planar_configuration);

        let mut source = Self {
            dimensions: header.dimensions,
            bit_depth: header.bit_depth,
            samples_per_pixel: header.samples_per_pixel,
            is_signed: header.is_signed,
            photometric,
            samples: None,
            range: ValueRange::new(0.0, 0.0),
            window: header.window,
            rgb: None,
        };

        // YBR arrives here as a color model of its own and leaves as RGB
        let model = if source.photometric.is_ycbcr() {
            ColorModel::Rgb
        } else {
            source.photometric.color_model()
        };

        match model {
            ColorModel::Grayscale => {
                let samples = decode_grayscale(&pixels.bytes, header);
                source.range = samples.value_range().unwrap_or(source.range);
                log::debug!(
                    "grayscale {} {}, rescale {}, {}-bit internal representation",
                    header.bit_depth,
                    if header.is_signed { "signed" } else { "unsigned" },
                    header.rescale,
                    samples.bits()
                );
                source.samples = Some(samples);
            }
            ColorModel::Rgb => {
                let layout = ColorLayout {
                    photometric: &source.photometric,
                    bit_depth: header.bit_depth,
                    planar: planar_configuration == Some(1),
                    subsampled: source.photometric == PhotometricInterpretation::YbrFull422 && !compressed,
                };
                let rgb = color::to_rgb888(&pixels.bytes, &layout, header.dimensions)?;
                if source.photometric.is_ycbcr() {
                    log::debug!("converted {} to RGB", source.photometric);
                    source.photometric = PhotometricInterpretation::Rgb;
                }
                source.rgb = Some(rgb);
            }
            // rejected by the normalizer
            ColorModel::Unsupported => {}
        }

        Ok(source)
    }
}

impl DecodedImageSource for DicomSource {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    fn is_signed(&self) -> bool {
        self.is_signed
    }

    fn photometric(&self) -> &PhotometricInterpretation {
        &self.photometric
    }

    fn samples(&self) -> Option<&NativeSamples> {
        self.samples.as_ref()
    }

    fn value_range(&self) -> ValueRange {
        self.range
    }

    fn window(&self) -> Option<NativeWindow> {
        self.window
    }

    fn rgb_8bit(&self) -> Option<&[u8]> {
        self.rgb.as_deref()
    }
}

/// Integer representation wide enough for the rescaled stored range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Representation {
    Unsigned8,
    Signed8,
    Unsigned16,
    Signed16,
    Unsigned32,
    Signed32,
}

impl Representation {
    fn select(bit_depth: BitDepth, signed: bool, rescale: RescaleParams) -> Self {
        let (lo, hi) = bit_depth.stored_range(signed);
        let (a, b) = (rescale.apply(lo), rescale.apply(hi));
        let (min, max) = (a.min(b).floor(), a.max(b).ceil());

        let fits = |lo: f64, hi: f64| min >= lo && max <= hi;
        if fits(0.0, f64::from(u8::MAX)) {
            Self::Unsigned8
        } else if fits(f64::from(i8::MIN), f64::from(i8::MAX)) {
            Self::Signed8
        } else if fits(0.0, f64::from(u16::MAX)) {
            Self::Unsigned16
        } else if fits(f64::from(i16::MIN), f64::from(i16::MAX)) {
            Self::Signed16
        } else if min >= 0.0 {
            Self::Unsigned32
        } else {
            Self::Signed32
        }
    }

    fn collect(self, values: impl Iterator<Item = f64>) -> NativeSamples {
        match self {
            Self::Unsigned8 => NativeSamples::Unsigned8(values.map(|v| v.round().clamp(0.0, 255.0) as u8).collect()),
            Self::Signed8 => NativeSamples::Signed8(values.map(|v| v.round().clamp(-128.0, 127.0) as i8).collect()),
            Self::Unsigned16 => {
                NativeSamples::Unsigned16(values.map(|v| v.round().clamp(0.0, f64::from(u16::MAX)) as u16).collect())
            }
            Self::Signed16 => NativeSamples::Signed16(
                values
                    .map(|v| v.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16)
                    .collect(),
            ),
            Self::Unsigned32 => {
                NativeSamples::Unsigned32(values.map(|v| v.round().clamp(0.0, f64::from(u32::MAX)) as u32).collect())
            }
            Self::Signed32 => NativeSamples::Signed32(
                values
                    .map(|v| v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
                    .collect(),
            ),
        }
    }
}

fn decode_grayscale(bytes: &[u8], header: &ImageHeader) -> NativeSamples {
    let frame = &bytes[..header.frame_size().min(bytes.len())];
    let bytes_per_sample = header.bit_depth.bytes_per_sample().max(1);
    let representation = Representation::select(header.bit_depth, header.is_signed, header.rescale);

    representation.collect(
        frame
            .chunks_exact(bytes_per_sample)
            .map(|chunk| header.rescale.apply(stored_value(chunk, header.bit_depth.stored, header.is_signed))),
    )
}

/// One little-endian sample masked to `bits_stored` and sign-extended
#[inline]
fn stored_value(chunk: &[u8], bits_stored: u16, signed: bool) -> i64 {
    let raw = match *chunk {
        [b0] => u64::from(b0),
        [b0, b1] => u64::from(u16::from_le_bytes([b0, b1])),
        [b0, b1, b2, b3] => u64::from(u32::from_le_bytes([b0, b1, b2, b3])),
        _ => 0,
    };

    let bits = u32::from(bits_stored.clamp(1, 32));
    let value = raw & ((1u64 << bits) - 1);

    if signed && value & (1u64 << (bits - 1)) != 0 {
        value as i64 - (1i64 << bits)
    } else {
        value as i64
    }
}
