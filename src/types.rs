//! Domain-specific value types shared by the decoder and the display core

use dicom::transfer_syntax::entries;
use std::fmt;

/// DICOM transfer syntax (UID, name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSyntax {
    pub uid: String,
    pub name: String,
}

impl TransferSyntax {
    #[must_use]
    pub fn new(uid: String, name: String) -> Self {
        Self { uid, name }
    }

    #[inline]
    #[must_use]
    pub fn is_big_endian(&self) -> bool {
        self.uid == entries::EXPLICIT_VR_BIG_ENDIAN.uid()
    }

    /// JPEG, JPEG-LS, JPEG 2000 and RLE families are encapsulated
    #[inline]
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.uid.starts_with("1.2.840.10008.1.2.4") || self.uid.starts_with("1.2.840.10008.1.2.5")
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{name} ({uid})", name = self.name, uid = self.uid)
    }
}

/// SOP Class (UID, name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SOPClass {
    pub uid: String,
    pub name: String,
}

impl SOPClass {
    #[must_use]
    pub fn new(uid: String, name: String) -> Self {
        Self { uid, name }
    }
}

impl fmt::Display for SOPClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{name} ({uid})", name = self.name, uid = self.uid)
    }
}

/// Image size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{width}x{height}", width = self.width, height = self.height)
    }
}

/// Rescale parameters for converting stored values to output units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescaleParams {
    pub slope: f64,
    pub intercept: f64,
}

impl RescaleParams {
    #[must_use]
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    #[must_use]
    pub const fn identity() -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        (self.slope - 1.0).abs() < f64::EPSILON && self.intercept.abs() < f64::EPSILON
    }

    #[inline(always)]
    #[must_use]
    // Hot path: called for every pixel during decoding
    pub fn apply(&self, stored: i64) -> f64 {
        (stored as f64).mul_add(self.slope, self.intercept)
    }
}

impl Default for RescaleParams {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for RescaleParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slope={slope}, intercept={intercept}",
            slope = self.slope,
            intercept = self.intercept
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelAspectRatio {
    pub vertical: f64,
    pub horizontal: f64,
}

impl PixelAspectRatio {
    #[must_use]
    pub fn new(vertical: f64, horizontal: f64) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    #[inline]
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.vertical / self.horizontal
    }
}

impl fmt::Display for PixelAspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{vertical}:{horizontal}",
            vertical = self.vertical,
            horizontal = self.horizontal
        )
    }
}

/// Bit depth information for pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDepth {
    pub allocated: u16,
    pub stored: u16,
}

impl BitDepth {
    #[must_use]
    pub fn new(allocated: u16, stored: u16) -> Self {
        Self { allocated, stored }
    }

    #[inline]
    #[must_use]
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.allocated / 8)
    }

    /// Inclusive range of stored values representable with `stored` bits
    #[must_use]
    pub fn stored_range(&self, signed: bool) -> (i64, i64) {
        let bits = u32::from(self.stored.clamp(1, 32));
        if signed {
            (-(1_i64 << (bits - 1)), (1_i64 << (bits - 1)) - 1)
        } else {
            (0, (1_i64 << bits) - 1)
        }
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{stored}/{allocated} bits",
            stored = self.stored,
            allocated = self.allocated
        )
    }
}

/// Patient information metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientInfo {
    pub name: Option<String>,
    pub id: Option<String>,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
    pub age: Option<String>,
}

/// Study information metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyInfo {
    pub accession_number: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub description: Option<String>,
    pub instance_uid: Option<String>,
}

/// Series information metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesInfo {
    pub date: Option<String>,
    pub time: Option<String>,
    pub description: Option<String>,
    pub instance_uid: Option<String>,
    pub number: Option<String>,
    pub modality: Option<String>,
    pub slice_thickness: Option<f64>,
}

/// Acquisition equipment metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EquipmentInfo {
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub station_name: Option<String>,
    pub institution_name: Option<String>,
}
