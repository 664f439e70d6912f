//! Error taxonomy for loading and normalizing images

use std::fmt;
use thiserror::Error;

/// Broad category of a load failure, used to pick user guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    InvalidFormat,
    UnsupportedTransferSyntax,
    MissingPixelData,
    InvalidImageDimensions,
    UnsupportedPhotometricInterpretation,
    InvalidMetadata,
    UnknownError,
}

impl ErrorKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FileNotFound => "FileNotFound",
            Self::InvalidFormat => "InvalidFormat",
            Self::UnsupportedTransferSyntax => "UnsupportedTransferSyntax",
            Self::MissingPixelData => "MissingPixelData",
            Self::InvalidImageDimensions => "InvalidImageDimensions",
            Self::UnsupportedPhotometricInterpretation => "UnsupportedPhotometricInterpretation",
            Self::InvalidMetadata => "InvalidMetadata",
            Self::UnknownError => "UnknownError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A load or normalization failure: kind, message and optional decoder detail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.full_message())]
pub struct ImageError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<String>,
}

impl ImageError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        let details = details.into();
        self.details = (!details.is_empty()).then_some(details);
        self
    }

    /// Wrap an `anyhow` chain, keeping the whole chain as detail text
    #[must_use]
    pub fn from_anyhow(kind: ErrorKind, message: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::new(kind, message).with_details(format!("{err:#}"))
    }

    #[must_use]
    pub fn full_message(&self) -> String {
        match &self.details {
            Some(details) => format!("{}: {details}", self.message),
            None => self.message.clone(),
        }
    }

    /// Kind-specific hint shown to the user below the message
    #[must_use]
    pub fn guidance(&self) -> Option<&'static str> {
        match self.kind {
            ErrorKind::UnsupportedTransferSyntax => Some(
                "This file may be compressed with an unsupported codec.\n\
                 Try converting it to an uncompressed transfer syntax using a DICOM tool.",
            ),
            ErrorKind::InvalidFormat => Some("Make sure this is a valid DICOM file (.dcm)."),
            ErrorKind::UnsupportedPhotometricInterpretation => Some(
                "The color format of this image is not supported.\n\
                 Supported formats: MONOCHROME1, MONOCHROME2, RGB, YBR_FULL, YBR_FULL_422",
            ),
            _ => None,
        }
    }
}
