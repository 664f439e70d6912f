use crate::dicom::DicomMetadata;
use crate::error::ImageError;
use thiserror::Error;

/// Per-file failure, keeping metadata when it was read before the failure
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Opening, decoding or normalizing failed
    #[error(transparent)]
    Load(#[from] ImageError),

    /// Metadata read, but pixel decoding or normalization failed
    #[error("{error}")]
    ConversionFailed {
        metadata: Box<DicomMetadata>,
        error: ImageError,
    },

    /// Image ready but rendering or writing it failed
    #[error("{error:#}")]
    DisplayFailed {
        metadata: Box<DicomMetadata>,
        error: anyhow::Error,
    },
}

impl ProcessError {
    /// Returns metadata if available (for verbose display before error)
    #[must_use]
    pub fn metadata(&self) -> Option<&DicomMetadata> {
        match self {
            ProcessError::ConversionFailed { metadata, .. } | ProcessError::DisplayFailed { metadata, .. } => {
                Some(metadata)
            }
            ProcessError::Load(_) => None,
        }
    }

    /// User hint for the underlying image error, if any
    #[must_use]
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            ProcessError::Load(error) | ProcessError::ConversionFailed { error, .. } => error.guidance(),
            ProcessError::DisplayFailed { .. } => None,
        }
    }
}
