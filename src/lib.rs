pub mod cli;
pub mod dicom;
pub mod display;
pub mod display_metadata;
pub mod error;
pub mod image;
pub mod session;
pub mod types;

// Re-export commonly used items
pub use display_metadata::print_metadata;
pub use error::{ErrorKind, ImageError};
pub use session::ViewerSession;
