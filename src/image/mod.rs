//! Pixel normalization and window/level rendering
//!
//! Decoder output flows through [`normalize`] into a [`CanonicalImage`]
//! (16-bit, "low = dark"), then through [`display_buffer::build`] into an
//! 8-bit [`DisplayBuffer`].

pub mod auto_window;
mod canonical;
pub mod display_buffer;
pub mod normalization;
mod source;
pub mod window;

pub use canonical::{CanonicalImage, PixelData, WindowLevel};
pub use display_buffer::{DisplayBuffer, PixelFormat};
pub use normalization::{WindowSource, normalize};
pub use source::{DecodedImageSource, NativeSamples, NativeWindow, ValueRange, min_max_window_8bit};
pub use window::WindowLevelTransform;
