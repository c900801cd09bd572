#![deny(missing_docs)]
//! Image types and color primitives used by the pixelpipe filters.

/// 8-bit RGB color and luminance helpers.
pub mod color;

/// Error types for the image module.
pub mod error;

/// owned raster image representation.
pub mod image;

pub use crate::color::Color;
pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
