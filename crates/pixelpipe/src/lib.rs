#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use pixelpipe_image as image;

#[doc(inline)]
pub use pixelpipe_filter as filter;
