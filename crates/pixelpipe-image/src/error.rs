/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    /// Error when the image has a zero dimension.
    #[error("Image size must be non-zero, got {0}x{1}")]
    EmptyImage(usize, usize),

    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when a pixel index is out of bounds.
    #[error("Pixel index ({0}, {1}) is out of bounds ({2}x{3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the buffer length of an image size does not fit in `usize`.
    #[error("Image size {0}x{1} is too large")]
    SizeOverflow(usize, usize),
}
