use crate::{color::Color, error::ImageError};

/// Number of interleaved channels per pixel.
pub const CHANNELS: usize = 3;

/// Width and height of an image, in pixels.
///
/// ```
/// use pixelpipe_image::ImageSize;
///
/// let size: ImageSize = [10, 20].into();
/// assert_eq!(size.area(), 200);
/// assert_eq!(size.to_string(), "10x20");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Total number of pixels.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// Number of bytes of an RGB8 buffer of this size, `None` on overflow.
    pub fn buffer_len(&self) -> Option<usize> {
        self.width.checked_mul(self.height)?.checked_mul(CHANNELS)
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// An owned 8-bit RGB image.
///
/// Pixels are stored row-major and interleaved as `[r, g, b, r, g, b, ...]`.
/// Both dimensions are always at least one pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    size: ImageSize,
    data: Vec<u8>,
}

impl Image {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The interleaved RGB pixel data of the image.
    ///
    /// # Errors
    ///
    /// If either dimension is zero or the length of the pixel data does not
    /// match the image size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixelpipe_image::{Image, ImageSize};
    ///
    /// let image = Image::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<u8>) -> Result<Self, ImageError> {
        if size.width == 0 || size.height == 0 {
            return Err(ImageError::EmptyImage(size.width, size.height));
        }

        let expected = size
            .buffer_len()
            .ok_or(ImageError::SizeOverflow(size.width, size.height))?;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with every pixel set to `color`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixelpipe_image::{Color, Image, ImageSize};
    ///
    /// let image = Image::from_size_val([4, 2].into(), Color::RED).unwrap();
    /// assert_eq!(image.get_pixel(3, 1).unwrap(), Color::RED);
    /// ```
    pub fn from_size_val(size: ImageSize, color: Color) -> Result<Self, ImageError> {
        if size.buffer_len().is_none() {
            return Err(ImageError::SizeOverflow(size.width, size.height));
        }
        let data = color.to_array().repeat(size.area());
        Image::new(size, data)
    }

    /// Create a new image from a row-major list of colors.
    pub fn from_pixels(size: ImageSize, pixels: &[Color]) -> Result<Self, ImageError> {
        let data = pixels.iter().flat_map(|c| c.to_array()).collect();
        Image::new(size, data)
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Number of bytes in one row.
    pub fn row_stride(&self) -> usize {
        self.size.width * CHANNELS
    }

    /// The raw interleaved pixel data.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image and return its raw pixel data.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Get the color of a pixel.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::PixelIndexOutOfBounds`] when `(x, y)` is outside the image.
    pub fn get_pixel(&self, x: usize, y: usize) -> Result<Color, ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        Ok(self.get_unchecked(x, y))
    }

    /// Get the color of a pixel without validating the coordinates.
    ///
    /// PRECONDITION: `x < width` and `y < height`.
    pub fn get_unchecked(&self, x: usize, y: usize) -> Color {
        let i = (y * self.size.width + x) * CHANNELS;
        Color::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Get the color of a pixel, clamping out-of-range coordinates to the
    /// nearest valid row and column.
    pub fn get_clamped(&self, x: isize, y: isize) -> Color {
        let x = x.clamp(0, self.width() as isize - 1) as usize;
        let y = y.clamp(0, self.height() as isize - 1) as usize;
        self.get_unchecked(x, y)
    }

    /// Set the color of a pixel.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::PixelIndexOutOfBounds`] when `(x, y)` is outside the image.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) -> Result<(), ImageError> {
        if x >= self.width() || y >= self.height() {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        let i = (y * self.size.width + x) * CHANNELS;
        self.data[i..i + CHANNELS].copy_from_slice(&color.to_array());
        Ok(())
    }

    /// Iterate over all pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Color> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|p| Color::new(p[0], p[1], p[2]))
    }
}
