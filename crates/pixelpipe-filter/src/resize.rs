use std::borrow::Cow;

use pixelpipe_image::{image::CHANNELS, Image, ImageSize};

use crate::{
    core::{Capability, Filter},
    error::FilterError,
    registry::FilterOptions,
};

/// Smallest factor accepted from string options.
pub const MIN_OPTION_FACTOR: f64 = 1e-4;

/// Resize an image by a constant factor with nearest neighbor sampling.
///
/// The output size is `round(width * factor) x round(height * factor)`, and
/// destination pixel `(x, y)` samples source pixel
/// `(floor(x / factor), floor(y / factor))` clamped to the image bounds.
///
/// # Example
///
/// ```
/// use pixelpipe_image::{Color, Image};
/// use pixelpipe_filter::{resize::Scale, Filter};
///
/// let image = Image::from_size_val([4, 6].into(), Color::RED).unwrap();
/// let scaled = Scale::new(0.5).unwrap().apply(&image).unwrap();
///
/// assert_eq!(scaled.size().width, 2);
/// assert_eq!(scaled.size().height, 3);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Scale {
    factor: f64,
}

impl Scale {
    /// Create a scale filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidArgument`] if `factor` is not a positive finite number.
    pub fn new(factor: f64) -> Result<Self, FilterError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(FilterError::InvalidArgument(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        Ok(Self { factor })
    }

    /// Create a scale filter from the `factor` option, defaulting to `1.0`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidArgument`] if the factor does not parse
    /// or is below [`MIN_OPTION_FACTOR`].
    pub fn from_options(options: &FilterOptions) -> Result<Self, FilterError> {
        let factor = match options.get("factor") {
            None => 1.0,
            Some(raw) => {
                let factor: f64 = raw.trim().parse().map_err(|_| {
                    FilterError::InvalidArgument(format!("invalid scale factor: {raw}"))
                })?;
                if factor.is_nan() || factor < MIN_OPTION_FACTOR {
                    return Err(FilterError::InvalidArgument(format!(
                        "scale factor must be >= {MIN_OPTION_FACTOR}, got {raw}"
                    )));
                }
                factor
            }
        };
        Self::new(factor)
    }

    /// The scale factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// The size of the image produced from an input of size `src`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidArgument`] if the output is empty or its
    /// pixel buffer would not fit in memory addressable by `usize`.
    pub fn output_size(&self, src: ImageSize) -> Result<ImageSize, FilterError> {
        let dst_size = ImageSize {
            width: self.scaled_dim(src.width, src)?,
            height: self.scaled_dim(src.height, src)?,
        };
        if dst_size.width == 0 || dst_size.height == 0 {
            return Err(FilterError::InvalidArgument(format!(
                "scaling {src} by {} produces an empty image",
                self.factor
            )));
        }
        if dst_size.buffer_len().is_none() {
            return Err(self.too_large(src));
        }
        Ok(dst_size)
    }

    /// `round(len * factor)`, rejecting values outside the `usize` range.
    fn scaled_dim(&self, len: usize, src: ImageSize) -> Result<usize, FilterError> {
        let scaled = (len as f64 * self.factor).round();
        if !scaled.is_finite() || scaled >= usize::MAX as f64 {
            return Err(self.too_large(src));
        }
        Ok(scaled as usize)
    }

    fn too_large(&self, src: ImageSize) -> FilterError {
        FilterError::InvalidArgument(format!(
            "scaling {src} by {} produces an image too large to allocate",
            self.factor
        ))
    }

    /// Source index sampled by destination index `i`, clamped to `len`.
    fn source_index(&self, i: usize, len: usize) -> usize {
        ((i as f64 / self.factor) as usize).min(len - 1)
    }
}

impl Filter for Scale {
    fn name(&self) -> Cow<'_, str> {
        "scale".into()
    }

    fn capability(&self) -> Capability {
        Capability::WholeImage
    }

    fn apply(&self, src: &Image) -> Result<Image, FilterError> {
        let dst_size = self.output_size(src.size())?;
        let len = dst_size.buffer_len().ok_or_else(|| self.too_large(src.size()))?;

        let mut src_cols: Vec<usize> = Vec::new();
        let mut data: Vec<u8> = Vec::new();
        src_cols
            .try_reserve_exact(dst_size.width)
            .and_then(|_| data.try_reserve_exact(len))
            .map_err(|_| self.too_large(src.size()))?;

        src_cols.extend((0..dst_size.width).map(|x| self.source_index(x, src.width())));
        for y in 0..dst_size.height {
            let sy = self.source_index(y, src.height());
            let src_row = &src.as_slice()[sy * src.row_stride()..(sy + 1) * src.row_stride()];
            for &sx in &src_cols {
                data.extend_from_slice(&src_row[sx * CHANNELS..(sx + 1) * CHANNELS]);
            }
        }

        Ok(Image::new(dst_size, data)?)
    }
}
