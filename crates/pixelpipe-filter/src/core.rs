use std::borrow::Cow;
use std::sync::Arc;

use pixelpipe_image::{image::CHANNELS, Color, Image};

use crate::error::FilterError;

/// How a filter wants to be executed.
///
/// The tag is fixed when the filter is constructed. The execution engine uses
/// it to choose between the filter's own algorithm and the per-pixel loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    /// The filter provides its own [`Filter::apply`] over the whole image.
    WholeImage,

    /// The filter is fully described by its pixel transforms.
    #[default]
    PerPixel,
}

/// A shared, immutable filter handle.
pub type SharedFilter = Arc<dyn Filter>;

/// Base trait for image filters.
///
/// A filter transforms pixels in one of two ways:
///
/// * context-free, from a single color ([`Filter::transform_color`]), e.g. invert;
/// * context-aware, from a pixel position in the source image
///   ([`Filter::transform_at`]), e.g. blur.
///
/// Either primitive may be unsupported, which is signalled by returning `None`.
/// The default [`Filter::apply`] prefers the context-aware transform and falls
/// back to the context-free one.
pub trait Filter: Send + Sync {
    /// The lowercase identifier of the filter, e.g. `"grayscale"`.
    fn name(&self) -> Cow<'_, str>;

    /// The execution capability of the filter.
    fn capability(&self) -> Capability {
        Capability::PerPixel
    }

    /// Transform a single color without access to surrounding pixels.
    ///
    /// Returns `None` when the filter needs neighborhood context.
    fn transform_color(&self, _color: Color) -> Option<Color> {
        None
    }

    /// Transform the pixel at `(x, y)` with access to the whole source image.
    ///
    /// Returns `None` when the filter is context-free.
    fn transform_at(&self, _src: &Image, _x: usize, _y: usize) -> Option<Color> {
        None
    }

    /// Apply the filter to the whole image on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidFilterState`] when neither pixel transform
    /// is supported.
    fn apply(&self, src: &Image) -> Result<Image, FilterError> {
        apply_per_pixel(self, src)
    }

    /// The member filters when this filter is a composition of other filters.
    fn stages(&self) -> Option<&[SharedFilter]> {
        None
    }
}

/// Transform one pixel, preferring the context-aware transform and falling back
/// to the context-free one.
///
/// # Errors
///
/// Returns [`FilterError::InvalidFilterState`] if the filter supports neither.
///
/// # Example
///
/// ```
/// use pixelpipe_image::{Color, Image};
/// use pixelpipe_filter::{color::Invert, core::transform_pixel};
///
/// let image = Image::from_size_val([1, 1].into(), Color::new(10, 20, 30)).unwrap();
/// let out = transform_pixel(&Invert, &image, 0, 0).unwrap();
/// assert_eq!(out, Color::new(245, 235, 225));
/// ```
pub fn transform_pixel<F: Filter + ?Sized>(
    filter: &F,
    src: &Image,
    x: usize,
    y: usize,
) -> Result<Color, FilterError> {
    if let Some(color) = filter.transform_at(src, x, y) {
        return Ok(color);
    }
    filter
        .transform_color(src.get_unchecked(x, y))
        .ok_or_else(|| FilterError::InvalidFilterState(filter.name().into_owned()))
}

/// Apply a filter pixel by pixel into a freshly allocated image.
///
/// This is the generic algorithm behind [`Filter::apply`]; filters that
/// override `apply` can still be run through it.
pub fn apply_per_pixel<F: Filter + ?Sized>(filter: &F, src: &Image) -> Result<Image, FilterError> {
    let mut data = vec![0u8; src.as_slice().len()];
    transform_rows(filter, src, 0, &mut data)?;
    Ok(Image::new(src.size(), data)?)
}

/// Fill `dst`, a run of whole output rows starting at `first_row`, with the
/// transformed pixels of `src`.
///
/// PRECONDITION: `dst.len()` is a multiple of the source row stride.
pub(crate) fn transform_rows<F: Filter + ?Sized>(
    filter: &F,
    src: &Image,
    first_row: usize,
    dst: &mut [u8],
) -> Result<(), FilterError> {
    let stride = src.row_stride();
    for (dy, dst_row) in dst.chunks_exact_mut(stride).enumerate() {
        let y = first_row + dy;
        for (x, dst_pixel) in dst_row.chunks_exact_mut(CHANNELS).enumerate() {
            let color = transform_pixel(filter, src, x, y)?;
            dst_pixel.copy_from_slice(&color.to_array());
        }
    }
    Ok(())
}
