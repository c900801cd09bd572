use std::borrow::Cow;

use pixelpipe_image::{color::clamp_channel, image::CHANNELS, Color, Image};

use crate::{
    core::{Capability, Filter},
    error::FilterError,
};

/// Target average brightness for [`AutoBrightness`].
const TARGET_BRIGHTNESS: f64 = 128.0;

/// Minimum and maximum luminance of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LuminanceBounds {
    /// Darkest luminance in the image.
    pub min: u8,
    /// Brightest luminance in the image.
    pub max: u8,
}

impl LuminanceBounds {
    /// Bounds covering the whole 8-bit range. Stretching with them is the identity.
    pub const FULL_RANGE: LuminanceBounds = LuminanceBounds { min: 0, max: 255 };

    /// Whether the image had a single luminance value.
    pub fn is_flat(&self) -> bool {
        self.min == self.max
    }
}

/// Find the minimum and maximum luminance of an image.
///
/// Luminance is `floor(0.3 * R + 0.59 * G + 0.11 * B)`.
///
/// # Example
///
/// ```
/// use pixelpipe_image::{Color, Image};
/// use pixelpipe_filter::enhance::find_luminance_bounds;
///
/// let image = Image::from_pixels([2, 1].into(), &[Color::gray(50), Color::gray(150)]).unwrap();
/// let bounds = find_luminance_bounds(&image);
/// assert_eq!((bounds.min, bounds.max), (50, 150));
/// ```
pub fn find_luminance_bounds(src: &Image) -> LuminanceBounds {
    src.pixels().fold(
        LuminanceBounds { min: 255, max: 0 },
        |bounds, pixel| {
            let lum = pixel.luma();
            LuminanceBounds {
                min: bounds.min.min(lum),
                max: bounds.max.max(lum),
            }
        },
    )
}

/// Linearly map each channel of `color` from `[min, max]` to `[0, 255]`.
///
/// The same luminance-derived bounds are used for every channel, so the hue
/// of saturated colors can shift.
pub fn stretch(color: Color, bounds: LuminanceBounds) -> Color {
    if bounds.is_flat() {
        return color;
    }
    let min = bounds.min as f64;
    let range = bounds.max as f64 - min;
    color.map(|v| clamp_channel(((v as f64 - min) * 255.0 / range).round() as i64))
}

/// Stretch contrast so the image luminance spans the full `[0, 255]` range.
///
/// [`Filter::apply`] runs two phases: [`find_luminance_bounds`] over the whole
/// image, then [`stretch`] on every pixel. Images with a single luminance
/// value are returned unchanged.
///
/// The per-pixel transform uses the bounds the filter was built with, which
/// default to [`LuminanceBounds::FULL_RANGE`].
#[derive(Debug, Clone, Copy)]
pub struct AutoContrast {
    bounds: LuminanceBounds,
}

impl AutoContrast {
    /// Create the filter with full-range per-pixel bounds.
    pub fn new() -> Self {
        Self::with_bounds(LuminanceBounds::FULL_RANGE)
    }

    /// Create the filter with precomputed per-pixel bounds.
    pub fn with_bounds(bounds: LuminanceBounds) -> Self {
        Self { bounds }
    }

    /// The bounds used by the per-pixel transform.
    pub fn bounds(&self) -> LuminanceBounds {
        self.bounds
    }

    /// Statistics phase: the luminance bounds of `src`.
    ///
    /// Feed the result to [`AutoContrast::with_bounds`] to run the stretch
    /// phase per pixel.
    pub fn compute_bounds(src: &Image) -> LuminanceBounds {
        find_luminance_bounds(src)
    }
}

impl Default for AutoContrast {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for AutoContrast {
    fn name(&self) -> Cow<'_, str> {
        "autocontrast".into()
    }

    fn capability(&self) -> Capability {
        Capability::WholeImage
    }

    fn transform_color(&self, color: Color) -> Option<Color> {
        Some(stretch(color, self.bounds))
    }

    fn apply(&self, src: &Image) -> Result<Image, FilterError> {
        let bounds = Self::compute_bounds(src);
        if bounds.is_flat() {
            return Ok(src.clone());
        }
        map_pixels(src, |color| stretch(color, bounds))
    }
}

/// Average perceived brightness: `sum(299 R + 587 G + 114 B) / (1000 * pixels)`.
pub fn average_brightness(src: &Image) -> f64 {
    let total: u64 = src.pixels().map(|p| p.weighted_brightness()).sum();
    total as f64 / src.size().area() as f64 / 1000.0
}

/// Scale every channel so the average perceived brightness becomes 128.
///
/// Channels are multiplied by `128 / average`, truncated and clamped. A fully
/// black image is returned unchanged. Only the whole-image algorithm exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoBrightness;

impl Filter for AutoBrightness {
    fn name(&self) -> Cow<'_, str> {
        "autobrightness".into()
    }

    fn capability(&self) -> Capability {
        Capability::WholeImage
    }

    fn apply(&self, src: &Image) -> Result<Image, FilterError> {
        let average = average_brightness(src);
        if average == 0.0 {
            return Ok(src.clone());
        }
        let scale = TARGET_BRIGHTNESS / average;
        map_pixels(src, |color| {
            color.map(|v| clamp_channel((v as f64 * scale) as i64))
        })
    }
}

/// Map every pixel of `src` into a new image of the same size.
fn map_pixels(src: &Image, f: impl Fn(Color) -> Color) -> Result<Image, FilterError> {
    let mut data = vec![0u8; src.as_slice().len()];
    src.as_slice()
        .chunks_exact(CHANNELS)
        .zip(data.chunks_exact_mut(CHANNELS))
        .for_each(|(src_pixel, dst_pixel)| {
            let color = f(Color::new(src_pixel[0], src_pixel[1], src_pixel[2]));
            dst_pixel.copy_from_slice(&color.to_array());
        });
    Ok(Image::new(src.size(), data)?)
}
