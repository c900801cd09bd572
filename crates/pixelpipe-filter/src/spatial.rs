use std::borrow::Cow;

use pixelpipe_image::{color::clamp_channel, Color, Image};

use crate::{
    core::{Capability, Filter},
    error::FilterError,
    kernels,
};

/// Side length of the blur kernel.
const BLUR_SIZE: usize = 5;
/// Sigma of the blur kernel.
const BLUR_SIGMA: f64 = 1.0;

/// Blur an image with a fixed 5x5 gaussian kernel (sigma = 1).
///
/// Out-of-bounds neighbors are clamped to the nearest valid row and column.
#[derive(Debug, Clone)]
pub struct GaussianBlur {
    kernel: [[f64; BLUR_SIZE]; BLUR_SIZE],
}

impl GaussianBlur {
    /// Create the filter, building its kernel once.
    pub fn new() -> Self {
        Self {
            kernel: kernels::gaussian_kernel_2d::<BLUR_SIZE>(BLUR_SIGMA),
        }
    }

    /// The normalized kernel weights.
    pub fn kernel(&self) -> &[[f64; BLUR_SIZE]; BLUR_SIZE] {
        &self.kernel
    }
}

impl Default for GaussianBlur {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for GaussianBlur {
    fn name(&self) -> Cow<'_, str> {
        "gaussianblur".into()
    }

    fn transform_at(&self, src: &Image, x: usize, y: usize) -> Option<Color> {
        let radius = (BLUR_SIZE / 2) as isize;
        let (mut r, mut g, mut b) = (0.0f64, 0.0f64, 0.0f64);

        for (ky, row) in self.kernel.iter().enumerate() {
            let py = y as isize + ky as isize - radius;
            for (kx, &w) in row.iter().enumerate() {
                let px = x as isize + kx as isize - radius;
                let c = src.get_clamped(px, py);
                r += c.r as f64 * w;
                g += c.g as f64 * w;
                b += c.b as f64 * w;
            }
        }

        Some(Color::new(
            clamp_channel(r.round() as i64),
            clamp_channel(g.round() as i64),
            clamp_channel(b.round() as i64),
        ))
    }
}

/// Detect edges with the 3x3 Sobel operator.
///
/// Each channel's gradient magnitude is truncated and clamped to 255; the
/// output intensity is the integer mean of the three magnitudes. Border
/// pixels are black. Only the whole-image algorithm exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetection;

impl EdgeDetection {
    /// Sobel edge intensity of an interior pixel.
    ///
    /// PRECONDITION: `1 <= x < width - 1` and `1 <= y < height - 1`.
    fn intensity(src: &Image, x: usize, y: usize) -> u8 {
        let mut gx = [0i32; 3];
        let mut gy = [0i32; 3];

        for ky in 0..3 {
            for kx in 0..3 {
                let c = src.get_unchecked(x + kx - 1, y + ky - 1).to_array();
                let wx = kernels::SOBEL_X[ky][kx];
                let wy = kernels::SOBEL_Y[ky][kx];
                for ch in 0..3 {
                    gx[ch] += c[ch] as i32 * wx;
                    gy[ch] += c[ch] as i32 * wy;
                }
            }
        }

        let magnitude = |ch: usize| -> u32 {
            (gx[ch] as f64).hypot(gy[ch] as f64).min(255.0) as u32
        };
        ((magnitude(0) + magnitude(1) + magnitude(2)) / 3) as u8
    }
}

impl Filter for EdgeDetection {
    fn name(&self) -> Cow<'_, str> {
        "edgedetection".into()
    }

    fn capability(&self) -> Capability {
        Capability::WholeImage
    }

    fn apply(&self, src: &Image) -> Result<Image, FilterError> {
        let (width, height) = (src.width(), src.height());
        // borders stay black
        let mut dst = Image::from_size_val(src.size(), Color::BLACK)?;

        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                let v = Self::intensity(src, x, y);
                dst.set_pixel(x, y, Color::gray(v))?;
            }
        }

        Ok(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: usize, height: usize) -> Result<Image, FilterError> {
        let pixels: Vec<Color> = (0..width * height)
            .map(|i| {
                if (i % width + i / width) % 2 == 0 {
                    Color::WHITE
                } else {
                    Color::new(10, 80, 160)
                }
            })
            .collect();
        Ok(Image::from_pixels([width, height].into(), &pixels)?)
    }

    #[test]
    fn blur_kernel_sums_to_one() {
        let blur = GaussianBlur::new();
        let sum: f64 = blur.kernel().iter().flatten().sum();
        approx::assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn blur_uniform_image_is_unchanged() -> Result<(), FilterError> {
        let image = Image::from_size_val([6, 4].into(), Color::new(17, 99, 201))?;
        let out = GaussianBlur::new().apply(&image)?;
        assert_eq!(out, image);
        Ok(())
    }

    #[test]
    fn blur_smooths_a_single_spike() -> Result<(), FilterError> {
        let mut image = Image::from_size_val([5, 5].into(), Color::BLACK)?;
        image.set_pixel(2, 2, Color::WHITE)?;
        let out = GaussianBlur::new().apply(&image)?;

        let center = out.get_pixel(2, 2)?;
        let neighbor = out.get_pixel(2, 1)?;
        assert!(center.r < 255 && center.r > neighbor.r);
        assert!(neighbor.r > 0);
        assert!(GaussianBlur::new().transform_color(Color::WHITE).is_none());
        Ok(())
    }

    #[test]
    fn edges_have_black_borders() -> Result<(), FilterError> {
        let (w, h) = (7, 5);
        let out = EdgeDetection.apply(&checkerboard(w, h)?)?;

        for x in 0..w {
            assert_eq!(out.get_pixel(x, 0)?, Color::BLACK);
            assert_eq!(out.get_pixel(x, h - 1)?, Color::BLACK);
        }
        for y in 0..h {
            assert_eq!(out.get_pixel(0, y)?, Color::BLACK);
            assert_eq!(out.get_pixel(w - 1, y)?, Color::BLACK);
        }
        Ok(())
    }

    #[test]
    fn edges_on_flat_image_are_black() -> Result<(), FilterError> {
        let image = Image::from_size_val([4, 4].into(), Color::new(90, 90, 90))?;
        let out = EdgeDetection.apply(&image)?;
        assert!(out.pixels().all(|p| p == Color::BLACK));
        Ok(())
    }

    #[test]
    fn edges_detect_a_vertical_step() -> Result<(), FilterError> {
        // left half black, right half white
        let pixels: Vec<Color> = (0..16)
            .map(|i| if i % 4 < 2 { Color::BLACK } else { Color::WHITE })
            .collect();
        let image = Image::from_pixels([4, 4].into(), &pixels)?;
        let out = EdgeDetection.apply(&image)?;

        // gx = 4 * 255 for every channel, clamped to 255
        assert_eq!(out.get_pixel(1, 1)?, Color::gray(255));
        assert_eq!(out.get_pixel(2, 2)?, Color::gray(255));
        Ok(())
    }

    #[test]
    fn edges_on_thin_images() -> Result<(), FilterError> {
        let image = checkerboard(1, 3)?;
        let out = EdgeDetection.apply(&image)?;
        assert!(out.pixels().all(|p| p == Color::BLACK));
        assert_eq!(EdgeDetection.capability(), Capability::WholeImage);
        Ok(())
    }
}
