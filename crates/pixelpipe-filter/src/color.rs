use std::borrow::Cow;

use pixelpipe_image::Color;

use crate::core::Filter;

/// Convert an image to grayscale using the formula:
///
/// Y = floor(0.3 * R + 0.59 * G + 0.11 * B)
///
/// The luma is written to all three channels.
///
/// # Example
///
/// ```
/// use pixelpipe_image::Color;
/// use pixelpipe_filter::{color::Grayscale, Filter};
///
/// let gray = Grayscale.transform_color(Color::RED).unwrap();
/// assert_eq!(gray, Color::gray(76));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Grayscale;

impl Filter for Grayscale {
    fn name(&self) -> Cow<'_, str> {
        "grayscale".into()
    }

    fn transform_color(&self, color: Color) -> Option<Color> {
        Some(Color::gray(color.luma()))
    }
}

/// Invert every channel: `v -> 255 - v`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invert;

impl Filter for Invert {
    fn name(&self) -> Cow<'_, str> {
        "invert".into()
    }

    fn transform_color(&self, color: Color) -> Option<Color> {
        Some(color.map(|v| 255 - v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use pixelpipe_image::Image;
    use rand::Rng;

    fn random_image(width: usize, height: usize) -> Result<Image, FilterError> {
        let mut rng = rand::rng();
        let data = (0..width * height * 3).map(|_| rng.random::<u8>()).collect();
        Ok(Image::new([width, height].into(), data)?)
    }

    fn rainbow() -> Result<Image, FilterError> {
        let pixels = [
            Color::RED,
            Color::GREEN,
            Color::BLUE,
            Color::YELLOW,
            Color::new(12, 200, 99),
            Color::WHITE,
        ];
        Ok(Image::from_pixels([3, 2].into(), &pixels)?)
    }

    #[test]
    fn grayscale_channels_are_equal() -> Result<(), FilterError> {
        let out = Grayscale.apply(&rainbow()?)?;
        assert!(out.pixels().all(|p| p.r == p.g && p.g == p.b));
        assert_eq!(out.get_pixel(0, 0)?, Color::gray(76));
        assert_eq!(out.get_pixel(1, 0)?, Color::gray(150));
        assert_eq!(out.get_pixel(2, 0)?, Color::gray(28));

        for (w, h) in [(1, 1), (17, 9), (64, 33)] {
            let out = Grayscale.apply(&random_image(w, h)?)?;
            assert!(out.pixels().all(|p| p.r == p.g && p.g == p.b));
        }
        Ok(())
    }

    #[test]
    fn grayscale_has_no_context_transform() -> Result<(), FilterError> {
        let image = rainbow()?;
        assert!(Grayscale.transform_at(&image, 0, 0).is_none());
        Ok(())
    }

    #[test]
    fn invert_values() {
        assert_eq!(Invert.transform_color(Color::RED), Some(Color::new(0, 255, 255)));
        assert_eq!(Invert.transform_color(Color::BLACK), Some(Color::WHITE));
    }

    #[test]
    fn invert_is_an_involution() -> Result<(), FilterError> {
        let image = rainbow()?;
        let twice = Invert.apply(&Invert.apply(&image)?)?;
        assert_eq!(twice, image);

        for (w, h) in [(1, 1), (17, 9), (64, 33)] {
            let image = random_image(w, h)?;
            let once = Invert.apply(&image)?;
            assert!(once
                .pixels()
                .zip(image.pixels())
                .all(|(a, b)| a == b.map(|v| 255 - v)));
            assert_eq!(Invert.apply(&once)?, image);
        }
        Ok(())
    }
}
