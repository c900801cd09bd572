/// Luma weights for the red, green and blue channels.
const RW: f64 = 0.3;
const GW: f64 = 0.59;
const BW: f64 = 0.11;

/// Integer-scaled perceived brightness weights (sum to 1000).
const RW_I: u64 = 299;
const GW_I: u64 = 587;
const BW_I: u64 = 114;

/// An 8-bit RGB color.
///
/// # Examples
///
/// ```
/// use pixelpipe_image::Color;
///
/// let color = Color::new(255, 0, 0);
/// assert_eq!(color, Color::RED);
/// assert_eq!(color.luma(), 76);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// Pure black.
    pub const BLACK: Color = Color::new(0, 0, 0);
    /// Pure white.
    pub const WHITE: Color = Color::new(255, 255, 255);
    /// Pure red.
    pub const RED: Color = Color::new(255, 0, 0);
    /// Pure green.
    pub const GREEN: Color = Color::new(0, 255, 0);
    /// Pure blue.
    pub const BLUE: Color = Color::new(0, 0, 255);
    /// Pure yellow.
    pub const YELLOW: Color = Color::new(255, 255, 0);

    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a gray color with all three channels set to `v`.
    pub const fn gray(v: u8) -> Self {
        Self { r: v, g: v, b: v }
    }

    /// Luminance computed as `floor(0.3 * R + 0.59 * G + 0.11 * B)`.
    pub fn luma(&self) -> u8 {
        let y = RW * self.r as f64 + GW * self.g as f64 + BW * self.b as f64;
        y.clamp(0.0, 255.0) as u8
    }

    /// Perceived brightness scaled by 1000, i.e. `299 * R + 587 * G + 114 * B`.
    pub fn weighted_brightness(&self) -> u64 {
        RW_I * self.r as u64 + GW_I * self.g as u64 + BW_I * self.b as u64
    }

    /// Apply `f` to each channel.
    pub fn map(self, f: impl Fn(u8) -> u8) -> Self {
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    /// The channels as an array in `[r, g, b]` order.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

/// Saturating cast of a signed channel value into `[0, 255]`.
pub fn clamp_channel(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}
