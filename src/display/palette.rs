use image::Rgba;
use tracing::warn;

use crate::constants::{DEFAULT_PALETTE, FALLBACK_COLOR, PALETTE_SIZE};

/// An ordered set of up to 16 24-bit RGB colors.
///
/// Index 0 is the transparent sentinel when decoding sprites, but it may still be
/// given a visible color for the background fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<u32>,
}

impl Palette {
    /// Builds a palette from raw colors, truncating to 16 entries.
    ///
    /// Colors outside `0..=0xFFFFFF` are replaced with black.
    pub fn new(colors: impl IntoIterator<Item = u32>) -> Self {
        let mut colors: Vec<u32> = colors.into_iter().collect();
        if colors.len() > PALETTE_SIZE {
            warn!(len = colors.len(), "Palette has more than {PALETTE_SIZE} colors, truncating");
            colors.truncate(PALETTE_SIZE);
        }
        for color in colors.iter_mut() {
            if *color > 0xFFFFFF {
                *color = FALLBACK_COLOR;
            }
        }
        Self { colors }
    }

    /// Builds a palette from guest-supplied numbers.
    ///
    /// Anything that isn't a whole number in `0..=0xFFFFFF` becomes black.
    pub fn from_numbers(values: &[f64]) -> Self {
        Self::new(values.iter().map(|&value| {
            if value.is_finite() && value >= 0.0 && value <= 0xFFFFFF as f64 {
                value as u32
            } else {
                FALLBACK_COLOR
            }
        }))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Looks up a color, falling back to black for any index the palette doesn't have.
    pub fn color(&self, index: i64) -> u32 {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.colors.get(index))
            .copied()
            .unwrap_or(FALLBACK_COLOR)
    }

    /// The opaque RGBA pixel for a palette index.
    pub fn rgba(&self, index: i64) -> Rgba<u8> {
        let [_, r, g, b] = self.color(index).to_be_bytes();
        Rgba([r, g, b, 0xFF])
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE)
    }
}
