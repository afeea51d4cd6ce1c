use glam::U16Vec2;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::CELL_SIZE;
use crate::display::Palette;
use crate::error::ConfigError;
use crate::texture::sprite::SpriteResource;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// The supported atlas canvas sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AtlasSize {
    /// 128×128 pixels, 256 cells.
    Small,
    /// 256×256 pixels, 1024 cells.
    #[default]
    Large,
}

impl AtlasSize {
    pub const fn pixels(self) -> u32 {
        match self {
            AtlasSize::Small => 128,
            AtlasSize::Large => 256,
        }
    }

    pub const fn cells_per_row(self) -> u32 {
        self.pixels() / CELL_SIZE
    }

    /// The number of sprites that fit in the atlas.
    pub const fn capacity(self) -> usize {
        (self.cells_per_row() * self.cells_per_row()) as usize
    }
}

impl TryFrom<u32> for AtlasSize {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            128 => Ok(AtlasSize::Small),
            256 => Ok(AtlasSize::Large),
            other => Err(ConfigError::AtlasSize(other)),
        }
    }
}

impl From<AtlasSize> for u32 {
    fn from(value: AtlasSize) -> Self {
        value.pixels()
    }
}

/// The bounds of a single sprite within the atlas image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtlasFrame {
    pub pos: U16Vec2,
    pub size: U16Vec2,
}

/// A single image holding every sprite of the loaded game, packed into 8×8 cells.
///
/// Sprites are addressed purely by their declaration index: sprite `i` lives in cell
/// `(i mod cells_per_row, i div cells_per_row)`. The mapping is recomputed from the index
/// every time, so no position table is kept.
#[derive(Debug, Clone)]
pub struct SpriteAtlas {
    image: RgbaImage,
    size: AtlasSize,
    count: usize,
}

impl SpriteAtlas {
    /// An atlas with no sprites in it.
    pub fn empty(size: AtlasSize) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.pixels(), size.pixels(), TRANSPARENT),
            size,
            count: 0,
        }
    }

    /// Rasterizes sprites into a fresh atlas using the given palette.
    ///
    /// Index 0 pixels are fully transparent; every other index is opaque with its palette
    /// color (black if the palette has no such entry). Sprites beyond the atlas capacity are
    /// dropped.
    pub fn rasterize(sprites: &[SpriteResource], palette: &Palette, size: AtlasSize) -> Self {
        let mut atlas = Self::empty(size);

        if sprites.len() > size.capacity() {
            warn!(
                sprites = sprites.len(),
                capacity = size.capacity(),
                "Too many sprites for the atlas, dropping the overflow"
            );
        }

        for (index, sprite) in sprites.iter().take(size.capacity()).enumerate() {
            let Some(frame) = atlas.frame_at(index) else {
                break;
            };
            atlas.blit(sprite, frame, palette);
            atlas.count += 1;
        }

        debug!(sprite_count = atlas.count, atlas_size = size.pixels(), "Rasterized sprite atlas");
        atlas
    }

    fn blit(&mut self, sprite: &SpriteResource, frame: AtlasFrame, palette: &Palette) {
        let origin_x = frame.pos.x as u32;
        let origin_y = frame.pos.y as u32;
        for (y, row) in sprite.indices().iter().enumerate() {
            for (x, &index) in row.iter().enumerate() {
                let pixel = if index == 0 { TRANSPARENT } else { palette.rgba(index as i64) };
                self.image.put_pixel(origin_x + x as u32, origin_y + y as u32, pixel);
            }
        }
    }

    /// The cell for an index, whether or not a sprite was rasterized there.
    fn frame_at(&self, index: usize) -> Option<AtlasFrame> {
        if index >= self.size.capacity() {
            return None;
        }
        let per_row = self.size.cells_per_row() as usize;
        let cell = CELL_SIZE as u16;
        Some(AtlasFrame {
            pos: U16Vec2::new((index % per_row) as u16 * cell, (index / per_row) as u16 * cell),
            size: U16Vec2::splat(cell),
        })
    }

    /// The bounds of a rasterized sprite, or `None` if no sprite has that index.
    pub fn position_of(&self, index: usize) -> Option<AtlasFrame> {
        if index >= self.count {
            return None;
        }
        self.frame_at(index)
    }

    /// The number of sprites in the atlas.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn size(&self) -> AtlasSize {
        self.size
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Reads one pixel of a sprite, relative to its cell.
    pub fn sprite_pixel(&self, index: usize, x: u32, y: u32) -> Option<Rgba<u8>> {
        let frame = self.position_of(index)?;
        if x >= frame.size.x as u32 || y >= frame.size.y as u32 {
            return None;
        }
        Some(*self.image.get_pixel(frame.pos.x as u32 + x, frame.pos.y as u32 + y))
    }
}
