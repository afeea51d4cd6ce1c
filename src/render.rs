//! The presentation step. The display buffer is read here and nowhere else.

use std::path::Path;

use glam::IVec2;
use image::{Rgba, RgbaImage};
use tracing::trace;

use crate::constants::CELL_SIZE;
use crate::display::{DisplayState, Palette};
use crate::services::LeaderboardEntry;
use crate::texture::SpriteAtlas;

/// Host content drawn over the game while it is paused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Leaderboard(Vec<LeaderboardEntry>),
}

/// Everything needed to paint one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    pub display: &'a DisplayState,
    pub atlas: &'a SpriteAtlas,
    pub palette: &'a Palette,
    pub overlay: Option<&'a Overlay>,
}

pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame<'_>);

    /// The most recently composed frame, if this renderer keeps one.
    fn last_frame(&self) -> Option<&RgbaImage> {
        None
    }
}

/// A software compositor painting into an RGBA image the size of the tile grid.
///
/// Layers, bottom to top: background color, tiles, sprites in slot order, then a dimming
/// layer while paused.
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    screen: RgbaImage,
    frames: u64,
}

impl Default for FrameCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCompositor {
    pub fn new() -> Self {
        Self {
            screen: RgbaImage::new(0, 0),
            frames: 0,
        }
    }

    pub fn screen(&self) -> &RgbaImage {
        &self.screen
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        self.screen.save_with_format(path, image::ImageFormat::Png)
    }

    /// Copies an 8×8 atlas cell to `origin`, clipping at the screen edges and skipping
    /// transparent pixels.
    fn draw_cell(&mut self, atlas: &SpriteAtlas, index: u32, origin: IVec2) {
        let Some(frame) = atlas.position_of(index as usize) else {
            trace!(index, "No sprite at atlas index, skipping");
            return;
        };
        let (width, height) = self.screen.dimensions();
        for y in 0..frame.size.y as u32 {
            for x in 0..frame.size.x as u32 {
                // Far off-screen sprites sit near the i32 limits.
                let (Ok(tx), Ok(ty)) = (
                    u32::try_from(i64::from(origin.x) + i64::from(x)),
                    u32::try_from(i64::from(origin.y) + i64::from(y)),
                ) else {
                    continue;
                };
                if tx >= width || ty >= height {
                    continue;
                }
                let pixel = *atlas.image().get_pixel(frame.pos.x as u32 + x, frame.pos.y as u32 + y);
                if pixel.0[3] == 0 {
                    continue;
                }
                self.screen.put_pixel(tx, ty, pixel);
            }
        }
    }

    /// Without a font, the leaderboard is drawn as one bar per rank, scaled to the top score.
    fn draw_leaderboard(&mut self, entries: &[LeaderboardEntry], palette: &Palette) {
        let (width, height) = self.screen.dimensions();
        let max_score = i128::from(entries.iter().map(|entry| entry.score).max().unwrap_or(0).max(1));
        let rows = (height / CELL_SIZE).saturating_sub(2) as usize;
        let track = width.saturating_sub(2 * CELL_SIZE);

        for (row, entry) in entries.iter().take(rows).enumerate() {
            let color = palette.rgba(1 + (row as i64 % (palette.len().max(2) as i64 - 1)));
            // i128 keeps the product exact for any pair of i64 scores.
            let span = (i128::from(track) * i128::from(entry.score.max(0)) / max_score).min(i128::from(track)) as u32;
            let top = CELL_SIZE * (row as u32 + 1);
            for y in top + 1..top + CELL_SIZE - 1 {
                for x in CELL_SIZE..CELL_SIZE + span {
                    self.screen.put_pixel(x, y, color);
                }
            }
        }
    }

    fn dim(&mut self, factor: u16) {
        for pixel in self.screen.pixels_mut() {
            for channel in &mut pixel.0[..3] {
                *channel = (u16::from(*channel) * factor / 256) as u8;
            }
        }
    }
}

impl Renderer for FrameCompositor {
    fn render(&mut self, frame: &RenderFrame<'_>) {
        let size = frame.display.grid().pixels();
        let background: Rgba<u8> = frame.palette.rgba(frame.display.background());
        if self.screen.dimensions() != (size.x, size.y) {
            self.screen = RgbaImage::from_pixel(size.x, size.y, background);
        } else {
            self.screen.pixels_mut().for_each(|pixel| *pixel = background);
        }

        for (cell, tile) in frame.display.tiles() {
            let origin = (cell * CELL_SIZE).as_ivec2();
            self.draw_cell(frame.atlas, tile, origin);
        }

        for (_, slot) in frame.display.sprites() {
            let origin = slot.position.round().as_ivec2();
            self.draw_cell(frame.atlas, slot.sprite, origin);
        }

        if frame.display.is_paused() {
            match frame.overlay {
                Some(Overlay::Leaderboard(entries)) => {
                    self.dim(64);
                    self.draw_leaderboard(entries, frame.palette);
                }
                None => self.dim(128),
            }
        }

        self.frames += 1;
    }

    fn last_frame(&self) -> Option<&RgbaImage> {
        (self.frames > 0).then_some(&self.screen)
    }
}
