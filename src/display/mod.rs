//! The display buffer: a fixed sprite table, a tile grid, and the scalar display registers.
//!
//! All writes are bounds-checked; anything out of range is silently dropped.

use glam::{UVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::constants::{CELL_SIZE, SPRITE_SLOTS};

pub mod palette;

pub use palette::Palette;

/// The supported tile grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum GridSize {
    /// 16×16 cells (128×128 pixels).
    Small,
    /// 32×32 cells (256×256 pixels).
    #[default]
    Large,
}

impl GridSize {
    /// The number of cells along each axis.
    pub const fn cells(self) -> u32 {
        match self {
            GridSize::Small => 16,
            GridSize::Large => 32,
        }
    }

    /// The size of the whole screen, in pixels.
    pub const fn pixels(self) -> UVec2 {
        UVec2::splat(self.cells() * CELL_SIZE)
    }
}

impl TryFrom<u32> for GridSize {
    type Error = crate::error::ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(GridSize::Small),
            32 => Ok(GridSize::Large),
            other => Err(crate::error::ConfigError::GridSize(other)),
        }
    }
}

impl From<GridSize> for u32 {
    fn from(value: GridSize) -> Self {
        value.cells()
    }
}

/// A sprite placed in the sprite table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteSlot {
    /// Index into the sprite atlas.
    pub sprite: u32,
    /// Screen position in pixels (fractional positions are rounded when composed).
    pub position: Vec2,
}

/// The complete mutable display state for the loaded game.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    grid: GridSize,
    sprites: [Option<SpriteSlot>; SPRITE_SLOTS],
    /// Row-major, `grid.cells()²` entries.
    tiles: Vec<Option<u32>>,
    background: i64,
    score: i64,
    game_over: bool,
    paused: bool,
}

impl DisplayState {
    pub fn new(grid: GridSize) -> Self {
        let cells = grid.cells() as usize;
        Self {
            grid,
            sprites: [None; SPRITE_SLOTS],
            tiles: vec![None; cells * cells],
            background: 0,
            score: 0,
            game_over: false,
            paused: false,
        }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Empties every sprite slot and tile cell and zeroes the registers.
    pub fn reset(&mut self) {
        self.clear_sprites();
        self.tiles.fill(None);
        self.background = 0;
        self.score = 0;
        self.game_over = false;
        self.paused = false;
    }

    fn slot_index(slot: i64) -> Option<usize> {
        usize::try_from(slot).ok().filter(|&slot| slot < SPRITE_SLOTS)
    }

    fn cell_index(&self, x: i64, y: i64) -> Option<usize> {
        let cells = self.grid.cells() as i64;
        if (0..cells).contains(&x) && (0..cells).contains(&y) {
            Some((y * cells + x) as usize)
        } else {
            None
        }
    }

    pub fn set_sprite(&mut self, slot: i64, sprite: u32, position: Vec2) {
        if let Some(index) = Self::slot_index(slot) {
            self.sprites[index] = Some(SpriteSlot { sprite, position });
        }
    }

    pub fn clear_sprite(&mut self, slot: i64) {
        if let Some(index) = Self::slot_index(slot) {
            self.sprites[index] = None;
        }
    }

    pub fn clear_sprites(&mut self) {
        self.sprites.fill(None);
    }

    pub fn sprite(&self, slot: usize) -> Option<SpriteSlot> {
        self.sprites.get(slot).copied().flatten()
    }

    /// Occupied slots, in slot order.
    pub fn sprites(&self) -> impl Iterator<Item = (usize, SpriteSlot)> + '_ {
        self.sprites
            .iter()
            .enumerate()
            .filter_map(|(slot, sprite)| sprite.map(|sprite| (slot, sprite)))
    }

    pub fn set_tile(&mut self, x: i64, y: i64, tile: u32) {
        if let Some(index) = self.cell_index(x, y) {
            self.tiles[index] = Some(tile);
        }
    }

    pub fn clear_tile(&mut self, x: i64, y: i64) {
        if let Some(index) = self.cell_index(x, y) {
            self.tiles[index] = None;
        }
    }

    pub fn tile(&self, x: i64, y: i64) -> Option<u32> {
        self.cell_index(x, y).and_then(|index| self.tiles[index])
    }

    /// Occupied cells as `(cell, tile)` pairs, in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (UVec2, u32)> + '_ {
        let cells = self.grid.cells();
        self.tiles.iter().enumerate().filter_map(move |(index, tile)| {
            let index = index as u32;
            tile.map(|tile| (UVec2::new(index % cells, index / cells), tile))
        })
    }

    pub fn background(&self) -> i64 {
        self.background
    }

    pub fn set_background(&mut self, index: i64) {
        self.background = index;
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn set_score(&mut self, score: i64) {
        self.score = score;
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn set_game_over(&mut self, game_over: bool) {
        self.game_over = game_over;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new(GridSize::default())
    }
}
