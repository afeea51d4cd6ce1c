//! This module contains all the constants used by the runtime.

use std::time::Duration;

/// The fixed frame period of the scheduler (60 Hz).
pub const LOOP_TIME: Duration = Duration::from_nanos((1_000_000_000.0 / 60.0) as u64);

/// The number of ticks over which frame statistics are averaged and logged.
pub const STATS_PERIOD: u64 = 60 * 60;

/// The size of each sprite and tile cell, in pixels.
pub const CELL_SIZE: u32 = 8;

/// The number of slots in the sprite table.
pub const SPRITE_SLOTS: usize = 64;

/// The maximum number of colors in a palette.
pub const PALETTE_SIZE: usize = 16;

/// The maximum number of bit-layers a sprite may combine (4 layers = 16 colors).
pub const MAX_SPRITE_LAYERS: usize = 4;

/// The color used for out-of-range palette lookups.
pub const FALLBACK_COLOR: u32 = 0x000000;

/// The palette used when a game does not provide one.
pub const DEFAULT_PALETTE: [u32; PALETTE_SIZE] = [
    0x000000, 0x666666, 0x888888, 0xAAAAAA, 0xCCCCCC, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF,
    0x00FFFF, 0x800000, 0x008000, 0x000080, 0x808080,
];

/// How long after the first rendered frame the first-frame hook runs.
pub const FIRST_FRAME_HOOK_DELAY: Duration = Duration::from_millis(50);

/// The names of the three entry points every guest program must define.
pub const ENTRY_POINTS: [&str; 3] = ["metadata", "resources", "update"];

/// The title given to games whose metadata omits one.
pub const UNTITLED_GAME: &str = "Untitled Game";
