//! Decoding of guest-supplied 8×8 sprite resources into palette indices.

use serde_json::Value;
use smallvec::SmallVec;
use tracing::debug;

use crate::constants::{CELL_SIZE, MAX_SPRITE_LAYERS};

const SIDE: usize = CELL_SIZE as usize;

/// One 8-pixel row per byte, most significant bit on the left.
pub type BitLayer = [u8; SIDE];

/// Palette indices for every pixel, indexed `[y][x]`.
pub type IndexGrid = [[u8; SIDE]; SIDE];

/// An 8×8 sprite in one of the two supported source formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteResource {
    /// 1–4 bit-layers; a pixel's index combines the set bits as `bit << layer`.
    BitLayers(SmallVec<[BitLayer; MAX_SPRITE_LAYERS]>),
    /// 8 rows of 8 hex digits, each digit giving the palette index directly.
    HexRows(IndexGrid),
}

impl SpriteResource {
    /// A fully transparent sprite.
    pub fn blank() -> Self {
        SpriteResource::HexRows([[0; SIDE]; SIDE])
    }

    /// Decodes a sprite from its guest representation.
    ///
    /// Accepts an array of bit-layers (`[[b0..b7], ...]`), an array of hex-digit row strings,
    /// or an object wrapping bit-layers as `{ layers: [...] }`. Anything malformed decodes to
    /// transparent pixels rather than failing.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(rows) if rows.first().is_some_and(Value::is_string) => Self::hex_rows(rows),
            Value::Array(layers) => Self::bit_layers(layers),
            Value::Object(object) => match object.get("layers") {
                Some(Value::Array(layers)) => Self::bit_layers(layers),
                _ => {
                    debug!("Sprite object has no layers, using a blank sprite");
                    Self::blank()
                }
            },
            other => {
                debug!(kind = value_kind(other), "Unrecognized sprite format, using a blank sprite");
                Self::blank()
            }
        }
    }

    fn bit_layers(layers: &[Value]) -> Self {
        if layers.len() > MAX_SPRITE_LAYERS {
            debug!(count = layers.len(), "Sprite has more than {MAX_SPRITE_LAYERS} layers, ignoring the rest");
        }
        SpriteResource::BitLayers(layers.iter().take(MAX_SPRITE_LAYERS).map(decode_layer).collect())
    }

    fn hex_rows(rows: &[Value]) -> Self {
        let mut grid = [[0; SIDE]; SIDE];
        for (target, row) in grid.iter_mut().zip(rows) {
            *target = decode_hex_row(row);
        }
        SpriteResource::HexRows(grid)
    }

    /// The palette index of the pixel at `(x, y)`; 0 outside the sprite.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        if x >= SIDE || y >= SIDE {
            return 0;
        }
        match self {
            SpriteResource::BitLayers(layers) => layers
                .iter()
                .enumerate()
                .filter(|(_, layer)| layer[y] & (0x80 >> x) != 0)
                .fold(0, |index, (layer, _)| index | (1 << layer)),
            SpriteResource::HexRows(grid) => grid[y][x],
        }
    }

    /// Decodes every pixel.
    pub fn indices(&self) -> IndexGrid {
        let mut grid = [[0; SIDE]; SIDE];
        for (y, row) in grid.iter_mut().enumerate() {
            for (x, index) in row.iter_mut().enumerate() {
                *index = self.pixel(x, y);
            }
        }
        grid
    }
}

/// A layer must be exactly 8 numbers; anything else is an empty layer.
fn decode_layer(layer: &Value) -> BitLayer {
    let mut bytes = [0; SIDE];
    match layer {
        Value::Array(values) if values.len() == SIDE => {
            for (byte, value) in bytes.iter_mut().zip(values) {
                *byte = clamp_byte(value);
            }
        }
        _ => debug!("Malformed sprite layer, treating as empty"),
    }
    bytes
}

fn clamp_byte(value: &Value) -> u8 {
    value
        .as_f64()
        .filter(|value| value.is_finite())
        .map(|value| value.floor().clamp(0.0, 255.0) as u8)
        .unwrap_or(0)
}

/// A row must be exactly 8 characters; invalid digits read as 0.
fn decode_hex_row(row: &Value) -> [u8; SIDE] {
    let mut indices = [0; SIDE];
    match row.as_str() {
        Some(text) if text.chars().count() == SIDE => {
            for (index, digit) in indices.iter_mut().zip(text.chars()) {
                *index = digit.to_digit(16).unwrap_or(0) as u8;
            }
        }
        _ => debug!("Malformed sprite row, treating as transparent"),
    }
    indices
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp_byte() {
        assert_eq!(clamp_byte(&json!(300)), 255);
        assert_eq!(clamp_byte(&json!(-4)), 0);
        assert_eq!(clamp_byte(&json!(12.9)), 12);
        assert_eq!(clamp_byte(&json!("12")), 0);
    }

    #[test]
    fn test_hex_row_wrong_length_is_transparent() {
        assert_eq!(decode_hex_row(&json!("123")), [0; SIDE]);
        assert_eq!(decode_hex_row(&json!("0123456z")), [0, 1, 2, 3, 4, 5, 6, 0]);
    }
}
