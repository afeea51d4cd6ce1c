//! Sprite decoding and the sprite sheet compositor.

pub mod atlas;
pub mod sprite;

pub use atlas::{AtlasFrame, AtlasSize, SpriteAtlas};
pub use sprite::SpriteResource;
