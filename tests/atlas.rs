use glam::U16Vec2;
use image::Rgba;
use pretty_assertions::assert_eq;
use quickcart::display::Palette;
use quickcart::texture::{AtlasFrame, AtlasSize, SpriteAtlas, SpriteResource};
use serde_json::json;
use speculoos::prelude::*;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

fn rgb_palette() -> Palette {
    Palette::new([0x000000, 0xFF0000, 0x00FF00, 0x0000FF])
}

#[test]
fn test_layers_combine_into_palette_index() {
    let sprite = SpriteResource::from_value(&json!([
        [0b1000_0000, 0, 0, 0, 0, 0, 0, 0],
        [0b1000_0000, 0, 0, 0, 0, 0, 0, 0]
    ]));

    assert_that(&sprite.pixel(0, 0)).is_equal_to(3);
    assert_that(&sprite.pixel(1, 0)).is_equal_to(0);

    let atlas = SpriteAtlas::rasterize(&[sprite], &rgb_palette(), AtlasSize::Large);
    assert_eq!(atlas.sprite_pixel(0, 0, 0), Some(Rgba([0, 0, 0xFF, 0xFF])));
}

#[test]
fn test_single_layer_sets_index_one() {
    let sprite = SpriteResource::from_value(&json!([[0x3C, 0x7E, 0xFF, 0xFF, 0xFF, 0xFF, 0x7E, 0x3C]]));

    assert_that(&sprite.pixel(0, 0)).is_equal_to(0);
    assert_that(&sprite.pixel(2, 0)).is_equal_to(1);
    assert_that(&sprite.pixel(0, 2)).is_equal_to(1);
}

#[test]
fn test_hex_rows_give_indices_directly() {
    let sprite = SpriteResource::from_value(&json!([
        "0123456789abcdef",
        "f0000000",
        "00000000",
        "00000000",
        "00000000",
        "00000000",
        "00000000",
        "0000000A"
    ]));

    // Wrong-length rows are blank.
    assert_that(&sprite.pixel(1, 0)).is_equal_to(0);
    assert_that(&sprite.pixel(0, 1)).is_equal_to(15);
    assert_that(&sprite.pixel(7, 7)).is_equal_to(10);
}

#[test]
fn test_malformed_sprites_are_transparent() {
    let short_layer = SpriteResource::from_value(&json!([[0xFF, 0xFF, 0xFF]]));
    assert_eq!(short_layer.indices(), [[0; 8]; 8]);

    assert_eq!(SpriteResource::from_value(&json!(42)), SpriteResource::blank());
    assert_eq!(SpriteResource::from_value(&json!({ "width": 8 })), SpriteResource::blank());
}

#[test]
fn test_object_wrapped_layers() {
    let sprite = SpriteResource::from_value(&json!({
        "width": 8,
        "height": 8,
        "layers": [[0xFF, 0, 0, 0, 0, 0, 0, 0]]
    }));

    assert_that(&sprite.pixel(7, 0)).is_equal_to(1);
    assert_that(&sprite.pixel(7, 1)).is_equal_to(0);
}

#[test]
fn test_layer_bytes_are_clamped() {
    let sprite = SpriteResource::from_value(&json!([[300, -5, 128.9, 0, 0, 0, 0, 0]]));

    assert_that(&(0..8).filter(|&x| sprite.pixel(x, 0) == 1).count()).is_equal_to(8);
    assert_that(&(0..8).filter(|&x| sprite.pixel(x, 1) == 1).count()).is_equal_to(0);
    assert_that(&sprite.pixel(0, 2)).is_equal_to(1);
    assert_that(&sprite.pixel(1, 2)).is_equal_to(0);
}

#[test]
fn test_index_zero_is_transparent() {
    let sprite = SpriteResource::from_value(&json!(["10000000", "0", "0", "0", "0", "0", "0", "0"]));
    let atlas = SpriteAtlas::rasterize(&[sprite], &rgb_palette(), AtlasSize::Small);

    assert_eq!(atlas.sprite_pixel(0, 0, 0), Some(Rgba([0xFF, 0, 0, 0xFF])));
    assert_eq!(atlas.sprite_pixel(0, 1, 0), Some(TRANSPARENT));
}

#[test]
fn test_missing_palette_entries_render_black() {
    let sprite = SpriteResource::from_value(&json!(["f0000000", "0", "0", "0", "0", "0", "0", "0"]));
    let atlas = SpriteAtlas::rasterize(&[sprite], &rgb_palette(), AtlasSize::Small);

    assert_eq!(atlas.sprite_pixel(0, 0, 0), Some(Rgba([0, 0, 0, 0xFF])));
}

#[test]
fn test_position_follows_index() {
    let sprites = vec![SpriteResource::blank(); 40];
    let atlas = SpriteAtlas::rasterize(&sprites, &Palette::default(), AtlasSize::Large);

    assert_that(&atlas.len()).is_equal_to(40);
    assert_eq!(
        atlas.position_of(0),
        Some(AtlasFrame {
            pos: U16Vec2::new(0, 0),
            size: U16Vec2::new(8, 8)
        })
    );
    assert_eq!(atlas.position_of(31).map(|frame| frame.pos), Some(U16Vec2::new(248, 0)));
    assert_eq!(atlas.position_of(32).map(|frame| frame.pos), Some(U16Vec2::new(0, 8)));
    assert_eq!(atlas.position_of(39).map(|frame| frame.pos), Some(U16Vec2::new(56, 8)));
    assert_that(&atlas.position_of(40)).is_none();
}

#[test]
fn test_small_atlas_wraps_sooner_and_drops_overflow() {
    assert_that(&AtlasSize::Small.cells_per_row()).is_equal_to(16);
    assert_that(&AtlasSize::Small.capacity()).is_equal_to(256);

    let sprites = vec![SpriteResource::blank(); 300];
    let atlas = SpriteAtlas::rasterize(&sprites, &Palette::default(), AtlasSize::Small);

    assert_that(&atlas.len()).is_equal_to(256);
    assert_eq!(atlas.position_of(16).map(|frame| frame.pos), Some(U16Vec2::new(0, 8)));
    assert_that(&atlas.position_of(256)).is_none();
}

#[test]
fn test_rasterizing_twice_is_identical() {
    let sprites = [
        SpriteResource::from_value(&json!([[0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55]])),
        SpriteResource::from_value(&json!(vec!["12345678"; 8])),
    ];
    let palette = Palette::default();

    let first = SpriteAtlas::rasterize(&sprites, &palette, AtlasSize::Large);
    let second = SpriteAtlas::rasterize(&sprites, &palette, AtlasSize::Large);

    assert_that(&(first.image() == second.image())).is_true();
    assert_eq!(first.position_of(1), second.position_of(1));
}
