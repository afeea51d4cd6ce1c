use glam::Vec2;
use pretty_assertions::assert_eq;
use quickcart::display::{DisplayState, GridSize};
use quickcart::game::commands::FrameCommandResult;
use quickcart::game::interpreter::CommandInterpreter;
use serde_json::json;
use speculoos::prelude::*;

fn apply(display: &mut DisplayState, value: serde_json::Value) -> bool {
    let result = FrameCommandResult::from_value(value).expect("valid result");
    CommandInterpreter.apply(&result.normalize(), display).game_over
}

#[test]
fn test_sprite_and_score_from_one_frame() {
    let mut display = DisplayState::default();
    display.set_sprite(10, 1, Vec2::ZERO);

    apply(&mut display, json!({ "sprites": [{ "spriteId": 2, "x": 10, "y": 20 }], "score": 42 }));

    let slot = display.sprite(0).expect("slot 0 placed");
    assert_that(&slot.sprite).is_equal_to(2);
    assert_eq!(slot.position, Vec2::new(10.0, 20.0));
    assert_that(&display.sprites().count()).is_equal_to(1);
    assert_that(&display.score()).is_equal_to(42);
}

#[test]
fn test_tiles_persist_but_sprites_do_not() {
    let mut display = DisplayState::default();

    apply(
        &mut display,
        json!({ "tiles": [{ "x": 1, "y": 1, "tileId": 5 }], "sprites": [{ "spriteId": 0, "x": 0, "y": 0 }] }),
    );
    apply(&mut display, json!({}));

    assert_that(&display.tile(1, 1)).is_equal_to(Some(5));
    assert_that(&display.sprites().count()).is_equal_to(0);
}

#[test]
fn test_absent_score_and_background_are_kept() {
    let mut display = DisplayState::default();
    apply(&mut display, json!({ "score": 7, "background": 3 }));
    apply(&mut display, json!({ "sprites": [] }));

    assert_that(&display.score()).is_equal_to(7);
    assert_that(&display.background()).is_equal_to(3);
}

#[test]
fn test_score_is_replaced_not_added() {
    let mut display = DisplayState::default();
    apply(&mut display, json!({ "score": 10 }));
    apply(&mut display, json!({ "score": 4 }));

    assert_that(&display.score()).is_equal_to(4);
}

#[test]
fn test_sprites_beyond_the_table_are_dropped() {
    let mut display = DisplayState::default();
    let sprites: Vec<_> = (0..70).map(|i| json!({ "spriteId": 1, "x": i, "y": 0 })).collect();

    apply(&mut display, json!({ "sprites": sprites }));

    assert_that(&display.sprites().count()).is_equal_to(64);
    assert_eq!(display.sprite(63).map(|slot| slot.position.x), Some(63.0));
}

#[test]
fn test_out_of_bounds_tiles_are_dropped() {
    let mut display = DisplayState::new(GridSize::Small);
    apply(
        &mut display,
        json!({ "tiles": [{ "x": 20, "y": 1, "tileId": 5 }, { "x": -1, "y": 0, "tileId": 5 }] }),
    );

    assert_that(&display.tiles().count()).is_equal_to(0);
}

#[test]
fn test_negative_ids_clear() {
    let mut display = DisplayState::default();
    apply(
        &mut display,
        json!([
            { "type": "tile", "x": 2, "y": 2, "tileId": 3 },
            { "type": "sprite", "slotId": 4, "spriteId": 1, "x": 0, "y": 0 }
        ]),
    );
    assert_that(&display.tile(2, 2)).is_equal_to(Some(3));
    assert_that(&display.sprite(4)).is_some();

    apply(
        &mut display,
        json!([
            { "type": "tile", "x": 2, "y": 2, "tileId": -1 },
            { "type": "sprite", "slotId": 4, "spriteId": -1, "x": 0, "y": 0 }
        ]),
    );
    assert_that(&display.tile(2, 2)).is_none();
    assert_that(&display.sprite(4)).is_none();
}

#[test]
fn test_flat_commands_do_not_clear_other_slots() {
    let mut display = DisplayState::default();
    apply(&mut display, json!([{ "type": "sprite", "slotId": 1, "spriteId": 1, "x": 0, "y": 0 }]));
    apply(&mut display, json!([{ "type": "sprite", "slotId": 2, "spriteId": 1, "x": 0, "y": 0 }]));

    assert_that(&display.sprites().count()).is_equal_to(2);

    apply(&mut display, json!([{ "type": "clearSprite", "slotId": 1 }]));
    assert_that(&display.sprite(1)).is_none();
    assert_that(&display.sprite(2)).is_some();
}

#[test]
fn test_game_over_reported_once() {
    let mut display = DisplayState::default();

    assert_that(&apply(&mut display, json!({ "gameOver": true }))).is_true();
    assert_that(&apply(&mut display, json!({ "gameOver": true }))).is_false();
    assert_that(&display.is_game_over()).is_true();
}

#[test]
fn test_game_over_keeps_the_final_score() {
    let mut display = DisplayState::default();

    assert_that(&apply(&mut display, json!({ "score": 12, "gameOver": true }))).is_true();

    assert_that(&display.score()).is_equal_to(12);
    assert_that(&display.is_game_over()).is_true();
}

#[test]
fn test_empty_result_leaves_display_untouched() {
    let mut display = DisplayState::default();
    apply(&mut display, json!({ "sprites": [{ "spriteId": 1, "x": 0, "y": 0 }], "score": 5 }));
    let before = display.clone();

    CommandInterpreter.apply(&FrameCommandResult::Empty.normalize(), &mut display);

    assert_eq!(display, before);
}
