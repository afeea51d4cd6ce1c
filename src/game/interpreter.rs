//! Applies normalized frame commands to the display buffer.

use tracing::{debug, info};

use crate::display::DisplayState;
use crate::game::commands::{FrameCommand, FrameCommands};

/// What applying a frame changed beyond the display itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    /// Set only on the frame that first raises the game-over flag.
    pub game_over: bool,
}

/// The only writer of [`DisplayState`] during play.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandInterpreter;

impl CommandInterpreter {
    pub fn apply(&self, frame: &FrameCommands, display: &mut DisplayState) -> Applied {
        let mut applied = Applied::default();

        if frame.clear_sprites {
            display.clear_sprites();
        }

        for command in &frame.commands {
            match *command {
                FrameCommand::PlaceSprite { slot, sprite, position } => match u32::try_from(sprite) {
                    Ok(sprite) => display.set_sprite(slot, sprite, position),
                    Err(_) => display.clear_sprite(slot),
                },
                FrameCommand::ClearSprite { slot } => display.clear_sprite(slot),
                FrameCommand::PlaceTile { x, y, tile } => match u32::try_from(tile) {
                    Ok(tile) => display.set_tile(x, y, tile),
                    Err(_) => display.clear_tile(x, y),
                },
                FrameCommand::ClearTile { x, y } => display.clear_tile(x, y),
                FrameCommand::SetBackground(index) => display.set_background(index),
                FrameCommand::SetScore(score) => display.set_score(score),
                FrameCommand::GameOver => {
                    if display.is_game_over() {
                        debug!("Game over already reported, ignoring");
                    } else {
                        let score = display.score();
                        info!(score, "Guest reported game over");
                        display.set_game_over(true);
                        applied.game_over = true;
                    }
                }
            }
        }

        applied
    }
}
