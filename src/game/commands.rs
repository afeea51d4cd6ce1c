//! The frame command protocol between guest and host.
//!
//! Guests return either a grouped object (`{sprites, tiles, background, score, gameOver}`) or,
//! in older programs, a flat list of `{type: ..., ...}` commands. Both are normalized on
//! ingestion into [`FrameCommands`], so nothing downstream sees the wire shape.

use glam::Vec2;
use serde::Deserialize;
use serde_json::{Map, Value};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::error::{GuestError, GuestErrorReport};

/// The grouped result shape. Every field is optional and kept loosely typed so that a single
/// malformed field only drops that field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupedResult {
    pub sprites: Option<Value>,
    pub tiles: Option<Value>,
    pub background: Option<Value>,
    pub score: Option<Value>,
    pub game_over: Option<Value>,
    pub error: Option<Value>,
}

/// A value returned by the guest's `update`, copied out of the sandbox.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FrameCommandResult {
    /// `undefined`/`null`, or the substitute for a faulted frame.
    #[default]
    Empty,
    Grouped(GroupedResult),
    /// The legacy flat command list.
    Commands(Vec<Value>),
}

impl FrameCommandResult {
    /// Classifies a copied-out guest value.
    pub fn from_value(value: Value) -> Result<Self, GuestError> {
        match value {
            Value::Null => Ok(FrameCommandResult::Empty),
            Value::Array(commands) => Ok(FrameCommandResult::Commands(commands)),
            Value::Object(object) => serde_json::from_value(Value::Object(object))
                .map(FrameCommandResult::Grouped)
                .map_err(|e| GuestError::InvalidResult(e.to_string())),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Err(GuestError::InvalidResult(format!("expected an object or array, got {value}")))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FrameCommandResult::Empty)
    }

    /// The trampoline's error sentinel, if this result carries one.
    ///
    /// Presence of the `error` field is what matters; its contents are read leniently.
    pub fn error_report(&self) -> Option<GuestErrorReport> {
        let FrameCommandResult::Grouped(grouped) = self else {
            return None;
        };
        let error = grouped.error.as_ref()?;
        Some(match error {
            Value::Object(fields) => GuestErrorReport {
                message: string_field(fields, "message"),
                stack: string_field(fields, "stack"),
                name: string_field(fields, "name"),
            },
            other => GuestErrorReport {
                message: other.to_string(),
                stack: String::new(),
                name: "Error".to_string(),
            },
        })
    }

    /// Normalizes either wire shape into host commands.
    pub fn normalize(&self) -> FrameCommands {
        match self {
            FrameCommandResult::Empty => FrameCommands::noop(),
            FrameCommandResult::Grouped(grouped) => normalize_grouped(grouped),
            FrameCommandResult::Commands(commands) => normalize_flat(commands),
        }
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// A single display mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameCommand {
    /// A negative sprite id empties the slot.
    PlaceSprite { slot: i64, sprite: i64, position: Vec2 },
    ClearSprite { slot: i64 },
    /// A negative tile id clears the cell.
    PlaceTile { x: i64, y: i64, tile: i64 },
    ClearTile { x: i64, y: i64 },
    SetBackground(i64),
    SetScore(i64),
    GameOver,
}

/// One frame's worth of normalized commands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameCommands {
    /// Whether every sprite slot is emptied before the commands run.
    pub clear_sprites: bool,
    pub commands: SmallVec<[FrameCommand; 16]>,
}

impl FrameCommands {
    /// A result that leaves the display exactly as it is.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        !self.clear_sprites && self.commands.is_empty()
    }
}

/// Reads a guest number as an integer, flooring fractions. Non-numbers and non-finite
/// values are rejected.
fn whole(value: &Value) -> Option<i64> {
    value
        .as_f64()
        .filter(|value| value.is_finite())
        .map(|value| value.floor() as i64)
}

fn coordinate(value: &Value) -> Option<f32> {
    value.as_f64().filter(|value| value.is_finite()).map(|value| value as f32)
}

fn field<'a>(entry: &'a Value, key: &str) -> Option<&'a Value> {
    entry.as_object().and_then(|object| object.get(key))
}

fn whole_field(entry: &Value, key: &str) -> Option<i64> {
    field(entry, key).and_then(whole)
}

fn position_field(entry: &Value) -> Option<Vec2> {
    let x = field(entry, "x").and_then(coordinate)?;
    let y = field(entry, "y").and_then(coordinate)?;
    Some(Vec2::new(x, y))
}

/// The grouped shape always clears sprites first: an absent `sprites` list means none are
/// visible. Absent `background`/`score` mean "unchanged".
fn normalize_grouped(grouped: &GroupedResult) -> FrameCommands {
    let mut frame = FrameCommands {
        clear_sprites: true,
        commands: SmallVec::new(),
    };

    if let Some(Value::Array(sprites)) = &grouped.sprites {
        for (slot, entry) in sprites.iter().enumerate() {
            match (whole_field(entry, "spriteId"), position_field(entry)) {
                (Some(sprite), Some(position)) => frame.commands.push(FrameCommand::PlaceSprite {
                    slot: slot as i64,
                    sprite,
                    position,
                }),
                _ => trace!(slot, "Skipping malformed sprite entry"),
            }
        }
    }

    if let Some(Value::Array(tiles)) = &grouped.tiles {
        for entry in tiles {
            match (
                whole_field(entry, "x"),
                whole_field(entry, "y"),
                whole_field(entry, "tileId"),
            ) {
                (Some(x), Some(y), Some(tile)) => frame.commands.push(FrameCommand::PlaceTile { x, y, tile }),
                _ => trace!("Skipping malformed tile entry"),
            }
        }
    }

    if let Some(background) = grouped.background.as_ref().and_then(whole) {
        frame.commands.push(FrameCommand::SetBackground(background));
    }

    if let Some(score) = grouped.score.as_ref().and_then(whole) {
        frame.commands.push(FrameCommand::SetScore(score));
    }

    if grouped.game_over == Some(Value::Bool(true)) {
        frame.commands.push(FrameCommand::GameOver);
    }

    frame
}

/// The flat shape addresses slots explicitly and never clears implicitly.
fn normalize_flat(commands: &[Value]) -> FrameCommands {
    let mut frame = FrameCommands::noop();

    for entry in commands {
        let kind = field(entry, "type").and_then(Value::as_str).unwrap_or_default();
        let command = match kind {
            "sprite" => (|| {
                Some(FrameCommand::PlaceSprite {
                    slot: whole_field(entry, "slotId")?,
                    sprite: whole_field(entry, "spriteId")?,
                    position: position_field(entry)?,
                })
            })(),
            "clearSprite" => whole_field(entry, "slotId").map(|slot| FrameCommand::ClearSprite { slot }),
            "tile" => (|| {
                Some(FrameCommand::PlaceTile {
                    x: whole_field(entry, "x")?,
                    y: whole_field(entry, "y")?,
                    tile: whole_field(entry, "tileId")?,
                })
            })(),
            "clearTile" => (|| {
                Some(FrameCommand::ClearTile {
                    x: whole_field(entry, "x")?,
                    y: whole_field(entry, "y")?,
                })
            })(),
            "background" => whole_field(entry, "colorIndex").map(FrameCommand::SetBackground),
            "score" => whole_field(entry, "value").map(FrameCommand::SetScore),
            "sound" => {
                debug!(sound = ?field(entry, "soundId"), "Ignoring sound command");
                continue;
            }
            unknown => {
                warn!(kind = unknown, "Unknown command type");
                continue;
            }
        };

        match command {
            Some(command) => frame.commands.push(command),
            None => trace!(kind, "Skipping malformed command"),
        }
    }

    frame
}
