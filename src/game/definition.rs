//! The loadable unit of content, copied out of the sandbox at load time.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::constants::UNTITLED_GAME;
use crate::display::Palette;
use crate::error::LoadError;
use crate::game::commands::FrameCommandResult;
use crate::texture::SpriteResource;

/// A control hint shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlHint {
    Binding { key: String, action: String },
    Text(String),
}

/// Descriptive information returned by the guest's `metadata()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub controls: Vec<ControlHint>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: UNTITLED_GAME.to_string(),
            description: String::new(),
            controls: Vec::new(),
        }
    }
}

impl Metadata {
    /// Reads metadata leniently: a missing or non-string title becomes "Untitled Game",
    /// and control entries that aren't recognizable hints are dropped.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let text = |key: &str| match object.get(key) {
            Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
            _ => None,
        };

        let controls = match object.get("controls") {
            Some(Value::Array(entries)) => entries
                .iter()
                .filter_map(|entry| serde_json::from_value::<ControlHint>(entry.clone()).ok())
                .collect(),
            Some(_) => {
                warn!("Game controls must be an array, ignoring");
                Vec::new()
            }
            None => Vec::new(),
        };

        Self {
            title: text("title").unwrap_or_else(|| UNTITLED_GAME.to_string()),
            description: text("description").unwrap_or_default(),
            controls,
        }
    }
}

/// A fully loaded game: metadata, decoded sprites, palette, optional initial state, and the
/// guest source it came from.
///
/// Definitions are never mutated; loading another game replaces the whole definition.
#[derive(Debug, Clone)]
pub struct GameDefinition {
    pub metadata: Metadata,
    /// Sprites followed by tiles, in declaration order. The index is the atlas address.
    pub sprites: Vec<SpriteResource>,
    pub palette: Palette,
    /// Re-applied after every reset, in the grouped result shape.
    pub initial_state: Option<FrameCommandResult>,
    pub source: Arc<str>,
}

impl GameDefinition {
    /// Builds a definition from the values returned by `metadata()` and `resources()`.
    pub fn from_values(metadata: Value, resources: Value, source: Arc<str>) -> Result<Self, LoadError> {
        let Value::Object(metadata) = metadata else {
            return Err(LoadError::InvalidDefinition("metadata() must return an object".to_string()));
        };
        let Value::Object(resources) = resources else {
            return Err(LoadError::InvalidDefinition("resources() must return an object".to_string()));
        };

        let mut sprites = collect_sprites(resources.get("sprites"), "sprites");
        let sprite_count = sprites.len();
        sprites.extend(collect_sprites(resources.get("tiles"), "tiles"));
        if sprites.len() > sprite_count {
            debug!(tiles = sprites.len() - sprite_count, "Appended tile resources after sprites");
        }

        let palette = match resources.get("palette") {
            Some(Value::Array(colors)) => Palette::from_numbers(&colors.iter().map(palette_number).collect::<Vec<_>>()),
            Some(_) => {
                warn!("Palette must be an array, using the default palette");
                Palette::default()
            }
            None => Palette::default(),
        };

        let initial_state = match resources.get("initialState") {
            None | Some(Value::Null) => None,
            Some(value) => match FrameCommandResult::from_value(initial_state_value(value)) {
                Ok(state) if !state.is_empty() => Some(state),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed initial state");
                    None
                }
            },
        };

        Ok(Self {
            metadata: Metadata::from_object(&metadata),
            sprites,
            palette,
            initial_state,
            source,
        })
    }
}

/// Initial state may name the background `backgroundColor`, as the console state does.
/// `background` wins when both are present.
fn initial_state_value(value: &Value) -> Value {
    let mut value = value.clone();
    if let Value::Object(fields) = &mut value {
        if !fields.contains_key("background") {
            if let Some(color) = fields.remove("backgroundColor") {
                fields.insert("background".to_string(), color);
            }
        }
    }
    value
}

/// Sprites may be listed as an array, or as an id-keyed object whose values are taken in
/// declaration order.
fn collect_sprites(value: Option<&Value>, field: &str) -> Vec<SpriteResource> {
    match value {
        Some(Value::Array(entries)) => entries.iter().map(SpriteResource::from_value).collect(),
        Some(Value::Object(entries)) => entries.values().map(SpriteResource::from_value).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            warn!(field, "Sprite resources must be an array or object, ignoring");
            Vec::new()
        }
    }
}

/// Palette entries are numbers, though hex strings (`"#FF0000"`, `"0xFF0000"`, `"FF0000"`)
/// are accepted too. Anything else is NaN, which the palette turns into black.
fn palette_number(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => {
            let digits = text
                .trim()
                .trim_start_matches('#')
                .trim_start_matches("0x")
                .trim_start_matches("0X");
            u32::from_str_radix(digits, 16).map(f64::from).unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_palette_number_accepts_hex_strings() {
        assert_eq!(palette_number(&json!("#FF0000")), 16711680.0);
        assert_eq!(palette_number(&json!("0x00ff00")), 65280.0);
        assert_eq!(palette_number(&json!(255)), 255.0);
        assert!(palette_number(&json!("red")).is_nan());
        assert!(palette_number(&json!(true)).is_nan());
    }
}
