//! Guest programs bundled into the binary, for demos and tests.

use std::borrow::Cow;

use rust_embed::RustEmbed;

use crate::error::LoadError;

#[derive(RustEmbed)]
#[folder = "games/"]
struct BundledGames;

const EXTENSION: &str = ".js";

/// The guest source of a bundled game, by name (`"pong"`, not `"pong.js"`).
pub fn bundled_game(name: &str) -> Result<Cow<'static, str>, LoadError> {
    let file = BundledGames::get(&format!("{name}{EXTENSION}"))
        .ok_or_else(|| LoadError::UnknownBundledGame(name.to_string()))?;

    match file.data {
        Cow::Borrowed(bytes) => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| LoadError::InvalidDefinition(format!("{name}: {e}"))),
        Cow::Owned(bytes) => String::from_utf8(bytes)
            .map(Cow::Owned)
            .map_err(|e| LoadError::InvalidDefinition(format!("{name}: {e}"))),
    }
}

/// The names of all bundled games, sorted.
pub fn bundled_games() -> Vec<String> {
    let mut names: Vec<String> = BundledGames::iter()
        .filter_map(|file| file.strip_suffix(EXTENSION).map(str::to_string))
        .collect();
    names.sort();
    names
}
