//! Runtime configuration: built-in defaults, then `quickcart.toml`, then `QUICKCART_*`
//! environment variables.

use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::display::GridSize;
use crate::error::ConfigError;
use crate::sandbox::SandboxOptions;
use crate::texture::AtlasSize;

/// The configuration file read from the working directory, if present.
pub const CONFIG_FILE: &str = "quickcart.toml";
/// The prefix for environment overrides, e.g. `QUICKCART_GRID_SIZE=16`.
pub const ENV_PREFIX: &str = "QUICKCART_";

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub grid_size: GridSize,
    pub atlas_size: AtlasSize,
    pub include_system_buttons: bool,
    /// `None` disables the per-frame watchdog.
    pub frame_budget: Option<Duration>,
    pub load_budget: Option<Duration>,
    pub memory_limit: Option<usize>,
    pub max_stack: Option<usize>,
    pub log_level: String,
}

/// Configuration exactly as read from the providers, before validation.
/// Zero means "no limit" for every budget and limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RawConfig {
    grid_size: u32,
    atlas_size: u32,
    include_system_buttons: bool,
    frame_budget_ms: u64,
    load_budget_ms: u64,
    memory_limit_bytes: usize,
    max_stack_bytes: usize,
    log_level: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            grid_size: 32,
            atlas_size: 256,
            include_system_buttons: true,
            frame_budget_ms: 250,
            load_budget_ms: 2000,
            memory_limit_bytes: 64 * 1024 * 1024,
            max_stack_bytes: 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

fn nonzero_millis(millis: u64) -> Option<Duration> {
    (millis > 0).then(|| Duration::from_millis(millis))
}

fn nonzero(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}

impl TryFrom<RawConfig> for RuntimeConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            grid_size: GridSize::try_from(raw.grid_size)?,
            atlas_size: AtlasSize::try_from(raw.atlas_size)?,
            include_system_buttons: raw.include_system_buttons,
            frame_budget: nonzero_millis(raw.frame_budget_ms),
            load_budget: nonzero_millis(raw.load_budget_ms),
            memory_limit: nonzero(raw.memory_limit_bytes),
            max_stack: nonzero(raw.max_stack_bytes),
            log_level: raw.log_level,
        })
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let raw = RawConfig::default();
        Self {
            grid_size: GridSize::default(),
            atlas_size: AtlasSize::default(),
            include_system_buttons: raw.include_system_buttons,
            frame_budget: nonzero_millis(raw.frame_budget_ms),
            load_budget: nonzero_millis(raw.load_budget_ms),
            memory_limit: nonzero(raw.memory_limit_bytes),
            max_stack: nonzero(raw.max_stack_bytes),
            log_level: raw.log_level,
        }
    }
}

impl RuntimeConfig {
    /// The built-in defaults as a figment, for layering further providers on top.
    pub fn defaults() -> Figment {
        Figment::from(Serialized::defaults(RawConfig::default()))
    }

    /// Defaults, then `quickcart.toml` in the working directory, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Like [`RuntimeConfig::load`], reading the file at `path` instead.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_figment(
            Self::defaults()
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let raw: RawConfig = figment.extract().map_err(Box::new)?;
        RuntimeConfig::try_from(raw)
    }

    pub fn sandbox_options(&self) -> SandboxOptions {
        SandboxOptions {
            frame_budget: self.frame_budget,
            load_budget: self.load_budget,
            memory_limit: self.memory_limit,
            max_stack: self.max_stack,
            include_system_buttons: self.include_system_buttons,
        }
    }
}
