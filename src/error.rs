//! Centralized error types for the cartridge runtime.
//!
//! Host-side setup errors (engine initialization, source loading) propagate to the caller.
//! Guest faults raised while a frame runs are captured as [`GuestError`] and never leave
//! the sandbox boundary; they are logged and replaced with a no-op frame.

use std::io;

use serde::{Deserialize, Serialize};

/// Main error type for session-level operations.
///
/// This is the primary error type used in public APIs that combine several subsystems.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Initialization error: {0}")]
    Initialization(#[from] InitializationError),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// The embedded engine could not be acquired. Fatal to the session.
#[derive(thiserror::Error, Debug)]
pub enum InitializationError {
    #[error("Failed to create the script engine: {0}")]
    Engine(String),

    #[error("Failed to create an execution context: {0}")]
    Context(String),
}

/// Guest source could not be loaded into a fresh execution context.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Runtime has not been initialized")]
    NotInitialized,

    #[error("Failed to create an execution context: {0}")]
    Context(String),

    #[error("Failed to evaluate game code: {message}")]
    Evaluation { message: String },

    #[error("Game code must define metadata, resources, and update functions (missing: {})", .missing.join(", "))]
    MissingEntryPoints { missing: Vec<&'static str> },

    #[error("Failed to call {name}(): {message}")]
    EntryPointFailed { name: &'static str, message: String },

    #[error("Invalid game definition: {0}")]
    InvalidDefinition(String),

    #[error("Unknown bundled game: {0}")]
    UnknownBundledGame(String),
}

/// A fault raised by guest code during a frame.
///
/// These are contained by the sandbox runtime: they are logged, and the frame is
/// replaced with a no-op result.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GuestError {
    #[error("Update function threw: {message}")]
    Thrown { message: String },

    #[error("Update function reported {}: {}", .0.name, .0.message)]
    Reported(GuestErrorReport),

    #[error("Update function exceeded its time budget")]
    Interrupted,

    #[error("Update function returned an unusable value: {0}")]
    InvalidResult(String),
}

/// The `error` payload produced by the update trampoline when guest code throws.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestErrorReport {
    pub message: String,
    pub stack: String,
    pub name: String,
}

/// Errors returned by external collaborators (leaderboard, generation).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Invalid runtime configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    #[error("Unsupported grid size {0} (expected 16 or 32)")]
    GridSize(u32),

    #[error("Unsupported atlas size {0} (expected 128 or 256)")]
    AtlasSize(u32),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
