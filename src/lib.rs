//! A sandboxed runtime for small JavaScript game cartridges.

pub mod asset;
pub mod config;
pub mod constants;
pub mod display;
pub mod error;
pub mod formatter;
pub mod game;
pub mod input;
pub mod logging;
pub mod profiling;
pub mod render;
pub mod sandbox;
pub mod scheduler;
pub mod services;
pub mod texture;
