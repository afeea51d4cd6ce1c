//! External collaborators the session calls into: the leaderboard and the source generator.
//!
//! These are interfaces only. The session invokes them at well-defined points (game over,
//! opening the leaderboard, creating a new game) and never inside a frame tick.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ServiceError;

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub player: String,
    pub score: i64,
}

/// The outcome of submitting a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub is_high_score: bool,
    pub rank: Option<u32>,
}

pub trait Leaderboard {
    fn fetch_leaderboard(&mut self) -> Result<Vec<LeaderboardEntry>, ServiceError>;

    fn submit_score(&mut self, final_score: i64) -> Result<ScoreSubmission, ServiceError>;
}

/// Produces guest source text from a description. Opaque to the runtime.
pub trait SourceGenerator {
    /// `prior_source` is the currently loaded game, passed along when iterating on it.
    fn generate_guest_source(&mut self, description: &str, prior_source: Option<&str>) -> Result<String, ServiceError>;
}

/// Stand-in collaborators for running without a backend: the leaderboard is empty, scores
/// are acknowledged but never ranked, and generation is unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineServices;

impl Leaderboard for OfflineServices {
    fn fetch_leaderboard(&mut self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        debug!("Offline, returning an empty leaderboard");
        Ok(Vec::new())
    }

    fn submit_score(&mut self, final_score: i64) -> Result<ScoreSubmission, ServiceError> {
        debug!(final_score, "Offline, score not recorded");
        Ok(ScoreSubmission::default())
    }
}

impl SourceGenerator for OfflineServices {
    fn generate_guest_source(&mut self, _description: &str, _prior_source: Option<&str>) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("no source generator is configured".to_string()))
    }
}
