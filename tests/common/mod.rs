#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use quickcart::config::RuntimeConfig;
use quickcart::error::ServiceError;
use quickcart::game::GameSession;
use quickcart::scheduler::TickKind;
use quickcart::services::{Leaderboard, LeaderboardEntry, ScoreSubmission, SourceGenerator};

pub const PERIOD: Duration = Duration::from_millis(16);

/// A guest program with a fixed metadata/resources pair and the given `update` body.
pub fn guest(update_body: &str) -> String {
    format!(
        r#"
function metadata() {{
  return {{ title: "Test Game", description: "for tests", controls: [] }};
}}

function resources() {{
  return {{
    sprites: [
      [[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]],
      [[0x80, 0, 0, 0, 0, 0, 0, 0], [0x80, 0, 0, 0, 0, 0, 0, 0]],
      ["11111111", "11111111", "11111111", "11111111", "11111111", "11111111", "11111111", "11111111"]
    ],
    palette: [0x000000, 0xFF0000, 0x00FF00, 0x0000FF]
  }};
}}

function update(deltaTime, input) {{
{update_body}
}}
"#
    )
}

#[derive(Debug, Default)]
pub struct LeaderboardCalls {
    pub fetches: usize,
    pub submissions: Vec<i64>,
}

/// Records every collaborator call.
#[derive(Debug, Clone, Default)]
pub struct RecordingLeaderboard {
    pub calls: Rc<RefCell<LeaderboardCalls>>,
    pub entries: Vec<LeaderboardEntry>,
    pub fail: bool,
}

impl Leaderboard for RecordingLeaderboard {
    fn fetch_leaderboard(&mut self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        self.calls.borrow_mut().fetches += 1;
        if self.fail {
            return Err(ServiceError::Unavailable("offline".to_string()));
        }
        Ok(self.entries.clone())
    }

    fn submit_score(&mut self, final_score: i64) -> Result<ScoreSubmission, ServiceError> {
        self.calls.borrow_mut().submissions.push(final_score);
        Ok(ScoreSubmission {
            is_high_score: true,
            rank: Some(1),
        })
    }
}

/// Returns a canned source and records what it was asked for.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    pub source: String,
    pub requests: Rc<RefCell<Vec<(String, Option<String>)>>>,
}

impl SourceGenerator for ScriptedGenerator {
    fn generate_guest_source(&mut self, description: &str, prior_source: Option<&str>) -> Result<String, ServiceError> {
        self.requests
            .borrow_mut()
            .push((description.to_string(), prior_source.map(str::to_string)));
        Ok(self.source.clone())
    }
}

pub fn session() -> GameSession {
    let mut session = GameSession::new(RuntimeConfig::default());
    session.initialize().expect("engine should initialize");
    session
}

pub fn loaded_session(source: &str) -> GameSession {
    let mut session = session();
    session.load_source(source).expect("guest should load");
    session
}

/// Runs `ticks` due ticks starting at `start`, one period apart. Returns the time after the last.
pub fn run_ticks(session: &mut GameSession, start: Instant, ticks: u32) -> Instant {
    let mut now = start;
    for _ in 0..ticks {
        session.poll_at(now);
        now += session.scheduler().period();
    }
    now
}

pub fn is_update(kind: Option<TickKind>) -> bool {
    matches!(kind, Some(TickKind::Update { .. }))
}
