//! The frame scheduler: the running/paused/stopped state machine and the bookkeeping for the
//! pending tick.
//!
//! The scheduler never reads the clock itself. Callers pass `now` in, which keeps the loop
//! deterministic under test and lets the session decide how to wait between ticks.

use std::time::{Duration, Instant};

use strum_macros::{Display, IntoStaticStr};
use tracing::{debug, info, trace, warn};

use crate::constants::{LOOP_TIME, STATS_PERIOD};
use crate::formatter;
use crate::profiling::{FramePhase, FrameTimings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, IntoStaticStr)]
pub enum SchedulerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// What a due tick should do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickKind {
    /// Snapshot input, run the guest, apply its commands, then render.
    Update {
        /// Seconds since the previous update; zero on the first one after a start or reset.
        delta: f64,
    },
    /// Paused: render only. Input is not advanced and the guest is not called.
    RenderOnly,
}

#[derive(Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
    period: Duration,
    /// When the pending tick is due. `None` means nothing is scheduled.
    next_tick: Option<Instant>,
    /// Start of the tick currently being processed.
    in_flight: Option<Instant>,
    last_update: Option<Instant>,
    /// Update ticks since the last start or reset.
    frame_count: u64,
    /// All ticks, including paused ones.
    ticks: u64,
    timings: FrameTimings,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new(LOOP_TIME)
    }
}

impl FrameScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            state: SchedulerState::Stopped,
            period,
            next_tick: None,
            in_flight: None,
            last_update: None,
            frame_count: 0,
            ticks: 0,
            timings: FrameTimings::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Running or paused.
    pub fn is_running(&self) -> bool {
        self.state != SchedulerState::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.state == SchedulerState::Paused
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn timings(&self) -> &FrameTimings {
        &self.timings
    }

    /// Starts ticking, with the first tick due immediately. Does nothing if already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            trace!(state = %self.state, "Scheduler already running");
            return false;
        }
        self.state = SchedulerState::Running;
        self.next_tick = Some(now);
        info!("Scheduler started");
        true
    }

    /// Stops ticking and cancels the pending tick. Safe to call when stopped.
    pub fn stop(&mut self) -> bool {
        self.next_tick = None;
        if self.state == SchedulerState::Stopped {
            return false;
        }
        self.state = SchedulerState::Stopped;
        info!(frames = self.frame_count, "Scheduler stopped");
        true
    }

    /// Only a running scheduler can pause.
    pub fn pause(&mut self) -> bool {
        if self.state != SchedulerState::Running {
            return false;
        }
        self.state = SchedulerState::Paused;
        info!("Paused");
        true
    }

    /// Resumes a paused scheduler. The first update after resuming gets a zero delta, so time
    /// spent paused never reaches the guest as one large step.
    pub fn unpause(&mut self) -> bool {
        if self.state != SchedulerState::Paused {
            return false;
        }
        self.state = SchedulerState::Running;
        self.last_update = None;
        info!("Unpaused");
        true
    }

    /// Forgets frame timing so the next update starts delta accumulation fresh.
    pub fn reset_timing(&mut self) {
        self.last_update = None;
        self.frame_count = 0;
        self.timings.clear();
        debug!("Frame timing reset");
    }

    /// How long until the pending tick is due, or `None` if nothing is scheduled.
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_tick.map(|due| due.saturating_duration_since(now))
    }

    /// Takes the pending tick if it is due.
    ///
    /// The next tick is only scheduled once this one is finished with
    /// [`FrameScheduler::end_tick`], so ticks never overlap.
    pub fn begin_tick(&mut self, now: Instant) -> Option<TickKind> {
        let due = self.next_tick?;
        if now < due || !self.is_running() {
            return None;
        }
        self.next_tick = None;
        self.in_flight = Some(now);
        self.ticks += 1;
        formatter::increment_tick();

        if self.state == SchedulerState::Paused {
            return Some(TickKind::RenderOnly);
        }

        let delta = self
            .last_update
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_update = Some(now);
        self.frame_count += 1;
        Some(TickKind::Update { delta })
    }

    pub fn record(&mut self, phase: FramePhase, duration: Duration) {
        self.timings.add_timing(phase, duration);
    }

    /// Finishes the tick begun by [`FrameScheduler::begin_tick`] and, if still running,
    /// schedules the next one a period after this one started.
    pub fn end_tick(&mut self, now: Instant) {
        let Some(started) = self.in_flight.take() else {
            return;
        };

        let elapsed = now.saturating_duration_since(started);
        self.timings.add_timing(FramePhase::Total, elapsed);
        if elapsed > self.period {
            warn!("Frame loop behind schedule by: {:?}", elapsed - self.period);
        }

        if self.ticks % STATS_PERIOD == 0 {
            info!(frames = self.frame_count, "Frame timings: {}", self.timings.summary());
        }

        if self.is_running() {
            self.next_tick = Some(started + self.period);
        }
    }
}
