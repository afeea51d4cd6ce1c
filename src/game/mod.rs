//! The game session: the host-side owner of everything needed to play one game at a time.
//!
//! A tick runs strictly in order: input snapshot, guest `update`, command application, render.
//! Collaborator calls (score submission, leaderboard, first-frame hook) are queued as
//! [`DeferredTask`]s and run between ticks.

use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use tracing::{debug, error, info, instrument, warn};

use crate::asset;
use crate::config::RuntimeConfig;
use crate::constants::FIRST_FRAME_HOOK_DELAY;
use crate::display::{DisplayState, Palette};
use crate::error::{SessionError, SessionResult};
use crate::input::{Button, InputState};
use crate::profiling::FramePhase;
use crate::render::{FrameCompositor, Overlay, RenderFrame, Renderer};
use crate::sandbox::SandboxRuntime;
use crate::scheduler::{FrameScheduler, SchedulerState, TickKind};
use crate::services::{Leaderboard, LeaderboardEntry, OfflineServices, ScoreSubmission, SourceGenerator};
use crate::texture::SpriteAtlas;

pub mod commands;
pub mod definition;
pub mod events;
pub mod interpreter;

use definition::GameDefinition;
use events::{DeferredQueue, DeferredTask};
use interpreter::CommandInterpreter;

/// Receives the first composed frame after a game starts.
pub type FirstFrameHook = Box<dyn FnMut(&RgbaImage)>;

pub struct GameSession {
    config: RuntimeConfig,
    runtime: SandboxRuntime,
    scheduler: FrameScheduler,
    interpreter: CommandInterpreter,
    display: DisplayState,
    atlas: SpriteAtlas,
    palette: Palette,
    input: InputState,
    renderer: Box<dyn Renderer>,
    leaderboard: Box<dyn Leaderboard>,
    generator: Box<dyn SourceGenerator>,
    deferred: DeferredQueue,
    definition: Option<GameDefinition>,
    overlay: Option<Overlay>,
    /// Whether opening the overlay is what paused the game.
    paused_for_overlay: bool,
    first_frame_hook: Option<FirstFrameHook>,
    first_frame_queued: bool,
    leaderboard_entries: Option<Vec<LeaderboardEntry>>,
    last_submission: Option<ScoreSubmission>,
}

impl GameSession {
    /// A session with offline collaborators and the software compositor.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            runtime: SandboxRuntime::new(config.sandbox_options()),
            scheduler: FrameScheduler::default(),
            interpreter: CommandInterpreter,
            display: DisplayState::new(config.grid_size),
            atlas: SpriteAtlas::empty(config.atlas_size),
            palette: Palette::default(),
            input: InputState::new(),
            renderer: Box::new(FrameCompositor::new()),
            leaderboard: Box::new(OfflineServices),
            generator: Box::new(OfflineServices),
            deferred: DeferredQueue::default(),
            definition: None,
            overlay: None,
            paused_for_overlay: false,
            first_frame_hook: None,
            first_frame_queued: false,
            leaderboard_entries: None,
            last_submission: None,
            config,
        }
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn with_leaderboard(mut self, leaderboard: impl Leaderboard + 'static) -> Self {
        self.leaderboard = Box::new(leaderboard);
        self
    }

    pub fn with_generator(mut self, generator: impl SourceGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    pub fn with_scheduler(mut self, scheduler: FrameScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Acquires the script engine. Safe to call more than once.
    pub fn initialize(&mut self) -> SessionResult<()> {
        self.runtime.initialize()?;
        Ok(())
    }

    /// Loads a game, replacing whatever was loaded. The scheduler is stopped and the display
    /// reset; call [`GameSession::start`] to play.
    ///
    /// If loading fails, the previously loaded game is reloaded from its source so it stays
    /// available (stopped), and the error is returned.
    #[instrument(skip_all, fields(bytes = source.len()))]
    pub fn load_source(&mut self, source: &str) -> SessionResult<&GameDefinition> {
        self.scheduler.stop();
        self.deferred.cancel(DeferredTask::FirstFrame);
        self.close_overlay();

        match self.runtime.load_source(source) {
            Ok(definition) => {
                self.install(definition);
                self.definition().ok_or_else(|| SessionError::InvalidState("no game loaded".to_string()))
            }
            Err(e) => {
                if let Some(previous) = self.definition.as_ref().map(|definition| Arc::clone(&definition.source)) {
                    match self.runtime.load_source(&previous) {
                        Ok(definition) => {
                            info!(title = %definition.metadata.title, "Restored the previous game");
                            self.install(definition);
                        }
                        Err(restore) => {
                            error!(error = %restore, "Failed to restore the previous game");
                            self.unload();
                        }
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Loads one of the games bundled with the crate.
    pub fn load_bundled(&mut self, name: &str) -> SessionResult<&GameDefinition> {
        let source = asset::bundled_game(name)?;
        self.load_source(&source)
    }

    fn install(&mut self, definition: GameDefinition) {
        self.palette = definition.palette.clone();
        self.atlas = SpriteAtlas::rasterize(&definition.sprites, &self.palette, self.config.atlas_size);
        self.definition = Some(definition);
        self.reset();
    }

    /// Forgets the loaded game along with everything derived from it.
    fn unload(&mut self) {
        self.definition = None;
        self.palette = Palette::default();
        self.atlas = SpriteAtlas::empty(self.config.atlas_size);
        self.display.reset();
    }

    pub fn start(&mut self) -> bool {
        self.start_at(Instant::now())
    }

    /// Starts ticking with the first tick due at `now`. Does nothing without a loaded game
    /// or when already running.
    pub fn start_at(&mut self, now: Instant) -> bool {
        if self.definition.is_none() || !self.runtime.is_loaded() {
            warn!("No game loaded, not starting");
            return false;
        }
        self.scheduler.start(now)
    }

    pub fn stop(&mut self) -> bool {
        self.scheduler.stop()
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.scheduler.pause();
        self.display.set_paused(self.scheduler.is_paused());
        paused
    }

    /// Resumes play. An open overlay is closed first.
    pub fn unpause(&mut self) -> bool {
        self.overlay = None;
        self.paused_for_overlay = false;
        let unpaused = self.scheduler.unpause();
        self.display.set_paused(self.scheduler.is_paused());
        unpaused
    }

    /// Empties the display, re-applies the game's initial state and restarts frame timing.
    ///
    /// Guest-side state (closures, module-level variables) is untouched; use
    /// [`GameSession::restart`] to reset that too.
    pub fn reset(&mut self) {
        self.display.reset();
        if let Some(initial) = self.definition.as_ref().and_then(|definition| definition.initial_state.as_ref()) {
            self.interpreter.apply(&initial.normalize(), &mut self.display);
            self.display.set_game_over(false);
        }
        self.display.set_paused(self.scheduler.is_paused());
        self.scheduler.reset_timing();
        self.first_frame_queued = false;
        debug!("Display reset");
    }

    /// Reloads the current game from source, resetting guest state as well, and starts it.
    pub fn restart(&mut self) -> SessionResult<()> {
        let source = self
            .definition
            .as_ref()
            .map(|definition| definition.source.clone())
            .ok_or_else(|| SessionError::InvalidState("no game loaded to restart".to_string()))?;
        self.load_source(&source)?;
        self.start();
        Ok(())
    }

    pub fn press(&mut self, button: Button) {
        self.input.press(button);
    }

    pub fn release(&mut self, button: Button) {
        self.input.release(button);
    }

    /// Handles a host key press by key code (`"ArrowUp"`, `"KeyZ"`, ...). Unbound keys are ignored.
    pub fn key_down(&mut self, code: &str) -> bool {
        Button::from_key_code(code).map(|button| self.press(button)).is_some()
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        Button::from_key_code(code).map(|button| self.release(button)).is_some()
    }

    /// Runs deferred work that is due, then the pending tick if it is due.
    pub fn poll(&mut self) -> Option<TickKind> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Option<TickKind> {
        self.run_deferred(now);
        let kind = self.scheduler.begin_tick(now)?;
        let started = Instant::now();

        if let TickKind::Update { delta } = kind {
            let snapshot = self.input.snapshot();

            let call = Instant::now();
            let result = self.runtime.invoke_frame(delta, &snapshot);
            self.scheduler.record(FramePhase::Update, call.elapsed());

            let apply = Instant::now();
            let applied = self.interpreter.apply(&result.normalize(), &mut self.display);
            self.scheduler.record(FramePhase::Apply, apply.elapsed());

            if applied.game_over {
                self.on_game_over(now);
            }
        }

        let render = Instant::now();
        self.renderer.render(&RenderFrame {
            display: &self.display,
            atlas: &self.atlas,
            palette: &self.palette,
            overlay: self.overlay.as_ref(),
        });
        self.scheduler.record(FramePhase::Render, render.elapsed());

        if !self.first_frame_queued && self.first_frame_hook.is_some() && matches!(kind, TickKind::Update { .. }) {
            self.first_frame_queued = true;
            self.deferred.schedule(now + FIRST_FRAME_HOOK_DELAY, DeferredTask::FirstFrame);
        }

        self.scheduler.end_tick(now + started.elapsed());
        Some(kind)
    }

    fn on_game_over(&mut self, now: Instant) {
        let score = self.display.score();
        info!(score, "Game over");
        self.scheduler.stop();
        self.deferred.schedule(now, DeferredTask::SubmitScore(score));
        self.deferred.schedule(now, DeferredTask::FetchLeaderboard);
    }

    fn run_deferred(&mut self, now: Instant) {
        for task in self.deferred.take_due(now) {
            match task {
                DeferredTask::SubmitScore(score) => match self.leaderboard.submit_score(score) {
                    Ok(submission) => {
                        info!(score, high_score = submission.is_high_score, rank = ?submission.rank, "Score submitted");
                        self.last_submission = Some(submission);
                    }
                    Err(e) => warn!(score, error = %e, "Failed to submit score"),
                },
                DeferredTask::FetchLeaderboard => match self.leaderboard.fetch_leaderboard() {
                    Ok(entries) => {
                        debug!(entries = entries.len(), "Leaderboard fetched");
                        self.leaderboard_entries = Some(entries);
                    }
                    Err(e) => warn!(error = %e, "Failed to fetch leaderboard"),
                },
                DeferredTask::FirstFrame => {
                    if let (Some(hook), Some(frame)) = (self.first_frame_hook.as_mut(), self.renderer.last_frame()) {
                        debug!("Running first-frame hook");
                        hook(frame);
                    }
                }
            }
        }
    }

    /// Drives the session in real time until it stops and no deferred work remains, or until
    /// `should_stop` returns true after a tick. Returns the number of ticks run.
    pub fn run_until(&mut self, mut should_stop: impl FnMut(&GameSession) -> bool) -> u64 {
        let mut ticks = 0;
        loop {
            let now = Instant::now();
            if self.poll_at(now).is_some() {
                ticks += 1;
                if should_stop(self) {
                    break;
                }
            }

            let next = match (self.scheduler.next_tick(), self.deferred.next_due()) {
                (Some(tick), Some(task)) => tick.min(task),
                (Some(tick), None) => tick,
                (None, Some(task)) => task,
                (None, None) => break,
            };
            let wait = next.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                spin_sleep::sleep(wait);
            }
        }
        ticks
    }

    /// Pauses a running game and shows the leaderboard over it.
    pub fn open_leaderboard(&mut self) -> SessionResult<&[LeaderboardEntry]> {
        if self.scheduler.state() == SchedulerState::Running {
            self.pause();
            self.paused_for_overlay = true;
        }

        match self.leaderboard.fetch_leaderboard() {
            Ok(entries) => {
                self.overlay = Some(Overlay::Leaderboard(entries.clone()));
                self.leaderboard_entries = Some(entries);
                Ok(self.leaderboard_entries.as_deref().unwrap_or_default())
            }
            Err(e) => {
                warn!(error = %e, "Failed to open leaderboard");
                self.close_leaderboard();
                Err(e.into())
            }
        }
    }

    /// Hides the leaderboard, resuming play if opening it paused the game.
    pub fn close_leaderboard(&mut self) {
        let resume = self.paused_for_overlay;
        self.close_overlay();
        if resume {
            self.unpause();
        }
    }

    fn close_overlay(&mut self) {
        self.overlay = None;
        self.paused_for_overlay = false;
    }

    /// Generates a new game from a description and loads it. The current game's source is
    /// passed along so the generator can iterate on it.
    pub fn create_new_game(&mut self, description: &str) -> SessionResult<&GameDefinition> {
        let prior = self.definition.as_ref().map(|definition| definition.source.clone());
        info!(description, iterating = prior.is_some(), "Generating a new game");
        let source = self.generator.generate_guest_source(description, prior.as_deref())?;
        self.load_source(&source)
    }

    /// Registers a callback run shortly after the first frame of each start or reset is drawn.
    pub fn set_first_frame_hook(&mut self, hook: impl FnMut(&RgbaImage) + 'static) {
        self.first_frame_hook = Some(Box::new(hook));
        self.first_frame_queued = false;
    }

    /// Stops the game, drops pending work and releases the script engine. Safe to call
    /// more than once.
    pub fn dispose(&mut self) {
        self.scheduler.stop();
        self.deferred.cancel_all();
        self.close_overlay();
        self.runtime.dispose();
        self.unload();
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn definition(&self) -> Option<&GameDefinition> {
        self.definition.as_ref()
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn atlas(&self) -> &SpriteAtlas {
        &self.atlas
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn runtime(&self) -> &SandboxRuntime {
        &self.runtime
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn leaderboard(&self) -> Option<&[LeaderboardEntry]> {
        self.leaderboard_entries.as_deref()
    }

    pub fn last_submission(&self) -> Option<ScoreSubmission> {
        self.last_submission
    }

    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.renderer.last_frame()
    }

    pub fn has_pending_work(&self) -> bool {
        !self.deferred.is_empty()
    }
}
