//! The sandbox runtime: one embedded QuickJS engine, and at most one live execution context
//! ("realm") holding the loaded game's `update` function.
//!
//! Nothing thrown inside the sandbox crosses into the host during a frame. [`SandboxRuntime::invoke_frame`]
//! always returns a [`FrameCommandResult`], substituting an empty result for any guest fault.

use std::sync::Arc;
use std::time::Duration;

use rquickjs::context::EvalOptions;
use rquickjs::{CatchResultExt, Context, Ctx, Function, Persistent, Runtime, Value};
use tracing::{debug, error, info, trace, warn};

use crate::constants::ENTRY_POINTS;
use crate::error::{GuestError, InitializationError, LoadError};
use crate::game::commands::FrameCommandResult;
use crate::game::definition::GameDefinition;
use crate::input::InputSnapshot;

pub mod bridge;
pub mod loader;
pub mod marshal;
pub mod trampoline;
pub mod watchdog;

use loader::{EmptyModuleLoader, EmptyModuleResolver};
use watchdog::Watchdog;

/// Resource limits applied to the engine and to each guest call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxOptions {
    /// Budget for a single `update` call. `None` lets guest code run unbounded.
    pub frame_budget: Option<Duration>,
    /// Budget for evaluating the source plus calling `metadata()` and `resources()`.
    pub load_budget: Option<Duration>,
    pub memory_limit: Option<usize>,
    pub max_stack: Option<usize>,
    /// Whether `start`/`select` are passed to guests.
    pub include_system_buttons: bool,
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            frame_budget: Some(Duration::from_millis(250)),
            load_budget: Some(Duration::from_secs(2)),
            memory_limit: Some(64 * 1024 * 1024),
            max_stack: Some(1024 * 1024),
            include_system_buttons: true,
        }
    }
}

/// The shared engine. Contexts come and go; this lives for the whole session.
struct Engine {
    runtime: Runtime,
    watchdog: Watchdog,
}

/// A live execution context with its retained `update` handle.
struct Realm {
    // Must drop before the context that owns it.
    update: Persistent<Function<'static>>,
    context: Context,
}

pub struct SandboxRuntime {
    options: SandboxOptions,
    // Field order matters: the realm must be released before the engine.
    realm: Option<Realm>,
    engine: Option<Engine>,
    faults: u64,
}

impl SandboxRuntime {
    pub fn new(options: SandboxOptions) -> Self {
        Self {
            options,
            realm: None,
            engine: None,
            faults: 0,
        }
    }

    pub fn options(&self) -> &SandboxOptions {
        &self.options
    }

    /// Acquires the engine. Calling this again once initialized does nothing.
    pub fn initialize(&mut self) -> Result<(), InitializationError> {
        if self.engine.is_some() {
            trace!("Sandbox runtime already initialized");
            return Ok(());
        }

        let runtime = Runtime::new().map_err(|e| InitializationError::Engine(e.to_string()))?;
        if let Some(limit) = self.options.memory_limit {
            runtime.set_memory_limit(limit);
        }
        if let Some(limit) = self.options.max_stack {
            runtime.set_max_stack_size(limit);
        }
        runtime.set_loader(EmptyModuleResolver, EmptyModuleLoader);

        let watchdog = Watchdog::default();
        watchdog.install(&runtime);

        info!(
            memory_limit = ?self.options.memory_limit,
            frame_budget = ?self.options.frame_budget,
            "Sandbox runtime initialized"
        );
        self.engine = Some(Engine { runtime, watchdog });
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Whether a realm with a retained `update` handle is live.
    pub fn is_loaded(&self) -> bool {
        self.realm.is_some()
    }

    /// Number of guest faults contained since the runtime was created.
    pub fn fault_count(&self) -> u64 {
        self.faults
    }

    /// Loads guest source into a fresh execution context.
    ///
    /// Any existing realm is disposed first, even if loading then fails; at most one realm is
    /// ever alive.
    pub fn load_source(&mut self, source: &str) -> Result<GameDefinition, LoadError> {
        self.dispose_realm();

        let engine = self.engine.as_ref().ok_or(LoadError::NotInitialized)?;
        let context = Context::full(&engine.runtime).map_err(|e| LoadError::Context(e.to_string()))?;
        let source: Arc<str> = Arc::from(source);

        let loaded = {
            let _guard = engine.watchdog.arm(self.options.load_budget);
            context.with(|ctx| load_in_context(&ctx, &source, &engine.watchdog))
        };

        match loaded {
            Ok((definition, update)) => {
                info!(
                    title = %definition.metadata.title,
                    sprites = definition.sprites.len(),
                    colors = definition.palette.len(),
                    "Game loaded"
                );
                self.realm = Some(Realm { update, context });
                Ok(definition)
            }
            Err(e) => {
                error!(error = %e, "Failed to load game");
                drop(context);
                engine.runtime.run_gc();
                Err(e)
            }
        }
    }

    /// Runs one guest frame. Never fails: faults are logged and become an empty result.
    pub fn invoke_frame(&mut self, delta_seconds: f64, input: &InputSnapshot) -> FrameCommandResult {
        match self.try_invoke_frame(delta_seconds, input) {
            Ok(result) => result,
            Err(GuestError::Reported(report)) => {
                self.faults += 1;
                warn!(
                    name = %report.name,
                    message = %report.message,
                    stack = %report.stack,
                    "Game update error, skipping frame"
                );
                FrameCommandResult::Empty
            }
            Err(e) => {
                self.faults += 1;
                warn!(error = %e, "Game update failed, skipping frame");
                FrameCommandResult::Empty
            }
        }
    }

    fn try_invoke_frame(&self, delta_seconds: f64, input: &InputSnapshot) -> Result<FrameCommandResult, GuestError> {
        let (Some(engine), Some(realm)) = (self.engine.as_ref(), self.realm.as_ref()) else {
            trace!("No game loaded, nothing to invoke");
            return Ok(FrameCommandResult::Empty);
        };
        let include_system = self.options.include_system_buttons;

        let _guard = engine.watchdog.arm(self.options.frame_budget);
        let copied = realm.context.with(|ctx| -> Result<serde_json::Value, GuestError> {
            let update = realm
                .update
                .clone()
                .restore(&ctx)
                .map_err(|e| GuestError::Thrown { message: e.to_string() })?;
            let input = marshal::input_object(&ctx, input, include_system)
                .map_err(|e| GuestError::Thrown { message: e.to_string() })?;

            let returned = update
                .call::<_, Value>((delta_seconds, input))
                .catch(&ctx)
                .map_err(|e| guest_fault(&engine.watchdog, e.to_string()))?;

            marshal::copy_out(&ctx, returned).map_err(|e| guest_fault(&engine.watchdog, e.to_string()))
        })?;

        let result = FrameCommandResult::from_value(copied)?;
        if let Some(report) = result.error_report() {
            return Err(GuestError::Reported(report));
        }
        Ok(result)
    }

    /// Releases the realm and the engine. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        let had_realm = self.dispose_realm();
        if self.engine.take().is_some() {
            info!(unloaded_game = had_realm, "Sandbox runtime disposed");
        }
    }

    fn dispose_realm(&mut self) -> bool {
        let Some(Realm { update, context }) = self.realm.take() else {
            return false;
        };
        drop(update);
        drop(context);
        if let Some(engine) = &self.engine {
            engine.runtime.run_gc();
        }
        debug!("Disposed previous execution context");
        true
    }
}

impl Default for SandboxRuntime {
    fn default() -> Self {
        Self::new(SandboxOptions::default())
    }
}

impl Drop for SandboxRuntime {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn guest_fault(watchdog: &Watchdog, message: String) -> GuestError {
    if watchdog.tripped() {
        GuestError::Interrupted
    } else {
        GuestError::Thrown { message }
    }
}

/// Evaluates the guest program and resolves its entry points inside `ctx`.
fn load_in_context<'js>(
    ctx: &Ctx<'js>,
    source: &Arc<str>,
    watchdog: &Watchdog,
) -> Result<(GameDefinition, Persistent<Function<'static>>), LoadError> {
    let interrupted = |message: String| {
        if watchdog.tripped() {
            format!("{message} (exceeded the load time budget)")
        } else {
            message
        }
    };

    bridge::install_console(ctx).map_err(|e| LoadError::Context(e.to_string()))?;

    // Cartridges are plain scripts, so they run in sloppy mode like a browser <script>.
    let mut options = EvalOptions::default();
    options.strict = false;
    ctx.eval_with_options::<(), _>(source.as_bytes(), options)
        .catch(ctx)
        .map_err(|e| LoadError::Evaluation {
            message: interrupted(e.to_string()),
        })?;

    let globals = ctx.globals();
    let mut functions = Vec::with_capacity(ENTRY_POINTS.len());
    let mut missing = Vec::new();
    for name in ENTRY_POINTS {
        let value: Value<'js> = globals.get(name).map_err(|e| LoadError::Context(e.to_string()))?;
        match value.into_function() {
            Some(function) => functions.push(function),
            None => missing.push(name),
        }
    }
    if !missing.is_empty() {
        return Err(LoadError::MissingEntryPoints { missing });
    }

    let [metadata, resources, update]: [Function<'js>; 3] = functions
        .try_into()
        .map_err(|_| LoadError::MissingEntryPoints { missing: ENTRY_POINTS.to_vec() })?;

    let call = |name: &'static str, function: Function<'js>| -> Result<serde_json::Value, LoadError> {
        let returned = function
            .call::<_, Value>(())
            .catch(ctx)
            .map_err(|e| LoadError::EntryPointFailed {
                name,
                message: interrupted(e.to_string()),
            })?;
        marshal::copy_out(ctx, returned).map_err(|e| LoadError::InvalidDefinition(format!("{name}(): {e}")))
    };

    let metadata = call("metadata", metadata)?;
    let resources = call("resources", resources)?;
    let definition = GameDefinition::from_values(metadata, resources, source.clone())?;

    let update = trampoline::wrap_update(ctx, update).map_err(|e| LoadError::Context(e.to_string()))?;
    Ok((definition, Persistent::save(ctx, update)))
}
