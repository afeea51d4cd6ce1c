//! A time budget for guest calls, enforced through the engine's interrupt handler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rquickjs::Runtime;

#[derive(Debug, Clone, Default)]
pub struct Watchdog {
    deadline: Arc<Mutex<Option<Instant>>>,
    tripped: Arc<AtomicBool>,
}

impl Watchdog {
    /// Hooks the watchdog into the engine. The handler is polled by the interpreter while
    /// guest code runs; returning `true` aborts the running script.
    pub fn install(&self, runtime: &Runtime) {
        let watchdog = self.clone();
        runtime.set_interrupt_handler(Some(Box::new(move || watchdog.should_interrupt())));
    }

    fn should_interrupt(&self) -> bool {
        let expired = self.deadline.lock().is_some_and(|deadline| Instant::now() >= deadline);
        if expired {
            self.tripped.store(true, Ordering::Relaxed);
        }
        expired
    }

    /// Starts a budget for one guest call; the budget ends when the guard drops.
    /// `None` runs without a deadline.
    pub fn arm(&self, budget: Option<Duration>) -> WatchdogGuard<'_> {
        self.tripped.store(false, Ordering::Relaxed);
        *self.deadline.lock() = budget.map(|budget| Instant::now() + budget);
        WatchdogGuard { watchdog: self }
    }

    /// Whether the last armed call was interrupted.
    pub fn tripped(&self) -> bool {
        self.tripped.load(Ordering::Relaxed)
    }
}

pub struct WatchdogGuard<'a> {
    watchdog: &'a Watchdog,
}

impl Drop for WatchdogGuard<'_> {
    fn drop(&mut self) {
        *self.watchdog.deadline.lock() = None;
    }
}
