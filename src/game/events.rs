//! Host work deferred until after a tick finishes.
//!
//! Nothing queued here runs inside a frame. The session drains due tasks between ticks, so
//! a slow collaborator never delays the tick that triggered it.

use std::time::Instant;

use smallvec::SmallVec;

/// A unit of deferred host work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeferredTask {
    /// Report the final score after a game over.
    SubmitScore(i64),
    /// Refresh the leaderboard, shown as the paused overlay.
    FetchLeaderboard,
    /// Hand the first composed frame to the registered hook.
    FirstFrame,
}

#[derive(Debug, Default)]
pub struct DeferredQueue {
    pending: SmallVec<[(Instant, DeferredTask); 4]>,
}

impl DeferredQueue {
    /// Queues `task` to run once `due` has passed.
    pub fn schedule(&mut self, due: Instant, task: DeferredTask) {
        self.pending.push((due, task));
    }

    /// Removes and returns every task due at `now`, in the order they were queued.
    pub fn take_due(&mut self, now: Instant) -> SmallVec<[DeferredTask; 4]> {
        let mut due = SmallVec::new();
        self.pending.retain(|(at, task)| {
            if *at <= now {
                due.push(*task);
                false
            } else {
                true
            }
        });
        due
    }

    /// The earliest due time, for callers that want to sleep until there is work.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|(at, _)| *at).min()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops pending tasks equal to `task`.
    pub fn cancel(&mut self, task: DeferredTask) {
        self.pending.retain(|(_, pending)| *pending != task);
    }

    /// Drops every pending task.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }
}
