//! Live-run scheduling: decides when the sandbox re-runs.
//!
//! Live mode debounces edits — each edit cancels the pending deadline and
//! arms a new one, so only the trailing edge of a burst fires. Explicit run
//! triggers bypass the scheduler entirely.

use std::time::Duration;
use tokio::sync::mpsc;

use crate::editor::EditorEvent;

/// Quiet period after the last edit before a live run fires.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

pub type TimerId = u64;

/// A single cancellable deadline.
///
/// `schedule` always supersedes the previous deadline and returns the id the
/// fire event will carry; `cancel` is idempotent — cancelling a timer that
/// already fired or was never armed is a no-op.
pub trait RunTimer: Send {
    fn schedule(&mut self, after: Duration) -> TimerId;
    fn cancel(&mut self);
}

/// Timer backed by a spawned sleep task that posts [`EditorEvent::TimerFired`]
/// back into the editor's event queue.
pub struct TokioTimer {
    events: mpsc::UnboundedSender<EditorEvent>,
    next_id: TimerId,
    pending: Option<tokio::task::JoinHandle<()>>,
}

impl TokioTimer {
    pub fn new(events: mpsc::UnboundedSender<EditorEvent>) -> Self {
        Self {
            events,
            next_id: 0,
            pending: None,
        }
    }
}

impl RunTimer for TokioTimer {
    fn schedule(&mut self, after: Duration) -> TimerId {
        self.cancel();
        self.next_id += 1;
        let id = self.next_id;
        let events = self.events.clone();
        // Anchor the deadline at schedule time by constructing the sleep here,
        // not inside the task (which is first polled later). Under tokio's
        // paused clock the task body would otherwise sample `now` after the
        // test advanced time, pushing the deadline past every advance.
        let sleep = tokio::time::sleep(after);
        self.pending = Some(tokio::spawn(async move {
            sleep.await;
            let _ = events.send(EditorEvent::TimerFired(id));
        }));
        id
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

pub struct LiveRunScheduler {
    timer: Box<dyn RunTimer>,
    quiet_period: Duration,
    live: bool,
    pending: Option<TimerId>,
}

impl LiveRunScheduler {
    pub fn new(timer: Box<dyn RunTimer>) -> Self {
        Self {
            timer,
            quiet_period: DEFAULT_QUIET_PERIOD,
            live: false,
            pending: None,
        }
    }

    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    pub fn set_quiet_period(&mut self, quiet_period: Duration) {
        self.quiet_period = quiet_period;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Enables or disables live mode. Disabling deregisters the pending
    /// deadline entirely; enabling arms nothing until the next edit.
    pub fn set_live(&mut self, live: bool) {
        if self.live == live {
            return;
        }
        self.live = live;
        if !live {
            self.timer.cancel();
            self.pending = None;
            tracing::debug!("live mode off, pending run dropped");
        }
    }

    /// An edit happened: in live mode, restart the quiet period.
    pub fn note_edit(&mut self) {
        if !self.live {
            return;
        }
        self.pending = Some(self.timer.schedule(self.quiet_period));
    }

    /// A timer fired. True means this was the armed deadline and a run is
    /// due; a superseded or cancelled id is ignored.
    pub fn timer_fired(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}
