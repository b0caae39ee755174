//! The visible console log and the per-run bridge that feeds it.
//!
//! One `ConsoleLog` is shared between the UI and the sandbox. Each preview
//! run gets its own `ConsoleBridge` stamped with that run's generation;
//! a bridge whose generation has been superseded can no longer write, so a
//! stale script environment cannot leak output into a newer run.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Severity of one console entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Log,
    Error,
    Warn,
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Log => "log",
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
        };
        f.write_str(name)
    }
}

/// One captured console line. Ephemeral: recreated on every run, never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleEntry {
    pub level: Level,
    pub text: String,
}

/// The single visible console view.
#[derive(Debug, Default)]
pub struct ConsoleLog {
    entries: Vec<ConsoleEntry>,
    generation: u64,
    focused: bool,
    unread: bool,
}

pub type SharedConsole = Arc<Mutex<ConsoleLog>>;

pub fn shared_console() -> SharedConsole {
    Arc::new(Mutex::new(ConsoleLog::default()))
}

impl ConsoleLog {
    /// Starts a new run: prior entries are discarded and `generation`
    /// becomes the only one allowed to write.
    pub fn begin_run(&mut self, generation: u64) {
        self.entries.clear();
        self.generation = generation;
    }

    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Manual console-clear trigger. Does not change the active generation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn has_unread(&self) -> bool {
        self.unread
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        if focused {
            self.unread = false;
        }
    }

    fn push(&mut self, level: Level, text: String) {
        self.entries.push(ConsoleEntry { level, text });
        if !self.focused {
            self.unread = true;
        }
    }
}

/// Write handle for one run of the sandbox.
#[derive(Clone)]
pub struct ConsoleBridge {
    log: SharedConsole,
    generation: u64,
}

impl ConsoleBridge {
    pub fn new(log: SharedConsole, generation: u64) -> Self {
        Self { log, generation }
    }

    /// Appends an entry, unless this bridge belongs to a superseded run.
    pub fn push(&self, level: Level, text: impl Into<String>) {
        let Ok(mut log) = self.log.lock() else {
            return;
        };
        if log.generation != self.generation {
            tracing::trace!(
                stale = self.generation,
                active = log.generation,
                "dropping console output from a stale run"
            );
            return;
        }
        log.push(level, text.into());
    }
}
