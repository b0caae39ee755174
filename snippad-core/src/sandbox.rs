//! Sandbox renderer: executes one markup/style/script triple in complete
//! isolation from the host and from any previous run.
//!
//! Each run builds a fresh Luau VM (sandboxed, memory-limited, dangerous
//! globals blocked) and a fresh rendered document. Nothing a snippet does —
//! syntax errors, runtime errors, runaway loops, heap exhaustion — escapes
//! `run()`; it all lands in the console log.

use mlua::{Lua, ThreadStatus, VmState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use snippad_markup::{parse_fragment, Document, RenderedDocument, Stylesheet};

use crate::console::{ConsoleBridge, Level, SharedConsole};
use crate::console_api;

/// Luau heap limit per run: 1 MB, same as the in-game VMs.
pub const SCRIPT_MEMORY_LIMIT_BYTES: usize = 1024 * 1024;

/// Wall-clock budget for one script execution. The editor stays responsive
/// even against `while true do end`.
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Chunk name for loaded snippets; runtime errors reference it.
const CHUNK_NAME: &str = "snippet";

const BLOCKED_GLOBALS: [&str; 6] = ["io", "os", "require", "loadfile", "dofile", "debug"];

/// The three editable sources of a snippet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSet {
    pub markup: String,
    pub style: String,
    pub script: String,
}

impl SourceSet {
    pub fn new(
        markup: impl Into<String>,
        style: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            markup: markup.into(),
            style: style.into(),
            script: script.into(),
        }
    }
}

/// Where rendered output becomes visible.
///
/// The renderer drives this on every run: `teardown` before the old run is
/// discarded, `present` once the new document exists. The headless
/// implementation below is enough for tests and for the CLI; a GUI shell
/// brings its own.
pub trait RenderTarget {
    fn present(&mut self, document: &RenderedDocument);
    fn teardown(&mut self);
}

/// Render target that just remembers the last presented document.
#[derive(Debug, Default)]
pub struct HeadlessTarget {
    current: Option<RenderedDocument>,
}

impl HeadlessTarget {
    pub fn current(&self) -> Option<&RenderedDocument> {
        self.current.as_ref()
    }
}

impl RenderTarget for HeadlessTarget {
    fn present(&mut self, document: &RenderedDocument) {
        self.current = Some(document.clone());
    }

    fn teardown(&mut self) {
        self.current = None;
    }
}

/// One live run: its generation, its script environment, and its rendered
/// document. At most one exists at a time.
pub struct RunContext {
    pub generation: u64,
    pub document: RenderedDocument,
    lua: Option<Lua>,
}

impl RunContext {
    /// Whether the run's script environment was successfully built (it is
    /// kept alive for the lifetime of the run).
    pub fn has_script_env(&self) -> bool {
        self.lua.is_some()
    }
}

pub struct SandboxRenderer<T: RenderTarget> {
    console: SharedConsole,
    target: T,
    current: Option<RunContext>,
    generation: u64,
}

impl<T: RenderTarget> SandboxRenderer<T> {
    pub fn new(console: SharedConsole, target: T) -> Self {
        Self {
            console,
            target,
            current: None,
            generation: 0,
        }
    }

    pub fn context(&self) -> Option<&RunContext> {
        self.current.as_ref()
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn console(&self) -> &SharedConsole {
        &self.console
    }

    /// Executes the triple. Infallible by design: every failure mode is
    /// reported through the console and the previous run is gone either way.
    pub fn run(&mut self, sources: &SourceSet) {
        // Tear down the previous run before anything about the new one
        // exists: its VM, its surface, and its right to the console.
        self.current = None;
        self.target.teardown();
        self.generation += 1;
        let generation = self.generation;
        if let Ok(mut log) = self.console.lock() {
            log.begin_run(generation);
        }
        let bridge = ConsoleBridge::new(self.console.clone(), generation);
        tracing::debug!(generation, "preview run starting");

        let document = match parse_fragment(&sources.markup) {
            Ok(document) => document,
            Err(err) => {
                bridge.push(Level::Error, format!("markup error: {err}"));
                Document::default()
            }
        };
        let sheet = Stylesheet::parse(&sources.style);
        let rendered = snippad_markup::render(&document, &sheet);

        let lua = match create_snippet_lua(&bridge) {
            Ok(lua) => {
                execute_script(&lua, &sources.script, &bridge);
                Some(lua)
            }
            Err(err) => {
                bridge.push(Level::Error, format!("script error: {}", first_line(&err.to_string())));
                None
            }
        };

        self.target.present(&rendered);
        self.current = Some(RunContext {
            generation,
            document: rendered,
            lua,
        });
    }
}

/// Builds the sandboxed Luau environment for one run: Luau sandbox mode,
/// blocked globals, periodic interrupt yields, heap limit, console bridge.
fn create_snippet_lua(bridge: &ConsoleBridge) -> mlua::Result<Lua> {
    let lua = Lua::new();
    let _ = lua.sandbox(true);

    for name in BLOCKED_GLOBALS {
        let msg = format!("{} is not available in snippets", name);
        lua.globals().set(
            name,
            lua.create_function(move |_, _: mlua::Variadic<mlua::Value>| {
                Err::<(), _>(mlua::Error::RuntimeError(msg.clone()))
            })?,
        )?;
    }

    // Yield back to the executor every few interrupts so the timeout check
    // runs. Only when no C (Rust) frame is on the stack; avoids "yield
    // across C-call boundary".
    let count = AtomicU64::new(0);
    const MAX_STACK_LEVEL: usize = 64;
    lua.set_interrupt(move |lua| {
        for level in 0..=MAX_STACK_LEVEL {
            if let Some(what) = lua.inspect_stack(level, |debug| debug.source().what) {
                if what == "C" {
                    return Ok(VmState::Continue);
                }
            } else {
                break;
            }
        }
        if count.fetch_add(1, Ordering::Relaxed) % 2 == 0 {
            return Ok(VmState::Yield);
        }
        Ok(VmState::Continue)
    });

    lua.set_memory_limit(SCRIPT_MEMORY_LIMIT_BYTES)?;
    console_api::install(&lua, bridge)?;
    Ok(lua)
}

/// Loads and runs the script on a VM thread, resuming across interrupt
/// yields until it finishes or the deadline passes.
fn execute_script(lua: &Lua, script: &str, bridge: &ConsoleBridge) {
    let func = match lua.load(script).set_name(CHUNK_NAME).into_function() {
        Ok(func) => func,
        Err(err) => {
            // Injection-time failure: a syntax error caught at load.
            bridge.push(Level::Error, format!("script error: {}", first_line(&err.to_string())));
            return;
        }
    };
    let thread = match lua.create_thread(func) {
        Ok(thread) => thread,
        Err(err) => {
            bridge.push(Level::Error, format!("script error: {}", first_line(&err.to_string())));
            return;
        }
    };

    let deadline = Instant::now() + SCRIPT_TIMEOUT;
    loop {
        match thread.status() {
            ThreadStatus::Resumable => {
                if Instant::now() >= deadline {
                    bridge.push(
                        Level::Error,
                        format!("script timed out after {}ms", SCRIPT_TIMEOUT.as_millis()),
                    );
                    break;
                }
                if let Err(err) = thread.resume::<()>(()) {
                    bridge.push(Level::Error, runtime_error_text(&err));
                    break;
                }
            }
            ThreadStatus::Finished | ThreadStatus::Running | ThreadStatus::Error => break,
        }
    }
}

/// Formats an uncaught runtime error as one console entry, extracting the
/// originating line from the Luau traceback when present.
fn runtime_error_text(err: &mlua::Error) -> String {
    static LINE_REGEX: OnceLock<regex::Regex> = OnceLock::new();
    let re = LINE_REGEX.get_or_init(|| {
        regex::Regex::new(r#"\[string "snippet"\]:(\d+):\s*([^\n]*)"#).unwrap()
    });

    let raw = err.to_string();
    match re.captures(&raw) {
        Some(caps) => format!("Error: {} (line {})", &caps[2], &caps[1]),
        None => format!("Error: {}", first_line(&raw)),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text).trim()
}
