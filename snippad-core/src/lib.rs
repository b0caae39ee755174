//! # Snippad Core
//!
//! The playground engine: accounts and snippet persistence over a JSON
//! record store, and the live preview pipeline — a sandboxed Luau script
//! environment per run, a console bridge that captures everything the
//! snippet says, and a debounced live-run scheduler.
//!
//! The preview pipeline never fails outward: whatever a snippet does, the
//! worst outcome is an error entry in the console log.

pub mod account;
pub mod console;
pub mod console_api;
pub mod editor;
pub mod sandbox;
pub mod scheduler;
pub mod session;
pub mod snippet;
pub mod store;

pub use account::{password_strength, AccountError, AccountService, NewAccount, User};
pub use console::{shared_console, ConsoleBridge, ConsoleEntry, ConsoleLog, Level, SharedConsole};
pub use editor::{EditorEvent, EditorSession, SourceKind};
pub use sandbox::{HeadlessTarget, RenderTarget, RunContext, SandboxRenderer, SourceSet};
pub use scheduler::{LiveRunScheduler, RunTimer, TimerId, TokioTimer, DEFAULT_QUIET_PERIOD};
pub use session::SessionContext;
pub use snippet::{DateFilter, Snippet, SnippetDraft, SnippetService};
pub use store::{RecordStore, SharedStore, StoreError};
