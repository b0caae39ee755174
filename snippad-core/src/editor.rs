//! The editor session: one logical thread of UI events driving the preview
//! pipeline.
//!
//! Everything happens in response to an [`EditorEvent`] — a source edit, a
//! button press, the console focus changing, or the debounce timer firing.
//! Events arrive on an unbounded channel so nothing ever blocks the editing
//! surface.

use tokio::sync::mpsc;

use snippad_markup::RenderedDocument;

use crate::console::SharedConsole;
use crate::sandbox::{RenderTarget, SandboxRenderer, SourceSet};
use crate::scheduler::{LiveRunScheduler, RunTimer, TimerId, TokioTimer};
use crate::snippet::Snippet;

/// Which of the three sources an edit touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Markup,
    Style,
    Script,
}

#[derive(Debug)]
pub enum EditorEvent {
    /// A source changed. In live mode this (re)starts the quiet period.
    SourceEdited { kind: SourceKind, text: String },
    /// Explicit run trigger: immediate, no debounce.
    RunRequested,
    /// Restore the welcome sources and run.
    ResetRequested,
    /// Blank all sources and run.
    ClearRequested,
    LiveToggled(bool),
    ConsoleFocused(bool),
    ConsoleCleared,
    TimerFired(TimerId),
}

pub struct EditorSession<T: RenderTarget> {
    sources: SourceSet,
    renderer: SandboxRenderer<T>,
    scheduler: LiveRunScheduler,
    console: SharedConsole,
    events: mpsc::UnboundedReceiver<EditorEvent>,
    sender: mpsc::UnboundedSender<EditorEvent>,
}

impl<T: RenderTarget> EditorSession<T> {
    /// Builds a session with the debounce timer wired to its own event
    /// queue, loads the welcome sources, and — live mode being on by
    /// default — runs them once.
    pub fn new(target: T) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        let timer = TokioTimer::new(sender.clone());
        Self::with_timer(target, Box::new(timer), sender, events)
    }

    /// Variant for callers that bring their own timer (tests, shells with a
    /// native timer source).
    pub fn with_timer(
        target: T,
        timer: Box<dyn RunTimer>,
        sender: mpsc::UnboundedSender<EditorEvent>,
        events: mpsc::UnboundedReceiver<EditorEvent>,
    ) -> Self {
        let console = crate::console::shared_console();
        let mut scheduler = LiveRunScheduler::new(timer);
        scheduler.set_live(true);
        let mut session = Self {
            sources: SourceSet::welcome(),
            renderer: SandboxRenderer::new(console.clone(), target),
            scheduler,
            console,
            events,
            sender,
        };
        session.run_now();
        session
    }

    /// A sender for the UI surface to post events through.
    pub fn handle(&self) -> mpsc::UnboundedSender<EditorEvent> {
        self.sender.clone()
    }

    /// Drives the session until every sender is gone.
    pub async fn run(&mut self) {
        while let Some(event) = self.events.recv().await {
            self.apply(event);
        }
    }

    /// Applies queued events without waiting; returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    pub fn apply(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::SourceEdited { kind, text } => {
                match kind {
                    SourceKind::Markup => self.sources.markup = text,
                    SourceKind::Style => self.sources.style = text,
                    SourceKind::Script => self.sources.script = text,
                }
                self.scheduler.note_edit();
            }
            EditorEvent::RunRequested => self.run_now(),
            EditorEvent::ResetRequested => {
                self.sources = SourceSet::welcome();
                self.run_now();
            }
            EditorEvent::ClearRequested => {
                self.sources = SourceSet::default();
                self.run_now();
            }
            EditorEvent::LiveToggled(live) => self.scheduler.set_live(live),
            EditorEvent::ConsoleFocused(focused) => {
                if let Ok(mut log) = self.console.lock() {
                    log.set_focused(focused);
                }
            }
            EditorEvent::ConsoleCleared => {
                if let Ok(mut log) = self.console.lock() {
                    log.clear();
                }
            }
            EditorEvent::TimerFired(id) => {
                if self.scheduler.timer_fired(id) {
                    tracing::debug!(id, "quiet period elapsed, running");
                    self.run_now();
                }
            }
        }
    }

    /// Loads a persisted snippet into the editors and previews it. This is
    /// the only flow from persistence into the preview pipeline.
    pub fn load_snippet(&mut self, snippet: &Snippet) {
        self.sources = SourceSet::new(&snippet.markup, &snippet.style, &snippet.script);
        self.run_now();
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn console(&self) -> SharedConsole {
        self.console.clone()
    }

    pub fn is_live(&self) -> bool {
        self.scheduler.is_live()
    }

    /// Overrides the live-mode quiet period.
    pub fn set_quiet_period(&mut self, quiet_period: std::time::Duration) {
        self.scheduler.set_quiet_period(quiet_period);
    }

    /// The last run's rendered document, if a run has happened.
    pub fn rendered(&self) -> Option<&RenderedDocument> {
        self.renderer.context().map(|ctx| &ctx.document)
    }

    /// Generation of the current run; 0 before the first run.
    pub fn run_generation(&self) -> u64 {
        self.renderer.context().map(|ctx| ctx.generation).unwrap_or(0)
    }

    pub fn renderer(&self) -> &SandboxRenderer<T> {
        &self.renderer
    }

    fn run_now(&mut self) {
        self.renderer.run(&self.sources);
    }
}

impl SourceSet {
    /// The welcome snippet shown to a fresh editor.
    pub fn welcome() -> Self {
        SourceSet::new(DEFAULT_MARKUP, DEFAULT_STYLE, DEFAULT_SCRIPT)
    }
}

const DEFAULT_MARKUP: &str = r#"<h1>Hello, World!</h1>
<p>Welcome to the playground. Start coding!</p>
"#;

const DEFAULT_STYLE: &str = r#"h1 {
    color: #2563eb;
}

p {
    color: #333;
}
"#;

const DEFAULT_SCRIPT: &str = r#"-- Your script here
console.log("Script loaded!")

local function greet()
    console.log("Hello from the sandbox!")
end

greet()
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Level;
    use crate::sandbox::HeadlessTarget;
    use crate::scheduler::test_util::ManualTimer;
    use pretty_assertions::assert_eq;

    fn manual_session() -> EditorSession<HeadlessTarget> {
        let (sender, events) = mpsc::unbounded_channel();
        EditorSession::with_timer(
            HeadlessTarget::default(),
            Box::new(ManualTimer::default()),
            sender,
            events,
        )
    }

    fn edit(text: &str) -> EditorEvent {
        EditorEvent::SourceEdited {
            kind: SourceKind::Markup,
            text: text.into(),
        }
    }

    #[test]
    fn construction_runs_the_welcome_sources() {
        let session = manual_session();
        assert_eq!(session.run_generation(), 1);
        assert!(session.is_live());

        let rendered = session.rendered().unwrap();
        assert!(rendered.text_content().contains("Hello, World!"));

        let console = session.console();
        let log = console.lock().unwrap();
        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.entries()[0].level, Level::Log);
        assert_eq!(log.entries()[0].text, "Script loaded!");
    }

    #[test]
    fn edits_do_not_run_until_the_armed_timer_fires() {
        let mut session = manual_session();

        session.apply(edit("<p>one</p>"));
        session.apply(edit("<p>two</p>"));
        assert_eq!(session.run_generation(), 1);

        // Superseded deadline: ignored.
        session.apply(EditorEvent::TimerFired(1));
        assert_eq!(session.run_generation(), 1);

        // The armed one: runs with the latest state.
        session.apply(EditorEvent::TimerFired(2));
        assert_eq!(session.run_generation(), 2);
        assert_eq!(session.rendered().unwrap().text_content(), "two");
    }

    #[test]
    fn toggle_off_blocks_a_queued_fire() {
        let mut session = manual_session();

        session.apply(edit("<p>late</p>"));
        session.apply(EditorEvent::LiveToggled(false));
        session.apply(EditorEvent::TimerFired(1));

        assert_eq!(session.run_generation(), 1);
        assert!(!session.is_live());
    }

    #[test]
    fn explicit_run_is_immediate() {
        let mut session = manual_session();
        session.apply(EditorEvent::LiveToggled(false));

        session.apply(edit("<p>now</p>"));
        assert_eq!(session.run_generation(), 1);

        session.apply(EditorEvent::RunRequested);
        assert_eq!(session.run_generation(), 2);
        assert_eq!(session.rendered().unwrap().text_content(), "now");
    }

    #[test]
    fn reset_restores_defaults_and_runs() {
        let mut session = manual_session();
        session.apply(edit("<p>scratch</p>"));
        session.apply(EditorEvent::ResetRequested);

        assert_eq!(session.sources(), &SourceSet::welcome());
        assert_eq!(session.run_generation(), 2);
    }

    #[test]
    fn clear_blanks_sources_and_runs() {
        let mut session = manual_session();
        session.apply(EditorEvent::ClearRequested);

        assert_eq!(session.sources(), &SourceSet::default());
        assert_eq!(session.run_generation(), 2);
        assert_eq!(session.rendered().unwrap().text_content(), "");
        assert!(session.console().lock().unwrap().entries().is_empty());
    }

    #[test]
    fn console_focus_and_clear_events_reach_the_log() {
        let mut session = manual_session();
        {
            let console = session.console();
            let log = console.lock().unwrap();
            // The welcome run logged while the console was unfocused.
            assert!(log.has_unread());
        }

        session.apply(EditorEvent::ConsoleFocused(true));
        assert!(!session.console().lock().unwrap().has_unread());

        session.apply(EditorEvent::ConsoleCleared);
        assert!(session.console().lock().unwrap().entries().is_empty());
    }

    #[test]
    fn load_snippet_populates_sources_and_previews() {
        let mut session = manual_session();
        let snippet = crate::snippet::Snippet {
            id: uuid::Uuid::new_v4(),
            title: "saved".into(),
            description: String::new(),
            tags: String::new(),
            markup: "<p>restored</p>".into(),
            style: "p { color: green }".into(),
            script: "console.log('hi')".into(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        session.load_snippet(&snippet);
        assert_eq!(session.rendered().unwrap().text_content(), "restored");
        assert_eq!(
            session.console().lock().unwrap().entries()[0].text,
            "hi"
        );
    }
}
