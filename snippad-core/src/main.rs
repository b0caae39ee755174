//! Headless preview runner: executes a snippet from the command line and
//! prints the rendered tree and console output.
//!
//! ```text
//! snippad [markup-file [style-file [script-file]]]
//! ```
//!
//! With no arguments the welcome snippet runs. `SNIPPAD_QUIET_MS` overrides
//! the live-mode quiet period; `RUST_LOG` controls diagnostics.

use std::fs;

use snippad_core::{EditorSession, EditorEvent, HeadlessTarget, SourceKind};
use snippad_markup::RenderedNode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let mut session = EditorSession::new(HeadlessTarget::default());

    if let Ok(quiet) = std::env::var("SNIPPAD_QUIET_MS") {
        match quiet.parse::<u64>() {
            Ok(ms) => session.set_quiet_period(std::time::Duration::from_millis(ms)),
            Err(_) => eprintln!("SNIPPAD_QUIET_MS must be a number of milliseconds, ignoring"),
        }
    }

    let kinds = [SourceKind::Markup, SourceKind::Style, SourceKind::Script];
    let mut edited = false;
    for kind in kinds {
        let Some(path) = args.next() else {
            break;
        };
        match fs::read_to_string(&path) {
            Ok(text) => {
                session.apply(EditorEvent::SourceEdited { kind, text });
                edited = true;
            }
            Err(err) => {
                eprintln!("cannot read {path}: {err}");
                std::process::exit(1);
            }
        }
    }
    if edited {
        session.apply(EditorEvent::RunRequested);
    }

    println!("── output ──");
    if let Some(rendered) = session.rendered() {
        for node in &rendered.nodes {
            print_node(node, 0);
        }
    }

    println!("── console ──");
    let console = session.console();
    let log = console.lock().expect("console lock");
    for entry in log.entries() {
        println!("[{}] > {}", entry.level, entry.text);
    }
}

fn print_node(node: &RenderedNode, depth: usize) {
    let pad = "  ".repeat(depth);
    match node {
        RenderedNode::Text { text } => println!("{pad}{:?}", text.trim()),
        RenderedNode::Element {
            tag,
            id,
            style,
            children,
            ..
        } => {
            let id = id
                .as_ref()
                .map(|id| format!(" #{id}"))
                .unwrap_or_default();
            let styles: Vec<String> = style
                .iter()
                .map(|(prop, value)| format!("{prop}: {value}"))
                .collect();
            println!("{pad}<{tag}{id}> {{ {} }}", styles.join("; "));
            for child in children {
                print_node(child, depth + 1);
            }
        }
    }
}
