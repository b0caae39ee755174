//! # Snippad Markup
//!
//! The document language of the snippad playground: an XML-ish element
//! fragment forming a page body, plus a small rule-based stylesheet that is
//! cascaded over it.
//!
//! ## Features
//! - Fragment parsing into a typed node tree (multiple root siblings allowed)
//! - Duplicate-id and nesting-depth validation with detailed error messages
//! - Lenient stylesheet parsing: malformed rules are dropped, never fatal
//! - Cascade with tag/class/id specificity and inline `style` attributes
//!
//! ## Example
//! ```ignore
//! use snippad_markup::{parse_fragment, parse_stylesheet, render};
//!
//! let doc = parse_fragment(r#"<p class="intro">hi</p>"#).expect("parse failed");
//! let sheet = parse_stylesheet("p { color: red }");
//! let rendered = render(&doc, &sheet);
//! ```

pub mod document;
pub mod error;
pub mod parser;
pub mod render;
pub mod style;

pub use document::{Document, Element, Node};
pub use error::{MarkupError, MarkupResult};
pub use render::{ComputedStyle, RenderedDocument, RenderedNode};
pub use style::{Declaration, Rule, Selector, Stylesheet};

/// Parse a markup fragment into a document tree.
///
/// The fragment is body content: any number of sibling elements and text
/// runs. Ids must be unique across the fragment.
pub fn parse_fragment(markup: &str) -> MarkupResult<Document> {
    parser::parse_fragment(markup)
}

/// Parse stylesheet text. Lenient: rules and declarations that do not parse
/// are dropped, so this never fails.
pub fn parse_stylesheet(style: &str) -> Stylesheet {
    Stylesheet::parse(style)
}

/// Cascade a stylesheet over a document, producing the rendered tree with a
/// computed style per element.
pub fn render(document: &Document, sheet: &Stylesheet) -> RenderedDocument {
    render::render(document, sheet)
}
