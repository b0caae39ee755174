use roxmltree::Node as XmlNode;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::document::{Document, Element, Node};
use crate::error::{MarkupError, MarkupResult};

/// Synthetic root tag wrapped around the fragment so sibling roots parse.
const WRAPPER: &str = "__snippad_root__";

/// Deepest allowed element nesting. Anything past this is almost certainly
/// generated or hostile input.
pub const MAX_NESTING_DEPTH: usize = 32;

fn wrap(markup: &str) -> String {
    format!("<{0}>{1}</{0}>", WRAPPER, markup)
}

fn tag_name_regex() -> &'static regex::Regex {
    static TAG_NAME_REGEX: OnceLock<regex::Regex> = OnceLock::new();
    TAG_NAME_REGEX.get_or_init(|| regex::Regex::new(r"^[a-zA-Z][a-zA-Z0-9-]*$").unwrap())
}

/// Parse a markup fragment into a [`Document`].
pub fn parse_fragment(markup: &str) -> MarkupResult<Document> {
    if markup.trim().is_empty() {
        return Ok(Document::default());
    }

    let wrapped = wrap(markup);
    let doc = roxmltree::Document::parse(&wrapped)?;
    let root = doc.root_element();

    let mut seen_ids = HashSet::new();
    let nodes = parse_children(root, 0, &mut seen_ids)?;
    Ok(Document { nodes })
}

fn parse_children(
    node: XmlNode,
    depth: usize,
    seen_ids: &mut HashSet<String>,
) -> MarkupResult<Vec<Node>> {
    let mut out = Vec::new();
    for child in node.children() {
        if child.is_element() {
            out.push(Node::Element(parse_element(child, depth + 1, seen_ids)?));
        } else if child.is_text() {
            let text = child.text().unwrap_or_default();
            if !text.trim().is_empty() {
                out.push(Node::Text {
                    text: text.to_string(),
                });
            }
        }
        // Comments and processing instructions are dropped.
    }
    Ok(out)
}

fn parse_element(
    node: XmlNode,
    depth: usize,
    seen_ids: &mut HashSet<String>,
) -> MarkupResult<Element> {
    if depth > MAX_NESTING_DEPTH {
        return Err(MarkupError::MaxNestingDepthExceeded {
            max_depth: MAX_NESTING_DEPTH,
        });
    }

    let tag = node.tag_name().name().to_string();
    if !tag_name_regex().is_match(&tag) {
        return Err(MarkupError::InvalidTagName { tag });
    }

    let mut id = None;
    let mut classes = Vec::new();
    let mut inline_style = None;
    let mut attributes = Vec::new();

    for attr in node.attributes() {
        match attr.name() {
            "id" => {
                let value = attr.value().to_string();
                if !seen_ids.insert(value.clone()) {
                    return Err(MarkupError::DuplicateId { id: value });
                }
                id = Some(value);
            }
            "class" => {
                classes = attr
                    .value()
                    .split_whitespace()
                    .map(|c| c.to_string())
                    .collect();
            }
            "style" => inline_style = Some(attr.value().to_string()),
            other => attributes.push((other.to_string(), attr.value().to_string())),
        }
    }

    Ok(Element {
        tag,
        id,
        classes,
        attributes,
        inline_style,
        children: parse_children(node, depth, seen_ids)?,
    })
}
