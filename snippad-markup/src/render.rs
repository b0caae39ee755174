use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::document::{Document, Element, Node};
use crate::style::{parse_declarations, Stylesheet};

/// A document with the stylesheet cascaded over it: what a display surface
/// actually shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub nodes: Vec<RenderedNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderedNode {
    Element {
        tag: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        classes: Vec<String>,
        style: ComputedStyle,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        children: Vec<RenderedNode>,
    },
    Text {
        text: String,
    },
}

/// The resolved property set for one element after the cascade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputedStyle {
    properties: BTreeMap<String, String>,
}

impl ComputedStyle {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl RenderedDocument {
    pub fn find_by_id(&self, id: &str) -> Option<&RenderedNode> {
        find_in(&self.nodes, &mut |tag_id| tag_id.1 == Some(id))
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<&RenderedNode> {
        find_in(&self.nodes, &mut |tag_id| tag_id.0 == tag)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.nodes, &mut out);
        out
    }
}

impl RenderedNode {
    pub fn style(&self) -> Option<&ComputedStyle> {
        match self {
            RenderedNode::Element { style, .. } => Some(style),
            RenderedNode::Text { .. } => None,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            RenderedNode::Text { text } => text.clone(),
            RenderedNode::Element { children, .. } => {
                let mut out = String::new();
                collect_text(children, &mut out);
                out
            }
        }
    }
}

/// Cascade `sheet` over `document`.
///
/// Matching rules apply in ascending (specificity, source order); the inline
/// `style` attribute always wins.
pub fn render(document: &Document, sheet: &Stylesheet) -> RenderedDocument {
    RenderedDocument {
        nodes: document
            .nodes
            .iter()
            .map(|node| render_node(node, sheet))
            .collect(),
    }
}

fn render_node(node: &Node, sheet: &Stylesheet) -> RenderedNode {
    match node {
        Node::Text { text } => RenderedNode::Text { text: text.clone() },
        Node::Element(el) => RenderedNode::Element {
            tag: el.tag.clone(),
            id: el.id.clone(),
            classes: el.classes.clone(),
            style: compute_style(el, sheet),
            children: el
                .children
                .iter()
                .map(|child| render_node(child, sheet))
                .collect(),
        },
    }
}

fn compute_style(el: &Element, sheet: &Stylesheet) -> ComputedStyle {
    let mut matched: Vec<(u8, usize, &crate::style::Rule)> = sheet
        .rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| matches(&rule.selector, el))
        .map(|(order, rule)| (rule.selector.specificity(), order, rule))
        .collect();
    matched.sort_by_key(|(specificity, order, _)| (*specificity, *order));

    let mut properties = BTreeMap::new();
    for (_, _, rule) in matched {
        for decl in &rule.declarations {
            properties.insert(decl.property.clone(), decl.value.clone());
        }
    }
    if let Some(inline) = &el.inline_style {
        for decl in parse_declarations(inline) {
            properties.insert(decl.property, decl.value);
        }
    }
    ComputedStyle { properties }
}

fn matches(selector: &crate::style::Selector, el: &Element) -> bool {
    use crate::style::Selector;
    match selector {
        Selector::Universal => true,
        Selector::Tag(tag) => el.tag == *tag,
        Selector::Class(class) => el.classes.iter().any(|c| c == class),
        Selector::Id(id) => el.id.as_deref() == Some(id.as_str()),
    }
}

fn find_in<'a>(
    nodes: &'a [RenderedNode],
    pred: &mut dyn FnMut((&str, Option<&str>)) -> bool,
) -> Option<&'a RenderedNode> {
    for node in nodes {
        if let RenderedNode::Element {
            tag, id, children, ..
        } = node
        {
            if pred((tag.as_str(), id.as_deref())) {
                return Some(node);
            }
            if let Some(found) = find_in(children, pred) {
                return Some(found);
            }
        }
    }
    None
}

fn collect_text(nodes: &[RenderedNode], out: &mut String) {
    for node in nodes {
        match node {
            RenderedNode::Text { text } => out.push_str(text),
            RenderedNode::Element { children, .. } => collect_text(children, out),
        }
    }
}
