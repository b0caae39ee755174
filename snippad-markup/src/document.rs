use serde::{Deserialize, Serialize};

/// A parsed markup fragment: the body content of one preview run.
///
/// Fragments may have any number of root siblings, so the document is a list
/// of nodes rather than a single root element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
}

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text { text: String },
}

/// An element with its recognized attributes split out.
///
/// `id`, `class`, and `style` get dedicated fields; everything else lands in
/// `attributes` in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attributes: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_style: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub children: Vec<Node>,
}

impl Document {
    /// Finds the element with the given id, searching depth-first.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        find_in(&self.nodes, &mut |el| el.id.as_deref() == Some(id))
    }

    /// Finds the first element with the given tag name, depth-first.
    pub fn find_by_tag(&self, tag: &str) -> Option<&Element> {
        find_in(&self.nodes, &mut |el| el.tag == tag)
    }

    /// Concatenated text content of the whole fragment.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.nodes, &mut out);
        out
    }
}

impl Element {
    /// Concatenated text content of this element's subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    /// Looks up a non-reserved attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn find_in<'a>(nodes: &'a [Node], pred: &mut dyn FnMut(&Element) -> bool) -> Option<&'a Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if pred(el) {
                return Some(el);
            }
            if let Some(found) = find_in(&el.children, pred) {
                return Some(found);
            }
        }
    }
    None
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { text } => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}
