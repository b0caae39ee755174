use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A parsed stylesheet: rules in source order.
///
/// Parsing is lenient on purpose. The stylesheet is user-authored snippet
/// input, and a typo in one rule must not take down the whole preview, so
/// anything that does not parse is silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub selector: Selector,
    pub declarations: Vec<Declaration>,
}

/// The supported selector forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Selector {
    Universal,
    Tag(String),
    Class(String),
    Id(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

fn property_regex() -> &'static regex::Regex {
    static PROPERTY_REGEX: OnceLock<regex::Regex> = OnceLock::new();
    PROPERTY_REGEX.get_or_init(|| regex::Regex::new(r"^[a-zA-Z-][a-zA-Z0-9-]*$").unwrap())
}

fn color_regex() -> &'static regex::Regex {
    static COLOR_REGEX: OnceLock<regex::Regex> = OnceLock::new();
    // Hex (#rgb / #rrggbb) or a named color.
    COLOR_REGEX.get_or_init(|| {
        regex::Regex::new(r"^(#[0-9a-fA-F]{3}([0-9a-fA-F]{3})?|[a-zA-Z]+)$").unwrap()
    })
}

impl Selector {
    fn parse(text: &str) -> Option<Selector> {
        let text = text.trim();
        if text == "*" {
            return Some(Selector::Universal);
        }
        if let Some(name) = text.strip_prefix('.') {
            return ident(name).map(Selector::Class);
        }
        if let Some(name) = text.strip_prefix('#') {
            return ident(name).map(Selector::Id);
        }
        ident(text).map(Selector::Tag)
    }

    /// Cascade weight: id beats class beats tag beats universal.
    pub fn specificity(&self) -> u8 {
        match self {
            Selector::Universal => 0,
            Selector::Tag(_) => 1,
            Selector::Class(_) => 2,
            Selector::Id(_) => 3,
        }
    }
}

fn ident(name: &str) -> Option<String> {
    if !name.is_empty() && property_regex().is_match(name) {
        Some(name.to_string())
    } else {
        None
    }
}

impl Stylesheet {
    /// Parse stylesheet text. Never fails; unparseable pieces are dropped.
    pub fn parse(text: &str) -> Stylesheet {
        let text = strip_comments(text);
        let mut rules = Vec::new();
        let mut rest = text.as_str();

        while let Some(open) = rest.find('{') {
            let selector_text = &rest[..open];
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break; // unterminated block, drop the tail
            };
            let declarations = parse_declarations(&after[..close]);
            // Comma lists share one declaration block.
            for part in selector_text.split(',') {
                if let Some(selector) = Selector::parse(part) {
                    rules.push(Rule {
                        selector,
                        declarations: declarations.clone(),
                    });
                }
            }
            rest = &after[close + 1..];
        }

        Stylesheet { rules }
    }
}

/// Parse a `prop: value; prop: value` declaration list, as found both inside
/// rule blocks and in inline `style` attributes.
pub fn parse_declarations(text: &str) -> Vec<Declaration> {
    let mut out = Vec::new();
    for piece in text.split(';') {
        let Some((prop, value)) = piece.split_once(':') else {
            continue;
        };
        let property = prop.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        if value.is_empty() || !property_regex().is_match(&property) {
            continue;
        }
        if property.ends_with("color") && !color_regex().is_match(&value) {
            continue;
        }
        out.push(Declaration { property, value });
    }
    out
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out, // unterminated comment swallows the tail
        }
    }
    out.push_str(rest);
    out
}
