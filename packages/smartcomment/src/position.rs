//! The position codec.
//!
//! An anchor's location is stored with its comment as a single string:
//!
//!  - `"<text>|<index>"` for text, with `<` and `>` entity-encoded in `<text>`
//!  - `"img[<hash>]"` for images
//!  - `"svg[<id>]"` for SVG links
//!  - anything else is an opaque selector or dynamic-block key
//!
//! Decoding never fails. Strings that match no other form become [`PositionDescriptor::Selector`]
//! and are dropped later if nothing in the page matches them.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::selection::{SelectionKind, SelectionResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PositionDescriptor {
    /// The `index`-th occurrence (zero based) of `text` in the content
    Text { text: String, index: usize },
    Image { hash: String },
    Svg { id: String },
    Selector { selector: String },
}

impl PositionDescriptor {
    pub fn kind(&self) -> SelectionKind {
        match self {
            PositionDescriptor::Text { .. } => SelectionKind::Text,
            PositionDescriptor::Image { .. } => SelectionKind::Image,
            PositionDescriptor::Svg { .. } => SelectionKind::Svg,
            PositionDescriptor::Selector { .. } => SelectionKind::DynamicBlock,
        }
    }
}

impl fmt::Display for PositionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionDescriptor::Text { text, index } => write!(f, "{}|{index}", sanitize(text)),
            PositionDescriptor::Image { hash } => write!(f, "img[{hash}]"),
            PositionDescriptor::Svg { id } => write!(f, "svg[{id}]"),
            PositionDescriptor::Selector { selector } => f.write_str(selector),
        }
    }
}

/// Wire string for a selection. Text selections are sanitized and get their index appended, the
/// other kinds already carry their bracketed form in `text`.
pub fn encode(result: &SelectionResult) -> String {
    match result.kind {
        SelectionKind::Text => format!("{}|{}", sanitize(&result.text), result.index),
        SelectionKind::Image | SelectionKind::Svg | SelectionKind::DynamicBlock => {
            result.text.clone()
        }
    }
}

/// Parses a wire string. `None` means "no position": the entry should be discarded.
pub fn decode(wire: &str) -> Option<PositionDescriptor> {
    if wire.is_empty() {
        return None;
    }

    if let Some((text, index)) = wire.rsplit_once('|') {
        return Some(PositionDescriptor::Text {
            text: unsanitize(text),
            index: index.trim().parse().unwrap_or(0),
        });
    }

    if let Some(hash) = bracketed(wire, "img[") {
        return Some(PositionDescriptor::Image {
            hash: hash.to_string(),
        });
    }

    if let Some(id) = bracketed(wire, "svg[") {
        return Some(PositionDescriptor::Svg { id: id.to_string() });
    }

    Some(PositionDescriptor::Selector {
        selector: wire.to_string(),
    })
}

/// [`decode`] for a field that may be missing
pub fn decode_opt(wire: Option<&str>) -> Option<PositionDescriptor> {
    wire.and_then(decode)
}

fn bracketed<'a>(wire: &'a str, prefix: &str) -> Option<&'a str> {
    wire.strip_prefix(prefix)?.strip_suffix(']')
}

fn sanitize(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

fn unsanitize(text: &str) -> String {
    text.replace("&lt;", "<").replace("&gt;", ">")
}

impl Serialize for PositionDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PositionDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = String::deserialize(deserializer)?;
        decode(&wire).ok_or_else(|| D::Error::custom("empty position string"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(text: &str, index: usize) -> PositionDescriptor {
        PositionDescriptor::Text {
            text: text.to_string(),
            index,
        }
    }

    #[test]
    fn decodes_every_form() {
        assert_eq!(decode("hello|2"), Some(text("hello", 2)));
        assert_eq!(
            decode("img[abc123]"),
            Some(PositionDescriptor::Image {
                hash: "abc123".to_string()
            })
        );
        assert_eq!(
            decode("svg[svg-href-Foo]"),
            Some(PositionDescriptor::Svg {
                id: "svg-href-Foo".to_string()
            })
        );
        assert_eq!(
            decode("#toc > li"),
            Some(PositionDescriptor::Selector {
                selector: "#toc > li".to_string()
            })
        );
        assert_eq!(decode(""), None);
        assert_eq!(decode_opt(None), None);
    }

    #[test]
    fn text_splits_on_the_last_separator() {
        assert_eq!(decode("a|b|3"), Some(text("a|b", 3)));
        assert_eq!(decode("a|b|x"), Some(text("a|b", 0)));
        assert_eq!(decode("a&lt;b&gt;|1"), Some(text("a<b>", 1)));
        // only the two entities are reversed
        assert_eq!(decode("a&amp;b|0"), Some(text("a&amp;b", 0)));
    }

    #[test]
    fn unterminated_brackets_are_selectors() {
        assert!(matches!(
            decode("img[abc"),
            Some(PositionDescriptor::Selector { .. })
        ));
        assert!(matches!(
            decode("svg"),
            Some(PositionDescriptor::Selector { .. })
        ));
    }

    #[test]
    fn display_is_the_wire_form() {
        assert_eq!(text("a<b", 0).to_string(), "a&lt;b|0");
        assert_eq!(decode("a&lt;b|0"), Some(text("a<b", 0)));
        let svg = PositionDescriptor::Svg {
            id: "svg-text-revenue-10-20".to_string(),
        };
        assert_eq!(decode(&svg.to_string()), Some(svg));
    }

    #[test]
    fn serde_uses_the_wire_string() {
        let json = serde_json::to_string(&text("x>y", 4)).unwrap();
        assert_eq!(json, r#""x&gt;y|4""#);
        let back: PositionDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, text("x>y", 4));
        assert!(serde_json::from_str::<PositionDescriptor>(r#""""#).is_err());
    }
}
