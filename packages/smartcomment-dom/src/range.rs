//! Live ranges over the document.
//!
//! A [`Range`] is a pair of boundary points. For text nodes the offset is a byte offset into the
//! node's content, for every other node it is a child index. Offsets that fall inside a UTF-8
//! sequence are clamped down to the previous char boundary.

use std::cmp::Ordering;

use crate::node::clamp_to_char_boundary;
use crate::{Document, NodeData};

/// One endpoint of a [`Range`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub node: usize,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: usize, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// A range between two offsets of the same node
    pub fn within(node: usize, start: usize, end: usize) -> Self {
        Self::new(Boundary::new(node, start), Boundary::new(node, end))
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

enum Contents {
    Html,
    Text,
}

impl Document {
    /// Position of boundary point `a` relative to `b`
    pub fn compare_boundary(&self, a: Boundary, b: Boundary) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }

        if self.compare_document_order(a.node, b.node) == Ordering::Greater {
            return self.compare_boundary(b, a).reverse();
        }

        if self.is_ancestor_of(a.node, b.node) {
            let mut child = b.node;
            while let Some(parent) = self.nodes[child].parent {
                if parent == a.node {
                    break;
                }
                child = parent;
            }
            let index = self.nodes[child].child_index().unwrap_or(0);
            if index < a.offset {
                return Ordering::Greater;
            }
        }

        Ordering::Less
    }

    /// The range selecting `node_id` itself (from before it to after it in its parent)
    pub fn select_node(&self, node_id: usize) -> Option<Range> {
        let node = self.get_node(node_id)?;
        let parent = node.parent?;
        let index = node.child_index()?;
        Some(Range::new(
            Boundary::new(parent, index),
            Boundary::new(parent, index + 1),
        ))
    }

    /// Deepest node containing both boundary points
    pub fn range_common_ancestor(&self, range: &Range) -> usize {
        let chain_a = self.ancestor_chain_from_root(range.start.node);
        let chain_b = self.ancestor_chain_from_root(range.end.node);
        chain_a
            .iter()
            .zip(chain_b.iter())
            .take_while(|(a, b)| a == b)
            .last()
            .map(|(a, _)| *a)
            .unwrap_or(0)
    }

    /// A node is contained when it lies entirely between the boundary points
    pub fn range_contains_node(&self, range: &Range, node_id: usize) -> bool {
        let Some(node) = self.get_node(node_id) else {
            return false;
        };
        let node_start = Boundary::new(node_id, 0);
        let node_end = Boundary::new(node_id, node.length());
        self.compare_boundary(node_start, range.start) == Ordering::Greater
            && self.compare_boundary(node_end, range.end) == Ordering::Less
    }

    /// When the range covers exactly one child element of a container, returns that element
    pub fn range_single_element(&self, range: &Range) -> Option<usize> {
        if range.start.node != range.end.node || range.end.offset != range.start.offset + 1 {
            return None;
        }
        let container = self.get_node(range.start.node)?;
        if container.is_text_node() {
            return None;
        }
        let child = *container.children.get(range.start.offset)?;
        self.nodes[child].is_element().then_some(child)
    }

    /// Concatenated text of the range, like `Range.toString`
    pub fn range_to_string(&self, range: &Range) -> String {
        self.range_contents(range, Contents::Text)
    }

    /// Serialized HTML of the range's cloned contents, partially selected elements included
    pub fn range_to_html(&self, range: &Range) -> String {
        self.range_contents(range, Contents::Html)
    }

    fn range_contents(&self, range: &Range, mode: Contents) -> String {
        let mut out = String::new();
        if self.get_node(range.start.node).is_none() || self.get_node(range.end.node).is_none() {
            return out;
        }
        if self.compare_boundary(range.start, range.end) != Ordering::Less {
            return out;
        }

        if range.start.node == range.end.node {
            if let NodeData::Text(text) = &self.nodes[range.start.node].data {
                let start = clamp_to_char_boundary(&text.content, range.start.offset);
                let end = clamp_to_char_boundary(&text.content, range.end.offset);
                self.push_text(&mut out, range.start.node, &text.content[start..end.max(start)], &mode);
                return out;
            }
        }

        let ancestor = self.range_common_ancestor(range);
        self.write_range_children(ancestor, range, &mode, &mut out);
        out
    }

    fn write_range_children(&self, parent: usize, range: &Range, mode: &Contents, out: &mut String) {
        for &child_id in &self.nodes[parent].children {
            let child = &self.nodes[child_id];
            let is_start = child_id == range.start.node;
            let is_end = child_id == range.end.node;

            if let (NodeData::Text(text), true) = (&child.data, is_start || is_end) {
                let start = if is_start {
                    clamp_to_char_boundary(&text.content, range.start.offset)
                } else {
                    0
                };
                let end = if is_end {
                    clamp_to_char_boundary(&text.content, range.end.offset)
                } else {
                    text.content.len()
                };
                self.push_text(out, child_id, &text.content[start..end.max(start)], mode);
            } else if self.range_contains_node(range, child_id) {
                match mode {
                    Contents::Html => child.write_outer_html(out),
                    Contents::Text => out.push_str(&child.text_content()),
                }
            } else if self.is_inclusive_ancestor_of(child_id, range.start.node)
                || self.is_inclusive_ancestor_of(child_id, range.end.node)
            {
                if matches!(mode, Contents::Html) {
                    child.write_start_tag(out);
                }
                self.write_range_children(child_id, range, mode, out);
                if matches!(mode, Contents::Html) {
                    child.write_end_tag(out);
                }
            }
        }
    }

    fn push_text(&self, out: &mut String, node_id: usize, text: &str, mode: &Contents) {
        match mode {
            Contents::Text => out.push_str(text),
            Contents::Html => {
                let raw = self.nodes[node_id]
                    .parent_node()
                    .and_then(|parent| parent.element_data())
                    .is_some_and(|el| el.is_raw_text());
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&html_escape::encode_text(text));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// <div><p>Hello <b>big</b> world</p><p>Second</p></div>
    fn sample() -> (Document, [usize; 7]) {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let div = m.create_html_element("div", &[]);
        let p1 = m.create_html_element("p", &[]);
        let hello = m.create_text_node("Hello ");
        let b = m.create_html_element("b", &[]);
        let big = m.create_text_node("big");
        let world = m.create_text_node(" world");
        let p2 = m.create_html_element("p", &[]);
        let second = m.create_text_node("Second");
        m.append_children(0, &[div]);
        m.append_children(div, &[p1, p2]);
        m.append_children(p1, &[hello, b, world]);
        m.append_children(b, &[big]);
        m.append_children(p2, &[second]);
        drop(m);
        (doc, [div, p1, hello, b, big, world, second])
    }

    #[test]
    fn text_within_one_node() {
        let (doc, [_, _, hello, ..]) = sample();
        let range = Range::within(hello, 1, 4);
        assert_eq!(doc.range_to_string(&range), "ell");
        assert_eq!(doc.range_to_html(&range), "ell");
    }

    #[test]
    fn partially_selected_elements_are_cloned() {
        let (doc, [div, p1, hello, _, big, world, _]) = sample();
        let range = Range::new(Boundary::new(hello, 3), Boundary::new(big, 2));
        assert_eq!(doc.range_common_ancestor(&range), p1);
        assert_eq!(doc.range_to_string(&range), "lo bi");
        assert_eq!(doc.range_to_html(&range), "lo <b>bi</b>");

        let range = Range::new(Boundary::new(hello, 0), Boundary::new(world, 6));
        assert_eq!(doc.range_to_html(&range), "Hello <b>big</b> world");
        assert_eq!(doc.range_common_ancestor(&range), p1);
        assert!(doc.compare_boundary(range.start, range.end).is_lt());
        assert_ne!(doc.range_common_ancestor(&range), div);
    }

    #[test]
    fn ranges_across_blocks() {
        let (doc, [_, _, _, _, _, world, second]) = sample();
        let range = Range::new(Boundary::new(world, 1), Boundary::new(second, 3));
        assert_eq!(doc.range_to_string(&range), "worldSec");
        assert_eq!(doc.range_to_html(&range), "<p>world</p><p>Sec</p>");
    }

    #[test]
    fn select_node_and_single_element() {
        let (doc, [_, p1, _, b, ..]) = sample();
        let range = doc.select_node(b).unwrap();
        assert_eq!(range.start, Boundary::new(p1, 1));
        assert_eq!(doc.range_single_element(&range), Some(b));
        assert_eq!(doc.range_to_html(&range), "<b>big</b>");
        assert!(doc.range_contains_node(&range, b));
    }

    #[test]
    fn reversed_ranges_are_empty() {
        let (doc, [_, _, hello, ..]) = sample();
        let range = Range::within(hello, 4, 1);
        assert!(!range.is_collapsed());
        assert_eq!(doc.range_to_string(&range), "");
        assert!(Range::within(hello, 2, 2).is_collapsed());
    }
}
