use slab::Slab;
use smartcomment_traits::DomRect;
use std::fmt::Write;

use super::{Attribute, ElementData};

pub struct Node {
    // The actual tree we belong to. This is unsafe!!
    tree: *mut Slab<Node>,

    /// Our Id
    pub id: usize,
    /// Our parent's ID
    pub parent: Option<usize>,
    // What are our children?
    pub children: Vec<usize>,

    /// Node type (Element, TextNode, etc) specific data
    pub data: NodeData,

    /// Page-space border box, when the embedder has laid the page out
    pub layout_rect: Option<DomRect>,
}

impl Node {
    pub(crate) fn new(tree: *mut Slab<Node>, id: usize, data: NodeData) -> Self {
        Self {
            tree,

            id,
            parent: None,
            children: vec![],

            data,

            layout_rect: None,
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("data", &self.node_debug_str())
            .finish_non_exhaustive()
    }
}

/// The different kinds of nodes in the DOM.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The `Document` itself - the root node of a HTML document.
    Document,

    /// An element with attributes.
    Element(ElementData),

    /// A text node.
    Text(TextNodeData),

    /// A comment.
    Comment,
}

impl NodeData {
    pub fn downcast_element(&self) -> Option<&ElementData> {
        match self {
            Self::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_element_with_tag_name(&self, name: &str) -> bool {
        let Some(elem) = self.downcast_element() else {
            return false;
        };
        &*elem.name.local == name
    }

    pub fn attrs(&self) -> Option<&[Attribute]> {
        Some(&self.downcast_element()?.attrs)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.downcast_element()?.attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.downcast_element()
            .is_some_and(|elem| elem.has_attr(name))
    }
}

#[derive(Debug, Clone)]
pub struct TextNodeData {
    /// The textual content of the text node
    pub content: String,
}

impl TextNodeData {
    pub fn new(content: String) -> Self {
        Self { content }
    }
}

impl Node {
    pub fn tree(&self) -> &Slab<Node> {
        unsafe { &*self.tree }
    }

    #[track_caller]
    pub fn with(&self, id: usize) -> &Node {
        self.tree().get(id).unwrap()
    }

    pub fn parent_node(&self) -> Option<&Node> {
        self.parent.and_then(|id| self.tree().get(id))
    }

    // Get the index of the current node in the parents child list
    pub fn index_of_child(&self, child_id: usize) -> Option<usize> {
        self.children.iter().position(|id| *id == child_id)
    }

    // Get the index of the current node in the parents child list
    pub fn child_index(&self) -> Option<usize> {
        self.tree()[self.parent?]
            .children
            .iter()
            .position(|id| *id == self.id)
    }

    // Get the nth node in the parents child list
    pub fn forward(&self, n: usize) -> Option<&Node> {
        let child_idx = self.child_index().unwrap_or(0);
        self.tree()[self.parent?]
            .children
            .get(child_idx + n)
            .map(|id| self.with(*id))
    }

    pub fn backward(&self, n: usize) -> Option<&Node> {
        let child_idx = self.child_index().unwrap_or(0);
        if child_idx < n {
            return None;
        }

        self.tree()[self.parent?]
            .children
            .get(child_idx - n)
            .map(|id| self.with(*id))
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    pub fn is_text_node(&self) -> bool {
        matches!(self.data, NodeData::Text { .. })
    }

    /// A text node holding nothing but whitespace (or nothing at all)
    pub fn is_whitespace_text(&self) -> bool {
        self.text_data()
            .is_some_and(|data| data.content.trim().is_empty())
    }

    pub fn element_data(&self) -> Option<&ElementData> {
        match self.data {
            NodeData::Element(ref data) => Some(data),
            _ => None,
        }
    }

    pub fn element_data_mut(&mut self) -> Option<&mut ElementData> {
        match self.data {
            NodeData::Element(ref mut data) => Some(data),
            _ => None,
        }
    }

    pub fn text_data(&self) -> Option<&TextNodeData> {
        match self.data {
            NodeData::Text(ref data) => Some(data),
            _ => None,
        }
    }

    pub fn text_data_mut(&mut self) -> Option<&mut TextNodeData> {
        match self.data {
            NodeData::Text(ref mut data) => Some(data),
            _ => None,
        }
    }

    /// Tag name of an element, `None` for every other node type
    pub fn local_name(&self) -> Option<&str> {
        self.element_data().map(|data| data.local_name())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.element_data().is_some_and(|el| el.has_class(class))
    }

    /// DOM "length": bytes of text for text nodes, child count otherwise
    pub fn length(&self) -> usize {
        match &self.data {
            NodeData::Text(data) => data.content.len(),
            NodeData::Comment => 0,
            _ => self.children.len(),
        }
    }

    pub fn node_debug_str(&self) -> String {
        let mut s = String::new();

        match &self.data {
            NodeData::Document => write!(s, "DOCUMENT"),
            NodeData::Text(data) => {
                let end = clamp_to_char_boundary(&data.content, 10);
                write!(s, "TEXT {}", &data.content[..end])
            }
            NodeData::Comment => write!(s, "COMMENT"),
            NodeData::Element(data) => {
                let name = &data.name;
                let class = self.attr("class").unwrap_or("");
                if !class.is_empty() {
                    write!(s, "<{} class=\"{}\">", name.local, class)
                } else {
                    write!(s, "<{}>", name.local)
                }
            }
        }
        .unwrap();
        s
    }

    pub fn outer_html(&self) -> String {
        let mut output = String::new();
        self.write_outer_html(&mut output);
        output
    }

    pub fn inner_html(&self) -> String {
        let mut output = String::new();
        self.write_children_html(&mut output);
        output
    }

    pub fn write_outer_html(&self, writer: &mut String) {
        match &self.data {
            NodeData::Document => self.write_children_html(writer),
            NodeData::Comment => {}
            NodeData::Text(data) => {
                let raw = self
                    .parent_node()
                    .and_then(|parent| parent.element_data())
                    .is_some_and(|el| el.is_raw_text());
                if raw {
                    writer.push_str(&data.content);
                } else {
                    writer.push_str(&html_escape::encode_text(&data.content));
                }
            }
            NodeData::Element(data) => {
                self.write_start_tag(writer);
                if data.is_void() {
                    return;
                }
                self.write_children_html(writer);
                self.write_end_tag(writer);
            }
        }
    }

    pub(crate) fn write_start_tag(&self, writer: &mut String) {
        let Some(data) = self.element_data() else {
            return;
        };
        writer.push('<');
        writer.push_str(&data.name.local);
        for attr in data.attrs() {
            writer.push(' ');
            writer.push_str(&attr.qualified_name());
            writer.push_str("=\"");
            writer.push_str(&html_escape::encode_double_quoted_attribute(&attr.value));
            writer.push('"');
        }
        writer.push('>');
    }

    pub(crate) fn write_end_tag(&self, writer: &mut String) {
        let Some(data) = self.element_data() else {
            return;
        };
        writer.push_str("</");
        writer.push_str(&data.name.local);
        writer.push('>');
    }

    fn write_children_html(&self, writer: &mut String) {
        for &child_id in &self.children {
            self.tree()[child_id].write_outer_html(writer);
        }
    }

    pub fn attrs(&self) -> Option<&[Attribute]> {
        Some(&self.element_data()?.attrs)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element_data()?.attr(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.data.has_attr(name)
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.write_text_content(&mut out);
        out
    }

    fn write_text_content(&self, out: &mut String) {
        match &self.data {
            NodeData::Text(data) => {
                out.push_str(&data.content);
            }
            NodeData::Element(..) | NodeData::Document => {
                for child_id in self.children.iter() {
                    self.with(*child_id).write_text_content(out);
                }
            }
            _ => {}
        }
    }
}

/// Largest index `<= index` that falls on a char boundary of `text`
pub fn clamp_to_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// It might be wrong to expose this since what does *equality* mean outside the dom?
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

#[cfg(test)]
mod tests {
    use crate::Document;

    #[test]
    fn attribute_presence_on_nodes() {
        let mut doc = Document::new();
        let mut mutr = doc.mutate();
        let span = mutr.create_html_element("span", &[("data-comment-id", "")]);
        let text = mutr.create_text_node("data-comment-id");
        mutr.append_children(0, &[span]);
        mutr.append_children(span, &[text]);
        drop(mutr);

        let node = doc.get_node(span).unwrap();
        assert!(node.has_attr("data-comment-id"));
        assert!(!node.has_attr("data-svg-id"));
        assert!(!doc.get_node(text).unwrap().has_attr("data-comment-id"));

        doc.mutate().remove_attr(span, "data-comment-id");
        assert!(!doc.get_node(span).unwrap().has_attr("data-comment-id"));
    }
}
