use std::collections::HashSet;

use crate::node::clamp_to_char_boundary;
use crate::{Attribute, Document, NodeData, QualName, ns};
use markup5ever::LocalName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendTextErr {
    /// The node is not a text node
    NotTextNode,
}

pub struct DocumentMutator<'doc> {
    /// Document is public as an escape hatch, but users of this API should ideally avoid using it
    /// and prefer exposing additional functionality in DocumentMutator.
    pub doc: &'doc mut Document,

    // Tracked nodes for deferred processing when mutations have completed
    normalize_nodes: HashSet<usize>,
}

impl Drop for DocumentMutator<'_> {
    fn drop(&mut self) {
        self.flush(); // Defined at bottom of file
    }
}

impl DocumentMutator<'_> {
    pub fn new<'doc>(doc: &'doc mut Document) -> DocumentMutator<'doc> {
        DocumentMutator {
            doc,
            normalize_nodes: HashSet::new(),
        }
    }

    pub fn node_has_parent(&self, node_id: usize) -> bool {
        self.doc.nodes[node_id].parent.is_some()
    }

    pub fn previous_sibling_id(&self, node_id: usize) -> Option<usize> {
        self.doc.nodes[node_id].backward(1).map(|node| node.id)
    }

    pub fn next_sibling_id(&self, node_id: usize) -> Option<usize> {
        self.doc.nodes[node_id].forward(1).map(|node| node.id)
    }

    pub fn last_child_id(&self, node_id: usize) -> Option<usize> {
        self.doc.nodes[node_id].children.last().copied()
    }

    pub fn element_name(&self, node_id: usize) -> Option<&QualName> {
        self.doc.nodes[node_id].element_data().map(|el| &el.name)
    }

    pub fn create_comment_node(&mut self) -> usize {
        self.doc.create_node(NodeData::Comment)
    }

    pub fn create_text_node(&mut self, text: &str) -> usize {
        self.doc.create_text_node(text)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>) -> usize {
        self.doc.create_element(name, attrs)
    }

    /// Creates an unattached HTML element, e.g. `create_html_element("span", &[("class", "x")])`
    pub fn create_html_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> usize {
        let name = QualName::new(None, ns!(html), LocalName::from(tag));
        let attrs = attrs
            .iter()
            .map(|(name, value)| Attribute::new(name, *value))
            .collect();
        self.doc.create_element(name, attrs)
    }

    /// Remove all of the children from old_parent_id and append them to new_parent_id
    pub fn reparent_children(&mut self, old_parent_id: usize, new_parent_id: usize) {
        let child_ids = std::mem::take(&mut self.doc.nodes[old_parent_id].children);
        for &child_id in &child_ids {
            self.doc.nodes[child_id].parent = None;
        }
        self.append_children(new_parent_id, &child_ids);
    }

    pub fn append_children(&mut self, parent_id: usize, child_ids: &[usize]) {
        for child_id in child_ids.iter().copied() {
            let old_parent = self.doc.nodes[child_id].parent.replace(parent_id);
            if let Some(old_parent_id) = old_parent {
                self.doc.nodes[old_parent_id]
                    .children
                    .retain(|id| *id != child_id);
            }
            self.doc.nodes[parent_id].children.push(child_id);
        }
    }

    pub fn remove_node(&mut self, node_id: usize) {
        self.doc.remove_node(node_id);
    }

    /// Detaches the node and frees it together with its subtree and listeners
    pub fn remove_and_drop_node(&mut self, node_id: usize) {
        self.doc.remove_and_drop_node(node_id);
    }

    pub fn insert_nodes_after(&mut self, anchor_node_id: usize, new_node_ids: &[usize]) {
        let next_sibling_id = self.next_sibling_id(anchor_node_id);

        match next_sibling_id {
            Some(anchor_node_id) => {
                self.doc.insert_before(anchor_node_id, new_node_ids);
            }
            None => {
                if let Some(parent_id) = self.doc.nodes[anchor_node_id].parent {
                    self.append_children(parent_id, new_node_ids);
                }
            }
        }
    }

    pub fn insert_nodes_before(&mut self, anchor_node_id: usize, new_node_ids: &[usize]) {
        self.doc.insert_before(anchor_node_id, new_node_ids);
    }

    pub fn append_text_to_node(&mut self, node_id: usize, text: &str) -> Result<(), AppendTextErr> {
        match self.doc.nodes[node_id].text_data_mut() {
            Some(data) => {
                data.content += text;
                Ok(())
            }
            None => Err(AppendTextErr::NotTextNode),
        }
    }

    pub fn add_attrs_if_missing(&mut self, node_id: usize, attrs: Vec<Attribute>) {
        let node = &mut self.doc.nodes[node_id];
        let Some(element_data) = node.element_data_mut() else {
            return;
        };

        let existing_names = element_data
            .attrs
            .iter()
            .map(|e| e.name.clone())
            .collect::<HashSet<_>>();

        for attr in attrs
            .into_iter()
            .filter(|attr| !existing_names.contains(&attr.name))
        {
            self.set_attribute(node_id, attr.name, &attr.value);
        }
    }

    pub fn set_attribute(&mut self, node_id: usize, name: QualName, value: &str) {
        let is_id = name.local.as_ref() == "id";

        let node = &mut self.doc.nodes[node_id];
        let NodeData::Element(ref mut element) = node.data else {
            return;
        };
        element.attrs.set(name, value);

        if is_id {
            element.flush_id();
            self.doc.nodes_to_id.insert(value.to_string(), node_id);
        }
    }

    /// Sets an attribute in the null namespace, keeping the namespace of an existing one
    pub fn set_attr(&mut self, node_id: usize, name: &str, value: &str) {
        let existing = self.doc.nodes[node_id]
            .element_data()
            .and_then(|el| el.attrs.get(name))
            .map(|attr| attr.name.clone());
        let name = existing.unwrap_or_else(|| QualName::new(None, ns!(), LocalName::from(name)));
        self.set_attribute(node_id, name, value);
    }

    /// Returns false if the attribute was not present
    pub fn remove_attr(&mut self, node_id: usize, name: &str) -> bool {
        let Some(element) = self.doc.nodes[node_id].element_data_mut() else {
            return false;
        };
        let removed = element.attrs.remove_local(name).is_some();
        if removed && name == "id" {
            element.flush_id();
        }
        removed
    }

    pub fn add_class(&mut self, node_id: usize, class: &str) -> bool {
        self.doc.nodes[node_id]
            .element_data_mut()
            .is_some_and(|el| el.add_class(class))
    }

    pub fn remove_class(&mut self, node_id: usize, class: &str) -> bool {
        self.doc.nodes[node_id]
            .element_data_mut()
            .is_some_and(|el| el.remove_class(class))
    }

    pub fn set_style_property(&mut self, node_id: usize, name: &str, value: &str) {
        if let Some(el) = self.doc.nodes[node_id].element_data_mut() {
            el.set_style_property(name, value);
        }
    }

    pub fn remove_style_property(&mut self, node_id: usize, name: &str) -> bool {
        self.doc.nodes[node_id]
            .element_data_mut()
            .is_some_and(|el| el.remove_style_property(name))
    }

    /// Splits a text node at a byte offset, like `Text.splitText`.
    ///
    /// The original node keeps `[..offset]`, a new sibling holding `[offset..]` is inserted right
    /// after it and returned.
    pub fn split_text(&mut self, node_id: usize, offset: usize) -> Option<usize> {
        let text = self.doc.nodes.get_mut(node_id)?.text_data_mut()?;
        let offset = clamp_to_char_boundary(&text.content, offset);
        let tail = text.content.split_off(offset);

        let new_id = self.doc.create_text_node(&tail);
        if self.doc.nodes[node_id].parent.is_some() {
            self.insert_nodes_after(node_id, &[new_id]);
        }
        Some(new_id)
    }

    /// Puts `wrapper_id` where `node_id` was and moves `node_id` inside it
    pub fn wrap_node(&mut self, node_id: usize, wrapper_id: usize) {
        if self.doc.nodes[node_id].parent.is_some() {
            self.doc.insert_before(node_id, &[wrapper_id]);
        }
        self.append_children(wrapper_id, &[node_id]);
    }

    /// Replaces an element by its children. The parent is normalized once the mutator is dropped.
    pub fn unwrap_element(&mut self, node_id: usize) -> Vec<usize> {
        let Some(parent_id) = self.doc.nodes.get(node_id).and_then(|node| node.parent) else {
            return Vec::new();
        };
        let children = self.doc.nodes[node_id].children.clone();
        self.doc.insert_before(node_id, &children);
        self.doc.remove_and_drop_node(node_id);
        self.normalize_nodes.insert(parent_id);
        children
    }

    /// Merges adjacent text children and drops empty ones, like `Node.normalize` (non recursive)
    pub fn normalize(&mut self, node_id: usize) {
        let Some(node) = self.doc.nodes.get(node_id) else {
            return;
        };
        let children = node.children.clone();

        let mut previous_text: Option<usize> = None;
        for child_id in children {
            let Some(content) = self.doc.nodes[child_id]
                .text_data()
                .map(|text| text.content.clone())
            else {
                previous_text = None;
                continue;
            };

            if content.is_empty() {
                self.doc.remove_and_drop_node(child_id);
                continue;
            }

            match previous_text {
                Some(previous_id) => {
                    let _ = self.append_text_to_node(previous_id, &content);
                    self.doc.remove_and_drop_node(child_id);
                }
                None => previous_text = Some(child_id),
            }
        }
    }
}

impl<'doc> DocumentMutator<'doc> {
    pub fn flush(&mut self) {
        let nodes: Vec<usize> = self.normalize_nodes.drain().collect();
        for id in nodes {
            self.normalize(id);
        }
    }
}

impl Document {
    pub(crate) fn insert_before(&mut self, anchor_node_id: usize, new_node_ids: &[usize]) {
        let Some(parent_id) = self.nodes[anchor_node_id].parent else {
            return;
        };

        for &new_id in new_node_ids {
            if let Some(old_parent_id) = self.nodes[new_id].parent.take() {
                self.nodes[old_parent_id]
                    .children
                    .retain(|id| *id != new_id);
            }
            let parent = &mut self.nodes[parent_id];
            let anchor_idx = parent
                .index_of_child(anchor_node_id)
                .unwrap_or(parent.children.len());
            parent.children.insert(anchor_idx, new_id);
            self.nodes[new_id].parent = Some(parent_id);
        }
    }

    /// Detaches a node from its parent. The node stays in the slab.
    pub(crate) fn remove_node(&mut self, node_id: usize) -> Option<usize> {
        let parent_id = self.nodes.get_mut(node_id)?.parent.take()?;
        self.nodes[parent_id].children.retain(|id| *id != node_id);
        Some(parent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_children(doc: &Document, parent: usize) -> Vec<String> {
        doc.nodes[parent]
            .children
            .iter()
            .map(|id| match &doc.nodes[*id].data {
                NodeData::Text(text) => text.content.clone(),
                _ => format!("<{}>", doc.nodes[*id].local_name().unwrap_or("?")),
            })
            .collect()
    }

    #[test]
    fn split_wrap_unwrap_restores_text() {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let p = m.create_html_element("p", &[]);
        m.append_children(0, &[p]);
        let text = m.create_text_node("Hello world");
        m.append_children(p, &[text]);

        let tail = m.split_text(text, 6).unwrap();
        let span = m.create_html_element("span", &[("class", "hl")]);
        m.wrap_node(tail, span);
        drop(m);

        assert_eq!(text_children(&doc, p), vec!["Hello ", "<span>"]);
        assert_eq!(doc.nodes[p].outer_html(), r#"<p>Hello <span class="hl">world</span></p>"#);

        doc.mutate().unwrap_element(span);
        assert_eq!(text_children(&doc, p), vec!["Hello world"]);
        assert!(doc.get_node(span).is_none());
    }

    #[test]
    fn split_text_clamps_to_char_boundary() {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let text = m.create_text_node("héllo");
        // byte 2 is inside "é"
        let tail = m.split_text(text, 2).unwrap();
        assert_eq!(m.doc.nodes[text].text_data().unwrap().content, "h");
        assert_eq!(m.doc.nodes[tail].text_data().unwrap().content, "éllo");
    }

    #[test]
    fn normalize_merges_and_drops_empty_text() {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let div = m.create_html_element("div", &[]);
        m.append_children(0, &[div]);
        let a = m.create_text_node("a");
        let empty = m.create_text_node("");
        let b = m.create_text_node("b");
        let br = m.create_html_element("br", &[]);
        let c = m.create_text_node("c");
        m.append_children(div, &[a, empty, b, br, c]);
        m.normalize(div);
        drop(m);
        assert_eq!(text_children(&doc, div), vec!["ab", "<br>", "c"]);
    }

    #[test]
    fn attributes_by_local_name() {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let div = m.create_html_element("div", &[("id", "a")]);
        m.set_attr(div, "data-comment-id", "7");
        m.set_attr(div, "id", "b");
        assert!(m.remove_attr(div, "data-comment-id"));
        assert!(!m.remove_attr(div, "data-comment-id"));
        drop(m);
        assert_eq!(doc.get_element_by_id("b"), Some(div));
        assert_eq!(doc.nodes[div].attr("id"), Some("b"));
    }
}
