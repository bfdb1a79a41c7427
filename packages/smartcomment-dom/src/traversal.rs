use std::cmp::Ordering;

use crate::{Document, Node};

#[derive(Clone)]
/// An pre-order tree traverser for a [Document](crate::Document).
pub struct TreeTraverser<'a> {
    doc: &'a Document,
    stack: Vec<usize>,
}

impl<'a> TreeTraverser<'a> {
    /// Creates a new tree traverser for the given document which starts at the root node.
    pub fn new(doc: &'a Document) -> Self {
        Self::new_with_root(doc, 0)
    }

    /// Creates a new tree traverser for the given document which starts at the specified node.
    pub fn new_with_root(doc: &'a Document, root: usize) -> Self {
        let mut stack = Vec::with_capacity(32);
        stack.push(root);
        TreeTraverser { doc, stack }
    }
}
impl Iterator for TreeTraverser<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.doc.get_node(id)?;
        self.stack.extend(node.children.iter().rev());
        Some(id)
    }
}

#[derive(Clone)]
/// An ancestor traverser for a [Document](crate::Document).
pub struct AncestorTraverser<'a> {
    doc: &'a Document,
    current: usize,
}
impl<'a> AncestorTraverser<'a> {
    /// Creates a new ancestor traverser for the given document and node ID.
    pub fn new(doc: &'a Document, node_id: usize) -> Self {
        AncestorTraverser {
            doc,
            current: node_id,
        }
    }
}
impl Iterator for AncestorTraverser<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let current_node = self.doc.get_node(self.current)?;
        self.current = current_node.parent?;
        Some(self.current)
    }
}

impl Document {
    /// Collect the nodes into a chain by traversing upwards
    pub fn node_chain(&self, node_id: usize) -> Vec<usize> {
        let mut chain = Vec::with_capacity(16);
        chain.push(node_id);
        chain.extend(
            AncestorTraverser::new(self, node_id).filter(|id| self.nodes[*id].is_element()),
        );
        chain
    }

    pub fn visit<F>(&self, mut visit: F)
    where
        F: FnMut(usize, &Node),
    {
        TreeTraverser::new(self).for_each(|node_id| visit(node_id, &self.nodes[node_id]));
    }

    /// Text nodes under `scope` in document order
    pub fn text_nodes_in(&self, scope: usize) -> impl Iterator<Item = &Node> + '_ {
        TreeTraverser::new_with_root(self, scope)
            .map(|id| &self.nodes[id])
            .filter(|node| node.is_text_node())
    }

    /// Element descendants of `scope` in document order, excluding `scope` itself
    pub fn elements_in(&self, scope: usize) -> impl Iterator<Item = &Node> + '_ {
        TreeTraverser::new_with_root(self, scope)
            .skip(1)
            .map(|id| &self.nodes[id])
            .filter(|node| node.is_element())
    }

    /// Nearest inclusive ancestor element accepted by `filter`
    pub fn closest_where(&self, node_id: usize, mut filter: impl FnMut(&Node) -> bool) -> Option<usize> {
        std::iter::once(node_id)
            .chain(AncestorTraverser::new(self, node_id))
            .find(|id| {
                let node = &self.nodes[*id];
                node.is_element() && filter(node)
            })
    }

    /// The element itself, or the parent element for every other node type
    pub fn element_for(&self, node_id: usize) -> Option<usize> {
        self.closest_where(node_id, |_| true)
    }

    /// Compare the document order of two nodes.
    /// Returns Ordering::Less if node_a comes before node_b in document order.
    /// Returns Ordering::Greater if node_a comes after node_b.
    /// Returns Ordering::Equal if they are the same node.
    pub fn compare_document_order(&self, node_a: usize, node_b: usize) -> Ordering {
        if node_a == node_b {
            return Ordering::Equal;
        }

        // Build ancestor chains from root to node (inclusive)
        let chain_a = self.ancestor_chain_from_root(node_a);
        let chain_b = self.ancestor_chain_from_root(node_b);

        // Find where the chains diverge
        let mut common_depth = 0;
        for (a, b) in chain_a.iter().zip(chain_b.iter()) {
            if a != b {
                break;
            }
            common_depth += 1;
        }

        // If one is an ancestor of the other
        if common_depth == chain_a.len() {
            return Ordering::Less; // node_a is ancestor of node_b
        }
        if common_depth == chain_b.len() {
            return Ordering::Greater; // node_b is ancestor of node_a
        }

        // Detached subtrees have no common ancestor. Order them by id so the result stays total.
        if common_depth == 0 {
            return chain_a[0].cmp(&chain_b[0]);
        }

        // Compare position among siblings at the divergence point
        let divergent_a = chain_a[common_depth];
        let divergent_b = chain_b[common_depth];
        let parent_id = chain_a[common_depth - 1];
        let parent = &self.nodes[parent_id];

        for &child_id in &parent.children {
            if child_id == divergent_a {
                return Ordering::Less;
            }
            if child_id == divergent_b {
                return Ordering::Greater;
            }
        }

        // Should not reach here if tree is well-formed
        Ordering::Equal
    }

    /// Build ancestor chain from root to node (inclusive), ordered [root, ..., node].
    pub(crate) fn ancestor_chain_from_root(&self, node_id: usize) -> Vec<usize> {
        let mut ancestors = Vec::with_capacity(16);
        let mut current = Some(node_id);
        while let Some(id) = current {
            ancestors.push(id);
            current = self.nodes[id].parent;
        }
        ancestors.reverse();
        ancestors
    }

    /// Check if `ancestor_id` is an ancestor of `descendant_id`
    pub fn is_ancestor_of(&self, ancestor_id: usize, descendant_id: usize) -> bool {
        let mut current = descendant_id;
        while let Some(parent) = self.nodes.get(current).and_then(|node| node.parent) {
            if parent == ancestor_id {
                return true;
            }
            current = parent;
        }
        false
    }

    pub fn is_inclusive_ancestor_of(&self, ancestor_id: usize, descendant_id: usize) -> bool {
        ancestor_id == descendant_id || self.is_ancestor_of(ancestor_id, descendant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Attribute;
    use markup5ever::{QualName, local_name, ns};

    fn element(doc: &mut Document, parent: usize, attrs: Vec<Attribute>) -> usize {
        let id = doc.create_element(QualName::new(None, ns!(html), local_name!("div")), attrs);
        doc.mutate().append_children(parent, &[id]);
        id
    }

    #[test]
    fn document_order_and_ancestry() {
        let mut doc = Document::new();
        let root = element(&mut doc, 0, vec![]);
        let a = element(&mut doc, root, vec![]);
        let a1 = element(&mut doc, a, vec![]);
        let b = element(&mut doc, root, vec![Attribute::new("class", "x")]);

        assert_eq!(doc.compare_document_order(a1, b), Ordering::Less);
        assert_eq!(doc.compare_document_order(b, a), Ordering::Greater);
        assert_eq!(doc.compare_document_order(root, a1), Ordering::Less);
        assert!(doc.is_ancestor_of(root, a1));
        assert!(!doc.is_ancestor_of(a1, a1));
        assert!(doc.is_inclusive_ancestor_of(a1, a1));

        assert_eq!(doc.node_chain(a1), vec![a1, a, root]);
        assert_eq!(
            doc.elements_in(root).map(|n| n.id).collect::<Vec<_>>(),
            vec![a, a1, b]
        );
        assert_eq!(doc.closest_where(a1, |n| n.has_class("x")), None);
        assert_eq!(doc.closest_where(b, |n| n.has_class("x")), Some(b));
    }
}
