use crate::events::EventListener;
use crate::node::{ElementData, NodeData, TextNodeData};
use crate::{DocumentMutator, ListenerId, Node};
use markup5ever::QualName;
use slab::Slab;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct Document {
    /// ID of the document
    id: usize,

    /// A slab-backed tree of nodes
    ///
    /// We pin the tree to a guarantee to the nodes it creates that the tree is stable in memory.
    /// There is no way to create the tree - publicly or privately - that would invalidate that invariant.
    pub(crate) nodes: Box<Slab<Node>>,

    /// Map of node ID's for fast lookups
    pub(crate) nodes_to_id: HashMap<String, usize>,

    /// Registered event listeners, in registration order
    pub(crate) listeners: BTreeMap<ListenerId, EventListener>,
    pub(crate) next_listener_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a new (empty) [`Document`] holding only the document node
    pub fn new() -> Self {
        static ID_GENERATOR: AtomicUsize = AtomicUsize::new(1);

        let id = ID_GENERATOR.fetch_add(1, Ordering::SeqCst);

        let mut doc = Self {
            id,
            nodes: Box::new(Slab::new()),
            nodes_to_id: HashMap::new(),
            listeners: BTreeMap::new(),
            next_listener_id: 1,
        };

        // Initialise document with root Document node
        doc.create_node(NodeData::Document);

        doc
    }

    pub fn tree(&self) -> &Slab<Node> {
        &self.nodes
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn get_node(&self, node_id: usize) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn mutate<'doc>(&'doc mut self) -> DocumentMutator<'doc> {
        DocumentMutator::new(self)
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn try_root_element(&self) -> Option<&Node> {
        self.root_node()
            .children
            .iter()
            .map(|id| &self.nodes[*id])
            .find(|node| node.is_element())
    }

    /// The `<body>` element, falling back to the root element
    pub fn body(&self) -> Option<&Node> {
        let root = self.try_root_element()?;
        let body = root
            .children
            .iter()
            .map(|id| &self.nodes[*id])
            .find(|node| node.data.is_element_with_tag_name("body"));
        Some(body.unwrap_or(root))
    }

    pub fn create_node(&mut self, node_data: NodeData) -> usize {
        let slab_ptr = self.nodes.as_mut() as *mut Slab<Node>;

        let entry = self.nodes.vacant_entry();
        let id = entry.key();
        entry.insert(Node::new(slab_ptr, id, node_data));

        id
    }

    pub fn create_text_node(&mut self, text: &str) -> usize {
        let content = text.to_string();
        let data = NodeData::Text(TextNodeData::new(content));
        self.create_node(data)
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<crate::Attribute>) -> usize {
        let data = ElementData::new(name, attrs);
        let id_attr = data.id.clone();

        let id = self.create_node(NodeData::Element(data));

        // If the node has an "id" attribute, store it in the ID map.
        if let Some(id_attr) = id_attr {
            self.nodes_to_id.insert(id_attr, id);
        }

        id
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<usize> {
        self.nodes_to_id
            .get(id)
            .copied()
            .filter(|node_id| self.nodes.contains(*node_id))
    }

    /// Removes a node and its whole subtree from the slab, along with their listeners.
    pub(crate) fn remove_and_drop_node(&mut self, node_id: usize) -> Option<Node> {
        fn remove_ignoring_parent(doc: &mut Document, node_id: usize) -> Option<Node> {
            let node = doc.nodes.try_remove(node_id);
            if let Some(node) = &node {
                doc.listeners.retain(|_, listener| listener.node != node_id);
                if let Some(id_attr) = node.element_data().and_then(|el| el.id.as_ref()) {
                    if doc.nodes_to_id.get(id_attr) == Some(&node_id) {
                        doc.nodes_to_id.remove(id_attr);
                    }
                }
                for &child in &node.children {
                    remove_ignoring_parent(doc, child);
                }
            }
            node
        }

        let node = remove_ignoring_parent(self, node_id);

        // Update child_idx values
        if let Some(parent_id) = node.as_ref().and_then(|node| node.parent) {
            if let Some(parent) = self.nodes.get_mut(parent_id) {
                parent.children.retain(|id| *id != node_id);
            }
        }

        node
    }

}

impl AsRef<Document> for Document {
    fn as_ref(&self) -> &Document {
        self
    }
}

impl AsMut<Document> for Document {
    fn as_mut(&mut self) -> &mut Document {
        self
    }
}
