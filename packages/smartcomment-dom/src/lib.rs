//! The headless DOM that smartcomment anchors comments into
//!
//! This crate implements a small mutable DOM ([`Document`]) which is designed to be filled by a
//! parser and "driven" by external code. Most users will want to use a wrapper:
//!
//!  - `HtmlDocument` from the `smartcomment-html` crate parses an HTML page into a [`Document`].
//!  - `Annotator` from the `smartcomment` crate anchors, highlights and resolves comments on it.
//!
//! It includes: a DOM tree representation, a mutation API ([`DocumentMutator`]), live ranges,
//! CSS selector queries, event listeners with bubbling dispatch and a minimal geometry model.
//!
//! ## Feature flags
//!  - `default`: Enables the features listed below.
//!  - `tracing`: Enables tracing support.

/// The DOM implementation.
///
/// This is the primary entry point for this crate.
mod document;

/// The nodes themselves, and their data.
pub mod node;

mod events;
/// Bounding boxes without a layout engine.
mod layout;
mod mutator;
mod query_selector;
mod range;
mod traversal;

pub use document::Document;
pub use events::{EventCallback, EventListener, ListenerId};
pub use markup5ever::{LocalName, Namespace, Prefix, QualName, local_name, ns};
pub use mutator::{AppendTextErr, DocumentMutator};
pub use node::{Attribute, Attributes, ElementData, Node, NodeData, TextNodeData};
pub use query_selector::{SelectorError, SelectorList, attribute_selector, parse_selector};
pub use range::{Boundary, Range};
pub use traversal::{AncestorTraverser, TreeTraverser};
