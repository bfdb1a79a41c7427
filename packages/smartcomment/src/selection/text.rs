use smartcomment_dom::node::clamp_to_char_boundary;
use smartcomment_dom::{Boundary, Document, Range};

use super::{SelectionContext, SelectionError, SelectionKind, SelectionMetadata, SelectionResult, SelectionStrategy};
use crate::occurrence::{SpanningIndex, occurrence_index};
use crate::validate::{SelectionInput, validate};

/// Anchors a range of text by its content and occurrence index
pub struct TextSelection;

impl SelectionStrategy for TextSelection {
    type Target = Range;

    const KIND: SelectionKind = SelectionKind::Text;

    fn select(
        &self,
        cx: &SelectionContext<'_>,
        doc: &Document,
        range: Range,
    ) -> Result<SelectionResult, SelectionError> {
        cx.check_target(doc, range.start.node)?;
        cx.check_target(doc, range.end.node)?;

        validate(doc, SelectionInput::Range(range), cx.config.max_selection_length)?;

        let raw = doc.range_to_string(&range);
        let text = raw.trim();
        let leading = raw.len() - raw.trim_start().len();

        let single_node = range.start.node == range.end.node
            && doc.get_node(range.start.node).is_some_and(|node| node.is_text_node());

        let index = if single_node {
            let offset = doc
                .get_node(range.start.node)
                .and_then(|node| node.text_data())
                .map(|data| clamp_to_char_boundary(&data.content, range.start.offset))
                .unwrap_or(range.start.offset);
            occurrence_index(doc, cx.scope, text, range.start.node, offset + leading)
        } else {
            let index = SpanningIndex::new(doc, cx.scope);
            first_text_boundary(doc, range)
                .and_then(|start| index.global_offset(start))
                .and_then(|offset| index.occurrence_index(text, offset + leading))
        };
        let index = index.ok_or(SelectionError::NotFound)?;

        let element = doc.element_for(range.start.node);
        let rect = element
            .map(|el| doc.bounding_client_rect(el))
            .unwrap_or_default();

        Ok(SelectionResult {
            kind: SelectionKind::Text,
            text: text.to_string(),
            index,
            element,
            image: None,
            rect,
            pointer: None,
            metadata: SelectionMetadata::Text {
                spans_nodes: !single_node,
            },
        })
    }
}

/// The range start as a position inside a text node. Element boundaries move to the start of the
/// first text node at or after them.
fn first_text_boundary(doc: &Document, range: Range) -> Option<Boundary> {
    let container = doc.get_node(range.start.node)?;
    if container.is_text_node() {
        return Some(range.start);
    }
    let child = *container.children.get(range.start.offset)?;
    doc.text_nodes_in(child)
        .next()
        .map(|node| Boundary::new(node.id, 0))
}
