//! Bookkeeping for the click listeners attached to highlighted elements.

use std::collections::HashMap;
use std::rc::Rc;

use smartcomment_dom::{Document, EventCallback, ListenerId};
use smartcomment_traits::comments::{CommentId, CommentRecord};
use smartcomment_traits::{DomEvent, DomRect};

/// Invoked with the click event, the comment and the bounding box of the clicked element
pub type ClickCallback = Rc<dyn Fn(&DomEvent, &CommentRecord, DomRect)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerRecord {
    pub element: usize,
    pub listener: ListenerId,
}

/// Which elements carry a click listener for which comment.
///
/// Attaching is idempotent per `(element, comment id)`. Detaching removes the listener and gives
/// the element back the `style` attribute it had before the pointer cursor was set.
#[derive(Default)]
pub struct ListenerRegistry {
    records: HashMap<CommentId, Vec<ListenerRecord>>,
    /// `style` of each element before its first listener, `None` when it had none
    saved_styles: HashMap<usize, Option<String>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self, comment_id: &CommentId, element: usize) -> bool {
        self.records
            .get(comment_id)
            .is_some_and(|records| records.iter().any(|record| record.element == element))
    }

    pub fn records_for(&self, comment_id: &CommentId) -> &[ListenerRecord] {
        self.records
            .get(comment_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of tracked listeners
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attaches a click listener unless one is already registered for this element and comment.
    /// Returns true if a listener was added.
    pub fn ensure_attached(
        &mut self,
        doc: &mut Document,
        element: usize,
        comment: Rc<CommentRecord>,
        on_click: ClickCallback,
    ) -> bool {
        if doc.get_node(element).is_none() || self.is_attached(&comment.id, element) {
            return false;
        }

        let comment_id = comment.id.clone();
        let callback: EventCallback = Rc::new(move |doc: &Document, event: &mut DomEvent| {
            let rect = doc.bounding_client_rect(event.current_target.unwrap_or(element));
            on_click(event, &comment, rect);
        });
        let listener = doc.add_event_listener(element, "click", callback);

        if !self.saved_styles.contains_key(&element) {
            let style = doc
                .get_node(element)
                .and_then(|node| node.attr("style"))
                .map(str::to_string);
            self.saved_styles.insert(element, style);
            doc.mutate().set_style_property(element, "cursor", "pointer");
        }

        self.records
            .entry(comment_id)
            .or_default()
            .push(ListenerRecord { element, listener });
        true
    }

    /// Detaches and forgets every listener of one comment. Returns how many were removed.
    pub fn clear_for_comment(&mut self, doc: &mut Document, comment_id: &CommentId) -> usize {
        let Some(records) = self.records.remove(comment_id) else {
            return 0;
        };
        self.detach(doc, &records);
        records.len()
    }

    /// Detaches and forgets every listener
    pub fn clear_all(&mut self, doc: &mut Document) -> usize {
        let records: Vec<ListenerRecord> = self.records.drain().flat_map(|(_, records)| records).collect();
        self.detach(doc, &records);
        records.len()
    }

    fn detach(&mut self, doc: &mut Document, records: &[ListenerRecord]) {
        for record in records {
            if !doc.remove_event_listener(record.listener) {
                #[cfg(feature = "tracing")]
                tracing::debug!(element = record.element, "listener was already gone");
            }
        }

        for record in records {
            let still_tracked = self
                .records
                .values()
                .flatten()
                .any(|other| other.element == record.element);
            if still_tracked {
                continue;
            }
            let Some(saved) = self.saved_styles.remove(&record.element) else {
                continue;
            };
            if doc.get_node(record.element).is_none() {
                #[cfg(feature = "tracing")]
                tracing::debug!(element = record.element, "element was dropped before its listener");
                continue;
            }
            let mut mutr = doc.mutate();
            match saved {
                Some(style) => mutr.set_attr(record.element, "style", &style),
                None => {
                    mutr.remove_attr(record.element, "style");
                }
            }
        }
    }
}
