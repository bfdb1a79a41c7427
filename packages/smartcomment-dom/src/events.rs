//! Event listeners and dispatch.
//!
//! Listeners are keyed by a [`ListenerId`] so that callers can detach exactly the listener they
//! attached. Dispatch walks the element chain from the target upwards (bubbling) and stops early
//! when a listener calls [`DomEvent::stop_propagation`].

use std::rc::Rc;

use smartcomment_traits::{DomEvent, DomEventData};

use crate::Document;

/// Handle to a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

pub type EventCallback = Rc<dyn Fn(&Document, &mut DomEvent)>;

#[derive(Clone)]
pub struct EventListener {
    pub node: usize,
    pub name: String,
    pub callback: EventCallback,
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("node", &self.node)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Document {
    pub fn add_event_listener(
        &mut self,
        node_id: usize,
        name: &str,
        callback: EventCallback,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.insert(
            id,
            EventListener {
                node: node_id,
                name: name.to_string(),
                callback,
            },
        );
        id
    }

    /// Returns false if no such listener was registered
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn has_event_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    /// Listeners registered on `node_id`, in registration order
    pub fn listeners_for(&self, node_id: usize) -> impl Iterator<Item = (ListenerId, &EventListener)> {
        self.listeners
            .iter()
            .filter(move |(_, listener)| listener.node == node_id)
            .map(|(id, listener)| (*id, listener))
    }

    /// Runs the listeners of the target and, for bubbling events, of every ancestor element.
    ///
    /// Returns the event so that callers can inspect `default_prevented`.
    pub fn dispatch_event(&self, mut event: DomEvent) -> DomEvent {
        let chain = if event.bubbles {
            self.node_chain(event.target)
        } else {
            vec![event.target]
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(node = event.target, name = event.name(), "dispatching event");

        for node_id in chain {
            event.current_target = Some(node_id);

            let callbacks: Vec<EventCallback> = self
                .listeners_for(node_id)
                .filter(|(_, listener)| listener.name == event.name())
                .map(|(_, listener)| listener.callback.clone())
                .collect();
            for callback in callbacks {
                callback(self, &mut event);
            }

            if event.stop_propagation {
                break;
            }
        }

        event.current_target = None;
        event
    }

    /// Dispatches a primary-button click at the centre of the node's bounding box
    pub fn click(&self, node_id: usize) -> DomEvent {
        let (x, y) = self.bounding_client_rect(node_id).center();
        self.dispatch_event(DomEvent::click(node_id, x, y))
    }

    pub fn dispatch(&self, node_id: usize, data: DomEventData) -> DomEvent {
        self.dispatch_event(DomEvent::new(node_id, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn click_bubbles_until_stopped() {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let outer = m.create_html_element("div", &[]);
        let inner = m.create_html_element("span", &[]);
        let text = m.create_text_node("x");
        m.append_children(0, &[outer]);
        m.append_children(outer, &[inner]);
        m.append_children(inner, &[text]);
        drop(m);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        doc.add_event_listener(
            inner,
            "click",
            Rc::new(move |_: &Document, event: &mut DomEvent| log.borrow_mut().push(("inner", event.current_target))),
        );
        let log = seen.clone();
        let outer_listener = doc.add_event_listener(
            outer,
            "click",
            Rc::new(move |_: &Document, event: &mut DomEvent| log.borrow_mut().push(("outer", event.current_target))),
        );

        doc.click(text);
        assert_eq!(
            *seen.borrow(),
            vec![("inner", Some(inner)), ("outer", Some(outer))]
        );

        assert!(doc.remove_event_listener(outer_listener));
        assert!(!doc.remove_event_listener(outer_listener));
        seen.borrow_mut().clear();

        let log = seen.clone();
        doc.add_event_listener(
            inner,
            "click",
            Rc::new(move |_: &Document, event: &mut DomEvent| {
                log.borrow_mut().push(("stopper", None));
                event.stop_propagation();
            }),
        );
        let log = seen.clone();
        doc.add_event_listener(
            outer,
            "click",
            Rc::new(move |_: &Document, _: &mut DomEvent| log.borrow_mut().push(("outer", None))),
        );
        doc.click(inner);
        assert_eq!(
            *seen.borrow(),
            vec![("inner", Some(inner)), ("stopper", None)]
        );
    }

    #[test]
    fn listeners_are_dropped_with_their_node() {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let span = m.create_html_element("span", &[]);
        m.append_children(0, &[span]);
        drop(m);

        let id = doc.add_event_listener(span, "click", Rc::new(|_: &Document, _: &mut DomEvent| {}));
        assert_eq!(doc.listeners_for(span).count(), 1);
        doc.mutate().remove_and_drop_node(span);
        assert!(!doc.has_event_listener(id));
    }
}
