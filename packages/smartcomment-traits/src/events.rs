#[derive(Debug, Clone)]
pub struct DomEvent {
    pub target: usize,
    /// Which is true if the event bubbles up through the DOM tree.
    pub bubbles: bool,
    /// which is true if the event can be canceled.
    pub cancelable: bool,
    pub current_target: Option<usize>,
    /// Where true indicates that the default user agent action was prevented,
    /// and false indicates that it was not.
    pub default_prevented: bool,

    pub stop_propagation: bool,
    pub data: DomEventData,
}

impl DomEvent {
    pub fn new(target: usize, data: DomEventData) -> Self {
        let mut cancelable = true;
        let mut bubbles = true;

        match data.name() {
            "selectionchange" => {
                cancelable = false;
            }
            "focus" | "blur" => {
                cancelable = false;
                bubbles = false;
            }
            _ => {}
        }

        Self {
            target,
            bubbles,
            cancelable,
            current_target: None,
            default_prevented: false,

            stop_propagation: false,
            data,
        }
    }

    /// A primary-button click at the given page coordinates
    pub fn click(target: usize, x: f32, y: f32) -> Self {
        Self::new(target, DomEventData::Click(MouseEvent { x, y, button: 0 }))
    }

    pub fn prevent_default(&mut self) {
        if !self.cancelable {
            return;
        }
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.stop_propagation = true;
    }

    /// Returns the name of the event ("click", "mouseup", "selectionchange", etc)
    pub fn name(&self) -> &'static str {
        self.data.name()
    }

    /// Pointer position for mouse events
    pub fn pointer(&self) -> Option<(f32, f32)> {
        match &self.data {
            DomEventData::MouseDown(event)
            | DomEventData::MouseUp(event)
            | DomEventData::Click(event) => Some((event.x, event.y)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DomEventData {
    MouseDown(MouseEvent),
    MouseUp(MouseEvent),
    Click(MouseEvent),
    Focus,
    Blur,
    SelectionChange,
    /// A string containing the type of Event.
    Event(&'static str),
}

impl DomEventData {
    pub fn name(&self) -> &'static str {
        match self {
            DomEventData::MouseDown { .. } => "mousedown",
            DomEventData::MouseUp { .. } => "mouseup",
            DomEventData::Click { .. } => "click",
            DomEventData::Focus => "focus",
            DomEventData::Blur => "blur",
            DomEventData::SelectionChange => "selectionchange",
            DomEventData::Event(event_type) => event_type,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MouseEvent {
    pub x: f32,
    pub y: f32,
    /// `0` for the primary button
    pub button: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_does_not_bubble() {
        let event = DomEvent::new(3, DomEventData::Focus);
        assert!(!event.bubbles);
        assert!(!event.cancelable);
        assert_eq!(event.name(), "focus");
    }

    #[test]
    fn prevent_default_respects_cancelable() {
        let mut event = DomEvent::new(1, DomEventData::SelectionChange);
        event.prevent_default();
        assert!(!event.default_prevented);

        let mut click = DomEvent::click(1, 4.0, 5.0);
        click.prevent_default();
        assert!(click.default_prevented);
        assert_eq!(click.pointer(), Some((4.0, 5.0)));
    }
}
