pub mod comments;

pub mod shell;

mod events;
pub use events::{DomEvent, DomEventData, MouseEvent};

mod geometry;
pub use geometry::DomRect;
