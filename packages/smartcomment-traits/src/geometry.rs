use serde::{Deserialize, Serialize};

/// An axis-aligned box in page coordinates, shaped like the DOM's `DOMRect`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DomRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DomRect {
    pub const ZERO: DomRect = DomRect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }

    /// Smallest rect containing both. Empty rects are ignored.
    pub fn union(&self, other: &DomRect) -> DomRect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        DomRect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[test]
fn union_ignores_empty_rects() {
    let a = DomRect::new(10.0, 10.0, 5.0, 5.0);
    let b = DomRect::new(0.0, 20.0, 2.0, 2.0);
    assert_eq!(a.union(&DomRect::ZERO), a);
    assert_eq!(DomRect::ZERO.union(&a), a);
    assert_eq!(a.union(&b), DomRect::new(0.0, 10.0, 15.0, 12.0));
}
