//! Geometry for a document that has no layout engine.
//!
//! Embedders that lay the page out push border boxes in with [`Document::set_layout_rect`].
//! Otherwise boxes are derived from geometry attributes (`x`/`y`/`width`/`height`, circles and
//! ellipses) and finally from the union of the children's boxes.

use smartcomment_traits::DomRect;

use crate::Document;

impl Document {
    pub fn set_layout_rect(&mut self, node_id: usize, rect: DomRect) {
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.layout_rect = Some(rect);
        }
    }

    /// Best known page-space box of a node. Unknown geometry yields [`DomRect::ZERO`].
    pub fn bounding_client_rect(&self, node_id: usize) -> DomRect {
        let Some(node) = self.get_node(node_id) else {
            return DomRect::ZERO;
        };
        if let Some(rect) = node.layout_rect {
            return rect;
        }
        if let Some(rect) = self.attribute_rect(node_id) {
            return rect;
        }
        node.children
            .iter()
            .map(|child| self.bounding_client_rect(*child))
            .fold(DomRect::ZERO, |acc, rect| acc.union(&rect))
    }

    fn attribute_rect(&self, node_id: usize) -> Option<DomRect> {
        let el = self.nodes[node_id].element_data()?;
        let num = |name: &str| el.attr_parsed::<f32>(name);

        if let (Some(width), Some(height)) = (num("width"), num("height")) {
            return Some(DomRect::new(
                num("x").unwrap_or(0.0),
                num("y").unwrap_or(0.0),
                width,
                height,
            ));
        }

        let (cx, cy) = (num("cx")?, num("cy")?);
        let (rx, ry) = match num("r") {
            Some(r) => (r, r),
            None => (num("rx")?, num("ry")?),
        };
        Some(DomRect::new(cx - rx, cy - ry, rx * 2.0, ry * 2.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_from_attributes_and_children() {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let g = m.create_html_element("g", &[]);
        let rect = m.create_html_element("rect", &[("x", "10"), ("y", "20"), ("width", "30px"), ("height", "40")]);
        let circle = m.create_html_element("circle", &[("cx", "100"), ("cy", "100"), ("r", "5")]);
        m.append_children(0, &[g]);
        m.append_children(g, &[rect, circle]);
        drop(m);

        assert_eq!(doc.bounding_client_rect(rect), DomRect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(doc.bounding_client_rect(circle), DomRect::new(95.0, 95.0, 10.0, 10.0));
        assert_eq!(doc.bounding_client_rect(g), DomRect::new(10.0, 20.0, 95.0, 85.0));

        doc.set_layout_rect(g, DomRect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(doc.bounding_client_rect(g), DomRect::new(1.0, 2.0, 3.0, 4.0));
    }
}
