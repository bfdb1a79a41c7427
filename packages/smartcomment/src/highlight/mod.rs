//! Marking anchors in the live document.
//!
//! Applying an anchor resolves its position to elements (wrapping matched text in new spans
//! first), tags them with the comment's highlight class and `data-comment-id`, and attaches a
//! click listener. Removing it reverses all of that, unwrapping the spans again so repeated
//! apply/remove cycles leave the content as it was.
//!
//! A miss never stops a batch: it is logged and reported in the [`ApplyReport`].

mod element;
mod svg;
mod text;

use std::collections::HashSet;
use std::rc::Rc;

use smartcomment_dom::Document;
use smartcomment_traits::comments::{CommentId, CommentRecord};

use crate::listeners::{ClickCallback, ListenerRegistry};
use crate::position::{PositionDescriptor, decode_opt};
use crate::{COMMENT_ID_ATTR, HIGHLIGHT_CLASS_PREFIX, SVG_ID_ATTR, highlight_class};

/// A comment together with its decoded position
#[derive(Debug, Clone)]
pub struct HighlightAnchor {
    pub position: PositionDescriptor,
    pub comment: Rc<CommentRecord>,
}

impl HighlightAnchor {
    pub fn new(position: PositionDescriptor, comment: impl Into<Rc<CommentRecord>>) -> Self {
        Self {
            position,
            comment: comment.into(),
        }
    }

    /// `None` when the comment has no usable position
    pub fn from_record(comment: impl Into<Rc<CommentRecord>>) -> Option<Self> {
        let comment = comment.into();
        let position = decode_opt(comment.pos.as_deref())?;
        Some(Self { position, comment })
    }

    pub fn comment_id(&self) -> &CommentId {
        &self.comment.id
    }
}

/// What a highlight turned out to be when it was removed by comment id alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    Text,
    Svg,
    Selector,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Anchors tagged by this call
    pub applied: usize,
    /// Anchors that were tagged before this call
    pub already_applied: usize,
    /// Anchors that resolved to nothing
    pub missed: Vec<CommentId>,
}

pub struct HighlightEngine {
    registry: ListenerRegistry,
    dynamic_block_html_limit: usize,
    /// Elements whose `data-svg-id` was set by this engine rather than by the page
    added_svg_ids: HashSet<usize>,
}

impl HighlightEngine {
    pub fn new(dynamic_block_html_limit: usize) -> Self {
        Self {
            registry: ListenerRegistry::new(),
            dynamic_block_html_limit,
            added_svg_ids: HashSet::new(),
        }
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// Tags every anchor that resolves inside `scope`.
    ///
    /// Anchors whose class is already present only get their listeners re-ensured, so applying the
    /// same list twice changes nothing. Selector anchors go first: they may be keyed by the markup
    /// of a block that other highlights would alter.
    pub fn apply(
        &mut self,
        doc: &mut Document,
        scope: usize,
        anchors: &[HighlightAnchor],
        on_click: &ClickCallback,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        if doc.get_node(scope).is_none() {
            #[cfg(feature = "tracing")]
            tracing::warn!(scope, "highlight scope is not in the document");
            report.missed = anchors.iter().map(|anchor| anchor.comment_id().clone()).collect();
            return report;
        }

        let (selectors, others): (Vec<&HighlightAnchor>, Vec<&HighlightAnchor>) = anchors
            .iter()
            .partition(|anchor| matches!(anchor.position, PositionDescriptor::Selector { .. }));

        for anchor in selectors.into_iter().chain(others) {
            self.apply_one(doc, scope, anchor, on_click, &mut report);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            applied = report.applied,
            already_applied = report.already_applied,
            missed = report.missed.len(),
            "applied highlights"
        );

        report
    }

    fn apply_one(
        &mut self,
        doc: &mut Document,
        scope: usize,
        anchor: &HighlightAnchor,
        on_click: &ClickCallback,
        report: &mut ApplyReport,
    ) {
        let id = anchor.comment_id();
        let class = highlight_class(id);

        let existing = tagged_elements(doc, scope, &class);
        if !existing.is_empty() {
            for element in existing {
                self.registry
                    .ensure_attached(doc, element, anchor.comment.clone(), on_click.clone());
            }
            report.already_applied += 1;
            return;
        }

        let elements = match &anchor.position {
            PositionDescriptor::Text { text, index } => {
                text::wrap_occurrence(doc, scope, text, *index, &class, id.as_str())
            }
            PositionDescriptor::Image { hash } => {
                let found = element::resolve_image(doc, scope, hash);
                self.tag(doc, &found, &class, id, None);
                found
            }
            PositionDescriptor::Svg { id: svg_id } => {
                let found = svg::resolve_svg(doc, scope, svg_id);
                self.tag(doc, &found, &class, id, Some(svg_id.as_str()));
                found
            }
            PositionDescriptor::Selector { selector } => {
                let found =
                    element::resolve_selector(doc, scope, selector, self.dynamic_block_html_limit);
                self.tag(doc, &found, &class, id, None);
                found
            }
        };

        if elements.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::warn!(comment = %id, position = %anchor.position, "anchor did not resolve");
            report.missed.push(id.clone());
            return;
        }

        for element in elements {
            self.registry
                .ensure_attached(doc, element, anchor.comment.clone(), on_click.clone());
        }
        report.applied += 1;
    }

    fn tag(
        &mut self,
        doc: &mut Document,
        elements: &[usize],
        class: &str,
        comment_id: &CommentId,
        svg_id: Option<&str>,
    ) {
        let mut mutr = doc.mutate();
        for &element in elements {
            mutr.add_class(element, class);
            mutr.set_attr(element, COMMENT_ID_ATTR, comment_id.as_str());
            if let Some(svg_id) = svg_id {
                let has_id = mutr
                    .doc
                    .get_node(element)
                    .is_some_and(|node| node.has_attr(SVG_ID_ATTR));
                if !has_id {
                    mutr.set_attr(element, SVG_ID_ATTR, svg_id);
                    self.added_svg_ids.insert(element);
                }
            }
        }
    }

    /// Removes the highlights of the given anchors
    pub fn remove(&mut self, doc: &mut Document, scope: usize, anchors: &[HighlightAnchor]) {
        for anchor in anchors {
            self.strip_comment(doc, scope, anchor.comment_id());
        }
    }

    /// Detaches every listener and strips every highlight under `scope`, whichever comment it
    /// belongs to
    pub fn remove_all(&mut self, doc: &mut Document, scope: usize) {
        self.registry.clear_all(doc);

        let tagged: Vec<usize> = doc
            .elements_in(scope)
            .filter(|node| node.has_attr(COMMENT_ID_ATTR) || highlight_classes(node).next().is_some())
            .map(|node| node.id)
            .collect();
        for element in tagged {
            self.untag(doc, element, None);
        }

        self.added_svg_ids
            .retain(|element| doc.get_node(*element).is_some_and(|node| node.has_attr(SVG_ID_ATTR)));
    }

    /// Removes one comment's highlight knowing only its id. Returns what kind of highlight it was,
    /// or `None` if nothing was tagged for it.
    pub fn remove_one(
        &mut self,
        doc: &mut Document,
        comment_id: &CommentId,
        scope: Option<usize>,
    ) -> Option<AnchorKind> {
        let scope = scope.unwrap_or_else(|| doc.root_node().id);
        let class = highlight_class(comment_id);
        let kind = tagged_elements(doc, scope, &class)
            .first()
            .map(|element| anchor_kind(doc, *element));

        let _untagged = self.strip_comment(doc, scope, comment_id);
        #[cfg(feature = "tracing")]
        tracing::debug!(comment = %comment_id, ?kind, untagged = _untagged, "removed highlight");
        kind
    }

    fn strip_comment(&mut self, doc: &mut Document, scope: usize, comment_id: &CommentId) -> usize {
        self.registry.clear_for_comment(doc, comment_id);
        let class = highlight_class(comment_id);
        let tagged = tagged_elements(doc, scope, &class);
        for &element in &tagged {
            self.untag(doc, element, Some(&class));
        }
        tagged.len()
    }

    /// Removes `class` (or every highlight class) from an element. Once no highlight class is
    /// left the comment attributes go too, and a marker span that carries nothing else is
    /// replaced by its text.
    fn untag(&mut self, doc: &mut Document, element: usize, class: Option<&str>) {
        let Some(node) = doc.get_node(element) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(element, "highlighted element is gone");
            return;
        };

        let to_remove: Vec<String> = match class {
            Some(class) => vec![class.to_string()],
            None => highlight_classes(node).map(str::to_string).collect(),
        };
        let keeps_marker = highlight_classes(node).any(|c| !to_remove.iter().any(|r| r == c));

        let mut mutr = doc.mutate();
        for class in &to_remove {
            mutr.remove_class(element, class);
        }
        if !keeps_marker {
            mutr.remove_attr(element, COMMENT_ID_ATTR);
            if self.added_svg_ids.remove(&element) {
                mutr.remove_attr(element, SVG_ID_ATTR);
            }
        }
        drop(mutr);

        let inert_span = doc.get_node(element).is_some_and(|node| {
            node.data.is_element_with_tag_name("span")
                && node.attrs().is_some_and(|attrs| attrs.is_empty())
                && node.children.iter().all(|child| !node.with(*child).is_element())
        });
        if inert_span {
            doc.mutate().unwrap_element(element);
        }
    }
}

impl Default for HighlightEngine {
    fn default() -> Self {
        Self::new(crate::AnnotatorConfig::default().dynamic_block_html_limit)
    }
}

fn highlight_classes(node: &smartcomment_dom::Node) -> impl Iterator<Item = &str> {
    node.element_data()
        .into_iter()
        .flat_map(|el| el.classes())
        .filter(|class| class.starts_with(HIGHLIGHT_CLASS_PREFIX))
}

fn tagged_elements(doc: &Document, scope: usize, class: &str) -> Vec<usize> {
    doc.elements_in(scope)
        .filter(|node| node.has_class(class))
        .map(|node| node.id)
        .collect()
}

/// Text markers are spans with a comment id, SVG highlights carry an svg id or live in an svg
fn anchor_kind(doc: &Document, element: usize) -> AnchorKind {
    let Some(node) = doc.get_node(element) else {
        return AnchorKind::Selector;
    };
    if node.data.is_element_with_tag_name("span") && node.has_attr(COMMENT_ID_ATTR) {
        AnchorKind::Text
    } else if node.has_attr(SVG_ID_ATTR) || node.element_data().is_some_and(|el| el.is_svg()) {
        AnchorKind::Svg
    } else {
        AnchorKind::Selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartcomment_traits::{DomEvent, DomRect};

    fn paragraph(text: &str) -> (Document, usize) {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let p = m.create_html_element("p", &[]);
        let t = m.create_text_node(text);
        m.append_children(0, &[p]);
        m.append_children(p, &[t]);
        drop(m);
        (doc, p)
    }

    fn noop() -> ClickCallback {
        Rc::new(|_: &DomEvent, _: &CommentRecord, _: DomRect| {})
    }

    #[test]
    fn from_record_skips_missing_positions() {
        assert!(HighlightAnchor::from_record(CommentRecord::new(1, "")).is_none());
        let mut record = CommentRecord::new(2, "x");
        record.pos = None;
        assert!(HighlightAnchor::from_record(record).is_none());
        let anchor = HighlightAnchor::from_record(CommentRecord::new(3, "a|1")).unwrap();
        assert_eq!(anchor.position, PositionDescriptor::Text { text: "a".into(), index: 1 });
    }

    #[test]
    fn overlapping_comments_share_nothing_on_removal() {
        let (mut doc, p) = paragraph("one two three");
        let anchors = [
            HighlightAnchor::from_record(CommentRecord::new(1, "two|0")).unwrap(),
            HighlightAnchor::from_record(CommentRecord::new(2, "three|0")).unwrap(),
        ];
        let mut engine = HighlightEngine::default();
        let report = engine.apply(&mut doc, p, &anchors, &noop());
        assert_eq!(report.applied, 2);
        assert_eq!(engine.registry().len(), 2);

        assert_eq!(
            engine.remove_one(&mut doc, &CommentId::from(1), Some(p)),
            Some(AnchorKind::Text)
        );
        assert_eq!(engine.remove_one(&mut doc, &CommentId::from(1), Some(p)), None);
        let html = doc.get_node(p).unwrap().inner_html();
        assert_eq!(
            html,
            r#"one two <span class="smartcomment-hl-2" data-comment-id="2" style="cursor: pointer;">three</span>"#
        );

        engine.remove_all(&mut doc, p);
        let node = doc.get_node(p).unwrap();
        assert_eq!(node.inner_html(), "one two three");
        assert_eq!(node.children.len(), 1);
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn bad_selectors_are_misses() {
        let (mut doc, p) = paragraph("text");
        let anchors = [HighlightAnchor::from_record(CommentRecord::new(9, "div[[")).unwrap()];
        let mut engine = HighlightEngine::default();
        let report = engine.apply(&mut doc, p, &anchors, &noop());
        assert_eq!(report.missed, vec![CommentId::from(9)]);
    }
}
