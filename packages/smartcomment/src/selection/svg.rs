//! SVG links and the ids generated for them.
//!
//! An SVG link has no stable identity across renders, so its id is derived from its content. In
//! priority order:
//!
//!  1. `svg-href-<segment>`: the last path segment of the link's `href` (or `xlink:href`)
//!  2. `svg-text-<slug>-<left>-<top>`: a slug of its visible text plus its rounded position
//!  3. `svg-struct-<hash>`: a hash of tag name, bounding box and child count
//!
//! Changing this order changes which elements stored anchors resolve to.

use serde::Serialize;
use smartcomment_dom::{Document, local_name};

use super::{SelectionContext, SelectionError, SelectionKind, SelectionMetadata, SelectionResult, SelectionStrategy};
use crate::validate::{SelectionInput, validate};
use crate::{SVG_ID_ATTR, string_hash};

const SLUG_MAX_LEN: usize = 40;

/// Details stored with an SVG selection for later re-matching
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SvgMetadata {
    pub svg_id: String,
    pub href: Option<String>,
    pub text: String,
    /// Tag of the first shape in the link
    pub shape: Option<String>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Anchors an SVG element through the link that encloses it
pub struct SvgSelection;

impl SelectionStrategy for SvgSelection {
    type Target = usize;

    const KIND: SelectionKind = SelectionKind::Svg;

    fn select(
        &self,
        cx: &SelectionContext<'_>,
        doc: &Document,
        target: usize,
    ) -> Result<SelectionResult, SelectionError> {
        cx.check_target(doc, target)?;

        let link = svg_link_for(doc, target).ok_or(SelectionError::Unsupported(
            "only linked svg elements can be selected",
        ))?;

        validate(doc, SelectionInput::Element(link), cx.config.max_selection_length)?;

        let node = doc.get_node(link).ok_or(SelectionError::NotFound)?;
        let svg_id = node
            .attr(SVG_ID_ATTR)
            .map(str::to_string)
            .unwrap_or_else(|| generate_svg_id(doc, link));
        let rect = doc.bounding_client_rect(link);

        let shape = doc
            .elements_in(link)
            .find(|el| {
                matches!(
                    el.local_name(),
                    Some("rect" | "circle" | "ellipse" | "path" | "polygon" | "polyline" | "line")
                )
            });

        let metadata = SvgMetadata {
            svg_id: svg_id.clone(),
            href: node.attr("href").map(str::to_string),
            text: visible_text(doc, link),
            shape: shape.and_then(|el| el.local_name()).map(str::to_string),
            fill: shape.and_then(|el| el.attr("fill")).map(str::to_string),
            stroke: shape.and_then(|el| el.attr("stroke")).map(str::to_string),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        };

        Ok(SelectionResult {
            kind: SelectionKind::Svg,
            text: format!("svg[{svg_id}]"),
            index: 0,
            element: Some(link),
            image: None,
            rect,
            pointer: None,
            metadata: SelectionMetadata::Svg(metadata),
        })
    }
}

/// The `<a>` enclosing `node_id` inside an `<svg>`
pub(crate) fn svg_link_for(doc: &Document, node_id: usize) -> Option<usize> {
    let svg = doc.closest_where(node_id, |node| is_svg_root(doc, node.id))?;
    let link = doc.closest_where(node_id, |node| is_svg_link(doc, node.id))?;
    doc.is_ancestor_of(svg, link).then_some(link)
}

fn is_svg_root(doc: &Document, node_id: usize) -> bool {
    doc.get_node(node_id)
        .and_then(|node| node.element_data())
        .is_some_and(|el| el.is_svg() && el.name.local == local_name!("svg"))
}

pub(crate) fn is_svg_link(doc: &Document, node_id: usize) -> bool {
    doc.get_node(node_id)
        .and_then(|node| node.element_data())
        .is_some_and(|el| el.is_svg() && el.name.local == local_name!("a"))
}

/// Generates the id of an SVG link from its current content, ignoring any stored `data-svg-id`
pub fn generate_svg_id(doc: &Document, link: usize) -> String {
    let Some(node) = doc.get_node(link) else {
        return String::new();
    };

    if let Some(segment) = node
        .attr("href")
        .and_then(last_path_segment)
        .filter(|segment| !segment.is_empty())
    {
        return format!("svg-href-{segment}");
    }

    let rect = doc.bounding_client_rect(link);

    let slug = slugify(&visible_text(doc, link));
    if !slug.is_empty() {
        return format!(
            "svg-text-{slug}-{}-{}",
            rect.left().round() as i64,
            rect.top().round() as i64
        );
    }

    let element_children = node
        .children
        .iter()
        .filter(|child| node.with(**child).is_element())
        .count();
    let structure = format!(
        "{}|{}|{}|{}|{}|{element_children}",
        node.local_name().unwrap_or_default(),
        rect.x.round() as i64,
        rect.y.round() as i64,
        rect.width.round() as i64,
        rect.height.round() as i64,
    );
    format!("svg-struct-{}", string_hash(&structure))
}

/// `/wiki/File:Chart.svg?x=1#top` gives `File:Chart.svg`. A bare fragment gives the fragment.
pub fn last_path_segment(href: &str) -> Option<&str> {
    let (path, fragment) = match href.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (href, None),
    };
    let path = path.split('?').next().unwrap_or_default();
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    if segment.is_empty() {
        fragment.filter(|fragment| !fragment.is_empty())
    } else {
        Some(segment)
    }
}

/// Text of the `<text>`, `<tspan>` and `<title>` elements under `node_id`, whitespace collapsed
pub fn visible_text(doc: &Document, node_id: usize) -> String {
    let mut words: Vec<&str> = Vec::new();
    for node in doc.text_nodes_in(node_id) {
        let in_text_element = node
            .parent_node()
            .and_then(|parent| parent.local_name())
            .is_some_and(|name| matches!(name, "text" | "tspan" | "title"));
        if let (true, Some(data)) = (in_text_element, node.text_data()) {
            words.extend(data.content.split_whitespace());
        }
    }
    words.join(" ")
}

/// Lowercase alphanumeric runs joined by `-`, at most 40 characters
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.extend(word.chars().flat_map(char::to_lowercase));
    }
    let truncated: String = slug.chars().take(SLUG_MAX_LEN).collect();
    truncated.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_segments() {
        assert_eq!(last_path_segment("/wiki/Foo"), Some("Foo"));
        assert_eq!(last_path_segment("https://w.org/wiki/Foo/?a=b#c"), Some("Foo"));
        assert_eq!(last_path_segment("#Section_2"), Some("Section_2"));
        assert_eq!(last_path_segment(""), None);
    }

    #[test]
    fn slugs() {
        assert_eq!(slugify("Revenue"), "revenue");
        assert_eq!(slugify("  Q3 Revenue (EUR) "), "q3-revenue-eur");
        assert_eq!(slugify("--"), "");
        let long = slugify(&"word ".repeat(20));
        assert!(long.chars().count() <= SLUG_MAX_LEN);
        assert!(!long.ends_with('-'));
    }
}
