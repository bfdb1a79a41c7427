use smartcomment_dom::{Document, attribute_selector};

use crate::SVG_ID_ATTR;
use crate::selection::{generate_svg_id, is_svg_link, last_path_segment, svg_link_for};

/// Elements addressed by an SVG anchor. The first lookup that finds anything wins:
///
///  1. elements whose `data-svg-id` is `id`
///  2. SVG links whose regenerated id is `id`
///  3. for `svg-href-<segment>` ids, any element whose `href` ends in that segment
pub(super) fn resolve_svg(doc: &Document, scope: usize, id: &str) -> Vec<usize> {
    match doc.query_selector_all(scope, &attribute_selector(SVG_ID_ATTR, id)) {
        Ok(found) if !found.is_empty() => return found,
        Ok(_) => {}
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("svg id does not make a selector: {_err}");
        }
    }

    let regenerated: Vec<usize> = doc
        .elements_in(scope)
        .filter(|node| is_svg_link(doc, node.id) && svg_link_for(doc, node.id) == Some(node.id))
        .filter(|node| generate_svg_id(doc, node.id) == id)
        .map(|node| node.id)
        .collect();
    if !regenerated.is_empty() {
        return regenerated;
    }

    let Some(segment) = id.strip_prefix("svg-href-").filter(|segment| !segment.is_empty()) else {
        return Vec::new();
    };
    doc.elements_in(scope)
        .filter(|node| {
            node.attr("href").is_some_and(|href| {
                last_path_segment(href) == Some(segment) || href.ends_with(segment)
            })
        })
        .map(|node| node.id)
        .collect()
}
