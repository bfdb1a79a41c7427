use smartcomment_dom::{Document, attribute_selector};

use crate::selection::{block_key, image_dimensions};
use crate::{DATA_HASH_ATTR, DYNAMIC_BLOCK_CLASS, image_hash};

/// Elements addressed by a selector anchor.
///
/// Dynamic blocks are matched by `data-hash` or by their key. Anything else that does not look
/// like markup is run as a CSS selector.
pub(super) fn resolve_selector(doc: &Document, scope: usize, selector: &str, key_limit: usize) -> Vec<usize> {
    let blocks: Vec<usize> = doc
        .elements_in(scope)
        .filter(|node| node.has_class(DYNAMIC_BLOCK_CLASS))
        .filter(|node| match node.attr(DATA_HASH_ATTR).filter(|hash| !hash.is_empty()) {
            Some(hash) => hash == selector,
            None => block_key(doc, node.id, key_limit) == selector,
        })
        .map(|node| node.id)
        .collect();
    if !blocks.is_empty() || selector.starts_with('<') {
        return blocks;
    }

    match doc.query_selector_all(scope, selector) {
        Ok(found) => found,
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("stored selector does not parse: {_err}");
            Vec::new()
        }
    }
}

/// Elements addressed by an image anchor: the wrappers carrying its hash, or failing that the
/// `<figure>` (else the parent) of every image whose fingerprint or `src` matches.
pub(super) fn resolve_image(doc: &Document, scope: usize, hash: &str) -> Vec<usize> {
    let selector = attribute_selector(DATA_HASH_ATTR, &format!("img[{hash}]"));
    match doc.query_selector_all(scope, &selector) {
        Ok(found) if !found.is_empty() => return found,
        Ok(_) => {}
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!("image hash does not make a selector: {_err}");
        }
    }
    if hash.is_empty() {
        return Vec::new();
    }

    let mut targets = Vec::new();
    for img in doc
        .elements_in(scope)
        .filter(|node| node.data.is_element_with_tag_name("img"))
    {
        let src = img.attr("src").unwrap_or_default();
        let (width, height) = image_dimensions(doc, img.id);
        let matches = image_hash(src, width, height) == hash || (!src.is_empty() && src.contains(hash));
        if !matches {
            continue;
        }

        let figure = doc
            .closest_where(img.id, |node| node.data.is_element_with_tag_name("figure"))
            .filter(|figure| doc.is_ancestor_of(scope, *figure));
        let parent = img
            .parent
            .filter(|parent| doc.is_ancestor_of(scope, *parent));
        let target = figure.or(parent).unwrap_or(img.id);
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
}
