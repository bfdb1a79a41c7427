use smartcomment_dom::{Document, local_name};

use super::{SelectionContext, SelectionError, SelectionKind, SelectionMetadata, SelectionResult, SelectionStrategy};
use crate::validate::{SelectionInput, validate};
use crate::{DATA_HASH_ATTR, DATA_TYPE_ATTR, DYNAMIC_BLOCK_CLASS, IMAGE_BLOCK_CLASS, image_hash};

/// Anchors an image by a fingerprint of its source and size.
///
/// [`ImageSelection::wrap_images`] prepares the content so that every image sits in a dynamic
/// block keyed by that fingerprint.
pub struct ImageSelection;

impl SelectionStrategy for ImageSelection {
    type Target = usize;

    const KIND: SelectionKind = SelectionKind::Image;

    fn select(
        &self,
        cx: &SelectionContext<'_>,
        doc: &Document,
        target: usize,
    ) -> Result<SelectionResult, SelectionError> {
        cx.check_target(doc, target)?;

        let img = find_image(doc, target).ok_or(SelectionError::Unsupported("not an image"))?;
        let block = doc.closest_where(img, |node| node.has_class(DYNAMIC_BLOCK_CLASS));
        let element = block.unwrap_or(img);

        validate(doc, SelectionInput::Element(element), cx.config.max_selection_length)?;

        let src = doc
            .get_node(img)
            .and_then(|node| node.attr("src"))
            .unwrap_or_default()
            .to_string();
        let (width, height) = image_dimensions(doc, img);
        let hash = block
            .and_then(|block| doc.get_node(block)?.attr(DATA_HASH_ATTR))
            .and_then(|wire| wire.strip_prefix("img[")?.strip_suffix(']'))
            .map(str::to_string)
            .unwrap_or_else(|| image_hash(&src, width, height));

        Ok(SelectionResult {
            kind: SelectionKind::Image,
            text: format!("img[{hash}]"),
            index: 0,
            element: Some(element),
            image: None,
            rect: doc.bounding_client_rect(element),
            pointer: None,
            metadata: SelectionMetadata::Image {
                src,
                width,
                height,
                hash,
            },
        })
    }
}

impl ImageSelection {
    /// Wraps every qualifying image in the scope in
    /// `div.sc-dynamic-block.sc-image-block[data-hash="img[<hash>]"][data-type=image]`.
    ///
    /// Images already inside a dynamic block, without a `src`, smaller than the configured
    /// minimum or inside an excluded region are left alone. Returns the new wrappers.
    pub fn wrap_images(&self, cx: &SelectionContext<'_>, doc: &mut Document) -> Vec<usize> {
        let candidates: Vec<(usize, String)> = doc
            .elements_in(cx.scope)
            .filter(|node| node.data.is_element_with_tag_name("img"))
            .filter(|node| {
                doc.closest_where(node.id, |el| el.has_class(DYNAMIC_BLOCK_CLASS))
                    .is_none()
            })
            .filter(|node| !cx.is_excluded(doc, node.id))
            .filter_map(|node| {
                let src = node.attr("src").filter(|src| !src.is_empty())?;
                let (width, height) = image_dimensions(doc, node.id);
                let min = cx.config.min_image_dimension as f32;
                let too_small = (width > 0.0 && width < min) || (height > 0.0 && height < min);
                (!too_small).then(|| (node.id, image_hash(src, width, height)))
            })
            .collect();

        let class = format!("{DYNAMIC_BLOCK_CLASS} {IMAGE_BLOCK_CLASS}");
        let mut wrappers = Vec::with_capacity(candidates.len());
        let mut mutr = doc.mutate();
        for (img, hash) in candidates {
            let wrapped = wrap_target(mutr.doc, img);
            let data_hash = format!("img[{hash}]");
            let wrapper = mutr.create_html_element(
                "div",
                &[
                    ("class", class.as_str()),
                    (DATA_HASH_ATTR, data_hash.as_str()),
                    (DATA_TYPE_ATTR, "image"),
                ],
            );
            mutr.wrap_node(wrapped, wrapper);
            wrappers.push(wrapper);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("wrapped {} images for selection", wrappers.len());

        wrappers
    }
}

/// The `<img>` itself, or the first image inside a wrapper
fn find_image(doc: &Document, target: usize) -> Option<usize> {
    let node = doc.get_node(target)?;
    if node.data.is_element_with_tag_name("img") {
        return Some(target);
    }
    if !node.is_element() {
        return None;
    }
    doc.elements_in(target)
        .find(|el| el.data.is_element_with_tag_name("img"))
        .map(|el| el.id)
}

/// The node to put in the wrapper: the image, or a link that holds nothing but the image
fn wrap_target(doc: &Document, img: usize) -> usize {
    let Some(parent) = doc.get_node(img).and_then(|node| node.parent_node()) else {
        return img;
    };
    let is_link = parent
        .element_data()
        .is_some_and(|el| el.name.local == local_name!("a"));
    let only_child = parent
        .children
        .iter()
        .all(|child| *child == img || parent.with(*child).is_whitespace_text());
    if is_link && only_child { parent.id } else { img }
}

/// Rendered size of an image: the layout box when known, else its `width`/`height` attributes
pub fn image_dimensions(doc: &Document, img: usize) -> (f32, f32) {
    let Some(node) = doc.get_node(img) else {
        return (0.0, 0.0);
    };
    if let Some(rect) = node.layout_rect {
        return (rect.width, rect.height);
    }
    let attr = |name: &str| {
        node.element_data()
            .and_then(|el| el.attr_parsed::<f32>(name))
            .unwrap_or(0.0)
    };
    (attr("width"), attr("height"))
}
