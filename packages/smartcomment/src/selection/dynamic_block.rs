use std::sync::LazyLock;

use regex::Regex;
use smartcomment_dom::Document;

use super::{SelectionContext, SelectionError, SelectionKind, SelectionMetadata, SelectionResult, SelectionStrategy};
use crate::validate::{SelectionInput, validate};
use crate::{DATA_HASH_ATTR, DATA_TYPE_ATTR, DYNAMIC_BLOCK_CLASS};

static SCRIPT_OR_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").unwrap());
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#).unwrap()
});
static JAVASCRIPT_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)javascript:").unwrap());

/// Anchors a whole dynamic block, keyed by its `data-hash` or its markup
pub struct DynamicBlockSelection;

impl SelectionStrategy for DynamicBlockSelection {
    type Target = usize;

    const KIND: SelectionKind = SelectionKind::DynamicBlock;

    fn select(
        &self,
        cx: &SelectionContext<'_>,
        doc: &Document,
        target: usize,
    ) -> Result<SelectionResult, SelectionError> {
        cx.check_target(doc, target)?;

        let block = doc
            .closest_where(target, |node| node.has_class(DYNAMIC_BLOCK_CLASS))
            .ok_or(SelectionError::Unsupported("not inside a dynamic block"))?;

        validate(doc, SelectionInput::Element(block), cx.config.max_selection_length)?;

        let node = doc.get_node(block).ok_or(SelectionError::NotFound)?;
        let data_hash = node.attr(DATA_HASH_ATTR).filter(|hash| !hash.is_empty());
        let text = match data_hash {
            Some(hash) => hash.to_string(),
            None => block_key(doc, block, cx.config.dynamic_block_html_limit),
        };

        Ok(SelectionResult {
            kind: SelectionKind::DynamicBlock,
            text,
            index: 0,
            element: Some(block),
            image: None,
            rect: doc.bounding_client_rect(block),
            pointer: None,
            metadata: SelectionMetadata::DynamicBlock {
                data_type: node.attr(DATA_TYPE_ATTR).map(str::to_string),
                hashed: data_hash.is_some(),
            },
        })
    }
}

/// Key of a dynamic block without a `data-hash`: its outer HTML with scripts, styles, event
/// handlers and `javascript:` URLs removed, cut to `limit` characters.
///
/// `|` is escaped so that the key never decodes as a text position.
pub fn block_key(doc: &Document, block: usize, limit: usize) -> String {
    let Some(node) = doc.get_node(block) else {
        return String::new();
    };
    let html = node.outer_html();
    let html = SCRIPT_OR_STYLE.replace_all(&html, "");
    let html = EVENT_HANDLER.replace_all(&html, "");
    let html = JAVASCRIPT_URL.replace_all(&html, "");
    let html = html.replace('|', "&#124;");
    html.chars().take(limit).collect()
}
