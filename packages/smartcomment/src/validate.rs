//! Rules that refuse selections which cannot be anchored safely.

use std::sync::LazyLock;

use regex::Regex;
use smartcomment_dom::{Document, Range};

use crate::{DYNAMIC_BLOCK_CLASS, HIGHLIGHT_CLASS_PREFIX};

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// What is being validated. Each call site knows which kind it has.
#[derive(Debug, Clone, Copy)]
pub enum SelectionInput<'a> {
    /// A live selection in the document
    Range(Range),
    /// A serialized snippet of markup
    Html(&'a str),
    /// A whole element, checked against its outer HTML
    Element(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("the selection overlaps an existing comment")]
    AlreadyCommented,
    #[error("the selection contains dynamic content")]
    DynamicContent,
    #[error("the selection spans several lines")]
    Linebreaks,
    #[error("the selection is empty")]
    Empty,
    #[error("the selection contains markup")]
    HtmlContent,
}

impl ValidationError {
    /// Kebab-case failure code, used in notification message keys
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::AlreadyCommented => "already-commented",
            ValidationError::DynamicContent => "dynamic-content",
            ValidationError::Linebreaks => "linebreaks",
            ValidationError::Empty => "empty",
            ValidationError::HtmlContent => "html-content",
        }
    }
}

/// Checks a selection. The rules run in a fixed order and the first failing one is reported.
pub fn validate(
    doc: &Document,
    input: SelectionInput<'_>,
    max_length: usize,
) -> Result<(), ValidationError> {
    let (subject, plain_text) = match input {
        SelectionInput::Range(range) => {
            let html = doc.range_to_html(&range);
            let text = doc.range_to_string(&range);
            let subject = if !html.is_empty() {
                html
            } else if !text.is_empty() {
                text.clone()
            } else {
                image_context_html(doc, &range).unwrap_or_default()
            };
            (subject, Some(text))
        }
        SelectionInput::Html(html) => (html.to_string(), None),
        SelectionInput::Element(node_id) => (
            doc.get_node(node_id)
                .map(|node| node.outer_html())
                .unwrap_or_default(),
            None,
        ),
    };

    if subject.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    if subject.chars().count() > max_length {
        return Err(ValidationError::HtmlContent);
    }

    if subject.contains(HIGHLIGHT_CLASS_PREFIX) {
        return Err(ValidationError::AlreadyCommented);
    }

    if subject.contains(DYNAMIC_BLOCK_CLASS) {
        if is_single_dynamic_block(doc, &input, &subject) {
            return Ok(());
        }
        return Err(ValidationError::DynamicContent);
    }

    if let Some(text) = plain_text {
        if text.contains(['\n', '\r']) {
            return Err(ValidationError::Linebreaks);
        }
    }

    if !matches!(input, SelectionInput::Element(_)) && HTML_TAG.is_match(&subject) {
        return Err(ValidationError::HtmlContent);
    }

    Ok(())
}

/// Outer HTML of the common ancestor, for empty selections around an image
fn image_context_html(doc: &Document, range: &Range) -> Option<String> {
    let ancestor = doc.element_for(doc.range_common_ancestor(range))?;
    let node = doc.get_node(ancestor)?;
    let has_image = node.data.is_element_with_tag_name("img")
        || doc
            .elements_in(ancestor)
            .any(|el| el.data.is_element_with_tag_name("img"));
    has_image.then(|| node.outer_html())
}

fn is_single_dynamic_block(doc: &Document, input: &SelectionInput<'_>, subject: &str) -> bool {
    let is_block = |node_id: usize| {
        doc.get_node(node_id)
            .is_some_and(|node| node.has_class(DYNAMIC_BLOCK_CLASS))
    };

    match input {
        SelectionInput::Element(node_id) => {
            is_block(*node_id) && subject.matches(DYNAMIC_BLOCK_CLASS).count() == 1
        }
        SelectionInput::Range(range) => {
            let element = doc.range_single_element(range);
            if element.is_some_and(is_block) {
                return subject.matches(DYNAMIC_BLOCK_CLASS).count() == 1;
            }
            is_single_block_markup(subject)
        }
        SelectionInput::Html(html) => is_single_block_markup(html),
    }
}

/// `<tag class="... sc-dynamic-block ...">...</tag>` and nothing around it
fn is_single_block_markup(html: &str) -> bool {
    let html = html.trim();
    let Some(first_tag_end) = html.find('>') else {
        return false;
    };
    let first_tag = &html[..first_tag_end];
    let Some(tag_name) = first_tag
        .strip_prefix('<')
        .and_then(|tag| tag.split(|c: char| c.is_whitespace() || c == '/').next())
        .filter(|name| !name.is_empty())
    else {
        return false;
    };

    first_tag.contains(DYNAMIC_BLOCK_CLASS)
        && html.matches(DYNAMIC_BLOCK_CLASS).count() == 1
        && html.ends_with(&format!("</{tag_name}>"))
        && html.matches(&format!("<{tag_name}")).count() == 1
}
