use smartcomment_dom::Document;

use crate::COMMENT_ID_ATTR;
use crate::occurrence::{SpanningIndex, TextMatch, find_nth_occurrence};

/// Wraps the `index`-th occurrence of `text` in marker spans and returns them.
///
/// Matches inside a single text node are tried first. When there are not enough of those the
/// concatenated scope text is searched, which is how selections across nodes were indexed, and
/// every piece of the match gets its own span.
pub(super) fn wrap_occurrence(
    doc: &mut Document,
    scope: usize,
    text: &str,
    index: usize,
    class: &str,
    comment_id: &str,
) -> Vec<usize> {
    let pieces = match find_nth_occurrence(doc, scope, text, index) {
        Some(found) => vec![found],
        None => SpanningIndex::new(doc, scope)
            .find_nth(text, index)
            .unwrap_or_default(),
    };

    pieces
        .into_iter()
        .filter_map(|piece| wrap_match(doc, piece, class, comment_id))
        .collect()
}

/// Isolates the matched bytes in their own text node and puts a span around it
fn wrap_match(doc: &mut Document, found: TextMatch, class: &str, comment_id: &str) -> Option<usize> {
    let len = doc.get_node(found.node)?.text_data()?.content.len();
    if found.start >= found.end || found.end > len {
        return None;
    }

    let mut mutr = doc.mutate();
    let target = if found.start > 0 {
        mutr.split_text(found.node, found.start)?
    } else {
        found.node
    };
    if found.end < len {
        mutr.split_text(target, found.end - found.start);
    }
    let span = mutr.create_html_element("span", &[("class", class), (COMMENT_ID_ATTR, comment_id)]);
    mutr.wrap_node(target, span);
    Some(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_exactly_the_matched_bytes() {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let div = m.create_html_element("div", &[]);
        let text = m.create_text_node("cat cat cat");
        m.append_children(0, &[div]);
        m.append_children(div, &[text]);
        drop(m);

        let spans = wrap_occurrence(&mut doc, div, "cat", 1, "smartcomment-hl-1", "1");
        assert_eq!(spans.len(), 1);
        assert_eq!(
            doc.get_node(div).unwrap().inner_html(),
            r#"cat <span class="smartcomment-hl-1" data-comment-id="1">cat</span> cat"#
        );

        assert!(wrap_occurrence(&mut doc, div, "dog", 0, "smartcomment-hl-2", "2").is_empty());
    }
}
