//! Finding the n-th occurrence of a string in a content scope.
//!
//! The same walk is used when a text anchor is created (to compute its index) and when it is
//! resolved again (to find the index-th match), so unchanged content always resolves to the
//! range the anchor was created from.
//!
//! Text nodes are visited in document order and whitespace-only nodes are skipped. Every start
//! position of an exact, case-sensitive match counts, so overlapping matches are distinct
//! occurrences. A match never spans two text nodes. [`SpanningIndex`] lifts that restriction for
//! selections that cross node boundaries.

use smartcomment_dom::{Boundary, Document, Node, Range};

/// A match inside a single text node, as byte offsets into its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextMatch {
    pub node: usize,
    pub start: usize,
    pub end: usize,
}

impl TextMatch {
    pub fn range(&self) -> Range {
        Range::within(self.node, self.start, self.end)
    }
}

/// Every occurrence of `needle` under `scope`, in document order
pub fn occurrences<'a>(
    doc: &'a Document,
    scope: usize,
    needle: &'a str,
) -> impl Iterator<Item = TextMatch> + 'a {
    doc.text_nodes_in(scope)
        .filter(move |node| !needle.is_empty() && !node.is_whitespace_text())
        .flat_map(move |node| matches_in_node(node, needle))
}

/// The `n`-th (zero based) occurrence of `needle` under `scope`
pub fn find_nth_occurrence(doc: &Document, scope: usize, needle: &str, n: usize) -> Option<TextMatch> {
    occurrences(doc, scope, needle).nth(n)
}

/// Index of the occurrence starting at `offset` in text node `node`
pub fn occurrence_index(
    doc: &Document,
    scope: usize,
    needle: &str,
    node: usize,
    offset: usize,
) -> Option<usize> {
    occurrences(doc, scope, needle).position(|m| m.node == node && m.start == offset)
}

fn matches_in_node(node: &Node, needle: &str) -> Vec<TextMatch> {
    let Some(text) = node.text_data() else {
        return Vec::new();
    };
    let content = text.content.as_str();

    let mut matches = Vec::new();
    let mut from = 0;
    while let Some(pos) = content[from..].find(needle) {
        let start = from + pos;
        matches.push(TextMatch {
            node: node.id,
            start,
            end: start + needle.len(),
        });
        from = start + content[start..].chars().next().map_or(1, char::len_utf8);
    }
    matches
}

/// The concatenated text of every text node under a scope, for matches that cross node
/// boundaries.
///
/// Unlike [`occurrences`], whitespace-only nodes are kept: a selection across nodes includes
/// them in its text.
pub struct SpanningIndex {
    text: String,
    /// `(node, offset of its first byte in text)` in document order
    segments: Vec<(usize, usize)>,
}

impl SpanningIndex {
    pub fn new(doc: &Document, scope: usize) -> Self {
        let mut text = String::new();
        let mut segments = Vec::new();
        for node in doc.text_nodes_in(scope) {
            if let Some(data) = node.text_data() {
                segments.push((node.id, text.len()));
                text.push_str(&data.content);
            }
        }
        Self { text, segments }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Offset into the concatenated text of a boundary inside a text node
    pub fn global_offset(&self, boundary: Boundary) -> Option<usize> {
        self.segments
            .iter()
            .find(|(node, _)| *node == boundary.node)
            .map(|(_, start)| start + boundary.offset)
    }

    /// Start offsets of every occurrence of `needle`, overlapping matches included
    pub fn starts<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
        let mut from = 0;
        std::iter::from_fn(move || {
            if needle.is_empty() {
                return None;
            }
            let start = from + self.text.get(from..)?.find(needle)?;
            from = start + self.text[start..].chars().next().map_or(1, char::len_utf8);
            Some(start)
        })
    }

    pub fn occurrence_index(&self, needle: &str, global_offset: usize) -> Option<usize> {
        self.starts(needle).position(|start| start == global_offset)
    }

    /// The `n`-th occurrence split into one piece per text node it touches
    pub fn find_nth(&self, needle: &str, n: usize) -> Option<Vec<TextMatch>> {
        let start = self.starts(needle).nth(n)?;
        Some(self.split(start, start + needle.len()))
    }

    fn split(&self, start: usize, end: usize) -> Vec<TextMatch> {
        let mut pieces = Vec::new();
        for (i, &(node, seg_start)) in self.segments.iter().enumerate() {
            let seg_end = self
                .segments
                .get(i + 1)
                .map_or(self.text.len(), |(_, next)| *next);
            let piece_start = start.max(seg_start);
            let piece_end = end.min(seg_end);
            if piece_start < piece_end {
                pieces.push(TextMatch {
                    node,
                    start: piece_start - seg_start,
                    end: piece_end - seg_start,
                });
            }
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_texts(texts: &[&str]) -> (Document, usize, Vec<usize>) {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let div = m.create_html_element("div", &[]);
        m.append_children(0, &[div]);
        let ids: Vec<usize> = texts.iter().map(|t| m.create_text_node(t)).collect();
        m.append_children(div, &ids);
        drop(m);
        (doc, div, ids)
    }

    #[test]
    fn cat_cat_cat() {
        let (doc, div, ids) = doc_with_texts(&["cat cat cat"]);
        let found: Vec<_> = (0..3)
            .map(|n| find_nth_occurrence(&doc, div, "cat", n).unwrap())
            .collect();
        assert_eq!(
            found.iter().map(|m| (m.start, m.end)).collect::<Vec<_>>(),
            vec![(0, 3), (4, 7), (8, 11)]
        );
        assert!(found.iter().all(|m| m.node == ids[0]));
        assert_eq!(find_nth_occurrence(&doc, div, "cat", 3), None);
    }

    #[test]
    fn counts_across_nodes_and_overlaps() {
        let (doc, div, ids) = doc_with_texts(&["aaa", "   ", "xaa"]);
        let all: Vec<_> = occurrences(&doc, div, "aa").collect();
        assert_eq!(all.len(), 3);
        assert_eq!((all[1].node, all[1].start), (ids[0], 1));
        assert_eq!((all[2].node, all[2].start), (ids[2], 1));
        assert_eq!(occurrence_index(&doc, div, "aa", ids[2], 1), Some(2));
        assert_eq!(occurrence_index(&doc, div, "aa", ids[2], 0), None);
    }

    #[test]
    fn matching_is_case_sensitive_and_never_spans_nodes() {
        let (doc, div, _) = doc_with_texts(&["Hello wor", "ld, hello"]);
        assert_eq!(occurrences(&doc, div, "hello").count(), 1);
        assert_eq!(occurrences(&doc, div, "world").count(), 0);
        assert_eq!(occurrences(&doc, div, "").count(), 0);
    }

    #[test]
    fn spanning_index_splits_matches_per_node() {
        let (doc, div, ids) = doc_with_texts(&["Hello wor", "ld, hello world"]);
        let index = SpanningIndex::new(&doc, div);
        assert_eq!(index.text(), "Hello world, hello world");
        let pieces = index.find_nth("world", 0).unwrap();
        assert_eq!(
            pieces,
            vec![
                TextMatch { node: ids[0], start: 6, end: 9 },
                TextMatch { node: ids[1], start: 0, end: 2 },
            ]
        );
        let offset = index.global_offset(Boundary::new(ids[0], 6)).unwrap();
        assert_eq!(index.occurrence_index("world", offset), Some(0));
        assert_eq!(index.find_nth("world", 1).unwrap().len(), 1);
        assert_eq!(index.find_nth("world", 2), None);
    }
}
