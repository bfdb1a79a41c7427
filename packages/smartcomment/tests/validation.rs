use smartcomment::{SelectionInput, ValidationError, validate};
use smartcomment_dom::{Boundary, Document, Range};
use smartcomment_html::HtmlDocument;

const MAX: usize = 50_000;

fn page() -> (Document, usize) {
    let doc = HtmlDocument::from_html(concat!(
        r#"<div id="root"><p>before</p>"#,
        r#"<div class="sc-dynamic-block" data-hash="chart-1">Chart</div>"#,
        "<p>after</p><pre>line one\nline two</pre></div>",
    ))
    .into_inner();
    let root = doc.get_element_by_id("root").unwrap();
    (doc, root)
}

fn range(doc: &Document, range: Range) -> Result<(), ValidationError> {
    validate(doc, SelectionInput::Range(range), MAX)
}

#[test]
fn exactly_one_dynamic_block_is_valid() {
    let (doc, root) = page();
    let block = doc.get_node(root).unwrap().children[1];

    let whole_block = Range::new(Boundary::new(root, 1), Boundary::new(root, 2));
    assert_eq!(range(&doc, whole_block), Ok(()));
    assert_eq!(validate(&doc, SelectionInput::Element(block), MAX), Ok(()));

    let block_and_text = Range::new(Boundary::new(root, 0), Boundary::new(root, 2));
    assert_eq!(range(&doc, block_and_text), Err(ValidationError::DynamicContent));
}

#[test]
fn ranges_over_lines_and_markup() {
    let (doc, root) = page();
    let pre = doc.get_node(root).unwrap().children[3];
    let pre_text = doc.get_node(pre).unwrap().children[0];
    assert_eq!(
        range(&doc, Range::within(pre_text, 0, 17)),
        Err(ValidationError::Linebreaks)
    );
    assert_eq!(range(&doc, Range::within(pre_text, 0, 8)), Ok(()));

    let first = doc.get_node(root).unwrap().children[0];
    let last = doc.get_node(root).unwrap().children[2];
    let before = doc.get_node(first).unwrap().children[0];
    let after = doc.get_node(last).unwrap().children[0];
    let across = Range::new(Boundary::new(before, 2), Boundary::new(after, 2));
    assert_eq!(range(&doc, across), Err(ValidationError::DynamicContent));

    let collapsed = Range::within(before, 3, 3);
    assert_eq!(range(&doc, collapsed), Err(ValidationError::Empty));
}

#[test]
fn already_commented_wins_over_everything_else() {
    let (mut doc, root) = page();
    let block = doc.get_node(root).unwrap().children[1];
    doc.mutate().add_class(block, "smartcomment-hl-12");
    let whole_block = Range::new(Boundary::new(root, 1), Boundary::new(root, 2));
    assert_eq!(range(&doc, whole_block), Err(ValidationError::AlreadyCommented));
}
