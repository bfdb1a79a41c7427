use std::cell::{Cell, RefCell};
use std::rc::Rc;

use smartcomment::{
    AnchorKind, Annotator, AnnotatorConfig, AnnotatorProviders, ClickCallback, ProcessOptions,
    ReloadOutcome, SavedComment,
};
use smartcomment_dom::{Document, Range};
use smartcomment_html::HtmlDocument;
use smartcomment_traits::comments::{
    CommentId, CommentProvider, CommentRecord, CommentStatus, CreatedComment, NewComment,
    ProviderError,
};
use smartcomment_traits::{DomEvent, DomRect};

/// Keeps comments in memory, like a comment API with a single page
#[derive(Default)]
struct MemoryProvider {
    comments: RefCell<Vec<CommentRecord>>,
    next_id: Cell<u64>,
    updates: RefCell<Vec<(CommentId, CommentStatus)>>,
}

impl MemoryProvider {
    fn with(comments: Vec<CommentRecord>) -> Self {
        Self {
            next_id: Cell::new(100),
            comments: RefCell::new(comments),
            ..Default::default()
        }
    }
}

impl CommentProvider for MemoryProvider {
    async fn list_open_comments(&self, page_id: &str) -> Result<Vec<CommentRecord>, ProviderError> {
        if page_id != "Main_Page" {
            return Err(ProviderError::Request(format!("unknown page {page_id}")));
        }
        Ok(self
            .comments
            .borrow()
            .iter()
            .filter(|comment| comment.status == CommentStatus::Open)
            .cloned()
            .collect())
    }

    async fn get_comment(&self, id: &CommentId) -> Result<CommentRecord, ProviderError> {
        self.comments
            .borrow()
            .iter()
            .find(|comment| &comment.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.clone()))
    }

    async fn create_comment(
        &self,
        _page_id: &str,
        comment: NewComment,
    ) -> Result<CreatedComment, ProviderError> {
        let id = CommentId::from(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        let mut record = CommentRecord::new(id.clone(), comment.pos);
        record.text = comment.text;
        record.parent_id = comment.parent_id;
        self.comments.borrow_mut().push(record);
        Ok(CreatedComment {
            success: true,
            id: Some(id),
        })
    }

    async fn update_comment(
        &self,
        id: &CommentId,
        status: CommentStatus,
        _text: Option<&str>,
    ) -> Result<(), ProviderError> {
        let mut comments = self.comments.borrow_mut();
        let comment = comments
            .iter_mut()
            .find(|comment| &comment.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.clone()))?;
        comment.status = status;
        self.updates.borrow_mut().push((id.clone(), status));
        Ok(())
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<(), ProviderError> {
        let mut comments = self.comments.borrow_mut();
        let before = comments.len();
        comments.retain(|comment| &comment.id != id);
        if comments.len() == before {
            return Err(ProviderError::NotFound(id.clone()));
        }
        Ok(())
    }
}

fn session(comments: Vec<CommentRecord>) -> (Annotator<MemoryProvider>, Document) {
    let config = AnnotatorConfig {
        content_selector: "#root".to_string(),
        ..Default::default()
    };
    let annotator = Annotator::new(config, AnnotatorProviders::new(MemoryProvider::with(comments)));
    let doc = HtmlDocument::from_html(r#"<div id="root">alpha beta gamma</div>"#).into_inner();
    (annotator, doc)
}

fn noop() -> ClickCallback {
    Rc::new(|_: &DomEvent, _: &CommentRecord, _: DomRect| {})
}

fn broken_ids(outcome: &ReloadOutcome) -> Vec<CommentId> {
    let ReloadOutcome::Reloaded { broken, .. } = outcome else {
        panic!("reload did not run");
    };
    let mut ids: Vec<CommentId> = broken.iter().map(|comment| comment.id.clone()).collect();
    ids.sort();
    ids
}

fn stored_comments() -> Vec<CommentRecord> {
    let mut no_position = CommentRecord::new(3, "");
    no_position.pos = None;
    let mut reply = CommentRecord::new(4, "alpha|0");
    reply.parent_id = Some(CommentId::from(1));
    vec![
        CommentRecord::new(1, "beta|0"),
        CommentRecord::new(2, "delta|0"),
        no_position,
        reply,
    ]
}

#[test]
fn reload_applies_open_comments_and_reports_broken_ones() {
    let (annotator, mut doc) = session(stored_comments());
    let on_click = noop();

    let outcome = pollster::block_on(annotator.reload_highlights(&mut doc, "Main_Page", &on_click)).unwrap();
    assert!(matches!(outcome, ReloadOutcome::Reloaded { applied: 1, .. }));
    assert_eq!(broken_ids(&outcome), vec![CommentId::from(2), CommentId::from(3)]);
    assert!(!annotator.is_refreshing());

    let root = annotator.content_scope(&doc);
    let html = doc.get_node(root).unwrap().inner_html();
    assert_eq!(
        html,
        r#"alpha <span class="smartcomment-hl-1" data-comment-id="1" style="cursor: pointer;">beta</span> gamma"#
    );

    // Reloading starts from a clean page
    pollster::block_on(annotator.reload_highlights(&mut doc, "Main_Page", &on_click)).unwrap();
    assert_eq!(doc.get_node(root).unwrap().inner_html(), html);
    assert_eq!(annotator.engine().registry().len(), 1);
}

#[test]
fn reload_is_refused_while_one_is_in_flight() {
    let (annotator, mut doc) = session(stored_comments());
    let on_click = noop();

    let guard = annotator.try_begin_refresh().unwrap();
    let outcome = pollster::block_on(annotator.reload_highlights(&mut doc, "Main_Page", &on_click)).unwrap();
    assert!(matches!(outcome, ReloadOutcome::AlreadyRefreshing));
    assert!(doc.query_selector(0, "[data-comment-id]").unwrap().is_none());
    drop(guard);

    let outcome = pollster::block_on(annotator.reload_highlights(&mut doc, "Main_Page", &on_click)).unwrap();
    assert!(matches!(outcome, ReloadOutcome::Reloaded { applied: 1, .. }));
}

#[test]
fn failed_reload_releases_the_guard() {
    let (annotator, mut doc) = session(stored_comments());
    let result = pollster::block_on(annotator.reload_highlights(&mut doc, "Other_Page", &noop()));
    assert!(matches!(result, Err(ProviderError::Request(_))));
    assert!(!annotator.is_refreshing());
}

#[test]
fn comment_lifecycle() {
    let (annotator, mut doc) = session(vec![CommentRecord::new(1, "beta|0")]);
    let on_click = noop();
    pollster::block_on(annotator.reload_highlights(&mut doc, "Main_Page", &on_click)).unwrap();

    let root = annotator.content_scope(&doc);
    let gamma = doc.get_node(root).unwrap().children[2];
    assert_eq!(doc.get_node(gamma).unwrap().text_content(), " gamma");
    let selection = annotator
        .process_text_selection(&doc, Range::within(gamma, 1, 6), None, ProcessOptions::default())
        .unwrap();

    let saved = pollster::block_on(annotator.save_comment(
        &mut doc,
        "Main_Page",
        &selection,
        "Needs a source",
        None,
        &on_click,
    ))
    .unwrap();
    assert_eq!(
        saved,
        SavedComment {
            id: CommentId::from(100),
            applied: true
        }
    );
    let stored = pollster::block_on(annotator.providers().comments.get_comment(&saved.id)).unwrap();
    assert_eq!(stored.pos.as_deref(), Some("gamma|0"));
    assert_eq!(stored.text, "Needs a source");

    let reply = pollster::block_on(annotator.save_comment(
        &mut doc,
        "Main_Page",
        &selection,
        "Agreed",
        Some(saved.id.clone()),
        &on_click,
    ))
    .unwrap();
    assert!(!reply.applied);
    assert_eq!(doc.query_selector_all(root, "span").unwrap().len(), 2);

    let kind = pollster::block_on(annotator.resolve_comment(&mut doc, &saved.id)).unwrap();
    assert_eq!(kind, Some(AnchorKind::Text));
    assert_eq!(
        *annotator.providers().comments.updates.borrow(),
        vec![(saved.id.clone(), CommentStatus::Completed)]
    );

    let kind = pollster::block_on(annotator.delete_comment(&mut doc, &CommentId::from(1))).unwrap();
    assert_eq!(kind, Some(AnchorKind::Text));
    assert_eq!(doc.get_node(root).unwrap().inner_html(), "alpha beta gamma");
    assert!(annotator.engine().registry().is_empty());

    let missing = pollster::block_on(annotator.delete_comment(&mut doc, &CommentId::from(1)));
    assert!(matches!(missing, Err(ProviderError::NotFound(_))));
}
