//! The session object a UI layer talks to.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use smartcomment_dom::{Document, Range};
use smartcomment_traits::DomEvent;
use smartcomment_traits::comments::{
    CommentId, CommentProvider, CommentRecord, CommentStatus, DummyCommentProvider, NewComment,
    ProviderError,
};
use smartcomment_traits::shell::{
    DummyNotificationProvider, DummyScreenshotProvider, NotificationProvider, ScreenshotProvider,
};

use crate::highlight::{AnchorKind, ApplyReport, HighlightAnchor, HighlightEngine};
use crate::listeners::ClickCallback;
use crate::position::encode;
use crate::selection::{
    DynamicBlockSelection, ImageSelection, ProcessOptions, SelectionContext, SelectionResult,
    SelectionStrategy, SvgSelection, TextSelection,
};
use crate::AnnotatorConfig;

/// The collaborators an [`Annotator`] calls out to
pub struct AnnotatorProviders<C = DummyCommentProvider> {
    pub comments: C,
    pub notifications: Rc<dyn NotificationProvider>,
    pub screenshots: Rc<dyn ScreenshotProvider>,
}

impl<C> AnnotatorProviders<C> {
    /// A comment provider with the dummy shell providers
    pub fn new(comments: C) -> Self {
        Self {
            comments,
            notifications: Rc::new(DummyNotificationProvider),
            screenshots: Rc::new(DummyScreenshotProvider),
        }
    }
}

impl Default for AnnotatorProviders<DummyCommentProvider> {
    fn default() -> Self {
        Self::new(DummyCommentProvider)
    }
}

/// Clears the refresh flag when dropped
pub struct RefreshGuard {
    flag: Rc<Cell<bool>>,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[derive(Debug)]
pub enum ReloadOutcome {
    /// Another reload was in flight, nothing was done
    AlreadyRefreshing,
    Reloaded {
        applied: usize,
        /// Comments whose position is missing or no longer resolves
        broken: Vec<CommentRecord>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedComment {
    pub id: CommentId,
    /// The new comment was highlighted in the page
    pub applied: bool,
}

/// Configuration, providers and highlight state for one page session
pub struct Annotator<C = DummyCommentProvider> {
    config: AnnotatorConfig,
    providers: AnnotatorProviders<C>,
    engine: RefCell<HighlightEngine>,
    refreshing: Rc<Cell<bool>>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(AnnotatorConfig::default(), AnnotatorProviders::default())
    }
}

impl<C> Annotator<C> {
    pub fn new(config: AnnotatorConfig, providers: AnnotatorProviders<C>) -> Self {
        let engine = HighlightEngine::new(config.dynamic_block_html_limit);
        Self {
            config,
            providers,
            engine: RefCell::new(engine),
            refreshing: Rc::new(Cell::new(false)),
        }
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    pub fn providers(&self) -> &AnnotatorProviders<C> {
        &self.providers
    }

    pub fn engine(&self) -> Ref<'_, HighlightEngine> {
        self.engine.borrow()
    }

    /// The commentable content: the first match of the content selector, else `<body>`
    pub fn content_scope(&self, doc: &Document) -> usize {
        let root = doc.root_node().id;
        match doc.query_selector(root, &self.config.content_selector) {
            Ok(Some(scope)) => return scope,
            Ok(None) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(selector = %self.config.content_selector, "no content element, using body");
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("content selector does not parse: {_err}");
            }
        }
        doc.body().map_or(root, |body| body.id)
    }

    fn selection_context(&self, doc: &Document) -> SelectionContext<'_> {
        SelectionContext {
            config: &self.config,
            notifications: &*self.providers.notifications,
            screenshots: &*self.providers.screenshots,
            scope: self.content_scope(doc),
        }
    }

    /// Wraps the content's images in dynamic blocks so they can be selected
    pub fn prepare_content(&self, doc: &mut Document) -> Vec<usize> {
        if !self.config.enabled {
            return Vec::new();
        }
        let cx = self.selection_context(doc);
        ImageSelection.wrap_images(&cx, doc)
    }

    pub fn process_text_selection(
        &self,
        doc: &Document,
        range: Range,
        event: Option<&DomEvent>,
        options: ProcessOptions,
    ) -> Option<SelectionResult> {
        TextSelection.process(&self.selection_context(doc), doc, range, event, options)
    }

    pub fn process_image_selection(
        &self,
        doc: &Document,
        target: usize,
        event: Option<&DomEvent>,
        options: ProcessOptions,
    ) -> Option<SelectionResult> {
        ImageSelection.process(&self.selection_context(doc), doc, target, event, options)
    }

    pub fn process_svg_selection(
        &self,
        doc: &Document,
        target: usize,
        event: Option<&DomEvent>,
        options: ProcessOptions,
    ) -> Option<SelectionResult> {
        SvgSelection.process(&self.selection_context(doc), doc, target, event, options)
    }

    pub fn process_dynamic_block_selection(
        &self,
        doc: &Document,
        target: usize,
        event: Option<&DomEvent>,
        options: ProcessOptions,
    ) -> Option<SelectionResult> {
        DynamicBlockSelection.process(&self.selection_context(doc), doc, target, event, options)
    }

    pub fn apply_highlights(
        &self,
        doc: &mut Document,
        scope: usize,
        anchors: &[HighlightAnchor],
        on_click: &ClickCallback,
    ) -> ApplyReport {
        self.engine.borrow_mut().apply(doc, scope, anchors, on_click)
    }

    pub fn clear_highlights(&self, doc: &mut Document, scope: usize, anchors: &[HighlightAnchor]) {
        self.engine.borrow_mut().remove(doc, scope, anchors);
    }

    pub fn clear_all_highlights(&self, doc: &mut Document, scope: usize) {
        self.engine.borrow_mut().remove_all(doc, scope);
    }

    pub fn remove_comment_highlight(
        &self,
        doc: &mut Document,
        comment_id: &CommentId,
        scope: Option<usize>,
    ) -> Option<AnchorKind> {
        self.engine.borrow_mut().remove_one(doc, comment_id, scope)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.get()
    }

    /// Marks a reload as in flight. `None` if one already is.
    pub fn try_begin_refresh(&self) -> Option<RefreshGuard> {
        if self.refreshing.replace(true) {
            return None;
        }
        Some(RefreshGuard {
            flag: self.refreshing.clone(),
        })
    }
}

impl<C: CommentProvider> Annotator<C> {
    /// Clears every highlight, fetches the open comments of the page and highlights them again.
    ///
    /// Replies are not anchored. Comments whose position is missing or does not resolve come back
    /// as `broken`.
    pub async fn reload_highlights(
        &self,
        doc: &mut Document,
        page_id: &str,
        on_click: &ClickCallback,
    ) -> Result<ReloadOutcome, ProviderError> {
        let Some(_guard) = self.try_begin_refresh() else {
            #[cfg(feature = "tracing")]
            tracing::debug!(page_id, "highlight reload already in flight");
            return Ok(ReloadOutcome::AlreadyRefreshing);
        };

        let scope = self.content_scope(doc);
        self.clear_all_highlights(doc, scope);

        let comments = self.providers.comments.list_open_comments(page_id).await?;

        let mut anchors = Vec::new();
        let mut broken = Vec::new();
        for comment in comments {
            if comment.parent_id.is_some() {
                continue;
            }
            let comment = Rc::new(comment);
            match HighlightAnchor::from_record(comment.clone()) {
                Some(anchor) => anchors.push(anchor),
                None => broken.push(comment),
            }
        }

        let report = self.apply_highlights(doc, scope, &anchors, on_click);
        broken.extend(
            anchors
                .iter()
                .filter(|anchor| report.missed.contains(anchor.comment_id()))
                .map(|anchor| anchor.comment.clone()),
        );

        #[cfg(feature = "tracing")]
        tracing::info!(
            page_id,
            applied = report.applied,
            broken = broken.len(),
            "reloaded highlights"
        );

        Ok(ReloadOutcome::Reloaded {
            applied: report.applied,
            broken: broken.into_iter().map(Rc::unwrap_or_clone).collect(),
        })
    }

    /// Stores a new comment for `selection` and highlights it. Replies (with a `parent_id`) are
    /// stored only.
    pub async fn save_comment(
        &self,
        doc: &mut Document,
        page_id: &str,
        selection: &SelectionResult,
        text: &str,
        parent_id: Option<CommentId>,
        on_click: &ClickCallback,
    ) -> Result<SavedComment, ProviderError> {
        let is_reply = parent_id.is_some();
        let pos = encode(selection);
        let created = self
            .providers
            .comments
            .create_comment(
                page_id,
                NewComment {
                    pos: pos.clone(),
                    text: text.to_string(),
                    parent_id,
                    image: selection.image.clone(),
                },
            )
            .await?;

        let id = match created.id {
            Some(id) if created.success => id,
            _ => return Err(ProviderError::Request("comment was not created".to_string())),
        };
        if is_reply {
            return Ok(SavedComment { id, applied: false });
        }

        let mut record = CommentRecord::new(id.clone(), pos);
        record.text = text.to_string();
        let applied = match HighlightAnchor::from_record(record) {
            Some(anchor) => {
                let scope = self.content_scope(doc);
                self.apply_highlights(doc, scope, &[anchor], on_click).applied > 0
            }
            None => false,
        };
        Ok(SavedComment { id, applied })
    }

    /// Marks a comment completed and takes its highlight down
    pub async fn resolve_comment(
        &self,
        doc: &mut Document,
        comment_id: &CommentId,
    ) -> Result<Option<AnchorKind>, ProviderError> {
        self.providers
            .comments
            .update_comment(comment_id, CommentStatus::Completed, None)
            .await?;
        let scope = self.content_scope(doc);
        Ok(self.remove_comment_highlight(doc, comment_id, Some(scope)))
    }

    pub async fn delete_comment(
        &self,
        doc: &mut Document,
        comment_id: &CommentId,
    ) -> Result<Option<AnchorKind>, ProviderError> {
        self.providers.comments.delete_comment(comment_id).await?;
        let scope = self.content_scope(doc);
        Ok(self.remove_comment_highlight(doc, comment_id, Some(scope)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_guard_is_exclusive() {
        let annotator = Annotator::default();
        assert!(!annotator.is_refreshing());
        let guard = annotator.try_begin_refresh().unwrap();
        assert!(annotator.is_refreshing());
        assert!(annotator.try_begin_refresh().is_none());
        drop(guard);
        assert!(!annotator.is_refreshing());
        assert!(annotator.try_begin_refresh().is_some());
    }

    #[test]
    fn disabled_annotator_ignores_selections() {
        let config = AnnotatorConfig {
            enabled: false,
            ..Default::default()
        };
        let annotator = Annotator::new(config, AnnotatorProviders::default());
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let p = m.create_html_element("p", &[]);
        let text = m.create_text_node("hello");
        m.append_children(0, &[p]);
        m.append_children(p, &[text]);
        drop(m);

        let range = Range::within(text, 0, 5);
        assert!(annotator
            .process_text_selection(&doc, range, None, ProcessOptions::default())
            .is_none());
        assert!(annotator.prepare_content(&mut doc).is_empty());
    }
}
