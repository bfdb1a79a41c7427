//! Selection strategies: one per kind of selectable content.
//!
//! Each strategy turns an interaction target into a validated [`SelectionResult`]. Rejected
//! selections never touch the document.

mod dynamic_block;
mod image;
mod svg;
mod text;

pub use dynamic_block::{DynamicBlockSelection, block_key};
pub use image::{ImageSelection, image_dimensions};
pub use svg::{SvgMetadata, SvgSelection, generate_svg_id, last_path_segment, slugify, visible_text};
pub use text::TextSelection;

pub(crate) use svg::{is_svg_link, svg_link_for};

use serde::{Deserialize, Serialize};
use smartcomment_dom::Document;
use smartcomment_traits::shell::{Notice, NotificationProvider, ScreenshotProvider};
use smartcomment_traits::{DomEvent, DomRect};

use crate::AnnotatorConfig;
use crate::validate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionKind {
    Text,
    Image,
    Svg,
    DynamicBlock,
}

/// Kind specific details of a selection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SelectionMetadata {
    Text {
        /// The selection crossed text node boundaries
        spans_nodes: bool,
    },
    Image {
        src: String,
        width: f32,
        height: f32,
        hash: String,
    },
    Svg(SvgMetadata),
    DynamicBlock {
        data_type: Option<String>,
        /// Keyed by `data-hash` rather than by its markup
        hashed: bool,
    },
}

/// A validated selection, ready to be encoded with [`encode`](crate::encode)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionResult {
    pub kind: SelectionKind,
    /// Selected text, or the bracketed descriptor for non-text kinds
    pub text: String,
    pub index: usize,
    /// Node the selection was made on. Only valid until the document is next mutated.
    #[serde(skip)]
    pub element: Option<usize>,
    /// Screenshot of the selected region as a data URL
    pub image: Option<String>,
    pub rect: DomRect,
    /// Pointer position of the event that made the selection
    pub pointer: Option<(f32, f32)>,
    pub metadata: SelectionMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("target is not selectable: {0}")]
    Unsupported(&'static str),
    #[error("target lies outside the commentable content")]
    Excluded,
    #[error("selected text could not be located in the content")]
    NotFound,
}

impl SelectionError {
    pub fn notice(&self) -> Notice {
        match self {
            SelectionError::Invalid(err) => Notice::SelectionRejected {
                reason: err.reason(),
            },
            _ => Notice::SelectionFailed,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    pub capture_screenshot: bool,
}

/// Everything a strategy needs besides the document and the target
pub struct SelectionContext<'a> {
    pub config: &'a AnnotatorConfig,
    pub notifications: &'a dyn NotificationProvider,
    pub screenshots: &'a dyn ScreenshotProvider,
    /// The commentable content element
    pub scope: usize,
}

impl SelectionContext<'_> {
    /// Targets outside the scope, or inside one of the excluded regions, cannot be selected
    pub fn is_excluded(&self, doc: &Document, node_id: usize) -> bool {
        if !doc.is_inclusive_ancestor_of(self.scope, node_id) {
            return true;
        }
        self.config
            .excluded_region_selectors
            .iter()
            .any(|selector| match doc.closest(node_id, selector) {
                Ok(found) => found.is_some(),
                Err(_err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("ignoring excluded region: {_err}");
                    false
                }
            })
    }

    pub(crate) fn check_target(&self, doc: &Document, node_id: usize) -> Result<(), SelectionError> {
        if doc.get_node(node_id).is_none() || self.is_excluded(doc, node_id) {
            return Err(SelectionError::Excluded);
        }
        Ok(())
    }
}

pub trait SelectionStrategy {
    type Target: Copy + std::fmt::Debug;

    const KIND: SelectionKind;

    /// Validates the target and builds the result
    fn select(
        &self,
        cx: &SelectionContext<'_>,
        doc: &Document,
        target: Self::Target,
    ) -> Result<SelectionResult, SelectionError>;

    /// The full interaction: global switch, selection, user notification and screenshot.
    ///
    /// Image selections fail silently.
    fn process(
        &self,
        cx: &SelectionContext<'_>,
        doc: &Document,
        target: Self::Target,
        event: Option<&DomEvent>,
        options: ProcessOptions,
    ) -> Option<SelectionResult> {
        if !cx.config.enabled {
            return None;
        }

        match self.select(cx, doc, target) {
            Ok(mut result) => {
                if let Some(pointer) = event.and_then(DomEvent::pointer) {
                    result.pointer = Some(pointer);
                }
                if options.capture_screenshot || cx.config.capture_screenshot {
                    result.image = cx.screenshots.capture(result.rect);
                }
                Some(result)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::info!(kind = ?Self::KIND, node = ?target, "selection rejected: {err}");
                if Self::KIND != SelectionKind::Image {
                    cx.notifications.notify(err.notice());
                }
                None
            }
        }
    }
}
