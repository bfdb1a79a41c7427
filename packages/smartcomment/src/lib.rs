//! Comment anchoring for rendered wiki pages
//!
//! A user selects text, an image, an SVG link or a "dynamic block" in the page. A selection
//! strategy validates the selection and turns it into a [`SelectionResult`], which the
//! [position codec](position) encodes into the wire string stored with the comment. When the page
//! is rendered again the stored strings are decoded and the [`HighlightEngine`] locates their
//! targets in the fresh DOM, marks them and attaches click listeners through the
//! [`ListenerRegistry`].
//!
//! Most users will want the [`Annotator`], which bundles configuration, providers and the
//! highlight engine behind the interface a UI layer calls.
//!
//! ## Feature flags
//!  - `default`: Enables the features listed below.
//!  - `tracing`: Enables tracing support.

mod annotator;
mod config;
mod hash;
mod listeners;

pub mod highlight;
pub mod occurrence;
pub mod position;
pub mod selection;
pub mod validate;

pub use annotator::{Annotator, AnnotatorProviders, RefreshGuard, ReloadOutcome, SavedComment};
pub use config::AnnotatorConfig;
pub use hash::{image_hash, string_hash};
pub use highlight::{AnchorKind, ApplyReport, HighlightAnchor, HighlightEngine};
pub use listeners::{ClickCallback, ListenerRecord, ListenerRegistry};
pub use position::{PositionDescriptor, decode, encode};
pub use selection::{
    DynamicBlockSelection, ImageSelection, ProcessOptions, SelectionContext, SelectionError,
    SelectionKind, SelectionMetadata, SelectionResult, SelectionStrategy, SvgSelection,
    TextSelection,
};
pub use validate::{SelectionInput, ValidationError, validate};

/// Prefix of the per-comment highlight class, `smartcomment-hl-<comment id>`
pub const HIGHLIGHT_CLASS_PREFIX: &str = "smartcomment-hl-";
/// Attribute carrying the comment id on every highlighted element
pub const COMMENT_ID_ATTR: &str = "data-comment-id";
/// Attribute carrying the generated id of a highlighted SVG link
pub const SVG_ID_ATTR: &str = "data-svg-id";
/// Class of content regions that are selected as a whole
pub const DYNAMIC_BLOCK_CLASS: &str = "sc-dynamic-block";
/// Class added to dynamic blocks that wrap an image
pub const IMAGE_BLOCK_CLASS: &str = "sc-image-block";
/// Attribute keying a dynamic block independently of its markup
pub const DATA_HASH_ATTR: &str = "data-hash";
/// Attribute naming what a dynamic block contains, `image` for wrapped images
pub const DATA_TYPE_ATTR: &str = "data-type";

/// The highlight class for one comment
pub fn highlight_class(comment_id: &smartcomment_traits::comments::CommentId) -> String {
    format!("{HIGHLIGHT_CLASS_PREFIX}{comment_id}")
}
