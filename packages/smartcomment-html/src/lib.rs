//! HTML parsing for the smartcomment DOM, backed by html5ever.
//!
//! [`HtmlDocument`] parses a page into a [`smartcomment_dom::Document`].
//! [`DocumentHtmlParser`] is the underlying `TreeSink` and can parse into an existing document.

mod html_document;
mod html_sink;

pub use html_document::HtmlDocument;
pub use html_sink::DocumentHtmlParser;
