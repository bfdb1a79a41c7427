use std::ops::{Deref, DerefMut};

use crate::DocumentHtmlParser;

use smartcomment_dom::Document;

pub struct HtmlDocument {
    inner: Document,
}

impl Deref for HtmlDocument {
    type Target = Document;
    fn deref(&self) -> &Document {
        &self.inner
    }
}
impl DerefMut for HtmlDocument {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
impl From<HtmlDocument> for Document {
    fn from(doc: HtmlDocument) -> Document {
        doc.inner
    }
}

impl HtmlDocument {
    /// Parse an HTML page into an [`HtmlDocument`]
    pub fn from_html(html: &str) -> Self {
        let mut doc = Document::new();
        DocumentHtmlParser::parse_into_doc(&mut doc, html);
        HtmlDocument { inner: doc }
    }

    /// Convert the [`HtmlDocument`] into it's inner [`Document`]
    pub fn into_inner(self) -> Document {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_get_a_body() {
        let doc = HtmlDocument::from_html(r#"<div id="content"><p>Hello <b>big</b> world</p></div>"#);
        let content = doc.get_element_by_id("content").unwrap();
        assert_eq!(doc.body().map(|body| body.id), doc.get_node(content).unwrap().parent);
        assert_eq!(
            doc.get_node(content).unwrap().inner_html(),
            "<p>Hello <b>big</b> world</p>"
        );
    }

    #[test]
    fn svg_content_keeps_its_namespace() {
        let doc = HtmlDocument::from_html(
            r##"<svg viewBox="0 0 10 10"><a xlink:href="#x"><text x="1" y="2">Node</text></a></svg>"##,
        );
        let text = doc.query_selector(0, "svg text").unwrap().unwrap();
        let el = doc.get_node(text).unwrap().element_data().unwrap();
        assert!(el.is_svg());
        let link = doc.query_selector(0, "svg a").unwrap().unwrap();
        let href = doc.get_node(link).unwrap().element_data().unwrap().attrs.get("href").unwrap();
        assert_eq!(href.qualified_name(), "xlink:href");
    }
}
