//! CSS selector queries, backed by the `selectors` crate.

use cssparser::{Parser as CssParser, ParserInput, ToCss};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{
    ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags, QuirksMode, matches_selector,
};
use selectors::parser::{ParseRelative, SelectorParseErrorKind};
use selectors::{NthIndexCache, OpaqueElement};

use crate::{Document, Node, TreeTraverser};

pub type SelectorList = selectors::SelectorList<SelectorImpl>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector {selector:?}: {reason}")]
pub struct SelectorError {
    pub selector: String,
    pub reason: String,
}

impl Document {
    /// Find the first descendant of `scope` that matches the selector
    pub fn query_selector(&self, scope: usize, selector: &str) -> Result<Option<usize>, SelectorError> {
        let selector_list = parse_selector(selector)?;
        Ok(self.query_selector_raw(scope, &selector_list))
    }

    pub fn query_selector_raw(&self, scope: usize, selector_list: &SelectorList) -> Option<usize> {
        TreeTraverser::new_with_root(self, scope)
            .skip(1)
            .find(|id| matches_list(selector_list, &self.nodes[*id]))
    }

    /// Every descendant of `scope` that matches the selector, in document order
    pub fn query_selector_all(&self, scope: usize, selector: &str) -> Result<Vec<usize>, SelectorError> {
        let selector_list = parse_selector(selector)?;
        Ok(self.query_selector_all_raw(scope, &selector_list))
    }

    pub fn query_selector_all_raw(&self, scope: usize, selector_list: &SelectorList) -> Vec<usize> {
        TreeTraverser::new_with_root(self, scope)
            .skip(1)
            .filter(|id| matches_list(selector_list, &self.nodes[*id]))
            .collect()
    }

    pub fn matches(&self, node_id: usize, selector: &str) -> Result<bool, SelectorError> {
        let selector_list = parse_selector(selector)?;
        Ok(self
            .get_node(node_id)
            .is_some_and(|node| matches_list(&selector_list, node)))
    }

    /// Nearest inclusive ancestor element matching the selector
    pub fn closest(&self, node_id: usize, selector: &str) -> Result<Option<usize>, SelectorError> {
        let selector_list = parse_selector(selector)?;
        Ok(self.closest_where(node_id, |node| matches_list(&selector_list, node)))
    }
}

pub fn parse_selector(selector: &str) -> Result<SelectorList, SelectorError> {
    let mut input = ParserInput::new(selector);
    let mut parser = CssParser::new(&mut input);
    SelectorList::parse(&SelectorParser, &mut parser, ParseRelative::No).map_err(|err| {
        #[cfg(feature = "tracing")]
        tracing::debug!("failed to parse selector {selector:?}: {err:?}");
        SelectorError {
            selector: selector.to_string(),
            reason: format!("{:?}", err.kind),
        }
    })
}

/// `[name="value"]` with the value quoted and escaped as a CSS string
pub fn attribute_selector(name: &str, value: &str) -> String {
    let mut selector = format!("[{name}=");
    // Writing into a String cannot fail
    let _ = cssparser::serialize_string(value, &mut selector);
    selector.push(']');
    selector
}

fn matches_list(selector_list: &SelectorList, node: &Node) -> bool {
    if !node.is_element() {
        return false;
    }

    let mut nth_index_cache = NthIndexCache::default();
    let mut context = MatchingContext::new(
        MatchingMode::Normal,
        None,
        &mut nth_index_cache,
        QuirksMode::NoQuirks,
        NeedsSelectorFlags::No,
        IgnoreNthChildForInvalidation::No,
    );

    selector_list
        .0
        .iter()
        .any(|selector| matches_selector(selector, 0, None, &node, &mut context))
}

impl<'a> selectors::Element for &'a Node {
    type Impl = SelectorImpl;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(*self)
    }

    fn parent_element(&self) -> Option<Self> {
        let node: &'a Node = *self;
        node.parent_node().filter(|parent| parent.is_element())
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let node: &'a Node = *self;
        let mut n = 1;
        while let Some(sibling) = node.backward(n) {
            if sibling.is_element() {
                return Some(sibling);
            }
            n += 1;
        }
        None
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let node: &'a Node = *self;
        let mut n = 1;
        while let Some(sibling) = node.forward(n) {
            if sibling.is_element() {
                return Some(sibling);
            }
            n += 1;
        }
        None
    }

    fn first_element_child(&self) -> Option<Self> {
        let node: &'a Node = *self;
        node.children
            .iter()
            .map(|id| node.with(*id))
            .find(|child| child.is_element())
    }

    fn is_html_element_in_html_document(&self) -> bool {
        self.element_data().is_some_and(|el| el.is_html())
    }

    fn has_local_name(&self, local_name: &str) -> bool {
        self.local_name() == Some(local_name)
    }

    fn has_namespace(&self, _ns: &()) -> bool {
        true
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.element_data().map(|el| &el.name) == other.element_data().map(|el| &el.name)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&()>,
        local_name: &CssString,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        if !matches!(ns, NamespaceConstraint::Specific(()) | NamespaceConstraint::Any) {
            return false;
        }

        let Some(value) = self.attr(&local_name.0) else {
            return false;
        };
        operation.eval_str(value)
    }

    fn match_non_ts_pseudo_class(
        &self,
        pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pc {}
    }

    fn match_pseudo_element(
        &self,
        pe: &PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        match *pe {}
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.local_name(), Some("a" | "area")) && self.attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.local_name() == Some("slot")
    }

    fn has_id(&self, id: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.attr("id")
            .is_some_and(|value| case_sensitivity.eq(value.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(&self, name: &CssString, case_sensitivity: CaseSensitivity) -> bool {
        self.element_data().is_some_and(|el| {
            el.classes()
                .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
        })
    }

    fn imported_part(&self, _name: &CssString) -> Option<CssString> {
        None
    }

    fn is_part(&self, _name: &CssString) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.children.iter().all(|id| {
            let child = self.with(*id);
            !child.is_element() && child.text_data().is_none_or(|text| text.content.is_empty())
        })
    }

    fn is_root(&self) -> bool {
        self.parent_node()
            .is_some_and(|parent| matches!(parent.data, crate::NodeData::Document))
    }
}

/// String wrapper that implements ToCss
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CssString(pub String);

impl From<&str> for CssString {
    fn from(s: &str) -> Self {
        CssString(s.to_string())
    }
}

impl AsRef<str> for CssString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for CssString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl ToCss for CssString {
    fn to_css<W>(&self, dest: &mut W) -> std::fmt::Result
    where
        W: std::fmt::Write,
    {
        cssparser::serialize_string(&self.0, dest)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SelectorImpl;

impl selectors::SelectorImpl for SelectorImpl {
    type ExtraMatchingData<'a> = ();
    type AttrValue = CssString;
    type Identifier = CssString;
    type LocalName = CssString;
    type NamespacePrefix = CssString;
    type NamespaceUrl = ();
    type BorrowedLocalName = str;
    type BorrowedNamespaceUrl = ();
    type NonTSPseudoClass = NonTSPseudoClass;
    type PseudoElement = PseudoElement;
}

/// No non-tree-structural pseudo-classes are supported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonTSPseudoClass {}

impl selectors::parser::NonTSPseudoClass for NonTSPseudoClass {
    type Impl = SelectorImpl;

    fn is_active_or_hover(&self) -> bool {
        match *self {}
    }

    fn is_user_action_state(&self) -> bool {
        match *self {}
    }
}

impl ToCss for NonTSPseudoClass {
    fn to_css<W>(&self, _dest: &mut W) -> std::fmt::Result
    where
        W: std::fmt::Write,
    {
        match *self {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoElement {}

impl selectors::parser::PseudoElement for PseudoElement {
    type Impl = SelectorImpl;
}

impl ToCss for PseudoElement {
    fn to_css<W>(&self, _dest: &mut W) -> std::fmt::Result
    where
        W: std::fmt::Write,
    {
        match *self {}
    }
}

pub struct SelectorParser;

impl<'i> selectors::parser::Parser<'i> for SelectorParser {
    type Impl = SelectorImpl;
    type Error = SelectorParseErrorKind<'i>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Document, usize, usize, usize) {
        let mut doc = Document::new();
        let mut m = doc.mutate();
        let root = m.create_html_element("div", &[("id", "content")]);
        let a = m.create_html_element("div", &[("class", "sc-dynamic-block sc-image-block"), ("data-hash", "img[1f]")]);
        let b = m.create_html_element("span", &[("class", "note"), ("data-hash", "he said \"hi\"")]);
        let text = m.create_text_node("x");
        m.append_children(0, &[root]);
        m.append_children(root, &[a, b]);
        m.append_children(b, &[text]);
        drop(m);
        (doc, root, a, b)
    }

    #[test]
    fn class_and_attribute_queries() {
        let (doc, root, a, b) = sample();
        assert_eq!(doc.query_selector_all(root, ".sc-dynamic-block").unwrap(), vec![a]);
        assert_eq!(doc.query_selector(0, "#content > span.note").unwrap(), Some(b));
        assert_eq!(
            doc.query_selector(root, &attribute_selector("data-hash", "img[1f]")).unwrap(),
            Some(a)
        );
        assert_eq!(
            doc.query_selector(root, &attribute_selector("data-hash", "he said \"hi\"")).unwrap(),
            Some(b)
        );
        assert!(doc.matches(a, "div.sc-image-block").unwrap());
        assert_eq!(doc.closest(a, "#content").unwrap(), Some(root));
    }

    #[test]
    fn scope_itself_is_not_a_match() {
        let (doc, root, ..) = sample();
        assert_eq!(doc.query_selector(root, "#content").unwrap(), None);
    }

    #[test]
    fn invalid_selectors_are_errors() {
        let (doc, root, ..) = sample();
        let err = doc.query_selector_all(root, "div[").unwrap_err();
        assert_eq!(err.selector, "div[");
        assert!(doc.query_selector(root, ":hover").is_err());
    }
}
