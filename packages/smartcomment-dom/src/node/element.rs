use markup5ever::{QualName, local_name, ns};
use std::str::FromStr;

use super::{Attribute, Attributes};

macro_rules! local_names {
    ($($name:tt),+) => {
        [$(local_name!($name),)+]
    };
}

#[derive(Debug, Clone)]
pub struct ElementData {
    /// The elements tag name, namespace and prefix
    pub name: QualName,

    /// The elements id attribute (if it has one)
    pub id: Option<String>,

    /// The element's attributes
    pub attrs: Attributes,
}

impl ElementData {
    pub fn new(name: QualName, attrs: Vec<Attribute>) -> Self {
        let id = attrs
            .iter()
            .find(|attr| &attr.name.local == "id")
            .map(|attr| attr.value.clone());

        ElementData {
            name,
            id,
            attrs: Attributes::new(attrs),
        }
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        let attr = self.attrs.get(name)?;
        Some(&attr.value)
    }

    pub fn attr_parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        self.attr(name)?.trim().trim_end_matches("px").parse::<T>().ok()
    }

    /// Detects the presence of the attribute, treating *any* value as truthy.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.get(name).is_some()
    }

    pub fn local_name(&self) -> &str {
        &self.name.local
    }

    pub fn is_html(&self) -> bool {
        self.name.ns == ns!(html)
    }

    pub fn is_svg(&self) -> bool {
        self.name.ns == ns!(svg)
    }

    /// Elements serialized without a closing tag
    pub fn is_void(&self) -> bool {
        self.is_html()
            && local_names!(
                "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
                "source", "track", "wbr"
            )
            .contains(&self.name.local)
    }

    /// Elements whose text children are serialized without escaping
    pub fn is_raw_text(&self) -> bool {
        self.is_html()
            && local_names!("script", "style", "xmp", "iframe", "noembed", "noframes")
                .contains(&self.name.local)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Adds `class` to the class list. Returns false if it was already present.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let value = match self.attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.attrs.set_local("class", &value);
        true
    }

    /// Removes `class` from the class list, dropping the attribute once the list is empty.
    pub fn remove_class(&mut self, class: &str) -> bool {
        if !self.has_class(class) {
            return false;
        }
        let value = self
            .classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        if value.is_empty() {
            self.attrs.remove_local("class");
        } else {
            self.attrs.set_local("class", &value);
        }
        true
    }

    pub fn style_property(&self, name: &str) -> Option<&str> {
        parse_declarations(self.attr("style")?)
            .find(|(prop, _)| prop.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    pub fn set_style_property(&mut self, name: &str, value: &str) {
        let mut declarations: Vec<(String, String)> = parse_declarations(self.attr("style").unwrap_or(""))
            .filter(|(prop, _)| !prop.eq_ignore_ascii_case(name))
            .map(|(prop, value)| (prop.to_string(), value.to_string()))
            .collect();
        declarations.push((name.to_string(), value.to_string()));
        self.write_style(&declarations);
    }

    /// Returns false if the property was not set.
    pub fn remove_style_property(&mut self, name: &str) -> bool {
        let Some(style) = self.attr("style") else {
            return false;
        };
        let before = parse_declarations(style).count();
        let declarations: Vec<(String, String)> = parse_declarations(style)
            .filter(|(prop, _)| !prop.eq_ignore_ascii_case(name))
            .map(|(prop, value)| (prop.to_string(), value.to_string()))
            .collect();
        if declarations.len() == before {
            return false;
        }
        self.write_style(&declarations);
        true
    }

    fn write_style(&mut self, declarations: &[(String, String)]) {
        if declarations.is_empty() {
            self.attrs.remove_local("style");
            return;
        }
        let value = declarations
            .iter()
            .map(|(prop, value)| format!("{prop}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.attrs.set_local("style", &value);
    }

    pub(crate) fn flush_id(&mut self) {
        self.id = self.attr("id").map(str::to_string);
    }
}

fn parse_declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|declaration| {
        let (prop, value) = declaration.split_once(':')?;
        let prop = prop.trim();
        (!prop.is_empty()).then_some((prop, value.trim()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn div(attrs: Vec<Attribute>) -> ElementData {
        ElementData::new(QualName::new(None, ns!(html), local_name!("div")), attrs)
    }

    #[test]
    fn class_list_round_trip() {
        let mut el = div(vec![Attribute::new("class", "a  b")]);
        assert!(el.add_class("c"));
        assert!(!el.add_class("a"));
        assert_eq!(el.attr("class"), Some("a  b c"));
        assert!(el.remove_class("a"));
        assert!(el.remove_class("b"));
        assert!(el.remove_class("c"));
        assert!(!el.has_attr("class"));
    }

    #[test]
    fn style_properties() {
        let mut el = div(vec![Attribute::new("style", "color: red")]);
        el.set_style_property("cursor", "pointer");
        assert_eq!(el.style_property("cursor"), Some("pointer"));
        assert_eq!(el.attr("style"), Some("color: red; cursor: pointer;"));
        assert!(el.remove_style_property("color"));
        assert!(el.remove_style_property("cursor"));
        assert!(!el.has_attr("style"));
        assert!(!el.remove_style_property("cursor"));
    }
}
