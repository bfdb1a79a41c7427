use std::ops::{Deref, DerefMut};

use markup5ever::{LocalName, QualName, ns};

/// A tag attribute, e.g. `class="test"` in `<div class="test" ...>`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub struct Attribute {
    /// The name of the attribute (e.g. the `class` in `<div class="test">`)
    pub name: QualName,
    /// The value of the attribute (e.g. the `"test"` in `<div class="test">`)
    pub value: String,
}

impl Attribute {
    /// An attribute in the null namespace, which is what markup authors write almost everywhere
    pub fn new(local: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualName::new(None, ns!(), LocalName::from(local)),
            value: value.into(),
        }
    }

    /// The serialized name, including a prefix such as `xlink:` when present
    pub fn qualified_name(&self) -> String {
        match &self.name.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name.local),
            None => self.name.local.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Attributes {
    inner: Vec<Attribute>,
}

impl Attributes {
    pub fn new(inner: Vec<Attribute>) -> Self {
        Self { inner }
    }

    pub fn set(&mut self, name: QualName, value: &str) {
        let existing_attr = self.inner.iter_mut().find(|a| a.name == name);
        if let Some(existing_attr) = existing_attr {
            existing_attr.value.clear();
            existing_attr.value.push_str(value);
        } else {
            self.push(Attribute {
                name: name.clone(),
                value: value.to_string(),
            });
        }
    }

    pub fn remove(&mut self, name: &QualName) -> Option<Attribute> {
        let idx = self.inner.iter().position(|attr| attr.name == *name);
        idx.map(|idx| self.inner.remove(idx))
    }

    /// Lookup by local name, ignoring namespace and prefix
    pub fn get(&self, local: &str) -> Option<&Attribute> {
        self.inner.iter().find(|attr| &*attr.name.local == local)
    }

    /// Set by local name. An existing attribute keeps its namespace.
    pub fn set_local(&mut self, local: &str, value: &str) {
        match self.inner.iter_mut().find(|a| &*a.name.local == local) {
            Some(existing_attr) => {
                existing_attr.value.clear();
                existing_attr.value.push_str(value);
            }
            None => self.push(Attribute::new(local, value)),
        }
    }

    pub fn remove_local(&mut self, local: &str) -> Option<Attribute> {
        let idx = self.inner.iter().position(|a| &*a.name.local == local);
        idx.map(|idx| self.inner.remove(idx))
    }
}

impl Deref for Attributes {
    type Target = Vec<Attribute>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl DerefMut for Attributes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
