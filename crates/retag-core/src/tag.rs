//! Tag node model
//!
//! The engine only ever talks to tags through the [`TagNode`] trait, so any
//! host parser can expose its own element type. [`Tag`] is a plain in-memory
//! implementation used by [`crate::TagBuilder`], the tests and the CLI.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a single attribute
///
/// Multi-valued attributes such as `class` hold an ordered token list;
/// everything else is plain text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    List(Vec<String>),
}

impl AttrValue {
    /// Get the text if this is a plain value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::List(_) => None,
        }
    }

    /// Get the tokens if this is a list value
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::Text(_) => None,
            AttrValue::List(tokens) => Some(tokens),
        }
    }

    /// Check whether `token` is one of the list tokens, or equals the text
    pub fn contains_token(&self, token: &str) -> bool {
        match self {
            AttrValue::Text(s) => s == token,
            AttrValue::List(tokens) => tokens.iter().any(|t| t == token),
        }
    }

    /// Render the value as a single string (list tokens joined by a space)
    pub fn to_joined(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::List(tokens) => tokens.join(" "),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::List(tokens) => f.write_str(&tokens.join(" ")),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(tokens: Vec<String>) -> Self {
        AttrValue::List(tokens)
    }
}

impl From<Vec<&str>> for AttrValue {
    fn from(tokens: Vec<&str>) -> Self {
        AttrValue::List(tokens.into_iter().map(str::to_string).collect())
    }
}

impl PartialEq<&str> for AttrValue {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, AttrValue::Text(s) if s == other)
    }
}

/// Ordered attribute mapping
///
/// Iteration follows insertion order; removing a key keeps the order of the
/// remaining keys. Two mappings are equal only when their entries match in
/// the same order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: IndexMap<String, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut AttrValue> {
        self.entries.get_mut(key)
    }

    /// Insert or overwrite a value, returning the previous one
    ///
    /// Overwriting keeps the key at its original position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttrValue>,
    ) -> Option<AttrValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a key, preserving the order of the rest
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.entries.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Attributes {
    type Item = (String, AttrValue);
    type IntoIter = indexmap::map::IntoIter<String, AttrValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A mutable, in-progress element as seen by the rule engine
///
/// Hosts implement this for their own element type. The engine borrows a
/// node for the duration of one `apply` call and never keeps it.
pub trait TagNode {
    /// Current tag name
    fn name(&self) -> &str;

    /// Replace the tag name
    fn set_name(&mut self, name: String);

    /// Current attribute mapping
    fn attrs(&self) -> &Attributes;

    /// Exclusive access to the attribute mapping for in-place edits
    fn attrs_mut(&mut self) -> &mut Attributes;

    /// Swap the whole attribute mapping
    fn replace_attrs(&mut self, attrs: Attributes) {
        *self.attrs_mut() = attrs;
    }

    /// Look up a single attribute
    fn get_attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs().get(key)
    }

    fn has_attr(&self, key: &str) -> bool {
        self.attrs().contains_key(key)
    }
}

/// Plain in-memory tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attrs: Attributes,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Attributes::new(),
        }
    }

    /// Builder-style attribute insertion
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key, value);
        self
    }
}

impl TagNode for Tag {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    fn attrs_mut(&mut self) -> &mut Attributes {
        &mut self.attrs
    }

    fn replace_attrs(&mut self, attrs: Attributes) {
        self.attrs = attrs;
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in self.attrs.iter() {
            write!(f, " {}=\"{}\"", key, value)?;
        }
        f.write_str(">")
    }
}
