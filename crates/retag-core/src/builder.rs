//! Reference tag factory
//!
//! [`TagBuilder`] plays the host parser's part at the single call site: it
//! turns a raw start-tag (name plus raw attribute pairs) into a [`Tag`] and
//! hands it to the hook before returning it to the tree builder.

use crate::hook::{HookError, TagHook};
use crate::tag::{AttrValue, Attributes, Tag};

/// Attributes whose values are whitespace-separated token lists
pub const MULTI_VALUED_ATTRIBUTES: &[&str] = &[
    "class",
    "rel",
    "rev",
    "accept-charset",
    "headers",
    "accesskey",
    "dropzone",
];

/// Builds tags and runs the hook once per tag
pub struct TagBuilder<H> {
    hook: H,
    multi_valued: Vec<String>,
    built: usize,
}

impl<H: TagHook> TagBuilder<H> {
    pub fn new(hook: H) -> Self {
        Self {
            hook,
            multi_valued: MULTI_VALUED_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            built: 0,
        }
    }

    /// Override which attributes are split into token lists
    pub fn with_multi_valued<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.multi_valued = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Number of tags successfully built so far
    pub fn built(&self) -> usize {
        self.built
    }

    /// Create a tag from a raw start-tag
    ///
    /// The raw name is lowercased and passed through
    /// [`TagHook::preprocess_name`] before the tag exists; the hook's
    /// [`TagHook::on_tag`] then runs on the finished tag.
    pub fn build<I, K, V>(&mut self, raw_name: &str, raw_attrs: I) -> Result<Tag, HookError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let lowered = raw_name.to_lowercase();
        let name = self.hook.preprocess_name(&lowered).into_owned();

        let mut attrs = Attributes::new();
        for (key, value) in raw_attrs {
            let key = key.into().to_lowercase();
            let value = self.normalize_value(&key, value.into());
            attrs.insert(key, value);
        }

        let mut tag = Tag { name, attrs };
        self.hook.on_tag(&mut tag)?;
        self.built += 1;
        Ok(tag)
    }

    fn normalize_value(&self, key: &str, value: String) -> AttrValue {
        if self.multi_valued.iter().any(|m| m == key) {
            AttrValue::List(value.split_whitespace().map(str::to_string).collect())
        } else {
            AttrValue::Text(value)
        }
    }
}
