//! Parser integration hook
//!
//! A host parser calls [`TagHook::on_tag`] exactly once for every tag it
//! creates, after the initial name and attributes are set and before the
//! node is linked into the tree. Hosts that rewrite names before allocating
//! a tag may also call [`TagHook::preprocess_name`].

use std::borrow::Cow;
use std::error::Error as StdError;
use thiserror::Error;

use crate::tag::TagNode;

/// Error surfaced to the host parser when a hook refuses a tag
#[derive(Error, Debug)]
#[error("tag hook failed on <{tag}>: {source}")]
pub struct HookError {
    /// Name of the tag at the time of failure
    pub tag: String,
    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

impl HookError {
    pub fn new(tag: impl Into<String>, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            tag: tag.into(),
            source: source.into(),
        }
    }
}

/// Per-tag extension point invoked by the host parser
pub trait TagHook {
    /// Rewrite a tag name before the tag object exists
    fn preprocess_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(name)
    }

    /// Inspect and mutate a freshly created tag
    fn on_tag(&self, tag: &mut dyn TagNode) -> Result<(), HookError>;
}

/// Hook that leaves every tag untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl TagHook for NoHook {
    fn on_tag(&self, _tag: &mut dyn TagNode) -> Result<(), HookError> {
        Ok(())
    }
}

impl<H: TagHook + ?Sized> TagHook for &H {
    fn preprocess_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        (**self).preprocess_name(name)
    }

    fn on_tag(&self, tag: &mut dyn TagNode) -> Result<(), HookError> {
        (**self).on_tag(tag)
    }
}

impl<H: TagHook> TagHook for Option<H> {
    fn preprocess_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            Some(hook) => hook.preprocess_name(name),
            None => Cow::Borrowed(name),
        }
    }

    fn on_tag(&self, tag: &mut dyn TagNode) -> Result<(), HookError> {
        match self {
            Some(hook) => hook.on_tag(tag),
            None => Ok(()),
        }
    }
}
