//! Single old/new tag-name rename
//!
//! This is the behaviour that predates the rule engine: one original name
//! (matched case-insensitively) mapped to one replacement. It works both
//! before a tag exists, via [`LegacyRename::rewrite`], and as an ordinary
//! post-creation rule via [`LegacyRename::to_rule`].

use std::borrow::Cow;

use crate::error::ConstructionError;
use crate::rule::{Matcher, NameAction, Rule};

/// A lowercase `original -> replacement` tag-name pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRename {
    original: String,
    replacement: String,
}

impl LegacyRename {
    /// Both names must be non-empty; they are stored lowercased
    pub fn new(original: &str, replacement: &str) -> Result<Self, ConstructionError> {
        if original.is_empty() {
            return Err(ConstructionError::EmptyName("original tag name"));
        }
        if replacement.is_empty() {
            return Err(ConstructionError::EmptyName("replacement tag name"));
        }
        Ok(Self {
            original: original.to_lowercase(),
            replacement: replacement.to_lowercase(),
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Return the replacement if `name` is the original, else `name` itself
    pub fn rewrite<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if !name.is_empty() && name.to_lowercase() == self.original {
            Cow::Owned(self.replacement.clone())
        } else {
            Cow::Borrowed(name)
        }
    }

    /// The equivalent post-creation rule
    pub fn to_rule(&self) -> Rule {
        Rule {
            label: Some(format!("rename {} -> {}", self.original, self.replacement)),
            matcher: Matcher::TagName(self.original.clone()),
            name: Some(NameAction::Constant(self.replacement.clone())),
            attrs: None,
            side_effect: None,
            priority: 0,
            stop_processing: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retag_core::Tag;

    #[test]
    fn test_new_lowercases() {
        let pair = LegacyRename::new("B", "BlockQuote").unwrap();
        assert_eq!(pair.original(), "b");
        assert_eq!(pair.replacement(), "blockquote");
    }

    #[test]
    fn test_new_rejects_empty_names() {
        assert_eq!(
            LegacyRename::new("", "blockquote"),
            Err(ConstructionError::EmptyName("original tag name"))
        );
        assert_eq!(
            LegacyRename::new("b", ""),
            Err(ConstructionError::EmptyName("replacement tag name"))
        );
    }

    #[test]
    fn test_rewrite() {
        let pair = LegacyRename::new("b", "blockquote").unwrap();
        assert_eq!(pair.rewrite("b"), "blockquote");
        assert_eq!(pair.rewrite("B"), "blockquote");
        assert_eq!(pair.rewrite("i"), "i");
        assert_eq!(pair.rewrite(""), "");
        assert!(matches!(pair.rewrite("em"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_to_rule_matches_rewrite() {
        let pair = LegacyRename::new("b", "strong").unwrap();
        let rule = pair.to_rule();

        let mut bold = Tag::new("B");
        let mut italic = Tag::new("i");
        rule.apply(&mut bold).unwrap();
        rule.apply(&mut italic).unwrap();

        assert_eq!(bold.name, "strong");
        assert_eq!(italic.name, "i");
        assert_eq!(rule.tag_name(), Some("b"));
    }
}
