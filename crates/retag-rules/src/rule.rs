//! A single tag transformation rule
//!
//! A rule pairs a matcher with up to three actions, always run in the same
//! order: rename, replace attributes, side effect. Rules are immutable once
//! built; see [`crate::RuleSpec`] for construction.

use retag_core::{Attributes, TagNode};
use std::fmt;

use crate::error::{ApplyError, Phase, RuleFailure};

/// Decides whether a rule applies to a tag
pub trait MatchPredicate: Send + Sync {
    fn matches(&self, tag: &dyn TagNode) -> Result<bool, RuleFailure>;
}

/// Computes a replacement name; `None` or an empty name means no change
pub trait NameTransformer: Send + Sync {
    fn transform_name(&self, tag: &dyn TagNode) -> Result<Option<String>, RuleFailure>;
}

/// Computes a full replacement attribute mapping; `None` keeps the current one
pub trait AttrsTransformer: Send + Sync {
    fn transform_attrs(&self, tag: &dyn TagNode) -> Result<Option<Attributes>, RuleFailure>;
}

/// Mutates a tag in place
pub trait SideEffect: Send + Sync {
    fn run(&self, tag: &mut dyn TagNode) -> Result<(), RuleFailure>;
}

impl<F> MatchPredicate for F
where
    F: Fn(&dyn TagNode) -> bool + Send + Sync,
{
    fn matches(&self, tag: &dyn TagNode) -> Result<bool, RuleFailure> {
        Ok(self(tag))
    }
}

impl<F> NameTransformer for F
where
    F: Fn(&dyn TagNode) -> Option<String> + Send + Sync,
{
    fn transform_name(&self, tag: &dyn TagNode) -> Result<Option<String>, RuleFailure> {
        Ok(self(tag))
    }
}

impl<F> AttrsTransformer for F
where
    F: Fn(&dyn TagNode) -> Option<Attributes> + Send + Sync,
{
    fn transform_attrs(&self, tag: &dyn TagNode) -> Result<Option<Attributes>, RuleFailure> {
        Ok(self(tag))
    }
}

impl<F> SideEffect for F
where
    F: Fn(&mut dyn TagNode) + Send + Sync,
{
    fn run(&self, tag: &mut dyn TagNode) -> Result<(), RuleFailure> {
        self(tag);
        Ok(())
    }
}

/// Wraps a closure that returns `Result` so it can stand in for any of the
/// capability traits
pub(crate) struct Fallible<F>(pub(crate) F);

impl<F> MatchPredicate for Fallible<F>
where
    F: Fn(&dyn TagNode) -> Result<bool, RuleFailure> + Send + Sync,
{
    fn matches(&self, tag: &dyn TagNode) -> Result<bool, RuleFailure> {
        (self.0)(tag)
    }
}

impl<F> NameTransformer for Fallible<F>
where
    F: Fn(&dyn TagNode) -> Result<Option<String>, RuleFailure> + Send + Sync,
{
    fn transform_name(&self, tag: &dyn TagNode) -> Result<Option<String>, RuleFailure> {
        (self.0)(tag)
    }
}

impl<F> AttrsTransformer for Fallible<F>
where
    F: Fn(&dyn TagNode) -> Result<Option<Attributes>, RuleFailure> + Send + Sync,
{
    fn transform_attrs(&self, tag: &dyn TagNode) -> Result<Option<Attributes>, RuleFailure> {
        (self.0)(tag)
    }
}

impl<F> SideEffect for Fallible<F>
where
    F: Fn(&mut dyn TagNode) -> Result<(), RuleFailure> + Send + Sync,
{
    fn run(&self, tag: &mut dyn TagNode) -> Result<(), RuleFailure> {
        (self.0)(tag)
    }
}

/// Which tags a rule applies to
pub enum Matcher {
    /// Every tag
    Any,
    /// Tags whose lowercased name equals this (already lowercased) name
    TagName(String),
    Custom(Box<dyn MatchPredicate>),
}

impl Matcher {
    fn matches(&self, tag: &dyn TagNode) -> Result<bool, RuleFailure> {
        match self {
            Matcher::Any => Ok(true),
            Matcher::TagName(name) => Ok(tag.name().to_lowercase() == *name),
            Matcher::Custom(predicate) => predicate.matches(tag),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Any => f.write_str("Any"),
            Matcher::TagName(name) => f.debug_tuple("TagName").field(name).finish(),
            Matcher::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

pub(crate) enum NameAction {
    Constant(String),
    Custom(Box<dyn NameTransformer>),
}

impl NameAction {
    fn compute(&self, tag: &dyn TagNode) -> Result<Option<String>, RuleFailure> {
        match self {
            NameAction::Constant(name) => Ok(Some(name.clone())),
            NameAction::Custom(transform) => transform.transform_name(tag),
        }
    }
}

pub(crate) enum AttrsAction {
    Constant(Attributes),
    Custom(Box<dyn AttrsTransformer>),
}

impl AttrsAction {
    fn compute(&self, tag: &dyn TagNode) -> Result<Option<Attributes>, RuleFailure> {
        match self {
            AttrsAction::Constant(attrs) => Ok(Some(attrs.clone())),
            AttrsAction::Custom(transform) => transform.transform_attrs(tag),
        }
    }
}

/// One atomic transformation unit
pub struct Rule {
    pub(crate) label: Option<String>,
    pub(crate) matcher: Matcher,
    pub(crate) name: Option<NameAction>,
    pub(crate) attrs: Option<AttrsAction>,
    pub(crate) side_effect: Option<Box<dyn SideEffect>>,
    pub(crate) priority: i32,
    pub(crate) stop_processing: bool,
}

impl Rule {
    /// Optional human-readable label
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn stop_processing(&self) -> bool {
        self.stop_processing
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// The tag name this rule is restricted to, if any
    pub fn tag_name(&self) -> Option<&str> {
        match &self.matcher {
            Matcher::TagName(name) => Some(name),
            _ => None,
        }
    }

    /// Check whether the rule applies
    ///
    /// A failing predicate counts as a non-match.
    pub fn applies(&self, tag: &dyn TagNode) -> bool {
        match self.matcher.matches(tag) {
            Ok(matched) => matched,
            Err(failure) => {
                log::debug!(
                    "predicate of rule {} failed on <{}>, treating as no match: {}",
                    self.describe(),
                    tag.name(),
                    failure
                );
                false
            }
        }
    }

    /// Apply the rule to a tag, returning its stop flag
    ///
    /// Returns `Ok(false)` without touching the tag when the rule does not
    /// match.
    pub fn apply(&self, tag: &mut dyn TagNode) -> Result<bool, ApplyError> {
        if !self.applies(tag) {
            return Ok(false);
        }
        self.apply_matched(tag)
    }

    /// Run the actions of a rule that is known to match
    pub(crate) fn apply_matched(&self, tag: &mut dyn TagNode) -> Result<bool, ApplyError> {
        if let Some(action) = &self.name {
            let new_name = action
                .compute(tag)
                .map_err(|e| self.failure(tag, Phase::Name, e))?;
            if let Some(new_name) = new_name.filter(|n| !n.is_empty()) {
                tag.set_name(new_name);
            }
        }

        if let Some(action) = &self.attrs {
            let new_attrs = action
                .compute(tag)
                .map_err(|e| self.failure(tag, Phase::Attrs, e))?;
            if let Some(new_attrs) = new_attrs {
                if &new_attrs != tag.attrs() {
                    tag.replace_attrs(new_attrs);
                }
            }
        }

        if let Some(effect) = &self.side_effect {
            effect
                .run(tag)
                .map_err(|e| self.failure(tag, Phase::SideEffect, e))?;
        }

        Ok(self.stop_processing)
    }

    fn failure(&self, tag: &dyn TagNode, phase: Phase, source: RuleFailure) -> ApplyError {
        ApplyError {
            rule: self.describe(),
            tag: tag.name().to_string(),
            phase,
            source,
        }
    }

    /// One-line summary used in logs, errors and listings
    pub fn describe(&self) -> String {
        let mut out = match &self.label {
            Some(label) => format!("'{}'", label),
            None => match &self.matcher {
                Matcher::Any => "<*>".to_string(),
                Matcher::TagName(name) => format!("<{}>", name),
                Matcher::Custom(_) => "<custom>".to_string(),
            },
        };

        let mut actions = Vec::new();
        match &self.name {
            Some(NameAction::Constant(name)) => actions.push(format!("rename to {}", name)),
            Some(NameAction::Custom(_)) => actions.push("rename".to_string()),
            None => {}
        }
        match &self.attrs {
            Some(AttrsAction::Constant(attrs)) => {
                actions.push(format!("set {} attr(s)", attrs.len()))
            }
            Some(AttrsAction::Custom(_)) => actions.push("rewrite attrs".to_string()),
            None => {}
        }
        if self.side_effect.is_some() {
            actions.push("side effect".to_string());
        }

        out.push_str(&format!(" [{}] priority {}", actions.join(", "), self.priority));
        if self.stop_processing {
            out.push_str(", stops");
        }
        out
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("label", &self.label)
            .field("matcher", &self.matcher)
            .field("has_name", &self.name.is_some())
            .field("has_attrs", &self.attrs.is_some())
            .field("has_side_effect", &self.side_effect.is_some())
            .field("priority", &self.priority)
            .field("stop_processing", &self.stop_processing)
            .finish()
    }
}
