//! Keyword-style rule construction
//!
//! [`RuleSpec`] collects everything `register_rule` accepts. Conflicting
//! options are only reported when the rule spec is built, so a rule spec can be put
//! together in any order.

use retag_core::{Attributes, TagNode};

use crate::error::{ConstructionError, RuleFailure};
use crate::rule::{
    AttrsAction, AttrsTransformer, Fallible, MatchPredicate, Matcher, NameAction, NameTransformer,
    Rule, SideEffect,
};

/// Declarative description of one rule
///
/// ```
/// use retag_rules::{Replacer, RuleSpec};
///
/// let mut replacer = Replacer::new();
/// replacer
///     .register_rule(RuleSpec::new().tag_name("b").new_name("strong").priority(10))
///     .unwrap();
/// ```
#[derive(Default)]
pub struct RuleSpec {
    label: Option<String>,
    tag_name: Option<String>,
    matcher: Option<Box<dyn MatchPredicate>>,
    new_name: Option<String>,
    name_transform: Option<Box<dyn NameTransformer>>,
    new_attrs: Option<Attributes>,
    attrs_transform: Option<Box<dyn AttrsTransformer>>,
    side_effect: Option<Box<dyn SideEffect>>,
    priority: i32,
    stop_processing: bool,
}

impl RuleSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label shown in logs and listings
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Restrict the rule to one tag name (case-insensitive)
    pub fn tag_name(mut self, name: impl Into<String>) -> Self {
        self.tag_name = Some(name.into());
        self
    }

    /// Restrict the rule with a predicate
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn TagNode) -> bool + Send + Sync + 'static,
    {
        self.matcher(predicate)
    }

    /// Restrict the rule with a predicate that may fail
    ///
    /// A failure is treated as "does not match".
    pub fn try_when<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Result<bool, RuleFailure> + Send + Sync + 'static,
    {
        self.matcher(Fallible(predicate))
    }

    /// Restrict the rule with any [`MatchPredicate`] implementation
    pub fn matcher(mut self, predicate: impl MatchPredicate + 'static) -> Self {
        self.matcher = Some(Box::new(predicate));
        self
    }

    /// Rename matched tags to a fixed name
    pub fn new_name(mut self, name: impl Into<String>) -> Self {
        self.new_name = Some(name.into());
        self
    }

    pub fn name_transform<F>(self, transform: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Option<String> + Send + Sync + 'static,
    {
        self.name_transformer(transform)
    }

    pub fn try_name_transform<F>(self, transform: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Result<Option<String>, RuleFailure> + Send + Sync + 'static,
    {
        self.name_transformer(Fallible(transform))
    }

    pub fn name_transformer(mut self, transform: impl NameTransformer + 'static) -> Self {
        self.name_transform = Some(Box::new(transform));
        self
    }

    /// Replace the attributes of matched tags with a fixed mapping
    pub fn new_attrs(mut self, attrs: Attributes) -> Self {
        self.new_attrs = Some(attrs);
        self
    }

    pub fn attrs_transform<F>(self, transform: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Option<Attributes> + Send + Sync + 'static,
    {
        self.attrs_transformer(transform)
    }

    pub fn try_attrs_transform<F>(self, transform: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Result<Option<Attributes>, RuleFailure> + Send + Sync + 'static,
    {
        self.attrs_transformer(Fallible(transform))
    }

    pub fn attrs_transformer(mut self, transform: impl AttrsTransformer + 'static) -> Self {
        self.attrs_transform = Some(Box::new(transform));
        self
    }

    pub fn side_effect<F>(self, effect: F) -> Self
    where
        F: Fn(&mut dyn TagNode) + Send + Sync + 'static,
    {
        self.side_effector(effect)
    }

    pub fn try_side_effect<F>(self, effect: F) -> Self
    where
        F: Fn(&mut dyn TagNode) -> Result<(), RuleFailure> + Send + Sync + 'static,
    {
        self.side_effector(Fallible(effect))
    }

    pub fn side_effector(mut self, effect: impl SideEffect + 'static) -> Self {
        self.side_effect = Some(Box::new(effect));
        self
    }

    /// Higher priorities run first; equal priorities keep registration order
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Skip all later rules for a tag once this rule has matched it
    pub fn stop_processing(mut self, stop: bool) -> Self {
        self.stop_processing = stop;
        self
    }

    /// Validate the rule spec and produce a rule
    pub fn build(self) -> Result<Rule, ConstructionError> {
        let matcher = match (self.tag_name, self.matcher) {
            (Some(_), Some(_)) => return Err(ConstructionError::TagNameAndMatch),
            (Some(name), None) => {
                if name.is_empty() {
                    return Err(ConstructionError::EmptyName("tag_name"));
                }
                Matcher::TagName(name.to_lowercase())
            }
            (None, Some(predicate)) => Matcher::Custom(predicate),
            (None, None) => Matcher::Any,
        };

        let name = match (self.new_name, self.name_transform) {
            (Some(_), Some(_)) => return Err(ConstructionError::NewNameAndTransform),
            (Some(name), None) => {
                if name.is_empty() {
                    return Err(ConstructionError::EmptyName("new_name"));
                }
                Some(NameAction::Constant(name))
            }
            (None, Some(transform)) => Some(NameAction::Custom(transform)),
            (None, None) => None,
        };

        let attrs = match (self.new_attrs, self.attrs_transform) {
            (Some(_), Some(_)) => return Err(ConstructionError::NewAttrsAndTransform),
            (Some(attrs), None) => Some(AttrsAction::Constant(attrs)),
            (None, Some(transform)) => Some(AttrsAction::Custom(transform)),
            (None, None) => None,
        };

        if name.is_none() && attrs.is_none() && self.side_effect.is_none() {
            return Err(ConstructionError::NoTransform);
        }

        Ok(Rule {
            label: self.label,
            matcher,
            name,
            attrs,
            side_effect: self.side_effect,
            priority: self.priority,
            stop_processing: self.stop_processing,
        })
    }
}

impl TryFrom<RuleSpec> for Rule {
    type Error = ConstructionError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        spec.build()
    }
}
