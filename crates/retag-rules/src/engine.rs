//! Rule registry and per-tag dispatch
//!
//! [`Replacer`] owns the ordered rule set. The host parser calls
//! [`Replacer::apply`] (directly or through [`TagHook`]) once per tag; rules
//! run by descending priority, equal priorities in registration order.

use retag_core::{Attributes, HookError, TagHook, TagNode};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::declarative::RuleDef;
use crate::error::{ApplyError, ConstructionError, RuleFailure};
use crate::legacy::LegacyRename;
use crate::rule::Rule;
use crate::spec::RuleSpec;

/// What to do when a matched rule's transform fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure, skip the rest of that rule and keep going
    #[default]
    Skip,
    /// Stop processing the tag and return the error
    Abort,
}

impl FailurePolicy {
    pub fn from_name(s: &str) -> Option<FailurePolicy> {
        match s.to_lowercase().as_str() {
            "skip" => Some(FailurePolicy::Skip),
            "abort" => Some(FailurePolicy::Abort),
            _ => None,
        }
    }
}

/// Summary of one `apply` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Rules whose matcher accepted the tag
    pub matched: usize,
    /// Matched rules whose transforms failed and were skipped
    pub failed: usize,
    /// A rule with `stop_processing` ended evaluation early
    pub stopped: bool,
}

/// Transforms for the match-everything constructor form
#[derive(Default)]
pub struct Transforms {
    spec: RuleSpec,
    count: usize,
}

impl Transforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Option<String> + Send + Sync + 'static,
    {
        self.spec = self.spec.name_transform(transform);
        self.count += 1;
        self
    }

    pub fn try_name_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Result<Option<String>, RuleFailure> + Send + Sync + 'static,
    {
        self.spec = self.spec.try_name_transform(transform);
        self.count += 1;
        self
    }

    pub fn attrs_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Option<Attributes> + Send + Sync + 'static,
    {
        self.spec = self.spec.attrs_transform(transform);
        self.count += 1;
        self
    }

    pub fn try_attrs_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&dyn TagNode) -> Result<Option<Attributes>, RuleFailure> + Send + Sync + 'static,
    {
        self.spec = self.spec.try_attrs_transform(transform);
        self.count += 1;
        self
    }

    pub fn side_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&mut dyn TagNode) + Send + Sync + 'static,
    {
        self.spec = self.spec.side_effect(effect);
        self.count += 1;
        self
    }

    pub fn try_side_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&mut dyn TagNode) -> Result<(), RuleFailure> + Send + Sync + 'static,
    {
        self.spec = self.spec.try_side_effect(effect);
        self.count += 1;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Every constructor argument at once
///
/// Used by [`Replacer::from_options`], which rejects mixing the legacy name
/// pair with transforms.
#[derive(Default)]
pub struct ReplacerOptions {
    pub og_tag: Option<String>,
    pub alt_tag: Option<String>,
    pub transforms: Transforms,
}

/// Ordered rule registry and the per-tag entry point
#[derive(Debug, Default)]
pub struct Replacer {
    rules: Vec<Arc<Rule>>,
    legacy: Option<LegacyRename>,
    fast_renames: HashMap<String, String>,
    policy: FailurePolicy,
}

impl Replacer {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding one `og -> alt` rename
    ///
    /// Names are compared and stored lowercased. This is the only
    /// constructor that enables the [`Replacer::preprocess_name`] shortcut.
    pub fn legacy(og_tag: &str, alt_tag: &str) -> Result<Self, ConstructionError> {
        let pair = LegacyRename::new(og_tag, alt_tag)?;
        let mut replacer = Self::new();
        replacer.register(pair.to_rule());
        replacer
            .fast_renames
            .insert(pair.original().to_string(), pair.replacement().to_string());
        replacer.legacy = Some(pair);
        Ok(replacer)
    }

    /// Create a registry with one rule applying `transforms` to every tag
    pub fn with_transforms(transforms: Transforms) -> Result<Self, ConstructionError> {
        if transforms.is_empty() {
            return Err(ConstructionError::NoTransform);
        }
        let mut replacer = Self::new();
        replacer.register_rule(transforms.spec)?;
        Ok(replacer)
    }

    /// Pick the constructor form from the supplied options
    pub fn from_options(options: ReplacerOptions) -> Result<Self, ConstructionError> {
        let has_pair = options.og_tag.is_some() || options.alt_tag.is_some();
        let has_transforms = !options.transforms.is_empty();

        match (has_pair, has_transforms) {
            (true, true) => Err(ConstructionError::MixedConstructor),
            (true, false) => Self::legacy(
                options.og_tag.as_deref().unwrap_or_default(),
                options.alt_tag.as_deref().unwrap_or_default(),
            ),
            (false, true) => Self::with_transforms(options.transforms),
            (false, false) => Ok(Self::new()),
        }
    }

    /// Build a registry from specs, registered in the given order
    pub fn from_rules<I>(specs: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = RuleSpec>,
    {
        let mut replacer = Self::new();
        for spec in specs {
            replacer.register_rule(spec)?;
        }
        Ok(replacer)
    }

    /// Build a registry from declarative rule definitions
    pub fn from_defs<I>(defs: I) -> Result<Self, ConstructionError>
    where
        I: IntoIterator<Item = RuleDef>,
    {
        let mut replacer = Self::new();
        for def in defs {
            replacer.register_rule(def.into_spec()?)?;
        }
        Ok(replacer)
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_failure_policy(&mut self, policy: FailurePolicy) {
        self.policy = policy;
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Validate and register a rule
    ///
    /// Nothing is registered when the rule spec is invalid.
    pub fn register_rule(&mut self, spec: RuleSpec) -> Result<Arc<Rule>, ConstructionError> {
        let rule = spec.build()?;
        Ok(self.register(rule))
    }

    /// Register a rule that renames `tag_name` to `new_name`
    pub fn rename(
        &mut self,
        tag_name: &str,
        new_name: &str,
    ) -> Result<Arc<Rule>, ConstructionError> {
        self.register_rule(RuleSpec::new().tag_name(tag_name).new_name(new_name))
    }

    /// Register an already built rule
    pub fn register(&mut self, rule: Rule) -> Arc<Rule> {
        let rule = Arc::new(rule);
        self.rules.push(Arc::clone(&rule));
        // Stable: equal priorities stay in registration order
        self.rules.sort_by(|a, b| b.priority().cmp(&a.priority()));
        rule
    }

    /// Registered rules in the order they are applied
    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every applicable rule against one tag
    ///
    /// Predicate failures count as non-matches. Transform failures are
    /// handled according to the [`FailurePolicy`]; under `Skip` the failing
    /// rule's stop flag is ignored and its earlier phases stay applied.
    pub fn apply(&self, tag: &mut dyn TagNode) -> Result<ApplyReport, ApplyError> {
        let mut report = ApplyReport::default();

        for rule in &self.rules {
            if !rule.applies(tag) {
                continue;
            }
            report.matched += 1;

            match rule.apply_matched(tag) {
                Ok(true) => {
                    report.stopped = true;
                    break;
                }
                Ok(false) => {}
                Err(err) => match self.policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Skip => {
                        log::warn!("{}; skipping rule", err);
                        report.failed += 1;
                    }
                },
            }
        }

        if report.matched > 0 {
            log::trace!(
                "<{}>: {} rule(s) matched, {} failed{}",
                tag.name(),
                report.matched,
                report.failed,
                if report.stopped { ", stopped early" } else { "" }
            );
        }

        Ok(report)
    }

    /// Rewrite a tag name before the tag exists
    ///
    /// Only the legacy rename participates; registered rules are never
    /// consulted here.
    pub fn preprocess_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if let Some(replacement) = self.fast_renames.get(&name.to_lowercase()) {
            return Cow::Owned(replacement.clone());
        }
        match &self.legacy {
            Some(pair) => pair.rewrite(name),
            None => Cow::Borrowed(name),
        }
    }
}

impl TagHook for Replacer {
    fn preprocess_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        Replacer::preprocess_name(self, name)
    }

    fn on_tag(&self, tag: &mut dyn TagNode) -> Result<(), HookError> {
        self.apply(tag)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retag_core::{AttrValue, Tag};
    use std::sync::Mutex;

    fn names(replacer: &Replacer) -> Vec<String> {
        replacer
            .rules()
            .iter()
            .map(|r| r.label().unwrap_or_default().to_string())
            .collect()
    }

    // ==================== Construction ====================

    #[test]
    fn test_empty_registry() {
        let replacer = Replacer::new();
        let mut tag = Tag::new("b");

        let report = replacer.apply(&mut tag).unwrap();
        assert_eq!(report, ApplyReport::default());
        assert!(replacer.is_empty());
        assert_eq!(replacer.preprocess_name("b"), "b");
    }

    #[test]
    fn test_legacy_constructor() {
        let replacer = Replacer::legacy("B", "BlockQuote").unwrap();
        assert_eq!(replacer.len(), 1);
        assert_eq!(replacer.rules()[0].tag_name(), Some("b"));

        let mut tag = Tag::new("b");
        replacer.apply(&mut tag).unwrap();
        assert_eq!(tag.name, "blockquote");
    }

    #[test]
    fn test_legacy_constructor_rejects_empty() {
        assert_eq!(
            Replacer::legacy("", "x").unwrap_err(),
            ConstructionError::EmptyName("original tag name")
        );
        assert_eq!(
            Replacer::legacy("b", "").unwrap_err(),
            ConstructionError::EmptyName("replacement tag name")
        );
    }

    #[test]
    fn test_transforms_constructor() {
        let replacer = Replacer::with_transforms(Transforms::new().name_transform(|tag| {
            (tag.name() == "b").then(|| "blockquote".to_string())
        }))
        .unwrap();

        let mut bold = Tag::new("b");
        let mut italic = Tag::new("i");
        replacer.apply(&mut bold).unwrap();
        replacer.apply(&mut italic).unwrap();

        assert_eq!(bold.name, "blockquote");
        assert_eq!(italic.name, "i");
        // Callable form never feeds the pre-creation shortcut
        assert_eq!(replacer.preprocess_name("b"), "b");
    }

    #[test]
    fn test_transforms_constructor_requires_a_transform() {
        let err = Replacer::with_transforms(Transforms::new()).unwrap_err();
        assert_eq!(err, ConstructionError::NoTransform);
    }

    #[test]
    fn test_from_options_forms() {
        let mixed = Replacer::from_options(ReplacerOptions {
            og_tag: Some("b".to_string()),
            alt_tag: Some("blockquote".to_string()),
            transforms: Transforms::new().name_transform(|tag| Some(tag.name().to_string())),
        });
        assert_eq!(mixed.unwrap_err(), ConstructionError::MixedConstructor);

        let half = Replacer::from_options(ReplacerOptions {
            og_tag: Some("b".to_string()),
            ..Default::default()
        });
        assert_eq!(
            half.unwrap_err(),
            ConstructionError::EmptyName("replacement tag name")
        );

        let legacy = Replacer::from_options(ReplacerOptions {
            og_tag: Some("b".to_string()),
            alt_tag: Some("strong".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(legacy.preprocess_name("B"), "strong");

        let empty = Replacer::from_options(ReplacerOptions::default()).unwrap();
        assert!(empty.is_empty());

        let callable = Replacer::from_options(ReplacerOptions {
            transforms: Transforms::new().side_effect(|tag| {
                tag.attrs_mut().remove("class");
            }),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(callable.len(), 1);
    }

    #[test]
    fn test_register_rule_error_registers_nothing() {
        let mut replacer = Replacer::new();
        replacer.rename("b", "strong").unwrap();

        let err = replacer
            .register_rule(RuleSpec::new().tag_name("i").when(|_| true).new_name("em"))
            .unwrap_err();
        assert_eq!(err, ConstructionError::TagNameAndMatch);
        assert_eq!(replacer.len(), 1);
    }

    #[test]
    fn test_empty_new_name_rejected_on_every_path() {
        let mut replacer = Replacer::new();

        assert_eq!(
            replacer.rename("b", "").unwrap_err(),
            ConstructionError::EmptyName("new_name")
        );
        assert_eq!(
            replacer.register_rule(RuleSpec::new().new_name("")).unwrap_err(),
            ConstructionError::EmptyName("new_name")
        );
        assert!(replacer.is_empty());
    }

    #[test]
    fn test_rename_shortcut_skips_fast_path() {
        let mut replacer = Replacer::new();
        replacer.rename("b", "strong").unwrap();

        assert_eq!(replacer.preprocess_name("b"), "b");
        let mut tag = Tag::new("B");
        replacer.apply(&mut tag).unwrap();
        assert_eq!(tag.name, "strong");
    }

    // ==================== Ordering ====================

    #[test]
    fn test_rules_sorted_by_priority_then_registration() {
        let mut replacer = Replacer::new();
        for (label, priority) in [("a", 0), ("b", 5), ("c", 0), ("d", 5), ("e", -1)] {
            replacer
                .register_rule(RuleSpec::new().label(label).side_effect(|_| {}).priority(priority))
                .unwrap();
        }

        assert_eq!(names(&replacer), vec!["b", "d", "a", "c", "e"]);
    }

    #[test]
    fn test_register_returns_handle() {
        let mut replacer = Replacer::new();
        let rule = replacer
            .register_rule(RuleSpec::new().tag_name("p").new_name("div").priority(7))
            .unwrap();

        assert_eq!(rule.priority(), 7);
        assert!(Arc::ptr_eq(&rule, &replacer.rules()[0]));
    }

    #[test]
    fn test_unconditional_renames_last_writer_wins() {
        let mut replacer = Replacer::new();
        replacer
            .register_rule(RuleSpec::new().new_name("low").priority(1))
            .unwrap();
        replacer
            .register_rule(RuleSpec::new().new_name("high").priority(10))
            .unwrap();

        let mut tag = Tag::new("b");
        let report = replacer.apply(&mut tag).unwrap();
        assert_eq!(tag.name, "low");
        assert_eq!(report.matched, 2);
    }

    #[test]
    fn test_stop_is_per_tag() {
        let mut replacer = Replacer::new();
        replacer
            .register_rule(
                RuleSpec::new()
                    .tag_name("b")
                    .new_name("strong")
                    .stop_processing(true)
                    .priority(1),
            )
            .unwrap();
        replacer
            .register_rule(RuleSpec::new().side_effect(|tag| {
                tag.attrs_mut().insert("seen", "yes");
            }))
            .unwrap();

        let mut bold = Tag::new("b");
        let mut italic = Tag::new("i");
        assert!(replacer.apply(&mut bold).unwrap().stopped);
        assert!(!replacer.apply(&mut italic).unwrap().stopped);

        assert!(!bold.has_attr("seen"));
        assert_eq!(italic.attrs.get("seen"), Some(&AttrValue::from("yes")));
    }

    // ==================== Failures ====================

    fn failing_replacer(policy: FailurePolicy, log: Arc<Mutex<Vec<&'static str>>>) -> Replacer {
        let first = Arc::clone(&log);
        let second = Arc::clone(&log);
        Replacer::from_rules([
            RuleSpec::new()
                .label("broken-predicate")
                .try_when(|_| Err(RuleFailure::new("bad predicate")))
                .side_effect(move |_| first.lock().unwrap().push("never")),
            RuleSpec::new()
                .label("broken-transform")
                .try_attrs_transform(|_| Err(RuleFailure::new("bad attrs")))
                .stop_processing(true),
            RuleSpec::new()
                .label("after")
                .side_effect(move |_| second.lock().unwrap().push("after")),
        ])
        .unwrap()
        .with_failure_policy(policy)
    }

    #[test]
    fn test_skip_policy_continues_after_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let replacer = failing_replacer(FailurePolicy::Skip, Arc::clone(&log));

        let mut tag = Tag::new("p");
        let report = replacer.apply(&mut tag).unwrap();

        assert_eq!(report.matched, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.stopped);
        assert_eq!(*log.lock().unwrap(), vec!["after"]);
    }

    #[test]
    fn test_abort_policy_returns_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let replacer = failing_replacer(FailurePolicy::Abort, Arc::clone(&log));

        let mut tag = Tag::new("p");
        let err = replacer.apply(&mut tag).unwrap_err();

        assert!(err.rule.contains("broken-transform"));
        assert!(log.lock().unwrap().is_empty());

        let hook_err = replacer.on_tag(&mut tag).unwrap_err();
        assert_eq!(hook_err.tag, "p");
    }

    #[test]
    fn test_failure_policy_from_name() {
        assert_eq!(FailurePolicy::from_name("skip"), Some(FailurePolicy::Skip));
        assert_eq!(FailurePolicy::from_name("ABORT"), Some(FailurePolicy::Abort));
        assert_eq!(FailurePolicy::from_name("retry"), None);
        assert_eq!(Replacer::new().failure_policy(), FailurePolicy::Skip);
    }
}
