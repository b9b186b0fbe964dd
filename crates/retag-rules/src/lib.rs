//! retag-rules: In-flight tag transformation rules for markup parsers
//!
//! A [`Replacer`] holds an ordered set of [`Rule`]s and is invoked once per
//! tag while the parser builds the tree. Each rule may:
//! - rename the tag (`new_name` / `name_transform`)
//! - replace its attributes (`new_attrs` / `attrs_transform`)
//! - mutate it in place (`side_effect`)
//!
//! Rules run by descending priority, ties in registration order, and a rule
//! with `stop_processing` ends evaluation for the current tag.
//!
//! ```
//! use retag_core::{Tag, TagBuilder};
//! use retag_rules::{Replacer, RuleSpec};
//!
//! let mut replacer = Replacer::new();
//! replacer
//!     .register_rule(RuleSpec::new().tag_name("b").new_name("strong"))
//!     .unwrap();
//!
//! let mut builder = TagBuilder::new(&replacer);
//! let tag = builder.build("B", [("class", "lead")]).unwrap();
//! assert_eq!(tag.name, "strong");
//! ```

pub mod declarative;
mod engine;
mod error;
mod legacy;
mod rule;
mod spec;

pub use declarative::{LoadError, RuleDef};
pub use engine::{ApplyReport, FailurePolicy, Replacer, ReplacerOptions, Transforms};
pub use error::{ApplyError, ConstructionError, Phase, RuleFailure};
pub use legacy::LegacyRename;
pub use rule::{AttrsTransformer, MatchPredicate, Matcher, NameTransformer, Rule, SideEffect};
pub use spec::RuleSpec;
