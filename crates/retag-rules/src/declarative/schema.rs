//! Declarative rule schema
//!
//! Defines the serde structure of rule files. A [`RuleDef`] compiles into an
//! ordinary [`RuleSpec`], so file-based rules obey exactly the same
//! validation and ordering as rules registered in code.

use regex::{Regex, RegexBuilder};
use retag_core::{AttrValue, Attributes};
use serde::{Deserialize, Serialize};

use super::template;
use crate::error::ConstructionError;
use crate::spec::RuleSpec;

/// One rule as written in a YAML or JSON file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    /// Identifier shown in listings and logs
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Exact tag name to match (case-insensitive)
    #[serde(default)]
    pub tag_name: Option<String>,

    /// Regular expression the whole tag name must match (case-insensitive)
    #[serde(default)]
    pub tag_pattern: Option<String>,

    /// Attributes that must be present for the rule to match
    #[serde(default)]
    pub has_attrs: Vec<String>,

    /// Replacement name; may reference `$name` and attributes
    #[serde(default)]
    pub new_name: Option<String>,

    /// Full replacement attribute mapping
    #[serde(default)]
    pub new_attrs: Option<Attributes>,

    /// Attributes to insert or overwrite; text values may use variables
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub set_attrs: Attributes,

    /// Attributes to delete
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_attrs: Vec<String>,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub stop_processing: bool,
}

impl RuleDef {
    /// Check the definition without registering it
    pub fn validate(&self) -> Result<(), ConstructionError> {
        self.clone().into_spec()?.build().map(|_| ())
    }

    /// Compile the definition into a rule spec
    ///
    /// `remove_attrs` runs before `set_attrs`, so a key listed in both ends
    /// up with the `set_attrs` value.
    pub fn into_spec(self) -> Result<RuleSpec, ConstructionError> {
        if self.tag_name.is_some() && self.tag_pattern.is_some() {
            return Err(ConstructionError::TagNameAndMatch);
        }
        if self.tag_name.as_deref() == Some("") {
            return Err(ConstructionError::EmptyName("tag_name"));
        }

        let mut spec = RuleSpec::new()
            .priority(self.priority)
            .stop_processing(self.stop_processing);
        if let Some(label) = self.label {
            spec = spec.label(label);
        }

        let pattern = self.tag_pattern.as_deref().map(compile_pattern).transpose()?;
        if pattern.is_some() || !self.has_attrs.is_empty() {
            let name = self.tag_name.map(|n| n.to_lowercase());
            let required = self.has_attrs;
            spec = spec.when(move |tag| {
                name.as_ref().map_or(true, |n| tag.name().to_lowercase() == *n)
                    && pattern.as_ref().map_or(true, |re| re.is_match(tag.name()))
                    && required.iter().all(|key| tag.has_attr(key))
            });
        } else if let Some(name) = self.tag_name {
            spec = spec.tag_name(name);
        }

        if let Some(new_name) = self.new_name {
            if template::has_variables(&new_name) {
                spec = spec.name_transform(move |tag| Some(template::substitute(&new_name, tag)));
            } else {
                spec = spec.new_name(new_name);
            }
        }

        if let Some(new_attrs) = self.new_attrs {
            spec = spec.new_attrs(new_attrs);
        }

        if !self.set_attrs.is_empty() || !self.remove_attrs.is_empty() {
            let set = self.set_attrs;
            let remove = self.remove_attrs;
            spec = spec.side_effect(move |tag| {
                for key in &remove {
                    tag.attrs_mut().remove(key);
                }
                for (key, value) in set.iter() {
                    let value = match value {
                        AttrValue::Text(text) if template::has_variables(text) => {
                            AttrValue::Text(template::substitute(text, &*tag))
                        }
                        other => other.clone(),
                    };
                    tag.attrs_mut().insert(key, value);
                }
            });
        }

        Ok(spec)
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConstructionError> {
    RegexBuilder::new(&format!("^(?:{})$", pattern))
        .case_insensitive(true)
        .build()
        .map_err(|e| ConstructionError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}
