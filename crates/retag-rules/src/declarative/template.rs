//! Template substitution for declarative rules
//!
//! `$name` / `${name}` expand to the current tag name; any other variable
//! expands to the attribute of that name (token lists joined by a space).
//! Braces allow keys such as `${data-id}`. Unknown variables are kept as
//! written.

use regex::{Captures, Regex};
use retag_core::TagNode;
use std::sync::OnceLock;

fn var_regex() -> &'static Regex {
    static VAR_REGEX: OnceLock<Regex> = OnceLock::new();
    VAR_REGEX.get_or_init(|| {
        // ${key-with-dashes} or $word
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_:.-]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap()
    })
}

/// Check whether a template references any variable
pub fn has_variables(template: &str) -> bool {
    var_regex().is_match(template)
}

/// Expand the variables of `template` against a tag
pub fn substitute(template: &str, tag: &dyn TagNode) -> String {
    let result = var_regex().replace_all(template, |caps: &Captures| {
        let var = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();

        if var == "name" {
            return tag.name().to_string();
        }
        match tag.get_attr(var) {
            Some(value) => value.to_joined(),
            None => caps[0].to_string(),
        }
    });

    result.into_owned()
}
