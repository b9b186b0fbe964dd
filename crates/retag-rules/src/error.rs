//! Error types for rule construction and rule application

use retag_core::HookError;
use std::fmt;
use thiserror::Error;

/// Errors raised while building a rule or an engine
///
/// These are configuration mistakes: nothing is registered when one is
/// returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("{0} must be non-empty")]
    EmptyName(&'static str),

    #[error("legacy rename names cannot be combined with transforms in one constructor")]
    MixedConstructor,

    #[error("tag_name and a match predicate are mutually exclusive")]
    TagNameAndMatch,

    #[error("new_name and name_transform are mutually exclusive")]
    NewNameAndTransform,

    #[error("new_attrs and attrs_transform are mutually exclusive")]
    NewAttrsAndTransform,

    #[error("rule has no name, attribute or side-effect transform")]
    NoTransform,

    #[error("invalid tag pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Failure reported by a fallible predicate or transform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuleFailure {
    message: String,
}

impl RuleFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for RuleFailure {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for RuleFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Stage of a matched rule in which a transform failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Name,
    Attrs,
    SideEffect,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Name => "name transform",
            Phase::Attrs => "attrs transform",
            Phase::SideEffect => "side effect",
        })
    }
}

/// A matched rule failed while transforming a tag
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rule {rule} failed on <{tag}> in {phase}: {source}")]
pub struct ApplyError {
    /// Label or summary of the failing rule
    pub rule: String,
    /// Tag name when the failure happened
    pub tag: String,
    pub phase: Phase,
    #[source]
    pub source: RuleFailure,
}

impl From<ApplyError> for HookError {
    fn from(err: ApplyError) -> Self {
        HookError::new(err.tag.clone(), err)
    }
}
