//! retag-core: Tag model and parser hook for the retag rule engine
//!
//! This crate provides:
//! - `TagNode`: The contract a host parser's element type exposes to rules
//! - `Tag`, `Attributes`, `AttrValue`: A plain in-memory tag implementation
//! - `TagHook`: The per-tag extension point the host parser calls
//! - `TagBuilder`: A reference call site that builds tags and runs the hook

mod builder;
pub mod hook;
mod tag;

pub use builder::{TagBuilder, MULTI_VALUED_ATTRIBUTES};
pub use hook::{HookError, NoHook, TagHook};
pub use tag::{AttrValue, Attributes, Tag, TagNode};
