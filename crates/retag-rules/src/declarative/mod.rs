//! Declarative rules loaded from YAML or JSON files
//!
//! Rule files let non-Rust users configure the engine. Each definition
//! compiles into an ordinary [`crate::RuleSpec`].
//!
//! # Example rule file
//!
//! ```yaml
//! - label: bold-to-strong
//!   tag_name: b
//!   new_name: strong
//!   stop_processing: true
//!
//! - label: paragraph-class
//!   tag_name: p
//!   set_attrs:
//!     class: [test]
//!   priority: 5
//!
//! - label: heading-anchors
//!   tag_pattern: "h[1-6]"
//!   has_attrs: [id]
//!   set_attrs:
//!     data-anchor: "#${id}"
//! ```

pub mod loader;
pub mod schema;
pub mod template;

pub use loader::{
    load_rules_from_dir, load_rules_from_file, load_rules_from_json, load_rules_from_path,
    load_rules_from_string, LoadError,
};
pub use schema::RuleDef;
