//! Rule file loader
//!
//! Load rule definitions from strings, files, or directories. A document may
//! hold a single rule or a list of rules; the order of the list is the
//! registration order.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::schema::RuleDef;
use crate::error::ConstructionError;

/// Errors that can occur when loading rule files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid rule #{index}: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: ConstructionError,
    },
}

/// Load rule definitions from a YAML string
///
/// JSON documents are valid YAML and load here too.
pub fn load_rules_from_string(yaml: &str) -> Result<Vec<RuleDef>, LoadError> {
    // Try to parse as a single rule first
    let defs = match serde_yaml::from_str::<RuleDef>(yaml) {
        Ok(def) => vec![def],
        Err(_) => serde_yaml::from_str::<Vec<RuleDef>>(yaml)?,
    };
    validate_all(defs)
}

/// Load rule definitions from a JSON string
pub fn load_rules_from_json(json: &str) -> Result<Vec<RuleDef>, LoadError> {
    let defs = match serde_json::from_str::<RuleDef>(json) {
        Ok(def) => vec![def],
        Err(_) => serde_json::from_str::<Vec<RuleDef>>(json)?,
    };
    validate_all(defs)
}

/// Load rule definitions from a file, choosing the format by extension
pub fn load_rules_from_file(path: &Path) -> Result<Vec<RuleDef>, LoadError> {
    let content = fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext == "json") {
        load_rules_from_json(&content)
    } else {
        load_rules_from_string(&content)
    }
}

/// Load every rule file under a directory
///
/// Files are visited in path order so the result is deterministic. Files
/// that fail to load are logged and skipped.
pub fn load_rules_from_dir(dir: &Path) -> Result<Vec<RuleDef>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let mut files = Vec::new();
    collect_rule_files(dir, &mut files)?;
    files.sort();

    let mut all_rules = Vec::new();
    for path in files {
        match load_rules_from_file(&path) {
            Ok(loaded) => {
                log::debug!("loaded {} rule(s) from {}", loaded.len(), path.display());
                all_rules.extend(loaded);
            }
            Err(e) => {
                log::warn!("Failed to load {}: {}", path.display(), e);
            }
        }
    }

    Ok(all_rules)
}

/// Load a file or, for directories, every rule file below it
pub fn load_rules_from_path(path: &Path) -> Result<Vec<RuleDef>, LoadError> {
    if path.is_dir() {
        load_rules_from_dir(path)
    } else {
        load_rules_from_file(path)
    }
}

fn collect_rule_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_rule_files(&path, files)?;
        } else if path
            .extension()
            .is_some_and(|ext| ext == "yaml" || ext == "yml" || ext == "json")
        {
            files.push(path);
        }
    }
    Ok(())
}

fn validate_all(defs: Vec<RuleDef>) -> Result<Vec<RuleDef>, LoadError> {
    for (index, def) in defs.iter().enumerate() {
        def.validate()
            .map_err(|source| LoadError::Invalid { index, source })?;
    }
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_single_rule() {
        let yaml = r#"
label: bold-to-strong
tag_name: b
new_name: strong
"#;

        let rules = load_rules_from_string(yaml).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].label.as_deref(), Some("bold-to-strong"));
    }

    #[test]
    fn test_load_multiple_rules() {
        let yaml = r#"
- label: rule_one
  tag_name: b
  new_name: strong
- label: rule_two
  tag_name: i
  new_name: em
  priority: 2
"#;

        let rules = load_rules_from_string(yaml).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].label.as_deref(), Some("rule_one"));
        assert_eq!(rules[1].priority, 2);
    }

    #[test]
    fn test_load_json() {
        let json = r#"[{"tag_name": "b", "new_name": "strong", "stop_processing": true}]"#;
        let rules = load_rules_from_json(json).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].stop_processing);
    }

    #[test]
    fn test_validation_error() {
        let yaml = r#"
- tag_name: b
  new_name: strong
- tag_name: i
"#;

        let result = load_rules_from_string(yaml);
        assert!(matches!(
            result,
            Err(LoadError::Invalid {
                index: 1,
                source: ConstructionError::NoTransform
            })
        ));
    }

    #[test]
    fn test_load_dir_in_path_order() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(
            temp.path().join("b.yaml"),
            "label: second\ntag_name: i\nnew_name: em\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("a.yml"),
            "label: first\ntag_name: b\nnew_name: strong\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("nested/c.json"),
            r#"{"label": "third", "tag_name": "u", "new_name": "ins"}"#,
        )
        .unwrap();
        fs::write(temp.path().join("broken.yaml"), "tag_name: [unclosed").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let rules = load_rules_from_dir(temp.path()).unwrap();
        let labels: Vec<_> = rules.iter().filter_map(|r| r.label.as_deref()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_load_missing_dir() {
        let temp = TempDir::new().unwrap();
        let result = load_rules_from_dir(&temp.path().join("absent"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_load_path_dispatch() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("rules.json");
        fs::write(&file, r#"{"tag_name": "b", "new_name": "strong"}"#).unwrap();

        assert_eq!(load_rules_from_path(&file).unwrap().len(), 1);
        assert_eq!(load_rules_from_path(temp.path()).unwrap().len(), 1);
    }
}
