//! Configuration file support for retag
//!
//! Loads `.retag.toml` from current directory or parent directories.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".retag.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rules: RulesConfig,
    pub engine: EngineConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule files, directories or glob patterns, relative to the config file
    pub files: Vec<String>,
    /// Single rename that also rewrites names before tags are created
    pub legacy: Option<LegacyConfig>,
    /// Extra `old = new` renames, registered in key order
    pub renames: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyConfig {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// "skip" (default) or "abort"
    pub on_failure: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text" or "json"
    pub format: Option<String>,
}

impl Config {
    /// Load config from `.retag.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Resolve `rules.files` against the config file's directory
    ///
    /// Glob patterns expand to their matches in path order; plain entries
    /// are kept even if they do not exist yet, so loading reports them.
    pub fn rule_paths(&self, base: &Path) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for entry in &self.rules.files {
            let joined = base.join(entry);
            if !is_glob(entry) {
                paths.push(joined);
                continue;
            }

            let pattern = joined.to_string_lossy();
            let mut matches: Vec<PathBuf> = glob::glob(&pattern)
                .with_context(|| format!("Invalid rule file pattern '{}'", entry))?
                .filter_map(|p| p.ok())
                .collect();
            matches.sort();
            if matches.is_empty() {
                log::warn!("rule file pattern '{}' matched nothing", entry);
            }
            paths.extend(matches);
        }

        Ok(paths)
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_load_basic_config() {
        let temp = TempDir::new().unwrap();
        create_config(
            temp.path(),
            r#"
[rules]
files = ["rules/base.yaml", "rules/extra/*.yaml"]
renames = { i = "em", u = "ins" }

[rules.legacy]
from = "b"
to = "blockquote"

[engine]
on_failure = "abort"

[output]
format = "json"
"#,
        );

        let (config, path) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert_eq!(config.rules.files.len(), 2);
        let legacy = config.rules.legacy.unwrap();
        assert_eq!((legacy.from.as_str(), legacy.to.as_str()), ("b", "blockquote"));
        assert_eq!(
            config.rules.renames.keys().collect::<Vec<_>>(),
            vec!["i", "u"]
        );
        assert_eq!(config.engine.on_failure, Some("abort".to_string()));
        assert_eq!(config.output.format, Some("json".to_string()));
    }

    #[test]
    fn test_load_empty_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "");

        let (config, _) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert!(config.rules.files.is_empty());
        assert!(config.rules.legacy.is_none());
        assert!(config.rules.renames.is_empty());
        assert!(config.engine.on_failure.is_none());
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_config_found_in_parent() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[output]\nformat = \"text\"\n");
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let (_, path) = Config::load_from(nested).unwrap().unwrap();
        assert_eq!(path, temp.path().join(CONFIG_FILE));
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(temp.path().to_path_buf()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[rules]\nfiles = 3\n");
        assert!(Config::load_from(temp.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_rule_paths_expand_globs() {
        let temp = TempDir::new().unwrap();
        let rules = temp.path().join("rules");
        fs::create_dir(&rules).unwrap();
        fs::write(rules.join("b.yaml"), "").unwrap();
        fs::write(rules.join("a.yaml"), "").unwrap();
        fs::write(rules.join("c.txt"), "").unwrap();

        let config = Config {
            rules: RulesConfig {
                files: vec!["rules/*.yaml".to_string(), "other.json".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        let paths = config.rule_paths(temp.path()).unwrap();
        assert_eq!(
            paths,
            vec![
                rules.join("a.yaml"),
                rules.join("b.yaml"),
                temp.path().join("other.json"),
            ]
        );
    }
}
