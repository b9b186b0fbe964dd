//! retag CLI - rewrite tag names and attributes with rule files
//!
//! Reads a JSON array of tag records (`{"name": "b", "attrs": {...}}`),
//! builds each one through the rule engine and reports what changed.

mod config;
mod output;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use colored::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::Config;
use output::{OutputFormat, Reporter};
use retag_core::{NoHook, Tag, TagBuilder};
use retag_rules::declarative::load_rules_from_path;
use retag_rules::{FailurePolicy, Replacer};

#[derive(Parser)]
#[command(name = "retag")]
#[command(version)]
#[command(about = "Rule-driven tag renaming and attribute rewriting")]
#[command(author = "retag contributors")]
struct Cli {
    /// JSON file holding an array of tag records (stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Rule files or directories (can be specified multiple times). Overrides config file.
    #[arg(long, short = 'r', value_name = "PATH")]
    rules: Vec<PathBuf>,

    /// Rename applied before tags are created, e.g. b=blockquote
    #[arg(long, value_name = "OLD=NEW")]
    rename: Option<String>,

    /// What to do when a rule fails: skip, abort
    #[arg(long, value_name = "POLICY")]
    on_failure: Option<String>,

    /// Output format: text, json
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Path to config file (default: auto-detect .retag.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long, conflicts_with = "config")]
    no_config: bool,

    /// List the loaded rules in the order they run and exit
    #[arg(long)]
    list_rules: bool,

    /// Show verbose output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load config file; `base` is where relative rule paths resolve from
    let (config, base) = if cli.no_config {
        (Config::default(), std::env::current_dir()?)
    } else if let Some(config_path) = &cli.config {
        let cfg = Config::load_path(config_path)?;
        log::info!("using config {}", config_path.display());
        (cfg, parent_dir(config_path))
    } else {
        match Config::load()? {
            Some((cfg, path)) => {
                log::info!("using config {}", path.display());
                (cfg, parent_dir(&path))
            }
            None => (Config::default(), std::env::current_dir()?),
        }
    };

    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        let name = cli
            .format
            .as_deref()
            .or(config.output.format.as_deref())
            .unwrap_or("text");
        OutputFormat::from_str(name).ok_or_else(|| {
            anyhow::anyhow!("Invalid output format '{}'. Valid options: text, json", name)
        })?
    };

    let replacer = build_replacer(&cli, &config, &base)?;

    if cli.list_rules {
        println!("{}", "Rules in evaluation order:".bold());
        for (position, rule) in replacer.rules().iter().enumerate() {
            println!("  {:>3}. {}", position + 1, rule.describe());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if replacer.is_empty() {
        log::warn!("no rules loaded; tags pass through unchanged");
    }

    let records = read_records(cli.input.as_deref())?;
    log::info!("processing {} tag(s) with {} rule(s)", records.len(), replacer.len());

    let mut reporter = Reporter::new(output_format, cli.verbose > 0);
    let mut plain = TagBuilder::new(NoHook);
    let mut hooked = TagBuilder::new(&replacer);

    for (index, record) in records.iter().enumerate() {
        let raw_attrs = || {
            record
                .attrs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_joined()))
                .collect::<Vec<_>>()
        };

        let before = plain
            .build(&record.name, raw_attrs())
            .with_context(|| format!("Failed to normalize tag #{}", index))?;

        match hooked.build(&record.name, raw_attrs()) {
            Ok(after) => reporter.report_tag(index, before, after),
            Err(e) => reporter.report_error(index, before, &e.to_string()),
        }
    }

    let has_errors = reporter.summary().errors > 0;
    reporter.finish()?;

    Ok(if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Assemble the engine from CLI flags and config, CLI taking precedence
fn build_replacer(cli: &Cli, config: &Config, base: &Path) -> Result<Replacer> {
    let legacy = match &cli.rename {
        Some(pair) => Some(parse_rename(pair)?),
        None => config
            .rules
            .legacy
            .as_ref()
            .map(|l| (l.from.clone(), l.to.clone())),
    };

    let mut replacer = match legacy {
        Some((from, to)) => Replacer::legacy(&from, &to)
            .with_context(|| format!("Invalid rename '{}={}'", from, to))?,
        None => Replacer::new(),
    };

    for (from, to) in &config.rules.renames {
        replacer
            .rename(from, to)
            .with_context(|| format!("Invalid rename '{} = {}' in config", from, to))?;
    }

    let rule_paths = if cli.rules.is_empty() {
        config.rule_paths(base)?
    } else {
        cli.rules.clone()
    };

    for path in &rule_paths {
        let defs = load_rules_from_path(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?;
        log::debug!("{} rule(s) from {}", defs.len(), path.display());

        for def in defs {
            let name = def.label.clone().unwrap_or_else(|| "<unnamed>".to_string());
            let spec = def
                .into_spec()
                .with_context(|| format!("Invalid rule '{}' in {}", name, path.display()))?;
            replacer
                .register_rule(spec)
                .with_context(|| format!("Invalid rule '{}' in {}", name, path.display()))?;
        }
    }

    let policy_name = cli
        .on_failure
        .as_deref()
        .or(config.engine.on_failure.as_deref());
    if let Some(name) = policy_name {
        let policy = FailurePolicy::from_name(name).ok_or_else(|| {
            anyhow::anyhow!("Invalid failure policy '{}'. Valid options: skip, abort", name)
        })?;
        replacer.set_failure_policy(policy);
    }

    Ok(replacer)
}

fn parse_rename(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
            Ok((from.trim().to_string(), to.trim().to_string()))
        }
        _ => bail!("Invalid --rename '{}'. Expected OLD=NEW", pair),
    }
}

fn read_records(input: Option<&Path>) -> Result<Vec<Tag>> {
    let content = match input {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    serde_json::from_str(&content).context("Input must be a JSON array of {name, attrs} records")
}
