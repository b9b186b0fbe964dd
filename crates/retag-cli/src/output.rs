//! Output formatting for retag
//!
//! Supports text (colored terminal) and JSON output formats.

use anyhow::Result;
use colored::*;
use retag_core::Tag;
use serde::Serialize;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Result of running the rules over one input tag
#[derive(Debug, Clone, Serialize)]
pub struct TagResult {
    pub index: usize,
    pub before: Tag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TagResult {
    pub fn success(index: usize, before: Tag, after: Tag) -> Self {
        Self {
            index,
            before,
            after: Some(after),
            error: None,
        }
    }

    pub fn error(index: usize, before: Tag, error: String) -> Self {
        Self {
            index,
            before,
            after: None,
            error: Some(error),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.after.as_ref().is_some_and(|after| *after != self.before)
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub tags_processed: usize,
    pub tags_changed: usize,
    pub errors: usize,
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub summary: Summary,
    pub tags: Vec<TagResult>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<TagResult>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Report a tag the rules ran over successfully
    pub fn report_tag(&mut self, index: usize, before: Tag, after: Tag) {
        self.summary.tags_processed += 1;
        let result = TagResult::success(index, before, after);

        if result.has_changes() {
            self.summary.tags_changed += 1;
            if self.format == OutputFormat::Text {
                println!("{}", format_change(&result));
            }
        } else if self.verbose && self.format == OutputFormat::Text {
            println!("#{} {}: No changes", index, result.before);
        }

        self.results.push(result);
    }

    /// Report a tag whose rules failed
    pub fn report_error(&mut self, index: usize, before: Tag, error: &str) {
        self.summary.tags_processed += 1;
        self.summary.errors += 1;

        if self.format == OutputFormat::Text {
            eprintln!("{}: #{} {} - {}", "Warning".yellow(), index, before, error);
        }

        self.results.push(TagResult::error(index, before, error.to_string()));
    }

    /// Print final summary/output
    pub fn finish(self) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                println!();
                println!("{}", "Summary".bold().underline());
                println!("  Tags processed: {}", self.summary.tags_processed);
                println!("  Tags changed: {}", self.summary.tags_changed);
                if self.summary.errors > 0 {
                    println!("  Errors: {}", self.summary.errors);
                }
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary,
                    tags: self.results,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }

    /// Get summary for exit code determination
    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

/// One `before -> after` line for a changed tag
fn format_change(result: &TagResult) -> String {
    let after = result
        .after
        .as_ref()
        .map(|tag| tag.to_string())
        .unwrap_or_default();
    format!(
        "#{} {} {} {}",
        result.index,
        result.before.to_string().red(),
        "->".bold(),
        after.green()
    )
}
