use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::batch::BatchSummary;
use crate::classifier::Verdict;
use crate::rewriter::SpecifierEdit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    List,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "list" => Ok(OutputFormat::List),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RewriteStats {
    pub scanned_files: usize,
    pub changed_files: usize,
    pub failed_files: usize,
    pub rewritten_specifiers: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonFile<'s> {
    pub path: String,
    pub edits: &'s [SpecifierEdit],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'s str>,
}

#[derive(Debug, Serialize)]
pub struct JsonOutput<'s> {
    pub files: Vec<JsonFile<'s>>,
    pub stats: RewriteStats,
}

#[derive(Debug, Serialize)]
pub struct Explanation<'s> {
    pub specifier: &'s str,
    pub verdict: Verdict,
    pub reason: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten: Option<String>,
}

pub struct OutputFormatter;

impl OutputFormatter {
    pub fn stats(summary: &BatchSummary) -> RewriteStats {
        RewriteStats {
            scanned_files: summary.scanned,
            changed_files: summary.changed_files().count(),
            failed_files: summary.failed_files().count(),
            rewritten_specifiers: summary.total_edits(),
        }
    }

    /// One line per rewritten specifier: `path:line:col old -> new`.
    pub fn format_list(summary: &BatchSummary, root: &Path) -> String {
        let mut lines = Vec::new();

        for file in &summary.files {
            let path = display_path(&file.path, root);
            if let Some(error) = &file.error {
                lines.push(format!("{}: error: {}", path, error));
                continue;
            }
            for edit in &file.edits {
                lines.push(format!(
                    "{}:{}:{} {} -> {}",
                    path, edit.line, edit.column, edit.original, edit.replacement
                ));
            }
        }

        lines.join("\n")
    }

    pub fn format_json(summary: &BatchSummary, root: &Path) -> String {
        let output = JsonOutput {
            files: summary
                .files
                .iter()
                .map(|file| JsonFile {
                    path: display_path(&file.path, root),
                    edits: &file.edits,
                    error: file.error.as_deref(),
                })
                .collect(),
            stats: Self::stats(summary),
        };

        serde_json::to_string_pretty(&output).unwrap_or_default()
    }

    pub fn format_explanation(explanation: &Explanation<'_>, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(explanation).unwrap_or_default(),
            OutputFormat::List => match &explanation.rewritten {
                Some(rewritten) => format!(
                    "'{}' -> '{}' ({})",
                    explanation.specifier, rewritten, explanation.reason
                ),
                None => format!("'{}' unchanged ({})", explanation.specifier, explanation.reason),
            },
        }
    }
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
