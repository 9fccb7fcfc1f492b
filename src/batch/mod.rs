use std::path::{Path, PathBuf};
use rayon::prelude::*;
use ignore::WalkBuilder;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError, RewriteConfig};
use crate::emit;
use crate::rewriter::SpecifierEdit;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to walk directory: {0}")]
    WalkError(String),
    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    DryRun,
    Write,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub edits: Vec<SpecifierEdit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn changed(&self) -> bool {
        !self.edits.is_empty()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BatchSummary {
    pub scanned: usize,
    pub files: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn changed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.changed())
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.error.is_some())
    }

    pub fn total_edits(&self) -> usize {
        self.files.iter().map(|f| f.edits.len()).sum()
    }
}

/// Rewrites every supported file under a set of paths.
pub struct BatchRewriter {
    root: PathBuf,
    config: Config,
    rewrite: RewriteConfig,
}

impl BatchRewriter {
    pub fn new(root: PathBuf, config: Config) -> Result<Self, ConfigError> {
        let rewrite = config.rewrite_config()?;
        Ok(Self { root, config, rewrite })
    }

    /// Rewrites the files found under `paths` (or the root when empty).
    /// Files that fail to parse are reported in the summary and skipped.
    pub fn run(&self, paths: &[PathBuf], mode: WriteMode) -> Result<BatchSummary, BatchError> {
        let files = self.discover_files(paths)?;
        info!(files = files.len(), "rewriting module specifiers");

        let mut outcomes: Vec<FileOutcome> = files
            .par_iter()
            .map(|file| self.rewrite_one(file, mode))
            .collect::<Result<Vec<_>, BatchError>>()?;

        outcomes.sort_by(|a, b| a.path.cmp(&b.path));
        let scanned = outcomes.len();
        outcomes.retain(|o| o.changed() || o.error.is_some());

        Ok(BatchSummary { scanned, files: outcomes })
    }

    fn rewrite_one(&self, file: &Path, mode: WriteMode) -> Result<FileOutcome, BatchError> {
        match emit::rewrite_file(file, &self.rewrite) {
            Ok(output) => {
                if output.changed() && mode == WriteMode::Write {
                    std::fs::write(file, &output.code).map_err(|source| BatchError::WriteError {
                        path: file.to_path_buf(),
                        source,
                    })?;
                    debug!(path = %file.display(), edits = output.edits.len(), "wrote file");
                }
                Ok(FileOutcome { path: file.to_path_buf(), edits: output.edits, error: None })
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", file.display(), e);
                Ok(FileOutcome {
                    path: file.to_path_buf(),
                    edits: Vec::new(),
                    error: Some(e.to_string()),
                })
            }
        }
    }

    pub fn discover_files(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, BatchError> {
        let targets: Vec<PathBuf> = if paths.is_empty() {
            vec![self.root.clone()]
        } else {
            paths.iter().map(|p| self.resolve(p)).collect()
        };

        let mut files = Vec::new();
        for target in &targets {
            if target.is_file() {
                if self.config.is_supported_extension(target) {
                    files.push(target.clone());
                }
                continue;
            }
            self.walk(target, &mut files)?;
        }

        files.sort();
        files.dedup();
        Ok(files)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn walk(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), BatchError> {
        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| BatchError::WalkError(e.to_string()))?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            if !self.config.is_supported_extension(path) {
                continue;
            }

            if self.config.should_ignore(path) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        Ok(())
    }
}
