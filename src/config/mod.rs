use std::path::Path;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const CONFIG_FILE: &str = ".jsextrc.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Project settings as read from `.jsextrc.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, deserialize_with = "deserialize_patterns")]
    pub force_include: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_patterns")]
    pub force_exclude: Vec<String>,

    #[serde(default)]
    pub dynamic_imports: bool,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec![
        ".ts".to_string(),
        ".tsx".to_string(),
        ".mts".to_string(),
        ".js".to_string(),
        ".jsx".to_string(),
        ".mjs".to_string(),
    ]
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/dist/**".to_string(),
        "**/build/**".to_string(),
        "**/.git/**".to_string(),
    ]
}

fn deserialize_patterns<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_patterns(&value))
}

/// Accepts a single pattern or a list of patterns. Entries that are not
/// strings are dropped, and any other shape yields no patterns.
pub fn normalize_patterns(value: &Value) -> Vec<String> {
    match value {
        Value::String(pattern) => vec![pattern.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            force_include: Vec::new(),
            force_exclude: Vec::new(),
            dynamic_imports: false,
            extensions: default_extensions(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Appends command-line overrides to the values read from disk.
    pub fn extend_with(
        &mut self,
        force_include: &[String],
        force_exclude: &[String],
        dynamic_imports: bool,
    ) {
        self.force_include.extend_from_slice(force_include);
        self.force_exclude.extend_from_slice(force_exclude);
        self.dynamic_imports |= dynamic_imports;
    }

    pub fn rewrite_config(&self) -> Result<RewriteConfig, ConfigError> {
        Ok(RewriteConfig::new(&self.force_include, &self.force_exclude)?
            .with_dynamic_imports(self.dynamic_imports))
    }

    pub fn should_ignore(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.ignore_patterns {
            if let Ok(glob) = glob::Pattern::new(pattern) {
                if glob.matches(&path_str) {
                    return true;
                }
            }
        }

        path_str.contains("node_modules")
    }

    pub fn is_supported_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_with_dot = format!(".{}", ext);
                self.extensions.contains(&ext_with_dot)
            })
            .unwrap_or(false)
    }
}

/// Compiled force rules shared by every file of one run.
///
/// A specifier is force-included when it matches at least one include
/// pattern and no exclude pattern. The default value has no rules, which
/// leaves only relative, extensionless specifiers eligible.
#[derive(Debug, Clone, Default)]
pub struct RewriteConfig {
    force_include: Vec<Regex>,
    force_exclude: Vec<Regex>,
    dynamic_imports: bool,
}

impl RewriteConfig {
    pub fn new<S: AsRef<str>>(force_include: &[S], force_exclude: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            force_include: compile_patterns(force_include)?,
            force_exclude: compile_patterns(force_exclude)?,
            dynamic_imports: false,
        })
    }

    pub fn with_dynamic_imports(mut self, enabled: bool) -> Self {
        self.dynamic_imports = enabled;
        self
    }

    pub fn dynamic_imports(&self) -> bool {
        self.dynamic_imports
    }

    pub fn is_force_included(&self, specifier: &str) -> bool {
        self.force_include.iter().any(|re| re.is_match(specifier))
            && !self.force_exclude.iter().any(|re| re.is_match(specifier))
    }
}

fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}
