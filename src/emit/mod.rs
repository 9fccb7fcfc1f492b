//! Turns rewritten specifiers back into source text.
//!
//! Output is produced by splicing each edit's replacement into the original
//! text, so everything outside the rewritten literals is preserved byte for
//! byte.

use std::path::Path;
use oxc_allocator::Allocator;
use serde::Serialize;
use tracing::warn;

use crate::config::RewriteConfig;
use crate::parser::{self, ParseError};
use crate::rewriter::{self, SpecifierEdit};

#[derive(Debug, Clone, Serialize)]
pub struct RewriteOutput {
    #[serde(skip)]
    pub code: String,
    pub edits: Vec<SpecifierEdit>,
}

impl RewriteOutput {
    pub fn changed(&self) -> bool {
        !self.edits.is_empty()
    }
}

pub fn rewrite_source(
    source: &str,
    path: &Path,
    config: &RewriteConfig,
) -> Result<RewriteOutput, ParseError> {
    let allocator = Allocator::default();
    let mut program = parser::parse_source(&allocator, source, path)?;
    let edits = rewriter::rewrite_program(&mut program, &allocator, source, config);
    let code = apply_edits(source, &edits);
    Ok(RewriteOutput { code, edits })
}

pub fn rewrite_file(path: &Path, config: &RewriteConfig) -> Result<RewriteOutput, ParseError> {
    let source = std::fs::read_to_string(path)?;
    rewrite_source(&source, path, config)
}

/// Replaces each edit's span with its replacement. Edits must be sorted by
/// start offset and must not overlap; an edit that overlaps the previous
/// one or runs past the end of `source` is dropped with a warning.
pub fn apply_edits(source: &str, edits: &[SpecifierEdit]) -> String {
    let extra: usize = edits.iter().map(|e| e.replacement.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);
    let mut cursor = 0;

    for edit in edits {
        let start = edit.start as usize;
        let end = edit.end as usize;
        if start < cursor || end > source.len() || start > end {
            warn!(
                start,
                end,
                replacement = %edit.replacement,
                "dropping specifier edit that overlaps or falls outside the source"
            );
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.replacement);
        cursor = end;
    }

    out.push_str(&source[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn rewrite_ts(source: &str) -> RewriteOutput {
        rewrite_source(source, &PathBuf::from("test.ts"), &RewriteConfig::default()).unwrap()
    }

    #[test]
    fn test_relative_only() {
        let output = rewrite_ts("import x from 'left-pad';\nimport y from './left-pad';\n");
        assert_eq!(
            output.code,
            "import x from 'left-pad';\nimport y from './left-pad.js';\n"
        );
    }

    #[test]
    fn test_existing_extension_kept() {
        let source = "import a from './a.js';\n";
        let output = rewrite_ts(source);
        assert!(!output.changed());
        assert_eq!(output.code, source);
    }

    #[test]
    fn test_quotes_and_formatting_preserved() {
        let source = "// header\nimport {\n  a,\n  b\n} from \"./a\"; // trailing\nexport * from '../b';\n";
        let output = rewrite_ts(source);
        assert_eq!(
            output.code,
            "// header\nimport {\n  a,\n  b\n} from \"./a.js\"; // trailing\nexport * from '../b.js';\n"
        );
    }

    #[test]
    fn test_export_named_from() {
        let output = rewrite_ts("export { a } from './mod';");
        assert_eq!(output.code, "export { a } from './mod.js';");
    }

    #[test]
    fn test_type_annotations_untouched() {
        let source = "import type { T } from './types';\nconst x: T = { a: 'b' as const };\n";
        let output = rewrite_ts(source);
        assert_eq!(
            output.code,
            "import type { T } from './types.js';\nconst x: T = { a: 'b' as const };\n"
        );
    }

    #[test]
    fn test_computed_dynamic_import_untouched() {
        let source = "const m = await import(`./${name}`);\n";
        let config = RewriteConfig::default().with_dynamic_imports(true);
        let output = rewrite_source(source, &PathBuf::from("test.mjs"), &config).unwrap();
        assert_eq!(output.code, source);
    }

    #[test]
    fn test_force_include() {
        let config = RewriteConfig::new(&["^my-pkg"], &["^my-pkg/internal"]).unwrap();
        let source = "import a from 'my-pkg';\nimport b from 'my-pkg/internal';\n";
        let output = rewrite_source(source, &PathBuf::from("test.ts"), &config).unwrap();
        assert_eq!(
            output.code,
            "import a from 'my-pkg.js';\nimport b from 'my-pkg/internal';\n"
        );
    }

    #[test]
    fn test_apply_edits_skips_overlaps() {
        let source = "abcdef";
        let edit = |start: u32, end: u32, replacement: &str| SpecifierEdit {
            kind: crate::classifier::ModuleKind::Import,
            verdict: crate::classifier::Verdict::Relative,
            quote: crate::rewriter::QuoteStyle::Single,
            start,
            end,
            line: 1,
            column: start as usize + 1,
            original: String::new(),
            replacement: replacement.to_string(),
        };
        let edits = vec![edit(1, 3, "X"), edit(2, 4, "Y"), edit(4, 6, "Z")];
        assert_eq!(apply_edits(source, &edits), "aXdZ");

        let past_end = vec![edit(0, 1, "A"), edit(5, 9, "Q")];
        assert_eq!(apply_edits(source, &past_end), "Abcdef");
    }

    #[test]
    fn test_rewrite_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.ts");
        std::fs::write(&path, "export * from './lib';\n").unwrap();
        let output = rewrite_file(&path, &RewriteConfig::default()).unwrap();
        assert_eq!(output.code, "export * from './lib.js';\n");
    }

    #[test]
    fn test_rewrite_missing_file() {
        let result = rewrite_file(Path::new("/nonexistent/x.ts"), &RewriteConfig::default());
        assert!(matches!(result, Err(ParseError::IoError(_))));
    }
}
