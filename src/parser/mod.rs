use std::path::Path;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::SourceType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse file: {0}")]
    SyntaxError(String),
}

/// Parses `source` as the language implied by `path`'s extension.
///
/// Recoverable syntax errors are rejected too: rewriting a partially
/// recovered tree could splice edits into the wrong places.
pub fn parse_source<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    path: &Path,
) -> Result<Program<'a>, ParseError> {
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let parser = Parser::new(allocator, source, source_type);
    let result = parser.parse();

    if result.panicked || !result.errors.is_empty() {
        return Err(ParseError::SyntaxError(
            result.errors.iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    Ok(result.program)
}
