//! In-place specifier rewrite over an `oxc` program.
//!
//! Matched specifiers are replaced by freshly built literals. Nodes that do
//! not match are left where they are, so every untouched node keeps its
//! arena allocation and compares equal by address before and after.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ExportAllDeclaration, ExportNamedDeclaration, Expression, ImportDeclaration, ImportExpression,
    Program, StringLiteral,
};
use oxc_ast::AstBuilder;
use oxc_ast_visit::{walk_mut, VisitMut};
use serde::Serialize;
use tracing::debug;

use crate::classifier::{self, ModuleKind, ModuleNode, Verdict};
use crate::config::RewriteConfig;

pub const JS_EXTENSION: &str = ".js";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    /// Reads the style from the opening character of a literal's raw text.
    pub fn from_raw(raw: &str) -> Self {
        if raw.starts_with('\'') {
            QuoteStyle::Single
        } else {
            QuoteStyle::Double
        }
    }

    pub fn as_char(self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

/// One rewritten specifier, positioned in the original source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecifierEdit {
    pub kind: ModuleKind,
    pub verdict: Verdict,
    pub quote: QuoteStyle,
    pub start: u32,
    pub end: u32,
    pub line: usize,
    pub column: usize,
    pub original: String,
    pub replacement: String,
}

/// Rewrites every qualifying specifier in `program` and returns the edits
/// in source order.
pub fn rewrite_program<'a>(
    program: &mut Program<'a>,
    allocator: &'a Allocator,
    source_text: &str,
    config: &RewriteConfig,
) -> Vec<SpecifierEdit> {
    let mut rewriter = SpecifierRewriter::new(allocator, source_text, config);
    rewriter.visit_program(program);
    let mut edits = rewriter.into_edits();
    edits.sort_by_key(|edit| edit.start);
    edits
}

pub struct SpecifierRewriter<'a, 's> {
    ast: AstBuilder<'a>,
    source_text: &'s str,
    config: &'s RewriteConfig,
    edits: Vec<SpecifierEdit>,
}

impl<'a, 's> SpecifierRewriter<'a, 's> {
    pub fn new(allocator: &'a Allocator, source_text: &'s str, config: &'s RewriteConfig) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            source_text,
            config,
            edits: Vec::new(),
        }
    }

    pub fn into_edits(self) -> Vec<SpecifierEdit> {
        self.edits
    }

    fn verdict(&self, node: ModuleNode<'_, 'a>) -> Verdict {
        let verdict = classifier::classify(node, self.config);
        debug!(kind = ?node.kind(), ?verdict, "classified module node");
        verdict
    }

    /// Builds the replacement literal and records the edit.
    fn rewritten(
        &mut self,
        lit: &StringLiteral<'a>,
        kind: ModuleKind,
        verdict: Verdict,
    ) -> StringLiteral<'a> {
        let raw = raw_text(lit, self.source_text);
        let quote = raw.map(QuoteStyle::from_raw).unwrap_or(QuoteStyle::Double);
        let value = format!("{}{}", lit.value, JS_EXTENSION);
        let replacement = quoted_with_extension(raw, &lit.value, quote);

        let start = lit.span.start;
        let (line, column) = line_column(self.source_text, start as usize);
        debug!(
            specifier = %lit.value,
            rewritten = %value,
            line,
            "rewriting module specifier"
        );

        self.edits.push(SpecifierEdit {
            kind,
            verdict,
            quote,
            start,
            end: lit.span.end,
            line,
            column,
            original: raw.map(String::from).unwrap_or_else(|| lit.value.to_string()),
            replacement: replacement.clone(),
        });

        self.ast.string_literal(
            lit.span,
            self.ast.atom(&value),
            Some(self.ast.atom(&replacement)),
        )
    }
}

impl<'a> VisitMut<'a> for SpecifierRewriter<'a, '_> {
    fn visit_import_declaration(&mut self, it: &mut ImportDeclaration<'a>) {
        let verdict = self.verdict(ModuleNode::Import(&*it));
        if verdict.should_rewrite() {
            it.source = self.rewritten(&it.source, ModuleKind::Import, verdict);
            return;
        }
        walk_mut::walk_import_declaration(self, it);
    }

    fn visit_export_named_declaration(&mut self, it: &mut ExportNamedDeclaration<'a>) {
        let verdict = self.verdict(ModuleNode::ExportNamed(&*it));
        if verdict.should_rewrite() {
            if let Some(source) = &it.source {
                let replaced = self.rewritten(source, ModuleKind::ExportNamed, verdict);
                it.source = Some(replaced);
                return;
            }
        }
        walk_mut::walk_export_named_declaration(self, it);
    }

    fn visit_export_all_declaration(&mut self, it: &mut ExportAllDeclaration<'a>) {
        let verdict = self.verdict(ModuleNode::ExportAll(&*it));
        if verdict.should_rewrite() {
            it.source = self.rewritten(&it.source, ModuleKind::ExportAll, verdict);
            return;
        }
        walk_mut::walk_export_all_declaration(self, it);
    }

    fn visit_import_expression(&mut self, it: &mut ImportExpression<'a>) {
        let verdict = self.verdict(ModuleNode::DynamicImport(&*it));
        if verdict.should_rewrite() {
            if let Expression::StringLiteral(source) = &it.source {
                let replaced = self.rewritten(source, ModuleKind::DynamicImport, verdict);
                it.source = Expression::StringLiteral(self.ast.alloc(replaced));
                return;
            }
        }
        walk_mut::walk_import_expression(self, it);
    }
}

fn raw_text<'s>(lit: &'s StringLiteral<'_>, source_text: &'s str) -> Option<&'s str> {
    let raw = match &lit.raw {
        Some(raw) => Some(raw.as_str()),
        None => source_text.get(lit.span.start as usize..lit.span.end as usize),
    };
    raw.filter(|raw| raw.len() >= 2 && (raw.starts_with('\'') || raw.starts_with('"')))
}

/// Appends the extension inside the original quotes so escapes in the
/// original text survive untouched.
fn quoted_with_extension(raw: Option<&str>, value: &str, quote: QuoteStyle) -> String {
    let q = quote.as_char();
    match raw {
        Some(raw) => format!("{q}{}{JS_EXTENSION}{q}", &raw[1..raw.len() - 1]),
        None => {
            let escaped = value
                .replace('\\', "\\\\")
                .replace(q, &format!("\\{q}"));
            format!("{q}{escaped}{JS_EXTENSION}{q}")
        }
    }
}

/// 1-based line and column of a byte offset.
pub fn line_column(source_text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source_text.len());
    let before = &source_text.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before.iter().rposition(|&b| b == b'\n').map(|i| i + 1).unwrap_or(0);
    (line, offset - line_start + 1)
}
