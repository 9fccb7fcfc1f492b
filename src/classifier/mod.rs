//! Decides whether a module node's specifier gets the `.js` extension.

use oxc_ast::ast::{
    ExportAllDeclaration, ExportNamedDeclaration, Expression, ImportDeclaration, ImportExpression,
    StringLiteral,
};
use serde::Serialize;

use crate::config::RewriteConfig;

/// The node shapes that can carry a module specifier.
#[derive(Debug, Clone, Copy)]
pub enum ModuleNode<'n, 'a> {
    Import(&'n ImportDeclaration<'a>),
    ExportNamed(&'n ExportNamedDeclaration<'a>),
    ExportAll(&'n ExportAllDeclaration<'a>),
    DynamicImport(&'n ImportExpression<'a>),
}

#[derive(Debug, Clone, Copy)]
pub enum Specifier<'n, 'a> {
    Absent,
    Computed,
    Literal(&'n StringLiteral<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleKind {
    Import,
    ExportNamed,
    ExportAll,
    DynamicImport,
}

impl<'n, 'a> ModuleNode<'n, 'a> {
    pub fn kind(&self) -> ModuleKind {
        match self {
            ModuleNode::Import(_) => ModuleKind::Import,
            ModuleNode::ExportNamed(_) => ModuleKind::ExportNamed,
            ModuleNode::ExportAll(_) => ModuleKind::ExportAll,
            ModuleNode::DynamicImport(_) => ModuleKind::DynamicImport,
        }
    }

    pub fn specifier(&self) -> Specifier<'n, 'a> {
        match *self {
            ModuleNode::Import(decl) => Specifier::Literal(&decl.source),
            ModuleNode::ExportNamed(decl) => match &decl.source {
                Some(source) => Specifier::Literal(source),
                None => Specifier::Absent,
            },
            ModuleNode::ExportAll(decl) => Specifier::Literal(&decl.source),
            ModuleNode::DynamicImport(expr) => match &expr.source {
                Expression::StringLiteral(lit) => Specifier::Literal(lit),
                _ => Specifier::Computed,
            },
        }
    }
}

/// Outcome of classifying one node, with the reason behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Verdict {
    NotDeclaration,
    NoSpecifier,
    NotLiteral,
    HasExtension,
    NotRelative,
    ForceIncluded,
    Relative,
}

impl Verdict {
    pub fn should_rewrite(self) -> bool {
        matches!(self, Verdict::ForceIncluded | Verdict::Relative)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Verdict::NotDeclaration => "not an import or export declaration",
            Verdict::NoSpecifier => "declaration has no module specifier",
            Verdict::NotLiteral => "module specifier is not a string literal",
            Verdict::HasExtension => "specifier already has an extension",
            Verdict::NotRelative => "specifier is not a relative path",
            Verdict::ForceIncluded => "specifier matches forceInclude",
            Verdict::Relative => "relative specifier without extension",
        }
    }
}

pub fn should_rewrite(node: ModuleNode<'_, '_>, config: &RewriteConfig) -> bool {
    classify(node, config).should_rewrite()
}

pub fn classify(node: ModuleNode<'_, '_>, config: &RewriteConfig) -> Verdict {
    if matches!(node, ModuleNode::DynamicImport(_)) && !config.dynamic_imports() {
        return Verdict::NotDeclaration;
    }

    match node.specifier() {
        Specifier::Absent => Verdict::NoSpecifier,
        Specifier::Computed => Verdict::NotLiteral,
        Specifier::Literal(lit) => classify_text(lit.value.as_str(), config),
    }
}

/// Applies the text rules to a bare specifier. Relative specifiers are
/// rewritten only when they have no extension, whatever the force rules
/// say. Force inclusion applies to non-relative specifiers and skips the
/// extension check for them.
pub fn classify_text(specifier: &str, config: &RewriteConfig) -> Verdict {
    if is_relative(specifier) {
        return if extname(specifier).is_empty() {
            Verdict::Relative
        } else {
            Verdict::HasExtension
        };
    }
    if config.is_force_included(specifier) {
        return Verdict::ForceIncluded;
    }
    if !extname(specifier).is_empty() {
        return Verdict::HasExtension;
    }
    Verdict::NotRelative
}

pub fn is_relative(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// Extension of the last path segment, including the dot, with the same
/// rules as Node's `path.extname`: trailing slashes are ignored, a name
/// whose only dot is its first character has no extension, and `..`
/// has none either.
pub fn extname(path: &str) -> &str {
    let bytes = path.as_bytes();
    let mut start_dot: Option<usize> = None;
    let mut start_part = 0;
    let mut end: Option<usize> = None;
    let mut matched_slash = true;
    // 0: no segment chars seen after a dot, 1: a second dot, -1: regular chars before the dot
    let mut pre_dot_state = 0i8;

    for i in (0..bytes.len()).rev() {
        let byte = bytes[i];
        if byte == b'/' {
            if !matched_slash {
                start_part = i + 1;
                break;
            }
            continue;
        }
        if end.is_none() {
            matched_slash = false;
            end = Some(i + 1);
        }
        if byte == b'.' {
            if start_dot.is_none() {
                start_dot = Some(i);
            } else if pre_dot_state != 1 {
                pre_dot_state = 1;
            }
        } else if start_dot.is_some() {
            pre_dot_state = -1;
        }
    }

    match (start_dot, end) {
        (Some(dot), Some(end)) => {
            let is_double_dot = pre_dot_state == 1 && dot + 1 == end && dot == start_part + 1;
            if pre_dot_state == 0 || is_double_dot {
                ""
            } else {
                &path[dot..end]
            }
        }
        _ => "",
    }
}
