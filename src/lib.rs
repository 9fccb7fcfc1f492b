pub mod parser;
pub mod classifier;
pub mod rewriter;
pub mod emit;
pub mod config;
pub mod batch;
pub mod output;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

pub use classifier::{classify, classify_text, should_rewrite, ModuleKind, ModuleNode, Verdict};
pub use config::{Config, RewriteConfig};
pub use emit::{rewrite_source, RewriteOutput};
pub use rewriter::{rewrite_program, SpecifierEdit, JS_EXTENSION};
pub use batch::{BatchRewriter, BatchSummary, WriteMode};
