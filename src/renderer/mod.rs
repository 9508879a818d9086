/// Per-execution state and its reuse pool.
pub(crate) mod runtime;

/// Walks a node tree and writes output.
pub(crate) mod evaluator;

/// Message lookup hooks available to expressions.
pub mod translator;

pub use translator::{format_fallback, Translator};
