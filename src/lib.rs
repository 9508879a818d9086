/// Handles argument parsing and the render command.
pub mod cli;

/// Defines custom error types.
pub mod error;

/// Constants shared across modules.
pub mod constants;

/// Set options and their file format.
pub mod config;

/// Output escaping functions.
pub mod escape;

/// Extension traits for built-in types.
pub mod ext;

/// A set of helpers for reading template and input streams.
pub mod ioutils;

/// Template sources: the file system and memory.
pub mod loader;

/// Execution state, evaluation and translation hooks.
pub mod renderer;

/// Name to value bindings for variables and globals.
pub mod scope;

/// Template resolution, caching and globals.
pub mod set;

/// Parsed templates, their node trees and execution.
pub mod template;

pub use config::{Delims, SetOptions};
pub use error::{Error, Result};
pub use escape::{html_escape, no_escape, safe_writer, SafeWriter};
pub use loader::{FileSystemLoader, InMemoryLoader, Loader};
pub use minijinja::Value;
pub use renderer::Translator;
pub use scope::{Func, Scope, ScopeValue};
pub use set::Set;
pub use template::Template;
