use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}.")]
    IoError(#[from] std::io::Error),

    #[error("Failed to render. Original error: {0}")]
    MinijinjaError(#[from] minijinja::Error),

    /// No extension-qualified candidate exists in the cache or the loader.
    #[error("Template '{path}' could not be found.")]
    TemplateNotFound { path: String },

    /// An explicitly parsed path has no meaningful base name.
    #[error("Template path '{path}' has no base name.")]
    InvalidTemplatePath { path: String },

    /// The loader reported the template as existing but could not read it.
    #[error("Failed to load template '{path}'. Original error: {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse template '{path}' at line {line}: {message}.")]
    ParseError { path: String, line: usize, message: String },

    /// Any fault raised while a template was being evaluated, including panics.
    #[error("Failed to execute template '{template}': {message}")]
    ExecutionFault { template: String, message: String },

    #[error("Template '{path}' extends or imports itself.")]
    CyclicInheritance { path: String },

    #[error("Template '{path}' is no longer attached to a template set.")]
    DetachedTemplate { path: String },

    #[error("Block '{name}' is not defined.")]
    UnresolvedBlock { name: String },

    #[error("Failed to parse config file '{path}'. Original error: {message}")]
    ConfigParseError { path: String, message: String },

    #[error("Configuration error: {0}.")]
    ConfigValidation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Normalises an evaluation error into an [`Error::ExecutionFault`] for `template`.
    pub(crate) fn into_execution_fault(self, template: &str) -> Self {
        match self {
            fault @ Error::ExecutionFault { .. } => fault,
            other => {
                Error::ExecutionFault { template: template.to_string(), message: other.to_string() }
            }
        }
    }
}

/// Convenience type alias for Results with [`Error`] as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{}", err);
    std::process::exit(crate::constants::exit_codes::FAILURE);
}
