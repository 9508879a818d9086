use std::io::Read;
use std::sync::Arc;

use crate::error::Result;

/// Minimal capability a template set needs from a template source.
pub trait Loader: Send + Sync {
    /// Checks whether a template exists at `template_path`.
    ///
    /// # Returns
    /// * `Option<String>` - The resolved location of the template, if it exists
    fn exists(&self, template_path: &str) -> Option<String>;

    /// Opens the template content for reading.
    ///
    /// # Errors
    /// * `Error::LoadError` if the template cannot be opened
    fn open(&self, template_path: &str) -> Result<Box<dyn Read + Send>>;
}

impl<L: Loader + ?Sized> Loader for Arc<L> {
    fn exists(&self, template_path: &str) -> Option<String> {
        (**self).exists(template_path)
    }

    fn open(&self, template_path: &str) -> Result<Box<dyn Read + Send>> {
        (**self).open(template_path)
    }
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn exists(&self, template_path: &str) -> Option<String> {
        (**self).exists(template_path)
    }

    fn open(&self, template_path: &str) -> Result<Box<dyn Read + Send>> {
        (**self).open(template_path)
    }
}
