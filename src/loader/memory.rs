use crate::error::{Error, Result};
use crate::ext::{join, SlashPath};
use crate::loader::interface::Loader;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::sync::{Arc, PoisonError, RwLock};

/// Loader serving templates registered in memory, keyed by absolute slash paths.
///
/// Registration goes through `&self`, so a loader shared with a set through an
/// `Arc` can keep receiving templates after the set was created.
#[derive(Debug, Default)]
pub struct InMemoryLoader {
    files: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) `contents` under `template_path`.
    ///
    /// The path is normalised to an absolute slash-separated form first, so
    /// `rel/path` and `/rel/path` name the same entry.
    pub fn set(&self, template_path: &str, contents: &str) {
        let key = normalize(template_path);
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::from(contents.as_bytes()));
    }

    /// Removes a registered template, returning whether it was present.
    pub fn remove(&self, template_path: &str) -> bool {
        let key = normalize(template_path);
        self.files.write().unwrap_or_else(PoisonError::into_inner).remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(template_path: &str) -> String {
    join("/", &template_path.to_slash())
}

impl Loader for InMemoryLoader {
    fn exists(&self, template_path: &str) -> Option<String> {
        let key = normalize(template_path);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        files.contains_key(&key).then_some(key)
    }

    fn open(&self, template_path: &str) -> Result<Box<dyn Read + Send>> {
        let key = normalize(template_path);
        let files = self.files.read().unwrap_or_else(PoisonError::into_inner);
        match files.get(&key) {
            Some(bytes) => Ok(Box::new(Cursor::new(Arc::clone(bytes)))),
            None => Err(Error::LoadError {
                path: template_path.to_string(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{template_path} does not exist"),
                ),
            }),
        }
    }
}
