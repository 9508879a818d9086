use crate::error::{Error, Result};
use crate::ext::SlashPath;
use crate::loader::interface::Loader;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Loader for templates from the local filesystem, rooted at a base directory.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    dir: PathBuf,
}

impl FileSystemLoader {
    /// Creates a new FileSystemLoader rooted at `dir`.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// The base directory templates are resolved against.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a slash-separated template path below the base directory. Template
    /// paths are rooted at the set, so a leading `/` never escapes the base.
    fn resolve(&self, template_path: &str) -> PathBuf {
        let relative = template_path.to_slash().clean();
        let relative = relative.trim_start_matches('/');
        let mut full = self.dir.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
            full.push(segment);
        }
        full
    }
}

impl Loader for FileSystemLoader {
    fn exists(&self, template_path: &str) -> Option<String> {
        let full = self.resolve(template_path);
        match full.metadata() {
            Ok(meta) if !meta.is_dir() => Some(full.to_string_lossy().into_owned()),
            _ => None,
        }
    }

    fn open(&self, template_path: &str) -> Result<Box<dyn Read + Send>> {
        let full = self.resolve(template_path);
        debug!("Opening template '{}' from '{}'", template_path, full.display());
        let file = File::open(&full)
            .map_err(|source| Error::LoadError { path: template_path.to_string(), source })?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_exists_returns_resolved_location() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("index.jet"), "hello").unwrap();

        let loader = FileSystemLoader::new(temp_dir.path());
        let found = loader.exists("/index.jet").unwrap();
        assert_eq!(PathBuf::from(found), temp_dir.path().join("index.jet"));
    }

    #[test]
    fn test_directory_is_not_a_template() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("views")).unwrap();

        let loader = FileSystemLoader::new(temp_dir.path());
        assert!(loader.exists("/views").is_none());
        assert!(loader.exists("views").is_none());
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let loader = FileSystemLoader::new(temp_dir.path());
        assert!(loader.exists("/nope.jet").is_none());
        assert!(matches!(loader.open("/nope.jet"), Err(Error::LoadError { .. })));
    }

    #[test]
    fn test_parent_segments_stay_below_base() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("templates");
        fs::create_dir(&base).unwrap();
        fs::write(temp_dir.path().join("secret.jet"), "outside").unwrap();
        fs::write(base.join("secret.jet"), "inside").unwrap();

        let loader = FileSystemLoader::new(&base);
        let mut content = String::new();
        loader.open("/../secret.jet").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "inside");
    }
}
