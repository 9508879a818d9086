//! Options controlling how a template set resolves and parses templates.

use crate::constants::{DEFAULT_EXTENSIONS, DEFAULT_LEFT_DELIM, DEFAULT_RIGHT_DELIM};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Action delimiters used by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Delims {
    #[serde(default = "get_default_left_delim")]
    pub left: String,
    #[serde(default = "get_default_right_delim")]
    pub right: String,
}

impl Default for Delims {
    fn default() -> Self {
        Self { left: get_default_left_delim(), right: get_default_right_delim() }
    }
}

/// Resolution and parsing options of a [`Set`](crate::Set).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SetOptions {
    /// Suffixes tried in order when resolving a logical path.
    #[serde(default = "get_default_extensions")]
    pub extensions: Vec<String>,
    /// Bypasses the template cache so every lookup reloads and reparses.
    #[serde(default)]
    pub development_mode: bool,
    #[serde(default)]
    pub delims: Delims,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            extensions: get_default_extensions(),
            development_mode: false,
            delims: Delims::default(),
        }
    }
}

impl SetOptions {
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(Error::ConfigValidation("extensions must not be empty".into()));
        }
        if self.delims.left.is_empty() || self.delims.right.is_empty() {
            return Err(Error::ConfigValidation("delimiters must not be empty".into()));
        }
        if self.delims.left == self.delims.right {
            return Err(Error::ConfigValidation(
                "left and right delimiters must differ".into(),
            ));
        }
        Ok(())
    }

    /// Reads options from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    /// * `Error::ConfigParseError` for unreadable files, unknown suffixes or invalid content
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let parse_error =
            |message: String| Error::ConfigParseError { path: display.clone(), message };

        let content = std::fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
        let options: SetOptions = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            _ => return Err(parse_error("expected a .json, .yaml or .yml file".to_string())),
        };
        log::debug!("Loaded set options from '{}'", display);
        Ok(options)
    }
}

fn get_default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

fn get_default_left_delim() -> String {
    DEFAULT_LEFT_DELIM.to_string()
}

fn get_default_right_delim() -> String {
    DEFAULT_RIGHT_DELIM.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let options = SetOptions::default();
        assert_eq!(options.extensions, vec!["", ".jet", ".html.jet", ".jet.html"]);
        assert!(!options.development_mode);
        assert_eq!(options.delims.left, "{{");
        assert_eq!(options.delims.right, "}}");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_with_partial_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jetset.yaml");
        fs::write(&path, "development_mode: true\ndelims:\n  left: \"[[\"\n").unwrap();

        let options = SetOptions::load(&path).unwrap();
        assert!(options.development_mode);
        assert_eq!(options.delims.left, "[[");
        assert_eq!(options.delims.right, "}}");
        assert_eq!(options.extensions.len(), 4);
    }

    #[test]
    fn test_load_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("jetset.json");
        fs::write(&path, r#"{"extensions": [".tpl"]}"#).unwrap();

        let options = SetOptions::load(&path).unwrap();
        assert_eq!(options.extensions, vec![".tpl"]);
    }

    #[test]
    fn test_load_rejects_unknown_suffix_and_bad_content() {
        let temp_dir = TempDir::new().unwrap();
        let toml = temp_dir.path().join("jetset.toml");
        fs::write(&toml, "x = 1").unwrap();
        assert!(matches!(SetOptions::load(&toml), Err(Error::ConfigParseError { .. })));

        let json = temp_dir.path().join("broken.json");
        fs::write(&json, "{").unwrap();
        assert!(matches!(SetOptions::load(&json), Err(Error::ConfigParseError { .. })));

        let missing = temp_dir.path().join("missing.yml");
        assert!(matches!(SetOptions::load(&missing), Err(Error::ConfigParseError { .. })));
    }

    #[test]
    fn test_validate() {
        let mut options = SetOptions { extensions: vec![], ..Default::default() };
        assert!(matches!(options.validate(), Err(Error::ConfigValidation(_))));

        options.extensions = vec![String::new()];
        options.delims.right = "{{".to_string();
        assert!(matches!(options.validate(), Err(Error::ConfigValidation(_))));

        options.delims.right = String::new();
        assert!(matches!(options.validate(), Err(Error::ConfigValidation(_))));
    }
}
