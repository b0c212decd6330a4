//! Engine configuration, read from YAML.
//!
//! ```yaml
//! root: templates
//! extensions: [html, tpl]
//! max_import_depth: 32
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compiler::{CompileOptions, DEFAULT_MAX_IMPORT_DEPTH};
use crate::{err_msg, TempletError};

/// Name looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "templet.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory template names are resolved against.
    pub root: PathBuf,
    /// File extensions `templet check` treats as templates.
    pub extensions: Vec<String>,
    pub max_import_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extensions: vec!["html".to_string(), "tpl".to_string()],
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, TempletError> {
        serde_yaml::from_str(text)
            .map_err(|e| err_msg!(Internal, "Invalid configuration: {}", e).caused_by(e))
    }

    pub fn load(path: &Path) -> Result<Self, TempletError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            err_msg!(Internal, "Unable to read configuration `{}`", path.display()).caused_by(e)
        })?;
        let mut config = Self::from_yaml(&text)?;
        // A relative root is relative to the config file.
        if config.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.root = dir.join(&config.root);
            }
        }
        tracing::debug!(config = %path.display(), root = %config.root.display(), "loaded configuration");
        Ok(config)
    }

    /// Loads `path` when given, else `templet.yaml` when it exists, else
    /// the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, TempletError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            max_import_depth: self.max_import_depth,
        }
    }

    /// Whether `path` has one of the template extensions.
    pub fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("max_import_depth: 4\n").unwrap();
        assert_eq!(config.max_import_depth, 4);
        assert_eq!(config.extensions, ["html", "tpl"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_yaml("roots: x\n").is_err());
    }

    #[test]
    fn template_extensions() {
        let config = Config::default();
        assert!(config.is_template(Path::new("a/b.html")));
        assert!(!config.is_template(Path::new("a/b.rs")));
    }
}
