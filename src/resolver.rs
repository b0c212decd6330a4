//! Template loading.
//!
//! Import paths are resolved relative to the importing file's directory.
//! Names use `/` separators on every platform; `.` and `..` segments are
//! folded away so the same file always gets the same name.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{err_msg, TempletError};

/// A loaded template file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Normalized name, used for diagnostics, symbol keys and cycle checks.
    pub name: String,
    pub text: String,
}

pub trait Resolver {
    /// Loads `path` as written in a template, relative to the file named
    /// `from` when there is one.
    fn load(&self, path: &str, from: Option<&str>) -> Result<Source, TempletError>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn load(&self, path: &str, from: Option<&str>) -> Result<Source, TempletError> {
        (**self).load(path, from)
    }
}

/// Joins `path` onto the directory of `from` and normalizes the result.
///
/// ```rust
/// use templet::resolver::join_relative;
/// assert_eq!(join_relative(Some("pages/home.html"), "../lib/w.html"), "lib/w.html");
/// assert_eq!(join_relative(Some("pages/home.html"), "/w.html"), "/w.html");
/// assert_eq!(join_relative(None, "./a/./b.html"), "a/b.html");
/// ```
pub fn join_relative(from: Option<&str>, path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    if !absolute {
        if let Some(from) = from {
            let base = from.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
            parts.extend(base.split('/').filter(|p| !p.is_empty()));
        }
    }
    let rooted = absolute || from.is_some_and(|f| f.starts_with('/'));
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else {
        joined
    }
}

// ============================================================================
// FILESYSTEM
// ============================================================================

/// Loads templates from disk below `root`. Absolute names bypass the root.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl Resolver for FileResolver {
    fn load(&self, path: &str, from: Option<&str>) -> Result<Source, TempletError> {
        let name = join_relative(from, path);
        let file = self.root.join(&name);
        tracing::trace!(path, name = %name, file = %file.display(), "loading template");
        let text = std::fs::read_to_string(&file).map_err(|e| {
            err_msg!(Resolve, "Unable to load template `{}` ({})", name, file.display())
                .caused_by(e)
        })?;
        Ok(Source { name, text })
    }
}

// ============================================================================
// IN MEMORY
// ============================================================================

/// Templates held in a map, keyed by normalized name. Used by tests and by
/// embedders that ship templates inside the binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    files: BTreeMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryResolver::insert`].
    pub fn with(mut self, name: &str, text: &str) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: &str, text: &str) {
        self.files.insert(join_relative(None, name), text.to_string());
    }
}

impl Resolver for MemoryResolver {
    fn load(&self, path: &str, from: Option<&str>) -> Result<Source, TempletError> {
        let name = join_relative(from, path);
        let Some(text) = self.files.get(&name) else {
            return Err(err_msg!(Resolve, "Unable to load template `{}`", name));
        };
        Ok(Source {
            name,
            text: text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_to_importing_directory() {
        assert_eq!(join_relative(Some("a/b/page.html"), "w.html"), "a/b/w.html");
        assert_eq!(join_relative(Some("a/b/page.html"), "../../w.html"), "w.html");
        assert_eq!(join_relative(Some("page.html"), "./w.html"), "w.html");
        assert_eq!(join_relative(Some("/srv/t/page.html"), "w.html"), "/srv/t/w.html");
    }

    #[test]
    fn memory_resolver_normalizes_names() {
        let resolver = MemoryResolver::new().with("./lib/w.html", "x");
        let source = resolver.load("../lib/w.html", Some("pages/p.html")).unwrap();
        assert_eq!(source.name, "lib/w.html");
        assert_eq!(source.text, "x");
        assert!(resolver.load("missing.html", None).is_err());
    }
}
