//! Shared helpers for the templet integration tests.
//!
//! Besides small engine builders, this loads YAML fixture suites from
//! `tests/fixtures`. Each case lists in-memory template files, the entry
//! template, optional render data and either the expected output or a
//! substring of the expected error.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use templet::{Context, Engine, MemoryResolver, TempletError};
use walkdir::WalkDir;

pub fn engine(files: &[(&str, &str)]) -> Engine<MemoryResolver> {
    let mut resolver = MemoryResolver::new();
    for (name, text) in files {
        resolver.insert(name, text);
    }
    Engine::new(resolver)
}

/// Renders `entry` with an empty context.
pub fn render(files: &[(&str, &str)], entry: &str) -> Result<String, TempletError> {
    engine(files).render_file(entry, Context::new())
}

pub fn render_with(
    files: &[(&str, &str)],
    entry: &str,
    data: serde_json::Value,
) -> Result<String, TempletError> {
    let context = Context::from_json(data)?;
    engine(files).render_file(entry, context)
}

// ============================================================================
// YAML FIXTURES
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureCase {
    pub name: String,
    pub files: BTreeMap<String, String>,
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub expect_error: Option<String>,
}

fn default_entry() -> String {
    "page.html".to_string()
}

impl FixtureCase {
    /// Runs the case, returning a description of the mismatch on failure.
    pub fn run(&self) -> Result<(), String> {
        let files: Vec<(&str, &str)> = self
            .files
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
            .collect();
        let data = self
            .data
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
        let result = render_with(&files, &self.entry, data);

        match (&self.expected, &self.expect_error, result) {
            (Some(expected), None, Ok(actual)) if &actual == expected => Ok(()),
            (Some(expected), None, Ok(actual)) => {
                Err(format!("expected output {expected:?}, got {actual:?}"))
            }
            (None, Some(needle), Err(err)) if err.to_string().contains(needle.as_str()) => Ok(()),
            (None, Some(needle), Err(err)) => {
                Err(format!("expected error containing {needle:?}, got {err}"))
            }
            (_, _, Ok(actual)) => Err(format!("expected an error, rendered {actual:?}")),
            (_, _, Err(err)) => Err(format!("unexpected error: {err}")),
        }
    }
}

/// Every fixture case below `dir`, tagged with the file it came from.
pub fn load_fixtures(dir: &Path) -> Vec<(String, FixtureCase)> {
    let mut cases = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "yaml") {
            continue;
        }
        let text = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
        let suite: Vec<FixtureCase> = serde_yaml::from_str(&text)
            .unwrap_or_else(|e| panic!("failed to parse {}: {e}", path.display()));
        let file = path.display().to_string();
        cases.extend(suite.into_iter().map(|case| (file.clone(), case)));
    }
    cases
}
