//! Locating project files on disk.

use crate::error::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Build output and VCS directories never patched.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/bin/**", "**/obj/**", "**/.git/**"];

/// Predicates for matching files in a project.
#[derive(Default, Clone)]
pub struct FileMatcher {
    extensions: Vec<String>,
    include_globs: Vec<String>,
    exclude_globs: Vec<String>,
}

impl FileMatcher {
    /// Creates a new file matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher for every file named `file_name` below the root, outside
    /// build output directories.
    pub fn named(file_name: &str) -> Self {
        let name = file_name.trim_start_matches("./").replace('\\', "/");
        DEFAULT_EXCLUDES
            .iter()
            .fold(Self::new().include(format!("**/{name}")), |m, g| m.exclude(*g))
    }

    /// Matches files with the given extension (without dot).
    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extensions.push(ext.into());
        self
    }

    /// Includes files matching the glob pattern.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include_globs.push(pattern.into());
        self
    }

    /// Excludes files matching the glob pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_globs.push(pattern.into());
        self
    }

    /// Collects all matching files from the given root directory, sorted.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let include_set = build_glob_set(&self.include_globs)?;
        let exclude_set = build_glob_set(&self.exclude_globs)?;

        let mut matched = Vec::new();

        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }

            if !self.extensions.is_empty() {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if !self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
                    continue;
                }
            }

            // Globs match against the root-relative path
            let rel_path = path.strip_prefix(root).unwrap_or(path);

            if !self.include_globs.is_empty() && !include_set.is_match(rel_path) {
                continue;
            }

            if !self.exclude_globs.is_empty() && exclude_set.is_match(rel_path) {
                continue;
            }

            matched.push(path.to_path_buf());
        }

        matched.sort();
        Ok(matched)
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
