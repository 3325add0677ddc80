//! Error types for the code modifier.

use std::path::PathBuf;
use thiserror::Error;

/// The syntactic role a snippet was expected to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetKind {
    Statement,
    GlobalStatement,
    Member,
    Attribute,
    Parameter,
    Type,
    Expression,
}

impl std::fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SnippetKind::Statement => "statement",
            SnippetKind::GlobalStatement => "global statement",
            SnippetKind::Member => "member",
            SnippetKind::Attribute => "attribute",
            SnippetKind::Parameter => "parameter",
            SnippetKind::Type => "type",
            SnippetKind::Expression => "expression",
        };
        f.write_str(name)
    }
}

/// The main error type for code modification.
#[derive(Error, Debug)]
pub enum ModifierError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("Tree-sitter parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Tree-sitter query error: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("Malformed {kind} snippet `{text}`")]
    MalformedSnippet { kind: SnippetKind, text: String },

    #[error("Transform failed: {message}")]
    TransformFailed { message: String },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ModifierError {
    /// Creates a malformed-snippet error.
    pub fn malformed(kind: SnippetKind, text: impl Into<String>) -> Self {
        ModifierError::MalformedSnippet {
            kind,
            text: text.into(),
        }
    }

    /// Returns true for errors that only invalidate a single change.
    pub fn is_per_change(&self) -> bool {
        matches!(self, ModifierError::MalformedSnippet { .. })
    }
}

/// A specialized Result type for code modification.
pub type Result<T> = std::result::Result<T, ModifierError>;
