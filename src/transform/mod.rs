//! Mutators that turn declarative changes into text edits.
//!
//! Structural mutators take a [`Document`](crate::syntax::Document) and a
//! scope node and return the [`TextEdit`](crate::syntax::TextEdit)s that
//! realise one change; an empty list means the scope is left as it was.
//! Markup files go through the line-oriented [`Transform`] implementations
//! instead.

pub mod guard;
pub mod insert;
pub mod lambda;
pub mod member_access;
pub mod scope;
pub mod statement;
pub mod text;

pub use insert::{Placement, StatementScope, insert_snippet, place_statement};
pub use lambda::apply_lambda;
pub use member_access::apply_member_access;
pub use statement::{Statement, StatementContext};
pub use text::TextReplacement;

use crate::error::Result;
use crate::model::{CodeSnippet, OptionSet};
use std::path::Path;

/// A transformation over the raw text of a file.
pub trait Transform: Send + Sync {
    /// Applies the transformation to the given source code.
    fn apply(&self, source: &str, path: &Path) -> Result<String>;

    /// Returns a description of the transformation.
    fn describe(&self) -> String;
}

/// An ordered chain of text transforms.
#[derive(Default)]
pub struct TransformBuilder {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformBuilder {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the replacements that apply under `options`, in order.
    pub fn replacements(mut self, snippets: &[CodeSnippet], options: &OptionSet) -> Self {
        for snippet in snippets.iter().filter(|s| s.applies(options)) {
            self.transforms
                .push(Box::new(TextReplacement::new(snippet.clone())));
        }
        self
    }

    /// Adds a custom transformation.
    pub fn custom<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Applies all transformations to the source code in order.
    pub fn apply(&self, source: &str, path: &Path) -> Result<String> {
        let mut result = source.to_string();
        for transform in &self.transforms {
            result = transform.apply(&result, path)?;
        }
        Ok(result)
    }

    /// Returns descriptions of all transformations.
    pub fn describe(&self) -> Vec<String> {
        self.transforms.iter().map(|t| t.describe()).collect()
    }

    /// Returns the number of transformations.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns true if there are no transformations.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}
