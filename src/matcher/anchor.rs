//! Textual anchor resolution.

use crate::syntax::Document;
use tree_sitter::Node;

/// Characters ignored around a specifier on the second resolution attempt.
pub const BOUNDARY_CHARS: &[char] = &[' ', '\r', '\n', ';'];

/// Trims [`BOUNDARY_CHARS`] from both ends of `text`.
pub fn trim_boundary(text: &str) -> &str {
    text.trim_matches(BOUNDARY_CHARS)
}

/// Locates the existing node a change is attached to.
pub trait AnchorResolver: Send + Sync {
    /// Returns the best match for `specifier` among `candidates`.
    fn find<'t>(&self, doc: &Document, candidates: &[Node<'t>], specifier: &str)
    -> Option<Node<'t>>;

    /// Tries `specifiers` in order and returns the first that resolves.
    fn find_first<'t>(
        &self,
        doc: &Document,
        candidates: &[Node<'t>],
        specifiers: &[String],
    ) -> Option<Node<'t>> {
        specifiers
            .iter()
            .find_map(|specifier| self.find(doc, candidates, specifier))
    }
}

/// First-match-in-document-order substring resolver.
///
/// A candidate matches when its source text contains the specifier
/// verbatim. If nothing matches, the specifier is retried with
/// [`BOUNDARY_CHARS`] trimmed from both ends. Multiple matches are not
/// disambiguated.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextAnchorResolver;

impl AnchorResolver for TextAnchorResolver {
    fn find<'t>(
        &self,
        doc: &Document,
        candidates: &[Node<'t>],
        specifier: &str,
    ) -> Option<Node<'t>> {
        if specifier.is_empty() {
            return None;
        }
        let verbatim = candidates
            .iter()
            .find(|node| doc.text(**node).contains(specifier));
        if verbatim.is_some() {
            return verbatim.copied();
        }

        let trimmed = trim_boundary(specifier);
        if trimmed.is_empty() || trimmed == specifier {
            return None;
        }
        candidates
            .iter()
            .find(|node| doc.text(**node).contains(trimmed))
            .copied()
    }
}
