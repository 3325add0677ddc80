//! Idempotency checks: has a change already been applied?
//!
//! Comparisons are loose: both sides are lower-cased and
//! stripped of all whitespace, and the candidate additionally loses its
//! boundary characters, so `services.AddRazorPages()` is found inside
//! `services .AddRazorPages ();`. Unrelated code that happens to contain the
//! candidate also counts as a match.

use crate::matcher::trim_boundary;
use crate::model::CodeSnippet;
use crate::syntax::Document;
use tree_sitter::Node;

/// Lower-cases `text` and removes all whitespace.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Returns true if `haystack` contains `candidate` under normalization.
pub fn text_contains(haystack: &str, candidate: &str) -> bool {
    let needle = normalize(trim_boundary(candidate));
    !needle.is_empty() && normalize(haystack).contains(&needle)
}

/// Returns true if any node's text contains `candidate`.
pub fn exists(doc: &Document, children: &[Node<'_>], candidate: &str) -> bool {
    let needle = normalize(trim_boundary(candidate));
    if needle.is_empty() {
        return false;
    }
    children
        .iter()
        .any(|child| normalize(doc.text(*child)).contains(&needle))
}

/// Returns true if the snippet's `Block` or `CheckBlock` already exists.
pub fn snippet_exists(doc: &Document, children: &[Node<'_>], snippet: &CodeSnippet) -> bool {
    snippet
        .existence_markers()
        .any(|marker| exists(doc, children, marker))
}

/// Returns true if the snippet's `Block` or `CheckBlock` occurs in `text`.
pub fn snippet_in_text(text: &str, snippet: &CodeSnippet) -> bool {
    snippet
        .existence_markers()
        .any(|marker| text_contains(text, marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::statement_children;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(" App.UseRouting ( );\n"), "app.userouting();");
    }

    #[test]
    fn test_text_contains_ignores_case_and_spacing() {
        assert!(text_contains(
            "services.AddRazorPages ();",
            "SERVICES.AddRazorPages();"
        ));
        assert!(!text_contains("services.AddControllers();", "services.AddRazorPages()"));
        assert!(!text_contains("anything", " ;\n"));
    }

    #[test]
    fn test_exists_in_block() {
        let doc = Document::parse(
            "class A { void M() { services.AddControllers(); if (x) { app.UseAuth(); } } }",
        )
        .unwrap();
        let method = crate::syntax::descendants(doc.root())
            .into_iter()
            .find(|n| n.kind() == "block")
            .unwrap();
        let children = statement_children(method);
        assert!(exists(&doc, &children, "services.AddControllers()"));
        assert!(exists(&doc, &children, "app.useauth();"));
        assert!(!exists(&doc, &children, "app.UseRouting()"));
    }

    #[test]
    fn test_check_block_suppresses() {
        let mut snippet = CodeSnippet::new("builder.Services.AddDbContext<Ctx>(o => o.UseSqlite(cs))");
        assert!(!snippet_in_text("builder.Services.AddDbContext<Ctx>();", &snippet));
        snippet.check_block = Some("AddDbContext<Ctx>".to_string());
        assert!(snippet_in_text("builder.Services.AddDbContext<Ctx>();", &snippet));
    }
}
