//! Parsed C# documents and helpers for walking their syntax trees.
//!
//! A [`Document`] pairs a source string with its tree-sitter tree. Documents
//! are never edited in place: [`Document::apply`] produces a new document from
//! a batch of [`TextEdit`]s, which is how every mutation in this crate is
//! expressed.

pub mod edit;

pub use edit::{TextEdit, apply_edits};

use crate::error::Result;
use crate::lang::{CSharp, Language};
use tree_sitter::{Node, Tree};

/// A parsed source file.
#[derive(Clone)]
pub struct Document {
    source: String,
    tree: Tree,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.source.len())
            .field("has_errors", &self.has_errors())
            .finish()
    }
}

impl Document {
    /// Parses C# source into a document.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let tree = CSharp.parse(&source)?;
        Ok(Self { source, tree })
    }

    /// Returns the source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Consumes the document, returning its source text.
    pub fn into_source(self) -> String {
        self.source
    }

    /// Returns the root (`compilation_unit`) node.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Returns true if the tree contains error or missing nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Returns the source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Applies a batch of edits and re-parses, returning the new document.
    pub fn apply(&self, edits: &[TextEdit]) -> Result<Document> {
        if edits.is_empty() {
            return Ok(self.clone());
        }
        Document::parse(apply_edits(&self.source, edits)?)
    }

    /// Returns the line terminator used by this document.
    pub fn newline(&self) -> &'static str {
        if self.source.contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Byte offset of the start of the line containing `byte`.
    pub fn line_start(&self, byte: usize) -> usize {
        self.source[..byte.min(self.source.len())]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Byte offset of the line terminator ending the line containing `byte`.
    pub fn line_end(&self, byte: usize) -> usize {
        let byte = byte.min(self.source.len());
        match self.source[byte..].find('\n') {
            Some(i) if i > 0 && self.source.as_bytes()[byte + i - 1] == b'\r' => byte + i - 1,
            Some(i) => byte + i,
            None => self.source.len(),
        }
    }

    /// Leading whitespace of the line containing `byte`.
    pub fn indent_at(&self, byte: usize) -> &str {
        let start = self.line_start(byte);
        let line = &self.source[start..];
        let width = line.len() - line.trim_start_matches([' ', '\t']).len();
        &self.source[start..start + width]
    }

    /// Leading whitespace of the line on which `node` starts.
    pub fn indent_of(&self, node: Node<'_>) -> &str {
        self.indent_at(node.start_byte())
    }

    /// Returns true if only whitespace precedes `node` on its line.
    pub fn starts_line(&self, node: Node<'_>) -> bool {
        let start = self.line_start(node.start_byte());
        self.source[start..node.start_byte()].trim().is_empty()
    }

    /// Offset right after `node` at which a following line may be inserted.
    ///
    /// This is the end of the node's last line when the rest of that line is
    /// blank or a line comment, otherwise the node's end byte.
    pub fn insertion_point_after(&self, node: Node<'_>) -> usize {
        let end = node.end_byte();
        let line_end = self.line_end(end);
        let rest = self.source[end..line_end].trim();
        if rest.is_empty() || rest.starts_with("//") {
            line_end
        } else {
            end
        }
    }
}

/// Returns all children of `node`, including anonymous tokens.
pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::with_capacity(node.child_count());
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i as u32) {
            out.push(child);
        }
    }
    out
}

/// Returns the named children of `node`.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    children(node).into_iter().filter(|c| c.is_named()).collect()
}

/// Returns the named descendants of `node` in document (pre-)order.
pub fn descendants<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack: Vec<Node<'t>> = named_children(node).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        out.push(current);
        stack.extend(named_children(current).into_iter().rev());
    }
    out
}

/// Returns the first named child of the given kind.
pub fn find_child<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|c| c.kind() == kind)
}

/// Returns true for statement nodes, including top-level `global_statement`s.
pub fn is_statement(node: Node<'_>) -> bool {
    node.kind().ends_with("_statement")
}

/// Statement descendants of `scope`, in document order.
pub fn statement_descendants<'t>(scope: Node<'t>) -> Vec<Node<'t>> {
    descendants(scope).into_iter().filter(|n| is_statement(*n)).collect()
}

/// Direct statement children of `scope`.
pub fn statement_children<'t>(scope: Node<'t>) -> Vec<Node<'t>> {
    named_children(scope)
        .into_iter()
        .filter(|n| is_statement(*n))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "class A\n{\n    void M()\n    {\n        Foo(); // trailing\n        Bar();\n    }\n}\n";

    #[test]
    fn test_statement_walk() {
        let doc = Document::parse(SOURCE).unwrap();
        let statements = statement_descendants(doc.root());
        let texts: Vec<&str> = statements.iter().map(|n| doc.text(*n)).collect();
        assert_eq!(texts, vec!["Foo();", "Bar();"]);
    }

    #[test]
    fn test_indent_and_lines() {
        let doc = Document::parse(SOURCE).unwrap();
        let first = statement_descendants(doc.root())[0];
        assert_eq!(doc.indent_of(first), "        ");
        assert!(doc.starts_line(first));
        let point = doc.insertion_point_after(first);
        assert_eq!(&doc.source()[point..point + 1], "\n");
        assert!(doc.source()[..point].ends_with("// trailing"));
    }

    #[test]
    fn test_apply_reparses() {
        let doc = Document::parse(SOURCE).unwrap();
        let first = statement_descendants(doc.root())[0];
        let edited = doc
            .apply(&[TextEdit::replace(first.byte_range(), "Baz();")])
            .unwrap();
        assert!(edited.source().contains("Baz(); // trailing"));
        assert_eq!(statement_descendants(edited.root()).len(), 2);
        assert_eq!(doc.source(), SOURCE);
    }

    #[test]
    fn test_crlf_newline() {
        let doc = Document::parse("class A {\r\n}\r\n").unwrap();
        assert_eq!(doc.newline(), "\r\n");
        assert_eq!(doc.line_end(0), 9);
    }
}
