//! Declaration matching using tree-sitter queries.

use crate::error::Result;
use crate::lang::{CSharp, Language};
use crate::syntax::Document;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor};

/// Query-based matcher over a parsed C# document.
#[derive(Default, Clone)]
pub struct AstMatcher {
    queries: Vec<String>,
    capture_names: Vec<String>,
}

impl AstMatcher {
    /// Creates a new AST matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matcher for every class declaration.
    pub fn classes() -> Self {
        Self::new().query("(class_declaration) @class")
    }

    /// Matcher for every method declaration.
    pub fn methods() -> Self {
        Self::new().query("(method_declaration) @method")
    }

    /// Adds a tree-sitter query pattern.
    ///
    /// Query syntax follows tree-sitter's S-expression format, e.g.
    /// `(class_declaration name: (identifier) @name)`.
    pub fn query(mut self, pattern: impl Into<String>) -> Self {
        self.queries.push(pattern.into());
        self
    }

    /// Filters matches to only those with the specified capture name.
    pub fn capture(mut self, name: impl Into<String>) -> Self {
        self.capture_names.push(name.into());
        self
    }

    /// Finds captured nodes under `scope`, in document order.
    pub fn find_nodes<'t>(&self, doc: &'t Document, scope: Node<'t>) -> Result<Vec<Node<'t>>> {
        let source_bytes = doc.source().as_bytes();
        let mut nodes: Vec<Node<'t>> = Vec::new();

        for query_str in &self.queries {
            let query = CSharp.query(query_str)?;
            let mut cursor = QueryCursor::new();
            let mut query_matches = cursor.matches(&query, scope, source_bytes);
            while let Some(query_match) = query_matches.next() {
                for capture in query_match.captures {
                    let capture_name = query.capture_names()[capture.index as usize];
                    if !self.capture_names.is_empty()
                        && !self.capture_names.iter().any(|c| c == capture_name)
                    {
                        continue;
                    }
                    if !nodes.iter().any(|n| n.id() == capture.node.id()) {
                        nodes.push(capture.node);
                    }
                }
            }
        }

        nodes.sort_by_key(|n| n.start_byte());
        Ok(nodes)
    }

    /// Returns true if the document contains any matches under `scope`.
    pub fn has_matches<'t>(&self, doc: &'t Document, scope: Node<'t>) -> Result<bool> {
        Ok(!self.find_nodes(doc, scope)?.is_empty())
    }

    /// Returns the query strings.
    pub fn queries(&self) -> &[String] {
        &self.queries
    }
}

/// Returns the text of the declaration's `name` field.
pub fn declaration_name<'a>(doc: &'a Document, node: Node<'_>) -> Option<&'a str> {
    node.child_by_field_name("name").map(|n| doc.text(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
namespace App
{
    public class Startup
    {
        public void ConfigureServices(IServiceCollection services) { }
        public void Configure(IApplicationBuilder app) { }
    }

    internal class Helper { }
}
"#;

    #[test]
    fn test_find_classes() {
        let doc = Document::parse(SOURCE).unwrap();
        let classes = AstMatcher::classes().find_nodes(&doc, doc.root()).unwrap();
        let names: Vec<&str> = classes
            .iter()
            .filter_map(|c| declaration_name(&doc, *c))
            .collect();
        assert_eq!(names, vec!["Startup", "Helper"]);
    }

    #[test]
    fn test_find_methods_in_scope() {
        let doc = Document::parse(SOURCE).unwrap();
        let classes = AstMatcher::classes().find_nodes(&doc, doc.root()).unwrap();
        let methods = AstMatcher::methods().find_nodes(&doc, classes[0]).unwrap();
        let names: Vec<&str> = methods
            .iter()
            .filter_map(|m| declaration_name(&doc, *m))
            .collect();
        assert_eq!(names, vec!["ConfigureServices", "Configure"]);
        assert!(!AstMatcher::methods().has_matches(&doc, classes[1]).unwrap());
    }

    #[test]
    fn test_capture_filtering() {
        let doc = Document::parse(SOURCE).unwrap();
        let matcher = AstMatcher::new()
            .query("(class_declaration name: (identifier) @name) @class")
            .capture("name");
        let nodes = matcher.find_nodes(&doc, doc.root()).unwrap();
        let texts: Vec<&str> = nodes.iter().map(|n| doc.text(*n)).collect();
        assert_eq!(texts, vec!["Startup", "Helper"]);
        assert_eq!(matcher.queries().len(), 1);
    }
}
