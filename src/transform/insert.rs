//! Plain statement insertion: before/after an anchor, or at either end of a scope.

use super::guard;
use super::statement::{Statement, StatementContext};
use crate::error::Result;
use crate::matcher::AnchorResolver;
use crate::model::CodeSnippet;
use crate::syntax::{
    Document, TextEdit, children, named_children, statement_children, statement_descendants,
};
use tracing::debug;
use tree_sitter::Node;

/// A statement list being mutated: a `block` or the compilation unit.
#[derive(Debug, Clone, Copy)]
pub struct StatementScope<'t> {
    pub node: Node<'t>,
    pub context: StatementContext,
}

impl<'t> StatementScope<'t> {
    /// Scope over a method or lambda `block`.
    pub fn block(node: Node<'t>) -> Self {
        Self {
            node,
            context: StatementContext::Block,
        }
    }

    /// Scope over the top-level statements of a compilation unit.
    pub fn global(node: Node<'t>) -> Self {
        Self {
            node,
            context: StatementContext::Global,
        }
    }

    /// Direct statements of the scope.
    pub fn statements(&self) -> Vec<Node<'t>> {
        statement_children(self.node)
    }

    /// All statements under the scope, usable as anchors.
    pub fn anchors(&self) -> Vec<Node<'t>> {
        statement_descendants(self.node)
    }
}

/// Where a statement goes relative to existing code.
#[derive(Debug, Clone, Copy)]
pub enum Placement<'t> {
    After(Node<'t>),
    Before(Node<'t>),
    /// Into a scope that has no statements yet.
    Empty,
}

/// Applies a default-kind snippet to `scope`.
///
/// Returns no edits when the change already exists or its anchor cannot be
/// resolved.
pub fn insert_snippet(
    doc: &Document,
    resolver: &dyn AnchorResolver,
    scope: StatementScope<'_>,
    snippet: &CodeSnippet,
) -> Result<Vec<TextEdit>> {
    let statements = scope.statements();
    if guard::snippet_exists(doc, &statements, snippet) {
        debug!(block = %snippet.block, "statement already present");
        return Ok(Vec::new());
    }

    let placement = if !snippet.insert_before.is_empty() {
        match resolver.find_first(doc, &scope.anchors(), &snippet.insert_before) {
            Some(anchor) => Placement::Before(anchor),
            None => {
                debug!(anchors = ?snippet.insert_before, "no insert-before anchor resolved");
                return Ok(Vec::new());
            }
        }
    } else if let Some(after) = snippet.insert_after.as_deref().filter(|a| !a.trim().is_empty()) {
        match resolver.find(doc, &scope.anchors(), after) {
            Some(anchor) => Placement::After(anchor),
            None => {
                debug!(anchor = after, "insert-after anchor not found");
                return Ok(Vec::new());
            }
        }
    } else if snippet.prepend {
        statements
            .first()
            .map(|first| Placement::Before(*first))
            .unwrap_or(Placement::Empty)
    } else {
        statements
            .last()
            .map(|last| Placement::After(*last))
            .unwrap_or(Placement::Empty)
    };

    place_statement(doc, scope, snippet, placement)
}

/// Synthesizes `snippet` and renders it at `placement` within `scope`.
pub fn place_statement(
    doc: &Document,
    scope: StatementScope<'_>,
    snippet: &CodeSnippet,
    placement: Placement<'_>,
) -> Result<Vec<TextEdit>> {
    let newline = doc.newline();
    let edit = match placement {
        Placement::After(anchor) => {
            let statement = Statement::synthesize(snippet, scope.context, doc.indent_of(anchor))?;
            TextEdit::insert(doc.insertion_point_after(anchor), statement.render_after(newline))
        }
        Placement::Before(anchor) => {
            let statement = Statement::synthesize(snippet, scope.context, doc.indent_of(anchor))?;
            if statement.formatting().newline && doc.starts_line(anchor) {
                TextEdit::insert(
                    doc.line_start(anchor.start_byte()),
                    statement.render_before(newline),
                )
            } else {
                TextEdit::insert(anchor.start_byte(), format!("{} ", statement.text()))
            }
        }
        Placement::Empty => return place_in_empty(doc, scope, snippet),
    };
    Ok(vec![edit])
}

fn place_in_empty(
    doc: &Document,
    scope: StatementScope<'_>,
    snippet: &CodeSnippet,
) -> Result<Vec<TextEdit>> {
    let newline = doc.newline();
    match scope.context {
        StatementContext::Block => {
            let tokens = children(scope.node);
            let (Some(open), Some(close)) = (
                tokens.iter().find(|t| t.kind() == "{"),
                tokens.iter().rev().find(|t| t.kind() == "}"),
            ) else {
                return Ok(Vec::new());
            };
            let base = doc.indent_at(open.start_byte()).to_string();
            let statement =
                Statement::synthesize(snippet, scope.context, &format!("{base}    "))?;
            let inner = &doc.source()[open.end_byte()..close.start_byte()];
            if !statement.formatting().newline {
                return Ok(vec![TextEdit::insert(
                    open.end_byte(),
                    statement.render_after(newline),
                )]);
            }
            if inner.contains('\n') {
                Ok(vec![TextEdit::insert(
                    open.end_byte(),
                    statement.render_after(newline),
                )])
            } else {
                Ok(vec![TextEdit::replace(
                    open.end_byte()..close.start_byte(),
                    format!("{}{newline}{base}", statement.render_after(newline)),
                )])
            }
        }
        StatementContext::Global => {
            let statement = Statement::synthesize(snippet, scope.context, "")?;
            let last_using = named_children(scope.node)
                .into_iter()
                .filter(|n| n.kind() == "using_directive")
                .last();
            let edit = match last_using {
                Some(using) => TextEdit::insert(
                    doc.insertion_point_after(using),
                    format!("{newline}{}", statement.render_after(newline)),
                ),
                None => TextEdit::insert(0, statement.render_before(newline)),
            };
            Ok(vec![edit])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::TextAnchorResolver;
    use crate::model::Formatting;
    use crate::syntax::descendants;

    const STARTUP: &str = "public class Startup\n{\n    public void ConfigureServices(IServiceCollection services)\n    {\n        services.AddControllers();\n        services.AddRouting();\n    }\n\n    public void Configure(IApplicationBuilder app)\n    {\n    }\n}\n";

    fn snippet(block: &str) -> CodeSnippet {
        let mut snippet = CodeSnippet::new(block);
        snippet.formatting = Formatting::statement();
        snippet
    }

    fn apply(source: &str, body_index: usize, snippet: &CodeSnippet) -> String {
        let doc = Document::parse(source).unwrap();
        let block = descendants(doc.root())
            .into_iter()
            .filter(|n| n.kind() == "block")
            .nth(body_index)
            .unwrap();
        let edits =
            insert_snippet(&doc, &TextAnchorResolver, StatementScope::block(block), snippet)
                .unwrap();
        doc.apply(&edits).unwrap().into_source()
    }

    #[test]
    fn test_insert_after_inherits_indent() {
        let mut change = snippet("services.AddDbContext<AppDbContext>()");
        change.insert_after = Some("services.AddControllers();".to_string());
        let result = apply(STARTUP, 0, &change);
        assert!(result.contains(
            "        services.AddControllers();\n        services.AddDbContext<AppDbContext>();\n        services.AddRouting();"
        ));
        assert_eq!(apply(&result, 0, &change), result);
    }

    #[test]
    fn test_insert_before_first_resolved() {
        let mut change = snippet("services.AddCors()");
        change.insert_before = vec![
            "services.AddMissing()".to_string(),
            "services.AddRouting()".to_string(),
            "services.AddControllers()".to_string(),
        ];
        let result = apply(STARTUP, 0, &change);
        assert!(result.contains(
            "services.AddControllers();\n        services.AddCors();\n        services.AddRouting();"
        ));
    }

    #[test]
    fn test_unresolved_anchor_is_noop() {
        let mut change = snippet("services.AddCors()");
        change.insert_after = Some("services.AddMissing()".to_string());
        assert_eq!(apply(STARTUP, 0, &change), STARTUP);
        change.insert_after = None;
        change.insert_before = vec!["services.AddMissing()".to_string()];
        assert_eq!(apply(STARTUP, 0, &change), STARTUP);
    }

    #[test]
    fn test_append_and_prepend() {
        let appended = apply(STARTUP, 0, &snippet("services.AddCors()"));
        assert!(appended.contains("services.AddRouting();\n        services.AddCors();\n    }"));

        let mut first = snippet("services.AddCors()");
        first.prepend = true;
        let prepended = apply(STARTUP, 0, &first);
        assert!(prepended.contains("    {\n        services.AddCors();\n        services.AddControllers();"));
    }

    #[test]
    fn test_insert_into_empty_block() {
        let result = apply(STARTUP, 1, &snippet("app.UseRouting()"));
        assert!(result.contains(
            "public void Configure(IApplicationBuilder app)\n    {\n        app.UseRouting();\n    }"
        ));
    }

    #[test]
    fn test_insert_into_inline_empty_block() {
        let source = "class A\n{\n    void M() { }\n}\n";
        let result = apply(source, 0, &snippet("Run()"));
        assert_eq!(result, "class A\n{\n    void M() {\n        Run();\n    }\n}\n");
    }

    #[test]
    fn test_existing_statement_skipped() {
        let result = apply(STARTUP, 0, &snippet("services.AddRouting()"));
        assert_eq!(result, STARTUP);
    }

    #[test]
    fn test_global_scope_append() {
        let source = "var builder = WebApplication.CreateBuilder(args);\nvar app = builder.Build();\napp.Run();\n";
        let doc = Document::parse(source).unwrap();
        let mut change = snippet("builder.Services.AddRazorPages()");
        change.insert_after = Some("var builder = WebApplication.CreateBuilder(args);".to_string());
        let edits =
            insert_snippet(&doc, &TextAnchorResolver, StatementScope::global(doc.root()), &change)
                .unwrap();
        let result = doc.apply(&edits).unwrap().into_source();
        assert_eq!(
            result,
            "var builder = WebApplication.CreateBuilder(args);\nbuilder.Services.AddRazorPages();\nvar app = builder.Build();\napp.Run();\n"
        );
    }
}
