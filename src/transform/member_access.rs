//! Chaining a member access onto an existing expression.

use super::guard;
use super::insert::StatementScope;
use super::lambda::find_invocation;
use crate::error::Result;
use crate::lang::CSharp;
use crate::matcher::AnchorResolver;
use crate::model::CodeSnippet;
use crate::syntax::{Document, TextEdit, named_children};
use tracing::debug;
use tree_sitter::Node;

/// Applies a member-access snippet: `parent(...)` becomes `parent(...).Block`.
pub fn apply_member_access(
    doc: &Document,
    resolver: &dyn AnchorResolver,
    scope: StatementScope<'_>,
    snippet: &CodeSnippet,
) -> Result<Vec<TextEdit>> {
    let Some(parent) = snippet.parent.as_deref().filter(|p| !p.trim().is_empty()) else {
        debug!(block = %snippet.block, "member access change without a parent anchor");
        return Ok(Vec::new());
    };
    let Some(anchor) = resolver.find(doc, &scope.anchors(), parent) else {
        debug!(parent, "member access parent not found");
        return Ok(Vec::new());
    };

    let member = snippet
        .block
        .trim()
        .trim_start_matches('.')
        .trim_end_matches(';')
        .trim();
    if member.is_empty() {
        return Ok(Vec::new());
    }
    let anchor_text = doc.text(anchor);
    if guard::text_contains(anchor_text, &format!(".{member}"))
        || snippet
            .check_block
            .as_deref()
            .is_some_and(|check| guard::text_contains(anchor_text, check))
    {
        debug!(member, "member access already chained");
        return Ok(Vec::new());
    }

    let Some(target) = chain_target(doc, anchor, parent) else {
        debug!(parent, "no expression to chain onto");
        return Ok(Vec::new());
    };
    CSharp.validate_expression(&format!("__target.{member}"))?;

    let text = if snippet.formatting.newline {
        format!(
            "{}{}{}.{member}",
            doc.newline(),
            doc.indent_of(anchor),
            " ".repeat(snippet.formatting.number_of_spaces)
        )
    } else {
        format!(".{member}")
    };
    Ok(vec![TextEdit::insert(target.end_byte(), text)])
}

/// The expression a new member access is appended to.
fn chain_target<'t>(doc: &Document, anchor: Node<'t>, parent: &str) -> Option<Node<'t>> {
    let statement = if anchor.kind() == "global_statement" {
        named_children(anchor).into_iter().next()?
    } else {
        anchor
    };
    if statement.kind() == "expression_statement" {
        if let Some(expression) = named_children(statement).into_iter().next() {
            return Some(expression);
        }
    }
    find_invocation(doc, statement, parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::TextAnchorResolver;
    use crate::model::{ChangeKind, Formatting};
    use crate::syntax::descendants;

    const STARTUP: &str = "class Startup\n{\n    void ConfigureServices(IServiceCollection services)\n    {\n        services.AddDefaultIdentity<IdentityUser>(o => o.SignIn.RequireConfirmedAccount = true);\n        var x = services.AddAuthentication();\n    }\n}\n";

    fn member(parent: &str, block: &str) -> CodeSnippet {
        CodeSnippet {
            block: block.to_string(),
            parent: Some(parent.to_string()),
            kind: ChangeKind::MemberAccess,
            ..Default::default()
        }
    }

    fn apply(source: &str, snippet: &CodeSnippet) -> String {
        let doc = Document::parse(source).unwrap();
        let block = descendants(doc.root())
            .into_iter()
            .find(|n| n.kind() == "block")
            .unwrap();
        let edits = apply_member_access(
            &doc,
            &TextAnchorResolver,
            StatementScope::block(block),
            snippet,
        )
        .unwrap();
        doc.apply(&edits).unwrap().into_source()
    }

    #[test]
    fn test_chain_onto_expression_statement() {
        let change = member(
            "services.AddDefaultIdentity<IdentityUser>",
            "AddEntityFrameworkStores<AppDbContext>()",
        );
        let result = apply(STARTUP, &change);
        assert!(result.contains(
            "services.AddDefaultIdentity<IdentityUser>(o => o.SignIn.RequireConfirmedAccount = true).AddEntityFrameworkStores<AppDbContext>();"
        ));
        assert_eq!(apply(&result, &change), result);
    }

    #[test]
    fn test_chain_on_new_line() {
        let mut change = member(
            "services.AddDefaultIdentity",
            ".AddEntityFrameworkStores<AppDbContext>();",
        );
        change.formatting = Formatting {
            number_of_spaces: 4,
            newline: true,
            semicolon: false,
        };
        let result = apply(STARTUP, &change);
        assert!(result.contains(
            "RequireConfirmedAccount = true)\n            .AddEntityFrameworkStores<AppDbContext>();"
        ));
    }

    #[test]
    fn test_chain_onto_invocation_in_declaration() {
        let change = member("services.AddAuthentication", "AddCookie()");
        let result = apply(STARTUP, &change);
        assert!(result.contains("var x = services.AddAuthentication().AddCookie();"));
    }

    #[test]
    fn test_missing_parent_is_noop() {
        let change = member("services.AddMissing", "AddCookie()");
        assert_eq!(apply(STARTUP, &change), STARTUP);
    }
}
