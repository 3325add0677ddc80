//! Lambda-aware insert-or-update under an invocation anchor.
//!
//! Given `services.AddDbContext<Ctx>(options => options.UseSqlite(cs));` and a
//! snippet anchored on `services.AddDbContext`, the existing lambda gains the
//! snippet's parameter (if missing) and the snippet's block is appended to, or
//! replaces, its body. When the invocation has no lambda argument yet, a new
//! `param => block` argument is added.

use super::guard;
use super::insert::{Placement, StatementScope, place_statement};
use crate::error::{ModifierError, Result, SnippetKind};
use crate::lang::CSharp;
use crate::matcher::{AnchorResolver, trim_boundary};
use crate::model::CodeSnippet;
use crate::syntax::{Document, TextEdit, children, descendants, find_child, named_children};
use tracing::debug;
use tree_sitter::Node;

/// The parts of a lambda expression.
#[derive(Debug, Clone, Copy)]
pub struct LambdaParts<'t> {
    pub node: Node<'t>,
    pub parameters: Node<'t>,
    pub body: Node<'t>,
}

impl<'t> LambdaParts<'t> {
    /// Splits a `lambda_expression` around its `=>` token.
    pub fn of(node: Node<'t>) -> Option<Self> {
        let all = children(node);
        let arrow = all.iter().position(|c| c.kind() == "=>")?;
        let parameters = all[..arrow]
            .iter()
            .rev()
            .find(|c| c.is_named() && !matches!(c.kind(), "attribute_list" | "modifier"))
            .copied()?;
        let body = all[arrow + 1..].iter().find(|c| c.is_named()).copied()?;
        Some(Self {
            node,
            parameters,
            body,
        })
    }

    /// Parameter names, in declaration order.
    pub fn parameter_names(&self, doc: &Document) -> Vec<String> {
        parameter_list_entries(doc.text(self.parameters))
            .iter()
            .filter_map(|entry| parameter_name(entry))
            .map(str::to_string)
            .collect()
    }
}

/// Name of a lambda parameter entry such as `x` or `IServiceProvider sp`.
fn parameter_name(entry: &str) -> Option<&str> {
    entry.split_whitespace().last()
}

/// Returns true if the entry declares its type, e.g. `DbContextOptionsBuilder options`.
fn is_typed(entry: &str) -> bool {
    entry.split_whitespace().count() > 1
}

/// Callee text without trailing type arguments: `a.Add<T>` becomes `a.Add`.
fn strip_type_arguments(callee: &str) -> &str {
    let Some(head) = callee.strip_suffix('>') else {
        return callee;
    };
    let mut depth = 1usize;
    for (i, c) in head.char_indices().rev() {
        match c {
            '>' => depth += 1,
            '<' => {
                depth -= 1;
                if depth == 0 {
                    return head[..i].trim_end();
                }
            }
            _ => {}
        }
    }
    callee
}

/// Splits a lambda parameter list (`x` or `(a, b)`) into entries.
fn parameter_list_entries(text: &str) -> Vec<String> {
    let text = text.trim();
    let inner = match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => inner,
        None => return vec![text.to_string()],
    };
    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        entries.push(current.trim().to_string());
    }
    entries
}

/// Finds the invocation under `anchor` that `parent` refers to.
///
/// Prefers an invocation whose callee ends with the parent text, with or
/// without its type arguments, then one whose callee contains it, then any
/// invocation containing it.
pub fn find_invocation<'t>(doc: &Document, anchor: Node<'t>, parent: &str) -> Option<Node<'t>> {
    let target = trim_boundary(parent);
    let target = target.strip_suffix("()").unwrap_or(target);
    let invocations: Vec<Node<'t>> = std::iter::once(anchor)
        .chain(descendants(anchor))
        .filter(|n| n.kind() == "invocation_expression")
        .collect();
    let callee = |inv: Node<'t>| {
        inv.child_by_field_name("function")
            .or_else(|| named_children(inv).first().copied())
            .map(|f| doc.text(f).trim().to_string())
            .unwrap_or_default()
    };
    invocations
        .iter()
        .find(|inv| {
            let name = callee(**inv);
            name.ends_with(target) || strip_type_arguments(&name).ends_with(target)
        })
        .or_else(|| invocations.iter().find(|inv| callee(**inv).contains(target)))
        .or_else(|| invocations.iter().find(|inv| doc.text(**inv).contains(target)))
        .copied()
}

/// Applies a lambda-kind snippet within `scope`.
pub fn apply_lambda(
    doc: &Document,
    resolver: &dyn AnchorResolver,
    scope: StatementScope<'_>,
    snippet: &CodeSnippet,
) -> Result<Vec<TextEdit>> {
    let Some(parent) = snippet.parent.as_deref().filter(|p| !p.trim().is_empty()) else {
        debug!(block = %snippet.block, "lambda change without a parent anchor");
        return Ok(Vec::new());
    };
    let Some(anchor) = resolver.find(doc, &scope.anchors(), parent) else {
        debug!(parent, "lambda parent not found");
        return Ok(Vec::new());
    };
    if let Some(check) = snippet.check_block.as_deref() {
        if guard::text_contains(doc.text(anchor), check) {
            return Ok(Vec::new());
        }
    }

    let invocation = find_invocation(doc, anchor, parent);
    let search_root = invocation
        .and_then(|inv| find_child(inv, "argument_list"))
        .unwrap_or(anchor);
    let lambda = descendants(search_root)
        .into_iter()
        .find(|n| n.kind() == "lambda_expression")
        .and_then(LambdaParts::of);

    match lambda {
        Some(lambda) => update_lambda(doc, anchor, lambda, snippet),
        None => match invocation.and_then(|inv| find_child(inv, "argument_list")) {
            Some(arguments) => add_lambda_argument(doc, anchor, arguments, snippet),
            None => {
                debug!(parent, "no argument list to attach a lambda to");
                Ok(Vec::new())
            }
        },
    }
}

fn update_lambda(
    doc: &Document,
    anchor: Node<'_>,
    lambda: LambdaParts<'_>,
    snippet: &CodeSnippet,
) -> Result<Vec<TextEdit>> {
    let mut edits = Vec::new();

    if let Some(parameter) = snippet.parameter.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        let names = lambda.parameter_names(doc);
        if !names.iter().any(|n| Some(n.as_str()) == parameter_name(parameter)) {
            let mut entries = parameter_list_entries(doc.text(lambda.parameters));
            entries.retain(|e| !e.is_empty());
            // C# lambdas declare either every parameter type or none.
            if entries.iter().any(|e| is_typed(e) != is_typed(parameter)) {
                return Err(ModifierError::malformed(SnippetKind::Parameter, parameter));
            }
            entries.push(parameter.to_string());
            edits.push(TextEdit::replace(
                lambda.parameters.byte_range(),
                format!("({})", entries.join(", ")),
            ));
        }
    }

    let body_text = doc.text(lambda.body);
    let block = snippet.block.trim();
    if block.is_empty() {
        return Ok(edits);
    }

    if snippet.replace {
        if guard::normalize(body_text) != guard::normalize(&lambda_body(block)) {
            let body = lambda_body(block);
            CSharp.validate_expression(&format!("x => {body}"))?;
            edits.push(TextEdit::replace(lambda.body.byte_range(), body));
        }
    } else if !guard::text_contains(body_text, block) {
        edits.extend(append_to_body(doc, anchor, lambda, snippet)?);
    }
    Ok(edits)
}

fn append_to_body(
    doc: &Document,
    anchor: Node<'_>,
    lambda: LambdaParts<'_>,
    snippet: &CodeSnippet,
) -> Result<Vec<TextEdit>> {
    let mut statement = snippet.clone();
    statement.formatting.semicolon = true;

    if lambda.body.kind() == "block" {
        let scope = StatementScope::block(lambda.body);
        let placement = scope
            .statements()
            .last()
            .map(|last| Placement::After(*last))
            .unwrap_or(Placement::Empty);
        return place_statement(doc, scope, &statement, placement);
    }

    // Expression body: `x => expr` becomes `x => { expr; block; }`.
    let expression = doc.text(lambda.body).trim();
    let block = statement.block.trim().trim_end_matches(';').trim_end();
    CSharp.validate_statement(&format!("{block};"))?;
    let body = if snippet.formatting.newline {
        let newline = doc.newline();
        let outer = format!(
            "{}{}",
            doc.indent_of(anchor),
            " ".repeat(snippet.formatting.number_of_spaces)
        );
        let inner = format!("{outer}    ");
        format!("{{{newline}{inner}{expression};{newline}{inner}{block};{newline}{outer}}}")
    } else {
        format!("{{ {expression}; {block}; }}")
    };
    Ok(vec![TextEdit::replace(lambda.body.byte_range(), body)])
}

fn add_lambda_argument(
    doc: &Document,
    anchor: Node<'_>,
    arguments: Node<'_>,
    snippet: &CodeSnippet,
) -> Result<Vec<TextEdit>> {
    if guard::snippet_in_text(doc.text(anchor), snippet) {
        return Ok(Vec::new());
    }
    let Some(parameter) = snippet.parameter.as_deref().map(str::trim).filter(|p| !p.is_empty())
    else {
        debug!(block = %snippet.block, "cannot synthesize a lambda without a parameter name");
        return Ok(Vec::new());
    };
    let parameters = if is_typed(parameter) {
        format!("({parameter})")
    } else {
        parameter.to_string()
    };
    let lambda = format!("{parameters} => {}", lambda_body(snippet.block.trim()));
    CSharp.validate_expression(&lambda)?;

    let edit = match named_children(arguments).last() {
        Some(last) => TextEdit::insert(last.end_byte(), format!(", {lambda}")),
        None => {
            let open = children(arguments)
                .into_iter()
                .find(|t| t.kind() == "(")
                .map(|t| t.end_byte())
                .unwrap_or(arguments.start_byte() + 1);
            TextEdit::insert(open, lambda)
        }
    };
    Ok(vec![edit])
}

/// Lambda body text for a block: bare expression or `{ ...; }`.
fn lambda_body(block: &str) -> String {
    let block = block.trim();
    if block.starts_with('{') {
        return block.to_string();
    }
    let expression = block.trim_end_matches(';').trim_end();
    if expression.contains(';') {
        format!("{{ {expression}; }}")
    } else {
        expression.to_string()
    }
}
