//! Mutations over a whole compilation unit, class or method signature.

use super::guard::{self, normalize};
use crate::error::Result;
use crate::lang::CSharp;
use crate::model::AmbientVariable;
use crate::syntax::{Document, TextEdit, children, descendants, named_children};
use regex::{NoExpand, Regex};
use tracing::debug;
use tree_sitter::Node;

/// Using directive names declared directly in the compilation unit.
pub fn declared_usings(doc: &Document) -> Vec<String> {
    using_directives(doc.root())
        .into_iter()
        .map(|u| using_name(doc.text(u)))
        .collect()
}

/// Appends the directives of `incoming` that are not declared yet.
///
/// New names are deduplicated and sorted; existing directives are never
/// reordered or removed.
pub fn merge_usings(doc: &Document, incoming: &[String]) -> Vec<TextEdit> {
    let existing = declared_usings(doc);
    let mut added: Vec<String> = incoming
        .iter()
        .map(|u| using_name(u))
        .filter(|u| !u.is_empty() && !existing.contains(u))
        .collect();
    added.sort();
    added.dedup();
    if added.is_empty() {
        return Vec::new();
    }

    let newline = doc.newline();
    match using_directives(doc.root()).last() {
        Some(last) => {
            let text: String = added
                .iter()
                .map(|name| format!("{newline}using {name};"))
                .collect();
            vec![TextEdit::insert(doc.insertion_point_after(*last), text)]
        }
        None => {
            let mut text: String = added
                .iter()
                .map(|name| format!("using {name};{newline}"))
                .collect();
            text.push_str(newline);
            vec![TextEdit::insert(0, text)]
        }
    }
}

fn using_directives(root: Node<'_>) -> Vec<Node<'_>> {
    named_children(root)
        .into_iter()
        .filter(|n| n.kind() == "using_directive")
        .collect()
}

/// Reduces `global using static X;` (or a bare `X`) to `X`.
fn using_name(text: &str) -> String {
    let mut name = text.trim().trim_end_matches(';').trim();
    for keyword in ["global ", "using ", "static "] {
        if let Some(rest) = name.strip_prefix(keyword) {
            name = rest.trim_start();
        }
    }
    name.to_string()
}

/// Inserts a member declaration at the top of the class body.
pub fn add_property(doc: &Document, class: Node<'_>, property: &str) -> Result<Vec<TextEdit>> {
    let property = property.trim();
    CSharp.validate_member(property)?;
    let Some(body) = class_body(class) else {
        return Ok(Vec::new());
    };
    let members = named_children(body);
    let wanted = normalize(property);
    if members.iter().any(|m| normalize(doc.text(*m)) == wanted) {
        debug!(property, "member already declared");
        return Ok(Vec::new());
    }

    let newline = doc.newline();
    let indent = match members.first() {
        Some(first) => doc.indent_of(*first).to_string(),
        None => format!("{}    ", doc.indent_of(class)),
    };
    let text = format!("{newline}{indent}{}", reindent(property, &indent, newline));
    let tokens = children(body);
    let (Some(open), Some(close)) = (
        tokens.iter().find(|t| t.kind() == "{"),
        tokens.iter().rev().find(|t| t.kind() == "}"),
    ) else {
        return Ok(Vec::new());
    };
    if members.is_empty() && !doc.source()[open.end_byte()..close.start_byte()].contains('\n') {
        return Ok(vec![TextEdit::replace(
            open.end_byte()..close.start_byte(),
            format!("{text}{newline}{}", doc.indent_of(class)),
        )]);
    }
    Ok(vec![TextEdit::insert(doc.insertion_point_after(*open), text)])
}

/// Inserts an attribute list above the class and its existing attributes.
pub fn add_attribute(doc: &Document, class: Node<'_>, attribute: &str) -> Result<Vec<TextEdit>> {
    let attribute = attribute.trim();
    CSharp.validate_attribute(attribute)?;
    let wanted = normalize(attribute);
    let exists = named_children(class)
        .into_iter()
        .filter(|n| n.kind() == "attribute_list")
        .any(|n| normalize(doc.text(n)) == wanted);
    if exists {
        debug!(attribute, "attribute already present");
        return Ok(Vec::new());
    }
    let text = format!("{attribute}{}{}", doc.newline(), doc.indent_of(class));
    Ok(vec![TextEdit::insert(class.start_byte(), text)])
}

/// Rewrites a method's return type when it differs from `requested`.
///
/// `requested` may carry an `async` prefix, which adds (or its absence
/// removes) the method's `async` modifier.
pub fn edit_return_type(
    doc: &Document,
    method: Node<'_>,
    requested: &str,
) -> Result<Vec<TextEdit>> {
    let requested = requested.trim();
    CSharp.validate_type(requested)?;
    let Some(return_type) = return_type_node(method) else {
        return Ok(Vec::new());
    };
    let async_modifier = named_children(method)
        .into_iter()
        .find(|n| n.kind() == "modifier" && doc.text(*n) == "async");

    let current_type = doc.text(return_type).trim();
    let current = match async_modifier {
        Some(_) => format!("async {current_type}"),
        None => current_type.to_string(),
    };
    if normalize(&current) == normalize(requested) {
        return Ok(Vec::new());
    }

    let (wants_async, wanted_type) = match requested.strip_prefix("async") {
        Some(rest) if rest.starts_with(char::is_whitespace) => (true, rest.trim()),
        _ => (false, requested),
    };
    let mut edits = Vec::new();
    match (wants_async, async_modifier) {
        (true, None) => {
            edits.push(TextEdit::replace(
                return_type.byte_range(),
                format!("async {wanted_type}"),
            ));
            return Ok(edits);
        }
        (false, Some(modifier)) => {
            let after = &doc.source()[modifier.end_byte()..];
            let spaces = after.len() - after.trim_start_matches([' ', '\t']).len();
            edits.push(TextEdit::delete(
                modifier.start_byte()..modifier.end_byte() + spaces,
            ));
        }
        _ => {}
    }
    if normalize(current_type) != normalize(wanted_type) {
        edits.push(TextEdit::replace(return_type.byte_range(), wanted_type));
    }
    Ok(edits)
}

/// The declared return type: the last named node before the method name.
fn return_type_node(method: Node<'_>) -> Option<Node<'_>> {
    if let Some(returns) = method.child_by_field_name("returns") {
        return Some(returns);
    }
    let name = method.child_by_field_name("name")?;
    named_children(method)
        .into_iter()
        .take_while(|n| n.id() != name.id())
        .filter(|n| !matches!(n.kind(), "attribute_list" | "modifier"))
        .last()
}

/// Appends `parameter` to the method's parameter list unless already present.
pub fn add_parameter(doc: &Document, method: Node<'_>, parameter: &str) -> Result<Vec<TextEdit>> {
    let parameter = parameter.trim();
    CSharp.validate_parameter(parameter)?;
    let Some(list) = method
        .child_by_field_name("parameters")
        .or_else(|| named_children(method).into_iter().find(|n| n.kind() == "parameter_list"))
    else {
        return Ok(Vec::new());
    };
    if guard::text_contains(doc.text(list), parameter) {
        debug!(parameter, "parameter already declared");
        return Ok(Vec::new());
    }
    let edit = match named_children(list).last() {
        Some(last) => TextEdit::insert(last.end_byte(), format!(", {parameter}")),
        None => match children(list).into_iter().find(|t| t.kind() == "(") {
            Some(open) => TextEdit::insert(open.end_byte(), parameter),
            None => return Ok(Vec::new()),
        },
    };
    Ok(vec![edit])
}

/// Finds the name actually given to an ambient variable in `doc`.
///
/// Looks for a declaration or assignment whose value contains
/// `variable.declared_by` and returns the assigned identifier.
pub fn discover_variable(doc: &Document, variable: &AmbientVariable) -> Option<String> {
    let marker = variable.declared_by.trim();
    if marker.is_empty() {
        return None;
    }
    descendants(doc.root()).into_iter().find_map(|node| {
        let (name, value) = match node.kind() {
            "variable_declarator" => {
                let name = node
                    .child_by_field_name("name")
                    .or_else(|| named_children(node).into_iter().next())?;
                let value = named_children(node).into_iter().nth(1)?;
                (name, value)
            }
            "assignment_expression" => (
                node.child_by_field_name("left")?,
                node.child_by_field_name("right")?,
            ),
            _ => return None,
        };
        (name.kind() == "identifier" && doc.text(value).contains(marker))
            .then(|| doc.text(name).to_string())
    })
}

/// Whole-word replacement of one identifier by another.
#[derive(Debug, Clone)]
pub struct Rename {
    pattern: Regex,
    to: String,
}

impl Rename {
    pub fn new(from: &str, to: &str) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(&format!(r"\b{}\b", regex::escape(from)))?,
            to: to.to_string(),
        })
    }

    /// Returns `text` with every whole-word occurrence replaced.
    pub fn apply(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, NoExpand(&self.to))
            .into_owned()
    }
}

fn class_body(class: Node<'_>) -> Option<Node<'_>> {
    class
        .child_by_field_name("body")
        .or_else(|| named_children(class).into_iter().find(|n| n.kind() == "declaration_list"))
}

fn reindent(text: &str, indent: &str, newline: &str) -> String {
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push_str(newline);
        if !line.trim().is_empty() {
            out.push_str(indent);
        }
        out.push_str(line.trim());
    }
    out
}
