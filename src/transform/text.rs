//! Line-oriented replacements for markup files that are not parsed.

use super::Transform;
use super::guard;
use crate::error::Result;
use crate::matcher::trim_boundary;
use crate::model::CodeSnippet;
use std::path::Path;

/// A plain-text edit described by a [`CodeSnippet`].
#[derive(Debug, Clone)]
pub struct TextReplacement {
    snippet: CodeSnippet,
    kind: TextReplacementKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TextReplacementKind {
    ReplaceSnippet { needle: String },
    InsertBefore { anchors: Vec<String> },
    InsertAfter { anchor: String },
    Prepend,
    Append,
}

impl TextReplacement {
    /// Interprets `snippet` as a text edit.
    ///
    /// `ReplaceSnippet` takes precedence, then `InsertBefore`, `InsertAfter`
    /// and `Prepend`; anything else appends to the end of the file.
    pub fn new(snippet: CodeSnippet) -> Self {
        let non_empty = |text: &Option<String>| text.clone().filter(|t| !t.is_empty());
        let kind = if let Some(needle) = non_empty(&snippet.replace_snippet) {
            TextReplacementKind::ReplaceSnippet { needle }
        } else if !snippet.insert_before.is_empty() {
            TextReplacementKind::InsertBefore {
                anchors: snippet.insert_before.clone(),
            }
        } else if let Some(anchor) = non_empty(&snippet.insert_after) {
            TextReplacementKind::InsertAfter { anchor }
        } else if snippet.prepend {
            TextReplacementKind::Prepend
        } else {
            TextReplacementKind::Append
        };
        Self { snippet, kind }
    }

    /// Renders the block for a line indented by `indent`.
    fn render(&self, indent: &str, newline: &str) -> String {
        let indent = format!(
            "{indent}{}",
            " ".repeat(self.snippet.formatting.number_of_spaces)
        );
        self.snippet
            .block
            .trim_end()
            .lines()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    format!("{indent}{line}")
                }
            })
            .collect::<Vec<_>>()
            .join(newline)
    }
}

impl Transform for TextReplacement {
    fn apply(&self, source: &str, _path: &Path) -> Result<String> {
        if guard::snippet_in_text(source, &self.snippet) {
            return Ok(source.to_string());
        }
        let newline = if source.contains("\r\n") { "\r\n" } else { "\n" };
        let block = self.snippet.block.as_str();

        let result = match &self.kind {
            TextReplacementKind::ReplaceSnippet { needle } => source.replacen(needle, block, 1),
            TextReplacementKind::InsertBefore { anchors } => {
                let Some(line) = anchors.iter().find_map(|a| find_line(source, a)) else {
                    return Ok(source.to_string());
                };
                let text = format!("{}{newline}", self.render(line.indent(source), newline));
                splice(source, line.start, &text)
            }
            TextReplacementKind::InsertAfter { anchor } => {
                let Some(line) = find_line(source, anchor) else {
                    return Ok(source.to_string());
                };
                let text = format!("{newline}{}", self.render(line.indent(source), newline));
                splice(source, line.end, &text)
            }
            TextReplacementKind::Prepend => {
                format!("{}{newline}{source}", self.render("", newline))
            }
            TextReplacementKind::Append => {
                let mut out = source.to_string();
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push_str(newline);
                }
                out.push_str(&self.render("", newline));
                out.push_str(newline);
                out
            }
        };
        Ok(result)
    }

    fn describe(&self) -> String {
        match &self.kind {
            TextReplacementKind::ReplaceSnippet { needle } => format!("Replace '{needle}'"),
            TextReplacementKind::InsertBefore { anchors } => {
                format!("Insert before one of {anchors:?}")
            }
            TextReplacementKind::InsertAfter { anchor } => format!("Insert after '{anchor}'"),
            TextReplacementKind::Prepend => "Prepend to file".to_string(),
            TextReplacementKind::Append => "Append to file".to_string(),
        }
    }
}

/// Byte span of one line, excluding its terminator.
#[derive(Debug, Clone, Copy)]
struct Line {
    start: usize,
    end: usize,
}

impl Line {
    fn indent<'a>(&self, source: &'a str) -> &'a str {
        let text = &source[self.start..self.end];
        &text[..text.len() - text.trim_start().len()]
    }
}

/// First line containing `anchor`, verbatim or with boundary characters trimmed.
fn find_line(source: &str, anchor: &str) -> Option<Line> {
    let lines = lines(source);
    let trimmed = trim_boundary(anchor);
    [anchor, trimmed]
        .into_iter()
        .filter(|needle| !needle.is_empty())
        .find_map(|needle| {
            lines
                .iter()
                .find(|line| source[line.start..line.end].contains(needle))
                .copied()
        })
}

fn lines(source: &str) -> Vec<Line> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, _) in source.match_indices('\n') {
        let end = if i > start && source.as_bytes()[i - 1] == b'\r' {
            i - 1
        } else {
            i
        };
        out.push(Line { start, end });
        start = i + 1;
    }
    if start < source.len() {
        out.push(Line {
            start,
            end: source.len(),
        });
    }
    out
}

fn splice(source: &str, at: usize, text: &str) -> String {
    let mut out = String::with_capacity(source.len() + text.len());
    out.push_str(&source[..at]);
    out.push_str(text);
    out.push_str(&source[at..]);
    out
}
