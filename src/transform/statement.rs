//! Turning snippet text into statements with the right trivia.

use crate::error::Result;
use crate::lang::CSharp;
use crate::model::{CodeSnippet, Formatting};

/// Where a synthesized statement will live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementContext {
    /// Inside a method or lambda block.
    Block,
    /// A top-level statement of the compilation unit.
    Global,
}

/// A validated statement ready to be rendered next to an anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    body: String,
    indent: String,
    formatting: Formatting,
}

impl Statement {
    /// Synthesizes a statement from `snippet`, inheriting `anchor_indent`.
    ///
    /// The anchor's leading whitespace is added to the snippet's
    /// `NumberOfSpaces`; the resulting statement text is parsed for
    /// `context` and rejected if malformed.
    pub fn synthesize(
        snippet: &CodeSnippet,
        context: StatementContext,
        anchor_indent: &str,
    ) -> Result<Statement> {
        Self::from_block(&snippet.block, snippet.formatting, context, anchor_indent)
    }

    /// Synthesizes a statement from raw text.
    pub fn from_block(
        block: &str,
        formatting: Formatting,
        context: StatementContext,
        anchor_indent: &str,
    ) -> Result<Statement> {
        let (formatting, indent) = if anchor_indent.chars().all(|c| c == ' ') {
            let formatting = formatting.indented(anchor_indent.len());
            (formatting, " ".repeat(formatting.number_of_spaces))
        } else {
            let indent = format!("{anchor_indent}{}", " ".repeat(formatting.number_of_spaces));
            (formatting, indent)
        };

        let trimmed = block.trim();
        let body = if formatting.semicolon {
            trimmed.trim_end_matches(';').trim_end().to_string()
        } else {
            trimmed.to_string()
        };

        let statement = Statement {
            body,
            indent,
            formatting,
        };
        match context {
            StatementContext::Block => CSharp.validate_statement(&statement.text())?,
            StatementContext::Global => CSharp.validate_global_statement(&statement.text())?,
        }
        Ok(statement)
    }

    /// Statement text including the terminating semicolon, if requested.
    pub fn text(&self) -> String {
        if self.formatting.semicolon {
            format!("{};", self.body)
        } else {
            self.body.clone()
        }
    }

    /// The accumulated leading whitespace.
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Effective formatting, with inherited indentation folded in.
    pub fn formatting(&self) -> Formatting {
        self.formatting
    }

    /// Rendering for insertion right after an anchor.
    pub fn render_after(&self, newline: &str) -> String {
        if self.formatting.newline {
            format!("{newline}{}{}", self.indent, self.indented_text(newline))
        } else {
            format!(" {}", self.text())
        }
    }

    /// Rendering for insertion at the start of an anchor's line.
    pub fn render_before(&self, newline: &str) -> String {
        if self.formatting.newline {
            format!("{}{}{newline}", self.indent, self.indented_text(newline))
        } else {
            format!("{} ", self.text())
        }
    }

    /// Text with continuation lines shifted by the statement's indent.
    fn indented_text(&self, newline: &str) -> String {
        let text = self.text();
        let mut lines = text.lines();
        let mut out = lines.next().unwrap_or_default().to_string();
        for line in lines {
            out.push_str(newline);
            if !line.trim().is_empty() {
                out.push_str(&self.indent);
            }
            out.push_str(line.trim_end());
        }
        out
    }
}
