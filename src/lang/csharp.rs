//! C# language support.

use super::Language;
use crate::error::{ModifierError, Result, SnippetKind};
use tree_sitter::Language as TsLanguage;

/// C# programming language.
pub struct CSharp;

impl Language for CSharp {
    fn name(&self) -> &'static str {
        "csharp"
    }

    fn extensions(&self) -> &[&'static str] {
        &["cs", "csx"]
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_c_sharp::LANGUAGE.into()
    }
}

impl CSharp {
    /// Checks that `text` parses as a statement inside a method body.
    pub fn validate_statement(&self, text: &str) -> Result<()> {
        self.validate_wrapped(
            SnippetKind::Statement,
            text,
            "class __Snippet { void __Check() {\n",
            "\n} }",
        )
    }

    /// Checks that `text` parses as top-level (global) statements.
    pub fn validate_global_statement(&self, text: &str) -> Result<()> {
        self.validate_wrapped(SnippetKind::GlobalStatement, text, "", "\n")
    }

    /// Checks that `text` parses as a class member declaration.
    pub fn validate_member(&self, text: &str) -> Result<()> {
        self.validate_wrapped(SnippetKind::Member, text, "class __Snippet {\n", "\n}")
    }

    /// Checks that `text` parses as an attribute list placed on a class.
    pub fn validate_attribute(&self, text: &str) -> Result<()> {
        if !text.trim_start().starts_with('[') {
            return Err(ModifierError::malformed(SnippetKind::Attribute, text));
        }
        self.validate_wrapped(SnippetKind::Attribute, text, "", "\nclass __Snippet { }")
    }

    /// Checks that `text` parses as a single method parameter.
    pub fn validate_parameter(&self, text: &str) -> Result<()> {
        self.validate_wrapped(
            SnippetKind::Parameter,
            text,
            "class __Snippet { void __Check(",
            ") { } }",
        )
    }

    /// Checks that `text` parses as a method return type, optionally prefixed by `async`.
    pub fn validate_type(&self, text: &str) -> Result<()> {
        self.validate_wrapped(
            SnippetKind::Type,
            text,
            "class __Snippet { ",
            " __Check() { } }",
        )
    }

    /// Checks that `text` parses as an expression.
    pub fn validate_expression(&self, text: &str) -> Result<()> {
        self.validate_wrapped(
            SnippetKind::Expression,
            text,
            "class __Snippet { void __Check() { var __value = ",
            "; } }",
        )
    }

    fn validate_wrapped(
        &self,
        kind: SnippetKind,
        text: &str,
        prefix: &str,
        suffix: &str,
    ) -> Result<()> {
        if text.trim().is_empty() {
            return Err(ModifierError::malformed(kind, text));
        }
        let wrapped = format!("{prefix}{text}{suffix}");
        let tree = self.parse(&wrapped)?;
        if tree.root_node().has_error() {
            return Err(ModifierError::malformed(kind, text));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_class() {
        let tree = CSharp
            .parse("namespace App { public class Startup { } }")
            .unwrap();
        assert_eq!(tree.root_node().kind(), "compilation_unit");
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_validate_statement() {
        assert!(CSharp.validate_statement("services.AddControllers();").is_ok());
        assert!(
            CSharp
                .validate_statement("services.AddDbContext<AppDbContext>(options => options.UseSqlServer(cs));")
                .is_ok()
        );
        let err = CSharp.validate_statement("services.AddControllers(;").unwrap_err();
        assert!(err.is_per_change());
    }

    #[test]
    fn test_validate_member_and_attribute() {
        assert!(CSharp.validate_member("public string Name { get; set; }").is_ok());
        assert!(CSharp.validate_attribute("[Authorize]").is_ok());
        assert!(CSharp.validate_attribute("Authorize").is_err());
    }

    #[test]
    fn test_validate_parameter_and_type() {
        assert!(CSharp.validate_parameter("IWebHostEnvironment env").is_ok());
        assert!(CSharp.validate_type("async Task<IActionResult>").is_ok());
        assert!(CSharp.validate_type("").is_err());
    }
}
