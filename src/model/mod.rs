//! Declarative description of code changes.
//!
//! A [`ModifierConfig`] holds one [`CodeFile`] per target file. Each file
//! describes using directives, class-level members and attributes, and a map
//! of method name to [`MethodChange`], whose [`CodeSnippet`]s are the atomic
//! edits. All types deserialize from the PascalCase JSON layout used by
//! scaffolding configuration files:
//!
//! ```json
//! {
//!   "Identifier": "dbcontext",
//!   "Files": [{
//!     "FileName": "Startup.cs",
//!     "Usings": ["Microsoft.EntityFrameworkCore"],
//!     "Methods": {
//!       "ConfigureServices": {
//!         "Parameters": ["IServiceCollection"],
//!         "CodeChanges": [{
//!           "Block": "{IServiceCollection}.AddDbContext<{DbContextName}>()",
//!           "InsertAfter": "services.AddControllers();",
//!           "Formatting": { "Newline": true, "Semicolon": true }
//!         }]
//!       }
//!     }
//!   }]
//! }
//! ```

mod options;

pub use options::OptionSet;

use serde::{Deserialize, Serialize};
use indexmap::IndexMap;

/// The full declarative configuration for one scaffolding target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ModifierConfig {
    /// Identifier of the scaffolding target.
    pub identifier: String,
    /// Per-file change sets, applied in order.
    pub files: Vec<CodeFile>,
}

/// All edits for one logical file (a change set).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CodeFile {
    /// File name, e.g. `Startup.cs`. The base name selects the class scope.
    pub file_name: String,
    /// Extension override; derived from `file_name` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    pub options: Vec<String>,
    pub usings: Vec<String>,
    pub usings_with_options: Vec<CodeBlock>,
    pub class_properties: Vec<CodeBlock>,
    pub class_attributes: Vec<CodeBlock>,
    /// Method name to its changes, applied in declaration order.
    pub methods: IndexMap<String, MethodChange>,
    /// Plain-text edits for non-C# files such as Razor or cshtml markup.
    pub replacements: Vec<CodeSnippet>,
    pub ambient_variables: Vec<AmbientVariable>,
}

impl CodeFile {
    /// Creates a change set for the given file name.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    /// Base name of the file without its extension.
    pub fn base_name(&self) -> &str {
        let name = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_name);
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }

    /// Effective extension, lower-cased and without a leading dot.
    pub fn extension(&self) -> String {
        match &self.extension {
            Some(ext) => ext.trim_start_matches('.').to_ascii_lowercase(),
            None => self
                .file_name
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .unwrap_or_default(),
        }
    }

    /// Returns true if this file is patched structurally as C#.
    pub fn is_csharp(&self) -> bool {
        self.extension() == "cs"
    }

    /// Using directives that apply under `options`, in declaration order.
    pub fn applicable_usings(&self, options: &OptionSet) -> Vec<String> {
        self.usings
            .iter()
            .cloned()
            .chain(
                self.usings_with_options
                    .iter()
                    .filter(|u| u.applies(options))
                    .map(|u| u.block.clone()),
            )
            .collect()
    }

    /// Rewrites every text field through `f`.
    pub fn map_text(&mut self, f: &dyn Fn(&str) -> String) {
        for using in &mut self.usings {
            *using = f(using);
        }
        for block in self
            .usings_with_options
            .iter_mut()
            .chain(self.class_properties.iter_mut())
            .chain(self.class_attributes.iter_mut())
        {
            block.map_text(f);
        }
        for method in self.methods.values_mut() {
            method.map_text(f);
        }
        for replacement in &mut self.replacements {
            replacement.map_text(f);
        }
    }
}

/// Edits scoped to one method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MethodChange {
    /// Expected parameter types, used to pick the right overload.
    pub parameters: Vec<String>,
    pub add_parameters: Vec<CodeBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_type: Option<CodeBlock>,
    pub code_changes: Vec<CodeSnippet>,
    pub options: Vec<String>,
}

impl MethodChange {
    /// Returns true if this method's edits apply under `options`.
    pub fn applies(&self, options: &OptionSet) -> bool {
        options.satisfies(&self.options)
    }

    /// Rewrites every snippet text field through `f`.
    pub fn map_text(&mut self, f: &dyn Fn(&str) -> String) {
        for block in &mut self.add_parameters {
            block.map_text(f);
        }
        if let Some(block) = &mut self.edit_type {
            block.map_text(f);
        }
        for snippet in &mut self.code_changes {
            snippet.map_text(f);
        }
    }
}

/// How a snippet attaches to its structural anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Plain statement insertion.
    #[default]
    Default,
    /// Chain `.Block` onto the anchor's expression.
    MemberAccess,
    /// Add to (or create) a lambda argument of the anchor's invocation.
    Lambda,
}

/// The atomic edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CodeSnippet {
    /// Code to insert.
    pub block: String,
    /// Alternate existence marker used by the idempotency check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_block: Option<String>,
    /// Structural anchor for `MemberAccess` and `Lambda` changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(rename = "CodeChangeType", alias = "ChangeKind")]
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_after: Option<String>,
    /// Candidate anchors; the first that resolves wins.
    pub insert_before: Vec<String>,
    pub prepend: bool,
    /// Insert after the last statement of the scope. This is also the
    /// placement when no anchor or `Prepend` is given.
    pub append: bool,
    /// Replace a lambda body instead of appending to it.
    pub replace: bool,
    /// Text replaced by `block` in plain-text files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace_snippet: Option<String>,
    /// Lambda parameter name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    pub formatting: Formatting,
    pub options: Vec<String>,
}

impl CodeSnippet {
    /// Creates a default-kind snippet with the given block.
    pub fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            ..Default::default()
        }
    }

    /// Returns true if this snippet applies under `options`.
    pub fn applies(&self, options: &OptionSet) -> bool {
        options.satisfies(&self.options)
    }

    /// Texts that mark this change as already present.
    pub fn existence_markers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.block.as_str())
            .chain(self.check_block.as_deref())
            .filter(|marker| !marker.trim().is_empty())
    }

    /// Rewrites every text field through `f`.
    pub fn map_text(&mut self, f: &dyn Fn(&str) -> String) {
        self.block = f(&self.block);
        for field in [
            &mut self.check_block,
            &mut self.parent,
            &mut self.insert_after,
            &mut self.replace_snippet,
        ] {
            if let Some(text) = field.as_mut() {
                *text = f(text);
            }
        }
        for anchor in &mut self.insert_before {
            *anchor = f(anchor);
        }
    }
}

/// Trivia directives for a synthesized node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Formatting {
    pub number_of_spaces: usize,
    pub newline: bool,
    pub semicolon: bool,
}

impl Formatting {
    /// Formatting for a statement on its own line, terminated by `;`.
    pub fn statement() -> Self {
        Self {
            number_of_spaces: 0,
            newline: true,
            semicolon: true,
        }
    }

    /// Returns a copy indented by `extra` further spaces.
    pub fn indented(self, extra: usize) -> Self {
        Self {
            number_of_spaces: self.number_of_spaces + extra,
            ..self
        }
    }
}

/// A text block guarded by an option predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", from = "CodeBlockRepr")]
pub struct CodeBlock {
    pub block: String,
    pub options: Vec<String>,
}

impl CodeBlock {
    /// Creates an unconditional block.
    pub fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            options: Vec::new(),
        }
    }

    /// Returns true if this block applies under `options`.
    pub fn applies(&self, options: &OptionSet) -> bool {
        options.satisfies(&self.options)
    }

    fn map_text(&mut self, f: &dyn Fn(&str) -> String) {
        self.block = f(&self.block);
    }
}

/// Accepts either a bare string or a `{ "Block", "Options" }` object.
#[derive(Deserialize)]
#[serde(untagged)]
enum CodeBlockRepr {
    Text(String),
    #[serde(rename_all = "PascalCase")]
    Full {
        #[serde(default)]
        block: String,
        #[serde(default)]
        options: Vec<String>,
    },
}

impl From<CodeBlockRepr> for CodeBlock {
    fn from(repr: CodeBlockRepr) -> Self {
        match repr {
            CodeBlockRepr::Text(block) => CodeBlock::new(block),
            CodeBlockRepr::Full { block, options } => CodeBlock { block, options },
        }
    }
}

/// A variable whose declared name may differ from the one used in snippets.
///
/// `name` is the identifier written in the configuration (e.g. `builder`);
/// the actual name is taken from the declaration whose initializer contains
/// `declared_by` (e.g. `WebApplication.CreateBuilder`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AmbientVariable {
    pub name: String,
    pub declared_by: String,
}

impl AmbientVariable {
    pub fn new(name: impl Into<String>, declared_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_by: declared_by.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_snippet() {
        let json = r#"{
            "Block": "options.UseSqlServer(cs)",
            "Parent": "services.AddDbContext",
            "CodeChangeType": "Lambda",
            "Parameter": "options",
            "Formatting": { "NumberOfSpaces": 4, "Newline": true },
            "Options": ["ef"]
        }"#;
        let snippet: CodeSnippet = serde_json::from_str(json).unwrap();
        assert_eq!(snippet.kind, ChangeKind::Lambda);
        assert_eq!(snippet.parent.as_deref(), Some("services.AddDbContext"));
        assert_eq!(snippet.formatting.number_of_spaces, 4);
        assert!(snippet.formatting.newline);
        assert!(!snippet.formatting.semicolon);
        assert!(snippet.insert_before.is_empty());
    }

    #[test]
    fn test_methods_keep_declaration_order() {
        let file: CodeFile = serde_json::from_str(
            r#"{
                "FileName": "Startup.cs",
                "Methods": {
                    "ConfigureServices": { "CodeChanges": [] },
                    "Configure": { "CodeChanges": [] },
                    "AddAuth": { "CodeChanges": [] }
                }
            }"#,
        )
        .unwrap();
        let names: Vec<&str> = file.methods.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["ConfigureServices", "Configure", "AddAuth"]);
    }

    #[test]
    fn test_change_kind_alias() {
        let snippet: CodeSnippet =
            serde_json::from_str(r#"{ "Block": "X()", "ChangeKind": "MemberAccess" }"#).unwrap();
        assert_eq!(snippet.kind, ChangeKind::MemberAccess);
    }

    #[test]
    fn test_code_block_forms() {
        let blocks: Vec<CodeBlock> = serde_json::from_str(
            r#"["System.Linq", { "Block": "Microsoft.EntityFrameworkCore", "Options": ["ef"] }]"#,
        )
        .unwrap();
        assert_eq!(blocks[0], CodeBlock::new("System.Linq"));
        assert_eq!(blocks[1].options, vec!["ef".to_string()]);
    }

    #[test]
    fn test_file_names() {
        let file = CodeFile::new("Areas/Identity/Startup.cs");
        assert_eq!(file.base_name(), "Startup");
        assert_eq!(file.extension(), "cs");
        assert!(file.is_csharp());

        let mut markup = CodeFile::new("_Layout.cshtml");
        assert!(!markup.is_csharp());
        markup.extension = Some(".CS".to_string());
        assert!(markup.is_csharp());
    }

    #[test]
    fn test_applicable_usings() {
        let mut file = CodeFile::new("Program.cs");
        file.usings = vec!["System".to_string()];
        file.usings_with_options = vec![CodeBlock {
            block: "Microsoft.EntityFrameworkCore".to_string(),
            options: vec!["ef".to_string()],
        }];
        assert_eq!(file.applicable_usings(&OptionSet::new()), vec!["System"]);
        assert_eq!(
            file.applicable_usings(&OptionSet::new().with("ef")),
            vec!["System", "Microsoft.EntityFrameworkCore"]
        );
    }

    #[test]
    fn test_formatting_is_additive() {
        let formatting = Formatting::statement().indented(4).indented(8);
        assert_eq!(formatting.number_of_spaces, 12);
        assert!(formatting.newline && formatting.semicolon);
    }
}
