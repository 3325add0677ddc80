//! # Code Modifier
//!
//! Declarative, idempotent structural patching of C# source files.
//!
//! A change configuration lists, per target file, the using directives,
//! class members and attributes, method statements and signature edits to
//! add. Each change is anchored to existing code by text, inserted with the
//! surrounding indentation, and skipped when it is already present, so
//! running the same configuration twice leaves files untouched.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use code_modifier::prelude::*;
//!
//! let config = ConfigLoader::from_path("dbcontext.json")?;
//! let properties = [("DbContextName".to_string(), "BlogContext".to_string())]
//!     .into_iter()
//!     .collect();
//! let config = ConfigLoader::apply_substitutions(config, &properties);
//!
//! let report = CodeModifier::new(config)
//!     .option("ef")
//!     .dry_run()
//!     .apply(&mut FsWorkspace::new("./MyWebApp"));
//!
//! println!("{}", report.diff());
//! # Ok::<(), code_modifier::error::ModifierError>(())
//! ```
//!
//! ## Patching a Single Source
//!
//! ```rust
//! use code_modifier::prelude::*;
//!
//! let mut snippet = CodeSnippet::new("builder.Services.AddRazorPages()");
//! snippet.insert_after = Some("var builder = WebApplication.CreateBuilder(args);".into());
//! snippet.formatting = Formatting::statement();
//!
//! let mut file = CodeFile::new("Program.cs");
//! file.methods.insert(
//!     "Global".into(),
//!     MethodChange { code_changes: vec![snippet], ..Default::default() },
//! );
//!
//! let source = "var builder = WebApplication.CreateBuilder(args);\nvar app = builder.Build();\n";
//! let edit = CodeModifier::new(ModifierConfig::default()).modify_source(&file, source)?;
//! assert!(edit.modified.contains("builder.Services.AddRazorPages();"));
//! # Ok::<(), code_modifier::error::ModifierError>(())
//! ```

pub mod assets;
pub mod config;
pub mod diff;
pub mod error;
pub mod lang;
pub mod matcher;
pub mod model;
pub mod modifier;
pub mod syntax;
pub mod transform;
pub mod workspace;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::assets::{AssetRegistry, DirAssets, MemoryAssets};
    pub use crate::config::ConfigLoader;
    pub use crate::diff::{DiffSummary, FileDiff};
    pub use crate::error::{ModifierError, Result, SnippetKind};
    pub use crate::lang::{CSharp, Language, LanguageRegistry};
    pub use crate::matcher::{AnchorResolver, AstMatcher, FileMatcher, TextAnchorResolver};
    pub use crate::model::{
        AmbientVariable, ChangeKind, CodeBlock, CodeFile, CodeSnippet, Formatting, MethodChange,
        ModifierConfig, OptionSet,
    };
    pub use crate::modifier::{
        CodeModifier, DEFAULT_ENTRY_POINT, FileEdit, FileOutcome, FileReport, ModifyReport,
        SkippedChange,
    };
    pub use crate::syntax::{Document, TextEdit};
    pub use crate::transform::{Transform, TransformBuilder};
    pub use crate::workspace::{FsWorkspace, MemoryWorkspace, Workspace};
}

pub use prelude::*;
