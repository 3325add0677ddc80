//! Locating files, anchors and declarations.

pub mod anchor;
pub mod ast;
pub mod file;

pub use anchor::{AnchorResolver, BOUNDARY_CHARS, TextAnchorResolver, trim_boundary};
pub use ast::{AstMatcher, declaration_name};
pub use file::{DEFAULT_EXCLUDES, FileMatcher};
