//! Applying a [`ModifierConfig`] to the documents of a workspace.

use crate::diff::{DiffSummary, FileDiff};
use crate::error::{ModifierError, Result};
use crate::matcher::{AnchorResolver, AstMatcher, TextAnchorResolver, declaration_name};
use crate::model::{ChangeKind, CodeFile, CodeSnippet, MethodChange, ModifierConfig, OptionSet};
use crate::syntax::{Document, TextEdit, named_children};
use crate::transform::scope::{self, Rename};
use crate::transform::{
    StatementScope, TransformBuilder, apply_lambda, apply_member_access, insert_snippet,
};
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tree_sitter::Node;

/// File whose methods may be replaced by top-level statements.
pub const DEFAULT_ENTRY_POINT: &str = "Program.cs";

/// Method keys that address top-level statements in the entry point.
const TOP_LEVEL_KEYS: [&str; 2] = ["Global", "Main"];

/// Result of patching one document in memory.
#[derive(Debug, Clone)]
pub struct FileEdit {
    pub original: String,
    pub modified: String,
    pub skipped: Vec<SkippedChange>,
}

impl FileEdit {
    fn unchanged(source: &str) -> Self {
        Self {
            original: source.to_string(),
            modified: source.to_string(),
            skipped: Vec::new(),
        }
    }

    /// Returns true if the document changed.
    pub fn is_modified(&self) -> bool {
        self.original != self.modified
    }
}

/// A change that was not applied, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChange {
    pub file_name: String,
    /// Class, method or member list the change targeted.
    pub target: String,
    pub change: String,
    pub reason: String,
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Modified,
    Unchanged,
    NotFound,
    Failed(String),
}

/// Per-document entry of a [`ModifyReport`].
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub path: Option<PathBuf>,
    pub outcome: FileOutcome,
    pub diff: Option<FileDiff>,
}

/// Summary of a whole run.
#[derive(Debug, Default)]
pub struct ModifyReport {
    pub files: Vec<FileReport>,
    pub skipped: Vec<SkippedChange>,
    pub summary: DiffSummary,
}

impl ModifyReport {
    /// Returns the number of documents that were modified.
    pub fn files_modified(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.outcome == FileOutcome::Modified)
            .count()
    }

    /// Returns true if any document failed.
    pub fn has_failures(&self) -> bool {
        self.files
            .iter()
            .any(|f| matches!(f.outcome, FileOutcome::Failed(_)))
    }

    /// Generates a unified diff of all changes.
    pub fn diff(&self) -> String {
        self.diffs().map(FileDiff::unified).collect::<Vec<_>>().join("\n")
    }

    /// Generates a colorized diff for terminal display.
    pub fn colorized_diff(&self) -> String {
        self.diffs()
            .map(FileDiff::colorized)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn diffs(&self) -> impl Iterator<Item = &FileDiff> {
        self.files
            .iter()
            .filter_map(|f| f.diff.as_ref())
            .filter(|d| d.is_modified())
    }
}

/// The patch engine: a configuration plus the options it runs under.
pub struct CodeModifier {
    config: ModifierConfig,
    options: OptionSet,
    resolver: Box<dyn AnchorResolver>,
    entry_point: String,
    dry_run: bool,
}

impl CodeModifier {
    /// Creates a modifier for `config` with no options set.
    pub fn new(config: ModifierConfig) -> Self {
        Self {
            config,
            options: OptionSet::new(),
            resolver: Box::new(TextAnchorResolver),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            dry_run: false,
        }
    }

    /// Replaces the active option set.
    pub fn options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }

    /// Enables one option.
    pub fn option(mut self, flag: impl Into<String>) -> Self {
        self.options.insert(flag);
        self
    }

    /// Uses a different anchor resolution strategy.
    pub fn resolver(mut self, resolver: impl AnchorResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Sets the file name treated as the program entry point.
    pub fn entry_point(mut self, file_name: impl Into<String>) -> Self {
        self.entry_point = file_name.into();
        self
    }

    /// Enables dry-run mode (compute changes without writing them).
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn config(&self) -> &ModifierConfig {
        &self.config
    }

    /// Patches every configured file found in `workspace`.
    ///
    /// A failure in one document is recorded in its outcome and never stops
    /// the others.
    pub fn apply(&self, workspace: &mut dyn Workspace) -> ModifyReport {
        let mut report = ModifyReport::default();

        for file in &self.config.files {
            if !self.options.satisfies(&file.options) {
                debug!(file = %file.file_name, "file excluded by options");
                continue;
            }
            let paths = match workspace.documents(&file.file_name) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(file = %file.file_name, error = %e, "failed to locate documents");
                    report.files.push(FileReport {
                        file_name: file.file_name.clone(),
                        path: None,
                        outcome: FileOutcome::Failed(e.to_string()),
                        diff: None,
                    });
                    continue;
                }
            };
            if paths.is_empty() {
                info!(file = %file.file_name, "no matching document");
                report.files.push(FileReport {
                    file_name: file.file_name.clone(),
                    path: None,
                    outcome: FileOutcome::NotFound,
                    diff: None,
                });
                continue;
            }

            for path in paths {
                let entry = match self.patch_document(workspace, file, &path) {
                    Ok(edit) => {
                        let diff = FileDiff::new(&path, edit.original, edit.modified);
                        report.summary.merge(&diff.summary());
                        report.skipped.extend(edit.skipped);
                        let outcome = if diff.is_modified() {
                            FileOutcome::Modified
                        } else {
                            FileOutcome::Unchanged
                        };
                        info!(path = %path.display(), ?outcome, dry_run = self.dry_run, "processed document");
                        FileReport {
                            file_name: file.file_name.clone(),
                            path: Some(path),
                            outcome,
                            diff: Some(diff),
                        }
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to patch document");
                        FileReport {
                            file_name: file.file_name.clone(),
                            path: Some(path),
                            outcome: FileOutcome::Failed(e.to_string()),
                            diff: None,
                        }
                    }
                };
                report.files.push(entry);
            }
        }

        report
    }

    fn patch_document(
        &self,
        workspace: &mut dyn Workspace,
        file: &CodeFile,
        path: &Path,
    ) -> Result<FileEdit> {
        let source = workspace.read(path)?;
        let edit = self.modify_source(file, &source)?;
        if edit.is_modified() && !self.dry_run {
            workspace.write(path, &edit.modified)?;
        }
        Ok(edit)
    }

    /// Applies the changes for `file` to `source`.
    ///
    /// Missing classes, methods and anchors leave the text unchanged;
    /// malformed snippets are skipped and listed in the result.
    pub fn modify_source(&self, file: &CodeFile, source: &str) -> Result<FileEdit> {
        if !self.options.satisfies(&file.options) {
            return Ok(FileEdit::unchanged(source));
        }
        if !file.is_csharp() {
            let modified = TransformBuilder::new()
                .replacements(&file.replacements, &self.options)
                .apply(source, Path::new(&file.file_name))?;
            return Ok(FileEdit {
                original: source.to_string(),
                modified,
                skipped: Vec::new(),
            });
        }

        let doc = Document::parse(source)?;
        let file = self.rename_ambient_variables(&doc, file)?;
        let mut patch = Patch {
            modifier: self,
            file: &file,
            doc,
            skipped: Vec::new(),
        };
        patch.run()?;
        Ok(FileEdit {
            original: source.to_string(),
            modified: patch.doc.into_source(),
            skipped: patch.skipped,
        })
    }

    /// Rewrites snippet identifiers to the names the document actually uses.
    fn rename_ambient_variables(&self, doc: &Document, file: &CodeFile) -> Result<CodeFile> {
        let mut file = file.clone();
        for variable in &file.ambient_variables.clone() {
            let Some(actual) = scope::discover_variable(doc, variable) else {
                continue;
            };
            if actual == variable.name || variable.name.is_empty() {
                continue;
            }
            debug!(from = %variable.name, to = %actual, "renaming ambient variable");
            let rename = Rename::new(&variable.name, &actual)?;
            file.map_text(&|text| rename.apply(text));
        }
        Ok(file)
    }

    fn is_entry_point(&self, file: &CodeFile) -> bool {
        let name = Path::new(&file.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&file.file_name);
        name.eq_ignore_ascii_case(&self.entry_point)
    }
}

/// A tracked declaration, re-found in each new document by start byte.
///
/// Edits made inside a declaration never move its start.
#[derive(Debug, Clone, Copy)]
struct Handle {
    start: usize,
    kind: &'static str,
}

impl Handle {
    fn of(node: Node<'_>, kind: &'static str) -> Self {
        Self {
            start: node.start_byte(),
            kind,
        }
    }

    fn resolve<'t>(&self, doc: &'t Document) -> Option<Node<'t>> {
        let mut node = doc
            .root()
            .descendant_for_byte_range(self.start, self.start)?;
        loop {
            if node.kind() == self.kind && node.start_byte() == self.start {
                return Some(node);
            }
            node = node.parent()?;
        }
    }
}

/// Where a method's statements live.
#[derive(Debug, Clone, Copy)]
enum MethodScope {
    /// Top-level statements of the compilation unit.
    TopLevel,
    Method(Handle),
}

/// The state of one document while its changes are applied.
struct Patch<'a> {
    modifier: &'a CodeModifier,
    file: &'a CodeFile,
    doc: Document,
    skipped: Vec<SkippedChange>,
}

impl Patch<'_> {
    fn run(&mut self) -> Result<()> {
        let (modifier, file) = (self.modifier, self.file);
        let options = &modifier.options;
        let top_level = modifier.is_entry_point(file) && has_top_level_statements(&self.doc);
        let has_members = !file.class_properties.is_empty() || !file.class_attributes.is_empty();
        let has_class_methods = file
            .methods
            .keys()
            .any(|name| !(top_level && TOP_LEVEL_KEYS.contains(&name.as_str())));
        let class = self.locate_class()?.map(|c| Handle::of(c, "class_declaration"));

        if class.is_none() && (has_members || has_class_methods) {
            if !top_level {
                info!(file = %file.file_name, class = file.base_name(), "class not found");
                self.skip(file.base_name(), "class", "class not found");
                return Ok(());
            }
            if has_members {
                self.skip(file.base_name(), "class members", "class not found");
            }
        }

        let usings = file.applicable_usings(options);
        if !usings.is_empty() {
            let edits = scope::merge_usings(&self.doc, &usings);
            self.commit(edits, "usings")?;
        }
        // Using edits precede the class, so its handle is taken afterwards.
        let class = match class {
            Some(_) => self.locate_class()?.map(|c| Handle::of(c, "class_declaration")),
            None => None,
        };

        if let Some(class) = class {
            for property in file.class_properties.iter().filter(|p| p.applies(options)) {
                self.apply_with(class, &property.block, "class property", |doc, node, text| {
                    scope::add_property(doc, node, text)
                })?;
            }
            for attribute in file.class_attributes.iter().filter(|a| a.applies(options)) {
                self.apply_with(class, &attribute.block, "class attribute", |doc, node, text| {
                    scope::add_attribute(doc, node, text)
                })?;
            }
        }

        for (name, change) in &file.methods {
            if !change.applies(options) {
                debug!(method = %name, "method change excluded by options");
                continue;
            }
            let method_scope = if top_level && TOP_LEVEL_KEYS.contains(&name.as_str()) {
                Some((MethodScope::TopLevel, change.clone()))
            } else {
                self.locate_method(class, name, change)?
            };
            let Some((method_scope, change)) = method_scope else {
                debug!(method = %name, "method not found");
                self.skip(name, "method", "method not found");
                continue;
            };
            self.apply_method(name, method_scope, &change)?;
        }
        Ok(())
    }

    fn apply_method(
        &mut self,
        name: &str,
        method_scope: MethodScope,
        change: &MethodChange,
    ) -> Result<()> {
        let modifier = self.modifier;
        let options = &modifier.options;
        for snippet in change.code_changes.iter().filter(|s| s.applies(options)) {
            let edits = {
                let Some(statements) = self.statement_scope(method_scope) else {
                    self.skip(name, &snippet.block, "method has no statement body");
                    continue;
                };
                self.mutate(statements, snippet)
            };
            match edits {
                Ok(edits) => self.commit(edits, &snippet.block)?,
                Err(e) if e.is_per_change() => self.malformed(name, &snippet.block, e),
                Err(e) => return Err(e),
            }
        }

        let MethodScope::Method(method) = method_scope else {
            return Ok(());
        };
        if let Some(edit_type) = change.edit_type.as_ref().filter(|t| t.applies(options)) {
            self.apply_with(method, &edit_type.block, name, |doc, node, text| {
                scope::edit_return_type(doc, node, text)
            })?;
        }
        for parameter in change.add_parameters.iter().filter(|p| p.applies(options)) {
            self.apply_with(method, &parameter.block, name, |doc, node, text| {
                scope::add_parameter(doc, node, text)
            })?;
        }
        Ok(())
    }

    fn mutate(&self, scope: StatementScope<'_>, snippet: &CodeSnippet) -> Result<Vec<TextEdit>> {
        let resolver = self.modifier.resolver.as_ref();
        match snippet.kind {
            ChangeKind::Default => insert_snippet(&self.doc, resolver, scope, snippet),
            ChangeKind::MemberAccess => apply_member_access(&self.doc, resolver, scope, snippet),
            ChangeKind::Lambda => apply_lambda(&self.doc, resolver, scope, snippet),
        }
    }

    fn statement_scope(&self, method_scope: MethodScope) -> Option<StatementScope<'_>> {
        match method_scope {
            MethodScope::TopLevel => Some(StatementScope::global(self.doc.root())),
            MethodScope::Method(handle) => handle
                .resolve(&self.doc)
                .and_then(|m| m.child_by_field_name("body"))
                .filter(|body| body.kind() == "block")
                .map(StatementScope::block),
        }
    }

    /// Runs a scope mutator against the declaration behind `handle`.
    fn apply_with<F>(&mut self, handle: Handle, text: &str, target: &str, mutator: F) -> Result<()>
    where
        F: for<'t> Fn(&Document, Node<'t>, &str) -> Result<Vec<TextEdit>>,
    {
        let edits = match handle.resolve(&self.doc) {
            Some(node) => mutator(&self.doc, node, text),
            None => {
                self.skip(target, text, "declaration no longer found");
                return Ok(());
            }
        };
        match edits {
            Ok(edits) => self.commit(edits, text),
            Err(e) if e.is_per_change() => {
                self.malformed(target, text, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn commit(&mut self, edits: Vec<TextEdit>, change: &str) -> Result<()> {
        if edits.is_empty() {
            debug!(change, "no change applied");
            return Ok(());
        }
        self.doc = self.doc.apply(&edits)?;
        debug!(change, edits = edits.len(), "applied change");
        Ok(())
    }

    fn malformed(&mut self, target: &str, change: &str, error: ModifierError) {
        warn!(file = %self.file.file_name, target, error = %error, "skipping malformed snippet");
        self.skip(target, change, &error.to_string());
    }

    fn skip(&mut self, target: &str, change: &str, reason: &str) {
        self.skipped.push(SkippedChange {
            file_name: self.file.file_name.clone(),
            target: target.to_string(),
            change: change.to_string(),
            reason: reason.to_string(),
        });
    }

    /// The class named after the file: inside a block-scoped namespace,
    /// then a file-scoped one, then anywhere.
    fn locate_class(&self) -> Result<Option<Node<'_>>> {
        let name = self.file.base_name();
        let classes = AstMatcher::classes().find_nodes(&self.doc, self.doc.root())?;
        let named: Vec<Node<'_>> = classes
            .into_iter()
            .filter(|c| declaration_name(&self.doc, *c) == Some(name))
            .collect();
        let within = |kind: &str| {
            named
                .iter()
                .find(|c| has_ancestor(**c, kind))
                .copied()
        };
        Ok(within("namespace_declaration")
            .or_else(|| within("file_scoped_namespace_declaration"))
            .or_else(|| named.first().copied()))
    }

    /// Finds method `name` whose parameter types match `change.parameters`,
    /// returning its handle and the change with `{Type}` placeholders bound
    /// to parameter names.
    fn locate_method(
        &self,
        class: Option<Handle>,
        name: &str,
        change: &MethodChange,
    ) -> Result<Option<(MethodScope, MethodChange)>> {
        let scope = match class {
            Some(class) => match class.resolve(&self.doc) {
                Some(node) => node,
                None => return Ok(None),
            },
            None => self.doc.root(),
        };
        let candidates: Vec<(Node<'_>, Vec<(String, String)>)> = AstMatcher::methods()
            .find_nodes(&self.doc, scope)?
            .into_iter()
            .filter(|m| declaration_name(&self.doc, *m) == Some(name))
            .map(|m| (m, parameters_of(&self.doc, m)))
            .collect();
        // An exact signature wins over one that gained parameters in an earlier run.
        let found = candidates
            .iter()
            .find(|(_, params)| types_match(&change.parameters, params, true))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|(_, params)| types_match(&change.parameters, params, false))
            });
        let Some((method, parameters)) = found else {
            return Ok(None);
        };

        let mut bound = change.clone();
        let table: Vec<(String, &str)> = change
            .parameters
            .iter()
            .zip(parameters)
            .map(|(ty, (_, param))| (format!("{{{}}}", ty.trim()), param.as_str()))
            .collect();
        if !table.is_empty() {
            bound.map_text(&|text| {
                table
                    .iter()
                    .fold(text.to_string(), |acc, (key, value)| acc.replace(key, value))
            });
        }
        Ok(Some((
            MethodScope::Method(Handle::of(*method, "method_declaration")),
            bound,
        )))
    }
}

fn has_top_level_statements(doc: &Document) -> bool {
    named_children(doc.root())
        .into_iter()
        .any(|n| n.kind() == "global_statement")
}

fn has_ancestor(node: Node<'_>, kind: &str) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.kind() == kind {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// `(type, name)` of each declared parameter.
fn parameters_of(doc: &Document, method: Node<'_>) -> Vec<(String, String)> {
    let Some(list) = method.child_by_field_name("parameters") else {
        return Vec::new();
    };
    named_children(list)
        .into_iter()
        .filter(|p| p.kind() == "parameter")
        .map(|p| {
            let ty = p
                .child_by_field_name("type")
                .map(|t| doc.text(t).to_string())
                .unwrap_or_default();
            let name = p
                .child_by_field_name("name")
                .map(|n| doc.text(n).to_string())
                .unwrap_or_default();
            (ty, name)
        })
        .collect()
}

/// Expected types against the leading declared parameters; `exact` also
/// requires the counts to agree. No expected types matches any method.
fn types_match(expected: &[String], actual: &[(String, String)], exact: bool) -> bool {
    if expected.is_empty() {
        return true;
    }
    let squash = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let counts_ok = if exact {
        expected.len() == actual.len()
    } else {
        expected.len() <= actual.len()
    };
    counts_ok
        && expected
            .iter()
            .zip(actual)
            .all(|(want, (have, _))| squash(want) == squash(have))
}
