//! Where target documents come from and where patched text goes.

use crate::error::{ModifierError, Result};
use crate::matcher::FileMatcher;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of the documents a configuration targets.
pub trait Workspace {
    /// All documents matching a configured file name.
    fn documents(&self, file_name: &str) -> Result<Vec<PathBuf>>;

    /// Reads a document.
    fn read(&self, path: &Path) -> Result<String>;

    /// Replaces a document's contents.
    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;
}

/// An in-memory workspace keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkspace {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document.
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// Current contents of a document.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }
}

impl Workspace for MemoryWorkspace {
    fn documents(&self, file_name: &str) -> Result<Vec<PathBuf>> {
        let wanted = Path::new(file_name);
        Ok(self
            .files
            .keys()
            .filter(|path| path.ends_with(wanted))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| ModifierError::FileNotFound(path.to_path_buf()))
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}

/// A project directory on disk.
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Workspace for FsWorkspace {
    fn documents(&self, file_name: &str) -> Result<Vec<PathBuf>> {
        let found = FileMatcher::named(file_name).collect(&self.root)?;
        debug!(file_name, count = found.len(), "located documents");
        Ok(found)
    }

    fn read(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(ModifierError::FileNotFound(path.to_path_buf()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_workspace() {
        let mut workspace = MemoryWorkspace::new()
            .with_file("Web/Program.cs", "app.Run();")
            .with_file("Web/Areas/Startup.cs", "class Startup { }");
        assert_eq!(
            workspace.documents("Program.cs").unwrap(),
            vec![PathBuf::from("Web/Program.cs")]
        );
        assert_eq!(workspace.documents("Areas/Startup.cs").unwrap().len(), 1);
        assert!(workspace.documents("Gram.cs").unwrap().is_empty());

        workspace.write(Path::new("Web/Program.cs"), "app.Build();").unwrap();
        assert_eq!(workspace.get("Web/Program.cs"), Some("app.Build();"));
        assert!(workspace.read(Path::new("Missing.cs")).is_err());
    }

    #[test]
    fn test_fs_workspace() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Web/obj")).unwrap();
        std::fs::write(dir.path().join("Web/Program.cs"), "app.Run();").unwrap();
        std::fs::write(dir.path().join("Web/obj/Program.cs"), "generated").unwrap();

        let mut workspace = FsWorkspace::new(dir.path());
        let found = workspace.documents("Program.cs").unwrap();
        assert_eq!(found, vec![dir.path().join("Web/Program.cs")]);

        workspace.write(&found[0], "app.Build();").unwrap();
        assert_eq!(workspace.read(&found[0]).unwrap(), "app.Build();");
        assert!(matches!(
            workspace.read(&dir.path().join("Nope.cs")),
            Err(ModifierError::FileNotFound(_))
        ));
    }
}
