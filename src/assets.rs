//! Lookup of bundled configuration documents by identifier.

use crate::error::{ModifierError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolves an asset identifier to its text.
pub trait AssetRegistry: Send + Sync {
    /// Returns the text of asset `id`.
    fn get(&self, id: &str) -> Result<String>;

    /// Returns true if asset `id` is available.
    fn contains(&self, id: &str) -> bool {
        self.get(id).is_ok()
    }
}

/// Assets held in memory, typically compiled into a binary.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    assets: HashMap<String, String>,
}

impl MemoryAssets {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset.
    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(id, text);
        self
    }

    /// Adds or replaces an asset.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.assets.insert(id.into(), text.into());
    }
}

impl AssetRegistry for MemoryAssets {
    fn get(&self, id: &str) -> Result<String> {
        self.assets
            .get(id)
            .cloned()
            .ok_or_else(|| ModifierError::AssetNotFound(id.to_string()))
    }

    fn contains(&self, id: &str) -> bool {
        self.assets.contains_key(id)
    }
}

/// Assets stored as files below a root directory.
///
/// The identifier is a path relative to the root; `.json` is appended when
/// it has no extension.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File backing asset `id`.
    pub fn path_of(&self, id: &str) -> PathBuf {
        let relative = Path::new(id);
        if relative.extension().is_some() {
            self.root.join(relative)
        } else {
            self.root.join(format!("{id}.json"))
        }
    }
}

impl AssetRegistry for DirAssets {
    fn get(&self, id: &str) -> Result<String> {
        let path = self.path_of(id);
        if !path.is_file() {
            return Err(ModifierError::AssetNotFound(id.to_string()));
        }
        Ok(std::fs::read_to_string(path)?)
    }

    fn contains(&self, id: &str) -> bool {
        self.path_of(id).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_assets() {
        let assets = MemoryAssets::new().with("dbcontext", "{}");
        assert_eq!(assets.get("dbcontext").unwrap(), "{}");
        assert!(assets.contains("dbcontext"));
        assert!(matches!(
            assets.get("identity"),
            Err(ModifierError::AssetNotFound(id)) if id == "identity"
        ));
    }

    #[test]
    fn test_dir_assets_appends_json() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("minimal")).unwrap();
        std::fs::write(dir.path().join("minimal/dbcontext.json"), "{\"Files\":[]}").unwrap();
        std::fs::write(dir.path().join("identity.yaml"), "Files: []").unwrap();

        let assets = DirAssets::new(dir.path());
        assert_eq!(assets.get("minimal/dbcontext").unwrap(), "{\"Files\":[]}");
        assert_eq!(assets.get("identity.yaml").unwrap(), "Files: []");
        assert!(!assets.contains("identity"));
        assert!(assets.get("missing").is_err());
    }
}
