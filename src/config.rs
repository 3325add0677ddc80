//! Loading, validating and templating change configurations.

use crate::assets::AssetRegistry;
use crate::error::{ModifierError, Result};
use crate::model::ModifierConfig;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Entry points for reading a [`ModifierConfig`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parses a JSON configuration.
    pub fn from_str(json: &str) -> Result<ModifierConfig> {
        let config: ModifierConfig = serde_json::from_str(json).map_err(|e| {
            ModifierError::InvalidConfig(format!("Failed to parse JSON config: {}", e))
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Parses a YAML configuration with the same field names.
    pub fn from_yaml_str(yaml: &str) -> Result<ModifierConfig> {
        let config: ModifierConfig = serde_yaml::from_str(yaml).map_err(|e| {
            ModifierError::InvalidConfig(format!("Failed to parse YAML config: {}", e))
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Loads a configuration file, choosing the format by extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<ModifierConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ModifierError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file {}: {}", path.display(), e),
            ))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Self::from_str(&content),
        }
    }

    /// Loads a configuration bundled as asset `id`.
    pub fn from_assets(assets: &dyn AssetRegistry, id: &str) -> Result<ModifierConfig> {
        let content = assets.get(id)?;
        if id.ends_with(".yaml") || id.ends_with(".yml") {
            Self::from_yaml_str(&content)
        } else {
            Self::from_str(&content)
        }
    }

    /// Rejects configurations that cannot target any file.
    pub fn validate(config: &ModifierConfig) -> Result<()> {
        for (index, file) in config.files.iter().enumerate() {
            if file.file_name.trim().is_empty() {
                return Err(ModifierError::InvalidConfig(format!(
                    "file entry {index} has no FileName"
                )));
            }
        }
        Ok(())
    }

    /// Replaces `{Name}` placeholders in every text field of `config`.
    ///
    /// Keys may be given with or without braces. Placeholders without a
    /// value are left untouched.
    pub fn apply_substitutions(
        mut config: ModifierConfig,
        properties: &BTreeMap<String, String>,
    ) -> ModifierConfig {
        let placeholders: Vec<(String, &str)> = properties
            .iter()
            .filter(|(key, _)| !key.trim().is_empty())
            .map(|(key, value)| (placeholder(key), value.as_str()))
            .collect();
        if placeholders.is_empty() {
            return config;
        }
        debug!(count = placeholders.len(), "applying placeholder substitutions");

        let substitute = |text: &str| -> String {
            placeholders
                .iter()
                .fold(text.to_string(), |acc, (key, value)| acc.replace(key.as_str(), value))
        };
        for file in &mut config.files {
            file.map_text(&substitute);
        }
        config
    }
}

fn placeholder(key: &str) -> String {
    let key = key.trim();
    if key.starts_with('{') && key.ends_with('}') {
        key.to_string()
    } else {
        format!("{{{key}}}")
    }
}
