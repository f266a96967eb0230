use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid include pattern \"{pattern}\": {source}")]
    IncludePatternError {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Invalid options table for \"{owner}\": {source}")]
    InvalidOptions {
        owner: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSettings,
    /// Glob patterns of extra files contributing `[[types]]`, relative to the config file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Type used when no guesser can suggest one for a property
    #[serde(default = "default_fallback_type")]
    pub fallback_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fallback_type: default_fallback_type(),
            log_level: None,
        }
    }
}

fn default_fallback_type() -> String {
    "text".to_string()
}

/// A block type described purely by data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Option defaults, overriding the ones inherited from the parent type
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub options: toml::Table,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDeclaration {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub options: toml::Table,
}

impl TypeDeclaration {
    /// Deserialize the option table into the caller's option representation.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        decode_table(&self.name, &self.options)
    }
}

impl ChildDeclaration {
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        decode_table(&self.name, &self.options)
    }
}

fn decode_table<T: DeserializeOwned>(owner: &str, table: &toml::Table) -> Result<T, ConfigError> {
    toml::Value::Table(table.clone())
        .try_into()
        .map_err(|source| ConfigError::InvalidOptions {
            owner: owner.to_string(),
            source,
        })
}

/// Shape of an included file: only type declarations are merged.
#[derive(Debug, Default, Deserialize)]
struct IncludedTypes {
    #[serde(default)]
    types: Vec<TypeDeclaration>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let mut config: Config = read_toml(config_path)?;

        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        for path in Self::expand_includes(&config.include, &base_dir)? {
            let included: IncludedTypes = read_toml(&path)?;
            config.types.extend(included.types);
        }

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockwork");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Find the declaration of a type by name; later declarations win.
    pub fn type_declaration(&self, name: &str) -> Option<&TypeDeclaration> {
        self.types.iter().rev().find(|declaration| declaration.name == name)
    }

    fn expand_includes(patterns: &[String], base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        for pattern in patterns {
            let expanded = Self::expand_path(Path::new(pattern)).unwrap_or_else(|| pattern.into());
            let absolute = if expanded.is_absolute() {
                expanded
            } else {
                base_dir.join(expanded)
            };

            let matches =
                glob::glob(&absolute.to_string_lossy()).map_err(|source| {
                    ConfigError::IncludePatternError {
                        pattern: pattern.clone(),
                        source,
                    }
                })?;
            // Unreadable directory entries are skipped, as the shell would
            let mut matched: Vec<PathBuf> = matches.filter_map(Result::ok).collect();
            matched.sort();
            files.extend(matched);
        }
        Ok(files)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigReadError {
            config_path: path.to_path_buf(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
        config_path: path.to_path_buf(),
        source,
    })
}
