//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{ConfigSnapshot, FeatureGroup, GlobalConfig};
use crate::config::validation::{validate_snapshot, ValidationError};

/// File holding the global settings inside a configuration directory.
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

/// Extension of feature files.
pub const FEATURE_EXTENSION: &str = "json";

/// Error type for configuration loading and persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("parse error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(String),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConfigError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Load the global settings from a TOML file.
pub fn load_global(path: &Path) -> Result<GlobalConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one feature group from a JSON file.
pub fn load_feature(path: &Path) -> Result<FeatureGroup, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Feature files in a directory, sorted by file name.
pub fn feature_files(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = fs::read_dir(dir).map_err(|e| ConfigError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ConfigError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == FEATURE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load and validate a whole configuration directory.
///
/// Returns the snapshot together with the file each feature came from.
pub fn load_dir(dir: &Path) -> Result<(ConfigSnapshot, Vec<(String, PathBuf)>), ConfigError> {
    let global = load_global(&dir.join(GLOBAL_CONFIG_FILE))?;

    let mut features = Vec::new();
    let mut sources = Vec::new();
    for path in feature_files(dir)? {
        let feature = load_feature(&path)?;
        tracing::debug!(feature = %feature.name, path = %path.display(), "Loaded feature");
        sources.push((feature.name.clone(), path));
        features.push(feature);
    }

    let snapshot = ConfigSnapshot { global, features };
    validate_snapshot(&snapshot).map_err(ConfigError::Validation)?;

    Ok((snapshot, sources))
}
