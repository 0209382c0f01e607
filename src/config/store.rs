//! Persistent configuration storage.
//!
//! The engine never touches the filesystem directly; it goes through a
//! [`ConfigStore`]. Every mutation is written here first and only then
//! published to the live route table.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::config::loader::{load_dir, ConfigError, FEATURE_EXTENSION, GLOBAL_CONFIG_FILE};
use crate::config::schema::{ConfigSnapshot, FeatureGroup, GlobalConfig};

/// Storage backend for global settings and feature groups.
pub trait ConfigStore: Send + Sync + std::fmt::Debug {
    /// Read and validate the full configuration.
    fn load(&self) -> Result<ConfigSnapshot, ConfigError>;

    /// Persist one feature group, creating it if needed.
    fn save_feature(&self, feature: &FeatureGroup) -> Result<(), ConfigError>;

    /// Remove a feature group. Removing an unknown feature is not an error.
    fn delete_feature(&self, name: &str) -> Result<(), ConfigError>;

    /// Persist the global settings.
    fn save_global(&self, global: &GlobalConfig) -> Result<(), ConfigError>;
}

const DEFAULT_GLOBAL_CONFIG: &str = r#"[server]
host = "localhost"
port = 3000

[proxy]
target = "https://api.real-server.com"
change_origin = true
timeout_secs = 30

[[proxy.path_rewrite]]
pattern = "^/api"
replacement = ""

[observability]
log_level = "info"
log_format = "pretty"
metrics_enabled = false
metrics_address = "127.0.0.1:9090"

[admin]
enabled = true
bind_address = "127.0.0.1:3001"
api_key = ""
"#;

const EXAMPLE_FEATURE: &str = r#"{
  "feature": "example",
  "endpoints": [
    {
      "id": "hello-world",
      "method": "GET",
      "path": "/api/hello",
      "active": true,
      "defaultResponse": "standard",
      "responses": {
        "standard": {
          "status": 200,
          "headers": {
            "Content-Type": "application/json"
          },
          "body": {
            "message": "Hello, World!",
            "timestamp": "{{now}}"
          },
          "delay": 0
        }
      }
    }
  ]
}
"#;

/// A configuration directory: `config.toml` plus one JSON file per feature.
#[derive(Debug)]
pub struct DirStore {
    dir: PathBuf,
    /// Feature name -> file it was loaded from, so saves go back to the same file.
    sources: Mutex<HashMap<String, PathBuf>>,
}

impl DirStore {
    /// Open a configuration directory, creating and seeding it if missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();

        match fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(ConfigError::io(
                    &dir,
                    std::io::Error::new(ErrorKind::InvalidInput, "not a directory"),
                ))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&dir).map_err(|e| ConfigError::io(&dir, e))?;
                seed_defaults(&dir)?;
                tracing::info!(dir = %dir.display(), "Created default configuration");
            }
            Err(e) => return Err(ConfigError::io(&dir, e)),
        }

        Ok(Self {
            dir,
            sources: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn feature_path(&self, name: &str) -> PathBuf {
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.dir.join(format!("{}.{}", name, FEATURE_EXTENSION)))
    }
}

impl ConfigStore for DirStore {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
        let (snapshot, sources) = load_dir(&self.dir)?;
        *self.sources.lock().unwrap_or_else(PoisonError::into_inner) = sources.into_iter().collect();
        Ok(snapshot)
    }

    fn save_feature(&self, feature: &FeatureGroup) -> Result<(), ConfigError> {
        let path = self.feature_path(&feature.name);
        let mut data = serde_json::to_string_pretty(feature)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        data.push('\n');

        write_atomic(&path, data.as_bytes())?;
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(feature.name.clone(), path.clone());

        tracing::info!(feature = %feature.name, path = %path.display(), "Saved feature config");
        Ok(())
    }

    fn delete_feature(&self, name: &str) -> Result<(), ConfigError> {
        let path = self.feature_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ConfigError::io(&path, e)),
        }
        self.sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);

        tracing::info!(feature = %name, path = %path.display(), "Removed feature config");
        Ok(())
    }

    fn save_global(&self, global: &GlobalConfig) -> Result<(), ConfigError> {
        let path = self.dir.join(GLOBAL_CONFIG_FILE);
        let data = toml::to_string_pretty(global).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        write_atomic(&path, data.as_bytes())?;

        tracing::info!(path = %path.display(), "Saved global config");
        Ok(())
    }
}

fn seed_defaults(dir: &Path) -> Result<(), ConfigError> {
    let global = dir.join(GLOBAL_CONFIG_FILE);
    if !global.exists() {
        fs::write(&global, DEFAULT_GLOBAL_CONFIG).map_err(|e| ConfigError::io(&global, e))?;
    }
    let example = dir.join(format!("example.{}", FEATURE_EXTENSION));
    if !example.exists() {
        fs::write(&example, EXAMPLE_FEATURE).map_err(|e| ConfigError::io(&example, e))?;
    }
    Ok(())
}

/// Write through a sibling temp file and rename it over the target.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), ConfigError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, data).map_err(|e| ConfigError::io(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ConfigError::io(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_seeds_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let store = DirStore::open(root.path().join("mocks")).unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.global.server.port, 3000);
        assert_eq!(snapshot.global.proxy.path_rewrite.len(), 1);
        assert_eq!(snapshot.features.len(), 1);
        assert_eq!(snapshot.features[0].endpoints[0].id, "hello-world");
    }

    #[test]
    fn open_rejects_plain_file() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("mocks");
        fs::write(&file, "").unwrap();
        assert!(DirStore::open(&file).is_err());
    }

    #[test]
    fn saves_back_to_the_loaded_file() {
        let root = tempfile::tempdir().unwrap();
        let store = DirStore::open(root.path().join("mocks")).unwrap();
        fs::rename(store.dir().join("example.json"), store.dir().join("10-example.json")).unwrap();

        let mut snapshot = store.load().unwrap();
        let feature = &mut snapshot.features[0];
        feature.endpoints[0].active = false;
        store.save_feature(feature).unwrap();

        assert!(!store.dir().join("example.json").exists());
        let reloaded = store.load().unwrap();
        assert!(!reloaded.features[0].endpoints[0].active);
        assert!(!store.dir().join("10-example.json.tmp").exists());
    }

    #[test]
    fn global_round_trips_through_toml() {
        let root = tempfile::tempdir().unwrap();
        let store = DirStore::open(root.path().join("mocks")).unwrap();

        let mut global = store.load().unwrap().global;
        global.proxy.target = "http://127.0.0.1:4000".to_string();
        store.save_global(&global).unwrap();

        assert_eq!(store.load().unwrap().global, global);
    }

    #[test]
    fn delete_removes_file_and_tolerates_missing() {
        let root = tempfile::tempdir().unwrap();
        let store = DirStore::open(root.path().join("mocks")).unwrap();
        store.load().unwrap();

        store.delete_feature("example").unwrap();
        assert!(!store.dir().join("example.json").exists());
        store.delete_feature("example").unwrap();
    }
}
