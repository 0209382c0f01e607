//! Configuration directory watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{FEATURE_EXTENSION, GLOBAL_CONFIG_FILE};

/// Watches a configuration directory and reports changed config files.
///
/// Loading is left to the receiver so it happens under the engine's writer
/// lock, ordered with in-process mutations.
pub struct ConfigWatcher {
    dir: PathBuf,
    change_tx: mpsc::UnboundedSender<Vec<PathBuf>>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for change notifications.
    pub fn new(dir: &Path) -> (Self, mpsc::UnboundedReceiver<Vec<PathBuf>>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        (
            Self {
                dir: dir.to_path_buf(),
                change_tx,
            },
            change_rx,
        )
    }

    /// Sender for reload requests that do not come from the filesystem.
    pub fn notifier(&self) -> mpsc::UnboundedSender<Vec<PathBuf>> {
        self.change_tx.clone()
    }

    /// Start watching the directory in a background thread.
    ///
    /// The returned handle must be kept alive for as long as events are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove();
                    let paths: Vec<PathBuf> = event
                        .paths
                        .into_iter()
                        .filter(|p| is_config_file(p))
                        .collect();
                    if relevant && !paths.is_empty() {
                        tracing::debug!(paths = ?paths, "Config change detected");
                        let _ = tx.send(paths);
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;

        tracing::info!(dir = ?self.dir, "Config watcher started");
        Ok(watcher)
    }
}

/// Only feature files and the global file trigger a reload; temp files do not.
fn is_config_file(path: &Path) -> bool {
    let is_global = path.file_name().is_some_and(|name| name == GLOBAL_CONFIG_FILE);
    let is_feature = path.extension().is_some_and(|ext| ext == FEATURE_EXTENSION);
    is_global || is_feature
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_config_files_are_relevant() {
        assert!(is_config_file(Path::new("/m/config.toml")));
        assert!(is_config_file(Path::new("/m/users.json")));
        assert!(!is_config_file(Path::new("/m/users.json.tmp")));
        assert!(!is_config_file(Path::new("/m/notes.md")));
    }
}
