//! Mapping file watcher for hot reload.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::store::load_mappings;

/// A parsed mapping set sent to the server on every successful reload.
pub type MappingUpdate = BTreeMap<String, String>;

/// A watcher that monitors the mapping file for changes.
pub struct MappingWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<MappingUpdate>,
}

impl MappingWatcher {
    /// Create a new MappingWatcher.
    ///
    /// Returns the watcher and a receiver for mapping updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<MappingUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The parent directory is watched so the file may be created or
    /// atomically replaced after startup. Keep the returned handle alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let file_name = path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if !touches_file {
                        return;
                    }

                    tracing::info!(path = ?path, "Mapping file change detected, reloading");
                    match load_mappings(&path) {
                        Ok(Some(mappings)) => {
                            let _ = tx.send(mappings);
                        }
                        Ok(None) => {
                            tracing::debug!(path = ?path, "Mapping file removed, keeping current mappings");
                        }
                        Err(e) => {
                            tracing::error!("Failed to reload mappings: {}. Keeping current mappings.", e);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(watch_dir(&self.path), RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Mapping watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
