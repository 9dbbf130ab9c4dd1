//! Startup orchestration.
//!
//! Config first, then the store, then the optional mapping watcher.
//! Listeners are bound last by the caller so traffic only arrives once
//! the store is populated.

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use crate::config::{MappingUpdate, MappingWatcher, RedirectConfig};
use crate::store::{bootstrap, BootstrapSource, PathStore};

/// Everything the server needs that is built before binding.
pub struct Startup {
    pub store: PathStore,
    pub source: BootstrapSource,
    pub updates: mpsc::UnboundedReceiver<MappingUpdate>,
    /// Dropping this stops hot reload.
    pub watcher: Option<RecommendedWatcher>,
}

/// Build and populate the store, and start watching the mapping file if enabled.
///
/// A watcher that fails to start is logged; the service still runs with
/// the mappings it loaded.
pub fn initialize(config: &RedirectConfig) -> Startup {
    let store = PathStore::new();
    let source = bootstrap(&store, &config.mappings);

    let (watcher, updates) = match (&config.mappings.file, config.mappings.watch) {
        (Some(path), true) => {
            let (watcher, updates) = MappingWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (Some(handle), updates),
                Err(e) => {
                    tracing::error!(path = ?path, error = %e, "Failed to start mapping watcher");
                    (None, updates)
                }
            }
        }
        _ => {
            // Sender dropped immediately: the server sees a closed channel.
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    Startup {
        store,
        source,
        updates,
        watcher,
    }
}
