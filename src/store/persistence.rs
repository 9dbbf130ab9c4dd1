//! Mapping file loading, bootstrap and snapshot persistence.
//!
//! The on-disk format is a flat JSON object: `{"/path": "https://dest"}`.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::MappingsConfig;
use crate::observability::metrics;
use crate::store::PathStore;

/// Error type for mapping file operations.
#[derive(Debug, thiserror::Error)]
pub enum MappingFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Mapping with empty path or destination (path: {path:?})")]
    EmptyEntry { path: String },
}

/// Where the initial store contents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapSource {
    File,
    Defaults,
    Empty,
    /// The file exists but could not be loaded; defaults (if enabled) were used.
    Fallback,
}

impl BootstrapSource {
    /// Whether writing the store back to the mapping file is safe.
    ///
    /// False when the file on disk was unreadable, so a shutdown snapshot
    /// never replaces entries the service failed to load.
    pub fn allows_persistence(self) -> bool {
        !matches!(self, BootstrapSource::Fallback)
    }
}

/// Built-in mappings used when no mapping file is available.
pub fn default_mappings() -> BTreeMap<String, String> {
    [
        ("/github", "https://github.com"),
        ("/google", "https://google.com"),
        ("/stackoverflow", "https://stackoverflow.com"),
        ("/urlshort", "https://github.com/gophercises/urlshort"),
        ("/urlshort-final", "https://github.com/gophercises/urlshort/tree/solution"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Read and validate a mapping file.
///
/// Returns `Ok(None)` when the file does not exist. The whole file is
/// validated before anything is returned, so callers never apply a partial set.
pub fn load_mappings(path: &Path) -> Result<Option<BTreeMap<String, String>>, MappingFileError> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    let mappings: BTreeMap<String, String> = serde_json::from_reader(BufReader::new(file))?;

    if let Some((path, _)) = mappings.iter().find(|(k, v)| k.is_empty() || v.is_empty()) {
        return Err(MappingFileError::EmptyEntry { path: path.clone() });
    }

    Ok(Some(mappings))
}

/// Write a snapshot to disk.
///
/// Writes to a sibling temp file first and renames it into place.
pub fn save_mappings(path: &Path, mappings: &BTreeMap<String, String>) -> Result<(), MappingFileError> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, mappings)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;

    tracing::info!(path = ?path, count = mappings.len(), "Saved mappings to file");
    Ok(())
}

/// Populate `store` from the configured file, falling back to defaults.
///
/// A missing or malformed file never aborts startup.
pub fn bootstrap(store: &PathStore, config: &MappingsConfig) -> BootstrapSource {
    let mut unreadable = false;
    if let Some(path) = &config.file {
        match load_mappings(path) {
            Ok(Some(mappings)) => {
                let count = store.extend(mappings);
                metrics::record_mappings_added("bootstrap", count);
                metrics::record_store_size(store.len());
                tracing::info!(path = ?path, count, "Loaded mappings from file");
                return BootstrapSource::File;
            }
            Ok(None) => {
                tracing::info!(path = ?path, "Mapping file not found, using defaults");
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Ignoring malformed mapping file");
                unreadable = true;
            }
        }
    }

    if config.seed_defaults {
        let count = store.extend(default_mappings());
        metrics::record_mappings_added("bootstrap", count);
        metrics::record_store_size(store.len());
        tracing::info!(count, "Seeded default mappings");
    }

    match (unreadable, config.seed_defaults) {
        (true, _) => BootstrapSource::Fallback,
        (false, true) => BootstrapSource::Defaults,
        (false, false) => BootstrapSource::Empty,
    }
}
