//! Concurrent path → destination map.
//!
//! # Design Decisions
//! - One `RwLock<HashMap>`: lookups and snapshots share the read side,
//!   `add` holds the write side only for the single insert
//! - Snapshots are owned `BTreeMap` copies, sorted for stable output
//! - The store never validates input; callers reject empty values first

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe store of redirect mappings.
///
/// Cloning is cheap and yields a handle to the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct PathStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl PathStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        store.extend(entries);
        store
    }

    /// Destination currently mapped to `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<String> {
        self.read().get(path).cloned()
    }

    /// Insert or overwrite the mapping for `path`.
    pub fn add(&self, path: impl Into<String>, destination: impl Into<String>) {
        let path = path.into();
        let destination = destination.into();
        self.write().insert(path, destination);
    }

    /// Insert a batch of mappings under a single write lock.
    ///
    /// Readers observe either none or all of the batch.
    pub fn extend<I, K, V>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        // Convert before locking so the critical section is only the inserts.
        let entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let count = entries.len();
        self.write().extend(entries);
        count
    }

    /// Point-in-time copy of every mapping.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry
    // (HashMap::insert is the only mutation), so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, String>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, String>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
