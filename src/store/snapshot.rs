//! Whole-file JSON snapshot storage for one entity type.
//!
//! Every operation is a full load of the snapshot, a logical mutation of the
//! decoded map, and a full store back to disk. That makes the file layout
//! trivial (one JSON object per entity type) but turns every operation into a
//! check-then-act sequence over shared state, so all access goes through one
//! `RwLock` per store: writers hold the exclusive lock for the entire
//! load-mutate-store span, and read-only operations share the lock among
//! themselves but never overlap a writer.
//!
//! Compound operations that must be atomic (duplicate-key checks, conditional
//! edits, the post removal cascade) run inside a single [`SnapshotStore::update`]
//! critical section rather than stitching together individual calls.

use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CorkboardError, Result};

/// Durable key-to-record map for one entity type, backed by one JSON file.
pub struct SnapshotStore<K, V> {
    path: PathBuf,
    lock: RwLock<()>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> SnapshotStore<K, V>
where
    K: Eq + Hash + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Opens the store at `path`, creating an empty snapshot if none exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            path,
            lock: RwLock::new(()),
            _marker: PhantomData,
        };

        if !store.path.exists() {
            store.persist(&HashMap::new())?;
        }

        Ok(store)
    }

    /// Runs a read-only closure against the current snapshot.
    ///
    /// Readers may run concurrently with each other but not with writers.
    pub fn read<R>(&self, f: impl FnOnce(&HashMap<K, V>) -> R) -> Result<R> {
        let _guard = self.lock.read().unwrap_or_else(|e| e.into_inner());
        let map = self.load()?;
        Ok(f(&map))
    }

    /// Runs a mutating closure against the snapshot inside the exclusive
    /// critical section, persisting the result only when the closure returns
    /// `Ok`. On `Err` the in-memory changes are discarded and the snapshot on
    /// disk is left untouched.
    pub fn update<R>(&self, f: impl FnOnce(&mut HashMap<K, V>) -> Result<R>) -> Result<R> {
        let _guard = self.lock.write().unwrap_or_else(|e| e.into_inner());
        let mut map = self.load()?;
        let out = f(&mut map)?;
        self.persist(&map)?;
        Ok(out)
    }

    /// Returns the record stored under `key`, if any.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.read(|map| map.get(key).cloned())
    }

    /// Inserts or replaces the record stored under `key`.
    pub fn put(&self, key: K, value: V) -> Result<()> {
        self.update(|map| {
            map.insert(key, value);
            Ok(())
        })
    }

    /// Removes the record stored under `key`, reporting whether it existed.
    pub fn remove(&self, key: &K) -> Result<bool> {
        self.update(|map| Ok(map.remove(key).is_some()))
    }

    /// Returns every stored record. Order is unspecified but stable within
    /// one snapshot.
    pub fn values(&self) -> Result<Vec<V>> {
        self.read(|map| map.values().cloned().collect())
    }

    fn load(&self) -> Result<HashMap<K, V>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let bytes = fs::read(&self.path)?;
        if bytes.is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            CorkboardError::storage(format!(
                "Failed to decode snapshot {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn persist(&self, map: &HashMap<K, V>) -> Result<()> {
        let json = serde_json::to_vec_pretty(map)
            .map_err(|e| CorkboardError::serialization(format!("Failed to encode snapshot: {}", e)))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
