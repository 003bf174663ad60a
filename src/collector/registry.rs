//! Name-keyed registry of collectors and their runtime status

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::error::CollectorError;
use super::status::CollectorStatus;
use super::Collector;

/// Both maps live behind one lock so their domains can never drift apart.
struct Inner {
    collectors: HashMap<String, Arc<dyn Collector>>,
    statuses: HashMap<String, CollectorStatus>,
}

/// Concurrency-safe, name-keyed registry of collectors and their status.
///
/// A single reader-writer lock protects both maps: readers never block
/// readers, and every value handed back to a caller (a status, a name
/// list) is a fresh copy rather than an alias into the registry.
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                collectors: HashMap::new(),
                statuses: HashMap::new(),
            }),
        }
    }

    /// Register a collector under its own name.
    ///
    /// Fails with `DuplicateName` if the name is already present. On
    /// success, creates a status record with `healthy = true` and all
    /// counters zeroed.
    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<(), CollectorError> {
        let name = collector.name().to_string();
        let mut inner = self.inner.write().expect("registry lock poisoned");

        if inner.collectors.contains_key(&name) {
            warn!(name = %name, "register: duplicate collector name");
            return Err(CollectorError::DuplicateName(name));
        }

        inner.statuses.insert(name.clone(), CollectorStatus::new(&name));
        inner.collectors.insert(name.clone(), collector);
        debug!(name = %name, "register: collector added");
        Ok(())
    }

    /// Remove a collector and its status. No-op if absent; never fails.
    pub fn unregister(&self, name: &str) {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        inner.collectors.remove(name);
        inner.statuses.remove(name);
        debug!(name = %name, "unregister: collector removed");
    }

    /// Fetch the collector registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Collector>> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.collectors.get(name).cloned()
    }

    /// Fetch a copy of the status record for `name`.
    pub fn status(&self, name: &str) -> Option<CollectorStatus> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner.statuses.get(name).cloned()
    }

    /// Names of all registered collectors, sorted lexicographically.
    pub fn list(&self) -> Vec<String> {
        let inner = self.inner.read().expect("registry lock poisoned");
        let mut names: Vec<String> = inner.collectors.keys().cloned().collect();
        names.sort();
        names
    }

    /// Copies of all status records, sorted by name.
    pub fn all_status(&self) -> Vec<CollectorStatus> {
        let inner = self.inner.read().expect("registry lock poisoned");
        let mut statuses: Vec<CollectorStatus> = inner.statuses.values().cloned().collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Apply a mutation to the stored status under the write lock. No-op if
    /// the collector is absent.
    pub fn update_status<F>(&self, name: &str, mutator: F)
    where
        F: FnOnce(&mut CollectorStatus),
    {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        if let Some(status) = inner.statuses.get_mut(name) {
            mutator(status);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
