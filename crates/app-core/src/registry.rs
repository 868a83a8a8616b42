//! # Named Registry
//!
//! The storage shared by the module, service and schema registries: a name-keyed map
//! that remembers registration order.
//!
//! Re-registering a name replaces the stored entry but keeps its original position,
//! so `list()` never reports a name twice.
//!
//! Readers get clones of the stored handles (usually `Arc`s). Lifecycle loops iterate
//! over a [`Registry::snapshot`] so that no lock is held while a unit is awaited; a
//! unit is then free to call back into any registry.

use indexmap::IndexMap;
use parking_lot::RwLock;

pub struct Registry<T: Clone> {
    kind: &'static str,
    entries: RwLock<IndexMap<String, T>>,
}

impl<T: Clone> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Stores `entry` under `name`. Returns `true` when an earlier entry was replaced.
    pub fn register(&self, name: impl Into<String>, entry: T) -> bool {
        let name = name.into();
        let replaced = self.entries.write().insert(name.clone(), entry).is_some();
        if replaced {
            tracing::warn!(kind = self.kind, %name, "Overwriting existing registration");
        } else {
            tracing::debug!(kind = self.kind, %name, "Registered");
        }
        replaced
    }

    pub fn get(&self, name: &str) -> Option<T> {
        self.entries.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn list(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Point-in-time copy of all entries, in registration order.
    pub fn snapshot(&self) -> Vec<(String, T)> {
        self.entries
            .read()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_position_and_single_entry() {
        let registry = Registry::<u32>::new("test");
        assert!(!registry.register("projects", 1));
        assert!(!registry.register("crm", 2));
        assert!(registry.register("projects", 3));

        assert_eq!(registry.list(), vec!["projects", "crm"]);
        assert_eq!(registry.get("projects"), Some(3));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn missing_name_is_none() {
        let registry = Registry::<u32>::new("test");
        assert!(registry.get("nonexistent").is_none());
        assert!(!registry.contains("nonexistent"));
        assert!(registry.is_empty());
    }
}
