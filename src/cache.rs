use crate::endpoint::Endpoint;
use std::any::Any;
use std::collections::BTreeMap;

/// Most recently parsed value per endpoint
///
/// Entries are keyed by endpoint path and hold whatever value type that
/// endpoint parses into. Reading an entry with a different type than it was
/// stored with is a miss.
#[derive(Default)]
pub struct ConfigurationCache {
    entries: BTreeMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl ConfigurationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `endpoint`, if present and of type `T`
    pub fn get<T: Any + Clone>(&self, endpoint: &Endpoint) -> Option<T> {
        self.entries
            .get(endpoint.path())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, endpoint: &Endpoint, value: T) {
        self.entries.insert(endpoint.path(), Box::new(value));
    }

    /// Applies `f` to the cached value in place; false when there is no entry of type `T`
    pub fn update<T: Any, F: FnOnce(&mut T)>(&mut self, endpoint: &Endpoint, f: F) -> bool {
        match self
            .entries
            .get_mut(endpoint.path())
            .and_then(|v| v.downcast_mut::<T>())
        {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.entries.contains_key(endpoint.path())
    }

    pub fn remove(&mut self, endpoint: &Endpoint) -> bool {
        self.entries.remove(endpoint.path()).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Endpoint paths that currently have an entry
    pub fn paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

impl std::fmt::Debug for ConfigurationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationCache")
            .field("paths", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
