use std::collections::HashMap;

use super::Handle;

/// Name-keyed store that builds each entry at most once.
///
/// Entries are never removed individually; the whole cache is dropped with
/// the resource manager.
pub struct ModelCache<T> {
    items: Vec<T>,
    by_name: HashMap<String, Handle<T>>,
    uploads: usize,
}

impl<T> ModelCache<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            by_name: HashMap::new(),
            uploads: 0,
        }
    }

    /// Returns the handle for `name`, calling `build` only on first sight.
    pub fn get_or_insert_with(&mut self, name: &str, build: impl FnOnce() -> T) -> Handle<T> {
        if let Some(handle) = self.by_name.get(name) {
            return *handle;
        }
        let handle = Handle::new(self.items.len());
        self.items.push(build());
        self.by_name.insert(name.to_string(), handle);
        self.uploads += 1;
        handle
    }

    pub fn lookup(&self, name: &str) -> Option<Handle<T>> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index())
    }

    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.lookup(name).and_then(|handle| self.get(handle))
    }

    /// How many times a build closure actually ran.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.by_name.clear();
    }
}

impl<T> Default for ModelCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
