use std::marker::PhantomData;

use crate::renderer::{Mesh, Texture};

/// Typed index into a [`Store`]. Cheap to copy, stable for the process
/// lifetime (assets are created once at startup and never removed).
#[derive(Debug)]
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Handle<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Append-only asset storage. A stale or out-of-range handle resolves to
/// `None`; callers skip the draw and log rather than crash.
pub struct Store<T> {
    items: Vec<T>,
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn insert(&mut self, item: T) -> Handle<T> {
        let handle = Handle::new(self.items.len());
        self.items.push(item);
        handle
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index)
    }

    pub fn get_by_index(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
pub struct Assets {
    pub meshes: Store<Mesh>,
    pub textures: Store<Texture>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_resolve_in_insertion_order() {
        let mut store = Store::new();
        let a = store.insert("ground");
        let b = store.insert("building");
        assert_eq!(store.get(a), Some(&"ground"));
        assert_eq!(store.get(b), Some(&"building"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn foreign_handle_resolves_to_none() {
        let mut small = Store::new();
        let mut big = Store::new();
        small.insert(1);
        big.insert(1);
        let far = big.insert(2);
        // Handles are plain indices; an index past the end is just None.
        assert_eq!(small.get(far), None);
    }
}
