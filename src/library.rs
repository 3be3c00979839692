//! Shared-library object lookup.
//!
//! Tileset loaders fill this in before any save; the codec only reads it.

use ahash::AHashMap;

pub trait ObjectLibrary {
    /// Tile data of a shared object, if the library has it.
    fn tile_data(&self, key: &str) -> Option<&[u8]>;

    fn contains(&self, key: &str) -> bool {
        self.tile_data(key).is_some()
    }
}

/// Library that knows no shared objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLibrary;

impl ObjectLibrary for EmptyLibrary {
    fn tile_data(&self, _key: &str) -> Option<&[u8]> {
        None
    }
}

/// In-memory library keyed by object identifier.
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    objects: AHashMap<String, Vec<u8>>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, tile_data: Vec<u8>) {
        self.objects.insert(key.into(), tile_data);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectLibrary for MemoryLibrary {
    fn tile_data(&self, key: &str) -> Option<&[u8]> {
        self.objects.get(key).map(Vec::as_slice)
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<u8>)> for MemoryLibrary {
    fn from_iter<I: IntoIterator<Item = (K, Vec<u8>)>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
