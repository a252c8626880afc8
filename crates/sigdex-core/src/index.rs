//! The in-memory signature index and its publication slot.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::models::IndexEntry;

/// Entries of one full scan, in discovery order. Read-only once built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    pub(crate) fn from_entries(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }
}

/// Holder for the currently published index.
///
/// A new index is built off to the side and swapped in whole by
/// [`IndexSlot::publish`]; readers holding an older snapshot keep it alive
/// until they drop it.
#[derive(Debug, Default)]
pub struct IndexSlot {
    current: RwLock<Option<Arc<Index>>>,
}

impl IndexSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published index, returning the previous one.
    pub fn publish(&self, index: Index) -> Option<Arc<Index>> {
        self.current.write().replace(Arc::new(index))
    }

    pub fn snapshot(&self) -> Option<Arc<Index>> {
        self.current.read().clone()
    }

    pub fn clear(&self) -> Option<Arc<Index>> {
        self.current.write().take()
    }
}
