//! Concurrency-safe accumulator for items processed in one batch.
//!
//! # Invariants
//! - Insert is atomic per key; concurrent inserts of distinct ids are never lost.
//! - Re-inserting an id overwrites the previous entry.
//! - Reads are point-in-time copies; iteration order carries no meaning.

use crate::model::item::{Item, ItemId};
use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct ResultStore {
    entries: DashMap<ItemId, Item>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `item` as processed under `id`, replacing any earlier entry.
    pub fn insert(&self, id: ItemId, item: Item) {
        self.entries.insert(id, item);
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clones every current entry.
    pub fn snapshot(&self) -> Vec<Item> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Consumes the store and hands back its items without cloning.
    pub fn into_items(self) -> Vec<Item> {
        self.entries.into_iter().map(|(_, item)| item).collect()
    }
}
