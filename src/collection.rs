//! Ordered Collection: a scope's items kept sorted by position
//!
//! Items are stored already sorted (position, then id), so the sorted
//! view is the backing slice itself and visual indices are slice indices.

use crate::error::{OrderingError, Result};
use crate::item::{ItemId, PositionedItem, ScopeId};
use serde::{Deserialize, Serialize};

/// The items of one ordering scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedList {
    scope: ScopeId,
    items: Vec<PositionedItem>,
}

impl OrderedList {
    /// Build from an authoritative snapshot in any order
    pub fn from_snapshot(scope: ScopeId, mut items: Vec<PositionedItem>) -> Self {
        items.sort_by(|a, b| a.sort_cmp(b));
        Self { scope, items }
    }

    /// Empty list for a scope
    pub fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            items: Vec::new(),
        }
    }

    pub fn scope(&self) -> &ScopeId {
        &self.scope
    }

    /// Items ascending by position, ties broken by id
    pub fn sorted_view(&self) -> &[PositionedItem] {
        &self.items
    }

    /// Visual index of an item
    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&PositionedItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys of all items except `id`, in visual order
    ///
    /// This is the sequence the allocator reasons about when `id` moves.
    pub fn positions_without(&self, id: &ItemId) -> Vec<f64> {
        self.items
            .iter()
            .filter(|item| &item.id != id)
            .map(|item| item.position)
            .collect()
    }

    /// All keys in visual order
    pub fn positions(&self) -> Vec<f64> {
        self.items.iter().map(|item| item.position).collect()
    }

    /// The sequence with `id` relocated to `new_index`
    ///
    /// Positions are left untouched; assigning the new key is the
    /// allocator's job.
    pub fn with_move(&self, id: &ItemId, new_index: usize) -> Result<Vec<PositionedItem>> {
        let old_index = self
            .index_of(id)
            .ok_or_else(|| OrderingError::ItemNotFound(id.clone()))?;
        if new_index >= self.items.len() {
            return Err(OrderingError::IndexOutOfBounds {
                index: new_index,
                length: self.items.len(),
            });
        }

        let mut moved = self.items.clone();
        let item = moved.remove(old_index);
        moved.insert(new_index, item);
        Ok(moved)
    }

    /// Replace the sequence after an optimistic move
    ///
    /// `items` must already be in the intended visual order; the list is
    /// re-sorted so that a colliding key still yields a deterministic view.
    pub(crate) fn replace(&mut self, mut items: Vec<PositionedItem>) {
        items.sort_by(|a, b| a.sort_cmp(b));
        self.items = items;
    }

    /// Overwrite one item's key and restore sort order
    pub fn set_position(&mut self, id: &ItemId, position: f64) -> Result<()> {
        let item = self
            .items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| OrderingError::ItemNotFound(id.clone()))?;
        item.position = position;
        self.items.sort_by(|a, b| a.sort_cmp(b));
        Ok(())
    }

    /// True if any two adjacent keys are equal
    pub fn has_collisions(&self) -> bool {
        self.items
            .windows(2)
            .any(|pair| pair[0].position == pair[1].position)
    }
}
