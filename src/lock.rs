//! Per-Item Update Lock
//!
//! Tracks which items have a position write in flight. The lock is
//! advisory: it only disables the drag handle of the affected item, every
//! other item stays draggable.
//!
//! An entry is created when a write is issued and leaves the set either
//! when its grace period after a successful write runs out ([`UpdateLock::expire`])
//! or immediately on failure ([`UpdateLock::release`]).

use crate::clock::Timestamp;
use crate::error::{OrderingError, Result};
use crate::item::ItemId;
use crate::optimistic::Optimistic;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Items awaiting confirmation of a persisted move
#[derive(Debug, Clone, Default)]
pub struct UpdateLock {
    pending: HashMap<ItemId, Optimistic<f64>>,
}

impl UpdateLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `id`; at most one pending write per item
    pub fn acquire(
        &mut self,
        id: ItemId,
        request_id: Uuid,
        position: f64,
        previous: f64,
        now: Timestamp,
    ) -> Result<()> {
        if self.pending.contains_key(&id) {
            return Err(OrderingError::ItemLocked(id));
        }
        self.pending
            .insert(id, Optimistic::apply(request_id, position, previous, now));
        Ok(())
    }

    /// Start the grace period for the write identified by `request_id`
    ///
    /// Returns the item it belonged to, or `None` for an unknown request.
    pub fn confirm(&mut self, request_id: Uuid, now: Timestamp, grace: Duration) -> Option<ItemId> {
        let id = self.holder(request_id)?;
        let change = self.pending.get_mut(&id)?;
        change.confirm(now, grace).then_some(id)
    }

    /// Drop the lock for `id` unconditionally
    pub fn release(&mut self, id: &ItemId) -> Option<Optimistic<f64>> {
        self.pending.remove(id)
    }

    /// Release every lock whose grace period has elapsed
    pub fn expire(&mut self, now: Timestamp) -> Vec<ItemId> {
        let mut released = Vec::new();
        self.pending.retain(|id, change| {
            if change.is_settled(now) {
                released.push(id.clone());
                return false;
            }
            true
        });
        released.sort();
        released
    }

    pub fn is_locked(&self, id: &ItemId) -> bool {
        self.pending.contains_key(id)
    }

    /// Optimistic key of a locked item
    pub fn pending_position(&self, id: &ItemId) -> Option<f64> {
        self.pending.get(id).map(|change| *change.value())
    }

    /// Item whose write carries `request_id`
    pub fn holder(&self, request_id: Uuid) -> Option<ItemId> {
        self.pending
            .iter()
            .find(|(_, change)| change.request_id() == request_id)
            .map(|(id, _)| id.clone())
    }

    pub fn get(&self, id: &ItemId) -> Option<&Optimistic<f64>> {
        self.pending.get(id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Locked ids, sorted
    pub fn locked_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.pending.keys().cloned().collect();
        ids.sort();
        ids
    }
}
