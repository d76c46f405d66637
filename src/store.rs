//! Resource store boundary
//!
//! The ordering layer never talks to the backend directly. A
//! [`ResourceStore`] serves snapshots and accepts single-field position
//! writes; write completion is reported back later through
//! `ReorderController::on_update_settled`.

use crate::error::{OrderingError, Result};
use crate::item::{ItemId, PositionedItem, ScopeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One position write, as handed to the store
///
/// Writes for different items may complete in any order. Applying the
/// same update twice leaves the same key, so retries by the store are safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    /// Correlates the completion callback with this write
    pub request_id: Uuid,
    pub scope: ScopeId,
    pub id: ItemId,
    pub position: f64,
}

impl PositionUpdate {
    pub fn new(scope: ScopeId, id: ItemId, position: f64) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            scope,
            id,
            position,
        }
    }
}

/// Backend collaborator
pub trait ResourceStore {
    /// Authoritative snapshot of a scope, in any order
    fn fetch_list(&mut self, scope: &ScopeId) -> Result<Vec<PositionedItem>>;

    /// Dispatch a write without waiting for it
    ///
    /// `Err` means the write could not even be issued; it is handled
    /// exactly like a rejected write.
    fn update_position(&mut self, update: &PositionUpdate) -> Result<()>;

    /// The next `fetch_list` for `scope` must bypass any cache
    fn invalidate(&mut self, scope: &ScopeId);
}

impl<S: ResourceStore + ?Sized> ResourceStore for &mut S {
    fn fetch_list(&mut self, scope: &ScopeId) -> Result<Vec<PositionedItem>> {
        (**self).fetch_list(scope)
    }

    fn update_position(&mut self, update: &PositionUpdate) -> Result<()> {
        (**self).update_position(update)
    }

    fn invalidate(&mut self, scope: &ScopeId) {
        (**self).invalidate(scope)
    }
}

/// In-memory store, for tests and offline demos
///
/// Writes are recorded as issued and only reach the canonical data when
/// [`MemoryStore::apply`] is called, which mirrors a backend that
/// acknowledges asynchronously.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: HashMap<ScopeId, Vec<PositionedItem>>,
    issued: Vec<PositionUpdate>,
    invalidations: Vec<ScopeId>,
    fetches: usize,
    reject_dispatch: bool,
    reject_item: Option<ItemId>,
    fail_fetch: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a scope's canonical items
    pub fn insert_list(&mut self, scope: ScopeId, items: Vec<PositionedItem>) {
        self.lists.insert(scope, items);
    }

    /// Canonical items of a scope
    pub fn list(&self, scope: &ScopeId) -> &[PositionedItem] {
        self.lists.get(scope).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mutable canonical items, for simulating edits made elsewhere
    pub fn list_mut(&mut self, scope: &ScopeId) -> &mut Vec<PositionedItem> {
        self.lists.entry(scope.clone()).or_default()
    }

    /// Writes handed to the store so far
    pub fn issued(&self) -> &[PositionUpdate] {
        &self.issued
    }

    pub fn invalidations(&self) -> &[ScopeId] {
        &self.invalidations
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Make `update_position` fail at dispatch
    pub fn set_reject_dispatch(&mut self, reject: bool) {
        self.reject_dispatch = reject;
    }

    /// Make `update_position` fail at dispatch for one item only
    pub fn set_reject_item(&mut self, id: Option<ItemId>) {
        self.reject_item = id;
    }

    /// Make `fetch_list` fail
    pub fn set_fail_fetch(&mut self, fail: bool) {
        self.fail_fetch = fail;
    }

    /// Persist an issued write into the canonical data
    pub fn apply(&mut self, update: &PositionUpdate) -> bool {
        let Some(items) = self.lists.get_mut(&update.scope) else {
            return false;
        };
        match items.iter_mut().find(|item| item.id == update.id) {
            Some(item) => {
                item.position = update.position;
                true
            }
            None => false,
        }
    }
}

impl ResourceStore for MemoryStore {
    fn fetch_list(&mut self, scope: &ScopeId) -> Result<Vec<PositionedItem>> {
        self.fetches += 1;
        if self.fail_fetch {
            return Err(OrderingError::Store(format!(
                "fetch failed for {}",
                scope
            )));
        }
        Ok(self.list(scope).to_vec())
    }

    fn update_position(&mut self, update: &PositionUpdate) -> Result<()> {
        if self.reject_dispatch || self.reject_item.as_ref() == Some(&update.id) {
            return Err(OrderingError::Persistence {
                id: update.id.clone(),
                reason: "store unavailable".to_string(),
            });
        }
        self.issued.push(update.clone());
        Ok(())
    }

    fn invalidate(&mut self, scope: &ScopeId) {
        self.invalidations.push(scope.clone());
    }
}
