//! One controller per ordering scope over a shared store
//!
//! A course page shows the course's topics and, inside each topic, its
//! activities. Every one of those lists is its own scope with its own
//! controller, so keys and locks never leak between them.

use crate::clock::Timestamp;
use crate::config::OrderingConfig;
use crate::controller::{DropOutcome, DropTarget, ReorderController};
use crate::error::{OrderingError, Result};
use crate::item::{ItemId, ScopeId};
use crate::store::{PositionUpdate, ResourceStore};
use std::collections::HashMap;
use uuid::Uuid;

/// Open scopes sharing one resource store
#[derive(Debug)]
pub struct Workspace<S: ResourceStore> {
    store: S,
    config: OrderingConfig,
    controllers: HashMap<ScopeId, ReorderController>,
}

impl<S: ResourceStore> Workspace<S> {
    pub fn new(store: S, config: OrderingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            controllers: HashMap::new(),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Load a scope, or return it if already open
    pub fn open(&mut self, scope: &ScopeId, now: Timestamp) -> Result<&mut ReorderController> {
        if !self.controllers.contains_key(scope) {
            let controller =
                ReorderController::open(&mut self.store, scope.clone(), self.config.clone(), now)?;
            tracing::debug!(scope = %scope, items = controller.sorted_view().len(), "scope opened");
            self.controllers.insert(scope.clone(), controller);
        }
        self.controller_mut(scope)
    }

    /// Forget a scope; pending writes still complete at the store
    pub fn close(&mut self, scope: &ScopeId) -> Option<ReorderController> {
        self.controllers.remove(scope)
    }

    pub fn controller(&self, scope: &ScopeId) -> Result<&ReorderController> {
        self.controllers
            .get(scope)
            .ok_or_else(|| OrderingError::ScopeNotOpen(scope.clone()))
    }

    pub fn controller_mut(&mut self, scope: &ScopeId) -> Result<&mut ReorderController> {
        self.controllers
            .get_mut(scope)
            .ok_or_else(|| OrderingError::ScopeNotOpen(scope.clone()))
    }

    /// Open scopes, in no particular order
    pub fn scopes(&self) -> impl Iterator<Item = &ScopeId> {
        self.controllers.keys()
    }

    pub fn drag_start(&mut self, scope: &ScopeId, id: &ItemId) -> Result<()> {
        self.controller_mut(scope)?.drag_start(id)
    }

    pub fn drag_end(
        &mut self,
        scope: &ScopeId,
        target: Option<DropTarget>,
        now: Timestamp,
    ) -> Result<DropOutcome> {
        let controller = self
            .controllers
            .get_mut(scope)
            .ok_or_else(|| OrderingError::ScopeNotOpen(scope.clone()))?;
        controller.drag_end(&mut self.store, target, now)
    }

    pub fn on_reorder(
        &mut self,
        scope: &ScopeId,
        id: &ItemId,
        new_index: usize,
        now: Timestamp,
    ) -> Result<DropOutcome> {
        let controller = self
            .controllers
            .get_mut(scope)
            .ok_or_else(|| OrderingError::ScopeNotOpen(scope.clone()))?;
        controller.on_reorder(&mut self.store, id, new_index, now)
    }

    /// Route a write completion to the scope that issued it
    pub fn on_update_settled(
        &mut self,
        scope: &ScopeId,
        request_id: Uuid,
        outcome: std::result::Result<(), String>,
        now: Timestamp,
    ) -> Result<()> {
        let controller = self
            .controllers
            .get_mut(scope)
            .ok_or_else(|| OrderingError::ScopeNotOpen(scope.clone()))?;
        controller.on_update_settled(&mut self.store, request_id, outcome, now);
        Ok(())
    }

    /// Same as [`Workspace::on_update_settled`], keyed by the issued update
    pub fn settle(
        &mut self,
        update: &PositionUpdate,
        outcome: std::result::Result<(), String>,
        now: Timestamp,
    ) -> Result<()> {
        self.on_update_settled(&update.scope, update.request_id, outcome, now)
    }

    /// Tick every open scope; returns the scopes that were reconciled
    pub fn tick(&mut self, now: Timestamp) -> Vec<ScopeId> {
        let store = &mut self.store;
        let mut reconciled: Vec<ScopeId> = self
            .controllers
            .iter_mut()
            .filter_map(|(scope, controller)| {
                controller
                    .tick(&mut *store, now)
                    .then(|| scope.clone())
            })
            .collect();
        reconciled.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        reconciled
    }
}
