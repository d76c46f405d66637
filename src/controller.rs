//! Drag Session Controller
//!
//! Turns drag gestures into optimistic reorders of one [`OrderedList`].
//!
//! # State machine
//!
//! ```text
//! Idle ──drag_start──► Dragging ──drag_end──► Evaluating ──same slot / no target──► Idle
//!                                                 │
//!                                                 └──► Committing ──► Idle
//! ```
//!
//! Committing is instantaneous from the UI's point of view: the list is
//! reordered, the moved item is locked, and the write is handed to the
//! store. Its outcome arrives later through [`ReorderController::on_update_settled`]:
//!
//! - success: the lock lingers for the settle delay, then [`ReorderController::tick`]
//!   releases it and reconciles with the store
//! - failure: a notification is queued, the lock is dropped and the list
//!   is reconciled at once, discarding the optimistic move
//!
//! Nothing is retried automatically.
//!
//! # Example
//!
//! ```
//! use sortkit_core::{
//!     MemoryStore, OrderingConfig, PositionedItem, ReorderController, ScopeId, Timestamp,
//! };
//!
//! let scope = ScopeId::course("c1");
//! let mut store = MemoryStore::new();
//! store.insert_list(scope.clone(), vec![
//!     PositionedItem::new("A", 1000.0),
//!     PositionedItem::new("B", 2000.0),
//!     PositionedItem::new("C", 3000.0),
//! ]);
//!
//! let now = Timestamp::from_millis(1_000);
//! let mut controller =
//!     ReorderController::open(&mut store, scope, OrderingConfig::default(), now).unwrap();
//!
//! controller.on_reorder(&mut store, &"C".into(), 0, now).unwrap();
//! assert_eq!(controller.sorted_view()[0].position, 500.0);
//! assert!(controller.is_locked(&"C".into()));
//! ```

use crate::allocator;
use crate::clock::Timestamp;
use crate::collection::OrderedList;
use crate::config::OrderingConfig;
use crate::error::{OrderingError, Result};
use crate::item::{ItemId, PositionedItem, ScopeId};
use crate::lock::UpdateLock;
use crate::optimistic::OptimisticSnapshot;
use crate::reconcile::{ReconcileReason, ReconciliationPolicy};
use crate::store::{PositionUpdate, ResourceStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the controller is in the gesture lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragState {
    Idle,
    Dragging,
    Evaluating,
    Committing,
}

/// Last optimistic write, for UI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub id: ItemId,
    pub position: f64,
}

/// Gesture state, kept explicit so it can be inspected and serialized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    /// Item under an active gesture
    pub active_id: Option<ItemId>,

    /// Most recent optimistic commit that has not settled yet
    pub pending_update: Option<PendingUpdate>,
}

/// Where an item was dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DropTarget {
    /// Over another item; the item takes that item's visual index
    Item(ItemId),
    /// At a visual index
    Index(usize),
}

/// Result of a drop
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "update", rename_all = "snake_case")]
pub enum DropOutcome {
    /// Same slot or no target; nothing happened
    NoOp,
    /// Reordered locally and the write was dispatched
    Committed(PositionUpdate),
    /// Reordered locally but the store refused the write at dispatch;
    /// the list has already been reconciled
    Rejected(PositionUpdate),
}

/// Per-item capability handed to the render layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragHandle {
    pub id: ItemId,
    pub draggable: bool,
}

/// Kind of user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A position write was rejected and the move undone
    MoveFailed,
    /// Refreshing from the store failed; local order kept
    RefreshFailed,
}

/// Transient, dismissible notice for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub item: Option<ItemId>,
    pub message: String,
}

/// Reorder controller for a single scope
#[derive(Debug)]
pub struct ReorderController {
    list: OrderedList,
    session: DragSession,
    state: DragState,
    lock: UpdateLock,
    policy: ReconciliationPolicy,
    config: OrderingConfig,
    notifications: Vec<Notification>,
    needs_rebalance: bool,
    created_at: Timestamp,
}

impl ReorderController {
    /// Load the scope's snapshot from the store
    pub fn open<S: ResourceStore>(
        store: &mut S,
        scope: ScopeId,
        config: OrderingConfig,
        now: Timestamp,
    ) -> Result<Self> {
        config.validate()?;
        let snapshot = store.fetch_list(&scope)?;
        let list = OrderedList::from_snapshot(scope, snapshot);
        Ok(Self::from_list(list, config, now))
    }

    /// Wrap an already loaded list
    pub fn from_list(list: OrderedList, config: OrderingConfig, now: Timestamp) -> Self {
        let needs_rebalance = list.has_collisions();
        Self {
            policy: ReconciliationPolicy::new(config.reconcile_interval()),
            list,
            session: DragSession::default(),
            state: DragState::Idle,
            lock: UpdateLock::new(),
            config,
            notifications: Vec::new(),
            needs_rebalance,
            created_at: now,
        }
    }

    pub fn scope(&self) -> &ScopeId {
        self.list.scope()
    }

    /// Items in render order
    pub fn sorted_view(&self) -> &[PositionedItem] {
        self.list.sorted_view()
    }

    pub fn list(&self) -> &OrderedList {
        &self.list
    }

    pub fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.list.index_of(id)
    }

    pub fn is_locked(&self, id: &ItemId) -> bool {
        self.lock.is_locked(id)
    }

    /// Number of writes not yet settled
    pub fn pending_count(&self) -> usize {
        self.lock.len()
    }

    /// Writes still awaiting confirmation or settling, by item
    pub fn pending_writes(&self) -> Vec<(ItemId, OptimisticSnapshot<f64>)> {
        self.lock
            .locked_ids()
            .into_iter()
            .filter_map(|id| {
                let snapshot = self.lock.get(&id).map(OptimisticSnapshot::from)?;
                Some((id, snapshot))
            })
            .collect()
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn config(&self) -> &OrderingConfig {
        &self.config
    }

    /// Keys have collided or lost precision; see [`ReorderController::rebalance`]
    pub fn needs_rebalance(&self) -> bool {
        self.needs_rebalance
    }

    pub fn drag_handle(&self, id: &ItemId) -> Option<DragHandle> {
        self.list.get(id).map(|item| DragHandle {
            id: item.id.clone(),
            draggable: !self.lock.is_locked(&item.id),
        })
    }

    /// Handles for every item, in render order
    pub fn drag_handles(&self) -> Vec<DragHandle> {
        self.list
            .sorted_view()
            .iter()
            .map(|item| DragHandle {
                id: item.id.clone(),
                draggable: !self.lock.is_locked(&item.id),
            })
            .collect()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drain queued notifications
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Key for a new item appended at the end
    pub fn append_position(&self) -> f64 {
        allocator::append_position(&self.list.positions(), self.config.end_gap)
    }

    /// Key for a new item inserted at `index`
    pub fn insert_position(&self, index: usize) -> Result<f64> {
        allocator::insert_position(&self.list.positions(), index, self.config.end_gap)
    }

    /// Begin a gesture on `id`
    ///
    /// Refused while another gesture is active or while `id` still has a
    /// write in flight. Other items remain draggable.
    pub fn drag_start(&mut self, id: &ItemId) -> Result<()> {
        if let Some(active) = &self.session.active_id {
            return Err(OrderingError::DragInProgress(active.clone()));
        }
        if !self.list.contains(id) {
            return Err(OrderingError::ItemNotFound(id.clone()));
        }
        if self.lock.is_locked(id) {
            tracing::debug!(scope = %self.scope(), item = %id, "drag refused, update pending");
            return Err(OrderingError::ItemLocked(id.clone()));
        }

        self.session.active_id = Some(id.clone());
        self.state = DragState::Dragging;
        tracing::debug!(scope = %self.scope(), item = %id, "drag started");
        Ok(())
    }

    /// Abandon the active gesture without a trace
    pub fn drag_cancel(&mut self) {
        if let Some(id) = self.session.active_id.take() {
            tracing::debug!(scope = %self.scope(), item = %id, "drag cancelled");
        }
        self.state = DragState::Idle;
    }

    /// Finish the active gesture
    pub fn drag_end<S: ResourceStore>(
        &mut self,
        store: &mut S,
        target: Option<DropTarget>,
        now: Timestamp,
    ) -> Result<DropOutcome> {
        let id = self
            .session
            .active_id
            .take()
            .ok_or(OrderingError::NoActiveDrag)?;
        self.state = DragState::Evaluating;

        let outcome = self.evaluate(store, id, target, now);
        self.state = DragState::Idle;
        outcome
    }

    /// Move `id` to `new_index` in one step (drop handler entry point)
    pub fn on_reorder<S: ResourceStore>(
        &mut self,
        store: &mut S,
        id: &ItemId,
        new_index: usize,
        now: Timestamp,
    ) -> Result<DropOutcome> {
        self.drag_start(id)?;
        self.drag_end(store, Some(DropTarget::Index(new_index)), now)
    }

    fn evaluate<S: ResourceStore>(
        &mut self,
        store: &mut S,
        id: ItemId,
        target: Option<DropTarget>,
        now: Timestamp,
    ) -> Result<DropOutcome> {
        // The item may have vanished in a reconciliation mid-gesture
        let Some(old_index) = self.list.index_of(&id) else {
            return Ok(DropOutcome::NoOp);
        };

        let new_index = match target {
            None => None,
            Some(DropTarget::Item(over)) => self.list.index_of(&over),
            Some(DropTarget::Index(index)) => {
                if index >= self.list.len() {
                    return Err(OrderingError::IndexOutOfBounds {
                        index,
                        length: self.list.len(),
                    });
                }
                Some(index)
            }
        };

        match new_index {
            Some(new_index) if new_index != old_index => self.commit(store, id, new_index, now),
            _ => {
                tracing::debug!(scope = %self.scope(), item = %id, "drop in place");
                Ok(DropOutcome::NoOp)
            }
        }
    }

    fn commit<S: ResourceStore>(
        &mut self,
        store: &mut S,
        id: ItemId,
        new_index: usize,
        now: Timestamp,
    ) -> Result<DropOutcome> {
        self.state = DragState::Committing;

        let remaining = self.list.positions_without(&id);
        let position = allocator::allocate(&remaining, new_index, self.config.end_gap)?;
        let before = new_index.checked_sub(1).map(|slot| remaining[slot]);
        let after = remaining.get(new_index).copied();
        if allocator::is_degenerate(position, before, after) {
            tracing::warn!(
                scope = %self.scope(),
                item = %id,
                position,
                "position key collided with a neighbour"
            );
            self.needs_rebalance = true;
        }

        let previous = self
            .list
            .get(&id)
            .map(|item| item.position)
            .ok_or_else(|| OrderingError::ItemNotFound(id.clone()))?;
        let mut moved = self.list.with_move(&id, new_index)?;
        moved[new_index].position = position;

        let update = PositionUpdate::new(self.scope().clone(), id.clone(), position);
        self.lock
            .acquire(id.clone(), update.request_id, position, previous, now)?;
        self.list.replace(moved);
        self.session.pending_update = Some(PendingUpdate {
            id: id.clone(),
            position,
        });

        tracing::info!(
            scope = %self.scope(),
            item = %id,
            from = previous,
            to = position,
            request_id = %update.request_id,
            "position update issued"
        );

        match store.update_position(&update) {
            Ok(()) => Ok(DropOutcome::Committed(update)),
            Err(error) => {
                self.fail(store, &id, error.to_string(), now);
                Ok(DropOutcome::Rejected(update))
            }
        }
    }

    /// Completion callback for a write issued by this controller
    ///
    /// Unknown or already resolved request ids are ignored.
    pub fn on_update_settled<S: ResourceStore>(
        &mut self,
        store: &mut S,
        request_id: Uuid,
        outcome: std::result::Result<(), String>,
        now: Timestamp,
    ) {
        let Some(id) = self.lock.holder(request_id) else {
            tracing::debug!(
                scope = %self.scope(),
                request_id = %request_id,
                "stale completion ignored"
            );
            return;
        };
        if !self.lock.get(&id).is_some_and(|change| change.is_in_flight()) {
            tracing::debug!(scope = %self.scope(), item = %id, "duplicate completion ignored");
            return;
        }

        match outcome {
            Ok(()) => {
                if self
                    .lock
                    .confirm(request_id, now, self.config.settle_delay())
                    .is_some()
                {
                    tracing::debug!(scope = %self.scope(), item = %id, "position update confirmed");
                }
            }
            Err(reason) => self.fail(store, &id, reason, now),
        }
    }

    fn fail<S: ResourceStore>(
        &mut self,
        store: &mut S,
        id: &ItemId,
        reason: String,
        now: Timestamp,
    ) {
        let Some(mut change) = self.lock.release(id) else {
            return;
        };
        change.reject();
        let reverted_to = *change.previous();
        tracing::warn!(
            scope = %self.scope(),
            item = %id,
            error = %reason,
            reverted_to,
            pending_ms = now.saturating_duration_since(change.applied_at()).as_millis() as u64,
            "position update failed"
        );

        // Revert before refreshing; the refresh may fail too
        if self.list.set_position(id, reverted_to).is_err() {
            tracing::debug!(scope = %self.scope(), item = %id, "rejected item no longer listed");
        }

        self.notifications.push(Notification {
            kind: NotificationKind::MoveFailed,
            item: Some(id.clone()),
            message: format!("Could not save new position: {}", reason),
        });
        self.clear_pending(id);
        self.reconcile_with(store, now, ReconcileReason::Failure);
    }

    fn clear_pending(&mut self, id: &ItemId) {
        if self
            .session
            .pending_update
            .as_ref()
            .is_some_and(|pending| &pending.id == id)
        {
            self.session.pending_update = None;
        }
    }

    /// Advance timers: settle confirmed writes and run periodic refresh
    ///
    /// Returns true if the list was reconciled.
    pub fn tick<S: ResourceStore>(&mut self, store: &mut S, now: Timestamp) -> bool {
        let released = self.lock.expire(now);
        for id in &released {
            self.clear_pending(id);
        }

        if !released.is_empty() {
            return self.reconcile_with(store, now, ReconcileReason::Settled);
        }
        if self.policy.due(now, self.created_at) {
            return self.reconcile_with(store, now, ReconcileReason::Interval);
        }
        false
    }

    /// Refresh from the store now
    pub fn reconcile<S: ResourceStore>(&mut self, store: &mut S, now: Timestamp) -> bool {
        self.reconcile_with(store, now, ReconcileReason::Manual)
    }

    fn reconcile_with<S: ResourceStore>(
        &mut self,
        store: &mut S,
        now: Timestamp,
        reason: ReconcileReason,
    ) -> bool {
        let scope = self.scope().clone();
        store.invalidate(&scope);

        match store.fetch_list(&scope) {
            Ok(snapshot) => {
                let merged = self.policy.merge(snapshot, &self.lock);
                self.list.replace(merged);
                self.needs_rebalance = self.list.has_collisions();
                self.policy.mark_run(now);
                tracing::info!(
                    scope = %scope,
                    reason = ?reason,
                    items = self.list.len(),
                    pending = self.lock.len(),
                    "list reconciled"
                );
                true
            }
            Err(error) => {
                tracing::warn!(scope = %scope, reason = ?reason, error = %error, "reconciliation failed");
                self.notifications.push(Notification {
                    kind: NotificationKind::RefreshFailed,
                    item: None,
                    message: format!("Could not refresh order: {}", error),
                });
                false
            }
        }
    }

    /// Rewrite every key to evenly spaced values
    ///
    /// Opt-in repair for eroded keys. Only items whose key changes are
    /// written; each is locked like a regular move. Refused while any
    /// write or gesture is in flight.
    pub fn rebalance<S: ResourceStore>(
        &mut self,
        store: &mut S,
        now: Timestamp,
    ) -> Result<Vec<PositionUpdate>> {
        if let Some(active) = &self.session.active_id {
            return Err(OrderingError::DragInProgress(active.clone()));
        }
        if let Some(locked) = self.lock.locked_ids().into_iter().next() {
            return Err(OrderingError::ItemLocked(locked));
        }

        let keys = allocator::rebalanced(self.list.len(), self.config.rebalance_spacing);
        let mut items = self.list.sorted_view().to_vec();
        let mut updates = Vec::new();

        for (item, key) in items.iter_mut().zip(keys) {
            if item.position == key {
                continue;
            }
            let update = PositionUpdate::new(self.scope().clone(), item.id.clone(), key);
            self.lock
                .acquire(item.id.clone(), update.request_id, key, item.position, now)?;
            item.position = key;
            updates.push(update);
        }

        self.list.replace(items);
        self.needs_rebalance = false;
        tracing::info!(scope = %self.scope(), rewritten = updates.len(), "list rebalanced");

        let mut dispatched = Vec::with_capacity(updates.len());
        for update in updates {
            match store.update_position(&update) {
                Ok(()) => dispatched.push(update),
                Err(error) => self.fail(store, &update.id, error.to_string(), now),
            }
        }
        Ok(dispatched)
    }
}
