//! Reconciliation Policy
//!
//! Decides when local state is replaced by a fresh snapshot and how the
//! two are merged. The snapshot is authoritative for every field, except
//! that an item whose write has not settled yet keeps its optimistic key;
//! otherwise the list would snap back to the pre-move order while the
//! backend is still converging.

use crate::clock::Timestamp;
use crate::item::PositionedItem;
use crate::lock::UpdateLock;
use std::time::Duration;

/// Why a reconciliation ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileReason {
    /// A confirmed write left its grace period
    Settled,
    /// A write was rejected; optimistic state must go
    Failure,
    /// Periodic refresh
    Interval,
    /// Requested by the caller
    Manual,
}

/// When to refresh and how to merge
#[derive(Debug, Clone)]
pub struct ReconciliationPolicy {
    interval: Option<Duration>,
    last_run: Option<Timestamp>,
}

impl ReconciliationPolicy {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Periodic refresh is due
    ///
    /// Never due without an interval. Before the first run the interval
    /// counts from `created`.
    pub fn due(&self, now: Timestamp, created: Timestamp) -> bool {
        match self.interval {
            Some(interval) => {
                let since = self.last_run.unwrap_or(created);
                now.saturating_duration_since(since) >= interval
            }
            None => false,
        }
    }

    pub fn mark_run(&mut self, now: Timestamp) {
        self.last_run = Some(now);
    }

    /// Merge a fresh snapshot with writes that are still pending
    ///
    /// Returns the merged items, unsorted.
    pub fn merge(&self, snapshot: Vec<PositionedItem>, lock: &UpdateLock) -> Vec<PositionedItem> {
        snapshot
            .into_iter()
            .map(|mut item| {
                if let Some(position) = lock.pending_position(&item.id) {
                    item.position = position;
                }
                item
            })
            .collect()
    }
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self::new(None)
    }
}
