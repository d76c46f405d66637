//! SortKit Core - Optimistic drag-and-drop ordering
//!
//! This is the Rust core behind reorderable authoring lists (topics within
//! a course, activities within a topic), compiled to both native and WASM.
//! It implements:
//! - Sparse fractional position keys, allocated without renumbering siblings
//! - A drag session state machine with instant local reordering
//! - Per-item update locks while a position write is in flight
//! - Reconciliation against the authoritative store, with rollback on failure
//!
//! # Examples
//!
//! ```rust
//! use sortkit_core::{allocator, OrderedList, PositionedItem, ScopeId};
//!
//! let list = OrderedList::from_snapshot(
//!     ScopeId::course("course-1"),
//!     vec![PositionedItem::new("a", 1000.0), PositionedItem::new("b", 2000.0)],
//! );
//!
//! // Where would "b" go if dropped at the top?
//! let key = allocator::allocate(&list.positions_without(&"b".into()), 0, 1000.0).unwrap();
//! assert_eq!(key, 500.0);
//! ```

pub mod allocator;
pub mod clock;
pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod item;
pub mod lock;
pub mod optimistic;
pub mod reconcile;
pub mod store;
pub mod workspace;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use clock::Timestamp;
pub use collection::OrderedList;
pub use config::OrderingConfig;
pub use controller::{
    DragHandle, DragSession, DragState, DropOutcome, DropTarget, Notification, NotificationKind,
    PendingUpdate, ReorderController,
};
pub use error::{OrderingError, Result};
pub use item::{ItemId, PositionedItem, ScopeId, ScopeKind};
pub use lock::UpdateLock;
pub use store::{MemoryStore, PositionUpdate, ResourceStore};
pub use workspace::Workspace;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_import() {
        // Smoke test that re-exports resolve
        let _scope: ScopeId = ScopeId::topic("topic-1");
        let _id: ItemId = "activity-1".into();
    }
}
