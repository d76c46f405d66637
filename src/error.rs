//! Error types for ordering operations

use crate::item::{ItemId, ScopeId};
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, OrderingError>;

/// Errors raised by the allocator, collection and drag controller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderingError {
    /// Item is not part of the list
    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    /// Value cannot name an item
    #[error("Invalid item id: {0}")]
    InvalidItemId(String),

    /// Target index lies outside the list
    #[error("Index {index} out of bounds for list of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Item still has a position write in flight
    #[error("Item {0} has a pending position update")]
    ItemLocked(ItemId),

    /// Another drag gesture is already active
    #[error("Drag already in progress for item {0}")]
    DragInProgress(ItemId),

    /// Drop received without a matching drag start
    #[error("No active drag gesture")]
    NoActiveDrag,

    /// The resource store rejected a position write
    #[error("Failed to persist position for {id}: {reason}")]
    Persistence { id: ItemId, reason: String },

    /// No controller is open for the scope
    #[error("Scope not open: {0}")]
    ScopeNotOpen(ScopeId),

    /// The resource store failed to serve a snapshot
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration value is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for OrderingError {
    fn from(error: serde_json::Error) -> Self {
        OrderingError::Serialization(error.to_string())
    }
}
