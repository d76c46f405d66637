//! Position Allocator: sparse fractional keys for list reordering
//!
//! A moved item receives a fresh key derived only from its new neighbours,
//! so no sibling is ever renumbered.
//!
//! # Rules
//!
//! `remaining` is the sorted key sequence with the moved item taken out and
//! `new_index` is the slot in that sequence the item should land in:
//!
//! - **Start** (`new_index == 0`): half the first key
//! - **End** (`new_index == remaining.len()`): last key plus the end gap
//! - **Between**: midpoint of the two neighbours
//!
//! # Precision
//!
//! Repeated insertion in front of the same neighbour halves the gap every
//! time. After roughly fifty such moves the midpoint collapses onto one of
//! its neighbours. [`is_degenerate`] detects this, and [`rebalanced`] gives
//! an evenly spaced replacement sequence for callers that opt in to
//! rewriting the whole list.
//!
//! # Example
//!
//! ```
//! use sortkit_core::allocator::allocate;
//!
//! // A(1000), B(2000) remain after C was lifted out; drop C at the start
//! let key = allocate(&[1000.0, 2000.0], 0, 1000.0).unwrap();
//! assert_eq!(key, 500.0);
//! ```

use crate::error::{OrderingError, Result};

/// Compute a key for an item landing at `new_index` of `remaining`
pub fn allocate(remaining: &[f64], new_index: usize, end_gap: f64) -> Result<f64> {
    let len = remaining.len();
    if new_index > len {
        return Err(OrderingError::IndexOutOfBounds {
            index: new_index,
            length: len,
        });
    }

    let (first, last) = match (remaining.first(), remaining.last()) {
        (Some(&first), Some(&last)) => (first, last),
        // Nothing to be relative to
        _ => return Ok(end_gap),
    };

    if new_index == 0 {
        // Halving a non-positive key would not move in front of it
        if first <= 0.0 {
            return Ok(first - end_gap);
        }
        return Ok(first / 2.0);
    }

    if new_index == len {
        return Ok(last + end_gap);
    }

    let before = remaining[new_index - 1];
    let after = remaining[new_index];
    Ok((before + after) / 2.0)
}

/// Key for a brand new item appended after `sorted`
pub fn append_position(sorted: &[f64], end_gap: f64) -> f64 {
    sorted.last().map_or(end_gap, |last| last + end_gap)
}

/// Key for a brand new item inserted at `index` of `sorted`
pub fn insert_position(sorted: &[f64], index: usize, end_gap: f64) -> Result<f64> {
    allocate(sorted, index, end_gap)
}

/// True when `key` no longer sits strictly between its neighbours
///
/// Either neighbour may be absent (list ends).
pub fn is_degenerate(key: f64, before: Option<f64>, after: Option<f64>) -> bool {
    if !key.is_finite() {
        return true;
    }
    let after_before = before.map_or(true, |b| key > b);
    let before_after = after.map_or(true, |a| key < a);
    !(after_before && before_after)
}

/// Evenly spaced keys `spacing, 2*spacing, ...` for `count` items
pub fn rebalanced(count: usize, spacing: f64) -> Vec<f64> {
    (1..=count).map(|slot| slot as f64 * spacing).collect()
}
