//! Two-phase optimistic update
//!
//! A value is applied locally first, then either confirmed by the remote
//! side or rejected. Rejection is terminal: the caller is expected to run
//! a compensating action (for ordering, a forced reconciliation).
//!
//! ```text
//! apply ──► Applied ──confirm──► Confirmed { settles_at } ──(time)──► settled
//!              │
//!              └──reject──► Rejected
//! ```

use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Lifecycle of an optimistic change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Applied locally, remote outcome unknown
    Applied,
    /// Remote accepted; local value is trusted until `settles_at`
    Confirmed { settles_at: Timestamp },
    /// Remote refused
    Rejected,
}

/// A locally applied change awaiting remote confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct Optimistic<T> {
    request_id: Uuid,
    value: T,
    previous: T,
    applied_at: Timestamp,
    phase: Phase,
}

impl<T> Optimistic<T> {
    /// Record a change that has just been applied locally
    pub fn apply(request_id: Uuid, value: T, previous: T, now: Timestamp) -> Self {
        Self {
            request_id,
            value,
            previous,
            applied_at: now,
            phase: Phase::Applied,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The locally applied value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The value before the change
    pub fn previous(&self) -> &T {
        &self.previous
    }

    pub fn applied_at(&self) -> Timestamp {
        self.applied_at
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Remote accepted; keep trusting the local value for `grace`
    ///
    /// Only meaningful from `Applied`; returns false otherwise.
    pub fn confirm(&mut self, now: Timestamp, grace: Duration) -> bool {
        if self.phase != Phase::Applied {
            return false;
        }
        self.phase = Phase::Confirmed {
            settles_at: now + grace,
        };
        true
    }

    /// Remote refused; returns false if already resolved
    pub fn reject(&mut self) -> bool {
        if self.phase != Phase::Applied {
            return false;
        }
        self.phase = Phase::Rejected;
        true
    }

    /// Confirmed and past its grace period
    pub fn is_settled(&self, now: Timestamp) -> bool {
        matches!(self.phase, Phase::Confirmed { settles_at } if now >= settles_at)
    }

    /// Still waiting on the remote side
    pub fn is_in_flight(&self) -> bool {
        self.phase == Phase::Applied
    }
}

/// Serializable view of an in-flight change, as exposed to UI state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimisticSnapshot<T> {
    pub request_id: Uuid,
    pub value: T,
    pub confirmed: bool,
}

impl<T: Clone> From<&Optimistic<T>> for OptimisticSnapshot<T> {
    fn from(change: &Optimistic<T>) -> Self {
        Self {
            request_id: change.request_id,
            value: change.value.clone(),
            confirmed: matches!(change.phase, Phase::Confirmed { .. }),
        }
    }
}
