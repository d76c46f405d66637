/// Millisecond timestamps for lock grace periods and periodic refresh
///
/// The controller never reads the clock itself; callers pass `now` in.
/// Native callers can use [`Timestamp::now`]. In the browser
/// `std::time` is unavailable, so the host passes `Date.now()` or
/// `performance.now()` through [`Timestamp::from_millis`].
use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::Duration;

/// Point in time, in milliseconds since a caller-chosen origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Wall-clock time since the Unix epoch
    /// Not available in WASM builds
    #[cfg(not(target_arch = "wasm32"))]
    pub fn now() -> Self {
        let millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let millis = u64::try_from(rhs.as_millis()).unwrap_or(u64::MAX);
        Timestamp(self.0.saturating_add(millis))
    }
}
