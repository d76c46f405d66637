//! Tunables for key allocation and write settling

use crate::error::{OrderingError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gap added after the last item when moving or appending to the end
pub const DEFAULT_END_GAP: f64 = 1000.0;

/// Grace period a confirmed write keeps its lock before background refresh
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;

/// Spacing between keys written by an explicit rebalance
pub const DEFAULT_REBALANCE_SPACING: f64 = 1000.0;

/// Ordering configuration
///
/// Every field has a default, so a partial JSON document such as
/// `{"settle_delay_ms": 500}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Added to the last key when an item moves to the end
    pub end_gap: f64,

    /// Lock grace period after a successful write, in milliseconds
    pub settle_delay_ms: u64,

    /// Periodic reconciliation interval; `None` disables it
    pub reconcile_interval_ms: Option<u64>,

    /// Key spacing produced by `rebalance`
    pub rebalance_spacing: f64,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            end_gap: DEFAULT_END_GAP,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            reconcile_interval_ms: None,
            rebalance_spacing: DEFAULT_REBALANCE_SPACING,
        }
    }
}

impl OrderingConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: OrderingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Creates an `OrderingConfig` from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SORTKIT_END_GAP`: gap appended after the last key (default: 1000)
    /// - `SORTKIT_SETTLE_DELAY_MS`: lock grace period (default: 2000)
    /// - `SORTKIT_RECONCILE_INTERVAL_MS`: periodic refresh interval (default: unset)
    /// - `SORTKIT_REBALANCE_SPACING`: rebalance key spacing (default: 1000)
    ///
    /// Unset variables fall back to defaults; set but unparsable ones are errors.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            end_gap: env_parse("SORTKIT_END_GAP")?.unwrap_or(defaults.end_gap),
            settle_delay_ms: env_parse("SORTKIT_SETTLE_DELAY_MS")?
                .unwrap_or(defaults.settle_delay_ms),
            reconcile_interval_ms: env_parse("SORTKIT_RECONCILE_INTERVAL_MS")?,
            rebalance_spacing: env_parse("SORTKIT_REBALANCE_SPACING")?
                .unwrap_or(defaults.rebalance_spacing),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject gaps that would break key allocation
    pub fn validate(&self) -> Result<()> {
        if !self.end_gap.is_finite() || self.end_gap <= 0.0 {
            return Err(OrderingError::InvalidConfig(format!(
                "end_gap must be a positive finite number, got {}",
                self.end_gap
            )));
        }
        if !self.rebalance_spacing.is_finite() || self.rebalance_spacing <= 0.0 {
            return Err(OrderingError::InvalidConfig(format!(
                "rebalance_spacing must be a positive finite number, got {}",
                self.rebalance_spacing
            )));
        }
        if self.reconcile_interval_ms == Some(0) {
            return Err(OrderingError::InvalidConfig(
                "reconcile_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn reconcile_interval(&self) -> Option<Duration> {
        self.reconcile_interval_ms.map(Duration::from_millis)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value.trim().parse().map(Some).map_err(|_| {
            OrderingError::InvalidConfig(format!("{} has invalid value {:?}", name, value))
        }),
        _ => Ok(None),
    }
}
