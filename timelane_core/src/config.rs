//! Scheduler configuration: slice budget, warn threshold, lane priorities.
//!
//! The core never reads configuration storage directly; it goes through the
//! [`ConfigProvider`] accessors, so the surrounding loading/validation
//! machinery can evolve independently of the scheduler.

use crate::error::{TimelaneError, TimelaneResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const MIN_SLICE_MS: u64 = 10;
pub const MAX_SLICE_MS: u64 = 500;
pub const MIN_WARN_MS: u64 = 10;
pub const MAX_WARN_MS: u64 = 1000;
pub const DEFAULT_SLICE_MS: u64 = 20;
pub const DEFAULT_WARN_MS: u64 = 20;
pub const DEFAULT_LANE_PRIORITY: u32 = 10;
pub const LANE_MIN_PRIORITY: u32 = 0;
pub const LANE_MAX_PRIORITY: u32 = 10_000;

/// Reserved lane used when a submission names no lane. Always present in
/// the lane map.
pub const DEFAULT_LANE_NAME: &str = "default";

/// Per-lane settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneConfig {
    pub priority: u32,
}

/// Full runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Budget for one scheduler turn, in milliseconds. Bounds: [10, 500].
    pub slice_ms: u64,
    /// Watchdog warn threshold, in milliseconds. Bounds: [10, 1000].
    pub warn_ms: u64,
    /// Lane name to priority mapping. Priorities bound to [0, 10000];
    /// higher values run first.
    pub lanes: HashMap<String, LaneConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let mut lanes = HashMap::new();
        lanes.insert(
            DEFAULT_LANE_NAME.to_string(),
            LaneConfig {
                priority: DEFAULT_LANE_PRIORITY,
            },
        );
        Self {
            slice_ms: DEFAULT_SLICE_MS,
            warn_ms: DEFAULT_WARN_MS,
            lanes,
        }
    }
}

impl Config {
    pub fn slice(&self) -> Duration {
        Duration::from_millis(self.slice_ms)
    }

    pub fn warn(&self) -> Duration {
        Duration::from_millis(self.warn_ms)
    }

    /// Priority for a lane name; unknown names fall back to the default
    /// lane's priority.
    pub fn priority_for_lane(&self, name: &str) -> u32 {
        self.lanes
            .get(name)
            .or_else(|| self.lanes.get(DEFAULT_LANE_NAME))
            .map(|lane| lane.priority)
            .unwrap_or(DEFAULT_LANE_PRIORITY)
    }

    /// Enforce the numeric bounds. Failure leaves no trace; callers only
    /// install a configuration that validated.
    pub fn validate(&self) -> TimelaneResult<()> {
        if self.slice_ms < MIN_SLICE_MS || self.slice_ms > MAX_SLICE_MS {
            return Err(TimelaneError::config(format!(
                "slice_ms {} must be between {} and {}",
                self.slice_ms, MIN_SLICE_MS, MAX_SLICE_MS
            )));
        }
        if self.warn_ms < MIN_WARN_MS || self.warn_ms > MAX_WARN_MS {
            return Err(TimelaneError::config(format!(
                "warn_ms {} must be between {} and {}",
                self.warn_ms, MIN_WARN_MS, MAX_WARN_MS
            )));
        }
        for (name, lane) in &self.lanes {
            // u32 already enforces the lower bound of 0.
            if lane.priority > LANE_MAX_PRIORITY {
                return Err(TimelaneError::config(format!(
                    "priority {} for lane '{}' must be between {} and {}",
                    lane.priority, name, LANE_MIN_PRIORITY, LANE_MAX_PRIORITY
                )));
            }
        }
        Ok(())
    }
}

/// Partial configuration merged over a base by `configure`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(default)]
    pub slice_ms: Option<u64>,
    #[serde(default)]
    pub warn_ms: Option<u64>,
    /// Lane entries merged over the base lane map (existing lanes not named
    /// here are kept).
    #[serde(default)]
    pub lanes: HashMap<String, LaneConfig>,
}

impl ConfigPatch {
    pub fn slice_ms(mut self, ms: u64) -> Self {
        self.slice_ms = Some(ms);
        self
    }

    pub fn warn_ms(mut self, ms: u64) -> Self {
        self.warn_ms = Some(ms);
        self
    }

    pub fn lane(mut self, name: &str, priority: u32) -> Self {
        self.lanes
            .insert(name.to_string(), LaneConfig { priority });
        self
    }

    /// Merge this patch over `base`, producing the candidate configuration.
    pub fn apply_to(&self, base: &Config) -> Config {
        let mut merged = base.clone();
        if let Some(slice_ms) = self.slice_ms {
            merged.slice_ms = slice_ms;
        }
        if let Some(warn_ms) = self.warn_ms {
            merged.warn_ms = warn_ms;
        }
        for (name, lane) in &self.lanes {
            merged.lanes.insert(name.clone(), *lane);
        }
        merged
    }
}

/// Accessors the core reads configuration through.
pub trait ConfigProvider: Send + Sync {
    fn slice_ms(&self) -> Duration;
    fn warn_ms(&self) -> Duration;
    fn priority_for_lane(&self, name: &str) -> u32;
}

/// Shared, swappable configuration handle. Cloning shares the underlying
/// storage; `replace` swaps it atomically for every reader.
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub fn snapshot(&self) -> Config {
        self.inner.read().clone()
    }

    pub(crate) fn replace(&self, config: Config) {
        *self.inner.write() = config;
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ConfigProvider for SharedConfig {
    fn slice_ms(&self) -> Duration {
        self.inner.read().slice()
    }

    fn warn_ms(&self) -> Duration {
        self.inner.read().warn()
    }

    fn priority_for_lane(&self, name: &str) -> u32 {
        self.inner.read().priority_for_lane(name)
    }
}
