//! # timelane
//!
//! A cooperative time-slicing scheduler for single-threaded hosts: long
//! synchronous computations run in bounded slices, different categories of
//! work get priority-weighted, round-robin-fair lanes, and a
//! self-supervising watchdog reports when the thread stalls longer than
//! expected, inside or outside the scheduler's control.
//!
//! ## Quick Start
//!
//! ```rust
//! use timelane::prelude::*;
//!
//! let scheduler = Scheduler::new();
//! let handle = scheduler.submit(Work::new(|| expensive_sum(1_000)));
//! scheduler.run_until_idle();
//! assert_eq!(handle.take().unwrap().unwrap(), 499_500);
//!
//! fn expensive_sum(n: u64) -> u64 {
//!     (0..n).sum()
//! }
//! ```

// Re-export core components
pub use timelane_core::{self, *};

// Re-export the crates callers need at the API surface: `anyhow` to build
// job errors for `Work::fallible`, `log` to capture the default jank
// handler's output.
pub use anyhow;
pub use log;

/// The timelane prelude - everything you need to get started
pub mod prelude {
    // Scheduling
    pub use timelane_core::scheduling::{JobHandle, RuntimeContext, Scheduler, Step, Work};

    // Watchdog
    pub use timelane_core::watchdog::{JankEvent, Watchdog};

    // Configuration
    pub use timelane_core::config::{Config, ConfigPatch, DEFAULT_LANE_NAME};

    // Error types
    pub use timelane_core::error::{TimelaneError, TimelaneResult};
    pub type Result<T> = TimelaneResult<T>;

    // Common std types
    pub use std::time::{Duration, Instant};
}
