//! # timelane core
//!
//! The core runtime for timelane: a cooperative time-slicing scheduler that
//! lets a single-threaded host run long synchronous computations without
//! blocking the thread beyond a configured budget.
//!
//! The building blocks:
//!
//! - **Scheduling**: named lanes grouped into priority pools, drained by a
//!   slice-bounded loop with round-robin fairness inside each pool
//! - **Watchdog**: a self-supervising stall detector with an `isolate`
//!   primitive that keeps the scheduler's own pauses out of the reports
//! - **HostQueue**: the deferral primitive that stands in for the host's
//!   task queue; every turn and every completion goes through it
//! - **Config**: slice budget, warn threshold and lane priorities, read by
//!   the core only through the [`ConfigProvider`] accessors
//!
//! ## Quick Start
//!
//! ```rust
//! use timelane_core::{Scheduler, Step, Work};
//!
//! let scheduler = Scheduler::new();
//!
//! // A resumable computation: one chunk per scheduler turn.
//! let mut remaining = 1000u64;
//! let handle = scheduler.submit(Work::resumable(move |cx| {
//!     while remaining > 0 && !cx.should_yield() {
//!         remaining -= 1;
//!     }
//!     if remaining == 0 {
//!         Ok(Step::Done("finished"))
//!     } else {
//!         Ok(Step::Yield)
//!     }
//! }));
//!
//! scheduler.run_until_idle();
//! assert_eq!(handle.take().unwrap().unwrap(), "finished");
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod scheduling;
pub mod watchdog;

// Re-export commonly used types for easy access
pub use config::{
    Config, ConfigPatch, ConfigProvider, LaneConfig, SharedConfig, DEFAULT_LANE_NAME,
    DEFAULT_LANE_PRIORITY, DEFAULT_SLICE_MS, DEFAULT_WARN_MS, LANE_MAX_PRIORITY,
    LANE_MIN_PRIORITY, MAX_SLICE_MS, MAX_WARN_MS, MIN_SLICE_MS, MIN_WARN_MS,
};
pub use error::{TimelaneError, TimelaneResult};
pub use event::{EventHub, Subscription};
pub use host::HostQueue;
pub use scheduling::{JobError, JobHandle, RuntimeContext, Scheduler, Step, Work};
pub use watchdog::{JankEvent, JankSubscription, Watchdog, UNKNOWN_WATCH_ID, WARN_VARIANCE};
