//! Cooperative scheduling: lanes, priority pools, and the slice-bounded
//! execution loop.
//!
//! - **Fifo**: pending-job queue owned by each lane
//! - **RoundRobin**: fair rotation over a pool's lane names
//! - **Registry**: routes submissions, relocates lanes between pools,
//!   answers "next runnable job system-wide"
//! - **Scheduler**: the submission entry point and the turn loop
//!
//! Priorities are plain integers in `[0, 10000]`; higher runs first.
//! Within one priority, lanes take strict round-robin turns.

pub mod fifo;
pub mod job;
pub mod robin;
pub mod scheduler;

mod pools;

pub use fifo::Fifo;
pub use job::{JobError, JobHandle, RuntimeContext, Step, Work};
pub use robin::RoundRobin;
pub use scheduler::Scheduler;
pub use pools::{LaneName, Priority};
