//! Slice-bounded cooperative execution loop.
//!
//! One scheduler turn drains the registry for at most `slice_ms` of wall
//! time, stepping a single job at a time, then hands the thread back to the
//! host and re-arms itself through the host queue if work remains. Each
//! turn runs inside `watchdog.isolate` tagged with the slice budget, so the
//! loop's own bounded pause is never reported as an unknown stall.

use crate::config::{Config, ConfigPatch, ConfigProvider, SharedConfig, DEFAULT_LANE_NAME};
use crate::error::TimelaneResult;
use crate::host::HostQueue;
use crate::scheduling::job::{Job, JobHandle, RuntimeContext, StepOutcome, Work};
use crate::scheduling::pools::Registry;
use crate::watchdog::{TimerService, Watchdog};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct SchedulerInner {
    registry: Mutex<Registry>,
    /// True while a turn is armed or running; cleared when the registry
    /// drains empty.
    working: Mutex<bool>,
    host: Arc<HostQueue>,
    watchdog: Watchdog,
    config: SharedConfig,
    // Keeps the timer worker alive for the watchdog.
    _timer: Arc<TimerService>,
}

/// The cooperative scheduler: submission entry point, slice-bounded loop,
/// watchdog, and configuration surface.
///
/// Each instance is fully independent: registry, host queue, watchdog and
/// timer are all per-instance, so tests (or embedders) can run several
/// schedulers side by side without interference.
///
/// # Example
/// ```
/// use timelane_core::{Scheduler, Work};
///
/// let scheduler = Scheduler::new();
/// let handle = scheduler.submit(Work::new(|| 2 + 2));
/// scheduler.run_until_idle();
/// assert_eq!(handle.take().unwrap().unwrap(), 4);
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Create a scheduler with the default configuration.
    pub fn new() -> Self {
        // The default configuration is valid by construction.
        Self::build(Config::default())
    }

    /// Create a scheduler with an explicit configuration.
    pub fn with_config(config: Config) -> TimelaneResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let shared = SharedConfig::new(config);
        let provider: Arc<dyn ConfigProvider> = Arc::new(shared.clone());
        let host = Arc::new(HostQueue::new());
        let timer = Arc::new(TimerService::new());
        let watchdog = Watchdog::new(host.clone(), timer.clone(), provider.clone());
        let scheduler = Self {
            inner: Arc::new(SchedulerInner {
                registry: Mutex::new(Registry::new(provider)),
                working: Mutex::new(false),
                host,
                watchdog,
                config: shared,
                _timer: timer,
            }),
        };
        // Lanes named up front get their pools before any submission.
        scheduler.apply_lane_priorities();
        scheduler
    }

    /// Submit work to the default lane.
    pub fn submit<T: Send + 'static>(&self, work: Work<T>) -> JobHandle<T> {
        self.submit_in(DEFAULT_LANE_NAME, work)
    }

    /// Submit work to a named lane, creating the lane on first reference.
    /// The returned handle settles on a later host turn, never inside this
    /// call.
    pub fn submit_in<T: Send + 'static>(&self, lane: &str, work: Work<T>) -> JobHandle<T> {
        let slot = Arc::new(Mutex::new(None));
        let handle = JobHandle::new(slot.clone());
        let job = Job::new(lane.to_string(), work, slot);
        self.inner.registry.lock().add_job(job);
        self.arm();
        handle
    }

    /// Defer a turn if the loop is idle.
    fn arm(&self) {
        let mut working = self.inner.working.lock();
        if *working {
            return;
        }
        *working = true;
        let inner = self.inner.clone();
        self.inner.host.defer(move || Self::turn(&inner));
    }

    /// One slice-bounded turn of the loop.
    fn turn(inner: &Arc<SchedulerInner>) {
        let slice = inner.config.slice_ms();
        let deadline = Instant::now() + slice;
        let cx = RuntimeContext::new(deadline);
        let tag = format!("slice{}", slice.as_millis());

        inner.watchdog.isolate(&tag, Some(slice), || {
            while Instant::now() < deadline {
                let job = inner.registry.lock().next_job();
                let Some(mut job) = job else {
                    *inner.working.lock() = false;
                    break;
                };
                // The registry lock is released around the step so job code
                // may itself submit work.
                match job.step(&cx) {
                    StepOutcome::Pending => inner.registry.lock().add_job(job),
                    StepOutcome::Settle(settle) => inner.host.defer(settle),
                }
            }
        });

        if *inner.working.lock() {
            let next = inner.clone();
            inner.host.defer(move || Self::turn(&next));
        }
    }

    /// Merge `patch` over the current configuration (or over the defaults
    /// when `reset`), validate, and install it. Lane priorities take effect
    /// immediately via the registry; the watchdog restarts if the warn
    /// threshold changed while it was running. On failure nothing changes.
    pub fn configure(&self, patch: ConfigPatch, reset: bool) -> TimelaneResult<Config> {
        let current = self.inner.config.snapshot();
        let base = if reset { Config::default() } else { current.clone() };
        let merged = patch.apply_to(&base);
        merged.validate()?;

        let warn_changed = merged.warn_ms != current.warn_ms;
        self.inner.config.replace(merged.clone());
        self.apply_lane_priorities();
        if warn_changed {
            self.inner.watchdog.restart();
        }
        Ok(merged)
    }

    fn apply_lane_priorities(&self) {
        let config = self.inner.config.snapshot();
        let mut registry = self.inner.registry.lock();
        for (name, lane) in &config.lanes {
            registry.ensure_lane(name, lane.priority);
        }
    }

    /// Stop the watchdog and drop every pool, lane and pending job. Pending
    /// handles never settle; subsequent submissions start from a clean
    /// state.
    pub fn reset(&self) {
        self.inner.watchdog.stop();
        let provider: Arc<dyn ConfigProvider> = Arc::new(self.inner.config.clone());
        *self.inner.registry.lock() = Registry::new(provider);
        *self.inner.working.lock() = false;
        self.apply_lane_priorities();
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Config {
        self.inner.config.snapshot()
    }

    /// The scheduler's watchdog.
    pub fn watchdog(&self) -> &Watchdog {
        &self.inner.watchdog
    }

    /// Run one deferred host task. Returns `false` when the host queue is
    /// empty.
    pub fn tick(&self) -> bool {
        self.inner.host.run_one()
    }

    /// Pump the host queue until it is empty. Returns how many tasks ran.
    pub fn run_until_idle(&self) -> usize {
        self.inner.host.run_until_idle()
    }

    /// Pump the host queue for at least `window`, parking briefly while it
    /// is empty so timer-fed tasks (the watchdog self-check) get a turn.
    pub fn run_for(&self, window: Duration) -> usize {
        self.inner.host.run_for(window)
    }

    /// True while a turn is armed or running.
    pub fn is_working(&self) -> bool {
        *self.inner.working.lock()
    }

    /// Whether any lane still holds pending jobs.
    pub fn has_pending(&self) -> bool {
        self.inner.registry.lock().has_pending()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
