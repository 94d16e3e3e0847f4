//! Self-supervising stall detector.
//!
//! The watchdog answers one question: was the host thread blocked longer
//! than expected? It has two sources of truth:
//!
//! - a **periodic self-check**, armed every `warn_ms`: the check is deferred
//!   through the host queue, so it runs late exactly when the host thread
//!   was stalled, and a late check reports a jank event tagged `"unknown"`;
//! - an **isolate** primitive that measures a bounded block of work against
//!   an explicit tolerance and tags any overrun with the caller's id. The
//!   scheduler wraps each slice in `isolate` so its own controlled pauses
//!   are never misreported as unknown stalls.
//!
//! Jank is advisory: it never aborts the measured block and never raises an
//! error. With no subscriber registered a default handler logs a warning;
//! subscribers suppress the default.

mod timer;

use crate::config::ConfigProvider;
use crate::event::{EventHub, Subscription};
use crate::host::HostQueue;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub(crate) use timer::TimerService;

/// Grace added to every threshold before a stall is reported, absorbing
/// timer and scheduling noise.
pub const WARN_VARIANCE: Duration = Duration::from_millis(2);

/// Tag used by the periodic self-check: a stall that no `isolate` block
/// claimed.
pub const UNKNOWN_WATCH_ID: &str = "unknown";

/// Advisory stall report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JankEvent {
    /// Observed elapsed time, in milliseconds.
    pub ms: u64,
    /// The isolate tag that measured the stall, or `"unknown"` for the
    /// periodic self-check.
    pub watch_id: String,
}

/// Handle for removing a jank subscriber.
pub type JankSubscription = Subscription<JankEvent>;

struct WatchdogState {
    running: bool,
    armed_at: Option<Instant>,
    /// Bumped on every pause/re-arm; a pending self-check whose generation
    /// is stale no-ops, which is how cancellation works.
    generation: u64,
}

struct WatchdogInner {
    state: Mutex<WatchdogState>,
    jank: EventHub<JankEvent>,
    timer: Arc<TimerService>,
    host: Arc<HostQueue>,
    config: Arc<dyn ConfigProvider>,
}

/// Periodic self-check plus the `isolate` measurement primitive.
#[derive(Clone)]
pub struct Watchdog {
    inner: Arc<WatchdogInner>,
}

impl Watchdog {
    pub(crate) fn new(
        host: Arc<HostQueue>,
        timer: Arc<TimerService>,
        config: Arc<dyn ConfigProvider>,
    ) -> Self {
        let jank = EventHub::with_default(|event: &JankEvent| {
            log::warn!(
                "{}ms jank detected in {} code; check your synchronous work",
                event.ms,
                event.watch_id
            );
        });
        Self {
            inner: Arc::new(WatchdogInner {
                state: Mutex::new(WatchdogState {
                    running: false,
                    armed_at: None,
                    generation: 0,
                }),
                jank,
                timer,
                host,
                config,
            }),
        }
    }

    /// Arm the periodic self-check.
    pub fn start(&self) {
        let mut state = self.inner.state.lock();
        state.running = true;
        self.arm(&mut state);
    }

    /// Cancel the pending self-check. Returns whether it was running.
    pub fn pause(&self) -> bool {
        let mut state = self.inner.state.lock();
        let was_running = state.running;
        state.running = false;
        state.armed_at = None;
        state.generation += 1;
        was_running
    }

    /// Pause and drop every jank subscriber; the default log handler takes
    /// over again.
    pub fn stop(&self) {
        self.pause();
        self.inner.jank.clear();
    }

    /// Pause, then start again only if it was running. Used when the warn
    /// threshold changes.
    pub fn restart(&self) {
        if self.pause() {
            self.start();
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().running
    }

    /// Register a jank subscriber. While any subscriber exists, the default
    /// log handler is suppressed.
    pub fn on_jank(&self, handler: impl Fn(&JankEvent) + Send + Sync + 'static) -> JankSubscription {
        self.inner.jank.subscribe(handler)
    }

    /// Run `block` with the periodic self-check suspended, then measure it
    /// against `timeout` (the warn threshold when `None`). An overrun emits
    /// one jank event tagged `watch_id`. The measurement and the resume both
    /// happen even if `block` panics; the timeout only affects reporting and
    /// never aborts the block.
    pub fn isolate<R>(
        &self,
        watch_id: &str,
        timeout: Option<Duration>,
        block: impl FnOnce() -> R,
    ) -> R {
        let tolerance = timeout.unwrap_or_else(|| self.inner.config.warn_ms()) + WARN_VARIANCE;
        let was_running = self.pause();
        let _guard = IsolateGuard {
            watchdog: self,
            started: Instant::now(),
            tolerance,
            watch_id: watch_id.to_string(),
            was_running,
        };
        block()
    }

    /// Arm the next self-check under the caller's lock.
    fn arm(&self, state: &mut WatchdogState) {
        state.generation += 1;
        state.armed_at = Some(Instant::now());
        let generation = state.generation;
        let warn = self.inner.config.warn_ms();
        let watchdog = self.clone();
        self.inner.timer.schedule(warn, move || {
            let host = watchdog.inner.host.clone();
            let check = watchdog.clone();
            host.defer(move || check.self_check(generation));
        });
    }

    /// The periodic check, run on the host thread. Lateness of this very
    /// callback is the signal: the host queue could not get to it in time.
    fn self_check(&self, generation: u64) {
        let overrun = {
            let mut state = self.inner.state.lock();
            if state.generation != generation || !state.running {
                return;
            }
            let Some(armed_at) = state.armed_at else {
                return;
            };
            let elapsed = armed_at.elapsed();
            let warn = self.inner.config.warn_ms();
            self.arm(&mut state);
            (elapsed > warn + WARN_VARIANCE).then_some(elapsed)
        };
        // Emit outside the lock so subscribers may use the watchdog.
        if let Some(elapsed) = overrun {
            self.emit(elapsed, UNKNOWN_WATCH_ID);
        }
    }

    fn emit(&self, elapsed: Duration, watch_id: &str) {
        self.inner.jank.emit(&JankEvent {
            ms: elapsed.as_millis() as u64,
            watch_id: watch_id.to_string(),
        });
    }
}

/// Resumes the self-check and reports the measurement when the isolated
/// block finishes, by normal return or by unwind.
struct IsolateGuard<'a> {
    watchdog: &'a Watchdog,
    started: Instant,
    tolerance: Duration,
    watch_id: String,
    was_running: bool,
}

impl Drop for IsolateGuard<'_> {
    fn drop(&mut self) {
        if self.was_running {
            self.watchdog.start();
        }
        let elapsed = self.started.elapsed();
        if elapsed > self.tolerance {
            self.watchdog.emit(elapsed, &self.watch_id);
        }
    }
}
