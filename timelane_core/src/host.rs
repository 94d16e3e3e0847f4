//! The host-thread deferral primitive.
//!
//! The scheduler never runs a turn or settles a future synchronously inside
//! `submit`; both go through this queue, modeling the host's own task queue.
//! The embedding application pumps it from a single thread (`run_one`,
//! `run_until_idle`, `run_for`), which is what makes the whole runtime
//! cooperative: between any two deferred tasks the host is free to do its
//! own work.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

type Thunk = Box<dyn FnOnce() + Send>;

/// Unbounded FIFO of deferred thunks, pumped by the host thread.
pub struct HostQueue {
    tasks: Mutex<VecDeque<Thunk>>,
}

impl HostQueue {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    /// Enqueue a thunk for a later pump. Never runs it inline.
    pub fn defer(&self, thunk: impl FnOnce() + Send + 'static) {
        self.tasks.lock().push_back(Box::new(thunk));
    }

    /// Run the oldest deferred thunk. Returns `false` if the queue was
    /// empty. The queue lock is released before the thunk runs, so thunks
    /// may defer further work.
    pub fn run_one(&self) -> bool {
        let thunk = self.tasks.lock().pop_front();
        match thunk {
            Some(thunk) => {
                thunk();
                true
            }
            None => false,
        }
    }

    /// Pump until the queue is empty, including tasks deferred while
    /// pumping. Returns how many thunks ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }

    /// Pump for at least `window`, parking briefly while the queue is empty
    /// so work fed in from a timer thread still gets a turn. Returns how
    /// many thunks ran.
    pub fn run_for(&self, window: Duration) -> usize {
        let deadline = Instant::now() + window;
        let mut ran = 0;
        loop {
            while self.run_one() {
                ran += 1;
            }
            if Instant::now() >= deadline {
                return ran;
            }
            // Short naps keep the pump responsive to timer-fed tasks; the
            // watchdog's stall tolerance is only a couple milliseconds.
            std::thread::sleep(Duration::from_micros(200));
        }
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_idle()
    }
}

impl Default for HostQueue {
    fn default() -> Self {
        Self::new()
    }
}
