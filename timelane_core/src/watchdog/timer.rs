//! Background timer feeding the watchdog's periodic self-check.
//!
//! One worker thread holds the pending deadlines and fires callbacks when
//! they come due. Callbacks must be cheap: the watchdog only uses them to
//! defer its self-check onto the host queue, so user code never runs on the
//! timer thread and a stalled host thread delays the check exactly the way
//! a stalled event loop delays its timers.

use crossbeam::channel::{unbounded, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

type Callback = Box<dyn FnOnce() + Send>;

enum TimerCmd {
    Schedule { due: Instant, callback: Callback },
    Shutdown,
}

/// Handle to the timer worker. Dropping it shuts the worker down.
pub(crate) struct TimerService {
    tx: Sender<TimerCmd>,
    worker: Option<JoinHandle<()>>,
}

impl TimerService {
    pub fn new() -> Self {
        let (tx, rx) = unbounded::<TimerCmd>();
        let worker = std::thread::spawn(move || {
            let mut pending: Vec<(Instant, Callback)> = Vec::new();
            loop {
                let next_due = pending.iter().map(|(due, _)| *due).min();
                let cmd = match next_due {
                    Some(due) => {
                        match rx.recv_timeout(due.saturating_duration_since(Instant::now())) {
                            Ok(cmd) => Some(cmd),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => break,
                        }
                    }
                    None => match rx.recv() {
                        Ok(cmd) => Some(cmd),
                        Err(_) => break,
                    },
                };
                match cmd {
                    Some(TimerCmd::Schedule { due, callback }) => pending.push((due, callback)),
                    Some(TimerCmd::Shutdown) => break,
                    None => {}
                }
                let now = Instant::now();
                let mut i = 0;
                while i < pending.len() {
                    if pending[i].0 <= now {
                        let (_, callback) = pending.swap_remove(i);
                        callback();
                    } else {
                        i += 1;
                    }
                }
            }
        });
        Self {
            tx,
            worker: Some(worker),
        }
    }

    /// Fire `callback` on the timer thread after `delay`. Cancellation is
    /// the caller's concern (the watchdog uses a generation counter so a
    /// stale callback no-ops).
    pub fn schedule(&self, delay: Duration, callback: impl FnOnce() + Send + 'static) {
        let cmd = TimerCmd::Schedule {
            due: Instant::now() + delay,
            callback: Box::new(callback),
        };
        if self.tx.send(cmd).is_err() {
            log::warn!("timer worker is gone; dropping scheduled callback");
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        let _ = self.tx.send(TimerCmd::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fires_after_delay() {
        let timer = TimerService::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();
        let start = Instant::now();
        timer.schedule(Duration::from_millis(20), move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        while fired.load(Ordering::SeqCst) == 0 {
            assert!(start.elapsed() < Duration::from_secs(2), "timer never fired");
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_ordering_of_two_timers() {
        let timer = TimerService::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (a, b) = (order.clone(), order.clone());
        timer.schedule(Duration::from_millis(40), move || a.lock().push("slow"));
        timer.schedule(Duration::from_millis(10), move || b.lock().push("fast"));
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(*order.lock(), vec!["fast", "slow"]);
    }
}
