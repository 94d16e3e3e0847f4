//! Jobs, resumable work, and the caller-facing handle.
//!
//! A submission is a [`Work`] payload: either a plain single-shot
//! computation (wrapped so it completes on its first step) or a resumable
//! computation that keeps its state in its own captures and is stepped once
//! per scheduler turn. Nothing runs at submit time; the first step happens
//! on a later host turn.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Failure raised while stepping a job. Isolated to that job's handle;
/// never propagates into the scheduler loop or other jobs.
pub type JobError = anyhow::Error;

/// Outcome of one step of a resumable computation.
pub enum Step<T> {
    /// The computation finished with a value.
    Done(T),
    /// More work remains; the job goes back to its lane's tail and resumes
    /// on a later turn.
    Yield,
}

/// Per-step view of the current turn, so long-running steps can check the
/// remaining budget at their own yield points.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeContext {
    deadline: Instant,
}

impl RuntimeContext {
    pub(crate) fn new(deadline: Instant) -> Self {
        Self { deadline }
    }

    /// The turn's hard edge; work past this point overruns the slice.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// True once the turn budget is spent. Cooperative steps should yield
    /// promptly when this turns true.
    pub fn should_yield(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Budget left in the current turn.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

type StepFn<T> = Box<dyn FnMut(&RuntimeContext) -> Result<Step<T>, JobError> + Send>;

/// A unit of work accepted by [`Scheduler::submit`](crate::Scheduler::submit).
pub struct Work<T> {
    step: StepFn<T>,
}

impl<T: Send + 'static> Work<T> {
    /// A plain single-shot computation; completes on its first step.
    pub fn new(f: impl FnOnce() -> T + Send + 'static) -> Self {
        Self::fallible(move || Ok(f()))
    }

    /// A single-shot computation that may fail; an `Err` rejects the job's
    /// handle.
    pub fn fallible(f: impl FnOnce() -> Result<T, JobError> + Send + 'static) -> Self {
        let mut f = Some(f);
        Self {
            step: Box::new(move |_cx| match f.take() {
                Some(f) => Ok(Step::Done(f()?)),
                // A settled job is dropped by the loop and never re-stepped.
                None => Err(anyhow::anyhow!("single-shot job stepped after completion")),
            }),
        }
    }

    /// A resumable computation, stepped once per turn until it reports
    /// [`Step::Done`]. State lives in the closure's captures and persists
    /// across steps.
    pub fn resumable(
        f: impl FnMut(&RuntimeContext) -> Result<Step<T>, JobError> + Send + 'static,
    ) -> Self {
        Self { step: Box::new(f) }
    }
}

/// Shared settle slot between a [`Job`] and its [`JobHandle`].
/// `None` while pending; settled exactly once.
type SettleSlot<T> = Arc<Mutex<Option<Result<T, JobError>>>>;

/// The caller's future for a submitted job. Never settles synchronously
/// inside `submit`; completions are dispatched through the host queue.
pub struct JobHandle<T> {
    slot: SettleSlot<T>,
}

impl<T> Clone for JobHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> JobHandle<T> {
    pub(crate) fn new(slot: SettleSlot<T>) -> Self {
        Self { slot }
    }

    /// True once the job resolved or rejected.
    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Take the outcome, leaving the handle empty. `None` while pending.
    pub fn take(&self) -> Option<Result<T, JobError>> {
        self.slot.lock().take()
    }
}

/// What the loop does with a job after one step.
pub(crate) enum StepOutcome {
    /// Unfinished; re-enqueue at the lane's tail.
    Pending,
    /// Finished or failed; the boxed settle callback is deferred through
    /// the host queue (resolve xor reject, exactly once).
    Settle(Box<dyn FnOnce() + Send>),
}

/// Type-erased job owned by its lane's queue until dequeued for a step.
pub(crate) struct Job {
    pub(crate) lane: String,
    step: Box<dyn FnMut(&RuntimeContext) -> StepOutcome + Send>,
}

impl Job {
    pub(crate) fn new<T: Send + 'static>(lane: String, work: Work<T>, slot: SettleSlot<T>) -> Self {
        let mut step = work.step;
        Self {
            lane,
            step: Box::new(move |cx| match step(cx) {
                Ok(Step::Yield) => StepOutcome::Pending,
                Ok(Step::Done(value)) => {
                    let slot = slot.clone();
                    StepOutcome::Settle(Box::new(move || {
                        *slot.lock() = Some(Ok(value));
                    }))
                }
                Err(err) => {
                    let slot = slot.clone();
                    StepOutcome::Settle(Box::new(move || {
                        *slot.lock() = Some(Err(err));
                    }))
                }
            }),
        }
    }

    /// Step the continuation exactly once.
    pub(crate) fn step(&mut self, cx: &RuntimeContext) -> StepOutcome {
        (self.step)(cx)
    }
}
