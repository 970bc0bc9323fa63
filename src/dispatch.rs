//! Execution-context abstractions.
//!
//! The pool and the task shapes never own an event loop. Anything that has to
//! run somewhere else, like a continuation on a UI thread or a detached
//! background job, goes through the small surface here: [`Executor`] for a
//! caller-supplied context, [`background`] for a one-off thread.

use std::thread;
use std::time::Duration;

use tracing::error;

/// A unit of work handed to an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something able to run a job on a context it owns.
///
/// Implemented for any `Fn(Job)` closure, so an event loop can be adapted
/// in one line:
///
/// ```
/// use brigade::dispatch::{Executor, Job};
///
/// let (tx, rx) = std::sync::mpsc::channel::<Job>();
/// let executor = move |job: Job| {
///     tx.send(job).ok();
/// };
/// executor.execute(Box::new(|| println!("ran on the loop")));
/// for job in rx.try_iter() {
///     job();
/// }
/// ```
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

impl<F> Executor for F
where
    F: Fn(Job) + Send + Sync,
{
    fn execute(&self, job: Job) {
        self(job)
    }
}

/// Run a job soon, off the calling thread.
///
/// Backed by a detached named thread. If the thread cannot be spawned the
/// job is dropped and the failure logged.
pub fn background<F>(job: F)
where
    F: FnOnce() + Send + 'static,
{
    if let Err(e) = thread::Builder::new()
        .name("brigade-dispatch".to_string())
        .spawn(job)
    {
        error!("failed to spawn dispatch thread: {e}");
    }
}

/// Run a job after a delay, off the calling thread.
pub fn after<F>(delay: Duration, job: F)
where
    F: FnOnce() + Send + 'static,
{
    background(move || {
        thread::sleep(delay);
        job();
    });
}

/// [`Executor`] handle over [`background`], for callers that need an object
/// rather than a function.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackgroundExecutor;

impl Executor for BackgroundExecutor {
    fn execute(&self, job: Job) {
        background(job);
    }
}
