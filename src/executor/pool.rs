//! The elastic worker pool.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use tracing::{debug, error};

use super::task::PoolTask;
use super::worker::{Worker, WorkerId};
use crate::config::Config;
use crate::dispatch;
use crate::error::Result;
use crate::interrupt::{ClosureTask, InterruptibleTask};

/// A self-managing pool of worker threads executing interruptible tasks in
/// FIFO order.
///
/// Workers are created on demand, up to the configured capacity, and retire
/// after sitting idle for the configured timeout; a fresh pool holds zero
/// threads. Dropping the pool triggers a graceful [`shutdown`](WorkerPool::shutdown).
///
/// ```
/// use brigade::{Config, Interruptible, WorkerPool};
///
/// let pool = WorkerPool::new(Config::default()).unwrap();
/// let task = pool.spawn(|| {
///     // runs on a pool thread
/// });
/// pool.run_to_completion();
/// assert!(!task.is_interrupted());
/// ```
pub struct WorkerPool {
    shared: Arc<Shared>,
}

/// State shared between the pool handle and its workers.
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) capacity: usize,
    pub(crate) state: Mutex<PoolState>,
    // Workers park on this pair; the only lock nesting in the crate is
    // wait_lock -> state inside the worker's dequeue loop.
    pub(crate) wait_lock: Mutex<()>,
    pub(crate) wait_cond: Condvar,
    next_worker_id: AtomicUsize,
}

#[derive(Default)]
pub(crate) struct PoolState {
    pub(crate) queue: VecDeque<PoolTask>,
    pub(crate) running: Vec<PoolTask>,
    pub(crate) workers: Vec<WorkerHandle>,
    pub(crate) submitted: u64,
    pub(crate) stopped: bool,
    pub(crate) shutting_down: bool,
}

pub(crate) struct WorkerHandle {
    pub(crate) id: WorkerId,
    pub(crate) thread_id: ThreadId,
}

impl Shared {
    /// Spawn `min(capacity - workers, queue)` new workers. Call with the
    /// state lock held.
    pub(crate) fn spawn_missing(self: &Arc<Self>, state: &mut PoolState) {
        if state.shutting_down {
            return;
        }
        let missing = self
            .capacity
            .saturating_sub(state.workers.len())
            .min(state.queue.len());

        for _ in 0..missing {
            let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
            let worker = Worker::new(id, Arc::clone(self));
            let mut builder =
                thread::Builder::new().name(format!("{}-{}", self.config.thread_name_prefix, id));
            if let Some(stack_size) = self.config.stack_size {
                builder = builder.stack_size(stack_size);
            }
            match builder.spawn(move || worker.run()) {
                Ok(handle) => {
                    state.workers.push(WorkerHandle {
                        id,
                        thread_id: handle.thread().id(),
                    });
                }
                Err(e) => error!("failed to spawn worker {id}: {e}"),
            }
        }
    }

    /// Wake every parked worker. Must not be called with the state lock
    /// held: takes the wait lock, which serializes with the workers'
    /// check-then-wait so no wakeup is lost.
    pub(crate) fn wake_workers(&self) {
        drop(self.wait_lock.lock());
        self.wait_cond.notify_all();
    }
}

impl WorkerPool {
    /// Create a pool from a validated configuration. No threads start until
    /// the first submission.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let capacity = config.worker_capacity();
        debug!("pool created, capacity {capacity}");
        Ok(WorkerPool {
            shared: Arc::new(Shared {
                capacity,
                config,
                state: Mutex::new(PoolState::default()),
                wait_lock: Mutex::new(()),
                wait_cond: Condvar::new(),
                next_worker_id: AtomicUsize::new(0),
            }),
        })
    }

    /// Enqueue a task. Silently dropped when the pool is stopped.
    pub fn submit(&self, action: Arc<dyn InterruptibleTask>) {
        self.submit_task(PoolTask::new(action));
    }

    /// Enqueue an already-wrapped task. Silently dropped when the pool is
    /// stopped. Safe to call from any thread, including a worker's.
    pub fn submit_task(&self, task: PoolTask) {
        {
            let mut state = self.shared.state.lock();
            if state.stopped {
                debug!("task {:?} dropped, pool is stopped", task.id());
                return;
            }
            state.queue.push_back(task);
            state.submitted += 1;
            self.shared.spawn_missing(&mut state);
        }
        self.shared.wake_workers();
    }

    /// Submit a plain closure, returning the task handle so the caller can
    /// interrupt it later.
    pub fn spawn<F>(&self, f: F) -> Arc<ClosureTask>
    where
        F: FnOnce() + Send + 'static,
    {
        let task = ClosureTask::new(f);
        self.submit(task.clone());
        task
    }

    /// Atomically replace the queue through `transform`.
    ///
    /// The transform receives every queued task and returns the tasks to
    /// keep (reordered, filtered, or with new ones injected); the net length
    /// change adjusts the submission counter. Runs under the pool lock, so
    /// the transform must not call back into this pool.
    pub fn drain_queue<F>(&self, transform: F)
    where
        F: FnOnce(Vec<PoolTask>) -> Vec<PoolTask>,
    {
        self.drain_queue_with_running(move |queued, _running| transform(queued));
    }

    /// Observe the currently running tasks under the pool lock.
    ///
    /// The observer must not call back into this pool.
    pub fn with_running_tasks<F>(&self, observe: F)
    where
        F: FnOnce(&[PoolTask]),
    {
        let state = self.shared.state.lock();
        observe(&state.running);
    }

    /// [`drain_queue`](WorkerPool::drain_queue), with the running tasks
    /// visible to the transform for dedup-style decisions.
    pub fn drain_queue_with_running<F>(&self, transform: F)
    where
        F: FnOnce(Vec<PoolTask>, &[PoolTask]) -> Vec<PoolTask>,
    {
        let grew;
        {
            let mut state = self.shared.state.lock();
            let before = state.queue.len();
            let drained: Vec<PoolTask> = std::mem::take(&mut state.queue).into();
            let replaced = transform(drained, &state.running);
            let after = replaced.len();
            state.queue = replaced.into();
            state.submitted = state.submitted + after as u64 - before as u64;
            self.shared.spawn_missing(&mut state);
            grew = after > before;
        }
        if grew {
            self.shared.wake_workers();
        }
    }

    /// Discard every queued task, interrupt every running one, and refuse
    /// all future submissions. Does not wait for running tasks to finish.
    pub fn stop(&self) {
        let to_interrupt: Vec<PoolTask> = {
            let mut state = self.shared.state.lock();
            let discarded = state.queue.len();
            state.queue.clear();
            state.stopped = true;
            debug!(
                "pool stopped, {discarded} queued discarded, {} running interrupted",
                state.running.len()
            );
            state.running.clone()
        };
        // Interrupt handlers may run arbitrary code, so signal outside the
        // pool lock.
        for task in &to_interrupt {
            task.interrupt();
        }
    }

    /// Let the pool wind down once all work has finished.
    ///
    /// The convergence check runs on a background thread, so this returns
    /// immediately. Once the queue and running set are both empty every
    /// worker is woken and exits; until then, submitted work keeps being
    /// executed. Idempotent.
    pub fn shutdown(&self) {
        let shared = Arc::clone(&self.shared);
        dispatch::background(move || {
            loop {
                {
                    let mut state = shared.state.lock();
                    if state.shutting_down {
                        break;
                    }
                    if state.queue.is_empty() && state.running.is_empty() {
                        state.shutting_down = true;
                        debug!("pool idle, retiring workers");
                        break;
                    }
                }
                thread::sleep(Duration::from_millis(1));
            }
            shared.wake_workers();
        });
    }

    /// One step of a busy-poll wait: `true` once the queue and running set
    /// are both empty, otherwise sleep `poll` and report `false`.
    pub fn block_until_idle(&self, poll: Duration) -> bool {
        let idle = {
            let state = self.shared.state.lock();
            state.queue.is_empty() && state.running.is_empty()
        };
        if !idle {
            thread::sleep(poll);
        }
        idle
    }

    /// Block until all submitted work has finished, then shut the pool down.
    pub fn run_to_completion(&self) {
        while !self.block_until_idle(Duration::from_millis(100)) {}
        self.shutdown();
    }

    /// Whether the calling thread is one of this pool's workers.
    pub fn is_worker_thread(&self) -> bool {
        let current = thread::current().id();
        self.shared
            .state
            .lock()
            .workers
            .iter()
            .any(|w| w.thread_id == current)
    }

    /// Number of tasks waiting in the queue.
    pub fn queued_count(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Number of tasks currently executing on workers.
    pub fn running_count(&self) -> usize {
        self.shared.state.lock().running.len()
    }

    /// Number of submissions that have started execution (running or done).
    pub fn in_progress_count(&self) -> u64 {
        let state = self.shared.state.lock();
        state.submitted - state.queue.len() as u64
    }

    /// Total accepted submissions, net of queue-transform adjustments.
    pub fn submitted_count(&self) -> u64 {
        self.shared.state.lock().submitted
    }

    /// Number of live worker threads.
    pub fn worker_count(&self) -> usize {
        self.shared.state.lock().workers.len()
    }

    /// Clones of the currently running tasks.
    pub fn running_tasks(&self) -> Vec<PoolTask> {
        self.shared.state.lock().running.clone()
    }

    /// Whether [`stop`](WorkerPool::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.state.lock().stopped
    }

    /// The maximum number of workers.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// All diagnostic counters, read in one lock acquisition.
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.shared.state.lock();
        PoolSnapshot {
            queued: state.queue.len(),
            running: state.running.len(),
            in_progress: state.submitted - state.queue.len() as u64,
            submitted: state.submitted,
            workers: state.workers.len(),
            capacity: self.shared.capacity,
            stopped: state.stopped,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.shared.capacity)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of the pool's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolSnapshot {
    /// Tasks waiting in the queue.
    pub queued: usize,
    /// Tasks currently executing.
    pub running: usize,
    /// Submissions that have started execution (running or done).
    pub in_progress: u64,
    /// Total accepted submissions.
    pub submitted: u64,
    /// Live worker threads.
    pub workers: usize,
    /// Maximum worker threads.
    pub capacity: usize,
    /// Whether the pool refuses new submissions.
    pub stopped: bool,
}
