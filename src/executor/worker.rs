//! Worker thread loop.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::pool::Shared;

pub type WorkerId = usize;

pub(crate) struct Worker {
    id: WorkerId,
    shared: Arc<Shared>,
}

impl Worker {
    pub(crate) fn new(id: WorkerId, shared: Arc<Shared>) -> Self {
        Worker { id, shared }
    }

    // main loop
    pub(crate) fn run(self) {
        // Dropped on every exit path, so a panic cannot leak a capacity slot.
        let _deregister = Deregister {
            id: self.id,
            shared: Arc::clone(&self.shared),
        };
        debug!("worker {} started", self.id);

        let idle_timeout = self.shared.config.idle_timeout;
        let mut last_activity = Instant::now();

        loop {
            let task = {
                let mut parked = self.shared.wait_lock.lock();
                loop {
                    {
                        let mut state = self.shared.state.lock();
                        if state.shutting_down {
                            debug!("worker {} exiting, pool shut down", self.id);
                            return;
                        }
                        if let Some(task) = state.queue.pop_front() {
                            state.running.push(task.clone());
                            break task;
                        }
                    }
                    if last_activity.elapsed() >= idle_timeout {
                        debug!("worker {} idle, retiring", self.id);
                        return;
                    }
                    // Bounded wait so the reclamation check re-runs even
                    // without a wakeup.
                    self.shared.wait_cond.wait_for(&mut parked, idle_timeout);
                }
            };

            if catch_unwind(AssertUnwindSafe(|| task.execute())).is_err() {
                debug!("worker {}: task {:?} panicked", self.id, task.id());
            }

            {
                let mut state = self.shared.state.lock();
                state.running.retain(|t| t != &task);
                self.shared.spawn_missing(&mut state);
            }
            last_activity = Instant::now();
        }
    }
}

struct Deregister {
    id: WorkerId,
    shared: Arc<Shared>,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock();
        state.workers.retain(|w| w.id != self.id);
        // A submission that raced this exit may be sitting in the queue
        // with no worker left for it.
        self.shared.spawn_missing(&mut state);
    }
}
