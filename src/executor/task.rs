//! Task representation inside the pool.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::interrupt::InterruptibleTask;

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// One submission, as the pool tracks it.
///
/// Wraps the submitted task together with a fresh [`TaskId`], and compares
/// by that id: the queue's copy and the `running` copy of one submission are
/// equal, while submitting the same `Arc` twice yields two distinct entries.
/// Cloning is cheap (an `Arc` bump).
pub struct PoolTask {
    id: TaskId,
    action: Arc<dyn InterruptibleTask>,
}

impl PoolTask {
    pub fn new(action: Arc<dyn InterruptibleTask>) -> Self {
        PoolTask {
            id: TaskId::next(),
            action,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The wrapped task.
    pub fn action(&self) -> &Arc<dyn InterruptibleTask> {
        &self.action
    }

    /// Ask the wrapped task to stop.
    pub fn interrupt(&self) {
        self.action.interrupt();
    }

    pub fn is_interrupted(&self) -> bool {
        self.action.is_interrupted()
    }

    /// Run the body unless interruption already arrived.
    pub(crate) fn execute(&self) {
        if !self.action.is_interrupted() {
            self.action.run();
        }
    }
}

impl Clone for PoolTask {
    fn clone(&self) -> Self {
        PoolTask {
            id: self.id,
            action: Arc::clone(&self.action),
        }
    }
}

impl PartialEq for PoolTask {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PoolTask {}

impl std::hash::Hash for PoolTask {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PoolTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolTask")
            .field("id", &self.id)
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}
