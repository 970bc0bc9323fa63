//! Ready-made task shapes built on [`TaskCore`].

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::{BackgroundExecutor, Executor};
use crate::interrupt::{Interruptible, InterruptibleTask, TaskCore};

/// A fire-and-forget closure task.
///
/// `run` executes the closure once, unless the task was interrupted first.
pub struct ClosureTask {
    core: TaskCore,
    body: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl ClosureTask {
    pub fn new(body: impl FnOnce() + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            core: TaskCore::new(),
            body: Mutex::new(Some(Box::new(body))),
        })
    }

    pub fn core(&self) -> &TaskCore {
        &self.core
    }
}

impl Interruptible for ClosureTask {
    fn interrupt(&self) {
        self.core.interrupt();
    }

    fn is_interrupted(&self) -> bool {
        self.core.is_interrupted()
    }
}

impl InterruptibleTask for ClosureTask {
    fn run(&self) {
        if self.core.is_interrupted() {
            return;
        }
        let body = self.body.lock().take();
        if let Some(body) = body {
            body();
        }
    }
}

impl fmt::Debug for ClosureTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureTask")
            .field("core", &self.core)
            .field("pending", &self.body.lock().is_some())
            .finish()
    }
}

/// A task whose body drives a callback-style API and blocks until done.
///
/// The body receives this task's [`TaskCore`] so it can hand out wrappers
/// from [`TaskCore::wrap_callback`] (or call [`TaskCore::finish`] itself).
/// After the body returns, `run` waits on the core's bridge, so the worker
/// thread is held until the callback lands or the task is interrupted. The
/// interrupted outcome of that wait is absorbed; callers who care inspect
/// `is_interrupted` afterwards.
pub struct BlockingTask {
    core: TaskCore,
    body: Mutex<Option<Box<dyn FnOnce(&TaskCore) + Send>>>,
}

impl BlockingTask {
    pub fn new(body: impl FnOnce(&TaskCore) + Send + 'static) -> Arc<Self> {
        Arc::new(Self {
            core: TaskCore::new(),
            body: Mutex::new(Some(Box::new(body))),
        })
    }

    pub fn core(&self) -> &TaskCore {
        &self.core
    }
}

impl Interruptible for BlockingTask {
    fn interrupt(&self) {
        self.core.interrupt();
    }

    fn is_interrupted(&self) -> bool {
        self.core.is_interrupted()
    }
}

impl InterruptibleTask for BlockingTask {
    fn run(&self) {
        if self.core.is_interrupted() {
            return;
        }
        let body = self.body.lock().take();
        if let Some(body) = body {
            body(&self.core);
            self.core.wait_interrupted();
        }
    }
}

impl fmt::Debug for BlockingTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingTask")
            .field("core", &self.core)
            .field("pending", &self.body.lock().is_some())
            .finish()
    }
}

/// A compute-then-deliver task.
///
/// `run` executes the computation on the worker thread, then hands the
/// result to the continuation through the designated [`Executor`]. The flag
/// is re-checked between the two steps: a task interrupted after computing
/// drops its result and never schedules the continuation.
pub struct DeliverTask<R> {
    core: TaskCore,
    body: Mutex<Option<Box<dyn FnOnce() -> R + Send>>>,
    deliver: Mutex<Option<Box<dyn FnOnce(R) + Send>>>,
    executor: Arc<dyn Executor>,
}

impl<R: Send + 'static> DeliverTask<R> {
    pub fn new(
        body: impl FnOnce() -> R + Send + 'static,
        deliver: impl FnOnce(R) + Send + 'static,
        executor: Arc<dyn Executor>,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: TaskCore::new(),
            body: Mutex::new(Some(Box::new(body))),
            deliver: Mutex::new(Some(Box::new(deliver))),
            executor,
        })
    }

    /// Deliver on a fresh background thread.
    pub fn background(
        body: impl FnOnce() -> R + Send + 'static,
        deliver: impl FnOnce(R) + Send + 'static,
    ) -> Arc<Self> {
        Self::new(body, deliver, Arc::new(BackgroundExecutor))
    }

    pub fn core(&self) -> &TaskCore {
        &self.core
    }
}

impl<R: Send + 'static> Interruptible for DeliverTask<R> {
    fn interrupt(&self) {
        self.core.interrupt();
    }

    fn is_interrupted(&self) -> bool {
        self.core.is_interrupted()
    }
}

impl<R: Send + 'static> InterruptibleTask for DeliverTask<R> {
    fn run(&self) {
        if self.core.is_interrupted() {
            return;
        }
        let body = self.body.lock().take();
        let Some(body) = body else { return };
        let result = body();

        if self.core.is_interrupted() {
            return;
        }
        let deliver = self.deliver.lock().take();
        if let Some(deliver) = deliver {
            self.executor.execute(Box::new(move || deliver(result)));
        }
    }
}

impl<R> fmt::Debug for DeliverTask<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliverTask")
            .field("core", &self.core)
            .field("pending", &self.body.lock().is_some())
            .finish()
    }
}
