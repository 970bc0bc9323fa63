//! BRIGADE - elastic worker pool with cooperative task interruption
//!
//! A self-managing pool of worker threads that grows on demand up to a fixed
//! capacity, reclaims idle workers, and executes tasks that can be asked to
//! stop cooperatively, including whole trees of parent and child tasks.
//!
//! # Quick Start
//!
//! ```no_run
//! use brigade::prelude::*;
//!
//! let pool = WorkerPool::new(Config::default()).unwrap();
//!
//! // Workers are created lazily, up to the configured capacity.
//! let task = pool.spawn(|| {
//!     // background work
//! });
//!
//! // Cancellation is cooperative: the flag flips now, the task observes
//! // it at its next check.
//! task.interrupt();
//!
//! pool.run_to_completion();
//! ```
//!
//! # Features
//!
//! - **Elastic workers**: zero threads at rest, on-demand growth, idle
//!   reclamation after a configurable timeout
//! - **Cooperative interruption**: advisory flags with parent-to-child
//!   propagation through weakly-held registries
//! - **Blocking-wait bridge**: adapt callback-style APIs into synchronous,
//!   interruptible task bodies
//! - **Queue surgery**: atomic inspection and replacement of pending work
//! - **Shared pool**: optional process-wide instance behind an explicit
//!   `init`
//! - **Serde**: `PoolSnapshot` diagnostics serialization (optional)

// Lint configuration
#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod interrupt;
pub mod prelude;
pub mod runtime;
pub mod util;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use executor::{PoolSnapshot, PoolTask, WorkerPool};
pub use interrupt::{
    BlockingTask, ClosureTask, DeliverTask, Interruptible, InterruptibleTask, TaskCore,
};
pub use runtime::{init, init_with_config, shutdown};
pub use util::{AtomicValue, WeakEqSet, WeakSet};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_pool_executes_submitted_closures() {
        let pool = WorkerPool::new(Config::default()).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        pool.run_to_completion();
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_interrupted_task_is_skipped() {
        let pool = WorkerPool::new(Config::builder().capacity(1).build().unwrap()).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));

        pool.spawn(|| thread::sleep(Duration::from_millis(50)));
        let counter = Arc::clone(&ran);
        let task = pool.spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        task.interrupt();

        pool.run_to_completion();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_primitives_compose() {
        let seen = AtomicValue::new(Vec::new());
        let registry: WeakSet<TaskCore> = WeakSet::new();

        let core = Arc::new(TaskCore::new());
        registry.add(&core);
        seen.modify(|v| v.push(1));

        assert_eq!(registry.len(), 1);
        assert_eq!(seen.get(), vec![1]);
    }
}
