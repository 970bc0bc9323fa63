//! Convenience re-exports for the common surface of the crate.
//!
//! ```
//! use brigade::prelude::*;
//! ```

pub use crate::config::{Config, ConfigBuilder};
pub use crate::dispatch::{BackgroundExecutor, Executor, Job};
pub use crate::error::{Error, Result};
pub use crate::executor::{PoolSnapshot, PoolTask, TaskId, WorkerPool};
pub use crate::interrupt::{
    BlockingTask, ClosureTask, DeliverTask, Interruptible, InterruptibleTask, TaskCore,
};
pub use crate::util::{AtomicValue, WeakEqSet, WeakSet};
pub use crate::{init, init_with_config, shutdown};
