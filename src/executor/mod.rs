//! Task execution infrastructure.
//!
//! This module provides the worker pool and its task bookkeeping: FIFO
//! dispatch, on-demand worker creation up to a fixed capacity, and idle
//! worker reclamation.

pub mod pool;
pub mod task;
pub mod worker;

pub use pool::{PoolSnapshot, WorkerPool};
pub use task::{PoolTask, TaskId};
