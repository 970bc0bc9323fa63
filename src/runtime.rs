//! Process-wide shared pool.
//!
//! One [`WorkerPool`] for components that want a common background pool.
//! The pool is constructed explicitly via [`init`] or [`init_with_config`]
//! and reached through [`handle`]; there is no implicit lazy construction,
//! so components take the handle once and pass it around from there.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::WorkerPool;
use crate::interrupt::{ClosureTask, InterruptibleTask};

static GLOBAL_POOL: RwLock<Option<Arc<WorkerPool>>> = RwLock::new(None);

/// Create the shared pool with the default configuration.
pub fn init() -> Result<()> {
    init_with_config(Config::default())
}

/// Create the shared pool. Fails with `AlreadyInitialized` when one already
/// exists.
pub fn init_with_config(config: Config) -> Result<()> {
    let mut global = GLOBAL_POOL.write();
    if global.is_some() {
        return Err(Error::AlreadyInitialized);
    }
    *global = Some(Arc::new(WorkerPool::new(config)?));
    Ok(())
}

/// The shared pool, for injection into components that submit work.
pub fn handle() -> Result<Arc<WorkerPool>> {
    GLOBAL_POOL.read().clone().ok_or(Error::NotInitialized)
}

/// Submit a closure to the shared pool, returning its handle.
pub fn spawn<F>(f: F) -> Result<Arc<ClosureTask>>
where
    F: FnOnce() + Send + 'static,
{
    Ok(handle()?.spawn(f))
}

/// Submit a task to the shared pool.
pub fn submit(task: Arc<dyn InterruptibleTask>) -> Result<()> {
    handle()?.submit(task);
    Ok(())
}

/// Drop the shared pool. Its workers finish outstanding tasks and exit.
pub fn shutdown() {
    *GLOBAL_POOL.write() = None;
}
