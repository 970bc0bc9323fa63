//! Cooperative task interruption.
//!
//! Interruption is advisory: [`Interruptible::interrupt`] raises a monotonic
//! flag and running code decides when to observe it. [`TaskCore`] is the
//! composite building block behind every task shape in this crate: it carries
//! the flag, a weak registry of child tasks that get interrupted along with
//! their parent, and a blocking-wait bridge for adapting callback-style APIs.

pub mod core;
pub mod shapes;

pub use self::core::TaskCore;
pub use shapes::{BlockingTask, ClosureTask, DeliverTask};

/// A unit of work that can be asked to stop.
///
/// `interrupt` must be idempotent and must not block. Once requested,
/// interruption is permanent: `is_interrupted` never goes back to `false`.
pub trait Interruptible: Send + Sync {
    /// Request cancellation.
    fn interrupt(&self);

    /// Whether cancellation has been requested.
    fn is_interrupted(&self) -> bool;
}

/// An [`Interruptible`] with an executable body.
///
/// The pool calls `run` exactly once, on a worker thread. Implementations
/// skip the body when the task was interrupted before it started, and a
/// repeated `run` is a no-op.
pub trait InterruptibleTask: Interruptible {
    /// Execute the task body on the calling thread.
    fn run(&self);
}
