//! Shared interruption state and the blocking-wait bridge.

use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::interrupt::Interruptible;
use crate::util::WeakSet;

/// The composite heart of an interruptible task.
///
/// A `TaskCore` bundles three things:
///
/// - a monotonic interrupted flag,
/// - a registry of weakly-held child tasks that are interrupted together
///   with this core,
/// - a wait bridge for turning callback-style completion into a blocking
///   call: a callee signals via [`finish`](TaskCore::finish) (or a wrapper
///   from [`wrap_callback`](TaskCore::wrap_callback)) and the task body
///   blocks in [`wait`](TaskCore::wait) until the signal or an interruption
///   arrives.
///
/// Clones are handles to the same state, so a core can be captured by a
/// callback on one thread while the task body waits on another.
///
/// ```
/// use brigade::TaskCore;
///
/// let core = TaskCore::new();
/// let done = core.wrap_callback(|n: u32| assert_eq!(n, 7));
/// std::thread::spawn(move || done(7));
/// core.wait().unwrap();
/// ```
#[derive(Clone, Default)]
pub struct TaskCore {
    inner: Arc<CoreInner>,
}

#[derive(Default)]
struct CoreInner {
    interrupted: AtomicBool,
    permits: Mutex<u32>,
    signal: Condvar,
    children: WeakSet<dyn Interruptible>,
}

impl TaskCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request interruption: raise the flag, wake any waiter on the bridge,
    /// then interrupt every live child.
    ///
    /// Safe to call repeatedly; only the first call propagates, which also
    /// keeps a cycle in the child graph from recursing. A child registered
    /// after the flag is up is interrupted at registration instead.
    pub fn interrupt(&self) {
        if self.inner.interrupted.swap(true, Ordering::SeqCst) {
            return;
        }
        // Serialize with the waiter's check-then-wait: once the permit lock
        // can be taken, any waiter that missed the flag is parked.
        drop(self.inner.permits.lock());
        self.inner.signal.notify_all();
        for child in self.inner.children.snapshot() {
            child.interrupt();
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.inner.interrupted.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once interruption has been requested.
    ///
    /// The usual cooperation point inside long-running bodies:
    /// `core.check_interrupted()?;`
    pub fn check_interrupted(&self) -> Result<()> {
        if self.is_interrupted() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Register a child that gets interrupted together with this core.
    ///
    /// The registry holds the child weakly; once the caller drops its last
    /// `Arc` the child silently leaves the tree. Registering the same child
    /// twice is a no-op. If this core is already interrupted the child is
    /// interrupted immediately.
    pub fn add_child<C>(&self, child: &Arc<C>)
    where
        C: Interruptible + 'static,
    {
        let entry: Arc<dyn Interruptible> = child.clone();
        self.inner.children.add_if_absent(&entry);
        if self.is_interrupted() {
            entry.interrupt();
        }
    }

    /// Number of live registered children.
    pub fn child_count(&self) -> usize {
        self.inner.children.len()
    }

    /// Raise the completion signal, releasing one [`wait`](TaskCore::wait).
    pub fn finish(&self) {
        let mut permits = self.inner.permits.lock();
        *permits = permits.saturating_add(1);
        drop(permits);
        self.inner.signal.notify_all();
    }

    /// Wrap a callback so that completion is signalled after it runs.
    ///
    /// Hand the wrapper to a callback-taking API, then block in
    /// [`wait`](TaskCore::wait); the wait returns once the callback has been
    /// delivered and executed.
    pub fn wrap_callback<T, F>(&self, callback: F) -> impl FnOnce(T) + Send
    where
        T: Send,
        F: FnOnce(T) + Send,
    {
        let core = self.clone();
        move |value| {
            callback(value);
            core.finish();
        }
    }

    /// Block until the completion signal or an interruption.
    ///
    /// Consumes one permit on success. Returns `Err(Interrupted)` when the
    /// core is interrupted, even if a signal arrived first: a wait on an
    /// interrupted core never reports plain success.
    pub fn wait(&self) -> Result<()> {
        self.wait_deadline(None)
    }

    /// Like [`wait`](TaskCore::wait), but gives up with `Err(TimedOut)` once
    /// `timeout` elapses without a signal or interruption.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<()> {
        self.wait_deadline(Some(Instant::now() + timeout))
    }

    /// Wait and absorb the outcome, reporting whether this core ended up
    /// interrupted.
    pub fn wait_interrupted(&self) -> bool {
        self.wait_deadline(None).is_err()
    }

    fn wait_deadline(&self, deadline: Option<Instant>) -> Result<()> {
        let mut permits = self.inner.permits.lock();
        loop {
            if *permits > 0 {
                *permits -= 1;
                break;
            }
            if self.is_interrupted() {
                return Err(Error::Interrupted);
            }
            let timed_out = match deadline {
                Some(deadline) => self
                    .inner
                    .signal
                    .wait_until(&mut permits, deadline)
                    .timed_out(),
                None => {
                    self.inner.signal.wait(&mut permits);
                    false
                }
            };
            // A signal can land between the deadline passing and the lock
            // being reacquired; only a still-empty bridge is a timeout.
            if timed_out && *permits == 0 {
                return if self.is_interrupted() {
                    Err(Error::Interrupted)
                } else {
                    Err(Error::TimedOut)
                };
            }
        }
        drop(permits);
        if self.is_interrupted() {
            return Err(Error::Interrupted);
        }
        Ok(())
    }
}

impl Interruptible for TaskCore {
    fn interrupt(&self) {
        TaskCore::interrupt(self);
    }

    fn is_interrupted(&self) -> bool {
        TaskCore::is_interrupted(self)
    }
}

impl fmt::Debug for TaskCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCore")
            .field("interrupted", &self.is_interrupted())
            .field("permits", &*self.inner.permits.lock())
            .field("children", &self.inner.children.len())
            .finish()
    }
}
