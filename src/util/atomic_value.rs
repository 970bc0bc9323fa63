//! Mutex-guarded generic value container.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use crate::dispatch;

/// A value behind one lock, with every access holding that lock for its full
/// duration. The closure passed to any operation must not touch the same
/// `AtomicValue` again: the lock is not re-entrant and doing so deadlocks.
///
/// `Clone` yields a handle to the *same* value, so one `AtomicValue` can be
/// shared across threads without extra wrapping:
///
/// ```
/// use brigade::AtomicValue;
///
/// let counter = AtomicValue::new(0u64);
/// let handle = counter.clone();
/// std::thread::spawn(move || handle.modify(|n| *n += 1))
///     .join()
///     .unwrap();
/// counter.modify(|n| *n += 1);
/// assert_eq!(counter.get(), 2);
/// ```
pub struct AtomicValue<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> AtomicValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Copy of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.lock().clone()
    }

    pub fn set(&self, value: T) {
        *self.inner.lock() = value;
    }

    /// Replace the value, returning the previous one.
    pub fn swap(&self, value: T) -> T {
        std::mem::replace(&mut *self.inner.lock(), value)
    }

    /// Read-only access under the lock.
    pub fn with_lock<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Mutate under the lock.
    pub fn modify(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.lock());
    }

    /// Mutate under the lock and return a copy of the new value.
    pub fn modify_and_return(&self, f: impl FnOnce(&mut T)) -> T
    where
        T: Clone,
    {
        let mut guard = self.inner.lock();
        f(&mut guard);
        guard.clone()
    }

    /// Schedule a mutation on a background thread and return immediately.
    /// Fire-and-forget: there is no completion signal, and no ordering
    /// guarantee relative to later direct calls.
    pub fn modify_async(&self, f: impl FnOnce(&mut T) + Send + 'static)
    where
        T: Send + 'static,
    {
        let handle = self.clone();
        dispatch::background(move || handle.modify(f));
    }
}

impl<T> AtomicValue<Option<T>> {
    /// Whether the contained option is `Some`, read under the lock.
    pub fn is_some(&self) -> bool {
        self.inner.lock().is_some()
    }
}

impl<T> Clone for AtomicValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for AtomicValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> fmt::Debug for AtomicValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicValue").finish_non_exhaustive()
    }
}
