//! Weak-reference collections that drop entries as their referents die.

use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// `true` when both weaks point at the same allocation. Compares data
/// pointers only, so it stays correct for trait objects whose vtable
/// pointers may differ across instantiations.
fn same_object<T: ?Sized>(a: &Weak<T>, b: &Weak<T>) -> bool {
    std::ptr::eq(a.as_ptr() as *const (), b.as_ptr() as *const ())
}

fn purge<T: ?Sized>(entries: &mut Vec<Weak<T>>) {
    entries.retain(|w| w.strong_count() > 0);
}

/// A set of weak references keyed by object identity.
///
/// Entries never keep their referent alive, and dead entries are purged
/// opportunistically on every mutating call. Two distinct `Arc`s holding
/// equal values are distinct members here; see [`WeakEqSet`] for
/// value-keyed membership.
pub struct WeakSet<T: ?Sized> {
    entries: Mutex<Vec<Weak<T>>>,
}

impl<T: ?Sized> WeakSet<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Add a reference unconditionally. The same object can appear twice.
    pub fn add(&self, item: &Arc<T>) {
        let mut entries = self.entries.lock();
        purge(&mut entries);
        entries.push(Arc::downgrade(item));
    }

    /// Add a reference unless the same object is already present.
    /// Returns `true` when the set changed.
    pub fn add_if_absent(&self, item: &Arc<T>) -> bool {
        let candidate = Arc::downgrade(item);
        let mut entries = self.entries.lock();
        purge(&mut entries);
        if entries.iter().any(|w| same_object(w, &candidate)) {
            return false;
        }
        entries.push(candidate);
        true
    }

    /// Remove every entry for this object. Returns `true` when at least
    /// one entry was removed.
    pub fn remove(&self, item: &Arc<T>) -> bool {
        let target = Arc::downgrade(item);
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|w| w.strong_count() > 0 && !same_object(w, &target));
        entries.len() < before
    }

    pub fn contains(&self, item: &Arc<T>) -> bool {
        let target = Arc::downgrade(item);
        self.entries
            .lock()
            .iter()
            .any(|w| w.strong_count() > 0 && same_object(w, &target))
    }

    /// Strong references to every live member. Dead entries found along
    /// the way are dropped from the set.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        let mut entries = self.entries.lock();
        purge(&mut entries);
        entries.iter().filter_map(Weak::upgrade).collect()
    }

    /// `true` when this object is a member and the only live one.
    pub fn is_only_element(&self, item: &Arc<T>) -> bool {
        let target = Arc::downgrade(item);
        let mut entries = self.entries.lock();
        purge(&mut entries);
        entries.len() == 1 && same_object(&entries[0], &target)
    }

    /// Number of live members.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        purge(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> Default for WeakSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for WeakSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSet")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

/// A set of weak references keyed by value equality.
///
/// Membership is decided by `PartialEq` on the live referents, so two
/// distinct `Arc`s holding equal values count as the same member. Same
/// lifetime rules as [`WeakSet`]: entries never keep referents alive and
/// dead ones are purged on every mutating call.
pub struct WeakEqSet<T> {
    entries: Mutex<Vec<Weak<T>>>,
}

impl<T: PartialEq> WeakEqSet<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, item: &Arc<T>) {
        let mut entries = self.entries.lock();
        purge(&mut entries);
        entries.push(Arc::downgrade(item));
    }

    /// Add a reference unless an equal value is already present.
    /// Returns `true` when the set changed.
    pub fn add_if_absent(&self, item: &Arc<T>) -> bool {
        let mut entries = self.entries.lock();
        purge(&mut entries);
        let present = entries
            .iter()
            .filter_map(Weak::upgrade)
            .any(|existing| *existing == **item);
        if present {
            return false;
        }
        entries.push(Arc::downgrade(item));
        true
    }

    /// Remove every entry equal to this value. Returns `true` when at
    /// least one entry was removed.
    pub fn remove(&self, item: &T) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|w| match w.upgrade() {
            Some(existing) => *existing != *item,
            None => false,
        });
        entries.len() < before
    }

    pub fn contains(&self, item: &T) -> bool {
        self.entries
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .any(|existing| *existing == *item)
    }

    pub fn snapshot(&self) -> Vec<Arc<T>> {
        let mut entries = self.entries.lock();
        purge(&mut entries);
        entries.iter().filter_map(Weak::upgrade).collect()
    }

    /// `true` when this value is a member and the only live one.
    pub fn is_only_element(&self, item: &T) -> bool {
        let mut entries = self.entries.lock();
        purge(&mut entries);
        if entries.len() != 1 {
            return false;
        }
        match entries[0].upgrade() {
            Some(existing) => *existing == *item,
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        purge(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: PartialEq> Default for WeakEqSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WeakEqSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEqSet")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}
