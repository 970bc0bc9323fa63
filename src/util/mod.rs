pub mod atomic_value;
pub mod weak_set;

pub use atomic_value::AtomicValue;
pub use weak_set::{WeakEqSet, WeakSet};
