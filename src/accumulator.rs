//! Shared accumulator state
//!
//! An [`Accumulator`] is a cloneable handle to one cell holding a monoid value.
//! Every clone sees the same cell. Producers [`append`](Accumulator::append)
//! into it from any thread; a control point [`drain`](Accumulator::drain)s it,
//! which swaps the value for `empty()` in the same critical section that reads
//! it. An append racing with a drain therefore lands in exactly one of the
//! drained batch or the next one, never both and never neither.
//!
//! The lock is held only for the swap or the combine. Nothing downstream of a
//! drain (in particular, dispatch I/O) runs while it is held.
//!
//! ```
//! use tidewater::{Accumulator, Batch};
//!
//! let acc = Accumulator::<Batch<&str>>::new();
//! let producer = acc.clone();
//!
//! producer.append(Batch::one("first"));
//! producer.append(Batch::one("second"));
//!
//! assert_eq!(acc.drain().into_vec(), vec!["first", "second"]);
//! assert!(acc.drain().is_empty());
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Batch, Monoid};

/// A shared, thread-safe cell holding one monoid value.
pub struct Accumulator<W> {
    state: Arc<Mutex<W>>,
}

impl<W: Monoid> Accumulator<W> {
    /// A fresh accumulator holding `W::empty()`.
    pub fn new() -> Self {
        Self::with_initial(W::empty())
    }

    /// An accumulator seeded with `initial`.
    pub fn with_initial(initial: W) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
        }
    }

    /// Combine `writes` onto the end of the current value.
    ///
    /// The read-modify-write happens under one lock acquisition, so two
    /// racing appends are both reflected. It goes through
    /// [`Monoid::combine_assign`]: for [`Batch`] and the std containers a
    /// panicking append leaves earlier contents in place, while a monoid
    /// using the default by-value path is reset to `empty()`.
    pub fn append(&self, writes: W) {
        self.lock().combine_assign(writes);
    }

    /// Take the current value and leave `W::empty()` in its place.
    ///
    /// Returns exactly what was accumulated at the moment of the swap. A
    /// second drain with no append in between returns the identity.
    pub fn drain(&self) -> W {
        std::mem::replace(&mut *self.lock(), W::empty())
    }

    /// Copy of the current value, without clearing it.
    pub fn snapshot(&self) -> W
    where
        W: Clone,
    {
        self.lock().clone()
    }

    /// Whether two handles share the same cell.
    pub fn same_cell(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    // A panic in `combine_assign` poisons the mutex; whatever it left in the
    // cell is still a valid value.
    fn lock(&self) -> MutexGuard<'_, W> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<E> Accumulator<Batch<E>> {
    /// Number of events waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Whether a drain right now would return an empty batch.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<W> Clone for Accumulator<W> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<W: Monoid> Default for Accumulator<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> fmt::Debug for Accumulator<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("handles", &Arc::strong_count(&self.state))
            .finish_non_exhaustive()
    }
}
