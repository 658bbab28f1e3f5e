//! Ordered event batches
//!
//! A [`Batch`] is the value an accumulator holds: an ordered run of events
//! that combines by concatenation. Order is kept exactly as events were
//! appended, which matters for log lines and is harmless for counters.
//!
//! ```
//! use tidewater::{Batch, Monoid, Semigroup};
//!
//! let morning = Batch::of(["coffee", "email"]);
//! let afternoon = Batch::one("meeting");
//!
//! let day = Batch::empty().combine(morning).combine(afternoon);
//! assert_eq!(day.into_vec(), vec!["coffee", "email", "meeting"]);
//! ```

use std::collections::BTreeMap;

use crate::event::{Counter, CounterEvent, Tags};
use crate::{Monoid, Semigroup};

/// An ordered, combinable sequence of events awaiting dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Batch<E> {
    events: Vec<E>,
}

impl<E> Batch<E> {
    /// A batch holding a single event.
    pub fn one(event: E) -> Self {
        Self {
            events: vec![event],
        }
    }

    /// A batch holding `events` in iteration order.
    pub fn of(events: impl IntoIterator<Item = E>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Append one event at the end.
    pub fn push(&mut self, event: E) {
        self.events.push(event);
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch is the identity.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate events in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.events.iter()
    }

    /// Borrow the events as a slice.
    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    /// Take the events out.
    pub fn into_vec(self) -> Vec<E> {
        self.events
    }
}

impl<E> Default for Batch<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> Semigroup for Batch<E> {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        if self.events.is_empty() {
            return other;
        }
        self.events.extend(other.events);
        self
    }
}

impl<E> Monoid for Batch<E> {
    fn empty() -> Self {
        Self::default()
    }

    fn combine_assign(&mut self, other: Self) {
        self.events.extend(other.events);
    }
}

impl<E> From<Vec<E>> for Batch<E> {
    fn from(events: Vec<E>) -> Self {
        Self { events }
    }
}

impl<E> FromIterator<E> for Batch<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl<E> Extend<E> for Batch<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.events.extend(iter);
    }
}

impl<E> IntoIterator for Batch<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a Batch<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Pre-fold counter events that share a name and tag set.
///
/// Increments commute, so a sink that charges per call can collapse a batch
/// before sending it. Entries come out in the order their key was first seen.
/// Totals saturate at `u64::MAX`.
///
/// ```
/// use tidewater::batch::aggregate_counters;
/// use tidewater::event::{Counter, CounterEvent};
/// use tidewater::Batch;
///
/// let batch = Batch::of([
///     Counter::new("said_hello"),
///     Counter::new("said_goodbye"),
///     Counter::new("said_hello"),
/// ]);
///
/// let folded = aggregate_counters(&batch);
/// assert_eq!(folded.len(), 2);
/// assert_eq!(folded.as_slice()[0].name(), "said_hello");
/// assert_eq!(folded.as_slice()[0].times(), 2);
/// ```
pub fn aggregate_counters<C: CounterEvent>(batch: &Batch<C>) -> Batch<Counter> {
    let mut order: Vec<(String, Tags)> = Vec::new();
    let mut totals: BTreeMap<(String, Tags), u64> = BTreeMap::new();

    for event in batch {
        let key = (event.name().into_owned(), event.tags());
        let increment = event.times().max(1);
        match totals.get_mut(&key) {
            Some(total) => *total = total.saturating_add(increment),
            None => {
                order.push(key.clone());
                totals.insert(key, increment);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| {
            let times = totals.remove(&key)?;
            let (name, tags) = key;
            let counter = tags
                .into_iter()
                .fold(Counter::new(name), |c, (k, v)| c.with_tag(k, v))
                .with_times(times);
            Some(counter)
        })
        .collect()
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl<E> Arbitrary for Batch<E>
where
    E: Arbitrary + 'static,
{
    type Parameters = E::Parameters;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        prop::collection::vec(any_with::<E>(args), 0..32)
            .prop_map(Batch::from)
            .boxed()
    }
}
