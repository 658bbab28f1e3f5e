//! Monoid trait for types with an identity element
//!
//! A [`Monoid`] is a [`Semigroup`] with an `empty()` value. Accumulators need
//! it twice: to start a session, and to reset the cell when it is drained.
//!
//! # Laws
//!
//! ```text
//! a.combine(M::empty()) == a           (right identity)
//! M::empty().combine(a) == a           (left identity)
//! ```
//!
//! # Examples
//!
//! ```
//! use tidewater::monoid::{fold_all, Sum};
//!
//! let total = fold_all(vec![Sum(2u64), Sum(3), Sum(5)]);
//! assert_eq!(total, Sum(10));
//! ```

use crate::Semigroup;
use std::ops::Add;

/// A `Semigroup` with an identity element.
///
/// # Example
///
/// ```rust
/// use tidewater::{Monoid, Semigroup};
///
/// let batch = vec!["hello"];
/// let empty: Vec<&str> = Monoid::empty();
///
/// assert_eq!(batch.clone().combine(empty.clone()), batch);
/// assert_eq!(empty.combine(batch.clone()), batch);
/// ```
pub trait Monoid: Semigroup {
    /// The identity element for this monoid.
    fn empty() -> Self;

    /// Combine `other` onto the end of `self` in place.
    ///
    /// The default moves `self` out and leaves `empty()` behind while
    /// `combine` runs, so a panicking `combine` resets `self`. Containers
    /// override it to extend without moving, which keeps `self` intact.
    ///
    /// ```rust
    /// use tidewater::Monoid;
    ///
    /// let mut log = vec!["started"];
    /// log.combine_assign(vec!["stopped"]);
    /// assert_eq!(log, vec!["started", "stopped"]);
    /// ```
    fn combine_assign(&mut self, other: Self) {
        let current = std::mem::replace(self, Self::empty());
        *self = current.combine(other);
    }
}

impl<T> Monoid for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }

    fn combine_assign(&mut self, other: Self) {
        self.extend(other);
    }
}

impl Monoid for String {
    fn empty() -> Self {
        String::new()
    }

    fn combine_assign(&mut self, other: Self) {
        self.push_str(&other);
    }
}

impl<T: Semigroup> Monoid for Option<T> {
    fn empty() -> Self {
        None
    }
}

macro_rules! impl_monoid_tuple {
    ($($idx:tt $T:ident),+) => {
        impl<$($T: Monoid),+> Monoid for ($($T,)+) {
            fn empty() -> Self {
                ($($T::empty(),)+)
            }
        }
    };
}

impl_monoid_tuple!(0 T1, 1 T2);
impl_monoid_tuple!(0 T1, 1 T2, 2 T3);
impl_monoid_tuple!(0 T1, 1 T2, 2 T3, 3 T4);

/// Numeric values under addition, identity `0`.
///
/// Counter increments commute, so a pre-aggregated counter is just a
/// `Sum` of its `times`.
///
/// ```
/// use tidewater::{Monoid, Semigroup};
/// use tidewater::monoid::Sum;
///
/// assert_eq!(Sum(5u64).combine(Sum(10)), Sum(15));
/// assert_eq!(Sum::<u64>::empty(), Sum(0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Sum<T>(pub T);

impl<T: Add<Output = T>> Semigroup for Sum<T> {
    fn combine(self, other: Self) -> Self {
        Sum(self.0 + other.0)
    }
}

impl<T: Add<Output = T> + Default> Monoid for Sum<T> {
    fn empty() -> Self {
        Sum(T::default())
    }
}

/// Fold an iterator of monoid values, starting from `empty()`.
///
/// ```
/// use tidewater::monoid::fold_all;
///
/// let merged: Vec<i32> = fold_all(vec![vec![1, 2], vec![], vec![3]]);
/// assert_eq!(merged, vec![1, 2, 3]);
/// ```
pub fn fold_all<M, I>(items: I) -> M
where
    M: Monoid,
    I: IntoIterator<Item = M>,
{
    items.into_iter().fold(M::empty(), M::combine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_identity() {
        let v = vec![1, 2, 3];
        assert_eq!(Vec::<i32>::empty().combine(v.clone()), v);
        assert_eq!(v.clone().combine(Vec::empty()), v);
    }

    #[test]
    fn test_option_identity() {
        let v = Some(vec![1]);
        assert_eq!(Option::<Vec<i32>>::empty().combine(v.clone()), v);
        assert_eq!(v.clone().combine(Option::empty()), v);
    }

    #[test]
    fn test_pair_identity() {
        let empty: (Vec<i32>, String) = Monoid::empty();
        assert_eq!(empty, (vec![], String::new()));
    }

    #[test]
    fn test_default_combine_assign_matches_combine() {
        let mut total = Sum(2u64);
        total.combine_assign(Sum(3));
        assert_eq!(total, Sum(5));

        let mut pair = (vec![1], String::from("a"));
        pair.combine_assign((vec![2], String::from("b")));
        assert_eq!(pair, (vec![1, 2], String::from("ab")));
    }

    #[test]
    fn test_fold_all_sums() {
        assert_eq!(fold_all(vec![Sum(1u64), Sum(2), Sum(3)]), Sum(6));
    }

    #[test]
    fn test_fold_all_of_nothing_is_empty() {
        let folded: Vec<u8> = fold_all(Vec::<Vec<u8>>::new());
        assert!(folded.is_empty());
    }
}
