//! Semigroup trait for associative combination
//!
//! Everything an accumulator holds is combined with [`Semigroup::combine`]. For
//! event batches that means concatenation in encounter order; for pre-folded
//! counters it means addition.
//!
//! # Laws
//!
//! `combine` must be associative:
//! ```text
//! a.combine(b).combine(c) == a.combine(b.combine(c))
//! ```
//!
//! Associativity is what lets producers append in any grouping (one event at
//! a time, or a pre-built batch) without changing what a later drain returns.
//!
//! # Examples
//!
//! ```
//! use tidewater::Semigroup;
//!
//! let first = vec!["started"];
//! let second = vec!["stopped"];
//! assert_eq!(first.combine(second), vec!["started", "stopped"]);
//!
//! // Pairs combine component-wise, so one accumulator can hold two batches
//! let a = (vec![1], vec!["a"]);
//! let b = (vec![2], vec!["b"]);
//! assert_eq!(a.combine(b), (vec![1, 2], vec!["a", "b"]));
//! ```

/// A type that supports an associative binary operation
///
/// `combine` takes both operands by value so containers can reuse the left
/// allocation. Clone first if the originals are still needed.
pub trait Semigroup: Sized {
    /// Combine this value with another value associatively
    ///
    /// # Examples
    ///
    /// ```
    /// use tidewater::Semigroup;
    ///
    /// let merged = "Hello, ".to_string().combine("world".to_string());
    /// assert_eq!(merged, "Hello, world");
    /// ```
    fn combine(self, other: Self) -> Self;
}

impl<T> Semigroup for Vec<T> {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl Semigroup for String {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.push_str(&other);
        self
    }
}

// None is absorbed, two Somes combine their contents
impl<T: Semigroup> Semigroup for Option<T> {
    fn combine(self, other: Self) -> Self {
        match (self, other) {
            (Some(a), Some(b)) => Some(a.combine(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        }
    }
}

macro_rules! impl_semigroup_tuple {
    ($($idx:tt $T:ident),+) => {
        impl<$($T: Semigroup),+> Semigroup for ($($T,)+) {
            #[inline]
            fn combine(self, other: Self) -> Self {
                (
                    $(self.$idx.combine(other.$idx)),+
                )
            }
        }
    };
}

impl_semigroup_tuple!(0 T1, 1 T2);
impl_semigroup_tuple!(0 T1, 1 T2, 2 T3);
impl_semigroup_tuple!(0 T1, 1 T2, 2 T3, 3 T4);
