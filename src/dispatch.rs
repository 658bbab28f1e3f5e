//! Dispatch functions
//!
//! A [`Dispatch`] turns a value pulled out of an accumulator into real side
//! effects: incrementing counters on a metrics backend, writing a log line.
//! It is the only part of the pipeline that performs I/O, so it is async and
//! fallible, and every failure travels back to whoever triggered the dispatch.
//!
//! # Building dispatchers
//!
//! - [`dispatch_fn`] lifts an async closure.
//! - [`FoldEach`] lifts a per-event dispatcher to whole batches, folding
//!   left-to-right and stopping at the first failure.
//! - [`DispatchExt`] adds `map_err`, `and` (fan out to two sinks) and `boxed`.
//!
//! ```rust
//! use tidewater::dispatch::{dispatch_fn, Dispatch, DispatchExt};
//! use tidewater::Batch;
//!
//! # tokio_test::block_on(async {
//! let print = dispatch_fn(|line: &'static str| async move {
//!     println!("{}", line);
//!     Ok::<_, String>(())
//! });
//!
//! let per_batch = print.fold_each();
//! let result = per_batch.dispatch(Batch::of(["one", "two"])).await;
//! assert!(result.is_ok());
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::Batch;

/// An async, fallible sink for values of type `W`.
///
/// Implementations must not assume anything about when they are called
/// beyond "after the value was drained"; a slow or failing dispatch never
/// holds up producers.
pub trait Dispatch<W>: Send + Sync {
    /// What a failed dispatch reports.
    type Error: Send;

    /// Perform the side effects for `batch`.
    fn dispatch(&self, batch: W) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<W, D> Dispatch<W> for Arc<D>
where
    D: Dispatch<W>,
{
    type Error = D::Error;

    fn dispatch(&self, batch: W) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).dispatch(batch)
    }
}

/// Dispatcher backed by an async closure. Created by [`dispatch_fn`].
#[derive(Clone)]
pub struct DispatchFn<F> {
    f: F,
}

impl<F> fmt::Debug for DispatchFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchFn").finish_non_exhaustive()
    }
}

impl<W, F, Fut, E> Dispatch<W> for DispatchFn<F>
where
    F: Fn(W) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Send,
{
    type Error = E;

    fn dispatch(&self, batch: W) -> impl Future<Output = Result<(), E>> + Send {
        (self.f)(batch)
    }
}

/// Lift an async closure into a [`Dispatch`].
///
/// ```rust
/// use tidewater::dispatch::{dispatch_fn, Dispatch};
///
/// # tokio_test::block_on(async {
/// let reject = dispatch_fn(|_: u32| async { Err::<(), _>("sink offline") });
/// assert_eq!(reject.dispatch(1).await, Err("sink offline"));
/// # });
/// ```
pub fn dispatch_fn<W, F, Fut, E>(f: F) -> DispatchFn<F>
where
    F: Fn(W) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
{
    DispatchFn { f }
}

/// Failure of one event while folding a batch.
///
/// `index` is the zero-based position of the failing event in the batch.
/// Events before it were dispatched; events after it were never attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldError<E> {
    /// Position of the failing event.
    pub index: usize,
    /// How many events after it were skipped.
    pub skipped: usize,
    /// The per-event failure.
    pub error: E,
}

impl<E> FoldError<E> {
    /// Extract the per-event error, discarding the position.
    pub fn into_inner(self) -> E {
        self.error
    }

    /// Number of events that made it to the sink before the failure.
    pub fn dispatched(&self) -> usize {
        self.index
    }
}

impl<E: fmt::Display> fmt::Display for FoldError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dispatch failed at event #{} ({} not attempted): {}",
            self.index + 1,
            self.skipped,
            self.error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for FoldError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Dispatch a batch one event at a time.
///
/// Events go to the inner dispatcher in batch order. The first failure stops
/// the fold and is reported as a [`FoldError`]; nothing is retried or rolled
/// back. If the returned future is dropped mid-fold, the events already sent
/// stay sent and the rest are not sent.
#[derive(Debug, Clone)]
pub struct FoldEach<D> {
    inner: D,
}

impl<D> FoldEach<D> {
    /// Fold over `inner`.
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    /// The per-event dispatcher.
    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<E, D> Dispatch<Batch<E>> for FoldEach<D>
where
    E: Send,
    D: Dispatch<E>,
{
    type Error = FoldError<D::Error>;

    async fn dispatch(&self, batch: Batch<E>) -> Result<(), Self::Error> {
        let total = batch.len();
        for (index, event) in batch.into_iter().enumerate() {
            if let Err(error) = self.inner.dispatch(event).await {
                let skipped = total - index - 1;
                tracing::debug!(index, skipped, "event dispatch failed, abandoning batch");
                return Err(FoldError {
                    index,
                    skipped,
                    error,
                });
            }
        }
        Ok(())
    }
}

/// Dispatcher with its error mapped. Created by [`DispatchExt::map_err`].
#[derive(Debug, Clone)]
pub struct MapErr<D, F> {
    inner: D,
    f: F,
}

impl<W, D, F, E2> Dispatch<W> for MapErr<D, F>
where
    W: Send,
    D: Dispatch<W>,
    F: Fn(D::Error) -> E2 + Send + Sync,
    E2: Send,
{
    type Error = E2;

    async fn dispatch(&self, batch: W) -> Result<(), E2> {
        self.inner.dispatch(batch).await.map_err(&self.f)
    }
}

/// Which side of an [`And`] fan-out failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanoutError<A, B> {
    /// Only the first sink failed.
    First(A),
    /// Only the second sink failed.
    Second(B),
    /// Both sinks failed.
    Both(A, B),
}

impl<A: fmt::Display, B: fmt::Display> fmt::Display for FanoutError<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanoutError::First(a) => write!(f, "first sink failed: {}", a),
            FanoutError::Second(b) => write!(f, "second sink failed: {}", b),
            FanoutError::Both(a, b) => {
                write!(f, "first sink failed: {}; second sink also failed: {}", a, b)
            }
        }
    }
}

impl<A, B> std::error::Error for FanoutError<A, B>
where
    A: std::error::Error + 'static,
    B: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FanoutError::First(a) | FanoutError::Both(a, _) => Some(a),
            FanoutError::Second(b) => Some(b),
        }
    }
}

/// Sends each batch to two sinks concurrently. Created by [`DispatchExt::and`].
#[derive(Debug, Clone)]
pub struct And<A, B> {
    first: A,
    second: B,
}

impl<W, A, B> Dispatch<W> for And<A, B>
where
    W: Clone + Send,
    A: Dispatch<W>,
    B: Dispatch<W>,
{
    type Error = FanoutError<A::Error, B::Error>;

    async fn dispatch(&self, batch: W) -> Result<(), Self::Error> {
        let copy = batch.clone();
        match futures::join!(self.first.dispatch(batch), self.second.dispatch(copy)) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(a), Ok(())) => Err(FanoutError::First(a)),
            (Ok(()), Err(b)) => Err(FanoutError::Second(b)),
            (Err(a), Err(b)) => Err(FanoutError::Both(a, b)),
        }
    }
}

trait DynDispatch<W, E>: Send + Sync {
    fn dispatch_boxed(&self, batch: W) -> BoxFuture<'_, Result<(), E>>;
}

impl<W, D> DynDispatch<W, D::Error> for D
where
    W: 'static,
    D: Dispatch<W>,
{
    fn dispatch_boxed(&self, batch: W) -> BoxFuture<'_, Result<(), D::Error>> {
        Box::pin(self.dispatch(batch))
    }
}

/// A type-erased dispatcher.
///
/// Useful for storing different sinks behind one type, e.g. choosing a sink
/// from configuration at startup.
pub struct BoxedDispatch<W, E> {
    inner: Box<dyn DynDispatch<W, E>>,
}

impl<W, E> BoxedDispatch<W, E>
where
    W: 'static,
    E: 'static,
{
    /// Erase the type of `dispatch`.
    pub fn new<D>(dispatch: D) -> Self
    where
        D: Dispatch<W, Error = E> + 'static,
    {
        Self {
            inner: Box::new(dispatch),
        }
    }
}

impl<W, E> fmt::Debug for BoxedDispatch<W, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedDispatch")
            .field("inner", &"<dispatch>")
            .finish()
    }
}

impl<W, E> Dispatch<W> for BoxedDispatch<W, E>
where
    W: 'static,
    E: Send + 'static,
{
    type Error = E;

    fn dispatch(&self, batch: W) -> impl Future<Output = Result<(), E>> + Send {
        self.inner.dispatch_boxed(batch)
    }
}

/// Combinators available on every [`Dispatch`].
pub trait DispatchExt<W>: Dispatch<W> + Sized {
    /// Dispatch whole batches of `W` by folding over this per-event dispatcher.
    fn fold_each(self) -> FoldEach<Self> {
        FoldEach::new(self)
    }

    /// Transform the error.
    fn map_err<F, E2>(self, f: F) -> MapErr<Self, F>
    where
        F: Fn(Self::Error) -> E2 + Send + Sync,
    {
        MapErr { inner: self, f }
    }

    /// Send every batch to `self` and `other` concurrently.
    fn and<B>(self, other: B) -> And<Self, B>
    where
        B: Dispatch<W>,
    {
        And {
            first: self,
            second: other,
        }
    }

    /// Erase the concrete type.
    fn boxed(self) -> BoxedDispatch<W, Self::Error>
    where
        Self: 'static,
        W: 'static,
        Self::Error: 'static,
    {
        BoxedDispatch::new(self)
    }
}

impl<W, D: Dispatch<W>> DispatchExt<W> for D {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Dispatch<u32, Error = String> + Clone) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            dispatch_fn(move |n: u32| {
                let seen = Arc::clone(&seen);
                async move {
                    if n == 0 {
                        return Err(format!("rejected {}", n));
                    }
                    seen.lock().unwrap().push(n);
                    Ok(())
                }
            })
        };
        (seen, sink)
    }

    #[tokio::test]
    async fn test_dispatch_fn_passes_value_through() {
        let (seen, sink) = recorder();
        assert_eq!(sink.dispatch(3).await, Ok(()));
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_fold_each_dispatches_in_order() {
        let (seen, sink) = recorder();
        let result = sink.fold_each().dispatch(Batch::of([1, 2, 3])).await;
        assert_eq!(result, Ok(()));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fold_each_stops_at_first_failure() {
        let (seen, sink) = recorder();
        let result = sink.fold_each().dispatch(Batch::of([1, 0, 3])).await;

        assert_eq!(
            result,
            Err(FoldError {
                index: 1,
                skipped: 1,
                error: "rejected 0".to_string(),
            })
        );
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_fold_each_of_empty_batch_is_ok() {
        let (seen, sink) = recorder();
        assert_eq!(sink.fold_each().dispatch(Batch::default()).await, Ok(()));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_fold_error_display_is_one_based() {
        let err = FoldError {
            index: 1,
            skipped: 1,
            error: "sink offline",
        };
        assert_eq!(
            err.to_string(),
            "dispatch failed at event #2 (1 not attempted): sink offline"
        );
        assert_eq!(err.dispatched(), 1);
        assert_eq!(err.into_inner(), "sink offline");
    }

    #[tokio::test]
    async fn test_map_err() {
        let (_, sink) = recorder();
        let mapped = sink.map_err(|e: String| e.len());
        assert_eq!(mapped.dispatch(0).await, Err("rejected 0".len()));
    }

    #[tokio::test]
    async fn test_and_sends_to_both() {
        let (left_seen, left) = recorder();
        let (right_seen, right) = recorder();
        let both = left.and(right);

        assert_eq!(both.dispatch(5).await, Ok(()));
        assert_eq!(*left_seen.lock().unwrap(), vec![5]);
        assert_eq!(*right_seen.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn test_and_reports_which_side_failed() {
        let (_, ok) = recorder();
        let fails = dispatch_fn(|_: u32| async { Err::<(), _>("down") });

        let result = ok.and(fails).dispatch(1).await;
        assert_eq!(result, Err(FanoutError::Second("down")));
    }

    #[tokio::test]
    async fn test_boxed_dispatchers_share_a_type() {
        let (seen, sink) = recorder();
        let sinks: Vec<BoxedDispatch<u32, String>> = vec![
            sink.clone().boxed(),
            sink.map_err(|e| format!("mapped: {}", e)).boxed(),
        ];
        for s in &sinks {
            s.dispatch(9).await.unwrap();
        }
        assert_eq!(*seen.lock().unwrap(), vec![9, 9]);
    }

    #[tokio::test]
    async fn test_arc_dispatch_delegates() {
        let (seen, sink) = recorder();
        let shared = Arc::new(sink);
        shared.dispatch(4).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![4]);
    }

    #[test]
    fn test_dropped_flush_keeps_prefix_and_skips_the_rest() {
        use crate::{Accumulator, Deferred};
        use futures::FutureExt;

        let attempted = Arc::new(Mutex::new(Vec::new()));
        let completed = Arc::new(Mutex::new(Vec::new()));
        let per_event = {
            let attempted = Arc::clone(&attempted);
            let completed = Arc::clone(&completed);
            dispatch_fn(move |n: u32| {
                let attempted = Arc::clone(&attempted);
                let completed = Arc::clone(&completed);
                async move {
                    attempted.lock().unwrap().push(n);
                    if n == 2 {
                        futures::future::pending::<()>().await;
                    }
                    completed.lock().unwrap().push(n);
                    Ok::<_, String>(())
                }
            })
        };
        let deferred = Deferred::new(Accumulator::new(), per_event.fold_each());
        deferred.record_all([1u32, 2, 3]);

        // One poll runs event 1 to completion and parks on event 2
        assert!(deferred.flush().now_or_never().is_none());

        assert_eq!(*completed.lock().unwrap(), vec![1]);
        assert_eq!(*attempted.lock().unwrap(), vec![1, 2]);
        assert_eq!(deferred.pending(), 0);
    }
}
