//! Deferred recording: record now, dispatch on flush
//!
//! [`Deferred`] is the record-then-flush shape. [`record`](Deferred::record)
//! appends to a shared [`Accumulator`] and returns at once, with no I/O.
//! [`flush`](Deferred::flush) drains everything recorded so far and hands
//! it to the dispatcher as one batch.
//!
//! The accumulator is an explicit constructor argument, so several
//! `Deferred` values (or several clones of one) can feed the same session.
//!
//! ```rust
//! use tidewater::prelude::*;
//! use tidewater::event::Counter;
//! use tidewater::testing::RecordingDispatch;
//!
//! # tokio_test::block_on(async {
//! let sink = RecordingDispatch::<Batch<Counter>>::new();
//! let counting = Counting::new(Accumulator::new(), sink.clone());
//!
//! counting.record(Counter::new("said_hello"));
//! counting.record(Counter::new("said_hello"));
//! assert!(sink.calls().is_empty());
//!
//! counting.flush().await.unwrap();
//! assert_eq!(sink.calls().len(), 1);
//! assert_eq!(sink.calls()[0].len(), 2);
//! # });
//! ```
//!
//! # Failure and cancellation
//!
//! A drained batch is never put back. If the dispatcher fails, `flush`
//! returns the error and the batch is gone; if the flush future is dropped
//! while the dispatcher is running, whatever the dispatcher had already done
//! stays done and the rest of the batch is lost. Retrying is up to the
//! caller of `flush`.

use std::fmt;

use crate::dispatch::Dispatch;
use crate::event::LogRecord;
use crate::{Accumulator, Batch};

/// Record events into a shared accumulator; dispatch them on [`flush`](Self::flush).
pub struct Deferred<E, D> {
    accumulator: Accumulator<Batch<E>>,
    dispatcher: D,
}

impl<E, D> Deferred<E, D> {
    /// Bind an accumulator and a dispatcher.
    pub fn new(accumulator: Accumulator<Batch<E>>, dispatcher: D) -> Self {
        Self {
            accumulator,
            dispatcher,
        }
    }

    /// Append one event. Never dispatches.
    pub fn record(&self, event: E) {
        self.accumulator.append(Batch::one(event));
        tracing::trace!("event recorded");
    }

    /// Append several events in one atomic step.
    ///
    /// They stay contiguous in the drained batch even if other producers
    /// are recording at the same time.
    pub fn record_all(&self, events: impl IntoIterator<Item = E>) {
        let batch = Batch::of(events);
        if batch.is_empty() {
            return;
        }
        let count = batch.len();
        self.accumulator.append(batch);
        tracing::trace!(count, "events recorded");
    }

    /// Number of events waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.accumulator.pending()
    }

    /// The shared accumulator this instance appends to.
    pub fn accumulator(&self) -> &Accumulator<Batch<E>> {
        &self.accumulator
    }

    /// The dispatcher used by [`flush`](Self::flush).
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }
}

impl<E, D> Deferred<E, D>
where
    E: Send,
    D: Dispatch<Batch<E>>,
{
    /// Drain everything recorded so far and dispatch it as one batch.
    ///
    /// An empty drain succeeds without calling the dispatcher. The lock on
    /// the accumulator is released before dispatch starts.
    pub async fn flush(&self) -> Result<(), D::Error> {
        let batch = self.accumulator.drain();
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.len();
        tracing::debug!(count, "flushing batch");
        self.dispatcher.dispatch(batch).await.inspect_err(|_| {
            tracing::debug!(count, "flush failed; drained events were not restored");
        })
    }
}

impl<D> Deferred<LogRecord, D> {
    /// Record a debug line.
    pub fn debug(&self, message: impl Into<String>) {
        self.record(LogRecord::debug(message));
    }

    /// Record an info line.
    pub fn info(&self, message: impl Into<String>) {
        self.record(LogRecord::info(message));
    }

    /// Record a warning line.
    pub fn warn(&self, message: impl Into<String>) {
        self.record(LogRecord::warn(message));
    }

    /// Record an error line.
    pub fn error(&self, message: impl Into<String>) {
        self.record(LogRecord::error(message));
    }
}

impl<E, D: Clone> Clone for Deferred<E, D> {
    fn clone(&self) -> Self {
        Self {
            accumulator: self.accumulator.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<E, D> fmt::Debug for Deferred<E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("accumulator", &self.accumulator)
            .finish_non_exhaustive()
    }
}
