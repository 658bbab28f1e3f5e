//! Immediate recording: dispatch now, bypassing any accumulator
//!
//! [`Immediate`] is for events that must not wait for a flush, such as an
//! "application started" counter or a fatal error line. It holds no state
//! besides its dispatcher, so one instance can be shared freely between tasks.

use std::fmt;

use crate::dispatch::Dispatch;
use crate::event::LogRecord;
use crate::Batch;

/// Dispatch each event as a single-element batch as soon as it is recorded.
///
/// ```rust
/// use tidewater::prelude::*;
/// use tidewater::event::Counter;
/// use tidewater::testing::RecordingDispatch;
///
/// # tokio_test::block_on(async {
/// let sink = RecordingDispatch::<Batch<Counter>>::new();
/// let now = CountingNow::new(sink.clone());
///
/// now.record_now(Counter::new("application_started")).await.unwrap();
/// assert_eq!(sink.calls().len(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct Immediate<D> {
    dispatcher: D,
}

impl<D> Immediate<D> {
    /// Wrap a dispatcher.
    pub fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }

    /// The wrapped dispatcher.
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Dispatch `event` right away and return the dispatcher's result.
    ///
    /// The event never touches any accumulator, so it can never show up in
    /// a later flush.
    pub async fn record_now<E>(&self, event: E) -> Result<(), D::Error>
    where
        E: Send,
        D: Dispatch<Batch<E>>,
    {
        tracing::trace!("dispatching event immediately");
        self.dispatcher.dispatch(Batch::one(event)).await
    }

    /// Dispatch a debug line right away.
    pub async fn debug(&self, message: impl Into<String>) -> Result<(), D::Error>
    where
        D: Dispatch<Batch<LogRecord>>,
    {
        self.record_now(LogRecord::debug(message)).await
    }

    /// Dispatch an info line right away.
    pub async fn info(&self, message: impl Into<String>) -> Result<(), D::Error>
    where
        D: Dispatch<Batch<LogRecord>>,
    {
        self.record_now(LogRecord::info(message)).await
    }

    /// Dispatch a warning line right away.
    pub async fn warn(&self, message: impl Into<String>) -> Result<(), D::Error>
    where
        D: Dispatch<Batch<LogRecord>>,
    {
        self.record_now(LogRecord::warn(message)).await
    }

    /// Dispatch an error line right away.
    pub async fn error(&self, message: impl Into<String>) -> Result<(), D::Error>
    where
        D: Dispatch<Batch<LogRecord>>,
    {
        self.record_now(LogRecord::error(message)).await
    }
}

impl<D> fmt::Debug for Immediate<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Immediate").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::dispatch_fn;
    use crate::event::Level;
    use crate::testing::RecordingDispatch;
    use crate::{Accumulator, Deferred};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_record_now_dispatches_before_returning() {
        let sink = RecordingDispatch::<Batch<&str>>::new();
        let now = Immediate::new(sink.clone());

        now.record_now("ApplicationStarted").await.unwrap();

        assert_eq!(sink.calls(), vec![Batch::one("ApplicationStarted")]);
    }

    #[tokio::test]
    async fn test_record_now_propagates_failure() {
        let now = Immediate::new(dispatch_fn(|_: Batch<u8>| async {
            Err::<(), _>("rejected write")
        }));

        assert_eq!(now.record_now(1).await, Err("rejected write"));
    }

    #[tokio::test]
    async fn test_record_now_bypasses_accumulators() {
        let sink = RecordingDispatch::<Batch<&str>>::new();
        let acc = Accumulator::<Batch<&str>>::new();
        let deferred = Deferred::new(acc.clone(), sink.clone());
        let now = Immediate::new(sink.clone());

        for _ in 0..5 {
            now.record_now("now").await.unwrap();
        }
        assert!(acc.drain().is_empty());

        deferred.flush().await.unwrap();
        assert_eq!(sink.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_log_helpers() {
        let sink = RecordingDispatch::<Batch<LogRecord>>::new();
        let now = Immediate::new(sink.clone());

        now.warn("disk almost full").await.unwrap();
        now.error("disk full").await.unwrap();

        let calls = sink.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].as_slice()[0].level, Level::Warn);
        assert_eq!(calls[1].as_slice()[0].message, "disk full");
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let sink = RecordingDispatch::<Batch<usize>>::new();
        let now = Arc::new(Immediate::new(sink.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let now = Arc::clone(&now);
                tokio::spawn(async move { now.record_now(i).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(sink.calls().len(), 16);
    }
}
