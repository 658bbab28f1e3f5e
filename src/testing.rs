//! Testing utilities
//!
//! Test doubles for code that records events. [`RecordingDispatch`] stands in
//! for a real sink: it remembers every value it was asked to dispatch, can be
//! armed to fail on chosen values, and is cheap to clone so the test keeps a
//! handle while the code under test owns another.
//!
//! ```rust
//! use tidewater::prelude::*;
//! use tidewater::assert_dispatched;
//! use tidewater::testing::RecordingDispatch;
//!
//! # tokio_test::block_on(async {
//! let sink = RecordingDispatch::<Batch<&str>>::new();
//! let logging = Deferred::new(Accumulator::new(), sink.clone());
//!
//! logging.record("hello");
//! logging.flush().await.unwrap();
//!
//! assert_dispatched!(sink, [Batch::one("hello")]);
//! # });
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dispatch::Dispatch;

type FailWhen<W> = Arc<dyn Fn(&W) -> bool + Send + Sync>;

/// A [`Dispatch`] that records what it receives.
///
/// Successful calls are available from [`calls`](Self::calls); every call,
/// including rejected ones, from [`attempts`](Self::attempts). The error type
/// is `String`.
pub struct RecordingDispatch<W> {
    log: Arc<Mutex<Log<W>>>,
    fail_when: Option<(FailWhen<W>, String)>,
}

struct Log<W> {
    delivered: Vec<W>,
    attempted: usize,
}

impl<W> RecordingDispatch<W> {
    /// A dispatcher that accepts everything.
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Log {
                delivered: Vec::new(),
                attempted: 0,
            })),
            fail_when: None,
        }
    }

    /// Reject any value for which `predicate` holds, with `message` as the error.
    ///
    /// The returned dispatcher shares its record with `self`.
    pub fn fail_on<P>(self, predicate: P, message: impl Into<String>) -> Self
    where
        P: Fn(&W) -> bool + Send + Sync + 'static,
    {
        Self {
            log: self.log,
            fail_when: Some((Arc::new(predicate), message.into())),
        }
    }

    /// Reject everything with `message`.
    pub fn failing(message: impl Into<String>) -> Self
    where
        W: 'static,
    {
        Self::new().fail_on(|_| true, message)
    }

    /// Everything dispatched successfully, in call order.
    pub fn calls(&self) -> Vec<W>
    where
        W: Clone,
    {
        self.lock().delivered.clone()
    }

    /// Number of dispatch calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.lock().attempted
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        let mut log = self.lock();
        log.delivered.clear();
        log.attempted = 0;
    }

    fn lock(&self) -> MutexGuard<'_, Log<W>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> Default for RecordingDispatch<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Clone for RecordingDispatch<W> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            fail_when: self.fail_when.clone(),
        }
    }
}

impl<W> fmt::Debug for RecordingDispatch<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingDispatch")
            .field("attempts", &self.attempts())
            .field("armed", &self.fail_when.is_some())
            .finish()
    }
}

impl<W: Send> Dispatch<W> for RecordingDispatch<W> {
    type Error = String;

    async fn dispatch(&self, batch: W) -> Result<(), String> {
        let mut log = self.lock();
        log.attempted += 1;
        if let Some((predicate, message)) = &self.fail_when {
            if predicate(&batch) {
                return Err(message.clone());
            }
        }
        log.delivered.push(batch);
        Ok(())
    }
}

/// Assert that a [`RecordingDispatch`] received exactly the given values.
///
/// ```rust
/// use tidewater::assert_dispatched;
/// use tidewater::dispatch::Dispatch;
/// use tidewater::testing::RecordingDispatch;
///
/// # tokio_test::block_on(async {
/// let sink = RecordingDispatch::<u8>::new();
/// sink.dispatch(1).await.unwrap();
/// assert_dispatched!(sink, [1]);
/// # });
/// ```
#[macro_export]
macro_rules! assert_dispatched {
    ($sink:expr, [$($expected:expr),* $(,)?]) => {{
        let calls = $sink.calls();
        let expected = vec![$($expected),*];
        if calls != expected {
            panic!(
                "dispatched values differ\n  expected: {:?}\n  received: {:?}",
                expected, calls
            );
        }
    }};
}

/// Assert that a [`RecordingDispatch`] received nothing.
#[macro_export]
macro_rules! assert_nothing_dispatched {
    ($sink:expr) => {{
        let attempts = $sink.attempts();
        if attempts != 0 {
            panic!("expected no dispatch calls, got {}", attempts);
        }
    }};
}
