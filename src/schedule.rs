//! Periodic flushing on a tokio runtime
//!
//! For services that have no natural "end of unit of work",
//! [`spawn_periodic_flush`] runs a background task that flushes a
//! [`Deferred`] on a fixed interval. Failed flushes are logged with
//! `tracing::warn!` and counted; they never stop the task.
//!
//! ```rust
//! use std::time::Duration;
//! use tidewater::prelude::*;
//! use tidewater::schedule::{spawn_periodic_flush, FlushSchedule};
//! use tidewater::testing::RecordingDispatch;
//!
//! # tokio_test::block_on(async {
//! let sink = RecordingDispatch::<Batch<&str>>::new();
//! let logging = Deferred::new(Accumulator::new(), sink.clone());
//!
//! let flusher = spawn_periodic_flush(
//!     logging.clone(),
//!     FlushSchedule::default().with_interval(Duration::from_secs(60)),
//! );
//! logging.record("shutting down");
//!
//! // Shutdown performs one last flush
//! flusher.shutdown().await.unwrap();
//! assert_eq!(sink.calls(), vec![Batch::one("shutting down")]);
//! # });
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::dispatch::Dispatch;
use crate::{Batch, Deferred};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// When a periodic flusher runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushSchedule {
    interval: Duration,
    final_flush: bool,
}

impl FlushSchedule {
    /// Flush every `interval`. Intervals under a millisecond are raised to one.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Whether [`PeriodicFlush::shutdown`] flushes once more before stopping.
    pub fn with_final_flush(mut self, final_flush: bool) -> Self {
        self.final_flush = final_flush;
        self
    }

    /// Time between flushes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a final flush runs on shutdown.
    pub fn final_flush(&self) -> bool {
        self.final_flush
    }
}

impl Default for FlushSchedule {
    /// Every ten seconds, with a final flush.
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            final_flush: true,
        }
    }
}

/// Handle to a running periodic flusher.
///
/// Dropping the handle stops the task the same way
/// [`shutdown`](Self::shutdown) does, but without waiting for it.
pub struct PeriodicFlush {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    failures: Arc<AtomicU64>,
}

impl PeriodicFlush {
    /// Number of flushes that failed so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Whether the background task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the task and wait for it, including the final flush if the
    /// schedule asks for one.
    pub async fn shutdown(mut self) -> Result<(), JoinError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.task).await
    }
}

impl fmt::Debug for PeriodicFlush {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicFlush")
            .field("failures", &self.failures())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Flush `deferred` on `schedule` from a spawned tokio task.
///
/// Must be called from within a tokio runtime. The first flush happens one
/// interval after the call. The task runs in the caller's current span.
pub fn spawn_periodic_flush<E, D>(deferred: Deferred<E, D>, schedule: FlushSchedule) -> PeriodicFlush
where
    E: Send + 'static,
    D: Dispatch<Batch<E>> + 'static,
    D::Error: fmt::Display,
{
    let (tx, mut rx) = oneshot::channel::<()>();
    let failures = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&failures);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + schedule.interval,
            schedule.interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => flush_once(&deferred, &counter).await,
                _ = &mut rx => break,
            }
        }

        if schedule.final_flush {
            flush_once(&deferred, &counter).await;
        }
        tracing::debug!("periodic flush stopped");
    }
    .in_current_span());

    PeriodicFlush {
        shutdown: Some(tx),
        task,
        failures,
    }
}

async fn flush_once<E, D>(deferred: &Deferred<E, D>, failures: &AtomicU64)
where
    E: Send,
    D: Dispatch<Batch<E>>,
    D::Error: fmt::Display,
{
    if let Err(error) = deferred.flush().await {
        let total = failures.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::warn!(%error, failures = total, "periodic flush failed");
    }
}
