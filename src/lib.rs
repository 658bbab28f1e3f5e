//! # Tidewater
//!
//! Deferred, monoidal accumulation and batched dispatch of observability
//! events.
//!
//! Producers *record* counters and log lines into a shared [`Accumulator`]
//! without touching any backend. At a few control points (the end of a
//! request, a timer tick) the accumulator is *flushed*: everything recorded so
//! far is drained atomically and handed to a [`Dispatch`] as one [`Batch`].
//! Events that must not wait go through [`Immediate`] instead and skip the
//! accumulator entirely.
//!
//! Batches combine by concatenation, so the accumulator only relies on
//! [`Monoid`]: `append` is `combine` with the current state, `drain` swaps in
//! `empty()`.
//!
//! ## Quick Example
//!
//! ```rust
//! use tidewater::prelude::*;
//! use tidewater::event::Counter;
//! use tidewater::testing::RecordingDispatch;
//!
//! # tokio_test::block_on(async {
//! let sink = RecordingDispatch::<Batch<Counter>>::new();
//!
//! // One accumulator per session, passed in explicitly
//! let counting = Counting::new(Accumulator::new(), sink.clone());
//! let counting_now = CountingNow::new(sink.clone());
//!
//! counting_now.record_now(Counter::new("application_started")).await.unwrap();
//!
//! counting.record(Counter::new("said_hello"));
//! counting.record(Counter::new("said_hello"));
//! counting.flush().await.unwrap();
//!
//! let calls = sink.calls();
//! assert_eq!(calls.len(), 2);
//! assert_eq!(calls[1].len(), 2);
//! # });
//! ```
//!
//! ## Logging with context
//!
//! ```rust
//! use tidewater::prelude::*;
//! use tidewater::context::{merge_context, Contextual};
//! use tidewater::sinks::TracingWriter;
//!
//! # tokio_test::block_on(async {
//! let ctx = merge_context("App", [("request_id", "42")]);
//! let logging = Logging::new(Accumulator::new(), Contextual::new(TracingWriter, ctx));
//!
//! logging.info("Hello, world");
//! logging.info("Hello, world");
//! // One line: "Hello, world | Hello, world", inside the App span
//! logging.flush().await.unwrap();
//! # });
//! ```
//!
//! ## Features
//!
//! - `async`: [`schedule`], a tokio task that flushes on an interval.
//! - `metrics`: a counter sink for the `metrics` crate.
//! - `serde`: `Serialize`/`Deserialize` for batches, events and contexts.
//! - `proptest`: `Arbitrary` for [`Batch`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod accumulator;
pub mod batch;
pub mod context;
pub mod deferred;
pub mod dispatch;
pub mod event;
pub mod immediate;
pub mod monoid;
#[cfg(feature = "async")]
pub mod schedule;
pub mod semigroup;
pub mod sinks;
pub mod testing;

// Re-exports
pub use accumulator::Accumulator;
pub use batch::Batch;
pub use context::{merge_context, DiagnosticContext, DiagnosticEntry, MESSAGE_SEPARATOR};
pub use deferred::Deferred;
pub use dispatch::{Dispatch, DispatchExt};
pub use immediate::Immediate;
pub use monoid::Monoid;
pub use semigroup::Semigroup;

/// Deferred algebra for counter events.
pub type Counting<C, D> = Deferred<C, D>;

/// Deferred algebra for log events.
pub type Logging<D> = Deferred<event::LogRecord, D>;

/// Immediate algebra for counter events.
pub type CountingNow<D> = Immediate<D>;

/// Immediate algebra for log events.
pub type LoggingNow<D> = Immediate<D>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::accumulator::Accumulator;
    pub use crate::batch::Batch;
    pub use crate::deferred::Deferred;
    pub use crate::dispatch::{dispatch_fn, Dispatch, DispatchExt};
    pub use crate::immediate::Immediate;
    pub use crate::monoid::Monoid;
    pub use crate::semigroup::Semigroup;
    pub use crate::{Counting, CountingNow, Logging, LoggingNow};
}
