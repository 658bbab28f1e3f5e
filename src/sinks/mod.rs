//! Ready-made destinations
//!
//! - [`TracingWriter`] writes combined log lines as `tracing` events.
//! - [`MetricsCounter`] (feature `metrics`) increments counters on the
//!   installed `metrics` recorder.
//!
//! Anything else can implement [`Dispatch`](crate::dispatch::Dispatch) or
//! [`LogWriter`](crate::context::LogWriter) directly.

mod log;
#[cfg(feature = "metrics")]
mod metrics;

pub use log::TracingWriter;
#[cfg(feature = "metrics")]
pub use metrics::{metrics_counters, MetricsCounter};
