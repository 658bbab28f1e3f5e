//! Counters on the `metrics` recorder

use std::convert::Infallible;

use metrics::Label;

use crate::dispatch::{Dispatch, FoldEach};
use crate::event::CounterEvent;

/// Increments one `metrics` counter per event, labelled by the event's tags.
///
/// Dispatches single events; use [`metrics_counters`] to take whole batches.
/// Without an installed recorder the increments are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCounter;

impl<C> Dispatch<C> for MetricsCounter
where
    C: CounterEvent + Send,
{
    type Error = Infallible;

    async fn dispatch(&self, event: C) -> Result<(), Infallible> {
        let labels: Vec<Label> = event
            .tags()
            .into_iter()
            .map(|(key, value)| Label::new(key, value))
            .collect();
        metrics::counter!(event.name().into_owned(), labels).increment(event.times());
        Ok(())
    }
}

/// A batch dispatcher that feeds every counter to the `metrics` recorder.
pub fn metrics_counters() -> FoldEach<MetricsCounter> {
    FoldEach::new(MetricsCounter)
}
