//! Diagnostic context for log dispatch
//!
//! A [`DiagnosticContext`] is a scope name plus a set of key/value entries
//! (request ids, tenant names, ...) that should accompany every line written
//! while it is active. Activation is a `tracing` span: [`DiagnosticContext::scope`]
//! instruments a future with it, so the context is entered whenever the
//! future is polled and is gone once the future completes, fails or is dropped.
//!
//! [`Contextual`] puts this together with a [`LogWriter`]: it turns a drained
//! batch of log events into **one** line, messages joined by
//! [`MESSAGE_SEPARATOR`] in drain order, and writes that line inside the
//! context.
//!
//! ```rust
//! use tidewater::context::{merge_context, DiagnosticEntry};
//!
//! let ctx = merge_context(
//!     "App",
//!     [
//!         DiagnosticEntry::new("request_id", "1"),
//!         DiagnosticEntry::new("user", "ada"),
//!         DiagnosticEntry::new("request_id", "2"),
//!     ],
//! );
//!
//! assert_eq!(ctx.name(), "App");
//! // Later entries win
//! assert_eq!(ctx.get("request_id"), Some("2"));
//! assert_eq!(ctx.to_string(), "App{request_id=2 user=ada}");
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use tracing::instrument::Instrumented;
use tracing::Instrument;

use crate::dispatch::Dispatch;
use crate::event::{Level, LogEvent};
use crate::Batch;

/// Separator placed between messages when a batch is written as one line.
pub const MESSAGE_SEPARATOR: &str = " | ";

/// One key/value pair of diagnostic context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagnosticEntry {
    /// Entry name.
    pub key: String,
    /// Entry value.
    pub value: String,
}

impl DiagnosticEntry {
    /// A new entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for DiagnosticEntry {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// A named scope with key/value entries, attached to dispatch calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiagnosticContext {
    name: String,
    entries: BTreeMap<String, String>,
}

/// Build a context from a scope name and entries.
///
/// Entries are applied in iteration order; when a key repeats, the last
/// value wins.
pub fn merge_context<I>(scope: impl Into<String>, entries: I) -> DiagnosticContext
where
    I: IntoIterator,
    I::Item: Into<DiagnosticEntry>,
{
    DiagnosticContext::new(scope).merge(entries)
}

impl DiagnosticContext {
    /// An empty context named `scope`.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            name: scope.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add or replace one entry.
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Apply entries in order; repeated keys take the last value.
    pub fn merge<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<DiagnosticEntry>,
    {
        for entry in entries {
            let DiagnosticEntry { key, value } = entry.into();
            self.entries.insert(key, value);
        }
        self
    }

    /// Scope name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value for `key`, if set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries ordered by key.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The span carrying this context.
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "diagnostic",
            scope = %self.name,
            context = %EntriesDisplay(&self.entries),
        )
    }

    /// Run `future` with this context active.
    ///
    /// The span is entered on every poll and exited after it, and is closed
    /// when the returned future is dropped, whether it finished or not.
    pub fn scope<F: Future>(&self, future: F) -> Instrumented<F> {
        future.instrument(self.span())
    }

    /// Wrap `dispatcher` so every call it makes runs in this context.
    pub fn wrap<D>(self, dispatcher: D) -> InContext<D> {
        InContext {
            inner: dispatcher,
            context: self,
        }
    }
}

struct EntriesDisplay<'a>(&'a BTreeMap<String, String>);

impl fmt::Display for EntriesDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl fmt::Display for DiagnosticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.name, EntriesDisplay(&self.entries))
    }
}

/// Any dispatcher, run inside a [`DiagnosticContext`]. Created by
/// [`DiagnosticContext::wrap`].
#[derive(Debug, Clone)]
pub struct InContext<D> {
    inner: D,
    context: DiagnosticContext,
}

impl<D> InContext<D> {
    /// The active context.
    pub fn context(&self) -> &DiagnosticContext {
        &self.context
    }
}

impl<W, D> Dispatch<W> for InContext<D>
where
    D: Dispatch<W>,
{
    type Error = D::Error;

    fn dispatch(&self, batch: W) -> impl Future<Output = Result<(), D::Error>> + Send {
        self.context.scope(self.inner.dispatch(batch))
    }
}

/// Destination for single, already-formatted log lines.
pub trait LogWriter: Send + Sync {
    /// What a failed write reports.
    type Error: Send;

    /// Write one line at `level`. Called with `context` active.
    fn write(
        &self,
        context: &DiagnosticContext,
        level: Level,
        message: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Writes each batch of log events as one line under a diagnostic context.
///
/// The line's level is the most severe level in the batch.
///
/// ```rust
/// use tidewater::prelude::*;
/// use tidewater::context::{merge_context, Contextual};
/// use tidewater::event::LogRecord;
/// use tidewater::sinks::TracingWriter;
///
/// # tokio_test::block_on(async {
/// let ctx = merge_context("App", [("request_id", "42")]);
/// let logging = Logging::new(Accumulator::new(), Contextual::new(TracingWriter, ctx));
///
/// logging.record(LogRecord::info("Hello, world"));
/// logging.record(LogRecord::info("Hello, world"));
/// logging.flush().await.unwrap();
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Contextual<W> {
    writer: W,
    context: DiagnosticContext,
    separator: Cow<'static, str>,
}

impl<W> Contextual<W> {
    /// Write through `writer` under `context`.
    pub fn new(writer: W, context: DiagnosticContext) -> Self {
        Self {
            writer,
            context,
            separator: Cow::Borrowed(MESSAGE_SEPARATOR),
        }
    }

    /// Join messages with `separator` instead of [`MESSAGE_SEPARATOR`].
    pub fn with_separator(mut self, separator: impl Into<Cow<'static, str>>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The context lines are written under.
    pub fn context(&self) -> &DiagnosticContext {
        &self.context
    }

    /// The underlying writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

/// Join the messages of `batch` in order.
pub fn join_messages<L: LogEvent>(batch: &Batch<L>, separator: &str) -> String {
    let mut line = String::new();
    for (i, event) in batch.iter().enumerate() {
        if i > 0 {
            line.push_str(separator);
        }
        line.push_str(&event.message());
    }
    line
}

impl<L, W> Dispatch<Batch<L>> for Contextual<W>
where
    L: LogEvent + Send,
    W: LogWriter,
{
    type Error = W::Error;

    async fn dispatch(&self, batch: Batch<L>) -> Result<(), W::Error> {
        let Some(level) = batch.iter().map(LogEvent::level).max() else {
            return Ok(());
        };
        let line = join_messages(&batch, &self.separator);
        drop(batch);

        self.context
            .scope(self.writer.write(&self.context, level, &line))
            .await
    }
}
