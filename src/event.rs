//! Event capabilities
//!
//! The accumulator and dispatch machinery never look at a concrete event type.
//! Sinks ask for capabilities instead: a counter sink needs anything that can
//! report a name, tags and a count ([`CounterEvent`]); a log sink needs a level
//! and a message ([`LogEvent`]). Applications usually model their events as
//! plain enums and implement one of these traits:
//!
//! ```
//! use std::borrow::Cow;
//! use tidewater::event::{Level, LogEvent};
//!
//! enum AppLog {
//!     Started,
//!     HelloWorld,
//! }
//!
//! impl LogEvent for AppLog {
//!     fn level(&self) -> Level {
//!         Level::Info
//!     }
//!
//!     fn message(&self) -> Cow<'_, str> {
//!         match self {
//!             AppLog::Started => "Application started".into(),
//!             AppLog::HelloWorld => "Hello, world".into(),
//!         }
//!     }
//! }
//!
//! assert_eq!(AppLog::HelloWorld.message(), "Hello, world");
//! ```
//!
//! [`Counter`] and [`LogRecord`] are ready-made shapes for when a dedicated
//! enum is overkill.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Tags attached to a counter, ordered by key so identical tag sets compare equal.
pub type Tags = BTreeMap<String, String>;

/// Something that increments a named, tag-dimensioned counter.
pub trait CounterEvent {
    /// Counter name, e.g. `said_hello`.
    fn name(&self) -> Cow<'_, str>;

    /// Dimensions of the counter. Defaults to no tags.
    fn tags(&self) -> Tags {
        Tags::new()
    }

    /// How much to increment by. Defaults to one; must be at least one.
    fn times(&self) -> u64 {
        1
    }
}

/// Something that writes one log line.
pub trait LogEvent {
    /// Severity of the line.
    fn level(&self) -> Level;

    /// Text of the line.
    fn message(&self) -> Cow<'_, str>;
}

/// Log severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// Verbose diagnostics.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Something unexpected that did not stop the work.
    Warn,
    /// A failure.
    Error,
}

impl Level {
    /// Lower-case name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error => tracing::Level::ERROR,
        }
    }
}

/// A plain counter increment.
///
/// ```
/// use tidewater::event::{Counter, CounterEvent};
///
/// let hello = Counter::new("said_hello").with_tag("lang", "en").with_times(2);
/// assert_eq!(hello.name(), "said_hello");
/// assert_eq!(hello.tags().get("lang").map(String::as_str), Some("en"));
/// assert_eq!(hello.times(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counter {
    name: String,
    tags: Tags,
    times: u64,
}

impl Counter {
    /// A single increment of `name` with no tags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Tags::new(),
            times: 1,
        }
    }

    /// Add a tag. A repeated key replaces the earlier value.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the increment. Zero is raised to one.
    pub fn with_times(mut self, times: u64) -> Self {
        self.times = times.max(1);
        self
    }
}

impl CounterEvent for Counter {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn tags(&self) -> Tags {
        self.tags.clone()
    }

    fn times(&self) -> u64 {
        self.times
    }
}

/// A plain log line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogRecord {
    /// Severity.
    pub level: Level,
    /// Text.
    pub message: String,
}

impl LogRecord {
    /// A line at the given level.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// A debug line.
    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Level::Debug, message)
    }

    /// An info line.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    /// A warning line.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Level::Warn, message)
    }

    /// An error line.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }
}

impl LogEvent for LogRecord {
    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }
}

impl<T: CounterEvent + ?Sized> CounterEvent for &T {
    fn name(&self) -> Cow<'_, str> {
        (**self).name()
    }

    fn tags(&self) -> Tags {
        (**self).tags()
    }

    fn times(&self) -> u64 {
        (**self).times()
    }
}

impl<T: LogEvent + ?Sized> LogEvent for &T {
    fn level(&self) -> Level {
        (**self).level()
    }

    fn message(&self) -> Cow<'_, str> {
        (**self).message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_order_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert_eq!(
            [Level::Warn, Level::Debug, Level::Error].iter().max(),
            Some(&Level::Error)
        );
    }

    #[test]
    fn test_level_display() {
        assert_eq!(Level::Warn.to_string(), "warn");
        assert_eq!(tracing::Level::from(Level::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_counter_defaults() {
        let c = Counter::new("said_hello");
        assert_eq!(c.name(), "said_hello");
        assert!(c.tags().is_empty());
        assert_eq!(c.times(), 1);
    }

    #[test]
    fn test_counter_times_never_zero() {
        let c = Counter::new("x").with_times(0);
        assert_eq!(c.times(), 1);
    }

    #[test]
    fn test_counter_repeated_tag_replaces() {
        let c = Counter::new("x").with_tag("k", "a").with_tag("k", "b");
        assert_eq!(c.tags().get("k").map(String::as_str), Some("b"));
    }

    #[test]
    fn test_enum_event_uses_default_capabilities() {
        enum Business {
            SaidHello,
        }

        impl CounterEvent for Business {
            fn name(&self) -> Cow<'_, str> {
                match self {
                    Business::SaidHello => "said_hello".into(),
                }
            }
        }

        let ev = Business::SaidHello;
        assert_eq!(ev.name(), "said_hello");
        assert_eq!(ev.times(), 1);
        assert!(ev.tags().is_empty());
    }

    #[test]
    fn test_log_record_constructors() {
        assert_eq!(LogRecord::warn("w").level(), Level::Warn);
        assert_eq!(LogRecord::info("hi").message(), "hi");
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::Batch;

    #[test]
    fn test_log_record_json_shape() {
        let json = serde_json::to_string(&LogRecord::warn("disk full")).unwrap();
        assert_eq!(json, r#"{"level":"warn","message":"disk full"}"#);
    }

    #[test]
    fn test_batch_is_a_plain_array() {
        let batch = Batch::of([Counter::new("a"), Counter::new("b").with_times(3)]);
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.starts_with('['));

        let restored: Batch<Counter> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, batch);
    }
}
