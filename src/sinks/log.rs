//! Log lines as `tracing` events

use std::convert::Infallible;

use crate::context::{DiagnosticContext, LogWriter};
use crate::event::Level;

/// Writes each line as a `tracing` event at the line's level.
///
/// The diagnostic context is not repeated on the event; [`Contextual`]
/// writes inside the context's span, so subscribers see it as the parent.
///
/// [`Contextual`]: crate::context::Contextual
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWriter;

impl LogWriter for TracingWriter {
    type Error = Infallible;

    async fn write(
        &self,
        _context: &DiagnosticContext,
        level: Level,
        message: &str,
    ) -> Result<(), Infallible> {
        match level {
            Level::Debug => tracing::debug!("{}", message),
            Level::Info => tracing::info!("{}", message),
            Level::Warn => tracing::warn!("{}", message),
            Level::Error => tracing::error!("{}", message),
        }
        Ok(())
    }
}
