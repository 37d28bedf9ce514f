//! Reporting of non-fatal validation findings.
//!
//! Validators surface warnings through a [`Reporter`] rather than a module-level logger, so that
//! callers can capture them. The default [`LogReporter`] forwards to the `log` facade.

/// Receives non-fatal validation warnings
pub trait Reporter {
    /// Report one warning message
    fn warn(&self, message: &str);
}

/// Forwards warnings to the global logger
#[derive(Clone, Copy, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn warn(&self, message: &str) {
        log::warn!("{message}");
    }
}
