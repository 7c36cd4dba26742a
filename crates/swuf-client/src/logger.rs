//! Leveled text logging
//!
//! The client reports through a [`Logger`] capability rather than calling a
//! logging backend directly. [`ConsoleLog`] is the standard implementation:
//! it forwards to the `log` macros with a fixed prefix, and a single
//! verbosity switch chosen at construction gates everything except warnings
//! and errors, which always pass through.

/// Leveled text sinks the client writes to.
pub trait Logger {
    /// A banner line marking the start of a flow.
    fn heading(&self, message: &str);
    /// Ordinary progress output.
    fn log(&self, message: &str);
    fn info(&self, message: &str);
    /// Always active, regardless of verbosity.
    fn warn(&self, message: &str);
    /// Always active, regardless of verbosity.
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
}

/// [`Logger`] backed by the `log` macro facade.
#[derive(Debug, Clone)]
pub struct ConsoleLog {
    prefix: String,
    verbose: bool,
}

impl ConsoleLog {
    pub fn new(prefix: impl Into<String>, verbose: bool) -> Self {
        Self {
            prefix: prefix.into(),
            verbose,
        }
    }

    fn line(&self, message: &str) -> String {
        format!("[{}] {}", self.prefix, message)
    }
}

impl Logger for ConsoleLog {
    fn heading(&self, message: &str) {
        if self.verbose {
            log::info!("[{}] ==== {} ====", self.prefix, message);
        }
    }

    fn log(&self, message: &str) {
        if self.verbose {
            log::info!("{}", self.line(message));
        }
    }

    fn info(&self, message: &str) {
        if self.verbose {
            log::info!("{}", self.line(message));
        }
    }

    fn warn(&self, message: &str) {
        log::warn!("{}", self.line(message));
    }

    fn error(&self, message: &str) {
        log::error!("{}", self.line(message));
    }

    fn debug(&self, message: &str) {
        if self.verbose {
            log::debug!("{}", self.line(message));
        }
    }
}
