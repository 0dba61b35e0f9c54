//! Log sinks that transaction scopes write their lines to.

use std::fmt;

use log::Level;
use parking_lot::Mutex;

/// Default target used by [`LogFacadeSink`].
pub const DEFAULT_TARGET: &str = "log_transactions";

/// The logging capability a transaction scope needs.
///
/// Entry and exit lines go to `info`, exception lines to `error` together
/// with the failure that caused them. Implementations must tolerate calls
/// from many threads and tasks at once.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);

    fn error(&self, message: &str, cause: Option<&dyn fmt::Debug>);
}

/// Forwards scope lines to the `log` facade.
///
/// Formatting (timestamps, thread names, output stream) is whatever the
/// installed logger does; see [`crate::init_logger`] for the console default.
#[derive(Debug, Clone)]
pub struct LogFacadeSink {
    target: String,
}

impl Default for LogFacadeSink {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET)
    }
}

impl LogFacadeSink {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl LogSink for LogFacadeSink {
    fn info(&self, message: &str) {
        log::info!(target: self.target.as_str(), "{}", message);
    }

    fn error(&self, message: &str, cause: Option<&dyn fmt::Debug>) {
        match cause {
            Some(cause) => log::error!(target: self.target.as_str(), "{}\n{:?}", message, cause),
            None => log::error!(target: self.target.as_str(), "{}", message),
        }
    }
}

/// A single line captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub cause: Option<String>,
}

impl LogRecord {
    /// Message followed by the cause on its own line, as a console would show it.
    pub fn rendered(&self) -> String {
        match &self.cause {
            Some(cause) => format!("{}\n{}", self.message, cause),
            None => self.message.clone(),
        }
    }
}

/// Keeps every line in memory, in the order it was written.
#[derive(Debug, Default)]
pub struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    fn push(&self, level: Level, message: &str, cause: Option<String>) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            cause,
        });
    }
}

impl LogSink for RecordingSink {
    fn info(&self, message: &str) {
        self.push(Level::Info, message, None);
    }

    fn error(&self, message: &str, cause: Option<&dyn fmt::Debug>) {
        self.push(Level::Error, message, cause.map(|c| format!("{:?}", c)));
    }
}
