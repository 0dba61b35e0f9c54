//! Scope lifecycle shared by both execution modes.
//!
//! A `Scope` writes the entry line when opened and the exit line exactly once
//! when closed or dropped. An exception line precedes the exit line when the
//! enclosed logic failed, panicked, or was cancelled.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::identifier::TransactionId;
use crate::logging::LogSink;
use crate::marker::Marker;

pub fn entry_line(id: &TransactionId, name: &str, params_json: &str, marker: Marker) -> String {
    format!(
        "Transaction[{}]: Enter[{}] with parameters [{}] marker[{}]",
        id, name, params_json, marker
    )
}

pub fn exit_line(id: &TransactionId, name: &str, marker: Marker) -> String {
    format!("Transaction[{}]: Exit[{}] marker[{}]", id, name, marker)
}

pub fn exception_line(id: &TransactionId, name: &str, marker: Marker) -> String {
    format!("Transaction[{}]: Exception[{}] marker[{}]", id, name, marker)
}

/// Cause reported when the scope ends without an error value to show.
/// Renders as the bare text, without `Debug` quoting.
pub(crate) struct Interrupted(Cow<'static, str>);

impl Interrupted {
    /// Describe a caught panic, keeping its message when it has one.
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned());
        match message {
            Some(message) => Self(Cow::Owned(format!("{}: {}", PANICKED_TEXT, message))),
            None => Self(Cow::Borrowed(PANICKED_TEXT)),
        }
    }
}

impl fmt::Debug for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const PANICKED_TEXT: &str = "panicked inside transaction scope";
const PANICKED: Interrupted = Interrupted(Cow::Borrowed(PANICKED_TEXT));
const CANCELLED: Interrupted =
    Interrupted(Cow::Borrowed("cancelled before transaction scope completed"));

pub(crate) struct Scope {
    name: String,
    id: TransactionId,
    marker: Marker,
    logger: Arc<dyn LogSink>,
    failed: bool,
    // Set while an async body is in flight; a drop in this state is a cancellation.
    in_flight: bool,
    // A scope opened while the thread was already unwinding did not cause that panic.
    opened_panicking: bool,
    closed: bool,
}

impl Scope {
    pub(crate) fn open(
        name: String,
        id: TransactionId,
        params_json: &str,
        logger: Arc<dyn LogSink>,
    ) -> Self {
        let marker = Marker::generate();
        logger.info(&entry_line(&id, &name, params_json, marker));
        Self {
            name,
            id,
            marker,
            logger,
            failed: false,
            in_flight: false,
            opened_panicking: std::thread::panicking(),
            closed: false,
        }
    }

    pub(crate) fn id(&self) -> &TransactionId {
        &self.id
    }

    pub(crate) fn marker(&self) -> Marker {
        self.marker
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Log the exception line. Only the first failure of a scope is logged.
    pub(crate) fn fail(&mut self, cause: &dyn fmt::Debug) {
        if self.failed || self.closed {
            return;
        }
        self.failed = true;
        self.logger
            .error(&exception_line(&self.id, &self.name, self.marker), Some(cause));
    }

    pub(crate) fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        if std::thread::panicking() && !self.opened_panicking {
            self.fail(&PANICKED);
        } else if self.in_flight {
            self.fail(&CANCELLED);
        }
        self.closed = true;
        self.logger
            .info(&exit_line(&self.id, &self.name, self.marker));
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.close();
    }
}
