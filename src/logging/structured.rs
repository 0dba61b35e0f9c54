//! Key=value lines for the crate's own chatter.
//!
//! Scope lines go to the [`LogSink`](super::LogSink). Everything else the
//! crate has to say (id conflicts, service fallbacks, generated ids) goes to
//! the `log` facade as `[txn=<name>] [id=<id>] EVENT key=value ...`.

use std::fmt;

/// Prefix naming the transaction a facade message belongs to.
///
/// The id is left off until it has been resolved.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub name: String,
    pub transaction_id: Option<String>,
}

impl LogContext {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transaction_id: None,
        }
    }

    pub fn with_transaction(&self, transaction_id: &str) -> Self {
        Self {
            transaction_id: Some(transaction_id.to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[txn={}]", self.name)?;
        if let Some(id) = &self.transaction_id {
            write!(f, " [id={}]", id)?;
        }
        Ok(())
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_event {
    ($level:expr, $ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::log!(
            $level,
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::log_event!(log::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)+) => { $crate::log_event!(log::Level::Warn, $($arg)+) };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::log_event!(log::Level::Debug, $($arg)+) };
}

#[cfg(test)]
mod tests {
    use crate::{log_debug, log_info, log_warn};

    use super::*;

    #[test]
    fn test_context_prefix() {
        let ctx = LogContext::new("Command");
        assert_eq!(format!("{}", ctx), "[txn=Command]");

        let ctx_with_id = ctx.with_transaction("txn-local-20201001-000000042");
        assert_eq!(
            format!("{}", ctx_with_id),
            "[txn=Command] [id=txn-local-20201001-000000042]"
        );
    }

    #[test]
    fn test_event_macros_take_several_pairs() {
        let ctx = LogContext::new("Command").with_transaction("abc1234");
        log_info!(ctx, "TRANSACTION_ID_CONFLICT", explicit = "abc1234", in_params = 7, using = "abc1234");
        log_warn!(ctx, "ID_SERVICE_UNAVAILABLE", url = "http://skuid:9870",);
        log_debug!(ctx, "TRANSACTION_ID_GENERATED", key = "transaction_id");
        assert_eq!(ctx.name, "Command");
    }
}
