//! log-transactions - transaction-scoped logging
//!
//! A transaction is a logged unit of work. Entering one obtains an
//! identifier (handed in by the caller, found in the parameters, fetched from
//! a remote ID service, or generated locally) and a random marker, then
//! writes an entry line. Leaving it writes an exit line, preceded by an
//! exception line when the enclosed logic failed. The identifier is handed to
//! the enclosed logic so it can be passed on to downstream calls.
//!
//! ```text
//! Transaction[<id>]: Enter[<name>] with parameters [<params>] marker[<marker>]
//! Transaction[<id>]: Exception[<name>] marker[<marker>]
//! Transaction[<id>]: Exit[<name>] marker[<marker>]
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `transaction` - scope lifecycle with blocking and async entry points
//! - `identifier` - identifier value, local generation, remote ID service
//! - `marker` - per-scope correlating markers
//! - `logging` - log sinks and context-tagged macros
//! - `config` - ID service settings from the environment
//! - `error` - error types

use serde::Serialize;

pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod marker;
pub mod transaction;

pub use config::IdServiceConfig;
pub use error::{IdServiceError, TransactionError};
pub use identifier::{
    local_transaction_id, IdentifierSource, TransactionId, TransactionIdGenerator,
};
pub use logging::{LogFacadeSink, LogRecord, LogSink, RecordingSink};
pub use marker::Marker;
pub use transaction::{AsyncTransaction, Transaction, TransactionContext, TransactionGuard};

/// Install `env_logger` as the console logger, once.
///
/// Scope lines go through the `log` facade by default; without an installed
/// logger they are discarded.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .try_init();
}

/// Describe a synchronous transaction.
///
/// ```
/// use serde_json::json;
///
/// let params = json!({"subarray": 1});
/// let result = log_transactions::transaction("Configure", &params)?
///     .run(|transaction_id| {
///         // pass transaction_id on to downstream calls
///         Ok::<_, std::io::Error>(transaction_id.to_string())
///     });
/// assert!(result.is_ok());
/// # Ok::<(), log_transactions::TransactionError>(())
/// ```
pub fn transaction<P>(name: &str, params: &P) -> Result<Transaction, TransactionError>
where
    P: Serialize + ?Sized,
{
    Transaction::new(name, params)
}

/// Describe an asynchronous transaction.
pub fn async_transaction<P>(name: &str, params: &P) -> Result<AsyncTransaction, TransactionError>
where
    P: Serialize + ?Sized,
{
    AsyncTransaction::new(name, params)
}
