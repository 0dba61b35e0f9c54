//! Where new transaction identifiers come from.

use crate::config::IdServiceConfig;

use super::id::TransactionId;
use super::local::local_transaction_id;
use super::remote::RemoteIdClient;

/// Produces identifiers for scopes that were not handed one.
///
/// `next_id` cannot fail: sources must degrade rather than block a
/// transaction from starting.
pub trait IdentifierSource: Send + Sync {
    fn next_id(&self) -> TransactionId;

    /// Whether `next_id` may wait on I/O. Async scopes move such calls off
    /// the scheduler thread.
    fn may_block(&self) -> bool {
        false
    }
}

/// Fetches identifiers from the remote service when one is configured,
/// generating them locally otherwise or when the service fails.
#[derive(Debug)]
pub struct TransactionIdGenerator {
    remote: Option<RemoteIdClient>,
}

impl Default for TransactionIdGenerator {
    fn default() -> Self {
        Self::local()
    }
}

impl TransactionIdGenerator {
    pub fn new(config: &IdServiceConfig) -> Self {
        let remote = config
            .url
            .as_deref()
            .map(|url| RemoteIdClient::new(url, config.timeout));
        Self { remote }
    }

    pub fn from_env() -> Self {
        Self::new(&IdServiceConfig::from_env())
    }

    pub fn local() -> Self {
        Self { remote: None }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }
}

impl IdentifierSource for TransactionIdGenerator {
    fn next_id(&self) -> TransactionId {
        let Some(client) = &self.remote else {
            return local_transaction_id();
        };

        match client.fetch_transaction_id() {
            Ok(id) => id,
            Err(e) => {
                let fallback = local_transaction_id();
                log::warn!(
                    "ID_SERVICE_UNAVAILABLE endpoint={} error={} fallback={}",
                    client.endpoint(),
                    e,
                    fallback
                );
                fallback
            }
        }
    }

    fn may_block(&self) -> bool {
        self.is_remote()
    }
}
