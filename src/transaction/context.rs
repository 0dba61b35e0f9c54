//! Transaction construction and identifier resolution.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::TransactionError;
use crate::identifier::{IdentifierSource, TransactionId, TransactionIdGenerator};
use crate::logging::{LogContext, LogFacadeSink, LogSink};
use crate::{log_debug, log_info};

use super::guard::TransactionGuard;
use super::scope::Scope;

/// Key looked up in the parameters for an upstream transaction id.
pub const DEFAULT_TRANSACTION_ID_KEY: &str = "transaction_id";

/// Enclosed logic runs directly on the caller's thread.
#[derive(Debug, Clone, Copy)]
pub struct Blocking;

/// Enclosed logic is a future that may suspend between entry and exit.
#[derive(Debug, Clone, Copy)]
pub struct Cooperative;

/// A transaction that has been described but not yet entered.
///
/// `M` selects how the enclosed logic executes; see [`Blocking`] and
/// [`Cooperative`]. Identifier resolution happens on entry, in this order:
/// 1. an explicit id from [`with_transaction_id`](Self::with_transaction_id)
/// 2. a string found in the parameters under the transaction id key
/// 3. a fresh id from the identifier source
///
/// Blank or non-string candidates are skipped.
pub struct TransactionContext<M> {
    name: String,
    params: Map<String, Value>,
    params_json: String,
    transaction_id: Option<String>,
    transaction_id_key: String,
    logger: Arc<dyn LogSink>,
    id_source: Option<Arc<dyn IdentifierSource>>,
    _mode: PhantomData<M>,
}

pub type Transaction = TransactionContext<Blocking>;
pub type AsyncTransaction = TransactionContext<Cooperative>;

impl<M> TransactionContext<M> {
    /// Describe a transaction. `params` must serialize to a JSON object.
    pub fn new<P>(name: &str, params: &P) -> Result<Self, TransactionError>
    where
        P: Serialize + ?Sized,
    {
        let value = serde_json::to_value(params)
            .map_err(|e| TransactionError::InvalidParams(e.to_string()))?;
        let map = match value {
            Value::Object(map) => map,
            other => return Err(TransactionError::InvalidParams(json_kind(&other).to_string())),
        };
        // Serialized from the caller's value so its field order is kept.
        let params_json = serde_json::to_string(params)
            .map_err(|e| TransactionError::InvalidParams(e.to_string()))?;

        Ok(Self::from_parts(name, map, params_json))
    }

    /// Describe a transaction with no parameters.
    pub fn named(name: &str) -> Self {
        Self::from_parts(name, Map::new(), "{}".to_string())
    }

    fn from_parts(name: &str, params: Map<String, Value>, params_json: String) -> Self {
        Self {
            name: name.to_string(),
            params,
            params_json,
            transaction_id: None,
            transaction_id_key: DEFAULT_TRANSACTION_ID_KEY.to_string(),
            logger: Arc::new(LogFacadeSink::default()),
            id_source: None,
            _mode: PhantomData,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = logger;
        self
    }

    /// Use an identifier received from upstream instead of generating one.
    pub fn with_transaction_id(mut self, transaction_id: impl AsRef<str>) -> Self {
        self.transaction_id = Some(transaction_id.as_ref().to_string());
        self
    }

    pub fn with_transaction_id_key(mut self, key: &str) -> Self {
        self.transaction_id_key = key.to_string();
        self
    }

    /// Replace the default source, [`TransactionIdGenerator::from_env`].
    pub fn with_id_source(mut self, source: Arc<dyn IdentifierSource>) -> Self {
        self.id_source = Some(source);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub(crate) fn id_source(&self) -> Arc<dyn IdentifierSource> {
        match &self.id_source {
            Some(source) => Arc::clone(source),
            None => Arc::new(TransactionIdGenerator::from_env()),
        }
    }

    /// The identifier handed in by the caller, if any candidate is valid.
    pub(crate) fn supplied_id(&self) -> Option<TransactionId> {
        let explicit = self.transaction_id.as_deref().and_then(TransactionId::parse);
        let from_params = self
            .params
            .get(&self.transaction_id_key)
            .and_then(TransactionId::from_value);
        let chosen = explicit.clone().or_else(|| from_params.clone());

        if let (Some(raw), Some(in_params)) = (
            self.transaction_id.as_deref(),
            self.params.get(&self.transaction_id_key),
        ) {
            if !raw.is_empty() && is_truthy(in_params) {
                let ctx = LogContext::new(&self.name);
                log_info!(
                    ctx,
                    "TRANSACTION_ID_CONFLICT",
                    explicit = raw,
                    in_params = in_params.to_string(),
                    using = chosen.as_ref().map(|id| id.to_string()),
                );
            }
        }

        chosen
    }

    pub(crate) fn note_generated(&self, id: &TransactionId) {
        let ctx = LogContext::new(&self.name).with_transaction(id.as_str());
        log_debug!(ctx, "TRANSACTION_ID_GENERATED", key = self.transaction_id_key);
    }

    /// Write the entry line and hand back the open scope.
    pub(crate) fn open(self, id: TransactionId) -> TransactionGuard {
        TransactionGuard::new(Scope::open(self.name, id, &self.params_json, self.logger))
    }
}

/// Whether a params value counts as set: non-empty, non-zero and not `null`.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
