//! The transaction identifier value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque identifier correlating one logical operation across log lines
/// and, when passed along, across services.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Accepts a candidate only if it is non-blank after trimming.
    pub fn parse(candidate: &str) -> Option<Self> {
        if is_valid_id(candidate) {
            Some(Self(candidate.to_string()))
        } else {
            None
        }
    }

    /// Accepts a JSON value only if it is a non-blank string.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

pub fn is_valid_id(candidate: &str) -> bool {
    !candidate.trim().is_empty()
}
