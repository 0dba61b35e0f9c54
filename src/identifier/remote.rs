//! Client for the remote transaction ID service.
//!
//! The service answers `GET <base>/skuid/ska_transaction_id` with either a
//! plain-text identifier or a JSON wrapper such as
//! `{"transaction_id": "..."}`. Some deployments double-encode the wrapper as
//! a JSON string; both shapes are accepted.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::IdServiceError;

use super::id::TransactionId;

pub const ID_ENDPOINT: &str = "skuid/ska_transaction_id";

const ID_FIELD: &str = "transaction_id";

#[derive(Debug)]
pub struct RemoteIdClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl RemoteIdClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint_for(base_url),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn fetch_transaction_id(&self) -> Result<TransactionId, IdServiceError> {
        let response = self.agent.get(&self.endpoint).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => IdServiceError::Status {
                url: self.endpoint.clone(),
                status,
            },
            ureq::Error::Transport(t) => IdServiceError::Transport {
                url: self.endpoint.clone(),
                reason: t.to_string(),
            },
        })?;

        let body = response
            .into_string()
            .map_err(|e| IdServiceError::Body(e.to_string()))?;

        parse_id_response(&body)
    }
}

/// Build the full request URL, defaulting to `http://` when no scheme is given.
pub fn endpoint_for(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.contains("://") {
        format!("{}/{}", base, ID_ENDPOINT)
    } else {
        format!("http://{}/{}", base, ID_ENDPOINT)
    }
}

/// Extract the identifier from a service response body.
pub fn parse_id_response(body: &str) -> Result<TransactionId, IdServiceError> {
    let trimmed = body.trim();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => id_from_object(&map),
        // Double-encoded wrapper, or a JSON-quoted bare id.
        Ok(Value::String(inner)) => match serde_json::from_str::<Value>(&inner) {
            Ok(Value::Object(map)) => id_from_object(&map),
            _ => TransactionId::parse(&inner).ok_or(IdServiceError::EmptyIdentifier),
        },
        // A numeric body is kept as written; `1.50` stays `1.50`.
        Ok(Value::Number(_)) => Ok(TransactionId::new(trimmed)),
        Ok(other) => Err(IdServiceError::Body(format!(
            "unexpected JSON response {}",
            other
        ))),
        Err(_) => TransactionId::parse(trimmed).ok_or(IdServiceError::EmptyIdentifier),
    }
}

fn id_from_object(map: &Map<String, Value>) -> Result<TransactionId, IdServiceError> {
    match map.get(ID_FIELD) {
        Some(Value::String(s)) => TransactionId::parse(s).ok_or(IdServiceError::EmptyIdentifier),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| v.to_string())
            .or_else(|| n.as_i64().map(|v| v.to_string()))
            .map(TransactionId::new)
            .ok_or(IdServiceError::EmptyIdentifier),
        _ => Err(IdServiceError::EmptyIdentifier),
    }
}
