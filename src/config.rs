//! Identifier service configuration.
//!
//! Settings come from the environment. `from_lookup` takes any key lookup so
//! callers (and tests) can supply values without touching process state.

use std::time::Duration;

/// Address of the remote transaction ID service.
pub const ID_SERVICE_URL_VAR: &str = "TXN_ID_SERVICE_URL";

/// Request timeout for the remote service, in milliseconds.
pub const ID_SERVICE_TIMEOUT_VAR: &str = "TXN_ID_SERVICE_TIMEOUT_MS";

pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq)]
pub struct IdServiceConfig {
    /// `None` means identifiers are always generated locally.
    pub url: Option<String>,
    pub timeout: Duration,
}

impl Default for IdServiceConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl IdServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ID_SERVICE_URL_VAR)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let timeout = match lookup(ID_SERVICE_TIMEOUT_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => {
                    log::warn!(
                        "ID_SERVICE_TIMEOUT_INVALID value={:?} error={} default_ms={}",
                        raw,
                        e,
                        DEFAULT_TIMEOUT_MS
                    );
                    Duration::from_millis(DEFAULT_TIMEOUT_MS)
                }
            },
            None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };

        Self { url, timeout }
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_remote(&self) -> bool {
        self.url.is_some()
    }
}
