//! Per-scope correlating markers.
//!
//! A marker pairs the entry, exception and exit lines of one scope when
//! several scopes share an identifier or run at the same time.

use std::fmt;

use uuid::Uuid;

const MARKER_MODULUS: u128 = 100_000;

/// Five digit, zero-padded random token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker(u32);

impl Marker {
    pub fn generate() -> Self {
        Self((Uuid::new_v4().as_u128() % MARKER_MODULUS) as u32)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:05}", self.0)
    }
}
