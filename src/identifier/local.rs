//! Local fallback identifier generation.
//!
//! Format: `txn-local-<YYYYMMDD>-<9 digit random>`, date taken in UTC.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::id::TransactionId;

pub const LOCAL_PREFIX: &str = "txn-local";

const SUFFIX_DIGITS: usize = 9;
const SUFFIX_MODULUS: u128 = 1_000_000_000;

/// Generate a local identifier stamped with today's UTC date.
pub fn local_transaction_id() -> TransactionId {
    local_transaction_id_at(Utc::now())
}

/// Generate a local identifier stamped with the date of `now`.
pub fn local_transaction_id_at(now: DateTime<Utc>) -> TransactionId {
    let suffix = Uuid::new_v4().as_u128() % SUFFIX_MODULUS;
    TransactionId::new(format!(
        "{}-{}-{:0width$}",
        LOCAL_PREFIX,
        now.format("%Y%m%d"),
        suffix,
        width = SUFFIX_DIGITS
    ))
}
