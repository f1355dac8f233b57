//! Domain-specific errors for the transaction store.
//!
//! These represent rejected individual operations. The store is never left
//! in a partial state when one of them is returned, and stays usable
//! afterwards.
//!
//! Transport failures (malformed JSON, missing fields) never reach this
//! layer, see [`crate::api`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The transaction claims to have happened after the moment it was inserted.
    #[error("transaction timestamp {timestamp} is later than the current time {now}")]
    FutureTimestamp {
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    #[error("transaction amount {0} must not be negative")]
    InvalidAmount(Decimal),
}
