//! Storage layer for the statistics service. Provides storage for:
//! - Accepted transactions, queried by time range ([`TransactionsStore`])
//!
//! Current implementation keeps everything in process memory behind a
//! single read/write lock. Nothing survives a restart.

mod transactions;

pub use transactions::{Transaction, TransactionsStore};
