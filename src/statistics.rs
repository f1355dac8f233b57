//! Aggregate statistics over the trailing window.
//!
//! Every call re-reads the store for `[now - 60s, now]` and reduces the
//! matching records. Nothing is cached between calls.

use chrono::Duration;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::warn;

use crate::clock::Clock;
use crate::stores::{Transaction, TransactionsStore};

/// Length in seconds of the trailing window statistics are computed over.
pub const WINDOW_SECS: i64 = 60;

const DECIMAL_PLACES: u32 = 2;

/// Sum of the amounts in the window.
///
/// Exact while it fits in a [`Decimal`]. Past roughly 7.9e28 it is carried as an
/// `f64`, the same precision a JSON number has on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Total {
    Exact(Decimal),
    Approximate(f64),
}

impl Total {
    pub fn to_f64(self) -> f64 {
        match self {
            // Every Decimal is within f64 range.
            Total::Exact(value) => value.to_f64().unwrap_or_default(),
            Total::Approximate(value) => value,
        }
    }
}

impl Default for Total {
    fn default() -> Self {
        Total::Exact(Decimal::ZERO)
    }
}

impl PartialEq<Decimal> for Total {
    fn eq(&self, other: &Decimal) -> bool {
        matches!(self, Total::Exact(value) if value == other)
    }
}

/// Snapshot of the transactions inside the window. All-zero when the window is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    pub count: u64,
    pub sum: Total,
    pub avg: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

impl Statistics {
    /// Reduces a set of transactions. Monetary fields are rounded half away from zero
    /// to two decimal places; `count` is exact.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let Some(first) = transactions.first() else {
            return Self::default();
        };

        let mut min = first.amount;
        let mut max = first.amount;
        for tx in transactions {
            min = min.min(tx.amount);
            max = max.max(tx.amount);
        }
        let count = transactions.len() as u64;
        let divisor = Decimal::from(count);

        let exact_sum = transactions
            .iter()
            .try_fold(Decimal::ZERO, |sum, tx| sum.checked_add(tx.amount));
        let (sum, avg) = match exact_sum {
            Some(sum) => (Total::Exact(round(sum)), sum / divisor),
            None => {
                warn!(count, "window sum exceeds decimal range, reporting it as f64");
                let sum = transactions
                    .iter()
                    .map(|tx| tx.amount.to_f64().unwrap_or_default())
                    .sum();
                // Each term is at most max / count, so the running total stays in range.
                let avg = transactions
                    .iter()
                    .fold(Decimal::ZERO, |avg, tx| avg + tx.amount / divisor);
                (Total::Approximate(sum), avg)
            }
        };

        Self {
            count,
            sum,
            avg: round(avg),
            min: round(min),
            max: round(max),
        }
    }
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

pub struct StatisticsEngine {
    store: Arc<TransactionsStore>,
    clock: Arc<dyn Clock>,
}

impl StatisticsEngine {
    pub fn new(store: Arc<TransactionsStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn compute_statistics(&self) -> Statistics {
        let now = self.clock.now();
        let window_start = now - Duration::seconds(WINDOW_SECS);
        let transactions = self.store.find_by_time_range(window_start, now);
        Statistics::from_transactions(&transactions)
    }
}
