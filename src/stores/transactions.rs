//! In-memory transaction history.
//!
//! Keeps every accepted transaction in insertion order for:
//! - Answering time-range queries for the statistics engine
//! - Diagnostics (full reads, record counts)
//! - Optional age-based eviction via [`TransactionsStore::prune_before`]

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::Error;

/// A stored transaction. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub amount: Decimal,
    /// When the transaction logically happened, as reported by the caller.
    pub timestamp: DateTime<Utc>,
    /// When the store accepted it. Not used for windowing.
    pub created_at: DateTime<Utc>,
}

pub struct TransactionsStore {
    /// All accepted transactions, oldest insert first
    transactions: RwLock<Vec<Transaction>>,
    clock: Arc<dyn Clock>,
}

impl TransactionsStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            transactions: RwLock::new(Vec::new()),
            clock,
        }
    }

    /// Stores a new transaction and returns the stored record.
    /// Returns an error if the timestamp is later than the current time, or if the
    /// amount is negative. Rejected transactions are never stored.
    pub fn insert(&self, amount: Decimal, timestamp: DateTime<Utc>) -> Result<Transaction, Error> {
        let now = self.clock.now();
        if timestamp > now {
            return Err(Error::FutureTimestamp { timestamp, now });
        }
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(Error::InvalidAmount(amount));
        }

        let transaction = Transaction {
            id: Uuid::new_v4(),
            amount,
            timestamp,
            created_at: now,
        };
        self.transactions.write().push(transaction.clone());
        Ok(transaction)
    }

    /// Returns a copy of every stored transaction in insertion order.
    pub fn find_all(&self) -> Vec<Transaction> {
        self.transactions.read().clone()
    }

    /// Returns, in insertion order, every transaction with `start <= timestamp <= end`.
    pub fn find_by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Transaction> {
        self.transactions
            .read()
            .iter()
            .filter(|tx| tx.timestamp >= start && tx.timestamp <= end)
            .cloned()
            .collect()
    }

    /// Removes every transaction and returns how many there were.
    /// Calling it on an empty store is a no-op.
    pub fn delete_all(&self) -> usize {
        std::mem::take(&mut *self.transactions.write()).len()
    }

    /// Drops transactions whose timestamp is strictly before `cutoff`.
    /// Returns how many were removed.
    pub fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut transactions = self.transactions.write();
        let before = transactions.len();
        transactions.retain(|tx| tx.timestamp >= cutoff);
        before - transactions.len()
    }

    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::thread;

    fn store_at(now: DateTime<Utc>) -> (TransactionsStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        (TransactionsStore::new(clock.clone()), clock)
    }

    #[test]
    fn test_new_store_is_empty() {
        let (store, _) = store_at(Utc::now());
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.find_all().is_empty());
    }

    #[test]
    fn test_insert_and_find_all() {
        let now = Utc::now();
        let (store, _) = store_at(now);

        let stored = store.insert(dec!(100.50), now - Duration::seconds(30)).unwrap();
        assert_eq!(stored.amount, dec!(100.50));
        assert_eq!(stored.timestamp, now - Duration::seconds(30));
        assert_eq!(stored.created_at, now);

        assert_eq!(store.find_all(), vec![stored]);
    }

    #[test]
    fn test_insert_preserves_order_and_assigns_unique_ids() {
        let now = Utc::now();
        let (store, _) = store_at(now);

        // Insert out of timestamp order on purpose
        store.insert(dec!(1), now - Duration::seconds(5)).unwrap();
        store.insert(dec!(2), now - Duration::seconds(50)).unwrap();
        store.insert(dec!(3), now - Duration::seconds(20)).unwrap();

        let all = store.find_all();
        let amounts: Vec<_> = all.iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![dec!(1), dec!(2), dec!(3)]);

        let ids: HashSet<_> = all.iter().map(|tx| tx.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_timestamp_equal_to_now_is_accepted() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        assert!(store.insert(dec!(10), now).is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_future_timestamp_is_rejected_and_not_stored() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        let future = now + Duration::milliseconds(1);

        assert_eq!(
            store.insert(dec!(10), future),
            Err(Error::FutureTimestamp {
                timestamp: future,
                now
            })
        );
        assert!(store.find_all().is_empty());
    }

    #[test]
    fn test_future_check_uses_current_clock_reading() {
        let now = Utc::now();
        let (store, clock) = store_at(now);
        let later = now + Duration::seconds(10);

        assert!(store.insert(dec!(10), later).is_err());
        clock.advance(Duration::seconds(10));
        assert!(store.insert(dec!(10), later).is_ok());
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let now = Utc::now();
        let (store, _) = store_at(now);

        assert_eq!(
            store.insert(dec!(-0.01), now),
            Err(Error::InvalidAmount(dec!(-0.01)))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_amount_is_accepted() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        assert!(store.insert(dec!(0), now).is_ok());
        // Negative zero is still zero
        assert!(store.insert(-dec!(0), now).is_ok());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_find_by_time_range_is_inclusive() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        let start = now - Duration::seconds(60);

        store.insert(dec!(1), start - Duration::milliseconds(1)).unwrap();
        store.insert(dec!(2), start).unwrap();
        store.insert(dec!(3), now - Duration::seconds(30)).unwrap();
        store.insert(dec!(4), now).unwrap();

        let amounts: Vec<_> = store
            .find_by_time_range(start, now)
            .iter()
            .map(|tx| tx.amount)
            .collect();
        assert_eq!(amounts, vec![dec!(2), dec!(3), dec!(4)]);
    }

    #[test]
    fn test_find_by_time_range_empty_when_nothing_matches() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        store.insert(dec!(1), now - Duration::seconds(120)).unwrap();

        assert!(store
            .find_by_time_range(now - Duration::seconds(60), now)
            .is_empty());
    }

    #[test]
    fn test_delete_all_is_idempotent() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        store.insert(dec!(1), now).unwrap();
        store.insert(dec!(2), now).unwrap();

        assert_eq!(store.delete_all(), 2);
        assert!(store.is_empty());
        assert_eq!(store.delete_all(), 0);
        assert!(store.is_empty());

        // Store stays usable after clearing
        store.insert(dec!(3), now).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_prune_before_drops_only_older_records() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        let cutoff = now - Duration::seconds(60);

        store.insert(dec!(1), now - Duration::seconds(120)).unwrap();
        store.insert(dec!(2), cutoff).unwrap();
        store.insert(dec!(3), now - Duration::seconds(61)).unwrap();
        store.insert(dec!(4), now).unwrap();

        assert_eq!(store.prune_before(cutoff), 2);
        let amounts: Vec<_> = store.find_all().iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![dec!(2), dec!(4)]);

        assert_eq!(store.prune_before(cutoff), 0);
    }

    #[test]
    fn test_concurrent_inserts_are_all_visible() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..250 {
                        let amount = Decimal::from(worker * 1000 + i);
                        store.insert(amount, now).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = store.find_all();
        assert_eq!(all.len(), 2000);
        let ids: HashSet<_> = all.iter().map(|tx| tx.id).collect();
        assert_eq!(ids.len(), 2000);
    }

    #[test]
    fn test_reads_during_clear_see_full_or_empty_set() {
        let now = Utc::now();
        let (store, _) = store_at(now);
        let store = Arc::new(store);
        for _ in 0..500 {
            store.insert(dec!(1), now).unwrap();
        }

        let reader = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let len = store.find_by_time_range(now, now).len();
                    assert!(len == 500 || len == 0, "observed partial clear: {len}");
                }
            })
        };
        store.delete_all();
        reader.join().unwrap();
        assert!(store.is_empty());
    }
}
