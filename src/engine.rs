use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::statistics::{Statistics, StatisticsEngine};
use crate::stores::{Transaction, TransactionsStore};
use crate::Error;

/// Entry point for the three operations the HTTP layer needs: record a transaction,
/// forget all of them, and summarise the trailing window.
///
/// Cheap to share between request handlers behind an `Arc`; all interior state is
/// synchronised by the store.
pub struct Engine {
    store: Arc<TransactionsStore>,
    statistics: StatisticsEngine,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(TransactionsStore::new(Arc::clone(&clock)));
        let statistics = StatisticsEngine::new(Arc::clone(&store), Arc::clone(&clock));
        Self {
            store,
            statistics,
            clock,
        }
    }

    pub fn create_transaction(
        &self,
        amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, Error> {
        match self.store.insert(amount, timestamp) {
            Ok(transaction) => {
                debug!(id = %transaction.id, %amount, %timestamp, "transaction stored");
                Ok(transaction)
            }
            Err(err) => {
                warn!(%amount, %timestamp, "transaction rejected: {err}");
                Err(err)
            }
        }
    }

    pub fn delete_all_transactions(&self) {
        let removed = self.store.delete_all();
        info!(removed, "all transactions deleted");
    }

    pub fn get_statistics(&self) -> Statistics {
        let statistics = self.statistics.compute_statistics();
        debug!(?statistics, "statistics computed");
        statistics
    }

    /// Drops transactions older than `now - retention`. Returns how many were removed.
    pub fn prune_expired(&self, retention: Duration) -> usize {
        let cutoff = self.clock.now() - retention;
        let removed = self.store.prune_before(cutoff);
        if removed > 0 {
            info!(removed, %cutoff, "expired transactions pruned");
        }
        removed
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.store.find_all()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
