//! In-memory transaction store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::CustomerId;
use domain::store::{Result, TransactionStore};
use domain::Transaction;
use tokio::sync::RwLock;

/// In-memory append-only transaction store, keyed by customer.
#[derive(Clone, Default)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<CustomerId, Vec<Transaction>>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new empty transaction store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of transactions stored.
    pub async fn count(&self) -> usize {
        self.transactions.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, transaction: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions
            .entry(transaction.customer_id)
            .or_default()
            .push(transaction);
        Ok(())
    }

    async fn list_for_customer(&self, customer_id: CustomerId) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut history = transactions.get(&customer_id).cloned().unwrap_or_default();
        history.sort_by_key(|t| t.occurred_at);
        Ok(history)
    }
}
