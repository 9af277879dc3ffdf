//! Transaction record service.
//!
//! Transaction creation explicitly invokes the statistics aggregator —
//! the dependency is a visible call, not a storage-side hook — and a
//! recompute failure never rolls back the transaction itself.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::DomainError;
use crate::money::Money;
use crate::stats::StatsAggregator;
use crate::store::{CustomerStore, TransactionStore};
use crate::transaction::Transaction;

use super::{BulkItemError, BulkOutcome};

/// Payload for recording a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub customer_id: CustomerId,
    pub amount_cents: i64,
    #[serde(default)]
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Serializes transaction creation per customer.
///
/// Creation for the *same* customer holds that customer's lock across
/// insert + recompute, so a recompute never reads a history missing its
/// own triggering insert. Different customers proceed concurrently.
#[derive(Clone, Default)]
struct CustomerLocks {
    inner: Arc<Mutex<HashMap<CustomerId, Arc<Mutex<()>>>>>,
}

impl CustomerLocks {
    async fn acquire(&self, customer_id: CustomerId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(customer_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Service for recording transactions and keeping activity profiles in
/// step with them.
pub struct TransactionService<T, C>
where
    T: TransactionStore + Clone,
    C: CustomerStore + Clone,
{
    transactions: T,
    customers: C,
    aggregator: StatsAggregator<T, C>,
    locks: CustomerLocks,
}

impl<T, C> TransactionService<T, C>
where
    T: TransactionStore + Clone,
    C: CustomerStore + Clone,
{
    /// Creates a new transaction service over the given stores.
    pub fn new(transactions: T, customers: C) -> Self {
        let aggregator = StatsAggregator::new(transactions.clone(), customers.clone());
        Self {
            transactions,
            customers,
            aggregator,
            locks: CustomerLocks::default(),
        }
    }

    /// Records a transaction and recomputes the customer's profile.
    ///
    /// The recompute runs synchronously after the insert, but its
    /// failure only logs the inconsistency: the transaction itself is
    /// already durable and the next recompute corrects the profile.
    #[tracing::instrument(skip(self, new), fields(customer_id = %new.customer_id))]
    pub async fn create(&self, new: NewTransaction) -> Result<Transaction, DomainError> {
        let amount = Money::from_cents(new.amount_cents);
        if amount.is_negative() {
            return Err(DomainError::NegativeAmount(amount));
        }

        if self.customers.get(new.customer_id).await?.is_none() {
            return Err(DomainError::CustomerNotFound(new.customer_id));
        }

        let _guard = self.locks.acquire(new.customer_id).await;

        let transaction = match new.occurred_at {
            Some(at) => Transaction::occurring_at(new.customer_id, amount, at),
            None => Transaction::new(new.customer_id, amount),
        };
        self.transactions.insert(transaction.clone()).await?;

        if let Err(e) = self.aggregator.recompute(new.customer_id).await {
            metrics::counter!("profile_recompute_failures_total").increment(1);
            tracing::warn!(
                customer_id = %new.customer_id,
                error = %e,
                "activity profile recompute failed; profile will self-heal on next transaction"
            );
        }

        tracing::info!(transaction_id = %transaction.id, "transaction created");
        Ok(transaction)
    }

    /// Records a batch of transactions, isolating per-item failures.
    #[tracing::instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn bulk_create(&self, batch: Vec<NewTransaction>) -> BulkOutcome<Transaction> {
        let mut outcome = BulkOutcome::new();

        for (index, new) in batch.into_iter().enumerate() {
            match self.create(new).await {
                Ok(transaction) => outcome.created.push(transaction),
                Err(e) => outcome.errors.push(BulkItemError {
                    index,
                    reason: e.to_string(),
                }),
            }
        }

        let summary = outcome.summary();
        tracing::info!(
            created = summary.created,
            failed = summary.failed,
            "bulk transaction creation finished"
        );
        outcome
    }

    /// Returns a customer's full history, oldest first.
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Transaction>, DomainError> {
        if self.customers.get(customer_id).await?.is_none() {
            return Err(DomainError::CustomerNotFound(customer_id));
        }
        Ok(self.transactions.list_for_customer(customer_id).await?)
    }
}
