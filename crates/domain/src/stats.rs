//! Statistics aggregator: derives a customer's activity profile from
//! their full transaction history.

use chrono::{DateTime, Utc};
use common::CustomerId;

use crate::customer::ActivityProfile;
use crate::error::DomainError;
use crate::store::{CustomerStore, TransactionStore};
use crate::transaction::Transaction;

/// Folds a transaction history into an activity profile.
///
/// Spend is the sum of all amounts, visit count is the number of
/// transactions, and last-active is the maximum transaction timestamp —
/// or `now` when the history is empty. Pure and deterministic: replaying
/// the same history always reproduces the same profile.
pub fn recompute_profile(transactions: &[Transaction], now: DateTime<Utc>) -> ActivityProfile {
    ActivityProfile {
        total_spend: transactions.iter().map(|t| t.amount).sum(),
        visit_count: transactions.len() as u64,
        last_active: transactions
            .iter()
            .map(|t| t.occurred_at)
            .max()
            .or(Some(now)),
    }
}

/// Recomputes activity profiles from stored history and writes them
/// back onto the customer record.
///
/// Every recompute re-derives from the entire history rather than
/// applying an increment. The cost scales with history length, but the
/// operation is idempotent and corrects any prior drift on its own.
pub struct StatsAggregator<T, C>
where
    T: TransactionStore,
    C: CustomerStore,
{
    transactions: T,
    customers: C,
}

impl<T, C> StatsAggregator<T, C>
where
    T: TransactionStore,
    C: CustomerStore,
{
    /// Creates a new aggregator over the given stores.
    pub fn new(transactions: T, customers: C) -> Self {
        Self {
            transactions,
            customers,
        }
    }

    /// Re-derives the customer's profile from their full history and
    /// persists it.
    #[tracing::instrument(skip(self))]
    pub async fn recompute(&self, customer_id: CustomerId) -> Result<ActivityProfile, DomainError> {
        let history = self.transactions.list_for_customer(customer_id).await?;
        let profile = recompute_profile(&history, Utc::now());

        let mut customer = self
            .customers
            .get(customer_id)
            .await?
            .ok_or(DomainError::CustomerNotFound(customer_id))?;
        customer.activity = profile.clone();
        customer.updated_at = Utc::now();
        self.customers.update(customer).await?;

        metrics::counter!("profile_recomputes_total").increment(1);
        tracing::debug!(%customer_id, visits = profile.visit_count, "activity profile recomputed");

        Ok(profile)
    }
}
