//! Transaction model.

use chrono::{DateTime, Utc};
use common::{CustomerId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A single purchase in a customer's history.
///
/// Transactions are immutable once created; a customer's history is
/// append-only, which is what makes the full-history profile recompute
/// idempotent and self-healing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID.
    pub id: TransactionId,

    /// The customer this transaction belongs to.
    pub customer_id: CustomerId,

    /// Non-negative purchase amount.
    pub amount: Money,

    /// When the purchase happened.
    pub occurred_at: DateTime<Utc>,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new transaction occurring now.
    pub fn new(customer_id: CustomerId, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            customer_id,
            amount,
            occurred_at: now,
            created_at: now,
        }
    }

    /// Creates a transaction with an explicit purchase timestamp.
    pub fn occurring_at(customer_id: CustomerId, amount: Money, at: DateTime<Utc>) -> Self {
        Self {
            occurred_at: at,
            ..Self::new(customer_id, amount)
        }
    }
}
