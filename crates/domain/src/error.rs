//! Domain error types.

use common::{CustomerId, SegmentId};
use thiserror::Error;

use crate::money::Money;
use crate::store::StoreError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Customer not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Segment not found.
    #[error("Segment not found: {0}")]
    SegmentNotFound(SegmentId),

    /// A customer with this contact address is already registered.
    #[error("Customer with email '{0}' already exists")]
    EmailAlreadyExists(String),

    /// Transaction amounts must be non-negative.
    #[error("Transaction amount cannot be negative: {0}")]
    NegativeAmount(Money),

    /// A segment must carry at least one rule.
    #[error("Segment rule list cannot be empty")]
    EmptyRuleSet,

    /// An error occurred in a store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
