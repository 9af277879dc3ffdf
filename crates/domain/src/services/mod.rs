//! Record services wrapping the stores with domain semantics.

pub mod customers;
pub mod segments;
pub mod transactions;

pub use customers::{CustomerService, NewCustomer, UpdateCustomer};
pub use segments::{NewSegment, SegmentService, UpdateSegment};
pub use transactions::{NewTransaction, TransactionService};

use serde::Serialize;

/// One failed item of a bulk operation.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemError {
    /// Position of the item in the submitted batch.
    pub index: usize,

    /// Human-readable reason the item was rejected.
    pub reason: String,
}

/// Result of a bulk create: successfully processed items alongside a
/// per-item error list. One item failing never aborts the rest.
#[derive(Debug, Serialize)]
pub struct BulkOutcome<T> {
    pub created: Vec<T>,
    pub errors: Vec<BulkItemError>,
}

impl<T> BulkOutcome<T> {
    fn new() -> Self {
        Self {
            created: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Total/created/failed counts for the batch.
    pub fn summary(&self) -> BulkSummary {
        BulkSummary {
            total: self.created.len() + self.errors.len(),
            created: self.created.len(),
            failed: self.errors.len(),
        }
    }
}

/// Aggregate counts reported alongside a bulk outcome.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BulkSummary {
    pub total: usize,
    pub created: usize,
    pub failed: usize,
}
